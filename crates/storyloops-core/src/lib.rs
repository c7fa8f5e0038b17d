mod cocreation;
mod context;
mod decision;
mod error;
mod loop_runner;
mod outcome;
mod session;

pub use cocreation::{is_exit_command, render_transcript, CoCreationSession};
pub use context::{IterationRecord, LoopContext, StoryRequest};
pub use decision::{Decision, DecisionSource};
pub use error::LoopError;
pub use loop_runner::StoryLoop;
pub use outcome::{LoopOutcome, Termination};
pub use session::{AuthorInfo, SessionResult, StorySession};

#[cfg(test)]
mod testing;
