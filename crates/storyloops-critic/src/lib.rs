mod classification;
pub mod evaluator;
mod literal;
mod prompts;
mod verdict;
mod world;

pub use classification::{Classification, ClassificationOutcome, GENRE_VOCABULARY};
pub use evaluator::{Judgement, StoryClassifier, StoryJudge};
pub use prompts::StoryPrompts;
pub use verdict::{RevisionKind, Verdict};
pub use world::WorldContext;
