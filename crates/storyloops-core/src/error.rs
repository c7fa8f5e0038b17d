use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoopError {
    #[error("Generation error: {0}")]
    GenerationError(#[from] storyloops_agent::GenerationError),

    #[error("Failed to read user decision: {0}")]
    InputError(String),
}
