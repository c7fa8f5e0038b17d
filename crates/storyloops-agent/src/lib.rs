mod openai;
mod output;
mod traits;

pub use openai::OpenAiGenerator;
pub use output::Generation;
pub use traits::{
    ChatMessage, ChatRole, GenerationError, GenerationParams, Generator, GeneratorConfig,
    DEFAULT_API_BASE, DEFAULT_MODEL,
};

/// Create the default chat-completion generator from a config.
///
/// The API key is read from `OPENAI_API_KEY`.
pub fn create_generator(config: GeneratorConfig) -> Result<Box<dyn Generator>, GenerationError> {
    Ok(Box::new(OpenAiGenerator::from_env(config)?))
}
