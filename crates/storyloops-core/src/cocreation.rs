use chrono::Local;
use std::sync::Arc;
use tracing::{debug, warn};

use storyloops_agent::{ChatMessage, ChatRole, GenerationParams, Generator};
use storyloops_archive::CoCreationRecord;
use storyloops_critic::{StoryPrompts, WorldContext};
use storyloops_logging::{LogEvent, Logger};

use crate::LoopError;

const EXIT_COMMAND: &str = "exit";

/// True when a typed line ends a co-creation session
pub fn is_exit_command(line: &str) -> bool {
    line.trim().eq_ignore_ascii_case(EXIT_COMMAND)
}

/// Render user and assistant turns as `Role: content` lines
pub fn render_transcript(messages: &[ChatMessage]) -> String {
    messages
        .iter()
        .filter(|m| m.role != ChatRole::System)
        .map(|m| format!("{}: {}", m.role, m.content))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Turn-based story writing inside a fixed fantasy world
pub struct CoCreationSession<'a> {
    generator: &'a dyn Generator,
    world: WorldContext,
    transcript: Vec<ChatMessage>,
    logger: Arc<Logger>,
}

impl<'a> CoCreationSession<'a> {
    pub fn new(generator: &'a dyn Generator, world: WorldContext, logger: Arc<Logger>) -> Self {
        let system = ChatMessage::system(StoryPrompts::build_world_system_prompt(&world));
        logger.log(&LogEvent::CoCreationStarted {
            world: world.name.clone(),
        });
        Self {
            generator,
            world,
            transcript: vec![system],
            logger,
        }
    }

    /// Send one user line and return the assistant's continuation.
    ///
    /// On failure the transcript is left as it was before the call.
    pub async fn take_turn(&mut self, user_text: &str) -> Result<String, LoopError> {
        self.transcript.push(ChatMessage::user(user_text));
        debug!(messages = self.transcript.len(), "Sending co-creation turn");

        let reply = match self
            .generator
            .chat(&self.transcript, &GenerationParams::co_creation())
            .await
        {
            Ok(reply) => reply,
            Err(e) => {
                self.transcript.pop();
                warn!(error = %e, "Co-creation turn failed");
                self.logger.log(&LogEvent::ErrorEncountered {
                    iteration: self.turns(),
                    error: e.to_string(),
                });
                return Err(e.into());
            }
        };

        self.transcript.push(ChatMessage::assistant(reply.text.clone()));
        self.logger.log(&LogEvent::CoCreationReply {
            turn: self.turns(),
            text: reply.text.clone(),
        });
        Ok(reply.text)
    }

    /// Completed user/assistant exchanges
    pub fn turns(&self) -> usize {
        self.transcript
            .iter()
            .filter(|m| m.role == ChatRole::Assistant)
            .count()
    }

    pub fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }

    pub fn world(&self) -> &WorldContext {
        &self.world
    }

    pub fn render_transcript(&self) -> String {
        render_transcript(&self.transcript)
    }

    pub fn into_record(self) -> CoCreationRecord {
        CoCreationRecord {
            transcript: render_transcript(&self.transcript),
            fantasy_world: self.world,
            datetime: Local::now().naive_local(),
        }
    }
}
