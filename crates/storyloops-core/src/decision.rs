use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use storyloops_critic::{Judgement, RevisionKind};

use crate::LoopError;

/// The user's answer when the critic asks for revisions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    /// Write a new draft from the original request
    Revise,
    /// Keep the current draft and finish
    Keep,
    /// Stop without classifying or saving anything
    Abandon,
}

impl Decision {
    /// Interpret a typed y/n answer: anything starting with `y` revises.
    pub fn from_answer(answer: &str) -> Self {
        if answer.to_lowercase().starts_with('y') {
            Decision::Revise
        } else {
            Decision::Keep
        }
    }
}

/// Supplies revision decisions to the loop on demand.
///
/// The loop pulls one decision each time the critic asks for revisions, so
/// the caller (terminal prompt, test script, remote client) owns all I/O.
/// `story` is the draft the judgement is about.
#[async_trait]
pub trait DecisionSource: Send {
    async fn decide(
        &mut self,
        kind: RevisionKind,
        story: &str,
        judgement: &Judgement,
    ) -> Result<Decision, LoopError>;
}
