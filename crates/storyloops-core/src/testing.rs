//! Scripted collaborators for loop and session tests.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use storyloops_agent::{ChatMessage, ChatRole, Generation, GenerationError, GenerationParams, Generator};
use storyloops_critic::{Judgement, RevisionKind};

use crate::{Decision, DecisionSource, LoopError};

/// Usage reported for every scripted story draft
pub const STORY_TOKENS: u32 = 9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    Story,
    Judge,
    Classify,
    Chat,
}

/// Generator that answers each role from a script and records every call
#[derive(Default)]
pub struct ScriptedGenerator {
    verdicts: Mutex<VecDeque<String>>,
    chat_replies: Mutex<VecDeque<String>>,
    classification: String,
    fail_on: Option<(CallKind, usize)>,
    pub calls: Mutex<Vec<(CallKind, String, GenerationParams)>>,
}

impl ScriptedGenerator {
    pub fn new(verdicts: &[&str]) -> Self {
        Self {
            verdicts: Mutex::new(verdicts.iter().map(|v| v.to_string()).collect()),
            classification: r#"{"genres":["fun"],"lesson":"Be kind."}"#.to_string(),
            ..Default::default()
        }
    }

    pub fn with_classification(mut self, raw: &str) -> Self {
        self.classification = raw.to_string();
        self
    }

    pub fn with_chat_replies(self, replies: &[&str]) -> Self {
        *self.chat_replies.lock().unwrap() = replies.iter().map(|r| r.to_string()).collect();
        self
    }

    /// Fail the n-th (1-based) call of the given kind
    pub fn failing_on(mut self, kind: CallKind, nth: usize) -> Self {
        self.fail_on = Some((kind, nth));
        self
    }

    pub fn count(&self, kind: CallKind) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(k, _, _)| *k == kind)
            .count()
    }

    pub fn prompts(&self, kind: CallKind) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(k, _, _)| *k == kind)
            .map(|(_, p, _)| p.clone())
            .collect()
    }

    fn classify_call(messages: &[ChatMessage]) -> CallKind {
        let first = &messages[0];
        if first.role == ChatRole::System {
            CallKind::Chat
        } else if first.content.starts_with("You are the Grimm Brothers") {
            CallKind::Judge
        } else if first.content.starts_with("Classify the following story") {
            CallKind::Classify
        } else {
            CallKind::Story
        }
    }
}

#[async_trait]
impl Generator for ScriptedGenerator {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn chat(
        &self,
        messages: &[ChatMessage],
        params: &GenerationParams,
    ) -> Result<Generation, GenerationError> {
        let kind = Self::classify_call(messages);
        let prompt = messages.last().map(|m| m.content.clone()).unwrap_or_default();
        let nth = {
            let mut calls = self.calls.lock().unwrap();
            calls.push((kind, prompt, *params));
            calls.iter().filter(|(k, _, _)| *k == kind).count()
        };

        if self.fail_on == Some((kind, nth)) {
            return Err(GenerationError::Api {
                status: 429,
                message: "quota exceeded".to_string(),
            });
        }

        let text = match kind {
            CallKind::Story => format!("Draft {}: the fox shared his berries.", nth),
            CallKind::Judge => self
                .verdicts
                .lock()
                .unwrap()
                .pop_front()
                .expect("critic script exhausted"),
            CallKind::Classify => self.classification.clone(),
            CallKind::Chat => self
                .chat_replies
                .lock()
                .unwrap()
                .pop_front()
                .expect("chat script exhausted"),
        };

        let generation = Generation::new(text, "scripted".to_string(), Duration::from_millis(1));
        Ok(match kind {
            CallKind::Story => generation.with_output_tokens(STORY_TOKENS),
            _ => generation,
        })
    }
}

/// Decision source that replays a fixed list and records what it was asked
pub struct ScriptedDecisions {
    decisions: VecDeque<Decision>,
    pub asked: Vec<(RevisionKind, String)>,
    /// Draft shown with each question
    pub drafts: Vec<String>,
}

impl ScriptedDecisions {
    pub fn new(decisions: &[Decision]) -> Self {
        Self {
            decisions: decisions.iter().copied().collect(),
            asked: Vec::new(),
            drafts: Vec::new(),
        }
    }

    pub fn always(decision: Decision, times: usize) -> Self {
        Self::new(&vec![decision; times])
    }
}

#[async_trait]
impl DecisionSource for ScriptedDecisions {
    async fn decide(
        &mut self,
        kind: RevisionKind,
        story: &str,
        judgement: &Judgement,
    ) -> Result<Decision, LoopError> {
        self.asked.push((kind, judgement.feedback.clone()));
        self.drafts.push(story.to_string());
        self.decisions
            .pop_front()
            .ok_or_else(|| LoopError::InputError("decision script exhausted".to_string()))
    }
}
