use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use storyloops_critic::{StoryPrompts, WorldContext};

/// What the user asked for, fixed for the whole session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryRequest {
    pub user_request: String,
    pub world: Option<WorldContext>,
}

impl StoryRequest {
    pub fn new(user_request: impl Into<String>) -> Self {
        Self {
            user_request: user_request.into(),
            world: None,
        }
    }

    pub fn with_world(mut self, world: WorldContext) -> Self {
        self.world = Some(world);
        self
    }

    /// Storyteller prompt; identical for the first draft and every rewrite
    pub fn story_prompt(&self) -> String {
        StoryPrompts::build_story_prompt(&self.user_request, self.world.as_ref())
    }
}

/// Shared state of one write-judge-revise loop
#[derive(Debug, Clone)]
pub struct LoopContext {
    pub request: StoryRequest,
    /// Current draft number (0-indexed)
    pub iteration: usize,
    /// Verdict history of all judged drafts
    pub history: Vec<IterationRecord>,
    started_at: Instant,
    /// Maximum user-approved rewrites (None = unlimited)
    pub max_revisions: Option<usize>,
}

/// Record of a single judged draft
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IterationRecord {
    pub iteration_number: usize,
    pub story_words: usize,
    pub draft_duration_secs: f64,
    pub verdict: String,
    pub judge_duration_secs: f64,
    pub timestamp: DateTime<Utc>,
}

impl LoopContext {
    pub fn new(request: StoryRequest) -> Self {
        Self {
            request,
            iteration: 0,
            history: Vec::new(),
            started_at: Instant::now(),
            max_revisions: None,
        }
    }

    pub fn with_max_revisions(mut self, max: usize) -> Self {
        self.max_revisions = Some(max);
        self
    }

    pub fn increment_iteration(&mut self) {
        self.iteration += 1;
    }

    pub fn push_record(&mut self, record: IterationRecord) {
        self.history.push(record);
    }

    pub fn total_duration(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Rewrites done so far
    pub fn revisions(&self) -> usize {
        self.iteration
    }

    pub fn revision_limit_reached(&self) -> bool {
        match self.max_revisions {
            Some(max) => self.revisions() >= max,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_story_prompt_includes_world() {
        let world = WorldContext::new("Glimmerwood", vec!["Pip".into()], "Trees talk");
        let request = StoryRequest::new("a lantern").with_world(world);
        let prompt = request.story_prompt();
        assert!(prompt.contains("Glimmerwood"));
        assert!(prompt.ends_with("User Request: a lantern"));
    }

    #[test]
    fn test_revision_limit() {
        let mut context = LoopContext::new(StoryRequest::new("x"));
        assert!(!context.revision_limit_reached());

        let mut limited = LoopContext::new(StoryRequest::new("x")).with_max_revisions(1);
        assert!(!limited.revision_limit_reached());
        limited.increment_iteration();
        assert!(limited.revision_limit_reached());

        for _ in 0..100 {
            context.increment_iteration();
        }
        assert!(!context.revision_limit_reached());
    }
}
