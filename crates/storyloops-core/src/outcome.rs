use serde::{Deserialize, Serialize};
use std::time::Duration;

use storyloops_critic::Verdict;

use crate::IterationRecord;

/// Why the loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// The critic accepted the draft
    CriticAccepted,
    /// The user kept a draft the critic wanted revised
    RevisionDeclined,
    /// The configured rewrite limit was hit
    RevisionLimitReached,
    /// The decision source gave up; nothing is classified or saved
    Abandoned,
}

/// The final state of a write-judge-revise loop
#[derive(Debug, Serialize, Deserialize)]
pub struct LoopOutcome {
    pub termination: Termination,
    /// The last judged draft
    pub story: String,
    /// Critic text for that draft
    pub judge_feedback: String,
    pub verdict: Verdict,
    /// Number of drafts written
    pub iterations: usize,
    #[serde(skip)]
    pub history: Vec<IterationRecord>,
    pub total_duration_secs: f64,
}

impl LoopOutcome {
    pub fn new(
        termination: Termination,
        story: String,
        judge_feedback: String,
        verdict: Verdict,
        iterations: usize,
        history: Vec<IterationRecord>,
        duration: Duration,
    ) -> Self {
        Self {
            termination,
            story,
            judge_feedback,
            verdict,
            iterations,
            history,
            total_duration_secs: duration.as_secs_f64(),
        }
    }

    /// True when the story left the loop and should be classified and saved
    pub fn is_accepted(&self) -> bool {
        !matches!(self.termination, Termination::Abandoned)
    }

    pub fn accepted_by_critic(&self) -> bool {
        matches!(self.termination, Termination::CriticAccepted)
    }

    pub fn exit_code(&self) -> i32 {
        match self.termination {
            Termination::CriticAccepted
            | Termination::RevisionDeclined
            | Termination::RevisionLimitReached => 0,
            Termination::Abandoned => 130,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(termination: Termination) -> LoopOutcome {
        LoopOutcome::new(
            termination,
            "story".into(),
            "feedback".into(),
            Verdict::MinorRevisions,
            1,
            Vec::new(),
            Duration::from_secs(2),
        )
    }

    #[test]
    fn test_declined_revision_still_exits_accepted() {
        let declined = outcome(Termination::RevisionDeclined);
        assert!(declined.is_accepted());
        assert!(!declined.accepted_by_critic());
        assert_eq!(declined.exit_code(), 0);
    }

    #[test]
    fn test_abandoned_is_not_accepted() {
        let abandoned = outcome(Termination::Abandoned);
        assert!(!abandoned.is_accepted());
        assert_eq!(abandoned.exit_code(), 130);
    }

    #[test]
    fn test_serializes_without_history() {
        let json = serde_json::to_value(outcome(Termination::CriticAccepted)).unwrap();
        assert_eq!(json["termination"], "critic_accepted");
        assert_eq!(json["verdict"], "minor_revisions");
        assert!(json.get("history").is_none());
    }
}
