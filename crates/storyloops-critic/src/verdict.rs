use serde::{Deserialize, Serialize};
use tracing::debug;

const ACCEPT_MARKER: &str = "Accept";
const MAJOR_MARKER: &str = "Major Revisions";
const MINOR_MARKER: &str = "Minor Revisions";

/// The critic's verdict on a story draft
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// Story is accepted, stop the loop
    Accept,
    /// Small fixes suggested
    MinorRevisions,
    /// Story should be rewritten
    MajorRevisions,
    /// Critic output carried no verdict marker
    Unrecognized,
}

/// Flavor of the revision prompt offered to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevisionKind {
    Minor,
    Major,
}

impl Verdict {
    /// Interpret free-text critic output.
    ///
    /// Markers are matched as case-sensitive substrings in priority order:
    /// `Accept`, then `Major Revisions`, then `Minor Revisions`. Text with
    /// none of them is `Unrecognized`.
    pub fn parse(critic_output: &str) -> Self {
        let verdict = if critic_output.contains(ACCEPT_MARKER) {
            Verdict::Accept
        } else if critic_output.contains(MAJOR_MARKER) {
            Verdict::MajorRevisions
        } else if critic_output.contains(MINOR_MARKER) {
            Verdict::MinorRevisions
        } else {
            Verdict::Unrecognized
        };
        debug!(output_len = critic_output.len(), verdict = ?verdict, "Parsed critic verdict");
        verdict
    }

    pub fn is_accept(&self) -> bool {
        matches!(self, Verdict::Accept)
    }

    pub fn is_unrecognized(&self) -> bool {
        matches!(self, Verdict::Unrecognized)
    }

    /// Revision prompt to show, or None when the story was accepted.
    ///
    /// Unrecognized output is offered as a minor revision.
    pub fn revision_kind(&self) -> Option<RevisionKind> {
        match self {
            Verdict::Accept => None,
            Verdict::MajorRevisions => Some(RevisionKind::Major),
            Verdict::MinorRevisions | Verdict::Unrecognized => Some(RevisionKind::Minor),
        }
    }

    /// Stable snake_case name, as persisted in session records
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Accept => "accept",
            Verdict::MinorRevisions => "minor_revisions",
            Verdict::MajorRevisions => "major_revisions",
            Verdict::Unrecognized => "unrecognized",
        }
    }

    /// Get a short description of the verdict for logging
    pub fn short_description(&self) -> &'static str {
        match self {
            Verdict::Accept => "ACCEPT",
            Verdict::MinorRevisions => "MINOR REVISIONS",
            Verdict::MajorRevisions => "MAJOR REVISIONS",
            Verdict::Unrecognized => "UNRECOGNIZED",
        }
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.short_description())
    }
}

impl RevisionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RevisionKind::Minor => "minor",
            RevisionKind::Major => "major",
        }
    }

    /// Question put to the user before regenerating
    pub fn question(&self) -> &'static str {
        match self {
            RevisionKind::Major => "Major revisions suggested. New story?",
            RevisionKind::Minor => "Minor revisions suggested. Re-generate?",
        }
    }
}
