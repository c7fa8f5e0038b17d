use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use storyloops_critic::{Classification, WorldContext};

/// A finished story session as written to disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorySessionRecord {
    pub author: String,
    pub contact: String,
    pub story: String,
    pub judge_feedback: String,
    pub user_request: String,
    pub classification: Classification,
    /// Interpreted verdict of the last critic pass
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verdict: Option<String>,
    /// False when the user kept a draft the critic did not accept
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accepted_by_critic: Option<bool>,
    pub datetime: NaiveDateTime,
}

/// A finished co-creation session as written to disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoCreationRecord {
    pub fantasy_world: WorldContext,
    pub transcript: String,
    pub datetime: NaiveDateTime,
}

/// Either record shape, as read back from the archive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SavedRecord {
    Story(StorySessionRecord),
    CoCreation(CoCreationRecord),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Story,
    CoCreation,
}

/// Summary for list views.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveEntry {
    pub id: String,
    pub path: PathBuf,
    pub kind: RecordKind,
    pub datetime: NaiveDateTime,
    /// User request, or world name for co-creation sessions
    pub title: String,
    pub genres: Vec<String>,
}

impl SavedRecord {
    pub fn kind(&self) -> RecordKind {
        match self {
            SavedRecord::Story(_) => RecordKind::Story,
            SavedRecord::CoCreation(_) => RecordKind::CoCreation,
        }
    }

    pub fn datetime(&self) -> NaiveDateTime {
        match self {
            SavedRecord::Story(r) => r.datetime,
            SavedRecord::CoCreation(r) => r.datetime,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            SavedRecord::Story(r) => &r.user_request,
            SavedRecord::CoCreation(r) => &r.fantasy_world.name,
        }
    }

    pub fn genres(&self) -> &[String] {
        match self {
            SavedRecord::Story(r) => &r.classification.genres,
            SavedRecord::CoCreation(_) => &[],
        }
    }
}
