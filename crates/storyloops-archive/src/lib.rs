pub mod store;
pub mod types;

pub use store::{StoryArchive, DEFAULT_ARCHIVE_DIR};
pub use types::{ArchiveEntry, CoCreationRecord, RecordKind, SavedRecord, StorySessionRecord};
