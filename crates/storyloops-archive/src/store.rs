use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::types::{ArchiveEntry, CoCreationRecord, SavedRecord, StorySessionRecord};

/// Directory used when no archive directory is configured
pub const DEFAULT_ARCHIVE_DIR: &str = "stories";

const DEFAULT_SLUG: &str = "story";

/// Stores finished sessions as pretty-printed JSON files in one directory.
pub struct StoryArchive {
    dir: PathBuf,
}

impl StoryArchive {
    /// Create an archive rooted at `./stories`.
    pub fn new() -> Self {
        Self::with_dir(PathBuf::from(DEFAULT_ARCHIVE_DIR))
    }

    /// Create an archive with a custom directory.
    pub fn with_dir(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Save a story session. Without a filename the archive names the file
    /// `story_<YYYYmmddHHMMSS>.json`.
    pub fn save_story(
        &self,
        record: &StorySessionRecord,
        filename: Option<&str>,
    ) -> Result<PathBuf> {
        self.save(record, DEFAULT_SLUG, filename)
    }

    /// Save a co-creation session, named after its world by default.
    pub fn save_co_creation(
        &self,
        record: &CoCreationRecord,
        filename: Option<&str>,
    ) -> Result<PathBuf> {
        let slug = slugify(&record.fantasy_world.name);
        self.save(record, &slug, filename)
    }

    fn save<T: Serialize>(&self, record: &T, slug: &str, filename: Option<&str>) -> Result<PathBuf> {
        let json = serde_json::to_string_pretty(record).context("Failed to serialize record")?;

        let path = match filename {
            Some(name) => self.dir.join(name),
            None => self.default_path(slug, &json),
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
        fs::write(&path, json).with_context(|| format!("Failed to write {}", path.display()))?;

        tracing::debug!(path = %path.display(), "Saved record");
        Ok(path)
    }

    /// `<slug>_<timestamp>.json`, with a short content hash appended when a
    /// file of that name already exists.
    fn default_path(&self, slug: &str, content: &str) -> PathBuf {
        let timestamp = Local::now().format("%Y%m%d%H%M%S");
        let path = self.dir.join(format!("{}_{}.json", slug, timestamp));
        if !path.exists() {
            return path;
        }

        let mut hasher = Sha256::new();
        hasher.update(content.as_bytes());
        let hash = hex::encode(hasher.finalize());
        self.dir
            .join(format!("{}_{}_{}.json", slug, timestamp, &hash[..6]))
    }

    /// Load a single record.
    pub fn load(&self, path: &Path) -> Result<SavedRecord> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read record: {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse record: {}", path.display()))
    }

    /// Get a record by id (file stem).
    pub fn get(&self, id: &str) -> Result<SavedRecord> {
        self.load(&self.dir.join(format!("{}.json", id)))
    }

    /// List saved records, newest first. Unreadable files are skipped.
    pub fn list(&self) -> Result<Vec<ArchiveEntry>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let entries = fs::read_dir(&self.dir)
            .with_context(|| format!("Failed to read archive dir: {}", self.dir.display()))?;

        let mut summaries = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|s| s.to_str()) != Some("json") {
                continue;
            }

            match self.load(&path) {
                Ok(record) => summaries.push(ArchiveEntry {
                    id: path
                        .file_stem()
                        .and_then(|s| s.to_str())
                        .unwrap_or("unknown")
                        .to_string(),
                    kind: record.kind(),
                    datetime: record.datetime(),
                    title: record.title().to_string(),
                    genres: record.genres().to_vec(),
                    path,
                }),
                Err(e) => {
                    tracing::warn!("Skipping {}: {:#}", path.display(), e);
                }
            }
        }

        summaries.sort_by(|a, b| b.datetime.cmp(&a.datetime));
        Ok(summaries)
    }
}

impl Default for StoryArchive {
    fn default() -> Self {
        Self::new()
    }
}

/// Lowercase ASCII slug with underscores; falls back to `story`.
pub fn slugify(name: &str) -> String {
    let slug: String = name
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect();
    let slug = slug
        .split('_')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_");
    if slug.is_empty() {
        DEFAULT_SLUG.to_string()
    } else {
        slug
    }
}
