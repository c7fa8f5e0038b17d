//! Project configuration file support for storyloops.
//!
//! Loads configuration from `storyloops.toml` in the working directory, or
//! from the user's config directory when the project has none.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use storyloops_agent::{GeneratorConfig, DEFAULT_API_BASE, DEFAULT_MODEL};
use storyloops_archive::DEFAULT_ARCHIVE_DIR;
use storyloops_core::AuthorInfo;

/// The config file name
pub const CONFIG_FILE_NAME: &str = "storyloops.toml";

/// Directory under the platform config dir holding the global config
pub const GLOBAL_CONFIG_DIR: &str = "storyloops";
pub const GLOBAL_CONFIG_FILE: &str = "config.toml";

const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Configuration loaded from `storyloops.toml`
#[derive(Debug, Deserialize, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    /// Chat model name
    pub model: Option<String>,
    /// Base URL of the OpenAI-compatible API
    pub api_base: Option<String>,
    /// Where finished sessions are written
    pub output_dir: Option<PathBuf>,
    /// Cap on user-approved rewrites
    pub max_revisions: Option<usize>,
    /// HTTP timeout for one generation call
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub author: AuthorConfig,
}

/// Attribution written into saved story records
#[derive(Debug, Deserialize, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct AuthorConfig {
    pub name: Option<String>,
    pub contact: Option<String>,
}

impl ProjectConfig {
    /// Load configuration from the working directory.
    ///
    /// Returns:
    /// - `Ok(Some(config))` if file exists and parses successfully
    /// - `Ok(None)` if file does not exist
    /// - `Err(...)` if file exists but fails to parse (hard error)
    pub fn load(working_dir: &Path) -> Result<Option<Self>> {
        Self::load_file(&working_dir.join(CONFIG_FILE_NAME))
    }

    /// Load the global config from `<config_dir>/storyloops/config.toml`.
    pub fn load_global() -> Result<Option<Self>> {
        match Self::global_path() {
            Some(path) => Self::load_file(&path),
            None => Ok(None),
        }
    }

    pub fn global_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(GLOBAL_CONFIG_DIR).join(GLOBAL_CONFIG_FILE))
    }

    /// Project file first, then the global file.
    pub fn discover(working_dir: &Path) -> Result<Option<Self>> {
        match Self::load(working_dir)? {
            Some(config) => Ok(Some(config)),
            None => Self::load_global(),
        }
    }

    fn load_file(config_path: &Path) -> Result<Option<Self>> {
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read {}", config_path.display()))?;

        let config: ProjectConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", config_path.display()))?;

        Ok(Some(config))
    }
}

/// Values given on the command line, which win over the config file
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    pub model: Option<String>,
    pub api_base: Option<String>,
    pub output_dir: Option<PathBuf>,
    pub max_revisions: Option<usize>,
}

/// Fully resolved runtime settings
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub model: String,
    pub api_base: String,
    pub output_dir: PathBuf,
    pub max_revisions: Option<usize>,
    pub timeout: Duration,
    pub author: AuthorInfo,
}

impl Settings {
    /// Priority: CLI flag > config file > built-in default
    pub fn resolve(cli: CliOverrides, file: Option<ProjectConfig>) -> Self {
        let file = file.unwrap_or_default();
        let default_author = AuthorInfo::default();

        Self {
            model: cli
                .model
                .or(file.model)
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            api_base: cli
                .api_base
                .or(file.api_base)
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            output_dir: cli
                .output_dir
                .or(file.output_dir)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_ARCHIVE_DIR)),
            max_revisions: cli.max_revisions.or(file.max_revisions),
            timeout: Duration::from_secs(file.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)),
            author: AuthorInfo {
                name: file.author.name.unwrap_or(default_author.name),
                contact: file.author.contact.unwrap_or(default_author.contact),
            },
        }
    }

    pub fn generator_config(&self) -> GeneratorConfig {
        GeneratorConfig::default()
            .with_model(self.model.clone())
            .with_api_base(self.api_base.clone())
            .with_timeout(self.timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_none() {
        let dir = TempDir::new().unwrap();
        assert_eq!(ProjectConfig::load(dir.path()).unwrap(), None);
    }

    #[test]
    fn test_parses_full_file() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            r#"
model = "gpt-4o-mini"
api_base = "http://localhost:8080/v1"
output_dir = "out"
max_revisions = 3
timeout_secs = 30

[author]
name = "Ada"
contact = "ada@example.com"
"#,
        )
        .unwrap();

        let config = ProjectConfig::load(dir.path()).unwrap().unwrap();
        assert_eq!(config.model.as_deref(), Some("gpt-4o-mini"));
        assert_eq!(config.max_revisions, Some(3));
        assert_eq!(config.author.name.as_deref(), Some("Ada"));
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "modle = \"typo\"\n").unwrap();

        let err = ProjectConfig::load(dir.path()).unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to parse"));
    }

    #[test]
    fn test_defaults_without_file() {
        let settings = Settings::resolve(CliOverrides::default(), None);
        assert_eq!(settings.model, DEFAULT_MODEL);
        assert_eq!(settings.api_base, DEFAULT_API_BASE);
        assert_eq!(settings.output_dir, PathBuf::from("stories"));
        assert_eq!(settings.max_revisions, None);
        assert_eq!(settings.timeout, Duration::from_secs(120));
        assert_eq!(settings.author, AuthorInfo::default());
    }

    #[test]
    fn test_cli_wins_over_file() {
        let file = ProjectConfig {
            model: Some("from-file".into()),
            output_dir: Some(PathBuf::from("file-dir")),
            max_revisions: Some(5),
            ..Default::default()
        };
        let cli = CliOverrides {
            model: Some("from-cli".into()),
            max_revisions: Some(1),
            ..Default::default()
        };

        let settings = Settings::resolve(cli, Some(file));
        assert_eq!(settings.model, "from-cli");
        assert_eq!(settings.output_dir, PathBuf::from("file-dir"));
        assert_eq!(settings.max_revisions, Some(1));
    }
}
