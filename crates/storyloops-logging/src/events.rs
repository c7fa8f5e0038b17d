use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Structured log events for a story session
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LogEvent {
    SessionStarted {
        request: String,
        world: Option<String>,
    },
    DraftStarted {
        iteration: usize,
    },
    DraftCompleted {
        iteration: usize,
        words: usize,
        duration_secs: f64,
        model: String,
        output_tokens: Option<u32>,
    },
    /// Full text of a draft, for display
    StoryText {
        iteration: usize,
        text: String,
    },
    JudgeStarted {
        iteration: usize,
    },
    /// Full critic feedback, for display
    JudgeFeedback {
        iteration: usize,
        text: String,
    },
    JudgeCompleted {
        iteration: usize,
        verdict: String,
    },
    RevisionRequested {
        iteration: usize,
        kind: String,
    },
    RevisionDeclined {
        iteration: usize,
    },
    RevisionLimitReached {
        revisions: usize,
    },
    LoopCompleted {
        iterations: usize,
        accepted_by_critic: bool,
        duration_secs: f64,
    },
    LoopAbandoned {
        iterations: usize,
    },
    ClassificationCompleted {
        genres: Vec<String>,
        lesson: String,
        parsed: bool,
    },
    CoCreationStarted {
        world: String,
    },
    CoCreationReply {
        turn: usize,
        text: String,
    },
    RecordSaved {
        path: PathBuf,
    },
    ErrorEncountered {
        iteration: usize,
        error: String,
    },
}

impl LogEvent {
    /// Add a timestamp to serialize with the event
    fn with_timestamp(&self) -> serde_json::Value {
        let mut value = serde_json::to_value(self).unwrap_or_default();
        if let Some(obj) = value.as_object_mut() {
            obj.insert(
                "timestamp".to_string(),
                serde_json::Value::String(chrono::Utc::now().to_rfc3339()),
            );
        }
        value
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable format with colors and visual structure
    #[default]
    Pretty,
    /// JSON lines format for machine consumption
    Json,
    /// Compact single-line format
    Compact,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            "compact" => Ok(LogFormat::Compact),
            _ => Err(format!("Unknown log format: {}", s)),
        }
    }
}

const RULE_WIDTH: usize = 69;

/// Logger for storyloops events - handles both console output and file logging
pub struct Logger {
    format: LogFormat,
    file_writer: Option<Mutex<File>>,
}

impl Logger {
    pub fn new(format: LogFormat) -> Self {
        Self {
            format,
            file_writer: None,
        }
    }

    /// Create a logger with file output in addition to console
    pub fn with_file(format: LogFormat, log_path: &Path) -> std::io::Result<Self> {
        if let Some(parent) = log_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_path)?;

        Ok(Self {
            format,
            file_writer: Some(Mutex::new(file)),
        })
    }

    pub fn format(&self) -> LogFormat {
        self.format
    }

    pub fn log(&self, event: &LogEvent) {
        // File output is always JSON
        if let Some(ref writer) = self.file_writer {
            if let Ok(mut file) = writer.lock() {
                let json = event.with_timestamp();
                let _ = writeln!(file, "{}", json);
            }
        }

        match self.format {
            LogFormat::Json => self.log_json(event),
            LogFormat::Pretty => self.log_pretty(event),
            LogFormat::Compact => self.log_compact(event),
        }
    }

    fn log_json(&self, event: &LogEvent) {
        if let Ok(json) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{}", json);
        }
    }

    fn log_pretty(&self, event: &LogEvent) {
        let mut stderr = std::io::stderr();
        match event {
            LogEvent::SessionStarted { request, world } => {
                let _ = writeln!(stderr);
                let _ = writeln!(
                    stderr,
                    "{}",
                    format!("╭{}╮", "─".repeat(RULE_WIDTH)).bright_blue()
                );
                let _ = writeln!(
                    stderr,
                    "{}  {}",
                    "│".bright_blue(),
                    "storyloops".bold().bright_white()
                );
                let _ = writeln!(
                    stderr,
                    "{}  {} {}",
                    "│".bright_blue(),
                    "Request:".dimmed(),
                    Self::truncate(request, 58).dimmed()
                );
                if let Some(world) = world {
                    let _ = writeln!(
                        stderr,
                        "{}  {} {}",
                        "│".bright_blue(),
                        "World:".dimmed(),
                        Self::truncate(world, 60).dimmed()
                    );
                }
                let _ = writeln!(
                    stderr,
                    "{}",
                    format!("╰{}╯", "─".repeat(RULE_WIDTH)).bright_blue()
                );
                let _ = writeln!(stderr);
            }
            LogEvent::DraftStarted { iteration } => {
                let draft_text = format!("─ Draft {} ", iteration + 1);
                let padding = "─".repeat(RULE_WIDTH.saturating_sub(draft_text.chars().count()));
                let _ = writeln!(
                    stderr,
                    "{}{}{}",
                    "┌".bright_blue(),
                    draft_text.bright_blue().bold(),
                    padding.bright_blue()
                );
                let _ = writeln!(stderr);
                let _ = writeln!(
                    stderr,
                    "  {} {}",
                    "▶".bright_cyan(),
                    "STORYTELLER".bright_cyan().bold()
                );
            }
            LogEvent::DraftCompleted {
                words,
                duration_secs,
                model,
                output_tokens,
                ..
            } => {
                let usage = match output_tokens {
                    Some(tokens) => format!("{}, {} tokens", model, tokens),
                    None => model.clone(),
                };
                let _ = writeln!(
                    stderr,
                    "    {} {} words ({:.1}s) {}",
                    "✓".bright_green(),
                    words,
                    duration_secs,
                    format!("[{}]", usage).dimmed()
                );
                let _ = writeln!(stderr);
            }
            LogEvent::StoryText { text, .. } | LogEvent::JudgeFeedback { text, .. } => {
                let prefix = "    │".dimmed();
                for line in text.lines() {
                    let _ = writeln!(stderr, "{} {}", prefix, line);
                }
                let _ = writeln!(stderr);
            }
            LogEvent::JudgeStarted { .. } => {
                let _ = writeln!(
                    stderr,
                    "  {} {}",
                    "▶".bright_magenta(),
                    "GRIMM BROTHERS".bright_magenta().bold()
                );
            }
            LogEvent::JudgeCompleted { verdict, .. } => {
                let styled = if verdict.contains("ACCEPT") {
                    format!("✓ Verdict: {}", verdict).bright_green().to_string()
                } else if verdict.contains("UNRECOGNIZED") {
                    format!("? Verdict: {}", verdict).bright_red().to_string()
                } else {
                    format!("→ Verdict: {}", verdict).bright_yellow().to_string()
                };
                let _ = writeln!(stderr, "    {}", styled);
                let _ = writeln!(stderr);
                let _ = writeln!(
                    stderr,
                    "{}",
                    format!("└{}┘", "─".repeat(RULE_WIDTH)).bright_blue()
                );
                let _ = writeln!(stderr);
            }
            LogEvent::RevisionRequested { kind, .. } => {
                let _ = writeln!(
                    stderr,
                    "{} Regenerating after {} revision request",
                    "↻".bright_cyan(),
                    kind
                );
            }
            LogEvent::RevisionDeclined { .. } => {
                let _ = writeln!(
                    stderr,
                    "{} Keeping the current draft",
                    "•".bright_yellow()
                );
            }
            LogEvent::RevisionLimitReached { revisions } => {
                let _ = writeln!(
                    stderr,
                    "{} Revision limit reached ({}), keeping the current draft",
                    "⚠".bright_yellow(),
                    revisions
                );
            }
            LogEvent::LoopCompleted {
                accepted_by_critic, ..
            } => {
                if *accepted_by_critic {
                    let _ = writeln!(
                        stderr,
                        "{} The Grimm Brothers have accepted your story!",
                        "✓".bright_green()
                    );
                }
            }
            LogEvent::LoopAbandoned { iterations } => {
                let _ = writeln!(
                    stderr,
                    "{} Session abandoned after {} draft(s)",
                    "✗".bright_red(),
                    iterations
                );
            }
            LogEvent::ClassificationCompleted { parsed, .. } => {
                if !parsed {
                    let _ = writeln!(
                        stderr,
                        "{} Classifier output could not be parsed",
                        "⚠".bright_yellow()
                    );
                }
            }
            LogEvent::CoCreationStarted { world } => {
                let _ = writeln!(stderr);
                let _ = writeln!(
                    stderr,
                    "{} World '{}' is ready!",
                    "✓".bright_green(),
                    world.bold()
                );
                let _ = writeln!(
                    stderr,
                    "{}",
                    "Type anything to interact with the world. Type 'exit' to end co-creation and save."
                        .dimmed()
                );
            }
            LogEvent::CoCreationReply { .. } => {
                // Replies are printed by the CLI as part of the conversation
            }
            LogEvent::RecordSaved { path } => {
                let _ = writeln!(
                    stderr,
                    "{} Saved to {}",
                    "✓".bright_green(),
                    path.display()
                );
            }
            LogEvent::ErrorEncountered { iteration, error } => {
                let _ = writeln!(stderr);
                let _ = writeln!(
                    stderr,
                    "{} Error in draft {}: {}",
                    "✗".bright_red(),
                    iteration + 1,
                    error.bright_red()
                );
            }
        }
    }

    fn log_compact(&self, event: &LogEvent) {
        let mut stderr = std::io::stderr();
        let timestamp = chrono::Utc::now().format("%H:%M:%S");
        let msg = match event {
            LogEvent::SessionStarted { .. } => format!("[{}] session:start", timestamp),
            LogEvent::DraftStarted { iteration } => {
                format!("[{}] draft:start:{}", timestamp, iteration + 1)
            }
            LogEvent::DraftCompleted {
                iteration,
                words,
                duration_secs,
                model,
                output_tokens,
            } => format!(
                "[{}] draft:done:{} words={} tokens={} model={} {:.1}s",
                timestamp,
                iteration + 1,
                words,
                output_tokens.map_or_else(|| "-".to_string(), |t| t.to_string()),
                model,
                duration_secs
            ),
            LogEvent::JudgeStarted { iteration } => {
                format!("[{}] judge:start:{}", timestamp, iteration + 1)
            }
            LogEvent::JudgeCompleted { iteration, verdict } => {
                format!("[{}] judge:done:{} {}", timestamp, iteration + 1, verdict)
            }
            LogEvent::RevisionRequested { iteration, kind } => {
                format!("[{}] revise:{} {}", timestamp, iteration + 1, kind)
            }
            LogEvent::RevisionDeclined { iteration } => {
                format!("[{}] keep:{}", timestamp, iteration + 1)
            }
            LogEvent::RevisionLimitReached { revisions } => {
                format!("[{}] loop:limit:{}", timestamp, revisions)
            }
            LogEvent::LoopCompleted {
                iterations,
                accepted_by_critic,
                duration_secs,
            } => format!(
                "[{}] loop:done:{} accepted={} {:.1}s",
                timestamp, iterations, accepted_by_critic, duration_secs
            ),
            LogEvent::LoopAbandoned { iterations } => {
                format!("[{}] loop:abandoned:{}", timestamp, iterations)
            }
            LogEvent::ClassificationCompleted { genres, parsed, .. } => format!(
                "[{}] classify:done parsed={} genres={}",
                timestamp,
                parsed,
                genres.join(",")
            ),
            LogEvent::CoCreationStarted { world } => {
                format!("[{}] world:start {}", timestamp, world)
            }
            LogEvent::RecordSaved { path } => {
                format!("[{}] saved {}", timestamp, path.display())
            }
            LogEvent::ErrorEncountered { iteration, error } => {
                format!("[{}] error:{}:{}", timestamp, iteration + 1, error)
            }
            // Full texts are only shown in pretty mode
            LogEvent::StoryText { .. }
            | LogEvent::JudgeFeedback { .. }
            | LogEvent::CoCreationReply { .. } => return,
        };
        let _ = writeln!(stderr, "{}", msg);
    }

    fn truncate(s: &str, max_chars: usize) -> String {
        if s.chars().count() > max_chars {
            let head: String = s.chars().take(max_chars.saturating_sub(3)).collect();
            format!("{}...", head)
        } else {
            s.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_log_format_from_str() {
        assert_eq!("pretty".parse::<LogFormat>().unwrap(), LogFormat::Pretty);
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("compact".parse::<LogFormat>().unwrap(), LogFormat::Compact);
        assert!("xml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn test_event_serializes_with_tag() {
        let event = LogEvent::JudgeCompleted {
            iteration: 2,
            verdict: "ACCEPT".to_string(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "judge_completed");
        assert_eq!(json["iteration"], 2);
        assert_eq!(json["verdict"], "ACCEPT");
    }

    #[test]
    fn test_file_output_is_json_lines_with_timestamp() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("logs").join("session.jsonl");
        let logger = Logger::with_file(LogFormat::Compact, &path).unwrap();

        logger.log(&LogEvent::DraftStarted { iteration: 0 });
        logger.log(&LogEvent::RevisionDeclined { iteration: 0 });

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<serde_json::Value> = content
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["event"], "draft_started");
        assert_eq!(lines[1]["event"], "revision_declined");
        assert!(lines[0]["timestamp"].is_string());
    }

    #[test]
    fn test_truncate_counts_chars() {
        assert_eq!(Logger::truncate("short", 10), "short");
        assert_eq!(Logger::truncate("ééééééééééé", 6), "ééé...");
    }
}
