//! Terminal prompts for the interactive modes.

use anyhow::{Context, Result};
use async_trait::async_trait;
use colored::Colorize;
use dialoguer::Input;

use storyloops_core::{Decision, DecisionSource, LoopError};
use storyloops_critic::{Judgement, RevisionKind, WorldContext};

/// Asks the user on the terminal whether to regenerate.
///
/// A closed or broken input stream abandons the session.
pub struct TerminalDecisions {
    /// Print the draft and critic text before asking (when the logger does not)
    echo_texts: bool,
}

impl TerminalDecisions {
    pub fn new(echo_texts: bool) -> Self {
        Self { echo_texts }
    }
}

/// Draft and critic text as shown before a revision question.
fn review_block(story: &str, judgement: &Judgement) -> String {
    format!(
        "\n{}\n{}\n\n{}\n{}\n",
        "--- Your Story ---".bold(),
        story,
        "--- Grimm Brothers Judge ---".bold(),
        judgement.feedback
    )
}

#[async_trait]
impl DecisionSource for TerminalDecisions {
    async fn decide(
        &mut self,
        kind: RevisionKind,
        story: &str,
        judgement: &Judgement,
    ) -> Result<Decision, LoopError> {
        if self.echo_texts {
            eprintln!("{}", review_block(story, judgement));
        }

        let answer = Input::<String>::new()
            .with_prompt(format!("{} (y/n)", kind.question()))
            .allow_empty(true)
            .interact_text();

        match answer {
            Ok(answer) => Ok(Decision::from_answer(&answer)),
            Err(e) => {
                tracing::warn!(error = %e, "Input closed while waiting for a decision");
                Ok(Decision::Abandon)
            }
        }
    }
}

/// Read one free-text line; empty answers are allowed.
pub fn read_line(prompt: &str) -> Result<String> {
    Input::<String>::new()
        .with_prompt(prompt)
        .allow_empty(true)
        .interact_text()
        .with_context(|| format!("Failed to read '{}'", prompt))
}

/// Ask for any world fields not already given on the command line.
pub fn prompt_world(
    name: Option<String>,
    characters: Option<String>,
    rules: Option<String>,
) -> Result<WorldContext> {
    if name.is_none() || characters.is_none() || rules.is_none() {
        eprintln!("\n{}", "Let's create your fantasy world!".bold());
    }

    let name = match name {
        Some(name) => name,
        None => read_line("World name")?,
    };
    let characters = match characters {
        Some(characters) => characters,
        None => read_line("List main characters (comma separated)")?,
    };
    let rules = match rules {
        Some(rules) => rules,
        None => read_line("Briefly describe special rules or magic in your world")?,
    };

    Ok(WorldContext::from_character_list(name, &characters, rules))
}

/// Next co-creation line, or None when input is closed.
pub fn read_turn() -> Option<String> {
    match Input::<String>::new()
        .with_prompt("You")
        .allow_empty(true)
        .interact_text()
    {
        Ok(line) => Some(line),
        Err(e) => {
            tracing::debug!(error = %e, "Co-creation input closed");
            None
        }
    }
}
