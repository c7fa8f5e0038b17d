use anyhow::Result;
use colored::Colorize;

use storyloops_archive::{ArchiveEntry, RecordKind, SavedRecord, StoryArchive};

pub fn handle_list_command(archive: &StoryArchive, json: bool) -> Result<()> {
    let entries = archive.list()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else if entries.is_empty() {
        println!(
            "{}",
            format!("No stories found in {}.", archive.dir().display()).dimmed()
        );
    } else {
        print_entries_table(&entries);
    }
    Ok(())
}

pub fn handle_show_command(archive: &StoryArchive, id: Option<String>, json: bool) -> Result<()> {
    let id = resolve_story_id(archive, id)?;
    let record = archive.get(&id)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&record)?);
    } else {
        print_record_detail(&record);
    }
    Ok(())
}

fn resolve_story_id(archive: &StoryArchive, id: Option<String>) -> Result<String> {
    if let Some(id) = id {
        return Ok(id);
    }

    // Interactive picker
    let entries = archive.list()?;
    if entries.is_empty() {
        anyhow::bail!("No stories found.");
    }

    let items: Vec<String> = entries
        .iter()
        .map(|e| {
            format!(
                "{} | {:11} | \"{}\"",
                e.datetime.format("%Y-%m-%d %H:%M"),
                kind_label(e.kind),
                preview(&e.title, 60)
            )
        })
        .collect();

    let selection = dialoguer::FuzzySelect::new()
        .with_prompt("Select a story")
        .items(&items)
        .default(0)
        .interact()?;

    Ok(entries[selection].id.clone())
}

fn kind_label(kind: RecordKind) -> &'static str {
    match kind {
        RecordKind::Story => "story",
        RecordKind::CoCreation => "co-creation",
    }
}

fn preview(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        let cut: String = text.chars().take(max_chars).collect();
        format!("{}...", cut)
    } else {
        text.to_string()
    }
}

fn print_entries_table(entries: &[ArchiveEntry]) {
    println!(
        "{:<18} {:<12} {:<28} {}",
        "SAVED".dimmed(),
        "KIND".dimmed(),
        "GENRES".dimmed(),
        "TITLE".dimmed(),
    );

    for e in entries {
        let kind = match e.kind {
            RecordKind::Story => kind_label(e.kind).bright_green().to_string(),
            RecordKind::CoCreation => kind_label(e.kind).bright_magenta().to_string(),
        };
        println!(
            "{:<18} {:<12} {:<28} {}",
            e.datetime.format("%Y-%m-%d %H:%M"),
            kind,
            preview(&e.genres.join(","), 26),
            preview(&e.title, 50)
        );
    }
}

fn print_record_detail(record: &SavedRecord) {
    match record {
        SavedRecord::Story(story) => {
            println!("{}", "=== Story ===".bright_blue().bold());
            println!("{}  {}", "Saved:".dimmed(), story.datetime.format("%Y-%m-%d %H:%M:%S"));
            println!("{}  {}", "Author:".dimmed(), story.author);
            if !story.contact.is_empty() {
                println!("{}  {}", "Contact:".dimmed(), story.contact);
            }
            println!("{}  {}", "Request:".dimmed(), story.user_request);
            if let Some(ref verdict) = story.verdict {
                let accepted = story.accepted_by_critic.unwrap_or(false);
                let verdict = if accepted {
                    verdict.bright_green().to_string()
                } else {
                    verdict.bright_yellow().to_string()
                };
                println!("{}  {}", "Verdict:".dimmed(), verdict);
            }
            println!();
            println!("{}", story.story);
            println!();
            println!("{}", "--- Grimm Brothers Judge ---".dimmed());
            println!("{}", story.judge_feedback);
            println!();
            println!("{}", story.classification.summary());
        }
        SavedRecord::CoCreation(session) => {
            let world = &session.fantasy_world;
            println!("{}", "=== Co-creation ===".bright_blue().bold());
            println!("{}  {}", "Saved:".dimmed(), session.datetime.format("%Y-%m-%d %H:%M:%S"));
            println!("{}  {}", "World:".dimmed(), world.name);
            println!("{}  {}", "Characters:".dimmed(), world.characters_joined());
            println!("{}  {}", "Rules:".dimmed(), world.rules);
            println!();
            println!("{}", session.transcript);
        }
    }
}
