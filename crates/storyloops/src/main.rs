mod config;
mod interactive;
mod stories;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use serde::Serialize;

use storyloops_agent::create_generator;
use storyloops_archive::StoryArchive;
use storyloops_core::{
    is_exit_command, CoCreationSession, SessionResult, StoryRequest, StorySession, Termination,
};
use storyloops_critic::{Classification, StoryPrompts};
use storyloops_logging::{init_tracing, LogEvent, LogFormat, Logger};

use crate::config::{CliOverrides, ProjectConfig, Settings};
use crate::interactive::{prompt_world, read_line, read_turn, TerminalDecisions};

#[derive(Parser, Debug)]
#[command(
    name = "storyloops",
    about = "Bedtime-story writer with a critic in the loop",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Log output format
    #[arg(long, value_enum, default_value = "pretty", global = true)]
    log_format: LogFormatChoice,

    /// Tracing level (RUST_LOG overrides)
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,

    /// Also write events as JSON lines to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Chat model to use
    #[arg(short, long, global = true)]
    model: Option<String>,

    /// Base URL of an OpenAI-compatible API
    #[arg(long, global = true)]
    api_base: Option<String>,

    /// Directory for saved stories (default: ./stories)
    #[arg(short, long, global = true)]
    output_dir: Option<PathBuf>,

    /// Maximum rewrites before the current draft is kept (default: unlimited)
    #[arg(short = 'n', long, global = true)]
    max_revisions: Option<usize>,

    /// Dry run: show what would happen without calling the model
    #[arg(long, global = true)]
    dry_run: bool,

    /// Output final result as JSON
    #[arg(long, global = true)]
    json_output: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write a story, judge it, and revise until you are happy
    Story {
        /// What the story should be about (asked interactively if omitted)
        #[arg(short, long)]
        request: Option<String>,

        #[command(flatten)]
        world: WorldArgs,

        /// File name inside the output directory
        #[arg(long)]
        save_as: Option<String>,
    },

    /// Build a fantasy world and write a story in it turn by turn
    World {
        #[command(flatten)]
        world: WorldArgs,

        /// File name inside the output directory
        #[arg(long)]
        save_as: Option<String>,
    },

    /// List saved stories
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show one saved story
    Show {
        /// Story id (launches interactive picker if omitted)
        id: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(clap::Args, Debug, Default)]
struct WorldArgs {
    /// Fantasy world name
    #[arg(long)]
    world_name: Option<String>,

    /// Main characters, comma separated
    #[arg(long)]
    characters: Option<String>,

    /// Special rules or magic of the world
    #[arg(long)]
    rules: Option<String>,
}

impl WorldArgs {
    fn is_empty(&self) -> bool {
        self.world_name.is_none() && self.characters.is_none() && self.rules.is_none()
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormatChoice {
    Pretty,
    Json,
    Compact,
}

impl From<LogFormatChoice> for LogFormat {
    fn from(choice: LogFormatChoice) -> Self {
        match choice {
            LogFormatChoice::Pretty => LogFormat::Pretty,
            LogFormatChoice::Json => LogFormat::Json,
            LogFormatChoice::Compact => LogFormat::Compact,
        }
    }
}

/// Machine-readable result of a story session
#[derive(Serialize)]
struct StoryReport<'a> {
    outcome: &'a storyloops_core::LoopOutcome,
    classification: Option<Classification>,
    saved_to: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_format: LogFormat = cli.log_format.into();
    init_tracing(&cli.log_level, log_format);

    let working_dir = std::env::current_dir().context("Failed to get current directory")?;
    let file_config = ProjectConfig::discover(&working_dir)?;
    let settings = Settings::resolve(
        CliOverrides {
            model: cli.model.clone(),
            api_base: cli.api_base.clone(),
            output_dir: cli.output_dir.clone(),
            max_revisions: cli.max_revisions,
        },
        file_config,
    );

    let logger = match cli.log_file {
        Some(ref path) => Logger::with_file(log_format, path)
            .with_context(|| format!("Failed to open log file {}", path.display()))?,
        None => Logger::new(log_format),
    };
    let logger = Arc::new(logger);
    let archive = StoryArchive::with_dir(settings.output_dir.clone());
    let flags = RunFlags {
        dry_run: cli.dry_run,
        json_output: cli.json_output,
    };

    let command = match cli.command {
        Some(command) => command,
        None => choose_mode()?,
    };

    let exit_code = match command {
        Commands::Story {
            request,
            world,
            save_as,
        } => {
            run_story(&flags, &settings, logger, &archive, request, world, save_as).await?
        }
        Commands::World { world, save_as } => {
            run_world(&flags, &settings, logger, &archive, world, save_as).await?
        }
        Commands::List { json } => {
            stories::handle_list_command(&archive, json || flags.json_output)?;
            0
        }
        Commands::Show { id, json } => {
            stories::handle_show_command(&archive, id, json || flags.json_output)?;
            0
        }
    };

    std::process::exit(exit_code);
}

/// Output switches shared by both interactive modes
struct RunFlags {
    dry_run: bool,
    json_output: bool,
}

fn choose_mode() -> Result<Commands> {
    eprintln!("\n{}", "--- Bedtime Story Generator ---".bold());
    let selection = dialoguer::Select::new()
        .with_prompt("Choose mode")
        .items(&["Normal story", "Fantasy World co-creation"])
        .default(0)
        .interact()
        .context("Failed to read mode selection")?;

    Ok(match selection {
        0 => Commands::Story {
            request: None,
            world: WorldArgs::default(),
            save_as: None,
        },
        _ => Commands::World {
            world: WorldArgs::default(),
            save_as: None,
        },
    })
}

async fn run_story(
    flags: &RunFlags,
    settings: &Settings,
    logger: Arc<Logger>,
    archive: &StoryArchive,
    request: Option<String>,
    world: WorldArgs,
    save_as: Option<String>,
) -> Result<i32> {
    let user_request = match request {
        Some(request) => request,
        None => read_line("What kind of story do you want to hear?")?,
    };
    let mut story_request = StoryRequest::new(user_request);
    if !world.is_empty() {
        story_request =
            story_request.with_world(prompt_world(world.world_name, world.characters, world.rules)?);
    }

    if flags.dry_run {
        print_dry_run(settings, archive);
        println!("Story prompt:\n{}", story_request.story_prompt());
        return Ok(0);
    }

    let generator = create_generator(settings.generator_config())
        .context("Failed to create the story generator")?;

    let session = StorySession::new(generator.as_ref(), Arc::clone(&logger))
        .with_max_revisions(settings.max_revisions);
    let mut decisions = TerminalDecisions::new(logger.format() != LogFormat::Pretty);
    let result = session.run(story_request, &mut decisions).await?;

    let saved_to = match result.to_record(&settings.author) {
        Some(record) => {
            let path = archive.save_story(&record, save_as.as_deref())?;
            logger.log(&LogEvent::RecordSaved { path: path.clone() });
            Some(path)
        }
        None => None,
    };

    if flags.json_output {
        let report = StoryReport {
            outcome: &result.outcome,
            classification: result.classification(),
            saved_to,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_outcome(&result);
    }

    Ok(result.outcome.exit_code())
}

async fn run_world(
    flags: &RunFlags,
    settings: &Settings,
    logger: Arc<Logger>,
    archive: &StoryArchive,
    world: WorldArgs,
    save_as: Option<String>,
) -> Result<i32> {
    let world = prompt_world(world.world_name, world.characters, world.rules)?;

    if flags.dry_run {
        print_dry_run(settings, archive);
        println!("System message:\n{}", StoryPrompts::build_world_system_prompt(&world));
        return Ok(0);
    }

    let generator = create_generator(settings.generator_config())
        .context("Failed to create the story generator")?;
    let mut session = CoCreationSession::new(generator.as_ref(), world, Arc::clone(&logger));

    while let Some(line) = read_turn() {
        if is_exit_command(&line) {
            break;
        }
        let reply = session.take_turn(&line).await?;
        println!("{} {}\n", "AI:".bright_cyan().bold(), reply);
    }

    let record = session.into_record();
    let path = archive.save_co_creation(&record, save_as.as_deref())?;
    logger.log(&LogEvent::RecordSaved { path: path.clone() });

    if flags.json_output {
        println!("{}", serde_json::to_string_pretty(&record)?);
    } else {
        eprintln!("Fantasy session saved.");
    }
    Ok(0)
}

fn print_dry_run(settings: &Settings, archive: &StoryArchive) {
    println!("=== Dry Run ===");
    println!("Model: {}", settings.model);
    println!("API base: {}", settings.api_base);
    println!("Output dir: {}", archive.dir().display());
    match settings.max_revisions {
        Some(max) => println!("Max revisions: {}", max),
        None => println!("Max revisions: unlimited"),
    }
    println!("Author: {}", settings.author.name);
}

fn print_outcome(result: &SessionResult) {
    let outcome = &result.outcome;

    eprintln!();
    match outcome.termination {
        Termination::CriticAccepted => eprintln!("=== ACCEPTED ==="),
        Termination::RevisionDeclined => eprintln!("=== KEPT ({}) ===", outcome.verdict),
        Termination::RevisionLimitReached => {
            eprintln!("=== REVISION LIMIT REACHED ({}) ===", outcome.verdict)
        }
        Termination::Abandoned => {
            eprintln!("=== ABANDONED ===");
            eprintln!("Nothing was saved.");
            return;
        }
    }
    eprintln!("Drafts: {}", outcome.iterations);
    eprintln!("Duration: {:.1}s", outcome.total_duration_secs);

    println!("\n--- Your Story ---\n{}\n", outcome.story);
    if let Some(classification) = result.classification() {
        println!("--- Story Classification ---\n{}\n", classification.summary());
    }
}
