//! Binary entry point for autotag.
//!
//! This binary runs the tagging commands against outline files on disk.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(missing_docs)]
// Allow print_stderr in main binary for CLI output
#![allow(clippy::print_stderr)]
#![allow(clippy::print_stdout)]
// Allow multiple crate versions from transitive dependencies
#![allow(clippy::multiple_crate_versions)]

use anyhow::{Context, bail};
use autotag::cli::{OutlineDocument, parse_date, read_stdin};
use autotag::commands::{CMD_BLOCK, CMD_PAGE, CMD_SELECTION};
use autotag::host::ConsoleNotifier;
use autotag::llm::{OpenAiClient, build_prompt};
use autotag::observability::{self, LoggingConfig};
use autotag::services::extract_selection;
use autotag::{
    AutotagConfig, CommandContext, CommandOutcome, CommandRegistry, TaggingService,
    register_default_commands,
};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

/// Autotag - LLM-suggested keyword tags for outliner notes.
#[derive(Parser)]
#[command(name = "autotag")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
enum Commands {
    /// Tag one block of an outline file.
    Block {
        /// Outline file.
        file: PathBuf,

        /// Block path, 1-based and dotted (e.g. 2.1).
        #[arg(short, long)]
        block: String,

        #[command(flatten)]
        run: RunArgs,
    },

    /// Tag a whole page.
    Page {
        /// Outline file.
        file: PathBuf,

        #[command(flatten)]
        run: RunArgs,
    },

    /// Tag a text selection, anchored after a block.
    Selection {
        /// Outline file.
        file: PathBuf,

        /// Block being edited, 1-based and dotted.
        #[arg(short, long)]
        block: String,

        /// Selected text.
        #[arg(short, long, conflicts_with = "stdin", required_unless_present = "stdin")]
        text: Option<String>,

        /// Read the selected text from stdin.
        #[arg(long)]
        stdin: bool,

        #[command(flatten)]
        run: RunArgs,
    },

    /// Print the prompt that would be sent.
    Prompt {
        /// Text to analyze.
        #[arg(conflicts_with = "stdin", required_unless_present = "stdin")]
        text: Option<String>,

        /// Read the text from stdin.
        #[arg(long)]
        stdin: bool,

        /// Reference date (YYYY-MM-DD).
        #[arg(long)]
        date: Option<String>,
    },

    /// Configuration management.
    Config {
        /// Show current configuration.
        #[arg(long)]
        show: bool,
    },
}

/// Flags shared by the tagging commands.
#[derive(Args)]
struct RunArgs {
    /// Reference date (YYYY-MM-DD); defaults to today.
    #[arg(long)]
    date: Option<String>,

    /// Print the resulting outline instead of writing the file.
    #[arg(long)]
    dry_run: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Missing .env is fine
    dotenvy::dotenv().ok();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e:#}");
            return ExitCode::FAILURE;
        },
    };

    let logging = LoggingConfig::from_settings(&config.logging, cli.verbose);
    if let Err(e) = observability::init(&logging) {
        eprintln!("Warning: logging disabled: {e}");
    }

    match run(cli.command, &config) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        },
    }
}

fn load_config(path: Option<&std::path::Path>) -> anyhow::Result<AutotagConfig> {
    let config = match path {
        Some(path) => AutotagConfig::load_from_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => AutotagConfig::load_default(),
    };
    Ok(config.with_env_overrides())
}

/// Runs a command; `Ok(false)` means it was aborted after notifying the user.
fn run(command: Commands, config: &AutotagConfig) -> anyhow::Result<bool> {
    match command {
        Commands::Block { file, block, run } => {
            let doc = OutlineDocument::load(&file)?;
            let ctx = CommandContext::for_block(doc.resolve(&block)?).with_page(doc.page().clone());
            run_tagging(&doc, CMD_BLOCK, &ctx, &run, config)
        },
        Commands::Page { file, run } => {
            let doc = OutlineDocument::load(&file)?;
            let ctx = CommandContext::default().with_page(doc.page().clone());
            run_tagging(&doc, CMD_PAGE, &ctx, &run, config)
        },
        Commands::Selection {
            file,
            block,
            text,
            stdin,
            run,
        } => {
            let doc = OutlineDocument::load(&file)?;
            let selection = read_text(text, stdin)?;
            let ctx = CommandContext::for_block(doc.resolve(&block)?)
                .with_page(doc.page().clone())
                .with_selection(selection);
            run_tagging(&doc, CMD_SELECTION, &ctx, &run, config)
        },
        Commands::Prompt { text, stdin, date } => {
            let content = extract_selection(&read_text(text, stdin)?);
            if content.is_empty() {
                bail!("nothing to analyze: the text is empty");
            }
            let date = reference_date(date.as_deref())?.unwrap_or_else(today);
            println!("{}", build_prompt(&content, date));
            Ok(true)
        },
        Commands::Config { show } => {
            if show {
                print!("{}", config.display_summary());
            } else if let Some(path) = AutotagConfig::default_path() {
                println!("{}", path.display());
            }
            Ok(true)
        },
    }
}

fn run_tagging(
    doc: &OutlineDocument,
    name: &str,
    ctx: &CommandContext,
    run: &RunArgs,
    config: &AutotagConfig,
) -> anyhow::Result<bool> {
    let client = OpenAiClient::from_config(&config.llm);
    let mut service = TaggingService::new(client, doc.host(), Arc::new(ConsoleNotifier::new()))
        .with_extraction(config.extraction);
    if let Some(date) = reference_date(run.date.as_deref())? {
        service = service.with_reference_date(date);
    }

    let mut registry = CommandRegistry::new();
    register_default_commands(&mut registry, Arc::new(service));

    match registry.invoke(name, ctx)? {
        CommandOutcome::Tagged { .. } => {
            if run.dry_run {
                print!("{}", doc.render()?);
            } else {
                doc.save()?;
            }
            Ok(true)
        },
        CommandOutcome::Aborted => Ok(false),
    }
}

fn read_text(text: Option<String>, stdin: bool) -> anyhow::Result<String> {
    match text {
        Some(text) if !stdin => Ok(text),
        _ => Ok(read_stdin()?),
    }
}

fn reference_date(date: Option<&str>) -> anyhow::Result<Option<chrono::NaiveDate>> {
    Ok(date.map(parse_date).transpose()?)
}

fn today() -> chrono::NaiveDate {
    chrono::Local::now().date_naive()
}
