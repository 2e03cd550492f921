//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_export;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::display::{format_change, format_currency_with};
use crate::domain::error::ScreenerError;
use crate::domain::instrument::{InstrumentRecord, SourceTag};
use crate::domain::normalizer::{normalize_json_str, NormalizedBatch};
use crate::domain::parameter::ParameterRegistry;
use crate::domain::screen::ScreenDefinition;
use crate::domain::screen_config::{build_screen, validate_screen_config, DisplaySettings};
use crate::domain::screen_eval::{rank_by, CompiledScreen, RankKey, SortDirection};
use crate::ports::config_port::ConfigPort;

#[derive(Parser, Debug)]
#[command(name = "screener", about = "Stock screener and instrument normalizer")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List screenable parameters grouped by category
    Params {
        #[arg(long)]
        json: bool,
    },
    /// Normalize an upstream payload into instrument records
    Normalize {
        #[arg(short, long)]
        source: SourceTag,
        #[arg(short, long)]
        input: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Run a screen over a normalized universe
    Screen {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        source: SourceTag,
        #[arg(short, long)]
        input: PathBuf,
        #[arg(long)]
        sort: Option<RankKey>,
        #[arg(long)]
        desc: bool,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Manage saved screens
    Screens {
        #[command(subcommand)]
        action: ScreensCommand,
    },
}

#[derive(Subcommand, Debug)]
pub enum ScreensCommand {
    /// Save the screen described by a screen file
    Save {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        screen: PathBuf,
    },
    /// List saved screens
    List {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Show one saved screen
    Show {
        #[arg(short, long)]
        config: PathBuf,
        id: String,
    },
    /// Delete a saved screen
    Delete {
        #[arg(short, long)]
        config: PathBuf,
        id: String,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Params { json } => run_params(json),
        Command::Normalize {
            source,
            input,
            json,
        } => run_normalize(source, &input, json),
        Command::Screen {
            config,
            source,
            input,
            sort,
            desc,
            output,
        } => run_screen(&config, source, &input, sort, desc, output.as_deref()),
        Command::Screens { action } => run_screens(action),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ScreenerError> {
    tracing::info!(path = %path.display(), "loading config");
    FileConfigAdapter::from_file(path)
}

fn run_params(json: bool) -> Result<(), ScreenerError> {
    let registry = ParameterRegistry::global();
    if json {
        println!("{}", serde_json::to_string_pretty(&registry.list_by_category())?);
    } else {
        print!("{}", render_parameters(registry));
    }
    Ok(())
}

pub fn render_parameters(registry: &ParameterRegistry) -> String {
    let mut out = String::new();
    for (category, params) in registry.list_by_category() {
        let _ = writeln!(out, "{}", category.as_str());
        for p in params {
            let ops: Vec<&str> = p.allowed_operators.iter().map(|op| op.symbol()).collect();
            let value_type = format!("{:?}", p.value_type);
            let _ = writeln!(out, "  {:<20} {:<11} {}", p.key, value_type, ops.join(" "));
        }
    }
    out
}

fn read_batch(source: SourceTag, input: &Path) -> Result<NormalizedBatch, ScreenerError> {
    let text = fs::read_to_string(input)?;
    let batch = normalize_json_str(source, &text)?;
    if !batch.dropped.is_empty() {
        tracing::info!(
            source = %source,
            dropped = batch.dropped.len(),
            "some upstream items were dropped"
        );
    }
    Ok(batch)
}

fn run_normalize(source: SourceTag, input: &Path, json: bool) -> Result<(), ScreenerError> {
    let batch = read_batch(source, input)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&batch.records)?);
    } else {
        print!("{}", render_table(&batch.records, &DisplaySettings::default()));
    }
    Ok(())
}

/// Result of running a configured screen over one payload.
#[derive(Debug)]
pub struct ScreenRun {
    pub screen: ScreenDefinition,
    pub display: DisplaySettings,
    pub batch: NormalizedBatch,
    pub matches: Vec<InstrumentRecord>,
}

pub fn screen_payload(
    config: &dyn ConfigPort,
    source: SourceTag,
    payload: &str,
    ranking: Option<(RankKey, SortDirection)>,
) -> Result<ScreenRun, ScreenerError> {
    validate_screen_config(config)?;
    let screen = build_screen(config)?;
    let display = DisplaySettings::from_config(config);
    let batch = normalize_json_str(source, payload)?;

    let registry = ParameterRegistry::global();
    for (index, err) in screen.invalid_conditions(registry) {
        tracing::warn!(screen = screen.id(), index, %err, "condition ignored");
    }

    let compiled = CompiledScreen::compile(&screen, registry);
    let mut matches = compiled.filter(&batch.records);
    if let Some((key, direction)) = ranking {
        matches = rank_by(&matches, key, direction);
    }

    tracing::info!(
        screen = screen.id(),
        universe = batch.records.len(),
        matched = matches.len(),
        active = compiled.active(),
        skipped = compiled.skipped(),
        "screen evaluated"
    );

    Ok(ScreenRun {
        screen,
        display,
        batch,
        matches,
    })
}

fn run_screen(
    config_path: &Path,
    source: SourceTag,
    input: &Path,
    sort: Option<RankKey>,
    desc: bool,
    output: Option<&Path>,
) -> Result<(), ScreenerError> {
    let config = load_config(config_path)?;
    let payload = fs::read_to_string(input)?;
    let direction = if desc {
        SortDirection::Descending
    } else {
        SortDirection::Ascending
    };

    let run = screen_payload(&config, source, &payload, sort.map(|key| (key, direction)))?;

    match output {
        Some(path) => {
            csv_export::export_to_path(path, &run.matches)?;
            tracing::info!(path = %path.display(), rows = run.matches.len(), "wrote results");
        }
        None => {
            let total = run.batch.records.len();
            println!("{} ({} of {})", run.screen.name(), run.matches.len(), total);
            print!("{}", render_table(&run.matches, &run.display));
        }
    }
    Ok(())
}

pub fn render_table(records: &[InstrumentRecord], display: &DisplaySettings) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<12} {:<32} {:>16} {:>20}",
        "SYMBOL", "NAME", "PRICE", "CHANGE"
    );
    for r in records {
        let change = match r.error_message() {
            Some(message) => format!("! {message}"),
            None => format_change(r),
        };
        let _ = writeln!(
            out,
            "{:<12} {:<32} {:>16} {:>20}",
            r.display_symbol(),
            r.display_name(),
            format_currency_with(r.price(), &display.currency_symbol),
            change
        );
    }
    out
}

#[cfg(feature = "sqlite")]
fn run_screens(action: ScreensCommand) -> Result<(), ScreenerError> {
    use crate::adapters::sqlite_store::SqliteScreenStore;
    use crate::ports::screen_store::ScreenStore;

    let config_path = match &action {
        ScreensCommand::Save { config, .. }
        | ScreensCommand::List { config }
        | ScreensCommand::Show { config, .. }
        | ScreensCommand::Delete { config, .. } => config.clone(),
    };
    let config = load_config(&config_path)?;
    let store = SqliteScreenStore::from_config(&config)?;

    match action {
        ScreensCommand::Save { screen, .. } => {
            let screen_config = load_config(&screen)?;
            validate_screen_config(&screen_config)?;
            let definition = build_screen(&screen_config)?;
            store.save(&definition)?;
            println!("{}", definition.id());
        }
        ScreensCommand::List { .. } => {
            for screen in store.list()? {
                println!("{}\t{}\t{}", screen.id(), screen.name(), screen.len());
            }
        }
        ScreensCommand::Show { id, .. } => {
            print!("{}", describe_screen(&store.load(&id)?, ParameterRegistry::global()));
        }
        ScreensCommand::Delete { id, .. } => {
            store.delete(&id)?;
            tracing::info!(id = %id, "deleted screen");
        }
    }
    Ok(())
}

#[cfg(not(feature = "sqlite"))]
fn run_screens(_action: ScreensCommand) -> Result<(), ScreenerError> {
    Err(ScreenerError::Database {
        reason: "sqlite feature is required for saved screens".into(),
    })
}

/// One line per condition; invalid ones are flagged with their reason.
pub fn describe_screen(screen: &ScreenDefinition, registry: &ParameterRegistry) -> String {
    let invalid = screen.invalid_conditions(registry);
    let mut out = String::new();
    let _ = writeln!(out, "{} ({})", screen.name(), screen.id());
    for (index, condition) in screen.conditions().enumerate() {
        match invalid.iter().find(|(i, _)| *i == index) {
            Some((_, err)) => {
                let _ = writeln!(out, "  {condition}  [ignored: {err}]");
            }
            None => {
                let _ = writeln!(out, "  {condition}");
            }
        }
    }
    out
}
