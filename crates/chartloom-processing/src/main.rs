//! CLI entry point for the dataset preprocessing engine.

use anyhow::{Context, Result, anyhow};
use chartloom_processing::{
    ApplyResult, DatasetProfile, DatasetRecord, Engine, EngineConfig, EngineError, FsStorage,
    JsonRecordStore, PreviewResult, TableSnapshot,
};
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use serde::Serialize;
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info};

const DATA_DIR_VAR: &str = "CHARTLOOM_DATA_DIR";
const USER_VAR: &str = "CHARTLOOM_USER";
const DEFAULT_DATA_DIR: &str = "./data";

#[derive(Parser, Debug)]
#[command(
    author = "Chartloom Team",
    version,
    about = "Dataset preprocessing and statistical profiling",
    long_about = "Cleans uploaded comma-separated datasets and profiles their columns.\n\n\
                  ENVIRONMENT VARIABLES:\n  \
                  CHARTLOOM_DATA_DIR    Data directory (default ./data)\n  \
                  CHARTLOOM_USER        Caller identity when --user is not given\n\n\
                  EXAMPLES:\n  \
                  # Register an upload\n  \
                  chartloom-processing --user alice register sales.csv\n\n  \
                  # Preview the cleaning pass\n  \
                  chartloom-processing --user alice preview ds_1\n\n  \
                  # Apply it and print the metadata as JSON\n  \
                  chartloom-processing --user alice --json apply ds_1"
)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Directory holding stored objects and dataset records
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Caller identity
    #[arg(short, long, global = true)]
    user: Option<String>,

    /// JSON file with engine configuration overrides
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Output JSON to stdout instead of human-readable tables
    ///
    /// Disables all logging so stdout carries only JSON.
    #[arg(long, global = true)]
    json: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true, default_value = "info")]
    log_level: String,

    /// Only show warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Store a CSV file as a new dataset
    Register {
        /// Path to the CSV file
        file: PathBuf,

        /// Dataset name (defaults to the file name)
        #[arg(long)]
        name: Option<String>,
    },
    /// Show what preprocessing would change, without persisting anything
    Preview {
        /// Dataset id
        id: String,
    },
    /// Run preprocessing and replace the dataset's artifact
    Apply {
        /// Dataset id
        id: String,
    },
    /// Profile the columns of the dataset's current artifact
    Profile {
        /// Dataset id
        id: String,

        /// Number of leading rows to examine
        #[arg(long)]
        sample_size: Option<usize>,
    },
    /// Show a dataset record
    Show {
        /// Dataset id
        id: String,
    },
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is disabled so stdout only carries
/// the JSON result.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level, args.quiet, args.json);

    dotenv().ok();

    let engine = build_engine(&args)?;
    let user = args
        .user
        .clone()
        .or_else(|| env::var(USER_VAR).ok())
        .unwrap_or_default();

    match run(&engine, &user, &args) {
        Ok(()) => Ok(()),
        Err(e) => {
            if args.json {
                // Errors keep the {code, message} shape in JSON mode.
                println!("{}", serde_json::to_string_pretty(&e)?);
            } else {
                error!("{} failed: {}", command_name(&args.command), e);
            }
            Err(anyhow!("{} ({})", e, e.error_code()))
        }
    }
}

fn build_engine(args: &Args) -> Result<Engine> {
    let data_dir = args
        .data_dir
        .clone()
        .or_else(|| env::var(DATA_DIR_VAR).ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));

    let config = match &args.config {
        Some(path) => EngineConfig::from_json_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => EngineConfig::default(),
    };
    debug!("Using data directory {} with {:?}", data_dir.display(), config);

    let engine = Engine::builder()
        .config(config)
        .storage(Arc::new(FsStorage::new(data_dir.join("objects"))))
        .records(Arc::new(JsonRecordStore::new(data_dir.join("datasets.json"))))
        .build()?;
    Ok(engine)
}

fn run(engine: &Engine, user: &str, args: &Args) -> Result<(), EngineError> {
    match &args.command {
        Command::Register { file, name } => {
            let name = match name {
                Some(name) => name.clone(),
                None => file_name(file),
            };
            let bytes = std::fs::read(file)?;
            info!("Registering {} ({} bytes)", file.display(), bytes.len());
            let record = engine.register(user, &name, &bytes)?;
            emit(args.json, &record, print_record)
        }
        Command::Preview { id } => {
            let preview = engine.preview(user, id)?;
            emit(args.json, &preview, print_preview)
        }
        Command::Apply { id } => {
            let result = engine.apply(user, id)?;
            emit(args.json, &result, print_apply)
        }
        Command::Profile { id, sample_size } => {
            let profile = engine.profile(user, id, *sample_size)?;
            emit(args.json, &profile, print_profile)
        }
        Command::Show { id } => {
            let record = engine.dataset(user, id)?;
            emit(args.json, &record, print_record)
        }
    }
}

fn command_name(command: &Command) -> &'static str {
    match command {
        Command::Register { .. } => "register",
        Command::Preview { .. } => "preview",
        Command::Apply { .. } => "apply",
        Command::Profile { .. } => "profile",
        Command::Show { .. } => "show",
    }
}

fn emit<T: Serialize>(json: bool, value: &T, human: fn(&T)) -> Result<(), EngineError> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        human(value);
    }
    Ok(())
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

// ============================================================================
// Human-readable output
// ============================================================================
//
// These use `println!` on purpose: the output is the command's result and
// must show regardless of log level.

fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

fn section(title: &str) {
    println!("{}", title);
    println!("{}", "-".repeat(40));
}

fn print_record(record: &DatasetRecord) {
    println!("\n{}", "=".repeat(80));
    println!("DATASET {}", record.id);
    println!("{}\n", "=".repeat(80));
    println!("  Name:            {}", record.name);
    println!("  Owner:           {}", record.user_id);
    println!("  Status:          {:?}", record.preprocessing_status);
    println!("  Rows:            {}", record.row_count);
    println!("  Original rows:   {}", record.original_row_count);
    println!("  Artifact:        {}", record.file_path);
    println!("  Raw upload:      {}", record.original_file_path);
    println!("  Revision:        {}", record.revision);
    println!("  Updated:         {}", record.updated_at.to_rfc3339());
    if let Some(metadata) = &record.preprocessing_metadata {
        println!("  Last processed:  {}", metadata.processed_at.to_rfc3339());
    }
    println!();
}

fn print_snapshot(title: &str, snapshot: &TableSnapshot) {
    section(title);
    println!(
        "  {} rows x {} columns",
        snapshot.row_count, snapshot.column_count
    );
    let header: Vec<String> = snapshot
        .sample
        .headers
        .iter()
        .map(|h| format!("{:<14}", truncate_str(h, 13)))
        .collect();
    println!("  {}", header.join(" "));
    for row in &snapshot.sample.rows {
        let cells: Vec<String> = row
            .iter()
            .map(|c| format!("{:<14}", truncate_str(c, 13)))
            .collect();
        println!("  {}", cells.join(" "));
    }
    println!();
}

fn print_preview(preview: &PreviewResult) {
    println!("\n{}", "=".repeat(80));
    println!("PREVIEW - nothing has been written");
    println!("{}\n", "=".repeat(80));

    section("STEPS");
    for (i, step) in preview.steps.iter().enumerate() {
        println!("  {}. {}", i + 1, step);
    }
    println!();

    section("CHANGES");
    println!("  Empty rows removed:  {}", preview.changes.empty_rows_removed);
    println!("  Duplicates removed:  {}", preview.changes.duplicates_removed);
    println!("  Cells imputed:       {}", preview.changes.cells_imputed);
    println!();

    section("COLUMNS");
    println!(
        "{:<20} {:<12} {:<10} {:<10} {:<15}",
        "Column", "Type", "Missing", "After", "Fill value"
    );
    println!("{}", "-".repeat(70));
    for change in &preview.column_changes {
        println!(
            "{:<20} {:<12} {:<10} {:<10} {:<15}",
            truncate_str(&change.name, 19),
            change.kind,
            change.missing_before,
            change.missing_after,
            change.imputation_value.as_deref().unwrap_or("-")
        );
    }
    println!();

    print_snapshot("ORIGINAL SAMPLE", &preview.original);
    print_snapshot("PROCESSED SAMPLE", &preview.processed);
}

fn print_apply(result: &ApplyResult) {
    println!("\n{}", "=".repeat(80));
    println!("PREPROCESSING APPLIED");
    println!("{}\n", "=".repeat(80));
    println!(
        "  Rows: {} -> {}",
        result.original_row_count, result.processed_row_count
    );
    println!(
        "  Empty rows removed: {}, duplicates removed: {}, cells imputed: {}",
        result.metadata.changes.empty_rows_removed,
        result.metadata.changes.duplicates_removed,
        result.metadata.changes.cells_imputed
    );
    println!("  Processed at: {}", result.metadata.processed_at.to_rfc3339());
    println!();
}

fn print_profile(profile: &DatasetProfile) {
    println!("\n{}", "=".repeat(80));
    println!("PROFILE {}", profile.dataset_id);
    println!("{}\n", "=".repeat(80));
    println!(
        "  {} rows x {} columns, {} rows sampled",
        profile.row_count, profile.column_count, profile.sample_size
    );
    println!();

    println!(
        "{:<20} {:<12} {:<10} {:<10} {:<12} {:<20}",
        "Column", "Type", "Valid %", "Missing %", "Mismatch %", "Summary"
    );
    println!("{}", "-".repeat(86));
    for col in &profile.columns {
        let summary = match (&col.numeric, &col.categorical) {
            (Some(n), _) => format!("mean {:.2}, median {:.2}", n.mean, n.median),
            (_, Some(c)) => format!(
                "{} unique, top '{}'",
                c.unique_count,
                truncate_str(&c.most_common_value, 12)
            ),
            _ => "-".to_string(),
        };
        println!(
            "{:<20} {:<12} {:<10.1} {:<10.1} {:<12.1} {:<20}",
            truncate_str(&col.name, 19),
            col.kind,
            col.valid_pct,
            col.missing_pct,
            col.mismatched_pct,
            summary
        );
    }
    println!();
}
