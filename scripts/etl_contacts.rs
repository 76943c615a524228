use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;

use contactdesk_lib::{
    etl::{self, LoadMode, PipelineOptions, Stage},
    Store, StoreConfig,
};

#[derive(Parser)]
#[command(
    name = "etl_contacts",
    about = "Clean a raw contacts CSV and load it into the member table"
)]
struct Cli {
    /// Raw CSV to read
    #[arg(long, value_name = "PATH", default_value = etl::DEFAULT_INPUT)]
    input: PathBuf,

    /// Where to write the cleaned CSV
    #[arg(long, value_name = "PATH", default_value = etl::DEFAULT_OUTPUT)]
    output: PathBuf,

    /// Skip writing the cleaned CSV
    #[arg(long)]
    no_save: bool,

    /// Delete existing member rows before loading
    #[arg(long)]
    replace: bool,

    /// JSON store configuration file
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// SQLite database file (overrides the configured backend)
    #[arg(long, value_name = "PATH")]
    db: Option<PathBuf>,
}

fn print_stage(stage: Stage<'_>) {
    match stage {
        Stage::Extracting { input } => {
            println!("[EXTRACT] Reading data from {} ...", input.display())
        }
        Stage::Transforming => println!("[TRANSFORM] Cleaning and transforming data ..."),
        Stage::Transformed { rows } => println!("[TRANSFORM] Rows after cleaning: {rows}"),
        Stage::Saved { path } => println!("[SAVE] Cleaned data saved to {}", path.display()),
        Stage::Loading { target } => println!("[LOAD] Loading data into {target}"),
        Stage::Loaded { inserted } => {
            println!("[LOAD] Inserted {inserted} rows into 'member' table.")
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = StoreConfig::resolve(cli.config.as_deref(), cli.db.as_deref())?;
    let store = Store::new(&config);
    let options = PipelineOptions {
        input: cli.input,
        output: (!cli.no_save).then_some(cli.output),
        mode: if cli.replace {
            LoadMode::Replace
        } else {
            LoadMode::Append
        },
    };

    let report = etl::run_pipeline_with(&options, &store, print_stage).await?;
    if report.dropped.total() > 0 {
        println!(
            "[TRANSFORM] Dropped {} rows (invalid age: {}, age <= 0: {}, duplicate contact: {})",
            report.dropped.total(),
            report.dropped.invalid_age,
            report.dropped.non_positive_age,
            report.dropped.duplicate_contact
        );
    }
    println!("[DONE] ETL pipeline successfully completed");
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let _log_guard = contactdesk_lib::logging::init();

    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            println!("[ERROR] {err:#}");
            ExitCode::FAILURE
        }
    }
}
