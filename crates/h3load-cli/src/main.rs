//! h3load CLI: run and validate YAML pipelines, inspect the local store.

use clap::{Parser, Subcommand};
use h3load_core::config::{LoaderConfig, LogLevel};
use h3load_exec::{parse_yaml_pipeline, PipelineSpec};
use h3load_io::StoreDir;
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "h3load")]
#[command(about = "Load point data into an H3-indexed local dataset store", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a pipeline from a YAML file
    Run {
        /// Path to the pipeline YAML file
        #[arg(short, long)]
        pipeline: PathBuf,

        /// Store directory (overrides config and the pipeline file)
        #[arg(long)]
        database_dir: Option<String>,

        /// Log verbosity (overrides config)
        #[arg(long)]
        log_level: Option<LogLevel>,
    },

    /// Parse a pipeline YAML file and check its stage configuration
    Validate {
        /// Path to the pipeline YAML file
        #[arg(short, long)]
        pipeline: PathBuf,
    },

    /// Print a dataset's metadata record, or list datasets when none is named
    Describe {
        /// Store directory (overrides config)
        #[arg(long)]
        database_dir: Option<String>,

        /// Dataset name
        #[arg(long)]
        dataset: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();
    let config = LoaderConfig::from_env();

    match cli.command {
        Commands::Run {
            pipeline,
            database_dir,
            log_level,
        } => {
            if let Err(e) = run_pipeline(&pipeline, config, database_dir, log_level) {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
        Commands::Validate { pipeline } => {
            if let Err(e) = validate_pipeline(&pipeline, &config) {
                eprintln!("Validation failed: {}", e);
                std::process::exit(1);
            }
            println!("✓ Pipeline is valid");
        }
        Commands::Describe {
            database_dir,
            dataset,
        } => {
            let dir = database_dir.unwrap_or(config.database_dir);
            if let Err(e) = describe(&dir, dataset.as_deref()) {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
    }
}

fn init_logging(level: LogLevel) {
    // RUST_LOG wins over the configured level when set.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| level.as_str().into()))
        .with_target(false)
        .init();
}

fn load_spec(pipeline_path: &PathBuf) -> Result<PipelineSpec, Box<dyn std::error::Error>> {
    let yaml_content = fs::read_to_string(pipeline_path)?;
    Ok(parse_yaml_pipeline(&yaml_content)?)
}

fn run_pipeline(
    pipeline_path: &PathBuf,
    mut config: LoaderConfig,
    database_dir: Option<String>,
    log_level: Option<LogLevel>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut spec = load_spec(pipeline_path)?;
    apply_cli_overrides(&mut spec, &mut config, database_dir, log_level);
    init_logging(config.log_level);

    let pipeline = spec.build(&config)?;
    let report = pipeline.run()?;

    println!("✓ Pipeline executed successfully");
    println!("  Dataset: {}", report.dataset);
    println!("  Rows read: {}", report.rows_read);
    println!("  Rows written: {}", report.rows_written);
    println!("  Duration: {}ms", report.duration_ms());

    Ok(())
}

fn validate_pipeline(
    pipeline_path: &PathBuf,
    config: &LoaderConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let spec = load_spec(pipeline_path)?;
    // Construction performs every check that needs no data.
    let _ = spec.build(config)?;
    Ok(())
}

fn describe(database_dir: &str, dataset: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let store = StoreDir::new(database_dir);
    match dataset {
        Some(name) => {
            let record = store
                .read_metadata(name)?
                .ok_or_else(|| format!("no metadata recorded for dataset '{name}'"))?;
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
        None => {
            for name in store.list_datasets()? {
                println!("{name}");
            }
        }
    }
    Ok(())
}

/// Flags beat the pipeline file, which beats the environment.
fn apply_cli_overrides(
    spec: &mut PipelineSpec,
    cfg: &mut LoaderConfig,
    database_dir: Option<String>,
    log_level: Option<LogLevel>,
) {
    if let Some(dir) = database_dir {
        spec.output.database_dir = Some(dir.clone());
        cfg.database_dir = dir;
    }
    if let Some(level) = log_level {
        cfg.log_level = level;
    }
}
