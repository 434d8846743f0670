//! tmdb-scraper main entry point
//!
//! This is the command-line interface for collecting TMDb movie datasets.

use anyhow::{bail, Context};
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tmdb_scraper::config::{
    apply_environment, load_config_with_hash, validate, Config, OutputFormat, API_KEY_VAR,
};
use tmdb_scraper::output::{
    convert, open_writer, print_summary, read_rows, DatasetSummary, MovieRow,
};
use tmdb_scraper::scraper::{build_fetcher, Pipeline};
use tmdb_scraper::{FetchError, PipelineError};
use tracing_subscriber::EnvFilter;

/// tmdb-scraper: collect movie datasets from TMDb
///
/// Pages through the TMDb discover endpoint under its request quota and
/// writes a deduplicated, popularity-ordered list of movies.
#[derive(Parser, Debug)]
#[command(name = "tmdb-scraper")]
#[command(version)]
#[command(about = "Collect movie datasets from TMDb", long_about = None)]
struct Cli {
    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scrape movies and write them to a file
    Scrape {
        /// Path to TOML configuration file
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Number of movies to collect
        #[arg(short, long)]
        count: Option<usize>,

        /// Output file
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Output format (guessed from the output file extension when omitted)
        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,

        /// Number of pages fetched in parallel
        #[arg(long)]
        concurrent: Option<usize>,

        /// Include adult titles
        #[arg(long)]
        include_adult: bool,
    },

    /// Show a summary of a previously written dataset
    Info {
        /// Dataset file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Dataset format (guessed from the file extension when omitted)
        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,
    },

    /// Convert a dataset to another format
    Convert {
        /// Dataset to read
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// File to write
        #[arg(value_name = "OUTPUT")]
        output: PathBuf,

        /// Input format (guessed from the input file extension when omitted)
        #[arg(long, value_enum)]
        from_format: Option<OutputFormat>,

        /// Output format (guessed from the output file extension when omitted)
        #[arg(long, value_enum)]
        to_format: Option<OutputFormat>,
    },

    /// Show the effective configuration and test the API connection
    Config {
        /// Path to TOML configuration file
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    if dotenvy::dotenv().is_ok() {
        tracing::debug!("Loaded environment from .env");
    }

    match cli.command {
        Command::Scrape {
            config,
            count,
            output,
            format,
            concurrent,
            include_adult,
        } => {
            let (mut config, config_hash) = load_configuration(config.as_deref())?;

            if let Some(count) = count {
                config.scraper.target_count = count;
            }
            if let Some(concurrent) = concurrent {
                config.scraper.concurrency = concurrent;
            }
            if include_adult {
                config.scraper.include_adult = Some(true);
            }
            if let Some(output) = output {
                config.output.format = format.unwrap_or_else(|| OutputFormat::from_path(&output));
                config.output.path = output.to_string_lossy().into_owned();
            } else if let Some(format) = format {
                config.output.format = format;
            }

            validate(&config).context("Invalid settings")?;
            handle_scrape(config, config_hash).await
        }
        Command::Info { file, format } => handle_info(&file, format),
        Command::Convert {
            input,
            output,
            from_format,
            to_format,
        } => handle_convert(&input, &output, from_format, to_format),
        Command::Config { config } => {
            let (config, _) = load_configuration(config.as_deref())?;
            handle_config(&config).await
        }
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("tmdb_scraper=info,warn"),
            1 => EnvFilter::new("tmdb_scraper=debug,info"),
            2 => EnvFilter::new("tmdb_scraper=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Loads the configuration file (or defaults) and applies the environment
fn load_configuration(path: Option<&Path>) -> anyhow::Result<(Config, Option<String>)> {
    let (mut config, hash) = match path {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (config, Some(hash))
        }
        None => (Config::default(), None),
    };

    apply_environment(&mut config);
    Ok((config, hash))
}

/// Handles the scrape command
async fn handle_scrape(config: Config, config_hash: Option<String>) -> anyhow::Result<()> {
    if config.api.api_key.is_none() {
        bail!(
            "No API key configured. Set {} in the environment or a .env file",
            API_KEY_VAR
        );
    }

    let started_at = Utc::now();
    let target = config.scraper.target_count;
    tracing::info!(
        "Collecting {} movies with {} concurrent requests{}",
        target,
        config.scraper.concurrency,
        if config.scraper.include_adult() {
            " (adult titles included)"
        } else {
            ""
        }
    );

    let fetcher = Arc::new(build_fetcher(&config).context("Failed to set up the HTTP client")?);

    let genres = fetcher
        .fetch_genres()
        .await
        .map_err(PipelineError::from)
        .map_err(describe_failure)?;

    let mut pipeline = Pipeline::new(config.scraper.clone(), Arc::clone(&fetcher), Arc::new(genres));
    let records = pipeline.run().await.map_err(describe_failure)?;

    tracing::info!(
        "Collected {} movies using {} requests",
        records.len(),
        fetcher.requests_sent()
    );

    let path = PathBuf::from(&config.output.path);
    let mut writer = open_writer(
        config.output.format,
        &path,
        config.scraper.include_adult(),
        started_at,
        config_hash,
    );
    let written = writer
        .write(&records)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    println!(
        "✓ Wrote {} movies to {} ({})",
        written,
        path.display(),
        writer.format()
    );

    let rows: Vec<MovieRow> = records
        .iter()
        .map(|record| MovieRow::from_record(record, config.scraper.include_adult()))
        .collect();
    println!();
    print_summary(&DatasetSummary::from_rows(&rows));

    if records.len() < target {
        println!(
            "\nNote: {} of the requested movies were skipped due to API limits",
            target - records.len()
        );
    }

    Ok(())
}

/// Handles the info command
fn handle_info(file: &Path, format: Option<OutputFormat>) -> anyhow::Result<()> {
    let format = format.unwrap_or_else(|| OutputFormat::from_path(file));
    let rows = read_rows(file, format)
        .with_context(|| format!("Failed to read {} dataset {}", format, file.display()))?;

    println!("Dataset: {} ({})\n", file.display(), format);
    print_summary(&DatasetSummary::from_rows(&rows));
    Ok(())
}

/// Handles the convert command
fn handle_convert(
    input: &Path,
    output: &Path,
    from: Option<OutputFormat>,
    to: Option<OutputFormat>,
) -> anyhow::Result<()> {
    let from = from.unwrap_or_else(|| OutputFormat::from_path(input));
    let to = to.unwrap_or_else(|| OutputFormat::from_path(output));

    let written = convert(input, from, output, to).with_context(|| {
        format!(
            "Failed to convert {} ({}) to {} ({})",
            input.display(),
            from,
            output.display(),
            to
        )
    })?;

    println!(
        "✓ Converted {} movies from {} to {} ({})",
        written,
        input.display(),
        output.display(),
        to
    );
    Ok(())
}

/// Handles the config command
async fn handle_config(config: &Config) -> anyhow::Result<()> {
    println!("=== tmdb-scraper Configuration ===\n");

    println!("API:");
    println!("  Base URL: {}", config.api.base_url);
    println!("  Language: {}", config.api.language);
    println!(
        "  API key: {}",
        config
            .api
            .masked_api_key()
            .unwrap_or_else(|| "(not set)".to_string())
    );
    println!(
        "  Rate limit: {} requests per {}ms",
        config.api.requests_per_window, config.api.window_ms
    );
    println!(
        "  Retries: {} attempts, {}ms - {}ms backoff",
        config.api.max_attempts, config.api.base_delay_ms, config.api.max_delay_ms
    );

    println!("\nScraper:");
    println!("  Target count: {}", config.scraper.target_count);
    println!("  Concurrency: {}", config.scraper.concurrency);
    println!("  Include adult: {}", config.scraper.include_adult());

    println!("\nOutput:");
    println!("  Path: {}", config.output.path);
    println!("  Format: {}", config.output.format);

    validate(config).context("Invalid settings")?;
    println!("\n✓ Configuration is valid");

    if config.api.api_key.is_none() {
        println!("✗ No API key set ({}); skipping connection test", API_KEY_VAR);
        return Ok(());
    }

    let fetcher = build_fetcher(config).context("Failed to set up the HTTP client")?;
    match fetcher.fetch_genres().await {
        Ok(genres) => {
            println!("✓ Connected to TMDb ({} genres available)", genres.len());
            Ok(())
        }
        Err(e) => Err(describe_failure(PipelineError::from(e))),
    }
}

/// Turns a pipeline failure into a user-facing error naming its kind
fn describe_failure(error: PipelineError) -> anyhow::Error {
    tracing::error!("Scrape failed: {}", error);

    let headline = match &error {
        PipelineError::Fetch(FetchError::RetriesExhausted { attempts, .. }) => {
            format!("Scrape failed (retries exhausted after {} attempts)", attempts)
        }
        PipelineError::Fetch(fetch) => format!("Scrape failed ({})", fetch.kind()),
        PipelineError::Client(_) | PipelineError::BaseUrl(_) => {
            "Scrape failed (client setup)".to_string()
        }
        PipelineError::InvalidTransition { .. } => "Scrape failed (internal error)".to_string(),
    };

    anyhow::Error::new(error).context(headline)
}
