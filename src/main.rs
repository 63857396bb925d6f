//! CLI entry point for the bikeshare explorer.
//!
//! Provides subcommands for printing statistics, paging through raw trips,
//! exporting a filtered selection, and an interactive exploration session.

mod prompt;

use std::ffi::OsStr;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use bikeshare_explorer::browse::BrowseCursor;
use bikeshare_explorer::config::Settings;
use bikeshare_explorer::fetch::BasicClient;
use bikeshare_explorer::filter::{FilterCriteria, FilteredDataset, filter};
use bikeshare_explorer::output::{to_json, write_records};
use bikeshare_explorer::source::{CityResolver, DirResolver, HttpResolver};
use bikeshare_explorer::stats::StatisticsReport;
use bikeshare_explorer::trips::TripStore;
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

use crate::prompt::{Prompter, run_explore};

#[derive(Parser)]
#[command(name = "bikeshare_explorer")]
#[command(about = "Explore US bikeshare trip data", long_about = None)]
struct Cli {
    /// Directory containing the city CSV files [env: BIKESHARE_DATA_DIR]
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Base URL to download the city CSV files from [env: BIKESHARE_DATA_URL]
    #[arg(long, global = true)]
    data_url: Option<String>,

    /// Defaults to an interactive session
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args)]
struct Selection {
    /// Chicago, New York, or Washington
    #[arg(value_name = "CITY")]
    city: String,

    /// January through June, or all
    #[arg(short, long, default_value = "all")]
    month: String,

    /// Sunday through Saturday, or all
    #[arg(short, long, default_value = "all")]
    day: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the five statistic groups for a selection
    Stats {
        #[command(flatten)]
        selection: Selection,

        /// Print JSON instead of text
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Print raw trips five at a time
    Browse {
        #[command(flatten)]
        selection: Selection,

        /// Number of pages to print
        #[arg(short = 'n', long, default_value_t = 1)]
        pages: usize,

        /// Print JSON instead of text
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Write the selected trips to a CSV file
    Export {
        #[command(flatten)]
        selection: Selection,

        /// CSV file to write
        #[arg(short, long, default_value = "trips.csv")]
        output: PathBuf,
    },
    /// Ask for selections interactively and offer restarts
    Explore,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let mut settings = Settings::from_env();
    if let Some(dir) = cli.data_dir {
        settings.data_dir = dir;
    }
    if let Some(url) = cli.data_url {
        settings.data_url = Some(url);
    }

    // Logging setup: colored stderr + JSON rolling log file
    let log_dir = settings
        .log_file_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("logs"));
    let log_file_name = settings
        .log_file_path
        .file_name()
        .unwrap_or(OsStr::new("bikeshare_explorer.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let resolver = resolver(&settings)?;

    match cli.command.unwrap_or(Commands::Explore) {
        Commands::Stats { selection, json } => {
            let dataset = Arc::new(select(resolver.as_ref(), &selection).await?);
            let report = StatisticsReport::compute(dataset).await?;

            if json {
                println!("{}", to_json(&report)?);
            } else {
                print!("{report}");
            }
        }
        Commands::Browse {
            selection,
            pages,
            json,
        } => {
            let dataset = select(resolver.as_ref(), &selection).await?;
            let mut cursor = BrowseCursor::new();

            for _ in 0..pages {
                let page = cursor.next_page(&dataset);
                if json {
                    println!("{}", to_json(&page)?);
                } else {
                    print!("{page}");
                }
                if !page.has_more {
                    break;
                }
            }
        }
        Commands::Export { selection, output } => {
            let dataset = select(resolver.as_ref(), &selection).await?;
            let rows = write_records(&output, &dataset)?;
            info!(rows, output = %output.display(), "Export complete");
        }
        Commands::Explore => {
            let stdin = io::stdin();
            let mut prompter = Prompter::new(stdin.lock(), io::stdout());
            run_explore(resolver.as_ref(), &mut prompter).await?;
        }
    }

    Ok(())
}

/// Picks the HTTP resolver when a base URL is configured, the data directory otherwise.
fn resolver(settings: &Settings) -> Result<Box<dyn CityResolver>> {
    Ok(match &settings.data_url {
        Some(url) => {
            info!(url = %url, "Reading trip data over HTTP");
            Box::new(HttpResolver::new(BasicClient::new()?, url.clone()))
        }
        None => {
            info!(dir = %settings.data_dir.display(), "Reading trip data from disk");
            Box::new(DirResolver::new(settings.data_dir.clone()))
        }
    })
}

/// Loads the selected city and applies the month/day filter.
#[tracing::instrument(
    skip_all,
    fields(city = %selection.city, month = %selection.month, day = %selection.day)
)]
async fn select(resolver: &dyn CityResolver, selection: &Selection) -> Result<FilteredDataset> {
    let criteria = FilterCriteria::parse(&selection.city, &selection.month, &selection.day)?;
    let store = TripStore::load(resolver, criteria.city).await?;
    Ok(filter(&store, &criteria)?)
}
