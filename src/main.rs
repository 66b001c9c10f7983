use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use voyager_scraper::config::{Config, DEFAULT_CONFIG_PATH};
use voyager_scraper::domain::{CanonicalEvent, RawPage, Source};
use voyager_scraper::observability::{self, metrics};
use voyager_scraper::pipeline::processing::listing::discover_event_links;
use voyager_scraper::pipeline::processing::normalize::csv_row::read_rows;
use voyager_scraper::pipeline::storage::{DedupScope, EventStore, InMemoryStorage};
use voyager_scraper::pipeline::{persist_batch, DedupGate, DedupPolicy, ExtractionPipeline};

#[derive(Parser)]
#[command(name = "voyager_scraper")]
#[command(about = "Extract normalized event records from saved pages and CSV files")]
#[command(version = "0.1.0")]
struct Cli {
    /// Config file (falls back to $VOYAGER_CONFIG, then config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Run records through the de-duplication gate before output
    #[arg(long, global = true)]
    dedup: bool,

    /// De-duplicate within this user's favourites instead of the global catalogue
    #[arg(long, global = true)]
    user: Option<String>,

    /// Write JSON here instead of stdout
    #[arg(long, global = true)]
    output: Option<PathBuf>,

    /// Print a Prometheus snapshot of pipeline metrics to stderr when done
    #[arg(long, global = true)]
    metrics: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract one record per saved HTML page
    Extract {
        /// Source tag (ticketmaster, eventbrite, bookmyshow, europaticket, ents24, skyscanner, goibibo, web)
        #[arg(long)]
        source: String,
        /// Page URL, one per file in the same order
        #[arg(long = "url")]
        urls: Vec<String>,
        /// Provider name used in record ids (defaults to the source)
        #[arg(long)]
        provider: Option<String>,
        files: Vec<PathBuf>,
    },
    /// Import events from a CSV file
    Csv {
        file: PathBuf,
        /// Provider name used in record ids (defaults to the file name)
        #[arg(long)]
        provider: Option<String>,
    },
    /// List event-detail links found on a saved listing page
    Links {
        file: PathBuf,
        /// URL the listing page was fetched from
        #[arg(long)]
        base: String,
    },
}

fn config_path(cli_path: Option<PathBuf>) -> PathBuf {
    cli_path
        .or_else(|| std::env::var("VOYAGER_CONFIG").ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

fn read_pages(files: &[PathBuf], urls: &[String]) -> anyhow::Result<Vec<RawPage>> {
    if !urls.is_empty() && urls.len() != files.len() {
        return Err(anyhow!(
            "got {} --url values for {} files",
            urls.len(),
            files.len()
        ));
    }
    files
        .iter()
        .enumerate()
        .map(|(i, path)| {
            let html = fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            let url = urls.get(i).cloned().unwrap_or_default();
            Ok(RawPage::parse(&html, url))
        })
        .collect()
}

fn write_json<T: serde::Serialize>(value: &T, output: Option<&Path>) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    match output {
        Some(path) => {
            fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
            info!("Wrote {}", path.display());
        }
        None => println!("{}", json),
    }
    Ok(())
}

async fn dedupe(
    events: Vec<CanonicalEvent>,
    policy: DedupPolicy,
    scope: &DedupScope,
) -> anyhow::Result<Vec<CanonicalEvent>> {
    let store = InMemoryStorage::new();
    let gate = DedupGate::new(Arc::new(store.clone()), policy);
    let report = persist_batch(events, &gate, scope).await;

    eprintln!("\n📊 De-duplication:");
    eprintln!("   Inserted: {}", report.inserted);
    for (rule, count) in &report.duplicates {
        eprintln!("   Duplicates ({}): {}", rule, count);
    }
    if !report.errors.is_empty() {
        warn!("{} errors while de-duplicating", report.errors.len());
        for error in &report.errors {
            eprintln!("   - {}", error);
        }
    }

    Ok(store.list(scope).await?)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    observability::init_logging();

    let cli = Cli::parse();

    let metrics_handle = if cli.metrics {
        Some(metrics::init().map_err(|e| anyhow!("{}", e))?)
    } else {
        None
    };

    let config = Config::load_from(config_path(cli.config.clone()))?;
    let pipeline = ExtractionPipeline::new(&config.extraction)?;

    let events = match cli.command {
        Commands::Extract {
            source,
            urls,
            provider,
            files,
        } => {
            let span = tracing::info_span!("extract", source = %source);
            let _enter = span.enter();

            let source: Source = source.parse()?;
            let provider = provider.unwrap_or_else(|| source.to_string());
            let pages = read_pages(&files, &urls)?;
            info!("Extracting {} pages", pages.len());

            let (events, stats) = pipeline.run_pages(pages, source, &provider).collect_with_stats();
            eprintln!("\n📊 Extraction Results for {}:", provider);
            eprintln!("   Records: {}", stats.emitted);
            eprintln!("   Rejected: {}", stats.rejected_total());
            events
        }
        Commands::Csv { file, provider } => {
            let span = tracing::info_span!("csv", file = %file.display());
            let _enter = span.enter();

            let provider = provider.unwrap_or_else(|| {
                file.file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "csv".to_string())
            });
            let rows = read_rows(&file).with_context(|| format!("reading {}", file.display()))?;
            info!("Importing {} rows", rows.len());

            let (events, stats) = pipeline.run_rows(rows, &provider).collect_with_stats();
            eprintln!("\n📊 Import Results for {}:", provider);
            eprintln!("   Records: {}", stats.emitted);
            eprintln!("   Rejected: {}", stats.rejected_total());
            events
        }
        Commands::Links { file, base } => {
            let html = fs::read_to_string(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            let links = discover_event_links(&RawPage::parse(&html, base))?;
            write_json(&links, cli.output.as_deref())?;
            return Ok(());
        }
    };

    let events = if cli.dedup {
        let scope = match cli.user {
            Some(user) => DedupScope::User(user),
            None => DedupScope::Global,
        };
        dedupe(events, DedupPolicy::from(&config.dedup), &scope).await?
    } else {
        events
    };

    write_json(&events, cli.output.as_deref())?;

    if let Some(handle) = metrics_handle {
        eprintln!("{}", handle.render());
    }
    Ok(())
}
