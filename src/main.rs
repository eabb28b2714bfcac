use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use mrelic_core::store::Deletion;
use mrelic_core::{
    Config, DeleteCriteria, FileBackend, OutputFormat, QueryCoordinator, QueryCriteria, Timestamp,
};
use mrelic_feeds::{Feed, FeedOptions, FileFeed, IncomingLog, StdinFeed};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

#[derive(Parser)]
#[command(name = "mrelic", about = "mrelic: structured log ingestion and search")]
#[command(version)]
struct Cli {
    /// Write debug logs to mrelic-debug.log in the temp directory.
    #[arg(long, global = true)]
    debug: bool,

    /// Store file. Defaults to `[store] path` from the config file.
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Read log lines from stdin (or a file) and store them
    Ingest {
        /// Service name for lines that do not carry one. Defaults to
        /// `[feed] service`, then the current directory name.
        #[arg(long)]
        service: Option<String>,

        /// Force the service name onto every record, overriding the payload.
        #[arg(long)]
        force_service: bool,

        /// Read this file instead of stdin.
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Print matching records, newest first
    Query {
        #[command(flatten)]
        filters: Filters,

        /// Page size. Defaults to `[cli] page_size`.
        #[arg(long)]
        limit: Option<usize>,

        #[arg(long)]
        offset: Option<usize>,

        /// raw or jsonl. Defaults to `[cli] format`.
        #[arg(long)]
        format: Option<OutputFormat>,
    },

    /// Print the number of matching records
    Count {
        #[command(flatten)]
        filters: Filters,
    },

    /// List distinct levels and services
    Facets,

    /// Delete records by service and/or age
    Delete {
        #[arg(long)]
        service: Option<String>,

        /// Delete records strictly older than this timestamp.
        #[arg(long)]
        before: Option<String>,
    },

    /// Delete every record
    Clear,

    /// Print the store size in bytes
    Size,
}

#[derive(Args)]
struct Filters {
    /// Search query, e.g. `timeout` or `level:error -service:*test*`.
    #[arg(allow_hyphen_values = true)]
    query: Option<String>,

    #[arg(long)]
    level: Option<String>,

    #[arg(long)]
    service: Option<String>,

    /// Inclusive lower time bound.
    #[arg(long)]
    since: Option<String>,

    /// Inclusive upper time bound.
    #[arg(long)]
    until: Option<String>,
}

impl Filters {
    fn criteria(self) -> QueryCriteria {
        QueryCriteria {
            query: self.query,
            level: self.level,
            service: self.service,
            start_date: self.since.map(canonical_bound),
            end_date: self.until.map(canonical_bound),
            limit: None,
            offset: None,
        }
    }
}

/// RFC 3339 bounds are rewritten canonically so they compare correctly
/// against stored timestamps; anything else is used as given.
fn canonical_bound(raw: String) -> String {
    match Timestamp::verbatim(raw.as_str()).to_datetime() {
        Some(dt) => Timestamp::from_datetime(dt).to_string(),
        None => raw,
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.debug {
        let path = std::env::temp_dir().join("mrelic-debug.log");
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)?;
        tracing_subscriber::fmt()
            .with_writer(std::sync::Mutex::new(file))
            .with_ansi(false)
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_env("RUST_LOG")
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug")),
            )
            .init();
        tracing::info!(path = %path.display(), "mrelic debug log started");
    }

    let config = Config::load().context("loading configuration")?;
    let db = cli.db.clone().unwrap_or_else(|| config.store.path.clone());
    let backend = FileBackend::open(&db).with_context(|| format!("opening store {}", db.display()))?;
    let coordinator = QueryCoordinator::with_config(backend, config.query);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Commands::Ingest {
            service,
            force_service,
            file,
        } => {
            let service = service
                .or_else(|| Some(config.feed.service.clone()).filter(|s| !s.is_empty()))
                .unwrap_or_else(current_dir_name);
            let mut options = FeedOptions::new(service);
            if force_service {
                options = options.with_header();
            }
            let stored = ingest(&coordinator, options, file)?;
            writeln!(out, "ingested {stored} records")?;
        }

        Commands::Query {
            filters,
            limit,
            offset,
            format,
        } => {
            let format = match format {
                Some(f) => f,
                None => config.cli.format.parse().map_err(anyhow::Error::msg)?,
            };
            let mut criteria = filters.criteria().with_limit(limit.unwrap_or(config.cli.page_size));
            criteria.offset = offset;
            let result = coordinator.query(&criteria)?;
            for record in &result.records {
                writeln!(out, "{}", mrelic_core::render(record, format))?;
            }
            if format == OutputFormat::Raw {
                eprintln!("{} of {} records", result.records.len(), result.total_count);
            }
        }

        Commands::Count { filters } => {
            writeln!(out, "{}", coordinator.count(&filters.criteria())?)?;
        }

        Commands::Facets => {
            let facets = serde_json::json!({
                "levels": coordinator.levels()?,
                "services": coordinator.services()?,
            });
            writeln!(out, "{facets}")?;
        }

        Commands::Delete { service, before } => {
            let criteria = DeleteCriteria {
                service,
                end_date: before.map(canonical_bound),
            };
            if criteria.to_deletion() == Deletion::default() {
                anyhow::bail!("refusing to delete everything without a filter; use `mrelic clear`");
            }
            writeln!(out, "deleted {} records", coordinator.delete(&criteria)?)?;
        }

        Commands::Clear => {
            writeln!(out, "deleted {} records", coordinator.clear()?)?;
        }

        Commands::Size => {
            writeln!(out, "{}", coordinator.storage_size()?)?;
        }
    }

    Ok(())
}

fn ingest(
    coordinator: &QueryCoordinator<FileBackend>,
    options: FeedOptions,
    file: Option<PathBuf>,
) -> anyhow::Result<usize> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async {
        let (tx, mut rx) = mrelic_feeds::channel();
        let feed = match file {
            Some(path) => start(FileFeed::new(path, options), tx),
            None => start(StdinFeed::new(options), tx),
        };

        let mut stored = 0usize;
        while let Some(incoming) = rx.recv().await {
            let records = coordinator.ingest(&incoming.payload, incoming.meta.as_ref())?;
            stored += records.len();
        }

        let sent = feed.await??;
        tracing::info!(
            sent,
            stored,
            store = %coordinator.backend().path().display(),
            "ingest finished"
        );
        Ok::<_, anyhow::Error>(stored)
    })
}

fn start<F: Feed>(feed: F, tx: mpsc::Sender<IncomingLog>) -> JoinHandle<anyhow::Result<usize>> {
    tracing::debug!(kind = %feed.kind(), "starting feed");
    feed.spawn(tx)
}

fn current_dir_name() -> String {
    std::env::current_dir()
        .ok()
        .and_then(|dir| dir.file_name().map(|n| n.to_string_lossy().into_owned()))
        .unwrap_or_else(|| "system".to_string())
}
