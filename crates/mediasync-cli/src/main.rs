//! mediasync - distributed media library indexer
//!
//! Runs a listing service on every machine that holds media, and a
//! reconciler that keeps a local searchable index in step with all of them.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use console::style;
use mediasync_config::{Config, ConfigLoader, LoggingConfig};
use mediasync_network::{ClientConfig, HttpHostClient, ListerConfig, ListerServer};
use mediasync_sync::{CycleReport, IndexStore, Reconciler, ReconcilerOptions};
use mediasync_types::IndexAdapter;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

mod display;
mod json_output;

use display::{
    create_cycle_spinner, display_cycle_report, display_hosts, display_info,
    display_search_hits, display_success,
};
use json_output::{CycleReportJson, SearchResultJson};

/// mediasync - distributed media library indexer
#[derive(Parser)]
#[command(
    name = "mediasync",
    version = env!("CARGO_PKG_VERSION"),
    about = "Index media files spread across many hosts",
    long_about = "mediasync keeps a local searchable index of the media files served by a\n\
                  fleet of listing hosts. Hosts whose file set has not changed since the\n\
                  last cycle are skipped; changed hosts are diffed and applied incrementally."
)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Quiet mode - minimal output
    #[arg(short, long)]
    quiet: bool,

    /// Verbose mode - detailed output
    #[arg(short, long)]
    verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the local media directories to reconcilers
    Serve {
        /// Directory to scan (repeatable)
        #[arg(long = "dir")]
        dirs: Vec<PathBuf>,
        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,
        /// Address to bind
        #[arg(long)]
        bind: Option<String>,
        /// Name reported to clients
        #[arg(long)]
        friendly_name: Option<String>,
    },
    /// Reconcile the local index with every registered host
    Index {
        /// Re-list every host even if its fingerprint is unchanged
        #[arg(long)]
        force: bool,
        /// Keep running, one cycle every N seconds
        #[arg(long)]
        interval: Option<u64>,
        /// Print cycle reports as JSON
        #[arg(long)]
        json: bool,
    },
    /// Search the local index
    Search {
        /// Search terms
        query: String,
        /// Maximum number of results
        #[arg(short = 'n', long, default_value = "10")]
        limit: usize,
        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show registered hosts and their last sync state
    Hosts,
    /// Show configuration
    Config {
        /// Show default configuration
        #[arg(long)]
        default: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => ConfigLoader::load_from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => ConfigLoader::load_default().context("Failed to load configuration")?,
    };

    init_logging(cli.debug, cli.quiet, cli.verbose, &config.logging)?;

    info!("mediasync v{} starting", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Serve {
            dirs,
            port,
            bind,
            friendly_name,
        } => serve_command(config, dirs, port, bind, friendly_name).await?,
        Commands::Index {
            force,
            interval,
            json,
        } => index_command(&config, force, interval, json, cli.quiet).await?,
        Commands::Search { query, limit, json } => {
            search_command(&config, &query, limit, json).await?;
        }
        Commands::Hosts => hosts_command(&config).await?,
        Commands::Config { default } => config_command(&config, cli.config.as_deref(), default)?,
    }

    Ok(())
}

fn init_logging(debug: bool, quiet: bool, verbose: bool, logging: &LoggingConfig) -> Result<()> {
    use tracing_subscriber::{fmt, EnvFilter};

    let level = if debug {
        "debug"
    } else if verbose {
        "info"
    } else if quiet {
        "error"
    } else {
        logging.level.as_str()
    };

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .context("Invalid log filter")?;

    let builder = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false);

    let result = if logging.json_format {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    result.map_err(|e| anyhow::anyhow!("Failed to initialize logging: {e}"))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}

async fn serve_command(
    mut config: Config,
    dirs: Vec<PathBuf>,
    port: Option<u16>,
    bind: Option<String>,
    friendly_name: Option<String>,
) -> Result<()> {
    if !dirs.is_empty() {
        config.lister.dirs = dirs;
    }
    if let Some(port) = port {
        config.lister.port = port;
    }
    if let Some(bind) = bind {
        config.lister.bind_address = bind;
    }
    if friendly_name.is_some() {
        config.lister.friendly_name = friendly_name;
    }

    config.validate_lister()?;
    let addr = config.lister_addr()?;

    let server = ListerServer::bind(addr, ListerConfig::from(&config.lister)).await?;
    display_info(&format!("Listening on {}", server.local_addr()?));
    server.run(shutdown_signal()).await?;
    Ok(())
}

async fn build_reconciler(config: &Config) -> Result<(Reconciler, Arc<IndexStore>)> {
    config.validate_registry()?;

    let index = Arc::new(
        IndexStore::open(&config.index.path)
            .await
            .with_context(|| format!("Failed to open index {}", config.index.path.display()))?,
    );
    let client = HttpHostClient::new(ClientConfig::from(&config.reconciler.timeouts))?;

    let reconciler = Reconciler::new(
        Arc::new(client),
        Arc::clone(&index) as Arc<dyn IndexAdapter>,
        config.registry(),
        ReconcilerOptions::from(&config.reconciler),
    );
    Ok((reconciler, index))
}

fn print_report(report: &CycleReport, json: bool, quiet: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(&CycleReportJson::from(report))?);
    } else if !quiet {
        display_cycle_report(report);
    }
    Ok(())
}

async fn index_command(
    config: &Config,
    force: bool,
    interval: Option<u64>,
    json: bool,
    quiet: bool,
) -> Result<()> {
    let (reconciler, index) = build_reconciler(config).await?;

    match interval {
        Some(secs) => {
            let interval = Duration::from_secs(secs.max(1));
            info!("Reconciling every {:?}", interval);
            let cycles = reconciler
                .watch(interval, force, shutdown_signal(), |report| {
                    if let Err(e) = print_report(report, json, quiet) {
                        warn!("Failed to print cycle report: {}", e);
                    }
                })
                .await;
            info!("Ran {} cycles", cycles);
        }
        None => {
            let spinner = (!quiet && !json).then(|| create_cycle_spinner(reconciler.hosts().len()));
            let report = reconciler.run_cycle(force).await;
            if let Some(pb) = spinner {
                pb.finish_and_clear();
            }
            print_report(&report, json, quiet)?;
        }
    }

    index.save().await.context("Failed to save index")?;
    Ok(())
}

async fn search_command(config: &Config, query: &str, limit: usize, json: bool) -> Result<()> {
    let index = IndexStore::open(&config.index.path)
        .await
        .with_context(|| format!("Failed to open index {}", config.index.path.display()))?;
    let hits = index.search(query, limit).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&SearchResultJson::new(query, &hits))?);
    } else {
        display_search_hits(query, &hits);
    }
    Ok(())
}

async fn hosts_command(config: &Config) -> Result<()> {
    let index = IndexStore::open(&config.index.path)
        .await
        .with_context(|| format!("Failed to open index {}", config.index.path.display()))?;

    let hosts = config.registry();
    let states = index.host_states().await;
    let mut counts = Vec::with_capacity(hosts.len());
    for host in &hosts {
        counts.push(index.entries_for_host(&host.name).await.len());
    }

    display_hosts(&hosts, &states, &counts);
    Ok(())
}

/// File the active configuration came from: the `--config` path when given,
/// otherwise the first default location that exists
fn config_source(explicit: Option<&Path>) -> Option<PathBuf> {
    explicit
        .map(Path::to_path_buf)
        .or_else(ConfigLoader::config_exists)
}

fn config_command(config: &Config, explicit: Option<&Path>, default: bool) -> Result<()> {
    if default {
        println!("{} Default configuration:", style("⚙").blue().bold());
        print!("{}", serde_yaml::to_string(&Config::default())?);
    } else {
        println!("{} Current configuration:", style("⚙").blue().bold());
        match config_source(explicit) {
            Some(path) => display_success(&format!("Loaded from {}", path.display())),
            None => display_info("No configuration file found, using defaults"),
        }
        print!("{}", serde_yaml::to_string(config)?);
    }
    Ok(())
}
