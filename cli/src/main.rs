use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use riftcrawl::config::{default_config_path, load_config};
use riftcrawl::domain::{ChampionAnalytics, Division, MatchType, Queue, Region, Tier};
use riftcrawl::{
    all_champion_details, BuildAnalyticsRequest, Config, CouchDbClient, DocumentStore,
    FetchMatchDetailsRequest, FetchMatchesRequest, FetchPlayersRequest, LogSummary, MemoryStore,
    PipelineService, RunControl,
};

/// Crawl the Riot API into CouchDB and build champion analytics.
#[derive(Parser, Debug)]
#[command(name = "riftcrawl", version, about, long_about = None)]
struct Cli {
    /// Config file (default: ~/.riftcrawl/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Keep documents in memory instead of writing to CouchDB
    #[arg(long, global = true)]
    dry_run: bool,

    /// Cancel the run after this many seconds
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Pull ranked league entries, resolve accounts, store new players
    Players {
        #[arg(long, default_value = "EUROPE")]
        region: Region,
        #[arg(long)]
        tier: Tier,
        #[arg(long)]
        division: Division,
        #[arg(long, default_value = "RANKED_SOLO")]
        queue: Queue,
        /// First league page (1-based)
        #[arg(long, default_value_t = 1)]
        page: u32,
        /// Number of pages to pull
        #[arg(long, default_value_t = 1)]
        pages: u32,
    },

    /// Pull match id lists for stored players
    Matches {
        #[arg(long, default_value = "EUROPE")]
        region: Region,
        #[arg(long, default_value_t = 100)]
        player_limit: usize,
        #[arg(long = "type", default_value = "ranked")]
        match_type: MatchType,
        /// Only players of this tier
        #[arg(long)]
        tier: Option<Tier>,
    },

    /// Pull and validate details of stored match ids
    MatchDetails {
        #[arg(long, default_value = "EUROPE")]
        region: Region,
        #[arg(long, default_value_t = 50)]
        player_match_limit: usize,
    },

    /// Aggregate stored match details into champion analytics
    Analytics {
        #[arg(long, default_value_t = 1000)]
        limit_matches: usize,
    },

    /// Print persisted champion analytics
    Champions,
}

fn init_logging(json: bool) -> Result<()> {
    tracing_log::LogTracer::init().context("failed to bridge log records into tracing")?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if json {
        let subscriber = fmt::Subscriber::builder()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .finish();
        tracing::subscriber::set_global_default(subscriber)?;
    } else {
        let subscriber = fmt::Subscriber::builder()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .finish();
        tracing::subscriber::set_global_default(subscriber)?;
    }
    Ok(())
}

fn resolve_config(cli: &Cli) -> Result<Config> {
    if let Some(path) = &cli.config {
        return load_config(path).with_context(|| format!("loading {}", path.display()));
    }

    match default_config_path() {
        Some(path) if path.exists() => {
            load_config(&path).with_context(|| format!("loading {}", path.display()))
        }
        _ if cli.dry_run => {
            info!("No config file found, using built-in defaults for dry run");
            Ok(Config::offline())
        }
        _ => bail!("no config file given and ~/.riftcrawl/config.json does not exist"),
    }
}

/// What a command produced, printed by `main`.
enum Output {
    Champions(Vec<ChampionAnalytics>),
    Summary(LogSummary),
}

fn execute(command: Commands, config: &Config, dry_run: bool, control: &RunControl) -> Result<Output> {
    let store: Arc<dyn DocumentStore> = if dry_run {
        Arc::new(MemoryStore::with_pipeline_databases())
    } else {
        Arc::new(CouchDbClient::new(&config.couchdb)?)
    };

    // Only pipeline commands need the Riot client and its api key.
    let service = || PipelineService::from_config_with_store(config, store.clone());

    let summary = match command {
        Commands::Champions => return Ok(Output::Champions(all_champion_details(store.as_ref())?)),
        Commands::Players {
            region,
            tier,
            division,
            queue,
            page,
            pages,
        } => service()?.fetch_players(
            &FetchPlayersRequest {
                region,
                tier,
                division,
                queue,
                page,
                page_count: pages,
            },
            control,
        )?,
        Commands::Matches {
            region,
            player_limit,
            match_type,
            tier,
        } => service()?.fetch_matches(
            &FetchMatchesRequest {
                region,
                player_limit,
                match_type,
                tier,
            },
            control,
        )?,
        Commands::MatchDetails {
            region,
            player_match_limit,
        } => service()?.fetch_match_details(
            &FetchMatchDetailsRequest {
                region,
                player_match_limit,
            },
            control,
        )?,
        Commands::Analytics { limit_matches } => service()?
            .build_champion_analytics(&BuildAnalyticsRequest { limit_matches }, control)?,
    };
    Ok(Output::Summary(summary))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.json_logs)?;

    let config = resolve_config(&cli)?;

    let control = match cli.timeout_secs {
        Some(secs) => RunControl::with_timeout(Duration::from_secs(secs)),
        None => RunControl::new(),
    };
    let handle = control.clone();
    ctrlc::set_handler(move || {
        warn!("Interrupt received, cancelling run");
        handle.cancel();
    })
    .context("failed to install Ctrl-C handler")?;

    match execute(cli.command, &config, cli.dry_run, &control)? {
        Output::Champions(champions) => {
            println!("{}", serde_json::to_string_pretty(&champions)?);
        }
        Output::Summary(summary) => {
            if control.is_cancelled() {
                warn!("Run was cancelled; steps after the cancellation logged their units as failed");
            }
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
    }
    Ok(())
}
