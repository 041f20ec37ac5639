//! adserver-decide: runs ad decisions for a request against an inventory
//! snapshot.
//!
//! Prints one decision as a JSON line, or a per-ad histogram with `--trials`.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use adserver_core::config::{AppConfig, BackendKind};
use adserver_decisionengine::{DecisionBackend, DecisionRequest, InventorySnapshot, TargetingContext};
use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "adserver-decide")]
#[command(about = "Run ad decisions against an inventory snapshot")]
#[command(version)]
struct Cli {
    /// Inventory snapshot (publishers and flights) as JSON
    #[arg(long)]
    inventory: PathBuf,

    /// Ad request as JSON
    #[arg(long)]
    request: PathBuf,

    /// Optional TOML config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// RNG seed (overrides config)
    #[arg(long, env = "ADSERVER__DECISION__SEED")]
    seed: Option<u64>,

    /// Decision backend (overrides config)
    #[arg(long, env = "ADSERVER__DECISION__BACKEND")]
    backend: Option<BackendKind>,

    /// Run this many decisions and print how often each ad was chosen
    #[arg(long)]
    trials: Option<u32>,

    /// Decision time as RFC 3339, defaults to now
    #[arg(long)]
    now: Option<DateTime<Utc>>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "adserver_decide=info,adserver_decisionengine=info".into()),
        )
        .with_writer(std::io::stderr)
        .json()
        .init();

    let cli = Cli::parse();

    let mut config = match cli.config.as_deref() {
        Some(path) => AppConfig::load_from(Some(path))
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => AppConfig::load().unwrap_or_else(|e| {
            warn!(error = %e, "Failed to load config, using defaults");
            AppConfig::default()
        }),
    };

    if let Some(backend) = cli.backend {
        config.decision.backend = backend;
    }
    if let Some(seed) = cli.seed {
        config.decision.seed = Some(seed);
    }

    let snapshot = InventorySnapshot::load(&cli.inventory)
        .with_context(|| format!("loading inventory from {}", cli.inventory.display()))?;
    let raw_request = std::fs::read_to_string(&cli.request)
        .with_context(|| format!("reading request from {}", cli.request.display()))?;
    let request: DecisionRequest = serde_json::from_str(&raw_request)?;

    let publisher = snapshot.publisher(&request.publisher)?.clone();
    let store = Arc::new(snapshot.to_store());
    let backend = DecisionBackend::from_config(&config, store);

    info!(
        node_id = %config.node_id,
        backend = config.decision.backend.as_str(),
        flights = snapshot.flights.len(),
        publisher = %publisher.slug,
        seed = ?config.decision.seed,
        "Configuration loaded"
    );

    let now = cli.now.unwrap_or_else(Utc::now);
    let ctx = TargetingContext::new(request, publisher, now);
    let mut rng = match config.decision.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let Some(trials) = cli.trials else {
        let decision = backend.decide(&ctx, &mut rng)?;
        println!("{}", serde_json::to_string(&decision)?);
        return Ok(());
    };

    let mut histogram: BTreeMap<String, u32> = BTreeMap::new();
    for _ in 0..trials {
        let decision = backend.decide(&ctx, &mut rng)?;
        let key = decision
            .advertisement
            .map_or_else(|| "(none)".to_string(), |ad| ad.slug);
        *histogram.entry(key).or_default() += 1;
    }

    info!(trials, distinct = histogram.len(), "Trials complete");
    println!("{}", serde_json::to_string_pretty(&histogram)?);

    Ok(())
}
