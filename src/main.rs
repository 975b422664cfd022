//! Loan ledger operator CLI.
//!
//! ```text
//! loan-ledger [--config ledger.toml] [--simulate] health
//! loan-ledger [--config ledger.toml] [--simulate] audit <phone> [--hybrid snapshot.json]
//! ```
//!
//! Secrets come from the environment: `LEDGER_SIGNER_PRIVATE_KEY` for the
//! signer and `LEDGER_STORAGE_JWT` for audit uploads.

use clap::{Parser, Subcommand};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;

use loan_ledger::audit::{AuditAggregator, GenerationMode, LocalSnapshot};
use loan_ledger::blockchain::LedgerContext;
use loan_ledger::config::{load_config, LedgerConfig};
use loan_ledger::contracts::Ledgers;
use loan_ledger::observability::{logging, metrics};
use loan_ledger::sim::SimulatedNetwork;

#[derive(Parser)]
#[command(name = "loan-ledger")]
#[command(about = "Ledger client and audit tool for the loan workflow", long_about = None)]
struct Cli {
    /// TOML configuration file; built-in defaults when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Run against an in-process simulated ledger instead of the configured RPC endpoints.
    #[arg(long)]
    simulate: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Verify chain id, endpoint pool and signer authorization
    Health,
    /// Build and publish the audit document for a subject
    Audit {
        /// Subject phone number
        subject: String,
        /// Build from a local snapshot (JSON) instead of reading the ledgers
        #[arg(long, value_name = "SNAPSHOT")]
        hybrid: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => LedgerConfig::default(),
    };

    logging::init(&config.observability.log_level);
    tracing::info!(
        network = %config.network.name,
        chain_id = config.network.chain_id,
        simulate = cli.simulate,
        "loan-ledger v{} starting",
        env!("CARGO_PKG_VERSION")
    );

    // Initialize metrics exporter
    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    // One context per process; without it every facade degrades to "not available".
    let context = if cli.simulate {
        let builder = match cli.config {
            Some(_) => SimulatedNetwork::builder().config(config.clone()),
            None => SimulatedNetwork::builder(),
        };
        Some(builder.build()?.context)
    } else {
        match LedgerContext::connect(&config) {
            Ok(ctx) => Some(Arc::new(ctx)),
            Err(e) => {
                tracing::warn!(error = %e, "Ledger client unavailable, continuing without it");
                None
            }
        }
    };

    match cli.command {
        Commands::Health => {
            let report = match &context {
                Some(ctx) => {
                    let chain = ctx.verify_chain_id().await;
                    let healthy = chain.is_ok();
                    metrics::record_rpc_health(healthy);
                    let authorized = Ledgers::new(Some(ctx.clone())).access.check_signer().await;
                    json!({
                        "network": ctx.network().name,
                        "chain_id": ctx.network().chain_id,
                        "healthy": healthy,
                        "error": chain.err().map(|e| e.to_string()),
                        "signer": ctx.signer().address().to_string(),
                        "authorized_writer": authorized,
                        "endpoints": ctx
                            .pool()
                            .endpoints()
                            .iter()
                            .map(|e| e.url.as_str())
                            .collect::<Vec<_>>(),
                        "active_endpoint": ctx.pool().active().url,
                    })
                }
                None => json!({
                    "network": config.network.name,
                    "chain_id": config.network.chain_id,
                    "healthy": false,
                    "error": "ledger client not initialized",
                }),
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Audit { subject, hybrid } => {
            let snapshot: Option<LocalSnapshot> = match &hybrid {
                Some(path) => Some(serde_json::from_str(&std::fs::read_to_string(path)?)?),
                None => None,
            };
            let mode = if snapshot.is_some() {
                GenerationMode::HybridLocal
            } else {
                GenerationMode::OnChain
            };

            let aggregator = AuditAggregator::from_config(context, &config)?;
            let publication = aggregator
                .build_audit_document(&subject, mode, snapshot.as_ref())
                .await?;

            let report = json!({
                "subject_hash": publication.document.subject_hash,
                "mode": publication.document.mode,
                "summary": publication.document.summary,
                "possibly_incomplete": publication.document.provenance.possibly_incomplete,
                "unavailable_categories": publication.document.provenance.unavailable_categories,
                "published_hash": publication.published_hash,
                "url": publication.url,
                "backup_path": publication.backup_path.map(|p| p.display().to_string()),
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}
