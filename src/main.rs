mod config;
mod error;
mod inventory;
mod netbox;
mod pricing;
mod topology;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use config::Config;
use error::{PlanError, PlanResult};
use inventory::{Inventory, MemoryInventory};
use netbox::NetBoxClient;
use pricing::{DistanceTable, PriceTable};
use topology::report::{render_text, JsonReport};
use topology::{cleanup, PlanOutcome, Planner};

/// Fabric Planner - size, rack, cable and cost a fat-tree fabric in NetBox
#[derive(Parser)]
#[command(name = "fabric-planner")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Plan and provision a core/aggregation/edge/host fabric in NetBox")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the fabric in NetBox
    Plan {
        /// Delete every managed resource first
        #[arg(long)]
        cleanup: bool,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Run the full plan against an in-memory inventory; NetBox is not touched
    Preview {
        #[arg(long)]
        json: bool,
    },
    /// Delete every managed resource from NetBox
    Cleanup,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fabric_planner=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let cfg = Config::load();
    let json = matches!(cli.command, Commands::Plan { json: true, .. } | Commands::Preview { json: true });

    let outcome = match run(cli.command, &cfg).await {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::error!(code = e.code(), "{}", e);
            std::process::exit(e.exit_code());
        }
    };
    if let Some(outcome) = outcome {
        print!("{}", format_report(&outcome, json)?);
    }
    Ok(())
}

/// Runs a command; returns the outcome when there is a report to print
async fn run(command: Commands, cfg: &Config) -> PlanResult<Option<PlanOutcome>> {
    match command {
        Commands::Plan { cleanup: wipe, .. } => {
            let nb = connect(cfg).await?;
            if wipe {
                cleanup(&nb).await?;
            }
            plan(&nb, cfg).await.map(Some)
        }
        Commands::Preview { .. } => {
            let memory = MemoryInventory::new();
            plan(&memory, cfg).await.map(Some)
        }
        Commands::Cleanup => {
            let nb = connect(cfg).await?;
            let removed = cleanup(&nb).await?;
            let total: usize = removed.iter().map(|(_, n)| n).sum();
            tracing::info!("Cleanup removed {} resources", total);
            Ok(None)
        }
    }
}

async fn plan(inventory: &dyn Inventory, cfg: &Config) -> PlanResult<PlanOutcome> {
    let params = cfg.topology_params()?;
    let prices = PriceTable::load(Some(cfg.prices_file.as_str()))?;
    let distances = DistanceTable::load(Some(cfg.distances_file.as_str()))?;

    tracing::info!("Sizing policy: {}", params.sizing.name());
    Planner::new(inventory, &prices, &distances)
        .with_names(cfg.site_name.clone(), cfg.manufacturer_name.clone())
        .run(&params)
        .await
}

/// Token from NETBOX_TOKEN, or provisioned from NETBOX_USERNAME/NETBOX_PASSWORD
async fn connect(cfg: &Config) -> PlanResult<NetBoxClient> {
    let nb = if !cfg.netbox_token.is_empty() {
        NetBoxClient::new(cfg.netbox_url.clone(), cfg.netbox_token.clone())
            .map_err(|e| PlanError::backend(format!("connect(url={})", cfg.netbox_url), e))?
    } else if !cfg.netbox_username.is_empty() {
        NetBoxClient::with_credentials(cfg.netbox_url.clone(), &cfg.netbox_username, &cfg.netbox_password)
            .await
            .map_err(|e| {
                PlanError::backend(
                    format!("provision_token(url={}, username={})", cfg.netbox_url, cfg.netbox_username),
                    e,
                )
            })?
    } else {
        return Err(PlanError::config("set NETBOX_TOKEN or NETBOX_USERNAME/NETBOX_PASSWORD"));
    };

    if !nb.test_connection().await {
        tracing::warn!("NetBox at {} did not answer the connectivity check", cfg.netbox_url);
    }
    tracing::info!("Using NetBox at {}", cfg.netbox_url);
    Ok(nb)
}

fn format_report(outcome: &PlanOutcome, json: bool) -> Result<String> {
    if json {
        let body = serde_json::to_string_pretty(&JsonReport::from_outcome(outcome))
            .context("Failed to encode report")?;
        Ok(format!("{}\n", body))
    } else {
        Ok(render_text(&outcome.fabric, &outcome.cost))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::sizing::{RemainderPolicy, SizingPolicy, TierModels, TopologyParams};

    async fn preview_outcome() -> PlanOutcome {
        let inv = MemoryInventory::new();
        let prices = PriceTable::default();
        let distances = DistanceTable::default();
        let params = TopologyParams {
            sizing: SizingPolicy::FixedFanout {
                tree_level: 2,
                ports_per_switch: 4,
            },
            rack_height: 42,
            pod_size: 4,
            remainder: RemainderPolicy::Reject,
            models: TierModels::default(),
        };
        Planner::new(&inv, &prices, &distances).run(&params).await.unwrap()
    }

    #[tokio::test]
    async fn test_format_report_json() {
        let outcome = preview_outcome().await;
        let body = format_report(&outcome, true).unwrap();
        let value: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert!(value.is_object());
        assert!(body.ends_with('\n'));
    }

    #[tokio::test]
    async fn test_format_report_text() {
        let outcome = preview_outcome().await;
        let body = format_report(&outcome, false).unwrap();
        assert!(body.contains("TOTAL:"));
    }
}
