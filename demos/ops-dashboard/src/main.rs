//! Retail operations dashboard: runs the forecasting, pricing and return
//! routing flows against a small mock inventory.

mod inventory;
mod offline;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use retail_adapters::traits::ModelAdapter;
use retail_config::ConfigLoader;
use retail_flows::{
    DemandForecastFlow, DemandForecastInput, DynamicPricerFlow, DynamicPricerInput, Flow,
    ReturnRouterFlow, demand_forecast, dynamic_pricer, render_prompt, return_router,
};
use retail_primitives::ImageDataUri;
use serde::Serialize;
use tracing::{info, warn};

use crate::inventory::{InventoryItem, LocationKind};
use crate::offline::OfflineAdapter;

#[derive(Parser, Debug)]
#[command(name = "ops-dashboard")]
#[command(author, version, about = "Generative retail operations dashboard", long_about = None)]
struct Cli {
    /// Path to a YAML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Answer from canned responses instead of calling a backend
    #[arg(long)]
    offline: bool,

    /// Print the rendered prompt and exit without calling a backend
    #[arg(long)]
    dry_run: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the mock inventory
    Catalog,

    /// Forecast neighbourhood demand for an item
    Forecast {
        /// Item SKU
        #[arg(required = true)]
        sku: String,
    },

    /// Recommend a selling price for an item
    Price {
        /// Item SKU
        #[arg(required = true)]
        sku: String,
    },

    /// Decide how to dispose of a returned item
    Route {
        /// Item SKU
        #[arg(required = true)]
        sku: String,

        /// Photo of the returned item as a `data:image/...;base64,` URI
        #[arg(short, long)]
        photo: Option<ImageDataUri>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut loader = ConfigLoader::new();
    if let Some(path) = &cli.config {
        loader = loader.with_file(path);
    }
    let config = loader.load().context("loading configuration")?;
    retail_telemetry::init_tracing(&config.telemetry)?;

    let command = match cli.command {
        Command::Catalog => {
            print_catalog();
            return Ok(());
        }
        command => command,
    };

    let adapter: Arc<dyn ModelAdapter> = if cli.offline || cli.dry_run {
        Arc::new(OfflineAdapter::new())
    } else {
        config
            .backend
            .build_adapter()
            .context("building backend adapter")?
    };
    let metadata = adapter.metadata();
    info!(provider = metadata.provider(), model = metadata.model(), "backend selected");

    match command {
        Command::Catalog => {}
        Command::Forecast { sku } => {
            let input = DemandForecastInput::from(lookup(&sku)?);
            if cli.dry_run {
                return show_prompt::<DemandForecastFlow>(&input);
            }
            let output = demand_forecast(adapter.as_ref(), &input).await?;
            if output.is_suspect() {
                warn!(confidence = output.confidence_level, "treat this forecast with caution");
            }
            print_json(&output)?;
        }
        Command::Price { sku } => {
            let input = DynamicPricerInput::from(lookup(&sku)?);
            if cli.dry_run {
                return show_prompt::<DynamicPricerFlow>(&input);
            }
            print_json(&dynamic_pricer(adapter.as_ref(), &input).await?)?;
        }
        Command::Route { sku, photo } => {
            let item = lookup(&sku)?;
            let Some(input) = item.return_input(photo) else {
                bail!("{} has no open return", item.sku);
            };
            if cli.dry_run {
                return show_prompt::<ReturnRouterFlow>(&input);
            }
            print_json(&return_router(adapter.as_ref(), &input).await?)?;
        }
    }

    Ok(())
}

fn lookup(sku: &str) -> Result<&'static InventoryItem> {
    inventory::find(sku).with_context(|| format!("unknown SKU `{sku}`; run `catalog` to list items"))
}

fn show_prompt<F: Flow>(input: &F::Input) -> Result<()> {
    println!("{}", render_prompt::<F>(input)?);
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_catalog() {
    println!("{:<12} {:<22} {:<12} {:>6} {:>10}  LOCATION", "SKU", "NAME", "CATEGORY", "STOCK", "PRICE");
    for item in inventory::catalog() {
        let kind = match item.location.kind {
            LocationKind::Store => "store",
            LocationKind::Warehouse => "warehouse",
        };
        let returned = if item.return_info.is_some() { " [return]" } else { "" };
        println!(
            "{:<12} {:<22} {:<12} {:>6} {:>10.2}  {} ({kind}, {}){returned}",
            item.sku,
            item.name,
            item.category,
            item.stock,
            item.original_price,
            item.location.name,
            item.location.zip_code,
        );
    }
}
