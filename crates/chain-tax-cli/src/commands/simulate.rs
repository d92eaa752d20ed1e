use clap::Args;
use serde_json::Value;

use chain_tax_core::chain::run_simulation;
use chain_tax_core::tax::TradeMode;
use chain_tax_core::RunDocument;

/// Arguments for a chain simulation
#[derive(Args)]
pub struct SimulateArgs {
    /// Path to a run document (catalog + config), JSON or YAML
    #[arg(long)]
    pub input: Option<String>,

    /// Force consignment mode at the retailer
    #[arg(long, conflicts_with = "resale")]
    pub consignment: bool,

    /// Force resale mode at the retailer
    #[arg(long)]
    pub resale: bool,

    /// Insert the intermediary stage
    #[arg(long)]
    pub with_intermediary: bool,
}

pub fn run_simulate(args: SimulateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut doc: RunDocument = super::load(args.input.as_deref(), "simulate")?;

    if args.consignment {
        doc.config.retailer_trade_mode = TradeMode::Consignment;
    } else if args.resale {
        doc.config.retailer_trade_mode = TradeMode::Resale;
    }
    if args.with_intermediary {
        doc.config.has_intermediary = true;
    }

    let result = run_simulation(&doc.config, &doc.catalog)?;
    Ok(serde_json::to_value(result)?)
}
