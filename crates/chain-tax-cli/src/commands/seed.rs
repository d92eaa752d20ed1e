use clap::Args;
use serde_json::Value;

use chain_tax_core::{CalculationConfig, Catalog, RunDocument};

use crate::input;

/// Arguments for seeding a run document from catalog defaults
#[derive(Args)]
pub struct SeedArgs {
    /// Catalog file (JSON or YAML); the built-in sample catalog if omitted
    #[arg(long)]
    pub catalog: Option<String>,

    /// Funder id to seed from
    #[arg(long, default_value = "f1")]
    pub funder: String,

    /// Retailer id to seed from
    #[arg(long, default_value = "r1")]
    pub retailer: String,
}

pub fn run_seed(args: SeedArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let catalog: Catalog = match args.catalog {
        Some(ref path) => input::file::read_document(path)?,
        None => Catalog::sample(),
    };
    let config = CalculationConfig::seeded(&catalog, &args.funder, &args.retailer)?;
    tracing::debug!(funder = %args.funder, retailer = %args.retailer, "seeded configuration");
    Ok(serde_json::to_value(RunDocument { catalog, config })?)
}
