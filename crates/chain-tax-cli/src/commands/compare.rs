use clap::Args;
use serde_json::Value;

use chain_tax_core::scenarios::{compare_structures, ChainMetric, ComparisonInput};

/// Arguments for a structure comparison
#[derive(Args)]
pub struct CompareArgs {
    /// Path to a comparison document (catalog, config, variants, metric)
    #[arg(long)]
    pub input: Option<String>,

    /// Metric to compare, e.g. platform.net_profit or chain.net_tax_take
    #[arg(long)]
    pub metric: Option<ChainMetric>,
}

pub fn run_compare(args: CompareArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut input: ComparisonInput = super::load(args.input.as_deref(), "compare")?;
    if let Some(metric) = args.metric {
        input.metric = metric;
    }
    let result = compare_structures(&input)?;
    Ok(serde_json::to_value(result)?)
}
