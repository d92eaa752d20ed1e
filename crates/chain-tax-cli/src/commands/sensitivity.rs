use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use chain_tax_core::scenarios::{run_sensitivity, ChainMetric, ChainParameter, SensitivityInput, SweepVariable};
use chain_tax_core::RunDocument;

/// Arguments for a parameter sweep
#[derive(Args)]
pub struct SensitivityArgs {
    /// Path to the base run document (catalog + config), JSON or YAML
    #[arg(long)]
    pub input: Option<String>,

    /// First sweep variable in format parameter:min:max:step
    /// (e.g. "platform_markup_pct:5:15:2.5")
    #[arg(long)]
    pub var1: String,

    /// Second sweep variable (optional, creates a 2D table)
    #[arg(long)]
    pub var2: Option<String>,

    /// Metric to record, e.g. platform.net_profit or chain.total_finance_cost
    #[arg(long, default_value = "platform.net_profit")]
    pub metric: ChainMetric,
}

fn parse_sweep(raw: &str) -> Result<SweepVariable, Box<dyn std::error::Error>> {
    let parts: Vec<&str> = raw.split(':').collect();
    if parts.len() != 4 {
        return Err(format!(
            "Sweep variable must be parameter:min:max:step, got '{}'",
            raw
        )
        .into());
    }
    let parameter: ChainParameter = serde_json::from_value(Value::String(parts[0].to_string()))
        .map_err(|_| format!("Unknown sweep parameter '{}'", parts[0]))?;
    Ok(SweepVariable {
        parameter,
        min: parts[1].parse::<Decimal>()?,
        max: parts[2].parse::<Decimal>()?,
        step: parts[3].parse::<Decimal>()?,
    })
}

pub fn run_sweep(args: SensitivityArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let doc: RunDocument = super::load(args.input.as_deref(), "sensitivity")?;
    let input = SensitivityInput {
        catalog: doc.catalog,
        config: doc.config,
        variable_1: parse_sweep(&args.var1)?,
        variable_2: args.var2.as_deref().map(parse_sweep).transpose()?,
        metric: args.metric,
    };
    let result = run_sensitivity(&input)?;
    Ok(serde_json::to_value(result)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sweep() {
        let v = parse_sweep("retailer_payment_term_days:15:90:15").unwrap();
        assert_eq!(v.parameter, ChainParameter::RetailerPaymentTermDays);
        assert_eq!(v.step, Decimal::from(15));
        assert!(parse_sweep("retailer_payment_term_days:15:90").is_err());
        assert!(parse_sweep("wacc:0:1:0.1").is_err());
    }
}
