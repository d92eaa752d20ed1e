use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::warn;

use super::ChainMetric;
use crate::catalog::Catalog;
use crate::chain::simulate;
use crate::config::CalculationConfig;
use crate::error::ChainTaxError;
use crate::tax::{Region, TaxIdentity, TradeMode};
use crate::types::*;
use crate::ChainTaxResult;

// ---------------------------------------------------------------------------
// Input types
// ---------------------------------------------------------------------------

/// Typed changes a variant applies to the base configuration. Unset fields
/// keep the base value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VariantOverrides {
    pub trade_mode: Option<TradeMode>,
    pub has_intermediary: Option<bool>,
    pub funder_markup_pct: Option<Percent>,
    pub platform_markup_pct: Option<Percent>,
    pub intermediary_markup_pct: Option<Percent>,
    pub retailer_markup_pct: Option<Percent>,
    pub funder_payment_term_days: Option<u32>,
    pub intermediary_payment_term_days: Option<u32>,
    pub retailer_payment_term_days: Option<u32>,
    pub platform_tax_identity: Option<TaxIdentity>,
    pub platform_region: Option<Region>,
    pub platform_vat_refund_pct: Option<Percent>,
    pub platform_income_tax_refund_pct: Option<Percent>,
}

impl VariantOverrides {
    pub fn apply(&self, base: &CalculationConfig) -> CalculationConfig {
        let mut cfg = base.clone();
        if let Some(mode) = self.trade_mode {
            cfg.retailer_trade_mode = mode;
        }
        if let Some(flag) = self.has_intermediary {
            cfg.has_intermediary = flag;
        }

        let set = |slot: &mut Percent, value: Option<Percent>| {
            if let Some(v) = value {
                *slot = v;
            }
        };
        set(&mut cfg.funder.markup_pct, self.funder_markup_pct);
        set(&mut cfg.platform.markup_pct, self.platform_markup_pct);
        set(&mut cfg.intermediary.markup_pct, self.intermediary_markup_pct);
        set(&mut cfg.retailer.markup_pct, self.retailer_markup_pct);

        if let Some(days) = self.funder_payment_term_days {
            cfg.funder.payment_term_days = days;
        }
        if let Some(days) = self.intermediary_payment_term_days {
            cfg.intermediary.payment_term_days = days;
        }
        if let Some(days) = self.retailer_payment_term_days {
            cfg.retailer.payment_term_days = days;
        }

        if let Some(identity) = self.platform_tax_identity {
            cfg.platform.tax_identity = identity;
        }
        if let Some(region) = self.platform_region {
            cfg.platform.region = region;
        }
        if self.platform_vat_refund_pct.is_some() {
            cfg.platform.vat_refund_pct = self.platform_vat_refund_pct;
        }
        if self.platform_income_tax_refund_pct.is_some() {
            cfg.platform.income_tax_refund_pct = self.platform_income_tax_refund_pct;
        }
        cfg
    }
}

/// A named alternative chain structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructureVariant {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub overrides: VariantOverrides,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonInput {
    pub catalog: Catalog,
    pub config: CalculationConfig,
    pub variants: Vec<StructureVariant>,
    #[serde(default)]
    pub metric: ChainMetric,
}

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariantResult {
    pub name: String,
    pub metric_value: Money,
    pub deviation_from_base: Money,
    pub deviation_pct: Rate,
    pub total_net_profit: Money,
    pub net_tax_take: Money,
    pub warning_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonOutput {
    pub metric: ChainMetric,
    pub base_value: Money,
    pub variants: Vec<VariantResult>,
    pub highest: Option<String>,
    pub lowest: Option<String>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Run the base configuration and every variant, reporting the chosen metric
/// and its deviation from the base run.
///
/// A base configuration that fails is an error; a failing variant is skipped
/// with a warning.
pub fn compare_structures(
    input: &ComparisonInput,
) -> ChainTaxResult<ComputationOutput<ComparisonOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.variants.is_empty() {
        return Err(ChainTaxError::InsufficientData(
            "At least one structure variant required".into(),
        ));
    }

    let base = simulate(&input.config, &input.catalog)?;
    let base_value = input.metric.extract(&base)?;

    let mut results = Vec::with_capacity(input.variants.len());
    for variant in &input.variants {
        let config = variant.overrides.apply(&input.config);
        let outcome = simulate(&config, &input.catalog)
            .and_then(|r| input.metric.extract(&r).map(|v| (r, v)));
        let (run, value) = match outcome {
            Ok(ok) => ok,
            Err(e) => {
                warn!(variant = %variant.name, error = %e, "variant skipped");
                warnings.push(format!("Variant '{}' skipped: {e}", variant.name));
                continue;
            }
        };

        let deviation = value - base_value;
        let deviation_pct = if base_value.is_zero() {
            if !deviation.is_zero() {
                warnings.push(format!(
                    "Base value is zero; cannot compute deviation_pct for variant '{}'",
                    variant.name
                ));
            }
            Decimal::ZERO
        } else {
            deviation / base_value.abs()
        };

        results.push(VariantResult {
            name: variant.name.clone(),
            metric_value: value,
            deviation_from_base: deviation,
            deviation_pct,
            total_net_profit: run.totals.total_net_profit,
            net_tax_take: run.totals.net_tax_take(),
            warning_count: run.all_warnings().len(),
        });
    }

    let highest = results
        .iter()
        .max_by(|a, b| a.metric_value.cmp(&b.metric_value))
        .map(|r| r.name.clone());
    let lowest = results
        .iter()
        .min_by(|a, b| a.metric_value.cmp(&b.metric_value))
        .map(|r| r.name.clone());

    let output = ComparisonOutput {
        metric: input.metric,
        base_value,
        variants: results,
        highest,
        lowest,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Chain Structure Comparison",
        &serde_json::json!({
            "num_variants": input.variants.len(),
            "metric": input.metric.to_string(),
            "base_value": base_value.to_string(),
        }),
        warnings,
        elapsed,
        output,
    ))
}
