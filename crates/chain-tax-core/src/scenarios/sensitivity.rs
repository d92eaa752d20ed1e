use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::ChainMetric;
use crate::catalog::Catalog;
use crate::chain::simulate;
use crate::config::CalculationConfig;
use crate::error::ChainTaxError;
use crate::types::*;
use crate::ChainTaxResult;

/// Sweeps longer than this are rejected rather than run.
const MAX_SWEEP_POINTS: usize = 201;

// ---------------------------------------------------------------------------
// Input types
// ---------------------------------------------------------------------------

/// A configuration field a sweep can vary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChainParameter {
    FunderMarkupPct,
    PlatformMarkupPct,
    IntermediaryMarkupPct,
    RetailerMarkupPct,
    FunderPaymentTermDays,
    IntermediaryPaymentTermDays,
    RetailerPaymentTermDays,
    FunderInterestPct,
    PlatformInterestPct,
    PlatformOperationalCostPct,
    PlatformIncomeTaxPct,
    PlatformVatRefundPct,
    PlatformIncomeTaxRefundPct,
}

impl ChainParameter {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChainParameter::FunderMarkupPct => "funder_markup_pct",
            ChainParameter::PlatformMarkupPct => "platform_markup_pct",
            ChainParameter::IntermediaryMarkupPct => "intermediary_markup_pct",
            ChainParameter::RetailerMarkupPct => "retailer_markup_pct",
            ChainParameter::FunderPaymentTermDays => "funder_payment_term_days",
            ChainParameter::IntermediaryPaymentTermDays => "intermediary_payment_term_days",
            ChainParameter::RetailerPaymentTermDays => "retailer_payment_term_days",
            ChainParameter::FunderInterestPct => "funder_interest_pct",
            ChainParameter::PlatformInterestPct => "platform_interest_pct",
            ChainParameter::PlatformOperationalCostPct => "platform_operational_cost_pct",
            ChainParameter::PlatformIncomeTaxPct => "platform_income_tax_pct",
            ChainParameter::PlatformVatRefundPct => "platform_vat_refund_pct",
            ChainParameter::PlatformIncomeTaxRefundPct => "platform_income_tax_refund_pct",
        }
    }

    /// Write `value` into the configuration. Day counts must be whole,
    /// non-negative numbers.
    pub fn apply(&self, cfg: &mut CalculationConfig, value: Decimal) -> ChainTaxResult<()> {
        match self {
            ChainParameter::FunderMarkupPct => cfg.funder.markup_pct = value,
            ChainParameter::PlatformMarkupPct => cfg.platform.markup_pct = value,
            ChainParameter::IntermediaryMarkupPct => cfg.intermediary.markup_pct = value,
            ChainParameter::RetailerMarkupPct => cfg.retailer.markup_pct = value,
            ChainParameter::FunderPaymentTermDays => cfg.funder.payment_term_days = self.days(value)?,
            ChainParameter::IntermediaryPaymentTermDays => {
                cfg.intermediary.payment_term_days = self.days(value)?
            }
            ChainParameter::RetailerPaymentTermDays => {
                cfg.retailer.payment_term_days = self.days(value)?
            }
            ChainParameter::FunderInterestPct => cfg.settings.funder_interest_pct = value,
            ChainParameter::PlatformInterestPct => cfg.settings.platform_interest_pct = value,
            ChainParameter::PlatformOperationalCostPct => {
                cfg.platform.operational_cost_pct = Some(value)
            }
            ChainParameter::PlatformIncomeTaxPct => cfg.platform.income_tax_pct = Some(value),
            ChainParameter::PlatformVatRefundPct => cfg.platform.vat_refund_pct = Some(value),
            ChainParameter::PlatformIncomeTaxRefundPct => {
                cfg.platform.income_tax_refund_pct = Some(value)
            }
        }
        Ok(())
    }

    fn days(&self, value: Decimal) -> ChainTaxResult<u32> {
        if value.fract().is_zero() {
            if let Some(days) = value.to_u32() {
                return Ok(days);
            }
        }
        Err(ChainTaxError::InvalidInput {
            field: self.as_str().into(),
            reason: format!("{value} is not a whole, non-negative number of days"),
        })
    }
}

/// One swept parameter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepVariable {
    pub parameter: ChainParameter,
    pub min: Decimal,
    pub max: Decimal,
    pub step: Decimal,
}

/// Input for a one- or two-way sweep.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensitivityInput {
    pub catalog: Catalog,
    pub config: CalculationConfig,
    pub variable_1: SweepVariable,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variable_2: Option<SweepVariable>,
    #[serde(default)]
    pub metric: ChainMetric,
}

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensitivityOutput {
    pub variable_1_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variable_2_name: Option<String>,
    pub variable_1_values: Vec<Decimal>,
    pub variable_2_values: Vec<Decimal>,
    pub metric: ChainMetric,
    /// matrix[i][j] = metric when variable_1 = values_1[i] and variable_2 =
    /// values_2[j]; one-way sweeps have a single column.
    pub matrix: Vec<Vec<Decimal>>,
    /// Metric of the unmodified configuration.
    pub base_case_value: Decimal,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Generate the sweep values from min to max with step, max always included.
fn generate_sweep_values(var: &SweepVariable) -> ChainTaxResult<Vec<Decimal>> {
    let field = format!("variable:{}", var.parameter.as_str());
    if var.step <= Decimal::ZERO {
        return Err(ChainTaxError::InvalidInput {
            field,
            reason: "Step must be positive".into(),
        });
    }
    if var.min > var.max {
        return Err(ChainTaxError::InvalidInput {
            field,
            reason: "Min must be <= max".into(),
        });
    }

    let mut values = Vec::new();
    let mut current = var.min;
    while current <= var.max {
        if values.len() == MAX_SWEEP_POINTS {
            return Err(ChainTaxError::InvalidInput {
                field,
                reason: format!("Sweep exceeds {MAX_SWEEP_POINTS} points"),
            });
        }
        values.push(current);
        current += var.step;
    }
    if let Some(&last) = values.last() {
        if last < var.max {
            values.push(var.max);
        }
    }
    Ok(values)
}

/// Sweep one or two parameters over the engine.
///
/// Invalid sweep ranges are errors. A grid point where the engine fails
/// becomes a zero cell plus a warning.
pub fn run_sensitivity(
    input: &SensitivityInput,
) -> ChainTaxResult<ComputationOutput<SensitivityOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let v1_values = generate_sweep_values(&input.variable_1)?;
    let v2_values = match &input.variable_2 {
        Some(var) => generate_sweep_values(var)?,
        None => Vec::new(),
    };

    let base = simulate(&input.config, &input.catalog)?;
    let base_case_value = input.metric.extract(&base)?;

    let evaluate = |v1: Decimal, v2: Option<Decimal>| -> ChainTaxResult<Decimal> {
        let mut cfg = input.config.clone();
        input.variable_1.parameter.apply(&mut cfg, v1)?;
        if let (Some(var), Some(value)) = (&input.variable_2, v2) {
            var.parameter.apply(&mut cfg, value)?;
        }
        let run = simulate(&cfg, &input.catalog)?;
        input.metric.extract(&run)
    };

    let columns: Vec<Option<Decimal>> = if v2_values.is_empty() {
        vec![None]
    } else {
        v2_values.iter().copied().map(Some).collect()
    };

    let mut matrix = Vec::with_capacity(v1_values.len());
    for v1 in &v1_values {
        let mut row = Vec::with_capacity(columns.len());
        for v2 in &columns {
            match evaluate(*v1, *v2) {
                Ok(val) => row.push(val),
                Err(e) => {
                    let at = match v2 {
                        Some(v2) => format!("({v1}, {v2})"),
                        None => format!("{v1}"),
                    };
                    warnings.push(format!("Evaluation failed at {at}: {e}"));
                    row.push(Decimal::ZERO);
                }
            }
        }
        matrix.push(row);
    }

    let output = SensitivityOutput {
        variable_1_name: input.variable_1.parameter.as_str().to_string(),
        variable_2_name: input
            .variable_2
            .as_ref()
            .map(|v| v.parameter.as_str().to_string()),
        variable_1_values: v1_values,
        variable_2_values: v2_values,
        metric: input.metric,
        matrix,
        base_case_value,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        if input.variable_2.is_some() {
            "2-Way Chain Sensitivity"
        } else {
            "1-Way Chain Sensitivity"
        },
        &serde_json::json!({
            "variable_1": input.variable_1.parameter.as_str(),
            "variable_2": input.variable_2.as_ref().map(|v| v.parameter.as_str()),
            "metric": input.metric.to_string(),
        }),
        warnings,
        elapsed,
        output,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ChainRole;
    use crate::scenarios::{ChainField, EntityField};
    use rust_decimal_macros::dec;

    fn sweep(parameter: ChainParameter, min: Decimal, max: Decimal, step: Decimal) -> SweepVariable {
        SweepVariable {
            parameter,
            min,
            max,
            step,
        }
    }

    fn input(variable_1: SweepVariable, variable_2: Option<SweepVariable>) -> SensitivityInput {
        let catalog = Catalog::sample();
        let config = CalculationConfig::seeded(&catalog, "f1", "r1").unwrap();
        SensitivityInput {
            catalog,
            config,
            variable_1,
            variable_2,
            metric: ChainMetric::default(),
        }
    }

    #[test]
    fn test_sweep_values_include_max() {
        let vals = generate_sweep_values(&sweep(
            ChainParameter::PlatformMarkupPct,
            dec!(0),
            dec!(1),
            dec!(0.3),
        ))
        .unwrap();
        assert_eq!(vals.len(), 5);
        assert_eq!(*vals.last().unwrap(), dec!(1));
    }

    #[test]
    fn test_invalid_ranges_rejected() {
        let zero_step = input(
            sweep(ChainParameter::PlatformMarkupPct, dec!(0), dec!(10), dec!(0)),
            None,
        );
        assert!(run_sensitivity(&zero_step).is_err());

        let inverted = input(
            sweep(ChainParameter::PlatformMarkupPct, dec!(10), dec!(0), dec!(1)),
            None,
        );
        assert!(run_sensitivity(&inverted).is_err());
    }

    #[test]
    fn test_one_way_markup_sweep_is_monotone() {
        let out = run_sensitivity(&input(
            sweep(ChainParameter::PlatformMarkupPct, dec!(5), dec!(15), dec!(5)),
            None,
        ))
        .unwrap();
        let res = &out.result;
        assert_eq!(res.matrix.len(), 3);
        assert_eq!(res.matrix[0].len(), 1);
        assert!(res.matrix[0][0] < res.matrix[1][0]);
        assert!(res.matrix[1][0] < res.matrix[2][0]);
        // 10% is the seeded platform markup.
        assert_eq!(res.matrix[1][0], res.base_case_value);
    }

    #[test]
    fn test_two_way_grid_dimensions() {
        let mut inp = input(
            sweep(ChainParameter::FunderPaymentTermDays, dec!(30), dec!(180), dec!(75)),
            Some(sweep(ChainParameter::FunderInterestPct, dec!(4), dec!(8), dec!(2))),
        );
        inp.metric = ChainMetric::Entity {
            role: ChainRole::Funder,
            field: EntityField::FinanceCost,
        };
        let out = run_sensitivity(&inp).unwrap();
        let res = &out.result;
        assert_eq!(res.matrix.len(), 3);
        assert_eq!(res.matrix[0].len(), 3);
        assert!(res.matrix[2][2] > res.matrix[0][0]);
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn test_fractional_days_become_warning_cells() {
        let mut inp = input(
            sweep(ChainParameter::RetailerPaymentTermDays, dec!(10), dec!(11), dec!(0.5)),
            None,
        );
        inp.metric = ChainMetric::Chain(ChainField::TotalFinanceCost);
        let out = run_sensitivity(&inp).unwrap();
        assert_eq!(out.result.matrix.len(), 3);
        assert_eq!(out.result.matrix[1][0], Decimal::ZERO);
        assert_eq!(out.warnings.len(), 1);
    }
}
