use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// All monetary values (CNY). Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Rates expressed as decimals (0.13 = 13%). Used for VAT identities.
pub type Rate = Decimal;

/// Percentages as entered by planners (12 = 12%). Markups, surcharges,
/// income tax, refunds, cost and interest settings all use this form.
pub type Percent = Decimal;

/// Financing day-count basis.
pub const DAYS_IN_YEAR: Decimal = dec!(360);

/// Convert a planner-entered percentage into a decimal rate.
pub fn pct(value: Percent) -> Rate {
    value / dec!(100)
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pct_converts_planner_percentages() {
        assert_eq!(pct(dec!(12)), dec!(0.12));
        assert_eq!(pct(dec!(4.35)), dec!(0.0435));
        assert_eq!(pct(Decimal::ZERO), Decimal::ZERO);
    }

    #[test]
    fn test_with_metadata_carries_warnings() {
        let out = with_metadata(
            "test",
            &serde_json::json!({ "k": "v" }),
            vec!["w".to_string()],
            7,
            dec!(1),
        );
        assert_eq!(out.warnings, vec!["w".to_string()]);
        assert_eq!(out.metadata.computation_time_us, 7);
        assert_eq!(out.assumptions["k"], "v");
    }
}
