//! The simulation engine: chain builder, price cascade, tax ledger and
//! cost/profit aggregation, run in that order.

pub mod aggregate;
pub mod builder;
pub mod cascade;
pub mod ledger;

use std::fmt::Display;
use std::time::Instant;

use tracing::{debug, info_span};

use crate::advisory::{self, PaymentTermStrategy};
use crate::catalog::Catalog;
use crate::config::{CalculationConfig, ChainRole};
use crate::types::{with_metadata, ComputationOutput};
use crate::ChainTaxResult;

pub use aggregate::{ChainTotals, EntityResult, ProductPriceDetail, SimulationResult};
pub use builder::{build_chain, ResolvedItem, StageDescriptor, TradeChain};
pub use cascade::{resolve_prices, LinePrice, PricedStage};
pub use ledger::{IncomeTaxAssessment, VatPosition};

/// Classification prefix of entity warnings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningCode {
    AboveMsrp,
    BelowViability,
    RateGap,
    IgnoredLink,
}

impl WarningCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            WarningCode::AboveMsrp => "ABOVE_MSRP",
            WarningCode::BelowViability => "BELOW_VIABILITY",
            WarningCode::RateGap => "RATE_GAP",
            WarningCode::IgnoredLink => "IGNORED_LINK",
        }
    }

    /// `CODE: message`
    pub fn tag(&self, message: impl Display) -> String {
        format!("{}: {message}", self.as_str())
    }
}

/// Run the engine over one configuration and catalog snapshot.
///
/// Pure: identical inputs always produce an identical result.
pub fn simulate(config: &CalculationConfig, catalog: &Catalog) -> ChainTaxResult<SimulationResult> {
    let _span = info_span!("simulate", funder = %config.funder_id, retailer = %config.retailer_id)
        .entered();

    let chain = build_chain(config, catalog)?;
    let priced = resolve_prices(&chain);
    let (mut entities, totals) = aggregate::assemble(&chain, &priced);
    advisory::attach_compliance_tips(&mut entities, &chain);

    let retailer_term = chain
        .stage(ChainRole::Retailer)
        .map(|r| r.settlement_days)
        .unwrap_or_default();
    let strategy = PaymentTermStrategy::for_term(retailer_term);

    let mut result = aggregate::into_result(entities, chain.trade_mode, totals, strategy)?;
    result.digest = advisory::digest(&result);

    debug!(
        revenue = %result.totals.end_customer_revenue,
        net_profit = %result.totals.total_net_profit,
        warnings = result.all_warnings().len(),
        "simulation complete"
    );
    Ok(result)
}

/// [`simulate`] wrapped in the standard computation envelope.
///
/// Entity warnings are repeated in the envelope, prefixed with their role.
pub fn run_simulation(
    config: &CalculationConfig,
    catalog: &Catalog,
) -> ChainTaxResult<ComputationOutput<SimulationResult>> {
    let start = Instant::now();
    let result = simulate(config, catalog)?;
    let warnings = result.all_warnings();

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Trade-chain VAT cascade with regional incentive overlay, 360-day financing basis",
        &serde_json::json!({
            "day_count": "actual/360",
            "trade_mode": config.retailer_trade_mode.label(),
            "has_intermediary": config.has_intermediary,
            "package_items": config.package_items.len(),
            "funder_interest_pct": config.settings.funder_interest_pct.to_string(),
            "platform_interest_pct": config.settings.platform_interest_pct.to_string(),
        }),
        warnings,
        elapsed,
        result,
    ))
}
