//! Cost and profitability aggregation: financing and operational cost,
//! gross/net profit, cash outflow, tax burden and per-entity warnings.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::builder::TradeChain;
use super::cascade::PricedStage;
use super::ledger::{assess_income_tax, assess_vat};
use super::WarningCode;
use crate::advisory::PaymentTermStrategy;
use crate::config::ChainRole;
use crate::error::ChainTaxError;
use crate::tax::{Region, TaxIdentity, TradeMode};
use crate::types::{pct, Money, Percent, Rate, DAYS_IN_YEAR};
use crate::ChainTaxResult;

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductPriceDetail {
    pub product_id: String,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price_incl_tax: Money,
    pub total_price_incl_tax: Money,
}

/// Full result for one chain participant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityResult {
    pub role: ChainRole,
    pub id: String,
    pub name: String,
    pub region: Region,
    pub tax_identity: TaxIdentity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trade_mode: Option<TradeMode>,
    pub markup_pct: Percent,
    pub financed_days: u32,
    pub in_price_incl_tax: Money,
    pub in_price_excl_tax: Money,
    pub out_price_incl_tax: Money,
    pub out_price_excl_tax: Money,
    pub vat_input: Money,
    pub vat_output: Money,
    pub vat_payable: Money,
    pub surcharges: Money,
    pub income_tax: Money,
    pub tax_refunds: Money,
    pub finance_cost: Money,
    pub operational_cost: Money,
    pub gross_profit: Money,
    pub net_profit: Money,
    pub cash_outflow: Money,
    pub tax_burden_rate: Rate,
    pub price_breakdown: Vec<ProductPriceDetail>,
    pub notes: Vec<String>,
    pub warnings: Vec<String>,
    pub compliance_tips: Vec<String>,
    /// The platform sits at the center of the chain's three flows.
    pub is_central_node: bool,
}

impl EntityResult {
    /// VAT payable plus surcharges and income tax, before refunds.
    pub fn gross_tax(&self) -> Money {
        self.vat_payable + self.surcharges + self.income_tax
    }
}

/// Chain-wide sums over every entity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChainTotals {
    /// Tax-inclusive amount paid by end customers.
    pub end_customer_revenue: Money,
    /// Tax-inclusive base cost of the package at the manufacturer.
    pub base_cost: Money,
    pub total_vat_payable: Money,
    pub total_surcharges: Money,
    pub total_income_tax: Money,
    pub total_tax_refunds: Money,
    pub total_finance_cost: Money,
    pub total_operational_cost: Money,
    pub total_net_profit: Money,
}

impl ChainTotals {
    fn from_entities(entities: &[EntityResult], chain: &TradeChain) -> Self {
        let end_seller = match chain.trade_mode {
            TradeMode::Consignment => entities
                .iter()
                .find(|e| chain.consignor().is_some_and(|c| c.role == e.role)),
            TradeMode::Resale => entities.iter().find(|e| e.role == ChainRole::Retailer),
        };
        let base_cost = entities
            .iter()
            .find(|e| e.role == ChainRole::Manufacturer)
            .map(|e| e.in_price_incl_tax)
            .unwrap_or_default();

        let sum = |f: fn(&EntityResult) -> Money| -> Money { entities.iter().map(f).sum() };
        ChainTotals {
            end_customer_revenue: end_seller.map(|e| e.out_price_incl_tax).unwrap_or_default(),
            base_cost,
            total_vat_payable: sum(|e| e.vat_payable),
            total_surcharges: sum(|e| e.surcharges),
            total_income_tax: sum(|e| e.income_tax),
            total_tax_refunds: sum(|e| e.tax_refunds),
            total_finance_cost: sum(|e| e.finance_cost),
            total_operational_cost: sum(|e| e.operational_cost),
            total_net_profit: sum(|e| e.net_profit),
        }
    }

    /// Taxes retained by the state after refunds.
    pub fn net_tax_take(&self) -> Money {
        self.total_vat_payable + self.total_surcharges + self.total_income_tax
            - self.total_tax_refunds
    }
}

/// Result of one simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    pub manufacturer: EntityResult,
    pub funder: EntityResult,
    pub platform: EntityResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intermediary: Option<EntityResult>,
    pub retailer: EntityResult,
    pub trade_mode: TradeMode,
    pub totals: ChainTotals,
    pub payment_term_strategy: PaymentTermStrategy,
    pub digest: Vec<String>,
}

impl SimulationResult {
    /// Entities in goods-flow order.
    pub fn entities(&self) -> Vec<&EntityResult> {
        let mut out = vec![&self.manufacturer, &self.funder, &self.platform];
        if let Some(trader) = &self.intermediary {
            out.push(trader);
        }
        out.push(&self.retailer);
        out
    }

    pub fn entity(&self, role: ChainRole) -> Option<&EntityResult> {
        match role {
            ChainRole::Manufacturer => Some(&self.manufacturer),
            ChainRole::Funder => Some(&self.funder),
            ChainRole::Platform => Some(&self.platform),
            ChainRole::Intermediary => self.intermediary.as_ref(),
            ChainRole::Retailer => Some(&self.retailer),
        }
    }

    pub fn all_warnings(&self) -> Vec<String> {
        self.entities()
            .into_iter()
            .flat_map(|e| e.warnings.iter().map(move |w| format!("{}: {w}", e.role)))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Turn priced stages into entity results and chain totals.
pub fn assemble(chain: &TradeChain, priced: &[PricedStage]) -> (Vec<EntityResult>, ChainTotals) {
    let entities: Vec<EntityResult> = priced.iter().map(assess_stage).collect();
    let totals = ChainTotals::from_entities(&entities, chain);
    (entities, totals)
}

/// Split entities into the role-keyed result. Every role except the
/// intermediary must be present.
pub(crate) fn into_result(
    entities: Vec<EntityResult>,
    trade_mode: TradeMode,
    totals: ChainTotals,
    payment_term_strategy: PaymentTermStrategy,
) -> ChainTaxResult<SimulationResult> {
    let mut by_role: [Option<EntityResult>; 5] = Default::default();
    for entity in entities {
        let slot = entity.role as usize;
        by_role[slot] = Some(entity);
    }
    let [manufacturer, funder, platform, intermediary, retailer] = by_role;
    let missing = |role: ChainRole| {
        ChainTaxError::InsufficientData(format!("chain has no {role} stage"))
    };

    Ok(SimulationResult {
        manufacturer: manufacturer.ok_or_else(|| missing(ChainRole::Manufacturer))?,
        funder: funder.ok_or_else(|| missing(ChainRole::Funder))?,
        platform: platform.ok_or_else(|| missing(ChainRole::Platform))?,
        intermediary,
        retailer: retailer.ok_or_else(|| missing(ChainRole::Retailer))?,
        trade_mode,
        totals,
        payment_term_strategy,
        digest: Vec::new(),
    })
}

fn assess_stage(stage: &PricedStage) -> EntityResult {
    let d = &stage.descriptor;
    let vat = assess_vat(stage);

    let gross_profit = stage.out_excl - stage.in_excl - stage.commission_excl;
    let finance_cost = stage.in_incl
        * pct(d.annual_interest_pct)
        * Decimal::from(d.financed_days())
        / DAYS_IN_YEAR;
    let operational_cost = stage.out_excl * pct(d.operational_cost_pct + d.logistics_cost_pct);

    let tax = assess_income_tax(d, gross_profit, operational_cost + finance_cost, &vat);
    let net_profit = tax.profit_before_tax - tax.income_tax + tax.total_refunds();

    let tax_burden_rate = if stage.out_excl.is_zero() {
        Decimal::ZERO
    } else {
        (vat.payable + vat.surcharges + tax.income_tax) / stage.out_excl
    };

    let mut warnings = d.warnings.clone();
    if !d.commission_agent {
        for line in &stage.lines {
            if line.msrp > Decimal::ZERO && line.out_incl > line.msrp {
                warnings.push(WarningCode::AboveMsrp.tag(format!(
                    "{} unit price {} exceeds MSRP {}",
                    line.product_name,
                    line.out_incl.round_dp(2),
                    line.msrp.round_dp(2)
                )));
            }
        }
    }
    if let Some(threshold) = d.viability_threshold {
        if net_profit < threshold {
            warnings.push(WarningCode::BelowViability.tag(format!(
                "net profit {} is below the viability threshold {}",
                net_profit.round_dp(2),
                threshold.round_dp(2)
            )));
        }
    }

    EntityResult {
        role: d.role,
        id: d.id.clone(),
        name: d.name.clone(),
        region: d.region,
        tax_identity: d.tax_identity,
        trade_mode: d.trade_mode,
        markup_pct: d.markup_pct,
        financed_days: d.financed_days(),
        in_price_incl_tax: stage.in_incl,
        in_price_excl_tax: stage.in_excl,
        out_price_incl_tax: stage.out_incl,
        out_price_excl_tax: stage.out_excl,
        vat_input: vat.input,
        vat_output: vat.output,
        vat_payable: vat.payable,
        surcharges: vat.surcharges,
        income_tax: tax.income_tax,
        tax_refunds: tax.total_refunds(),
        finance_cost,
        operational_cost,
        gross_profit,
        net_profit,
        cash_outflow: stage.in_incl + operational_cost,
        tax_burden_rate,
        price_breakdown: stage
            .lines
            .iter()
            .map(|l| ProductPriceDetail {
                product_id: l.product_id.clone(),
                product_name: l.product_name.clone(),
                quantity: l.quantity,
                unit_price_incl_tax: l.out_incl,
                total_price_incl_tax: Decimal::from(l.quantity) * l.out_incl,
            })
            .collect(),
        notes: d.notes.clone(),
        warnings,
        compliance_tips: Vec::new(),
        is_central_node: d.role == ChainRole::Platform,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::chain::builder::build_chain;
    use crate::chain::cascade::resolve_prices;
    use crate::config::CalculationConfig;
    use rust_decimal_macros::dec;

    fn priced(config: &CalculationConfig) -> (TradeChain, Vec<PricedStage>) {
        let chain = build_chain(config, &Catalog::sample()).unwrap();
        let priced = resolve_prices(&chain);
        (chain, priced)
    }

    fn seeded() -> CalculationConfig {
        CalculationConfig::seeded(&Catalog::sample(), "f1", "r1").unwrap()
    }

    #[test]
    fn test_finance_cost_uses_360_day_year() {
        let (_, mut stages) = priced(&seeded());
        let funder = &mut stages[1];
        // 800 at 6% for 180 days.
        assert_eq!(assess_stage(funder).finance_cost, dec!(24));

        funder.descriptor.collection_days = 360;
        assert_eq!(assess_stage(funder).finance_cost, dec!(48));

        funder.descriptor.settlement_days = 400;
        let e = assess_stage(funder);
        assert_eq!(e.financed_days, 0);
        assert_eq!(e.finance_cost, Decimal::ZERO);
    }

    #[test]
    fn test_zero_revenue_has_zero_tax_burden() {
        let mut config = seeded();
        config.package_items[0].quantity = 0;
        let (chain, stages) = priced(&config);
        let (entities, totals) = assemble(&chain, &stages);
        for e in &entities {
            assert_eq!(e.out_price_excl_tax, Decimal::ZERO);
            assert_eq!(e.tax_burden_rate, Decimal::ZERO);
            assert!(e.price_breakdown.is_empty());
        }
        assert_eq!(totals.end_customer_revenue, Decimal::ZERO);
    }

    #[test]
    fn test_tax_burden_and_cash_outflow() {
        let (_, stages) = priced(&seeded());
        let e = assess_stage(&stages[3]);
        assert_eq!(
            e.tax_burden_rate,
            (e.vat_payable + e.surcharges + e.income_tax) / e.out_price_excl_tax
        );
        assert_eq!(e.cash_outflow, e.in_price_incl_tax + e.operational_cost);
    }

    #[test]
    fn test_commission_agents_skip_msrp_check() {
        let mut config = seeded();
        config.retailer_trade_mode = TradeMode::Consignment;
        config.retailer.markup_pct = dec!(900);
        let (chain, stages) = priced(&config);
        let (entities, _) = assemble(&chain, &stages);
        let retailer = entities.iter().find(|e| e.role == ChainRole::Retailer).unwrap();
        assert!(retailer.warnings.iter().all(|w| !w.starts_with("ABOVE_MSRP")));
    }
}
