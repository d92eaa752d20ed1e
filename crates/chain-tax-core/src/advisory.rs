//! Deterministic advisory rules over a simulation result: payment-term
//! strategy tiers, per-entity compliance tips and a plain-text digest.
//!
//! Nothing here feeds back into the numbers.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::chain::builder::TradeChain;
use crate::chain::{EntityResult, SimulationResult};
use crate::config::ChainRole;
use crate::tax::Region;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Upper bound (inclusive) of the short payment-term tier, in days.
pub const SHORT_TERM_MAX_DAYS: u32 = 30;
/// Upper bound (inclusive) of the medium payment-term tier, in days.
pub const MEDIUM_TERM_MAX_DAYS: u32 = 90;

// ---------------------------------------------------------------------------
// Payment-term strategy
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TermTier {
    Short,
    Medium,
    Long,
}

impl TermTier {
    pub fn for_days(days: u32) -> Self {
        if days <= SHORT_TERM_MAX_DAYS {
            TermTier::Short
        } else if days <= MEDIUM_TERM_MAX_DAYS {
            TermTier::Medium
        } else {
            TermTier::Long
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyPoint {
    pub label: String,
    pub text: String,
}

/// Contract and cash-flow guidance for the retailer's payment term.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentTermStrategy {
    pub tier: TermTier,
    pub term_days: u32,
    pub title: String,
    pub points: Vec<StrategyPoint>,
}

impl PaymentTermStrategy {
    pub fn for_term(term_days: u32) -> Self {
        let tier = TermTier::for_days(term_days);
        let (title, points) = match tier {
            TermTier::Short => (
                "Short term (30 days or less): fast turnover",
                [
                    (
                        "Contract terms",
                        "Agree payment on acceptance or on invoice receipt; avoid multi-step acceptance that delays settlement.",
                    ),
                    (
                        "Tax rhythm",
                        "Invoice immediately after delivery is accepted; the short cycle keeps prepaid VAT small.",
                    ),
                    (
                        "Cash flow",
                        "Focus on turnover. Upstream credit longer than 30 days yields a positive cash cycle.",
                    ),
                ],
            ),
            TermTier::Medium => (
                "Medium term (31 to 90 days): balance funding",
                [
                    (
                        "Contract terms",
                        "Seek a deposit plus balance structure (for example 30% prepaid) and fix the invoice date a set number of days before payment.",
                    ),
                    (
                        "Tax rhythm",
                        "VAT is declared the following month, so a 90-day term prepays up to three months of tax; margin must cover that funding cost.",
                    ),
                    (
                        "Supply-chain finance",
                        "Include a receivable confirmation clause so the receivable can be factored.",
                    ),
                ],
            ),
            TermTier::Long => (
                "Long term (over 90 days): risk control",
                [
                    (
                        "Contract terms",
                        "Require late-payment interest (0.05% per day suggested) and retention of title; consider a price adjustment clause for funding cost swings.",
                    ),
                    (
                        "Tax rhythm",
                        "High prepaid-tax exposure. Where possible contract instalment collection so the tax point follows the agreed collection dates.",
                    ),
                    (
                        "Risk pricing",
                        "Price in a funding premium of at least 3-5% and ask the channel for commercial acceptance bills that can be discounted.",
                    ),
                ],
            ),
        };

        PaymentTermStrategy {
            tier,
            term_days,
            title: title.to_string(),
            points: points
                .iter()
                .map(|(label, text)| StrategyPoint {
                    label: label.to_string(),
                    text: text.to_string(),
                })
                .collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Compliance tips
// ---------------------------------------------------------------------------

/// Attach compliance tips to entities, which must be in goods-flow order and
/// aligned with `chain.stages`.
pub fn attach_compliance_tips(entities: &mut [EntityResult], chain: &TradeChain) {
    let consignor = chain.consignor().map(|c| c.role);

    for index in 0..entities.len() {
        let buyer_credits = chain
            .buyer_of(index)
            .map(|b| b.tax_identity.deducts_input() && !b.commission_agent)
            .unwrap_or(false);
        let logistics_budgeted = chain
            .stages
            .get(index)
            .is_some_and(|s| s.logistics_cost_pct > Decimal::ZERO);

        let entity = &mut entities[index];
        let mut tips: Vec<String> = Vec::new();

        if !entity.tax_identity.is_general() && buyer_credits {
            tips.push(format!(
                "Invoice chain break: issues only a {}, so the general-taxpayer buyer credits far less input tax; expect downstream price pressure.",
                entity.tax_identity.invoice_label()
            ));
        }

        if entity.role == ChainRole::Platform {
            if entity.tax_identity.is_general() {
                tips.push(format!(
                    "Issues a {} downstream; the credit chain stays intact.",
                    entity.tax_identity.invoice_label()
                ));
            }
            tips.push(
                "Three flows: contract, invoice and payment must all run between the same two parties; no third-party collection or payment."
                    .into(),
            );
        }

        if Some(entity.role) == consignor {
            tips.push(
                "Consignment: the tax point arises on receipt of the consignment settlement list; reconcile settlement lists on a fixed schedule."
                    .into(),
            );
        }

        if entity.region == Region::Tibet && entity.role != ChainRole::Manufacturer {
            tips.push(
                "Substance: keep a real office, staff with social insurance records and genuine bookkeeping in the park; invoicing shells are not acceptable."
                    .into(),
            );
            tips.push(if logistics_budgeted {
                "Logistics evidence: a logistics budget is configured; keep the full transport documents on file.".into()
            } else {
                "Logistics evidence: no logistics cost is configured; add logistics contracts or waybills to evidence the trade.".into()
            });
            if entity.tax_refunds > Decimal::ZERO {
                tips.push(format!(
                    "Refunds: estimated refund {} is usually paid 3-6 months late; do not rely on it for working capital.",
                    entity.tax_refunds.round_dp(2)
                ));
            }
        }

        if entity.role == ChainRole::Platform && entity.net_profit < Decimal::ZERO {
            tips.push(
                "Loss-making: raise the markup, shorten the payment term or negotiate a higher refund."
                    .into(),
            );
        }

        entity.compliance_tips = tips;
    }
}

// ---------------------------------------------------------------------------
// Digest
// ---------------------------------------------------------------------------

/// Executive summary lines; identical input always yields identical lines.
pub fn digest(result: &SimulationResult) -> Vec<String> {
    let entities = result.entities();
    let totals = &result.totals;
    let mut lines = Vec::new();

    let path: Vec<&str> = entities.iter().map(|e| e.role.as_str()).collect();
    lines.push(format!(
        "Chain: {} ({} mode)",
        path.join(" -> "),
        result.trade_mode.label()
    ));
    lines.push(format!(
        "End-customer revenue {} on a base cost of {}",
        totals.end_customer_revenue.round_dp(2),
        totals.base_cost.round_dp(2)
    ));
    lines.push(format!(
        "Net tax take {}: VAT {}, surcharges {}, income tax {}, refunds {}",
        totals.net_tax_take().round_dp(2),
        totals.total_vat_payable.round_dp(2),
        totals.total_surcharges.round_dp(2),
        totals.total_income_tax.round_dp(2),
        totals.total_tax_refunds.round_dp(2)
    ));

    let platform = &result.platform;
    lines.push(format!(
        "{}: net profit {}, tax burden {}%",
        platform.name,
        platform.net_profit.round_dp(2),
        (platform.tax_burden_rate * dec!(100)).round_dp(2)
    ));

    if let Some(heaviest) = entities
        .iter()
        .filter(|e| e.finance_cost > Decimal::ZERO)
        .max_by(|a, b| a.finance_cost.cmp(&b.finance_cost))
    {
        lines.push(format!(
            "Financing cost {} across the chain, largest at the {} ({} days financed)",
            totals.total_finance_cost.round_dp(2),
            heaviest.role,
            heaviest.financed_days
        ));
    }

    lines.push(format!(
        "Retailer payment term {} days: {:?} tier",
        result.payment_term_strategy.term_days, result.payment_term_strategy.tier
    ));

    let warning_count: usize = entities.iter().map(|e| e.warnings.len()).sum();
    if warning_count > 0 {
        lines.push(format!("{warning_count} warning(s) raised; review entity warnings"));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_term_tier_boundaries() {
        assert_eq!(TermTier::for_days(0), TermTier::Short);
        assert_eq!(TermTier::for_days(30), TermTier::Short);
        assert_eq!(TermTier::for_days(31), TermTier::Medium);
        assert_eq!(TermTier::for_days(90), TermTier::Medium);
        assert_eq!(TermTier::for_days(91), TermTier::Long);
    }

    #[test]
    fn test_strategy_has_three_points() {
        for days in [15, 45, 120] {
            let s = PaymentTermStrategy::for_term(days);
            assert_eq!(s.points.len(), 3);
            assert_eq!(s.term_days, days);
        }
        assert!(PaymentTermStrategy::for_term(120).title.starts_with("Long"));
    }

    #[test]
    fn test_tier_serializes_upper_case() {
        let json = serde_json::to_string(&TermTier::Medium).unwrap();
        assert_eq!(json, r#""MEDIUM""#);
    }
}
