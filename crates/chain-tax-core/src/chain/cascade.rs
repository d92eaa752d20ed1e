//! Price cascade: walks every package line through the chain, manufacturer
//! first, deriving inbound and outbound prices on both tax bases.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::builder::{ResolvedItem, StageDescriptor, TradeChain};
use crate::config::ChainRole;
use crate::tax::inclusive_of_tax;
use crate::types::{pct, Money, Rate};

/// Unit prices of one package line at one stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinePrice {
    pub product_id: String,
    pub product_name: String,
    pub quantity: u32,
    pub msrp: Money,
    pub in_incl: Money,
    pub in_excl: Money,
    pub out_excl: Money,
    pub out_incl: Money,
    /// Rate this stage invoices the line at.
    pub output_rate: Rate,
    /// Creditable input VAT per unit; zero for non-general stages.
    pub input_vat: Money,
    /// Consignor only: commissions paid to its agents per unit, excl. tax.
    pub commission_excl: Money,
}

impl LinePrice {
    fn qty(&self) -> Decimal {
        Decimal::from(self.quantity)
    }
}

/// One stage with its line prices and quantity-weighted aggregates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricedStage {
    pub descriptor: StageDescriptor,
    pub lines: Vec<LinePrice>,
    pub in_incl: Money,
    pub in_excl: Money,
    pub out_excl: Money,
    pub out_incl: Money,
    pub input_vat: Money,
    pub commission_excl: Money,
}

impl PricedStage {
    fn aggregate(descriptor: StageDescriptor, lines: Vec<LinePrice>) -> Self {
        let sum = |f: fn(&LinePrice) -> Money| -> Money {
            lines.iter().map(|l| l.qty() * f(l)).sum()
        };
        PricedStage {
            in_incl: sum(|l| l.in_incl),
            in_excl: sum(|l| l.in_excl),
            out_excl: sum(|l| l.out_excl),
            out_incl: sum(|l| l.out_incl),
            input_vat: sum(|l| l.input_vat),
            commission_excl: sum(|l| l.commission_excl),
            descriptor,
            lines,
        }
    }

    pub fn role(&self) -> ChainRole {
        self.descriptor.role
    }

    pub fn output_vat(&self) -> Money {
        self.out_incl - self.out_excl
    }
}

/// Price every value-carrying line through every stage.
///
/// Lines with zero quantity or a zero base price are dropped here so they
/// neither appear in breakdowns nor disturb the aggregates.
pub fn resolve_prices(chain: &TradeChain) -> Vec<PricedStage> {
    let mut per_stage: Vec<Vec<LinePrice>> = vec![Vec::new(); chain.stages.len()];

    for item in chain.items.iter().filter(|i| i.carries_value()) {
        for (lines, line) in per_stage.iter_mut().zip(price_line(chain, item)) {
            lines.push(line);
        }
    }

    chain
        .stages
        .iter()
        .cloned()
        .zip(per_stage)
        .map(|(descriptor, lines)| PricedStage::aggregate(descriptor, lines))
        .collect()
}

fn price_line(chain: &TradeChain, item: &ResolvedItem) -> Vec<LinePrice> {
    let mut walk: Vec<LinePrice> = Vec::with_capacity(chain.stages.len());
    walk.push(source_line(item));
    // Consignor index and its goods price before the end-sale markup.
    let mut consigned: Option<(usize, Money)> = None;

    for (index, stage) in chain.stages.iter().enumerate().skip(1) {
        let line = match consigned {
            Some((at, goods_incl)) => {
                let consignor = &chain.stages[at];
                commission_line(&mut walk[at], goods_incl, consignor, stage)
            }
            None => match walk.last() {
                Some(upstream) => resell(upstream, stage),
                None => continue,
            },
        };
        if stage.consignor {
            consigned = Some((index, line.out_incl));
        }
        walk.push(line);
    }
    walk
}

/// The manufacturer sells at base cost on its own identity's rate.
fn source_line(item: &ResolvedItem) -> LinePrice {
    let rate = item.manufacturer_identity.output_rate();
    let excl = item.base_price / (Decimal::ONE + rate);
    let input_vat = if item.manufacturer_identity.deducts_input() {
        item.base_price - excl
    } else {
        Decimal::ZERO
    };
    LinePrice {
        product_id: item.product_id.clone(),
        product_name: item.product_name.clone(),
        quantity: item.quantity,
        msrp: item.msrp,
        in_incl: item.base_price,
        in_excl: excl,
        out_excl: excl,
        out_incl: item.base_price,
        output_rate: rate,
        input_vat,
        commission_excl: Decimal::ZERO,
    }
}

fn resell(upstream: &LinePrice, stage: &StageDescriptor) -> LinePrice {
    let rate = stage.tax_identity.output_rate();
    let in_incl = upstream.out_incl;
    // Same as stripping the seller's rate from in_incl, without re-rounding.
    let in_excl = upstream.out_excl;
    let out_excl = in_excl * (Decimal::ONE + pct(stage.markup_pct));
    LinePrice {
        product_id: upstream.product_id.clone(),
        product_name: upstream.product_name.clone(),
        quantity: upstream.quantity,
        msrp: upstream.msrp,
        in_incl,
        in_excl,
        out_excl,
        out_incl: inclusive_of_tax(out_excl, rate),
        output_rate: rate,
        input_vat: if stage.tax_identity.deducts_input() {
            in_incl - in_excl
        } else {
            Decimal::ZERO
        },
        commission_excl: Decimal::ZERO,
    }
}

/// Book one agent's commission against the consignor and return the
/// agent's commission line.
///
/// Every agent is paid on the consignor's goods price, so adding an agent
/// never changes what the others earn. Only the retailer, which faces the end
/// customer, marks the sale up.
fn commission_line(
    consignor_line: &mut LinePrice,
    goods_incl: Money,
    consignor: &StageDescriptor,
    agent: &StageDescriptor,
) -> LinePrice {
    let rate = agent.tax_identity.output_rate();
    let markup = pct(agent.markup_pct);
    let commission = markup * goods_incl;

    if agent.role == ChainRole::Retailer {
        consignor_line.out_excl *= Decimal::ONE + markup;
        consignor_line.out_incl =
            inclusive_of_tax(consignor_line.out_excl, consignor_line.output_rate);
    }
    consignor_line.commission_excl += commission;
    if consignor.tax_identity.deducts_input() {
        consignor_line.input_vat += commission * rate;
    }

    LinePrice {
        product_id: consignor_line.product_id.clone(),
        product_name: consignor_line.product_name.clone(),
        quantity: consignor_line.quantity,
        msrp: consignor_line.msrp,
        in_incl: Decimal::ZERO,
        in_excl: Decimal::ZERO,
        out_excl: commission,
        out_incl: inclusive_of_tax(commission, rate),
        output_rate: rate,
        input_vat: Decimal::ZERO,
        commission_excl: Decimal::ZERO,
    }
}
