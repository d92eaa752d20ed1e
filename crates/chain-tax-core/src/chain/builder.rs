//! Chain builder: translates configuration + catalog into the ordered list of
//! stage descriptors that every downstream formula reads.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::WarningCode;
use crate::catalog::Catalog;
use crate::config::{CalculationConfig, ChainRole, StageSettings, TransactionLinkConfig};
use crate::error::ChainTaxError;
use crate::tax::{Region, RegionPolicy, TaxIdentity, TradeMode};
use crate::types::{Money, Percent};
use crate::ChainTaxResult;

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// A package item with its catalog references resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedItem {
    pub manufacturer_id: String,
    pub manufacturer_name: String,
    pub manufacturer_identity: TaxIdentity,
    pub product_id: String,
    pub product_name: String,
    pub base_price: Money,
    pub msrp: Money,
    pub quantity: u32,
}

impl ResolvedItem {
    /// Zero-quantity and zero-priced lines carry no value through the chain.
    pub fn carries_value(&self) -> bool {
        self.quantity > 0 && !self.base_price.is_zero()
    }
}

/// Everything the formulas need to know about one chain participant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageDescriptor {
    pub role: ChainRole,
    pub id: String,
    pub name: String,
    pub region: Region,
    /// Identity used for this stage's own invoices. A consignment retailer
    /// invoices its commission as a service.
    pub tax_identity: TaxIdentity,
    pub trade_mode: Option<TradeMode>,
    pub markup_pct: Percent,
    /// Days after receiving goods until this stage pays its seller.
    pub settlement_days: u32,
    /// Days after delivery until this stage is paid by its buyer.
    pub collection_days: u32,
    pub annual_interest_pct: Percent,
    pub vat_surcharge_pct: Percent,
    pub income_tax_pct: Percent,
    pub vat_refund_pct: Percent,
    pub income_tax_refund_pct: Percent,
    pub operational_cost_pct: Percent,
    pub logistics_cost_pct: Percent,
    /// `None` for the source manufacturer, whose profit is not modelled.
    pub viability_threshold: Option<Money>,
    /// Sells goods to end customers through a consignment retailer.
    pub consignor: bool,
    /// Downstream of the consignor in consignment mode: never owns the goods
    /// and earns a commission on the consignor's price.
    pub commission_agent: bool,
    pub notes: Vec<String>,
    pub warnings: Vec<String>,
}

impl StageDescriptor {
    /// Days this stage pays upstream before it is paid downstream.
    pub fn financed_days(&self) -> u32 {
        self.collection_days.saturating_sub(self.settlement_days)
    }

    fn new(role: ChainRole, id: String, name: String, region: Region) -> Self {
        StageDescriptor {
            role,
            id,
            name,
            region,
            tax_identity: TaxIdentity::general(),
            trade_mode: None,
            markup_pct: Decimal::ZERO,
            settlement_days: 0,
            collection_days: 0,
            annual_interest_pct: Decimal::ZERO,
            vat_surcharge_pct: Decimal::ZERO,
            income_tax_pct: Decimal::ZERO,
            vat_refund_pct: Decimal::ZERO,
            income_tax_refund_pct: Decimal::ZERO,
            operational_cost_pct: Decimal::ZERO,
            logistics_cost_pct: Decimal::ZERO,
            viability_threshold: None,
            consignor: false,
            commission_agent: false,
            notes: Vec::new(),
            warnings: Vec::new(),
        }
    }
}

/// The resolved chain: stages in goods-flow order plus the priced package.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeChain {
    pub stages: Vec<StageDescriptor>,
    pub items: Vec<ResolvedItem>,
    pub trade_mode: TradeMode,
}

impl TradeChain {
    pub fn stage(&self, role: ChainRole) -> Option<&StageDescriptor> {
        self.stages.iter().find(|s| s.role == role)
    }

    /// The stage buying from `stages[index]`, if any.
    pub fn buyer_of(&self, index: usize) -> Option<&StageDescriptor> {
        self.stages.get(index + 1)
    }

    pub fn consignor(&self) -> Option<&StageDescriptor> {
        self.stages.iter().find(|s| s.consignor)
    }

    pub fn has_intermediary(&self) -> bool {
        self.stage(ChainRole::Intermediary).is_some()
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Resolve a configuration against a catalog snapshot.
///
/// Fails before any pricing if the package is empty, a referenced funder,
/// retailer, manufacturer or product is unknown, or a numeric input is out of
/// range. Missing rates never fail; they become zero with a warning.
pub fn build_chain(config: &CalculationConfig, catalog: &Catalog) -> ChainTaxResult<TradeChain> {
    config.validate()?;

    let funder = catalog.funder(&config.funder_id)?;
    let retailer = catalog.retailer(&config.retailer_id)?;
    let items = resolve_items(config, catalog)?;

    let mut roles = vec![ChainRole::Manufacturer, ChainRole::Funder, ChainRole::Platform];
    if config.has_intermediary {
        roles.push(ChainRole::Intermediary);
    }
    roles.push(ChainRole::Retailer);

    let mut stages: Vec<StageDescriptor> = roles
        .iter()
        .map(|&role| match role {
            ChainRole::Manufacturer => manufacturer_stage(config, &items),
            ChainRole::Funder => {
                StageDescriptor::new(role, funder.id.clone(), funder.name.clone(), config.funder.region)
            }
            ChainRole::Retailer => StageDescriptor::new(
                role,
                retailer.id.clone(),
                retailer.name.clone(),
                config.retailer.region,
            ),
            ChainRole::Platform | ChainRole::Intermediary => {
                let settings = stage_settings(config, role);
                let name = settings
                    .name
                    .clone()
                    .unwrap_or_else(|| role.label().to_string());
                StageDescriptor::new(role, role.as_str().to_string(), name, settings.region)
            }
        })
        .collect();

    let edges = resolve_edges(config, &roles, &mut stages);

    for (index, stage) in stages.iter_mut().enumerate() {
        if index > 0 {
            stage.settlement_days = edges[index - 1].credit_days;
        }
        if let Some(edge) = edges.get(index) {
            stage.collection_days = edge.credit_days;
        }
        if stage.role != ChainRole::Manufacturer {
            stage.markup_pct = edges[index - 1].markup_pct;
            apply_settings(config, stage);
        }
    }

    if config.retailer_trade_mode == TradeMode::Consignment {
        mark_consignment(&mut stages);
    }

    for stage in &stages {
        debug!(
            role = %stage.role,
            markup_pct = %stage.markup_pct,
            settlement_days = stage.settlement_days,
            collection_days = stage.collection_days,
            financed_days = stage.financed_days(),
            "stage resolved"
        );
    }

    Ok(TradeChain {
        stages,
        items,
        trade_mode: config.retailer_trade_mode,
    })
}

// ---------------------------------------------------------------------------
// Items
// ---------------------------------------------------------------------------

fn resolve_items(config: &CalculationConfig, catalog: &Catalog) -> ChainTaxResult<Vec<ResolvedItem>> {
    config
        .package_items
        .iter()
        .map(|item| {
            let (manufacturer, product) =
                catalog.product(&item.manufacturer_id, &item.product_id)?;
            if manufacturer.tax_identity.output_rate() < Decimal::ZERO {
                return Err(ChainTaxError::InvalidInput {
                    field: format!("manufacturer:{}", manufacturer.id),
                    reason: "Tax rate cannot be negative".into(),
                });
            }
            if product.base_price < Decimal::ZERO || product.msrp < Decimal::ZERO {
                return Err(ChainTaxError::InvalidInput {
                    field: format!("product:{}", product.id),
                    reason: "Base price and MSRP cannot be negative".into(),
                });
            }
            Ok(ResolvedItem {
                manufacturer_id: manufacturer.id.clone(),
                manufacturer_name: manufacturer.name.clone(),
                manufacturer_identity: manufacturer.tax_identity,
                product_id: product.id.clone(),
                product_name: product.name.clone(),
                base_price: product.base_price,
                msrp: product.msrp,
                quantity: item.quantity,
            })
        })
        .collect()
}

fn manufacturer_stage(config: &CalculationConfig, items: &[ResolvedItem]) -> StageDescriptor {
    let mut ids: Vec<&str> = Vec::new();
    let mut names: Vec<&str> = Vec::new();
    for item in items {
        if !ids.contains(&item.manufacturer_id.as_str()) {
            ids.push(&item.manufacturer_id);
            names.push(&item.manufacturer_name);
        }
    }

    let mut stage = StageDescriptor::new(
        ChainRole::Manufacturer,
        ids.join(","),
        names.join(" / "),
        config.manufacturer_region,
    );

    // Per-line identities drive the pricing; the descriptor carries the first.
    if let Some(first) = items.first() {
        stage.tax_identity = first.manufacturer_identity;
    }
    let mixed = items
        .iter()
        .any(|i| i.manufacturer_identity != stage.tax_identity);

    stage.notes.push(format!("Source: {}", stage.tax_identity.label()));
    if mixed {
        stage
            .notes
            .push("Mixed manufacturer identities: each line is invoiced at its own rate".into());
    }
    stage
        .notes
        .push("Cost structure before the chain is not modelled; sells at base cost".into());

    let policy = config.settings.policy(stage.region).clone();
    stage.vat_surcharge_pct = resolve_rate(&mut stage, "VAT surcharge", None, policy.vat_surcharge_pct);
    stage.income_tax_pct = resolve_rate(&mut stage, "income tax", None, policy.income_tax_pct);
    stage
}

/// The platform keeps title until the end sale; every later stage becomes a
/// commission agent invoicing its commission as a service.
fn mark_consignment(stages: &mut [StageDescriptor]) {
    let mut downstream = false;
    for stage in stages.iter_mut() {
        if downstream {
            stage.commission_agent = true;
            if !matches!(stage.tax_identity, TaxIdentity::Service { .. }) {
                stage.tax_identity = TaxIdentity::service();
            }
            stage.notes.push(format!(
                "Consignment: earns {}% commission invoiced at {}",
                stage.markup_pct.normalize(),
                stage.tax_identity.invoice_label()
            ));
        } else if stage.role == ChainRole::Platform {
            stage.consignor = true;
            stage
                .notes
                .push("Consignor: recognizes the end-customer sale and pays the channel commissions".into());
            downstream = true;
        }
    }
}

// ---------------------------------------------------------------------------
// Edges
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
struct Edge {
    markup_pct: Percent,
    credit_days: u32,
}

/// Markup and credit days for every adjacent pair in `roles`.
///
/// An enabled link stands in for the markup and payment-term fields of the
/// stage it points to, so links and scalar fields describe the same chain.
/// Credit days are then derived from the terms: the manufacturer is paid on
/// delivery, the platform owes the funder the funder's term, the intermediary
/// owes the platform the retailer term less its own float, and the retailer
/// pays on its own term. Links on pairs that are not adjacent in this chain
/// are ignored with a warning.
fn resolve_edges(
    config: &CalculationConfig,
    roles: &[ChainRole],
    stages: &mut [StageDescriptor],
) -> Vec<Edge> {
    let mut terms: Vec<Edge> = roles
        .iter()
        .map(|&role| match config.stage(role) {
            Some(settings) => Edge {
                markup_pct: settings.markup_pct,
                credit_days: settings.payment_term_days,
            },
            None => Edge {
                markup_pct: Decimal::ZERO,
                credit_days: 0,
            },
        })
        .collect();

    let mut linked = vec![false; roles.len()];
    for link in &config.transaction_links {
        if !link.enabled {
            debug!(link = %link.id, "transaction link disabled");
            continue;
        }
        let edge = roles
            .windows(2)
            .position(|w| w[0] == link.from && w[1] == link.to);
        match edge {
            Some(edge) if !linked[edge + 1] => {
                linked[edge + 1] = true;
                terms[edge + 1] = Edge {
                    markup_pct: link.markup_pct,
                    credit_days: link.payment_term_days,
                };
            }
            Some(_) => push_link_warning(
                stages,
                link,
                "duplicate link for this edge; the first enabled link applies",
            ),
            None => push_link_warning(stages, link, "roles are not adjacent in the active chain"),
        }
    }

    let term_of = |role: ChainRole| {
        roles
            .iter()
            .position(|&r| r == role)
            .map(|i| terms[i].credit_days)
            .unwrap_or(0)
    };
    let funder_term = term_of(ChainRole::Funder);
    let retailer_term = term_of(ChainRole::Retailer);

    roles
        .iter()
        .zip(&terms)
        .skip(1)
        .map(|(&to, term)| Edge {
            markup_pct: term.markup_pct,
            credit_days: match to {
                ChainRole::Platform => funder_term,
                ChainRole::Intermediary => retailer_term.saturating_sub(term.credit_days),
                ChainRole::Retailer => retailer_term,
                ChainRole::Manufacturer | ChainRole::Funder => 0,
            },
        })
        .collect()
}

fn push_link_warning(stages: &mut [StageDescriptor], link: &TransactionLinkConfig, reason: &str) {
    warn!(link = %link.id, from = %link.from, to = %link.to, reason, "transaction link ignored");
    let message = WarningCode::IgnoredLink.tag(format!(
        "link '{}' ({} -> {}) ignored: {reason}",
        link.name, link.from, link.to
    ));
    let target = stages
        .iter()
        .position(|s| s.role == link.to)
        .or_else(|| stages.iter().position(|s| s.role == link.from))
        .unwrap_or(stages.len() - 1);
    stages[target].warnings.push(message);
}

// ---------------------------------------------------------------------------
// Rates
// ---------------------------------------------------------------------------

fn stage_settings(config: &CalculationConfig, role: ChainRole) -> &StageSettings {
    config.stage(role).unwrap_or(&config.retailer)
}

fn apply_settings(config: &CalculationConfig, stage: &mut StageDescriptor) {
    let settings = stage_settings(config, stage.role);
    let policy: RegionPolicy = config.settings.policy(stage.region).clone();

    stage.tax_identity = settings.tax_identity;
    stage.notes.push(format!(
        "{}, {}",
        stage.tax_identity.label(),
        stage.region.label()
    ));

    if stage.role == ChainRole::Retailer {
        stage.trade_mode = Some(config.retailer_trade_mode);
    }

    stage.vat_surcharge_pct = resolve_rate(
        stage,
        "VAT surcharge",
        settings.vat_surcharge_pct,
        policy.vat_surcharge_pct,
    );
    stage.income_tax_pct = resolve_rate(
        stage,
        "income tax",
        settings.income_tax_pct,
        policy.income_tax_pct,
    );

    if stage.region.refund_eligible() {
        stage.vat_refund_pct =
            resolve_rate(stage, "VAT refund", settings.vat_refund_pct, policy.vat_refund_pct);
        stage.income_tax_refund_pct = resolve_rate(
            stage,
            "income tax refund",
            settings.income_tax_refund_pct,
            policy.income_tax_refund_pct,
        );
    } else {
        let requested = [settings.vat_refund_pct, settings.income_tax_refund_pct];
        if requested.iter().flatten().any(|v| !v.is_zero()) {
            stage.warnings.push(WarningCode::RateGap.tag(format!(
                "refund rates ignored: {} carries no refund policy",
                stage.region.label()
            )));
        }
    }

    stage.operational_cost_pct = match (stage.role, settings.operational_cost_pct) {
        (_, Some(v)) => v,
        (ChainRole::Platform, None) => config.settings.platform_operational_cost_pct,
        _ => Decimal::ZERO,
    };
    stage.logistics_cost_pct = settings.logistics_cost_pct.unwrap_or(Decimal::ZERO);

    let default_interest = match stage.role {
        ChainRole::Funder => Some(config.settings.funder_interest_pct),
        ChainRole::Platform => Some(config.settings.platform_interest_pct),
        _ => None,
    };
    stage.annual_interest_pct = match settings.annual_interest_pct.or(default_interest) {
        Some(v) => v,
        None if stage.financed_days() > 0 => resolve_rate(stage, "annual interest", None, None),
        None => Decimal::ZERO,
    };

    stage.viability_threshold =
        Some(settings.min_net_profit.unwrap_or(config.settings.viability_threshold));

    if stage.financed_days() > 0 {
        stage.notes.push(format!(
            "Finances {} days: pays upstream after {} days, collected after {} days",
            stage.financed_days(),
            stage.settlement_days,
            stage.collection_days
        ));
    }
}

/// Stage override, then regional default, then zero with a rate-gap warning.
fn resolve_rate(
    stage: &mut StageDescriptor,
    rate_name: &str,
    stage_value: Option<Percent>,
    policy_value: Option<Percent>,
) -> Percent {
    match stage_value.or(policy_value) {
        Some(v) => v,
        None => {
            warn!(role = %stage.role, rate = rate_name, region = ?stage.region, "rate not configured, using zero");
            stage.warnings.push(WarningCode::RateGap.tag(format!(
                "{rate_name} rate not configured for {} ({}); treated as 0%",
                stage.region.label(),
                stage.tax_identity.label()
            )));
            Decimal::ZERO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PackageItem;
    use rust_decimal_macros::dec;

    fn seeded() -> (CalculationConfig, Catalog) {
        let catalog = Catalog::sample();
        let config = CalculationConfig::seeded(&catalog, "f1", "r1").unwrap();
        (config, catalog)
    }

    fn roles(chain: &TradeChain) -> Vec<ChainRole> {
        chain.stages.iter().map(|s| s.role).collect()
    }

    #[test]
    fn test_four_stage_chain_without_intermediary() {
        let (config, catalog) = seeded();
        let chain = build_chain(&config, &catalog).unwrap();
        assert_eq!(
            roles(&chain),
            vec![
                ChainRole::Manufacturer,
                ChainRole::Funder,
                ChainRole::Platform,
                ChainRole::Retailer
            ]
        );
    }

    #[test]
    fn test_intermediary_included_iff_flag_set() {
        let (mut config, catalog) = seeded();
        config.has_intermediary = true;
        let chain = build_chain(&config, &catalog).unwrap();
        assert_eq!(chain.stages.len(), 5);
        assert_eq!(chain.stages[3].role, ChainRole::Intermediary);
        assert_eq!(chain.stages[3].markup_pct, dec!(5));
    }

    #[test]
    fn test_unknown_funder_fails_before_pricing() {
        let (mut config, catalog) = seeded();
        config.funder_id = "ghost".into();
        let err = build_chain(&config, &catalog).unwrap_err();
        assert!(matches!(err, ChainTaxError::UnresolvedEntity { ref kind, .. } if kind == "funder"));
    }

    #[test]
    fn test_unknown_product_fails() {
        let (mut config, catalog) = seeded();
        config.package_items.push(PackageItem {
            manufacturer_id: "m1".into(),
            product_id: "missing".into(),
            quantity: 1,
        });
        assert!(build_chain(&config, &catalog).unwrap_err().is_configuration_error());
    }

    #[test]
    fn test_credit_days_and_financed_days() {
        let (config, catalog) = seeded();
        let chain = build_chain(&config, &catalog).unwrap();
        let funder = chain.stage(ChainRole::Funder).unwrap();
        assert_eq!(funder.settlement_days, 0);
        assert_eq!(funder.collection_days, 180);
        assert_eq!(funder.financed_days(), 180);

        let platform = chain.stage(ChainRole::Platform).unwrap();
        assert_eq!(platform.settlement_days, 180);
        assert_eq!(platform.collection_days, 45);
        assert_eq!(platform.financed_days(), 0);

        let retailer = chain.stage(ChainRole::Retailer).unwrap();
        assert_eq!(retailer.settlement_days, 45);
        assert_eq!(retailer.financed_days(), 0);
    }

    #[test]
    fn test_back_to_back_intermediary_passes_retailer_terms_through() {
        let (mut config, catalog) = seeded();
        config.has_intermediary = true;
        config.intermediary.payment_term_days = 0;
        let chain = build_chain(&config, &catalog).unwrap();
        let platform = chain.stage(ChainRole::Platform).unwrap();
        let trader = chain.stage(ChainRole::Intermediary).unwrap();
        assert_eq!(platform.collection_days, 45);
        assert_eq!(trader.financed_days(), 0);

        config.intermediary.payment_term_days = 30;
        let chain = build_chain(&config, &catalog).unwrap();
        let trader = chain.stage(ChainRole::Intermediary).unwrap();
        assert_eq!(trader.settlement_days, 15);
        assert_eq!(trader.financed_days(), 30);
    }

    fn link(from: ChainRole, to: ChainRole, markup_pct: Decimal, days: u32) -> TransactionLinkConfig {
        TransactionLinkConfig {
            id: format!("{from}-{to}"),
            name: format!("{from} to {to}"),
            from,
            to,
            markup_pct,
            payment_term_days: days,
            description: None,
            enabled: true,
        }
    }

    #[test]
    fn test_enabled_link_overrides_scalar_fields() {
        let (mut config, catalog) = seeded();
        config
            .transaction_links
            .push(link(ChainRole::Manufacturer, ChainRole::Funder, dec!(8), 90));
        let chain = build_chain(&config, &catalog).unwrap();
        let funder = chain.stage(ChainRole::Funder).unwrap();
        assert_eq!(funder.markup_pct, dec!(8));
        assert_eq!(funder.settlement_days, 0);
        assert_eq!(funder.collection_days, 90);
        assert_eq!(chain.stage(ChainRole::Platform).unwrap().settlement_days, 90);
    }

    #[test]
    fn test_links_mirroring_scalars_build_the_same_chain() {
        let (config, catalog) = seeded();
        let mut linked = config.clone();
        linked.transaction_links = vec![
            link(ChainRole::Manufacturer, ChainRole::Funder, config.funder.markup_pct, 180),
            link(ChainRole::Funder, ChainRole::Platform, config.platform.markup_pct, 0),
            link(ChainRole::Platform, ChainRole::Retailer, config.retailer.markup_pct, 45),
        ];
        let plain = build_chain(&config, &catalog).unwrap();
        let with_links = build_chain(&linked, &catalog).unwrap();
        assert_eq!(plain, with_links);
    }

    #[test]
    fn test_disabled_and_non_adjacent_links() {
        let (mut config, catalog) = seeded();
        config.transaction_links.push(TransactionLinkConfig {
            id: "off".into(),
            name: "disabled".into(),
            from: ChainRole::Platform,
            to: ChainRole::Retailer,
            markup_pct: dec!(50),
            payment_term_days: 1,
            description: None,
            enabled: false,
        });
        config.transaction_links.push(TransactionLinkConfig {
            id: "skip".into(),
            name: "funder to retailer".into(),
            from: ChainRole::Funder,
            to: ChainRole::Retailer,
            markup_pct: dec!(50),
            payment_term_days: 1,
            description: None,
            enabled: true,
        });
        let chain = build_chain(&config, &catalog).unwrap();
        let retailer = chain.stage(ChainRole::Retailer).unwrap();
        assert_eq!(retailer.markup_pct, dec!(20));
        assert_eq!(retailer.settlement_days, 45);
        assert!(retailer
            .warnings
            .iter()
            .any(|w| w.starts_with("IGNORED_LINK")));
    }

    #[test]
    fn test_rate_gap_degrades_to_zero_with_warning() {
        let (mut config, catalog) = seeded();
        config.platform.vat_refund_pct = None;
        config.platform.income_tax_refund_pct = None;
        let chain = build_chain(&config, &catalog).unwrap();
        let platform = chain.stage(ChainRole::Platform).unwrap();
        assert_eq!(platform.vat_refund_pct, Decimal::ZERO);
        assert_eq!(
            platform
                .warnings
                .iter()
                .filter(|w| w.starts_with("RATE_GAP"))
                .count(),
            2
        );
    }

    #[test]
    fn test_regional_defaults_fill_unset_rates() {
        let (mut config, catalog) = seeded();
        config.retailer.vat_surcharge_pct = None;
        config.retailer.income_tax_pct = None;
        let chain = build_chain(&config, &catalog).unwrap();
        let retailer = chain.stage(ChainRole::Retailer).unwrap();
        assert_eq!(retailer.vat_surcharge_pct, dec!(12));
        assert_eq!(retailer.income_tax_pct, dec!(25));
        assert!(retailer.warnings.is_empty());
    }

    #[test]
    fn test_mainland_refund_override_is_ignored() {
        let (mut config, catalog) = seeded();
        config.retailer.vat_refund_pct = Some(dec!(30));
        let chain = build_chain(&config, &catalog).unwrap();
        let retailer = chain.stage(ChainRole::Retailer).unwrap();
        assert_eq!(retailer.vat_refund_pct, Decimal::ZERO);
        assert_eq!(retailer.warnings.len(), 1);
    }

    #[test]
    fn test_consignment_marks_consignor_and_service_identity() {
        let (mut config, catalog) = seeded();
        config.retailer_trade_mode = TradeMode::Consignment;
        let chain = build_chain(&config, &catalog).unwrap();
        assert_eq!(chain.consignor().unwrap().role, ChainRole::Platform);
        let retailer = chain.stage(ChainRole::Retailer).unwrap();
        assert_eq!(retailer.tax_identity, TaxIdentity::service());
        assert_eq!(retailer.trade_mode, Some(TradeMode::Consignment));

        config.has_intermediary = true;
        let chain = build_chain(&config, &catalog).unwrap();
        assert_eq!(chain.consignor().unwrap().role, ChainRole::Platform);
        let trader = chain.stage(ChainRole::Intermediary).unwrap();
        assert!(trader.commission_agent);
        assert_eq!(trader.tax_identity, TaxIdentity::service());
        assert!(!chain.stage(ChainRole::Platform).unwrap().commission_agent);
    }

    #[test]
    fn test_negative_manufacturer_rate_rejected() {
        let (config, mut catalog) = seeded();
        catalog.manufacturers[0].tax_identity = TaxIdentity::General { rate: dec!(-1) };
        let err = build_chain(&config, &catalog).unwrap_err();
        assert!(matches!(err, ChainTaxError::InvalidInput { ref field, .. } if field == "manufacturer:m1"));
    }

    #[test]
    fn test_platform_defaults_from_global_settings() {
        let (config, catalog) = seeded();
        let chain = build_chain(&config, &catalog).unwrap();
        let platform = chain.stage(ChainRole::Platform).unwrap();
        assert_eq!(platform.operational_cost_pct, dec!(2.0));
        assert_eq!(platform.annual_interest_pct, dec!(4.35));
        assert_eq!(platform.name, "Cangjing Shanshui");
    }
}
