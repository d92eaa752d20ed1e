//! Run configuration: the immutable input snapshot for one simulation.
//!
//! The per-stage settings and the transaction links both describe the chain
//! topology. Neither is read by the formulas directly; the chain builder
//! translates them into stage descriptors once per run.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::error::ChainTaxError;
use crate::tax::{Region, RegionPolicy, TaxIdentity, TradeMode};
use crate::types::{Money, Percent};
use crate::ChainTaxResult;

/// Days per month when converting funder terms quoted in months.
pub const DAYS_PER_MONTH: u32 = 30;

// ---------------------------------------------------------------------------
// Roles
// ---------------------------------------------------------------------------

/// Position of a participant in the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChainRole {
    Manufacturer,
    Funder,
    #[serde(alias = "cangjing")]
    Platform,
    #[serde(alias = "trader")]
    Intermediary,
    Retailer,
}

impl ChainRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChainRole::Manufacturer => "manufacturer",
            ChainRole::Funder => "funder",
            ChainRole::Platform => "platform",
            ChainRole::Intermediary => "intermediary",
            ChainRole::Retailer => "retailer",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ChainRole::Manufacturer => "Source manufacturer",
            ChainRole::Funder => "Funder",
            ChainRole::Platform => "Platform",
            ChainRole::Intermediary => "Intermediary trader",
            ChainRole::Retailer => "Retail channel",
        }
    }
}

impl std::fmt::Display for ChainRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ChainRole {
    type Err = ChainTaxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "manufacturer" => Ok(ChainRole::Manufacturer),
            "funder" => Ok(ChainRole::Funder),
            "platform" | "cangjing" => Ok(ChainRole::Platform),
            "intermediary" | "trader" => Ok(ChainRole::Intermediary),
            "retailer" => Ok(ChainRole::Retailer),
            other => Err(ChainTaxError::unresolved("chain role", other)),
        }
    }
}

// ---------------------------------------------------------------------------
// Input types
// ---------------------------------------------------------------------------

/// One line of goods flowing through the chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageItem {
    pub manufacturer_id: String,
    pub product_id: String,
    pub quantity: u32,
}

/// Settings of one chain stage. Unset rates fall back to the regional
/// policy defaults in [`GlobalSettings`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StageSettings {
    /// Display name; funder and retailer names come from the catalog.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub region: Region,
    #[serde(default)]
    pub tax_identity: TaxIdentity,
    #[serde(default)]
    pub markup_pct: Percent,
    /// Funder: credit granted to the platform. Intermediary: float fronted
    /// ahead of its own collection (0 = back-to-back). Retailer: credit the
    /// retailer takes from its seller. Unused for the platform, whose credit
    /// follows from its neighbours.
    #[serde(default)]
    pub payment_term_days: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vat_surcharge_pct: Option<Percent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub income_tax_pct: Option<Percent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vat_refund_pct: Option<Percent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub income_tax_refund_pct: Option<Percent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operational_cost_pct: Option<Percent>,
    /// Warehousing/logistics overhead on tax-exclusive revenue.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logistics_cost_pct: Option<Percent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annual_interest_pct: Option<Percent>,
    /// Net profit below this is flagged; falls back to the global threshold.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_net_profit: Option<Money>,
}

/// Chain-wide financial parameters and tax policy defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalSettings {
    pub funder_interest_pct: Percent,
    pub platform_interest_pct: Percent,
    pub platform_operational_cost_pct: Percent,
    #[serde(default = "RegionPolicy::mainland_default")]
    pub mainland: RegionPolicy,
    #[serde(default = "RegionPolicy::tibet_default")]
    pub tibet: RegionPolicy,
    #[serde(default)]
    pub viability_threshold: Money,
}

impl Default for GlobalSettings {
    fn default() -> Self {
        GlobalSettings {
            funder_interest_pct: dec!(6.0),
            platform_interest_pct: dec!(4.35),
            platform_operational_cost_pct: dec!(2.0),
            mainland: RegionPolicy::mainland_default(),
            tibet: RegionPolicy::tibet_default(),
            viability_threshold: Decimal::ZERO,
        }
    }
}

impl GlobalSettings {
    pub fn policy(&self, region: Region) -> &RegionPolicy {
        match region {
            Region::Tibet => &self.tibet,
            Region::Mainland => &self.mainland,
        }
    }
}

/// Named edge between two adjacent chain roles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionLinkConfig {
    pub id: String,
    pub name: String,
    pub from: ChainRole,
    pub to: ChainRole,
    /// Markup applied by the `to` stage.
    pub markup_pct: Percent,
    /// Payment term of the `to` stage, read exactly like its
    /// `StageSettings::payment_term_days`.
    pub payment_term_days: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

fn enabled_by_default() -> bool {
    true
}

/// Complete input snapshot for one simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationConfig {
    pub package_items: Vec<PackageItem>,
    pub funder_id: String,
    pub retailer_id: String,
    #[serde(default)]
    pub manufacturer_region: Region,
    pub funder: StageSettings,
    pub platform: StageSettings,
    #[serde(default)]
    pub has_intermediary: bool,
    #[serde(default)]
    pub intermediary: StageSettings,
    pub retailer: StageSettings,
    #[serde(default)]
    pub retailer_trade_mode: TradeMode,
    #[serde(default)]
    pub transaction_links: Vec<TransactionLinkConfig>,
    #[serde(default)]
    pub settings: GlobalSettings,
}

/// Catalog snapshot plus configuration, the unit exchanged with callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunDocument {
    pub catalog: Catalog,
    pub config: CalculationConfig,
}

// ---------------------------------------------------------------------------
// Seeding
// ---------------------------------------------------------------------------

impl CalculationConfig {
    /// Build a configuration from catalog defaults: the first product of the
    /// first manufacturer, Tibet-registered funder and platform, mainland
    /// intermediary (inactive) and retailer, resale mode.
    pub fn seeded(
        catalog: &Catalog,
        funder_id: &str,
        retailer_id: &str,
    ) -> ChainTaxResult<Self> {
        let funder = catalog.funder(funder_id)?;
        let retailer = catalog.retailer(retailer_id)?;
        let first = catalog
            .manufacturers
            .iter()
            .find_map(|m| m.products.first().map(|p| (m, p)))
            .ok_or_else(|| {
                ChainTaxError::InsufficientData("catalog has no products to seed a package".into())
            })?;

        let settings = GlobalSettings::default();

        Ok(CalculationConfig {
            package_items: vec![PackageItem {
                manufacturer_id: first.0.id.clone(),
                product_id: first.1.id.clone(),
                quantity: 1,
            }],
            funder_id: funder.id.clone(),
            retailer_id: retailer.id.clone(),
            manufacturer_region: Region::Mainland,
            funder: StageSettings {
                region: Region::Tibet,
                markup_pct: funder.default_markup_pct,
                payment_term_days: funder.default_payment_term_months * DAYS_PER_MONTH,
                vat_surcharge_pct: Some(dec!(1)),
                income_tax_pct: Some(dec!(15)),
                vat_refund_pct: Some(Decimal::ZERO),
                income_tax_refund_pct: Some(Decimal::ZERO),
                logistics_cost_pct: Some(Decimal::ZERO),
                min_net_profit: Some(Decimal::ONE),
                ..StageSettings::default()
            },
            platform: StageSettings {
                name: Some("Cangjing Shanshui".into()),
                region: Region::Tibet,
                markup_pct: dec!(10),
                vat_surcharge_pct: Some(dec!(1)),
                income_tax_pct: Some(dec!(15)),
                vat_refund_pct: Some(Decimal::ZERO),
                income_tax_refund_pct: Some(Decimal::ZERO),
                logistics_cost_pct: Some(Decimal::ZERO),
                ..StageSettings::default()
            },
            has_intermediary: false,
            intermediary: StageSettings {
                name: Some("Intermediary trader".into()),
                region: Region::Mainland,
                markup_pct: dec!(5),
                vat_surcharge_pct: Some(dec!(12)),
                income_tax_pct: Some(dec!(25)),
                ..StageSettings::default()
            },
            retailer: StageSettings {
                region: Region::Mainland,
                markup_pct: retailer.default_markup_pct,
                payment_term_days: retailer.default_payment_term_days,
                vat_surcharge_pct: Some(dec!(12)),
                income_tax_pct: Some(dec!(25)),
                ..StageSettings::default()
            },
            retailer_trade_mode: TradeMode::Resale,
            transaction_links: Vec::new(),
            settings,
        })
    }

    /// Settings for a role; `None` for the manufacturer, whose identity comes
    /// from the catalog.
    pub fn stage(&self, role: ChainRole) -> Option<&StageSettings> {
        match role {
            ChainRole::Manufacturer => None,
            ChainRole::Funder => Some(&self.funder),
            ChainRole::Platform => Some(&self.platform),
            ChainRole::Intermediary => Some(&self.intermediary),
            ChainRole::Retailer => Some(&self.retailer),
        }
    }

    pub fn stage_mut(&mut self, role: ChainRole) -> Option<&mut StageSettings> {
        match role {
            ChainRole::Manufacturer => None,
            ChainRole::Funder => Some(&mut self.funder),
            ChainRole::Platform => Some(&mut self.platform),
            ChainRole::Intermediary => Some(&mut self.intermediary),
            ChainRole::Retailer => Some(&mut self.retailer),
        }
    }

    /// Numeric sanity checks. Missing rates are not errors; they degrade to
    /// zero with a warning later on.
    pub fn validate(&self) -> ChainTaxResult<()> {
        if self.package_items.is_empty() {
            return Err(ChainTaxError::NoPackageItems);
        }

        for role in [
            ChainRole::Funder,
            ChainRole::Platform,
            ChainRole::Intermediary,
            ChainRole::Retailer,
        ] {
            if let Some(stage) = self.stage(role) {
                validate_stage(role, stage)?;
            }
        }

        for link in &self.transaction_links {
            if link.markup_pct <= dec!(-100) {
                return Err(ChainTaxError::InvalidInput {
                    field: format!("transaction_links[{}].markup_pct", link.id),
                    reason: "Markup must be greater than -100%".into(),
                });
            }
        }

        let s = &self.settings;
        for (field, value) in [
            ("settings.funder_interest_pct", s.funder_interest_pct),
            ("settings.platform_interest_pct", s.platform_interest_pct),
            (
                "settings.platform_operational_cost_pct",
                s.platform_operational_cost_pct,
            ),
        ] {
            non_negative(field, value)?;
        }

        Ok(())
    }
}

fn validate_stage(role: ChainRole, stage: &StageSettings) -> ChainTaxResult<()> {
    if stage.markup_pct <= dec!(-100) {
        return Err(ChainTaxError::InvalidInput {
            field: format!("{role}.markup_pct"),
            reason: "Markup must be greater than -100%".into(),
        });
    }
    if stage.tax_identity.output_rate() < Decimal::ZERO {
        return Err(ChainTaxError::InvalidInput {
            field: format!("{role}.tax_identity"),
            reason: "VAT rate cannot be negative".into(),
        });
    }

    let optional = [
        ("vat_surcharge_pct", stage.vat_surcharge_pct),
        ("income_tax_pct", stage.income_tax_pct),
        ("vat_refund_pct", stage.vat_refund_pct),
        ("income_tax_refund_pct", stage.income_tax_refund_pct),
        ("operational_cost_pct", stage.operational_cost_pct),
        ("logistics_cost_pct", stage.logistics_cost_pct),
        ("annual_interest_pct", stage.annual_interest_pct),
    ];
    for (name, value) in optional {
        if let Some(v) = value {
            non_negative(&format!("{role}.{name}"), v)?;
        }
    }
    Ok(())
}

fn non_negative(field: &str, value: Decimal) -> ChainTaxResult<()> {
    if value < Decimal::ZERO {
        return Err(ChainTaxError::InvalidInput {
            field: field.to_string(),
            reason: "Value cannot be negative".into(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_config_uses_catalog_defaults() {
        let catalog = Catalog::sample();
        let cfg = CalculationConfig::seeded(&catalog, "f1", "r2").unwrap();
        assert_eq!(cfg.funder.markup_pct, dec!(3));
        assert_eq!(cfg.funder.payment_term_days, 180);
        assert_eq!(cfg.retailer.markup_pct, dec!(35));
        assert_eq!(cfg.retailer.payment_term_days, 15);
        assert_eq!(cfg.package_items.len(), 1);
        assert_eq!(cfg.package_items[0].product_id, "p1-1");
        assert!(!cfg.has_intermediary);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_seeding_with_unknown_retailer_fails() {
        let catalog = Catalog::sample();
        let err = CalculationConfig::seeded(&catalog, "f1", "missing").unwrap_err();
        assert!(err.is_configuration_error());
    }

    #[test]
    fn test_empty_package_rejected() {
        let catalog = Catalog::sample();
        let mut cfg = CalculationConfig::seeded(&catalog, "f1", "r1").unwrap();
        cfg.package_items.clear();
        assert!(matches!(cfg.validate(), Err(ChainTaxError::NoPackageItems)));
    }

    #[test]
    fn test_markup_at_minus_100_rejected() {
        let catalog = Catalog::sample();
        let mut cfg = CalculationConfig::seeded(&catalog, "f1", "r1").unwrap();
        cfg.platform.markup_pct = dec!(-100);
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("platform.markup_pct"));
    }

    #[test]
    fn test_negative_rate_rejected() {
        let catalog = Catalog::sample();
        let mut cfg = CalculationConfig::seeded(&catalog, "f1", "r1").unwrap();
        cfg.retailer.income_tax_pct = Some(dec!(-1));
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_role_parsing_accepts_legacy_names() {
        assert_eq!("cangjing".parse::<ChainRole>().unwrap(), ChainRole::Platform);
        assert_eq!("trader".parse::<ChainRole>().unwrap(), ChainRole::Intermediary);
        assert!("bank".parse::<ChainRole>().is_err());
    }
}
