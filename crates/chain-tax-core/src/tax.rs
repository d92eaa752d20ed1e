//! Tax identities, regions and the regional incentive policy table.
//!
//! A taxpayer class carries its own output VAT rate explicitly, so a rate
//! change or an additional identity never requires redefining the variant.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::types::{Money, Percent, Rate};

// ---------------------------------------------------------------------------
// Statutory rates
// ---------------------------------------------------------------------------

/// Standard VAT rate for general taxpayers selling goods.
pub const GENERAL_VAT_RATE: Rate = dec!(0.13);
/// Collection rate for small-scale taxpayers.
pub const SMALL_SCALE_VAT_RATE: Rate = dec!(0.01);
/// Modern services rate, used for consignment commissions.
pub const SERVICE_VAT_RATE: Rate = dec!(0.06);

// ---------------------------------------------------------------------------
// Tax identity
// ---------------------------------------------------------------------------

/// VAT taxpayer class of a chain participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "class", rename_all = "snake_case")]
pub enum TaxIdentity {
    /// May deduct input VAT against output VAT.
    General { rate: Rate },
    /// Flat collection rate on gross sales, no input deduction.
    SmallScale { rate: Rate },
    /// Service provider billing at the services rate, no input deduction.
    Service { rate: Rate },
}

impl Default for TaxIdentity {
    fn default() -> Self {
        TaxIdentity::general()
    }
}

impl TaxIdentity {
    pub fn general() -> Self {
        TaxIdentity::General {
            rate: GENERAL_VAT_RATE,
        }
    }

    pub fn small_scale() -> Self {
        TaxIdentity::SmallScale {
            rate: SMALL_SCALE_VAT_RATE,
        }
    }

    pub fn service() -> Self {
        TaxIdentity::Service {
            rate: SERVICE_VAT_RATE,
        }
    }

    /// Rate this entity applies to its own sales invoices.
    pub fn output_rate(&self) -> Rate {
        match *self {
            TaxIdentity::General { rate }
            | TaxIdentity::SmallScale { rate }
            | TaxIdentity::Service { rate } => rate,
        }
    }

    /// Only general taxpayers may offset input VAT, whatever the seller issued.
    pub fn deducts_input(&self) -> bool {
        matches!(self, TaxIdentity::General { .. })
    }

    pub fn is_general(&self) -> bool {
        self.deducts_input()
    }

    pub fn label(&self) -> String {
        let pct = (self.output_rate() * dec!(100)).normalize();
        match self {
            TaxIdentity::General { .. } => format!("general taxpayer ({pct}%)"),
            TaxIdentity::SmallScale { .. } => format!("small-scale taxpayer ({pct}%)"),
            TaxIdentity::Service { .. } => format!("service provider ({pct}%)"),
        }
    }

    /// Invoice type this identity issues downstream.
    pub fn invoice_label(&self) -> String {
        let pct = (self.output_rate() * dec!(100)).normalize();
        match self {
            TaxIdentity::General { .. } => format!("{pct}% special VAT invoice"),
            TaxIdentity::SmallScale { .. } => format!("{pct}% ordinary/special invoice"),
            TaxIdentity::Service { .. } => format!("{pct}% service invoice"),
        }
    }
}

// ---------------------------------------------------------------------------
// Region
// ---------------------------------------------------------------------------

/// Registration region of an entity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Region {
    Tibet,
    #[default]
    Mainland,
}

impl Region {
    /// Whether the region grants fiscal refunds of VAT and income tax paid.
    pub fn refund_eligible(&self) -> bool {
        matches!(self, Region::Tibet)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Region::Tibet => "Tibet entity",
            Region::Mainland => "mainland entity",
        }
    }
}

/// Trade structure between the retailer and its upstream seller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeMode {
    /// Retailer buys the goods and resells them with a markup.
    #[default]
    #[serde(alias = "sales")]
    Resale,
    /// Retailer sells on behalf of the upstream owner for a commission.
    Consignment,
}

impl TradeMode {
    pub fn label(&self) -> &'static str {
        match self {
            TradeMode::Resale => "resale",
            TradeMode::Consignment => "consignment",
        }
    }
}

// ---------------------------------------------------------------------------
// Regional policy defaults
// ---------------------------------------------------------------------------

/// Default levy, income tax and refund percentages for one region.
///
/// `None` means the policy table carries no value for that rate; stages that
/// do not override it end up with a zero rate and a rate-gap warning.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegionPolicy {
    #[serde(default)]
    pub vat_surcharge_pct: Option<Percent>,
    #[serde(default)]
    pub income_tax_pct: Option<Percent>,
    #[serde(default)]
    pub vat_refund_pct: Option<Percent>,
    #[serde(default)]
    pub income_tax_refund_pct: Option<Percent>,
}

impl RegionPolicy {
    /// Urban maintenance + education levies at 12%, 25% enterprise income tax.
    pub fn mainland_default() -> Self {
        RegionPolicy {
            vat_surcharge_pct: Some(dec!(12)),
            income_tax_pct: Some(dec!(25)),
            vat_refund_pct: None,
            income_tax_refund_pct: None,
        }
    }

    /// Preferential local levy and the 15% western-development income tax.
    /// Refund percentages are negotiated per park and left unset.
    pub fn tibet_default() -> Self {
        RegionPolicy {
            vat_surcharge_pct: Some(dec!(1)),
            income_tax_pct: Some(dec!(15)),
            vat_refund_pct: None,
            income_tax_refund_pct: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Price helpers
// ---------------------------------------------------------------------------

/// Strip VAT at `rate` from a tax-inclusive amount.
pub fn exclusive_of_tax(inclusive: Money, rate: Rate) -> Money {
    inclusive / (Decimal::ONE + rate)
}

/// Add VAT at `rate` to a tax-exclusive amount.
pub fn inclusive_of_tax(exclusive: Money, rate: Rate) -> Money {
    exclusive * (Decimal::ONE + rate)
}
