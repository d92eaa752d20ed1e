//! What-if tools over the engine: structure comparison and parameter sweeps.

pub mod comparison;
pub mod sensitivity;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::chain::{EntityResult, SimulationResult};
use crate::config::ChainRole;
use crate::error::ChainTaxError;
use crate::types::Money;
use crate::ChainTaxResult;

pub use comparison::{compare_structures, ComparisonInput, ComparisonOutput, StructureVariant, VariantOverrides};
pub use sensitivity::{run_sensitivity, ChainParameter, SensitivityInput, SensitivityOutput, SweepVariable};

/// Per-entity figures a scenario can read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityField {
    NetProfit,
    GrossProfit,
    VatPayable,
    Surcharges,
    IncomeTax,
    TaxRefunds,
    FinanceCost,
    OperationalCost,
    CashOutflow,
    TaxBurdenRate,
    OutPriceInclTax,
}

/// Chain-wide figures a scenario can read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainField {
    TotalNetProfit,
    TotalVatPayable,
    TotalIncomeTax,
    TotalTaxRefunds,
    TotalFinanceCost,
    NetTaxTake,
    EndCustomerRevenue,
}

const ENTITY_FIELDS: [(&str, EntityField); 11] = [
    ("net_profit", EntityField::NetProfit),
    ("gross_profit", EntityField::GrossProfit),
    ("vat_payable", EntityField::VatPayable),
    ("surcharges", EntityField::Surcharges),
    ("income_tax", EntityField::IncomeTax),
    ("tax_refunds", EntityField::TaxRefunds),
    ("finance_cost", EntityField::FinanceCost),
    ("operational_cost", EntityField::OperationalCost),
    ("cash_outflow", EntityField::CashOutflow),
    ("tax_burden_rate", EntityField::TaxBurdenRate),
    ("out_price_incl_tax", EntityField::OutPriceInclTax),
];

const CHAIN_FIELDS: [(&str, ChainField); 7] = [
    ("total_net_profit", ChainField::TotalNetProfit),
    ("total_vat_payable", ChainField::TotalVatPayable),
    ("total_income_tax", ChainField::TotalIncomeTax),
    ("total_tax_refunds", ChainField::TotalTaxRefunds),
    ("total_finance_cost", ChainField::TotalFinanceCost),
    ("net_tax_take", ChainField::NetTaxTake),
    ("end_customer_revenue", ChainField::EndCustomerRevenue),
];

/// A figure read from a simulation result, written `platform.net_profit` or
/// `chain.net_tax_take`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ChainMetric {
    Entity { role: ChainRole, field: EntityField },
    Chain(ChainField),
}

impl Default for ChainMetric {
    fn default() -> Self {
        ChainMetric::Entity {
            role: ChainRole::Platform,
            field: EntityField::NetProfit,
        }
    }
}

impl ChainMetric {
    pub fn extract(&self, result: &SimulationResult) -> ChainTaxResult<Money> {
        match *self {
            ChainMetric::Entity { role, field } => {
                let entity = result.entity(role).ok_or_else(|| {
                    ChainTaxError::InsufficientData(format!("no {role} in this chain"))
                })?;
                Ok(entity_value(entity, field))
            }
            ChainMetric::Chain(field) => {
                let t = &result.totals;
                Ok(match field {
                    ChainField::TotalNetProfit => t.total_net_profit,
                    ChainField::TotalVatPayable => t.total_vat_payable,
                    ChainField::TotalIncomeTax => t.total_income_tax,
                    ChainField::TotalTaxRefunds => t.total_tax_refunds,
                    ChainField::TotalFinanceCost => t.total_finance_cost,
                    ChainField::NetTaxTake => t.net_tax_take(),
                    ChainField::EndCustomerRevenue => t.end_customer_revenue,
                })
            }
        }
    }
}

fn entity_value(e: &EntityResult, field: EntityField) -> Money {
    match field {
        EntityField::NetProfit => e.net_profit,
        EntityField::GrossProfit => e.gross_profit,
        EntityField::VatPayable => e.vat_payable,
        EntityField::Surcharges => e.surcharges,
        EntityField::IncomeTax => e.income_tax,
        EntityField::TaxRefunds => e.tax_refunds,
        EntityField::FinanceCost => e.finance_cost,
        EntityField::OperationalCost => e.operational_cost,
        EntityField::CashOutflow => e.cash_outflow,
        EntityField::TaxBurdenRate => e.tax_burden_rate,
        EntityField::OutPriceInclTax => e.out_price_incl_tax,
    }
}

impl fmt::Display for ChainMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChainMetric::Entity { role, field } => {
                let name = ENTITY_FIELDS
                    .iter()
                    .find(|(_, v)| v == field)
                    .map(|(k, _)| *k)
                    .unwrap_or("?");
                write!(f, "{role}.{name}")
            }
            ChainMetric::Chain(field) => {
                let name = CHAIN_FIELDS
                    .iter()
                    .find(|(_, v)| v == field)
                    .map(|(k, _)| *k)
                    .unwrap_or("?");
                write!(f, "chain.{name}")
            }
        }
    }
}

impl FromStr for ChainMetric {
    type Err = ChainTaxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ChainTaxError::InvalidInput {
            field: "metric".into(),
            reason: format!("unknown metric '{s}'; expected <role>.<field> or chain.<field>"),
        };
        let (scope, name) = s.split_once('.').ok_or_else(invalid)?;
        if scope == "chain" {
            return CHAIN_FIELDS
                .iter()
                .find(|(k, _)| *k == name)
                .map(|(_, v)| ChainMetric::Chain(*v))
                .ok_or_else(invalid);
        }
        let role: ChainRole = scope.parse().map_err(|_| invalid())?;
        ENTITY_FIELDS
            .iter()
            .find(|(k, _)| *k == name)
            .map(|(_, field)| ChainMetric::Entity { role, field: *field })
            .ok_or_else(invalid)
    }
}

impl TryFrom<String> for ChainMetric {
    type Error = ChainTaxError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ChainMetric> for String {
    fn from(metric: ChainMetric) -> Self {
        metric.to_string()
    }
}
