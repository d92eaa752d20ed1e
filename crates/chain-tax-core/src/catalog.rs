//! Immutable catalog snapshot: manufacturers with their products, funders
//! and retailers. A run receives a reference to one snapshot captured at run
//! start and never observes later catalog edits.

use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::ChainTaxError;
use crate::tax::TaxIdentity;
use crate::types::{Money, Percent};
use crate::ChainTaxResult;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    /// Tax-inclusive price the first buyer pays the manufacturer.
    pub base_price: Money,
    /// Manufacturer-suggested retail price, tax inclusive.
    pub msrp: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manufacturer {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub tax_identity: TaxIdentity,
    #[serde(default)]
    pub products: Vec<Product>,
}

impl Manufacturer {
    pub fn product(&self, product_id: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.id == product_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Funder {
    pub id: String,
    pub name: String,
    pub default_markup_pct: Percent,
    pub default_payment_term_months: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Retailer {
    pub id: String,
    pub name: String,
    pub default_markup_pct: Percent,
    pub default_payment_term_days: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub manufacturers: Vec<Manufacturer>,
    #[serde(default)]
    pub funders: Vec<Funder>,
    #[serde(default)]
    pub retailers: Vec<Retailer>,
}

impl Catalog {
    pub fn manufacturer(&self, id: &str) -> ChainTaxResult<&Manufacturer> {
        self.manufacturers
            .iter()
            .find(|m| m.id == id)
            .ok_or_else(|| ChainTaxError::unresolved("manufacturer", id))
    }

    /// Resolve a product through its owning manufacturer.
    pub fn product(
        &self,
        manufacturer_id: &str,
        product_id: &str,
    ) -> ChainTaxResult<(&Manufacturer, &Product)> {
        let manufacturer = self.manufacturer(manufacturer_id)?;
        let product = manufacturer.product(product_id).ok_or_else(|| {
            ChainTaxError::unresolved("product", &format!("{manufacturer_id}/{product_id}"))
        })?;
        Ok((manufacturer, product))
    }

    pub fn funder(&self, id: &str) -> ChainTaxResult<&Funder> {
        self.funders
            .iter()
            .find(|f| f.id == id)
            .ok_or_else(|| ChainTaxError::unresolved("funder", id))
    }

    pub fn retailer(&self, id: &str) -> ChainTaxResult<&Retailer> {
        self.retailers
            .iter()
            .find(|r| r.id == id)
            .ok_or_else(|| ChainTaxError::unresolved("retailer", id))
    }

    /// Reference catalog of Tibetan specialty goods used for seeding demos.
    pub fn sample() -> Self {
        Catalog {
            manufacturers: vec![
                Manufacturer {
                    id: "m1".into(),
                    name: "Lhasa Specialty Works".into(),
                    tax_identity: TaxIdentity::general(),
                    products: vec![
                        Product {
                            id: "p1-1".into(),
                            name: "Premium cordyceps (5g)".into(),
                            base_price: dec!(800),
                            msrp: dec!(1388),
                        },
                        Product {
                            id: "p1-2".into(),
                            name: "Saffron gift box".into(),
                            base_price: dec!(200),
                            msrp: dec!(398),
                        },
                    ],
                },
                Manufacturer {
                    id: "m2".into(),
                    name: "Nyingchi Matsutake Cooperative".into(),
                    tax_identity: TaxIdentity::small_scale(),
                    products: vec![
                        Product {
                            id: "p2-1".into(),
                            name: "Dried matsutake (250g)".into(),
                            base_price: dec!(150),
                            msrp: dec!(298),
                        },
                        Product {
                            id: "p2-2".into(),
                            name: "Wild lingzhi".into(),
                            base_price: dec!(300),
                            msrp: dec!(588),
                        },
                    ],
                },
            ],
            funders: vec![
                Funder {
                    id: "f1".into(),
                    name: "Chenming Supply Chain".into(),
                    default_markup_pct: dec!(3),
                    default_payment_term_months: 6,
                },
                Funder {
                    id: "f2".into(),
                    name: "Short-term Funder".into(),
                    default_markup_pct: dec!(2),
                    default_payment_term_months: 3,
                },
            ],
            retailers: vec![
                Retailer {
                    id: "r1".into(),
                    name: "Deshang Supermarkets".into(),
                    default_markup_pct: dec!(20),
                    default_payment_term_days: 45,
                },
                Retailer {
                    id: "r2".into(),
                    name: "Livestream E-commerce".into(),
                    default_markup_pct: dec!(35),
                    default_payment_term_days: 15,
                },
            ],
        }
    }
}
