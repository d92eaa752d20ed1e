//! VAT, surcharge, income tax and regional refund assessment per stage.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::builder::StageDescriptor;
use super::cascade::PricedStage;
use crate::types::{pct, Money};

/// VAT position of one stage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VatPosition {
    pub input: Money,
    pub output: Money,
    pub payable: Money,
    pub surcharges: Money,
}

/// Output VAT less creditable input, floored at zero. Non-general stages
/// carry no creditable input, so they pay the full output tax.
pub fn assess_vat(stage: &PricedStage) -> VatPosition {
    let output = stage.output_vat();
    let input = stage.input_vat;
    let payable = (output - input).max(Decimal::ZERO);
    VatPosition {
        input,
        output,
        payable,
        surcharges: payable * pct(stage.descriptor.vat_surcharge_pct),
    }
}

/// Income tax and refund figures of one stage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IncomeTaxAssessment {
    pub profit_before_tax: Money,
    pub income_tax: Money,
    pub vat_refund: Money,
    pub income_tax_refund: Money,
}

impl IncomeTaxAssessment {
    pub fn total_refunds(&self) -> Money {
        self.vat_refund + self.income_tax_refund
    }
}

/// Income tax on positive pre-tax profit, then refunds for eligible regions.
///
/// `costs` is the sum of operational and finance cost; surcharges are
/// deductible before income tax.
pub fn assess_income_tax(
    stage: &StageDescriptor,
    gross_profit: Money,
    costs: Money,
    vat: &VatPosition,
) -> IncomeTaxAssessment {
    let profit_before_tax = gross_profit - costs - vat.surcharges;
    let income_tax = profit_before_tax.max(Decimal::ZERO) * pct(stage.income_tax_pct);

    let (vat_refund, income_tax_refund) = if stage.region.refund_eligible() {
        (
            vat.payable * pct(stage.vat_refund_pct),
            income_tax * pct(stage.income_tax_refund_pct),
        )
    } else {
        (Decimal::ZERO, Decimal::ZERO)
    };

    IncomeTaxAssessment {
        profit_before_tax,
        income_tax,
        vat_refund,
        income_tax_refund,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::chain::builder::build_chain;
    use crate::chain::cascade::resolve_prices;
    use crate::config::CalculationConfig;
    use crate::tax::{Region, TaxIdentity};
    use rust_decimal_macros::dec;

    fn stages(config: &CalculationConfig) -> Vec<PricedStage> {
        resolve_prices(&build_chain(config, &Catalog::sample()).unwrap())
    }

    fn seeded() -> CalculationConfig {
        CalculationConfig::seeded(&Catalog::sample(), "f1", "r1").unwrap()
    }

    #[test]
    fn test_general_manufacturer_pays_nothing() {
        let vat = assess_vat(&stages(&seeded())[0]);
        assert_eq!(vat.payable, Decimal::ZERO);
        assert_eq!(vat.input, vat.output);
    }

    #[test]
    fn test_platform_credits_funder_output_tax() {
        let s = stages(&seeded());
        let funder = assess_vat(&s[1]);
        let platform = assess_vat(&s[2]);
        assert_eq!(platform.input, funder.output);
        assert!(platform.payable > Decimal::ZERO);
        assert_eq!(platform.surcharges, platform.payable * dec!(0.01));
    }

    #[test]
    fn test_small_scale_pays_full_output() {
        let mut config = seeded();
        config.platform.tax_identity = TaxIdentity::small_scale();
        let vat = assess_vat(&stages(&config)[2]);
        assert_eq!(vat.input, Decimal::ZERO);
        assert_eq!(vat.payable, vat.output);
    }

    #[test]
    fn test_payable_never_negative() {
        let mut config = seeded();
        config.platform.markup_pct = dec!(-50);
        let vat = assess_vat(&stages(&config)[2]);
        assert_eq!(vat.payable, Decimal::ZERO);
    }

    #[test]
    fn test_income_tax_only_on_positive_profit() {
        let s = stages(&seeded());
        let vat = assess_vat(&s[2]);
        let loss = assess_income_tax(&s[2].descriptor, dec!(10), dec!(50), &vat);
        assert_eq!(loss.income_tax, Decimal::ZERO);
        assert!(loss.profit_before_tax < Decimal::ZERO);
    }

    #[test]
    fn test_refunds_only_in_eligible_regions() {
        let mut config = seeded();
        config.platform.vat_refund_pct = Some(dec!(50));
        config.platform.income_tax_refund_pct = Some(dec!(40));
        let s = stages(&config);
        let vat = assess_vat(&s[2]);
        let tax = assess_income_tax(&s[2].descriptor, dec!(100), Decimal::ZERO, &vat);
        assert_eq!(tax.vat_refund, vat.payable * dec!(0.5));
        assert_eq!(tax.income_tax_refund, tax.income_tax * dec!(0.4));

        let mut mainland = s[2].descriptor.clone();
        mainland.region = Region::Mainland;
        let tax = assess_income_tax(&mainland, dec!(100), Decimal::ZERO, &vat);
        assert_eq!(tax.total_refunds(), Decimal::ZERO);
    }
}
