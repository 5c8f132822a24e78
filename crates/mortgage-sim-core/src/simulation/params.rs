use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::MortgageSimError;
use crate::simulation::insurance::InsuranceFactorTable;
use crate::types::{Money, Months, Rate};
use crate::MortgageSimResult;

/// The two statutory amortization systems.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AmortizationRegime {
    /// Constant amortization (SAC): fixed principal, declining installment.
    Sac,
    /// French / annuity (PRICE): fixed installment.
    Price,
}

impl AmortizationRegime {
    /// Free-text selector: anything mentioning SAC is graduated, the rest is
    /// level-installment.
    pub fn from_selector(selector: &str) -> Self {
        if selector.to_uppercase().contains("SAC") {
            AmortizationRegime::Sac
        } else {
            AmortizationRegime::Price
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AmortizationRegime::Sac => "SAC",
            AmortizationRegime::Price => "PRICE",
        }
    }

    /// Display label, including the TR index marker.
    pub fn label(&self) -> String {
        format!("{} TR", self.code())
    }
}

/// Ceilings that depend on the amortization system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegimeParameters {
    /// Maximum loan-to-value ratio.
    pub ltv_ratio: Rate,
    /// Maximum share of monthly income committed to the installment.
    pub income_ratio: Rate,
    /// Longest amortization term allowed, in months.
    pub max_term_months: Months,
}

/// Every tunable constant of the engine.
///
/// `Default` carries the lender's published figures; callers can override any
/// of them by passing a `parameters` object alongside the request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineParameters {
    pub nominal_annual_rate: Rate,
    /// Monthly life/disability premium rate over the outstanding balance.
    pub life_base_rate: Rate,
    /// Monthly property-damage premium rate over the property value.
    pub property_base_rate: Rate,
    pub operational_fee: Money,
    pub sac: RegimeParameters,
    pub price: RegimeParameters,
    pub min_term_months: Months,
    /// Age in months that the loan may not outlast.
    pub max_age_at_maturity_months: Months,
    pub min_age_years: Decimal,
    pub default_construction_months: Months,
    pub max_solver_iterations: u32,
    pub solver_tolerance: Money,
    /// Initial guess is the income ceiling times this multiplier, capped by LTV.
    pub solver_seed_multiplier: Decimal,
    pub min_financed_amount: Money,
    pub insurance_factors: InsuranceFactorTable,
}

impl Default for EngineParameters {
    fn default() -> Self {
        Self {
            nominal_annual_rate: dec!(0.109259),
            life_base_rate: dec!(0.000116),
            property_base_rate: dec!(0.000066),
            operational_fee: dec!(25),
            sac: RegimeParameters {
                ltv_ratio: dec!(0.90),
                income_ratio: dec!(0.30),
                max_term_months: 420,
            },
            price: RegimeParameters {
                ltv_ratio: dec!(0.80),
                income_ratio: dec!(0.25),
                max_term_months: 360,
            },
            min_term_months: 120,
            max_age_at_maturity_months: 966,
            min_age_years: dec!(18),
            default_construction_months: 36,
            max_solver_iterations: 50,
            solver_tolerance: dec!(0.01),
            solver_seed_multiplier: dec!(100),
            min_financed_amount: dec!(10_000),
            insurance_factors: InsuranceFactorTable::default(),
        }
    }
}

impl EngineParameters {
    pub fn regime(&self, regime: AmortizationRegime) -> &RegimeParameters {
        match regime {
            AmortizationRegime::Sac => &self.sac,
            AmortizationRegime::Price => &self.price,
        }
    }

    pub fn monthly_rate(&self) -> Rate {
        self.nominal_annual_rate / dec!(12)
    }

    pub fn validate(&self) -> MortgageSimResult<()> {
        if self.nominal_annual_rate < Decimal::ZERO {
            return Err(MortgageSimError::validation(
                "parameters.nominal_annual_rate",
                "Interest rate cannot be negative",
            ));
        }
        if self.life_base_rate < Decimal::ZERO || self.property_base_rate < Decimal::ZERO {
            return Err(MortgageSimError::validation(
                "parameters.insurance",
                "Premium rates cannot be negative",
            ));
        }
        if self.operational_fee < Decimal::ZERO {
            return Err(MortgageSimError::validation(
                "parameters.operational_fee",
                "Operational fee cannot be negative",
            ));
        }
        for (name, rp) in [("sac", &self.sac), ("price", &self.price)] {
            if rp.ltv_ratio <= Decimal::ZERO || rp.ltv_ratio > Decimal::ONE {
                return Err(MortgageSimError::validation(
                    format!("parameters.{name}.ltv_ratio"),
                    "LTV ratio must be in (0, 1]",
                ));
            }
            if rp.income_ratio <= Decimal::ZERO || rp.income_ratio > Decimal::ONE {
                return Err(MortgageSimError::validation(
                    format!("parameters.{name}.income_ratio"),
                    "Income ratio must be in (0, 1]",
                ));
            }
            if rp.max_term_months < self.min_term_months {
                return Err(MortgageSimError::validation(
                    format!("parameters.{name}.max_term_months"),
                    "Base term cannot be shorter than the minimum term",
                ));
            }
        }
        if self.min_term_months == 0 {
            return Err(MortgageSimError::validation(
                "parameters.min_term_months",
                "Minimum term must be greater than zero",
            ));
        }
        if self.max_solver_iterations == 0 {
            return Err(MortgageSimError::validation(
                "parameters.max_solver_iterations",
                "Solver needs at least one round",
            ));
        }
        self.insurance_factors.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regime_from_selector() {
        assert_eq!(AmortizationRegime::from_selector("SAC TR"), AmortizationRegime::Sac);
        assert_eq!(AmortizationRegime::from_selector("sac"), AmortizationRegime::Sac);
        assert_eq!(AmortizationRegime::from_selector("PRICE TR"), AmortizationRegime::Price);
        assert_eq!(AmortizationRegime::from_selector("anything"), AmortizationRegime::Price);
    }

    #[test]
    fn test_defaults_are_valid() {
        let params = EngineParameters::default();
        params.validate().unwrap();
        assert_eq!(params.regime(AmortizationRegime::Sac).max_term_months, 420);
        assert_eq!(params.regime(AmortizationRegime::Price).max_term_months, 360);
    }

    #[test]
    fn test_partial_override_keeps_defaults() {
        let params: EngineParameters =
            serde_json::from_str(r#"{ "operational_fee": "0", "min_financed_amount": 5000 }"#).unwrap();
        assert_eq!(params.operational_fee, Decimal::ZERO);
        assert_eq!(params.min_financed_amount, dec!(5000));
        assert_eq!(params.nominal_annual_rate, dec!(0.109259));
    }

    #[test]
    fn test_rejects_ltv_above_one() {
        let mut params = EngineParameters::default();
        params.price.ltv_ratio = dec!(1.2);
        assert!(params.validate().is_err());
    }
}
