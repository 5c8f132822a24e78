//! Recurring insurance premiums: life/disability (balance × age factor) and
//! property damage (flat over the property value).

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::MortgageSimError;
use crate::simulation::params::EngineParameters;
use crate::types::{Money, Rate};
use crate::MortgageSimResult;

/// One step of the age table: ages up to and including `max_age` use `factor`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgeBand {
    pub max_age: u32,
    pub factor: Decimal,
}

/// Step function from whole years of age to a life-premium multiplier.
///
/// Bands are scanned in order for the first `max_age` at or above the query;
/// ages past the last band fall through to `catch_all_factor`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsuranceFactorTable {
    pub bands: Vec<AgeBand>,
    pub catch_all_factor: Decimal,
}

impl Default for InsuranceFactorTable {
    fn default() -> Self {
        let bands = [
            (35, dec!(1.0)),
            (40, dec!(1.2)),
            (45, dec!(1.5)),
            (50, dec!(2.0)),
            (55, dec!(2.5)),
            (60, dec!(3.0)),
            (65, dec!(4.0)),
            (70, dec!(5.0)),
        ]
        .into_iter()
        .map(|(max_age, factor)| AgeBand { max_age, factor })
        .collect();

        Self {
            bands,
            catch_all_factor: dec!(6.0),
        }
    }
}

impl InsuranceFactorTable {
    pub fn validate(&self) -> MortgageSimResult<()> {
        let mut previous: Option<&AgeBand> = None;
        for band in &self.bands {
            if band.factor <= Decimal::ZERO {
                return Err(MortgageSimError::validation(
                    "parameters.insurance_factors",
                    format!("factor for ages up to {} must be positive", band.max_age),
                ));
            }
            if let Some(prev) = previous {
                if band.max_age <= prev.max_age {
                    return Err(MortgageSimError::validation(
                        "parameters.insurance_factors",
                        "age ceilings must be strictly ascending",
                    ));
                }
                if band.factor < prev.factor {
                    return Err(MortgageSimError::validation(
                        "parameters.insurance_factors",
                        "factors must not decrease with age",
                    ));
                }
            }
            previous = Some(band);
        }
        if let Some(last) = previous {
            if self.catch_all_factor < last.factor {
                return Err(MortgageSimError::validation(
                    "parameters.insurance_factors",
                    "catch-all factor must not be below the last band",
                ));
            }
        }
        Ok(())
    }

    /// Multiplier for a fractional age; only whole years count.
    pub fn factor_for(&self, age_years: Decimal) -> Decimal {
        let whole = age_years.floor().to_u32().unwrap_or(0);
        self.bands
            .iter()
            .find(|band| band.max_age >= whole)
            .map(|band| band.factor)
            .unwrap_or(self.catch_all_factor)
    }
}

/// Both monthly premiums for one balance estimate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InsurancePremiums {
    pub life: Money,
    pub property: Money,
    pub age_factor: Decimal,
}

impl InsurancePremiums {
    pub fn total(&self) -> Money {
        self.life + self.property
    }
}

pub fn life_premium(balance: Money, age_years: Decimal, base_rate: Rate, table: &InsuranceFactorTable) -> Money {
    balance * base_rate * table.factor_for(age_years)
}

pub fn property_premium(property_value: Money, base_rate: Rate) -> Money {
    property_value * base_rate
}

/// Premiums for `balance` under the configured rates and age table.
pub fn premiums(
    params: &EngineParameters,
    balance: Money,
    property_value: Money,
    age_years: Decimal,
) -> InsurancePremiums {
    InsurancePremiums {
        life: life_premium(balance, age_years, params.life_base_rate, &params.insurance_factors),
        property: property_premium(property_value, params.property_base_rate),
        age_factor: params.insurance_factors.factor_for(age_years),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factor_step_boundaries() {
        let table = InsuranceFactorTable::default();
        let cases = [
            (dec!(18), dec!(1.0)),
            (dec!(35.99), dec!(1.0)),
            (dec!(36), dec!(1.2)),
            (dec!(40.5), dec!(1.2)),
            (dec!(41), dec!(1.5)),
            (dec!(50), dec!(2.0)),
            (dec!(51), dec!(2.5)),
            (dec!(60.9), dec!(3.0)),
            (dec!(65), dec!(4.0)),
            (dec!(70), dec!(5.0)),
            (dec!(70.99), dec!(5.0)),
            (dec!(71), dec!(6.0)),
            (dec!(95), dec!(6.0)),
        ];
        for (age, expected) in cases {
            assert_eq!(table.factor_for(age), expected, "age {age}");
        }
    }

    #[test]
    fn test_factor_is_non_decreasing() {
        let table = InsuranceFactorTable::default();
        let mut previous = Decimal::ZERO;
        for age in 0..100 {
            let f = table.factor_for(Decimal::from(age));
            assert!(f >= previous, "factor dropped at age {age}");
            previous = f;
        }
    }

    #[test]
    fn test_life_premium() {
        let table = InsuranceFactorTable::default();
        // 200k × 0.000116 × 1.5
        let p = life_premium(dec!(200_000), dec!(42.3), dec!(0.000116), &table);
        assert_eq!(p, dec!(34.8));
    }

    #[test]
    fn test_property_premium_is_age_independent() {
        let params = EngineParameters::default();
        let young = premiums(&params, dec!(100_000), dec!(400_000), dec!(25));
        let old = premiums(&params, dec!(100_000), dec!(400_000), dec!(66));
        assert_eq!(young.property, dec!(26.4));
        assert_eq!(young.property, old.property);
        assert!(old.life > young.life);
    }

    #[test]
    fn test_validate_rejects_unordered_table() {
        let table = InsuranceFactorTable {
            bands: vec![
                AgeBand { max_age: 40, factor: dec!(1.0) },
                AgeBand { max_age: 35, factor: dec!(1.2) },
            ],
            catch_all_factor: dec!(2),
        };
        assert!(table.validate().is_err());

        let decreasing = InsuranceFactorTable {
            bands: vec![
                AgeBand { max_age: 35, factor: dec!(1.5) },
                AgeBand { max_age: 40, factor: dec!(1.2) },
            ],
            catch_all_factor: dec!(2),
        };
        assert!(decreasing.validate().is_err());
        assert!(InsuranceFactorTable::default().validate().is_ok());
    }
}
