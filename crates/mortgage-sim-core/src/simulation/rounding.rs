//! Published installments.
//!
//! The raw installment is truncated to the cent and then lowered by one more
//! cent so the published figure can never exceed the income ceiling. The
//! financed amount is then solved back from the lowered installment so both
//! numbers stay consistent.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::simulation::insurance;
use crate::simulation::params::{AmortizationRegime, EngineParameters};
use crate::simulation::solver::{base_installment, financed_from_base_installment};
use crate::time_value::truncate_to_cents;
use crate::types::{Money, Months};
use crate::MortgageSimResult;

const ONE_CENT: Decimal = dec!(0.01);

/// `floor(raw × 100) / 100 − 0.01`
pub fn adjust_installment(raw: Money) -> Money {
    truncate_to_cents(raw) - ONE_CENT
}

/// Financing figures after rounding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConvergedFinancing {
    pub financed: Money,
    pub first_installment: Money,
    pub last_installment: Money,
    /// First installment before rounding.
    pub raw_installment: Money,
    /// Principal-and-interest part of the first installment.
    pub base_installment: Money,
    /// Monthly principal (SAC) or first-month principal (PRICE).
    pub amortization: Money,
    pub first_interest: Money,
    pub life_premium: Money,
    pub property_premium: Money,
    pub operational_fee: Money,
    pub insurance_factor: Decimal,
    pub iterations: u32,
    pub converged: bool,
}

/// Solver progress carried into the rounded result.
#[derive(Debug, Clone, Copy)]
pub struct Iterations {
    pub count: u32,
    pub converged: bool,
}

/// Round the installments for `financed` and solve the amount back.
///
/// The first installment is priced with premiums on the pre-rounding balance.
/// Under PRICE those premiums are reported unchanged, so
/// `first_installment = base_installment + premiums + fee` holds exactly.
/// Under SAC the life premium is repriced on the back-solved amount, which
/// also feeds the last installment; the first installment then recomposes to
/// within a fraction of a cent.
pub fn round_financing(
    regime: AmortizationRegime,
    financed: Money,
    term_months: Months,
    property_value: Money,
    age_years: Decimal,
    params: &EngineParameters,
    iterations: Iterations,
) -> MortgageSimResult<ConvergedFinancing> {
    let rate = params.monthly_rate();
    let fee = params.operational_fee;
    let premiums = insurance::premiums(params, financed, property_value, age_years);
    let charges = premiums.total() + fee;

    let raw_installment = base_installment(regime, financed, rate, term_months)? + charges;
    let first_installment = adjust_installment(raw_installment);
    let adjusted_base = first_installment - charges;
    let adjusted_financed = financed_from_base_installment(regime, adjusted_base, rate, term_months)?;
    let first_interest = adjusted_financed * rate;

    let (amortization, last_installment, life_premium) = match regime {
        AmortizationRegime::Sac => {
            let repriced = insurance::premiums(params, adjusted_financed, property_value, age_years);
            let amortization = adjusted_financed / Decimal::from(term_months);
            // Only one amortization installment is left outstanding in the last month.
            let last_interest = amortization * rate;
            let last_raw = amortization + last_interest + (repriced.total() + fee);
            (amortization, adjust_installment(last_raw), repriced.life)
        }
        AmortizationRegime::Price => (adjusted_base - first_interest, first_installment, premiums.life),
    };

    Ok(ConvergedFinancing {
        financed: adjusted_financed,
        first_installment,
        last_installment,
        raw_installment,
        base_installment: adjusted_base,
        amortization,
        first_interest,
        life_premium,
        property_premium: premiums.property,
        operational_fee: fee,
        insurance_factor: premiums.age_factor,
        iterations: iterations.count,
        converged: iterations.converged,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const ITER: Iterations = Iterations {
        count: 3,
        converged: true,
    };

    #[test]
    fn test_adjust_installment() {
        assert_eq!(adjust_installment(dec!(2499.999)), dec!(2499.98));
        assert_eq!(adjust_installment(dec!(2500.00)), dec!(2499.99));
        assert_eq!(adjust_installment(dec!(1234.5678)), dec!(1234.55));
    }

    #[test]
    fn test_adjusted_is_at_least_one_cent_below_raw() {
        for raw in [dec!(10), dec!(10.009), dec!(999.999999), dec!(3210.01)] {
            let adjusted = adjust_installment(raw);
            assert!(raw - adjusted >= ONE_CENT, "raw {raw}");
            assert!(raw - adjusted < dec!(0.02), "raw {raw}");
        }
    }

    #[test]
    fn test_price_round_is_consistent() {
        let params = EngineParameters::default();
        let out = round_financing(
            AmortizationRegime::Price,
            dec!(250_000),
            360,
            dec!(400_000),
            dec!(30),
            &params,
            ITER,
        )
        .unwrap();

        assert_eq!(out.first_installment, out.last_installment);
        assert_eq!(out.first_installment, adjust_installment(out.raw_installment));
        assert!(out.financed < dec!(250_000));
        // Back-solved amount reproduces the published base installment.
        let base = base_installment(AmortizationRegime::Price, out.financed, params.monthly_rate(), 360).unwrap();
        assert!((base - out.base_installment).abs() < dec!(0.0000001));
        assert_eq!(
            out.first_installment,
            out.base_installment + out.life_premium + out.property_premium + out.operational_fee
        );
    }

    #[test]
    fn test_sac_first_and_last() {
        let params = EngineParameters::default();
        let out = round_financing(
            AmortizationRegime::Sac,
            dec!(252_000),
            420,
            dec!(400_000),
            dec!(30),
            &params,
            ITER,
        )
        .unwrap();

        assert!(out.last_installment < out.first_installment);
        assert!((out.amortization * dec!(420) - out.financed).abs() < dec!(0.0001));
        assert!((out.first_interest - out.financed * params.monthly_rate()).abs() < dec!(0.0001));
        assert_eq!(out.first_installment, adjust_installment(out.raw_installment));
        // Last: one amortization slice plus its interest, premiums and fee, adjusted.
        let last_raw = out.amortization
            + out.amortization * params.monthly_rate()
            + (out.life_premium + out.property_premium + out.operational_fee);
        assert_eq!(out.last_installment, adjust_installment(last_raw));
    }

    #[test]
    fn test_sac_life_premium_follows_reported_balance() {
        let params = EngineParameters::default();
        let out = round_financing(
            AmortizationRegime::Sac,
            dec!(252_000),
            420,
            dec!(400_000),
            dec!(47),
            &params,
            ITER,
        )
        .unwrap();

        assert!(out.financed < dec!(252_000));
        let expected = insurance::life_premium(out.financed, dec!(47), params.life_base_rate, &params.insurance_factors);
        assert_eq!(out.life_premium, expected);
        let on_original = insurance::life_premium(dec!(252_000), dec!(47), params.life_base_rate, &params.insurance_factors);
        assert!(out.life_premium < on_original);

        let recomposed = out.base_installment + out.life_premium + out.property_premium + out.operational_fee;
        assert!((recomposed - out.first_installment).abs() < ONE_CENT);
    }
}
