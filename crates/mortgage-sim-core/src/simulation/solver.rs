//! Maximum financeable amount.
//!
//! The installment ceiling depends on the life premium, which depends on the
//! balance being solved for. The loop below iterates that fixed point over
//! local state only; running out of rounds is not an error, the last estimate
//! is used.

use log::{debug, warn};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::MortgageSimError;
use crate::simulation::insurance;
use crate::simulation::params::{AmortizationRegime, EngineParameters};
use crate::time_value::{annuity_payment, annuity_principal};
use crate::types::{Money, Months, Rate};
use crate::MortgageSimResult;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolverInput {
    pub income: Money,
    pub regime: AmortizationRegime,
    pub term_months: Months,
    pub property_value: Money,
    pub age_years: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolverOutcome {
    pub financed: Money,
    pub income_ceiling: Money,
    pub ltv_ceiling: Money,
    pub iterations: u32,
    /// False when the round cap was reached before the tolerance was met.
    pub converged: bool,
    pub last_delta: Money,
}

/// Principal-and-interest part of the first installment.
///
/// SAC: `financed × (1/term + rate)`; PRICE: the annuity payment.
pub fn base_installment(
    regime: AmortizationRegime,
    financed: Money,
    monthly_rate: Rate,
    term_months: Months,
) -> MortgageSimResult<Money> {
    match regime {
        AmortizationRegime::Sac => Ok(financed * sac_factor(monthly_rate, term_months)?),
        AmortizationRegime::Price => annuity_payment(financed, monthly_rate, term_months),
    }
}

/// Inverse of [`base_installment`].
pub fn financed_from_base_installment(
    regime: AmortizationRegime,
    installment: Money,
    monthly_rate: Rate,
    term_months: Months,
) -> MortgageSimResult<Money> {
    match regime {
        AmortizationRegime::Sac => Ok(installment / sac_factor(monthly_rate, term_months)?),
        AmortizationRegime::Price => annuity_principal(installment, monthly_rate, term_months),
    }
}

fn sac_factor(monthly_rate: Rate, term_months: Months) -> MortgageSimResult<Decimal> {
    if term_months == 0 {
        return Err(MortgageSimError::validation(
            "term_months",
            "Number of periods must be > 0",
        ));
    }
    let factor = Decimal::ONE / Decimal::from(term_months) + monthly_rate;
    if factor <= Decimal::ZERO {
        return Err(MortgageSimError::Internal(
            "SAC installment factor is not positive".into(),
        ));
    }
    Ok(factor)
}

pub fn solve(input: &SolverInput, params: &EngineParameters) -> MortgageSimResult<SolverOutcome> {
    let regime = params.regime(input.regime);
    let monthly_rate = params.monthly_rate();
    let income_ceiling = input.income * regime.income_ratio;
    let ltv_ceiling = input.property_value * regime.ltv_ratio;

    let mut financed = ltv_ceiling.min(income_ceiling * params.solver_seed_multiplier);
    let mut iterations = 0;
    let mut converged = false;
    let mut last_delta = Decimal::ZERO;

    while iterations < params.max_solver_iterations {
        iterations += 1;

        let premiums = insurance::premiums(params, financed, input.property_value, input.age_years);
        let affordable = income_ceiling - premiums.total() - params.operational_fee;
        if affordable <= Decimal::ZERO {
            debug!("round {iterations}: premiums and fee exhaust the income ceiling");
            last_delta = financed;
            financed = Decimal::ZERO;
            converged = true;
            break;
        }

        let next = financed_from_base_installment(
            input.regime,
            affordable,
            monthly_rate,
            input.term_months,
        )?
        .min(ltv_ceiling);

        last_delta = (next - financed).abs();
        financed = next;
        debug!("round {iterations}: financed {financed}, delta {last_delta}");

        if last_delta <= params.solver_tolerance {
            converged = true;
            break;
        }
    }

    if !converged {
        warn!(
            "solver stopped after {iterations} rounds with delta {last_delta}; using last estimate {financed}"
        );
    }

    if financed <= Decimal::ZERO {
        return Err(MortgageSimError::Affordability(
            "income does not cover insurance and fees for any loan amount".into(),
        ));
    }

    Ok(SolverOutcome {
        financed,
        income_ceiling,
        ltv_ceiling,
        iterations,
        converged,
        last_delta,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn input(regime: AmortizationRegime, income: Decimal, value: Decimal) -> SolverInput {
        SolverInput {
            income,
            regime,
            term_months: match regime {
                AmortizationRegime::Sac => 420,
                AmortizationRegime::Price => 360,
            },
            property_value: value,
            age_years: dec!(30.4),
        }
    }

    #[test]
    fn test_installment_inverse_round_trip() {
        let rate = EngineParameters::default().monthly_rate();
        for regime in [AmortizationRegime::Sac, AmortizationRegime::Price] {
            let base = base_installment(regime, dec!(250_000), rate, 300).unwrap();
            let back = financed_from_base_installment(regime, base, rate, 300).unwrap();
            assert!((back - dec!(250_000)).abs() < dec!(0.0001), "{regime:?}");
        }
    }

    #[test]
    fn test_sac_base_installment() {
        // 420_000 / 420 + 420_000 × 1%
        let base = base_installment(AmortizationRegime::Sac, dec!(420_000), dec!(0.01), 420).unwrap();
        assert_eq!(base, dec!(5200));
    }

    #[test]
    fn test_income_bound_converges() {
        let params = EngineParameters::default();
        let out = solve(&input(AmortizationRegime::Price, dec!(10_000), dec!(400_000)), &params).unwrap();
        assert!(out.converged);
        assert!(out.iterations < params.max_solver_iterations);
        assert!(out.financed < out.ltv_ceiling);
        assert_eq!(out.income_ceiling, dec!(2500));
        assert_eq!(out.ltv_ceiling, dec!(320_000));

        // Fixed point: base installment + premiums + fee lands on the ceiling.
        let premiums = insurance::premiums(&params, out.financed, dec!(400_000), dec!(30.4));
        let base = base_installment(AmortizationRegime::Price, out.financed, params.monthly_rate(), 360).unwrap();
        let total = base + premiums.total() + params.operational_fee;
        assert!((total - out.income_ceiling).abs() < dec!(0.01));
    }

    #[test]
    fn test_ltv_bound_caps_result() {
        let params = EngineParameters::default();
        let out = solve(&input(AmortizationRegime::Sac, dec!(100_000), dec!(300_000)), &params).unwrap();
        assert_eq!(out.financed, dec!(270_000));
        assert!(out.converged);
    }

    #[test]
    fn test_unaffordable_is_rejected() {
        let params = EngineParameters::default();
        let err = solve(&input(AmortizationRegime::Price, dec!(150), dec!(400_000)), &params).unwrap_err();
        assert!(matches!(err, MortgageSimError::Affordability(_)));
    }

    #[test]
    fn test_cap_exhaustion_returns_last_estimate() {
        let params = EngineParameters {
            max_solver_iterations: 1,
            ..EngineParameters::default()
        };
        let out = solve(&input(AmortizationRegime::Price, dec!(10_000), dec!(400_000)), &params).unwrap();
        assert_eq!(out.iterations, 1);
        assert!(!out.converged);
        assert!(out.financed > Decimal::ZERO);
    }
}
