use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::MortgageSimError;
use crate::simulation::params::{AmortizationRegime, EngineParameters};
use crate::types::Months;
use crate::MortgageSimResult;

/// Maximum amortization term for an applicant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermLimit {
    pub term_months: Months,
    pub base_term_months: Months,
    /// Months left before the applicant reaches the age-at-maturity limit.
    pub age_ceiling_months: Months,
    /// True when the age ceiling, not the system ceiling, set the term.
    pub age_bound: bool,
}

/// `min(age ceiling, system ceiling)`, rejected when below the statutory
/// minimum. The term is never stretched up to the minimum.
pub fn resolve_term(
    age_months: Months,
    regime: AmortizationRegime,
    params: &EngineParameters,
) -> MortgageSimResult<TermLimit> {
    let base = params.regime(regime).max_term_months;
    let age_ceiling = params.max_age_at_maturity_months.saturating_sub(age_months);
    let term = age_ceiling.min(base);

    debug!(
        "term for {} at {} months of age: base {}, age ceiling {}, resolved {}",
        regime.code(),
        age_months,
        base,
        age_ceiling,
        term
    );

    if term < params.min_term_months {
        return Err(MortgageSimError::Eligibility(format!(
            "the maximum term available at this age is {term} months, below the minimum of {} months",
            params.min_term_months
        )));
    }

    Ok(TermLimit {
        term_months: term,
        base_term_months: base,
        age_ceiling_months: age_ceiling,
        age_bound: age_ceiling < base,
    })
}

/// Check a caller-chosen term against the resolved limit.
pub fn apply_custom_term(
    limit: &TermLimit,
    requested: Months,
    params: &EngineParameters,
) -> MortgageSimResult<Months> {
    if requested < params.min_term_months {
        return Err(MortgageSimError::validation(
            "term_months",
            format!("term must be at least {} months", params.min_term_months),
        ));
    }
    if requested > limit.term_months {
        return Err(MortgageSimError::Eligibility(format!(
            "requested term of {requested} months exceeds the maximum of {} months",
            limit.term_months
        )));
    }
    Ok(requested)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_young_applicant_gets_base_term() {
        let params = EngineParameters::default();
        let price = resolve_term(30 * 12, AmortizationRegime::Price, &params).unwrap();
        let sac = resolve_term(30 * 12, AmortizationRegime::Sac, &params).unwrap();
        assert_eq!(price.term_months, 360);
        assert_eq!(sac.term_months, 420);
        assert!(!price.age_bound);
    }

    #[test]
    fn test_age_ceiling_binds() {
        let params = EngineParameters::default();
        // 60 years: 966 - 720 = 246
        let limit = resolve_term(720, AmortizationRegime::Sac, &params).unwrap();
        assert_eq!(limit.term_months, 246);
        assert_eq!(limit.age_ceiling_months, 246);
        assert!(limit.age_bound);
    }

    #[test]
    fn test_exactly_minimum_is_accepted() {
        let params = EngineParameters::default();
        let limit = resolve_term(966 - 120, AmortizationRegime::Price, &params).unwrap();
        assert_eq!(limit.term_months, 120);
    }

    #[test]
    fn test_below_minimum_is_rejected() {
        let params = EngineParameters::default();
        let err = resolve_term(966 - 119, AmortizationRegime::Price, &params).unwrap_err();
        assert!(matches!(err, MortgageSimError::Eligibility(_)));

        let err = resolve_term(1200, AmortizationRegime::Sac, &params).unwrap_err();
        assert!(matches!(err, MortgageSimError::Eligibility(_)));
    }

    #[test]
    fn test_custom_term_bounds() {
        let params = EngineParameters::default();
        let limit = resolve_term(360, AmortizationRegime::Price, &params).unwrap();
        assert_eq!(apply_custom_term(&limit, 240, &params).unwrap(), 240);
        assert!(matches!(
            apply_custom_term(&limit, 100, &params),
            Err(MortgageSimError::Validation { .. })
        ));
        assert!(matches!(
            apply_custom_term(&limit, 361, &params),
            Err(MortgageSimError::Eligibility(_))
        ));
    }
}
