use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;

use crate::error::MortgageSimError;
use crate::types::{Money, Months, Rate};
use crate::MortgageSimResult;

/// (1 + rate)^periods
pub fn compound_factor(rate: Rate, periods: Months) -> MortgageSimResult<Decimal> {
    (Decimal::ONE + rate)
        .checked_powi(i64::from(periods))
        .ok_or_else(|| {
            MortgageSimError::Internal(format!(
                "compound factor overflow for rate {rate} over {periods} periods"
            ))
        })
}

/// Present value of 1 paid at the end of each of `periods` periods.
pub fn annuity_factor(rate: Rate, periods: Months) -> MortgageSimResult<Decimal> {
    if periods == 0 {
        return Err(MortgageSimError::validation(
            "periods",
            "Number of periods must be > 0",
        ));
    }
    if rate.is_zero() {
        return Ok(Decimal::from(periods));
    }
    if rate <= dec!(-1) {
        return Err(MortgageSimError::validation(
            "rate",
            "Periodic rate must be greater than -100%",
        ));
    }

    let factor = compound_factor(rate, periods)?;
    if factor.is_zero() {
        return Err(MortgageSimError::Internal("annuity compound factor is zero".into()));
    }
    Ok((Decimal::ONE - Decimal::ONE / factor) / rate)
}

/// Level payment that amortises `principal` over `periods` (PMT).
pub fn annuity_payment(principal: Money, rate: Rate, periods: Months) -> MortgageSimResult<Money> {
    let factor = annuity_factor(rate, periods)?;
    if factor.is_zero() {
        return Err(MortgageSimError::Internal("annuity factor is zero".into()));
    }
    principal
        .checked_div(factor)
        .ok_or_else(|| MortgageSimError::Internal("annuity payment overflowed".into()))
}

/// Principal amortised by a level `payment` over `periods` (inverse of PMT).
pub fn annuity_principal(payment: Money, rate: Rate, periods: Months) -> MortgageSimResult<Money> {
    payment
        .checked_mul(annuity_factor(rate, periods)?)
        .ok_or_else(|| MortgageSimError::Internal("annuity principal overflowed".into()))
}

/// Effective annual rate of a monthly rate compounded twelve times.
pub fn effective_annual_rate(monthly_rate: Rate) -> MortgageSimResult<Rate> {
    Ok(compound_factor(monthly_rate, 12)? - Decimal::ONE)
}

/// Drop everything below the cent, toward negative infinity.
pub fn truncate_to_cents(value: Money) -> Money {
    (value * dec!(100)).floor() / dec!(100)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn approx_eq(a: Decimal, b: Decimal, tol: Decimal) -> bool {
        (a - b).abs() < tol
    }

    #[test]
    fn test_annuity_payment_basic() {
        // 100k over 360 months at 0.5%: textbook 599.55
        let pmt = annuity_payment(dec!(100_000), dec!(0.005), 360).unwrap();
        assert!(approx_eq(pmt, dec!(599.55), dec!(0.01)));
    }

    #[test]
    fn test_annuity_principal_inverts_payment() {
        let pmt = annuity_payment(dec!(250_000), dec!(0.009), 420).unwrap();
        let principal = annuity_principal(pmt, dec!(0.009), 420).unwrap();
        assert!(approx_eq(principal, dec!(250_000), dec!(0.000001)));
    }

    #[test]
    fn test_annuity_zero_rate() {
        assert_eq!(annuity_factor(Decimal::ZERO, 24).unwrap(), dec!(24));
        assert_eq!(annuity_payment(dec!(1200), Decimal::ZERO, 12).unwrap(), dec!(100));
    }

    #[test]
    fn test_annuity_zero_periods_rejected() {
        assert!(annuity_factor(dec!(0.01), 0).is_err());
    }

    #[test]
    fn test_effective_annual_rate() {
        // 1% monthly compounds to 12.6825% a year
        let ear = effective_annual_rate(dec!(0.01)).unwrap();
        assert!(approx_eq(ear, dec!(0.126825), dec!(0.000001)));
    }

    #[test]
    fn test_truncate_to_cents() {
        assert_eq!(truncate_to_cents(dec!(2499.999)), dec!(2499.99));
        assert_eq!(truncate_to_cents(dec!(10.01)), dec!(10.01));
        assert_eq!(truncate_to_cents(dec!(-0.001)), dec!(-0.01));
    }
}
