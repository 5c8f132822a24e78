use std::time::Instant;

use chrono::{Datelike, Months as CalendarMonths, NaiveDate};
use log::info;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::MortgageSimError;
use crate::time_value::{annuity_factor, annuity_payment, compound_factor};
use crate::types::{with_metadata, ComputationOutput, Money, Months, Rate};
use crate::MortgageSimResult;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

pub const MAX_INSTALLMENTS: Months = 84;
pub const MAX_DEFERRAL: Months = 3;

// ---------------------------------------------------------------------------
// Input types
// ---------------------------------------------------------------------------

/// Monthly rates on either side of the delivery date, and the due day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProSolutoRates {
    pub pre_delivery_rate: Rate,
    pub post_delivery_rate: Rate,
    pub payment_day: u32,
}

impl Default for ProSolutoRates {
    fn default() -> Self {
        Self {
            pre_delivery_rate: dec!(0.005),
            post_delivery_rate: dec!(0.015),
            payment_day: 20,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProSolutoInput {
    pub residual_balance: Money,
    pub months_until_delivery: Months,
    /// 0 settles the residual as a lump sum.
    pub installment_count: Months,
    /// Deferred down-payment signals (0-3); each pushes the first installment
    /// one month later.
    #[serde(default)]
    pub deferral_count: Months,
    /// Month the schedule is counted from; today when absent.
    #[serde(default)]
    pub reference_date: Option<NaiveDate>,
    #[serde(default)]
    pub rates: ProSolutoRates,
}

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryRegime {
    PreDelivery,
    PostDelivery,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleRow {
    pub index: Months,
    pub date: NaiveDate,
    pub payment: Money,
    pub interest: Money,
    pub amortization: Money,
    pub balance: Money,
    pub regime: DeliveryRegime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProSolutoSchedule {
    pub residual_balance: Money,
    pub correction_rate: Rate,
    pub corrected_balance: Money,
    pub level_payment: Money,
    pub first_installment_month: Months,
    pub pre_delivery_count: Months,
    pub post_delivery_count: Months,
    pub total_paid: Money,
    pub total_interest: Money,
    /// Set when the residual is settled in one payment instead of installments.
    pub lump_sum: Option<Money>,
    pub rows: Vec<ScheduleRow>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Whole calendar months from `reference` to `delivery`, never negative.
pub fn months_until_delivery(reference: NaiveDate, delivery: NaiveDate) -> Months {
    let months = (delivery.year() - reference.year()) * 12
        + (delivery.month() as i32 - reference.month() as i32);
    Months::try_from(months).unwrap_or(0)
}

pub fn plan_pro_soluto(input: &ProSolutoInput) -> MortgageSimResult<ComputationOutput<ProSolutoSchedule>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();
    validate_input(input)?;

    let reference = input
        .reference_date
        .unwrap_or_else(|| chrono::Local::now().date_naive());

    let schedule = if input.installment_count == 0 {
        lump_sum(input)
    } else {
        build_schedule(input, reference)?
    };

    if input.months_until_delivery == 0 {
        warnings.push("Delivery month already reached; every installment uses the post-delivery rate".into());
    }

    info!(
        "pro-soluto plan: {} installments of {} on {} ({} pre-delivery)",
        input.installment_count, schedule.level_payment, schedule.corrected_balance, schedule.pre_delivery_count
    );

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Two-regime level-payment amortisation of a deferred balance",
        input,
        warnings,
        elapsed,
        schedule,
    ))
}

// ---------------------------------------------------------------------------
// Schedule
// ---------------------------------------------------------------------------

fn lump_sum(input: &ProSolutoInput) -> ProSolutoSchedule {
    ProSolutoSchedule {
        residual_balance: input.residual_balance,
        correction_rate: Decimal::ZERO,
        corrected_balance: input.residual_balance,
        level_payment: Decimal::ZERO,
        first_installment_month: 0,
        pre_delivery_count: 0,
        post_delivery_count: 0,
        total_paid: input.residual_balance,
        total_interest: Decimal::ZERO,
        lump_sum: Some(input.residual_balance),
        rows: Vec::new(),
    }
}

fn build_schedule(input: &ProSolutoInput, reference: NaiveDate) -> MortgageSimResult<ProSolutoSchedule> {
    let rates = &input.rates;
    let n = input.installment_count;
    let deferral = input.deferral_count;

    let first_installment_month = 1 + deferral;
    let correction_rate = if first_installment_month < input.months_until_delivery {
        rates.pre_delivery_rate
    } else {
        rates.post_delivery_rate
    };
    let corrected_balance = input
        .residual_balance
        .checked_mul(compound_factor(correction_rate, first_installment_month)?)
        .ok_or_else(|| overflow("corrected balance"))?;

    let pre_count = input
        .months_until_delivery
        .saturating_sub(deferral + 1)
        .min(n);
    let post_count = n - pre_count;

    let level_payment = if pre_count == 0 {
        annuity_payment(corrected_balance, rates.post_delivery_rate, n)?
    } else if post_count == 0 {
        annuity_payment(corrected_balance, rates.pre_delivery_rate, n)?
    } else {
        // Post-delivery annuity valued at delivery, discounted back over the
        // pre-delivery stretch.
        let pre_factor = annuity_factor(rates.pre_delivery_rate, pre_count)?;
        let post_factor = annuity_factor(rates.post_delivery_rate, post_count)?
            / compound_factor(rates.pre_delivery_rate, pre_count)?;
        corrected_balance
            .checked_div(pre_factor + post_factor)
            .ok_or_else(|| overflow("level payment"))?
    };

    let anchor = reference
        .with_day(rates.payment_day)
        .ok_or_else(|| MortgageSimError::Internal(format!("invalid payment day {}", rates.payment_day)))?;

    let mut rows = Vec::with_capacity(n as usize);
    let mut balance = corrected_balance;
    let mut total_paid = Decimal::ZERO;
    let mut total_interest = Decimal::ZERO;

    for index in 1..=n {
        let regime = if index <= pre_count {
            DeliveryRegime::PreDelivery
        } else {
            DeliveryRegime::PostDelivery
        };
        let rate = match regime {
            DeliveryRegime::PreDelivery => rates.pre_delivery_rate,
            DeliveryRegime::PostDelivery => rates.post_delivery_rate,
        };

        let interest = balance.checked_mul(rate).ok_or_else(|| overflow("interest"))?;
        let (payment, amortization) = if index == n {
            // Absorb rounding drift in the final installment.
            let payment = balance.checked_add(interest).ok_or_else(|| overflow("final installment"))?;
            (payment, balance)
        } else {
            let amortization = level_payment
                .checked_sub(interest)
                .ok_or_else(|| overflow("amortization"))?;
            (level_payment, amortization)
        };
        balance = balance
            .checked_sub(amortization)
            .ok_or_else(|| overflow("balance"))?
            .max(Decimal::ZERO);

        let date = anchor
            .checked_add_months(CalendarMonths::new(index + deferral))
            .ok_or_else(|| MortgageSimError::Internal("schedule date out of range".into()))?;

        total_paid = total_paid.checked_add(payment).ok_or_else(|| overflow("total paid"))?;
        total_interest = total_interest
            .checked_add(interest)
            .ok_or_else(|| overflow("total interest"))?;
        rows.push(ScheduleRow {
            index,
            date,
            payment,
            interest,
            amortization,
            balance,
            regime,
        });
    }

    Ok(ProSolutoSchedule {
        residual_balance: input.residual_balance,
        correction_rate,
        corrected_balance,
        level_payment,
        first_installment_month,
        pre_delivery_count: pre_count,
        post_delivery_count: post_count,
        total_paid,
        total_interest,
        lump_sum: None,
        rows,
    })
}

fn overflow(what: &str) -> MortgageSimError {
    MortgageSimError::Internal(format!("{what} overflowed"))
}

fn validate_input(input: &ProSolutoInput) -> MortgageSimResult<()> {
    if input.residual_balance <= Decimal::ZERO {
        return Err(MortgageSimError::validation(
            "residual_balance",
            "Residual balance must be positive",
        ));
    }
    if input.installment_count > MAX_INSTALLMENTS {
        return Err(MortgageSimError::validation(
            "installment_count",
            format!("At most {MAX_INSTALLMENTS} installments are allowed"),
        ));
    }
    if input.deferral_count > MAX_DEFERRAL {
        return Err(MortgageSimError::validation(
            "deferral_count",
            format!("At most {MAX_DEFERRAL} deferred signals are allowed"),
        ));
    }
    if input.rates.pre_delivery_rate < Decimal::ZERO || input.rates.post_delivery_rate < Decimal::ZERO {
        return Err(MortgageSimError::validation("rates", "Rates cannot be negative"));
    }
    if !(1..=28).contains(&input.rates.payment_day) {
        return Err(MortgageSimError::validation(
            "rates.payment_day",
            "Payment day must be between 1 and 28",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: Decimal = dec!(0.01);

    fn input(months_until_delivery: Months, installments: Months, deferral: Months) -> ProSolutoInput {
        ProSolutoInput {
            residual_balance: dec!(120_000),
            months_until_delivery,
            installment_count: installments,
            deferral_count: deferral,
            reference_date: NaiveDate::from_ymd_opt(2026, 10, 18),
            rates: ProSolutoRates::default(),
        }
    }

    fn run(input: &ProSolutoInput) -> ProSolutoSchedule {
        plan_pro_soluto(input).unwrap().result
    }

    #[test]
    fn test_months_until_delivery() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
        assert_eq!(months_until_delivery(today, NaiveDate::from_ymd_opt(2027, 3, 31).unwrap()), 5);
        assert_eq!(months_until_delivery(today, NaiveDate::from_ymd_opt(2026, 10, 1).unwrap()), 0);
        assert_eq!(months_until_delivery(today, NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()), 0);
    }

    #[test]
    fn test_correction_compounds_with_deferral() {
        let s = run(&input(30, 12, 2));
        assert_eq!(s.correction_rate, dec!(0.005));
        assert_eq!(s.first_installment_month, 3);
        let expected = dec!(120_000) * dec!(1.005) * dec!(1.005) * dec!(1.005);
        assert!((s.corrected_balance - expected).abs() < dec!(0.000001));
    }

    #[test]
    fn test_post_delivery_correction_rate() {
        let s = run(&input(2, 12, 1));
        // First installment in month 2, not before delivery.
        assert_eq!(s.correction_rate, dec!(0.015));
        assert_eq!(s.pre_delivery_count, 0);
        assert_eq!(s.post_delivery_count, 12);
    }

    #[test]
    fn test_single_regime_matches_annuity() {
        let s = run(&input(40, 24, 0));
        assert_eq!(s.pre_delivery_count, 24);
        let expected = annuity_payment(s.corrected_balance, dec!(0.005), 24).unwrap();
        assert_eq!(s.level_payment, expected);
        assert!(s.rows.iter().all(|r| r.regime == DeliveryRegime::PreDelivery));
    }

    #[test]
    fn test_final_balance_is_zero() {
        for (months, n, deferral) in [(24, 24, 0), (10, 24, 0), (10, 84, 3), (0, 6, 0), (5, 1, 0)] {
            let s = run(&input(months, n, deferral));
            let last = s.rows.last().unwrap();
            assert_eq!(last.balance, Decimal::ZERO);
            // Level payment leaves almost nothing for the final row to absorb.
            assert!((last.payment - s.level_payment).abs() < TOL, "{months}/{n}/{deferral}");
        }
    }

    #[test]
    fn test_dates_follow_anchor_and_deferral() {
        let s = run(&input(10, 3, 2));
        let dates: Vec<NaiveDate> = s.rows.iter().map(|r| r.date).collect();
        assert_eq!(
            dates,
            vec![
                NaiveDate::from_ymd_opt(2027, 1, 20).unwrap(),
                NaiveDate::from_ymd_opt(2027, 2, 20).unwrap(),
                NaiveDate::from_ymd_opt(2027, 3, 20).unwrap(),
            ]
        );
    }

    #[test]
    fn test_lump_sum() {
        let s = run(&input(10, 0, 0));
        assert!(s.rows.is_empty());
        assert_eq!(s.lump_sum, Some(dec!(120_000)));
        assert_eq!(s.total_paid, dec!(120_000));
    }

    #[test]
    fn test_huge_residual_is_an_error() {
        let mut huge = input(10, 24, 0);
        huge.residual_balance = Decimal::MAX;
        assert!(matches!(
            plan_pro_soluto(&huge),
            Err(MortgageSimError::Internal(_))
        ));
    }

    #[test]
    fn test_validation() {
        let mut too_many = input(10, 85, 0);
        assert!(plan_pro_soluto(&too_many).is_err());
        too_many.installment_count = 84;
        too_many.deferral_count = 4;
        assert!(plan_pro_soluto(&too_many).is_err());

        let mut empty = input(10, 12, 0);
        empty.residual_balance = Decimal::ZERO;
        assert!(matches!(
            plan_pro_soluto(&empty),
            Err(MortgageSimError::Validation { .. })
        ));
    }
}
