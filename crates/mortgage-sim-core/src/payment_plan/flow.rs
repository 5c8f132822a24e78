use std::collections::HashSet;
use std::time::Instant;

use chrono::NaiveDate;
use log::info;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::MortgageSimError;
use crate::payment_plan::profiles::{percent_of, ClientProfile, LimitCheck, ProfileLimits};
use crate::pro_soluto::{months_until_delivery, plan_pro_soluto, ProSolutoInput, ProSolutoRates, ProSolutoSchedule};
use crate::types::{with_metadata, ComputationOutput, Money, Months};
use crate::MortgageSimResult;

// ---------------------------------------------------------------------------
// Input types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowEntryKind {
    Financing,
    BuilderBonus,
    SigningDeposit,
    Signal1,
    Signal2,
    Signal3,
    Discount,
    /// Severance-fund (FGTS) withdrawal applied to the purchase.
    Fgts,
}

impl FlowEntryKind {
    /// Position of a deferred signal, which shifts the deferred schedule.
    pub fn signal_index(&self) -> Option<Months> {
        match self {
            FlowEntryKind::Signal1 => Some(1),
            FlowEntryKind::Signal2 => Some(2),
            FlowEntryKind::Signal3 => Some(3),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowEntry {
    pub kind: FlowEntryKind,
    pub amount: Money,
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentPlanInput {
    pub sale_value: Money,
    /// Required when a builder bonus is present: the bonus is granted over
    /// the appraisal, not the sale price.
    #[serde(default)]
    pub appraisal_value: Option<Money>,
    pub entries: Vec<FlowEntry>,
    #[serde(default)]
    pub delivery_date: Option<NaiveDate>,
    #[serde(default)]
    pub installment_count: Months,
    #[serde(default)]
    pub profile: ClientProfile,
    #[serde(default)]
    pub monthly_income: Option<Money>,
    /// First installment of the bank financing, for the income check.
    #[serde(default)]
    pub financing_installment: Option<Money>,
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
pub enum BalanceStatus {
    /// Entries plus deferred balance cover the base value.
    Balanced,
    Unbalanced,
    /// Nothing entered yet.
    Pending,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentPlan {
    pub base_value: Money,
    pub flow_total: Money,
    /// False until both the signing deposit and the financing are positive.
    pub deferred_available: bool,
    pub residual_balance: Money,
    /// Base value minus everything covered; zero when balanced.
    pub difference: Money,
    pub status: BalanceStatus,
    pub deferral_count: Months,
    pub months_until_delivery: Months,
    pub schedule: Option<ProSolutoSchedule>,
    pub profile: ClientProfile,
    pub limits: ProfileLimits,
    pub checks: Vec<LimitCheck>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

pub fn plan_payment(input: &PaymentPlanInput) -> MortgageSimResult<ComputationOutput<PaymentPlan>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();
    validate_input(input)?;

    let reference = input
        .reference_date
        .unwrap_or_else(|| chrono::Local::now().date_naive());

    let has_bonus = amount_of(input, FlowEntryKind::BuilderBonus) > Decimal::ZERO;
    let base_value = match (has_bonus, input.appraisal_value) {
        (true, Some(appraisal)) => appraisal,
        (true, None) => {
            return Err(MortgageSimError::validation(
                "appraisal_value",
                "an appraisal value is required when a builder bonus is granted",
            ))
        }
        (false, _) => input.sale_value,
    };

    let flow_total: Money = input
        .entries
        .iter()
        .try_fold(Decimal::ZERO, |acc, e| acc.checked_add(e.amount))
        .ok_or_else(|| MortgageSimError::validation("entries", "Payment flow total is out of range"))?;
    let deferred_available = amount_of(input, FlowEntryKind::SigningDeposit) > Decimal::ZERO
        && amount_of(input, FlowEntryKind::Financing) > Decimal::ZERO;
    let residual_balance = if deferred_available {
        (base_value - flow_total).max(Decimal::ZERO)
    } else {
        Decimal::ZERO
    };

    let difference = base_value - (flow_total + residual_balance);
    let has_signing = input
        .entries
        .iter()
        .any(|e| e.kind == FlowEntryKind::SigningDeposit);
    let status = if difference.abs() < dec!(0.01) && has_signing {
        BalanceStatus::Balanced
    } else if flow_total > Decimal::ZERO {
        BalanceStatus::Unbalanced
    } else {
        BalanceStatus::Pending
    };
    if status == BalanceStatus::Unbalanced {
        warnings.push(format!("Payment flow is off by {difference} against the base value"));
    }

    let deferral_count = input
        .entries
        .iter()
        .filter_map(|e| e.kind.signal_index())
        .max()
        .unwrap_or(0);
    let months_until_delivery = input
        .delivery_date
        .map(|delivery| months_until_delivery(reference, delivery))
        .unwrap_or(0);

    let schedule = if residual_balance > Decimal::ZERO && input.installment_count > 0 {
        let planned = plan_pro_soluto(&ProSolutoInput {
            residual_balance,
            months_until_delivery,
            installment_count: input.installment_count,
            deferral_count,
            reference_date: Some(reference),
            rates: input.rates.clone(),
        })?;
        warnings.extend(planned.warnings);
        Some(planned.result)
    } else {
        None
    };

    let limits = input.profile.limits();
    let checks = schedule
        .as_ref()
        .map(|s| limit_checks(input, s, base_value, &limits))
        .unwrap_or_default();
    for check in checks.iter().filter(|c| c.exceeded) {
        warnings.push(format!(
            "{} of {}% exceeds the {:?} profile limit of {}%",
            check.name,
            check.value.round_dp(2),
            input.profile,
            check.limit
        ));
    }

    info!(
        "payment plan: base {base_value}, flow {flow_total}, residual {residual_balance}, status {status:?}"
    );

    let plan = PaymentPlan {
        base_value,
        flow_total,
        deferred_available,
        residual_balance,
        difference,
        status,
        deferral_count,
        months_until_delivery,
        schedule,
        profile: input.profile,
        limits,
        checks,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Payment flow reconciliation with deferred-balance plan and profile limits",
        input,
        warnings,
        elapsed,
        plan,
    ))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn amount_of(input: &PaymentPlanInput, kind: FlowEntryKind) -> Money {
    input
        .entries
        .iter()
        .filter(|e| e.kind == kind)
        .map(|e| e.amount)
        .sum()
}

fn limit_checks(
    input: &PaymentPlanInput,
    schedule: &ProSolutoSchedule,
    base_value: Money,
    limits: &ProfileLimits,
) -> Vec<LimitCheck> {
    let mut checks = Vec::with_capacity(3);
    let deferred_payment = schedule.level_payment;

    if let Some(income) = input.monthly_income {
        let financing = input.financing_installment.unwrap_or(Decimal::ZERO);
        checks.push(LimitCheck::new(
            "income_commitment",
            percent_of(financing.saturating_add(deferred_payment), income),
            limits.income_commitment,
        ));
    }
    checks.push(LimitCheck::new(
        "deferred_share",
        percent_of(schedule.corrected_balance, base_value),
        limits.deferred_share,
    ));
    if let Some(income) = input.monthly_income {
        checks.push(LimitCheck::new(
            "deferred_commitment",
            percent_of(deferred_payment, income),
            limits.deferred_commitment,
        ));
    }
    checks
}

fn validate_input(input: &PaymentPlanInput) -> MortgageSimResult<()> {
    if input.sale_value <= Decimal::ZERO {
        return Err(MortgageSimError::validation("sale_value", "Sale value must be positive"));
    }
    if matches!(input.appraisal_value, Some(v) if v <= Decimal::ZERO) {
        return Err(MortgageSimError::validation(
            "appraisal_value",
            "Appraisal value must be positive",
        ));
    }
    if matches!(input.monthly_income, Some(v) if v <= Decimal::ZERO) {
        return Err(MortgageSimError::validation(
            "monthly_income",
            "Monthly income must be positive",
        ));
    }

    let mut seen = HashSet::new();
    for entry in &input.entries {
        if entry.amount < Decimal::ZERO {
            return Err(MortgageSimError::validation(
                "entries",
                format!("{:?} amount cannot be negative", entry.kind),
            ));
        }
        if !seen.insert(entry.kind) {
            return Err(MortgageSimError::validation(
                "entries",
                format!("{:?} appears more than once", entry.kind),
            ));
        }
    }

    let requires = [
        (FlowEntryKind::Signal2, FlowEntryKind::Signal1),
        (FlowEntryKind::Signal3, FlowEntryKind::Signal2),
    ];
    for (kind, prerequisite) in requires {
        if seen.contains(&kind) && !seen.contains(&prerequisite) {
            return Err(MortgageSimError::validation(
                "entries",
                format!("{kind:?} requires {prerequisite:?}"),
            ));
        }
    }
    Ok(())
}
