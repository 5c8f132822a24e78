//! The simulate operation: raw request in, financing summary out.

use std::time::Instant;

use chrono::NaiveDate;
use log::info;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::currency::AmountInput;
use crate::error::MortgageSimError;
use crate::simulation::age::{parse_birth_date, AgeFigures};
use crate::simulation::format::{format_brl, format_percent, format_rate, format_term};
use crate::simulation::params::{AmortizationRegime, EngineParameters};
use crate::simulation::rounding::{round_financing, ConvergedFinancing, Iterations};
use crate::simulation::solver::{self, SolverInput};
use crate::simulation::term::{apply_custom_term, resolve_term};
use crate::time_value::effective_annual_rate;
use crate::types::{with_metadata, ComputationOutput, Money, Months, Percent, Rate};
use crate::MortgageSimResult;

// ---------------------------------------------------------------------------
// Input types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationRequest {
    /// Gross monthly income.
    pub income: AmountInput,
    /// ISO or day/month/year.
    pub birth_date: String,
    pub property_value: AmountInput,
    /// Free text; anything containing "SAC" selects the graduated system.
    pub amortization_system: String,
    #[serde(default)]
    pub construction_months: Option<Months>,
    #[serde(default)]
    pub term_months: Option<Months>,
    #[serde(default)]
    pub down_payment: Option<AmountInput>,
    /// Date ages are measured against; today when absent.
    #[serde(default)]
    pub reference_date: Option<NaiveDate>,
    #[serde(default)]
    pub parameters: Option<EngineParameters>,
}

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationResult {
    pub regime: AmortizationRegime,
    pub term_months: Months,
    pub max_term_months: Months,
    pub construction_months: Months,
    pub total_term_months: Months,
    pub property_value: Money,
    /// Property value minus the reported financed amount. With a custom down
    /// payment this sits a few cents above the request, since the financed
    /// amount is solved back from the cent-floored installment.
    pub down_payment: Money,
    /// The custom down payment as requested, when one was given.
    pub requested_down_payment: Option<Money>,
    pub down_payment_pct: Percent,
    pub income_commitment_pct: Percent,
    pub nominal_annual_rate: Rate,
    pub effective_annual_rate: Rate,
    pub monthly_rate: Rate,
    pub age_years: u32,
    pub age_months: Months,
    pub ltv_ratio: Rate,
    pub income_ratio: Rate,
    pub ltv_ceiling: Money,
    pub income_ceiling: Money,
    pub financing: ConvergedFinancing,
    pub formatted: FormattedSummary,
}

/// Display strings, pt-BR.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormattedSummary {
    pub amortization_system: String,
    pub amortization_term: String,
    pub construction_term: String,
    pub total_term: String,
    pub property_value: String,
    pub down_payment: String,
    pub down_payment_pct: String,
    pub financed_amount: String,
    pub first_installment: String,
    pub last_installment: String,
    pub base_installment: String,
    pub monthly_amortization: String,
    pub first_interest: String,
    pub life_premium: String,
    pub property_premium: String,
    pub operational_fee: String,
    pub nominal_rate: String,
    pub effective_rate: String,
    pub income_commitment: String,
    pub age: String,
    pub insurance_factor: String,
    pub max_ltv: String,
    pub income_limit: String,
}

/// Status-and-body pair for an HTTP-style caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationResponse {
    pub status: u16,
    pub body: serde_json::Value,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Run a simulation measured against `request.reference_date` or today.
pub fn simulate(request: &SimulationRequest) -> MortgageSimResult<ComputationOutput<SimulationResult>> {
    let reference = request
        .reference_date
        .unwrap_or_else(|| chrono::Local::now().date_naive());
    simulate_as_of(request, reference)
}

pub fn simulate_as_of(
    request: &SimulationRequest,
    reference: NaiveDate,
) -> MortgageSimResult<ComputationOutput<SimulationResult>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let defaults = EngineParameters::default();
    let params = request.parameters.as_ref().unwrap_or(&defaults);
    params.validate()?;

    let income = request.income.resolve("income")?;
    let property_value = request.property_value.resolve("property_value")?;
    let birth_date = parse_birth_date(&request.birth_date).ok_or_else(|| {
        MortgageSimError::validation(
            "birth_date",
            format!("could not read a date from '{}'", request.birth_date),
        )
    })?;
    if request.amortization_system.trim().is_empty() {
        return Err(MortgageSimError::validation(
            "amortization_system",
            "an amortization system is required",
        ));
    }
    let regime = AmortizationRegime::from_selector(&request.amortization_system);
    let construction_months = request
        .construction_months
        .unwrap_or(params.default_construction_months);

    let age = AgeFigures::new(birth_date, reference);
    if age.years < params.min_age_years {
        return Err(MortgageSimError::Eligibility(format!(
            "minimum age for financing is {} years",
            params.min_age_years
        )));
    }

    let limit = resolve_term(age.months, regime, params)?;
    let term_months = match request.term_months {
        Some(requested) => {
            let term = apply_custom_term(&limit, requested, params)?;
            if term < limit.term_months {
                warnings.push(format!(
                    "Requested term of {term} months is shorter than the {} months available",
                    limit.term_months
                ));
            }
            term
        }
        None => limit.term_months,
    };

    let outcome = solver::solve(
        &SolverInput {
            income,
            regime,
            term_months,
            property_value,
            age_years: age.years,
        },
        params,
    )?;
    if !outcome.converged {
        warnings.push(format!(
            "Solver stopped after {} rounds without meeting tolerance; last estimate used",
            outcome.iterations
        ));
    }

    let target = match &request.down_payment {
        Some(down) => financed_for_down_payment(down, property_value, outcome.ltv_ceiling, outcome.financed)?,
        None => outcome.financed,
    };
    let requested_down_payment = request.down_payment.as_ref().map(|_| property_value - target);

    let financing = round_financing(
        regime,
        target,
        term_months,
        property_value,
        age.years,
        params,
        Iterations {
            count: outcome.iterations,
            converged: outcome.converged,
        },
    )?;

    if financing.financed < params.min_financed_amount {
        return Err(MortgageSimError::Affordability(format!(
            "financed amount of {} is below the minimum of {}",
            format_brl(financing.financed),
            format_brl(params.min_financed_amount)
        )));
    }

    let regime_params = params.regime(regime);
    let monthly_rate = params.monthly_rate();
    let effective = effective_annual_rate(monthly_rate)?;
    let down_payment = property_value - financing.financed;
    let down_payment_pct = down_payment / property_value * dec!(100);
    let income_commitment_pct = financing.first_installment / income * dec!(100);
    let age_years = age.whole_years();

    let formatted = FormattedSummary {
        amortization_system: regime.label(),
        amortization_term: format_term(term_months),
        construction_term: format_term(construction_months),
        total_term: format_term(term_months + construction_months),
        property_value: format_brl(property_value),
        down_payment: format_brl(down_payment),
        down_payment_pct: format_percent(down_payment_pct, 1),
        financed_amount: format_brl(financing.financed),
        first_installment: format_brl(financing.first_installment),
        last_installment: format_brl(financing.last_installment),
        base_installment: format_brl(financing.base_installment),
        monthly_amortization: match regime {
            AmortizationRegime::Sac => format_brl(financing.amortization),
            AmortizationRegime::Price => "Variável".to_string(),
        },
        first_interest: format_brl(financing.first_interest),
        life_premium: format_brl(financing.life_premium),
        property_premium: format_brl(financing.property_premium),
        operational_fee: format_brl(financing.operational_fee),
        nominal_rate: format!("{} a.a.", format_rate(params.nominal_annual_rate, 4)),
        effective_rate: format!("{} a.a.", format_rate(effective, 2)),
        income_commitment: format_percent(income_commitment_pct, 2),
        age: format!("{age_years} anos"),
        insurance_factor: format!("{}x", financing.insurance_factor.normalize()),
        max_ltv: format_rate(regime_params.ltv_ratio, 0),
        income_limit: format_rate(regime_params.income_ratio, 0),
    };

    info!(
        "simulated {} over {} months: financed {}, first installment {}",
        regime.code(),
        term_months,
        financing.financed,
        financing.first_installment
    );

    let result = SimulationResult {
        regime,
        term_months,
        max_term_months: limit.term_months,
        construction_months,
        total_term_months: term_months + construction_months,
        property_value,
        down_payment,
        requested_down_payment,
        down_payment_pct,
        income_commitment_pct,
        nominal_annual_rate: params.nominal_annual_rate,
        effective_annual_rate: effective,
        monthly_rate,
        age_years,
        age_months: age.months,
        ltv_ratio: regime_params.ltv_ratio,
        income_ratio: regime_params.income_ratio,
        ltv_ceiling: outcome.ltv_ceiling,
        income_ceiling: outcome.income_ceiling,
        financing,
        formatted,
    };

    let assumptions = json!({
        "reference_date": reference,
        "regime": regime,
        "term_months": term_months,
        "construction_months": construction_months,
        "parameters": params,
    });

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        &format!("{} mortgage simulation (income-bound fixed point, cent-floored installment)", regime.code()),
        &assumptions,
        warnings,
        elapsed,
        result,
    ))
}

/// Map a simulation outcome onto a status code and JSON body.
///
/// Client errors carry their message; anything else is reported generically.
pub fn respond(request: &SimulationRequest, reference: NaiveDate) -> SimulationResponse {
    let outcome = simulate_as_of(request, reference)
        .and_then(|output| serde_json::to_value(output).map_err(MortgageSimError::from));

    match outcome {
        Ok(body) => SimulationResponse { status: 200, body },
        Err(e) if e.is_client_error() => SimulationResponse {
            status: e.status_code(),
            body: json!({ "error": e.to_string(), "kind": e.kind() }),
        },
        Err(e) => {
            log::error!("simulation failed: {e}");
            SimulationResponse {
                status: e.status_code(),
                body: json!({ "error": "Error processing simulation.", "kind": "internal" }),
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn financed_for_down_payment(
    down_payment: &AmountInput,
    property_value: Money,
    ltv_ceiling: Money,
    affordable: Money,
) -> MortgageSimResult<Money> {
    let down = down_payment.parsed().ok_or_else(|| {
        MortgageSimError::validation("down_payment", format!("could not read an amount from {down_payment}"))
    })?;
    if down < Decimal::ZERO || down >= property_value {
        return Err(MortgageSimError::validation(
            "down_payment",
            "must be zero or more and below the property value",
        ));
    }

    let target = property_value - down;
    if target > ltv_ceiling {
        return Err(MortgageSimError::Affordability(format!(
            "a down payment of {} leaves {} to finance, above the LTV ceiling of {}",
            format_brl(down),
            format_brl(target),
            format_brl(ltv_ceiling)
        )));
    }
    if target > affordable {
        return Err(MortgageSimError::Affordability(format!(
            "a down payment of {} leaves {} to finance, above the {} the income supports",
            format_brl(down),
            format_brl(target),
            format_brl(affordable)
        )));
    }
    Ok(target)
}
