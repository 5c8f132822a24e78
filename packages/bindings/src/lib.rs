use napi::Result as NapiResult;
use napi_derive::napi;
use serde_json::json;

use mortgage_sim_core::currency::parse_amount as parse_currency;
use mortgage_sim_core::simulation::format::format_brl;
use mortgage_sim_core::simulation::{self, SimulationRequest, SimulationResponse};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

// ---------------------------------------------------------------------------
// Simulation
// ---------------------------------------------------------------------------

#[napi]
pub fn simulate(input_json: String) -> NapiResult<String> {
    let input: SimulationRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = simulation::simulate(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

/// HTTP-shaped variant: never throws for bad requests, returns
/// `{ "status": 200 | 400 | 500, "body": ... }` instead.
#[napi]
pub fn simulate_response(input_json: String) -> NapiResult<String> {
    let response = match serde_json::from_str::<SimulationRequest>(&input_json) {
        Ok(request) => {
            let reference = request
                .reference_date
                .unwrap_or_else(|| chrono::Local::now().date_naive());
            simulation::respond(&request, reference)
        }
        Err(e) => SimulationResponse {
            status: 400,
            body: json!({ "error": e.to_string(), "kind": "validation" }),
        },
    };
    serde_json::to_string(&response).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Deferred balance
// ---------------------------------------------------------------------------

#[napi]
pub fn plan_pro_soluto(input_json: String) -> NapiResult<String> {
    let input: mortgage_sim_core::pro_soluto::ProSolutoInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = mortgage_sim_core::pro_soluto::plan_pro_soluto(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn plan_payment(input_json: String) -> NapiResult<String> {
    let input: mortgage_sim_core::payment_plan::PaymentPlanInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output =
        mortgage_sim_core::payment_plan::plan_payment(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Currency
// ---------------------------------------------------------------------------

/// Parse a currency field the way requests are parsed; `amount` is null when
/// nothing numeric could be read.
#[napi]
pub fn parse_amount(raw: String) -> NapiResult<String> {
    let amount = parse_currency(&raw);
    let output = json!({
        "input": raw,
        "amount": amount,
        "formatted": amount.map(format_brl),
    });
    serde_json::to_string(&output).map_err(to_napi_error)
}
