use clap::Args;
use serde_json::Value;

use mortgage_sim_core::payment_plan::{self, PaymentPlanInput};

use crate::input;

/// Arguments for payment-flow reconciliation
#[derive(Args)]
pub struct PaymentPlanArgs {
    /// Path to JSON input file
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_payment_plan(args: PaymentPlanArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let plan_input: PaymentPlanInput = input::read_request(args.input.as_deref())?
        .ok_or("--input <file.json> or stdin required for payment plans")?;
    let result = payment_plan::plan_payment(&plan_input)?;
    Ok(serde_json::to_value(result)?)
}
