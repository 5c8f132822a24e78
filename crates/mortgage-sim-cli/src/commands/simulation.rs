use chrono::NaiveDate;
use clap::Args;
use serde_json::{json, Value};

use mortgage_sim_core::currency::{parse_amount, AmountInput};
use mortgage_sim_core::simulation::format::format_brl;
use mortgage_sim_core::simulation::{self, EngineParameters, SimulationRequest};

use crate::input;

/// Arguments for a financing simulation
#[derive(Args)]
pub struct SimulateArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Gross monthly income; "R$ 10.000,00" and "10000.00" both work
    #[arg(long)]
    pub income: Option<String>,

    /// Birth date (YYYY-MM-DD or DD/MM/YYYY)
    #[arg(long)]
    pub birth_date: Option<String>,

    /// Appraised property value
    #[arg(long)]
    pub property_value: Option<String>,

    /// Amortisation system: SAC or PRICE
    #[arg(long, default_value = "SAC")]
    pub system: String,

    /// Construction period ahead of amortisation, in months
    #[arg(long)]
    pub construction_months: Option<u32>,

    /// Amortisation term in months, at most the maximum the buyer qualifies for
    #[arg(long)]
    pub term: Option<u32>,

    /// Down payment; the financed amount becomes value minus down payment
    #[arg(long)]
    pub down_payment: Option<String>,

    /// Reference date for age and schedule calculations (defaults to today)
    #[arg(long)]
    pub as_of: Option<NaiveDate>,

    /// Engine parameter overrides (JSON or YAML file)
    #[arg(long)]
    pub params: Option<String>,
}

/// Arguments for currency parsing
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct ParseAmountArgs {
    /// Raw amount text
    #[arg(long)]
    pub value: String,
}

pub fn run_simulate(args: SimulateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut request: SimulationRequest = match input::read_request(args.input.as_deref())? {
        Some(request) => request,
        None => SimulationRequest {
            income: AmountInput::Text(
                args.income.ok_or("--income is required (or provide --input)")?,
            ),
            birth_date: args
                .birth_date
                .ok_or("--birth-date is required (or provide --input)")?,
            property_value: AmountInput::Text(
                args.property_value
                    .ok_or("--property-value is required (or provide --input)")?,
            ),
            amortization_system: args.system,
            construction_months: args.construction_months,
            term_months: args.term,
            down_payment: args.down_payment.map(AmountInput::Text),
            reference_date: args.as_of,
            parameters: None,
        },
    };

    if let Some(path) = args.params.as_deref() {
        let overrides: EngineParameters = input::file::read_config(path)?;
        request.parameters = Some(overrides);
    }

    request.reference_date = request.reference_date.or(args.as_of);

    let result = simulation::simulate(&request)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_parse_amount(args: ParseAmountArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let amount = parse_amount(&args.value)
        .ok_or_else(|| format!("could not read an amount from '{}'", args.value))?;
    Ok(json!({
        "result": {
            "input": args.value,
            "amount": amount,
            "formatted": format_brl(amount),
        }
    }))
}
