use chrono::NaiveDate;
use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use mortgage_sim_core::pro_soluto::{self, ProSolutoInput, ProSolutoRates};

use crate::input;

/// Arguments for a deferred-balance schedule
#[derive(Args)]
pub struct ProSolutoArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Residual balance owed to the developer
    #[arg(long)]
    pub residual: Option<Decimal>,

    /// Delivery date of the unit; alternative to --months-until-delivery
    #[arg(long)]
    pub delivery_date: Option<NaiveDate>,

    /// Whole months from the reference date until delivery
    #[arg(long)]
    pub months_until_delivery: Option<u32>,

    /// Number of installments (0 settles the balance in one payment)
    #[arg(long, default_value_t = 0)]
    pub installments: u32,

    /// Deferred down-payment signals (0-3)
    #[arg(long, default_value_t = 0)]
    pub deferral: u32,

    /// Monthly rate before delivery
    #[arg(long)]
    pub pre_delivery_rate: Option<Decimal>,

    /// Monthly rate after delivery
    #[arg(long)]
    pub post_delivery_rate: Option<Decimal>,

    /// Reference date (defaults to today)
    #[arg(long)]
    pub as_of: Option<NaiveDate>,
}

pub fn run_pro_soluto(args: ProSolutoArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let ps_input: ProSolutoInput = match input::read_request(args.input.as_deref())? {
        Some(request) => request,
        None => {
            let reference = args
                .as_of
                .unwrap_or_else(|| chrono::Local::now().date_naive());
            let months_until_delivery = match (args.months_until_delivery, args.delivery_date) {
                (Some(months), _) => months,
                (None, Some(delivery)) => pro_soluto::months_until_delivery(reference, delivery),
                (None, None) => {
                    return Err("--months-until-delivery or --delivery-date is required (or provide --input)".into())
                }
            };
            let defaults = ProSolutoRates::default();
            ProSolutoInput {
                residual_balance: args
                    .residual
                    .ok_or("--residual is required (or provide --input)")?,
                months_until_delivery,
                installment_count: args.installments,
                deferral_count: args.deferral,
                reference_date: Some(reference),
                rates: ProSolutoRates {
                    pre_delivery_rate: args.pre_delivery_rate.unwrap_or(defaults.pre_delivery_rate),
                    post_delivery_rate: args.post_delivery_rate.unwrap_or(defaults.post_delivery_rate),
                    payment_day: defaults.payment_day,
                },
            }
        }
    };
    let result = pro_soluto::plan_pro_soluto(&ps_input)?;
    Ok(serde_json::to_value(result)?)
}
