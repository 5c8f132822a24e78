mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::payment_plan::PaymentPlanArgs;
use commands::pro_soluto::ProSolutoArgs;
use commands::simulation::{ParseAmountArgs, SimulateArgs};

/// Mortgage financing simulations with decimal precision
#[derive(Parser)]
#[command(
    name = "msim",
    version,
    about = "Mortgage financing simulations with decimal precision",
    long_about = "Simulates the largest bank financing a buyer qualifies for under the \
                  SAC and PRICE amortisation systems, and plans deferred balances owed \
                  to the developer across the construction period."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Simulate the maximum financing for a buyer
    Simulate(SimulateArgs),
    /// Build a deferred-balance installment schedule
    ProSoluto(ProSolutoArgs),
    /// Reconcile a payment flow and plan the deferred balance
    PaymentPlan(PaymentPlanArgs),
    /// Parse a currency amount the way request fields are parsed
    ParseAmount(ParseAmountArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Simulate(args) => commands::simulation::run_simulate(args),
        Commands::ProSoluto(args) => commands::pro_soluto::run_pro_soluto(args),
        Commands::PaymentPlan(args) => commands::payment_plan::run_payment_plan(args),
        Commands::ParseAmount(args) => commands::simulation::run_parse_amount(args),
        Commands::Version => {
            println!("msim {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
