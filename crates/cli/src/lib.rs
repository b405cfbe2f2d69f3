pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;

#[derive(Debug, Parser)]
#[command(
    name = "pricewise",
    about = "Pricewise operator CLI",
    long_about = "Operate the dynamic pricing engine: inspect configuration, price customers, simulate scenarios, project ROI, and train model artifacts.",
    after_help = "Examples:\n  pricewise config\n  pricewise price --base-price 1299\n  pricewise simulate --base-price 1999\n  pricewise train --samples 2000"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
    #[command(about = "Compute a dynamic price for one customer")]
    Price {
        #[arg(long, help = "Base plan price")]
        base_price: Decimal,
        #[arg(long, help = "Path to a JSON file of customer features")]
        features: Option<PathBuf>,
        #[arg(long, help = "RFC 3339 timestamp for the demand factor (defaults to now)")]
        timestamp: Option<String>,
    },
    #[command(about = "Price one customer under the four canonical demand scenarios")]
    Simulate {
        #[arg(long, help = "Base plan price")]
        base_price: Decimal,
        #[arg(long, help = "Path to a JSON file of customer features")]
        features: Option<PathBuf>,
    },
    #[command(about = "Project the return on a retention program")]
    Roi {
        #[arg(long, default_value_t = 700)]
        customers_saved: u32,
        #[arg(long, default_value = "500")]
        avg_revenue_per_user: Decimal,
        #[arg(long, default_value_t = 24)]
        avg_lifetime_months: u32,
        #[arg(long, default_value = "1000000")]
        implementation_cost: Decimal,
    },
    #[command(
        about = "Train churn and segmentation models on a synthetic dataset and write artifacts"
    )]
    Train {
        #[arg(long, default_value_t = 2000)]
        samples: usize,
        #[arg(long, default_value_t = 42)]
        seed: u64,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Price { base_price, features, timestamp } => {
            commands::price::run(base_price, features.as_deref(), timestamp.as_deref())
        }
        Command::Simulate { base_price, features } => {
            commands::simulate::run(base_price, features.as_deref())
        }
        Command::Roi {
            customers_saved,
            avg_revenue_per_user,
            avg_lifetime_months,
            implementation_cost,
        } => commands::roi::run(
            customers_saved,
            avg_revenue_per_user,
            avg_lifetime_months,
            implementation_cost,
        ),
        Command::Train { samples, seed } => commands::train::run(samples, seed),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
