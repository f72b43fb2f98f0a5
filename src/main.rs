use anyhow::Result;
use chrono::NaiveDate;
use clap::{CommandFactory, Parser, Subcommand};
use fxref::cli::convert::{parse_amount, parse_currency};
use fxref::core::log::init_logging;
use rust_decimal::Decimal;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// List available currencies
    Currencies,
    /// Register currencies in the configuration file
    Add {
        /// Currency codes to register
        #[arg(required = true, value_parser = parse_supported_currency)]
        currencies: Vec<String>,
    },
    /// Show reference rates
    Rates {
        /// Only show rates for this date (YYYY-MM-DD)
        #[arg(short, long, value_parser = parse_date)]
        date: Option<NaiveDate>,
        /// Only show rates for this currency
        #[arg(long)]
        currency: Option<String>,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Convert an amount to EUR at the rate published on a date
    Convert {
        /// Rate date (YYYY-MM-DD)
        #[arg(short, long, value_parser = parse_date)]
        date: NaiveDate,
        /// Currency the amount is given in
        #[arg(long, value_parser = parse_supported_currency)]
        currency: String,
        /// Positive amount to convert
        #[arg(short, long, value_parser = parse_positive_amount)]
        amount: Decimal,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

impl From<Commands> for fxref::AppCommand {
    fn from(cmd: Commands) -> fxref::AppCommand {
        match cmd {
            Commands::Currencies => fxref::AppCommand::Currencies,
            Commands::Add { currencies } => fxref::AppCommand::AddCurrencies { currencies },
            Commands::Rates {
                date,
                currency,
                json,
            } => fxref::AppCommand::Rates {
                date,
                currency,
                json,
            },
            Commands::Convert {
                date,
                currency,
                amount,
                json,
            } => fxref::AppCommand::Convert {
                date,
                currency,
                amount,
                json,
            },
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| "Date must be in format yyyy-MM-dd".to_string())
}

fn parse_supported_currency(s: &str) -> Result<String, String> {
    parse_currency(s).map_err(|e| e.to_string())
}

fn parse_positive_amount(s: &str) -> Result<Decimal, String> {
    parse_amount(s).map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => fxref::cli::setup::setup(),
        Some(cmd) => fxref::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
