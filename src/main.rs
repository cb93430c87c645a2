use alchr::PricingOptions;
use alchr::core::log::init_logging;
use alchr::core::{AlchMode, ItemQuery, MAX_PRICE};
use anyhow::Result;
use clap::{Args, CommandFactory, Parser, Subcommand};

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

#[derive(Args)]
struct PricingArgs {
    /// Use this Nature rune price instead of fetching the live one
    #[arg(long, value_name = "GP", value_parser = clap::value_parser!(i64).range(0..=MAX_PRICE))]
    catalyst_price: Option<i64>,
}

impl From<PricingArgs> for PricingOptions {
    fn from(args: PricingArgs) -> PricingOptions {
        PricingOptions {
            catalyst_price: args.catalyst_price,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Show an item's price, alch values and net profit
    Item {
        /// Item name or id
        query: ItemQuery,
        /// Alch mode used for the net profit
        #[arg(short, long, value_enum)]
        mode: Option<AlchMode>,
        #[command(flatten)]
        pricing: PricingArgs,
    },
    /// Tell which of two items is the better alch (ties favor the first)
    Compare {
        first: ItemQuery,
        second: ItemQuery,
        #[command(flatten)]
        pricing: PricingArgs,
    },
    /// Rank items by high alch profit, using the config watchlist when none are given
    Rank {
        queries: Vec<ItemQuery>,
        #[command(flatten)]
        pricing: PricingArgs,
    },
}

impl Commands {
    fn into_app_command(self) -> (alchr::AppCommand, PricingOptions) {
        match self {
            Commands::Item {
                query,
                mode,
                pricing,
            } => (alchr::AppCommand::Item { query, mode }, pricing.into()),
            Commands::Compare {
                first,
                second,
                pricing,
            } => (alchr::AppCommand::Compare { first, second }, pricing.into()),
            Commands::Rank { queries, pricing } => {
                (alchr::AppCommand::Rank { queries }, pricing.into())
            }
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => alchr::cli::setup::setup(),
        Some(cmd) => {
            let (command, pricing) = cmd.into_app_command();
            alchr::run_command(command, cli.config_path.as_deref(), pricing).await
        }
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
