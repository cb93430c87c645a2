pub mod cli;
pub mod core;
pub mod providers;

use crate::core::config::AppConfig;
use crate::core::{
    AlchMode, CatalystOracle, FixedCatalyst, ItemFetcher, ItemQuery, ItemResolver, LiveCatalyst,
    ReferenceCatalog,
};
use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, info};

pub enum AppCommand {
    /// Show one item and its net profit
    Item {
        query: ItemQuery,
        mode: Option<AlchMode>,
    },
    /// Tell which of two items is the better alch
    Compare { first: ItemQuery, second: ItemQuery },
    /// Rank items by high alch profit; falls back to the config watchlist
    Rank { queries: Vec<ItemQuery> },
}

/// Options shared by every pricing command.
#[derive(Debug, Default, Clone, Copy)]
pub struct PricingOptions {
    /// Pinned catalyst price used instead of the live one.
    pub catalyst_price: Option<i64>,
}

fn load_catalog(config: &AppConfig) -> Result<ReferenceCatalog> {
    match &config.reference_data {
        Some(path) => ReferenceCatalog::load_from_path(path),
        None => ReferenceCatalog::embedded(),
    }
}

/// Runs `command` and returns the rendered output instead of printing it.
pub async fn render_command(
    command: AppCommand,
    config_path: Option<&str>,
    pricing: PricingOptions,
) -> Result<String> {
    info!("alchr starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load_or_default()?,
    };
    debug!("Loaded config: {config:#?}");

    let catalog = Arc::new(load_catalog(&config)?);
    let grand_exchange = &config.providers.grand_exchange;
    let fetcher: Arc<dyn ItemFetcher> = Arc::new(providers::GrandExchangeClient::new(
        &grand_exchange.base_url,
        grand_exchange.timeout(),
    )?);
    let resolver = ItemResolver::new(Arc::clone(&fetcher), catalog);

    let oracle: Box<dyn CatalystOracle> = match pricing.catalyst_price {
        Some(price) => {
            debug!("Using pinned catalyst price {price}");
            Box::new(FixedCatalyst(price))
        }
        None => Box::new(LiveCatalyst::new(fetcher)),
    };

    match command {
        AppCommand::Item { query, mode } => {
            cli::item::report(
                &resolver,
                oracle.as_ref(),
                &query,
                mode.unwrap_or(config.mode),
            )
            .await
        }
        AppCommand::Compare { first, second } => {
            cli::compare::report(&resolver, oracle.as_ref(), &first, &second).await
        }
        AppCommand::Rank { queries } => {
            let queries = if queries.is_empty() {
                config.watchlist
            } else {
                queries
            };
            cli::rank::report(&resolver, oracle.as_ref(), &queries).await
        }
    }
}

pub async fn run_command(
    command: AppCommand,
    config_path: Option<&str>,
    pricing: PricingOptions,
) -> Result<()> {
    let output = render_command(command, config_path, pricing).await?;
    println!("{output}");
    Ok(())
}
