//! Net profit of alching items and the order between them.
//!
//! Every evaluation asks the [`CatalystOracle`] for the current Nature rune
//! price, so results always reflect the live catalyst cost.

use crate::core::error::ItemError;
use crate::core::item::{ItemFetcher, ItemRecord, fetch_item};
use anyhow::anyhow;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt::Display;
use std::str::FromStr;
use std::sync::Arc;
use tracing::debug;

/// Catalogue id of the Nature rune consumed by every cast.
pub const CATALYST_ID: u32 = 561;

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum AlchMode {
    #[default]
    High,
    Low,
}

impl Display for AlchMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                AlchMode::High => "high",
                AlchMode::Low => "low",
            }
        )
    }
}

impl FromStr for AlchMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "high" => Ok(AlchMode::High),
            "low" => Ok(AlchMode::Low),
            _ => Err(anyhow!("Invalid alch mode: {}", s)),
        }
    }
}

/// Source of the catalyst's current price.
#[async_trait]
pub trait CatalystOracle: Send + Sync {
    async fn catalyst_price(&self) -> Result<i64, ItemError>;
}

/// Looks the catalyst up in the catalogue on every call.
pub struct LiveCatalyst {
    fetcher: Arc<dyn ItemFetcher>,
}

impl LiveCatalyst {
    pub fn new(fetcher: Arc<dyn ItemFetcher>) -> Self {
        Self { fetcher }
    }
}

#[async_trait]
impl CatalystOracle for LiveCatalyst {
    async fn catalyst_price(&self) -> Result<i64, ItemError> {
        let catalyst = fetch_item(self.fetcher.as_ref(), CATALYST_ID).await?;
        debug!(price = catalyst.current_price, "Fetched live catalyst price");
        Ok(catalyst.current_price)
    }
}

/// A pinned catalyst price.
#[derive(Debug, Clone, Copy)]
pub struct FixedCatalyst(pub i64);

#[async_trait]
impl CatalystOracle for FixedCatalyst {
    async fn catalyst_price(&self) -> Result<i64, ItemError> {
        Ok(self.0)
    }
}

/// Coins gained (or lost when negative) by buying one item and alching it.
///
/// Saturates instead of overflowing when reference data holds extreme yields.
pub fn net_profit_at(record: &ItemRecord, mode: AlchMode, catalyst_price: i64) -> i64 {
    record
        .alch_yield(mode)
        .saturating_sub(record.current_price())
        .saturating_sub(catalyst_price)
}

/// Orders two records by high alch net profit. The mode is fixed to high alch
/// no matter how the caller evaluates profit elsewhere.
pub fn compare_at(a: &ItemRecord, b: &ItemRecord, catalyst_price: i64) -> Ordering {
    net_profit_at(a, AlchMode::High, catalyst_price)
        .cmp(&net_profit_at(b, AlchMode::High, catalyst_price))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedItem {
    pub record: ItemRecord,
    pub high_profit: i64,
    pub low_profit: i64,
}

#[derive(Debug, Clone)]
pub struct Ranking {
    pub catalyst_price: i64,
    /// Most profitable first; equal profits keep their input order.
    pub items: Vec<RankedItem>,
}

impl Ranking {
    pub fn best(&self) -> Option<&RankedItem> {
        self.items.first()
    }
}

pub struct ProfitabilityRanker<'a> {
    oracle: &'a dyn CatalystOracle,
}

impl<'a> ProfitabilityRanker<'a> {
    pub fn new(oracle: &'a dyn CatalystOracle) -> Self {
        Self { oracle }
    }

    pub async fn net_profit(&self, record: &ItemRecord, mode: AlchMode) -> Result<i64, ItemError> {
        let catalyst_price = self.oracle.catalyst_price().await?;
        Ok(net_profit_at(record, mode, catalyst_price))
    }

    pub async fn compare(&self, a: &ItemRecord, b: &ItemRecord) -> Result<Ordering, ItemError> {
        let catalyst_price = self.oracle.catalyst_price().await?;
        Ok(compare_at(a, b, catalyst_price))
    }

    /// Whether `a` is at least as good to alch as `b`. Ties favor `a`.
    pub async fn better_than(&self, a: &ItemRecord, b: &ItemRecord) -> Result<bool, ItemError> {
        Ok(self.compare(a, b).await? != Ordering::Less)
    }

    /// Sorts records from most to least profitable using one catalyst price
    /// for the whole evaluation.
    pub async fn rank(&self, records: Vec<ItemRecord>) -> Result<Ranking, ItemError> {
        let catalyst_price = self.oracle.catalyst_price().await?;
        let mut records = records;
        // sort_by is stable
        records.sort_by(|a, b| compare_at(b, a, catalyst_price));

        let items = records
            .into_iter()
            .map(|record| RankedItem {
                high_profit: net_profit_at(&record, AlchMode::High, catalyst_price),
                low_profit: net_profit_at(&record, AlchMode::Low, catalyst_price),
                record,
            })
            .collect();

        Ok(Ranking {
            catalyst_price,
            items,
        })
    }
}
