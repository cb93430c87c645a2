//! Item records and the fetch, parse and enrich pipeline that builds them.

use crate::core::catalog::{ReferenceCatalog, ReferenceEntry};
use crate::core::error::{FetchError, ItemError};
use crate::core::price::{check_range, parse_price};
use crate::core::ranking::AlchMode;
use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Deserializer};
use std::convert::Infallible;
use std::fmt::Display;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Retrieves the raw catalogue document for an item id.
#[async_trait]
pub trait ItemFetcher: Send + Sync {
    async fn fetch(&self, id: u32) -> Result<String>;
}

/// An item requested by catalogue id or by display name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ItemQuery {
    Id(u32),
    Name(String),
}

impl FromStr for ItemQuery {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(ItemQuery::from_text(s))
    }
}

impl ItemQuery {
    /// All-digit text is an id, anything else is a name.
    fn from_text(s: &str) -> Self {
        let trimmed = s.trim();
        match trimmed.parse::<u32>() {
            Ok(id) if trimmed.bytes().all(|b| b.is_ascii_digit()) => ItemQuery::Id(id),
            _ => ItemQuery::Name(trimmed.to_string()),
        }
    }
}

impl Display for ItemQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ItemQuery::Id(id) => write!(f, "#{id}"),
            ItemQuery::Name(name) => write!(f, "{name}"),
        }
    }
}

impl<'de> Deserialize<'de> for ItemQuery {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawQuery {
            Id(u32),
            Text(String),
        }

        Ok(match RawQuery::deserialize(deserializer)? {
            RawQuery::Id(id) => ItemQuery::Id(id),
            RawQuery::Text(text) => ItemQuery::from_text(&text),
        })
    }
}

#[derive(Debug, Deserialize)]
struct CatalogueResponse {
    item: CatalogueItem,
}

#[derive(Debug, Deserialize)]
struct CatalogueItem {
    name: String,
    icon: String,
    current: CurrentTrend,
}

#[derive(Debug, Deserialize)]
struct CurrentTrend {
    price: RawPrice,
}

// The catalogue sends small prices as numbers and larger ones as "2.3m" style text.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawPrice {
    Whole(i64),
    Text(String),
}

/// Catalogue fields of an item, before reference data is attached.
///
/// Only built by `parse_document`, so `current_price` is always within
/// `0..=MAX_PRICE`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ParsedItem {
    pub(crate) id: u32,
    pub(crate) name: String,
    pub(crate) image: String,
    pub(crate) current_price: i64,
}

impl ParsedItem {
    #[cfg(test)]
    pub(crate) fn new(id: u32, name: &str, image: &str, current_price: i64) -> Self {
        Self {
            id,
            name: name.to_string(),
            image: image.to_string(),
            current_price,
        }
    }
}

/// Parses a catalogue detail document into its name, icon and normalized price.
pub(crate) fn parse_document(id: u32, body: &str) -> Result<ParsedItem, ItemError> {
    if body.trim().is_empty() {
        return Err(FetchError::Empty { id }.into());
    }

    let response: CatalogueResponse =
        serde_json::from_str(body).map_err(|source| FetchError::Malformed { id, source })?;

    let current_price = match response.item.current.price {
        RawPrice::Text(text) => parse_price(&text)?,
        RawPrice::Whole(value) => check_range(&value.to_string(), value)?,
    };

    Ok(ParsedItem {
        id,
        name: response.item.name,
        image: response.item.icon,
        current_price,
    })
}

/// Fetches and parses one item, without reference data.
#[instrument(skip(fetcher))]
pub(crate) async fn fetch_item(
    fetcher: &dyn ItemFetcher,
    id: u32,
) -> Result<ParsedItem, ItemError> {
    debug!("Fetching catalogue document");
    let body = fetcher
        .fetch(id)
        .await
        .map_err(|e| FetchError::Unreachable {
            id,
            message: format!("{e:#}"),
        })?;
    let parsed = parse_document(id, &body)?;
    debug!(name = %parsed.name, price = parsed.current_price, "Parsed catalogue document");
    Ok(parsed)
}

/// A fully resolved item: live catalogue price plus reference alchemy data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemRecord {
    id: u32,
    name: String,
    image: String,
    current_price: i64,
    buy_limit: i64,
    high_alch: i64,
    low_alch: i64,
}

impl ItemRecord {
    /// Attaches reference data to a parsed item. A missing entry leaves the
    /// buy limit and both yields at zero.
    pub(crate) fn from_parsed(parsed: ParsedItem, reference: Option<&ReferenceEntry>) -> Self {
        let reference = reference.copied().unwrap_or_default();
        Self {
            id: parsed.id,
            name: parsed.name,
            image: parsed.image,
            current_price: parsed.current_price,
            buy_limit: reference.buy_limit,
            high_alch: reference.high_alch,
            low_alch: reference.low_alch,
        }
    }

    pub(crate) fn enrich(parsed: ParsedItem, catalog: &ReferenceCatalog) -> Self {
        let reference = catalog.lookup_by_name(&parsed.name);
        if reference.is_none() {
            debug!(name = %parsed.name, "No reference data for item");
        }
        Self::from_parsed(parsed, reference)
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn image(&self) -> &str {
        &self.image
    }

    pub fn current_price(&self) -> i64 {
        self.current_price
    }

    pub fn buy_limit(&self) -> i64 {
        self.buy_limit
    }

    pub fn high_alch(&self) -> i64 {
        self.high_alch
    }

    pub fn low_alch(&self) -> i64 {
        self.low_alch
    }

    pub fn alch_yield(&self, mode: AlchMode) -> i64 {
        match mode {
            AlchMode::High => self.high_alch,
            AlchMode::Low => self.low_alch,
        }
    }
}

/// The result of resolving one item in a batch.
///
/// A failed item reads as zeros and empty strings through the accessors, but
/// `is_failed` and `error` keep it distinguishable from a real zero-price item.
#[derive(Debug)]
pub enum ItemOutcome {
    Enriched(ItemRecord),
    Failed {
        query: ItemQuery,
        id: u32,
        error: ItemError,
    },
}

impl ItemOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, ItemOutcome::Failed { .. })
    }

    pub fn record(&self) -> Option<&ItemRecord> {
        match self {
            ItemOutcome::Enriched(record) => Some(record),
            ItemOutcome::Failed { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&ItemError> {
        match self {
            ItemOutcome::Enriched(_) => None,
            ItemOutcome::Failed { error, .. } => Some(error),
        }
    }

    pub fn into_result(self) -> Result<ItemRecord, ItemError> {
        match self {
            ItemOutcome::Enriched(record) => Ok(record),
            ItemOutcome::Failed { error, .. } => Err(error),
        }
    }

    pub fn id(&self) -> u32 {
        match self {
            ItemOutcome::Enriched(record) => record.id(),
            ItemOutcome::Failed { id, .. } => *id,
        }
    }

    pub fn name(&self) -> &str {
        self.record().map_or("", ItemRecord::name)
    }

    pub fn image(&self) -> &str {
        self.record().map_or("", ItemRecord::image)
    }

    pub fn current_price(&self) -> i64 {
        self.record().map_or(0, ItemRecord::current_price)
    }

    pub fn buy_limit(&self) -> i64 {
        self.record().map_or(0, ItemRecord::buy_limit)
    }

    pub fn high_alch(&self) -> i64 {
        self.record().map_or(0, ItemRecord::high_alch)
    }

    pub fn low_alch(&self) -> i64 {
        self.record().map_or(0, ItemRecord::low_alch)
    }
}

/// Builds item records from queries using a fetcher and the reference catalog.
#[derive(Clone)]
pub struct ItemResolver {
    fetcher: Arc<dyn ItemFetcher>,
    catalog: Arc<ReferenceCatalog>,
}

impl ItemResolver {
    pub fn new(fetcher: Arc<dyn ItemFetcher>, catalog: Arc<ReferenceCatalog>) -> Self {
        Self { fetcher, catalog }
    }

    pub fn catalog(&self) -> &ReferenceCatalog {
        &self.catalog
    }

    /// Catalogue id for a query; names missing from the catalog resolve to 0.
    pub fn query_id(&self, query: &ItemQuery) -> u32 {
        match query {
            ItemQuery::Id(id) => *id,
            ItemQuery::Name(name) => self.catalog.resolve_id(name),
        }
    }

    pub async fn resolve(&self, query: &ItemQuery) -> Result<ItemRecord, ItemError> {
        let id = self.query_id(query);
        if id == 0 {
            debug!(%query, "Item not in reference data, fetching id 0");
        }
        let parsed = fetch_item(self.fetcher.as_ref(), id).await?;
        Ok(ItemRecord::enrich(parsed, &self.catalog))
    }

    pub async fn resolve_outcome(&self, query: ItemQuery) -> ItemOutcome {
        match self.resolve(&query).await {
            Ok(record) => ItemOutcome::Enriched(record),
            Err(error) => ItemOutcome::Failed {
                id: self.query_id(&query),
                query,
                error,
            },
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use anyhow::anyhow;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Serves canned bodies by id and records every requested id.
    #[derive(Default)]
    pub(crate) struct StubFetcher {
        bodies: HashMap<u32, String>,
        pub(crate) requests: Mutex<Vec<u32>>,
    }

    impl StubFetcher {
        pub(crate) fn with(mut self, id: u32, body: &str) -> Self {
            self.bodies.insert(id, body.to_string());
            self
        }

        pub(crate) fn request_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl ItemFetcher for StubFetcher {
        async fn fetch(&self, id: u32) -> Result<String> {
            self.requests.lock().unwrap().push(id);
            self.bodies
                .get(&id)
                .cloned()
                .ok_or_else(|| anyhow!("connection refused"))
        }
    }

    pub(crate) fn document(name: &str, price: &str) -> String {
        format!(r#"{{"item":{{"name":"{name}","icon":"x","current":{{"price":{price}}}}}}}"#)
    }

    const WHIP_REFERENCE: &str =
        r#"{"items": [{"Abyssal whip": {"id":4151,"highalch":1,"lowalch":1,"buylimit":8}}]}"#;

    fn resolver(fetcher: StubFetcher) -> ItemResolver {
        let catalog = ReferenceCatalog::from_json_str(WHIP_REFERENCE).unwrap();
        ItemResolver::new(Arc::new(fetcher), Arc::new(catalog))
    }

    #[test]
    fn test_query_from_str() {
        assert_eq!("4151".parse::<ItemQuery>().unwrap(), ItemQuery::Id(4151));
        assert_eq!(" 561 ".parse::<ItemQuery>().unwrap(), ItemQuery::Id(561));
        assert_eq!(
            "abyssal whip".parse::<ItemQuery>().unwrap(),
            ItemQuery::Name("abyssal whip".to_string())
        );
        assert_eq!(
            "+12".parse::<ItemQuery>().unwrap(),
            ItemQuery::Name("+12".to_string())
        );
    }

    #[test]
    fn test_query_deserialize() {
        let queries: Vec<ItemQuery> =
            serde_yaml::from_str("- 1127\n- \"Rune 2h sword\"\n- \"561\"\n").unwrap();
        assert_eq!(
            queries,
            vec![
                ItemQuery::Id(1127),
                ItemQuery::Name("Rune 2h sword".to_string()),
                ItemQuery::Id(561),
            ]
        );
    }

    #[test]
    fn test_parse_document_with_text_and_numeric_prices() {
        let parsed = parse_document(4151, &document("Abyssal whip", r#""2.3m""#)).unwrap();
        assert_eq!(parsed, ParsedItem::new(4151, "Abyssal whip", "x", 2_300_000));

        let parsed = parse_document(561, &document("Nature rune", "205")).unwrap();
        assert_eq!(parsed.current_price, 205);

        let parsed = parse_document(1127, &document("Rune platebody", r#""38,812""#)).unwrap();
        assert_eq!(parsed.current_price, 38_812);
    }

    #[test]
    fn test_parse_document_rejects_other_shapes() {
        let err = parse_document(1, "   ").unwrap_err();
        assert!(matches!(err, ItemError::Fetch(FetchError::Empty { id: 1 })));

        let err = parse_document(1, r#"{"item": {"name": "Whip"}}"#).unwrap_err();
        assert!(matches!(err, ItemError::Fetch(FetchError::Malformed { .. })));

        let err = parse_document(1, "<html>Not found</html>").unwrap_err();
        assert!(matches!(err, ItemError::Fetch(_)));

        let err = parse_document(1, &document("Whip", r#""2.3b""#)).unwrap_err();
        assert!(matches!(err, ItemError::Format(_)));

        let err = parse_document(1, &document("Whip", "-4")).unwrap_err();
        assert!(matches!(err, ItemError::Format(_)));
    }

    #[test]
    fn test_parse_document_keeps_prices_in_range() {
        let parsed = parse_document(1, &document("Coins", "2147483647")).unwrap();
        assert_eq!(parsed.current_price, 2_147_483_647);

        let err = parse_document(1, &document("Whip", "9223372036854775807")).unwrap_err();
        assert!(matches!(err, ItemError::Format(_)));

        let err = parse_document(1, &document("Whip", r#""9223372036854775807""#)).unwrap_err();
        assert!(matches!(err, ItemError::Format(_)));
        assert!(err.to_string().contains("price is out of range"));

        let err = parse_document(1, &document("Whip", r#""-1.5k""#)).unwrap_err();
        assert!(matches!(err, ItemError::Format(_)));
    }

    #[tokio::test]
    async fn test_out_of_range_price_is_a_failed_outcome() {
        let fetcher = StubFetcher::default().with(4151, &document("Abyssal whip", r#""9999m""#));
        let outcome = resolver(fetcher).resolve_outcome(ItemQuery::Id(4151)).await;

        assert!(outcome.is_failed());
        assert!(matches!(outcome.error(), Some(ItemError::Format(_))));
        assert_eq!(outcome.current_price(), 0);
    }

    #[tokio::test]
    async fn test_resolve_enriches_with_reference_data() {
        let fetcher = StubFetcher::default().with(4151, &document("Abyssal whip", r#""2.3m""#));
        let record = resolver(fetcher).resolve(&ItemQuery::Id(4151)).await.unwrap();

        assert_eq!(record.id(), 4151);
        assert_eq!(record.name(), "Abyssal whip");
        assert_eq!(record.image(), "x");
        assert_eq!(record.current_price(), 2_300_000);
        assert_eq!(record.high_alch(), 1);
        assert_eq!(record.low_alch(), 1);
        assert_eq!(record.buy_limit(), 8);
    }

    #[tokio::test]
    async fn test_resolve_by_name_uses_catalog_id() {
        let fetcher = StubFetcher::default().with(4151, &document("Abyssal whip", r#""2.3m""#));
        let resolver = resolver(fetcher);
        let record = resolver
            .resolve(&ItemQuery::Name("abyssal WHIP".to_string()))
            .await
            .unwrap();
        assert_eq!(record.id(), 4151);
        assert_eq!(record.buy_limit(), 8);
    }

    #[tokio::test]
    async fn test_unknown_name_still_fetches_id_zero() {
        let fetcher = Arc::new(StubFetcher::default());
        let catalog = ReferenceCatalog::from_json_str(WHIP_REFERENCE).unwrap();
        let resolver = ItemResolver::new(fetcher.clone(), Arc::new(catalog));

        let outcome = resolver
            .resolve_outcome(ItemQuery::Name("Dragon claws".to_string()))
            .await;

        assert!(outcome.is_failed());
        assert_eq!(outcome.id(), 0);
        assert_eq!(*fetcher.requests.lock().unwrap(), vec![0]);
    }

    #[tokio::test]
    async fn test_missing_reference_data_is_zero_filled() {
        let fetcher = StubFetcher::default().with(20997, &document("Twisted bow", r#""1.2m""#));
        let record = resolver(fetcher).resolve(&ItemQuery::Id(20997)).await.unwrap();
        assert_eq!(record.current_price(), 1_200_000);
        assert_eq!(record.buy_limit(), 0);
        assert_eq!(record.high_alch(), 0);
        assert_eq!(record.low_alch(), 0);
    }

    #[tokio::test]
    async fn test_empty_response_is_a_failed_outcome() {
        let fetcher = StubFetcher::default().with(4151, "");
        let outcome = resolver(fetcher).resolve_outcome(ItemQuery::Id(4151)).await;

        assert!(outcome.is_failed());
        assert!(outcome.record().is_none());
        assert!(matches!(
            outcome.error(),
            Some(ItemError::Fetch(FetchError::Empty { id: 4151 }))
        ));
        assert_eq!(outcome.id(), 4151);
        assert_eq!(outcome.name(), "");
        assert_eq!(outcome.image(), "");
        assert_eq!(outcome.current_price(), 0);
        assert_eq!(outcome.high_alch(), 0);
        assert_eq!(outcome.low_alch(), 0);
        assert_eq!(outcome.buy_limit(), 0);
        assert!(outcome.into_result().is_err());
    }

    #[tokio::test]
    async fn test_unreachable_catalogue_is_a_fetch_error() {
        let err = resolver(StubFetcher::default())
            .resolve(&ItemQuery::Id(4151))
            .await
            .unwrap_err();
        assert!(matches!(err, ItemError::Fetch(FetchError::Unreachable { id: 4151, .. })));
        assert!(err.to_string().contains("connection refused"));
    }

    #[tokio::test]
    async fn test_enriched_outcome_accessors() {
        let fetcher = StubFetcher::default().with(4151, &document("Abyssal whip", r#""2.3m""#));
        let outcome = resolver(fetcher).resolve_outcome(ItemQuery::Id(4151)).await;
        assert!(!outcome.is_failed());
        assert!(outcome.error().is_none());
        assert_eq!(outcome.current_price(), 2_300_000);
        assert_eq!(outcome.buy_limit(), 8);
        assert_eq!(outcome.into_result().unwrap().name(), "Abyssal whip");
    }
}
