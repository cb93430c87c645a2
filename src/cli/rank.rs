use super::ui;
use crate::core::{
    CatalystOracle, ItemOutcome, ItemQuery, ItemResolver, ProfitabilityRanker, Ranking,
    ReferenceCatalog,
};
use anyhow::{Context, Result};
use comfy_table::{Cell, Color};
use futures::future::join_all;
use tracing::{info, warn};

impl Ranking {
    pub fn display_as_table(&self) -> String {
        let mut table = ui::new_styled_table();
        table.set_header(vec![
            ui::header_cell("#"),
            ui::header_cell("Item"),
            ui::header_cell("Price"),
            ui::header_cell("High alch"),
            ui::header_cell("Low alch"),
            ui::header_cell("Buy limit"),
            ui::header_cell("Profit (high)"),
            ui::header_cell("Profit (low)"),
        ]);

        for (position, item) in self.items.iter().enumerate() {
            let record = &item.record;
            table.add_row(vec![
                Cell::new(position + 1),
                Cell::new(record.name()),
                ui::coins_cell(record.current_price()),
                ui::coins_cell(record.high_alch()),
                ui::coins_cell(record.low_alch()),
                ui::coins_cell(record.buy_limit()),
                ui::profit_cell(item.high_profit),
                ui::profit_cell(item.low_profit),
            ]);
        }

        let mut output = format!(
            "{}\n\n",
            ui::style_text("Alch profitability", ui::StyleType::Title)
        );
        output.push_str(&table.to_string());
        output.push_str(&format!(
            "\n\n{}: {}",
            ui::style_text("Nature rune price", ui::StyleType::Label),
            ui::format_coins(self.catalyst_price)
        ));
        if let Some(best) = self.best() {
            output.push_str(&format!(
                "\n{}: {}",
                ui::style_text("Best alch", ui::StyleType::Label),
                ui::style_text(best.record.name(), ui::StyleType::Highlight)
            ));
        }
        output
    }
}

fn failed_item_label(query: &ItemQuery, catalog: &ReferenceCatalog) -> String {
    match query {
        ItemQuery::Id(id) => match catalog.lookup_by_id(*id) {
            Some((name, _)) => format!("{name} ({query})"),
            None => query.to_string(),
        },
        ItemQuery::Name(_) => query.to_string(),
    }
}

/// Lists items that could not be resolved along with the reason. Id queries
/// are labelled with their reference name when the catalog knows it.
pub fn display_failures(failures: &[ItemOutcome], catalog: &ReferenceCatalog) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![ui::header_cell("Item"), ui::header_cell("Error")]);

    for outcome in failures {
        if let ItemOutcome::Failed { query, error, .. } = outcome {
            table.add_row(vec![
                Cell::new(failed_item_label(query, catalog)),
                Cell::new(error).fg(Color::Red),
            ]);
        }
    }

    format!(
        "{}\n\n{}",
        ui::style_text("Failed items", ui::StyleType::Error),
        table
    )
}

pub async fn report(
    resolver: &ItemResolver,
    oracle: &dyn CatalystOracle,
    queries: &[ItemQuery],
) -> Result<String> {
    if queries.is_empty() {
        return Ok(
            "No items to rank. Pass item names or ids, or add a watchlist to the config."
                .to_string(),
        );
    }

    // Step 1: Resolve every item concurrently
    let pb = ui::new_progress_bar(queries.len() as u64);
    pb.set_message("Fetching prices...");

    let outcome_futures = queries.iter().map(|query| {
        let pb_clone = pb.clone();
        async move {
            let outcome = resolver.resolve_outcome(query.clone()).await;
            pb_clone.inc(1);
            outcome
        }
    });
    let outcomes = join_all(outcome_futures).await;
    pb.finish_and_clear();

    let (failures, resolved): (Vec<_>, Vec<_>) =
        outcomes.into_iter().partition(ItemOutcome::is_failed);
    for failure in &failures {
        if let Some(error) = failure.error() {
            warn!(id = failure.id(), %error, "Item could not be resolved");
        }
    }
    let records = resolved
        .into_iter()
        .filter_map(|outcome| outcome.into_result().ok())
        .collect();

    // Step 2: Rank against one live catalyst price
    let ranking = ProfitabilityRanker::new(oracle)
        .rank(records)
        .await
        .context("Failed to fetch catalyst price")?;
    info!(
        ranked = ranking.items.len(),
        failed = failures.len(),
        "Ranking complete"
    );

    let mut output = ranking.display_as_table();
    if !failures.is_empty() {
        output.push_str("\n\n");
        output.push_str(&display_failures(&failures, resolver.catalog()));
    }
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::item::ParsedItem;
    use crate::core::item::tests::{StubFetcher, document};
    use crate::core::ranking::RankedItem;
    use crate::core::{FetchError, FixedCatalyst, ItemRecord, ReferenceEntry};
    use std::sync::Arc;

    #[test]
    fn test_display_ranking() {
        let reference = ReferenceEntry {
            id: 1319,
            high_alch: 38_400,
            low_alch: 25_600,
            buy_limit: 70,
        };
        let record = ItemRecord::from_parsed(
            ParsedItem::new(1319, "Rune 2h sword", "", 37_000),
            Some(&reference),
        );
        let ranking = Ranking {
            catalyst_price: 205,
            items: vec![RankedItem {
                record,
                high_profit: 1_195,
                low_profit: -11_605,
            }],
        };

        let output = console::strip_ansi_codes(&ranking.display_as_table()).to_string();
        assert!(output.contains("Rune 2h sword"));
        assert!(output.contains("37,000"));
        assert!(output.contains("1,195"));
        assert!(output.contains("-11,605"));
        assert!(output.contains("Nature rune price: 205"));
        assert!(output.contains("Best alch: Rune 2h sword"));
    }

    #[test]
    fn test_display_failures() {
        let catalog = ReferenceCatalog::embedded().unwrap();
        let failures = vec![
            ItemOutcome::Failed {
                query: ItemQuery::Name("Dragon claws".to_string()),
                id: 0,
                error: FetchError::Empty { id: 0 }.into(),
            },
            ItemOutcome::Failed {
                query: ItemQuery::Id(4151),
                id: 4151,
                error: FetchError::Empty { id: 4151 }.into(),
            },
            ItemOutcome::Failed {
                query: ItemQuery::Id(99_999),
                id: 99_999,
                error: FetchError::Empty { id: 99_999 }.into(),
            },
        ];

        let output = display_failures(&failures, &catalog);
        let output = console::strip_ansi_codes(&output).to_string();
        assert!(output.contains("Failed items"));
        assert!(output.contains("Dragon claws"));
        assert!(output.contains("Received empty response for item 0"));
        assert!(output.contains("Abyssal whip (#4151)"));
        assert!(output.contains("#99999"));
        assert!(!output.contains("(#99999)"));
    }

    #[tokio::test]
    async fn test_report_ranks_and_lists_failures() {
        let fetcher = StubFetcher::default()
            .with(1319, &document("Rune 2h sword", r#""37,900""#))
            .with(1127, &document("Rune platebody", r#""38,812""#))
            .with(4151, "");
        let catalog = ReferenceCatalog::embedded().unwrap();
        let resolver = ItemResolver::new(Arc::new(fetcher), Arc::new(catalog));
        let queries = vec![
            ItemQuery::Id(1127),
            ItemQuery::Id(4151),
            ItemQuery::Name("rune 2h sword".to_string()),
        ];

        let output = report(&resolver, &FixedCatalyst(205), &queries)
            .await
            .unwrap();
        let output = console::strip_ansi_codes(&output).to_string();

        let sword = output.find("Rune 2h sword").unwrap();
        let platebody = output.find("Rune platebody").unwrap();
        assert!(sword < platebody);
        assert!(output.contains("Best alch: Rune 2h sword"));
        assert!(output.contains("Abyssal whip (#4151)"));
        assert!(output.contains("Received empty response for item 4151"));
    }

    #[tokio::test]
    async fn test_report_without_queries() {
        let resolver = ItemResolver::new(
            Arc::new(StubFetcher::default()),
            Arc::new(ReferenceCatalog::embedded().unwrap()),
        );
        let output = report(&resolver, &FixedCatalyst(205), &[]).await.unwrap();
        assert!(output.starts_with("No items to rank"));
    }
}
