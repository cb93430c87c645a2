use super::ui;
use crate::core::{CatalystOracle, ItemQuery, ItemRecord, ItemResolver, ProfitabilityRanker};
use anyhow::{Context, Result};
use comfy_table::Cell;

// Ties go to the first item.
fn verdict(first: &ItemRecord, second: &ItemRecord, first_is_better: bool) -> String {
    let (winner, loser) = if first_is_better {
        (first, second)
    } else {
        (second, first)
    };
    format!(
        "{} is a better alch than {}",
        ui::style_text(winner.name(), ui::StyleType::Highlight),
        ui::style_text(loser.name(), ui::StyleType::Label)
    )
}

pub async fn report(
    resolver: &ItemResolver,
    oracle: &dyn CatalystOracle,
    first: &ItemQuery,
    second: &ItemQuery,
) -> Result<String> {
    let (a, b) = futures::join!(resolver.resolve(first), resolver.resolve(second));
    let a = a.with_context(|| format!("Failed to resolve item {first}"))?;
    let b = b.with_context(|| format!("Failed to resolve item {second}"))?;

    let first_is_better = ProfitabilityRanker::new(oracle)
        .better_than(&a, &b)
        .await
        .context("Failed to fetch catalyst price")?;

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Item"),
        ui::header_cell("Price"),
        ui::header_cell("High alch"),
    ]);
    for record in [&a, &b] {
        table.add_row(vec![
            Cell::new(record.name()),
            ui::coins_cell(record.current_price()),
            ui::coins_cell(record.high_alch()),
        ]);
    }

    Ok(format!("{table}\n\n{}", verdict(&a, &b, first_is_better)))
}
