use super::ui;
use crate::core::{
    AlchMode, CatalystOracle, ItemQuery, ItemRecord, ItemResolver, ProfitabilityRanker,
};
use anyhow::{Context, Result};
use comfy_table::Cell;

/// Renders one record and its net profit for `mode`.
pub fn display_record(record: &ItemRecord, mode: AlchMode, net_profit: i64) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![ui::header_cell("Field"), ui::header_cell("Value")]);

    let known = record.high_alch() > 0 || record.low_alch() > 0;
    let reference_cell = |value: i64| {
        if known {
            ui::coins_cell(value)
        } else {
            ui::unknown_cell()
        }
    };

    table.add_row(vec![Cell::new("Id"), Cell::new(record.id())]);
    table.add_row(vec![Cell::new("Price"), ui::coins_cell(record.current_price())]);
    table.add_row(vec![Cell::new("High alch"), reference_cell(record.high_alch())]);
    table.add_row(vec![Cell::new("Low alch"), reference_cell(record.low_alch())]);
    table.add_row(vec![Cell::new("Buy limit"), reference_cell(record.buy_limit())]);
    table.add_row(vec![
        Cell::new(format!("Net profit ({mode} alch)")),
        ui::profit_cell(net_profit),
    ]);

    let mut output = format!(
        "Item: {}\n",
        ui::style_text(record.name(), ui::StyleType::Title)
    );
    if !record.image().is_empty() {
        output.push_str(&ui::style_text(record.image(), ui::StyleType::Subtle));
        output.push('\n');
    }
    output.push('\n');
    output.push_str(&table.to_string());
    output
}

pub async fn report(
    resolver: &ItemResolver,
    oracle: &dyn CatalystOracle,
    query: &ItemQuery,
    mode: AlchMode,
) -> Result<String> {
    let record = resolver
        .resolve(query)
        .await
        .with_context(|| format!("Failed to resolve item {query}"))?;

    let net_profit = ProfitabilityRanker::new(oracle)
        .net_profit(&record, mode)
        .await
        .context("Failed to fetch catalyst price")?;

    Ok(display_record(&record, mode, net_profit))
}
