use anyhow::Result;
use chrono::NaiveDate;
use comfy_table::Cell;

use super::ui;
use crate::core::{FxRateService, RateTable};

pub fn display_as_table(table: &RateTable, date: Option<NaiveDate>) -> String {
    let title = match date {
        Some(date) => format!("EUR reference rates on {date}"),
        None => "EUR reference rates".to_string(),
    };
    let mut output = format!("{}\n\n", ui::style_text(&title, ui::StyleType::Title));

    if table.is_empty() {
        output.push_str(&ui::style_text(
            "No rates available for the requested currencies",
            ui::StyleType::Error,
        ));
        return output;
    }

    let mut rows = ui::new_styled_table();
    rows.set_header(vec![
        ui::header_cell("Currency"),
        ui::header_cell("Date"),
        ui::header_cell("Rate"),
    ]);
    for (currency, rates) in table {
        for (day, rate) in rates {
            rows.add_row(vec![
                Cell::new(currency.as_str()),
                Cell::new(day),
                ui::rate_cell(rate),
            ]);
        }
    }
    output.push_str(&rows.to_string());
    output.push_str(&format!(
        "\n\n{}",
        ui::style_text("Units of currency per 1 EUR", ui::StyleType::Subtle)
    ));
    output
}

pub async fn run(
    service: &FxRateService,
    date: Option<NaiveDate>,
    currency: Option<&str>,
    json: bool,
) -> Result<()> {
    let pb = ui::new_spinner("Fetching rates...");
    let result = service.get_rates(date, currency).await;
    pb.finish_and_clear();
    let table = result?;

    if json {
        println!("{}", serde_json::to_string_pretty(&table)?);
    } else {
        println!("{}", display_as_table(&table, date));
    }
    Ok(())
}
