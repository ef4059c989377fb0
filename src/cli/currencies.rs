use super::ui;
use crate::core::currency::{Currency, CurrencyRateProvider};
use anyhow::Result;
use comfy_table::Cell;

pub fn currencies_table(currencies: &[Currency]) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![ui::header_cell("Code"), ui::header_cell("Name")]);
    for currency in currencies {
        table.add_row(vec![
            Cell::new(&currency.short_code),
            Cell::new(&currency.name),
        ]);
    }
    table.to_string()
}

/// Lists every currency the provider supports.
pub async fn run(provider: &dyn CurrencyRateProvider) -> Result<()> {
    let spinner = ui::new_spinner("Loading currencies...");
    let result = provider.fetch_currencies().await;
    spinner.finish_and_clear();

    let currencies = result?;
    if currencies.is_empty() {
        println!("No currencies available.");
        return Ok(());
    }

    println!(
        "{} ({})",
        ui::style_text("Currencies", ui::StyleType::Title),
        currencies.len()
    );
    println!("{}", currencies_table(&currencies));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_currencies_table() {
        let currencies = vec![
            Currency {
                id: 1,
                short_code: "EUR".to_string(),
                name: "Euro".to_string(),
            },
            Currency {
                id: 2,
                short_code: "PLN".to_string(),
                name: "Polish Zloty".to_string(),
            },
        ];
        let table = currencies_table(&currencies);
        assert!(table.contains("EUR"));
        assert!(table.contains("Polish Zloty"));
    }
}
