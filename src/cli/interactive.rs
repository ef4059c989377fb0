use super::{currencies::currencies_table, ui};
use crate::core::converter::{Converter, ConverterSettings, ConverterView};
use crate::core::currency::CurrencyRateProvider;
use crate::core::state::Side;
use anyhow::{Result, anyhow};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

const HELP: &str = "\
Commands:
  1 <amount>     type into the first field (empty clears both)
  2 <amount>     type into the second field
  1 @<CODE>      switch the first field's currency
  2 @<CODE>      switch the second field's currency
  list           show available currencies
  help           show this help
  quit           exit";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Amount(Side, String),
    Currency(Side, String),
    List,
    Help,
    Quit,
}

pub fn parse_command(line: &str) -> Result<Command> {
    let line = line.trim();
    match line {
        "list" => return Ok(Command::List),
        "help" | "?" => return Ok(Command::Help),
        "quit" | "exit" | "q" => return Ok(Command::Quit),
        _ => {}
    }

    let (field, rest) = line.split_once(' ').unwrap_or((line, ""));
    let side = match field {
        "1" => Side::First,
        "2" => Side::Second,
        _ => return Err(anyhow!("Unknown command: {line}")),
    };
    let rest = rest.trim();
    match rest.strip_prefix('@') {
        Some(code) if !code.trim().is_empty() => {
            Ok(Command::Currency(side, code.trim().to_uppercase()))
        }
        Some(_) => Err(anyhow!("Missing currency code")),
        None => Ok(Command::Amount(side, rest.to_string())),
    }
}

fn print_view(view: &ConverterView) {
    ui::print_separator();
    println!("{}", ui::render_view(view));
}

/// Runs the converter against stdin until `quit` or end of input.
pub async fn run(
    settings: ConverterSettings,
    provider: Arc<dyn CurrencyRateProvider>,
) -> Result<()> {
    let mut handle = Converter::spawn(settings, provider);
    let mut views = handle.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    let spinner = ui::new_spinner("Loading currencies...");
    let loaded = handle.loaded(std::time::Duration::from_secs(30)).await;
    spinner.finish_and_clear();
    let view = loaded?;
    if !view.inputs_enabled {
        println!(
            "{}",
            ui::style_text(
                "Currency list unavailable, conversions may fail.",
                ui::StyleType::Error
            )
        );
    }
    println!("{HELP}");
    print_view(&view);

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if line.trim().is_empty() {
                    continue;
                }
                match parse_command(&line) {
                    Ok(Command::Amount(side, text)) => handle.on_amount_change(side, &text),
                    Ok(Command::Currency(side, code)) => handle.on_currency_change(side, &code),
                    Ok(Command::List) => println!("{}", currencies_table(&handle.view().currencies)),
                    Ok(Command::Help) => println!("{HELP}"),
                    Ok(Command::Quit) => break,
                    Err(e) => println!("{}", ui::style_text(&e.to_string(), ui::StyleType::Error)),
                }
            }
            changed = views.changed() => {
                if changed.is_err() {
                    break;
                }
                let view = views.borrow_and_update().clone();
                debug!(?view, "View changed");
                if !view.pending {
                    print_view(&view);
                }
            }
        }
    }

    handle.shutdown().await;
    Ok(())
}
