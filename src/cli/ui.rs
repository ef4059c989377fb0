use crate::core::converter::{ConverterView, FieldView};
use crate::core::state::Side;
use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Defines different styles for text elements.
pub enum StyleType {
    Title,
    Label,
    Value,
    Error,
    Subtle,
}

/// Applies a consistent style to a string.
pub fn style_text(text: &str, style_type: StyleType) -> String {
    let styled = match style_type {
        StyleType::Title => style(text).bold().underlined(),
        StyleType::Label => style(text).bold(),
        StyleType::Value => style(text).green().bold(),
        StyleType::Error => style(text).red(),
        StyleType::Subtle => style(text).dim(),
    };
    styled.to_string()
}

/// Creates a new `comfy_table::Table` with standard styling.
pub fn new_styled_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Creates a styled header cell for a table.
pub fn header_cell(text: &str) -> Cell {
    Cell::new(text)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

/// Creates a spinner shown while something loads.
pub fn new_spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(spinner_style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}")
    {
        spinner.set_style(spinner_style);
    }
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

fn amount_cell(field: &FieldView, active: bool) -> Cell {
    let text = if field.amount.is_empty() {
        "0.00".to_string()
    } else {
        field.amount.clone()
    };
    let cell = Cell::new(text).set_alignment(CellAlignment::Right);
    match (active, field.amount.is_empty()) {
        (_, true) => cell.fg(Color::DarkGrey),
        (true, false) => cell.add_attribute(Attribute::Bold),
        (false, false) => cell.fg(Color::Green),
    }
}

/// Renders both converter fields, the rate label and the status line.
pub fn render_view(view: &ConverterView) -> String {
    let mut table = new_styled_table();
    table.set_header(vec![
        header_cell("#"),
        header_cell("Amount"),
        header_cell("Currency"),
    ]);
    for (index, side) in [Side::First, Side::Second].into_iter().enumerate() {
        let field = view.field(side);
        let marker = if view.active == side { "›" } else { " " };
        table.add_row(vec![
            Cell::new(format!("{marker}{}", index + 1)),
            amount_cell(field, view.active == side),
            Cell::new(&field.currency),
        ]);
    }

    let mut output = String::new();
    if let Some(label) = &view.rate_label {
        output.push_str(&style_text(label, StyleType::Title));
        output.push('\n');
    }
    output.push_str(&table.to_string());

    if let Some(error) = &view.error {
        output.push('\n');
        output.push_str(&style_text(error, StyleType::Error));
    }
    if let Some(updated) = view.last_updated {
        output.push('\n');
        output.push_str(&style_text(
            &format!("Last updated: {}", updated.format("%H:%M:%S")),
            StyleType::Subtle,
        ));
    }
    output
}

/// Prints a separator line matching the terminal width.
pub fn print_separator() {
    let term_width = console::Term::stdout()
        .size_checked()
        .map(|(_, w)| w as usize)
        .unwrap_or(80);
    println!("\n{}", "─".repeat(term_width));
}
