use crate::core::Currency;
use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use rust_decimal::Decimal;
use std::time::Duration;

/// Defines different styles for text elements.
pub enum StyleType {
    Title,
    Error,
    Subtle,
}

/// Applies a consistent style to a string.
pub fn style_text(text: &str, style_type: StyleType) -> String {
    let styled = match style_type {
        StyleType::Title => style(text).bold().underlined(),
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

/// Formats a minor-unit amount of `currency` in major units, keeping the
/// two stored fractional digits of the minor unit. Zero is shown as "N/A".
pub fn amount_cell(amount: Decimal, currency: Currency) -> Cell {
    if amount.is_zero() {
        return Cell::new("N/A")
            .fg(Color::DarkGrey)
            .set_alignment(CellAlignment::Right);
    }
    let major = amount / currency.minor_units();
    let places = currency.minor_exponent() as usize + 2;
    Cell::new(format!("{major:.places$}"))
        .fg(Color::Green)
        .set_alignment(CellAlignment::Right)
}

/// Creates a spinner for work of unknown length.
pub fn new_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg} [{elapsed_precise}]")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}
