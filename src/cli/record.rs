use super::ui;
use crate::core::{Currency, PriceError, PriceRecord};
use comfy_table::Cell;

impl PriceRecord {
    pub fn display_as_table(&self) -> String {
        let mut table = ui::new_styled_table();
        table.set_header(vec![ui::header_cell("Currency"), ui::header_cell("Price")]);

        for currency in Currency::ALL {
            let label = if currency == Currency::REFERENCE {
                format!("{currency} (base)")
            } else {
                currency.to_string()
            };
            let amount = if currency == Currency::REFERENCE && self.price(currency).is_zero() {
                self.base_price
            } else {
                self.price(currency)
            };
            table.add_row(vec![Cell::new(label), ui::amount_cell(amount, currency)]);
        }

        format!(
            "{} {}\n\n{}",
            ui::style_text(&self.name, ui::StyleType::Title),
            ui::style_text(&format!("({})", self.item_id), ui::StyleType::Subtle),
            table
        )
    }
}

/// One line summary of a failed lookup for `item_id`.
pub fn display_error(item_id: &str, error: &PriceError) -> String {
    ui::style_text(&format!("{item_id}: {error}"), ui::StyleType::Error)
}
