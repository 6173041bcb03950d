//! Display model for the cart panel.

use std::fmt;

use pickngo_core::{CartItemId, CurrencyCode, Price};

use super::selection::SelectionSet;
use crate::api::CartItem;

/// Shown in place of the line list when the cart has no rows.
pub const EMPTY_CART_MESSAGE: &str = "Your cart is empty.";

/// One cart row, formatted for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLineView {
    pub id: CartItemId,
    pub product_name: String,
    pub branch_name: String,
    pub quantity: u32,
    /// Unit price, e.g. `$10.00`.
    pub price: String,
    /// Unit price × quantity, e.g. `$20.00`.
    pub line_price: String,
    pub selected: bool,
}

impl CartLineView {
    fn new(item: &CartItem, selected: bool, currency: CurrencyCode) -> Self {
        let unit = item.unit_price(currency);
        Self {
            id: item.id,
            product_name: item.product_name.clone(),
            branch_name: item.branch_name.clone(),
            quantity: item.quantity,
            price: unit.display(),
            line_price: unit.times(item.quantity).display(),
            selected,
        }
    }
}

/// The whole cart panel, formatted for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartSummary {
    pub lines: Vec<CartLineView>,
    /// State of the "Select All" checkbox.
    pub all_selected: bool,
    /// Sum of quantities across every row.
    pub item_count: u32,
    /// Total of the selected rows, e.g. `$20.00`.
    pub total: String,
}

impl CartSummary {
    pub(super) fn build(
        items: &[CartItem],
        selection: &SelectionSet,
        all_selected: bool,
        total: Price,
    ) -> Self {
        let currency = total.currency_code;
        Self {
            lines: items
                .iter()
                .map(|item| CartLineView::new(item, selection.contains(item.id), currency))
                .collect(),
            all_selected,
            item_count: items
                .iter()
                .fold(0_u32, |acc, item| acc.saturating_add(item.quantity)),
            total: total.display(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl fmt::Display for CartSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Your Cart")?;

        if self.is_empty() {
            writeln!(f, "{EMPTY_CART_MESSAGE}")?;
        } else {
            writeln!(f, "{} Select All", checkbox(self.all_selected))?;
            for line in &self.lines {
                write!(
                    f,
                    "{} #{} {} - {} x {} = {}",
                    checkbox(line.selected),
                    line.id,
                    line.product_name,
                    line.price,
                    line.quantity,
                    line.line_price
                )?;
                if line.branch_name.is_empty() {
                    writeln!(f)?;
                } else {
                    writeln!(f, " ({})", line.branch_name)?;
                }
            }
        }

        write!(f, "Total: {}", self.total)
    }
}

const fn checkbox(checked: bool) -> &'static str {
    if checked { "[x]" } else { "[ ]" }
}
