//! Domain models for the order splitting pipeline.
//!
//! - [`OrderRow`] - One row of the marketplace export
//! - [`ShippingRecord`] - One shipping label line per buyer
//! - [`TransactionRecord`] - One bookkeeping line per order number
//! - [`LineItem`] - An (item code, quantity, cost) entry of a transaction
//! - [`Cost`] - A resolved amount or the unresolved marker

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

use crate::error::{FieldError, FieldResult};

// =============================================================================
// Order Row
// =============================================================================

/// One row of the order export, restricted to the columns the pipeline uses.
///
/// Serialized field names match the export headers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderRow {
    #[serde(rename = "Buyer Username")]
    pub buyer_username: String,
    #[serde(rename = "Post To Name")]
    pub post_to_name: String,
    #[serde(rename = "Buyer Address 1")]
    pub address_1: String,
    #[serde(rename = "Post To Address 2")]
    pub address_2: String,
    #[serde(rename = "Post To City")]
    pub city: String,
    #[serde(rename = "Post To State")]
    pub state: String,
    #[serde(rename = "Post To Postal Code")]
    pub postal_code: String,
    /// Empty on the header row of a group order.
    #[serde(rename = "Item Title")]
    pub item_title: String,
    #[serde(rename = "Quantity")]
    pub quantity: String,
    #[serde(rename = "Buyer Note")]
    pub buyer_note: String,
    /// A leading `r` marks a refund.
    #[serde(rename = "Order Number")]
    pub order_number: String,
    #[serde(rename = "Buyer Name")]
    pub buyer_name: String,
    #[serde(rename = "Sold For")]
    pub sold_for: String,
    #[serde(rename = "Postage And Handling")]
    pub postage_and_handling: String,
    /// Line in the source file (1-based, header is line 1).
    #[serde(skip)]
    pub line: u64,
}

impl OrderRow {
    /// Header row of a multi-item order (no item of its own).
    pub fn is_group_header(&self) -> bool {
        self.item_title.is_empty()
    }
}

// =============================================================================
// Shipping Record
// =============================================================================

/// Shipping label data for one buyer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingRecord {
    pub post_to_name: String,
    pub address_1: String,
    pub address_2: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    /// Accumulated `<code>x<qty>` entries.
    pub item_title: String,
    pub quantity: u64,
    pub buyer_note: String,
}

impl ShippingRecord {
    /// Start a record from the first row seen for a buyer, with no items yet.
    pub fn from_row(row: &OrderRow) -> Self {
        Self {
            post_to_name: row.post_to_name.clone(),
            address_1: row.address_1.clone(),
            address_2: row.address_2.clone(),
            city: row.city.clone(),
            state: row.state.clone(),
            postal_code: row.postal_code.clone(),
            item_title: String::new(),
            quantity: 0,
            buyer_note: row.buyer_note.clone(),
        }
    }

    /// Start a record from a single-item row. Its entry has no trailing `/`.
    pub fn from_item_row(row: &OrderRow, code: &str, quantity: u32) -> Self {
        let mut record = Self::from_row(row);
        record.item_title = format!("{}x{}", code, row.quantity);
        record.quantity = u64::from(quantity);
        record
    }

    /// Append a `<code>x<qty>/` entry and add to the running quantity.
    ///
    /// The record is left untouched when the total would overflow.
    pub fn add_item(&mut self, code: &str, quantity_text: &str, quantity: u32) -> FieldResult<()> {
        self.quantity = self
            .quantity
            .checked_add(u64::from(quantity))
            .ok_or_else(|| FieldError::QuantityOverflow(quantity_text.to_string()))?;
        self.item_title.push_str(code);
        self.item_title.push('x');
        self.item_title.push_str(quantity_text);
        self.item_title.push('/');
        Ok(())
    }

    /// Values in shipping column order.
    pub fn to_record(&self) -> [String; 9] {
        [
            self.post_to_name.clone(),
            self.address_1.clone(),
            self.address_2.clone(),
            self.city.clone(),
            self.state.clone(),
            self.postal_code.clone(),
            self.item_title.clone(),
            self.quantity.to_string(),
            self.buyer_note.clone(),
        ]
    }
}

// =============================================================================
// Cost
// =============================================================================

/// Cost of a line item or a whole transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cost {
    Resolved(Decimal),
    /// No usable entry in the cost table.
    #[default]
    Unresolved,
}

impl Cost {
    /// Text written in place of an unresolved amount.
    pub const UNRESOLVED_MARKER: &'static str = "NA";

    pub fn is_resolved(&self) -> bool {
        matches!(self, Cost::Resolved(_))
    }

    pub fn amount(&self) -> Option<Decimal> {
        match self {
            Cost::Resolved(amount) => Some(*amount),
            Cost::Unresolved => None,
        }
    }

    /// Sum of all costs, rounded to cents. A single unresolved cost, or a sum
    /// too large for a `Decimal`, makes the whole sum unresolved.
    pub fn total<'a>(costs: impl IntoIterator<Item = &'a Cost>) -> Cost {
        costs
            .into_iter()
            .try_fold(Decimal::ZERO, |sum, cost| sum.checked_add(cost.amount()?))
            .map(|sum| Cost::Resolved(sum.round_dp(2)))
            .unwrap_or(Cost::Unresolved)
    }
}

impl fmt::Display for Cost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cost::Resolved(amount) => write!(f, "{}", format_money(*amount)),
            Cost::Unresolved => f.write_str(Self::UNRESOLVED_MARKER),
        }
    }
}

impl Serialize for Cost {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Render an amount with exactly two decimals (`7` -> `7.00`).
pub fn format_money(amount: Decimal) -> String {
    let mut rounded = amount.round_dp(2);
    rounded.rescale(2);
    rounded.to_string()
}

// =============================================================================
// Transaction Record
// =============================================================================

/// One item of a transaction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineItem {
    /// Bracketed item code, e.g. `[MUG-01]`.
    pub code: String,
    /// Quantity as written in the export.
    pub quantity: String,
    pub cost: Cost,
}

impl LineItem {
    pub fn new(code: impl Into<String>, quantity: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            quantity: quantity.into(),
            cost: Cost::Unresolved,
        }
    }
}

/// Bookkeeping data for one order number.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    pub order_number: String,
    pub buyer_username: String,
    pub buyer_name: String,
    /// Quantity text of the row that opened the order.
    pub quantity: String,
    pub items: Vec<LineItem>,
    /// Fixed when the order is first seen.
    pub sold_for: Decimal,
    pub postage_and_handling: Decimal,
}

impl TransactionRecord {
    /// Concatenated `<code>x<qty>/` entries.
    pub fn description(&self) -> String {
        self.items
            .iter()
            .map(|item| format!("{}x{}/", item.code, item.quantity))
            .collect()
    }

    pub fn total_cost(&self) -> Cost {
        Cost::total(self.items.iter().map(|item| &item.cost))
    }

    /// Values in accounts column order.
    pub fn to_record(&self) -> [String; 7] {
        [
            self.order_number.clone(),
            self.buyer_username.clone(),
            self.buyer_name.clone(),
            self.description(),
            self.quantity.clone(),
            format_money(self.sold_for),
            self.total_cost().to_string(),
        ]
    }
}
