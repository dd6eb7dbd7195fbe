//! Unit cost lookup and resolution against transaction line items.
//!
//! The cost table is a CSV with `Item` (bare item code) and `Cost` columns.
//! Codes are stored bracketed (`MUG-01` → `[MUG-01]`) to match what
//! [`crate::parser::fields::extract_item_code`] returns.

use rust_decimal::Decimal;
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;

use crate::logs::log_warning;
use crate::error::CsvResult;
use crate::models::{Cost, TransactionRecord};
use crate::parser::fields::parse_quantity;
use crate::parser::{read_table_bytes, read_table_file, Table};

/// Item code to unit cost. Read-only once loaded.
#[derive(Debug, Clone, Default)]
pub struct CostTable {
    /// `None` for entries whose cost is not a number
    entries: HashMap<String, Option<Decimal>>,
}

impl CostTable {
    /// Build from (bare code, cost text) pairs. Later duplicates win.
    pub fn from_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let entries = entries
            .into_iter()
            .map(|(item, cost)| {
                let key = format!("[{}]", item.as_ref());
                let cost = Decimal::from_str(cost.as_ref().trim()).ok();
                (key, cost)
            })
            .collect();
        Self { entries }
    }

    /// Build from a decoded table with `Item` and `Cost` columns.
    pub fn from_table(table: &Table) -> CsvResult<Self> {
        let item = table.column("Item")?;
        let cost = table.column("Cost")?;

        let pairs = table
            .records
            .iter()
            .map(|r| (r.get(item).unwrap_or(""), r.get(cost).unwrap_or("")));
        let costs = Self::from_entries(pairs);

        let invalid = costs.invalid_codes();
        if !invalid.is_empty() {
            log_warning(format!(
                "{} cost entries are not numbers: {}",
                invalid.len(),
                invalid.join(", ")
            ));
        }
        Ok(costs)
    }

    /// Load a cost table file.
    pub fn load<P: AsRef<Path>>(path: P) -> CsvResult<Self> {
        Self::from_table(&read_table_file(path)?)
    }

    /// Load a cost table from raw bytes.
    pub fn from_bytes(bytes: &[u8]) -> CsvResult<Self> {
        Self::from_table(&read_table_bytes(bytes)?)
    }

    /// Unit cost for a bracketed code, if present and numeric.
    pub fn unit_cost(&self, code: &str) -> Option<Decimal> {
        self.entries.get(code).copied().flatten()
    }

    /// Cost of `quantity` units of `code`. Unresolved when the code is
    /// missing, the quantity unreadable, or the product too large.
    pub fn resolve(&self, code: &str, quantity: &str) -> Cost {
        match (self.unit_cost(code), parse_quantity(quantity)) {
            (Some(unit), Ok(qty)) => unit
                .checked_mul(Decimal::from(qty))
                .map_or(Cost::Unresolved, Cost::Resolved),
            _ => Cost::Unresolved,
        }
    }

    /// Bracketed codes whose cost could not be read, sorted.
    pub fn invalid_codes(&self) -> Vec<&str> {
        let mut codes: Vec<&str> = self
            .entries
            .iter()
            .filter(|(_, cost)| cost.is_none())
            .map(|(code, _)| code.as_str())
            .collect();
        codes.sort_unstable();
        codes
    }

    /// Entries in code order, for display.
    pub fn sorted_entries(&self) -> Vec<(&str, Option<Decimal>)> {
        let mut entries: Vec<_> = self
            .entries
            .iter()
            .map(|(code, cost)| (code.as_str(), *cost))
            .collect();
        entries.sort_unstable_by(|a, b| a.0.cmp(b.0));
        entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Fill in the cost of every line item. Returns how many stayed unresolved.
pub fn resolve_costs(records: &mut [TransactionRecord], table: &CostTable) -> usize {
    let mut unresolved = 0;
    for item in records.iter_mut().flat_map(|r| r.items.iter_mut()) {
        item.cost = table.resolve(&item.code, &item.quantity);
        if !item.cost.is_resolved() {
            unresolved += 1;
        }
    }
    unresolved
}
