//! Parsers for the loosely formatted text fields of an order row.

use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use std::str::FromStr;

use crate::error::{FieldError, FieldResult};

/// First `<digits>.<two digits>` run in a currency field.
static AMOUNT_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[0-9]*\.[0-9]{2}").expect("amount pattern is valid"));

/// Shortest `[...]` run that stays on one line.
static ITEM_CODE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[[^\n]*?\]").expect("item code pattern is valid"));

/// Prefix that marks a refunded order number.
pub const REFUND_PREFIX: char = 'r';

/// Extract the bracketed item code from a title, brackets included.
///
/// The code runs from a `[` to the nearest `]` after it on the same line.
/// The first such pair wins and text around it is ignored.
///
/// ```ignore
/// assert_eq!(extract_item_code("Blue Mug [MUG-01] 12oz")?, "[MUG-01]");
/// ```
pub fn extract_item_code(title: &str) -> FieldResult<&str> {
    ITEM_CODE_PATTERN
        .find(title)
        .map(|m| m.as_str())
        .ok_or_else(|| FieldError::MalformedTitle(title.to_string()))
}

/// Extract a decimal amount from a currency field such as `$12.50` or `12.50 USD`.
pub fn parse_amount(field: &'static str, value: &str) -> FieldResult<Decimal> {
    let malformed = || FieldError::MalformedAmount {
        field,
        value: value.to_string(),
    };

    let digits = AMOUNT_PATTERN.find(value).ok_or_else(malformed)?.as_str();
    // ".99" has no integer part
    let normalized = if digits.starts_with('.') {
        format!("0{}", digits)
    } else {
        digits.to_string()
    };
    Decimal::from_str(&normalized).map_err(|_| malformed())
}

/// Parse a quantity as a non-negative integer, ignoring surrounding spaces.
pub fn parse_quantity(value: &str) -> FieldResult<u32> {
    value
        .trim()
        .parse::<u32>()
        .map_err(|_| FieldError::MalformedQuantity(value.to_string()))
}

/// Whether an order number marks a refund.
pub fn is_refund(order_number: &str) -> bool {
    order_number.starts_with(REFUND_PREFIX)
}
