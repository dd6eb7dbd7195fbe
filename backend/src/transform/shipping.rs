//! Group order rows into one shipping record per buyer.
//!
//! A buyer may have a single-item order (one row with a title) or a group
//! order (a header row with an empty title followed by one row per item).
//! Both collapse into one label line:
//!
//! ```text
//! Export rows                              →  Shipping records
//! ┌───────────────────────────────────┐      ┌──────────────────────────────┐
//! │ alice, "Mug [MUG-01]", 2          │  →   │ alice: [MUG-01]x2, 2         │
//! │ bob,   "",            (header)    │      ├──────────────────────────────┤
//! │ bob,   "Cup [CUP-02]", 1          │  →   │ bob: [CUP-02]x1/[MUG-01]x3/, │
//! │ bob,   "Mug [MUG-01]", 3          │      │      4                       │
//! └───────────────────────────────────┘      └──────────────────────────────┘
//! ```
//!
//! Address fields always come from the first row seen for a buyer.

use crate::error::{PipelineError, PipelineResult};
use crate::models::{OrderRow, ShippingRecord};
use crate::parser::fields::{extract_item_code, parse_quantity};

use super::keyed::OrderedGroups;

/// Fold order rows into shipping records, in first-seen buyer order.
///
/// Rows without a buyer username are skipped. A title without an item code
/// or an unreadable quantity aborts the whole grouping.
pub fn group_by_buyer(rows: &[OrderRow]) -> PipelineResult<Vec<ShippingRecord>> {
    let mut buyers: OrderedGroups<ShippingRecord> = OrderedGroups::new();

    for row in rows {
        if row.buyer_username.is_empty() {
            continue;
        }

        let at_line = |e| PipelineError::at_line(row.line, e);

        if let Some(record) = buyers.get_mut(&row.buyer_username) {
            // A repeated group header adds nothing
            if row.is_group_header() {
                continue;
            }
            let code = extract_item_code(&row.item_title).map_err(at_line)?;
            let quantity = parse_quantity(&row.quantity).map_err(at_line)?;
            record.add_item(code, &row.quantity, quantity).map_err(at_line)?;
        } else {
            let record = if row.is_group_header() {
                ShippingRecord::from_row(row)
            } else {
                let code = extract_item_code(&row.item_title).map_err(at_line)?;
                let quantity = parse_quantity(&row.quantity).map_err(at_line)?;
                ShippingRecord::from_item_row(row, code, quantity)
            };
            buyers.insert(&row.buyer_username, record);
        }
    }

    Ok(buyers.into_records())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FieldError;

    fn row(username: &str, title: &str, quantity: &str) -> OrderRow {
        OrderRow {
            buyer_username: username.into(),
            post_to_name: format!("{} name", username),
            address_1: format!("{} street", username),
            item_title: title.into(),
            quantity: quantity.into(),
            ..OrderRow::default()
        }
    }

    #[test]
    fn test_single_item_order() {
        let records = group_by_buyer(&[row("alice", "Blue Mug [MUG-01]", "2")]).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].item_title, "[MUG-01]x2");
        assert_eq!(records[0].quantity, 2);
        assert_eq!(records[0].post_to_name, "alice name");
    }

    #[test]
    fn test_group_order_collapses() {
        let rows = vec![
            row("bob", "", ""),
            row("bob", "Cup [CUP-02]", "1"),
            row("bob", "Mug [MUG-01]", "3"),
        ];
        let records = group_by_buyer(&rows).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].item_title, "[CUP-02]x1/[MUG-01]x3/");
        assert_eq!(records[0].quantity, 4);
    }

    #[test]
    fn test_first_row_address_wins() {
        let mut second = row("alice", "Plate [PL-1]", "1");
        second.address_1 = "somewhere else".into();
        let rows = vec![row("alice", "Mug [MUG-01]", "1"), second];

        let records = group_by_buyer(&rows).unwrap();
        assert_eq!(records[0].address_1, "alice street");
        assert_eq!(records[0].item_title, "[MUG-01]x1[PL-1]x1/");
    }

    #[test]
    fn test_empty_username_skipped() {
        let rows = vec![row("", "Mug [MUG-01]", "1"), row("alice", "Mug [MUG-01]", "1")];
        let records = group_by_buyer(&rows).unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_repeated_header_is_noop() {
        let rows = vec![
            row("bob", "", ""),
            row("bob", "Cup [CUP-02]", "1"),
            row("bob", "", ""),
        ];
        let records = group_by_buyer(&rows).unwrap();
        assert_eq!(records[0].item_title, "[CUP-02]x1/");
        assert_eq!(records[0].quantity, 1);
    }

    #[test]
    fn test_header_only_buyer_kept() {
        let records = group_by_buyer(&[row("carol", "", "")]).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].item_title, "");
        assert_eq!(records[0].quantity, 0);
    }

    #[test]
    fn test_first_seen_order() {
        let rows = vec![
            row("zed", "A [A]", "1"),
            row("amy", "B [B]", "1"),
            row("zed", "C [C]", "1"),
        ];
        let records = group_by_buyer(&rows).unwrap();
        assert_eq!(records[0].post_to_name, "zed name");
        assert_eq!(records[1].post_to_name, "amy name");
    }

    #[test]
    fn test_quantity_total_beyond_u32() {
        let rows = vec![
            row("a", "Crate [CR-1]", "4000000000"),
            row("a", "Crate [CR-1]", "4000000000"),
        ];
        let records = group_by_buyer(&rows).unwrap();
        assert_eq!(records[0].quantity, 8_000_000_000);
        assert_eq!(records[0].item_title, "[CR-1]x4000000000[CR-1]x4000000000/");
    }

    #[test]
    fn test_malformed_title_aborts() {
        let mut bad = row("alice", "Blue Mug", "1");
        bad.line = 4;
        let err = group_by_buyer(&[bad]).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Field { line: 4, source: FieldError::MalformedTitle(_) }
        ));
    }

    #[test]
    fn test_malformed_quantity_aborts() {
        let rows = vec![row("bob", "", ""), row("bob", "Cup [CUP-02]", "")];
        let err = group_by_buyer(&rows).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Field { source: FieldError::MalformedQuantity(_), .. }
        ));
    }
}
