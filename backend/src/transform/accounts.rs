//! Group order rows into one bookkeeping record per order number.
//!
//! The row that opens an order fixes its monetary totals:
//!
//! - a single-item row carries a unit price, so `sold for = price × quantity`
//! - a group header row (empty title) already carries the order total
//!
//! Later rows with the same order number only add line items. Refund orders
//! (order number starting with `r`) never reach the accounts sheet.

use rust_decimal::Decimal;

use crate::error::{FieldError, PipelineError, PipelineResult};
use crate::models::{LineItem, OrderRow, TransactionRecord};
use crate::parser::fields::{extract_item_code, is_refund, parse_amount, parse_quantity};

use super::keyed::OrderedGroups;

/// Fold order rows into transaction records, in first-seen order.
///
/// Costs are left unresolved; see [`super::costs::resolve_costs`].
pub fn group_by_transaction(rows: &[OrderRow]) -> PipelineResult<Vec<TransactionRecord>> {
    let mut orders: OrderedGroups<TransactionRecord> = OrderedGroups::new();

    for row in rows {
        if row.order_number.is_empty() || is_refund(&row.order_number) {
            continue;
        }

        let at_line = |e| PipelineError::at_line(row.line, e);

        if let Some(record) = orders.get_mut(&row.order_number) {
            if row.is_group_header() {
                continue;
            }
            let code = extract_item_code(&row.item_title).map_err(at_line)?;
            record.items.push(LineItem::new(code, row.quantity.as_str()));
        } else {
            let sold_for = parse_amount("Sold For", &row.sold_for).map_err(at_line)?;
            let postage = parse_amount("Postage And Handling", &row.postage_and_handling).map_err(at_line)?;

            let (items, sold_for) = if row.is_group_header() {
                (Vec::new(), sold_for)
            } else {
                let code = extract_item_code(&row.item_title).map_err(at_line)?;
                let quantity = parse_quantity(&row.quantity).map_err(at_line)?;
                let total = sold_for
                    .checked_mul(Decimal::from(quantity))
                    .ok_or_else(|| {
                        at_line(FieldError::MalformedAmount {
                            field: "Sold For",
                            value: row.sold_for.clone(),
                        })
                    })?;
                (vec![LineItem::new(code, row.quantity.as_str())], total)
            };

            let record = TransactionRecord {
                order_number: row.order_number.clone(),
                buyer_username: row.buyer_username.clone(),
                buyer_name: row.buyer_name.clone(),
                quantity: row.quantity.clone(),
                items,
                sold_for: sold_for.round_dp(2),
                postage_and_handling: postage,
            };
            orders.insert(&row.order_number, record);
        }
    }

    Ok(orders.into_records())
}
