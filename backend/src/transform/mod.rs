//! Order grouping and cost reconciliation.
//!
//! - Shipping: one record per buyer
//! - Accounts: one record per order number
//! - Costs: unit cost lookup for accounts line items
//! - Pipeline: load, group, resolve and write in one call

pub mod accounts;
pub mod costs;
pub mod keyed;
pub mod pipeline;
pub mod shipping;

pub use accounts::group_by_transaction;
pub use costs::{resolve_costs, CostTable};
pub use pipeline::*;
pub use shipping::group_by_buyer;
