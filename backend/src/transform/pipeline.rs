//! High-level pipeline API: order export in, shipping and accounts sheets out.
//!
//! ```text
//!                 ┌──────────────┐    ┌────────────────┐
//!            ┌──▶ │ group_by_    │ ─▶ │ *_shipping.csv │
//! ┌────────┐ │    │ buyer        │    └────────────────┘
//! │ loader │─┤    └──────────────┘
//! └────────┘ │    ┌──────────────┐    ┌──────────────┐    ┌────────────────┐
//!            └──▶ │ group_by_    │ ─▶ │ resolve_     │ ─▶ │ *_accounts.csv │
//!                 │ transaction  │    │ costs        │    └────────────────┘
//!                 └──────────────┘    └──────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use ordersplit::transform::pipeline::transform;
//! use std::path::Path;
//!
//! let (accounts, shipping) = transform(Path::new("orders/march.csv"), Path::new("cost_lookup.csv"))?;
//! println!("{} / {}", accounts.display(), shipping.display());
//! ```

use serde::Serialize;
use std::path::{Path, PathBuf};

use super::accounts::group_by_transaction;
use super::costs::{resolve_costs, CostTable};
use super::shipping::group_by_buyer;
use crate::logs::{log_info, log_info_indent, log_success, log_warning};
use crate::error::{PipelineError, PipelineResult};
use crate::export::{accounts_path, shipping_path, write_accounts_file, write_shipping_file};
use crate::models::{OrderRow, ShippingRecord, TransactionRecord};
use crate::parser::{load_orders, LoadedOrders};

/// Options for a transform run
#[derive(Debug, Clone)]
pub struct ProcessOptions {
    /// Cost table joined against every line item
    pub cost_table: PathBuf,
}

impl Default for ProcessOptions {
    fn default() -> Self {
        Self {
            cost_table: PathBuf::from(crate::config::DEFAULT_COST_TABLE),
        }
    }
}

/// Both grouped views of one order export.
#[derive(Debug, Clone, Serialize)]
pub struct OrderReport {
    pub shipping: Vec<ShippingRecord>,
    /// Costs already resolved
    pub accounts: Vec<TransactionRecord>,
    /// Line items without a usable cost
    pub unresolved_items: usize,
}

impl OrderReport {
    /// Transactions whose total cost is unresolved.
    pub fn unresolved_transactions(&self) -> usize {
        self.accounts
            .iter()
            .filter(|r| !r.total_cost().is_resolved())
            .count()
    }
}

/// Input file information
#[derive(Debug, Clone, Serialize)]
pub struct CsvInfo {
    pub encoding: String,
    pub delimiter: char,
    pub headers: Vec<String>,
    pub row_count: usize,
}

impl From<&LoadedOrders> for CsvInfo {
    fn from(loaded: &LoadedOrders) -> Self {
        Self {
            encoding: loaded.encoding.clone(),
            delimiter: loaded.delimiter,
            headers: loaded.headers.clone(),
            row_count: loaded.rows.len(),
        }
    }
}

/// Result of a complete run
#[derive(Debug, Clone, Serialize)]
pub struct ProcessOutput {
    pub accounts_path: PathBuf,
    pub shipping_path: PathBuf,
    pub shipping_count: usize,
    pub accounts_count: usize,
    pub unresolved_transactions: usize,
    pub csv_info: CsvInfo,
}

/// Group rows into both views and resolve costs. No I/O.
pub fn build_report(rows: &[OrderRow], costs: &CostTable) -> PipelineResult<OrderReport> {
    let shipping = group_by_buyer(rows)?;
    let mut accounts = group_by_transaction(rows)?;
    let unresolved_items = resolve_costs(&mut accounts, costs);

    Ok(OrderReport {
        shipping,
        accounts,
        unresolved_items,
    })
}

/// Process an order export file and write both sheets next to it.
///
/// Nothing is written unless loading and grouping succeed.
pub fn process_file(input: &Path, options: &ProcessOptions) -> PipelineResult<ProcessOutput> {
    let invalid_path = || PipelineError::InvalidPath(input.display().to_string());
    let shipping_out = shipping_path(input).ok_or_else(invalid_path)?;
    let accounts_out = accounts_path(input).ok_or_else(invalid_path)?;

    log_info(format!("📖 Reading {}", input.display()));
    let loaded = load_orders(input)?;
    log_success(format!("Detected encoding: {}", loaded.encoding));
    log_success(format!("Detected separator: '{}'", format_delimiter(loaded.delimiter)));
    log_success(format!("Read {} rows", loaded.rows.len()));

    let ignored = loaded.headers.len().saturating_sub(crate::parser::ORDER_COLUMNS.len());
    if ignored > 0 {
        log_info_indent(format!("{} other columns ignored", ignored), 1);
    }

    log_info(format!("💲 Loading cost table {}", options.cost_table.display()));
    let costs = CostTable::load(&options.cost_table)?;
    log_success(format!("{} item costs", costs.len()));

    log_info("📦 Grouping by buyer and by order...");
    let report = build_report(&loaded.rows, &costs)?;
    log_success(format!("{} shipping records", report.shipping.len()));
    log_success(format!("{} transactions", report.accounts.len()));

    let unresolved_transactions = report.unresolved_transactions();
    if unresolved_transactions > 0 {
        log_warning(format!(
            "{} line items without a cost, {} transactions marked unresolved",
            report.unresolved_items, unresolved_transactions
        ));
    }

    write_shipping_file(&shipping_out, &report.shipping)?;
    write_accounts_file(&accounts_out, &report.accounts)?;
    log_success(format!("Wrote {}", shipping_out.display()));
    log_success(format!("Wrote {}", accounts_out.display()));

    Ok(ProcessOutput {
        csv_info: CsvInfo::from(&loaded),
        accounts_path: accounts_out,
        shipping_path: shipping_out,
        shipping_count: report.shipping.len(),
        accounts_count: report.accounts.len(),
        unresolved_transactions,
    })
}

/// Process `input` against the given cost table; returns
/// `(accounts_path, shipping_path)`.
pub fn transform(input: &Path, cost_table: &Path) -> PipelineResult<(PathBuf, PathBuf)> {
    let options = ProcessOptions {
        cost_table: cost_table.to_path_buf(),
    };
    let output = process_file(input, &options)?;
    Ok((output.accounts_path, output.shipping_path))
}

pub fn format_delimiter(d: char) -> &'static str {
    match d {
        ';' => ";",
        ',' => ",",
        '\t' => "TAB",
        '|' => "|",
        _ => "?",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CsvError, FieldError};
    use std::collections::HashSet;
    use std::fs;
    use tempfile::TempDir;

    const HEADER: &str = "Sales Record Number,Buyer Username,Buyer Name,Post To Name,Buyer Address 1,Post To Address 2,Post To City,Post To State,Post To Postal Code,Item Title,Quantity,Buyer Note,Order Number,Sold For,Postage And Handling";

    const ORDERS: &str = "\
1,alice,Alice A,Alice A,1 Main St,,Springfield,IL,62701,Blue Mug [MUG-01],2,,100,$3.50,$1.00
2,bob,Bob B,Bob B,2 Oak Ave,Apt 4,Shelbyville,IL,62565,,3,ring twice,200,$9.75,$2.00
3,bob,,,,,,,,Cup [CUP-02],1,,200,,
4,bob,,,,,,,,Plate [PL-9],2,,200,,
5,carol,Carol C,Carol C,3 Elm Rd,,Capital City,IL,62702,Cup [CUP-02],1,,r55,$1.25,$0.50
6,dave,Dave D,Dave D,4 Pine Ln,,Ogdenville,IL,62703,Spoon [SP-1],4,,300,$0.99,$0.00
";

    const COSTS: &str = "Item,Cost\nMUG-01,3.50\nCUP-02,1.25\nPL-9,2.00\n";

    fn setup(orders: &str) -> (TempDir, PathBuf, ProcessOptions) {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("march.csv");
        fs::write(&input, format!("{}\n{}", HEADER, orders)).unwrap();
        let cost_table = dir.path().join("cost_lookup.csv");
        fs::write(&cost_table, COSTS).unwrap();
        (dir, input, ProcessOptions { cost_table })
    }

    fn data_lines(path: &Path) -> Vec<String> {
        fs::read_to_string(path)
            .unwrap()
            .lines()
            .skip(1)
            .map(String::from)
            .collect()
    }

    #[test]
    fn test_process_file_writes_both_sheets() {
        let (dir, input, options) = setup(ORDERS);
        let output = process_file(&input, &options).unwrap();

        assert_eq!(output.shipping_path, dir.path().join("march_shipping.csv"));
        assert_eq!(output.accounts_path, dir.path().join("march_accounts.csv"));
        assert_eq!(output.csv_info.row_count, 6);

        let shipping = data_lines(&output.shipping_path);
        assert_eq!(
            shipping,
            vec![
                "Alice A,1 Main St,,Springfield,IL,62701,[MUG-01]x2,2,",
                "Bob B,2 Oak Ave,Apt 4,Shelbyville,IL,62565,[CUP-02]x1/[PL-9]x2/,3,ring twice",
                "Carol C,3 Elm Rd,,Capital City,IL,62702,[CUP-02]x1,1,",
                "Dave D,4 Pine Ln,,Ogdenville,IL,62703,[SP-1]x4,4,",
            ]
        );

        let accounts = data_lines(&output.accounts_path);
        assert_eq!(
            accounts,
            vec![
                "100,alice,Alice A,[MUG-01]x2/,2,7.00,7.00",
                "200,bob,Bob B,[CUP-02]x1/[PL-9]x2/,3,9.75,5.25",
                "300,dave,Dave D,[SP-1]x4/,4,3.96,NA",
            ]
        );
        assert_eq!(output.unresolved_transactions, 1);
    }

    #[test]
    fn test_row_counts_match_distinct_keys() {
        let (_dir, input, options) = setup(ORDERS);
        let loaded = load_orders(&input).unwrap();
        let output = process_file(&input, &options).unwrap();

        let buyers: HashSet<_> = loaded
            .rows
            .iter()
            .filter(|r| !r.buyer_username.is_empty())
            .map(|r| r.buyer_username.as_str())
            .collect();
        let orders: HashSet<_> = loaded
            .rows
            .iter()
            .filter(|r| !r.order_number.is_empty() && !r.order_number.starts_with('r'))
            .map(|r| r.order_number.as_str())
            .collect();

        assert_eq!(output.shipping_count, buyers.len());
        assert_eq!(output.accounts_count, orders.len());
        assert_eq!(data_lines(&output.shipping_path).len(), buyers.len());
        assert_eq!(data_lines(&output.accounts_path).len(), orders.len());
    }

    #[test]
    fn test_rerun_is_byte_identical() {
        let (_dir, input, options) = setup(ORDERS);
        let first = process_file(&input, &options).unwrap();
        let shipping = fs::read(&first.shipping_path).unwrap();
        let accounts = fs::read(&first.accounts_path).unwrap();

        let second = process_file(&input, &options).unwrap();
        assert_eq!(fs::read(&second.shipping_path).unwrap(), shipping);
        assert_eq!(fs::read(&second.accounts_path).unwrap(), accounts);
    }

    #[test]
    fn test_transform_contract() {
        let (dir, input, options) = setup(ORDERS);
        let (accounts, shipping) = transform(&input, &options.cost_table).unwrap();
        assert_eq!(accounts, dir.path().join("march_accounts.csv"));
        assert_eq!(shipping, dir.path().join("march_shipping.csv"));
    }

    #[test]
    fn test_malformed_title_writes_nothing() {
        let (dir, input, options) = setup("1,alice,A,A,,,,,,Blue Mug,1,,100,$1.00,$0.00\n");
        let err = process_file(&input, &options).unwrap_err();

        assert!(matches!(
            err,
            PipelineError::Field { line: 2, source: FieldError::MalformedTitle(_) }
        ));
        assert!(!dir.path().join("march_shipping.csv").exists());
        assert!(!dir.path().join("march_accounts.csv").exists());
    }

    #[test]
    fn test_missing_column_fails_before_grouping() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("bad.csv");
        fs::write(&input, "Buyer Username,Item Title\nalice,Mug [A]\n").unwrap();

        let err = process_file(&input, &ProcessOptions::default()).unwrap_err();
        assert!(matches!(err, PipelineError::Csv(CsvError::MissingColumn(_))));
    }

    #[test]
    fn test_missing_cost_table_is_fatal() {
        let (dir, input, _) = setup(ORDERS);
        let options = ProcessOptions {
            cost_table: dir.path().join("nope.csv"),
        };
        let err = process_file(&input, &options).unwrap_err();
        assert!(matches!(err, PipelineError::Csv(CsvError::IoError(_))));
    }

    #[test]
    fn test_build_report_single_item_example() {
        let row = OrderRow {
            buyer_username: "alice".into(),
            item_title: "Blue Mug [MUG-01]".into(),
            quantity: "2".into(),
            order_number: "100".into(),
            sold_for: "3.50".into(),
            postage_and_handling: "0.00".into(),
            ..OrderRow::default()
        };
        let costs = CostTable::from_entries([("MUG-01", "3.50")]);
        let report = build_report(&[row], &costs).unwrap();

        assert_eq!(report.shipping[0].item_title, "[MUG-01]x2");
        assert_eq!(report.shipping[0].quantity, 2);
        assert_eq!(report.accounts[0].description(), "[MUG-01]x2/");
        assert_eq!(report.accounts[0].total_cost().to_string(), "7.00");
        assert_eq!(report.unresolved_items, 0);
    }
}
