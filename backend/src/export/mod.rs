//! CSV writers for the shipping and accounts sheets.
//!
//! Both sheets get one header row and one row per record, in the order the
//! records are given. Lines end with CRLF.

use csv::{Terminator, Writer, WriterBuilder};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::CsvResult;
use crate::models::{ShippingRecord, TransactionRecord};

/// Shipping sheet columns.
pub const SHIPPING_COLUMNS: [&str; 9] = [
    "Post To Name",
    "Buyer Address 1",
    "Post To Address 2",
    "Post To City",
    "Post To State",
    "Post To Postal Code",
    "Item Title",
    "Quantity",
    "Buyer Note",
];

/// Accounts sheet columns.
pub const ACCOUNTS_COLUMNS: [&str; 7] = [
    "Order Number",
    "Buyer Username",
    "Buyer Name",
    "Item Title",
    "Quantity",
    "Sold For",
    "Cost",
];

const SHIPPING_SUFFIX: &str = "_shipping.csv";
const ACCOUNTS_SUFFIX: &str = "_accounts.csv";

fn writer<W: Write>(out: W) -> Writer<W> {
    WriterBuilder::new().terminator(Terminator::CRLF).from_writer(out)
}

/// Write the shipping sheet.
pub fn write_shipping<W: Write>(out: W, records: &[ShippingRecord]) -> CsvResult<()> {
    let mut w = writer(out);
    w.write_record(SHIPPING_COLUMNS)?;
    for record in records {
        w.write_record(record.to_record())?;
    }
    w.flush()?;
    Ok(())
}

/// Write the accounts sheet.
pub fn write_accounts<W: Write>(out: W, records: &[TransactionRecord]) -> CsvResult<()> {
    let mut w = writer(out);
    w.write_record(ACCOUNTS_COLUMNS)?;
    for record in records {
        w.write_record(record.to_record())?;
    }
    w.flush()?;
    Ok(())
}

/// Write the shipping sheet to a file, replacing it if present.
pub fn write_shipping_file(path: &Path, records: &[ShippingRecord]) -> CsvResult<()> {
    write_shipping(File::create(path)?, records)
}

/// Write the accounts sheet to a file, replacing it if present.
pub fn write_accounts_file(path: &Path, records: &[TransactionRecord]) -> CsvResult<()> {
    write_accounts(File::create(path)?, records)
}

fn sibling_with_suffix(input: &Path, suffix: &str) -> Option<PathBuf> {
    let stem = input.file_stem()?.to_str()?;
    Some(input.with_file_name(format!("{}{}", stem, suffix)))
}

/// `orders/export.csv` → `orders/export_shipping.csv`
pub fn shipping_path(input: &Path) -> Option<PathBuf> {
    sibling_with_suffix(input, SHIPPING_SUFFIX)
}

/// `orders/export.csv` → `orders/export_accounts.csv`
pub fn accounts_path(input: &Path) -> Option<PathBuf> {
    sibling_with_suffix(input, ACCOUNTS_SUFFIX)
}
