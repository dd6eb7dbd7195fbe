//! Tabular file loading with encoding and delimiter auto-detection.
//!
//! [`read_table_bytes`] turns raw bytes into headers plus string records;
//! [`load_orders`] narrows an order export down to the fixed column set.

pub mod fields;

use csv::{ReaderBuilder, StringRecord, Trim};
use std::path::Path;

use crate::error::{CsvError, CsvResult};
use crate::models::OrderRow;

/// Columns read from the order export. Anything else is dropped.
pub const ORDER_COLUMNS: [&str; 14] = [
    "Buyer Username",
    "Post To Name",
    "Buyer Address 1",
    "Post To Address 2",
    "Post To City",
    "Post To State",
    "Post To Postal Code",
    "Item Title",
    "Quantity",
    "Buyer Note",
    "Order Number",
    "Buyer Name",
    "Sold For",
    "Postage And Handling",
];

/// A decoded tabular file.
#[derive(Debug, Clone)]
pub struct Table {
    /// Detected encoding
    pub encoding: String,
    /// Detected delimiter
    pub delimiter: char,
    /// Column headers, trimmed
    pub headers: Vec<String>,
    /// Data records, in file order
    pub records: Vec<StringRecord>,
}

impl Table {
    /// Position of a required column.
    pub fn column(&self, name: &str) -> CsvResult<usize> {
        self.headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| CsvError::MissingColumn(name.to_string()))
    }
}

/// Order rows plus what was detected while reading them.
#[derive(Debug, Clone)]
pub struct LoadedOrders {
    pub rows: Vec<OrderRow>,
    pub encoding: String,
    pub delimiter: char,
    pub headers: Vec<String>,
}

/// Detect the encoding of raw bytes using chardet
pub fn detect_encoding(bytes: &[u8]) -> String {
    let result = chardet::detect(bytes);
    let charset = result.0;

    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" | "utf-8-sig" | "" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        other => other.to_string(),
    }
}

/// Decode bytes to a string using the given encoding label.
///
/// Invalid UTF-8 falls back to Windows-1252, which is what spreadsheet
/// exports usually are when they are not UTF-8. A leading BOM is dropped.
pub fn decode_content(bytes: &[u8], encoding: &str) -> CsvResult<String> {
    match encoding.to_lowercase().as_str() {
        "utf-8" | "utf8" | "ascii" => match std::str::from_utf8(bytes) {
            Ok(text) => Ok(text.strip_prefix('\u{feff}').unwrap_or(text).to_string()),
            Err(_) => Ok(encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned()),
        },
        "iso-8859-1" | "latin-1" | "latin1" => Ok(encoding_rs::ISO_8859_15.decode(bytes).0.into_owned()),
        "windows-1252" | "cp1252" => Ok(encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned()),
        label => {
            let encoding = encoding_rs::Encoding::for_label(label.as_bytes())
                .ok_or_else(|| CsvError::EncodingError(format!("unsupported encoding '{}'", label)))?;
            let (text, _, had_errors) = encoding.decode(bytes);
            if had_errors {
                return Err(CsvError::EncodingError(format!(
                    "content is not valid {}",
                    encoding.name()
                )));
            }
            Ok(text.into_owned())
        }
    }
}

/// Detect the delimiter by counting occurrences in the first line.
/// Ties and headerless content default to a comma.
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content.lines().next().unwrap_or("");

    let separators = [',', ';', '\t', '|'];
    let mut best_sep = ',';
    let mut best_count = 0;

    for &sep in &separators {
        let count = first_line.matches(sep).count();
        if count > best_count {
            best_count = count;
            best_sep = sep;
        }
    }

    best_sep
}

/// Parse decoded content with an explicit delimiter.
pub fn read_table_str(content: &str, delimiter: char, encoding: String) -> CsvResult<Table> {
    if content.trim().is_empty() {
        return Err(CsvError::EmptyFile);
    }

    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter as u8)
        .flexible(true)
        .trim(Trim::Headers)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader.headers()?.iter().map(String::from).collect();
    if headers.iter().all(|h| h.is_empty()) {
        return Err(CsvError::EmptyFile);
    }

    let records = reader.records().collect::<Result<Vec<_>, _>>()?;

    Ok(Table {
        encoding,
        delimiter,
        headers,
        records,
    })
}

/// Parse raw bytes with auto-detection of encoding and delimiter.
pub fn read_table_bytes(bytes: &[u8]) -> CsvResult<Table> {
    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding)?;
    let delimiter = detect_delimiter(&content);
    read_table_str(&content, delimiter, encoding)
}

/// Read a file with auto-detection of encoding and delimiter.
pub fn read_table_file<P: AsRef<Path>>(path: P) -> CsvResult<Table> {
    let bytes = std::fs::read(path.as_ref())?;
    read_table_bytes(&bytes)
}

/// Narrow a table down to order rows.
///
/// Fails with [`CsvError::MissingColumn`] naming the first absent column.
/// Short records read as empty fields.
pub fn orders_from_table(table: Table) -> CsvResult<LoadedOrders> {
    let mut idx = [0usize; ORDER_COLUMNS.len()];
    for (slot, name) in idx.iter_mut().zip(ORDER_COLUMNS) {
        *slot = table.column(name)?;
    }

    let rows = table
        .records
        .iter()
        .map(|record| {
            let field = |i: usize| record.get(idx[i]).unwrap_or("").to_string();
            OrderRow {
                buyer_username: field(0),
                post_to_name: field(1),
                address_1: field(2),
                address_2: field(3),
                city: field(4),
                state: field(5),
                postal_code: field(6),
                item_title: field(7),
                quantity: field(8),
                buyer_note: field(9),
                order_number: field(10),
                buyer_name: field(11),
                sold_for: field(12),
                postage_and_handling: field(13),
                line: record.position().map(|p| p.line()).unwrap_or(0),
            }
        })
        .collect();

    Ok(LoadedOrders {
        rows,
        encoding: table.encoding,
        delimiter: table.delimiter,
        headers: table.headers,
    })
}

/// Load an order export from raw bytes.
pub fn parse_orders_bytes(bytes: &[u8]) -> CsvResult<LoadedOrders> {
    orders_from_table(read_table_bytes(bytes)?)
}

/// Load an order export from a file.
///
/// # Example
/// ```ignore
/// let loaded = load_orders("orders/export.csv")?;
/// println!("{} rows, delimiter '{}'", loaded.rows.len(), loaded.delimiter);
/// ```
pub fn load_orders<P: AsRef<Path>>(path: P) -> CsvResult<LoadedOrders> {
    orders_from_table(read_table_file(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "Sales Record Number,Buyer Username,Buyer Name,Post To Name,Buyer Address 1,Post To Address 2,Post To City,Post To State,Post To Postal Code,Item Title,Quantity,Buyer Note,Order Number,Sold For,Postage And Handling";

    #[test]
    fn test_load_orders_selects_columns() {
        let csv = format!(
            "{}\n1,alice,Alice A,Alice A,1 Main St,,Springfield,IL,62701,Blue Mug [MUG-01],2,,100,$3.50,$1.00\n",
            HEADER
        );
        let loaded = parse_orders_bytes(csv.as_bytes()).unwrap();

        assert_eq!(loaded.rows.len(), 1);
        let row = &loaded.rows[0];
        assert_eq!(row.buyer_username, "alice");
        assert_eq!(row.item_title, "Blue Mug [MUG-01]");
        assert_eq!(row.quantity, "2");
        assert_eq!(row.order_number, "100");
        assert_eq!(row.sold_for, "$3.50");
        assert_eq!(row.line, 2);
        assert_eq!(loaded.delimiter, ',');
    }

    #[test]
    fn test_missing_column_is_reported() {
        let csv = "Buyer Username,Item Title\nalice,Mug [A]\n";
        let err = parse_orders_bytes(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, CsvError::MissingColumn(ref c) if c == "Post To Name"));
    }

    #[test]
    fn test_row_order_is_preserved() {
        let csv = format!(
            "{}\n1,bob,,,,,,,,[A],1,,1,1.00,0.00\n2,alice,,,,,,,,[B],1,,2,1.00,0.00\n3,carol,,,,,,,,[C],1,,3,1.00,0.00\n",
            HEADER
        );
        let loaded = parse_orders_bytes(csv.as_bytes()).unwrap();
        let names: Vec<_> = loaded.rows.iter().map(|r| r.buyer_username.as_str()).collect();
        assert_eq!(names, vec!["bob", "alice", "carol"]);
    }

    #[test]
    fn test_quoted_fields_with_commas() {
        let csv = format!(
            "{}\n1,alice,\"Smith, Alice\",,,,,,,\"Mug, large [MUG-02]\",1,,100,3.50,1.00\n",
            HEADER
        );
        let loaded = parse_orders_bytes(csv.as_bytes()).unwrap();
        assert_eq!(loaded.rows[0].buyer_name, "Smith, Alice");
        assert_eq!(loaded.rows[0].item_title, "Mug, large [MUG-02]");
    }

    #[test]
    fn test_short_record_reads_as_empty() {
        let csv = format!("{}\n1,alice\n", HEADER);
        let loaded = parse_orders_bytes(csv.as_bytes()).unwrap();
        assert_eq!(loaded.rows[0].buyer_username, "alice");
        assert_eq!(loaded.rows[0].order_number, "");
    }

    #[test]
    fn test_bom_and_padded_headers() {
        let csv = "\u{feff}Item , Cost\nMUG-01,3.50\n";
        let table = read_table_bytes(csv.as_bytes()).unwrap();
        assert_eq!(table.headers, vec!["Item", "Cost"]);
        assert_eq!(table.column("Cost").unwrap(), 1);
    }

    #[test]
    fn test_empty_file_error() {
        assert!(matches!(read_table_bytes(b""), Err(CsvError::EmptyFile)));
        assert!(matches!(read_table_bytes(b"  \n"), Err(CsvError::EmptyFile)));
    }

    #[test]
    fn test_detect_delimiter() {
        assert_eq!(detect_delimiter("a,b,c\n1,2,3"), ',');
        assert_eq!(detect_delimiter("a;b;c\n1;2;3"), ';');
        assert_eq!(detect_delimiter("a\tb\tc\n1\t2\t3"), '\t');
        assert_eq!(detect_delimiter("a|b|c\n1|2|3"), '|');
        assert_eq!(detect_delimiter("single"), ',');
    }

    #[test]
    fn test_windows_1252_fallback() {
        // "Café" with 0xE9 as in Windows-1252
        let bytes: &[u8] = &[0x43, 0x61, 0x66, 0xE9];
        let decoded = decode_content(bytes, "utf-8").unwrap();
        assert_eq!(decoded, "Café");
    }
}
