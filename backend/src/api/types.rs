//! JSON types for `POST /api/upload`.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::Path;
use uuid::Uuid;

use crate::transform::pipeline::ProcessOutput;

/// Mount point of the download route.
pub const DOWNLOAD_PREFIX: &str = "/orders";

/// Response sent after a successful upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub job_id: String,

    /// "ready" when every transaction has a cost, "warning" otherwise
    pub status: String,

    /// Download link of the accounts sheet
    pub accounts_file: String,

    /// Download link of the shipping sheet
    pub shipping_file: String,

    pub metadata: ResponseMetadata,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMetadata {
    pub shipping_records: usize,
    pub transactions: usize,
    pub unresolved_transactions: usize,
    pub csv_info: CsvMetadata,
}

/// Input file metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CsvMetadata {
    pub encoding: String,
    pub delimiter: String,
    pub row_count: usize,
    pub columns: Vec<String>,
}

impl From<ProcessOutput> for UploadResponse {
    fn from(output: ProcessOutput) -> Self {
        UploadResponse {
            job_id: Uuid::new_v4().to_string(),
            status: if output.unresolved_transactions == 0 { "ready" } else { "warning" }.to_string(),
            accounts_file: download_url(&output.accounts_path),
            shipping_file: download_url(&output.shipping_path),
            metadata: ResponseMetadata {
                shipping_records: output.shipping_count,
                transactions: output.accounts_count,
                unresolved_transactions: output.unresolved_transactions,
                csv_info: CsvMetadata {
                    encoding: output.csv_info.encoding,
                    delimiter: output.csv_info.delimiter.to_string(),
                    row_count: output.csv_info.row_count,
                    columns: output.csv_info.headers,
                },
            },
        }
    }
}

/// Link under which a produced file is served.
pub fn download_url(path: &Path) -> String {
    let name = path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
    format!("{}/{}", DOWNLOAD_PREFIX, name)
}

/// Create an error response
pub fn error_response(error: &str) -> Value {
    json!({
        "jobId": Uuid::new_v4().to_string(),
        "status": "error",
        "error": error,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::pipeline::CsvInfo;
    use std::path::PathBuf;

    fn output(unresolved: usize) -> ProcessOutput {
        ProcessOutput {
            accounts_path: PathBuf::from("./orders/march_accounts.csv"),
            shipping_path: PathBuf::from("./orders/march_shipping.csv"),
            shipping_count: 4,
            accounts_count: 3,
            unresolved_transactions: unresolved,
            csv_info: CsvInfo {
                encoding: "utf-8".into(),
                delimiter: ',',
                headers: vec!["Buyer Username".into()],
                row_count: 6,
            },
        }
    }

    #[test]
    fn test_response_links_and_status() {
        let response = UploadResponse::from(output(0));
        assert_eq!(response.status, "ready");
        assert_eq!(response.accounts_file, "/orders/march_accounts.csv");
        assert_eq!(response.shipping_file, "/orders/march_shipping.csv");
        assert_eq!(response.metadata.transactions, 3);

        assert_eq!(UploadResponse::from(output(1)).status, "warning");
    }

    #[test]
    fn test_response_json_is_camel_case() {
        let json = serde_json::to_value(UploadResponse::from(output(0))).unwrap();
        assert_eq!(json["metadata"]["shippingRecords"], 4);
        assert_eq!(json["metadata"]["csvInfo"]["rowCount"], 6);
    }

    #[test]
    fn test_error_response() {
        let json = error_response("File type not supported");
        assert_eq!(json["status"], "error");
        assert_eq!(json["error"], "File type not supported");
    }
}
