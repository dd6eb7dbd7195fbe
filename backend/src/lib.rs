//! # Ordersplit - marketplace order export splitter
//!
//! Ordersplit reads a marketplace order export and writes two sheets next to
//! it: a shipping sheet with one line per buyer, and an accounts sheet with
//! one line per order number, costed against a lookup table.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │ Order CSV   │────▶│   Parser    │────▶│  Transform  │────▶│  Shipping + │
//! │ (ISO/UTF8)  │     │  (auto-enc) │     │ (group+cost)│     │  Accounts   │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use ordersplit::transform;
//! use std::path::Path;
//!
//! let (accounts, shipping) = transform(Path::new("march.csv"), Path::new("cost_lookup.csv"))?;
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`models`] - Order rows, shipping and transaction records, costs
//! - [`parser`] - CSV loading with auto-detection and field extraction
//! - [`transform`] - Grouping, cost resolution and the pipeline
//! - [`export`] - CSV writers for both sheets
//! - [`config`] - Environment configuration
//! - [`logs`] - Progress logging, mirrored to SSE subscribers
//! - [`api`] - HTTP upload server

// Core modules
pub mod config;
pub mod error;
pub mod models;

// Parsing
pub mod parser;

// Transformation
pub mod transform;

// Output
pub mod export;

// Progress logging
pub mod logs;

// HTTP API
pub mod api;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{ConfigError, CsvError, FieldError, PipelineError, ServerError};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{Cost, LineItem, OrderRow, ShippingRecord, TransactionRecord};

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use config::AppConfig;
pub use parser::{load_orders, parse_orders_bytes, LoadedOrders};
pub use transform::{
    build_report, group_by_buyer, group_by_transaction, process_file, resolve_costs, transform,
    CostTable, OrderReport, ProcessOptions, ProcessOutput,
};

// =============================================================================
// Re-exports - Server
// =============================================================================

pub use api::server;
pub use api::start_server;
