//! HTTP API module.
//!
//! Upload server, page templates and JSON types. Pipeline logs are streamed
//! from [`crate::logs`].

pub mod pages;
pub mod server;
pub mod types;

pub use server::{router, start_server};
pub use types::*;
