//! XLSX (Office Open XML) ledger reader for donation receipt generation.
//!
//! Reads .xlsx workbooks, which are ZIP archives of XML parts, into a
//! [`receipt_core::RawTable`].

pub mod reader;

pub use reader::{XlsxReader, DEFAULT_HEADER_ROW, DEFAULT_SHEET_NAME};
