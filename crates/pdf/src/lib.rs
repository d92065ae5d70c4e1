//! PDF rendering backend for donation receipts.
//!
//! Lays out one A4 page per ledger row using the standard Helvetica fonts
//! and writes it with `lopdf`.

pub mod document;
pub mod encoding;
pub mod fonts;
pub mod layout;
pub mod renderer;

pub use renderer::{PdfRenderer, RECEIPT_EXTENSION};
