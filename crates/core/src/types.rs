//! Domain types for ledger rows, normalized receipts and rendered documents.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single spreadsheet cell value, as read from the workbook.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    /// No value, or an error cell.
    #[default]
    Empty,
    /// Text content (shared, inline or formula strings).
    Text(String),
    /// Numeric content, including dates stored as serial numbers.
    Number(f64),
    /// Boolean content.
    Bool(bool),
}

impl CellValue {
    /// Whether the cell holds nothing but whitespace.
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// The cell rendered as trimmed text; empty cells become "".
    pub fn to_text(&self) -> String {
        self.to_string().trim().to_string()
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Text(s) => f.write_str(s),
            // Whole numbers print without a fractional part so voucher
            // numbers stored as numbers keep their natural form.
            CellValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
                write!(f, "{}", *n as i64)
            }
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::Bool(true) => f.write_str("TRUE"),
            CellValue::Bool(false) => f.write_str("FALSE"),
        }
    }
}

/// A sheet as read from the workbook: a header row and the data rows below it.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    /// Column names from the header row, trimmed.
    pub columns: Vec<String>,

    /// Data rows, each aligned with `columns` (short rows are padded on access).
    pub rows: Vec<Vec<CellValue>>,
}

impl RawTable {
    /// Create a table with the given header.
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Add a data row.
    pub fn push_row(&mut self, row: Vec<CellValue>) {
        self.rows.push(row);
    }

    /// Position of a column by exact name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Get a cell, treating cells past the end of a short row as empty.
    pub fn cell(&self, row: usize, column: usize) -> CellValue {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .cloned()
            .unwrap_or_default()
    }
}

/// One donation record with its fields parsed into their real types.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerRow {
    /// Zero-based position in the table the row was selected from.
    pub index: usize,
    pub date: NaiveDate,
    /// Donor name, possibly followed by parenthetical annotations.
    pub particulars: String,
    pub address: String,
    pub voucher_type: String,
    pub voucher_no: String,
    pub pan_no: String,
    /// Used as the transaction reference on the receipt.
    pub narration: String,
    pub gross_total: Option<f64>,
    /// Donation as recorded, before truncation to whole units.
    pub donation: f64,
}

/// Per-row values derived for rendering. Built transiently and discarded.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedReceipt {
    /// Donor name with annotations and honorific removed.
    pub donor_name: String,
    /// Filename-safe donor token.
    pub donor_token: String,
    /// Voucher number exactly as recorded, shown as the receipt number.
    pub receipt_no: String,
    /// Donation date as dd-mm-yyyy.
    pub date: String,
    /// Donation truncated to whole currency units.
    pub amount: i64,
    /// The recorded donation with two decimals and thousands separators.
    pub amount_display: String,
    pub amount_words: String,
    pub transaction_ref: String,
    pub pan_no: String,
    pub address: String,
    /// Output filename stem: sanitized voucher number plus donor token.
    pub serial: String,
}

/// A rendered receipt: the archive entry name and its payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiptDocument {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl ReceiptDocument {
    /// Create a document from a filename stem and extension.
    pub fn new(stem: &str, extension: &str, bytes: Vec<u8>) -> Self {
        Self {
            filename: format!("{}.{}", stem, extension),
            bytes,
        }
    }

    /// Split the filename into stem and extension.
    pub fn stem_and_extension(&self) -> (&str, Option<&str>) {
        match self.filename.rsplit_once('.') {
            Some((stem, ext)) => (stem, Some(ext)),
            None => (self.filename.as_str(), None),
        }
    }

    /// Rename by appending a suffix to the stem, keeping the extension.
    pub fn with_stem_suffix(mut self, suffix: &str) -> Self {
        self.filename = match self.stem_and_extension() {
            (stem, Some(ext)) => format!("{}{}.{}", stem, suffix, ext),
            (stem, None) => format!("{}{}", stem, suffix),
        };
        self
    }
}

/// The issuing organization, printed in every receipt's header and footer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrganizationProfile {
    /// Display name, printed as the letterhead.
    pub name: String,

    /// Registered office, one entry per printed line.
    pub address_lines: Vec<String>,

    /// Registration and tax identifiers, printed under the address.
    pub registration_line: String,

    /// Tax-exemption statement printed after the donation details.
    pub tax_exemption_notice: String,

    /// Small-print lines at the foot of the receipt.
    pub disclaimers: Vec<String>,
}

impl Default for OrganizationProfile {
    fn default() -> Self {
        Self {
            name: "Jeev Sewa Foundation".to_string(),
            address_lines: vec![
                "Reg Office:- 1/4230, Gali No.8, Ram Nagar Extension,".to_string(),
                "Shahdara North East Delhi-110032".to_string(),
            ],
            registration_line:
                "Reg. No.: 505/2019-20/4-909 | PAN: AADTJ3477H | 80G No: AADTJ3477H24DL02"
                    .to_string(),
            tax_exemption_notice: "Donations towards Jeev Sewa Foundation, registered under \
                Section 80G of India's Income Tax Act, 1961, are tax-deductible."
                .to_string(),
            disclaimers: vec![
                "*This is a computer-generated receipt and does not require a signature."
                    .to_string(),
                "*This e-receipt is invalid in case of non-realization of payment instrument, \
                 reversal of credit card charge and/or reversal of amount for any reason."
                    .to_string(),
                "*No goods or services were provided to the donor by the organization in \
                 return for the contribution."
                    .to_string(),
            ],
        }
    }
}

impl OrganizationProfile {
    /// Check that the profile has what every receipt needs.
    pub fn validate(&self) -> crate::Result<()> {
        if self.name.trim().is_empty() {
            return Err(crate::Error::ProfileError(
                "organization name must not be empty".to_string(),
            ));
        }
        if self.address_lines.iter().all(|l| l.trim().is_empty()) {
            return Err(crate::Error::ProfileError(
                "at least one address line is required".to_string(),
            ));
        }
        Ok(())
    }
}
