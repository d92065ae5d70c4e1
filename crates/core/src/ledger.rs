//! Ledger tables: column validation, filtering and typed row conversion.

use crate::{CellValue, Error, LedgerRow, RawTable, Result};
use chrono::{Duration, NaiveDate, NaiveDateTime};

pub const COL_DATE: &str = "Date";
pub const COL_PARTICULARS: &str = "Particulars";
pub const COL_ADDRESS: &str = "Consignee/Party Address";
pub const COL_VOUCHER_TYPE: &str = "Voucher Type";
pub const COL_VOUCHER_NO: &str = "Voucher No.";
pub const COL_PAN_NO: &str = "PAN No.";
pub const COL_NARRATION: &str = "Narration";
pub const COL_GROSS_TOTAL: &str = "Gross Total";
pub const COL_DONATION: &str = "Donation";

/// Columns every ledger sheet must carry.
pub const REQUIRED_COLUMNS: [&str; 9] = [
    COL_DATE,
    COL_PARTICULARS,
    COL_ADDRESS,
    COL_VOUCHER_TYPE,
    COL_VOUCHER_NO,
    COL_PAN_NO,
    COL_NARRATION,
    COL_GROSS_TOTAL,
    COL_DONATION,
];

/// Columns shown when previewing a table.
pub const PREVIEW_COLUMNS: [&str; 5] = [COL_DATE, COL_ADDRESS, COL_DONATION, COL_PAN_NO, COL_VOUCHER_NO];

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%d-%m-%Y %H:%M:%S"];

// Two-digit years come first: "%Y" would read "24" as the year 24.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d", "%d-%m-%Y", "%d/%m/%Y", "%d.%m.%Y", "%d-%b-%y", "%d-%b-%Y", "%d %b %Y",
    "%d %B %Y",
];

/// Serial of 9999-12-31, the last date Excel can represent.
const MAX_EXCEL_SERIAL: f64 = 2_958_465.0;

/// Convert an Excel serial day number (1900 date system) to a date.
fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || !(1.0..=MAX_EXCEL_SERIAL).contains(&serial) {
        return None;
    }
    let days = serial.floor() as i64;
    // Serials below 60 predate Excel's phantom 1900-02-29.
    let epoch = if days < 60 {
        NaiveDate::from_ymd_opt(1899, 12, 31)?
    } else {
        NaiveDate::from_ymd_opt(1899, 12, 30)?
    };
    epoch.checked_add_signed(Duration::try_days(days)?)
}

fn parse_text_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();

    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Some(dt.date());
        }
    }

    let candidates = [Some(text), text.split_whitespace().next()];
    for candidate in candidates.into_iter().flatten() {
        for format in DATE_FORMATS {
            if let Ok(date) = NaiveDate::parse_from_str(candidate, format) {
                return Some(date);
            }
        }
    }

    None
}

/// Parse a ledger date cell: a serial number or one of the common text forms.
pub fn parse_ledger_date(cell: &CellValue) -> Option<NaiveDate> {
    match cell {
        CellValue::Number(serial) => excel_serial_to_date(*serial),
        CellValue::Text(text) => parse_text_date(text),
        _ => None,
    }
}

/// Parse a numeric cell. Text may carry thousands commas.
pub fn parse_ledger_number(cell: &CellValue) -> Option<f64> {
    match cell {
        CellValue::Number(n) => Some(*n),
        CellValue::Text(text) => text.trim().replace(',', "").parse::<f64>().ok(),
        _ => None,
    }
}

/// One ledger row with its required fields bound by name, not yet typed.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LedgerRecord {
    pub date: CellValue,
    pub particulars: CellValue,
    pub address: CellValue,
    pub voucher_type: CellValue,
    pub voucher_no: CellValue,
    pub pan_no: CellValue,
    pub narration: CellValue,
    pub gross_total: CellValue,
    pub donation: CellValue,
}

impl LedgerRecord {
    /// Whether every bound field is empty.
    pub fn is_blank(&self) -> bool {
        [
            &self.date,
            &self.particulars,
            &self.address,
            &self.voucher_type,
            &self.voucher_no,
            &self.pan_no,
            &self.narration,
            &self.gross_total,
            &self.donation,
        ]
        .iter()
        .all(|c| c.is_empty())
    }

    /// Case-insensitive substring test on the address field.
    pub fn address_contains(&self, needle_lower: &str) -> bool {
        self.address.to_text().to_lowercase().contains(needle_lower)
    }

    /// Parse the record into a typed row at table position `index`.
    pub fn to_row(&self, index: usize) -> Result<LedgerRow> {
        let date = parse_ledger_date(&self.date).ok_or_else(|| {
            Error::RenderError(format!(
                "row {}: column '{}' is not a date: '{}'",
                index, COL_DATE, self.date
            ))
        })?;

        let donation = parse_ledger_number(&self.donation).ok_or_else(|| {
            Error::InvalidAmount(format!(
                "row {}: column '{}' is not numeric: '{}'",
                index, COL_DONATION, self.donation
            ))
        })?;

        Ok(LedgerRow {
            index,
            date,
            particulars: self.particulars.to_text(),
            address: self.address.to_text(),
            voucher_type: self.voucher_type.to_text(),
            voucher_no: self.voucher_no.to_text(),
            pan_no: self.pan_no.to_text(),
            narration: self.narration.to_text(),
            gross_total: parse_ledger_number(&self.gross_total),
            donation,
        })
    }

    /// The preview fields, in `PREVIEW_COLUMNS` order.
    pub fn preview(&self) -> [String; 5] {
        let date = parse_ledger_date(&self.date)
            .map(|d| d.format("%d-%m-%Y").to_string())
            .unwrap_or_else(|| self.date.to_text());

        [
            date,
            self.address.to_text(),
            self.donation.to_text(),
            self.pan_no.to_text(),
            self.voucher_no.to_text(),
        ]
    }
}

/// A validated ledger: every record carries all required columns.
///
/// Positions are zero-based and contiguous; filtering yields a new table
/// whose positions start again at zero.
#[derive(Debug, Clone, Default)]
pub struct LedgerTable {
    records: Vec<LedgerRecord>,
}

impl LedgerTable {
    /// Validate the header and bind each row's fields by column name.
    ///
    /// Fails with `SchemaError` before any row is read if a required column
    /// is absent. Rows with every required field empty are dropped.
    pub fn from_raw(raw: &RawTable) -> Result<Self> {
        let missing: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .filter(|name| raw.column_index(name).is_none())
            .map(|name| name.to_string())
            .collect();

        if !missing.is_empty() {
            return Err(Error::SchemaError {
                required: REQUIRED_COLUMNS.iter().map(|c| c.to_string()).collect(),
                missing,
            });
        }

        // Present by the check above.
        let idx = |name: &str| raw.column_index(name).unwrap_or_default();
        let cols = [
            idx(COL_DATE),
            idx(COL_PARTICULARS),
            idx(COL_ADDRESS),
            idx(COL_VOUCHER_TYPE),
            idx(COL_VOUCHER_NO),
            idx(COL_PAN_NO),
            idx(COL_NARRATION),
            idx(COL_GROSS_TOTAL),
            idx(COL_DONATION),
        ];

        let mut records = Vec::with_capacity(raw.rows.len());
        for row in 0..raw.rows.len() {
            let record = LedgerRecord {
                date: raw.cell(row, cols[0]),
                particulars: raw.cell(row, cols[1]),
                address: raw.cell(row, cols[2]),
                voucher_type: raw.cell(row, cols[3]),
                voucher_no: raw.cell(row, cols[4]),
                pan_no: raw.cell(row, cols[5]),
                narration: raw.cell(row, cols[6]),
                gross_total: raw.cell(row, cols[7]),
                donation: raw.cell(row, cols[8]),
            };

            if record.is_blank() {
                log::debug!("Skipping blank sheet row {}", row);
                continue;
            }
            records.push(record);
        }

        log::info!("Loaded {} ledger entries", records.len());
        Ok(Self { records })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Keep rows whose address contains `filter_text`, ignoring case.
    ///
    /// A filter that is empty after trimming keeps every row.
    pub fn filter_by_address(&self, filter_text: &str) -> Self {
        let needle = filter_text.trim().to_lowercase();
        if needle.is_empty() {
            return self.clone();
        }

        let records: Vec<LedgerRecord> = self
            .records
            .iter()
            .filter(|r| r.address_contains(&needle))
            .cloned()
            .collect();

        log::info!("Found {} matching entries for '{}'", records.len(), needle);
        Self { records }
    }

    /// Typed row at `index`.
    pub fn row(&self, index: usize) -> Result<LedgerRow> {
        self.records
            .get(index)
            .ok_or_else(|| {
                Error::EmptyResultError(format!(
                    "row {} is outside the table of {} rows",
                    index,
                    self.records.len()
                ))
            })?
            .to_row(index)
    }

    /// Index and preview fields for every row.
    pub fn preview(&self) -> Vec<(usize, [String; 5])> {
        self.records
            .iter()
            .enumerate()
            .map(|(i, r)| (i, r.preview()))
            .collect()
    }
}
