//! Text normalization for donor names and output filenames.
//!
//! Donor names arrive in the ledger's "Particulars" column, often with a
//! parenthetical annotation and an honorific ("Dr. Asha Verma (Regular
//! Donor)"). Receipts show the bare name; filenames use a path-safe token
//! built from it.

use crate::amount::AmountFormatter;
use crate::{LedgerRow, NormalizedReceipt, Result};

/// Honorifics stripped from donor names, checked in this order.
pub const HONORIFIC_PREFIXES: &[&str] = &[
    "Dr.", "Mr.", "Mrs.", "Ms.", "Prof.", "Miss", "Sir", "Madam",
];

/// Strip `prefix` from the start of `text`, ignoring case.
fn strip_prefix_ignore_case<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    let mut chars = text.chars();
    for p in prefix.chars() {
        match chars.next() {
            Some(c) if c.to_lowercase().eq(p.to_lowercase()) => {}
            _ => return None,
        }
    }
    Some(chars.as_str())
}

/// Removes honorific prefixes from donor names.
#[derive(Debug, Clone)]
pub struct NameNormalizer {
    prefixes: Vec<String>,
}

impl Default for NameNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl NameNormalizer {
    /// Create a normalizer with the standard honorific list.
    pub fn new() -> Self {
        Self {
            prefixes: HONORIFIC_PREFIXES.iter().map(|p| p.to_string()).collect(),
        }
    }

    /// Replace the honorific list. Order matters: the first match wins.
    pub fn with_prefixes<I, S>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.prefixes = prefixes.into_iter().map(Into::into).collect();
        self
    }

    /// Trim the name and remove at most one leading honorific.
    ///
    /// Matching is a plain case-insensitive prefix test in list order, so
    /// "Mrs." never shadows "Mr." but "Sir" will also match "Siraj".
    pub fn clean(&self, raw_name: &str) -> String {
        let name = raw_name.trim();

        for prefix in &self.prefixes {
            if let Some(rest) = strip_prefix_ignore_case(name, prefix) {
                return rest.trim().to_string();
            }
        }

        name.to_string()
    }

    /// Extract the donor's display name from a "Particulars" value.
    ///
    /// Everything from the first '(' on is an annotation and is dropped.
    pub fn donor_name(&self, particulars: &str) -> String {
        let before_annotation = particulars
            .split_once('(')
            .map(|(name, _)| name)
            .unwrap_or(particulars);

        self.clean(before_annotation)
    }
}

/// Builds filesystem-safe serial identifiers for receipt files.
#[derive(Debug, Clone, Copy, Default)]
pub struct FilenameBuilder;

impl FilenameBuilder {
    pub fn new() -> Self {
        Self
    }

    /// Voucher number with path separators replaced by '-'.
    pub fn voucher_token(&self, voucher_no: &str) -> String {
        voucher_no.replace(['/', '\\'], "-")
    }

    /// Donor name with spaces as '_' and path separators as '-'.
    pub fn donor_token(&self, donor_name_clean: &str) -> String {
        donor_name_clean.replace(' ', "_").replace(['/', '\\'], "-")
    }

    /// `"{voucher}_{donor}"`, never containing '/' or '\'.
    ///
    /// Distinct inputs can map to the same serial; callers that need unique
    /// names must check for collisions themselves.
    pub fn build_serial(&self, voucher_no: &str, donor_name_clean: &str) -> String {
        format!(
            "{}_{}",
            self.voucher_token(voucher_no),
            self.donor_token(donor_name_clean)
        )
    }
}

impl NormalizedReceipt {
    /// Derive everything a receipt shows from one ledger row.
    pub fn from_row(
        row: &LedgerRow,
        names: &NameNormalizer,
        amounts: &AmountFormatter,
        filenames: &FilenameBuilder,
    ) -> Result<Self> {
        let donor_name = names.donor_name(&row.particulars);
        let amount = amounts.whole_units(row.donation)?;

        Ok(Self {
            donor_token: filenames.donor_token(&donor_name),
            serial: filenames.build_serial(&row.voucher_no, &donor_name),
            receipt_no: row.voucher_no.clone(),
            date: row.date.format("%d-%m-%Y").to_string(),
            amount,
            amount_display: amounts.format_display(row.donation),
            amount_words: amounts.to_words(amount),
            transaction_ref: row.narration.trim().to_string(),
            pan_no: row.pan_no.clone(),
            address: row.address.clone(),
            donor_name,
        })
    }
}
