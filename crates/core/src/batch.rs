//! Batch processing: select ledger rows, render each, and package the results.

use crate::{Error, LedgerRow, LedgerTable, RawTable, ReceiptDocument, Result};
use std::collections::HashMap;
use std::io::{Cursor, Seek, Write};
use zip::write::FileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

/// Filename offered for the downloadable archive.
pub const ARCHIVE_FILENAME: &str = "donation_receipts.zip";

/// MIME type of the downloadable archive.
pub const ARCHIVE_MIME_TYPE: &str = "application/zip";

/// Turns one ledger row into one document.
pub trait ReceiptRenderer {
    /// Render a row. Must be a pure function of the row.
    fn render(&self, row: &LedgerRow) -> Result<ReceiptDocument>;
}

impl<R: ReceiptRenderer + ?Sized> ReceiptRenderer for &R {
    fn render(&self, row: &LedgerRow) -> Result<ReceiptDocument> {
        (**self).render(row)
    }
}

/// What to do when two rows produce the same filename.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CollisionPolicy {
    /// The later document replaces the earlier one.
    Overwrite,
    /// The later document is renamed with its row index appended.
    #[default]
    Disambiguate,
}

/// Inclusive range of zero-based table positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowRange {
    pub start: usize,
    pub end: usize,
}

impl RowRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// A range covering one row.
    pub fn single(index: usize) -> Self {
        Self::new(index, index)
    }

    /// A range covering every row of a table with `len` rows.
    pub fn all(len: usize) -> Self {
        Self::new(0, len.saturating_sub(1))
    }

    /// Number of rows covered; a valid range covers at least one.
    pub fn count(&self) -> usize {
        self.end.saturating_sub(self.start) + 1
    }

    /// Check the range against a table of `len` rows.
    pub fn validate(&self, len: usize) -> Result<()> {
        if len == 0 {
            return Err(Error::EmptyResultError("no rows to select from".to_string()));
        }
        if self.start > self.end || self.end >= len {
            return Err(Error::EmptyResultError(format!(
                "range {}..={} is not within 0..={}",
                self.start,
                self.end,
                len - 1
            )));
        }
        Ok(())
    }
}

/// Options for one batch run.
#[derive(Debug, Clone, Default)]
pub struct BatchRequest {
    /// Keep only rows whose address contains this text, ignoring case.
    pub filter_text: Option<String>,

    /// Rows to render, in filtered-table positions. `None` means all rows.
    pub range: Option<RowRange>,

    pub collision_policy: CollisionPolicy,
}

impl BatchRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_filter(mut self, filter_text: impl Into<String>) -> Self {
        self.filter_text = Some(filter_text.into());
        self
    }

    pub fn with_range(mut self, start: usize, end: usize) -> Self {
        self.range = Some(RowRange::new(start, end));
        self
    }

    pub fn with_collision_policy(mut self, policy: CollisionPolicy) -> Self {
        self.collision_policy = policy;
        self
    }
}

/// Generated documents keyed by unique filename, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct ReceiptArchive {
    documents: Vec<ReceiptDocument>,
    positions: HashMap<String, usize>,
}

impl ReceiptArchive {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn contains(&self, filename: &str) -> bool {
        self.positions.contains_key(filename)
    }

    pub fn get(&self, filename: &str) -> Option<&ReceiptDocument> {
        self.positions.get(filename).map(|&i| &self.documents[i])
    }

    /// Filenames in insertion order.
    pub fn filenames(&self) -> impl Iterator<Item = &str> {
        self.documents.iter().map(|d| d.filename.as_str())
    }

    /// Insert a document, returning the one it replaced under the same name.
    pub fn insert(&mut self, document: ReceiptDocument) -> Option<ReceiptDocument> {
        match self.positions.get(&document.filename) {
            Some(&i) => Some(std::mem::replace(&mut self.documents[i], document)),
            None => {
                self.positions
                    .insert(document.filename.clone(), self.documents.len());
                self.documents.push(document);
                None
            }
        }
    }

    /// Write the archive as a deflate-compressed ZIP.
    ///
    /// Entry timestamps are fixed, so equal archives serialize identically.
    pub fn write_zip<W: Write + Seek>(&self, writer: W) -> Result<W> {
        let mut zip = ZipWriter::new(writer);
        let options = FileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .last_modified_time(DateTime::default());

        for document in &self.documents {
            zip.start_file(document.filename.as_str(), options)?;
            zip.write_all(&document.bytes)?;
        }

        Ok(zip.finish()?)
    }

    /// The ZIP serialization as bytes.
    pub fn to_zip_bytes(&self) -> Result<Vec<u8>> {
        Ok(self.write_zip(Cursor::new(Vec::new()))?.into_inner())
    }
}

/// Result of a batch run.
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    pub archive: ReceiptArchive,

    /// Rows left after filtering.
    pub matched: usize,

    /// Documents rendered (equals archive entries unless some were overwritten).
    pub generated: usize,
}

/// Runs the row-to-receipt pipeline over a ledger.
#[derive(Debug, Clone)]
pub struct BatchProcessor<R> {
    renderer: R,
}

impl<R: ReceiptRenderer> BatchProcessor<R> {
    pub fn new(renderer: R) -> Self {
        Self { renderer }
    }

    /// Validate, filter, select and render, returning the archive.
    ///
    /// Any row failure aborts the whole batch and no archive is returned.
    pub fn process(&self, raw: &RawTable, request: &BatchRequest) -> Result<BatchOutcome> {
        let table = LedgerTable::from_raw(raw)?;
        let table = self.select(&table, request.filter_text.as_deref())?;
        let range = request.range.unwrap_or_else(|| RowRange::all(table.len()));
        let archive = self.generate(&table, range, request.collision_policy)?;

        Ok(BatchOutcome {
            matched: table.len(),
            generated: range.count(),
            archive,
        })
    }

    /// Apply the optional address filter; an empty result is an error.
    pub fn select(&self, table: &LedgerTable, filter_text: Option<&str>) -> Result<LedgerTable> {
        let selected = match filter_text {
            Some(text) if !text.trim().is_empty() => table.filter_by_address(text),
            _ => table.clone(),
        };

        if selected.is_empty() {
            return Err(Error::EmptyResultError(match filter_text {
                Some(text) if !text.trim().is_empty() => {
                    format!("no entries match address filter '{}'", text.trim())
                }
                _ => "the ledger has no entries".to_string(),
            }));
        }

        Ok(selected)
    }

    /// Render rows `range` of `table` into an archive, in table order.
    pub fn generate(
        &self,
        table: &LedgerTable,
        range: RowRange,
        policy: CollisionPolicy,
    ) -> Result<ReceiptArchive> {
        range.validate(table.len())?;

        let mut archive = ReceiptArchive::new();
        for index in range.start..=range.end {
            let row = table.row(index)?;
            log::debug!("Rendering row {} (voucher '{}')", index, row.voucher_no);

            let mut document = self.renderer.render(&row)?;

            if archive.contains(&document.filename) {
                match policy {
                    CollisionPolicy::Overwrite => {
                        log::warn!(
                            "Row {} overwrites existing receipt '{}'",
                            index,
                            document.filename
                        );
                    }
                    CollisionPolicy::Disambiguate => {
                        let original = document.filename.clone();
                        document = disambiguate(&archive, document, index);
                        log::warn!(
                            "Row {} duplicates receipt '{}'; stored as '{}'",
                            index,
                            original,
                            document.filename
                        );
                    }
                }
            }

            archive.insert(document);
        }

        log::info!(
            "Generated {} receipts into {} archive entries",
            range.count(),
            archive.len()
        );
        Ok(archive)
    }
}

/// Rename `document` with the row index (and a counter if still taken).
fn disambiguate(archive: &ReceiptArchive, document: ReceiptDocument, index: usize) -> ReceiptDocument {
    let base = document.clone().with_stem_suffix(&format!("_{}", index));
    if !archive.contains(&base.filename) {
        return base;
    }

    let mut attempt = 2;
    loop {
        let candidate = document
            .clone()
            .with_stem_suffix(&format!("_{}-{}", index, attempt));
        if !archive.contains(&candidate.filename) {
            return candidate;
        }
        attempt += 1;
    }
}
