//! Core domain types, ledger validation, text normalization and batch
//! packaging for donation receipt generation.

pub mod amount;
pub mod batch;
pub mod error;
pub mod ledger;
pub mod normalize;
pub mod types;

pub use amount::AmountFormatter;
pub use batch::{
    BatchOutcome, BatchProcessor, BatchRequest, CollisionPolicy, ReceiptArchive, ReceiptRenderer,
    RowRange, ARCHIVE_FILENAME, ARCHIVE_MIME_TYPE,
};
pub use error::{Error, Result};
pub use ledger::{LedgerRecord, LedgerTable, REQUIRED_COLUMNS};
pub use normalize::{FilenameBuilder, NameNormalizer};
pub use types::{
    CellValue, LedgerRow, NormalizedReceipt, OrganizationProfile, RawTable, ReceiptDocument,
};
