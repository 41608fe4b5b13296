use thiserror::Error;

use scanstage_kv::KVError;

use crate::detector::BatchCheck;
use crate::model::CommitReport;
use crate::remote::RemoteError;

// ── Staging ─────────────────────────────────────────────────────────

/// Why an entry could not be added to the StagingStore. The batch is
/// unchanged when either is returned.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StagingError {
    #[error("serial number {0} is already in the batch")]
    DuplicateSerial(String),

    #[error("batch is full ({0} entries)")]
    BatchFull(usize),
}

/// Removal of a serial that is not staged.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("serial number {0} is not in the batch")]
pub struct NotStaged(pub String);

// ── Persistence ─────────────────────────────────────────────────────

/// Mirror read/write failure. Never fatal: a failed load means an empty
/// batch, a failed save leaves the in-memory batch authoritative.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("mirror storage: {0}")]
    Storage(#[from] KVError),

    #[error("mirror encoding: {0}")]
    Encoding(#[from] serde_json::Error),
}

// ── Admission ───────────────────────────────────────────────────────

/// Why a scan (or an import) was not admitted into the batch.
#[derive(Debug, Error)]
pub enum AdmissionError {
    #[error("{field} is required")]
    EmptyField { field: &'static str },

    #[error("quantity must be at least 1")]
    InvalidQuantity,

    #[error("serial number {0} is already in the batch")]
    DuplicateWithinBatch(String),

    #[error("invoice {0} is already registered")]
    InvoiceAlreadyExists(String),

    #[error("serial number {0} is already registered")]
    SerialAlreadyExists(String),

    #[error("invoice {invoice} and serial number {serial} are already registered")]
    InvoiceAndSerialExist { invoice: String, serial: String },

    #[error("batch is full ({0} entries)")]
    BatchFull(usize),

    #[error("row {row}: {field} is required")]
    InvalidRow { row: usize, field: &'static str },

    #[error("duplicate check unavailable: {0}")]
    DetectionUnavailable(#[source] RemoteError),
}

impl From<StagingError> for AdmissionError {
    fn from(e: StagingError) -> Self {
        match e {
            StagingError::DuplicateSerial(serial) => AdmissionError::DuplicateWithinBatch(serial),
            StagingError::BatchFull(cap) => AdmissionError::BatchFull(cap),
        }
    }
}

// ── Commit ──────────────────────────────────────────────────────────

/// Why a commit did not finish. Every variant leaves unacknowledged
/// entries staged for retry.
#[derive(Debug, Error)]
pub enum CommitError {
    #[error("commit blocked: {0}")]
    ValidationFailed(BatchCheck),

    #[error("chunk {chunk} rejected: {reason} ({report})")]
    PartialFailure {
        report: CommitReport,
        chunk: usize,
        reason: String,
    },

    #[error("duplicate check unavailable: {0}")]
    DetectionUnavailable(#[source] RemoteError),

    #[error("chunk {chunk} failed in transit: {source} ({report})")]
    TransportError {
        report: CommitReport,
        chunk: usize,
        #[source]
        source: RemoteError,
    },
}

impl CommitError {
    /// Progress made before the failure, when any chunk was attempted.
    pub fn report(&self) -> Option<&CommitReport> {
        match self {
            CommitError::PartialFailure { report, .. }
            | CommitError::TransportError { report, .. } => Some(report),
            CommitError::ValidationFailed(_) | CommitError::DetectionUnavailable(_) => None,
        }
    }
}
