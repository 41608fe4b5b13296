pub mod autoscan;
pub mod committer;
pub mod config;
pub mod detector;
pub mod error;
pub mod import;
pub mod mirror;
pub mod model;
pub mod remote;
pub mod service;
pub mod staging;
pub mod summary;

pub use config::{ConfigError, PipelineConfig};
pub use detector::BatchCheck;
pub use error::{AdmissionError, CommitError, NotStaged, PersistenceError, StagingError};
pub use model::{
    fold_key, CatalogItem, CatalogPage, CommitReport, InvoiceGroup, ItemGroup, ScanCandidate,
    ScanEntry, Summary,
};
pub use remote::{HttpRemote, NoAuth, RemoteError, RemoteStore, StaticToken, TokenSource};
pub use service::InboundService;
