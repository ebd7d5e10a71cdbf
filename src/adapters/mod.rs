//! Adapters layer: concrete implementations of the pipeline's seams.
//!
//! - `dataset`: CSV ingestion and partition persistence (csv crate)
//! - `store`: filesystem-backed artifact store (JSON documents)

pub mod dataset;
pub mod store;

pub use dataset::DatasetError;
pub use store::{FsModelStore, StoreError};
