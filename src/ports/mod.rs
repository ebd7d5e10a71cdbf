//! Ports layer: trait definitions for the seams of the pipeline.
//!
//! Following Hexagonal Architecture, these traits define the boundaries
//! between the application services and the classifier/persistence
//! implementations.

mod classifier;
mod model_store;

pub(crate) use classifier::check_fit_input;
pub use classifier::{BinaryClassifier, TrainError};
pub use model_store::ModelStore;
