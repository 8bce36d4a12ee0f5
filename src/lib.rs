// Export modules
pub mod catalog;
pub mod config;
pub mod dataset;
pub mod error;
pub mod store;
pub mod table;

// Re-export commonly used types
pub use catalog::{Catalog, ClassEntry};
pub use config::{Config, RunMode, SizeMode};
pub use dataset::{DatasetBuilder, SampleDims};
pub use error::{Error, Result};
pub use store::{PathRecord, RecordStore};
pub use table::PathTable;
