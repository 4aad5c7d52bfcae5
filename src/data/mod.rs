//! Data module - crash record loading, caching and filtering

mod cache;
pub mod columns;
mod loader;
mod processor;
mod record;

pub use cache::CrashDataCache;
pub use loader::{
    numeric_columns, DataLoader, FileFormat, LoadOptions, LoaderError, DEFAULT_FILE_PREFIX,
};
pub use processor::{DataProcessor, ProcessorError};
pub use record::CrashRecord;
