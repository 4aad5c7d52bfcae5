//! Process-lifetime memo of loaded-and-cleaned crash tables.

use super::loader::{DataLoader, LoadOptions, LoaderError};
use super::processor::DataProcessor;
use polars::prelude::*;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Loads each source path once and hands out shared, read-only tables.
///
/// Cloning the cache shares the underlying storage, so a background loader
/// thread and the UI see the same entries.
#[derive(Clone, Default)]
pub struct CrashDataCache {
    options: LoadOptions,
    tables: Arc<Mutex<HashMap<PathBuf, Arc<DataFrame>>>>,
}

impl CrashDataCache {
    pub fn new(options: LoadOptions) -> Self {
        Self {
            options,
            tables: Arc::default(),
        }
    }

    /// Return the cleaned table for `path`, reading it from disk on first use.
    ///
    /// The cached table has rows without coordinates already removed.
    pub fn get_or_load(&self, path: &Path) -> Result<Arc<DataFrame>, LoaderError> {
        if let Some(df) = self.lock().get(path) {
            log::debug!("Cache hit for {}", path.display());
            return Ok(Arc::clone(df));
        }

        let raw = DataLoader::read_path(path, &self.options)?;
        let cleaned = DataProcessor::drop_missing_positions(&raw).map_err(|e| match e {
            super::ProcessorError::PolarsError(source) => LoaderError::Parse {
                path: path.to_path_buf(),
                source,
            },
        })?;
        let shared = Arc::new(cleaned);

        self.lock()
            .insert(path.to_path_buf(), Arc::clone(&shared));
        Ok(shared)
    }

    /// Whether `path` has already been loaded.
    pub fn contains(&self, path: &Path) -> bool {
        self.lock().contains_key(path)
    }

    /// Forget every cached table.
    pub fn invalidate(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<PathBuf, Arc<DataFrame>>> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
