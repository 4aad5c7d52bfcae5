//! Crash Record Loader
//! Finds `CRASH*` extracts in a directory and reads them into one table using Polars.
//!
//! A file that fails to parse, or that misses a whitelisted column, aborts
//! the whole load.

use super::columns::{COORDINATE_COLUMNS, COUNT_COLUMNS, REQUIRED_COLUMNS};
use super::record::CrashRecord;
use polars::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// Default file name prefix of the PennDOT extracts.
pub const DEFAULT_FILE_PREFIX: &str = "CRASH";

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Data directory not found: {}", .0.display())]
    DirectoryNotFound(PathBuf),
    #[error("No files matching '{prefix}*' in {}", .dir.display())]
    NoMatchingFiles { dir: PathBuf, prefix: String },
    #[error("{}: missing required column '{column}'", .path.display())]
    MissingColumn { path: PathBuf, column: String },
    #[error("Failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: PolarsError,
    },
    #[error("Unsupported file format: {}", .0.display())]
    UnsupportedFormat(PathBuf),
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("No data loaded")]
    NoData,
}

/// Tabular formats the loader understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Csv,
    Parquet,
}

impl FileFormat {
    /// Detect the format from the file extension (case-insensitive).
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "csv" => Some(Self::Csv),
            "parquet" => Some(Self::Parquet),
            _ => None,
        }
    }
}

/// How a directory is scanned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadOptions {
    /// Only files whose name starts with this prefix are read.
    pub file_prefix: String,
    /// Treat a directory without matching files as an error instead of an
    /// empty table.
    pub require_non_empty: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            file_prefix: DEFAULT_FILE_PREFIX.to_string(),
            require_non_empty: false,
        }
    }
}

/// Holds the crash table currently shown by the application.
pub struct DataLoader {
    options: LoadOptions,
    df: Option<Arc<DataFrame>>,
    source: Option<PathBuf>,
}

impl Default for DataLoader {
    fn default() -> Self {
        Self::new(LoadOptions::default())
    }
}

impl DataLoader {
    pub fn new(options: LoadOptions) -> Self {
        Self {
            options,
            df: None,
            source: None,
        }
    }

    /// Load a directory of extracts or a single file and keep the result.
    pub fn load(&mut self, path: &Path) -> Result<&DataFrame, LoaderError> {
        let df = Self::read_path(path, &self.options)?;
        self.set_dataframe(Arc::new(df), path.to_path_buf());
        self.get_dataframe().ok_or(LoaderError::NoData)
    }

    /// Read `path` as a directory of extracts, or as one file when it is a file.
    pub fn read_path(path: &Path, options: &LoadOptions) -> Result<DataFrame, LoaderError> {
        if path.is_file() {
            Self::read_file(path)
        } else {
            Self::read_directory(path, options)
        }
    }

    /// List the files in `dir` that the loader would read, sorted by name.
    pub fn matching_files(dir: &Path, prefix: &str) -> Result<Vec<PathBuf>, LoaderError> {
        if !dir.is_dir() {
            return Err(LoaderError::DirectoryNotFound(dir.to_path_buf()));
        }

        let io_err = |source| LoaderError::Io {
            path: dir.to_path_buf(),
            source,
        };

        let mut files = Vec::new();
        for entry in fs::read_dir(dir).map_err(io_err)? {
            let path = entry.map_err(io_err)?.path();
            if !path.is_file() || FileFormat::from_path(&path).is_none() {
                continue;
            }
            let matches = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|name| name.starts_with(prefix));
            if matches {
                files.push(path);
            }
        }

        files.sort();
        Ok(files)
    }

    /// Read and concatenate every matching file in `dir`.
    ///
    /// An empty directory yields an empty table with the whitelist schema
    /// unless `options.require_non_empty` is set.
    pub fn read_directory(dir: &Path, options: &LoadOptions) -> Result<DataFrame, LoaderError> {
        Self::concat_directory(dir, options, Self::read_file)
    }

    /// Like [`DataLoader::read_path`], but keeps every column of the source
    /// files as inferred. Used for exploratory summaries.
    pub fn read_raw_path(path: &Path, options: &LoadOptions) -> Result<DataFrame, LoaderError> {
        if path.is_file() {
            Self::read_raw_file(path)
        } else {
            Self::concat_directory(path, options, Self::read_raw_file)
        }
    }

    fn concat_directory(
        dir: &Path,
        options: &LoadOptions,
        read: fn(&Path) -> Result<DataFrame, LoaderError>,
    ) -> Result<DataFrame, LoaderError> {
        let files = Self::matching_files(dir, &options.file_prefix)?;

        if files.is_empty() {
            if options.require_non_empty {
                return Err(LoaderError::NoMatchingFiles {
                    dir: dir.to_path_buf(),
                    prefix: options.file_prefix.clone(),
                });
            }
            log::warn!(
                "No '{}*' files found in {}, returning an empty table",
                options.file_prefix,
                dir.display()
            );
            return CrashRecord::empty_dataframe().map_err(|source| LoaderError::Parse {
                path: dir.to_path_buf(),
                source,
            });
        }

        let mut combined: Option<DataFrame> = None;
        for path in &files {
            let df = read(path)?;
            log::info!("Loaded {} rows from {}", df.height(), path.display());

            match combined.as_mut() {
                Some(acc) => {
                    acc.vstack_mut(&df).map_err(|source| LoaderError::Parse {
                        path: path.clone(),
                        source,
                    })?;
                }
                None => combined = Some(df),
            }
        }

        let df = combined.ok_or(LoaderError::NoData)?;
        log::info!(
            "Loaded {} crash records from {} file(s) in {}",
            df.height(),
            files.len(),
            dir.display()
        );
        Ok(df)
    }

    /// Read a single CSV or Parquet file restricted to the column whitelist.
    pub fn read_file(path: &Path) -> Result<DataFrame, LoaderError> {
        let parse_err = |source| LoaderError::Parse {
            path: path.to_path_buf(),
            source,
        };

        let mut lazy = Self::scan(path)?;
        let schema = lazy.collect_schema().map_err(parse_err)?;
        if let Some(column) = REQUIRED_COLUMNS
            .iter()
            .find(|&&name| schema.get(name).is_none())
        {
            return Err(LoaderError::MissingColumn {
                path: path.to_path_buf(),
                column: column.to_string(),
            });
        }

        lazy.select(Self::typed_columns())
            .collect()
            .map_err(parse_err)
    }

    /// Read a single file with every column.
    pub fn read_raw_file(path: &Path) -> Result<DataFrame, LoaderError> {
        Self::scan(path)?
            .collect()
            .map_err(|source| LoaderError::Parse {
                path: path.to_path_buf(),
                source,
            })
    }

    fn scan(path: &Path) -> Result<LazyFrame, LoaderError> {
        let format = FileFormat::from_path(path)
            .ok_or_else(|| LoaderError::UnsupportedFormat(path.to_path_buf()))?;

        match format {
            FileFormat::Csv => LazyCsvReader::new(path)
                .with_has_header(true)
                .with_infer_schema_length(Some(10000))
                .finish(),
            FileFormat::Parquet => LazyFrame::scan_parquet(path, ScanArgsParquet::default()),
        }
        .map_err(|source| LoaderError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Whitelist projection with strict casts, so a non-numeric value fails
    /// the load instead of turning into a null.
    fn typed_columns() -> Vec<Expr> {
        COUNT_COLUMNS
            .iter()
            .map(|&name| col(name).strict_cast(DataType::Int64))
            .chain(
                COORDINATE_COLUMNS
                    .iter()
                    .map(|&name| col(name).strict_cast(DataType::Float64)),
            )
            .collect()
    }

    /// Get the number of rows in the DataFrame.
    pub fn get_row_count(&self) -> usize {
        self.df.as_ref().map(|df| df.height()).unwrap_or(0)
    }

    /// Get a reference to the loaded DataFrame.
    pub fn get_dataframe(&self) -> Option<&DataFrame> {
        self.df.as_deref()
    }

    /// Where the current table came from.
    pub fn get_source(&self) -> Option<&PathBuf> {
        self.source.as_ref()
    }

    /// Set DataFrame directly (used for background loading)
    pub fn set_dataframe(&mut self, df: Arc<DataFrame>, source: PathBuf) {
        self.df = Some(df);
        self.source = Some(source);
    }
}

/// Get list of numeric column names.
pub fn numeric_columns(df: &DataFrame) -> Vec<String> {
    df.get_columns()
        .iter()
        .filter(|col| {
            matches!(
                col.dtype(),
                DataType::Float32
                    | DataType::Float64
                    | DataType::Int8
                    | DataType::Int16
                    | DataType::Int32
                    | DataType::Int64
                    | DataType::UInt8
                    | DataType::UInt16
                    | DataType::UInt32
                    | DataType::UInt64
            )
        })
        .map(|col| col.name().to_string())
        .collect()
}
