use anyhow::{bail, Context, Result};
use log::{debug, warn};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// File scanner for discovering the Rust sources of a crate.
///
/// The `FileScanner` recursively walks a source directory to find all `.rs` files. It skips
/// `target` and hidden directories, plus any explicitly excluded paths (typically the
/// generator's own output directory when it lives inside the source tree). Files are
/// returned sorted so that generation order, and therefore output, is reproducible.
///
/// # Example
///
/// ```no_run
/// use client_from_source::scanner::FileScanner;
/// use std::path::PathBuf;
///
/// let scanner = FileScanner::new(PathBuf::from("./src"));
/// let result = scanner.scan().unwrap();
/// println!("Found {} Rust files", result.rust_files.len());
/// ```
pub struct FileScanner {
    root_path: PathBuf,
    excluded: Vec<PathBuf>,
}

/// Result of a directory scan.
pub struct ScanResult {
    /// Sorted paths of all discovered `.rs` files
    pub rust_files: Vec<PathBuf>,
    /// Warning messages for entries that could not be accessed
    pub warnings: Vec<String>,
}

impl FileScanner {
    pub fn new(root_path: PathBuf) -> Self {
        Self {
            root_path,
            excluded: Vec::new(),
        }
    }

    /// Skips everything below `path` during the walk.
    ///
    /// Excludes and the root are compared after resolving `.`, `..` and symlinks, so an
    /// exclude matches however either side is spelled. An exclude that does not exist yet
    /// cannot contain anything and is ignored.
    pub fn exclude(mut self, path: impl Into<PathBuf>) -> Self {
        self.excluded.push(path.into());
        self
    }

    pub fn root(&self) -> &Path {
        &self.root_path
    }

    /// Scans the directory tree and collects all `.rs` files.
    ///
    /// Inaccessible entries are logged and recorded as warnings; scanning continues.
    ///
    /// # Errors
    ///
    /// Returns an error if the root is not a directory.
    pub fn scan(&self) -> Result<ScanResult> {
        if !self.root_path.is_dir() {
            bail!("Source path is not a directory: {}", self.root_path.display());
        }

        let canonical_root = self
            .root_path
            .canonicalize()
            .with_context(|| format!("Failed to resolve source path: {}", self.root_path.display()))?;
        let excluded: Vec<PathBuf> = self
            .excluded
            .iter()
            .filter_map(|path| path.canonicalize().ok())
            .collect();

        let mut rust_files = Vec::new();
        let mut warnings = Vec::new();

        for entry in WalkDir::new(&self.root_path).into_iter().filter_entry(|e| {
            if e.path() == self.root_path {
                return true;
            }
            let relative = e.path().strip_prefix(&self.root_path).unwrap_or(e.path());
            let resolved = canonical_root.join(relative);
            if excluded.iter().any(|ex| resolved.starts_with(ex)) {
                debug!("Skipping excluded path: {}", e.path().display());
                return false;
            }

            let file_name = e.file_name().to_string_lossy();
            !file_name.starts_with('.') && file_name != "target"
        }) {
            match entry {
                Ok(entry) => {
                    let path = entry.path();
                    if path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("rs") {
                        rust_files.push(path.to_path_buf());
                    }
                }
                Err(e) => {
                    let warning = format!("Failed to access path: {}", e);
                    warn!("{}", warning);
                    warnings.push(warning);
                }
            }
        }

        rust_files.sort();
        debug!(
            "Scanned {}: {} Rust files",
            self.root_path.display(),
            rust_files.len()
        );

        Ok(ScanResult {
            rust_files,
            warnings,
        })
    }
}
