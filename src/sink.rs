//! Output sinks for emitted implementation units.

use crate::error::{GeneratorError, Result};
use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};

/// One generated file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceUnit {
    /// Module path of the implemented trait, without `crate`
    pub module_path: Vec<String>,
    /// Name of the generated type
    pub name: String,
    pub file_name: String,
    pub content: String,
    /// Source file the unit was generated from
    pub origin: PathBuf,
}

impl SourceUnit {
    /// `a/b/<file_name>` for a trait in `crate::a::b`
    pub fn relative_path(&self) -> PathBuf {
        let mut path: PathBuf = self.module_path.iter().collect();
        path.push(&self.file_name);
        path
    }
}

/// What a sink did with a unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    Written(PathBuf),
    /// The destination already held identical content
    Unchanged(PathBuf),
}

/// Destination for generated units.
pub trait OutputSink {
    /// Stores one unit.
    ///
    /// # Errors
    ///
    /// Returns [`GeneratorError::Io`] if the unit cannot be stored.
    fn write(&mut self, unit: &SourceUnit) -> Result<WriteOutcome>;
}

/// Writes units below an output directory, mirroring the module tree.
pub struct FileSink {
    out_dir: PathBuf,
    cargo_directives: bool,
}

impl FileSink {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
            cargo_directives: false,
        }
    }

    /// Prints `cargo:rerun-if-changed=<origin>` for every unit, for use in build scripts
    pub fn with_cargo_directives(mut self, enabled: bool) -> Self {
        self.cargo_directives = enabled;
        self
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }
}

impl OutputSink for FileSink {
    fn write(&mut self, unit: &SourceUnit) -> Result<WriteOutcome> {
        let path = self.out_dir.join(unit.relative_path());

        if self.cargo_directives {
            println!("cargo:rerun-if-changed={}", unit.origin.display());
        }

        if let Ok(existing) = fs::read_to_string(&path) {
            if existing == unit.content {
                debug!("Unchanged: {}", path.display());
                return Ok(WriteOutcome::Unchanged(path));
            }
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| GeneratorError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        write_atomic(&path, &unit.content)?;
        info!("Wrote {}", path.display());
        Ok(WriteOutcome::Written(path))
    }
}

/// Writes content through a temp file and a rename, so readers never see a partial file.
///
/// # Errors
///
/// Returns an error if:
/// - The temp file cannot be written
/// - The rename operation fails
pub fn write_atomic(path: &Path, content: &str) -> Result<()> {
    let temp_path = path.with_extension("rs.tmp");
    fs::write(&temp_path, content).map_err(|source| GeneratorError::Io {
        path: temp_path.clone(),
        source,
    })?;

    fs::rename(&temp_path, path).map_err(|source| GeneratorError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Keeps units in memory, for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub units: Vec<SourceUnit>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&SourceUnit> {
        self.units.iter().find(|unit| unit.name == name)
    }
}

impl OutputSink for MemorySink {
    fn write(&mut self, unit: &SourceUnit) -> Result<WriteOutcome> {
        let outcome = match self.units.iter_mut().find(|u| u.name == unit.name && u.module_path == unit.module_path) {
            Some(existing) if existing.content == unit.content => WriteOutcome::Unchanged(unit.relative_path()),
            Some(existing) => {
                *existing = unit.clone();
                WriteOutcome::Written(unit.relative_path())
            }
            None => {
                self.units.push(unit.clone());
                WriteOutcome::Written(unit.relative_path())
            }
        };
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn unit(content: &str) -> SourceUnit {
        SourceUnit {
            module_path: vec!["net".to_string(), "api".to_string()],
            name: "PostsApiImpl".to_string(),
            file_name: "posts_api_impl.rs".to_string(),
            content: content.to_string(),
            origin: PathBuf::from("src/net/api.rs"),
        }
    }

    #[test]
    fn test_relative_path_mirrors_module_tree() {
        assert_eq!(
            unit("").relative_path(),
            PathBuf::from("net").join("api").join("posts_api_impl.rs")
        );

        let mut root = unit("");
        root.module_path.clear();
        assert_eq!(root.relative_path(), PathBuf::from("posts_api_impl.rs"));
    }

    #[test]
    fn test_file_sink_writes_and_skips_unchanged() {
        let temp_dir = TempDir::new().unwrap();
        let mut sink = FileSink::new(temp_dir.path());

        let first = sink.write(&unit("pub struct PostsApiImpl;\n")).unwrap();
        let path = temp_dir.path().join("net/api/posts_api_impl.rs");
        assert_eq!(first, WriteOutcome::Written(path.clone()));
        assert_eq!(fs::read_to_string(&path).unwrap(), "pub struct PostsApiImpl;\n");

        let second = sink.write(&unit("pub struct PostsApiImpl;\n")).unwrap();
        assert_eq!(second, WriteOutcome::Unchanged(path.clone()));

        let third = sink.write(&unit("pub struct PostsApiImpl {}\n")).unwrap();
        assert_eq!(third, WriteOutcome::Written(path.clone()));
        assert_eq!(fs::read_to_string(&path).unwrap(), "pub struct PostsApiImpl {}\n");
        assert!(!path.with_extension("rs.tmp").exists());
    }

    #[test]
    fn test_write_atomic_reports_io_errors() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("missing/dir/file.rs");

        let err = write_atomic(&missing, "x").unwrap_err();
        assert!(matches!(err, GeneratorError::Io { .. }));
    }

    #[test]
    fn test_memory_sink_replaces_units() {
        let mut sink = MemorySink::new();

        assert!(matches!(sink.write(&unit("a")).unwrap(), WriteOutcome::Written(_)));
        assert!(matches!(sink.write(&unit("a")).unwrap(), WriteOutcome::Unchanged(_)));
        assert!(matches!(sink.write(&unit("b")).unwrap(), WriteOutcome::Written(_)));

        assert_eq!(sink.units.len(), 1);
        assert_eq!(sink.get("PostsApiImpl").unwrap().content, "b");
    }
}
