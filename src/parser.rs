use anyhow::{Context, Result};
use log::{debug, warn};
use std::fs;
use std::path::{Component, Path, PathBuf};

/// AST parser for Rust source files.
///
/// The `AstParser` uses the `syn` crate to parse Rust source code into a syntax tree and
/// records the module path the file is mounted at, so generated code can be placed next to
/// the traits it implements.
///
/// # Example
///
/// ```no_run
/// use client_from_source::parser::AstParser;
/// use std::path::Path;
///
/// let parsed = AstParser::parse_file(Path::new("src/net/api.rs"), Path::new("src")).unwrap();
/// assert_eq!(parsed.module_path, vec!["net", "api"]);
/// ```
pub struct AstParser;

/// A successfully parsed Rust file with its abstract syntax tree.
#[derive(Debug)]
pub struct ParsedFile {
    /// Path to the source file
    pub path: PathBuf,
    /// Module path of the file relative to the crate root, without `crate`
    pub module_path: Vec<String>,
    /// The parsed abstract syntax tree
    pub syntax_tree: syn::File,
}

impl ParsedFile {
    /// Wraps already parsed source, used when the caller owns the text
    pub fn from_source(path: impl Into<PathBuf>, module_path: Vec<String>, source: &str) -> Result<Self> {
        let path = path.into();
        let syntax_tree = syn::parse_file(source)
            .with_context(|| format!("Failed to parse Rust syntax in file: {}", path.display()))?;
        Ok(Self {
            path,
            module_path,
            syntax_tree,
        })
    }
}

impl AstParser {
    /// Parses a single Rust source file into an AST.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the Rust source file to parse
    /// * `source_root` - The crate's source directory, used to derive the module path
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file cannot be read
    /// - The file contains invalid Rust syntax
    pub fn parse_file(path: &Path, source_root: &Path) -> Result<ParsedFile> {
        debug!("Parsing file: {}", path.display());

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read file: {}", path.display()))?;

        let syntax_tree = syn::parse_file(&content)
            .with_context(|| format!("Failed to parse Rust syntax in file: {}", path.display()))?;

        let module_path = module_path_for(path, source_root);
        debug!(
            "Successfully parsed file: {} (module crate{})",
            path.display(),
            module_path.iter().map(|s| format!("::{}", s)).collect::<String>()
        );

        Ok(ParsedFile {
            path: path.to_path_buf(),
            module_path,
            syntax_tree,
        })
    }

    /// Parses multiple Rust source files, continuing even if some fail.
    ///
    /// Files that fail to parse are logged as warnings; the caller decides whether a failure
    /// is fatal.
    pub fn parse_files(paths: &[PathBuf], source_root: &Path) -> Vec<Result<ParsedFile>> {
        debug!("Parsing {} files", paths.len());

        let results: Vec<Result<ParsedFile>> = paths
            .iter()
            .map(|path| match Self::parse_file(path, source_root) {
                Ok(parsed) => Ok(parsed),
                Err(e) => {
                    warn!("Failed to parse {}: {}", path.display(), e);
                    Err(e)
                }
            })
            .collect();

        let success_count = results.iter().filter(|r| r.is_ok()).count();
        debug!(
            "Parsing complete: {} succeeded, {} failed",
            success_count,
            results.len() - success_count
        );

        results
    }
}

/// Derives the module path of a file from its location under the source root.
///
/// `lib.rs` and `main.rs` at the root are the crate root, `a/mod.rs` is `a`,
/// `a/b.rs` is `a::b`.
pub fn module_path_for(path: &Path, source_root: &Path) -> Vec<String> {
    let Ok(relative) = path.strip_prefix(source_root) else {
        return Vec::new();
    };

    let mut segments: Vec<String> = relative
        .parent()
        .map(|dir| {
            dir.components()
                .filter_map(|c| match c {
                    Component::Normal(name) => Some(name.to_string_lossy().to_string()),
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default();

    let stem = relative
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();

    let is_root = segments.is_empty() && (stem == "lib" || stem == "main");
    if stem != "mod" && !is_root {
        segments.push(stem);
    }

    segments
}
