use crate::annotations::DEFAULT_NAMESPACE;
use crate::emitter::DEFAULT_RUNTIME_PATH;
use crate::error::{GeneratorError, Result};
use std::path::PathBuf;

/// Generator settings shared by the CLI and build scripts.
///
/// # Example
///
/// A `build.rs` generating into `OUT_DIR`:
///
/// ```no_run
/// use client_from_source::config::GeneratorConfig;
/// use client_from_source::generator::Generator;
/// use client_from_source::sink::FileSink;
/// use std::path::Path;
///
/// let config = GeneratorConfig {
///     cargo_directives: true,
///     ..GeneratorConfig::default()
/// };
/// let out_dir = std::env::var("OUT_DIR").unwrap();
/// let mut sink = FileSink::new(&out_dir).with_cargo_directives(config.cargo_directives);
/// Generator::new(config).unwrap().run(Path::new("src"), &mut sink).unwrap();
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorConfig {
    /// Crate or module path declaring the marker attributes in the scanned sources; this
    /// crate declares none of them
    pub namespace: String,
    /// Path generated code uses to reach the runtime module
    pub runtime_path: String,
    /// Stop at the first failing interface instead of reporting all of them
    pub fail_fast: bool,
    /// Emit `cargo:rerun-if-changed` for every source a unit depends on
    pub cargo_directives: bool,
    /// Paths below the source root that are not scanned
    pub exclude: Vec<PathBuf>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            runtime_path: DEFAULT_RUNTIME_PATH.to_string(),
            fail_fast: true,
            cargo_directives: false,
            exclude: Vec::new(),
        }
    }
}

impl GeneratorConfig {
    /// Checks that the namespace and runtime path are Rust paths.
    ///
    /// # Errors
    ///
    /// Returns [`GeneratorError::Config`] naming the offending setting.
    pub fn validate(&self) -> Result<()> {
        for (setting, value) in [("namespace", &self.namespace), ("runtime path", &self.runtime_path)] {
            if syn::parse_str::<syn::Path>(value).is_err() {
                return Err(GeneratorError::Config(format!(
                    "{} '{}' is not a Rust path",
                    setting, value
                )));
            }
        }
        Ok(())
    }
}
