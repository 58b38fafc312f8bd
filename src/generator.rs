//! The generation pipeline: Scan → Validate → Resolve → Emit → Write.
//!
//! Interfaces are processed independently. Every interface is validated and resolved, and
//! every unit emitted, before anything is written, so a failing interface never leaves a
//! partial set of files behind when running fail-fast. With `fail_fast` disabled all
//! interfaces are attempted, the good ones are written, and the failures are reported
//! together.

use crate::annotations::{AnnotationModel, RuntimeTypes};
use crate::config::GeneratorConfig;
use crate::emitter::Emitter;
use crate::encoding::{self, BodyEncoding};
use crate::error::{GeneratorError, Result};
use crate::extractor::ServiceExtractor;
use crate::model::AnnotatedInterface;
use crate::parser::{AstParser, ParsedFile};
use crate::scanner::FileScanner;
use crate::sink::{OutputSink, SourceUnit, WriteOutcome};
use crate::validator;
use log::{debug, info, warn};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// A validated interface with the body encoding of each of its methods.
#[derive(Debug, Clone, Serialize)]
pub struct ServicePlan {
    pub interface: AnnotatedInterface,
    pub encodings: Vec<BodyEncoding>,
}

/// Everything known about a source tree before emission.
#[derive(Debug, Default)]
pub struct Analysis {
    pub files_scanned: usize,
    pub plans: Vec<ServicePlan>,
    /// Failures collected when not running fail-fast
    pub errors: Vec<GeneratorError>,
    pub warnings: Vec<String>,
}

/// Summary of a successful run.
#[derive(Debug, Default)]
pub struct GenerationReport {
    pub files_scanned: usize,
    /// Generated type names, in output order
    pub generated: Vec<String>,
    pub written: Vec<PathBuf>,
    pub unchanged: Vec<PathBuf>,
    pub warnings: Vec<String>,
}

/// Drives the pipeline for one configuration.
pub struct Generator {
    config: GeneratorConfig,
    model: AnnotationModel,
    types: RuntimeTypes,
    emitter: Emitter,
}

impl Generator {
    /// # Errors
    ///
    /// Returns [`GeneratorError::Config`] for an invalid namespace or runtime path.
    pub fn new(config: GeneratorConfig) -> Result<Self> {
        config.validate()?;
        let model = AnnotationModel::new(&config.namespace);
        let types = RuntimeTypes::new(&config.runtime_path);
        let emitter = Emitter::new(&config.runtime_path)?;
        Ok(Self {
            config,
            model,
            types,
            emitter,
        })
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Scans, parses, validates and resolves a source tree without emitting anything.
    ///
    /// # Errors
    ///
    /// Returns the first failure when running fail-fast; otherwise failures are collected
    /// in [`Analysis::errors`]. A source root that is not a directory always fails.
    pub fn analyze(&self, source_root: &Path) -> Result<Analysis> {
        info!("Scanning {}", source_root.display());
        let scanner = self
            .config
            .exclude
            .iter()
            .fold(FileScanner::new(source_root.to_path_buf()), |scanner, path| {
                scanner.exclude(path.clone())
            });
        let scan_result = scanner
            .scan()
            .map_err(|e| GeneratorError::Config(e.to_string()))?;
        info!("Found {} Rust files", scan_result.rust_files.len());

        let mut parsed_files = Vec::new();
        let mut errors = Vec::new();
        for (path, result) in scan_result
            .rust_files
            .iter()
            .zip(AstParser::parse_files(&scan_result.rust_files, source_root))
        {
            match result {
                Ok(parsed) => parsed_files.push(parsed),
                Err(e) => {
                    let error = GeneratorError::Parse {
                        file: path.clone(),
                        message: format!("{:#}", e),
                    };
                    if self.config.fail_fast {
                        return Err(error);
                    }
                    errors.push(error);
                }
            }
        }

        let mut analysis = self.analyze_files(&parsed_files)?;
        analysis.files_scanned = scan_result.rust_files.len();
        analysis.warnings.extend(scan_result.warnings);
        errors.append(&mut analysis.errors);
        analysis.errors = errors;
        Ok(analysis)
    }

    /// Extracts, validates and resolves the service traits of already parsed files.
    ///
    /// # Errors
    ///
    /// Returns the first failure when running fail-fast.
    pub fn analyze_files(&self, parsed_files: &[ParsedFile]) -> Result<Analysis> {
        let extractor = ServiceExtractor::new(&self.model);
        let mut analysis = Analysis {
            files_scanned: parsed_files.len(),
            ..Analysis::default()
        };

        for extracted in extractor.extract(parsed_files) {
            match extracted.and_then(|interface| plan(interface, &self.types)) {
                Ok(plan) => {
                    debug!("Planned {}", plan.interface.qualified_name());
                    analysis.plans.push(plan);
                }
                Err(e) if self.config.fail_fast => return Err(e),
                Err(e) => {
                    warn!("{}", e);
                    analysis.errors.push(e);
                }
            }
        }

        info!("Found {} service traits", analysis.plans.len());
        Ok(analysis)
    }

    /// Emits the units of every plan.
    ///
    /// # Errors
    ///
    /// Returns the first emission failure when running fail-fast.
    pub fn emit(&self, analysis: &mut Analysis) -> Result<Vec<SourceUnit>> {
        let mut units = Vec::new();
        for plan in &analysis.plans {
            match self.emitter.emit(&plan.interface, &plan.encodings) {
                Ok(unit) => units.push(unit),
                Err(e) if self.config.fail_fast => return Err(e),
                Err(e) => {
                    warn!("{}", e);
                    analysis.errors.push(e);
                }
            }
        }
        Ok(units)
    }

    /// Runs the whole pipeline on a source tree, writing units to `sink`.
    ///
    /// # Errors
    ///
    /// Returns the first failure when running fail-fast. Otherwise all good units are
    /// written first, and the failures are returned together (a single failure as itself,
    /// several as [`GeneratorError::Multiple`]).
    pub fn run(&self, source_root: &Path, sink: &mut dyn OutputSink) -> Result<GenerationReport> {
        let mut analysis = self.analyze(source_root)?;
        self.write(&mut analysis, sink)
    }

    /// Runs everything after parsing, for callers that parse themselves
    pub fn run_files(&self, parsed_files: &[ParsedFile], sink: &mut dyn OutputSink) -> Result<GenerationReport> {
        let mut analysis = self.analyze_files(parsed_files)?;
        self.write(&mut analysis, sink)
    }

    fn write(&self, analysis: &mut Analysis, sink: &mut dyn OutputSink) -> Result<GenerationReport> {
        let units = self.emit(analysis)?;

        let mut report = GenerationReport {
            files_scanned: analysis.files_scanned,
            warnings: analysis.warnings.clone(),
            ..GenerationReport::default()
        };
        for unit in &units {
            match sink.write(unit)? {
                WriteOutcome::Written(path) => report.written.push(path),
                WriteOutcome::Unchanged(path) => report.unchanged.push(path),
            }
            report.generated.push(unit.name.clone());
        }

        info!(
            "Generated {} implementations ({} written, {} unchanged)",
            report.generated.len(),
            report.written.len(),
            report.unchanged.len()
        );

        let mut errors = std::mem::take(&mut analysis.errors);
        match errors.len() {
            0 => Ok(report),
            1 => Err(errors.remove(0)),
            _ => Err(GeneratorError::Multiple(errors)),
        }
    }
}

/// Validates an interface and resolves its body encodings
fn plan(interface: AnnotatedInterface, types: &RuntimeTypes) -> Result<ServicePlan> {
    validator::validate_interface(&interface, types)?;
    let encodings = encoding::resolve_interface(&interface, types)?;
    Ok(ServicePlan {
        interface,
        encodings,
    })
}
