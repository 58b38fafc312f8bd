use crate::annotations::DEFAULT_NAMESPACE;
use crate::config::GeneratorConfig;
use crate::emitter::DEFAULT_RUNTIME_PATH;
use crate::generator::Generator;
use crate::serializer::{serialize_json, serialize_yaml};
use crate::sink::FileSink;
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::{debug, info, warn};
use std::path::PathBuf;

/// Client From Source - Generate HTTP client implementations from annotated Rust service traits
#[derive(Parser, Debug)]
#[command(name = "client-from-source")]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Source directory of the crate declaring the service traits
    #[arg(value_name = "SOURCE_DIR")]
    pub source_dir: PathBuf,

    /// Directory the generated files are written to, mirroring the module tree
    #[arg(
        short = 'o',
        long = "out-dir",
        value_name = "DIR",
        env = "CLIENT_FROM_SOURCE_OUT_DIR",
        required_unless_present = "dump_model"
    )]
    pub out_dir: Option<PathBuf>,

    /// Crate or module path declaring the marker attributes in the scanned sources
    #[arg(
        long = "namespace",
        value_name = "PATH",
        env = "CLIENT_FROM_SOURCE_NAMESPACE",
        default_value = DEFAULT_NAMESPACE
    )]
    pub namespace: String,

    /// Path generated code uses to reach the runtime module
    #[arg(long = "runtime-path", value_name = "PATH", default_value = DEFAULT_RUNTIME_PATH)]
    pub runtime_path: String,

    /// Generate every valid trait and report all failures instead of stopping at the first
    #[arg(long = "keep-going")]
    pub keep_going: bool,

    /// Print the validated model instead of generating code
    #[arg(long = "dump-model", value_enum, value_name = "FORMAT")]
    pub dump_model: Option<OutputFormat>,

    /// Print cargo:rerun-if-changed directives (for build scripts)
    #[arg(long = "cargo")]
    pub cargo: bool,

    /// Enable verbose output
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

/// Output format options
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum OutputFormat {
    /// YAML format
    Yaml,
    /// JSON format
    Json,
}

impl CliArgs {
    /// Builds the generator configuration; the output directory is never scanned
    pub fn to_config(&self) -> GeneratorConfig {
        GeneratorConfig {
            namespace: self.namespace.clone(),
            runtime_path: self.runtime_path.clone(),
            fail_fast: !self.keep_going,
            cargo_directives: self.cargo,
            exclude: self.out_dir.iter().cloned().collect(),
        }
    }
}

/// Parse command line arguments
pub fn parse_args() -> Result<CliArgs> {
    let args = CliArgs::parse();
    parse_args_from_parsed(args)
}

/// Validate and log already-parsed arguments
pub fn parse_args_from_parsed(args: CliArgs) -> Result<CliArgs> {
    debug!("Parsed arguments: {:?}", args);

    if !args.source_dir.exists() {
        anyhow::bail!(
            "Source directory does not exist: {}",
            args.source_dir.display()
        );
    }

    if !args.source_dir.is_dir() {
        anyhow::bail!(
            "Source path is not a directory: {}",
            args.source_dir.display()
        );
    }

    info!("Source directory: {}", args.source_dir.display());
    match (&args.out_dir, args.dump_model) {
        (_, Some(format)) => info!("Dumping model as {:?}", format),
        (Some(out_dir), None) => info!("Output directory: {}", out_dir.display()),
        (None, None) => {}
    }
    info!("Attribute namespace: {}", args.namespace);

    Ok(args)
}

/// Run the main workflow
pub fn run(args: CliArgs) -> Result<()> {
    let generator = Generator::new(args.to_config())?;

    if let Some(format) = args.dump_model {
        let analysis = generator.analyze(&args.source_dir)?;
        for error in &analysis.errors {
            warn!("{}", error);
        }
        let content = match format {
            OutputFormat::Yaml => serialize_yaml(&analysis.plans)?,
            OutputFormat::Json => serialize_json(&analysis.plans)?,
        };
        println!("{}", content);
        return Ok(());
    }

    let out_dir = args
        .out_dir
        .clone()
        .context("--out-dir is required unless --dump-model is given")?;
    let mut sink = FileSink::new(out_dir).with_cargo_directives(args.cargo);

    info!("Generating client implementations...");
    let report = generator
        .run(&args.source_dir, &mut sink)
        .with_context(|| format!("Generation failed for {}", args.source_dir.display()))?;

    for warning in &report.warnings {
        warn!("{}", warning);
    }

    info!("Generation complete!");
    info!("Summary:");
    info!("  - Files scanned: {}", report.files_scanned);
    info!("  - Implementations: {}", report.generated.len());
    info!("  - Files written: {}", report.written.len());
    info!("  - Files unchanged: {}", report.unchanged.len());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = CliArgs::try_parse_from(["client-from-source", "src", "-o", "generated"]).unwrap();

        assert_eq!(args.source_dir, PathBuf::from("src"));
        assert_eq!(args.out_dir, Some(PathBuf::from("generated")));
        assert_eq!(args.runtime_path, "::client_from_source::runtime");
        assert!(!args.keep_going);

        let config = args.to_config();
        assert!(config.fail_fast);
        assert_eq!(config.exclude, vec![PathBuf::from("generated")]);
    }

    #[test]
    fn test_dump_model_does_not_need_out_dir() {
        let args =
            CliArgs::try_parse_from(["client-from-source", "src", "--dump-model", "json"]).unwrap();

        assert_eq!(args.dump_model, Some(OutputFormat::Json));
    }

    #[test]
    fn test_keep_going_and_namespace() {
        let args = CliArgs::try_parse_from([
            "client-from-source",
            "src",
            "--out-dir",
            "out",
            "--keep-going",
            "--namespace",
            "my_attrs",
            "--cargo",
        ])
        .unwrap();

        let config = args.to_config();
        assert!(!config.fail_fast);
        assert!(config.cargo_directives);
        assert_eq!(config.namespace, "my_attrs");
    }

    #[test]
    fn test_missing_source_dir_rejected() {
        let args = CliArgs::try_parse_from([
            "client-from-source",
            "/nonexistent/src",
            "--dump-model",
            "yaml",
        ])
        .unwrap();

        let err = parse_args_from_parsed(args).unwrap_err().to_string();
        assert!(err.contains("does not exist"));
    }
}
