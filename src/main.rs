//! client-from-source - Command-line tool for generating HTTP client implementations.
//!
//! Scans a crate's sources for traits marked `#[api_service]` and writes one
//! `<snake_name>_impl.rs` file per trait, mirroring the module tree, ready to be pulled in
//! with `include!`.
//!
//! # Usage
//!
//! ```bash
//! client-from-source [OPTIONS] <SOURCE_DIR>
//! ```
//!
//! # Examples
//!
//! Generate implementations into a directory:
//! ```bash
//! client-from-source ./src -o ./generated
//! ```
//!
//! Inspect the validated model without writing anything:
//! ```bash
//! client-from-source ./src --dump-model yaml
//! ```
//!
//! Report every failing trait instead of stopping at the first:
//! ```bash
//! client-from-source ./src -o ./generated --keep-going -v
//! ```

use anyhow::Result;
use clap::Parser;
use client_from_source::cli;
use log::info;

fn main() -> Result<()> {
    // The verbose flag decides the log level, so the logger is set up between parsing and validation
    let parsed = cli::CliArgs::parse();

    let log_level = if parsed.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    info!("client-from-source starting...");

    let args = cli::parse_args_from_parsed(parsed)?;
    cli::run(args)?;

    info!("Client generation completed successfully");

    Ok(())
}
