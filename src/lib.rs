//! client-from-source - HTTP client implementations generated from annotated Rust traits.
//!
//! A service is declared as an ordinary trait whose methods carry HTTP attributes. This
//! library reads those declarations from source, checks that each one describes a coherent
//! request, and writes a concrete implementation that performs the request through
//! [`reqwest`](https://docs.rs/reqwest).
//!
//! ```ignore
//! // `http_attrs` is whichever crate declares the marker attributes
//! use http_attrs::{api_service, get, path, query};
//!
//! #[api_service]
//! pub trait PostsApi {
//!     #[get("/posts/{id}")]
//!     async fn get_post(&self, #[path] id: u64) -> Result<Post, ApiError>;
//!
//!     #[get("/posts")]
//!     async fn list_posts(&self, #[query] page: Option<u32>) -> Result<Vec<Post>, ApiError>;
//! }
//!
//! include!(concat!(env!("OUT_DIR"), "/posts_api_impl.rs"));
//! ```
//!
//! The attributes are markers only; the generator finds them by their full path, following
//! `use` imports, so an unrelated `#[get]` from another crate is never picked up.
//!
//! This crate does not declare the attributes itself. They have to come from a crate the
//! consuming code depends on, and the generator is pointed at it with
//! [`GeneratorConfig::namespace`](config::GeneratorConfig::namespace) or `--namespace`
//! (`--namespace http_attrs` for the example above). The default namespace,
//! `client_from_source`, only matches sources that alias such a crate under that name.
//!
//! # Architecture
//!
//! 1. [`scanner`] - Collects the `.rs` files of a source tree
//! 2. [`parser`] - Parses files and derives their module paths
//! 3. [`extractor`] - Finds marked traits and builds the [`model`]
//! 4. [`validator`] - Rejects methods that cannot describe a request
//! 5. [`encoding`] - Chooses a body encoding per method
//! 6. [`emitter`] - Renders implementation source
//! 7. [`sink`] - Writes the rendered units
//!
//! [`generator`] drives the whole pipeline, [`runtime`] is what generated code calls at
//! request time, and [`cli`] wraps everything as a command-line tool.
//!
//! # Example Usage
//!
//! ```no_run
//! use client_from_source::{
//!     config::GeneratorConfig,
//!     generator::Generator,
//!     sink::FileSink,
//! };
//! use std::path::Path;
//!
//! let generator = Generator::new(GeneratorConfig::default()).unwrap();
//! let mut sink = FileSink::new("./generated");
//! let report = generator.run(Path::new("./src"), &mut sink).unwrap();
//! println!("Generated {} implementations", report.generated.len());
//! ```

pub mod annotations;
pub mod cli;
pub mod config;
pub mod emitter;
pub mod encoding;
pub mod error;
pub mod extractor;
pub mod generator;
pub mod model;
pub mod parser;
#[cfg(feature = "runtime")]
pub mod runtime;
pub mod scanner;
pub mod serializer;
pub mod sink;
pub mod type_resolver;
pub mod validator;
