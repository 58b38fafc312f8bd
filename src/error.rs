use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

/// Result type alias for the generator
pub type Result<T> = std::result::Result<T, GeneratorError>;

/// The rule a [`ValidationError`] was raised for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationRule {
    /// An attribute carried arguments of the wrong shape
    MalformedAnnotation,
    /// Path placeholders and `#[path]` keys are not a bijection
    PathPlaceholders,
    /// More than one `#[body]` parameter
    BodyCardinality,
    /// A body-carrying binding on a verb that takes no body
    BodyVerb,
    /// `#[body]` together with `#[field]`/`#[field_map]`
    BodyFieldExclusive,
    /// Ill-formed `#[multipart]` method
    MultipartShape,
    /// Ill-formed `#[form_url_encoded]` method
    FormShape,
    /// `#[field_map]` on a type that is not a map
    FieldMapType,
    /// The method signature cannot be implemented by generated code
    Signature,
    /// `#[text_response]` on a method whose success type is not `String`
    TextResponse,
}

impl fmt::Display for ValidationRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValidationRule::MalformedAnnotation => "malformed annotation",
            ValidationRule::PathPlaceholders => "path placeholders",
            ValidationRule::BodyCardinality => "body cardinality",
            ValidationRule::BodyVerb => "body/verb compatibility",
            ValidationRule::BodyFieldExclusive => "body/field exclusivity",
            ValidationRule::MultipartShape => "multipart shape",
            ValidationRule::FormShape => "form-url-encoded shape",
            ValidationRule::FieldMapType => "field map type",
            ValidationRule::Signature => "signature shape",
            ValidationRule::TextResponse => "text response",
        };
        f.write_str(name)
    }
}

/// A structural contract violation found before any code is emitted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{interface}::{method}: {message} ({rule})")]
pub struct ValidationError {
    /// Trait the method belongs to
    pub interface: String,
    /// Offending method
    pub method: String,
    pub rule: ValidationRule,
    /// Human readable description of the violation
    pub message: String,
}

impl ValidationError {
    pub fn new(
        interface: impl Into<String>,
        method: impl Into<String>,
        rule: ValidationRule,
        message: impl Into<String>,
    ) -> Self {
        Self {
            interface: interface.into(),
            method: method.into(),
            rule,
            message: message.into(),
        }
    }
}

/// Errors that can occur while generating client implementations.
#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A `#[part]` parameter whose type is neither a list of parts, a part nor a scalar
    #[error("{interface}::{method}: unsupported multipart parameter `{parameter}` (type={type_name})")]
    UnsupportedPart {
        interface: String,
        method: String,
        parameter: String,
        type_name: String,
    },

    #[error("Failed to parse {}: {message}", file.display())]
    Parse { file: PathBuf, message: String },

    #[error("Failed to write output file '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The emitted token stream did not form a valid Rust file
    #[error("Code generation failed for {interface}: {message}")]
    Emit { interface: String, message: String },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("{} interfaces failed to generate", .0.len())]
    Multiple(Vec<GeneratorError>),
}

impl From<syn::Error> for GeneratorError {
    fn from(err: syn::Error) -> Self {
        GeneratorError::Parse {
            file: PathBuf::from("<unknown>"),
            message: err.to_string(),
        }
    }
}
