//! The resolved description of an annotated service trait.
//!
//! These types are produced by the [`extractor`](crate::extractor), checked by the
//! [`validator`](crate::validator) and consumed by the [`emitter`](crate::emitter).
//! They are immutable once built and never outlive a single generation pass.

use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::sync::LazyLock;

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{(\w+)\}").expect("placeholder pattern is valid"));

/// HTTP methods a service method can be bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Options,
    Head,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Head => "HEAD",
        }
    }

    /// Whether a request body may be attached (POST, PUT and PATCH only)
    pub fn allows_body(&self) -> bool {
        matches!(self, HttpMethod::Post | HttpMethod::Put | HttpMethod::Patch)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Visibility of the source trait, mirrored by the generated items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    /// `pub`
    Public,
    /// Anything narrower than `pub`, emitted as `pub(crate)`
    Internal,
}

const UNIT: &str = "()";
const SLICE: &str = "[]";

const LIST_TYPES: &[&str] = &["std::vec::Vec", "alloc::vec::Vec", SLICE];
const MAP_TYPES: &[&str] = &[
    "std::collections::HashMap",
    "std::collections::hash_map::HashMap",
    "std::collections::BTreeMap",
    "std::collections::btree_map::BTreeMap",
    "alloc::collections::BTreeMap",
    "indexmap::IndexMap",
];
const TEXT_TYPES: &[&str] = &["std::string::String", "alloc::string::String", "str"];
const PRIMITIVE_SCALARS: &[&str] = &[
    "bool", "char", "i8", "i16", "i32", "i64", "i128", "isize", "u8", "u16", "u32", "u64",
    "u128", "usize", "f32", "f64",
];

/// Built-in type names, which resolve the same in every module
pub fn is_primitive(name: &str) -> bool {
    name == "str" || PRIMITIVE_SCALARS.contains(&name)
}

/// A reference to a Rust type, as far as generation needs to know it.
///
/// `Option<T>` is represented by `T` with `nullable` set. `path` keeps the
/// spelling used in the source so the generated code resolves it the same way
/// from the trait's module; `qualified_name` is the import-resolved path used
/// for well-known type detection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeRef {
    pub qualified_name: String,
    pub path: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub type_arguments: Vec<TypeRef>,
    pub nullable: bool,
    /// Shared reference (`&T`)
    pub by_ref: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lifetime: Option<String>,
}

impl TypeRef {
    /// A non-generic type whose written path and resolved name are known
    pub fn named(qualified_name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            qualified_name: qualified_name.into(),
            path: path.into(),
            type_arguments: Vec::new(),
            nullable: false,
            by_ref: false,
            lifetime: None,
        }
    }

    pub fn unit() -> Self {
        Self::named(UNIT, UNIT)
    }

    /// `[T]`, only ever seen behind a reference
    pub fn slice(element: TypeRef) -> Self {
        let mut slice = Self::named(SLICE, SLICE);
        slice.type_arguments.push(element);
        slice
    }

    pub fn with_arguments(mut self, type_arguments: Vec<TypeRef>) -> Self {
        self.type_arguments = type_arguments;
        self
    }

    pub fn is_unit(&self) -> bool {
        self.qualified_name == UNIT && !self.nullable
    }

    pub fn is_slice(&self) -> bool {
        self.qualified_name == SLICE
    }

    pub fn is_list(&self) -> bool {
        LIST_TYPES.contains(&self.qualified_name.as_str()) && self.type_arguments.len() == 1
    }

    pub fn is_map(&self) -> bool {
        MAP_TYPES.contains(&self.qualified_name.as_str()) && self.type_arguments.len() >= 2
    }

    pub fn is_text(&self) -> bool {
        TEXT_TYPES.contains(&self.qualified_name.as_str())
    }

    /// Types that become a plain text field in a multipart form
    pub fn is_scalar(&self) -> bool {
        self.is_text() || PRIMITIVE_SCALARS.contains(&self.qualified_name.as_str())
    }

    /// Element type of a list or slice
    pub fn list_element(&self) -> Option<&TypeRef> {
        if self.is_list() {
            self.type_arguments.first()
        } else {
            None
        }
    }

    /// Whether the last path segment names a `Result`-like type with a success argument
    pub fn is_result_like(&self) -> bool {
        let last = self.path.rsplit("::").next().unwrap_or_default();
        last.ends_with("Result") && !self.type_arguments.is_empty() && !self.nullable
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.nullable {
            f.write_str("Option<")?;
        }
        if self.by_ref {
            f.write_str("&")?;
            if let Some(lifetime) = &self.lifetime {
                write!(f, "'{} ", lifetime)?;
            }
        }
        if self.is_slice() {
            f.write_str("[")?;
            if let Some(element) = self.type_arguments.first() {
                write!(f, "{}", element)?;
            }
            f.write_str("]")?;
        } else {
            f.write_str(&self.path)?;
            if !self.type_arguments.is_empty() {
                f.write_str("<")?;
                for (i, arg) in self.type_arguments.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                f.write_str(">")?;
            }
        }
        if self.nullable {
            f.write_str(">")?;
        }
        Ok(())
    }
}

/// The role a parameter plays in building the request.
///
/// Keys are already resolved: an absent or empty attribute argument falls back
/// to the parameter name during extraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ParameterBinding {
    Path { key: String },
    Query { key: String },
    Header { key: String },
    Body,
    Field { key: String },
    FieldMap,
    Part { key: String },
    Unbound,
}

/// A method parameter with its binding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Parameter {
    pub name: String,
    pub ty: TypeRef,
    pub binding: ParameterBinding,
}

impl Parameter {
    pub fn new(name: impl Into<String>, ty: TypeRef, binding: ParameterBinding) -> Self {
        Self {
            name: name.into(),
            ty,
            binding,
        }
    }

    pub fn nullable(&self) -> bool {
        self.ty.nullable
    }

    pub fn is_body(&self) -> bool {
        matches!(self.binding, ParameterBinding::Body)
    }

    pub fn is_part(&self) -> bool {
        matches!(self.binding, ParameterBinding::Part { .. })
    }

    /// `#[field]` or `#[field_map]`
    pub fn is_form_field(&self) -> bool {
        matches!(
            self.binding,
            ParameterBinding::Field { .. } | ParameterBinding::FieldMap
        )
    }
}

/// A `"Key: Value"` entry of a `#[headers(...)]` attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StaticHeader {
    pub name: String,
    pub value: String,
}

impl StaticHeader {
    /// Splits `"Key: Value"` at the first colon, trimming both halves.
    pub fn parse(raw: &str) -> Option<Self> {
        let (name, value) = raw.split_once(':')?;
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        Some(Self {
            name: name.to_string(),
            value: value.trim().to_string(),
        })
    }
}

/// Method-level modifiers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MethodModifiers {
    pub multipart: bool,
    pub form_url_encoded: bool,
    pub text_response: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub headers: Vec<StaticHeader>,
}

/// Facts about the Rust signature that decide whether it can be implemented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SignatureShape {
    pub is_async: bool,
    /// First input is `&self`
    pub has_ref_self: bool,
    pub has_generics: bool,
}

/// One trait method carrying an HTTP verb attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnnotatedMethod {
    pub name: String,
    /// The trait declaring this method, as written in the source
    pub declared_in: String,
    pub http_method: HttpMethod,
    pub path_template: String,
    pub parameters: Vec<Parameter>,
    pub return_type: TypeRef,
    pub modifiers: MethodModifiers,
    pub signature: SignatureShape,
}

impl AnnotatedMethod {
    /// Distinct `{token}` names of the path template, in order of first appearance
    pub fn path_placeholders(&self) -> Vec<String> {
        path_placeholders(&self.path_template)
    }

    pub fn bodies(&self) -> impl Iterator<Item = &Parameter> {
        self.parameters.iter().filter(|p| p.is_body())
    }

    pub fn parts(&self) -> impl Iterator<Item = &Parameter> {
        self.parameters.iter().filter(|p| p.is_part())
    }

    pub fn form_fields(&self) -> impl Iterator<Item = &Parameter> {
        self.parameters.iter().filter(|p| p.is_form_field())
    }

    /// `T` of a `Result<T, E>` return type
    pub fn success_type(&self) -> Option<&TypeRef> {
        if self.return_type.is_result_like() {
            self.return_type.type_arguments.first()
        } else {
            None
        }
    }

    pub fn has_unbound_parameters(&self) -> bool {
        self.parameters
            .iter()
            .any(|p| p.binding == ParameterBinding::Unbound)
    }
}

/// A trait carrying the API-service marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnnotatedInterface {
    /// Module path of the trait, without the leading `crate`
    pub module_path: Vec<String>,
    pub name: String,
    pub visibility: Visibility,
    /// File the trait is declared in
    pub source_file: PathBuf,
    pub methods: Vec<AnnotatedMethod>,
    /// Scanned supertraits as `crate::` paths, depth first, whether or not they declare
    /// verb methods
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub supertraits: Vec<String>,
}

impl AnnotatedInterface {
    pub fn impl_name(&self) -> String {
        format!("{}Impl", self.name)
    }

    pub fn factory_name(&self) -> String {
        format!("create_{}", to_snake_case(&self.name))
    }

    pub fn file_name(&self) -> String {
        format!("{}_impl.rs", to_snake_case(&self.name))
    }

    /// `crate::a::b::Name`
    pub fn qualified_name(&self) -> String {
        let mut segments = vec!["crate".to_string()];
        segments.extend(self.module_path.iter().cloned());
        segments.push(self.name.clone());
        segments.join("::")
    }
}

/// Distinct `{token}` names of a path template, in order of first appearance.
pub fn path_placeholders(template: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for caps in PLACEHOLDER.captures_iter(template) {
        let name = caps[1].to_string();
        if !names.contains(&name) {
            names.push(name);
        }
    }
    names
}

/// A piece of a path template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Literal(String),
    Placeholder(String),
}

/// Splits a path template into literal text and `{token}` placeholders.
pub fn path_segments(template: &str) -> Vec<PathSegment> {
    let mut segments = Vec::new();
    let mut last = 0;
    for caps in PLACEHOLDER.captures_iter(template) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        if whole.start() > last {
            segments.push(PathSegment::Literal(template[last..whole.start()].to_string()));
        }
        segments.push(PathSegment::Placeholder(name.as_str().to_string()));
        last = whole.end();
    }
    if last < template.len() {
        segments.push(PathSegment::Literal(template[last..].to_string()));
    }
    segments
}

/// `MediaApiServices` -> `media_api_services`, `HTTPApi` -> `http_api`
pub fn to_snake_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if c.is_uppercase() {
            if i > 0 {
                let prev = chars[i - 1];
                let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
                if prev.is_lowercase()
                    || prev.is_ascii_digit()
                    || (prev.is_uppercase() && next_is_lower)
                {
                    out.push('_');
                }
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snake_case() {
        assert_eq!(to_snake_case("MediaApiServices"), "media_api_services");
        assert_eq!(to_snake_case("HTTPApi"), "http_api");
        assert_eq!(to_snake_case("PostsAPI"), "posts_api");
        assert_eq!(to_snake_case("Api2Client"), "api2_client");
        assert_eq!(to_snake_case("api"), "api");
    }

    #[test]
    fn test_path_placeholders_are_distinct_and_ordered() {
        assert_eq!(
            path_placeholders("/orgs/{org}/repos/{repo}/forks/{org}"),
            vec!["org".to_string(), "repo".to_string()]
        );
        assert!(path_placeholders("/posts").is_empty());
        // Not a word token
        assert!(path_placeholders("/a/{b-c}").is_empty());
    }

    #[test]
    fn test_path_segments() {
        assert_eq!(
            path_segments("/posts/{id}/comments"),
            vec![
                PathSegment::Literal("/posts/".to_string()),
                PathSegment::Placeholder("id".to_string()),
                PathSegment::Literal("/comments".to_string()),
            ]
        );
        assert_eq!(
            path_segments("{id}"),
            vec![PathSegment::Placeholder("id".to_string())]
        );
        assert!(path_segments("").is_empty());
    }

    #[test]
    fn test_static_header_parse() {
        let header = StaticHeader::parse("Accept: application/json").unwrap();
        assert_eq!(header.name, "Accept");
        assert_eq!(header.value, "application/json");

        // Only the first colon separates
        let header = StaticHeader::parse("X-Time:12:30").unwrap();
        assert_eq!(header.value, "12:30");

        assert!(StaticHeader::parse("NoColon").is_none());
        assert!(StaticHeader::parse(": value").is_none());
    }

    #[test]
    fn test_well_known_types() {
        let part = TypeRef::named("reqwest::multipart::Part", "Part");
        let parts = TypeRef::named("std::vec::Vec", "Vec").with_arguments(vec![part.clone()]);
        assert!(parts.is_list());
        assert_eq!(parts.list_element(), Some(&part));

        let map = TypeRef::named("std::collections::HashMap", "HashMap").with_arguments(vec![
            TypeRef::named("std::string::String", "String"),
            TypeRef::named("std::string::String", "String"),
        ]);
        assert!(map.is_map());
        assert!(!map.is_list());

        assert!(TypeRef::unit().is_unit());
        assert!(TypeRef::named("i32", "i32").is_scalar());
        assert!(!TypeRef::named("Post", "Post").is_scalar());
    }

    #[test]
    fn test_type_ref_display() {
        let mut name = TypeRef::named("std::string::String", "String");
        name.nullable = true;
        assert_eq!(name.to_string(), "Option<String>");

        let mut text = TypeRef::named("str", "str");
        text.by_ref = true;
        text.lifetime = Some("static".to_string());
        assert_eq!(text.to_string(), "&'static str");

        let result = TypeRef::named("std::result::Result", "Result").with_arguments(vec![
            TypeRef::named("Post", "models::Post"),
            TypeRef::named("ClientError", "ClientError"),
        ]);
        assert_eq!(result.to_string(), "Result<models::Post, ClientError>");
        assert!(result.is_result_like());
    }

    #[test]
    fn test_http_method_body_rules() {
        assert!(HttpMethod::Post.allows_body());
        assert!(HttpMethod::Put.allows_body());
        assert!(HttpMethod::Patch.allows_body());
        assert!(!HttpMethod::Get.allows_body());
        assert!(!HttpMethod::Delete.allows_body());
        assert!(!HttpMethod::Head.allows_body());
        assert!(!HttpMethod::Options.allows_body());
    }
}
