//! Recognized attributes and the import resolution used to identify them.
//!
//! Every attribute is matched by its fully-qualified path under a configurable
//! namespace (default [`DEFAULT_NAMESPACE`]). An attribute written in the source
//! is resolved through the `use` items of its enclosing module, so all of the
//! following identify the `get` verb:
//!
//! ```text
//! use client_from_source::get;          #[get("/posts")]
//! use client_from_source::get as http;  #[http("/posts")]
//! use client_from_source as rest;       #[rest::get("/posts")]
//! use client_from_source::*;            #[get("/posts")]
//!                                       #[client_from_source::get("/posts")]
//! ```
//!
//! Attributes that do not resolve into the namespace are left alone.
//!
//! No attribute is declared by this crate: the namespace names the crate that declares
//! them in the scanned sources, and only the default spelling is shown above.

use crate::emitter::DEFAULT_RUNTIME_PATH;
use crate::model::{HttpMethod, TypeRef};
use std::collections::HashMap;
use syn::{Attribute, Item, UseTree};

/// Namespace the attribute declarations live under unless configured otherwise
pub const DEFAULT_NAMESPACE: &str = "client_from_source";

const PRELUDE_TYPES: &[(&str, &str)] = &[
    ("Option", "std::option::Option"),
    ("Result", "std::result::Result"),
    ("Vec", "std::vec::Vec"),
    ("String", "std::string::String"),
    ("Box", "std::boxed::Box"),
];

/// Parameter binding attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingKind {
    Path,
    Query,
    Header,
    Body,
    Field,
    FieldMap,
    Part,
}

/// Method modifier attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModifierKind {
    Multipart,
    FormUrlEncoded,
    TextResponse,
    Headers,
}

/// What a recognized attribute means.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnotationKind {
    /// The API-service marker on a trait
    ApiService,
    Verb(HttpMethod),
    Binding(BindingKind),
    Modifier(ModifierKind),
}

/// Table of recognized attributes keyed by fully-qualified path.
#[derive(Debug, Clone)]
pub struct AnnotationModel {
    namespace: String,
    table: HashMap<String, AnnotationKind>,
}

impl AnnotationModel {
    pub fn new(namespace: &str) -> Self {
        let namespace = namespace.trim_start_matches("::").to_string();
        let entries: [(&str, AnnotationKind); 19] = [
            ("api_service", AnnotationKind::ApiService),
            ("get", AnnotationKind::Verb(HttpMethod::Get)),
            ("post", AnnotationKind::Verb(HttpMethod::Post)),
            ("put", AnnotationKind::Verb(HttpMethod::Put)),
            ("delete", AnnotationKind::Verb(HttpMethod::Delete)),
            ("patch", AnnotationKind::Verb(HttpMethod::Patch)),
            ("options", AnnotationKind::Verb(HttpMethod::Options)),
            ("head", AnnotationKind::Verb(HttpMethod::Head)),
            ("path", AnnotationKind::Binding(BindingKind::Path)),
            ("query", AnnotationKind::Binding(BindingKind::Query)),
            ("header", AnnotationKind::Binding(BindingKind::Header)),
            ("body", AnnotationKind::Binding(BindingKind::Body)),
            ("field", AnnotationKind::Binding(BindingKind::Field)),
            ("field_map", AnnotationKind::Binding(BindingKind::FieldMap)),
            ("part", AnnotationKind::Binding(BindingKind::Part)),
            ("multipart", AnnotationKind::Modifier(ModifierKind::Multipart)),
            ("form_url_encoded", AnnotationKind::Modifier(ModifierKind::FormUrlEncoded)),
            ("text_response", AnnotationKind::Modifier(ModifierKind::TextResponse)),
            ("headers", AnnotationKind::Modifier(ModifierKind::Headers)),
        ];

        let table = entries
            .into_iter()
            .map(|(name, kind)| (format!("{}::{}", namespace, name), kind))
            .collect();

        Self { namespace, table }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Looks up a fully-qualified attribute path
    pub fn lookup(&self, qualified_name: &str) -> Option<AnnotationKind> {
        self.table
            .get(qualified_name.trim_start_matches("::"))
            .copied()
    }

    /// Returns the verb for a fully-qualified HTTP verb attribute path
    pub fn is_http_verb_annotation(&self, qualified_name: &str) -> Option<HttpMethod> {
        match self.lookup(qualified_name)? {
            AnnotationKind::Verb(method) => Some(method),
            _ => None,
        }
    }

    /// Classifies an attribute written in a module with the given imports
    pub fn classify(&self, attr: &Attribute, imports: &ImportMap) -> Option<AnnotationKind> {
        let path = attr.path();
        let segments: Vec<String> = path.segments.iter().map(|s| s.ident.to_string()).collect();
        imports
            .candidates(&segments, path.leading_colon.is_some())
            .iter()
            .find_map(|candidate| self.lookup(candidate))
    }
}

impl Default for AnnotationModel {
    fn default() -> Self {
        Self::new(DEFAULT_NAMESPACE)
    }
}

/// The multipart types generated code can send, reachable through `reqwest` or through
/// the configured runtime module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeTypes {
    forms: Vec<String>,
    parts: Vec<String>,
}

impl RuntimeTypes {
    pub fn new(runtime_path: &str) -> Self {
        let runtime = runtime_path.trim_start_matches("::");
        let spellings = |name: &str| {
            vec![
                format!("reqwest::multipart::{}", name),
                format!("{}::{}", runtime, name),
                format!("{}::reqwest::multipart::{}", runtime, name),
            ]
        };
        Self {
            forms: spellings("Form"),
            parts: spellings("Part"),
        }
    }

    /// A prebuilt multipart form
    pub fn is_form(&self, ty: &TypeRef) -> bool {
        self.forms.contains(&ty.qualified_name)
    }

    /// A single multipart part
    pub fn is_part(&self, ty: &TypeRef) -> bool {
        self.parts.contains(&ty.qualified_name)
    }
}

impl Default for RuntimeTypes {
    fn default() -> Self {
        Self::new(DEFAULT_RUNTIME_PATH)
    }
}

/// Whether `written` is a prelude name that no import overrides
pub fn is_prelude(written: &str, qualified: &str) -> bool {
    PRELUDE_TYPES
        .iter()
        .any(|(name, path)| *name == written && *path == qualified)
}

/// The `use` items of one module scope.
#[derive(Debug, Clone, Default)]
pub struct ImportMap {
    /// Local name -> full path
    aliases: HashMap<String, Vec<String>>,
    /// Prefixes of `use prefix::*`
    globs: Vec<Vec<String>>,
}

impl ImportMap {
    /// Collects the imports declared directly in `items` (nested modules excluded)
    pub fn from_items(items: &[Item]) -> Self {
        let mut map = Self::default();
        for item in items {
            if let Item::Use(use_item) = item {
                let mut prefix = Vec::new();
                map.collect(&use_item.tree, &mut prefix);
            }
        }
        map
    }

    /// Recursively walk a use tree, recording aliases and globs
    fn collect(&mut self, tree: &UseTree, prefix: &mut Vec<String>) {
        match tree {
            UseTree::Path(path) => {
                prefix.push(path.ident.to_string());
                self.collect(&path.tree, prefix);
                prefix.pop();
            }
            UseTree::Group(group) => {
                for item in &group.items {
                    self.collect(item, prefix);
                }
            }
            UseTree::Name(name) => {
                let ident = name.ident.to_string();
                if ident == "self" {
                    // `use a::b::{self}` imports `b`
                    if let Some(last) = prefix.last() {
                        self.aliases.insert(last.clone(), prefix.clone());
                    }
                } else {
                    let mut full = prefix.clone();
                    full.push(ident.clone());
                    self.aliases.insert(ident, full);
                }
            }
            UseTree::Rename(rename) => {
                let alias = rename.rename.to_string();
                if alias == "_" {
                    return;
                }
                let ident = rename.ident.to_string();
                let full = if ident == "self" {
                    prefix.clone()
                } else {
                    let mut full = prefix.clone();
                    full.push(ident);
                    full
                };
                self.aliases.insert(alias, full);
            }
            UseTree::Glob(_) => {
                self.globs.push(prefix.clone());
            }
        }
    }

    /// Fully-qualified names a written path may refer to, most specific first
    pub fn candidates(&self, segments: &[String], leading_colon: bool) -> Vec<String> {
        let Some(first) = segments.first() else {
            return Vec::new();
        };

        if leading_colon {
            return vec![segments.join("::")];
        }

        if let Some(full) = self.aliases.get(first) {
            let mut expanded = full.clone();
            expanded.extend(segments[1..].iter().cloned());
            return vec![expanded.join("::")];
        }

        let mut candidates = vec![segments.join("::")];
        if segments.len() == 1 {
            for glob in &self.globs {
                let mut expanded = glob.clone();
                expanded.push(first.clone());
                candidates.push(expanded.join("::"));
            }
        }
        candidates
    }

    /// Resolves a written type path to its qualified name.
    ///
    /// Imports win over prelude names; anything unresolved keeps its written form.
    pub fn resolve_type(&self, segments: &[String], leading_colon: bool) -> String {
        if leading_colon || segments.is_empty() {
            return segments.join("::");
        }

        if let Some(full) = self.aliases.get(&segments[0]) {
            let mut expanded = full.clone();
            expanded.extend(segments[1..].iter().cloned());
            return expanded.join("::");
        }

        if segments.len() == 1 {
            if let Some((_, std_path)) = PRELUDE_TYPES.iter().find(|(name, _)| *name == segments[0]) {
                return std_path.to_string();
            }
        }

        segments.join("::")
    }
}
