//! Argument parsing for the recognized attributes.
//!
//! Attribute arguments are literals only: `#[get("/posts/{id}")]`, `#[path("id")]`,
//! `#[path = "id"]`, `#[headers("Accept: application/json", "X-Client: app")]`.

use syn::punctuated::Punctuated;
use syn::{Attribute, Expr, ExprLit, Lit, LitStr, Meta, Token};

/// Reads the optional single string literal of an attribute.
///
/// `#[a]` and `#[a()]` yield `None`, `#[a("x")]` and `#[a = "x"]` yield `Some("x")`.
pub fn optional_literal(attr: &Attribute) -> Result<Option<String>, String> {
    match &attr.meta {
        Meta::Path(_) => Ok(None),
        Meta::List(list) if list.tokens.is_empty() => Ok(None),
        Meta::List(_) => attr
            .parse_args::<LitStr>()
            .map(|lit| Some(lit.value()))
            .map_err(|e| format!("expected a single string literal: {}", e)),
        Meta::NameValue(name_value) => match &name_value.value {
            Expr::Lit(ExprLit {
                lit: Lit::Str(lit), ..
            }) => Ok(Some(lit.value())),
            _ => Err("expected a string literal".to_string()),
        },
    }
}

/// Reads the required single string literal of an attribute
pub fn required_literal(attr: &Attribute, what: &str) -> Result<String, String> {
    optional_literal(attr)?.ok_or_else(|| format!("requires {}", what))
}

/// Reads a key argument, falling back to `default` when absent or empty
pub fn key_or_default(attr: &Attribute, default: &str) -> Result<String, String> {
    Ok(optional_literal(attr)?
        .filter(|key| !key.is_empty())
        .unwrap_or_else(|| default.to_string()))
}

/// Fails unless the attribute is bare (`#[body]`)
pub fn no_arguments(attr: &Attribute) -> Result<(), String> {
    match optional_literal(attr) {
        Ok(None) => Ok(()),
        _ => Err("takes no arguments".to_string()),
    }
}

/// Reads a comma separated list of string literals
pub fn literal_list(attr: &Attribute) -> Result<Vec<String>, String> {
    match &attr.meta {
        Meta::List(_) => attr
            .parse_args_with(Punctuated::<LitStr, Token![,]>::parse_terminated)
            .map(|list| list.iter().map(LitStr::value).collect())
            .map_err(|e| format!("expected string literals: {}", e)),
        _ => Err("expected a list of string literals".to_string()),
    }
}

/// Last path segment of an attribute, for messages
pub fn display_name(attr: &Attribute) -> String {
    attr.path()
        .segments
        .last()
        .map(|s| s.ident.to_string())
        .unwrap_or_default()
}
