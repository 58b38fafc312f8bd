//! Token rendering for names and [`TypeRef`]s.

use crate::model::{AnnotatedMethod, TypeRef};
use proc_macro2::{Ident, Span, TokenStream};
use quote::{quote, ToTokens, TokenStreamExt};
use std::collections::HashSet;

/// An identifier as written in the source, `r#type` included
pub fn ident(name: &str) -> Ident {
    match name.strip_prefix("r#") {
        Some(raw) => Ident::new_raw(raw, Span::call_site()),
        None => Ident::new(name, Span::call_site()),
    }
}

/// A path as written in the source (`models::Post`, `::std::string::String`)
pub fn path_tokens(path: &str) -> TokenStream {
    let mut tokens = TokenStream::new();
    if path.starts_with("::") {
        tokens.extend(quote!(::));
    }
    let segments = path.trim_start_matches("::").split("::").map(ident);
    tokens.append_separated(segments, quote!(::));
    tokens
}

/// `Option<T>` is spelled fully qualified so the generated file does not depend on what
/// `Option` means in the including module.
impl ToTokens for TypeRef {
    fn to_tokens(&self, tokens: &mut TokenStream) {
        let reference = if self.by_ref {
            let lifetime = self
                .lifetime
                .as_ref()
                .map(|l| syn::Lifetime::new(&format!("'{}", l), Span::call_site()));
            quote!(& #lifetime)
        } else {
            TokenStream::new()
        };

        let base = if self.path == "()" {
            quote!(())
        } else if self.is_slice() {
            let element = self.type_arguments.first();
            quote!([#element])
        } else {
            let path = path_tokens(&self.path);
            if self.type_arguments.is_empty() {
                path
            } else {
                let arguments = &self.type_arguments;
                quote!(#path<#(#arguments),*>)
            }
        };

        let ty = quote!(#reference #base);
        if self.nullable {
            tokens.extend(quote!(::core::option::Option<#ty>));
        } else {
            tokens.extend(ty);
        }
    }
}

/// Picks local variable names that cannot shadow a method parameter.
pub struct LocalNames {
    taken: HashSet<String>,
}

impl LocalNames {
    pub fn new(method: &AnnotatedMethod) -> Self {
        Self {
            taken: method.parameters.iter().map(|p| p.name.clone()).collect(),
        }
    }

    /// `base`, or `base` followed by underscores until it is unused
    pub fn fresh(&mut self, base: &str) -> Ident {
        let mut name = base.to_string();
        while self.taken.contains(&name) {
            name.push('_');
        }
        self.taken.insert(name.clone());
        ident(&name)
    }
}
