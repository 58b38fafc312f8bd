//! Code emission for validated service traits.
//!
//! For a trait `PostsApi` the emitter produces, in this order:
//!
//! - `pub struct PostsApiImpl { context: ClientContext }` with `new` and `context`
//! - one `impl Trait for PostsApiImpl` for the trait and each scanned supertrait, own
//!   methods first; supertraits without verb methods get an empty impl
//! - `pub fn create_posts_api(context: &ClientContext) -> PostsApiImpl`
//!
//! Everything is built as a `proc_macro2::TokenStream`, checked with `syn::parse2` and
//! printed with `prettyplease`, so output only depends on the model.
//!
//! ## Submodules
//!
//! - [`method`] - Lowers one method and its body encoding to an `async fn`
//! - [`types`] - Renders names and types as tokens

pub mod method;
pub mod types;

use crate::encoding::BodyEncoding;
use crate::error::{GeneratorError, Result};
use crate::model::{AnnotatedInterface, Visibility};
use crate::sink::SourceUnit;
use log::debug;
use proc_macro2::TokenStream;
use quote::quote;
use types::{ident, path_tokens};

/// Runtime module path used when none is configured
pub const DEFAULT_RUNTIME_PATH: &str = "::client_from_source::runtime";

/// Renders implementation units for validated interfaces.
#[derive(Debug, Clone)]
pub struct Emitter {
    runtime: syn::Path,
}

impl Emitter {
    /// Creates an emitter whose generated code refers to the runtime at `runtime_path`.
    ///
    /// # Errors
    ///
    /// Returns [`GeneratorError::Config`] if `runtime_path` is not a Rust path.
    pub fn new(runtime_path: &str) -> Result<Self> {
        let runtime = syn::parse_str::<syn::Path>(runtime_path).map_err(|e| {
            GeneratorError::Config(format!("invalid runtime path '{}': {}", runtime_path, e))
        })?;
        Ok(Self { runtime })
    }

    /// Emits the implementation unit of one interface.
    ///
    /// # Arguments
    ///
    /// * `interface` - A validated interface
    /// * `encodings` - The body encoding of each method, in method order
    ///
    /// # Errors
    ///
    /// Returns [`GeneratorError::Emit`] if the encodings do not match the methods or the
    /// rendered tokens do not form a valid Rust file.
    pub fn emit(&self, interface: &AnnotatedInterface, encodings: &[BodyEncoding]) -> Result<SourceUnit> {
        if encodings.len() != interface.methods.len() {
            return Err(GeneratorError::Emit {
                interface: interface.name.clone(),
                message: format!(
                    "{} encodings for {} methods",
                    encodings.len(),
                    interface.methods.len()
                ),
            });
        }

        let tokens = self.render(interface, encodings);
        let code = format_generated_code(tokens).map_err(|e| GeneratorError::Emit {
            interface: interface.name.clone(),
            message: e.to_string(),
        })?;

        let content = format!("{}\n{}", header(interface), code);
        debug!(
            "Emitted {} ({} bytes)",
            interface.impl_name(),
            content.len()
        );

        Ok(SourceUnit {
            module_path: interface.module_path.clone(),
            name: interface.impl_name(),
            file_name: interface.file_name(),
            content,
            origin: interface.source_file.clone(),
        })
    }

    fn render(&self, interface: &AnnotatedInterface, encodings: &[BodyEncoding]) -> TokenStream {
        let runtime = &self.runtime;
        let vis = match interface.visibility {
            Visibility::Public => quote!(pub),
            Visibility::Internal => quote!(pub(crate)),
        };
        let impl_name = ident(&interface.impl_name());
        let factory = ident(&interface.factory_name());

        let struct_doc = format!(" Generated implementation of [`{}`].", interface.name);
        let factory_doc = format!(" Creates a [`{}`] bound to `context`.", interface.impl_name());

        // Own trait first, then supertraits depth first
        let mut groups: Vec<(&str, Vec<TokenStream>)> = std::iter::once(interface.name.as_str())
            .chain(interface.supertraits.iter().map(String::as_str))
            .map(|name| (name, Vec::new()))
            .collect();
        for (method, encoding) in interface.methods.iter().zip(encodings) {
            let tokens = method::implement_method(method, encoding, runtime);
            match groups.iter_mut().find(|(name, _)| *name == method.declared_in) {
                Some((_, methods)) => methods.push(tokens),
                None => groups.push((method.declared_in.as_str(), vec![tokens])),
            }
        }

        let impls = groups.iter().map(|(trait_name, methods)| {
            let trait_path = path_tokens(trait_name);
            quote! {
                impl #trait_path for #impl_name {
                    #(#methods)*
                }
            }
        });

        quote! {
            #[doc = #struct_doc]
            #vis struct #impl_name {
                context: #runtime::ClientContext,
            }

            impl #impl_name {
                #vis fn new(context: #runtime::ClientContext) -> Self {
                    Self { context }
                }

                #vis fn context(&self) -> &#runtime::ClientContext {
                    &self.context
                }
            }

            #(#impls)*

            #[doc = #factory_doc]
            #vis fn #factory(context: &#runtime::ClientContext) -> #impl_name {
                #impl_name::new(context.clone())
            }
        }
    }
}

impl Default for Emitter {
    fn default() -> Self {
        Self {
            runtime: syn::parse_quote!(::client_from_source::runtime),
        }
    }
}

/// Validates a token stream as a Rust file and pretty-prints it.
///
/// # Errors
///
/// Returns the `syn` error if the tokens do not parse as a file.
pub fn format_generated_code(tokens: TokenStream) -> std::result::Result<String, syn::Error> {
    let file = syn::parse2::<syn::File>(tokens)?;
    Ok(prettyplease::unparse(&file))
}

fn header(interface: &AnnotatedInterface) -> String {
    format!(
        "// @generated by client-from-source from {}. Do not edit.\n",
        interface.source_file.display().to_string().replace('\\', "/")
    )
}
