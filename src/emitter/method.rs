//! Lowering of one validated method to its `async fn` implementation.
//!
//! The body is assembled as a list of request-building statements, one group per concern,
//! in a fixed order: static headers, query, headers, body. The request is then sent and the
//! response decoded according to the success type.

use super::types::{ident, LocalNames};
use crate::encoding::{BodyEncoding, FieldSpec, MapSpec, MultipartBody, PartKind, PartSpec};
use crate::model::{path_segments, AnnotatedMethod, Parameter, ParameterBinding, PathSegment};
use proc_macro2::{Ident, TokenStream};
use quote::{format_ident, quote};

/// Locals of a generated method body
struct Locals {
    client: Ident,
    url: Ident,
    request: Ident,
    response: Ident,
    value: Ident,
    fields: Ident,
    form: Ident,
    part: Ident,
}

impl Locals {
    fn new(method: &AnnotatedMethod) -> Self {
        let mut names = LocalNames::new(method);
        Self {
            client: names.fresh("client"),
            url: names.fresh("url"),
            request: names.fresh("request"),
            response: names.fresh("response"),
            value: names.fresh("value"),
            fields: names.fresh("fields"),
            form: names.fresh("form"),
            part: names.fresh("part"),
        }
    }
}

struct MethodBuilder<'a> {
    method: &'a AnnotatedMethod,
    runtime: &'a syn::Path,
    locals: Locals,
    statements: Vec<TokenStream>,
}

/// Renders the trait method implementation.
pub fn implement_method(
    method: &AnnotatedMethod,
    encoding: &BodyEncoding,
    runtime: &syn::Path,
) -> TokenStream {
    let mut builder = MethodBuilder {
        method,
        runtime,
        locals: Locals::new(method),
        statements: Vec::new(),
    };

    builder.static_headers();
    builder.query();
    builder.headers();
    builder.body(encoding);
    builder.finish()
}

impl MethodBuilder<'_> {
    fn parameter(&self, name: &str) -> Ident {
        ident(name)
    }

    fn static_headers(&mut self) {
        let request = &self.locals.request;
        for header in &self.method.modifiers.headers {
            let (name, value) = (&header.name, &header.value);
            self.statements.push(quote! {
                #request = #request.header(#name, #value);
            });
        }
    }

    fn query(&mut self) {
        let method = self.method;
        for parameter in &method.parameters {
            let ParameterBinding::Query { key } = &parameter.binding else {
                continue;
            };
            let statement = if parameter.ty.is_map() {
                self.query_map(parameter)
            } else {
                self.keyed_values(parameter, key, |request, key, value| {
                    quote!(#request = #request.query(&[(#key, #value.to_string())]);)
                })
            };
            self.statements.push(statement);
        }
    }

    fn query_map(&self, parameter: &Parameter) -> TokenStream {
        let request = &self.locals.request;
        let param = self.parameter(&parameter.name);
        if parameter.nullable() {
            let value = &self.locals.value;
            quote! {
                if let Some(#value) = &#param {
                    #request = #request.query(#value);
                }
            }
        } else {
            quote!(#request = #request.query(&#param);)
        }
    }

    fn headers(&mut self) {
        let method = self.method;
        for parameter in &method.parameters {
            let ParameterBinding::Header { key } = &parameter.binding else {
                continue;
            };
            let statement = self.keyed_values(parameter, key, |request, key, value| {
                quote!(#request = #request.header(#key, #value.to_string());)
            });
            self.statements.push(statement);
        }
    }

    /// One statement per value: once for a scalar, per element for a list, skipped when absent
    fn keyed_values(
        &self,
        parameter: &Parameter,
        key: &str,
        apply: impl Fn(&Ident, &str, &TokenStream) -> TokenStream,
    ) -> TokenStream {
        let request = &self.locals.request;
        let value = &self.locals.value;
        let param = self.parameter(&parameter.name);
        let is_list = parameter.ty.is_list() || parameter.ty.is_slice();

        match (is_list, parameter.nullable()) {
            (true, false) => {
                let each = apply(request, key, &quote!(#value));
                quote! {
                    for #value in #param.iter() {
                        #each
                    }
                }
            }
            (true, true) => {
                let each = apply(request, key, &quote!(#value));
                quote! {
                    for #value in #param.iter().flat_map(|values| values.iter()) {
                        #each
                    }
                }
            }
            (false, true) => {
                let each = apply(request, key, &quote!(#value));
                quote! {
                    if let Some(#value) = &#param {
                        #each
                    }
                }
            }
            (false, false) => apply(request, key, &quote!(#param)),
        }
    }

    fn body(&mut self, encoding: &BodyEncoding) {
        let runtime = self.runtime;
        let request = &self.locals.request;

        let statement = match encoding {
            BodyEncoding::NoBody => return,
            BodyEncoding::JsonObject { param } => {
                let param = self.parameter(param);
                quote!(#request = #request.json(&#param);)
            }
            BodyEncoding::JsonMap { fields, maps } => {
                let collect = self.collect_fields(fields, maps, quote!(#runtime::JsonFields), true);
                let target = &self.locals.fields;
                quote! {
                    #collect
                    #request = #request.json(&#target);
                }
            }
            BodyEncoding::FormUrlEncoded { fields, maps } => {
                let collect = self.collect_fields(fields, maps, quote!(#runtime::FormFields), false);
                let target = &self.locals.fields;
                quote! {
                    #collect
                    #request = #request.form(&#target);
                }
            }
            BodyEncoding::Multipart(MultipartBody::Wrapper { param }) => {
                let param = self.parameter(param);
                quote!(#request = #request.multipart(#param);)
            }
            BodyEncoding::Multipart(MultipartBody::Parts { parts }) => {
                let form = &self.locals.form;
                let appends: Vec<TokenStream> = parts.iter().map(|p| self.append_part(p)).collect();
                quote! {
                    let mut #form = #runtime::Form::new();
                    #(#appends)*
                    #request = #request.multipart(#form);
                }
            }
        };

        self.statements.push(statement);
    }

    /// Fills a `JsonFields`/`FormFields` collection; JSON inserts can fail and are propagated
    fn collect_fields(
        &self,
        fields: &[FieldSpec],
        maps: &[MapSpec],
        collection: TokenStream,
        fallible: bool,
    ) -> TokenStream {
        let target = &self.locals.fields;
        let value = &self.locals.value;
        let question = if fallible { quote!(?) } else { TokenStream::new() };

        let mut statements = Vec::new();
        for field in fields {
            let key = &field.key;
            let param = self.parameter(&field.param);
            statements.push(if field.nullable {
                quote! {
                    if let Some(#value) = &#param {
                        #target.insert(#key, #value)#question;
                    }
                }
            } else {
                quote!(#target.insert(#key, &#param)#question;)
            });
        }
        for map in maps {
            let param = self.parameter(&map.param);
            statements.push(if map.nullable {
                quote! {
                    if let Some(#value) = &#param {
                        #target.extend(#value.iter())#question;
                    }
                }
            } else {
                quote!(#target.extend(#param.iter())#question;)
            });
        }

        let binding = if statements.is_empty() {
            quote!(let #target)
        } else {
            quote!(let mut #target)
        };
        quote! {
            #binding = #collection::new();
            #(#statements)*
        }
    }

    fn append_part(&self, spec: &PartSpec) -> TokenStream {
        let form = &self.locals.form;
        let value = &self.locals.value;
        let part = &self.locals.part;
        let key = &spec.key;
        let param = self.parameter(&spec.param);

        match (spec.kind, spec.nullable) {
            (PartKind::List, false) => quote! {
                for #part in #param {
                    #form = #form.part(#key, #part);
                }
            },
            (PartKind::List, true) => quote! {
                for #part in #param.into_iter().flatten() {
                    #form = #form.part(#key, #part);
                }
            },
            (PartKind::Raw, false) => quote!(#form = #form.part(#key, #param);),
            (PartKind::Raw, true) => quote! {
                if let Some(#value) = #param {
                    #form = #form.part(#key, #value);
                }
            },
            (PartKind::Scalar, false) => quote!(#form = #form.text(#key, #param.to_string());),
            (PartKind::Scalar, true) => quote! {
                if let Some(#value) = &#param {
                    #form = #form.text(#key, #value.to_string());
                }
            },
        }
    }

    /// `"/posts"` or `&format!("/posts/{}", id)`
    fn endpoint(&self) -> TokenStream {
        let segments = path_segments(&self.method.path_template);
        if segments
            .iter()
            .all(|s| matches!(s, PathSegment::Literal(_)))
        {
            let literal = &self.method.path_template;
            return quote!(#literal);
        }

        let mut format = String::new();
        let mut arguments = Vec::new();
        for segment in segments {
            match segment {
                PathSegment::Literal(text) => {
                    format.push_str(&text.replace('{', "{{").replace('}', "}}"));
                }
                PathSegment::Placeholder(token) => {
                    format.push_str("{}");
                    let bound = self.method.parameters.iter().find(|p| {
                        matches!(&p.binding, ParameterBinding::Path { key } if *key == token)
                    });
                    // The validator guarantees a binding for every placeholder
                    let name = bound.map_or(token.as_str(), |p| p.name.as_str());
                    arguments.push(self.parameter(name));
                }
            }
        }

        quote!(&format!(#format, #(#arguments),*))
    }

    fn finish(self) -> TokenStream {
        let runtime = self.runtime;
        let method = self.method;
        let Locals {
            client,
            url,
            request,
            response,
            ..
        } = &self.locals;

        let name = ident(&method.name);
        let parameters = method.parameters.iter().map(|p| {
            let name = ident(&p.name);
            let ty = &p.ty;
            quote!(#name: #ty)
        });
        let return_type = &method.return_type;
        let allow = if method.has_unbound_parameters() {
            quote!(#[allow(unused_variables)])
        } else {
            TokenStream::new()
        };

        let endpoint = self.endpoint();
        let verb = format_ident!("{}", method.http_method.as_str());
        let binding = if self.statements.is_empty() {
            quote!(let #request)
        } else {
            quote!(let mut #request)
        };
        let statements = &self.statements;

        let respond = match method.success_type() {
            Some(success) if success.is_unit() => quote! {
                #runtime::send(#request).await?;
                Ok(())
            },
            _ if method.modifiers.text_response => quote! {
                let #response = #runtime::send(#request).await?;
                Ok(#runtime::read_text(#response).await?)
            },
            _ => quote! {
                let #response = #runtime::send(#request).await?;
                Ok(#runtime::read_json(#response).await?)
            },
        };

        quote! {
            #allow
            async fn #name(&self, #(#parameters),*) -> #return_type {
                let (#client, #url) = self.context.endpoint(#endpoint)?;
                #binding = #client.request(#runtime::reqwest::Method::#verb, #url);
                #(#statements)*
                #respond
            }
        }
    }
}
