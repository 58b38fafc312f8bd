//! Service extraction: from parsed files to [`AnnotatedInterface`]s.
//!
//! Extraction runs in two passes. The first pass visits every module scope of every file
//! (inline `mod` blocks included, function bodies excluded), records the scope's imports and
//! indexes every trait. The second pass turns each trait carrying the API-service marker into
//! an [`AnnotatedInterface`]: its own verb-annotated methods in declaration order, followed by
//! those inherited from supertraits found in the index.
//!
//! Supertrait bounds are resolved through the imports of the scope they are written in and
//! matched by full path, so two traits sharing a name in different modules never mix.
//! Inherited signatures are respelled with crate-anchored paths, since the generated
//! implementation lives next to the service trait rather than the supertrait.
//!
//! # Example
//!
//! ```no_run
//! use client_from_source::annotations::AnnotationModel;
//! use client_from_source::extractor::ServiceExtractor;
//! use client_from_source::parser::AstParser;
//! use std::path::Path;
//!
//! let parsed = AstParser::parse_file(Path::new("src/api.rs"), Path::new("src")).unwrap();
//! let model = AnnotationModel::default();
//! for interface in ServiceExtractor::new(&model).extract(&[parsed]) {
//!     println!("{}", interface.unwrap().name);
//! }
//! ```

pub mod attributes;

use crate::annotations::{AnnotationKind, AnnotationModel, BindingKind, ImportMap, ModifierKind};
use crate::error::{GeneratorError, ValidationError, ValidationRule};
use crate::model::{
    AnnotatedInterface, AnnotatedMethod, MethodModifiers, Parameter, ParameterBinding,
    SignatureShape, StaticHeader, TypeRef, Visibility,
};
use crate::parser::ParsedFile;
use crate::type_resolver::{anchor_path, anchor_type, TypeResolver};
use log::{debug, warn};
use quote::ToTokens;
use std::collections::HashSet;
use std::path::Path;
use syn::visit::Visit;
use syn::{FnArg, ItemTrait, Pat, ReturnType, TraitItem, TraitItemFn, TypeParamBound};

/// Extracts annotated service traits from parsed files.
pub struct ServiceExtractor<'m> {
    model: &'m AnnotationModel,
}

/// A trait found while indexing, with the scope it was declared in.
struct TraitEntry<'ast> {
    item: &'ast ItemTrait,
    file: &'ast Path,
    module_path: Vec<String>,
    /// Index into the collected import scopes
    scope: usize,
}

impl TraitEntry<'_> {
    fn name(&self) -> String {
        self.item.ident.to_string()
    }

    /// `crate::a::b::Name`, nameable from anywhere in the crate
    fn crate_path(&self) -> String {
        let mut segments = vec!["crate".to_string()];
        segments.extend(self.module_path.iter().cloned());
        segments.push(self.name());
        segments.join("::")
    }
}

/// Visitor for indexing traits and the imports of their module scopes
struct TraitCollector<'ast> {
    file: &'ast Path,
    module_path: Vec<String>,
    scope_stack: Vec<usize>,
    scopes: Vec<ImportMap>,
    traits: Vec<TraitEntry<'ast>>,
    /// Every module path seen, from files and from `mod` items
    modules: HashSet<Vec<String>>,
}

impl<'ast> TraitCollector<'ast> {
    fn new() -> Self {
        Self {
            file: Path::new(""),
            module_path: Vec::new(),
            scope_stack: Vec::new(),
            scopes: Vec::new(),
            traits: Vec::new(),
            modules: HashSet::new(),
        }
    }

    fn collect_file(&mut self, parsed: &'ast ParsedFile) {
        self.file = &parsed.path;
        self.module_path = parsed.module_path.clone();
        for depth in 0..=self.module_path.len() {
            self.modules.insert(self.module_path[..depth].to_vec());
        }
        self.scopes.push(ImportMap::from_items(&parsed.syntax_tree.items));
        self.scope_stack.push(self.scopes.len() - 1);

        self.visit_file(&parsed.syntax_tree);

        self.scope_stack.pop();
    }
}

impl<'ast> Visit<'ast> for TraitCollector<'ast> {
    fn visit_item_mod(&mut self, node: &'ast syn::ItemMod) {
        self.module_path.push(node.ident.to_string());
        self.modules.insert(self.module_path.clone());

        // `mod name;` only declares the module, its file is collected on its own
        if let Some((_, items)) = &node.content {
            self.scopes.push(ImportMap::from_items(items));
            self.scope_stack.push(self.scopes.len() - 1);

            syn::visit::visit_item_mod(self, node);

            self.scope_stack.pop();
        }
        self.module_path.pop();
    }

    fn visit_item_trait(&mut self, node: &'ast ItemTrait) {
        let scope = self.scope_stack.last().copied().unwrap_or_default();
        self.traits.push(TraitEntry {
            item: node,
            file: self.file,
            module_path: self.module_path.clone(),
            scope,
        });
    }

    // Items inside function bodies cannot be named from the module path
    fn visit_block(&mut self, _node: &'ast syn::Block) {}
}

impl<'m> ServiceExtractor<'m> {
    pub fn new(model: &'m AnnotationModel) -> Self {
        Self { model }
    }

    /// Extracts every API-service trait, in file order then declaration order.
    ///
    /// Each entry is independent: an error in one trait does not prevent the others from
    /// being extracted.
    pub fn extract(&self, parsed_files: &[ParsedFile]) -> Vec<Result<AnnotatedInterface, GeneratorError>> {
        let mut collector = TraitCollector::new();
        for parsed_file in parsed_files {
            collector.collect_file(parsed_file);
        }
        debug!("Indexed {} traits", collector.traits.len());

        collector
            .traits
            .iter()
            .filter(|entry| self.is_service(entry, &collector.scopes))
            .map(|entry| self.build_interface(entry, &collector))
            .collect()
    }

    fn is_service(&self, entry: &TraitEntry<'_>, scopes: &[ImportMap]) -> bool {
        let imports = &scopes[entry.scope];
        entry
            .item
            .attrs
            .iter()
            .any(|attr| self.model.classify(attr, imports) == Some(AnnotationKind::ApiService))
    }

    fn build_interface(
        &self,
        entry: &TraitEntry<'_>,
        collector: &TraitCollector<'_>,
    ) -> Result<AnnotatedInterface, GeneratorError> {
        let name = entry.name();
        debug!("Extracting service trait {}", entry.crate_path());

        if !entry.item.generics.params.is_empty() {
            return Err(ValidationError::new(
                &name,
                "",
                ValidationRule::Signature,
                "generic service traits are not supported",
            )
            .into());
        }

        let visibility = match entry.item.vis {
            syn::Visibility::Public(_) => Visibility::Public,
            _ => Visibility::Internal,
        };

        let mut collected = MethodSet::default();
        self.collect_methods(&name, entry, collector, &mut collected)?;

        debug!(
            "Trait {} has {} generation targets across {} supertraits",
            name,
            collected.methods.len(),
            collected.supertraits.len()
        );

        Ok(AnnotatedInterface {
            module_path: entry.module_path.clone(),
            name,
            visibility,
            source_file: entry.file.to_path_buf(),
            methods: collected.methods,
            supertraits: collected.supertraits,
        })
    }

    /// Collects the verb methods of `entry`, then recurses into its supertraits
    fn collect_methods(
        &self,
        interface: &str,
        entry: &TraitEntry<'_>,
        collector: &TraitCollector<'_>,
        collected: &mut MethodSet,
    ) -> Result<(), GeneratorError> {
        let inherited = !collected.visited.is_empty();
        let crate_path = entry.crate_path();
        if !collected.visited.insert(crate_path.clone()) {
            return Ok(());
        }
        let declared_in = if inherited {
            collected.supertraits.push(crate_path.clone());
            crate_path
        } else {
            entry.name()
        };

        let imports = &collector.scopes[entry.scope];
        for item in &entry.item.items {
            let TraitItem::Fn(function) = item else {
                continue;
            };
            let method_name = function.sig.ident.to_string();

            match self.build_method(interface, &declared_in, function, imports)? {
                Some(mut method) => {
                    if !collected.names.insert(method_name.clone()) {
                        debug!("Skipping duplicate inherited method {}", method_name);
                        continue;
                    }
                    if inherited {
                        anchor_signature(&mut method, &entry.module_path, &collector.modules);
                    }
                    collected.methods.push(method);
                }
                None if function.default.is_none() => {
                    warn!(
                        "{}::{} has no HTTP verb and no default body; the generated impl will not provide it",
                        entry.name(),
                        method_name
                    );
                }
                None => {}
            }
        }

        for bound in &entry.item.supertraits {
            let TypeParamBound::Trait(trait_bound) = bound else {
                continue;
            };
            match resolve_supertrait(collector, entry, &trait_bound.path) {
                Some(parent) => self.collect_methods(interface, parent, collector, collected)?,
                None => debug!(
                    "Supertrait {} of {} is not part of the scanned sources",
                    trait_bound.path.to_token_stream(),
                    entry.name()
                ),
            }
        }

        Ok(())
    }

    /// Builds the model of one trait method; `None` when it carries no verb
    fn build_method(
        &self,
        interface: &str,
        declared_in: &str,
        function: &TraitItemFn,
        imports: &ImportMap,
    ) -> Result<Option<AnnotatedMethod>, GeneratorError> {
        let method_name = function.sig.ident.to_string();
        let malformed = |message: String| -> GeneratorError {
            ValidationError::new(
                interface,
                &method_name,
                ValidationRule::MalformedAnnotation,
                message,
            )
            .into()
        };

        let mut verbs = Vec::new();
        let mut modifiers = MethodModifiers::default();

        for attr in &function.attrs {
            match self.model.classify(attr, imports) {
                Some(AnnotationKind::Verb(method)) => verbs.push((method, attr)),
                Some(AnnotationKind::Modifier(kind)) => match kind {
                    ModifierKind::Multipart => modifiers.multipart = true,
                    ModifierKind::FormUrlEncoded => modifiers.form_url_encoded = true,
                    ModifierKind::TextResponse => modifiers.text_response = true,
                    ModifierKind::Headers => {
                        let entries = attributes::literal_list(attr)
                            .map_err(|e| malformed(format!("#[headers] {}", e)))?;
                        for raw in entries {
                            let header = StaticHeader::parse(&raw).ok_or_else(|| {
                                malformed(format!("header \"{}\" is not of the form \"Key: Value\"", raw))
                            })?;
                            modifiers.headers.push(header);
                        }
                    }
                },
                Some(other) => {
                    return Err(malformed(format!("{:?} is not a method attribute", other)));
                }
                None => {}
            }
        }

        let (http_method, verb_attr) = match verbs.as_slice() {
            [] => return Ok(None),
            [single] => *single,
            _ => {
                return Err(malformed(format!(
                    "multiple HTTP verb annotations ({})",
                    verbs
                        .iter()
                        .map(|(m, _)| m.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                )))
            }
        };

        let path_template = attributes::required_literal(verb_attr, "a path template string")
            .map_err(|e| malformed(format!("#[{}] {}", attributes::display_name(verb_attr), e)))?;

        let signature_error = |message: String| -> GeneratorError {
            ValidationError::new(interface, &method_name, ValidationRule::Signature, message).into()
        };

        let resolver = TypeResolver::new(imports);
        let mut has_ref_self = false;
        let mut parameters = Vec::new();

        for (index, input) in function.sig.inputs.iter().enumerate() {
            match input {
                FnArg::Receiver(receiver) => {
                    has_ref_self = index == 0
                        && receiver.reference.is_some()
                        && receiver.mutability.is_none();
                }
                FnArg::Typed(pat_type) => {
                    let name = match pat_type.pat.as_ref() {
                        Pat::Ident(ident) if ident.by_ref.is_none() && ident.subpat.is_none() => {
                            ident.ident.to_string()
                        }
                        _ => {
                            return Err(malformed(
                                "parameter patterns must be plain identifiers".to_string(),
                            ))
                        }
                    };

                    let ty = resolver
                        .resolve(&pat_type.ty)
                        .map_err(|e| signature_error(format!("parameter `{}`: {}", name, e)))?;

                    // `r#type` binds under the key `type`
                    let default_key = name.trim_start_matches("r#");
                    let binding = self
                        .parameter_binding(default_key, &pat_type.attrs, imports)
                        .map_err(|e| malformed(format!("parameter `{}`: {}", name, e)))?;

                    parameters.push(Parameter::new(name, ty, binding));
                }
            }
        }

        let return_type = match &function.sig.output {
            ReturnType::Default => TypeRef::unit(),
            ReturnType::Type(_, ty) => resolver
                .resolve(ty)
                .map_err(|e| signature_error(format!("return type: {}", e)))?,
        };

        let signature = SignatureShape {
            is_async: function.sig.asyncness.is_some(),
            has_ref_self,
            has_generics: !function.sig.generics.params.is_empty(),
        };

        debug!(
            "Found {} {} on {}::{}",
            http_method, path_template, declared_in, method_name
        );

        Ok(Some(AnnotatedMethod {
            name: method_name.clone(),
            declared_in: declared_in.to_string(),
            http_method,
            path_template,
            parameters,
            return_type,
            modifiers,
            signature,
        }))
    }

    /// Resolves the single binding attribute of a parameter
    fn parameter_binding(
        &self,
        name: &str,
        attrs: &[syn::Attribute],
        imports: &ImportMap,
    ) -> Result<ParameterBinding, String> {
        let mut bindings = Vec::new();
        for attr in attrs {
            match self.model.classify(attr, imports) {
                Some(AnnotationKind::Binding(kind)) => bindings.push((kind, attr)),
                Some(other) => return Err(format!("{:?} is not a parameter attribute", other)),
                None => {}
            }
        }

        let (kind, attr) = match bindings.as_slice() {
            [] => return Ok(ParameterBinding::Unbound),
            [single] => *single,
            _ => return Err("at most one binding attribute is allowed".to_string()),
        };

        let binding = match kind {
            BindingKind::Path => ParameterBinding::Path {
                key: attributes::key_or_default(attr, name)?,
            },
            BindingKind::Query => ParameterBinding::Query {
                key: attributes::key_or_default(attr, name)?,
            },
            BindingKind::Part => ParameterBinding::Part {
                key: attributes::key_or_default(attr, name)?,
            },
            BindingKind::Header => ParameterBinding::Header {
                key: non_empty(attributes::required_literal(attr, "a header name")?, "a header name")?,
            },
            BindingKind::Field => ParameterBinding::Field {
                key: non_empty(attributes::required_literal(attr, "a field name")?, "a field name")?,
            },
            BindingKind::Body => {
                attributes::no_arguments(attr).map_err(|e| format!("#[body] {}", e))?;
                ParameterBinding::Body
            }
            BindingKind::FieldMap => {
                attributes::no_arguments(attr).map_err(|e| format!("#[field_map] {}", e))?;
                ParameterBinding::FieldMap
            }
        };

        Ok(binding)
    }
}

fn non_empty(value: String, what: &str) -> Result<String, String> {
    if value.is_empty() {
        Err(format!("requires {}", what))
    } else {
        Ok(value)
    }
}

/// Methods gathered for one service trait across its supertraits
#[derive(Default)]
struct MethodSet {
    methods: Vec<AnnotatedMethod>,
    names: HashSet<String>,
    /// Crate paths of the traits already walked
    visited: HashSet<String>,
    supertraits: Vec<String>,
}

/// Finds the scanned trait a supertrait bound of `entry` names
fn resolve_supertrait<'c, 'ast>(
    collector: &'c TraitCollector<'ast>,
    entry: &TraitEntry<'_>,
    bound: &syn::Path,
) -> Option<&'c TraitEntry<'ast>> {
    // `::name` is always an external crate
    if bound.leading_colon.is_some() {
        return None;
    }
    let imports = &collector.scopes[entry.scope];
    let segments: Vec<String> = bound.segments.iter().map(|s| s.ident.to_string()).collect();

    imports
        .candidates(&segments, false)
        .iter()
        .map(|candidate| anchor_path(candidate, &entry.module_path, &collector.modules))
        .find_map(|target| collector.traits.iter().find(|t| t.crate_path() == target))
}

/// Respells an inherited method's types so they resolve from the service trait's module
fn anchor_signature(method: &mut AnnotatedMethod, module_path: &[String], modules: &HashSet<Vec<String>>) {
    for parameter in &mut method.parameters {
        parameter.ty = anchor_type(&parameter.ty, module_path, modules);
    }
    method.return_type = anchor_type(&method.return_type, module_path, modules);
}
