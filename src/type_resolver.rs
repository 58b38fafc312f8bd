use crate::annotations::{is_prelude, ImportMap};
use crate::model::{is_primitive, TypeRef};
use log::debug;
use quote::ToTokens;
use std::collections::HashSet;
use syn::{GenericArgument, PathArguments, Type};

/// Type resolver - turns `syn` types into [`TypeRef`]s.
///
/// Paths are resolved through the imports of the module the type is written in, which is
/// what well-known type detection (lists, maps, parts) works from. The written spelling is
/// kept alongside so generated code refers to the type exactly as the trait does.
///
/// Only the shapes generated code can reproduce are accepted: paths with type arguments,
/// `Option<T>`, `()`, shared references (`&T`, `&'a str`, `&[T]`). Anything else is
/// rejected with a message suitable for a validation error.
pub struct TypeResolver<'a> {
    imports: &'a ImportMap,
}

impl<'a> TypeResolver<'a> {
    pub fn new(imports: &'a ImportMap) -> Self {
        Self { imports }
    }

    pub fn resolve(&self, ty: &Type) -> Result<TypeRef, String> {
        match ty {
            Type::Paren(paren) => self.resolve(&paren.elem),
            Type::Group(group) => self.resolve(&group.elem),
            Type::Tuple(tuple) if tuple.elems.is_empty() => Ok(TypeRef::unit()),
            Type::Reference(reference) => {
                if reference.mutability.is_some() {
                    return Err(format!("mutable reference `{}` is not supported", render(ty)));
                }

                let mut inner = match reference.elem.as_ref() {
                    Type::Slice(slice) => TypeRef::slice(self.resolve(&slice.elem)?),
                    other => self.resolve(other)?,
                };
                if inner.by_ref || inner.nullable {
                    return Err(format!(
                        "reference type `{}` is not supported, use `Option<&T>` or a single `&T`",
                        render(ty)
                    ));
                }

                inner.by_ref = true;
                inner.lifetime = reference.lifetime.as_ref().map(|l| l.ident.to_string());
                Ok(inner)
            }
            Type::Path(type_path) if type_path.qself.is_none() => {
                let path = &type_path.path;
                let segments: Vec<String> =
                    path.segments.iter().map(|s| s.ident.to_string()).collect();
                let leading_colon = path.leading_colon.is_some();

                let Some(last) = path.segments.last() else {
                    return Err("empty type path".to_string());
                };
                let module_segments = path.segments.len() - 1;
                if path
                    .segments
                    .iter()
                    .take(module_segments)
                    .any(|s| !s.arguments.is_none())
                {
                    return Err(format!("type `{}` has arguments on a module segment", render(ty)));
                }

                let type_arguments = self.resolve_arguments(&last.arguments, ty)?;

                let written = if leading_colon {
                    format!("::{}", segments.join("::"))
                } else {
                    segments.join("::")
                };
                let qualified = self.imports.resolve_type(&segments, leading_colon);

                if let (true, [inner]) = (is_option(&qualified), type_arguments.as_slice()) {
                    let mut inner = inner.clone();
                    if inner.nullable {
                        return Err(format!("nested option `{}` is not supported", render(ty)));
                    }
                    inner.nullable = true;
                    return Ok(inner);
                }

                debug!("Resolved type {} as {}", written, qualified);
                Ok(TypeRef::named(qualified, written).with_arguments(type_arguments))
            }
            _ => Err(format!("type `{}` is not supported", render(ty))),
        }
    }

    fn resolve_arguments(&self, arguments: &PathArguments, ty: &Type) -> Result<Vec<TypeRef>, String> {
        match arguments {
            PathArguments::None => Ok(Vec::new()),
            PathArguments::AngleBracketed(args) => args
                .args
                .iter()
                .map(|arg| match arg {
                    GenericArgument::Type(inner) => self.resolve(inner),
                    _ => Err(format!(
                        "type `{}` has a generic argument other than a type",
                        render(ty)
                    )),
                })
                .collect(),
            PathArguments::Parenthesized(_) => {
                Err(format!("function trait type `{}` is not supported", render(ty)))
            }
        }
    }
}

/// Rewrites an import-resolved path found in `module_path` so that it names the same item
/// from any module of the crate.
///
/// `modules` holds every module path of the scanned crate; a relative path whose first
/// segment is a child module stays crate-local, anything else relative is an external crate.
pub fn anchor_path(qualified: &str, module_path: &[String], modules: &HashSet<Vec<String>>) -> String {
    let segments: Vec<&str> = qualified.split("::").collect();
    let local = |base: Vec<String>, rest: &[&str]| {
        let mut path = vec!["crate".to_string()];
        path.extend(base);
        path.extend(rest.iter().map(|s| s.to_string()));
        path.join("::")
    };

    match segments.as_slice() {
        ["crate", ..] => qualified.to_string(),
        ["self" | "super", ..] => {
            let mut base = module_path.to_vec();
            let mut rest = segments.as_slice();
            while let Some((first, tail)) = rest.split_first() {
                match *first {
                    "self" => {}
                    "super" => {
                        base.pop();
                    }
                    _ => break,
                }
                rest = tail;
            }
            local(base, rest)
        }
        [name] if is_primitive(name) => qualified.to_string(),
        [_] => local(module_path.to_vec(), &segments),
        [first, ..] => {
            let mut child = module_path.to_vec();
            child.push(first.to_string());
            if modules.contains(&child) {
                local(module_path.to_vec(), &segments)
            } else {
                format!("::{}", qualified)
            }
        }
        [] => qualified.to_string(),
    }
}

/// Respells a type and its arguments with [`anchor_path`]; prelude names, `()` and
/// primitives are kept as written.
pub fn anchor_type(ty: &TypeRef, module_path: &[String], modules: &HashSet<Vec<String>>) -> TypeRef {
    let mut anchored = ty.clone();
    if !ty.is_slice() && ty.path != "()" && !is_prelude(&ty.path, &ty.qualified_name) {
        anchored.path = anchor_path(&ty.qualified_name, module_path, modules);
    }
    anchored.type_arguments = ty
        .type_arguments
        .iter()
        .map(|argument| anchor_type(argument, module_path, modules))
        .collect();
    anchored
}

fn is_option(qualified: &str) -> bool {
    matches!(qualified, "std::option::Option" | "core::option::Option")
}

fn render(ty: &Type) -> String {
    ty.to_token_stream().to_string()
}
