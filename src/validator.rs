//! Structural checks on an extracted service trait.
//!
//! Rules run per method in a fixed order and the first violation wins:
//!
//! 1. path placeholders and `#[path]` keys are a bijection
//! 2. at most one `#[body]`
//! 3. `#[body]`, `#[field]` and `#[field_map]` only on POST, PUT and PATCH
//! 4. `#[body]` excludes `#[field]`/`#[field_map]`
//! 5. multipart shape
//! 6. form-url-encoded shape
//! 7. `#[field_map]` is a map
//! 8. the signature can be implemented (`async`, `&self`, no generics, `Result` return)
//! 9. `#[text_response]` returns `String`
//!
//! Validation never touches the file system and never emits anything.

use crate::annotations::RuntimeTypes;
use crate::error::{ValidationError, ValidationRule};
use crate::model::{AnnotatedInterface, AnnotatedMethod, ParameterBinding};
use log::debug;
use std::collections::BTreeSet;

/// Validates every method of an interface, stopping at the first violation.
pub fn validate_interface(interface: &AnnotatedInterface, types: &RuntimeTypes) -> Result<(), ValidationError> {
    for method in &interface.methods {
        validate_method(&interface.name, method, types)?;
    }
    debug!("Validated {} ({} methods)", interface.name, interface.methods.len());
    Ok(())
}

/// Runs all rules against one method.
///
/// # Errors
///
/// Returns the first rule violation, naming the method, the rule and the offending
/// tokens or parameters.
pub fn validate_method(
    interface: &str,
    method: &AnnotatedMethod,
    types: &RuntimeTypes,
) -> Result<(), ValidationError> {
    let checker = MethodChecker {
        interface,
        method,
        types,
    };

    checker.path_placeholders()?;
    checker.body_cardinality()?;
    checker.body_verb()?;
    checker.body_field_exclusive()?;
    checker.multipart_shape()?;
    checker.form_shape()?;
    checker.field_map_type()?;
    checker.signature()?;
    checker.text_response()?;

    Ok(())
}

struct MethodChecker<'a> {
    interface: &'a str,
    method: &'a AnnotatedMethod,
    types: &'a RuntimeTypes,
}

impl MethodChecker<'_> {
    fn fail(&self, rule: ValidationRule, message: impl Into<String>) -> Result<(), ValidationError> {
        Err(ValidationError::new(
            self.interface,
            &self.method.name,
            rule,
            message,
        ))
    }

    fn path_placeholders(&self) -> Result<(), ValidationError> {
        let rule = ValidationRule::PathPlaceholders;
        let tokens: BTreeSet<String> = self.method.path_placeholders().into_iter().collect();

        let mut keys = BTreeSet::new();
        for parameter in &self.method.parameters {
            if let ParameterBinding::Path { key } = &parameter.binding {
                if !keys.insert(key.clone()) {
                    return self.fail(rule, format!("path key \"{}\" is bound more than once", key));
                }
                if parameter.nullable() {
                    return self.fail(
                        rule,
                        format!("path parameter `{}` cannot be optional", parameter.name),
                    );
                }
            }
        }

        let missing: Vec<&str> = tokens.difference(&keys).map(String::as_str).collect();
        if !missing.is_empty() {
            return self.fail(
                rule,
                format!(
                    "path \"{}\" has placeholders without a #[path] parameter: {}",
                    self.method.path_template,
                    missing.join(", ")
                ),
            );
        }

        let extra: Vec<&str> = keys.difference(&tokens).map(String::as_str).collect();
        if !extra.is_empty() {
            return self.fail(
                rule,
                format!(
                    "#[path] keys not found in path \"{}\": {}",
                    self.method.path_template,
                    extra.join(", ")
                ),
            );
        }

        Ok(())
    }

    fn body_cardinality(&self) -> Result<(), ValidationError> {
        let bodies: Vec<&str> = self.method.bodies().map(|p| p.name.as_str()).collect();
        if bodies.len() > 1 {
            return self.fail(
                ValidationRule::BodyCardinality,
                format!("only one #[body] parameter is allowed, found {}", bodies.join(", ")),
            );
        }
        Ok(())
    }

    fn body_verb(&self) -> Result<(), ValidationError> {
        let verb = self.method.http_method;
        if verb.allows_body() {
            return Ok(());
        }

        let offending = self.method.parameters.iter().find_map(|p| match p.binding {
            ParameterBinding::Body => Some("#[body]"),
            ParameterBinding::Field { .. } => Some("#[field]"),
            ParameterBinding::FieldMap => Some("#[field_map]"),
            _ => None,
        });
        match offending {
            Some(attribute) => self.fail(
                ValidationRule::BodyVerb,
                format!("{} is not supported for {} requests", attribute, verb),
            ),
            None => Ok(()),
        }
    }

    fn body_field_exclusive(&self) -> Result<(), ValidationError> {
        if self.method.bodies().next().is_some() && self.method.form_fields().next().is_some() {
            return self.fail(
                ValidationRule::BodyFieldExclusive,
                "#[body] cannot be combined with #[field] or #[field_map]",
            );
        }
        Ok(())
    }

    fn multipart_shape(&self) -> Result<(), ValidationError> {
        let rule = ValidationRule::MultipartShape;
        let modifiers = &self.method.modifiers;
        let has_parts = self.method.parts().next().is_some();

        if !modifiers.multipart {
            if has_parts {
                return self.fail(rule, "#[part] parameters require #[multipart]");
            }
            return Ok(());
        }

        let verb = self.method.http_method;
        if !verb.allows_body() {
            return self.fail(rule, format!("#[multipart] is not supported for {} requests", verb));
        }
        if modifiers.form_url_encoded {
            return self.fail(rule, "#[multipart] cannot be combined with #[form_url_encoded]");
        }
        if self.method.form_fields().next().is_some() {
            return self.fail(
                rule,
                "#[field] and #[field_map] are not supported with #[multipart], use #[part]",
            );
        }

        let body = self.method.bodies().next();
        match (has_parts, body) {
            (false, None) => self.fail(
                rule,
                "#[multipart] requires at least one #[part] or a #[body] multipart form",
            ),
            (true, Some(_)) => self.fail(rule, "#[part] cannot be combined with #[body]"),
            (false, Some(body)) => {
                if self.types.is_form(&body.ty) && !body.ty.nullable && !body.ty.by_ref {
                    Ok(())
                } else {
                    self.fail(
                        rule,
                        format!(
                            "#[body] `{}` of a multipart request must be an owned multipart form, found {}",
                            body.name, body.ty
                        ),
                    )
                }
            }
            (true, None) => Ok(()),
        }
    }

    fn form_shape(&self) -> Result<(), ValidationError> {
        let rule = ValidationRule::FormShape;
        if !self.method.modifiers.form_url_encoded {
            return Ok(());
        }

        let verb = self.method.http_method;
        if !verb.allows_body() {
            return self.fail(
                rule,
                format!("#[form_url_encoded] is not supported for {} requests", verb),
            );
        }
        if self.method.bodies().next().is_some() {
            return self.fail(rule, "#[form_url_encoded] cannot be combined with #[body]");
        }
        Ok(())
    }

    fn field_map_type(&self) -> Result<(), ValidationError> {
        for parameter in &self.method.parameters {
            if parameter.binding == ParameterBinding::FieldMap && !parameter.ty.is_map() {
                return self.fail(
                    ValidationRule::FieldMapType,
                    format!(
                        "#[field_map] parameter `{}` must be a map type, found {}",
                        parameter.name, parameter.ty
                    ),
                );
            }
        }
        Ok(())
    }

    fn signature(&self) -> Result<(), ValidationError> {
        let rule = ValidationRule::Signature;
        let signature = &self.method.signature;

        if !signature.is_async {
            return self.fail(rule, "method must be `async fn`");
        }
        if !signature.has_ref_self {
            return self.fail(rule, "method must take `&self`");
        }
        if signature.has_generics {
            return self.fail(rule, "generic methods are not supported");
        }

        match self.method.success_type() {
            None => self.fail(
                rule,
                format!(
                    "return type must be a `Result<T, E>`, found {}",
                    self.method.return_type
                ),
            ),
            Some(success) if success.by_ref => self.fail(
                rule,
                format!("success type {} cannot be a reference", success),
            ),
            Some(_) => Ok(()),
        }
    }

    fn text_response(&self) -> Result<(), ValidationError> {
        if !self.method.modifiers.text_response {
            return Ok(());
        }

        match self.method.success_type() {
            Some(success) if success.is_text() && !success.nullable && success.path != "str" => Ok(()),
            Some(success) => self.fail(
                ValidationRule::TextResponse,
                format!("#[text_response] requires a `String` success type, found {}", success),
            ),
            None => self.fail(
                ValidationRule::TextResponse,
                "#[text_response] requires a `String` success type",
            ),
        }
    }
}
