//! Request body classification.
//!
//! Each validated method is resolved to exactly one [`BodyEncoding`], which the emitter
//! matches on. Query and header bindings are independent of the body and are not part of
//! the encoding.

use crate::annotations::RuntimeTypes;
use crate::error::GeneratorError;
use crate::model::{AnnotatedInterface, AnnotatedMethod, Parameter, ParameterBinding};
use serde::Serialize;

/// How a method's request body is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BodyEncoding {
    /// No body is attached
    NoBody,
    /// The single `#[body]` parameter serialized as JSON
    JsonObject { param: String },
    /// `#[field]`/`#[field_map]` parameters collected into a JSON object
    JsonMap {
        fields: Vec<FieldSpec>,
        maps: Vec<MapSpec>,
    },
    /// `#[field]`/`#[field_map]` parameters sent as `application/x-www-form-urlencoded`
    FormUrlEncoded {
        fields: Vec<FieldSpec>,
        maps: Vec<MapSpec>,
    },
    Multipart(MultipartBody),
}

/// A keyed `#[field]` parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldSpec {
    pub key: String,
    pub param: String,
    /// Only sent when present
    pub nullable: bool,
}

/// A `#[field_map]` parameter whose entries are merged into the body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MapSpec {
    pub param: String,
    pub nullable: bool,
}

/// Shape of a multipart request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum MultipartBody {
    /// A prebuilt form passed through unchanged
    Wrapper { param: String },
    /// A form assembled from `#[part]` parameters, in declaration order
    Parts { parts: Vec<PartSpec> },
}

/// A `#[part]` parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartSpec {
    pub key: String,
    pub param: String,
    pub kind: PartKind,
    pub nullable: bool,
}

/// How a part parameter is appended to the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PartKind {
    /// Every element is appended under the same key
    List,
    /// Appended as-is
    Raw,
    /// Appended as a text field using its string form
    Scalar,
}

/// Resolves the encodings of every method of an interface, in method order.
pub fn resolve_interface(
    interface: &AnnotatedInterface,
    types: &RuntimeTypes,
) -> Result<Vec<BodyEncoding>, GeneratorError> {
    interface
        .methods
        .iter()
        .map(|method| resolve(interface, method, types))
        .collect()
}

/// Resolves the body encoding of one validated method.
///
/// # Errors
///
/// Returns [`GeneratorError::UnsupportedPart`] for a `#[part]` parameter that is neither a
/// list of parts, a part nor a scalar.
pub fn resolve(
    interface: &AnnotatedInterface,
    method: &AnnotatedMethod,
    types: &RuntimeTypes,
) -> Result<BodyEncoding, GeneratorError> {
    if method.modifiers.multipart {
        if let Some(body) = method.bodies().next() {
            return Ok(BodyEncoding::Multipart(MultipartBody::Wrapper {
                param: body.name.clone(),
            }));
        }

        let parts = method
            .parts()
            .map(|parameter| part_spec(interface, method, parameter, types))
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(BodyEncoding::Multipart(MultipartBody::Parts { parts }));
    }

    if let Some(body) = method.bodies().next() {
        return Ok(BodyEncoding::JsonObject {
            param: body.name.clone(),
        });
    }

    let mut fields = Vec::new();
    let mut maps = Vec::new();
    for parameter in method.form_fields() {
        match &parameter.binding {
            ParameterBinding::Field { key } => fields.push(FieldSpec {
                key: key.clone(),
                param: parameter.name.clone(),
                nullable: parameter.nullable(),
            }),
            _ => maps.push(MapSpec {
                param: parameter.name.clone(),
                nullable: parameter.nullable(),
            }),
        }
    }

    if method.modifiers.form_url_encoded {
        Ok(BodyEncoding::FormUrlEncoded { fields, maps })
    } else if fields.is_empty() && maps.is_empty() {
        Ok(BodyEncoding::NoBody)
    } else {
        Ok(BodyEncoding::JsonMap { fields, maps })
    }
}

fn part_spec(
    interface: &AnnotatedInterface,
    method: &AnnotatedMethod,
    parameter: &Parameter,
    types: &RuntimeTypes,
) -> Result<PartSpec, GeneratorError> {
    let key = match &parameter.binding {
        ParameterBinding::Part { key } => key.clone(),
        _ => parameter.name.clone(),
    };
    let ty = &parameter.ty;

    // Parts are moved into the form, so only owned parts qualify
    let kind = if !ty.by_ref && ty.list_element().is_some_and(|e| types.is_part(e) && !e.by_ref) {
        PartKind::List
    } else if !ty.by_ref && types.is_part(ty) {
        PartKind::Raw
    } else if ty.is_scalar() {
        PartKind::Scalar
    } else {
        return Err(GeneratorError::UnsupportedPart {
            interface: interface.name.clone(),
            method: method.name.clone(),
            parameter: parameter.name.clone(),
            type_name: ty.to_string(),
        });
    };

    Ok(PartSpec {
        key,
        param: parameter.name.clone(),
        kind,
        nullable: ty.nullable,
    })
}
