//! Serialization of the resolved model for `--dump-model`.
//!
//! The dump lists every validated service trait with its methods, bindings and the body
//! encoding chosen for each method, which is what the emitter works from.

use crate::generator::ServicePlan;
use anyhow::{Context, Result};
use log::debug;

/// Serializes service plans to YAML.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn serialize_yaml(plans: &[ServicePlan]) -> Result<String> {
    debug!("Serializing {} service plans to YAML", plans.len());
    serde_yaml::to_string(plans).context("Failed to serialize service model to YAML")
}

/// Serializes service plans to pretty-printed JSON.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn serialize_json(plans: &[ServicePlan]) -> Result<String> {
    debug!("Serializing {} service plans to JSON", plans.len());
    serde_json::to_string_pretty(plans).context("Failed to serialize service model to JSON")
}
