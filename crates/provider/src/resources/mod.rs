//! Merge Policies
//!
//! One policy per resource kind. A policy knows how to build a fresh
//! document from a desired spec and how to fold a desired spec into an
//! existing remote instance. Orchestration lives in the reconciler.

pub mod bridge;
pub mod deployment;
pub mod network;
pub mod package;
pub mod system;
pub mod vlan;

use serde::{Deserialize, Deserializer};
use serde_json::{json, Map, Value};
use tracing::warn;

use nfvis_common::{Error, Method, ResourceKind, Result};

pub use bridge::{BridgePolicy, BridgeSpec, IpSpec};
pub use deployment::{ConfigDataSpec, DeploymentPolicy, DeploymentSpec, InterfaceSpec, PortForwardSpec};
pub use network::{NetworkPolicy, NetworkSpec};
pub use package::{PackagePolicy, PackageSpec};
pub use system::{SystemPolicy, SystemSpec};
pub use vlan::{VlanPolicy, VlanSpec};

/// Field-level comparison and merge rules for one resource kind
pub trait MergePolicy {
    /// Caller-supplied target configuration
    type Spec: Send + Sync;

    const KIND: ResourceKind;

    /// Key identifying the instance within its collection
    fn key(spec: &Self::Spec) -> String;

    /// Structural checks run before any request is made
    fn validate(_spec: &Self::Spec) -> Result<()> {
        Ok(())
    }

    /// Fresh document body (without the root wrapper) for a create
    fn build(spec: &Self::Spec) -> Result<Map<String, Value>>;

    /// Fold the spec into `existing`, returning the fields that were written.
    /// An empty list means the instance already converged.
    fn merge(_spec: &Self::Spec, _existing: &mut Map<String, Value>) -> Result<Vec<&'static str>> {
        Ok(Vec::new())
    }

    /// Replace an existing instance wholesale instead of merging into it
    fn replaces_existing(_spec: &Self::Spec) -> bool {
        false
    }
}

/// Wrap a document body in its kind's root object
pub fn wrap(kind: ResourceKind, body: Map<String, Value>) -> Value {
    let mut root = Map::new();
    root.insert(kind.document_root().to_string(), Value::Object(body));
    Value::Object(root)
}

pub(crate) fn require_non_empty(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::validation(field, "must not be empty"));
    }
    Ok(())
}

/// Accept an identifier written either as a string or as a bare number,
/// keeping its decimal string form
pub(crate) fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected a string or a number, found {}",
            other
        ))),
    }
}

/// Scalar equality that treats `100` and `"100"` as the same value
pub(crate) fn scalar_eq(remote: &Value, desired: &Value) -> bool {
    if remote == desired {
        return true;
    }
    match (remote, desired) {
        (Value::String(s), Value::Number(n)) | (Value::Number(n), Value::String(s)) => {
            *s == n.to_string()
        }
        (Value::String(s), Value::Bool(b)) | (Value::Bool(b), Value::String(s)) => {
            *s == b.to_string()
        }
        _ => false,
    }
}

/// Write `desired` into `field` when it is missing or different.
/// Returns whether a write happened.
pub(crate) fn replace_on_difference(
    doc: &mut Map<String, Value>,
    field: &str,
    desired: Value,
) -> bool {
    if let Some(remote) = doc.get(field) {
        if scalar_eq(remote, &desired) {
            return false;
        }
    }
    doc.insert(field.to_string(), desired);
    true
}

/// Append `{"name": ...}` entries to the list under `field` for every
/// desired name not already present. Remote entries are never removed, so a
/// remote value that is neither a list nor a single entry is refused.
pub(crate) fn union_by_name(
    kind: ResourceKind,
    doc: &mut Map<String, Value>,
    field: &str,
    names: &[String],
) -> Result<bool> {
    let mut entries = match doc.get(field) {
        Some(Value::Array(entries)) => entries.clone(),
        // a lone entry may come back unwrapped
        Some(entry @ Value::Object(_)) => vec![entry.clone()],
        None | Some(Value::Null) => Vec::new(),
        Some(other) => {
            warn!("{} '{}' has unexpected shape: {}", kind, field, other);
            return Err(Error::Decode {
                method: Method::Get,
                path: kind.fetch_path(),
                message: format!("'{}' is neither a list nor a single entry", field),
            });
        }
    };

    let mut known: Vec<String> = entries
        .iter()
        .filter_map(|e| e.get("name").and_then(crate::index::key_string))
        .collect();

    let mut changed = false;
    for name in names {
        if !known.contains(name) {
            entries.push(json!({ "name": name }));
            known.push(name.clone());
            changed = true;
        }
    }

    if !entries.is_empty() {
        doc.insert(field.to_string(), Value::Array(entries));
    }
    Ok(changed)
}
