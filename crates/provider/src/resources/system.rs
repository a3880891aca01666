//! System settings policy
//!
//! Settings are a singleton that always exists on the appliance; they can
//! only be updated.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use nfvis_common::{Error, ResourceKind, Result, SINGLETON_KEY};

use super::{replace_on_difference, require_non_empty, scalar_eq, MergePolicy};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SystemSpec {
    #[serde(default)]
    pub hostname: Option<String>,

    /// Networks allowed to reach the management interface
    #[serde(default)]
    pub trusted_source: Option<Vec<String>>,
}

pub struct SystemPolicy;

fn same_list(remote: &Value, desired: &[String]) -> bool {
    match remote {
        Value::Array(items) => {
            items.len() == desired.len()
                && items
                    .iter()
                    .zip(desired)
                    .all(|(item, want)| scalar_eq(item, &json!(want)))
        }
        scalar => desired.len() == 1 && scalar_eq(scalar, &json!(desired[0])),
    }
}

impl MergePolicy for SystemPolicy {
    type Spec = SystemSpec;

    const KIND: ResourceKind = ResourceKind::SystemSettings;

    fn key(_spec: &SystemSpec) -> String {
        SINGLETON_KEY.to_string()
    }

    fn validate(spec: &SystemSpec) -> Result<()> {
        if let Some(hostname) = &spec.hostname {
            require_non_empty("hostname", hostname)?;
        }
        Ok(())
    }

    fn build(_spec: &SystemSpec) -> Result<Map<String, Value>> {
        Err(Error::Unsupported {
            kind: Self::KIND,
            operation: "create",
        })
    }

    fn merge(spec: &SystemSpec, existing: &mut Map<String, Value>) -> Result<Vec<&'static str>> {
        let mut changed = Vec::new();

        if let Some(hostname) = &spec.hostname {
            if replace_on_difference(existing, "hostname", json!(hostname)) {
                changed.push("hostname");
            }
        }

        if let Some(sources) = spec.trusted_source.as_deref().filter(|s| !s.is_empty()) {
            let converged = existing
                .get("trusted-source")
                .map_or(false, |remote| same_list(remote, sources));
            if !converged {
                existing.insert("trusted-source".into(), json!(sources));
                changed.push("trusted_source");
            }
        }

        Ok(changed)
    }
}
