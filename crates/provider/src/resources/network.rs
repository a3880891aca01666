//! Network policy

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use nfvis_common::{Error, ResourceKind, Result};

use super::{replace_on_difference, require_non_empty, scalar_eq, string_or_number, MergePolicy};

/// Desired L2 network configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkSpec {
    #[serde(alias = "network")]
    pub name: String,

    /// Bridge the network is attached to
    pub bridge: String,

    #[serde(default)]
    pub trunk: Option<bool>,

    #[serde(default)]
    pub sriov: Option<bool>,

    #[serde(default)]
    pub native_tagged: Option<bool>,

    #[serde(default, deserialize_with = "string_or_number")]
    pub native_vlan: Option<String>,

    /// Access VLAN; only meaningful when `trunk` is false
    #[serde(default, deserialize_with = "string_or_number")]
    pub vlan: Option<String>,
}

impl NetworkSpec {
    fn access_vlan(&self) -> Option<&str> {
        match self.trunk {
            Some(false) => self.vlan.as_deref(),
            _ => None,
        }
    }
}

pub struct NetworkPolicy;

impl MergePolicy for NetworkPolicy {
    type Spec = NetworkSpec;

    const KIND: ResourceKind = ResourceKind::Network;

    fn key(spec: &NetworkSpec) -> String {
        spec.name.clone()
    }

    fn validate(spec: &NetworkSpec) -> Result<()> {
        require_non_empty("name", &spec.name)?;
        require_non_empty("bridge", &spec.bridge)?;
        if spec.vlan.is_some() && spec.trunk != Some(false) {
            return Err(Error::validation(
                "vlan",
                "an access vlan requires trunk to be false",
            ));
        }
        Ok(())
    }

    fn build(spec: &NetworkSpec) -> Result<Map<String, Value>> {
        let mut doc = Map::new();
        doc.insert("name".into(), json!(spec.name));
        doc.insert("bridge".into(), json!(spec.bridge));

        if let Some(trunk) = spec.trunk {
            doc.insert("trunk".into(), json!(trunk));
        }
        if let Some(vlan) = spec.access_vlan() {
            doc.insert("vlan".into(), json!(vlan));
        }
        if let Some(sriov) = spec.sriov {
            doc.insert("sriov".into(), json!(sriov));
        }
        if let Some(tagged) = spec.native_tagged {
            doc.insert("native-tagged".into(), json!(tagged));
        }
        if let Some(native) = &spec.native_vlan {
            doc.insert("native-vlan".into(), json!(native));
        }

        Ok(doc)
    }

    fn merge(spec: &NetworkSpec, existing: &mut Map<String, Value>) -> Result<Vec<&'static str>> {
        let mut changed = Vec::new();

        if replace_on_difference(existing, "bridge", json!(spec.bridge)) {
            changed.push("bridge");
        }

        if let Some(trunk) = spec.trunk {
            if replace_on_difference(existing, "trunk", json!(trunk)) {
                changed.push("trunk");
            }
        }

        if let Some(vlan) = spec.access_vlan() {
            let desired = json!(vlan);
            let matches = match existing.get("vlan") {
                Some(Value::Array(ids)) => ids.iter().any(|id| scalar_eq(id, &desired)),
                Some(remote) => scalar_eq(remote, &desired),
                None => false,
            };
            if !matches {
                existing.insert("vlan".into(), desired);
                changed.push("vlan");
            }
        }

        if let Some(sriov) = spec.sriov {
            if replace_on_difference(existing, "sriov", json!(sriov)) {
                changed.push("sriov");
            }
        }

        if let Some(tagged) = spec.native_tagged {
            if replace_on_difference(existing, "native-tagged", json!(tagged)) {
                changed.push("native_tagged");
            }
        }

        if let Some(native) = &spec.native_vlan {
            if replace_on_difference(existing, "native-vlan", json!(native)) {
                changed.push("native_vlan");
            }
        }

        Ok(changed)
    }
}
