//! VLAN policy
//!
//! VLANs carry nothing beyond their id, so an existing VLAN is always
//! converged.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use nfvis_common::{Error, ResourceKind, Result};

use super::MergePolicy;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VlanSpec {
    #[serde(alias = "vlan-id")]
    pub vlan_id: u16,
}

pub struct VlanPolicy;

impl MergePolicy for VlanPolicy {
    type Spec = VlanSpec;

    const KIND: ResourceKind = ResourceKind::Vlan;

    fn key(spec: &VlanSpec) -> String {
        spec.vlan_id.to_string()
    }

    fn validate(spec: &VlanSpec) -> Result<()> {
        if !(1..=4094).contains(&spec.vlan_id) {
            return Err(Error::validation("vlan_id", "must be between 1 and 4094"));
        }
        Ok(())
    }

    fn build(spec: &VlanSpec) -> Result<Map<String, Value>> {
        let mut doc = Map::new();
        doc.insert("vlan-id".into(), json!(spec.vlan_id));
        Ok(doc)
    }
}
