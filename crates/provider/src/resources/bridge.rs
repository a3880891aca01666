//! Bridge policy

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use nfvis_common::{Error, ResourceKind, Result};

use super::{replace_on_difference, require_non_empty, union_by_name, MergePolicy};

/// Desired bridge configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BridgeSpec {
    #[serde(alias = "bridge")]
    pub name: String,

    /// Ports attached to the bridge; only ever added
    #[serde(default)]
    pub ports: Option<Vec<String>>,

    #[serde(default)]
    pub ip: Option<IpSpec>,

    #[serde(default)]
    pub vlan: Option<u32>,

    #[serde(default)]
    pub dhcp: Option<bool>,

    /// Overwrite an existing bridge with a freshly built document
    #[serde(default)]
    pub purge: bool,
}

/// Bridge address; both parts are required together
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IpSpec {
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub netmask: Option<String>,
}

impl IpSpec {
    fn require(&self) -> Result<(&str, &str)> {
        let address = self
            .address
            .as_deref()
            .ok_or_else(|| Error::validation("ip.address", "address must be specified for ip"))?;
        let netmask = self
            .netmask
            .as_deref()
            .ok_or_else(|| Error::validation("ip.netmask", "netmask must be specified for ip"))?;
        Ok((address, netmask))
    }
}

pub struct BridgePolicy;

impl MergePolicy for BridgePolicy {
    type Spec = BridgeSpec;

    const KIND: ResourceKind = ResourceKind::Bridge;

    fn key(spec: &BridgeSpec) -> String {
        spec.name.clone()
    }

    fn validate(spec: &BridgeSpec) -> Result<()> {
        require_non_empty("name", &spec.name)?;
        if let Some(ip) = &spec.ip {
            ip.require()?;
        }
        Ok(())
    }

    fn build(spec: &BridgeSpec) -> Result<Map<String, Value>> {
        let mut doc = Map::new();
        doc.insert("name".into(), json!(spec.name));

        if spec.dhcp == Some(true) {
            doc.insert("dhcp".into(), json!([null]));
        }

        let mut ports: Vec<Value> = Vec::new();
        for port in spec.ports.iter().flatten() {
            let entry = json!({ "name": port });
            if !ports.contains(&entry) {
                ports.push(entry);
            }
        }
        doc.insert("port".into(), Value::Array(ports));

        if let Some(vlan) = spec.vlan {
            doc.insert("vlan".into(), json!(vlan));
        }

        if let Some(ip) = &spec.ip {
            let (address, netmask) = ip.require()?;
            doc.insert(
                "ip".into(),
                json!({ "address": address, "netmask": netmask }),
            );
        }

        Ok(doc)
    }

    fn merge(spec: &BridgeSpec, existing: &mut Map<String, Value>) -> Result<Vec<&'static str>> {
        let mut changed = Vec::new();

        if let Some(ports) = spec.ports.as_deref().filter(|p| !p.is_empty()) {
            if union_by_name(Self::KIND, existing, "port", ports)? {
                changed.push("ports");
            }
        }

        if let Some(vlan) = spec.vlan {
            if replace_on_difference(existing, "vlan", json!(vlan)) {
                changed.push("vlan");
            }
        }

        // dhcp is an empty leaf: present means enabled
        match (spec.dhcp, existing.contains_key("dhcp")) {
            (Some(true), false) => {
                existing.insert("dhcp".into(), json!([null]));
                changed.push("dhcp");
            }
            (Some(false), true) => {
                existing.remove("dhcp");
                changed.push("dhcp");
            }
            _ => {}
        }

        if let Some(ip) = &spec.ip {
            let (address, netmask) = ip.require()?;
            let written = match existing.get_mut("ip") {
                Some(Value::Object(remote)) => {
                    let address = replace_on_difference(remote, "address", json!(address));
                    let netmask = replace_on_difference(remote, "netmask", json!(netmask));
                    address || netmask
                }
                _ => {
                    existing.insert(
                        "ip".into(),
                        json!({ "address": address, "netmask": netmask }),
                    );
                    true
                }
            };
            if written {
                changed.push("ip");
            }
        }

        Ok(changed)
    }

    fn replaces_existing(spec: &BridgeSpec) -> bool {
        spec.purge
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn remote(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    fn spec(name: &str) -> BridgeSpec {
        BridgeSpec {
            name: name.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_build_fresh_document() {
        let spec = BridgeSpec {
            ports: Some(vec!["GE0-0".into(), "GE0-1".into(), "GE0-0".into()]),
            dhcp: Some(true),
            vlan: Some(20),
            ip: Some(IpSpec {
                address: Some("10.0.0.1".into()),
                netmask: Some("255.255.255.0".into()),
            }),
            ..spec("lan-br")
        };
        let doc = Value::Object(BridgePolicy::build(&spec).unwrap());
        assert_eq!(
            doc,
            json!({
                "name": "lan-br",
                "dhcp": [null],
                "port": [{"name": "GE0-0"}, {"name": "GE0-1"}],
                "vlan": 20,
                "ip": {"address": "10.0.0.1", "netmask": "255.255.255.0"}
            })
        );
    }

    #[test]
    fn test_ip_requires_both_parts() {
        let spec = BridgeSpec {
            ip: Some(IpSpec {
                address: Some("10.0.0.1".into()),
                netmask: None,
            }),
            ..spec("lan-br")
        };
        match BridgePolicy::validate(&spec) {
            Err(Error::Validation { field, .. }) => assert_eq!(field, "ip.netmask"),
            other => panic!("expected validation error, got {other:?}"),
        }
        assert!(BridgePolicy::build(&spec).is_err());
    }

    #[test]
    fn test_empty_name_rejected() {
        assert!(BridgePolicy::validate(&spec("  ")).is_err());
    }

    #[test]
    fn test_ports_subset_is_unchanged() {
        let mut existing = remote(json!({"name": "br", "port": [{"name": "a"}, {"name": "b"}]}));
        let spec = BridgeSpec {
            ports: Some(vec!["a".into()]),
            ..spec("br")
        };
        let changed = BridgePolicy::merge(&spec, &mut existing).unwrap();
        assert!(changed.is_empty());
        assert_eq!(existing["port"], json!([{"name": "a"}, {"name": "b"}]));
    }

    #[test]
    fn test_ports_added_only() {
        let mut existing = remote(json!({"name": "br", "port": [{"name": "a"}, {"name": "b"}]}));
        let spec = BridgeSpec {
            ports: Some(vec!["a".into(), "c".into()]),
            ..spec("br")
        };
        let changed = BridgePolicy::merge(&spec, &mut existing).unwrap();
        assert_eq!(changed, vec!["ports"]);
        assert_eq!(
            existing["port"],
            json!([{"name": "a"}, {"name": "b"}, {"name": "c"}])
        );
    }

    #[test]
    fn test_dhcp_toggles_empty_leaf() {
        let mut existing = remote(json!({"name": "br"}));
        let enable = BridgeSpec {
            dhcp: Some(true),
            ..spec("br")
        };
        assert_eq!(BridgePolicy::merge(&enable, &mut existing).unwrap(), vec!["dhcp"]);
        assert_eq!(existing["dhcp"], json!([null]));
        assert!(BridgePolicy::merge(&enable, &mut existing).unwrap().is_empty());

        let disable = BridgeSpec {
            dhcp: Some(false),
            ..spec("br")
        };
        assert_eq!(BridgePolicy::merge(&disable, &mut existing).unwrap(), vec!["dhcp"]);
        assert!(!existing.contains_key("dhcp"));
    }

    #[test]
    fn test_ip_merged_per_field() {
        let mut existing = remote(json!({
            "name": "br",
            "ip": {"address": "10.0.0.1", "netmask": "255.255.255.0"}
        }));
        let same = BridgeSpec {
            ip: Some(IpSpec {
                address: Some("10.0.0.1".into()),
                netmask: Some("255.255.255.0".into()),
            }),
            ..spec("br")
        };
        assert!(BridgePolicy::merge(&same, &mut existing).unwrap().is_empty());

        let moved = BridgeSpec {
            ip: Some(IpSpec {
                address: Some("10.0.0.2".into()),
                netmask: Some("255.255.255.0".into()),
            }),
            vlan: Some(30),
            ..spec("br")
        };
        assert_eq!(
            BridgePolicy::merge(&moved, &mut existing).unwrap(),
            vec!["vlan", "ip"]
        );
        assert_eq!(existing["ip"]["address"], "10.0.0.2");
        assert_eq!(existing["vlan"], 30);
    }

    #[test]
    fn test_no_opinion_leaves_remote_alone() {
        let original = json!({"name": "br", "vlan": 5, "dhcp": [null], "port": [{"name": "a"}]});
        let mut existing = remote(original.clone());
        assert!(BridgePolicy::merge(&spec("br"), &mut existing).unwrap().is_empty());
        assert_eq!(Value::Object(existing), original);
    }
}
