//! VM deployment policy
//!
//! The API has no update primitive for deployments: once a deployment with
//! the desired name exists it is left as is, whatever its configuration.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use nfvis_common::{Error, ResourceKind, Result};

use super::{require_non_empty, MergePolicy};

/// Desired VM deployment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentSpec {
    #[serde(alias = "deployment")]
    pub name: String,

    /// Registered image to boot
    pub image: String,

    pub flavor: String,

    /// Seconds to wait for the VM to come up; negative disables monitoring
    #[serde(default = "default_bootup_time")]
    pub bootup_time: i64,

    #[serde(default)]
    pub recovery_wait_time: i64,

    #[serde(default)]
    pub kpi_data: bool,

    #[serde(default)]
    pub scaling: bool,

    #[serde(default = "default_one")]
    pub scaling_min_active: u32,

    #[serde(default = "default_one")]
    pub scaling_max_active: u32,

    #[serde(default = "default_placement_type")]
    pub placement_type: String,

    #[serde(default = "default_placement_enforcement")]
    pub placement_enforcement: String,

    #[serde(default = "default_placement_host")]
    pub placement_host: String,

    #[serde(default = "default_recovery_type")]
    pub recovery_type: String,

    #[serde(default = "default_action_on_recovery")]
    pub action_on_recovery: String,

    #[serde(default)]
    pub interfaces: Vec<InterfaceSpec>,

    #[serde(default)]
    pub port_forwarding: Vec<PortForwardSpec>,

    #[serde(default)]
    pub config_data: Vec<ConfigDataSpec>,
}

fn default_bootup_time() -> i64 {
    -1
}

fn default_one() -> u32 {
    1
}

fn default_placement_type() -> String {
    "zone_host".to_string()
}

fn default_placement_enforcement() -> String {
    "strict".to_string()
}

fn default_placement_host() -> String {
    "datastore1".to_string()
}

fn default_recovery_type() -> String {
    "AUTO".to_string()
}

fn default_action_on_recovery() -> String {
    "REBOOT_ONLY".to_string()
}

impl DeploymentSpec {
    /// Spec with every optional setting at its default
    pub fn new(name: impl Into<String>, image: impl Into<String>, flavor: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            image: image.into(),
            flavor: flavor.into(),
            bootup_time: default_bootup_time(),
            recovery_wait_time: 0,
            kpi_data: false,
            scaling: false,
            scaling_min_active: 1,
            scaling_max_active: 1,
            placement_type: default_placement_type(),
            placement_enforcement: default_placement_enforcement(),
            placement_host: default_placement_host(),
            recovery_type: default_recovery_type(),
            action_on_recovery: default_action_on_recovery(),
            interfaces: Vec::new(),
            port_forwarding: Vec::new(),
            config_data: Vec::new(),
        }
    }

    fn monitored(&self) -> bool {
        self.kpi_data || self.bootup_time > 0
    }
}

/// One vNIC of the VM
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InterfaceSpec {
    /// Defaults to the interface's position
    #[serde(default)]
    pub nicid: Option<u32>,
    #[serde(default)]
    pub network: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
}

/// Port forwarded from the appliance to the first vNIC
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PortForwardSpec {
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub vnf_port: Option<u16>,
    #[serde(default)]
    pub proxy_port: Option<u16>,
    #[serde(default)]
    pub protocol: Option<String>,
    #[serde(default)]
    pub source_bridge: Option<String>,
}

/// File injected into the VM at boot
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigDataSpec {
    #[serde(default)]
    pub dst: Option<String>,
    /// Sent verbatim when a string, JSON-encoded otherwise
    #[serde(default)]
    pub data: Option<Value>,
}

fn port_forward_entry(item: &PortForwardSpec) -> Result<Value> {
    let proxy_port = item.proxy_port.ok_or_else(|| {
        Error::validation(
            "port_forwarding.proxy_port",
            "proxy_port must be specified for port_forwarding",
        )
    })?;
    Ok(json!({
        "type": item.kind.as_deref().unwrap_or("ssh"),
        "vnf_port": item.vnf_port.unwrap_or(22),
        "external_port_range": { "start": proxy_port, "end": proxy_port },
        "protocol": item.protocol.as_deref().unwrap_or("tcp"),
        "source_bridge": item.source_bridge.as_deref().unwrap_or("MGMT"),
    }))
}

fn config_entry(item: &ConfigDataSpec) -> Result<Value> {
    let dst = item.dst.as_deref().ok_or_else(|| {
        Error::validation("config_data.dst", "dst must be specified for config_data")
    })?;
    let data = match &item.data {
        Some(Value::String(text)) => text.clone(),
        Some(other) => serde_json::to_string(other)?,
        None => {
            return Err(Error::validation(
                "config_data.data",
                "data must be specified for config_data",
            ))
        }
    };
    Ok(json!({ "configuration": { "dst": dst, "data": data } }))
}

pub struct DeploymentPolicy;

impl MergePolicy for DeploymentPolicy {
    type Spec = DeploymentSpec;

    const KIND: ResourceKind = ResourceKind::Deployment;

    fn key(spec: &DeploymentSpec) -> String {
        spec.name.clone()
    }

    fn validate(spec: &DeploymentSpec) -> Result<()> {
        require_non_empty("name", &spec.name)?;
        require_non_empty("image", &spec.image)?;
        require_non_empty("flavor", &spec.flavor)?;
        if spec.scaling_min_active > spec.scaling_max_active {
            return Err(Error::validation(
                "scaling_min_active",
                "must not exceed scaling_max_active",
            ));
        }
        if spec.interfaces.iter().any(|i| i.network.is_none()) {
            return Err(Error::validation(
                "interfaces.network",
                "network must be specified for interface",
            ));
        }
        for item in &spec.port_forwarding {
            port_forward_entry(item)?;
        }
        for item in &spec.config_data {
            config_entry(item)?;
        }
        Ok(())
    }

    fn build(spec: &DeploymentSpec) -> Result<Map<String, Value>> {
        let mut group = Map::new();
        group.insert("name".into(), json!(spec.name));
        group.insert("image".into(), json!(spec.image));
        group.insert("flavor".into(), json!(spec.flavor));
        group.insert("bootup_time".into(), json!(spec.bootup_time));
        group.insert("recovery_wait_time".into(), json!(spec.recovery_wait_time));

        let mut kpi_data = json!({ "enabled": spec.kpi_data });
        if spec.monitored() {
            kpi_data["kpi"] = json!({
                "event_name": "VM_ALIVE",
                "metric_value": 1,
                "metric_cond": "GT",
                "metric_type": "UINT32",
                "metric_collector": {
                    "type": "ICMPPing",
                    "nicid": 0,
                    "poll_frequency": 3,
                    "polling_unit": "seconds",
                    "continuous_alarm": false
                }
            });
            group.insert(
                "rules".into(),
                json!({
                    "admin_rules": {
                        "rule": {
                            "event_name": "VM_ALIVE",
                            "action": [
                                "ALWAYS log",
                                "FALSE recover autohealing",
                                "TRUE servicebooted.sh"
                            ]
                        }
                    }
                }),
            );
        }
        group.insert("kpi_data".into(), kpi_data);

        group.insert(
            "scaling".into(),
            json!({
                "min_active": spec.scaling_min_active,
                "max_active": spec.scaling_max_active,
                "elastic": spec.scaling
            }),
        );
        group.insert(
            "placement".into(),
            json!({
                "type": spec.placement_type,
                "enforcement": spec.placement_enforcement,
                "host": spec.placement_host
            }),
        );
        group.insert(
            "recovery_policy".into(),
            json!({
                "recovery_type": spec.recovery_type,
                "action_on_recovery": spec.action_on_recovery
            }),
        );

        let forwards = spec
            .port_forwarding
            .iter()
            .map(port_forward_entry)
            .collect::<Result<Vec<_>>>()?;
        let port_forwarding = match forwards.len() {
            0 => None,
            1 => Some(json!({ "port": forwards[0] })),
            _ => Some(json!({ "port": forwards })),
        };

        if !spec.interfaces.is_empty() {
            let mut interfaces = Vec::with_capacity(spec.interfaces.len());
            for (position, item) in spec.interfaces.iter().enumerate() {
                let network = item.network.as_deref().ok_or_else(|| {
                    Error::validation("interfaces.network", "network must be specified for interface")
                })?;
                let mut interface = json!({
                    "nicid": item.nicid.unwrap_or(position as u32),
                    "network": network,
                    "model": item.model.as_deref().unwrap_or("virtio"),
                });
                if position == 0 {
                    if let Some(forwarding) = &port_forwarding {
                        interface["port_forwarding"] = forwarding.clone();
                    }
                }
                interfaces.push(json!({ "interface": interface }));
            }
            group.insert("interfaces".into(), Value::Array(interfaces));
        }

        if !spec.config_data.is_empty() {
            let entries = spec
                .config_data
                .iter()
                .map(config_entry)
                .collect::<Result<Vec<_>>>()?;
            group.insert("config_data".into(), Value::Array(entries));
        }

        let mut doc = Map::new();
        doc.insert("name".into(), json!(spec.name));
        doc.insert("vm_group".into(), Value::Object(group));
        Ok(doc)
    }
}
