//! Declarations
//!
//! A declaration is an untyped desired spec tagged with its kind, as read
//! from a YAML or JSON file. Dispatch routes it to the typed reconciler for
//! that kind.

use serde::{Deserialize, Serialize};

use nfvis_common::{Error, Report, ResourceKind, Result, State};

use crate::client::ResourceClient;
use crate::reconciler::{ReconcileOptions, Reconciler};
use crate::report::Failure;
use crate::resources::*;

/// Desired spec for any supported kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DesiredSpec {
    Bridge(BridgeSpec),
    Network(NetworkSpec),
    Vlan(VlanSpec),
    #[serde(alias = "system")]
    SystemSettings(SystemSpec),
    Deployment(DeploymentSpec),
    #[serde(alias = "package")]
    ImagePackage(PackageSpec),
}

impl DesiredSpec {
    pub fn kind(&self) -> ResourceKind {
        match self {
            DesiredSpec::Bridge(_) => ResourceKind::Bridge,
            DesiredSpec::Network(_) => ResourceKind::Network,
            DesiredSpec::Vlan(_) => ResourceKind::Vlan,
            DesiredSpec::SystemSettings(_) => ResourceKind::SystemSettings,
            DesiredSpec::Deployment(_) => ResourceKind::Deployment,
            DesiredSpec::ImagePackage(_) => ResourceKind::ImagePackage,
        }
    }
}

/// One entry of a declaration file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Declaration {
    #[serde(default)]
    pub state: State,
    #[serde(flatten)]
    pub spec: DesiredSpec,
}

impl Declaration {
    pub fn new(spec: DesiredSpec, state: State) -> Self {
        Self { state, spec }
    }
}

/// Reconcile one declaration with the reconciler for its kind
pub async fn reconcile_declaration<C>(
    client: &C,
    declaration: &Declaration,
    options: ReconcileOptions,
) -> std::result::Result<Report, Failure>
where
    C: ResourceClient + ?Sized,
{
    let state = declaration.state;
    match &declaration.spec {
        DesiredSpec::Bridge(spec) => {
            Reconciler::<C, BridgePolicy>::new(client, options)
                .reconcile(spec, state)
                .await
        }
        DesiredSpec::Network(spec) => {
            Reconciler::<C, NetworkPolicy>::new(client, options)
                .reconcile(spec, state)
                .await
        }
        DesiredSpec::Vlan(spec) => {
            Reconciler::<C, VlanPolicy>::new(client, options)
                .reconcile(spec, state)
                .await
        }
        DesiredSpec::SystemSettings(spec) => {
            Reconciler::<C, SystemPolicy>::new(client, options)
                .reconcile(spec, state)
                .await
        }
        DesiredSpec::Deployment(spec) => {
            Reconciler::<C, DeploymentPolicy>::new(client, options)
                .reconcile(spec, state)
                .await
        }
        DesiredSpec::ImagePackage(spec) => {
            Reconciler::<C, PackagePolicy>::new(client, options)
                .reconcile(spec, state)
                .await
        }
    }
}

/// Parse a declaration file holding either one mapping or a list of them.
/// JSON is accepted too, being a subset of YAML.
pub fn parse_declarations(text: &str) -> Result<Vec<Declaration>> {
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }
    let invalid = |e: serde_yaml::Error| Error::validation("declaration", e.to_string());

    // Decide the root shape first so field errors keep their location
    let root: serde_yaml::Value = serde_yaml::from_str(text).map_err(invalid)?;
    match root {
        serde_yaml::Value::Sequence(_) => serde_yaml::from_str(text).map_err(invalid),
        serde_yaml::Value::Null => Ok(Vec::new()),
        _ => Ok(vec![serde_yaml::from_str(text).map_err(invalid)?]),
    }
}
