//! Deployment Commands
//!
//! Covers the common single-VM case from flags. Deployments with several
//! forwarded ports or per-interface models are easier to write as a
//! declaration file for `nfvis apply`.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;
use serde_json::Value;

use nfvis_common::State;
use nfvis_provider::resources::{
    ConfigDataSpec, DeploymentPolicy, DeploymentSpec, InterfaceSpec, PortForwardSpec,
};

use super::Session;

#[derive(Args, Debug)]
pub struct DeploymentArgs {
    /// Deployment name
    pub name: String,

    /// Registered image to boot
    #[arg(long)]
    pub image: Option<String>,

    #[arg(long)]
    pub flavor: Option<String>,

    /// Network for the next vNIC, in order (repeatable)
    #[arg(long = "interface")]
    pub interfaces: Vec<String>,

    /// Appliance port forwarded to SSH on the first vNIC
    #[arg(long)]
    pub proxy_port: Option<u16>,

    /// Seconds to wait for the VM to boot; negative disables monitoring
    #[arg(long, default_value_t = -1, allow_hyphen_values = true)]
    pub bootup_time: i64,

    #[arg(long, default_value_t = 0)]
    pub recovery_wait_time: i64,

    /// Enable KPI monitoring
    #[arg(long)]
    pub kpi_data: bool,

    /// Datastore placement host
    #[arg(long)]
    pub placement_host: Option<String>,

    /// Day-0 file as DST=LOCAL_PATH (repeatable)
    #[arg(long = "config-data")]
    pub config_data: Vec<String>,

    /// Desired state (present, absent)
    #[arg(long, default_value = "present")]
    pub state: State,
}

fn parse_config_data(entry: &str) -> Result<ConfigDataSpec> {
    let Some((dst, local)) = entry.split_once('=') else {
        bail!("config data '{}' must be DST=LOCAL_PATH", entry);
    };
    let local = PathBuf::from(local);
    let data = std::fs::read_to_string(&local)
        .with_context(|| format!("cannot read config data from {}", local.display()))?;
    Ok(ConfigDataSpec {
        dst: Some(dst.to_string()),
        data: Some(Value::String(data)),
    })
}

impl DeploymentArgs {
    pub fn spec(&self) -> Result<DeploymentSpec> {
        let mut spec = DeploymentSpec::new(
            self.name.clone(),
            self.image.clone().unwrap_or_default(),
            self.flavor.clone().unwrap_or_default(),
        );
        spec.bootup_time = self.bootup_time;
        spec.recovery_wait_time = self.recovery_wait_time;
        spec.kpi_data = self.kpi_data;
        if let Some(host) = &self.placement_host {
            spec.placement_host = host.clone();
        }
        spec.interfaces = self
            .interfaces
            .iter()
            .map(|network| InterfaceSpec {
                network: Some(network.clone()),
                ..Default::default()
            })
            .collect();
        spec.port_forwarding = self
            .proxy_port
            .map(|port| PortForwardSpec {
                proxy_port: Some(port),
                ..Default::default()
            })
            .into_iter()
            .collect();
        spec.config_data = self
            .config_data
            .iter()
            .map(|entry| parse_config_data(entry))
            .collect::<Result<_>>()?;
        Ok(spec)
    }
}

pub async fn execute(args: DeploymentArgs, session: &Session) -> Result<()> {
    let spec = args.spec()?;
    session
        .reconcile::<DeploymentPolicy>(&spec, args.state)
        .await?;
    Ok(())
}
