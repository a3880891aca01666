//! Network Commands

use anyhow::Result;
use clap::Args;

use nfvis_common::State;
use nfvis_provider::resources::{NetworkPolicy, NetworkSpec};

use super::Session;

#[derive(Args, Debug)]
pub struct NetworkArgs {
    /// Network name
    pub name: String,

    /// Bridge the network is attached to (required when present)
    #[arg(long)]
    pub bridge: Option<String>,

    #[arg(long)]
    pub trunk: Option<bool>,

    #[arg(long)]
    pub sriov: Option<bool>,

    #[arg(long)]
    pub native_tagged: Option<bool>,

    #[arg(long)]
    pub native_vlan: Option<String>,

    /// Access VLAN, requires --trunk false
    #[arg(long)]
    pub vlan: Option<String>,

    /// Desired state (present, absent)
    #[arg(long, default_value = "present")]
    pub state: State,
}

impl NetworkArgs {
    pub fn spec(&self) -> NetworkSpec {
        NetworkSpec {
            name: self.name.clone(),
            bridge: self.bridge.clone().unwrap_or_default(),
            trunk: self.trunk,
            sriov: self.sriov,
            native_tagged: self.native_tagged,
            native_vlan: self.native_vlan.clone(),
            vlan: self.vlan.clone(),
        }
    }
}

pub async fn execute(args: NetworkArgs, session: &Session) -> Result<()> {
    session
        .reconcile::<NetworkPolicy>(&args.spec(), args.state)
        .await?;
    Ok(())
}
