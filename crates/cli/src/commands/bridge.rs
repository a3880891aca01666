//! Bridge Commands

use anyhow::Result;
use clap::Args;

use nfvis_common::State;
use nfvis_provider::resources::{BridgePolicy, BridgeSpec, IpSpec};

use super::Session;

#[derive(Args, Debug)]
pub struct BridgeArgs {
    /// Bridge name
    pub name: String,

    /// Port to attach (repeatable); existing ports are never detached
    #[arg(long = "port")]
    pub ports: Vec<String>,

    /// Bridge IP address
    #[arg(long)]
    pub address: Option<String>,

    /// Bridge netmask
    #[arg(long)]
    pub netmask: Option<String>,

    /// Bridge VLAN
    #[arg(long)]
    pub vlan: Option<u32>,

    /// Enable or disable DHCP on the bridge
    #[arg(long)]
    pub dhcp: Option<bool>,

    /// Replace an existing bridge instead of merging into it
    #[arg(long)]
    pub purge: bool,

    /// Desired state (present, absent)
    #[arg(long, default_value = "present")]
    pub state: State,
}

impl BridgeArgs {
    pub fn spec(&self) -> BridgeSpec {
        let ip = if self.address.is_some() || self.netmask.is_some() {
            Some(IpSpec {
                address: self.address.clone(),
                netmask: self.netmask.clone(),
            })
        } else {
            None
        };

        BridgeSpec {
            name: self.name.clone(),
            ports: (!self.ports.is_empty()).then(|| self.ports.clone()),
            ip,
            vlan: self.vlan,
            dhcp: self.dhcp,
            purge: self.purge,
        }
    }
}

pub async fn execute(args: BridgeArgs, session: &Session) -> Result<()> {
    session
        .reconcile::<BridgePolicy>(&args.spec(), args.state)
        .await?;
    Ok(())
}
