//! VLAN Commands

use anyhow::Result;
use clap::Args;

use nfvis_common::State;
use nfvis_provider::resources::{VlanPolicy, VlanSpec};

use super::Session;

#[derive(Args, Debug)]
pub struct VlanArgs {
    /// VLAN id (1-4094)
    pub vlan_id: u16,

    /// Desired state (present, absent)
    #[arg(long, default_value = "present")]
    pub state: State,
}

pub async fn execute(args: VlanArgs, session: &Session) -> Result<()> {
    let spec = VlanSpec {
        vlan_id: args.vlan_id,
    };
    session.reconcile::<VlanPolicy>(&spec, args.state).await?;
    Ok(())
}
