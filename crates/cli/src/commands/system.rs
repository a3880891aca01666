//! System Settings Commands

use anyhow::Result;
use clap::Args;

use nfvis_common::State;
use nfvis_provider::resources::{SystemPolicy, SystemSpec};

use super::Session;

#[derive(Args, Debug)]
pub struct SystemArgs {
    #[arg(long)]
    pub hostname: Option<String>,

    /// Network allowed to reach the management interface (repeatable)
    #[arg(long = "trusted-source")]
    pub trusted_sources: Vec<String>,

    /// Desired state; settings cannot be absent
    #[arg(long, default_value = "present")]
    pub state: State,
}

pub async fn execute(args: SystemArgs, session: &Session) -> Result<()> {
    let spec = SystemSpec {
        hostname: args.hostname,
        trusted_source: (!args.trusted_sources.is_empty()).then_some(args.trusted_sources),
    };
    session.reconcile::<SystemPolicy>(&spec, args.state).await?;
    Ok(())
}
