//! Image Package Commands

use anyhow::Result;
use clap::Args;

use nfvis_common::State;
use nfvis_provider::resources::package::DEFAULT_UPLOAD_DIR;
use nfvis_provider::resources::{PackagePolicy, PackageSpec};

use super::Session;

#[derive(Args, Debug)]
pub struct PackageArgs {
    /// Package name; the archive must be `{dest}/{name}.tar.gz` on the appliance
    pub name: String,

    /// Upload directory on the appliance
    #[arg(long, default_value = DEFAULT_UPLOAD_DIR)]
    pub dest: String,

    /// Desired state (present, absent)
    #[arg(long, default_value = "present")]
    pub state: State,
}

pub async fn execute(args: PackageArgs, session: &Session) -> Result<()> {
    let spec = PackageSpec {
        name: args.name,
        dest: args.dest,
    };
    session.reconcile::<PackagePolicy>(&spec, args.state).await?;
    Ok(())
}
