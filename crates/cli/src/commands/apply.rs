//! Apply Command
//!
//! Reconciles every declaration of a YAML or JSON file in order and stops
//! at the first failure.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;

use nfvis_provider::{parse_declarations, Declaration};

use super::Session;
use crate::output::{print_success, print_warning};

#[derive(Args, Debug)]
pub struct ApplyArgs {
    /// Declaration file (one mapping or a list)
    #[arg(short, long)]
    pub file: PathBuf,
}

pub fn load(path: &Path) -> Result<Vec<Declaration>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read {}", path.display()))?;
    let declarations =
        parse_declarations(&text).with_context(|| format!("invalid declarations in {}", path.display()))?;
    Ok(declarations)
}

pub async fn execute(args: ApplyArgs, session: &Session) -> Result<()> {
    let declarations = load(&args.file)?;
    if declarations.is_empty() {
        print_warning(&format!("{} declares nothing", args.file.display()));
        return Ok(());
    }

    let mut changed = 0;
    for (position, declaration) in declarations.iter().enumerate() {
        tracing::debug!(
            "Declaration {}/{}: {} ({})",
            position + 1,
            declarations.len(),
            declaration.spec.kind(),
            declaration.state
        );
        let report = session.declare(declaration).await?;
        if report.changed {
            changed += 1;
        }
    }

    if session.format().is_human() {
        print_success(&format!(
            "{} declaration(s) reconciled, {} changed",
            declarations.len(),
            changed
        ));
    }
    Ok(())
}
