//! CLI Commands

pub mod apply;
pub mod bridge;
pub mod deployment;
pub mod network;
pub mod package;
pub mod system;
pub mod vlan;

use anyhow::{anyhow, Context, Result};

use nfvis_common::{ConnectionConfig, Report, State};
use nfvis_provider::{
    reconcile_declaration, Declaration, Failure, HttpClient, MergePolicy, ReconcileOptions,
    Reconciler,
};

use crate::output::{print_info, print_item, OutputFormat};

/// Connection and rendering settings shared by every command
pub struct Session {
    client: HttpClient,
    options: ReconcileOptions,
    format: OutputFormat,
}

impl Session {
    pub fn new(config: &ConnectionConfig, options: ReconcileOptions, format: OutputFormat) -> Result<Self> {
        let client = HttpClient::new(config).context("cannot set up appliance client")?;
        tracing::debug!("Using appliance API at {}", client.base_url());
        Ok(Self {
            client,
            options,
            format,
        })
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Reconcile one typed spec and print its report
    pub async fn reconcile<P: MergePolicy>(&self, spec: &P::Spec, state: State) -> Result<Report> {
        let result = Reconciler::<_, P>::new(&self.client, self.options)
            .reconcile(spec, state)
            .await;
        self.finish(result)
    }

    /// Reconcile one entry of a declaration file and print its report
    pub async fn declare(&self, declaration: &Declaration) -> Result<Report> {
        let result = reconcile_declaration(&self.client, declaration, self.options).await;
        self.finish(result)
    }

    fn finish(&self, result: std::result::Result<Report, Failure>) -> Result<Report> {
        match result {
            Ok(report) => {
                print_item(&report, self.format);
                if report.preview && report.changed && self.format.is_human() {
                    print_info("Check mode: the change above was not sent");
                }
                Ok(report)
            }
            Err(failure) => {
                print_item(&failure.report, self.format);
                Err(anyhow!(failure.error))
            }
        }
    }
}
