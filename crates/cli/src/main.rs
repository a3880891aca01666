//! NFVIS CLI - Main Entry Point

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use nfvis_cli::commands::{apply, bridge, deployment, network, package, system, vlan, Session};
use nfvis_cli::output::{self, OutputFormat};
use nfvis_common::{default_config_path, ConnectionConfig, ConnectionOverrides};
use nfvis_provider::ReconcileOptions;

/// Declarative configuration for NFVIS appliances
#[derive(Parser)]
#[command(name = "nfvis")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Connection settings file [default: ~/.nfvis/config.toml]
    #[arg(long, env = "NFVIS_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Appliance hostname or base URL
    #[arg(long, env = "NFVIS_HOST", global = true)]
    host: Option<String>,

    #[arg(long, env = "NFVIS_USER", global = true)]
    user: Option<String>,

    #[arg(long, env = "NFVIS_PASSWORD", hide_env_values = true, global = true)]
    password: Option<String>,

    /// Request timeout in seconds
    #[arg(long, env = "NFVIS_TIMEOUT", global = true)]
    timeout: Option<u64>,

    /// Verify the appliance's TLS certificate
    #[arg(
        long,
        env = "NFVIS_VALIDATE_CERTS",
        global = true,
        num_args = 0..=1,
        default_missing_value = "true"
    )]
    validate_certs: Option<bool>,

    /// Report what would change without changing it
    #[arg(long, global = true)]
    check: bool,

    /// Fail when a create or update response carries no document
    #[arg(long, global = true)]
    require_confirmation: bool,

    /// Output format
    #[arg(long, default_value = "table", global = true)]
    format: OutputFormat,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile a bridge
    Bridge(bridge::BridgeArgs),

    /// Reconcile a network
    Network(network::NetworkArgs),

    /// Reconcile a switch VLAN
    Vlan(vlan::VlanArgs),

    /// Reconcile system settings
    System(system::SystemArgs),

    /// Reconcile a VM deployment
    Deployment(deployment::DeploymentArgs),

    /// Register an uploaded image package
    Package(package::PackageArgs),

    /// Reconcile every declaration in a file
    Apply(apply::ApplyArgs),

    /// Show version information
    Version,
}

impl Cli {
    fn connection(&self) -> anyhow::Result<ConnectionConfig> {
        let path = self.config.clone().unwrap_or_else(default_config_path);
        let overrides = ConnectionOverrides {
            host: self.host.clone(),
            user: self.user.clone(),
            password: self.password.clone(),
            validate_certs: self.validate_certs,
            timeout_secs: self.timeout,
        };
        Ok(ConnectionConfig::resolve(&path, overrides)?)
    }

    fn options(&self) -> ReconcileOptions {
        ReconcileOptions {
            preview: self.check,
            require_confirmation: self.require_confirmation,
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    if let Commands::Version = cli.command {
        println!("nfvis CLI v{}", nfvis_common::VERSION);
        return Ok(());
    }

    let config = cli.connection()?;
    tracing::debug!("Connection settings: {:?}", config);
    let session = Session::new(&config, cli.options(), cli.format)?;

    match cli.command {
        Commands::Bridge(args) => bridge::execute(args, &session).await,
        Commands::Network(args) => network::execute(args, &session).await,
        Commands::Vlan(args) => vlan::execute(args, &session).await,
        Commands::System(args) => system::execute(args, &session).await,
        Commands::Deployment(args) => deployment::execute(args, &session).await,
        Commands::Package(args) => package::execute(args, &session).await,
        Commands::Apply(args) => apply::execute(args, &session).await,
        Commands::Version => Ok(()),
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging; stdout is reserved for reports
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli).await {
        output::print_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}
