use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "cpl",
    about = "CarbonPasture Ledger: carbon-credit assets on a permissioned ledger",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// TOML config file; environment variables override it
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Show the resolved gateway parameters
    Config,
    /// Write development credentials laid out under a crypto root
    Material(MaterialArgs),
    /// Run the asset walkthrough against an in-process network
    Demo(DemoArgs),
}

#[derive(Args)]
pub struct MaterialArgs {
    /// Crypto root to write under
    pub dir: PathBuf,
    /// Existing CA certificate to install as the peer TLS root
    #[arg(long)]
    pub tls_ca: Option<PathBuf>,
}

#[derive(Args)]
pub struct DemoArgs {
    /// Id of the asset the walkthrough creates (default: timestamped)
    #[arg(long)]
    pub asset_id: Option<String>,
}
