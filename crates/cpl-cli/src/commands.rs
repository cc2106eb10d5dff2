use std::sync::Arc;

use anyhow::Context;
use colored::Colorize;
use cpl_fabric::{generate_ca_pem, LocalNetwork};
use cpl_gateway::{write_dev_material, GatewayConfig};
use cpl_sdk::walkthrough::{self, Step};
use cpl_sdk::{AssetContract, ConnectionLifecycle, GatewayConnector};
use tracing::info;

use crate::cli::*;

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(&cli)?;
    match cli.command {
        Command::Config => cmd_config(&config),
        Command::Material(args) => cmd_material(args).await,
        Command::Demo(args) => cmd_demo(config, args).await,
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<GatewayConfig> {
    let config = match &cli.config {
        Some(path) => GatewayConfig::load(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => GatewayConfig::default(),
    };
    Ok(config.with_env())
}

fn cmd_config(config: &GatewayConfig) -> anyhow::Result<()> {
    config.log_parameters();
    for (name, value) in config.parameters() {
        println!("{:<19}{}", format!("{name}:").bold(), value);
    }
    let d = &config.deadlines;
    println!(
        "{:<19}evaluate {}ms, endorse {}ms, submit {}ms, commit status {}ms",
        "deadlines:".bold(),
        d.evaluate_ms,
        d.endorse_ms,
        d.submit_ms,
        d.commit_status_ms
    );
    println!("{:<19}{}ms", "connectTimeout:".bold(), config.connect_timeout_ms);
    Ok(())
}

async fn cmd_material(args: MaterialArgs) -> anyhow::Result<()> {
    let ca = match &args.tls_ca {
        Some(path) => tokio::fs::read(path)
            .await
            .with_context(|| format!("reading {}", path.display()))?,
        None => generate_ca_pem().into_bytes(),
    };
    let material = write_dev_material(&args.dir, &ca).await?;
    println!("{} Wrote development material under {}", "✓".green().bold(), args.dir.display().to_string().bold());
    println!("  key:         {}", material.key_path.display());
    println!("  certificate: {}", material.cert_path.display());
    println!("  TLS root:    {}", material.tls_cert_path.display());
    println!("  public key:  {}", material.public_key.to_hex().cyan());
    Ok(())
}

async fn cmd_demo(config: GatewayConfig, args: DemoArgs) -> anyhow::Result<()> {
    let network = LocalNetwork::builder()
        .host_alias(config.peer_host_alias.clone())
        .chaincode(config.channel_name.clone(), config.chaincode_name.clone())
        .build()?;

    let dir = tempfile::tempdir().context("creating crypto directory")?;
    let material = write_dev_material(dir.path(), network.tls_ca_pem()).await?;
    let config = GatewayConfig {
        crypto_path: material.crypto_path,
        key_directory_path: None,
        cert_directory_path: None,
        tls_cert_path: None,
        ..config
    };
    config.log_parameters();

    let asset_id = args.asset_id.unwrap_or_else(cpl_sdk::client::new_asset_id);
    info!(%asset_id, host_alias = %network.host_alias(), "starting walkthrough");
    let lifecycle =
        ConnectionLifecycle::new(GatewayConnector::new(config, Arc::new(network.clone())));
    lifecycle
        .run(|contract| async move {
            walkthrough::run_with(&AssetContract::new(contract), &asset_id, print_step).await
        })
        .await?;

    println!(
        "\n{} Walkthrough complete ({} connection(s) opened, {} closed)",
        "✓".green().bold(),
        network.opened_connections(),
        network.closed_connections()
    );
    Ok(())
}

fn print_step(step: &Step) {
    println!("\n--> {}", step.title.bold());
    println!("*** {}", step.outcome);
}
