//! Scripted end-to-end scenario exercising every kind of ledger call:
//! seed, list, create, asynchronous transfer, read, and an update that must
//! fail because the asset does not exist.

use tracing::info;

use crate::asset_contract::AssetContract;
use crate::error::{SdkError, SdkResult};

/// Owner every walkthrough transfer moves the new asset to.
pub const MARKETPLACE: &str = "CarbonMarketplace";
/// Id the final update targets; never created by the walkthrough.
pub const MISSING_ASSET: &str = "asset70";

/// One completed step.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Step {
    pub title: &'static str,
    pub outcome: String,
}

#[derive(Clone, Debug, Default)]
pub struct Walkthrough {
    pub steps: Vec<Step>,
}

impl Walkthrough {
    fn record<F: FnMut(&Step)>(&mut self, on_step: &mut F, title: &'static str, outcome: String) {
        let step = Step { title, outcome };
        info!(step = title, outcome = %step.outcome, "walkthrough step");
        on_step(&step);
        self.steps.push(step);
    }
}

/// Run the scenario against `contract`, creating `asset_id`.
pub async fn run(contract: &AssetContract, asset_id: &str) -> SdkResult<Walkthrough> {
    run_with(contract, asset_id, |_| {}).await
}

/// Like [`run`], calling `on_step` as each step completes.
pub async fn run_with<F>(contract: &AssetContract, asset_id: &str, mut on_step: F) -> SdkResult<Walkthrough>
where
    F: FnMut(&Step),
{
    let mut report = Walkthrough::default();

    contract.init_ledger().await?;
    report.record(
        &mut on_step,
        "Submit Transaction: InitLedger",
        "Transaction committed successfully".into(),
    );

    let assets = contract.get_all_assets().await?;
    report.record(
        &mut on_step,
        "Evaluate Transaction: GetAllAssets",
        to_json(&assets),
    );

    contract
        .create_asset(asset_id, "pasture-restoration", "100", "farmer001", "2025-08-01")
        .await?;
    report.record(
        &mut on_step,
        "Submit Transaction: CreateAsset",
        "Transaction committed successfully".into(),
    );

    let submitted = contract.transfer_async(asset_id, MARKETPLACE).await?;
    let previous = String::from_utf8_lossy(submitted.result()).into_owned();
    report.record(
        &mut on_step,
        "Async Submit Transaction: TransferAsset",
        format!("Ownership transferred from {previous} to {MARKETPLACE}"),
    );
    submitted.committed().await?;
    report.record(
        &mut on_step,
        "Wait for commit: TransferAsset",
        "Transaction committed successfully".into(),
    );

    let asset = contract.read_asset(asset_id).await?;
    report.record(&mut on_step, "Evaluate Transaction: ReadAsset", to_json(&asset));

    match contract
        .update_asset(MISSING_ASSET, "tree-planting", "50", "farmerX", "2025-08-01")
        .await
    {
        Err(err) if err.is_not_found() => report.record(
            &mut on_step,
            "Submit Transaction: UpdateAsset asset70",
            format!("Successfully caught the error: {err}"),
        ),
        Err(err) => return Err(err),
        Ok(_) => {
            return Err(SdkError::Unexpected(format!(
                "updating {MISSING_ASSET} did not fail"
            )))
        }
    }

    Ok(report)
}

fn to_json<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|e| format!("<unprintable: {e}>"))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use cpl_fabric::LocalNetwork;
    use cpl_gateway::{write_dev_material, ConnectionLifecycle, GatewayConfig, GatewayConnector};

    use super::*;

    #[tokio::test]
    async fn full_scenario() {
        let network = LocalNetwork::builder()
            .chaincode("mychannel", "carboncc")
            .build()
            .unwrap();
        let dir = tempfile::tempdir().unwrap();
        let material = write_dev_material(dir.path(), network.tls_ca_pem()).await.unwrap();
        let config = GatewayConfig {
            crypto_path: material.crypto_path,
            ..GatewayConfig::default()
        };
        let lifecycle =
            ConnectionLifecycle::new(GatewayConnector::new(config, Arc::new(network.clone())));

        let report = lifecycle
            .run(|contract| async move {
                run(&AssetContract::new(contract), "carbonAsset1700000000000").await
            })
            .await
            .unwrap();

        assert_eq!(report.steps.len(), 7);
        assert_eq!(
            report.steps[3].outcome,
            "Ownership transferred from farmer001 to CarbonMarketplace"
        );
        assert!(report.steps[5].outcome.contains(MARKETPLACE));
        assert!(report.steps[6].outcome.starts_with("Successfully caught the error"));
        assert_eq!(network.open_connections(), 0);
    }
}
