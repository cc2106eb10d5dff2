use std::sync::Arc;

use cpl_gateway::{ConnectionLifecycle, GatewayConfig, GatewayConnector};
use cpl_protocol::Connector;
use cpl_types::Asset;
use tracing::info;

use crate::asset_contract::AssetContract;
use crate::error::SdkResult;

/// Key of a newly created asset: `carbonAsset` followed by the current time
/// in Unix milliseconds.
pub fn new_asset_id() -> String {
    format!("carbonAsset{}", chrono::Utc::now().timestamp_millis())
}

/// Carbon-asset client. Every call opens its own session and releases it
/// before returning.
#[derive(Clone, Debug)]
pub struct CarbonClient {
    lifecycle: ConnectionLifecycle,
}

impl CarbonClient {
    pub fn new(config: GatewayConfig, transport: Arc<dyn Connector>) -> Self {
        Self::from_lifecycle(ConnectionLifecycle::new(GatewayConnector::new(
            config, transport,
        )))
    }

    pub fn from_lifecycle(lifecycle: ConnectionLifecycle) -> Self {
        Self { lifecycle }
    }

    pub fn lifecycle(&self) -> &ConnectionLifecycle {
        &self.lifecycle
    }

    /// Create an asset under a freshly generated id.
    pub async fn create_asset(
        &self,
        sequestration_type: &str,
        credits: &str,
        farmer_id: &str,
        issuance_date: &str,
    ) -> SdkResult<Asset> {
        let id = new_asset_id();
        let (kind, credits, farmer, date) = (
            sequestration_type.to_string(),
            credits.to_string(),
            farmer_id.to_string(),
            issuance_date.to_string(),
        );
        let asset = self
            .lifecycle
            .run(|contract| async move {
                AssetContract::new(contract)
                    .create_asset(&id, &kind, &credits, &farmer, &date)
                    .await
            })
            .await?;
        info!(id = %asset.id, "asset created");
        Ok(asset)
    }

    pub async fn get_all_assets(&self) -> SdkResult<Vec<Asset>> {
        self.lifecycle
            .run(|contract| async move { AssetContract::new(contract).get_all_assets().await })
            .await
    }

    pub async fn init_ledger(&self) -> SdkResult<()> {
        self.lifecycle
            .run(|contract| async move { AssetContract::new(contract).init_ledger().await })
            .await
    }

    pub async fn read_asset(&self, id: &str) -> SdkResult<Asset> {
        let id = id.to_string();
        self.lifecycle
            .run(|contract| async move { AssetContract::new(contract).read_asset(&id).await })
            .await
    }

    pub async fn update_asset(&self, asset: &Asset) -> SdkResult<Asset> {
        let asset = asset.clone();
        let credits = asset
            .carbon_credits
            .map(|c| c.to_string())
            .unwrap_or_default();
        self.lifecycle
            .run(|contract| async move {
                AssetContract::new(contract)
                    .update_asset(
                        &asset.id,
                        &asset.sequestration_type,
                        &credits,
                        &asset.farmer_id,
                        &asset.issuance_date,
                    )
                    .await
            })
            .await
    }

    pub async fn delete_asset(&self, id: &str) -> SdkResult<()> {
        let id = id.to_string();
        self.lifecycle
            .run(|contract| async move { AssetContract::new(contract).delete_asset(&id).await })
            .await
    }

    /// Transfer and wait for commit. Returns the previous owner.
    pub async fn transfer_asset(&self, id: &str, new_owner: &str) -> SdkResult<String> {
        let (id, owner) = (id.to_string(), new_owner.to_string());
        self.lifecycle
            .run(|contract| async move {
                AssetContract::new(contract)
                    .transfer_asset(&id, &owner)
                    .await
            })
            .await
    }

    pub async fn asset_exists(&self, id: &str) -> SdkResult<bool> {
        let id = id.to_string();
        self.lifecycle
            .run(|contract| async move { AssetContract::new(contract).asset_exists(&id).await })
            .await
    }
}

impl From<ConnectionLifecycle> for CarbonClient {
    fn from(lifecycle: ConnectionLifecycle) -> Self {
        Self::from_lifecycle(lifecycle)
    }
}
