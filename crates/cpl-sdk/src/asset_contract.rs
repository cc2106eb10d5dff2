use cpl_gateway::{decode_json, decode_utf8, Contract, SubmittedTransaction};
use cpl_types::Asset;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::SdkResult;

/// Typed view of the carbon-asset chaincode.
#[derive(Clone, Debug)]
pub struct AssetContract {
    contract: Contract,
}

impl AssetContract {
    pub fn new(contract: Contract) -> Self {
        Self { contract }
    }

    pub fn contract(&self) -> &Contract {
        &self.contract
    }

    /// Write the seed assets.
    pub async fn init_ledger(&self) -> SdkResult<()> {
        self.contract.submit("InitLedger", &[]).await?;
        Ok(())
    }

    /// Create (or overwrite) an asset. `credits` is passed through as text
    /// and coerced by the ledger.
    pub async fn create_asset(
        &self,
        id: &str,
        sequestration_type: &str,
        credits: &str,
        farmer_id: &str,
        issuance_date: &str,
    ) -> SdkResult<Asset> {
        let bytes = self
            .contract
            .submit(
                "CreateAsset",
                &[id, sequestration_type, credits, farmer_id, issuance_date],
            )
            .await?;
        decode_asset(&bytes)
    }

    pub async fn read_asset(&self, id: &str) -> SdkResult<Asset> {
        let bytes = self.contract.evaluate("ReadAsset", &[id]).await?;
        decode_asset(&bytes)
    }

    pub async fn update_asset(
        &self,
        id: &str,
        sequestration_type: &str,
        credits: &str,
        farmer_id: &str,
        issuance_date: &str,
    ) -> SdkResult<Asset> {
        let bytes = self
            .contract
            .submit(
                "UpdateAsset",
                &[id, sequestration_type, credits, farmer_id, issuance_date],
            )
            .await?;
        decode_asset(&bytes)
    }

    pub async fn delete_asset(&self, id: &str) -> SdkResult<()> {
        self.contract.submit("DeleteAsset", &[id]).await?;
        Ok(())
    }

    /// Transfer and wait for commit. Returns the previous owner.
    pub async fn transfer_asset(&self, id: &str, new_owner: &str) -> SdkResult<String> {
        let bytes = self
            .contract
            .submit("TransferAsset", &[id, new_owner])
            .await?;
        Ok(decode_utf8(&bytes)?)
    }

    /// Transfer without waiting for commit. The previous owner is the
    /// transaction's result.
    pub async fn transfer_async(
        &self,
        id: &str,
        new_owner: &str,
    ) -> SdkResult<SubmittedTransaction> {
        Ok(self
            .contract
            .submit_async("TransferAsset", &[id, new_owner])
            .await?)
    }

    pub async fn asset_exists(&self, id: &str) -> SdkResult<bool> {
        let bytes = self.contract.evaluate("AssetExists", &[id]).await?;
        Ok(decode_json(&bytes)?)
    }

    /// Every asset in key order. Entries that are not records are skipped.
    pub async fn get_all_assets(&self) -> SdkResult<Vec<Asset>> {
        let bytes = self.contract.evaluate("GetAllAssets", &[]).await?;
        let entries: Vec<Value> = decode_json(&bytes)?;
        Ok(assets_from_entries(entries))
    }
}

fn decode_asset(bytes: &[u8]) -> SdkResult<Asset> {
    let record: Value = decode_json(bytes)?;
    Ok(Asset::from_record(&record)?)
}

/// Decode listed entries through the legacy alias rules, dropping anything
/// that is not an asset record.
pub(crate) fn assets_from_entries(entries: Vec<Value>) -> Vec<Asset> {
    let total = entries.len();
    let assets: Vec<Asset> = entries
        .iter()
        .filter_map(|entry| match Asset::from_record(entry) {
            Ok(asset) => Some(asset),
            Err(err) => {
                warn!(error = %err, entry = %entry, "skipping ledger entry");
                None
            }
        })
        .collect();
    debug!(total, kept = assets.len(), "assets decoded");
    assets
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn entries_skip_non_records() {
        let entries = vec![
            json!({"ID": "a1", "SequestrationType": "soil", "CarbonCredits": 5, "FarmerID": "f", "IssuanceDate": "d"}),
            json!("not json at all"),
            json!({"ID": "a2", "Color": "blue", "Size": 7, "Owner": "tom", "AppraisedValue": 300}),
            json!({"SequestrationType": "no id"}),
        ];
        let assets = assets_from_entries(entries);
        assert_eq!(assets.len(), 2);
        assert_eq!(assets[0].carbon_credits, Some(5));
        assert_eq!(assets[1].sequestration_type, "blue");
        assert_eq!(assets[1].farmer_id, "tom");
        assert_eq!(assets[1].issuance_date, "300");
    }
}
