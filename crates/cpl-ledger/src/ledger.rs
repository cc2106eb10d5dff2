use cpl_store::WorldState;
use cpl_types::{parse_credits, Asset};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::error::{LedgerError, LedgerResult};
use crate::listing::ListEntry;
use crate::seed::seed_assets;

const OWNER_FIELD: &str = "FarmerID";

/// Carbon-credit asset operations over an injected world state.
///
/// Each key is either absent or holds one JSON-encoded [`Asset`]. The ledger
/// performs no locking of its own: read-modify-write operations such as
/// [`AssetLedger::transfer`] rely on the ordering service to serialize
/// conflicting commits.
pub struct AssetLedger<'s, S: WorldState + ?Sized> {
    state: &'s mut S,
}

impl<'s, S: WorldState + ?Sized> AssetLedger<'s, S> {
    pub fn new(state: &'s mut S) -> Self {
        Self { state }
    }

    /// Overwrite the seed assets. Each write is independent, so the result is
    /// the same whatever the ledger held before.
    pub fn init(&mut self) -> LedgerResult<()> {
        for asset in seed_assets() {
            self.put_asset(&asset)?;
            info!(id = %asset.id, "seed asset initialized");
        }
        Ok(())
    }

    /// Write a new asset. An existing asset with the same id is replaced.
    pub fn create(
        &mut self,
        id: &str,
        sequestration_type: &str,
        carbon_credits: &str,
        farmer_id: &str,
        issuance_date: &str,
    ) -> LedgerResult<Asset> {
        let asset = build_asset(id, sequestration_type, carbon_credits, farmer_id, issuance_date);
        self.put_asset(&asset)?;
        debug!(id, "asset created");
        Ok(asset)
    }

    /// Stored bytes for an asset. Absent and empty values are both NotFound.
    pub fn read(&mut self, id: &str) -> LedgerResult<Vec<u8>> {
        if id.is_empty() {
            return Err(LedgerError::not_found(id));
        }
        match self.state.get_state(id)? {
            Some(bytes) if !bytes.is_empty() => Ok(bytes),
            _ => Err(LedgerError::not_found(id)),
        }
    }

    /// Replace every field of an existing asset.
    pub fn update(
        &mut self,
        id: &str,
        sequestration_type: &str,
        carbon_credits: &str,
        farmer_id: &str,
        issuance_date: &str,
    ) -> LedgerResult<Asset> {
        if !self.exists(id)? {
            return Err(LedgerError::not_found(id));
        }
        let asset = build_asset(id, sequestration_type, carbon_credits, farmer_id, issuance_date);
        self.put_asset(&asset)?;
        debug!(id, "asset updated");
        Ok(asset)
    }

    pub fn delete(&mut self, id: &str) -> LedgerResult<()> {
        if !self.exists(id)? {
            return Err(LedgerError::not_found(id));
        }
        self.state.delete_state(id)?;
        debug!(id, "asset deleted");
        Ok(())
    }

    /// Hand an asset to a new owner and return the previous owner.
    ///
    /// Only `FarmerID` changes; every other stored field, including ones this
    /// version does not know about, is written back untouched.
    pub fn transfer(&mut self, id: &str, new_owner: &str) -> LedgerResult<String> {
        let bytes = self.read(id)?;
        let mut record: Map<String, Value> =
            serde_json::from_slice(&bytes).map_err(|e| LedgerError::Corrupt {
                id: id.to_string(),
                reason: e.to_string(),
            })?;

        let previous = match record.get(OWNER_FIELD) {
            Some(Value::String(owner)) => owner.clone(),
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        };
        record.insert(OWNER_FIELD.to_string(), Value::String(new_owner.to_string()));

        let encoded =
            serde_json::to_vec(&record).map_err(|e| LedgerError::Serialization(e.to_string()))?;
        self.state.put_state(id, encoded)?;
        debug!(id, from = %previous, to = new_owner, "asset transferred");
        Ok(previous)
    }

    /// Every entry on the ledger in key order.
    pub fn list(&mut self) -> LedgerResult<Vec<ListEntry>> {
        let entries = self.state.range_scan("", "")?;
        Ok(entries
            .iter()
            .map(|(_, bytes)| ListEntry::decode(bytes))
            .collect())
    }

    /// The empty id names no key, so it is never present.
    pub fn exists(&mut self, id: &str) -> LedgerResult<bool> {
        if id.is_empty() {
            return Ok(false);
        }
        Ok(self
            .state
            .get_state(id)?
            .is_some_and(|bytes| !bytes.is_empty()))
    }

    fn put_asset(&mut self, asset: &Asset) -> LedgerResult<()> {
        let bytes = asset
            .to_json_bytes()
            .map_err(|e| LedgerError::Serialization(e.to_string()))?;
        self.state.put_state(&asset.id, bytes)?;
        Ok(())
    }
}

fn build_asset(
    id: &str,
    sequestration_type: &str,
    carbon_credits: &str,
    farmer_id: &str,
    issuance_date: &str,
) -> Asset {
    let credits = parse_credits(carbon_credits);
    if credits.is_none() {
        warn!(id, carbon_credits, "credit amount is not numeric, storing null");
    }
    Asset::new(id, sequestration_type, credits, farmer_id, issuance_date)
}
