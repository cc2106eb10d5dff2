use std::future::Future;
use std::sync::{Arc, Weak};
use std::time::Duration;

use cpl_protocol::{CommitStatus, Envelope, Proposal, ProtocolResult, SignedProposal};
use cpl_types::TxId;
use tracing::{debug, info, warn};

use crate::error::{GatewayError, GatewayResult};
use crate::session::{upgrade, SessionInner};

/// Run `fut` under `deadline`.
async fn within<T, F>(operation: &'static str, deadline: Duration, fut: F) -> GatewayResult<ProtocolResult<T>>
where
    F: Future<Output = ProtocolResult<T>>,
{
    tokio::time::timeout(deadline, fut).await.map_err(|_| {
        warn!(operation, ?deadline, "deadline exceeded");
        GatewayError::Timeout {
            operation,
            after: deadline,
        }
    })
}

/// Handle for invoking one chaincode on one channel.
#[derive(Clone, Debug)]
pub struct Contract {
    session: Weak<SessionInner>,
    channel: String,
    chaincode: String,
}

impl Contract {
    pub(crate) fn new(session: Weak<SessionInner>, channel: String, chaincode: String) -> Self {
        Self {
            session,
            channel,
            chaincode,
        }
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    pub fn chaincode(&self) -> &str {
        &self.chaincode
    }

    fn signed_proposal(
        &self,
        session: &SessionInner,
        function: &str,
        args: &[&str],
    ) -> GatewayResult<(TxId, SignedProposal)> {
        let proposal = Proposal::new(
            self.channel.clone(),
            self.chaincode.clone(),
            function,
            args.iter().map(|a| a.to_string()).collect(),
            session.gateway.identity().serialized(),
        );
        let signed = SignedProposal::sign(&proposal, session.gateway.signer().key())
            .map_err(|e| GatewayError::Crypto(e.to_string()))?;
        Ok((proposal.tx_id, signed))
    }

    /// Run a read-only function on one peer. Nothing is ordered or committed.
    pub async fn evaluate(&self, function: &str, args: &[&str]) -> GatewayResult<Vec<u8>> {
        let session = upgrade(&self.session)?;
        let (tx_id, signed) = self.signed_proposal(&session, function, args)?;
        let connection = session.channel.connection()?.clone();
        let deadline = session.gateway.deadlines().evaluate();

        debug!(function, tx_id = %tx_id.short(), "evaluating");
        let payload = within("evaluate", deadline, connection.evaluate(signed)).await??;
        Ok(payload)
    }

    /// Endorse, order and wait for commit. Returns the endorsed result.
    pub async fn submit(&self, function: &str, args: &[&str]) -> GatewayResult<Vec<u8>> {
        let submitted = self.submit_async(function, args).await?;
        submitted.committed().await?;
        Ok(submitted.into_result())
    }

    /// Endorse and hand to the orderer without waiting for commit.
    ///
    /// The returned transaction carries the endorsed result, which is
    /// available before the transaction commits.
    pub async fn submit_async(
        &self,
        function: &str,
        args: &[&str],
    ) -> GatewayResult<SubmittedTransaction> {
        let session = upgrade(&self.session)?;
        let (tx_id, signed) = self.signed_proposal(&session, function, args)?;
        let connection = session.channel.connection()?.clone();
        let deadlines = session.gateway.deadlines().clone();

        debug!(function, tx_id = %tx_id.short(), "endorsing");
        let response = within("endorse", deadlines.endorse(), connection.endorse(signed.clone()))
            .await?
            .map_err(|e| GatewayError::during_submit(e, &tx_id))?;
        if response.tx_id != tx_id || !response.endorsement_is_valid() {
            return Err(GatewayError::Commit {
                tx_id,
                code: None,
                reason: "endorsement does not match the proposal".into(),
            });
        }

        let result = response.payload.clone();
        let envelope = Envelope::seal(signed, response, session.gateway.signer().key())
            .map_err(|e| GatewayError::Crypto(e.to_string()))?;
        within("submit", deadlines.submit(), connection.submit(envelope))
            .await?
            .map_err(|e| GatewayError::during_submit(e, &tx_id))?;

        info!(function, tx_id = %tx_id.short(), "transaction submitted");
        Ok(SubmittedTransaction {
            session: self.session.clone(),
            channel: self.channel.clone(),
            tx_id,
            result,
            deadline: deadlines.commit_status(),
        })
    }
}

/// A transaction that has been endorsed and sent for ordering.
#[derive(Debug)]
pub struct SubmittedTransaction {
    session: Weak<SessionInner>,
    channel: String,
    tx_id: TxId,
    result: Vec<u8>,
    deadline: Duration,
}

impl SubmittedTransaction {
    pub fn tx_id(&self) -> &TxId {
        &self.tx_id
    }

    /// The endorsed result, available before commit.
    pub fn result(&self) -> &[u8] {
        &self.result
    }

    pub fn into_result(self) -> Vec<u8> {
        self.result
    }

    /// Wait for the commit status, whatever it is.
    pub async fn status(&self) -> GatewayResult<CommitStatus> {
        let session: Arc<SessionInner> = upgrade(&self.session)?;
        let connection = session.channel.connection()?.clone();
        within(
            "commit status",
            self.deadline,
            connection.commit_status(&self.channel, &self.tx_id),
        )
        .await?
        .map_err(|e| GatewayError::during_submit(e, &self.tx_id))
    }

    /// Wait for the commit status and fail unless it is successful.
    pub async fn committed(&self) -> GatewayResult<CommitStatus> {
        let status = self.status().await?;
        if !status.is_successful() {
            warn!(tx_id = %self.tx_id.short(), code = %status.code, "commit failed");
            return Err(GatewayError::Commit {
                tx_id: self.tx_id.clone(),
                code: Some(status.code),
                reason: format!(
                    "committed with status code {} in block {}",
                    status.code, status.block_number
                ),
            });
        }
        Ok(status)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use cpl_fabric::LocalNetwork;
    use cpl_protocol::TxValidationCode;
    use serde_json::Value;

    use super::*;
    use crate::config::GatewayConfig;
    use crate::connector::GatewayConnector;
    use crate::decode::{decode_json, decode_utf8};
    use crate::material::write_dev_material;
    use crate::session::Session;

    struct Fixture {
        _dir: tempfile::TempDir,
        network: LocalNetwork,
        session: Session,
    }

    async fn fixture_with(config: impl FnOnce(&mut GatewayConfig)) -> Fixture {
        let network = LocalNetwork::builder()
            .chaincode("mychannel", "carboncc")
            .build()
            .unwrap();
        let dir = tempfile::tempdir().unwrap();
        let material = write_dev_material(dir.path(), network.tls_ca_pem()).await.unwrap();
        let mut cfg = GatewayConfig {
            crypto_path: material.crypto_path,
            ..GatewayConfig::default()
        };
        config(&mut cfg);
        let session = GatewayConnector::new(cfg, Arc::new(network.clone()))
            .connect()
            .await
            .unwrap();
        Fixture {
            _dir: dir,
            network,
            session,
        }
    }

    async fn fixture() -> Fixture {
        fixture_with(|_| {}).await
    }

    #[tokio::test]
    async fn submit_then_evaluate() {
        let fx = fixture().await;
        let contract = fx.session.contract();
        contract
            .submit("CreateAsset", &["a1", "soil-carbon", "50", "farmer-x", "2025-09-01"])
            .await
            .unwrap();
        let bytes = contract.evaluate("ReadAsset", &["a1"]).await.unwrap();
        let asset: Value = decode_json(&bytes).unwrap();
        assert_eq!(asset["CarbonCredits"], 50);
        assert_eq!(asset["FarmerID"], "farmer-x");
    }

    #[tokio::test]
    async fn evaluate_missing_is_not_found() {
        let fx = fixture().await;
        let err = fx
            .session
            .contract()
            .evaluate("ReadAsset", &["nope"])
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn evaluate_unknown_function_is_rejected() {
        let fx = fixture().await;
        let err = fx
            .session
            .contract()
            .evaluate("MintCredits", &[])
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Rejected(_)));
    }

    #[tokio::test]
    async fn submit_update_missing_is_not_found() {
        let fx = fixture().await;
        let err = fx
            .session
            .contract()
            .submit("UpdateAsset", &["asset70", "x", "1", "f", "d"])
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn async_result_precedes_commit() {
        let fx = fixture().await;
        let contract = fx.session.contract();
        contract.submit("InitLedger", &[]).await.unwrap();

        fx.network.pause_ordering("mychannel").unwrap();
        let tx = contract
            .submit_async("TransferAsset", &["carbonAsset1", "buyer1"])
            .await
            .unwrap();
        assert_eq!(decode_utf8(tx.result()).unwrap(), "kisumu_farmer01");
        assert!(fx.network.status("mychannel", tx.tx_id()).is_none());

        fx.network.resume_ordering("mychannel").unwrap();
        let status = tx.committed().await.unwrap();
        assert!(status.is_successful());

        let bytes = contract.evaluate("ReadAsset", &["carbonAsset1"]).await.unwrap();
        let asset: Value = decode_json(&bytes).unwrap();
        assert_eq!(asset["FarmerID"], "buyer1");
    }

    #[tokio::test]
    async fn concurrent_transfers_conflict() {
        let fx = fixture().await;
        let contract = fx.session.contract();
        contract.submit("InitLedger", &[]).await.unwrap();

        fx.network.pause_ordering("mychannel").unwrap();
        let first = contract
            .submit_async("TransferAsset", &["carbonAsset2", "buyer1"])
            .await
            .unwrap();
        let second = contract
            .submit_async("TransferAsset", &["carbonAsset2", "buyer2"])
            .await
            .unwrap();
        fx.network.resume_ordering("mychannel").unwrap();

        assert!(first.committed().await.is_ok());
        let status = second.status().await.unwrap();
        assert_eq!(status.code, TxValidationCode::MvccReadConflict);
        let err = second.committed().await.unwrap_err();
        assert_eq!(err.commit_code(), Some(TxValidationCode::MvccReadConflict));
    }

    #[tokio::test]
    async fn evaluate_deadline() {
        let fx = fixture_with(|c| c.deadlines.evaluate_ms = 20).await;
        fx.network.set_latency(Duration::from_millis(200));
        let err = fx
            .session
            .contract()
            .evaluate("GetAllAssets", &[])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            GatewayError::Timeout {
                operation: "evaluate",
                ..
            }
        ));
    }

    #[tokio::test]
    async fn commit_status_deadline() {
        let fx = fixture_with(|c| c.deadlines.commit_status_ms = 30).await;
        fx.network.pause_ordering("mychannel").unwrap();
        let tx = fx
            .session
            .contract()
            .submit_async("InitLedger", &[])
            .await
            .unwrap();
        let err = tx.status().await.unwrap_err();
        assert!(err.is_timeout());
    }

    #[tokio::test]
    async fn submitted_transaction_after_close() {
        let fx = fixture().await;
        fx.network.pause_ordering("mychannel").unwrap();
        let tx = fx
            .session
            .contract()
            .submit_async("InitLedger", &[])
            .await
            .unwrap();
        fx.session.close();
        assert!(matches!(tx.status().await, Err(GatewayError::Closed)));
    }
}
