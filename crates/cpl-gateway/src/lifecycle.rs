use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

use crate::connector::GatewayConnector;
use crate::contract::Contract;
use crate::error::{GatewayError, GatewayResult};
use crate::session::Session;

/// Opens sessions under a ceiling and releases them on every exit path.
#[derive(Clone, Debug)]
pub struct ConnectionLifecycle {
    connector: GatewayConnector,
    ceiling: Duration,
}

impl ConnectionLifecycle {
    /// Uses the connector's configured connect timeout as the ceiling.
    pub fn new(connector: GatewayConnector) -> Self {
        let ceiling = connector.config().connect_timeout();
        Self { connector, ceiling }
    }

    pub fn with_ceiling(mut self, ceiling: Duration) -> Self {
        self.ceiling = ceiling;
        self
    }

    pub fn ceiling(&self) -> Duration {
        self.ceiling
    }

    pub fn connector(&self) -> &GatewayConnector {
        &self.connector
    }

    /// Build a session, failing with a timeout if construction takes longer
    /// than the ceiling.
    ///
    /// On timeout the half-built session is dropped, which closes any
    /// channel it had already acquired.
    pub async fn open(&self) -> GatewayResult<Session> {
        match tokio::time::timeout(self.ceiling, self.connector.connect()).await {
            Ok(result) => result,
            Err(_) => {
                warn!(ceiling = ?self.ceiling, "session construction timed out");
                Err(GatewayError::Timeout {
                    operation: "connect",
                    after: self.ceiling,
                })
            }
        }
    }

    /// Open a session, run `op` against its contract, close the session,
    /// and return `op`'s result.
    pub async fn run<F, Fut, T, E>(&self, op: F) -> Result<T, E>
    where
        F: FnOnce(Contract) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: From<GatewayError>,
    {
        let session = self.open().await?;
        let result = op(session.contract()).await;
        debug!(ok = result.is_ok(), "scoped operation finished");
        session.close();
        result
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use cpl_fabric::LocalNetwork;

    use super::*;
    use crate::config::GatewayConfig;
    use crate::material::write_dev_material;

    async fn setup() -> (tempfile::TempDir, LocalNetwork, ConnectionLifecycle) {
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
        (dir, network, lifecycle)
    }

    #[tokio::test]
    async fn ceiling_defaults_to_config() {
        let (_dir, _net, lifecycle) = setup().await;
        assert_eq!(lifecycle.ceiling(), Duration::from_secs(5));
    }

    #[tokio::test]
    async fn timeout_after_acquire_closes_channel_once() {
        let (_dir, network, lifecycle) = setup().await;
        network.set_stalled(true);
        let lifecycle = lifecycle.with_ceiling(Duration::from_millis(50));

        let err = lifecycle.open().await.unwrap_err();
        assert!(matches!(
            err,
            GatewayError::Timeout {
                operation: "connect",
                ..
            }
        ));
        assert_eq!(network.opened_connections(), 1);
        assert_eq!(network.closed_connections(), 1);
    }

    #[tokio::test]
    async fn run_closes_on_success() {
        let (_dir, network, lifecycle) = setup().await;
        let value = lifecycle
            .run(|contract| async move {
                contract.submit("InitLedger", &[]).await?;
                contract.evaluate("ReadAsset", &["carbonAsset1"]).await
            })
            .await
            .unwrap();
        assert!(!value.is_empty());
        assert_eq!(network.open_connections(), 0);
        assert_eq!(network.closed_connections(), 1);
    }

    #[tokio::test]
    async fn run_closes_on_operation_failure() {
        let (_dir, network, lifecycle) = setup().await;
        let err = lifecycle
            .run(|contract| async move { contract.evaluate("ReadAsset", &["missing"]).await })
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(network.open_connections(), 0);
    }

    #[tokio::test]
    async fn run_skips_op_when_open_fails() {
        let (_dir, network, lifecycle) = setup().await;
        network.set_available(false);
        let mut ran = false;
        let err = lifecycle
            .run(|_contract| {
                ran = true;
                async { Ok::<_, GatewayError>(()) }
            })
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Unavailable(_)));
        assert!(!ran);
        assert_eq!(network.opened_connections(), 0);
    }
}
