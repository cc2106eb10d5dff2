use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{GatewayError, GatewayResult};

const USER_MSP: &str = "users/User1@org1.example.com/msp";
const PEER_TLS_CA: &str = "peers/peer0.org1.example.com/tls/ca.crt";

/// Per-operation deadlines, in milliseconds.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeadlineConfig {
    pub evaluate_ms: u64,
    pub endorse_ms: u64,
    pub submit_ms: u64,
    pub commit_status_ms: u64,
}

impl Default for DeadlineConfig {
    fn default() -> Self {
        Self {
            evaluate_ms: 5_000,
            endorse_ms: 15_000,
            submit_ms: 30_000,
            commit_status_ms: 120_000,
        }
    }
}

impl DeadlineConfig {
    pub fn evaluate(&self) -> Duration {
        Duration::from_millis(self.evaluate_ms)
    }

    pub fn endorse(&self) -> Duration {
        Duration::from_millis(self.endorse_ms)
    }

    pub fn submit(&self) -> Duration {
        Duration::from_millis(self.submit_ms)
    }

    pub fn commit_status(&self) -> Duration {
        Duration::from_millis(self.commit_status_ms)
    }
}

/// Parameters for opening a gateway session.
///
/// The key, certificate and TLS paths default to locations under
/// `crypto_path`; set them explicitly to break that link.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub channel_name: String,
    pub chaincode_name: String,
    pub msp_id: String,
    pub crypto_path: PathBuf,
    pub key_directory_path: Option<PathBuf>,
    pub cert_directory_path: Option<PathBuf>,
    pub tls_cert_path: Option<PathBuf>,
    pub peer_endpoint: String,
    pub peer_host_alias: String,
    /// Ceiling on building a whole session.
    pub connect_timeout_ms: u64,
    pub deadlines: DeadlineConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            channel_name: "mychannel".into(),
            chaincode_name: "carboncc".into(),
            msp_id: "Org1MSP".into(),
            crypto_path: PathBuf::from(
                "../../test-network/organizations/peerOrganizations/org1.example.com",
            ),
            key_directory_path: None,
            cert_directory_path: None,
            tls_cert_path: None,
            peer_endpoint: "localhost:7051".into(),
            peer_host_alias: "peer0.org1.example.com".into(),
            connect_timeout_ms: 5_000,
            deadlines: DeadlineConfig::default(),
        }
    }
}

impl GatewayConfig {
    /// Parse a TOML document. Missing fields take their defaults.
    pub fn from_toml(text: &str) -> GatewayResult<Self> {
        toml::from_str(text).map_err(|e| GatewayError::Config(format!("invalid config: {e}")))
    }

    /// Read a TOML config file.
    pub fn load(path: &Path) -> GatewayResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            GatewayError::Config(format!("cannot read config {}: {e}", path.display()))
        })?;
        Self::from_toml(&text)
    }

    /// Apply overrides from the process environment.
    pub fn with_env(self) -> Self {
        self.with_overrides(|name| std::env::var(name).ok())
    }

    /// Defaults overlaid with the process environment.
    pub fn from_env() -> Self {
        Self::default().with_env()
    }

    /// Apply overrides from `lookup`, keyed by environment variable name.
    /// Empty values are treated as unset.
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.is_empty());

        if let Some(v) = get("CHANNEL_NAME") {
            self.channel_name = v;
        }
        if let Some(v) = get("CHAINCODE_NAME") {
            self.chaincode_name = v;
        }
        if let Some(v) = get("MSP_ID") {
            self.msp_id = v;
        }
        if let Some(v) = get("CRYPTO_PATH") {
            self.crypto_path = v.into();
        }
        if let Some(v) = get("KEY_DIRECTORY_PATH") {
            self.key_directory_path = Some(v.into());
        }
        if let Some(v) = get("CERT_DIRECTORY_PATH") {
            self.cert_directory_path = Some(v.into());
        }
        if let Some(v) = get("TLS_CERT_PATH") {
            self.tls_cert_path = Some(v.into());
        }
        if let Some(v) = get("PEER_ENDPOINT") {
            self.peer_endpoint = v;
        }
        if let Some(v) = get("PEER_HOST_ALIAS") {
            self.peer_host_alias = v;
        }
        self
    }

    pub fn key_directory(&self) -> PathBuf {
        self.key_directory_path
            .clone()
            .unwrap_or_else(|| self.crypto_path.join(USER_MSP).join("keystore"))
    }

    pub fn cert_directory(&self) -> PathBuf {
        self.cert_directory_path
            .clone()
            .unwrap_or_else(|| self.crypto_path.join(USER_MSP).join("signcerts"))
    }

    pub fn tls_cert(&self) -> PathBuf {
        self.tls_cert_path
            .clone()
            .unwrap_or_else(|| self.crypto_path.join(PEER_TLS_CA))
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Resolved parameters as (name, value) pairs, in display order.
    pub fn parameters(&self) -> Vec<(&'static str, String)> {
        vec![
            ("channelName", self.channel_name.clone()),
            ("chaincodeName", self.chaincode_name.clone()),
            ("mspId", self.msp_id.clone()),
            ("cryptoPath", self.crypto_path.display().to_string()),
            ("keyDirectoryPath", self.key_directory().display().to_string()),
            ("certDirectoryPath", self.cert_directory().display().to_string()),
            ("tlsCertPath", self.tls_cert().display().to_string()),
            ("peerEndpoint", self.peer_endpoint.clone()),
            ("peerHostAlias", self.peer_host_alias.clone()),
        ]
    }

    /// Log the resolved parameters.
    pub fn log_parameters(&self) {
        for (name, value) in self.parameters() {
            info!(%name, %value, "gateway parameter");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn default_config() {
        let c = GatewayConfig::default();
        assert_eq!(c.channel_name, "mychannel");
        assert_eq!(c.chaincode_name, "carboncc");
        assert_eq!(c.msp_id, "Org1MSP");
        assert_eq!(c.peer_endpoint, "localhost:7051");
        assert_eq!(c.peer_host_alias, "peer0.org1.example.com");
        assert_eq!(c.connect_timeout(), Duration::from_secs(5));
        assert_eq!(c.deadlines.evaluate(), Duration::from_secs(5));
        assert_eq!(c.deadlines.endorse(), Duration::from_secs(15));
        assert_eq!(c.deadlines.submit(), Duration::from_secs(30));
        assert_eq!(c.deadlines.commit_status(), Duration::from_secs(120));
        assert!(c
            .tls_cert()
            .ends_with("peers/peer0.org1.example.com/tls/ca.crt"));
    }

    #[test]
    fn derived_paths_follow_crypto_path() {
        let c = GatewayConfig::default().with_overrides(lookup(&[("CRYPTO_PATH", "/tmp/org1")]));
        assert_eq!(
            c.key_directory(),
            PathBuf::from("/tmp/org1/users/User1@org1.example.com/msp/keystore")
        );
        assert_eq!(
            c.cert_directory(),
            PathBuf::from("/tmp/org1/users/User1@org1.example.com/msp/signcerts")
        );
        assert_eq!(
            c.tls_cert(),
            PathBuf::from("/tmp/org1/peers/peer0.org1.example.com/tls/ca.crt")
        );
    }

    #[test]
    fn explicit_paths_win() {
        let c = GatewayConfig::default().with_overrides(lookup(&[
            ("CRYPTO_PATH", "/tmp/org1"),
            ("KEY_DIRECTORY_PATH", "/keys"),
            ("TLS_CERT_PATH", "/ca.pem"),
        ]));
        assert_eq!(c.key_directory(), PathBuf::from("/keys"));
        assert_eq!(c.tls_cert(), PathBuf::from("/ca.pem"));
    }

    #[test]
    fn empty_env_values_are_unset() {
        let c = GatewayConfig::default().with_overrides(lookup(&[
            ("CHANNEL_NAME", ""),
            ("PEER_ENDPOINT", "peer:9051"),
        ]));
        assert_eq!(c.channel_name, "mychannel");
        assert_eq!(c.peer_endpoint, "peer:9051");
    }

    #[test]
    fn toml_layer() {
        let c = GatewayConfig::from_toml(
            r#"
            channel_name = "carbon"
            connect_timeout_ms = 250

            [deadlines]
            evaluate_ms = 100
            "#,
        )
        .unwrap();
        assert_eq!(c.channel_name, "carbon");
        assert_eq!(c.chaincode_name, "carboncc");
        assert_eq!(c.connect_timeout(), Duration::from_millis(250));
        assert_eq!(c.deadlines.evaluate_ms, 100);
        assert_eq!(c.deadlines.commit_status_ms, 120_000);
    }

    #[test]
    fn bad_toml_is_config_error() {
        let err = GatewayConfig::from_toml("channel_name = [").unwrap_err();
        assert!(matches!(err, GatewayError::Config(_)));
    }

    #[test]
    fn parameters_listed_in_order() {
        let names: Vec<_> = GatewayConfig::default()
            .parameters()
            .into_iter()
            .map(|(n, _)| n)
            .collect();
        assert_eq!(names[0], "channelName");
        assert_eq!(names.len(), 9);
    }
}
