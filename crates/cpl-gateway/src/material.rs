use std::path::{Path, PathBuf};

use cpl_crypto::{SigningKey, VerifyingKey};
use tracing::info;

use crate::error::{GatewayError, GatewayResult};

/// Paths of a freshly written set of development credentials.
#[derive(Clone, Debug)]
pub struct DevMaterial {
    pub crypto_path: PathBuf,
    pub key_path: PathBuf,
    pub cert_path: PathBuf,
    pub tls_cert_path: PathBuf,
    pub public_key: VerifyingKey,
}

/// Write a user key, a user certificate and the peer TLS CA under `root`,
/// laid out the way [`GatewayConfig`](crate::GatewayConfig) derives its
/// default paths from `crypto_path`.
pub async fn write_dev_material(root: &Path, tls_ca_pem: &[u8]) -> GatewayResult<DevMaterial> {
    let msp = root.join("users/User1@org1.example.com/msp");
    let key_dir = msp.join("keystore");
    let cert_dir = msp.join("signcerts");
    let tls_dir = root.join("peers/peer0.org1.example.com/tls");

    for dir in [&key_dir, &cert_dir, &tls_dir] {
        tokio::fs::create_dir_all(dir).await.map_err(|e| io_err(dir, e))?;
    }

    let key = SigningKey::generate();
    let pem = key
        .to_pkcs8_pem()
        .map_err(|e| GatewayError::Crypto(e.to_string()))?;
    let public_key = key.verifying_key();
    let cert = format!(
        "-----BEGIN CERTIFICATE-----\n{}\n-----END CERTIFICATE-----\n",
        public_key.to_hex()
    );

    let key_path = key_dir.join("priv_sk");
    let cert_path = cert_dir.join("cert.pem");
    let tls_cert_path = tls_dir.join("ca.crt");
    write(&key_path, pem.as_bytes()).await?;
    write(&cert_path, cert.as_bytes()).await?;
    write(&tls_cert_path, tls_ca_pem).await?;

    info!(root = %root.display(), public_key = %public_key.to_hex(), "development material written");
    Ok(DevMaterial {
        crypto_path: root.to_path_buf(),
        key_path,
        cert_path,
        tls_cert_path,
        public_key,
    })
}

async fn write(path: &Path, bytes: &[u8]) -> GatewayResult<()> {
    tokio::fs::write(path, bytes).await.map_err(|e| io_err(path, e))
}

fn io_err(path: &Path, err: std::io::Error) -> GatewayError {
    GatewayError::Config(format!("cannot write {}: {err}", path.display()))
}
