use std::fmt;
use std::path::{Path, PathBuf};

use cpl_crypto::{Signature, SigningKey, VerifyingKey};
use cpl_protocol::SerializedIdentity;
use tracing::debug;

use crate::error::{GatewayError, GatewayResult};

/// Read the only file in `dir`.
///
/// Credential directories hold exactly one file; an empty directory or one
/// with several files is a configuration error.
pub async fn read_single_file(dir: &Path) -> GatewayResult<(PathBuf, Vec<u8>)> {
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .map_err(|e| GatewayError::Config(format!("cannot read {}: {e}", dir.display())))?;

    let mut files = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| GatewayError::Config(format!("cannot list {}: {e}", dir.display())))?
    {
        let file_type = entry
            .file_type()
            .await
            .map_err(|e| GatewayError::Config(format!("cannot stat {}: {e}", entry.path().display())))?;
        if file_type.is_file() {
            files.push(entry.path());
        }
    }

    let path = match files.len() {
        0 => {
            return Err(GatewayError::Config(format!(
                "no file found in {}",
                dir.display()
            )))
        }
        1 => files.remove(0),
        n => {
            return Err(GatewayError::Config(format!(
                "expected exactly one file in {}, found {n}",
                dir.display()
            )))
        }
    };

    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|e| GatewayError::Config(format!("cannot read {}: {e}", path.display())))?;
    if bytes.is_empty() {
        return Err(GatewayError::Config(format!("{} is empty", path.display())));
    }
    debug!(path = %path.display(), bytes = bytes.len(), "credential file read");
    Ok((path, bytes))
}

/// Member identity presented with every proposal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Identity {
    msp_id: String,
    credentials: Vec<u8>,
}

impl Identity {
    pub fn new(msp_id: impl Into<String>, credentials: Vec<u8>) -> Self {
        Self {
            msp_id: msp_id.into(),
            credentials,
        }
    }

    /// Load the certificate from the single file in `cert_dir`.
    pub async fn load(msp_id: &str, cert_dir: &Path) -> GatewayResult<Self> {
        let (_, credentials) = read_single_file(cert_dir).await?;
        Ok(Self::new(msp_id, credentials))
    }

    pub fn msp_id(&self) -> &str {
        &self.msp_id
    }

    pub fn credentials(&self) -> &[u8] {
        &self.credentials
    }

    pub fn serialized(&self) -> SerializedIdentity {
        SerializedIdentity::new(self.msp_id.clone(), self.credentials.clone())
    }
}

/// Private-key signer for proposals and transactions.
pub struct Signer {
    key: SigningKey,
}

impl Signer {
    pub fn new(key: SigningKey) -> Self {
        Self { key }
    }

    /// Load a PKCS#8 PEM private key from the single file in `key_dir`.
    pub async fn load(key_dir: &Path) -> GatewayResult<Self> {
        let (path, bytes) = read_single_file(key_dir).await?;
        Self::from_pem_bytes(&bytes)
            .map_err(|e| GatewayError::Crypto(format!("{}: {e}", path.display())))
    }

    fn from_pem_bytes(bytes: &[u8]) -> Result<Self, String> {
        let pem = std::str::from_utf8(bytes).map_err(|_| "key file is not UTF-8".to_string())?;
        SigningKey::from_pkcs8_pem(pem)
            .map(Self::new)
            .map_err(|e| e.to_string())
    }

    pub fn sign(&self, message: &[u8]) -> Signature {
        self.key.sign(message)
    }

    pub fn public_key(&self) -> VerifyingKey {
        self.key.verifying_key()
    }

    pub(crate) fn key(&self) -> &SigningKey {
        &self.key
    }
}

impl fmt::Debug for Signer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signer")
            .field("public_key", &self.public_key())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn single_file_is_read() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("cert.pem"), b"cert").unwrap();
        let id = Identity::load("Org1MSP", dir.path()).await.unwrap();
        assert_eq!(id.msp_id(), "Org1MSP");
        assert_eq!(id.credentials(), b"cert");
        assert_eq!(id.serialized().credentials, b"cert");
    }

    #[tokio::test]
    async fn empty_directory_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Identity::load("Org1MSP", dir.path()).await.unwrap_err();
        assert!(matches!(err, GatewayError::Config(_)));
    }

    #[tokio::test]
    async fn two_files_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.pem"), b"a").unwrap();
        std::fs::write(dir.path().join("b.pem"), b"b").unwrap();
        let err = read_single_file(dir.path()).await.unwrap_err();
        assert!(err.to_string().contains("found 2"));
    }

    #[tokio::test]
    async fn subdirectories_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("only.pem"), b"x").unwrap();
        let (path, bytes) = read_single_file(dir.path()).await.unwrap();
        assert!(path.ends_with("only.pem"));
        assert_eq!(bytes, b"x");
    }

    #[tokio::test]
    async fn empty_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("cert.pem"), b"").unwrap();
        assert!(matches!(
            read_single_file(dir.path()).await,
            Err(GatewayError::Config(_))
        ));
    }

    #[tokio::test]
    async fn missing_directory_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Signer::load(&dir.path().join("absent")).await.unwrap_err();
        assert!(matches!(err, GatewayError::Config(_)));
    }

    #[tokio::test]
    async fn signer_loads_pkcs8() {
        let dir = tempfile::tempdir().unwrap();
        let key = SigningKey::generate();
        std::fs::write(dir.path().join("priv_sk"), key.to_pkcs8_pem().unwrap()).unwrap();
        let signer = Signer::load(dir.path()).await.unwrap();
        assert_eq!(signer.public_key(), key.verifying_key());
        let sig = signer.sign(b"msg");
        assert!(signer.public_key().verify(b"msg", &sig).is_ok());
    }

    #[tokio::test]
    async fn garbage_key_is_crypto_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("priv_sk"), b"not a key").unwrap();
        let err = Signer::load(dir.path()).await.unwrap_err();
        assert!(matches!(err, GatewayError::Crypto(_)));
    }
}
