use std::fmt;

use crate::error::{ProtocolError, ProtocolResult};

const PEM_CERT_BEGIN: &str = "-----BEGIN CERTIFICATE-----";
const PEM_CERT_END: &str = "-----END CERTIFICATE-----";

/// Network address of a peer plus the host name its certificate is issued
/// for. The alias is what the secured channel verifies, regardless of the
/// address actually dialled.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Endpoint {
    pub address: String,
    pub host_alias: String,
}

impl Endpoint {
    pub fn new(address: impl Into<String>, host_alias: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            host_alias: host_alias.into(),
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.address, self.host_alias)
    }
}

/// Trust-root certificate used to authenticate the peer.
#[derive(Clone, PartialEq, Eq)]
pub struct TlsRootCert {
    pem: Vec<u8>,
}

impl TlsRootCert {
    /// Accept a PEM document containing at least one certificate block.
    pub fn from_pem(pem: impl Into<Vec<u8>>) -> ProtocolResult<Self> {
        let pem = pem.into();
        let text = std::str::from_utf8(&pem)
            .map_err(|_| ProtocolError::TlsHandshake("trust root is not text".into()))?;
        let begin = text.find(PEM_CERT_BEGIN);
        let end = text.find(PEM_CERT_END);
        match (begin, end) {
            (Some(b), Some(e)) if b < e => Ok(Self { pem }),
            _ => Err(ProtocolError::TlsHandshake(
                "trust root contains no PEM certificate".into(),
            )),
        }
    }

    pub fn as_pem(&self) -> &[u8] {
        &self.pem
    }

    /// Short BLAKE3 fingerprint for logs and trust comparisons.
    pub fn fingerprint(&self) -> String {
        hex::encode(&blake3::hash(&self.pem).as_bytes()[..8])
    }
}

impl fmt::Debug for TlsRootCert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TlsRootCert({})", self.fingerprint())
    }
}
