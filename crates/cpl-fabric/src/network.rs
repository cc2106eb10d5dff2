use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rand::RngCore;
use cpl_crypto::SigningKey;
use cpl_protocol::{
    CommitStatus, Connection, Connector, Endpoint, Envelope, Proposal, ProposalResponse,
    ProtocolError, ProtocolResult, SignedProposal, TlsRootCert, WireCodec,
};
use cpl_types::TxId;
use tracing::{debug, info, warn};

use crate::channel::ChannelLedger;
use crate::error::{FabricError, Result};
use crate::orderer::{OrdererConfig, OrderingService};
use crate::peer::Peer;

/// Produce a PEM-armoured placeholder CA certificate for a local network.
///
/// The body is random; the runtime authenticates clients by comparing the
/// presented trust root byte for byte.
pub fn generate_ca_pem() -> String {
    let mut body = [0u8; 48];
    rand::thread_rng().fill_bytes(&mut body);
    format!(
        "-----BEGIN CERTIFICATE-----\n{}\n-----END CERTIFICATE-----\n",
        hex_lines(&body)
    )
}

fn hex_lines(bytes: &[u8]) -> String {
    let encoded = hex::encode(bytes);
    encoded
        .as_bytes()
        .chunks(64)
        .map(|c| String::from_utf8_lossy(c).into_owned())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Builder for a [`LocalNetwork`].
#[derive(Debug)]
pub struct LocalNetworkBuilder {
    peer_name: String,
    host_alias: String,
    tls_ca_pem: Option<String>,
    channels: BTreeMap<String, Vec<String>>,
    orderer: OrdererConfig,
}

impl Default for LocalNetworkBuilder {
    fn default() -> Self {
        Self {
            peer_name: "peer0.org1.example.com".into(),
            host_alias: "peer0.org1.example.com".into(),
            tls_ca_pem: None,
            channels: BTreeMap::new(),
            orderer: OrdererConfig::default(),
        }
    }
}

impl LocalNetworkBuilder {
    pub fn peer_name(mut self, name: impl Into<String>) -> Self {
        self.peer_name = name.into();
        self
    }

    /// Name the peer's TLS certificate is issued for.
    pub fn host_alias(mut self, alias: impl Into<String>) -> Self {
        self.host_alias = alias.into();
        self
    }

    /// CA certificate clients must present. Generated if not set.
    pub fn tls_ca_pem(mut self, pem: impl Into<String>) -> Self {
        self.tls_ca_pem = Some(pem.into());
        self
    }

    /// Host `chaincode` on `channel`, creating the channel if needed.
    pub fn chaincode(mut self, channel: impl Into<String>, chaincode: impl Into<String>) -> Self {
        self.channels
            .entry(channel.into())
            .or_default()
            .push(chaincode.into());
        self
    }

    pub fn orderer(mut self, config: OrdererConfig) -> Self {
        self.orderer = config;
        self
    }

    /// Start the network. Must be called within a Tokio runtime.
    pub fn build(self) -> Result<LocalNetwork> {
        let pem = self.tls_ca_pem.unwrap_or_else(generate_ca_pem);
        let tls_ca = TlsRootCert::from_pem(pem.into_bytes())?;

        let mut peer = Peer::new(self.peer_name, SigningKey::generate());
        let mut orderers = HashMap::new();
        for (name, chaincodes) in self.channels {
            let channel = Arc::new(ChannelLedger::new(name.clone(), chaincodes));
            peer.join(channel.clone());
            orderers.insert(name, OrderingService::start(channel, self.orderer.clone()));
        }

        info!(
            peer = %peer.name(),
            host_alias = %self.host_alias,
            channels = orderers.len(),
            "local network started"
        );

        Ok(LocalNetwork {
            inner: Arc::new(NetworkInner {
                host_alias: self.host_alias,
                tls_ca,
                peer,
                orderers,
                opened: AtomicU64::new(0),
                closed: AtomicU64::new(0),
                available: AtomicBool::new(true),
                stalled: AtomicBool::new(false),
                latency_ms: AtomicU64::new(0),
            }),
        })
    }
}

struct NetworkInner {
    host_alias: String,
    tls_ca: TlsRootCert,
    peer: Peer,
    orderers: HashMap<String, OrderingService>,
    opened: AtomicU64,
    closed: AtomicU64,
    available: AtomicBool,
    stalled: AtomicBool,
    latency_ms: AtomicU64,
}

impl NetworkInner {
    async fn delay(&self) {
        let ms = self.latency_ms.load(Ordering::SeqCst);
        if ms > 0 {
            tokio::time::sleep(Duration::from_millis(ms)).await;
        }
    }
}

/// A single-peer, single-orderer network running in this process.
///
/// Implements [`Connector`], so a gateway can dial it exactly as it would a
/// remote peer. Cloning yields another handle to the same network.
#[derive(Clone)]
pub struct LocalNetwork {
    inner: Arc<NetworkInner>,
}

impl LocalNetwork {
    pub fn builder() -> LocalNetworkBuilder {
        LocalNetworkBuilder::default()
    }

    pub fn host_alias(&self) -> &str {
        &self.inner.host_alias
    }

    /// The CA certificate clients must trust, PEM-encoded.
    pub fn tls_ca_pem(&self) -> &[u8] {
        self.inner.tls_ca.as_pem()
    }

    pub fn channel(&self, name: &str) -> Option<Arc<ChannelLedger>> {
        self.inner.peer.channel(name).cloned()
    }

    fn orderer(&self, channel: &str) -> Result<&OrderingService> {
        self.inner
            .orderers
            .get(channel)
            .ok_or_else(|| FabricError::UnknownChannel(channel.to_string()))
    }

    pub fn pause_ordering(&self, channel: &str) -> Result<()> {
        self.orderer(channel)?.pause();
        Ok(())
    }

    pub fn resume_ordering(&self, channel: &str) -> Result<()> {
        self.orderer(channel)?.resume();
        Ok(())
    }

    /// Status of a committed transaction, if it has one yet.
    pub fn status(&self, channel: &str, tx_id: &TxId) -> Option<CommitStatus> {
        self.channel(channel)?.statuses().get(tx_id)
    }

    /// Refuse new connections while `false`.
    pub fn set_available(&self, available: bool) {
        self.inner.available.store(available, Ordering::SeqCst);
    }

    /// While `true`, readiness checks on new and existing connections never
    /// complete.
    pub fn set_stalled(&self, stalled: bool) {
        self.inner.stalled.store(stalled, Ordering::SeqCst);
    }

    /// Delay applied to every evaluate and endorse call.
    pub fn set_latency(&self, latency: Duration) {
        self.inner
            .latency_ms
            .store(latency.as_millis() as u64, Ordering::SeqCst);
    }

    /// Connections handed out so far.
    pub fn opened_connections(&self) -> u64 {
        self.inner.opened.load(Ordering::SeqCst)
    }

    /// Connections that have been closed.
    pub fn closed_connections(&self) -> u64 {
        self.inner.closed.load(Ordering::SeqCst)
    }

    /// Connections handed out and not yet closed.
    pub fn open_connections(&self) -> u64 {
        self.opened_connections() - self.closed_connections()
    }
}

impl std::fmt::Debug for LocalNetwork {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalNetwork")
            .field("host_alias", &self.inner.host_alias)
            .field("peer", &self.inner.peer)
            .field("open_connections", &self.open_connections())
            .finish()
    }
}

#[async_trait]
impl Connector for LocalNetwork {
    async fn connect(
        &self,
        endpoint: &Endpoint,
        trust_root: &TlsRootCert,
    ) -> ProtocolResult<Arc<dyn Connection>> {
        if endpoint.address.is_empty() || !self.inner.available.load(Ordering::SeqCst) {
            return Err(ProtocolError::Unavailable(endpoint.to_string()));
        }
        if endpoint.host_alias != self.inner.host_alias {
            warn!(expected = %self.inner.host_alias, got = %endpoint.host_alias, "host alias mismatch");
            return Err(ProtocolError::TlsHandshake(format!(
                "certificate is valid for {}, not {}",
                self.inner.host_alias, endpoint.host_alias
            )));
        }
        if trust_root.as_pem() != self.inner.tls_ca.as_pem() {
            warn!(fingerprint = %trust_root.fingerprint(), "untrusted root certificate");
            return Err(ProtocolError::TlsHandshake(
                "certificate signed by unknown authority".into(),
            ));
        }

        let id = self.inner.opened.fetch_add(1, Ordering::SeqCst) + 1;
        info!(connection = id, endpoint = %endpoint, "connection opened");
        Ok(Arc::new(LocalConnection {
            id,
            inner: self.inner.clone(),
            closed: AtomicBool::new(false),
        }))
    }
}

/// One client connection to a [`LocalNetwork`].
pub struct LocalConnection {
    id: u64,
    inner: Arc<NetworkInner>,
    closed: AtomicBool,
}

impl LocalConnection {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn check_open(&self) -> ProtocolResult<()> {
        if self.is_closed() {
            Err(ProtocolError::Closed)
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl Connection for LocalConnection {
    async fn ready(&self) -> ProtocolResult<()> {
        self.check_open()?;
        if self.inner.stalled.load(Ordering::SeqCst) {
            debug!(connection = self.id, "readiness stalled");
            std::future::pending::<()>().await;
        }
        Ok(())
    }

    async fn evaluate(&self, proposal: SignedProposal) -> ProtocolResult<Vec<u8>> {
        self.check_open()?;
        self.inner.delay().await;
        self.inner.peer.evaluate(&proposal)
    }

    async fn endorse(&self, proposal: SignedProposal) -> ProtocolResult<ProposalResponse> {
        self.check_open()?;
        self.inner.delay().await;
        self.inner.peer.endorse(&proposal)
    }

    async fn submit(&self, envelope: Envelope) -> ProtocolResult<()> {
        self.check_open()?;
        let proposal: Proposal = WireCodec::decode(&envelope.proposal.proposal_bytes)?;
        let orderer = self
            .inner
            .orderers
            .get(&proposal.channel)
            .ok_or_else(|| ProtocolError::OrderingFailed(format!("unknown channel {}", proposal.channel)))?;
        orderer.broadcast(envelope).await.map_err(Into::into)
    }

    async fn commit_status(&self, channel: &str, tx_id: &TxId) -> ProtocolResult<CommitStatus> {
        self.check_open()?;
        let ledger = self
            .inner
            .peer
            .channel(channel)
            .ok_or_else(|| FabricError::UnknownChannel(channel.to_string()))?;
        ledger.statuses().wait_for(tx_id).await.map_err(Into::into)
    }

    fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            self.inner.closed.fetch_add(1, Ordering::SeqCst);
            info!(connection = self.id, "connection closed");
        }
    }
}
