use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use cpl_protocol::{Connection, Endpoint};
use tracing::{debug, info};

use crate::config::DeadlineConfig;
use crate::contract::Contract;
use crate::error::{GatewayError, GatewayResult};
use crate::identity::{Identity, Signer};

/// Secured binding to a peer endpoint. Owns the transport connection.
///
/// The connection is closed exactly once: by [`close`](Self::close) or, if
/// that never happens, when the channel is dropped.
pub struct Channel {
    endpoint: Endpoint,
    connection: Arc<dyn Connection>,
    closed: AtomicBool,
}

impl Channel {
    pub fn new(endpoint: Endpoint, connection: Arc<dyn Connection>) -> Self {
        Self {
            endpoint,
            connection,
            closed: AtomicBool::new(false),
        }
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Wait until the underlying connection can carry calls.
    pub async fn ready(&self) -> GatewayResult<()> {
        self.connection()?.ready().await.map_err(Into::into)
    }

    pub(crate) fn connection(&self) -> GatewayResult<&Arc<dyn Connection>> {
        if self.is_closed() {
            return Err(GatewayError::Closed);
        }
        Ok(&self.connection)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            self.connection.close();
            debug!(endpoint = %self.endpoint, "channel closed");
        }
    }
}

impl Drop for Channel {
    fn drop(&mut self) {
        self.close();
    }
}

/// Gateway client: the identity and signer every call is made with, and the
/// deadline applied to each tier of call.
#[derive(Debug)]
pub struct Gateway {
    identity: Identity,
    signer: Signer,
    deadlines: DeadlineConfig,
    closed: AtomicBool,
}

impl Gateway {
    pub fn new(identity: Identity, signer: Signer, deadlines: DeadlineConfig) -> Self {
        Self {
            identity,
            signer,
            deadlines,
            closed: AtomicBool::new(false),
        }
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn signer(&self) -> &Signer {
        &self.signer
    }

    pub fn deadlines(&self) -> &DeadlineConfig {
        &self.deadlines
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            debug!(msp_id = %self.identity.msp_id(), "gateway client closed");
        }
    }
}

pub(crate) struct SessionInner {
    pub(crate) gateway: Gateway,
    pub(crate) channel: Channel,
}

impl SessionInner {
    pub(crate) fn is_closed(&self) -> bool {
        self.gateway.is_closed() || self.channel.is_closed()
    }

    fn close(&self) {
        self.gateway.close();
        self.channel.close();
    }
}

/// Upgrade a view's handle, failing with [`GatewayError::Closed`] once the
/// session has gone.
pub(crate) fn upgrade(session: &Weak<SessionInner>) -> GatewayResult<Arc<SessionInner>> {
    let inner = session.upgrade().ok_or(GatewayError::Closed)?;
    if inner.is_closed() {
        return Err(GatewayError::Closed);
    }
    Ok(inner)
}

/// An open gateway session. Exclusively owns its channel and client and
/// releases both when closed or dropped.
pub struct Session {
    inner: Arc<SessionInner>,
    channel_name: String,
    chaincode_name: String,
}

impl Session {
    pub fn new(
        channel: Channel,
        gateway: Gateway,
        channel_name: impl Into<String>,
        chaincode_name: impl Into<String>,
    ) -> Self {
        let session = Self {
            inner: Arc::new(SessionInner { gateway, channel }),
            channel_name: channel_name.into(),
            chaincode_name: chaincode_name.into(),
        };
        info!(
            endpoint = %session.inner.channel.endpoint(),
            channel = %session.channel_name,
            chaincode = %session.chaincode_name,
            "session opened"
        );
        session
    }

    pub fn gateway(&self) -> &Gateway {
        &self.inner.gateway
    }

    pub fn channel(&self) -> &Channel {
        &self.inner.channel
    }

    /// View of a ledger channel.
    pub fn network(&self, name: impl Into<String>) -> Network {
        Network {
            session: Arc::downgrade(&self.inner),
            name: name.into(),
        }
    }

    /// The configured chaincode on the configured channel.
    pub fn contract(&self) -> Contract {
        self.network(self.channel_name.clone())
            .contract(self.chaincode_name.clone())
    }

    pub fn is_closed(&self) -> bool {
        self.inner.is_closed()
    }

    /// Close the client, then the channel.
    pub fn close(self) {
        drop(self);
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if !self.inner.is_closed() {
            info!(endpoint = %self.inner.channel.endpoint(), "session closed");
        }
        self.inner.close();
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("endpoint", self.inner.channel.endpoint())
            .field("channel", &self.channel_name)
            .field("chaincode", &self.chaincode_name)
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// Non-owning view of one ledger channel within a session.
#[derive(Clone, Debug)]
pub struct Network {
    session: Weak<SessionInner>,
    name: String,
}

impl Network {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn contract(&self, chaincode: impl Into<String>) -> Contract {
        Contract::new(self.session.clone(), self.name.clone(), chaincode.into())
    }
}
