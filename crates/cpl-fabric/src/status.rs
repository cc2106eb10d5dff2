use std::collections::HashMap;
use std::sync::RwLock;

use cpl_protocol::CommitStatus;
use cpl_types::TxId;
use tokio::sync::broadcast;
use tracing::debug;

use crate::error::{FabricError, Result};

/// Filter for subscribing to a subset of commit statuses.
#[derive(Clone, Debug, Default)]
pub struct StatusFilter {
    /// If set, only statuses for this transaction are delivered.
    pub tx_id: Option<TxId>,
}

impl StatusFilter {
    pub fn for_tx(tx_id: TxId) -> Self {
        Self { tx_id: Some(tx_id) }
    }

    pub fn matches(&self, status: &CommitStatus) -> bool {
        match &self.tx_id {
            Some(id) => *id == status.tx_id,
            None => true,
        }
    }
}

struct Subscriber {
    filter: StatusFilter,
    sender: broadcast::Sender<CommitStatus>,
}

/// Record of every committed transaction's status on one channel, plus a
/// fan-out to waiters.
///
/// The first status recorded for a transaction id is final; later records
/// for the same id are ignored.
pub struct StatusBoard {
    statuses: RwLock<HashMap<TxId, CommitStatus>>,
    subscribers: RwLock<Vec<Subscriber>>,
    capacity: usize,
}

impl StatusBoard {
    pub fn new(capacity: usize) -> Self {
        Self {
            statuses: RwLock::new(HashMap::new()),
            subscribers: RwLock::new(Vec::new()),
            capacity: capacity.max(1),
        }
    }

    /// Register a receiver for statuses matching `filter`.
    pub fn subscribe(&self, filter: StatusFilter) -> broadcast::Receiver<CommitStatus> {
        let (tx, rx) = broadcast::channel(self.capacity);
        self.subscribers
            .write()
            .expect("status lock poisoned")
            .push(Subscriber { filter, sender: tx });
        rx
    }

    /// Record a status and deliver it. Returns `false` if the transaction
    /// already had a status.
    pub fn publish(&self, status: CommitStatus) -> bool {
        {
            let mut statuses = self.statuses.write().expect("status lock poisoned");
            if statuses.contains_key(&status.tx_id) {
                return false;
            }
            statuses.insert(status.tx_id.clone(), status.clone());
        }

        let mut subs = self.subscribers.write().expect("status lock poisoned");
        subs.retain(|sub| {
            if sub.filter.matches(&status) {
                sub.sender.send(status.clone()).is_ok()
            } else {
                sub.sender.receiver_count() > 0
            }
        });
        debug!(tx_id = %status.tx_id.short(), code = %status.code, "status published");
        true
    }

    pub fn get(&self, tx_id: &TxId) -> Option<CommitStatus> {
        self.statuses
            .read()
            .expect("status lock poisoned")
            .get(tx_id)
            .cloned()
    }

    /// Wait until `tx_id` has a status. Returns immediately if it already
    /// committed.
    pub async fn wait_for(&self, tx_id: &TxId) -> Result<CommitStatus> {
        // Subscribe before checking so a status published in between is not
        // missed.
        let mut rx = self.subscribe(StatusFilter::for_tx(tx_id.clone()));
        if let Some(status) = self.get(tx_id) {
            return Ok(status);
        }
        loop {
            match rx.recv().await {
                Ok(status) if status.tx_id == *tx_id => return Ok(status),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(_)) => {
                    if let Some(status) = self.get(tx_id) {
                        return Ok(status);
                    }
                }
                Err(broadcast::error::RecvError::Closed) => return Err(FabricError::Shutdown),
            }
        }
    }

    pub fn len(&self) -> usize {
        self.statuses.read().expect("status lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().expect("status lock poisoned").len()
    }
}
