use std::sync::Arc;

use cpl_protocol::Envelope;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::channel::ChannelLedger;
use crate::error::{FabricError, Result};

/// Configuration for an [`OrderingService`].
#[derive(Clone, Debug)]
pub struct OrdererConfig {
    /// Largest number of transactions cut into one block.
    pub max_batch: usize,
    /// Capacity of the pending-transaction queue.
    pub queue_capacity: usize,
}

impl Default for OrdererConfig {
    fn default() -> Self {
        Self {
            max_batch: 10,
            queue_capacity: 1024,
        }
    }
}

/// Sequences endorsed transactions into blocks for one channel and hands
/// each block to the channel's committer.
///
/// Blocks are cut from whatever is queued when the orderer wakes, up to
/// `max_batch`. While paused, queued transactions stay queued.
pub struct OrderingService {
    sender: mpsc::Sender<Envelope>,
    paused: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl OrderingService {
    /// Start the ordering task. Must be called within a Tokio runtime.
    pub fn start(channel: Arc<ChannelLedger>, config: OrdererConfig) -> Self {
        let (sender, receiver) = mpsc::channel(config.queue_capacity.max(1));
        let (paused, paused_rx) = watch::channel(false);
        info!(channel = %channel.name(), max_batch = config.max_batch, "ordering service started");
        let task = tokio::spawn(run(channel, receiver, paused_rx, config.max_batch.max(1)));
        Self {
            sender,
            paused,
            task,
        }
    }

    /// Queue a transaction for ordering.
    pub async fn broadcast(&self, envelope: Envelope) -> Result<()> {
        debug!(tx_id = %envelope.tx_id().short(), "transaction queued");
        self.sender
            .send(envelope)
            .await
            .map_err(|_| FabricError::Shutdown)
    }

    /// Stop cutting blocks until [`resume`](Self::resume).
    pub fn pause(&self) {
        self.paused.send_replace(true);
        info!("ordering paused");
    }

    pub fn resume(&self) {
        self.paused.send_replace(false);
        info!("ordering resumed");
    }

    pub fn is_paused(&self) -> bool {
        *self.paused.borrow()
    }
}

impl Drop for OrderingService {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run(
    channel: Arc<ChannelLedger>,
    mut receiver: mpsc::Receiver<Envelope>,
    mut paused: watch::Receiver<bool>,
    max_batch: usize,
) {
    while let Some(first) = receiver.recv().await {
        while *paused.borrow_and_update() {
            if paused.changed().await.is_err() {
                return;
            }
        }
        let mut batch = vec![first];
        while batch.len() < max_batch {
            match receiver.try_recv() {
                Ok(envelope) => batch.push(envelope),
                Err(_) => break,
            }
        }
        channel.commit_block(batch);
    }
    debug!(channel = %channel.name(), "ordering queue closed");
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use cpl_crypto::SigningKey;
    use cpl_protocol::{Proposal, ProposalResponse, SerializedIdentity, SignedProposal};

    use super::*;

    fn envelope(channel: &ChannelLedger, key: &SigningKey, function: &str, args: &[&str]) -> Envelope {
        let proposal = Proposal::new(
            "mychannel",
            "carboncc",
            function,
            args.iter().map(|s| s.to_string()).collect(),
            SerializedIdentity::new("Org1MSP", b"cert".to_vec()),
        );
        let (payload, rwset) = channel.simulate(&proposal).unwrap().unwrap();
        let response =
            ProposalResponse::endorse("peer0", key, proposal.tx_id.clone(), payload, rwset).unwrap();
        let signed = SignedProposal::sign(&proposal, key).unwrap();
        Envelope::seal(signed, response, key).unwrap()
    }

    fn channel(key: &SigningKey) -> Arc<ChannelLedger> {
        let channel = Arc::new(ChannelLedger::new("mychannel", ["carboncc".to_string()]));
        channel.trust_endorser(key.verifying_key());
        channel
    }

    #[tokio::test]
    async fn broadcast_commits() {
        let key = SigningKey::generate();
        let channel = channel(&key);
        let orderer = OrderingService::start(channel.clone(), OrdererConfig::default());
        let env = envelope(&channel, &key, "InitLedger", &[]);
        let tx_id = env.tx_id().clone();
        orderer.broadcast(env).await.unwrap();
        let status = channel.statuses().wait_for(&tx_id).await.unwrap();
        assert!(status.is_successful());
    }

    #[tokio::test]
    async fn pause_holds_transactions() {
        let key = SigningKey::generate();
        let channel = channel(&key);
        let orderer = OrderingService::start(channel.clone(), OrdererConfig::default());
        orderer.pause();
        assert!(orderer.is_paused());

        let env = envelope(&channel, &key, "InitLedger", &[]);
        let tx_id = env.tx_id().clone();
        orderer.broadcast(env).await.unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(channel.statuses().get(&tx_id).is_none());
        assert_eq!(channel.height(), 0);

        orderer.resume();
        let status = channel.statuses().wait_for(&tx_id).await.unwrap();
        assert!(status.is_successful());
    }

    #[tokio::test]
    async fn queued_while_paused_share_a_block() {
        let key = SigningKey::generate();
        let channel = channel(&key);
        let orderer = OrderingService::start(channel.clone(), OrdererConfig::default());
        orderer.pause();
        let a = envelope(&channel, &key, "CreateAsset", &["a", "soil", "1", "f", "d"]);
        let b = envelope(&channel, &key, "CreateAsset", &["b", "soil", "2", "f", "d"]);
        let (ida, idb) = (a.tx_id().clone(), b.tx_id().clone());
        orderer.broadcast(a).await.unwrap();
        orderer.broadcast(b).await.unwrap();
        orderer.resume();

        let sa = channel.statuses().wait_for(&ida).await.unwrap();
        let sb = channel.statuses().wait_for(&idb).await.unwrap();
        assert_eq!(sa.block_number, sb.block_number);
        assert_eq!(channel.height(), 1);
    }
}
