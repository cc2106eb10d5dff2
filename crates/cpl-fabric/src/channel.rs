use std::collections::{BTreeSet, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, RwLock};

use cpl_crypto::VerifyingKey;
use cpl_ledger::LedgerError;
use cpl_protocol::{
    ChaincodeFault, CommitStatus, Envelope, FaultKind, Proposal, ReadWriteSet, TxValidationCode,
    Version,
};
use cpl_store::VersionedStore;
use cpl_types::TxId;
use tracing::{debug, info, warn};

use crate::error::{FabricError, Result};
use crate::simulator::TxSimulator;
use crate::status::StatusBoard;

/// One channel's ledger as held by a peer: committed world state, the
/// chaincodes deployed on it, and the statuses of committed transactions.
pub struct ChannelLedger {
    name: String,
    chaincodes: BTreeSet<String>,
    endorsers: RwLock<Vec<VerifyingKey>>,
    state: VersionedStore,
    statuses: StatusBoard,
    seen: Mutex<HashSet<TxId>>,
    height: AtomicU64,
}

impl ChannelLedger {
    pub fn new(name: impl Into<String>, chaincodes: impl IntoIterator<Item = String>) -> Self {
        Self {
            name: name.into(),
            chaincodes: chaincodes.into_iter().collect(),
            endorsers: RwLock::new(Vec::new()),
            state: VersionedStore::new(),
            statuses: StatusBoard::new(256),
            seen: Mutex::new(HashSet::new()),
            height: AtomicU64::new(0),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn has_chaincode(&self, chaincode: &str) -> bool {
        self.chaincodes.contains(chaincode)
    }

    /// Accept endorsements signed by `key`.
    pub fn trust_endorser(&self, key: VerifyingKey) {
        let mut endorsers = self.endorsers.write().expect("endorser lock poisoned");
        if !endorsers.contains(&key) {
            endorsers.push(key);
        }
    }

    fn trusts(&self, key: &VerifyingKey) -> bool {
        self.endorsers
            .read()
            .expect("endorser lock poisoned")
            .contains(key)
    }

    pub fn state(&self) -> &VersionedStore {
        &self.state
    }

    pub fn statuses(&self) -> &StatusBoard {
        &self.statuses
    }

    /// Number of blocks committed so far.
    pub fn height(&self) -> u64 {
        self.height.load(Ordering::SeqCst)
    }

    /// Run the proposal's function against committed state.
    ///
    /// Returns the function's payload and the read/write set it produced.
    /// Contract failures come back as a [`ChaincodeFault`] carried inside
    /// the outer `Ok`, so they can be told apart from routing errors.
    pub fn simulate(
        &self,
        proposal: &Proposal,
    ) -> Result<std::result::Result<(Vec<u8>, ReadWriteSet), ChaincodeFault>> {
        if !self.has_chaincode(&proposal.chaincode) {
            return Err(FabricError::UnknownChaincode {
                channel: self.name.clone(),
                chaincode: proposal.chaincode.clone(),
            });
        }
        let mut sim = TxSimulator::new(&self.state);
        let outcome = cpl_ledger::invoke(&mut sim, &proposal.function, &proposal.args);
        Ok(match outcome {
            Ok(payload) => Ok((payload, sim.into_rwset())),
            Err(err) => {
                debug!(function = %proposal.function, error = %err, "simulation failed");
                Err(fault_from(&err))
            }
        })
    }

    /// Validate and apply one block of ordered transactions.
    ///
    /// Transactions are validated in block order; a valid transaction's
    /// writes are visible to the read checks of every later one.
    pub fn commit_block(&self, envelopes: Vec<Envelope>) -> Vec<CommitStatus> {
        let block_number = self.height.fetch_add(1, Ordering::SeqCst) + 1;
        let mut out = Vec::with_capacity(envelopes.len());

        for (index, envelope) in envelopes.iter().enumerate() {
            let code = self.validate(envelope);
            let tx_id = envelope.tx_id().clone();
            if code == TxValidationCode::Valid {
                self.state.apply(
                    &envelope.response.rwset.writes,
                    Version::new(block_number, index as u32),
                );
            }
            if code == TxValidationCode::DuplicateTxId {
                warn!(tx_id = %tx_id.short(), block = block_number, "duplicate transaction id");
            } else {
                self.seen.lock().expect("seen lock poisoned").insert(tx_id.clone());
            }

            let status = CommitStatus {
                tx_id,
                code,
                block_number,
            };
            self.statuses.publish(status.clone());
            out.push(status);
        }

        let valid = out.iter().filter(|s| s.is_successful()).count();
        info!(
            channel = %self.name,
            block = block_number,
            txs = out.len(),
            valid,
            "block committed"
        );
        out
    }

    fn validate(&self, envelope: &Envelope) -> TxValidationCode {
        if self
            .seen
            .lock()
            .expect("seen lock poisoned")
            .contains(envelope.tx_id())
        {
            return TxValidationCode::DuplicateTxId;
        }
        if !envelope.creator_signature_is_valid() {
            return TxValidationCode::BadCreatorSignature;
        }
        match envelope.proposal.verify() {
            Ok(proposal) if proposal.tx_id == *envelope.tx_id() && proposal.channel == self.name => {}
            _ => return TxValidationCode::BadPayload,
        }
        let response = &envelope.response;
        if !response.endorsement_is_valid() || !self.trusts(&response.endorsement.key) {
            return TxValidationCode::EndorsementPolicyFailure;
        }
        if let Some(read) = self.state.first_stale_read(&response.rwset.reads) {
            debug!(tx_id = %envelope.tx_id().short(), key = %read.key, "stale read");
            return TxValidationCode::MvccReadConflict;
        }
        TxValidationCode::Valid
    }
}

/// Translate a contract error into the fault reported across the wire.
pub fn fault_from(err: &LedgerError) -> ChaincodeFault {
    let kind = match err {
        LedgerError::NotFound { .. } => FaultKind::NotFound,
        LedgerError::UnknownFunction(_) | LedgerError::Arity { .. } => FaultKind::InvalidArgument,
        LedgerError::Corrupt { .. } | LedgerError::Serialization(_) | LedgerError::Store(_) => {
            FaultKind::Internal
        }
    };
    ChaincodeFault::new(kind, err.to_string())
}

impl std::fmt::Debug for ChannelLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelLedger")
            .field("name", &self.name)
            .field("chaincodes", &self.chaincodes)
            .field("height", &self.height())
            .field("keys", &self.state.len())
            .finish()
    }
}
