use std::collections::HashMap;
use std::sync::Arc;

use cpl_crypto::{SigningKey, VerifyingKey};
use cpl_protocol::{
    Proposal, ProposalResponse, ProtocolError, ProtocolResult, SignedProposal,
};
use tracing::debug;

use crate::channel::ChannelLedger;
use crate::error::FabricError;

/// An endorsing and committing peer hosting one or more channels.
pub struct Peer {
    name: String,
    key: SigningKey,
    channels: HashMap<String, Arc<ChannelLedger>>,
}

impl Peer {
    pub fn new(name: impl Into<String>, key: SigningKey) -> Self {
        Self {
            name: name.into(),
            key,
            channels: HashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn verifying_key(&self) -> VerifyingKey {
        self.key.verifying_key()
    }

    /// Join a channel. The channel will accept this peer's endorsements.
    pub fn join(&mut self, channel: Arc<ChannelLedger>) {
        channel.trust_endorser(self.key.verifying_key());
        self.channels.insert(channel.name().to_string(), channel);
    }

    pub fn channel(&self, name: &str) -> Option<&Arc<ChannelLedger>> {
        self.channels.get(name)
    }

    fn open(&self, signed: &SignedProposal) -> ProtocolResult<(Proposal, &Arc<ChannelLedger>)> {
        let proposal = signed.verify()?;
        let channel = self
            .channels
            .get(&proposal.channel)
            .ok_or_else(|| FabricError::UnknownChannel(proposal.channel.clone()))?;
        Ok((proposal, channel))
    }

    /// Simulate and sign. Nothing is written to committed state.
    pub fn endorse(&self, signed: &SignedProposal) -> ProtocolResult<ProposalResponse> {
        let (proposal, channel) = self.open(signed)?;
        let (payload, rwset) = channel
            .simulate(&proposal)?
            .map_err(ProtocolError::Chaincode)?;
        debug!(
            peer = %self.name,
            tx_id = %proposal.tx_id.short(),
            function = %proposal.function,
            reads = rwset.reads.len(),
            writes = rwset.writes.len(),
            "proposal endorsed"
        );
        ProposalResponse::endorse(&self.name, &self.key, proposal.tx_id, payload, rwset)
    }

    /// Simulate and return the payload only.
    pub fn evaluate(&self, signed: &SignedProposal) -> ProtocolResult<Vec<u8>> {
        let (proposal, channel) = self.open(signed)?;
        let (payload, _) = channel
            .simulate(&proposal)?
            .map_err(ProtocolError::Chaincode)?;
        debug!(peer = %self.name, function = %proposal.function, "proposal evaluated");
        Ok(payload)
    }
}

impl std::fmt::Debug for Peer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Peer")
            .field("name", &self.name)
            .field("channels", &self.channels.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use cpl_protocol::{FaultKind, SerializedIdentity};

    use super::*;

    fn peer() -> Peer {
        let mut peer = Peer::new("peer0", SigningKey::generate());
        peer.join(Arc::new(ChannelLedger::new(
            "mychannel",
            ["carboncc".to_string()],
        )));
        peer
    }

    fn signed(channel: &str, function: &str, args: &[&str]) -> SignedProposal {
        let proposal = Proposal::new(
            channel,
            "carboncc",
            function,
            args.iter().map(|s| s.to_string()).collect(),
            SerializedIdentity::new("Org1MSP", b"cert".to_vec()),
        );
        SignedProposal::sign(&proposal, &SigningKey::generate()).unwrap()
    }

    #[test]
    fn endorse_signs_simulation() {
        let peer = peer();
        let response = peer.endorse(&signed("mychannel", "InitLedger", &[])).unwrap();
        assert!(response.endorsement_is_valid());
        assert_eq!(response.endorsement.key, peer.verifying_key());
        assert_eq!(response.rwset.writes.len(), 4);
        // endorsement leaves committed state untouched
        assert!(peer.channel("mychannel").unwrap().state().is_empty());
    }

    #[test]
    fn evaluate_surfaces_chaincode_fault() {
        let peer = peer();
        let err = peer
            .evaluate(&signed("mychannel", "ReadAsset", &["nope"]))
            .unwrap_err();
        match err {
            ProtocolError::Chaincode(fault) => assert_eq!(fault.kind, FaultKind::NotFound),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn unknown_channel_fails_endorsement() {
        let peer = peer();
        let err = peer.endorse(&signed("other", "GetAllAssets", &[])).unwrap_err();
        assert!(matches!(err, ProtocolError::EndorsementFailed(_)));
    }

    #[test]
    fn tampered_proposal_rejected() {
        let peer = peer();
        let mut sp = signed("mychannel", "GetAllAssets", &[]);
        sp.proposal_bytes.push(0);
        assert!(peer.evaluate(&sp).is_err());
    }
}
