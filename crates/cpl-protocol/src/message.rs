use std::fmt;

use cpl_crypto::{ContentHasher, Nonce, Signature, SigningKey, VerifyingKey};
use cpl_store::ReadWriteSet;
use cpl_types::TxId;
use serde::{Deserialize, Serialize};

use crate::codec::WireCodec;
use crate::error::{ProtocolError, ProtocolResult};

pub const PROTOCOL_VERSION: u32 = 1;
pub const MAX_MESSAGE_SIZE: usize = 16 * 1024 * 1024;

/// Member identity as carried inside a proposal: the namespace (MSP) id and
/// the raw credential bytes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializedIdentity {
    pub msp_id: String,
    pub credentials: Vec<u8>,
}

impl SerializedIdentity {
    pub fn new(msp_id: impl Into<String>, credentials: Vec<u8>) -> Self {
        Self {
            msp_id: msp_id.into(),
            credentials,
        }
    }

    /// Canonical bytes used when deriving transaction ids.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.msp_id.len() + 1 + self.credentials.len());
        out.extend_from_slice(self.msp_id.as_bytes());
        out.push(0);
        out.extend_from_slice(&self.credentials);
        out
    }
}

/// A request to run a contract function.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    pub version: u32,
    pub tx_id: TxId,
    pub nonce: Nonce,
    pub channel: String,
    pub chaincode: String,
    pub function: String,
    pub args: Vec<String>,
    pub creator: SerializedIdentity,
}

impl Proposal {
    /// Build a proposal with a fresh nonce and the transaction id derived
    /// from it.
    pub fn new(
        channel: impl Into<String>,
        chaincode: impl Into<String>,
        function: impl Into<String>,
        args: Vec<String>,
        creator: SerializedIdentity,
    ) -> Self {
        let nonce = ContentHasher::nonce();
        let tx_id = ContentHasher::tx_id(&nonce, &creator.to_bytes());
        Self {
            version: PROTOCOL_VERSION,
            tx_id,
            nonce,
            channel: channel.into(),
            chaincode: chaincode.into(),
            function: function.into(),
            args,
            creator,
        }
    }

    /// `true` if `tx_id` is the one derived from this proposal's nonce and
    /// creator.
    pub fn tx_id_matches(&self) -> bool {
        ContentHasher::tx_id(&self.nonce, &self.creator.to_bytes()) == self.tx_id
    }
}

/// An encoded proposal signed by its creator.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SignedProposal {
    pub proposal_bytes: Vec<u8>,
    pub signature: Signature,
    pub signer: VerifyingKey,
}

impl SignedProposal {
    pub fn sign(proposal: &Proposal, key: &SigningKey) -> ProtocolResult<Self> {
        let proposal_bytes = WireCodec::encode(proposal)?;
        let signature = key.sign(&ContentHasher::SIGNED_PAYLOAD.hash(&proposal_bytes));
        Ok(Self {
            proposal_bytes,
            signature,
            signer: key.verifying_key(),
        })
    }

    /// Check the signature and the transaction id, then decode.
    pub fn verify(&self) -> ProtocolResult<Proposal> {
        self.signer
            .verify(
                &ContentHasher::SIGNED_PAYLOAD.hash(&self.proposal_bytes),
                &self.signature,
            )
            .map_err(|e| ProtocolError::EndorsementFailed(format!("proposal signature: {e}")))?;
        let proposal: Proposal = WireCodec::decode(&self.proposal_bytes)?;
        if !proposal.tx_id_matches() {
            return Err(ProtocolError::EndorsementFailed(format!(
                "transaction id {} does not match nonce and creator",
                proposal.tx_id.short()
            )));
        }
        Ok(proposal)
    }
}

/// A peer's signature over the simulation result.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Endorsement {
    pub endorser: String,
    pub key: VerifyingKey,
    pub signature: Signature,
}

/// Result of simulating a proposal on an endorsing peer.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProposalResponse {
    pub tx_id: TxId,
    pub payload: Vec<u8>,
    pub rwset: ReadWriteSet,
    pub endorsement: Endorsement,
}

impl ProposalResponse {
    /// Bytes covered by the endorsement signature.
    pub fn endorsed_bytes(tx_id: &TxId, payload: &[u8], rwset: &ReadWriteSet) -> ProtocolResult<Vec<u8>> {
        let rwset_bytes = WireCodec::encode(rwset)?;
        Ok(ContentHasher::ENDORSEMENT
            .hash_parts(&[tx_id.as_str().as_bytes(), payload, &rwset_bytes])
            .to_vec())
    }

    pub fn endorse(
        endorser: impl Into<String>,
        key: &SigningKey,
        tx_id: TxId,
        payload: Vec<u8>,
        rwset: ReadWriteSet,
    ) -> ProtocolResult<Self> {
        let digest = Self::endorsed_bytes(&tx_id, &payload, &rwset)?;
        Ok(Self {
            endorsement: Endorsement {
                endorser: endorser.into(),
                key: key.verifying_key(),
                signature: key.sign(&digest),
            },
            tx_id,
            payload,
            rwset,
        })
    }

    /// `true` if the endorsement signature covers this exact response.
    pub fn endorsement_is_valid(&self) -> bool {
        Self::endorsed_bytes(&self.tx_id, &self.payload, &self.rwset)
            .map(|digest| {
                self.endorsement
                    .key
                    .verify(&digest, &self.endorsement.signature)
                    .is_ok()
            })
            .unwrap_or(false)
    }
}

/// A transaction ready for ordering: the signed proposal, the endorsed
/// response, and the client's signature over both.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Envelope {
    pub proposal: SignedProposal,
    pub response: ProposalResponse,
    pub signature: Signature,
}

impl Envelope {
    fn signed_bytes(proposal: &SignedProposal, response: &ProposalResponse) -> ProtocolResult<[u8; 32]> {
        let bytes = WireCodec::encode(&(proposal, response))?;
        Ok(ContentHasher::SIGNED_PAYLOAD.hash(&bytes))
    }

    pub fn seal(
        proposal: SignedProposal,
        response: ProposalResponse,
        key: &SigningKey,
    ) -> ProtocolResult<Self> {
        let digest = Self::signed_bytes(&proposal, &response)?;
        Ok(Self {
            signature: key.sign(&digest),
            proposal,
            response,
        })
    }

    pub fn tx_id(&self) -> &TxId {
        &self.response.tx_id
    }

    /// `true` if the envelope was signed by the proposal's creator.
    pub fn creator_signature_is_valid(&self) -> bool {
        Self::signed_bytes(&self.proposal, &self.response)
            .map(|digest| self.proposal.signer.verify(&digest, &self.signature).is_ok())
            .unwrap_or(false)
    }
}

/// Validation outcome assigned to a transaction when its block commits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TxValidationCode {
    Valid,
    MvccReadConflict,
    EndorsementPolicyFailure,
    BadCreatorSignature,
    DuplicateTxId,
    BadPayload,
}

impl fmt::Display for TxValidationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Valid => "VALID",
            Self::MvccReadConflict => "MVCC_READ_CONFLICT",
            Self::EndorsementPolicyFailure => "ENDORSEMENT_POLICY_FAILURE",
            Self::BadCreatorSignature => "BAD_CREATOR_SIGNATURE",
            Self::DuplicateTxId => "DUPLICATE_TXID",
            Self::BadPayload => "BAD_PAYLOAD",
        };
        f.write_str(name)
    }
}

/// Final status of a submitted transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitStatus {
    pub tx_id: TxId,
    pub code: TxValidationCode,
    pub block_number: u64,
}

impl CommitStatus {
    pub fn is_successful(&self) -> bool {
        self.code == TxValidationCode::Valid
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn proposal() -> Proposal {
        Proposal::new(
            "mychannel",
            "carboncc",
            "TransferAsset",
            vec!["a1".into(), "buyer1".into()],
            SerializedIdentity::new("Org1MSP", b"cert".to_vec()),
        )
    }

    #[test]
    fn fresh_proposals_have_distinct_tx_ids() {
        assert_ne!(proposal().tx_id, proposal().tx_id);
        assert!(proposal().tx_id_matches());
    }

    #[test]
    fn signed_proposal_verifies() {
        let key = SigningKey::generate();
        let p = proposal();
        let signed = SignedProposal::sign(&p, &key).unwrap();
        assert_eq!(signed.verify().unwrap(), p);
    }

    #[test]
    fn tampered_proposal_fails_verification() {
        let key = SigningKey::generate();
        let mut signed = SignedProposal::sign(&proposal(), &key).unwrap();
        let last = signed.proposal_bytes.len() - 1;
        signed.proposal_bytes[last] ^= 0x01;
        assert!(matches!(signed.verify(), Err(ProtocolError::EndorsementFailed(_))));
    }

    #[test]
    fn forged_tx_id_is_rejected() {
        let key = SigningKey::generate();
        let mut p = proposal();
        p.tx_id = TxId::from_digest([9; 32]);
        let signed = SignedProposal::sign(&p, &key).unwrap();
        assert!(signed.verify().is_err());
    }

    #[test]
    fn endorsement_covers_payload() {
        let peer = SigningKey::generate();
        let mut response = ProposalResponse::endorse(
            "peer0",
            &peer,
            proposal().tx_id,
            b"farmer08".to_vec(),
            ReadWriteSet::default(),
        )
        .unwrap();
        assert!(response.endorsement_is_valid());
        response.payload = b"someone-else".to_vec();
        assert!(!response.endorsement_is_valid());
    }

    #[test]
    fn envelope_signed_by_creator() {
        let client = SigningKey::generate();
        let peer = SigningKey::generate();
        let p = proposal();
        let signed = SignedProposal::sign(&p, &client).unwrap();
        let response =
            ProposalResponse::endorse("peer0", &peer, p.tx_id.clone(), Vec::new(), ReadWriteSet::default())
                .unwrap();
        let envelope = Envelope::seal(signed, response, &client).unwrap();
        assert!(envelope.creator_signature_is_valid());
        assert_eq!(envelope.tx_id(), &p.tx_id);

        let forged = Envelope::seal(envelope.proposal.clone(), envelope.response.clone(), &peer).unwrap();
        assert!(!forged.creator_signature_is_valid());
    }

    #[test]
    fn only_valid_is_successful() {
        let status = |code| CommitStatus {
            tx_id: TxId::from_digest([1; 32]),
            code,
            block_number: 1,
        };
        assert!(status(TxValidationCode::Valid).is_successful());
        assert!(!status(TxValidationCode::MvccReadConflict).is_successful());
        assert_eq!(TxValidationCode::MvccReadConflict.to_string(), "MVCC_READ_CONFLICT");
    }
}
