//! The signing engine boundary.
//!
//! A ChainTree never validates or signs its own transactions. It hands them
//! to a [`SigningEngine`], which decides whether the signer may commit, builds
//! the new tip, and answers with a [`Proof`]. The engine is also the source
//! of truth for every tree's current tip, which ownership resolution needs to
//! follow references into other trees.

use std::collections::HashMap;

use async_trait::async_trait;
use chaintree_core::{ContentId, Did, Ed25519PublicKey, Ed25519Signature, Keypair};
use chaintree_store::BlockStore;

use crate::error::Result;
use crate::transactions::Transaction;

const PROOF_DOMAIN: &[u8] = b"chaintree-proof-v0:";

/// An engine's attestation that `tip` is the current state of `did`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Proof {
    pub did: Did,
    pub tip: ContentId,
    pub height: u64,
    /// Key the engine signed with.
    pub signer: Ed25519PublicKey,
    pub signature: Ed25519Signature,
}

impl Proof {
    /// The bytes an engine signs for a `(did, tip, height)` triple.
    pub fn signing_message(did: &Did, tip: &ContentId, height: u64) -> Vec<u8> {
        let mut msg = Vec::with_capacity(PROOF_DOMAIN.len() + did.as_str().len() + 40);
        msg.extend_from_slice(PROOF_DOMAIN);
        msg.extend_from_slice(did.as_str().as_bytes());
        msg.extend_from_slice(tip.as_bytes());
        msg.extend_from_slice(&height.to_be_bytes());
        msg
    }

    /// Sign a new proof.
    pub fn sign(keypair: &Keypair, did: Did, tip: ContentId, height: u64) -> Self {
        let signature = keypair.sign(&Self::signing_message(&did, &tip, height));
        Self {
            did,
            tip,
            height,
            signer: keypair.public_key(),
            signature,
        }
    }

    /// Whether the signature matches the embedded signer key.
    ///
    /// This says nothing about whether the signer is trusted.
    pub fn signature_is_valid(&self) -> bool {
        self.signer
            .verify(
                &Self::signing_message(&self.did, &self.tip, self.height),
                &self.signature,
            )
            .is_ok()
    }
}

/// Lookup of the current tip of any tree by DID.
#[async_trait]
pub trait TipSource: Send + Sync {
    /// `None` if the tree is unknown.
    async fn current_tip(&self, did: &Did) -> Result<Option<ContentId>>;
}

#[async_trait]
impl TipSource for HashMap<Did, ContentId> {
    async fn current_tip(&self, did: &Did) -> Result<Option<ContentId>> {
        Ok(self.get(did).copied())
    }
}

#[async_trait]
impl<T: TipSource + ?Sized> TipSource for std::sync::Arc<T> {
    async fn current_tip(&self, did: &Did) -> Result<Option<ContentId>> {
        (**self).current_tip(did).await
    }
}

/// An external notary that validates and signs transactions.
#[async_trait]
pub trait SigningEngine<S: BlockStore + ?Sized>: TipSource {
    /// Write a genesis tree owned by `public_key` and return its tip.
    async fn new_empty_tree(&self, store: &S, public_key: &Ed25519PublicKey) -> Result<ContentId>;

    /// Apply `transactions` to the tree at `tip` on behalf of `signer`.
    ///
    /// The returned proof names the new tip. On error nothing is committed.
    async fn play_transactions(
        &self,
        store: &S,
        tip: &ContentId,
        signer: &Keypair,
        transactions: &[Transaction],
    ) -> Result<Proof>;

    /// The latest proof for a tree.
    async fn get_tip(&self, did: &Did) -> Result<Proof>;

    /// Whether this engine would stand behind `proof`.
    async fn verify_proof(&self, proof: &Proof) -> Result<bool>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_proof_signature() {
        let kp = Keypair::from_seed(&[7; 32]);
        let did = Did::from_public_key(&kp.public_key());
        let proof = Proof::sign(&kp, did, ContentId::for_bytes(b"tip"), 3);
        assert!(proof.signature_is_valid());

        let mut forged = proof.clone();
        forged.height = 4;
        assert!(!forged.signature_is_valid());
    }

    #[tokio::test]
    async fn test_map_tip_source() {
        let did = Did::from_public_key(&Keypair::from_seed(&[1; 32]).public_key());
        let other = Did::from_public_key(&Keypair::from_seed(&[2; 32]).public_key());
        let tip = ContentId::for_bytes(b"x");
        let tips = HashMap::from([(did.clone(), tip)]);

        assert_eq!(tips.current_tip(&did).await.unwrap(), Some(tip));
        assert_eq!(tips.current_tip(&other).await.unwrap(), None);
    }
}
