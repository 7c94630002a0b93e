//! The ChainTree handle: a DAG with an identity.
//!
//! A ChainTree is a [`Dag`] whose root follows a fixed layout:
//!
//! ```text
//! root  { id: "did:tupelo:0x..", height, tree: -> Tree, chain: -> Chain }
//! Tree  { data: {..}, _tupelo: { authentications: [..], tokens: {..} } }
//! Chain { end: -> { previousTip: -> root, height, transactions: [..] } }
//! ```
//!
//! The handle owns nothing but its tip, an optional signing key and its
//! config. Commits go through a [`SigningEngine`]; the tip only moves when
//! the engine returns a proof.

use std::sync::Arc;

use chaintree_core::{Address, ContentId, Did, Ed25519PublicKey, Keypair};
use chaintree_store::BlockStore;

use crate::config::ChainTreeConfig;
use crate::dag::{Dag, Resolved};
use crate::engine::{Proof, SigningEngine, TipSource};
use crate::error::{ChainTreeError, Result};
use crate::history::{self, OwnershipChange};
use crate::ownership::{self, OwnershipResolver};
use crate::path::DagPath;
use crate::transactions::Transaction;

/// Well-known paths in a ChainTree root.
pub mod layout {
    pub const ID_PATH: &str = "id";
    pub const HEIGHT_PATH: &str = "height";
    pub const TREE_PATH: &str = "tree";
    pub const DATA_PATH: &str = "tree/data";
    pub const AUTHENTICATIONS_PATH: &str = "tree/_tupelo/authentications";
    pub const TOKENS_PATH: &str = "tree/_tupelo/tokens";
    pub const CHAIN_END_PATH: &str = "chain/end";
    pub const PREVIOUS_TIP_PATH: &str = "chain/end/previousTip";
}

/// The key a handle acts with.
///
/// Without the private half the handle can read and verify but not commit.
#[derive(Debug, Clone)]
pub struct TreeKey {
    public_key: Ed25519PublicKey,
    keypair: Option<Keypair>,
}

impl TreeKey {
    pub fn public_only(public_key: Ed25519PublicKey) -> Self {
        Self {
            public_key,
            keypair: None,
        }
    }

    pub fn public_key(&self) -> &Ed25519PublicKey {
        &self.public_key
    }

    pub fn keypair(&self) -> Option<&Keypair> {
        self.keypair.as_ref()
    }

    /// Address derived from the public key.
    pub fn address(&self) -> Address {
        Address::from_public_key(&self.public_key)
    }
}

impl From<Keypair> for TreeKey {
    fn from(keypair: Keypair) -> Self {
        Self {
            public_key: keypair.public_key(),
            keypair: Some(keypair),
        }
    }
}

impl From<Ed25519PublicKey> for TreeKey {
    fn from(public_key: Ed25519PublicKey) -> Self {
        Self::public_only(public_key)
    }
}

/// A handle on one ChainTree.
pub struct ChainTree<S> {
    dag: Dag<S>,
    key: Option<TreeKey>,
    config: ChainTreeConfig,
}

impl<S> Clone for ChainTree<S> {
    fn clone(&self) -> Self {
        Self {
            dag: self.dag.clone(),
            key: self.key.clone(),
            config: self.config.clone(),
        }
    }
}

impl<S: BlockStore> ChainTree<S> {
    /// Wrap an existing tip.
    pub fn new(tip: ContentId, store: Arc<S>, key: Option<TreeKey>) -> Self {
        Self::with_config(tip, store, key, ChainTreeConfig::default())
    }

    pub fn with_config(
        tip: ContentId,
        store: Arc<S>,
        key: Option<TreeKey>,
        config: ChainTreeConfig,
    ) -> Self {
        Self {
            dag: Dag::new(tip, store),
            key,
            config,
        }
    }

    /// Ask `engine` for a genesis tree owned by `key`.
    pub async fn new_empty_tree<E>(engine: &E, store: Arc<S>, key: impl Into<TreeKey>) -> Result<Self>
    where
        E: SigningEngine<S> + ?Sized,
    {
        let key = key.into();
        let tip = engine.new_empty_tree(store.as_ref(), key.public_key()).await?;
        tracing::debug!(tip = %tip, "created empty tree");
        Ok(Self::new(tip, store, Some(key)))
    }

    /// Adopt a proof obtained from an engine, e.g. via `get_tip`.
    pub fn from_proof(proof: &Proof, store: Arc<S>, key: Option<TreeKey>) -> Self {
        Self::new(proof.tip, store, key)
    }

    pub fn tip(&self) -> &ContentId {
        self.dag.tip()
    }

    pub fn dag(&self) -> &Dag<S> {
        &self.dag
    }

    pub fn store(&self) -> &Arc<S> {
        self.dag.store()
    }

    pub fn config(&self) -> &ChainTreeConfig {
        &self.config
    }

    pub fn key(&self) -> Option<&TreeKey> {
        self.key.as_ref()
    }

    /// Act as a different identity. Stored ownership is untouched.
    pub fn set_key(&mut self, key: impl Into<TreeKey>) {
        self.key = Some(key.into());
    }

    pub fn clear_key(&mut self) {
        self.key = None;
    }

    pub async fn resolve(&self, path: impl Into<DagPath>) -> Result<Resolved> {
        self.dag.resolve(path).await
    }

    pub async fn resolve_at(&self, root: &ContentId, path: impl Into<DagPath>) -> Result<Resolved> {
        self.dag.resolve_at(root, path).await
    }

    /// Resolve a path relative to `tree/data`.
    pub async fn resolve_data(&self, path: impl Into<DagPath>) -> Result<Resolved> {
        let path = DagPath::parse(layout::DATA_PATH).join(&path.into());
        self.dag.resolve(path).await
    }

    /// The tree's DID, if it has an `id` field.
    pub async fn id(&self) -> Result<Option<Did>> {
        ownership::read_id(self.store().as_ref(), self.tip()).await
    }

    pub async fn require_id(&self) -> Result<Did> {
        self.id()
            .await?
            .ok_or_else(|| ChainTreeError::MalformedIdentity(format!("no id at {}", self.tip())))
    }

    /// The raw authentication entries, `None` if never set.
    pub async fn authentications(&self) -> Result<Option<Vec<String>>> {
        ownership::read_authentications(self.store().as_ref(), self.tip()).await
    }

    /// Commit `transactions` through `engine` with the attached private key.
    ///
    /// The tip moves only if the engine accepts.
    pub async fn play_transactions<E>(
        &mut self,
        engine: &E,
        transactions: &[Transaction],
    ) -> Result<Proof>
    where
        E: SigningEngine<S> + ?Sized,
    {
        let signer = self
            .key
            .as_ref()
            .and_then(TreeKey::keypair)
            .ok_or(ChainTreeError::MissingSigningKey)?;

        let proof = engine
            .play_transactions(self.store().as_ref(), self.tip(), signer, transactions)
            .await?;

        tracing::debug!(
            from = %self.tip(),
            to = %proof.tip,
            height = proof.height,
            transactions = transactions.len(),
            "transactions committed"
        );
        self.dag.set_tip(proof.tip);
        Ok(proof)
    }

    /// Move to the tip named by `proof`.
    pub fn apply_proof(&mut self, proof: &Proof) {
        self.dag.set_tip(proof.tip);
    }

    /// Effective owner addresses at the current tip.
    pub async fn effective_owners<T>(&self, tips: &T) -> Result<Vec<Address>>
    where
        T: TipSource + ?Sized,
    {
        OwnershipResolver::new(self.store().as_ref(), tips, &self.config)
            .effective_owners(self.tip())
            .await
    }

    pub async fn is_authorized<T>(&self, tips: &T, address: &Address) -> Result<bool>
    where
        T: TipSource + ?Sized,
    {
        OwnershipResolver::new(self.store().as_ref(), tips, &self.config)
            .is_authorized(self.tip(), address)
            .await
    }

    /// Tips from the current one back to genesis.
    pub async fn tip_history(&self) -> Result<Vec<ContentId>> {
        history::tip_history(self.store().as_ref(), self.tip(), &self.config).await
    }

    /// Authentication changes from the current tip back to genesis.
    pub async fn ownership_history(&self) -> Result<Vec<OwnershipChange>> {
        history::ownership_history(self.store().as_ref(), self.tip(), &self.config).await
    }
}

impl<S> std::fmt::Debug for ChainTree<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainTree")
            .field("tip", self.dag.tip())
            .field("key", &self.key)
            .finish()
    }
}
