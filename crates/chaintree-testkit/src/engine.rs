//! An in-process signing engine.
//!
//! [`LocalEngine`] plays the notary role for tests: it keeps the current tip
//! of every tree it has seen, checks that the signer is an effective owner,
//! applies transactions to the tree node and signs the resulting tip with
//! its own key. It has no network, no consensus and no persistence beyond
//! the store it is handed.

use std::collections::HashMap;

use async_trait::async_trait;
use chaintree::ownership::read_id;
use chaintree::transactions::{
    EstablishTokenPayload, MintTokenPayload, SendTokenPayload, SetDataPayload,
};
use chaintree::{
    canonical_token_name, ChainTreeConfig, ChainTreeError, OwnershipResolver, Proof, Result,
    SigningEngine, TipSource, Transaction,
};
use chaintree_core::{Address, ContentId, Did, Ed25519PublicKey, Keypair, Node, Value};
use chaintree_store::{BlockStore, StoreExt};
use tokio::sync::RwLock;

fn engine_error(msg: impl Into<String>) -> ChainTreeError {
    ChainTreeError::Engine(msg.into())
}

/// A single-process notary that signs every valid commit.
pub struct LocalEngine {
    notary: Keypair,
    tips: RwLock<HashMap<Did, Proof>>,
    config: ChainTreeConfig,
}

impl Default for LocalEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalEngine {
    pub fn new() -> Self {
        Self::with_notary(Keypair::generate())
    }

    pub fn with_notary(notary: Keypair) -> Self {
        Self {
            notary,
            tips: RwLock::new(HashMap::new()),
            config: ChainTreeConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ChainTreeConfig) -> Self {
        self.config = config;
        self
    }

    /// The key proofs are signed with.
    pub fn notary_key(&self) -> Ed25519PublicKey {
        self.notary.public_key()
    }

    /// Number of trees this engine tracks.
    pub async fn tree_count(&self) -> usize {
        self.tips.read().await.len()
    }
}

#[async_trait]
impl TipSource for LocalEngine {
    async fn current_tip(&self, did: &Did) -> Result<Option<ContentId>> {
        Ok(self.tips.read().await.get(did).map(|p| p.tip))
    }
}

#[async_trait]
impl<S> SigningEngine<S> for LocalEngine
where
    S: BlockStore + ?Sized,
{
    async fn new_empty_tree(&self, store: &S, public_key: &Ed25519PublicKey) -> Result<ContentId> {
        let did = Did::from_public_key(public_key);
        let tree = store.put_node(&Node::new()).await?;
        let chain = store.put_node(&Node::new()).await?;
        let tip = store
            .put_node(&root_node(&did, 0, tree, chain))
            .await?;

        let mut tips = self.tips.write().await;
        match tips.get(&did).map(|p| p.tip) {
            Some(existing) if existing != tip => {
                return Err(engine_error(format!("{} already has commits", did)));
            }
            Some(_) => {}
            None => {
                tips.insert(did.clone(), Proof::sign(&self.notary, did.clone(), tip, 0));
            }
        }
        tracing::debug!(did = %did, tip = %tip, "genesis registered");
        Ok(tip)
    }

    async fn play_transactions(
        &self,
        store: &S,
        tip: &ContentId,
        signer: &Keypair,
        transactions: &[Transaction],
    ) -> Result<Proof> {
        let did = read_id(store, tip)
            .await?
            .ok_or_else(|| engine_error(format!("no id at {}", tip)))?;

        // Held until the new tip is recorded so commits to one engine are serialized.
        let mut tips = self.tips.write().await;
        let current = tips
            .get(&did)
            .ok_or_else(|| ChainTreeError::UnknownTree(did.clone()))?;
        if current.tip != *tip {
            return Err(engine_error(format!(
                "stale tip {} for {}, current is {}",
                tip, did, current.tip
            )));
        }

        let snapshot: HashMap<Did, ContentId> =
            tips.iter().map(|(d, p)| (d.clone(), p.tip)).collect();
        let signer_address = Address::from_public_key(&signer.public_key());
        let authorized = OwnershipResolver::new(store, &snapshot, &self.config)
            .is_authorized(tip, &signer_address)
            .await?;
        if !authorized {
            return Err(engine_error(format!(
                "{} is not an owner of {}",
                signer_address, did
            )));
        }

        let root = store.get_node(tip).await?;
        let height = root.get("height").and_then(Value::as_u64).unwrap_or(0) + 1;
        let tree_id = root
            .get("tree")
            .and_then(Value::as_link)
            .ok_or_else(|| engine_error(format!("no tree link at {}", tip)))?;
        let mut tree = store.get_node(tree_id).await?;

        for tx in transactions {
            apply(&mut tree, &did, tx)?;
        }

        let tree = store.put_node(&tree).await?;
        let block = store
            .put_node(&Node::from([
                ("previousTip".to_owned(), Value::Link(*tip)),
                ("height".to_owned(), Value::from(height)),
                (
                    "transactions".to_owned(),
                    Value::List(transactions.iter().map(Transaction::to_value).collect()),
                ),
            ]))
            .await?;
        let chain = store
            .put_node(&Node::from([("end".to_owned(), Value::Link(block))]))
            .await?;
        let new_tip = store
            .put_node(&root_node(&did, height, tree, chain))
            .await?;

        let proof = Proof::sign(&self.notary, did.clone(), new_tip, height);
        tips.insert(did, proof.clone());
        tracing::debug!(tip = %new_tip, height, "commit signed");
        Ok(proof)
    }

    async fn get_tip(&self, did: &Did) -> Result<Proof> {
        self.tips
            .read()
            .await
            .get(did)
            .cloned()
            .ok_or_else(|| ChainTreeError::UnknownTree(did.clone()))
    }

    async fn verify_proof(&self, proof: &Proof) -> Result<bool> {
        Ok(proof.signer == self.notary.public_key() && proof.signature_is_valid())
    }
}

fn root_node(did: &Did, height: u64, tree: ContentId, chain: ContentId) -> Node {
    Node::from([
        ("id".to_owned(), Value::from(did.as_str())),
        ("height".to_owned(), Value::from(height)),
        ("tree".to_owned(), Value::Link(tree)),
        ("chain".to_owned(), Value::Link(chain)),
    ])
}

/// The map at `key` inside `node`, created if absent.
fn map_entry<'a>(node: &'a mut Node, key: &str) -> Result<&'a mut Node> {
    match node
        .entry(key.to_owned())
        .or_insert_with(|| Value::Map(Node::new()))
    {
        Value::Map(m) => Ok(m),
        other => Err(engine_error(format!(
            "cannot write below {}: holds {:?}",
            key, other
        ))),
    }
}

fn token_entry<'a>(tree: &'a mut Node, name: &str) -> Result<&'a mut Node> {
    let tokens = map_entry(map_entry(tree, "_tupelo")?, "tokens")?;
    match tokens.get_mut(name) {
        Some(Value::Map(token)) => Ok(token),
        _ => Err(engine_error(format!("unknown token {}", name))),
    }
}

fn balance(token: &Node) -> u64 {
    token.get("balance").and_then(Value::as_u64).unwrap_or(0)
}

fn apply(tree: &mut Node, did: &Did, tx: &Transaction) -> Result<()> {
    match tx {
        Transaction::SetData(SetDataPayload { path, value }) => {
            let path = chaintree::DagPath::parse(path);
            let Some((last, parents)) = path.segments().split_last() else {
                return Err(engine_error("set data needs a non-empty path"));
            };
            let mut target = map_entry(tree, "data")?;
            for segment in parents {
                target = map_entry(target, segment)?;
            }
            target.insert(last.clone(), value.clone());
        }
        Transaction::SetOwnership(p) => {
            map_entry(tree, "_tupelo")?.insert(
                "authentications".to_owned(),
                Value::from(p.authentication.clone()),
            );
        }
        Transaction::EstablishToken(EstablishTokenPayload { name, max_supply }) => {
            let name = canonical_token_name(did, name);
            let tokens = map_entry(map_entry(tree, "_tupelo")?, "tokens")?;
            if tokens.contains_key(&name) {
                return Err(engine_error(format!("token {} already established", name)));
            }
            tokens.insert(
                name,
                Value::Map(Node::from([
                    (
                        "monetaryPolicy".to_owned(),
                        Value::Map(Node::from([(
                            "maximum".to_owned(),
                            Value::from(*max_supply),
                        )])),
                    ),
                    ("balance".to_owned(), Value::from(0u64)),
                ])),
            );
        }
        Transaction::MintToken(MintTokenPayload { name, amount }) => {
            let name = canonical_token_name(did, name);
            let token = token_entry(tree, &name)?;
            let maximum = token
                .get("monetaryPolicy")
                .and_then(|p| p.child("maximum"))
                .and_then(Value::as_u64)
                .unwrap_or(0);
            let minted = balance(token)
                .checked_add(*amount)
                .ok_or_else(|| engine_error("mint overflows"))?;
            // A zero maximum means unlimited supply.
            if maximum > 0 && minted > maximum {
                return Err(engine_error(format!(
                    "minting {} of {} exceeds maximum {}",
                    amount, name, maximum
                )));
            }
            token.insert("balance".to_owned(), Value::from(minted));
        }
        Transaction::SendToken(SendTokenPayload {
            id,
            name,
            amount,
            destination,
        }) => {
            Did::parse(destination)
                .map_err(|e| engine_error(format!("bad destination: {}", e)))?;
            let token = token_entry(tree, name)?;
            let remaining = balance(token)
                .checked_sub(*amount)
                .ok_or_else(|| engine_error(format!("insufficient balance of {}", name)))?;
            let sends = map_entry(token, "sends")?;
            if sends.contains_key(id) {
                return Err(engine_error(format!("duplicate send id {}", id)));
            }
            sends.insert(
                id.clone(),
                Value::Map(Node::from([
                    ("amount".to_owned(), Value::from(*amount)),
                    ("destination".to_owned(), Value::from(destination.as_str())),
                ])),
            );
            token.insert("balance".to_owned(), Value::from(remaining));
        }
        Transaction::ReceiveToken(_) => {
            return Err(engine_error(
                "receiving tokens requires a notary group and is not supported locally",
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chaintree::{
        establish_token_transaction, layout, mint_token_transaction, resolve_path,
        send_token_transaction, set_data_transaction, DagPath,
    };
    use chaintree_store::MemoryStore;

    /// A tree holding 10 minted units of `coin`.
    async fn funded_tree(
        store: &MemoryStore,
        engine: &LocalEngine,
        kp: &Keypair,
    ) -> (Proof, String) {
        let genesis = engine.new_empty_tree(store, &kp.public_key()).await.unwrap();
        let proof = engine
            .play_transactions(
                store,
                &genesis,
                kp,
                &[
                    establish_token_transaction("coin", 0),
                    mint_token_transaction("coin", 10),
                ],
            )
            .await
            .unwrap();
        let name = canonical_token_name(&Did::from_public_key(&kp.public_key()), "coin");
        (proof, name)
    }

    async fn token_field(
        store: &MemoryStore,
        tip: &ContentId,
        name: &str,
        field: &str,
    ) -> Option<Value> {
        let path = DagPath::parse(&format!("{}/{}/{}", layout::TOKENS_PATH, name, field));
        resolve_path(store, tip, &path).await.unwrap().into_value()
    }

    #[tokio::test]
    async fn test_genesis_is_registered_and_idempotent() {
        let store = MemoryStore::new();
        let engine = LocalEngine::new();
        let kp = Keypair::from_seed(&[1; 32]);

        let tip = engine.new_empty_tree(&store, &kp.public_key()).await.unwrap();
        let again = engine.new_empty_tree(&store, &kp.public_key()).await.unwrap();
        assert_eq!(tip, again);

        let did = Did::from_public_key(&kp.public_key());
        assert_eq!(engine.current_tip(&did).await.unwrap(), Some(tip));
        let proof = SigningEngine::<MemoryStore>::get_tip(&engine, &did).await.unwrap();
        assert_eq!(proof.height, 0);
        assert!(SigningEngine::<MemoryStore>::verify_proof(&engine, &proof).await.unwrap());
    }

    #[tokio::test]
    async fn test_stale_tip_rejected() {
        let store = MemoryStore::new();
        let engine = LocalEngine::new();
        let kp = Keypair::from_seed(&[2; 32]);
        let genesis = engine.new_empty_tree(&store, &kp.public_key()).await.unwrap();

        engine
            .play_transactions(&store, &genesis, &kp, &[set_data_transaction("a", 1u64)])
            .await
            .unwrap();
        let err = engine
            .play_transactions(&store, &genesis, &kp, &[set_data_transaction("a", 2u64)])
            .await
            .unwrap_err();
        assert!(matches!(err, ChainTreeError::Engine(_)));
    }

    #[tokio::test]
    async fn test_mint_respects_maximum() {
        let store = MemoryStore::new();
        let engine = LocalEngine::new();
        let kp = Keypair::from_seed(&[3; 32]);
        let genesis = engine.new_empty_tree(&store, &kp.public_key()).await.unwrap();

        let proof = engine
            .play_transactions(
                &store,
                &genesis,
                &kp,
                &[
                    establish_token_transaction("coin", 10),
                    mint_token_transaction("coin", 7),
                ],
            )
            .await
            .unwrap();
        let err = engine
            .play_transactions(&store, &proof.tip, &kp, &[mint_token_transaction("coin", 4)])
            .await
            .unwrap_err();
        assert!(matches!(err, ChainTreeError::Engine(_)));
    }

    #[tokio::test]
    async fn test_foreign_proof_not_verified() {
        let store = MemoryStore::new();
        let engine = LocalEngine::new();
        let other = LocalEngine::new();
        let kp = Keypair::from_seed(&[4; 32]);
        other.new_empty_tree(&store, &kp.public_key()).await.unwrap();

        let did = Did::from_public_key(&kp.public_key());
        let proof = SigningEngine::<MemoryStore>::get_tip(&other, &did).await.unwrap();
        assert!(!SigningEngine::<MemoryStore>::verify_proof(&engine, &proof).await.unwrap());
    }

    #[tokio::test]
    async fn test_send_debits_balance_and_records_send() {
        let store = MemoryStore::new();
        let engine = LocalEngine::new();
        let kp = Keypair::from_seed(&[5; 32]);
        let (funded, name) = funded_tree(&store, &engine, &kp).await;
        let to = Did::from_public_key(&Keypair::from_seed(&[6; 32]).public_key());

        let proof = engine
            .play_transactions(
                &store,
                &funded.tip,
                &kp,
                &[send_token_transaction("send-1", name.as_str(), 4, &to)],
            )
            .await
            .unwrap();

        assert_eq!(
            token_field(&store, &proof.tip, &name, "balance").await,
            Some(Value::from(6u64))
        );
        assert_eq!(
            token_field(&store, &proof.tip, &name, "sends/send-1/amount").await,
            Some(Value::from(4u64))
        );
        assert_eq!(
            token_field(&store, &proof.tip, &name, "sends/send-1/destination").await,
            Some(Value::from(to.as_str()))
        );
    }

    #[tokio::test]
    async fn test_send_rejects_overdraft() {
        let store = MemoryStore::new();
        let engine = LocalEngine::new();
        let kp = Keypair::from_seed(&[7; 32]);
        let (funded, name) = funded_tree(&store, &engine, &kp).await;
        let to = Did::from_public_key(&Keypair::from_seed(&[8; 32]).public_key());

        let err = engine
            .play_transactions(
                &store,
                &funded.tip,
                &kp,
                &[send_token_transaction("send-1", name.as_str(), 11, &to)],
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ChainTreeError::Engine(_)));

        // Nothing was committed.
        let did = Did::from_public_key(&kp.public_key());
        assert_eq!(engine.current_tip(&did).await.unwrap(), Some(funded.tip));
        assert_eq!(
            token_field(&store, &funded.tip, &name, "balance").await,
            Some(Value::from(10u64))
        );
    }

    #[tokio::test]
    async fn test_send_rejects_duplicate_id() {
        let store = MemoryStore::new();
        let engine = LocalEngine::new();
        let kp = Keypair::from_seed(&[9; 32]);
        let (funded, name) = funded_tree(&store, &engine, &kp).await;
        let to = Did::from_public_key(&Keypair::from_seed(&[10; 32]).public_key());

        let sent = engine
            .play_transactions(
                &store,
                &funded.tip,
                &kp,
                &[send_token_transaction("send-1", name.as_str(), 1, &to)],
            )
            .await
            .unwrap();
        let err = engine
            .play_transactions(
                &store,
                &sent.tip,
                &kp,
                &[send_token_transaction("send-1", name.as_str(), 1, &to)],
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ChainTreeError::Engine(_)));
        assert_eq!(
            token_field(&store, &sent.tip, &name, "balance").await,
            Some(Value::from(9u64))
        );
    }

    #[tokio::test]
    async fn test_send_rejects_bad_destination() {
        let store = MemoryStore::new();
        let engine = LocalEngine::new();
        let kp = Keypair::from_seed(&[11; 32]);
        let (funded, name) = funded_tree(&store, &engine, &kp).await;

        let send = Transaction::SendToken(SendTokenPayload {
            id: "send-1".to_owned(),
            name,
            amount: 1,
            destination: "did:tupelo:nothex".to_owned(),
        });
        let err = engine
            .play_transactions(&store, &funded.tip, &kp, &[send])
            .await
            .unwrap_err();
        assert!(matches!(err, ChainTreeError::Engine(_)));
    }
}
