//! Ownership-graph resolution.
//!
//! A tree's owners are listed under `tree/_tupelo/authentications`. Each
//! entry is one of:
//!
//! - an address (`0x` + 40 hex), which owns the tree directly;
//! - a DID, delegating to that tree's own owners;
//! - a DID followed by a path, delegating to whatever addresses (or further
//!   references) that path holds in the other tree.
//!
//! A tree with no authentications is owned by the address its DID was
//! derived from. Resolution expands references until only addresses remain.
//! References are looked up at each tree's *current* tip, so the answer for
//! an unchanged tree can still change when a tree it delegates to commits.
//!
//! Delegation chains are bounded by [`ChainTreeConfig::max_ownership_depth`]
//! and a reference back into a tree already on the current chain is a cycle.
//! Both fail closed.

use std::collections::HashSet;

use chaintree_core::{Address, ContentId, Did, DID_LEN, DID_PREFIX};
use chaintree_store::BlockStore;

use crate::chaintree::layout;
use crate::config::ChainTreeConfig;
use crate::dag::resolve_path;
use crate::engine::TipSource;
use crate::error::{ChainTreeError, Result};
use crate::path::DagPath;

/// One parsed authentication entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthenticationEntry {
    Address(Address),
    Tree(Did),
    TreePath { did: Did, path: DagPath },
}

impl AuthenticationEntry {
    pub fn parse(entry: &str) -> Result<Self> {
        if !entry.starts_with(DID_PREFIX) {
            return Address::parse(entry)
                .map(Self::Address)
                .map_err(|e| ChainTreeError::InvalidAuthentication(format!("{}: {}", entry, e)));
        }

        let did_part = entry
            .get(..DID_LEN)
            .ok_or_else(|| ChainTreeError::InvalidAuthentication(format!("short DID: {}", entry)))?;
        let did = Did::parse(did_part)
            .map_err(|e| ChainTreeError::InvalidAuthentication(format!("{}: {}", entry, e)))?;

        match &entry[DID_LEN..] {
            "" => Ok(Self::Tree(did)),
            rest if rest.starts_with('/') => Ok(Self::TreePath {
                did,
                path: DagPath::parse(rest),
            }),
            _ => Err(ChainTreeError::InvalidAuthentication(format!(
                "unexpected characters after DID: {}",
                entry
            ))),
        }
    }
}

/// Read `id` at `tip`. `None` if the tree has no such field.
pub async fn read_id<S>(store: &S, tip: &ContentId) -> Result<Option<Did>>
where
    S: BlockStore + ?Sized,
{
    let resolved = resolve_path(store, tip, &DagPath::parse(layout::ID_PATH)).await?;
    let Some(value) = resolved.into_value() else {
        return Ok(None);
    };
    let text = value
        .as_str()
        .ok_or_else(|| ChainTreeError::MalformedIdentity(format!("id is not text: {:?}", value)))?;
    Did::parse(text)
        .map(Some)
        .map_err(|e| ChainTreeError::MalformedIdentity(e.to_string()))
}

/// Read the raw authentication list at `tip`. `None` if none is set.
pub async fn read_authentications<S>(
    store: &S,
    tip: &ContentId,
) -> Result<Option<Vec<String>>>
where
    S: BlockStore + ?Sized,
{
    let resolved = resolve_path(store, tip, &DagPath::parse(layout::AUTHENTICATIONS_PATH)).await?;
    match resolved.into_value() {
        None => Ok(None),
        Some(value) => value.to_string_list().map(Some).ok_or_else(|| {
            ChainTreeError::InvalidAuthentication(format!("not a list of strings: {:?}", value))
        }),
    }
}

enum Pending {
    /// Expand the authentications stored at a tree tip.
    Tip {
        tip: ContentId,
        did: Option<Did>,
    },
    /// Interpret one authentication entry.
    Entry(String),
}

struct Frame {
    pending: Pending,
    /// Trees (and tree paths) on the delegation chain leading here.
    lineage: Vec<String>,
}

/// Expands authentication entries into effective owner addresses.
pub struct OwnershipResolver<'a, S: ?Sized, T: ?Sized> {
    store: &'a S,
    tips: &'a T,
    config: &'a ChainTreeConfig,
}

impl<'a, S, T> OwnershipResolver<'a, S, T>
where
    S: BlockStore + ?Sized,
    T: TipSource + ?Sized,
{
    pub fn new(store: &'a S, tips: &'a T, config: &'a ChainTreeConfig) -> Self {
        Self {
            store,
            tips,
            config,
        }
    }

    /// Effective owners of the tree state at `tip`.
    pub async fn effective_owners(&self, tip: &ContentId) -> Result<Vec<Address>> {
        let did = read_id(self.store, tip).await?;
        let lineage = did.iter().map(|d| d.to_string()).collect();
        self.expand(Frame {
            pending: Pending::Tip { tip: *tip, did },
            lineage,
        })
        .await
    }

    /// Effective owners of a tree at its current tip.
    pub async fn effective_owners_of(&self, did: &Did) -> Result<Vec<Address>> {
        let tip = self.tip_of(did).await?;
        self.expand(Frame {
            pending: Pending::Tip {
                tip,
                did: Some(did.clone()),
            },
            lineage: vec![did.to_string()],
        })
        .await
    }

    /// Whether `address` is among the effective owners at `tip`.
    pub async fn is_authorized(&self, tip: &ContentId, address: &Address) -> Result<bool> {
        Ok(self.effective_owners(tip).await?.contains(address))
    }

    async fn tip_of(&self, did: &Did) -> Result<ContentId> {
        self.tips
            .current_tip(did)
            .await?
            .ok_or_else(|| ChainTreeError::UnknownTree(did.clone()))
    }

    fn descend(&self, lineage: &[String], key: String) -> Result<Vec<String>> {
        if lineage.contains(&key) {
            return Err(ChainTreeError::OwnershipCycle(format!(
                "{} -> {}",
                lineage.join(" -> "),
                key
            )));
        }
        // The tree being checked is the first level even when it has no id.
        let depth = lineage.len().max(1) + 1;
        if depth > self.config.max_ownership_depth {
            return Err(ChainTreeError::OwnershipDepthExceeded {
                limit: self.config.max_ownership_depth,
            });
        }
        let mut next = lineage.to_vec();
        next.push(key);
        Ok(next)
    }

    async fn expand(&self, root: Frame) -> Result<Vec<Address>> {
        let mut owners = Vec::new();
        let mut seen = HashSet::new();
        let mut stack = vec![root];

        while let Some(Frame { pending, lineage }) = stack.pop() {
            match pending {
                Pending::Tip { tip, did } => {
                    let entries = match read_authentications(self.store, &tip).await? {
                        Some(entries) => entries,
                        None => {
                            let did = match did {
                                Some(did) => did,
                                None => read_id(self.store, &tip).await?.ok_or_else(|| {
                                    ChainTreeError::MalformedIdentity(format!(
                                        "tree at {} has neither id nor authentications",
                                        tip
                                    ))
                                })?,
                            };
                            vec![did.address().to_string()]
                        }
                    };
                    // Reversed so entries are expanded in listed order.
                    stack.extend(entries.into_iter().rev().map(|entry| Frame {
                        pending: Pending::Entry(entry),
                        lineage: lineage.clone(),
                    }));
                }
                Pending::Entry(entry) => match AuthenticationEntry::parse(&entry)? {
                    AuthenticationEntry::Address(address) => {
                        if seen.insert(address.clone()) {
                            owners.push(address);
                        }
                    }
                    AuthenticationEntry::Tree(did) => {
                        let lineage = self.descend(&lineage, did.to_string())?;
                        let tip = self.tip_of(&did).await?;
                        stack.push(Frame {
                            pending: Pending::Tip {
                                tip,
                                did: Some(did),
                            },
                            lineage,
                        });
                    }
                    AuthenticationEntry::TreePath { did, path } => {
                        let lineage = self.descend(&lineage, entry.clone())?;
                        let tip = self.tip_of(&did).await?;
                        let resolved = resolve_path(self.store, &tip, &path).await?;
                        let Some(value) = resolved.into_value() else {
                            tracing::debug!(entry = %entry, "delegated path not found");
                            continue;
                        };
                        let entries = value.to_string_list().ok_or_else(|| {
                            ChainTreeError::InvalidAuthentication(format!(
                                "{} does not hold strings",
                                entry
                            ))
                        })?;
                        stack.extend(entries.into_iter().rev().map(|entry| Frame {
                            pending: Pending::Entry(entry),
                            lineage: lineage.clone(),
                        }));
                    }
                },
            }
        }

        tracing::debug!(owners = owners.len(), "ownership resolved");
        Ok(owners)
    }
}
