//! Walking a tree's chain of tips back towards genesis.
//!
//! Every committed tip links to its predecessor at `chain/end/previousTip`.
//! Genesis has an empty chain, which is where the walk stops.

use std::collections::HashSet;

use chaintree_core::{ContentId, Value};
use chaintree_store::BlockStore;

use crate::chaintree::layout;
use crate::config::ChainTreeConfig;
use crate::dag::resolve_path;
use crate::error::{ChainTreeError, Result};
use crate::ownership::read_authentications;
use crate::path::DagPath;

/// The authentications in force from `tip` onwards (walking backwards,
/// until the next recorded change).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnershipChange {
    pub tip: ContentId,
    pub height: Option<u64>,
    /// `None` means the tree was owned by its genesis key.
    pub authentications: Option<Vec<String>>,
}

async fn previous_tip<S>(store: &S, tip: &ContentId) -> Result<Option<ContentId>>
where
    S: BlockStore + ?Sized,
{
    let resolved = resolve_path(store, tip, &DagPath::parse(layout::PREVIOUS_TIP_PATH)).await?;
    match resolved.into_value() {
        None => Ok(None),
        Some(Value::Link(prev)) => Ok(Some(prev)),
        Some(other) => Err(ChainTreeError::MalformedChain(format!(
            "previousTip at {} is not a link: {:?}",
            tip, other
        ))),
    }
}

async fn height_at<S>(store: &S, tip: &ContentId) -> Result<Option<u64>>
where
    S: BlockStore + ?Sized,
{
    let resolved = resolve_path(store, tip, &DagPath::parse(layout::HEIGHT_PATH)).await?;
    Ok(resolved.value().and_then(Value::as_u64))
}

/// Tips from `tip` back to genesis, newest first.
pub async fn tip_history<S>(
    store: &S,
    tip: &ContentId,
    config: &ChainTreeConfig,
) -> Result<Vec<ContentId>>
where
    S: BlockStore + ?Sized,
{
    let mut tips = Vec::new();
    let mut visited = HashSet::new();
    let mut current = Some(*tip);

    while let Some(tip) = current {
        if config.max_history.is_some_and(|max| tips.len() >= max) {
            break;
        }
        if !visited.insert(tip) {
            tracing::warn!(tip = %tip, "tip repeats in chain history");
            break;
        }
        tips.push(tip);
        current = previous_tip(store, &tip).await?;
    }
    Ok(tips)
}

/// Every point in the chain, newest first, where the authentication list
/// differs from the next older tip.
pub async fn ownership_history<S>(
    store: &S,
    tip: &ContentId,
    config: &ChainTreeConfig,
) -> Result<Vec<OwnershipChange>>
where
    S: BlockStore + ?Sized,
{
    let tips = tip_history(store, tip, config).await?;
    let mut changes: Vec<OwnershipChange> = Vec::new();
    let mut last: Option<Option<Vec<String>>> = None;

    for tip in tips {
        let authentications = read_authentications(store, &tip).await?;
        if last.as_ref() == Some(&authentications) {
            // Same owners as the newer tip: the change happened further back.
            if let Some(change) = changes.last_mut() {
                change.tip = tip;
                change.height = height_at(store, &tip).await?;
            }
            continue;
        }
        changes.push(OwnershipChange {
            tip,
            height: height_at(store, &tip).await?,
            authentications: authentications.clone(),
        });
        last = Some(authentications);
    }

    tracing::debug!(changes = changes.len(), "ownership history walked");
    Ok(changes)
}
