//! Configuration for ChainTree traversal limits.

/// Configuration for ownership resolution and history walks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainTreeConfig {
    /// How many trees deep ownership indirection may go before failing
    /// closed. The tree being checked counts as the first level.
    pub max_ownership_depth: usize,
    /// Upper bound on tips visited by history walks. `None` walks to genesis.
    pub max_history: Option<usize>,
}

impl ChainTreeConfig {
    pub fn with_max_ownership_depth(mut self, depth: usize) -> Self {
        self.max_ownership_depth = depth;
        self
    }

    pub fn with_max_history(mut self, tips: usize) -> Self {
        self.max_history = Some(tips);
        self
    }
}

impl Default for ChainTreeConfig {
    fn default() -> Self {
        Self {
            max_ownership_depth: 8,
            max_history: None,
        }
    }
}
