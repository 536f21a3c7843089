/// How many nodes must have persisted a write to disk before it is
/// acknowledged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PersistTo {
    /// No persistence requirement.
    #[default]
    None,
    /// The active node only.
    Master,
    One,
    Two,
    Three,
    Four,
}

impl PersistTo {
    /// Number of nodes that must hold a persisted copy.
    pub fn nodes_required(&self) -> u32 {
        match self {
            PersistTo::None => 0,
            PersistTo::Master | PersistTo::One => 1,
            PersistTo::Two => 2,
            PersistTo::Three => 3,
            PersistTo::Four => 4,
        }
    }
}

/// How many replicas must hold a write in memory before it is acknowledged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReplicateTo {
    /// No replication requirement.
    #[default]
    None,
    One,
    Two,
    Three,
}

impl ReplicateTo {
    /// Number of replicas that must hold a copy.
    pub fn replicas_required(&self) -> u32 {
        match self {
            ReplicateTo::None => 0,
            ReplicateTo::One => 1,
            ReplicateTo::Two => 2,
            ReplicateTo::Three => 3,
        }
    }
}
