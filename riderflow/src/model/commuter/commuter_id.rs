use serde::{Deserialize, Serialize};
use std::{
    fmt::Display,
    sync::atomic::{AtomicU64, Ordering},
};

static NEXT_COMMUTER_ID: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CommuterId(pub u64);

impl CommuterId {
    /// a process-unique commuter identifier
    pub fn next() -> CommuterId {
        CommuterId(NEXT_COMMUTER_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl Display for CommuterId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
