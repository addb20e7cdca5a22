use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// dense index of a node in a [`super::RouteGraph`]
#[derive(
    Debug, Default, Clone, Copy, Eq, PartialEq, PartialOrd, Ord, Deserialize, Serialize, Hash,
)]
pub struct RouteNodeId(pub usize);

impl Display for RouteNodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
