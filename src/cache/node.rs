/*!
 * Cached Node
 */

use crate::resources::ResourceVector;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeLifecycle {
    PendingAccept,
    Accepted,
    Draining,
    Removed,
}

#[derive(Debug, Clone)]
pub struct CachedNode {
    pub node_id: String,
    pub schedulable: ResourceVector,
    pub occupied: ResourceVector,
    pub state: NodeLifecycle,
}

impl CachedNode {
    pub fn new(node_id: impl Into<String>, schedulable: ResourceVector) -> Self {
        Self {
            node_id: node_id.into(),
            schedulable,
            occupied: ResourceVector::zero(),
            state: NodeLifecycle::PendingAccept,
        }
    }
}
