/*!
 * Scheduling-Core RPC Sink
 * The scheduling-core RPC transport is an opaque sink/source: the
 * wire protocol and retry/transport behavior live outside this crate. This
 * module only defines the request shapes and the trait boundary the Context
 * proxies through; transient failures are retried by the transport layer and
 * are never surfaced to callers.
 */

use thiserror::Error;

use crate::resources::ResourceVector;

#[derive(Error, Debug, Clone)]
#[error("scheduling-core rpc error: {0}")]
pub struct RpcError(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeAction {
    Register,
    CreateDrain,
    DrainToSchedulable,
    Update,
    Decommission,
}

#[derive(Debug, Clone)]
pub struct NodeUpdateEntry {
    pub node_id: String,
    pub action: NodeAction,
    pub schedulable_resource: ResourceVector,
    pub occupied_resource: ResourceVector,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateNodeRequest {
    pub nodes: Vec<NodeUpdateEntry>,
}

#[derive(Debug, Clone)]
pub struct AllocationAsk {
    pub application_id: String,
    pub task_id: String,
    pub allocation_key: String,
    pub node_id: Option<String>,
    pub resource_ask: ResourceVector,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateAllocationRequest {
    pub allocations: Vec<AllocationAsk>,
}

#[derive(Debug, Clone)]
pub struct ApplicationRegistration {
    pub application_id: String,
    pub queue: String,
    pub user: String,
    pub groups: Vec<String>,
    pub tags: std::collections::BTreeMap<String, String>,
}

/// Outbound RPC boundary to the external scheduling core. `Send + Sync` so it
/// can be shared across informer callback threads behind an `Arc`.
#[cfg_attr(test, mockall::automock)]
pub trait SchedulingCoreClient: Send + Sync {
    fn register_application(&self, req: ApplicationRegistration) -> Result<(), RpcError>;
    fn update_node(&self, req: UpdateNodeRequest) -> Result<(), RpcError>;
    fn update_allocation(&self, req: UpdateAllocationRequest) -> Result<(), RpcError>;
}
