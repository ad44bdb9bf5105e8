/*!
 * Error Types
 * Centralized error handling with thiserror
 */

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ResourceParseError {
    #[error("invalid memory quantity {0:?}")]
    InvalidMemoryQuantity(String),

    #[error("invalid cpu quantity {0:?}")]
    InvalidCpuQuantity(String),
}

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("node {0} not found in cache")]
    NodeNotFound(String),

    #[error("pod {0} not found in cache")]
    PodNotFound(String),

    #[error("priority class {0} not found in cache")]
    PriorityClassNotFound(String),
}

#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("dispatcher already stopped")]
    Stopped,
}

#[derive(Error, Debug)]
pub enum VolumeBindingError {
    #[error("{0}")]
    BinderError(String),

    #[error("pod {pod_name} has conflicting volume claims: {reasons}", reasons = .reasons.join(", "))]
    Conflict { pod_name: String, reasons: Vec<String> },
}

#[derive(Error, Debug)]
pub enum ContextError {
    #[error("application {0} is not found in the context")]
    ApplicationNotFound(String),

    #[error(
        "application {application_id} because it still has task in non-terminated task, tasks: {}",
        .task_aliases.join(", ")
    )]
    ApplicationHasActiveTasks {
        application_id: String,
        task_aliases: Vec<String>,
    },
}

/// Aggregated error type for the shim context. Individual components return their
/// own narrower error type; this exists for callers that bridge across component
/// boundaries (e.g. a facade method that can fail in either the cache or the
/// volume binder).
#[derive(Error, Debug)]
pub enum ShimError {
    #[error("cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("context error: {0}")]
    Context(#[from] ContextError),

    #[error("volume binding error: {0}")]
    VolumeBinding(#[from] VolumeBindingError),

    #[error("dispatch error: {0}")]
    Dispatch(#[from] DispatchError),

    #[error("resource parse error: {0}")]
    ResourceParse(#[from] ResourceParseError),

    #[error(transparent)]
    Rpc(#[from] crate::rpc::RpcError),
}

pub type Result<T> = std::result::Result<T, ShimError>;
