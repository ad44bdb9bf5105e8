/*!
 * Scheduler Shim Context
 * In-process scheduling shim between a cluster orchestrator and an external
 * scheduling core: caches orchestrator objects, runs per-task and
 * per-application state machines, and proxies allocation decisions through a
 * scheduling-core RPC boundary.
 */

pub mod application;
pub mod cache;
pub mod config;
pub mod context;
pub mod dispatcher;
pub mod errors;
pub mod event_recorder;
pub mod namespace_quota;
pub mod orchestrator;
pub mod publisher;
pub mod resources;
pub mod rpc;
pub mod task;
pub mod volume_binder;

pub use application::{Application, ApplicationState};
pub use cache::{CachedNode, CachedPod, NodeLifecycle, PodClassification, ResourceOp, SchedulerCache};
pub use config::ShimConfig;
pub use context::{AddApplicationRequest, AddTaskRequest, Context, ContextSnapshot, RecoverySnapshot};
pub use dispatcher::{ApplicationEvent, CachedNodeEvent, Dispatcher, DispatcherEvent, EventKind, TaskEvent};
pub use errors::{Result, ShimError};
pub use event_recorder::{EventObjectKind, EventRecorder, OrchestratorEvent};
pub use namespace_quota::{resolve_namespace_quota, NamespaceEnrichment};
pub use orchestrator::{
    MaybeTombstone, Namespace, NamespaceReader, OrchestratorNode, OrchestratorPod, PodPhase, PreemptionPolicy,
    PriorityClassSpec,
};
pub use publisher::{publish_events, ChangeType, ObjectResolver, SchedulingEventRecord, SchedulingObjectKind};
pub use resources::ResourceVector;
pub use rpc::{AllocationAsk, ApplicationRegistration, NodeAction, SchedulingCoreClient, UpdateNodeRequest};
pub use task::{Task, TaskState, TaskTransitionEvent};
pub use volume_binder::{PodVolumeClaims, PodVolumes, VolumeBinder};
