/*!
 * Context
 *
 * The shim's public facade. Owns the application/task map and
 * the allocation-bookkeeping maps behind one `Mutex`; the scheduler cache,
 * dispatcher, and every external collaborator are held as their own cheaply
 * `Clone`-able/`Arc`-wrapped handles so they can be used without holding the
 * context lock across an RPC call, a volume-binder call, or a dispatch.
 * Lock ordering is always: this mutex first, then whatever
 * lock `SchedulerCache` takes internally -- never the reverse.
 *
 * - **requests**: DTOs for `AddApplication`/`AddTask`
 * - **node_handlers**: node add/update/delete
 * - **pod_handlers**: classification-first pod ingestion
 * - **app_task_ops**: application/task CRUD
 * - **volume_binding**: the `AssumePod` handshake
 * - **allocation**: pending/in-progress allocation bookkeeping
 * - **recovery**: `InitializeState`
 */

pub mod allocation;
pub mod app_task_ops;
pub mod node_handlers;
pub mod pod_handlers;
pub mod recovery;
pub mod requests;
pub mod volume_binding;

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use log::warn;
use serde::Serialize;

use crate::application::Application;
use crate::cache::{CachedPod, PodClassification, SchedulerCache};
use crate::config::ShimConfig;
use crate::dispatcher::{ApplicationEvent, Dispatcher, DispatcherEvent, TaskEvent};
use crate::errors::{ContextError, Result as ShimResult};
use crate::event_recorder::EventRecorder;
use crate::namespace_quota;
use crate::orchestrator::{MaybeTombstone, NamespaceReader, OrchestratorNode, OrchestratorPod};
use crate::publisher::{self, ObjectResolver, SchedulingEventRecord};
use crate::resources::ResourceVector;
use crate::rpc::{ApplicationRegistration, SchedulingCoreClient, UpdateAllocationRequest};
use crate::task::{Task, TaskState, TaskTransitionEvent};
use crate::volume_binder::VolumeBinder;

pub use allocation::{InProgressPodAllocation, PendingPodAllocation};
pub use recovery::RecoverySnapshot;
pub use requests::{AddApplicationRequest, AddTaskRequest};

struct ContextState {
    applications: HashMap<String, Application>,
    pending_allocations: HashMap<String, PendingPodAllocation>,
    in_progress_allocations: HashMap<String, InProgressPodAllocation>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TaskSnapshot {
    pub task_id: String,
    pub alias: String,
    pub state: String,
    pub assigned_node: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ApplicationSnapshot {
    pub application_id: String,
    pub queue: String,
    pub state: String,
    pub tasks: Vec<TaskSnapshot>,
}

/// Plain-data view of the context's live state, suitable for serializing to
/// JSON for an operator-facing debug surface. Intentionally separate from
/// the domain structs so exposing a snapshot never forces them to carry
/// `Serialize`.
#[derive(Debug, Clone, Serialize)]
pub struct ContextSnapshot {
    pub applications: Vec<ApplicationSnapshot>,
    pub node_count: usize,
    pub pod_count: usize,
}

pub struct Context {
    state: Mutex<ContextState>,
    cache: SchedulerCache,
    dispatcher: Dispatcher,
    rpc: Arc<dyn SchedulingCoreClient>,
    volume_binder: Arc<dyn VolumeBinder>,
    namespace_reader: Arc<dyn NamespaceReader>,
    event_recorder: Arc<dyn EventRecorder>,
    config: ShimConfig,
    initialized: AtomicBool,
}

impl Context {
    pub fn new(
        cache: SchedulerCache,
        dispatcher: Dispatcher,
        rpc: Arc<dyn SchedulingCoreClient>,
        volume_binder: Arc<dyn VolumeBinder>,
        namespace_reader: Arc<dyn NamespaceReader>,
        event_recorder: Arc<dyn EventRecorder>,
        config: ShimConfig,
    ) -> Self {
        Self {
            state: Mutex::new(ContextState {
                applications: HashMap::new(),
                pending_allocations: HashMap::new(),
                in_progress_allocations: HashMap::new(),
            }),
            cache,
            dispatcher,
            rpc,
            volume_binder,
            namespace_reader,
            event_recorder,
            config,
            initialized: AtomicBool::new(false),
        }
    }

    pub fn cache(&self) -> &SchedulerCache {
        &self.cache
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    // ---- node handlers ---------------------------------------------------

    pub fn add_node(&self, node: &OrchestratorNode) -> ShimResult<()> {
        node_handlers::add_node(
            &self.cache,
            self.rpc.as_ref(),
            &self.dispatcher,
            self.event_recorder.as_ref(),
            node,
        )
    }

    pub fn update_node(&self, node: &OrchestratorNode) -> ShimResult<()> {
        node_handlers::update_node(
            &self.cache,
            self.rpc.as_ref(),
            &self.dispatcher,
            self.event_recorder.as_ref(),
            node,
        )
    }

    pub fn delete_node(&self, tombstone: MaybeTombstone<OrchestratorNode>) -> ShimResult<()> {
        node_handlers::delete_node(&self.cache, self.rpc.as_ref(), &self.dispatcher, tombstone)
    }

    // ---- pod handlers ------------------------------------------------------

    pub fn add_pod(&self, pod: &OrchestratorPod) -> PodClassification {
        pod_handlers::add_pod(&self.cache, pod, &self.config)
    }

    pub fn update_pod(&self, pod: &OrchestratorPod) -> PodClassification {
        pod_handlers::update_pod(&self.cache, pod, &self.config)
    }

    pub fn delete_pod(&self, tombstone: MaybeTombstone<OrchestratorPod>) -> Option<CachedPod> {
        pod_handlers::delete_pod(&self.cache, tombstone)
    }

    // ---- application / task operations --------------------------------------

    /// Registers the application locally, then with the scheduling core
    /// outside the context lock. Re-adding an already-known id is a no-op.
    pub fn add_application(&self, req: AddApplicationRequest) {
        let registration = ApplicationRegistration {
            application_id: req.application_id.clone(),
            queue: req.queue.clone(),
            user: req.user.clone(),
            groups: req.groups.clone(),
            tags: req.tags.clone(),
        };
        let application_id = req.application_id.clone();
        let is_new = {
            let mut state = self.state.lock().unwrap();
            let existed = state.applications.contains_key(&application_id);
            app_task_ops::add_application(&mut state.applications, self.namespace_reader.as_ref(), &self.config, req);
            !existed
        };
        if !is_new {
            return;
        }
        if let Err(e) = self.rpc.register_application(registration) {
            warn!("add_application {}: scheduling-core registration failed: {}", application_id, e);
        }
        self.dispatcher
            .dispatch(DispatcherEvent::Application(ApplicationEvent::Submitted { application_id }));
    }

    /// Silent on an unknown application id, matching `app_task_ops::add_task`.
    pub fn add_task(&self, req: AddTaskRequest) {
        let mut state = self.state.lock().unwrap();
        app_task_ops::add_task(&mut state.applications, req);
    }

    /// Silent on an unknown application id or task id.
    pub fn remove_task(&self, application_id: &str, task_id: &str) -> Option<Task> {
        let mut state = self.state.lock().unwrap();
        app_task_ops::remove_task(&mut state.applications, application_id, task_id)
    }

    /// Silent on an unknown application id or task id.
    pub fn get_task(&self, application_id: &str, task_id: &str) -> Option<Task> {
        let state = self.state.lock().unwrap();
        app_task_ops::get_task(&state.applications, application_id, task_id)
    }

    pub fn remove_application(&self, application_id: &str) -> ShimResult<()> {
        let mut state = self.state.lock().unwrap();
        Ok(app_task_ops::remove_application(&mut state.applications, application_id)?)
    }

    pub fn remove_application_internal(&self, application_id: &str) {
        let mut state = self.state.lock().unwrap();
        app_task_ops::remove_application_internal(&mut state.applications, application_id);
    }

    fn apply_task_transition(
        &self,
        application_id: &str,
        task_id: &str,
        event: TaskTransitionEvent,
    ) -> ShimResult<Option<TaskState>> {
        let mut state = self.state.lock().unwrap();
        let application = state
            .applications
            .get_mut(application_id)
            .ok_or_else(|| ContextError::ApplicationNotFound(application_id.to_string()))?;
        match application.get_task_mut(task_id) {
            Some(task) => Ok(task.apply(event)),
            None => {
                warn!("task transition on unknown task {} in application {}", task_id, application_id);
                Ok(None)
            }
        }
    }

    /// Pod observed as scheduler-eligible with resources determined:
    /// advances a freshly created task from *New* to
    /// *Pending* so the next `Schedule` tick can pick it up.
    pub fn notify_task_eligible(&self, application_id: &str, task_id: &str) -> ShimResult<()> {
        let transitioned = self.apply_task_transition(application_id, task_id, TaskTransitionEvent::PodEligible)?;
        if transitioned.is_some() {
            self.dispatcher.dispatch(DispatcherEvent::Task(TaskEvent::Pending {
                application_id: application_id.to_string(),
                task_id: task_id.to_string(),
            }));
        }
        Ok(())
    }

    /// Scheduling-core callback: the ask was allocated to `node_id`.
    pub fn notify_task_allocated(
        &self,
        application_id: &str,
        task_id: &str,
        node_id: String,
        allocation_key: String,
    ) -> ShimResult<()> {
        let transitioned = self.apply_task_transition(
            application_id,
            task_id,
            TaskTransitionEvent::Allocated {
                node_id: node_id.clone(),
                allocation_key: allocation_key.clone(),
            },
        )?;
        if transitioned.is_some() {
            self.dispatcher.dispatch(DispatcherEvent::Task(TaskEvent::Allocated {
                application_id: application_id.to_string(),
                task_id: task_id.to_string(),
                node_id,
                allocation_key,
            }));
        }
        Ok(())
    }

    /// Orchestrator bind operation acknowledged.
    pub fn notify_task_bind_confirmed(&self, application_id: &str, task_id: &str) -> ShimResult<()> {
        let transitioned = self.apply_task_transition(application_id, task_id, TaskTransitionEvent::BindConfirmed)?;
        if transitioned.is_some() {
            self.dispatcher.dispatch(DispatcherEvent::Task(TaskEvent::BindConfirmed {
                application_id: application_id.to_string(),
                task_id: task_id.to_string(),
            }));
        }
        Ok(())
    }

    /// Orchestrator reports pod phase Succeeded, or an explicit
    /// `NotifyTaskComplete` call.
    pub fn notify_task_complete(&self, application_id: &str, task_id: &str) -> ShimResult<()> {
        let transitioned = self.apply_task_transition(application_id, task_id, TaskTransitionEvent::Complete)?;
        if transitioned.is_some() {
            self.dispatcher.dispatch(DispatcherEvent::Task(TaskEvent::Completed {
                application_id: application_id.to_string(),
                task_id: task_id.to_string(),
            }));
        }
        Ok(())
    }

    pub fn notify_task_failed(&self, application_id: &str, task_id: &str) -> ShimResult<()> {
        let transitioned = self.apply_task_transition(application_id, task_id, TaskTransitionEvent::Fail)?;
        if transitioned.is_some() {
            self.dispatcher.dispatch(DispatcherEvent::Task(TaskEvent::Failed {
                application_id: application_id.to_string(),
                task_id: task_id.to_string(),
            }));
        }
        Ok(())
    }

    pub fn notify_task_rejected(&self, application_id: &str, task_id: &str, reason: String) -> ShimResult<()> {
        let transitioned = self.apply_task_transition(application_id, task_id, TaskTransitionEvent::Reject)?;
        if transitioned.is_some() {
            self.dispatcher.dispatch(DispatcherEvent::Task(TaskEvent::Rejected {
                application_id: application_id.to_string(),
                task_id: task_id.to_string(),
                reason,
            }));
        }
        Ok(())
    }

    /// Advances every eligible task of `application_id` and forwards the
    /// resulting allocation asks to the scheduling core. The context lock is
    /// released before the RPC call.
    pub fn schedule(&self, application_id: &str) -> ShimResult<()> {
        let asks = {
            let mut state = self.state.lock().unwrap();
            let application = state
                .applications
                .get_mut(application_id)
                .ok_or_else(|| ContextError::ApplicationNotFound(application_id.to_string()))?;

            let alias_by_task: HashMap<String, String> =
                application.tasks().map(|t| (t.task_id.clone(), t.alias.clone())).collect();
            let cache = &self.cache;
            application.schedule(&|task_id| {
                alias_by_task
                    .get(task_id)
                    .and_then(|alias| cache.all_cached_pods().into_iter().find(|p| &p.pod.alias() == alias))
                    .map(|p| p.pod.resource_requests.clone())
                    .unwrap_or_else(ResourceVector::zero)
            })
        };

        if asks.is_empty() {
            return Ok(());
        }
        self.rpc.update_allocation(UpdateAllocationRequest { allocations: asks })?;
        Ok(())
    }

    // ---- volume binding handshake --------------------------------------------

    pub fn assume_pod(&self, pod_uid: &str, pod_alias: &str, node_name: &str) -> ShimResult<()> {
        volume_binding::assume_pod(&self.cache, self.volume_binder.as_ref(), pod_uid, pod_alias, node_name)?;
        Ok(())
    }

    // ---- allocation bookkeeping ------------------------------------------------

    pub fn add_pending_pod_allocation(&self, pod_uid: &str, node_id: &str, allocation_key: &str) {
        let mut state = self.state.lock().unwrap();
        let ContextState {
            pending_allocations,
            in_progress_allocations,
            ..
        } = &mut *state;
        allocation::add_pending_pod_allocation(pending_allocations, in_progress_allocations, pod_uid, node_id, allocation_key)
    }

    pub fn get_pending_pod_allocation(&self, pod_uid: &str) -> Option<PendingPodAllocation> {
        let state = self.state.lock().unwrap();
        allocation::get_pending_pod_allocation(&state.pending_allocations, pod_uid)
    }

    pub fn get_in_progress_pod_allocation(&self, pod_uid: &str) -> Option<InProgressPodAllocation> {
        let state = self.state.lock().unwrap();
        allocation::get_in_progress_pod_allocation(&state.in_progress_allocations, pod_uid)
    }

    pub fn start_pod_allocation(&self, pod_uid: &str, node_id: &str) -> bool {
        let mut state = self.state.lock().unwrap();
        let ContextState {
            pending_allocations,
            in_progress_allocations,
            ..
        } = &mut *state;
        allocation::start_pod_allocation(pending_allocations, in_progress_allocations, pod_uid, node_id)
    }

    pub fn remove_pod_allocation(&self, pod_uid: &str) {
        let mut state = self.state.lock().unwrap();
        let ContextState {
            pending_allocations,
            in_progress_allocations,
            ..
        } = &mut *state;
        allocation::remove_pod_allocation(pending_allocations, in_progress_allocations, pod_uid);
    }

    // ---- recovery ---------------------------------------------------------

    /// Ingests `snapshot` exactly once. Subsequent calls are ignored.
    pub fn initialize_state(&self, snapshot: RecoverySnapshot) {
        if self.initialized.swap(true, Ordering::SeqCst) {
            warn!("initialize_state called more than once, ignoring");
            return;
        }
        let mut state = self.state.lock().unwrap();
        recovery::initialize_state(&self.cache, &mut state.applications, &self.config, snapshot);
    }

    // ---- event filter & publisher ------------------------------------------

    pub fn publish_events(&self, records: Vec<SchedulingEventRecord>) {
        publisher::publish_events(records, self, self.event_recorder.as_ref());
    }

    // ---- namespace quota resolver -------------------------------------------

    pub fn resolve_namespace_quota(
        &self,
        namespace_name: &str,
    ) -> Option<(namespace_quota::NamespaceEnrichment, Vec<namespace_quota::ParseWarning>)> {
        let namespace = self.namespace_reader.get_namespace(namespace_name)?;
        Some(namespace_quota::resolve_namespace_quota(&namespace, &self.config))
    }

    // ---- state dump ---------------------------------------------------------

    pub fn dump_state(&self) -> ContextSnapshot {
        let state = self.state.lock().unwrap();
        let applications = state
            .applications
            .values()
            .map(|application| ApplicationSnapshot {
                application_id: application.application_id.clone(),
                queue: application.queue.clone(),
                state: format!("{:?}", application.state()),
                tasks: application
                    .tasks()
                    .map(|task| TaskSnapshot {
                        task_id: task.task_id.clone(),
                        alias: task.alias.clone(),
                        state: format!("{:?}", task.state()),
                        assigned_node: task.assigned_node.clone(),
                    })
                    .collect(),
            })
            .collect();

        ContextSnapshot {
            applications,
            node_count: self.cache.node_count(),
            pod_count: self.cache.pod_count(),
        }
    }
}

impl ObjectResolver for Context {
    fn resolve_node(&self, node_id: &str) -> bool {
        self.cache.get_node(node_id).is_some()
    }

    fn resolve_application(&self, application_id: &str) -> bool {
        self.state.lock().unwrap().applications.contains_key(application_id)
    }

    fn resolve_task(&self, application_id: &str, task_id: &str) -> bool {
        self.state
            .lock()
            .unwrap()
            .applications
            .get(application_id)
            .map(|application| application.get_task(task_id).is_some())
            .unwrap_or(false)
    }
}
