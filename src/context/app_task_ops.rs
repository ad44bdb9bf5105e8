/*!
 * Application / Task Operations
 * Application/task ingestion. `AddApplication` and `AddTask` are both duplicate-safe:
 * re-adding an id that already exists is a no-op rather than an overwrite,
 * since the orchestrator informer can redeliver the same object after a
 * resync. `RemoveApplication` refuses while any task is non-terminated;
 * `RemoveApplicationInternal` is the unconditional escape hatch used once an
 * application has already been torn down by other means.
 */

use std::collections::HashMap;

use log::warn;

use crate::application::Application;
use crate::errors::ContextError;
use crate::namespace_quota::resolve_namespace_quota;
use crate::orchestrator::NamespaceReader;
use crate::task::Task;

use super::requests::{AddApplicationRequest, AddTaskRequest};

pub fn add_application(
    applications: &mut HashMap<String, Application>,
    namespace_reader: &dyn NamespaceReader,
    config: &crate::config::ShimConfig,
    req: AddApplicationRequest,
) {
    if applications.contains_key(&req.application_id) {
        return;
    }

    let mut tags = req.tags;
    if let Some(namespace_name) = &req.namespace {
        if let Some(namespace) = namespace_reader.get_namespace(namespace_name) {
            let (enrichment, warnings) = resolve_namespace_quota(&namespace, config);
            for warning in warnings {
                warn!("add_application {}: {}", req.application_id, warning);
            }
            tags.extend(enrichment.into_tags());
        }
    }

    let application = Application::new(req.application_id.clone(), req.queue, req.user, req.groups, tags);
    applications.insert(req.application_id, application);
}

/// Silent on a missing application -- unlike `RemoveApplication`, `AddTask`
/// never surfaces `ApplicationNotFound`, since an informer resync can
/// redeliver a task for an application the orchestrator has already deleted.
pub fn add_task(applications: &mut HashMap<String, Application>, req: AddTaskRequest) {
    let Some(application) = applications.get_mut(&req.application_id) else {
        return;
    };

    if application.get_task(&req.task_id).is_some() {
        return;
    }

    // A pod already bound when the task is first created fast-forwards past
    // the normal Pending/Scheduling pipeline. Otherwise the
    // task starts New; `PodEligible` is driven by the pod handler once the
    // pod is observed as scheduler-eligible, not by AddTask itself.
    let mut task = Task::new(req.application_id, req.task_id, req.pod.alias());
    if let Some(state) = Task::recovery_fast_forward(req.pod.node_name.as_deref(), req.pod.phase) {
        task.set_state(state);
    }
    application.add_task(task);
}

/// Silent on a missing application or a missing task: returns `None` rather
/// than an error in either case.
pub fn remove_task(
    applications: &mut HashMap<String, Application>,
    application_id: &str,
    task_id: &str,
) -> Option<Task> {
    applications.get_mut(application_id)?.remove_task(task_id)
}

/// Silent on a missing application or a missing task: returns `None` rather
/// than an error in either case.
pub fn get_task(
    applications: &HashMap<String, Application>,
    application_id: &str,
    task_id: &str,
) -> Option<Task> {
    applications.get(application_id)?.get_task(task_id).cloned()
}

pub fn remove_application(
    applications: &mut HashMap<String, Application>,
    application_id: &str,
) -> Result<(), ContextError> {
    let application = applications
        .get(application_id)
        .ok_or_else(|| ContextError::ApplicationNotFound(application_id.to_string()))?;

    if application.has_non_terminated_task() {
        return Err(ContextError::ApplicationHasActiveTasks {
            application_id: application_id.to_string(),
            task_aliases: application.non_terminated_task_aliases(),
        });
    }

    applications.remove(application_id);
    Ok(())
}

pub fn remove_application_internal(
    applications: &mut HashMap<String, Application>,
    application_id: &str,
) -> Option<Application> {
    applications.remove(application_id)
}
