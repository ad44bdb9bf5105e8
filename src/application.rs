/*!
 * Application
 * Per-application state machine. Owns a task map indexed by
 * task id. `schedule` is pure with respect to I/O: it advances eligible tasks
 * and returns the allocation asks the Context should hand to the scheduling
 * core *after* releasing the context lock, so no lock is ever held across an
 * RPC call.
 */

use std::collections::BTreeMap;

use log::warn;

use crate::resources::ResourceVector;
use crate::rpc::AllocationAsk;
use crate::task::{Task, TaskState, TaskTransitionEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplicationState {
    New,
    Submitted,
    Accepted,
    Running,
    Completing,
    Completed,
    Failed,
    Killed,
}

pub struct Application {
    pub application_id: String,
    pub queue: String,
    pub user: String,
    pub groups: Vec<String>,
    pub tags: BTreeMap<String, String>,
    state: ApplicationState,
    tasks: BTreeMap<String, Task>,
}

impl Application {
    pub fn new(
        application_id: impl Into<String>,
        queue: impl Into<String>,
        user: impl Into<String>,
        groups: Vec<String>,
        tags: BTreeMap<String, String>,
    ) -> Self {
        Self {
            application_id: application_id.into(),
            queue: queue.into(),
            user: user.into(),
            groups,
            tags,
            state: ApplicationState::New,
            tasks: BTreeMap::new(),
        }
    }

    pub fn state(&self) -> ApplicationState {
        self.state
    }

    /// Forces a state directly (used by recovery).
    pub fn set_state(&mut self, state: ApplicationState) {
        self.state = state;
    }

    pub fn add_task(&mut self, task: Task) {
        self.tasks.insert(task.task_id.clone(), task);
    }

    pub fn remove_task(&mut self, task_id: &str) -> Option<Task> {
        self.tasks.remove(task_id)
    }

    pub fn get_task(&self, task_id: &str) -> Option<&Task> {
        self.tasks.get(task_id)
    }

    pub fn get_task_mut(&mut self, task_id: &str) -> Option<&mut Task> {
        self.tasks.get_mut(task_id)
    }

    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks.values()
    }

    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    pub fn has_non_terminated_task(&self) -> bool {
        self.tasks.values().any(|t| !t.state().is_terminal())
    }

    pub fn non_terminated_task_aliases(&self) -> Vec<String> {
        self.tasks
            .values()
            .filter(|t| !t.state().is_terminal())
            .map(|t| t.alias.clone())
            .collect()
    }

    /// Advances every `Pending` task into `Scheduling` and returns the
    /// allocation asks to hand to the scheduling core. A no-op unless the
    /// application itself is `Running`. `resource_lookup` supplies the
    /// resource request for a task id (backed by the cache's pod map).
    pub fn schedule(&mut self, resource_lookup: &dyn Fn(&str) -> ResourceVector) -> Vec<AllocationAsk> {
        if self.state != ApplicationState::Running {
            return Vec::new();
        }

        let mut asks = Vec::new();
        for task in self.tasks.values_mut() {
            if task.state() != TaskState::Pending {
                continue;
            }
            match task.apply(TaskTransitionEvent::ApplicationRunning) {
                Some(TaskState::Scheduling) => {
                    asks.push(AllocationAsk {
                        application_id: self.application_id.clone(),
                        task_id: task.task_id.clone(),
                        allocation_key: String::new(),
                        node_id: None,
                        resource_ask: resource_lookup(&task.task_id),
                    });
                }
                Some(_) | None => {
                    warn!(
                        "application {}: task {} did not transition to Scheduling on tick",
                        self.application_id, task.task_id
                    );
                }
            }
        }
        asks
    }
}
