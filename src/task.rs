/*!
 * Task
 * Per-pod state machine. Transitions are pure functions
 * `(state, event) -> state'`; side effects (dispatcher events, RPC calls)
 * happen on entry to the new state via the caller, never inside the
 * transition itself.
 */

use log::warn;

use crate::orchestrator::PodPhase;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    New,
    Pending,
    Scheduling,
    Allocated,
    Bound,
    Completed,
    Failed,
    Rejected,
}

impl TaskState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskState::Completed | TaskState::Failed | TaskState::Rejected)
    }
}

#[derive(Debug, Clone)]
pub enum TaskTransitionEvent {
    /// Pod observed as scheduler-eligible, resources determined.
    PodEligible,
    /// Owning application entered Running and ticked.
    ApplicationRunning,
    /// Scheduling-core callback `TaskAllocated`.
    Allocated { node_id: String, allocation_key: String },
    /// Orchestrator bind operation acknowledged.
    BindConfirmed,
    /// Orchestrator reports pod phase Succeeded, or `NotifyTaskComplete`.
    Complete,
    /// Orchestrator reports pod phase Failed.
    Fail,
    /// Scheduling-core callback rejects the request.
    Reject,
}

/// `(state, event) -> state'`. Returns `None` for an illegal transition.
pub fn next_state(from: TaskState, event: &TaskTransitionEvent) -> Option<TaskState> {
    use TaskState::*;
    use TaskTransitionEvent::*;
    match (from, event) {
        (New, PodEligible) => Some(Pending),
        (Pending, ApplicationRunning) => Some(Scheduling),
        (Scheduling, Allocated { .. }) => Some(Allocated),
        (Allocated, BindConfirmed) => Some(Bound),
        (state, Complete) if !state.is_terminal() => Some(Completed),
        (state, Fail) if !state.is_terminal() => Some(Failed),
        (state, Reject) if !state.is_terminal() => Some(Rejected),
        _ => None,
    }
}

#[derive(Debug, Clone)]
pub struct Task {
    pub application_id: String,
    pub task_id: String,
    pub alias: String,
    state: TaskState,
    pub allocation_key: Option<String>,
    pub assigned_node: Option<String>,
    pub pod_condition_watermark: Option<PodPhase>,
}

impl Task {
    pub fn new(application_id: impl Into<String>, task_id: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            application_id: application_id.into(),
            task_id: task_id.into(),
            alias: alias.into(),
            state: TaskState::New,
            allocation_key: None,
            assigned_node: None,
            pod_condition_watermark: None,
        }
    }

    pub fn state(&self) -> TaskState {
        self.state
    }

    /// Applies `event` if it is a legal transition from the current state.
    /// Illegal transitions are logged and dropped, returning
    /// `None` without mutating the task.
    pub fn apply(&mut self, event: TaskTransitionEvent) -> Option<TaskState> {
        match next_state(self.state, &event) {
            Some(next) => {
                if let TaskTransitionEvent::Allocated { node_id, allocation_key } = &event {
                    self.assigned_node = Some(node_id.clone());
                    self.allocation_key = Some(allocation_key.clone());
                }
                self.state = next;
                Some(next)
            }
            None => {
                warn!(
                    "task {}: illegal transition {:?} from state {:?}, dropping event",
                    self.alias, event, self.state
                );
                None
            }
        }
    }

    /// Forces a state directly, bypassing the transition table. Used only by
    /// recovery and `SetState` callers.
    pub fn set_state(&mut self, state: TaskState) {
        self.state = state;
    }

    /// Computes the recovery fast-forward state for a task whose pod is
    /// already bound to a node when the task is first created, without
    /// reissuing a scheduling request.
    pub fn recovery_fast_forward(node_name: Option<&str>, phase: PodPhase) -> Option<TaskState> {
        let bound = node_name.is_some_and(|n| !n.is_empty());
        if !bound {
            return None;
        }
        match phase {
            PodPhase::Running => Some(TaskState::Bound),
            PodPhase::Succeeded | PodPhase::Failed => Some(TaskState::Completed),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path_transitions() {
        let mut task = Task::new("app1", "task1", "default/task1");
        assert_eq!(task.apply(TaskTransitionEvent::PodEligible), Some(TaskState::Pending));
        assert_eq!(
            task.apply(TaskTransitionEvent::ApplicationRunning),
            Some(TaskState::Scheduling)
        );
        assert_eq!(
            task.apply(TaskTransitionEvent::Allocated {
                node_id: "n1".into(),
                allocation_key: "ak-1".into(),
            }),
            Some(TaskState::Allocated)
        );
        assert_eq!(task.allocation_key.as_deref(), Some("ak-1"));
        assert_eq!(task.assigned_node.as_deref(), Some("n1"));
        assert_eq!(task.apply(TaskTransitionEvent::BindConfirmed), Some(TaskState::Bound));
    }

    #[test]
    fn illegal_transition_is_dropped() {
        let mut task = Task::new("app1", "task1", "default/task1");
        assert_eq!(task.apply(TaskTransitionEvent::BindConfirmed), None);
        assert_eq!(task.state(), TaskState::New);
    }

    #[test]
    fn terminal_states_reject_further_transitions() {
        let mut task = Task::new("app1", "task1", "default/task1");
        task.apply(TaskTransitionEvent::PodEligible);
        task.apply(TaskTransitionEvent::Fail);
        assert_eq!(task.state(), TaskState::Failed);
        assert_eq!(task.apply(TaskTransitionEvent::Complete), None);
    }

    #[test]
    fn recovery_fast_forward_running_yields_bound() {
        assert_eq!(
            Task::recovery_fast_forward(Some("fake-node"), PodPhase::Running),
            Some(TaskState::Bound)
        );
    }

    #[test]
    fn recovery_fast_forward_succeeded_yields_completed() {
        assert_eq!(
            Task::recovery_fast_forward(Some("fake-node"), PodPhase::Succeeded),
            Some(TaskState::Completed)
        );
    }

    #[test]
    fn recovery_fast_forward_unbound_pod_yields_none() {
        assert_eq!(Task::recovery_fast_forward(None, PodPhase::Pending), None);
        assert_eq!(Task::recovery_fast_forward(Some(""), PodPhase::Running), None);
    }
}
