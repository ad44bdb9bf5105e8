/*!
 * Dispatcher Event Types
 * Concrete payload shapes for the three event kinds the dispatcher routes:
 * application, task, and cached-node events.
 */

use crate::application::ApplicationState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    App,
    Task,
    CachedNode,
}

#[derive(Debug, Clone)]
pub enum ApplicationEvent {
    Submitted { application_id: String },
    StateChanged { application_id: String, state: ApplicationState },
    ScheduleTick { application_id: String },
}

#[derive(Debug, Clone)]
pub enum TaskEvent {
    Pending {
        application_id: String,
        task_id: String,
    },
    Allocated {
        application_id: String,
        task_id: String,
        node_id: String,
        allocation_key: String,
    },
    Rejected {
        application_id: String,
        task_id: String,
        reason: String,
    },
    BindConfirmed {
        application_id: String,
        task_id: String,
    },
    Completed {
        application_id: String,
        task_id: String,
    },
    Failed {
        application_id: String,
        task_id: String,
    },
}

#[derive(Debug, Clone)]
pub enum CachedNodeEvent {
    Accepted { node_id: String },
    Removed { node_id: String },
}

#[derive(Debug, Clone)]
pub enum DispatcherEvent {
    Application(ApplicationEvent),
    Task(TaskEvent),
    CachedNode(CachedNodeEvent),
}

impl DispatcherEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            DispatcherEvent::Application(_) => EventKind::App,
            DispatcherEvent::Task(_) => EventKind::Task,
            DispatcherEvent::CachedNode(_) => EventKind::CachedNode,
        }
    }

    /// Identifier used to reason about per-target ordering: events sharing a
    /// target id are delivered in dispatch order.
    pub fn target_id(&self) -> &str {
        match self {
            DispatcherEvent::Application(ApplicationEvent::Submitted { application_id })
            | DispatcherEvent::Application(ApplicationEvent::StateChanged { application_id, .. })
            | DispatcherEvent::Application(ApplicationEvent::ScheduleTick { application_id }) => {
                application_id
            }
            DispatcherEvent::Task(TaskEvent::Pending { task_id, .. })
            | DispatcherEvent::Task(TaskEvent::Allocated { task_id, .. })
            | DispatcherEvent::Task(TaskEvent::Rejected { task_id, .. })
            | DispatcherEvent::Task(TaskEvent::BindConfirmed { task_id, .. })
            | DispatcherEvent::Task(TaskEvent::Completed { task_id, .. })
            | DispatcherEvent::Task(TaskEvent::Failed { task_id, .. }) => task_id,
            DispatcherEvent::CachedNode(CachedNodeEvent::Accepted { node_id })
            | DispatcherEvent::CachedNode(CachedNodeEvent::Removed { node_id }) => node_id,
        }
    }
}
