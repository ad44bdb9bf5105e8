/*!
 * Orchestrator Event Recorder Boundary
 * The event recorder back-end only needs a publish
 * interface from this crate's perspective; filtering which records reach it is
 * the Event Filter & Publisher's job, not the recorder's.
 */

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventObjectKind {
    Node,
    Application,
    Task,
}

#[derive(Debug, Clone)]
pub struct OrchestratorEvent {
    pub object_kind: EventObjectKind,
    pub object_id: String,
    pub reason: String,
    pub message: String,
}

#[cfg_attr(test, mockall::automock)]
pub trait EventRecorder: Send + Sync {
    fn publish(&self, event: OrchestratorEvent);
}
