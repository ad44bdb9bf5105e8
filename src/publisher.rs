/*!
 * Event Filter & Publisher
 * Translates scheduling-core event records into orchestrator events, dropping
 * unresolved references and anything in the suppression set.
 */

use crate::event_recorder::{EventObjectKind, EventRecorder, OrchestratorEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchedulingObjectKind {
    Node,
    Application,
    Task,
    Queue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeType {
    Add,
    Update,
    Remove,
}

#[derive(Debug, Clone)]
pub struct SchedulingEventRecord {
    pub object_kind: SchedulingObjectKind,
    /// Node id for Node records, application id for Application records,
    /// `"<application_id>/<task_id>"` for Task records.
    pub object_id: String,
    pub change_type: ChangeType,
    pub change_detail: String,
    pub reason: String,
    pub message: String,
}

/// Literal suppression set: node scheduling-state/occupancy/capacity/allocation-delta changes,
/// application running-count deltas, and queue lifecycle events. Kept as a
/// constant table rather than derived logic so the behavior is directly
/// testable.
pub const SUPPRESSED_DETAILS: &[(SchedulingObjectKind, &str)] = &[
    (SchedulingObjectKind::Node, "scheduling_state"),
    (SchedulingObjectKind::Node, "occupancy"),
    (SchedulingObjectKind::Node, "capacity"),
    (SchedulingObjectKind::Node, "allocation_delta"),
    (SchedulingObjectKind::Application, "running_count"),
    (SchedulingObjectKind::Queue, "lifecycle"),
];

pub fn is_suppressed(record: &SchedulingEventRecord) -> bool {
    SUPPRESSED_DETAILS
        .iter()
        .any(|(kind, detail)| *kind == record.object_kind && *detail == record.change_detail)
}

/// Resolves a scheduling-core event record's referenced object against the
/// context's live state. Implemented by `Context` so the publisher stays
/// decoupled from the cache/application-map internals.
pub trait ObjectResolver {
    fn resolve_node(&self, node_id: &str) -> bool;
    fn resolve_application(&self, application_id: &str) -> bool;
    fn resolve_task(&self, application_id: &str, task_id: &str) -> bool;
}

/// For each record: drop it if its referenced object can't be resolved, or if
/// it falls in the suppression set; otherwise emit it to `recorder`.
pub fn publish_events(
    records: Vec<SchedulingEventRecord>,
    resolver: &dyn ObjectResolver,
    recorder: &dyn EventRecorder,
) {
    for record in records {
        if is_suppressed(&record) {
            continue;
        }
        let Some(event_kind) = resolve(&record, resolver) else {
            continue;
        };
        recorder.publish(OrchestratorEvent {
            object_kind: event_kind,
            object_id: record.object_id,
            reason: record.reason,
            message: record.message,
        });
    }
}

fn resolve(record: &SchedulingEventRecord, resolver: &dyn ObjectResolver) -> Option<EventObjectKind> {
    match record.object_kind {
        SchedulingObjectKind::Node => {
            resolver.resolve_node(&record.object_id).then_some(EventObjectKind::Node)
        }
        SchedulingObjectKind::Application => resolver
            .resolve_application(&record.object_id)
            .then_some(EventObjectKind::Application),
        SchedulingObjectKind::Task => {
            let (app_id, task_id) = record.object_id.split_once('/')?;
            resolver
                .resolve_task(app_id, task_id)
                .then_some(EventObjectKind::Task)
        }
        SchedulingObjectKind::Queue => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event_recorder::MockEventRecorder;
    use std::cell::RefCell;

    struct StubResolver {
        known_nodes: Vec<String>,
    }
    impl ObjectResolver for StubResolver {
        fn resolve_node(&self, node_id: &str) -> bool {
            self.known_nodes.iter().any(|n| n == node_id)
        }
        fn resolve_application(&self, _application_id: &str) -> bool {
            true
        }
        fn resolve_task(&self, _application_id: &str, _task_id: &str) -> bool {
            true
        }
    }

    fn record(kind: SchedulingObjectKind, id: &str, detail: &str) -> SchedulingEventRecord {
        SchedulingEventRecord {
            object_kind: kind,
            object_id: id.to_string(),
            change_type: ChangeType::Update,
            change_detail: detail.to_string(),
            reason: "Reason".to_string(),
            message: "message".to_string(),
        }
    }

    #[test]
    fn unresolved_object_emits_nothing() {
        let resolver = StubResolver { known_nodes: vec![] };
        let mut recorder = MockEventRecorder::new();
        recorder.expect_publish().times(0).returning(|_| ());
        publish_events(
            vec![record(SchedulingObjectKind::Node, "ghost-node", "accepted")],
            &resolver,
            &recorder,
        );
    }

    #[test]
    fn suppressed_detail_emits_nothing_even_when_resolved() {
        let resolver = StubResolver {
            known_nodes: vec!["n1".to_string()],
        };
        let mut recorder = MockEventRecorder::new();
        recorder.expect_publish().times(0).returning(|_| ());
        publish_events(
            vec![record(SchedulingObjectKind::Node, "n1", "occupancy")],
            &resolver,
            &recorder,
        );
    }

    #[test]
    fn resolved_unsuppressed_record_is_published() {
        let resolver = StubResolver {
            known_nodes: vec!["n1".to_string()],
        };
        let seen = RefCell::new(0);
        let mut recorder = MockEventRecorder::new();
        recorder.expect_publish().times(1).returning(move |_| {
            *seen.borrow_mut() += 1;
        });
        publish_events(
            vec![record(SchedulingObjectKind::Node, "n1", "accepted")],
            &resolver,
            &recorder,
        );
    }
}
