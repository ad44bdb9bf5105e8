/*!
 * Recovery / InitializeState
 * One-shot ingestion of the orchestrator's current world at startup:
 * priority classes first, then nodes (seeding their schedulable
 * capacity before any occupancy numbers exist), then pods. Foreign pods are
 * scanned before managed ones so a node's initial occupied resource already
 * reflects pre-existing foreign workloads by the time managed tasks are
 * fast-forwarded onto it. No RPC or dispatcher calls happen here -- this
 * only populates local state; the normal add/update handlers take over for
 * anything observed after this point.
 */

use std::collections::HashMap;

use log::warn;

use crate::application::{Application, ApplicationState};
use crate::cache::{CachedPod, NodeLifecycle, PodClassification, ResourceOp, SchedulerCache};
use crate::config::ShimConfig;
use crate::orchestrator::{OrchestratorNode, OrchestratorPod, PriorityClassSpec};
use crate::task::Task;

use super::pod_handlers::classify_pod;

#[derive(Debug, Clone, Default)]
pub struct RecoverySnapshot {
    pub priority_classes: Vec<PriorityClassSpec>,
    pub nodes: Vec<OrchestratorNode>,
    pub pods: Vec<OrchestratorPod>,
}

pub fn initialize_state(
    cache: &SchedulerCache,
    applications: &mut HashMap<String, Application>,
    config: &ShimConfig,
    snapshot: RecoverySnapshot,
) {
    for priority_class in snapshot.priority_classes {
        cache.upsert_priority_class(priority_class);
    }

    for node in &snapshot.nodes {
        cache.add_node(node.name.clone(), node.allocatable.clone());
        cache.set_node_state(&node.name, NodeLifecycle::Accepted);
    }

    for pod in &snapshot.pods {
        if classify_pod(pod, config) != PodClassification::Foreign {
            continue;
        }
        if pod.is_assigned() && !pod.phase.is_terminal() {
            if let Some(node_id) = pod.node_name.as_deref() {
                cache.update_occupied_resource(node_id, &pod.uid, pod.resource_requests.clone(), ResourceOp::Add);
            }
        }
        cache.add_pod(CachedPod::new(pod.clone(), PodClassification::Foreign));
    }

    for pod in &snapshot.pods {
        if classify_pod(pod, config) != PodClassification::Managed {
            continue;
        }
        ingest_managed_pod(cache, applications, config, pod);
    }
}

fn ingest_managed_pod(
    cache: &SchedulerCache,
    applications: &mut HashMap<String, Application>,
    config: &ShimConfig,
    pod: &OrchestratorPod,
) {
    let Some(application_id) = pod.application_id(config) else {
        warn!("recovery: managed pod {} carries no application id, skipping", pod.alias());
        return;
    };

    let orphaned = match pod.node_name.as_deref() {
        Some(node_name) if !node_name.is_empty() => cache.get_node(node_name).is_none(),
        _ => false,
    };
    if orphaned {
        cache.add_pod(CachedPod::new(pod.clone(), PodClassification::Orphan));
        warn!(
            "recovery: pod {} is orphaned (assigned to missing node {:?}), skipping task recovery",
            pod.alias(),
            pod.node_name
        );
        return;
    }

    cache.add_pod(CachedPod::new(pod.clone(), PodClassification::Managed));

    let application = applications.entry(application_id.clone()).or_insert_with(|| {
        let mut app = Application::new(application_id.clone(), "root.default", "", Vec::new(), Default::default());
        app.set_state(ApplicationState::Running);
        app
    });

    let task_id = pod.alias();
    if application.get_task(&task_id).is_some() {
        return;
    }

    // Mirrors AddTask's own fast-forward rule: a pod already
    // bound with a terminal or running phase skips straight to the matching
    // task state. Anything else starts New and waits for the normal
    // PodEligible signal, same as a freshly observed pod would.
    let mut task = Task::new(application_id, task_id, pod.alias());
    if let Some(state) = Task::recovery_fast_forward(pod.node_name.as_deref(), pod.phase) {
        task.set_state(state);
    }
    application.add_task(task);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::PodPhase;
    use crate::resources::ResourceVector;
    use crate::task::TaskState;
    use std::collections::BTreeMap;

    fn node(name: &str) -> OrchestratorNode {
        OrchestratorNode {
            name: name.to_string(),
            allocatable: ResourceVector::new(10_000_000_000, 10_000),
        }
    }

    fn managed_pod(uid: &str, app_id: &str, node_name: Option<&str>, phase: PodPhase) -> OrchestratorPod {
        let mut annotations = BTreeMap::new();
        let config = ShimConfig::default();
        annotations.insert(config.application_id_annotation(), app_id.to_string());
        OrchestratorPod {
            uid: uid.to_string(),
            namespace: "default".to_string(),
            name: uid.to_string(),
            scheduler_name: Some("yunikorn".to_string()),
            node_name: node_name.map(|s| s.to_string()),
            phase,
            labels: BTreeMap::new(),
            annotations,
            resource_requests: ResourceVector::new(100, 50),
        }
    }

    #[test]
    fn bound_running_pod_fast_forwards_to_bound() {
        let cache = SchedulerCache::new();
        let config = ShimConfig::default();
        let mut applications = HashMap::new();

        initialize_state(
            &cache,
            &mut applications,
            &config,
            RecoverySnapshot {
                priority_classes: vec![],
                nodes: vec![node("n1")],
                pods: vec![managed_pod("p1", "app01", Some("n1"), PodPhase::Running)],
            },
        );

        let app = applications.get("app01").unwrap();
        let task = app.get_task("default/p1").unwrap();
        assert_eq!(task.state(), TaskState::Bound);
    }

    #[test]
    fn unbound_pending_pod_starts_new() {
        let cache = SchedulerCache::new();
        let config = ShimConfig::default();
        let mut applications = HashMap::new();

        initialize_state(
            &cache,
            &mut applications,
            &config,
            RecoverySnapshot {
                priority_classes: vec![],
                nodes: vec![],
                pods: vec![managed_pod("p1", "app01", None, PodPhase::Pending)],
            },
        );

        let app = applications.get("app01").unwrap();
        let task = app.get_task("default/p1").unwrap();
        assert_eq!(task.state(), TaskState::New);
    }

    #[test]
    fn pod_bound_to_missing_node_is_orphaned() {
        let cache = SchedulerCache::new();
        let config = ShimConfig::default();
        let mut applications = HashMap::new();

        initialize_state(
            &cache,
            &mut applications,
            &config,
            RecoverySnapshot {
                priority_classes: vec![],
                nodes: vec![],
                pods: vec![managed_pod("p1", "app01", Some("ghost-node"), PodPhase::Running)],
            },
        );

        assert!(!applications.contains_key("app01"));
        let cached = cache.get_pod("p1").unwrap();
        assert_eq!(cached.classification, PodClassification::Orphan);
    }

    #[test]
    fn foreign_occupancy_is_seeded_before_managed_pods() {
        let cache = SchedulerCache::new();
        let config = ShimConfig::default();
        let mut applications = HashMap::new();

        let foreign = OrchestratorPod {
            uid: "f1".to_string(),
            namespace: "default".to_string(),
            name: "f1".to_string(),
            scheduler_name: Some("default-scheduler".to_string()),
            node_name: Some("n1".to_string()),
            phase: PodPhase::Running,
            labels: BTreeMap::new(),
            annotations: BTreeMap::new(),
            resource_requests: ResourceVector::new(1_000_000_000, 500),
        };

        initialize_state(
            &cache,
            &mut applications,
            &config,
            RecoverySnapshot {
                priority_classes: vec![],
                nodes: vec![node("n1")],
                pods: vec![foreign, managed_pod("p1", "app01", Some("n1"), PodPhase::Running)],
            },
        );

        let (_, occupied, _) = cache.snapshot_resources("n1");
        assert_eq!(occupied, ResourceVector::new(1_000_000_000, 500));
    }
}
