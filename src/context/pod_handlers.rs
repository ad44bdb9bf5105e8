/*!
 * Pod Handlers
 * Classification-first pod ingestion: every pod is
 * classified foreign or managed before anything else happens to it. Foreign
 * pods only ever touch the per-node occupancy ledger; managed pods are
 * mirrored into the cache and leave task lifecycle to the application/task
 * operations in `app_task_ops`.
 */

use crate::cache::{CachedPod, PodClassification, ResourceOp, SchedulerCache};
use crate::config::ShimConfig;
use crate::orchestrator::{MaybeTombstone, OrchestratorPod};
use crate::resources::ResourceVector;

/// A pod is managed when its `schedulerName` names this shim's scheduler, or
/// it carries the application-id annotation/label; everything else is
/// foreign.
pub fn classify_pod(pod: &OrchestratorPod, config: &ShimConfig) -> PodClassification {
    let scheduler_matches = pod.scheduler_name.as_deref() == Some(config.scheduler_name.as_str());
    let has_application_id = pod.application_id(config).is_some();
    if scheduler_matches || has_application_id {
        PodClassification::Managed
    } else {
        PodClassification::Foreign
    }
}

fn reconcile_foreign_occupancy(cache: &SchedulerCache, pod: &OrchestratorPod) {
    let Some(node_id) = pod.node_name.as_deref() else {
        return;
    };
    let tracked = cache.is_foreign_tracked(node_id, &pod.uid);
    let should_track = pod.is_assigned() && !pod.phase.is_terminal();
    match (tracked, should_track) {
        (false, true) => {
            cache.update_occupied_resource(node_id, &pod.uid, pod.resource_requests.clone(), ResourceOp::Add);
        }
        (true, false) => {
            cache.update_occupied_resource(node_id, &pod.uid, ResourceVector::zero(), ResourceOp::Sub);
        }
        _ => {}
    }
}

/// Ingests a newly observed pod. Returns the classification so the caller
/// can decide whether to also run application/task bookkeeping. A managed
/// pod already in a terminal phase is never inserted -- it's removed from
/// the cache instead, since there is nothing left to schedule.
pub fn add_pod(cache: &SchedulerCache, pod: &OrchestratorPod, config: &ShimConfig) -> PodClassification {
    let classification = classify_pod(pod, config);
    if classification == PodClassification::Foreign {
        reconcile_foreign_occupancy(cache, pod);
    } else if pod.phase.is_terminal() {
        cache.remove_pod(&pod.uid);
        return classification;
    }
    cache.add_pod(CachedPod::new(pod.clone(), classification));
    classification
}

/// Reconciles an updated pod. A pod that was foreign and is now managed (or
/// vice versa, e.g. its `schedulerName` changed) drops its stale occupancy
/// contribution before the new classification takes over. A managed pod that
/// has gone terminal is removed from the cache rather than updated.
pub fn update_pod(cache: &SchedulerCache, pod: &OrchestratorPod, config: &ShimConfig) -> PodClassification {
    let classification = classify_pod(pod, config);
    let previous = cache.get_pod(&pod.uid);

    if classification == PodClassification::Foreign {
        reconcile_foreign_occupancy(cache, pod);
    } else {
        if let Some(previous) = &previous {
            if previous.classification == PodClassification::Foreign {
                if let Some(node_id) = previous.pod.node_name.as_deref() {
                    cache.update_occupied_resource(node_id, &pod.uid, ResourceVector::zero(), ResourceOp::Sub);
                }
            }
        }
        if pod.phase.is_terminal() {
            cache.remove_pod(&pod.uid);
            return classification;
        }
    }

    cache.update_pod(CachedPod::new(pod.clone(), classification));
    classification
}

/// Removes a pod, resolving a tombstone to the last-known uid when needed,
/// and clears any foreign occupancy it still held.
pub fn delete_pod(cache: &SchedulerCache, tombstone: MaybeTombstone<OrchestratorPod>) -> Option<CachedPod> {
    let pod_uid = match &tombstone {
        MaybeTombstone::Live(pod) => pod.uid.clone(),
        MaybeTombstone::Tombstone { key, obj } => {
            obj.as_ref().map(|p| p.uid.clone()).unwrap_or_else(|| key.clone())
        }
    };
    let removed = cache.remove_pod(&pod_uid);
    if let Some(cached) = &removed {
        if cached.classification == PodClassification::Foreign {
            if let Some(node_id) = cached.pod.node_name.as_deref() {
                cache.update_occupied_resource(node_id, &pod_uid, ResourceVector::zero(), ResourceOp::Sub);
            }
        }
    }
    removed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::PodPhase;
    use std::collections::BTreeMap;

    fn foreign_pod(uid: &str, node: &str) -> OrchestratorPod {
        OrchestratorPod {
            uid: uid.to_string(),
            namespace: "default".to_string(),
            name: uid.to_string(),
            scheduler_name: Some("default-scheduler".to_string()),
            node_name: Some(node.to_string()),
            phase: PodPhase::Running,
            labels: BTreeMap::new(),
            annotations: BTreeMap::new(),
            resource_requests: ResourceVector::new(1_000_000_000, 500),
        }
    }

    fn managed_pod(uid: &str) -> OrchestratorPod {
        OrchestratorPod {
            uid: uid.to_string(),
            namespace: "default".to_string(),
            name: uid.to_string(),
            scheduler_name: Some("yunikorn".to_string()),
            node_name: None,
            phase: PodPhase::Pending,
            labels: BTreeMap::new(),
            annotations: BTreeMap::new(),
            resource_requests: ResourceVector::zero(),
        }
    }

    #[test]
    fn foreign_pod_adds_occupancy_once() {
        let cache = SchedulerCache::new();
        let config = ShimConfig::default();
        cache.add_node("n1", ResourceVector::new(10_000_000_000, 10_000));

        let pod = foreign_pod("p1", "n1");
        assert_eq!(add_pod(&cache, &pod, &config), PodClassification::Foreign);
        assert_eq!(update_pod(&cache, &pod, &config), PodClassification::Foreign);

        let (_, occupied, _) = cache.snapshot_resources("n1");
        assert_eq!(occupied, ResourceVector::new(1_000_000_000, 500));
    }

    #[test]
    fn foreign_pod_completion_clears_occupancy() {
        let cache = SchedulerCache::new();
        let config = ShimConfig::default();
        cache.add_node("n1", ResourceVector::new(10_000_000_000, 10_000));

        let mut pod = foreign_pod("p1", "n1");
        add_pod(&cache, &pod, &config);
        pod.phase = PodPhase::Succeeded;
        update_pod(&cache, &pod, &config);

        let (_, occupied, _) = cache.snapshot_resources("n1");
        assert_eq!(occupied, ResourceVector::zero());
    }

    #[test]
    fn managed_pod_classification_is_not_foreign() {
        let cache = SchedulerCache::new();
        let config = ShimConfig::default();
        assert_eq!(
            add_pod(&cache, &managed_pod("p1"), &config),
            PodClassification::Managed
        );
    }

    #[test]
    fn terminal_managed_pod_is_not_cached_on_add() {
        let cache = SchedulerCache::new();
        let config = ShimConfig::default();
        let mut pod = managed_pod("p1");
        pod.phase = PodPhase::Succeeded;

        assert_eq!(add_pod(&cache, &pod, &config), PodClassification::Managed);
        assert!(cache.get_pod("p1").is_none());
    }

    #[test]
    fn managed_pod_going_terminal_is_removed_on_update() {
        let cache = SchedulerCache::new();
        let config = ShimConfig::default();
        let mut pod = managed_pod("p1");
        add_pod(&cache, &pod, &config);
        assert!(cache.get_pod("p1").is_some());

        pod.phase = PodPhase::Failed;
        assert_eq!(update_pod(&cache, &pod, &config), PodClassification::Managed);
        assert!(cache.get_pod("p1").is_none());
    }

    #[test]
    fn delete_pod_resolves_tombstone_and_clears_occupancy() {
        let cache = SchedulerCache::new();
        let config = ShimConfig::default();
        cache.add_node("n1", ResourceVector::new(10_000_000_000, 10_000));
        let pod = foreign_pod("p1", "n1");
        add_pod(&cache, &pod, &config);

        let removed = delete_pod(
            &cache,
            MaybeTombstone::Tombstone {
                key: "p1".to_string(),
                obj: Some(pod),
            },
        );
        assert!(removed.is_some());
        let (_, occupied, _) = cache.snapshot_resources("n1");
        assert_eq!(occupied, ResourceVector::zero());
    }
}
