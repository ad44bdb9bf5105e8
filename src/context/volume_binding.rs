/*!
 * Volume Binding Handshake
 * The `AssumePod` sequence: no-op on a pod unknown to the cache, else fetch
 * the pod's volume claims, short-circuit pods with none, find candidate
 * volumes on the target node, fail on any conflict, tentatively bind, then
 * record the assumption in the cache. Each step's failure surface is
 * distinct, so this stays a free function over explicit collaborators
 * rather than a `Context` method threading `self` through every branch.
 */

use crate::cache::SchedulerCache;
use crate::errors::VolumeBindingError;
use crate::volume_binder::VolumeBinder;

pub fn assume_pod(
    cache: &SchedulerCache,
    volume_binder: &dyn VolumeBinder,
    pod_uid: &str,
    pod_alias: &str,
    node_name: &str,
) -> Result<(), VolumeBindingError> {
    // Step 1: a pod unknown to the cache has nothing to assume.
    if cache.get_pod(pod_uid).is_none() {
        return Ok(());
    }

    // Step 2: fetch the pod's volume claims.
    let claims = volume_binder.get_pod_volume_claims(pod_uid)?;

    // Step 3: no claims means there is nothing to bind.
    if claims.claim_names.is_empty() {
        cache.assume_pod(pod_uid, node_name, true);
        return Ok(());
    }

    // Step 4: find the volumes this node can satisfy the claims with.
    let volumes = volume_binder.find_pod_volumes(pod_uid, node_name)?;

    // Step 5: any conflict reason fails the whole assumption.
    if !volumes.conflict_reasons.is_empty() {
        return Err(VolumeBindingError::Conflict {
            pod_name: pod_alias.to_string(),
            reasons: volumes.conflict_reasons,
        });
    }

    // Step 6: tentatively bind the matched volumes.
    volume_binder.assume_pod_volumes(pod_uid, node_name)?;

    // Step 7: record the assumption so the scheduling loop sees it immediately.
    cache.assume_pod(pod_uid, node_name, volumes.all_bound);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CachedPod, PodClassification};
    use crate::orchestrator::{OrchestratorPod, PodPhase};
    use crate::resources::ResourceVector;
    use crate::volume_binder::{MockVolumeBinder, PodVolumeClaims, PodVolumes};
    use std::collections::BTreeMap;

    fn seeded_cache() -> SchedulerCache {
        let cache = SchedulerCache::new();
        cache.add_node("n1", ResourceVector::zero());
        cache.add_pod(CachedPod::new(
            OrchestratorPod {
                uid: "p1".to_string(),
                namespace: "default".to_string(),
                name: "p1".to_string(),
                scheduler_name: Some("yunikorn".to_string()),
                node_name: None,
                phase: PodPhase::Pending,
                labels: BTreeMap::new(),
                annotations: BTreeMap::new(),
                resource_requests: ResourceVector::zero(),
            },
            PodClassification::Managed,
        ));
        cache
    }

    #[test]
    fn unknown_pod_is_a_no_op() {
        let cache = SchedulerCache::new();
        let binder = MockVolumeBinder::new();

        assume_pod(&cache, &binder, "ghost", "default/ghost", "n1").unwrap();
        assert!(!cache.is_assumed_pod("ghost"));
    }

    #[test]
    fn no_claims_assumes_fully_bound() {
        let cache = seeded_cache();
        let mut binder = MockVolumeBinder::new();
        binder
            .expect_get_pod_volume_claims()
            .returning(|_| Ok(PodVolumeClaims::default()));

        assume_pod(&cache, &binder, "p1", "default/p1", "n1").unwrap();
        assert!(cache.is_assumed_pod("p1"));
        assert!(cache.are_pod_volumes_all_bound("p1"));
    }

    #[test]
    fn conflict_reasons_fail_the_assumption() {
        let cache = seeded_cache();
        let mut binder = MockVolumeBinder::new();
        binder.expect_get_pod_volume_claims().returning(|_| {
            Ok(PodVolumeClaims {
                claim_names: vec!["data".to_string()],
            })
        });
        binder.expect_find_pod_volumes().returning(|_, _| {
            Ok(PodVolumes {
                conflict_reasons: vec!["no matching pv".to_string()],
                all_bound: false,
            })
        });

        let err = assume_pod(&cache, &binder, "p1", "default/p1", "n1").unwrap_err();
        match err {
            VolumeBindingError::Conflict { pod_name, reasons } => {
                assert_eq!(pod_name, "default/p1");
                assert_eq!(reasons, vec!["no matching pv".to_string()]);
            }
            other => panic!("expected Conflict, got {other:?}"),
        }
        assert!(!cache.is_assumed_pod("p1"));
    }

    #[test]
    fn matched_volumes_are_assumed() {
        let cache = seeded_cache();
        let mut binder = MockVolumeBinder::new();
        binder.expect_get_pod_volume_claims().returning(|_| {
            Ok(PodVolumeClaims {
                claim_names: vec!["data".to_string()],
            })
        });
        binder.expect_find_pod_volumes().returning(|_, _| {
            Ok(PodVolumes {
                conflict_reasons: vec![],
                all_bound: false,
            })
        });
        binder.expect_assume_pod_volumes().returning(|_, _| Ok(()));

        assume_pod(&cache, &binder, "p1", "default/p1", "n1").unwrap();
        assert!(cache.is_assumed_pod("p1"));
        assert!(!cache.are_pod_volumes_all_bound("p1"));
    }
}
