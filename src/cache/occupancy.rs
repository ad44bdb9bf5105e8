/*!
 * Foreign Occupancy Tracking
 * Per-node map from pod uid to that pod's resource contribution. Keyed by uid
 * so double-add and double-remove are both safe no-ops.
 */

use std::collections::HashMap;

use crate::resources::ResourceVector;

#[derive(Debug, Clone, Default)]
pub struct ForeignOccupancy {
    contributions: HashMap<String, ResourceVector>,
}

impl ForeignOccupancy {
    pub fn contains(&self, pod_uid: &str) -> bool {
        self.contributions.contains_key(pod_uid)
    }

    /// Adds a contribution for `pod_uid`. Returns `false` (no-op) if the uid
    /// was already tracked -- double-add collapses to one entry.
    pub fn add(&mut self, pod_uid: impl Into<String>, delta: ResourceVector) -> bool {
        let pod_uid = pod_uid.into();
        if self.contributions.contains_key(&pod_uid) {
            return false;
        }
        self.contributions.insert(pod_uid, delta);
        true
    }

    /// Removes the contribution for `pod_uid`, if tracked. Removing an
    /// untracked uid is a no-op that returns `None`.
    pub fn remove(&mut self, pod_uid: &str) -> Option<ResourceVector> {
        self.contributions.remove(pod_uid)
    }

    pub fn total(&self) -> ResourceVector {
        self.contributions
            .values()
            .fold(ResourceVector::zero(), |acc, v| acc.added(v))
    }

    pub fn len(&self) -> usize {
        self.contributions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contributions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn double_add_coalesces() {
        let mut occ = ForeignOccupancy::default();
        assert!(occ.add("pod-1", ResourceVector::new(100, 50)));
        assert!(!occ.add("pod-1", ResourceVector::new(999, 999)));
        assert_eq!(occ.total(), ResourceVector::new(100, 50));
        assert_eq!(occ.len(), 1);
    }

    #[test]
    fn double_remove_is_noop() {
        let mut occ = ForeignOccupancy::default();
        occ.add("pod-1", ResourceVector::new(100, 50));
        assert_eq!(occ.remove("pod-1"), Some(ResourceVector::new(100, 50)));
        assert_eq!(occ.remove("pod-1"), None);
        assert!(occ.is_empty());
    }

    #[test]
    fn total_sums_tracked_contributions_only() {
        let mut occ = ForeignOccupancy::default();
        occ.add("pod-1", ResourceVector::new(1_000_000_000, 500));
        occ.add("pod-2", ResourceVector::new(2_000_000_000, 1000));
        assert_eq!(occ.total(), ResourceVector::new(3_000_000_000, 1500));
        occ.remove("pod-2");
        assert_eq!(occ.total(), ResourceVector::new(1_000_000_000, 500));
    }
}
