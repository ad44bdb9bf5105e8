/*!
 * Allocation Bookkeeping
 * Pending and in-progress pod-to-node allocation tracking.
 * An allocation for a given pod uid is pending until `StartPodAllocation`
 * arbitrates it onto the node the scheduling core actually allocated to,
 * moving it to in-progress; a uid is never tracked in both maps at once.
 */

use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingPodAllocation {
    pub pod_uid: String,
    pub node_id: String,
    pub allocation_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InProgressPodAllocation {
    pub pod_uid: String,
    pub node_id: String,
    pub allocation_key: String,
}

/// Records a pending allocation, moving the pod out of in-progress if it was
/// there. Unconditional: a uid is never tracked in both maps at once, but
/// this is achieved by always taking the write, never by refusing it.
pub fn add_pending_pod_allocation(
    pending: &mut HashMap<String, PendingPodAllocation>,
    in_progress: &mut HashMap<String, InProgressPodAllocation>,
    pod_uid: &str,
    node_id: &str,
    allocation_key: &str,
) {
    in_progress.remove(pod_uid);
    pending.insert(
        pod_uid.to_string(),
        PendingPodAllocation {
            pod_uid: pod_uid.to_string(),
            node_id: node_id.to_string(),
            allocation_key: allocation_key.to_string(),
        },
    );
}

pub fn get_pending_pod_allocation(
    pending: &HashMap<String, PendingPodAllocation>,
    pod_uid: &str,
) -> Option<PendingPodAllocation> {
    pending.get(pod_uid).cloned()
}

pub fn get_in_progress_pod_allocation(
    in_progress: &HashMap<String, InProgressPodAllocation>,
    pod_uid: &str,
) -> Option<InProgressPodAllocation> {
    in_progress.get(pod_uid).cloned()
}

/// Arbitrates a pending allocation onto `node_id`: moves it to in-progress
/// only if `node_id` matches the node it was pending on, so a second caller
/// racing with a different node loses.
pub fn start_pod_allocation(
    pending: &mut HashMap<String, PendingPodAllocation>,
    in_progress: &mut HashMap<String, InProgressPodAllocation>,
    pod_uid: &str,
    node_id: &str,
) -> bool {
    let matches_node = match pending.get(pod_uid) {
        Some(entry) => entry.node_id == node_id,
        None => false,
    };
    if !matches_node {
        return false;
    }
    let entry = pending.remove(pod_uid).expect("checked above");
    in_progress.insert(
        pod_uid.to_string(),
        InProgressPodAllocation {
            pod_uid: entry.pod_uid,
            node_id: entry.node_id,
            allocation_key: entry.allocation_key,
        },
    );
    true
}

/// Clears any pending or in-progress allocation tracked for `pod_uid`.
pub fn remove_pod_allocation(
    pending: &mut HashMap<String, PendingPodAllocation>,
    in_progress: &mut HashMap<String, InProgressPodAllocation>,
    pod_uid: &str,
) {
    pending.remove(pod_uid);
    in_progress.remove(pod_uid);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_and_in_progress_are_mutually_exclusive() {
        let mut pending = HashMap::new();
        let mut in_progress = HashMap::new();
        add_pending_pod_allocation(&mut pending, &mut in_progress, "p1", "n1", "ak-1");
        assert!(start_pod_allocation(&mut pending, &mut in_progress, "p1", "n1"));

        assert!(get_pending_pod_allocation(&pending, "p1").is_none());
        assert!(get_in_progress_pod_allocation(&in_progress, "p1").is_some());
    }

    #[test]
    fn re_adding_pending_moves_pod_back_out_of_in_progress() {
        let mut pending = HashMap::new();
        let mut in_progress = HashMap::new();
        add_pending_pod_allocation(&mut pending, &mut in_progress, "p1", "n1", "ak-1");
        start_pod_allocation(&mut pending, &mut in_progress, "p1", "n1");
        assert!(get_in_progress_pod_allocation(&in_progress, "p1").is_some());

        add_pending_pod_allocation(&mut pending, &mut in_progress, "p1", "n2", "ak-2");

        assert!(get_in_progress_pod_allocation(&in_progress, "p1").is_none());
        assert_eq!(
            get_pending_pod_allocation(&pending, "p1"),
            Some(PendingPodAllocation {
                pod_uid: "p1".to_string(),
                node_id: "n2".to_string(),
                allocation_key: "ak-2".to_string(),
            })
        );
    }

    #[test]
    fn start_allocation_rejects_node_mismatch() {
        let mut pending = HashMap::new();
        let mut in_progress = HashMap::new();
        add_pending_pod_allocation(&mut pending, &mut in_progress, "p1", "n1", "ak-1");

        assert!(!start_pod_allocation(&mut pending, &mut in_progress, "p1", "n2"));
        assert!(get_pending_pod_allocation(&pending, "p1").is_some());
        assert!(in_progress.is_empty());
    }

    #[test]
    fn remove_clears_both_maps() {
        let mut pending = HashMap::new();
        let mut in_progress = HashMap::new();
        add_pending_pod_allocation(&mut pending, &mut in_progress, "p1", "n1", "ak-1");
        start_pod_allocation(&mut pending, &mut in_progress, "p1", "n1");

        remove_pod_allocation(&mut pending, &mut in_progress, "p1");
        assert!(get_pending_pod_allocation(&pending, "p1").is_none());
        assert!(get_in_progress_pod_allocation(&in_progress, "p1").is_none());
    }
}
