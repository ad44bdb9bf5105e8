/*!
 * Scheduler Cache
 * Authoritative in-memory map of nodes, pods, assumed-pod set, priority
 * classes, and per-node foreign occupancy. Every collection is guarded by its
 * own lock so readers on one collection never block writers on another.
 */

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use log::debug;
use parking_lot::RwLock;

use crate::orchestrator::{OrchestratorPod, PriorityClassSpec};
use crate::resources::ResourceVector;

use super::node::{CachedNode, NodeLifecycle};
use super::occupancy::ForeignOccupancy;
use super::pod::{CachedPod, PodClassification};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceOp {
    Add,
    Sub,
}

/// Authoritative in-process view of cluster objects relevant to scheduling.
/// Cheaply `Clone`-able: every field is an `Arc`, so handles can be shared
/// across threads without wrapping the whole cache in an outer lock.
#[derive(Clone)]
pub struct SchedulerCache {
    nodes: Arc<RwLock<HashMap<String, CachedNode>>>,
    pods: Arc<RwLock<HashMap<String, CachedPod>>>,
    assumed_pods: Arc<RwLock<HashSet<String>>>,
    priority_classes: Arc<RwLock<HashMap<String, PriorityClassSpec>>>,
    occupancy: Arc<RwLock<HashMap<String, ForeignOccupancy>>>,
}

impl Default for SchedulerCache {
    fn default() -> Self {
        Self::new()
    }
}

impl SchedulerCache {
    pub fn new() -> Self {
        Self {
            nodes: Arc::new(RwLock::new(HashMap::new())),
            pods: Arc::new(RwLock::new(HashMap::new())),
            assumed_pods: Arc::new(RwLock::new(HashSet::new())),
            priority_classes: Arc::new(RwLock::new(HashMap::new())),
            occupancy: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    // ---- nodes ----------------------------------------------------------

    /// Upserts a node. An update preserves the previously-tracked occupied
    /// resource vector; only the schedulable (capacity) vector is replaced.
    pub fn add_node(&self, node_id: impl Into<String>, schedulable: ResourceVector) {
        let node_id = node_id.into();
        let mut nodes = self.nodes.write();
        match nodes.get_mut(&node_id) {
            Some(existing) => existing.schedulable = schedulable,
            None => {
                nodes.insert(node_id.clone(), CachedNode::new(node_id.clone(), schedulable));
            }
        }
        debug!("cache: upserted node {}", node_id);
    }

    pub fn update_node(&self, node_id: &str, schedulable: ResourceVector) {
        self.add_node(node_id.to_string(), schedulable);
    }

    pub fn set_node_state(&self, node_id: &str, state: NodeLifecycle) -> bool {
        let mut nodes = self.nodes.write();
        if let Some(node) = nodes.get_mut(node_id) {
            node.state = state;
            true
        } else {
            false
        }
    }

    pub fn remove_node(&self, node_id: &str) -> Option<CachedNode> {
        self.occupancy.write().remove(node_id);
        let removed = self.nodes.write().remove(node_id);
        if removed.is_some() {
            debug!("cache: removed node {}", node_id);
        }
        removed
    }

    pub fn get_node(&self, node_id: &str) -> Option<CachedNode> {
        self.nodes.read().get(node_id).cloned()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.read().len()
    }

    pub fn all_node_ids(&self) -> Vec<String> {
        self.nodes.read().keys().cloned().collect()
    }

    /// (capacity, occupied, found)
    pub fn snapshot_resources(&self, node_id: &str) -> (ResourceVector, ResourceVector, bool) {
        match self.nodes.read().get(node_id) {
            Some(node) => (node.schedulable.clone(), node.occupied.clone(), true),
            None => (ResourceVector::zero(), ResourceVector::zero(), false),
        }
    }

    // ---- pods -------------------------------------------------------------

    pub fn add_pod(&self, pod: CachedPod) {
        self.pods.write().insert(pod.pod.uid.clone(), pod);
    }

    pub fn update_pod(&self, pod: CachedPod) {
        self.pods.write().insert(pod.pod.uid.clone(), pod);
    }

    pub fn remove_pod(&self, pod_uid: &str) -> Option<CachedPod> {
        self.assumed_pods.write().remove(pod_uid);
        self.pods.write().remove(pod_uid)
    }

    pub fn get_pod(&self, pod_uid: &str) -> Option<CachedPod> {
        self.pods.read().get(pod_uid).cloned()
    }

    pub fn pod_count(&self) -> usize {
        self.pods.read().len()
    }

    /// `true` when the pod is managed, carries an assigned node name, and that
    /// node is not present in the cache.
    pub fn is_pod_orphaned(&self, pod_uid: &str) -> bool {
        let pods = self.pods.read();
        let Some(cached) = pods.get(pod_uid) else {
            return false;
        };
        if cached.classification == PodClassification::Foreign {
            return false;
        }
        match &cached.pod.node_name {
            Some(node_name) if !node_name.is_empty() => {
                !self.nodes.read().contains_key(node_name)
            }
            _ => false,
        }
    }

    // ---- assumed pods / volume binding -------------------------------------

    pub fn is_assumed_pod(&self, pod_uid: &str) -> bool {
        self.assumed_pods.read().contains(pod_uid)
    }

    /// Marks `pod_uid` assumed on `node_name`. Returns `false` if the pod is
    /// not present in the cache.
    pub fn assume_pod(&self, pod_uid: &str, node_name: &str, all_volumes_bound: bool) -> bool {
        let mut pods = self.pods.write();
        let Some(cached) = pods.get_mut(pod_uid) else {
            return false;
        };
        cached.pod.node_name = Some(node_name.to_string());
        cached.assumed = true;
        cached.volumes_bound = all_volumes_bound;
        drop(pods);
        self.assumed_pods.write().insert(pod_uid.to_string());
        true
    }

    pub fn are_pod_volumes_all_bound(&self, pod_uid: &str) -> bool {
        self.pods
            .read()
            .get(pod_uid)
            .map(|p| p.volumes_bound)
            .unwrap_or(false)
    }

    // ---- foreign occupancy --------------------------------------------

    /// Idempotent per (node_id, pod_uid): adding twice with the same key
    /// collapses to one entry; removing an untracked key is a no-op.
    /// Returns (previous_occupied, new_occupied, delta_applied, success).
    pub fn update_occupied_resource(
        &self,
        node_id: &str,
        pod_uid: &str,
        delta: ResourceVector,
        op: ResourceOp,
    ) -> (ResourceVector, ResourceVector, ResourceVector, bool) {
        let mut occupancy = self.occupancy.write();
        let mut nodes = self.nodes.write();
        let Some(node) = nodes.get_mut(node_id) else {
            return (
                ResourceVector::zero(),
                ResourceVector::zero(),
                ResourceVector::zero(),
                false,
            );
        };
        let previous = node.occupied.clone();
        let node_occupancy = occupancy.entry(node_id.to_string()).or_default();

        let applied = match op {
            ResourceOp::Add => {
                if node_occupancy.add(pod_uid.to_string(), delta.clone()) {
                    delta
                } else {
                    ResourceVector::zero()
                }
            }
            ResourceOp::Sub => match node_occupancy.remove(pod_uid) {
                Some(removed) => removed,
                None => ResourceVector::zero(),
            },
        };

        node.occupied = node_occupancy.total();
        (previous, node.occupied.clone(), applied, true)
    }

    /// Whether `pod_uid`'s contribution is already tracked in `node_id`'s
    /// foreign occupancy map.
    pub fn is_foreign_tracked(&self, node_id: &str, pod_uid: &str) -> bool {
        self.occupancy
            .read()
            .get(node_id)
            .map(|occ| occ.contains(pod_uid))
            .unwrap_or(false)
    }

    // ---- priority classes -----------------------------------------------

    pub fn upsert_priority_class(&self, spec: PriorityClassSpec) {
        self.priority_classes.write().insert(spec.name.clone(), spec);
    }

    pub fn remove_priority_class(&self, name: &str) -> Option<PriorityClassSpec> {
        self.priority_classes.write().remove(name)
    }

    pub fn get_priority_class(&self, name: &str) -> Option<PriorityClassSpec> {
        self.priority_classes.read().get(name).cloned()
    }

    pub fn all_pods(&self) -> Vec<OrchestratorPod> {
        self.pods.read().values().map(|c| c.pod.clone()).collect()
    }

    pub fn all_cached_pods(&self) -> Vec<CachedPod> {
        self.pods.read().values().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::{OrchestratorPod, PodPhase};
    use std::collections::BTreeMap;

    fn pod(uid: &str, node: Option<&str>) -> OrchestratorPod {
        OrchestratorPod {
            uid: uid.to_string(),
            namespace: "default".to_string(),
            name: uid.to_string(),
            scheduler_name: None,
            node_name: node.map(|s| s.to_string()),
            phase: PodPhase::Pending,
            labels: BTreeMap::new(),
            annotations: BTreeMap::new(),
            resource_requests: ResourceVector::zero(),
        }
    }

    #[test]
    fn s1_node_add_then_update_capacity() {
        let cache = SchedulerCache::new();
        cache.add_node("host0001", ResourceVector::new(1_024_000_000, 2000));
        cache.update_node("host0001", ResourceVector::new(2_048_000_000, 4000));
        let (capacity, _occupied, found) = cache.snapshot_resources("host0001");
        assert!(found);
        assert_eq!(capacity, ResourceVector::new(2_048_000_000, 4000));
    }

    #[test]
    fn update_node_preserves_occupied() {
        let cache = SchedulerCache::new();
        cache.add_node("host0001", ResourceVector::new(10_000_000_000, 10_000));
        cache.update_occupied_resource(
            "host0001",
            "pod-1",
            ResourceVector::new(1_000_000_000, 500),
            ResourceOp::Add,
        );
        cache.update_node("host0001", ResourceVector::new(20_000_000_000, 20_000));
        let (capacity, occupied, found) = cache.snapshot_resources("host0001");
        assert!(found);
        assert_eq!(capacity, ResourceVector::new(20_000_000_000, 20_000));
        assert_eq!(occupied, ResourceVector::new(1_000_000_000, 500));
    }

    #[test]
    fn s3_foreign_pod_lifecycle() {
        let cache = SchedulerCache::new();
        cache.add_node("Host1", ResourceVector::new(10_000_000_000, 10_000));

        let (_, occupied, _, ok) = cache.update_occupied_resource(
            "Host1",
            "pod2",
            ResourceVector::new(1_000_000_000, 500),
            ResourceOp::Add,
        );
        assert!(ok);
        assert_eq!(occupied, ResourceVector::new(1_000_000_000, 500));

        let (_, occupied, _, _) =
            cache.update_occupied_resource("Host1", "pod2", ResourceVector::zero(), ResourceOp::Sub);
        assert_eq!(occupied, ResourceVector::zero());

        let (_, occupied, _, _) = cache.update_occupied_resource(
            "Host1",
            "pod2",
            ResourceVector::new(1_000_000_000, 500),
            ResourceOp::Add,
        );
        assert_eq!(occupied, ResourceVector::new(1_000_000_000, 500));
    }

    #[test]
    fn double_add_is_idempotent_on_occupancy() {
        let cache = SchedulerCache::new();
        cache.add_node("n1", ResourceVector::new(10_000_000_000, 10_000));
        cache.update_occupied_resource("n1", "p1", ResourceVector::new(100, 50), ResourceOp::Add);
        cache.update_occupied_resource("n1", "p1", ResourceVector::new(999, 999), ResourceOp::Add);
        let (_, occupied, _, _) = cache.snapshot_resources("n1");
        assert_eq!(occupied, ResourceVector::new(100, 50));
    }

    #[test]
    fn orphan_detection() {
        let cache = SchedulerCache::new();
        cache.add_pod(CachedPod::new(pod("p1", Some("missing-node")), PodClassification::Managed));
        assert!(cache.is_pod_orphaned("p1"));

        cache.add_node("missing-node", ResourceVector::zero());
        assert!(!cache.is_pod_orphaned("p1"));
    }

    #[test]
    fn remove_pod_clears_assumed_flag() {
        let cache = SchedulerCache::new();
        cache.add_pod(CachedPod::new(pod("p1", None), PodClassification::Managed));
        cache.add_node("n1", ResourceVector::zero());
        cache.assume_pod("p1", "n1", false);
        assert!(cache.is_assumed_pod("p1"));
        cache.remove_pod("p1");
        assert!(!cache.is_assumed_pod("p1"));
        assert!(cache.get_pod("p1").is_none());
    }
}
