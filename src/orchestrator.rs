/*!
 * Orchestrator Object Model
 * Minimal representations of the cluster-orchestrator objects this shim reads
 * (pods, nodes, namespaces, priority classes) and the tombstone wrapper the
 * informer framework delivers for deletions whose final state is unknown.
 *
 * The informer framework itself, RBAC, and CRD wiring are out of scope
 * and are not modeled here.
 */

use std::collections::BTreeMap;

use crate::resources::ResourceVector;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PodPhase {
    Pending,
    Running,
    Succeeded,
    Failed,
    Unknown,
}

impl PodPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PodPhase::Succeeded | PodPhase::Failed)
    }
}

/// A pod as delivered by the orchestrator informer.
#[derive(Debug, Clone)]
pub struct OrchestratorPod {
    pub uid: String,
    pub namespace: String,
    pub name: String,
    pub scheduler_name: Option<String>,
    pub node_name: Option<String>,
    pub phase: PodPhase,
    pub labels: BTreeMap<String, String>,
    pub annotations: BTreeMap<String, String>,
    pub resource_requests: ResourceVector,
}

impl OrchestratorPod {
    pub fn alias(&self) -> String {
        format!("{}/{}", self.namespace, self.name)
    }

    pub fn application_id(&self, config: &crate::config::ShimConfig) -> Option<String> {
        self.annotations
            .get(&config.application_id_annotation())
            .or_else(|| self.labels.get("applicationId"))
            .cloned()
    }

    pub fn is_assigned(&self) -> bool {
        self.node_name.as_deref().is_some_and(|n| !n.is_empty())
    }
}

/// A node as delivered by the orchestrator informer.
#[derive(Debug, Clone)]
pub struct OrchestratorNode {
    pub name: String,
    pub allocatable: ResourceVector,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreemptionPolicy {
    PreemptLowerPriority,
    PreemptNever,
}

#[derive(Debug, Clone)]
pub struct PriorityClassSpec {
    pub name: String,
    pub value: i32,
    pub preemption_policy: PreemptionPolicy,
    pub allow_preemption: bool,
}

#[derive(Debug, Clone)]
pub struct Namespace {
    pub name: String,
    pub annotations: BTreeMap<String, String>,
}

/// Wraps a deleted object as delivered by the informer: either the real final
/// object, or a tombstone carrying only the key and (maybe) the last-known
/// object.
#[derive(Debug, Clone)]
pub enum MaybeTombstone<T> {
    Live(T),
    Tombstone { key: String, obj: Option<T> },
}

impl<T> MaybeTombstone<T> {
    /// Normalizes to the underlying object, or `None` if it can't be resolved
    /// (a tombstone with no cached object).
    pub fn resolve(self) -> Option<T> {
        match self {
            MaybeTombstone::Live(obj) => Some(obj),
            MaybeTombstone::Tombstone { obj, .. } => obj,
        }
    }

    pub fn key(&self) -> Option<&str> {
        match self {
            MaybeTombstone::Tombstone { key, .. } => Some(key),
            MaybeTombstone::Live(_) => None,
        }
    }
}

/// Read-only access to namespace objects, backed by the orchestrator's
/// informer cache in a real deployment. The shim only depends on this trait
/// boundary, never on a concrete informer implementation.
pub trait NamespaceReader: Send + Sync {
    fn get_namespace(&self, name: &str) -> Option<Namespace>;
}
