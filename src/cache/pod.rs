/*!
 * Cached Pod
 */

use crate::orchestrator::OrchestratorPod;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PodClassification {
    Foreign,
    Managed,
    Orphan,
}

#[derive(Debug, Clone)]
pub struct CachedPod {
    pub pod: OrchestratorPod,
    pub assumed: bool,
    pub volumes_bound: bool,
    pub classification: PodClassification,
}

impl CachedPod {
    pub fn new(pod: OrchestratorPod, classification: PodClassification) -> Self {
        Self {
            pod,
            assumed: false,
            volumes_bound: false,
            classification,
        }
    }
}
