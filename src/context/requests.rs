/*!
 * Context Request DTOs
 * Inputs to the Context's public application/task operations.
 */

use std::collections::BTreeMap;

use crate::orchestrator::OrchestratorPod;

#[derive(Debug, Clone)]
pub struct AddApplicationRequest {
    pub application_id: String,
    pub queue: String,
    pub user: String,
    pub groups: Vec<String>,
    pub tags: BTreeMap<String, String>,
    /// Namespace the application was submitted under, if any (drives the
    /// namespace quota resolver).
    pub namespace: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AddTaskRequest {
    pub application_id: String,
    pub task_id: String,
    pub pod: OrchestratorPod,
}
