/*!
 * Scheduler Shim Context - Main Entry Point
 *
 * Wires a `Context` against logging stand-ins for the external collaborators
 * (scheduling-core RPC, volume binder, event recorder, namespace reader)
 * that a real deployment would back with an actual orchestrator client and
 * scheduling-core connection. Those integrations are out of scope for this
 * crate; this binary only demonstrates that the wiring compiles and runs.
 */

use std::sync::Arc;
use std::time::Duration;

use log::{info, warn};

use scheduler_shim::{
    errors::Result as ShimResult, Context, Dispatcher, EventObjectKind, Namespace, NamespaceReader,
    OrchestratorEvent, OrchestratorNode, ResourceVector, SchedulerCache, SchedulingCoreClient, ShimConfig,
    VolumeBinder,
};

struct LoggingSchedulingCoreClient;

impl SchedulingCoreClient for LoggingSchedulingCoreClient {
    fn register_application(&self, req: scheduler_shim::ApplicationRegistration) -> ShimResult<()> {
        info!("scheduling-core: register_application {}", req.application_id);
        Ok(())
    }

    fn update_node(&self, req: scheduler_shim::UpdateNodeRequest) -> ShimResult<()> {
        for entry in &req.nodes {
            info!("scheduling-core: update_node {} action={:?}", entry.node_id, entry.action);
        }
        Ok(())
    }

    fn update_allocation(&self, req: scheduler_shim::rpc::UpdateAllocationRequest) -> ShimResult<()> {
        info!("scheduling-core: update_allocation ({} asks)", req.allocations.len());
        Ok(())
    }
}

struct NoopVolumeBinder;

impl VolumeBinder for NoopVolumeBinder {
    fn get_pod_volume_claims(
        &self,
        _pod_uid: &str,
    ) -> Result<scheduler_shim::PodVolumeClaims, scheduler_shim::errors::VolumeBindingError> {
        Ok(scheduler_shim::PodVolumeClaims::default())
    }

    fn find_pod_volumes(
        &self,
        _pod_uid: &str,
        _node_name: &str,
    ) -> Result<scheduler_shim::PodVolumes, scheduler_shim::errors::VolumeBindingError> {
        Ok(scheduler_shim::PodVolumes {
            conflict_reasons: vec![],
            all_bound: true,
        })
    }

    fn assume_pod_volumes(
        &self,
        _pod_uid: &str,
        _node_name: &str,
    ) -> Result<(), scheduler_shim::errors::VolumeBindingError> {
        Ok(())
    }
}

struct LoggingEventRecorder;

impl scheduler_shim::EventRecorder for LoggingEventRecorder {
    fn publish(&self, event: OrchestratorEvent) {
        match event.object_kind {
            EventObjectKind::Node => info!("event: node {}: {} ({})", event.object_id, event.reason, event.message),
            EventObjectKind::Application => {
                info!("event: application {}: {} ({})", event.object_id, event.reason, event.message)
            }
            EventObjectKind::Task => info!("event: task {}: {} ({})", event.object_id, event.reason, event.message),
        }
    }
}

struct NoNamespaceReader;

impl NamespaceReader for NoNamespaceReader {
    fn get_namespace(&self, _name: &str) -> Option<Namespace> {
        None
    }
}

fn main() {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    info!("scheduler shim context starting...");
    info!("================================================");

    let config = ShimConfig::default();
    let cache = SchedulerCache::new();
    let dispatcher = Dispatcher::new(config.dispatcher_queue_capacity);
    dispatcher.start();

    let context = Arc::new(Context::new(
        cache,
        dispatcher,
        Arc::new(LoggingSchedulingCoreClient),
        Arc::new(NoopVolumeBinder),
        Arc::new(NoNamespaceReader),
        Arc::new(LoggingEventRecorder),
        config,
    ));

    info!("running InitializeState with an empty snapshot (no orchestrator connection wired)");
    context.initialize_state(scheduler_shim::RecoverySnapshot::default());

    if let Err(e) = context.add_node(&OrchestratorNode {
        name: "placeholder-node".to_string(),
        allocatable: ResourceVector::new(4_000_000_000, 4000),
    }) {
        warn!("add_node failed: {}", e);
    }

    info!("shim context ready");
    info!("================================================");

    loop {
        let snapshot = context.dump_state();
        info!(
            "state: {} applications, {} nodes, {} pods",
            snapshot.applications.len(),
            snapshot.node_count,
            snapshot.pod_count
        );
        std::thread::sleep(Duration::from_secs(30));
    }
}
