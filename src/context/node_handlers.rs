/*!
 * Node Handlers
 * Orchestrator node add/update/delete wiring: mirror the
 * node into the cache, push the resulting capacity/occupancy snapshot to the
 * scheduling core, then notify the dispatcher. A node's first acceptance also
 * publishes an orchestrator event recording it. Free functions rather than
 * `Context` methods so they can be unit tested against a bare cache/mock RPC
 * pair without constructing a whole `Context`.
 */

use crate::cache::{NodeLifecycle, SchedulerCache};
use crate::dispatcher::{CachedNodeEvent, Dispatcher, DispatcherEvent};
use crate::errors::ShimError;
use crate::event_recorder::{EventObjectKind, EventRecorder, OrchestratorEvent};
use crate::orchestrator::{MaybeTombstone, OrchestratorNode};
use crate::resources::ResourceVector;
use crate::rpc::{NodeAction, NodeUpdateEntry, SchedulingCoreClient, UpdateNodeRequest};

fn push_node_snapshot(
    cache: &SchedulerCache,
    rpc: &dyn SchedulingCoreClient,
    node_id: &str,
    action: NodeAction,
) -> Result<(), ShimError> {
    let (schedulable_resource, occupied_resource, _found) = cache.snapshot_resources(node_id);
    rpc.update_node(UpdateNodeRequest {
        nodes: vec![NodeUpdateEntry {
            node_id: node_id.to_string(),
            action,
            schedulable_resource,
            occupied_resource,
        }],
    })?;
    Ok(())
}

/// Registers a newly observed node. Idempotent: re-adding an already-known
/// node behaves like `update_node`.
pub fn add_node(
    cache: &SchedulerCache,
    rpc: &dyn SchedulingCoreClient,
    dispatcher: &Dispatcher,
    event_recorder: &dyn EventRecorder,
    node: &OrchestratorNode,
) -> Result<(), ShimError> {
    let existed = cache.get_node(&node.name).is_some();
    cache.add_node(node.name.clone(), node.allocatable.clone());
    if !existed {
        cache.set_node_state(&node.name, NodeLifecycle::Accepted);
    }
    let action = if existed { NodeAction::Update } else { NodeAction::Register };
    push_node_snapshot(cache, rpc, &node.name, action)?;
    if !existed {
        dispatcher.dispatch(DispatcherEvent::CachedNode(CachedNodeEvent::Accepted {
            node_id: node.name.clone(),
        }));
        event_recorder.publish(OrchestratorEvent {
            object_kind: EventObjectKind::Node,
            object_id: node.name.clone(),
            reason: "Accepted".to_string(),
            message: "accepted by the scheduler".to_string(),
        });
    }
    Ok(())
}

/// Refreshes a node's schedulable capacity. Preserves the occupied resource
/// tracked so far.
pub fn update_node(
    cache: &SchedulerCache,
    rpc: &dyn SchedulingCoreClient,
    dispatcher: &Dispatcher,
    event_recorder: &dyn EventRecorder,
    node: &OrchestratorNode,
) -> Result<(), ShimError> {
    add_node(cache, rpc, dispatcher, event_recorder, node)
}

/// Removes a node, resolving the tombstone to a node name when the informer
/// only delivered the last-known key.
pub fn delete_node(
    cache: &SchedulerCache,
    rpc: &dyn SchedulingCoreClient,
    dispatcher: &Dispatcher,
    tombstone: MaybeTombstone<OrchestratorNode>,
) -> Result<(), ShimError> {
    let node_id = match &tombstone {
        MaybeTombstone::Live(node) => node.name.clone(),
        MaybeTombstone::Tombstone { key, obj } => {
            obj.as_ref().map(|n| n.name.clone()).unwrap_or_else(|| key.clone())
        }
    };
    cache.remove_node(&node_id);
    rpc.update_node(UpdateNodeRequest {
        nodes: vec![NodeUpdateEntry {
            node_id: node_id.clone(),
            action: NodeAction::Decommission,
            schedulable_resource: ResourceVector::zero(),
            occupied_resource: ResourceVector::zero(),
        }],
    })?;
    dispatcher.dispatch(DispatcherEvent::CachedNode(CachedNodeEvent::Removed { node_id }));
    Ok(())
}
