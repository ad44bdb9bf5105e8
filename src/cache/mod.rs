/*!
 * Scheduler Cache Module
 *
 * Authoritative in-memory view of nodes, pods, assumed-pod state, priority
 * classes, and per-node foreign occupancy.
 *
 * - **node**: cached node lifecycle and resource vectors
 * - **pod**: cached pod, classification {foreign, managed, orphan}
 * - **occupancy**: idempotent per-node foreign-pod resource accounting
 * - **cache**: the `SchedulerCache` facade that owns all of the above
 */

pub mod cache;
pub mod node;
pub mod occupancy;
pub mod pod;

pub use cache::{ResourceOp, SchedulerCache};
pub use node::{CachedNode, NodeLifecycle};
pub use pod::{CachedPod, PodClassification};
