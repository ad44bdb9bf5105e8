/*!
 * Dispatcher Module
 *
 * Process-wide, single-consumer event bus with typed handlers keyed by event
 * kind.
 *
 * - **events**: `DispatcherEvent` and its per-kind payload variants
 * - **dispatcher**: the `Dispatcher` service (`Start`/`Stop`/`Dispatch`)
 */

pub mod dispatcher;
pub mod events;

pub use dispatcher::{Dispatcher, EventHandler};
pub use events::{ApplicationEvent, CachedNodeEvent, DispatcherEvent, EventKind, TaskEvent};
