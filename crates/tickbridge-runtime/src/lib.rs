//! Host-thread side of the control plane: the pending action queue, the
//! action engine, the hot-reload coordinator and the controller that ties
//! them to the host's tick callback.

mod bridge;
mod controller;
mod engine;
mod queue;
mod reload;
mod snapshot;

#[cfg(test)]
mod tests;

pub use bridge::{HostQuery, HostQueryRx, HostQueryTx, host_query_channel};
pub use controller::{Controller, HostCtx};
pub use engine::{
    ActionEngine, BatchOutcome, ExecutionContext, MAX_SPEED, MIN_SPEED, SPEED_CONTROL_TYPE,
};
pub use queue::{ActionQueue, DrainedBatch};
pub use reload::{
    ActiveModule, LibraryLoader, LoadedArtifact, ModuleLoader, ReloadCoordinator,
};
pub use snapshot::SnapshotStore;
