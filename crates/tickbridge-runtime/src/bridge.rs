use crossbeam_channel::{Receiver, Sender, unbounded};
use tickbridge_core::{ControlRequest, ControlResponse};
use tokio::sync::oneshot;

/// Synchronous "ask the host thread" round trip. Server workers send one of
/// these and wait on the reply with a bounded timeout; the controller drains
/// the mailbox once per tick, so the host thread never blocks on network
/// I/O.
pub enum HostQuery {
    /// Live coarse speed and pause state; `None` when the speed capability
    /// is not present in the host graph.
    LiveSpeed {
        reply: oneshot::Sender<Option<(i64, bool)>>,
    },
    /// Offer of a request the fixed route table did not match to the active
    /// runtime module. `None` means unhandled (or no module attached).
    ModuleRequest {
        request: ControlRequest,
        reply: oneshot::Sender<Option<ControlResponse>>,
    },
}

pub type HostQueryTx = Sender<HostQuery>;
pub type HostQueryRx = Receiver<HostQuery>;

pub fn host_query_channel() -> (HostQueryTx, HostQueryRx) {
    unbounded()
}
