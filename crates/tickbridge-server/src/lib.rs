//! Embedded HTTP control server. Runs on its own worker thread with a
//! dedicated tokio runtime; every read goes through the shared snapshot
//! store or a bounded host-thread round trip, so no handler ever touches
//! host state directly.

mod routes;
mod server;

#[cfg(test)]
mod tests;

pub use routes::{ServerState, router};
pub use server::{ControlServer, ServerStatus};
