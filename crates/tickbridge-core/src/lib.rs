mod action;
mod config;
mod control;
pub mod error;
mod notify;

#[cfg(test)]
mod tests;

pub use action::{ActionRequest, ActionResult, ActionStatus};
pub use config::ControlPlaneConfig;
pub use control::{ControlRequest, ControlResponse};
pub use error::{Error, Result};
pub use notify::{NotificationSink, NullSink};
