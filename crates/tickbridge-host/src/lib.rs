//! Late-bound access to the host's object graph.
//!
//! The host exposes no stable compile-time contract for its internals, so the
//! embedder registers its objects here by name at startup and everything else
//! in the control plane reaches them through [`CapabilityAdapter`] lookups.
//! Absence is the common case and is always reported as a structured
//! not-found, never a panic.

mod adapter;
mod graph;
mod object;
mod value;


pub use adapter::{CapabilityAdapter, CapabilityError, CapabilityHandle, MemberKind};
pub use graph::HostGraph;
pub use object::{HostObject, MemberFault, MethodSig};
pub use value::{Value, ValueKind};
