use crate::value::{Value, ValueKind};

/// Fault raised from inside a located member. Maps to
/// [`CapabilityError::InvocationFailed`](crate::CapabilityError), never to a
/// host-fatal error.
#[derive(Debug, Clone)]
pub struct MemberFault {
    pub message: String,
}

impl MemberFault {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Declared parameter list of an invocable member.
#[derive(Debug, Clone)]
pub struct MethodSig {
    pub params: Vec<ValueKind>,
}

impl MethodSig {
    pub fn new(params: Vec<ValueKind>) -> Self {
        Self { params }
    }
}

/// One node of the host's object graph, exposing members by name.
///
/// Every accessor returns `None` for members the object does not have; the
/// adapter treats that as "try the next candidate". Objects live on the host
/// thread only and are never touched from server workers.
pub trait HostObject {
    /// Full-qualified type name, e.g. `sim.play.SpeedControl`.
    fn type_name(&self) -> &str;

    fn read_property(&self, _name: &str) -> Option<Value> {
        None
    }

    fn read_field(&self, _name: &str) -> Option<Value> {
        None
    }

    /// `None` when the member is not writable on this object.
    fn write_member(&mut self, _name: &str, _value: Value) -> Option<Result<(), MemberFault>> {
        None
    }

    /// Declared signature of an invocable member, or `None` when absent.
    fn method_sig(&self, _name: &str) -> Option<MethodSig> {
        None
    }

    /// Called only for names `method_sig` answered for, with arguments
    /// already coerced to the declared kinds.
    fn invoke(&mut self, name: &str, _args: &[Value]) -> Result<Value, MemberFault> {
        Err(MemberFault::new(format!("`{name}` is not invocable")))
    }

    /// Simple members worth including in a read-only state snapshot.
    fn snapshot_members(&self) -> Vec<(String, Value)> {
        Vec::new()
    }
}

pub(crate) fn short_name(type_name: &str) -> &str {
    type_name.rsplit('.').next().unwrap_or(type_name)
}
