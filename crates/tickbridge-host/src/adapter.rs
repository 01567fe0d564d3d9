use std::collections::HashMap;

use thiserror::Error;
use tracing::debug;

use crate::graph::HostGraph;
use crate::object::MethodSig;
use crate::value::Value;

#[derive(Debug, Error)]
pub enum CapabilityError {
    #[error("capability not found: {type_name}::{member}")]
    NotFound { type_name: String, member: String },
    #[error("invocation of {type_name}::{member} failed: {details}")]
    InvocationFailed {
        type_name: String,
        member: String,
        details: String,
    },
}

#[derive(Debug, Clone)]
pub enum MemberKind {
    Property,
    Field,
    Method(MethodSig),
}

/// Resolved `(object, member)` pair. Created lazily on first successful
/// resolution and retained for the life of the process; the host's type
/// shapes are assumed stable after startup.
#[derive(Debug, Clone)]
pub struct CapabilityHandle {
    slot: usize,
    type_name: String,
    member: String,
    kind: MemberKind,
}

impl CapabilityHandle {
    pub fn kind(&self) -> &MemberKind {
        &self.kind
    }
}

/// Locates and drives members of the host graph by name. Lives on the host
/// thread only; the cache is never read or written from server workers.
pub struct CapabilityAdapter {
    graph: HostGraph,
    cache: HashMap<(String, String), CapabilityHandle>,
}

impl CapabilityAdapter {
    pub fn new(graph: HostGraph) -> Self {
        Self {
            graph,
            cache: HashMap::new(),
        }
    }

    pub fn graph(&self) -> &HostGraph {
        &self.graph
    }

    /// Member resolution tries a property getter, then a field, then a
    /// method; the first that exists wins.
    pub fn resolve(
        &mut self,
        type_name: &str,
        member: &str,
    ) -> Result<CapabilityHandle, CapabilityError> {
        let key = (type_name.trim().to_string(), member.trim().to_string());
        if let Some(handle) = self.cache.get(&key) {
            return Ok(handle.clone());
        }

        let handle = self.resolve_uncached(&key.0, &key.1)?;
        debug!(
            type_name = key.0.as_str(),
            member = key.1.as_str(),
            "capability resolved"
        );
        self.cache.insert(key, handle.clone());
        Ok(handle)
    }

    fn resolve_uncached(
        &self,
        type_name: &str,
        member: &str,
    ) -> Result<CapabilityHandle, CapabilityError> {
        let not_found = || CapabilityError::NotFound {
            type_name: type_name.to_string(),
            member: member.to_string(),
        };
        if member.is_empty() {
            return Err(not_found());
        }
        let slot = self.graph.find(type_name).ok_or_else(not_found)?;
        let object = self.graph.object(slot).ok_or_else(not_found)?;

        let kind = if object.read_property(member).is_some() {
            MemberKind::Property
        } else if object.read_field(member).is_some() {
            MemberKind::Field
        } else if let Some(sig) = object.method_sig(member) {
            MemberKind::Method(sig)
        } else {
            return Err(not_found());
        };

        Ok(CapabilityHandle {
            slot,
            type_name: object.type_name().to_string(),
            member: member.to_string(),
            kind,
        })
    }

    pub fn read(&self, handle: &CapabilityHandle) -> Result<Value, CapabilityError> {
        let object = self
            .graph
            .object(handle.slot)
            .ok_or_else(|| self.stale(handle))?;
        match &handle.kind {
            MemberKind::Property => object.read_property(&handle.member),
            MemberKind::Field => object.read_field(&handle.member),
            MemberKind::Method(_) => {
                return Err(self.fault(handle, "member is a method, not readable"));
            }
        }
        .ok_or_else(|| self.stale(handle))
    }

    pub fn write(
        &mut self,
        handle: &CapabilityHandle,
        value: Value,
    ) -> Result<(), CapabilityError> {
        let (type_name, member) = (handle.type_name.clone(), handle.member.clone());
        let object = self
            .graph
            .object_mut(handle.slot)
            .ok_or_else(|| CapabilityError::NotFound {
                type_name: type_name.clone(),
                member: member.clone(),
            })?;
        match object.write_member(&member, value) {
            Some(Ok(())) => Ok(()),
            Some(Err(fault)) => Err(CapabilityError::InvocationFailed {
                type_name,
                member,
                details: fault.message,
            }),
            None => Err(CapabilityError::InvocationFailed {
                type_name,
                member,
                details: "member is not writable".to_string(),
            }),
        }
    }

    /// Coerces each argument to the declared parameter kind and invokes the
    /// member. Coercion failures and faults from inside the member are both
    /// retryable `InvocationFailed`s; the batch continues.
    pub fn invoke(
        &mut self,
        handle: &CapabilityHandle,
        args: &[Value],
    ) -> Result<Value, CapabilityError> {
        let sig = match &handle.kind {
            MemberKind::Method(sig) => sig.clone(),
            _ => return Err(self.fault(handle, "member is not invocable")),
        };
        if sig.params.len() != args.len() {
            return Err(self.fault(
                handle,
                format!("expected {} argument(s), got {}", sig.params.len(), args.len()),
            ));
        }

        let mut coerced = Vec::with_capacity(args.len());
        for (position, (arg, kind)) in args.iter().zip(sig.params.iter()).enumerate() {
            let value = arg
                .coerce_to(kind)
                .map_err(|details| self.fault(handle, format!("argument {position}: {details}")))?;
            coerced.push(value);
        }

        let (type_name, member) = (handle.type_name.clone(), handle.member.clone());
        let object = self
            .graph
            .object_mut(handle.slot)
            .ok_or_else(|| CapabilityError::NotFound {
                type_name: type_name.clone(),
                member: member.clone(),
            })?;
        object
            .invoke(&member, &coerced)
            .map_err(|fault| CapabilityError::InvocationFailed {
                type_name,
                member,
                details: fault.message,
            })
    }

    /// Resolve-and-read in one step.
    pub fn read_member(&mut self, type_name: &str, member: &str) -> Result<Value, CapabilityError> {
        let handle = self.resolve(type_name, member)?;
        self.read(&handle)
    }

    /// Resolve-and-invoke in one step.
    pub fn invoke_member(
        &mut self,
        type_name: &str,
        member: &str,
        args: &[Value],
    ) -> Result<Value, CapabilityError> {
        let handle = self.resolve(type_name, member)?;
        self.invoke(&handle, args)
    }

    /// Resolve-and-write in one step.
    pub fn write_member(
        &mut self,
        type_name: &str,
        member: &str,
        value: Value,
    ) -> Result<(), CapabilityError> {
        let handle = self.resolve(type_name, member)?;
        self.write(&handle, value)
    }

    fn stale(&self, handle: &CapabilityHandle) -> CapabilityError {
        CapabilityError::NotFound {
            type_name: handle.type_name.clone(),
            member: handle.member.clone(),
        }
    }

    fn fault(&self, handle: &CapabilityHandle, details: impl Into<String>) -> CapabilityError {
        CapabilityError::InvocationFailed {
            type_name: handle.type_name.clone(),
            member: handle.member.clone(),
            details: details.into(),
        }
    }
}
