//! Stateless validation helpers shared by the router and channel state

use std::thread::{self, ThreadId};

use crate::errors::{EventBusError, EventBusResult};
use crate::object::{BusObject, MethodHandle, ObjectRef, SignalHandle};
use crate::signal::{Callback, Signature};
use crate::types::ChannelTag;

/// Fails unless called from the thread that owns the bus
pub fn ensure_owning_thread(owner: ThreadId, operation: &'static str) -> EventBusResult<()> {
    if thread::current().id() == owner {
        Ok(())
    } else {
        Err(EventBusError::NotOnOwningThread { operation })
    }
}

pub fn validate_channel_tag(tag: &ChannelTag) -> EventBusResult<()> {
    if tag.is_valid() {
        Ok(())
    } else {
        Err(EventBusError::InvalidChannel {
            tag: tag.to_string(),
        })
    }
}

/// Fails when the object is pending destruction
pub fn validate_object(object: &dyn BusObject) -> EventBusResult<()> {
    if object.header().is_garbage() {
        Err(EventBusError::InvalidObject {
            object: object.describe(),
        })
    } else {
        Ok(())
    }
}

pub fn validate_name(name: &str) -> EventBusResult<()> {
    if name.trim().is_empty() {
        Err(EventBusError::InvalidBindingName {
            name: name.to_string(),
        })
    } else {
        Ok(())
    }
}

/// Looks up a multicast signal member by name on the object's class
pub fn resolve_signal(object: &dyn BusObject, name: &str) -> EventBusResult<SignalHandle> {
    let class = object.class();
    let not_found = || EventBusError::DelegateMemberNotFound {
        class: class.name().to_string(),
        signal: name.to_string(),
    };

    let info = class.find_signal(name).ok_or_else(not_found)?;
    let handle = SignalHandle::new(info);
    if handle.resolve(object).is_none() {
        return Err(not_found());
    }
    Ok(handle)
}

/// Current declared signature of a resolved signal on `object`
pub fn signal_signature(handle: &SignalHandle, object: &dyn BusObject) -> Option<Signature> {
    handle.resolve(object).map(|signal| signal.signature())
}

/// Looks up a method member by name on the object's class
pub fn resolve_listener_method(object: &dyn BusObject, name: &str) -> EventBusResult<MethodHandle> {
    let class = object.class();
    class
        .find_method(name)
        .map(MethodHandle::new)
        .ok_or_else(|| EventBusError::ListenerMethodNotBindable {
            class: class.name().to_string(),
            method: name.to_string(),
        })
}

/// Bidirectional check: each side must be invocable with the other's list
pub fn are_signatures_compatible(a: &Signature, b: &Signature) -> bool {
    a.is_compatible_with(b)
}

/// Fails with `SignatureMismatch` unless `actual` agrees with `expected`
pub fn check_signature(expected: &Signature, actual: &Signature, context: &str) -> EventBusResult<()> {
    if are_signatures_compatible(expected, actual) {
        Ok(())
    } else {
        Err(EventBusError::signature_mismatch(expected, actual, context))
    }
}

/// Resolves the method and builds the callback token bound to it
pub fn build_listener_callback(
    object: &ObjectRef,
    name: &str,
) -> EventBusResult<(MethodHandle, Callback)> {
    let method = resolve_listener_method(object.as_ref(), name)?;
    if !method.is_callable() {
        return Err(EventBusError::ListenerMethodNotBindable {
            class: object.class().name().to_string(),
            method: name.to_string(),
        });
    }
    Ok((method, Callback::new(object, method.name())))
}
