//! Signatures, values and the multicast signal primitive
//!
//! `MulticastSignal` is the underlying dispatch mechanism the router binds
//! into. Like the delegate types it stands in for, it silently accepts
//! duplicate subscriptions and never compacts dead targets by itself; the
//! channel state is responsible for remove-then-add binding and for purging
//! callbacks whose targets have gone away.

use core::fmt;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use tracing::warn;

use crate::object::{BusObject, ObjectId, ObjectRef};

// ----------------------------------------------------------------------------
// Parameter Types and Values
// ----------------------------------------------------------------------------

/// Parameter type of a signal or listener method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParamType {
    Bool,
    Int,
    Float,
    Double,
    Str,
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ParamType::Bool => "bool",
            ParamType::Int => "int",
            ParamType::Float => "float",
            ParamType::Double => "double",
            ParamType::Str => "string",
        };
        f.write_str(name)
    }
}

/// Dynamically typed argument passed through a broadcast
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Int(i32),
    Float(f32),
    Double(f64),
    Str(String),
}

impl Value {
    pub fn param_type(&self) -> ParamType {
        match self {
            Value::Bool(_) => ParamType::Bool,
            Value::Int(_) => ParamType::Int,
            Value::Float(_) => ParamType::Float,
            Value::Double(_) => ParamType::Double,
            Value::Str(_) => ParamType::Str,
        }
    }
}

/// Conversion between Rust parameter types and `Value`
///
/// Implemented for every type a listener method may take, so class tables
/// can wrap typed methods without hand-written argument decoding.
pub trait Param: Sized + 'static {
    const TYPE: ParamType;

    fn from_value(value: &Value) -> Option<Self>;

    fn into_value(self) -> Value;
}

macro_rules! impl_param {
    ($ty:ty, $variant:ident) => {
        impl Param for $ty {
            const TYPE: ParamType = ParamType::$variant;

            fn from_value(value: &Value) -> Option<Self> {
                match value {
                    Value::$variant(inner) => Some(inner.clone()),
                    _ => None,
                }
            }

            fn into_value(self) -> Value {
                Value::$variant(self)
            }
        }

        impl From<$ty> for Value {
            fn from(value: $ty) -> Self {
                Value::$variant(value)
            }
        }
    };
}

impl_param!(bool, Bool);
impl_param!(i32, Int);
impl_param!(f32, Float);
impl_param!(f64, Double);
impl_param!(String, Str);

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.to_string())
    }
}

// ----------------------------------------------------------------------------
// Signature
// ----------------------------------------------------------------------------

/// Ordered parameter list of a signal or method
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Signature(SmallVec<[ParamType; 4]>);

impl Signature {
    pub fn new(params: &[ParamType]) -> Self {
        Self(SmallVec::from_slice(params))
    }

    /// Signature with no parameters
    pub fn empty() -> Self {
        Self(SmallVec::new())
    }

    pub fn params(&self) -> &[ParamType] {
        &self.0
    }

    pub fn arity(&self) -> usize {
        self.0.len()
    }

    /// True when a callable with this signature can be invoked with `other`'s
    /// argument list: `other` supplies at least as many arguments and every
    /// position this signature consumes has an identical type.
    pub fn accepts(&self, other: &Signature) -> bool {
        other.0.len() >= self.0.len() && self.0.iter().zip(other.0.iter()).all(|(a, b)| a == b)
    }

    /// Bidirectional compatibility, each side invocable with the other's list
    pub fn is_compatible_with(&self, other: &Signature) -> bool {
        self.accepts(other) && other.accepts(self)
    }

    /// True when `args` is a valid argument list for this signature
    pub fn matches_args(&self, args: &[Value]) -> bool {
        args.len() == self.0.len()
            && self
                .0
                .iter()
                .zip(args.iter())
                .all(|(expected, arg)| *expected == arg.param_type())
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (index, param) in self.0.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", param)?;
        }
        f.write_str(")")
    }
}

impl From<&[ParamType]> for Signature {
    fn from(params: &[ParamType]) -> Self {
        Self::new(params)
    }
}

// ----------------------------------------------------------------------------
// Callback Token
// ----------------------------------------------------------------------------

/// Pre-bound callback token: a weak target plus the method to invoke on it
///
/// Two callbacks are equal when they name the same object identity and
/// method, regardless of whether the target is still alive.
#[derive(Clone)]
pub struct Callback {
    target: Weak<dyn BusObject>,
    target_id: ObjectId,
    method: Arc<str>,
}

impl Callback {
    pub fn new(target: &ObjectRef, method: &str) -> Self {
        Self {
            target: Arc::downgrade(target),
            target_id: target.header().id(),
            method: Arc::from(method),
        }
    }

    pub fn target_id(&self) -> ObjectId {
        self.target_id
    }

    pub fn method_name(&self) -> &str {
        &self.method
    }

    /// True while the target can be upgraded and is not marked as garbage
    pub fn is_target_alive(&self) -> bool {
        self.target
            .upgrade()
            .map(|target| !target.header().is_garbage())
            .unwrap_or(false)
    }

    fn invoke(&self, args: &[Value]) -> bool {
        let Some(target) = self.target.upgrade() else {
            return false;
        };
        if target.header().is_garbage() {
            return false;
        }
        let Some(method) = target.class().find_method(&self.method) else {
            return false;
        };
        method.invoke(target.as_ref(), args)
    }
}

impl PartialEq for Callback {
    fn eq(&self, other: &Self) -> bool {
        self.target_id == other.target_id && self.method == other.method
    }
}

impl Eq for Callback {}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callback")
            .field("target_id", &self.target_id)
            .field("method", &self.method)
            .field("alive", &self.is_target_alive())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Multicast Signal
// ----------------------------------------------------------------------------

struct SignalInner {
    signature: Signature,
    callbacks: Vec<Callback>,
}

/// Multicast signal owned by a publisher object
pub struct MulticastSignal {
    inner: Mutex<SignalInner>,
}

impl MulticastSignal {
    pub fn new(signature: Signature) -> Self {
        Self {
            inner: Mutex::new(SignalInner {
                signature,
                callbacks: Vec::new(),
            }),
        }
    }

    pub fn signature(&self) -> Signature {
        self.inner.lock().signature.clone()
    }

    /// Replaces the declared signature, as a hot reload would
    pub fn redeclare(&self, signature: Signature) {
        self.inner.lock().signature = signature;
    }

    /// Appends a callback; duplicates are permitted
    pub fn add(&self, callback: Callback) {
        self.inner.lock().callbacks.push(callback);
    }

    /// Removes one occurrence of `callback`, returning whether one was found
    pub fn remove(&self, callback: &Callback) -> bool {
        let mut inner = self.inner.lock();
        match inner.callbacks.iter().position(|existing| existing == callback) {
            Some(index) => {
                inner.callbacks.remove(index);
                true
            }
            None => false,
        }
    }

    /// Drops every callback whose target is dead, returning how many went
    pub fn remove_stale(&self) -> usize {
        let mut inner = self.inner.lock();
        let before = inner.callbacks.len();
        inner.callbacks.retain(Callback::is_target_alive);
        before - inner.callbacks.len()
    }

    /// Number of callbacks bound to this signal targeting `id`
    pub fn count_for(&self, id: ObjectId) -> usize {
        self.inner
            .lock()
            .callbacks
            .iter()
            .filter(|callback| callback.target_id == id)
            .count()
    }

    pub fn bound_count(&self) -> usize {
        self.inner.lock().callbacks.len()
    }

    pub fn is_bound(&self) -> bool {
        !self.inner.lock().callbacks.is_empty()
    }

    /// Invokes every bound callback in bind order, returning how many ran
    ///
    /// The callback list is snapshotted first so listeners may re-enter the
    /// signal (or the bus) while being invoked.
    pub fn broadcast(&self, args: &[Value]) -> usize {
        let (signature, snapshot) = {
            let inner = self.inner.lock();
            (inner.signature.clone(), inner.callbacks.clone())
        };

        if !signature.matches_args(args) {
            warn!(
                signature = %signature,
                arg_count = args.len(),
                "Broadcast rejected: arguments do not match signal signature"
            );
            return 0;
        }

        snapshot.iter().filter(|callback| callback.invoke(args)).count()
    }
}

impl fmt::Debug for MulticastSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("MulticastSignal")
            .field("signature", &inner.signature)
            .field("callbacks", &inner.callbacks.len())
            .finish()
    }
}
