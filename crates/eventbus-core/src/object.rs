//! Object model: identity, liveness and per-class member tables
//!
//! Every type that can be routed implements [`BusObject`]. The bus never
//! inspects concrete types; it looks members up by name through the
//! [`ClassInfo`] table each type builds once, and tracks liveness through the
//! [`ObjectHeader`] embedded in each object.

use core::fmt;
use std::any::Any;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::signal::{MulticastSignal, Param, Signature, Value};

/// Shared handle to a routable object, as held by its owners
pub type ObjectRef = Arc<dyn BusObject>;

// ----------------------------------------------------------------------------
// Object Identity
// ----------------------------------------------------------------------------

/// Process-unique object identity, never reused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId(u64);

static NEXT_OBJECT_ID: AtomicU64 = AtomicU64::new(1);

impl ObjectId {
    fn allocate() -> Self {
        Self(NEXT_OBJECT_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Identity, display name and liveness flag embedded in every bus object
///
/// The id is fixed at construction; the name may change at any time without
/// affecting how the bus keys the object.
#[derive(Debug)]
pub struct ObjectHeader {
    id: ObjectId,
    name: Mutex<String>,
    garbage: AtomicBool,
}

impl ObjectHeader {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: ObjectId::allocate(),
            name: Mutex::new(name.into()),
            garbage: AtomicBool::new(false),
        }
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn name(&self) -> String {
        self.name.lock().clone()
    }

    pub fn rename(&self, name: impl Into<String>) {
        *self.name.lock() = name.into();
    }

    /// Flags the object as pending destruction
    ///
    /// A garbage object is treated as stale by the bus even while strong
    /// references to it remain.
    pub fn mark_as_garbage(&self) {
        self.garbage.store(true, Ordering::Release);
    }

    pub fn is_garbage(&self) -> bool {
        self.garbage.load(Ordering::Acquire)
    }
}

// ----------------------------------------------------------------------------
// Bus Object Trait
// ----------------------------------------------------------------------------

/// A publisher or listener the bus can route between
pub trait BusObject: Any + Send + Sync {
    fn header(&self) -> &ObjectHeader;

    fn class(&self) -> &'static ClassInfo;

    fn as_any(&self) -> &dyn Any;
}

impl dyn BusObject {
    /// Downcasts to the concrete object type
    pub fn downcast_ref<T: BusObject>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    /// Short human-readable description used in log lines
    pub fn describe(&self) -> String {
        format!(
            "{} '{}' ({})",
            self.class().name(),
            self.header().name(),
            self.header().id()
        )
    }
}

/// Implements [`BusObject`] for a type with an embedded header field
///
/// ```ignore
/// impl_bus_object!(HealthComponent, header, HealthComponent::class_info());
/// ```
#[macro_export]
macro_rules! impl_bus_object {
    ($ty:ty, $header:ident, $class:expr) => {
        impl $crate::object::BusObject for $ty {
            fn header(&self) -> &$crate::object::ObjectHeader {
                &self.$header
            }

            fn class(&self) -> &'static $crate::object::ClassInfo {
                $class
            }

            fn as_any(&self) -> &dyn ::std::any::Any {
                self
            }
        }
    };
}

// ----------------------------------------------------------------------------
// Class Tables
// ----------------------------------------------------------------------------

trait SignalAccess: Send + Sync {
    fn get<'a>(&self, object: &'a dyn Any) -> Option<&'a MulticastSignal>;
}

struct TypedSignalAccess<T> {
    accessor: fn(&T) -> &MulticastSignal,
}

impl<T: 'static> SignalAccess for TypedSignalAccess<T> {
    fn get<'a>(&self, object: &'a dyn Any) -> Option<&'a MulticastSignal> {
        object.downcast_ref::<T>().map(self.accessor)
    }
}

type MethodInvoker = Box<dyn Fn(&dyn Any, &[Value]) -> bool + Send + Sync>;

/// A named multicast signal member
pub struct SignalInfo {
    name: &'static str,
    access: Box<dyn SignalAccess>,
}

impl SignalInfo {
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Borrows this signal on `object`, if `object` is of the declaring type
    pub fn resolve<'a>(&self, object: &'a dyn BusObject) -> Option<&'a MulticastSignal> {
        self.access.get(object.as_any())
    }
}

impl fmt::Debug for SignalInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignalInfo").field("name", &self.name).finish()
    }
}

/// A named method member with its parameter signature
pub struct MethodInfo {
    name: &'static str,
    signature: Signature,
    callable: bool,
    invoker: MethodInvoker,
}

impl MethodInfo {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Whether callbacks may be bound to this method
    pub fn is_callable(&self) -> bool {
        self.callable
    }

    /// Invokes the method on `object`; false when the type or arguments do not fit
    pub fn invoke(&self, object: &dyn BusObject, args: &[Value]) -> bool {
        (self.invoker)(object.as_any(), args)
    }
}

impl fmt::Debug for MethodInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodInfo")
            .field("name", &self.name)
            .field("signature", &self.signature)
            .field("callable", &self.callable)
            .finish()
    }
}

/// Per-type registration table mapping member names to typed accessors
///
/// Built once per type, usually behind a `OnceLock`, and shared as
/// `&'static ClassInfo`. The optional parent only feeds class-inheritance
/// checks; member lookup never walks it.
pub struct ClassInfo {
    name: &'static str,
    parent: Option<&'static ClassInfo>,
    signals: Vec<SignalInfo>,
    methods: Vec<MethodInfo>,
}

impl ClassInfo {
    pub fn builder<T: BusObject>(name: &'static str) -> ClassBuilder<T> {
        ClassBuilder {
            info: ClassInfo {
                name,
                parent: None,
                signals: Vec::new(),
                methods: Vec::new(),
            },
            _marker: core::marker::PhantomData,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn parent(&self) -> Option<&'static ClassInfo> {
        self.parent
    }

    /// True when this class is `class_name` or descends from it
    pub fn is_a(&self, class_name: &str) -> bool {
        let mut current = Some(self);
        while let Some(class) = current {
            if class.name == class_name {
                return true;
            }
            current = class.parent;
        }
        false
    }

    pub fn find_signal(&self, name: &str) -> Option<&SignalInfo> {
        self.signals.iter().find(|signal| signal.name == name)
    }

    pub fn find_method(&self, name: &str) -> Option<&MethodInfo> {
        self.methods.iter().find(|method| method.name == name)
    }
}

impl fmt::Debug for ClassInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassInfo")
            .field("name", &self.name)
            .field("parent", &self.parent.map(|parent| parent.name))
            .field("signals", &self.signals)
            .field("methods", &self.methods)
            .finish()
    }
}

/// Builder for [`ClassInfo`]
pub struct ClassBuilder<T> {
    info: ClassInfo,
    _marker: core::marker::PhantomData<fn(&T)>,
}

impl<T: BusObject> ClassBuilder<T> {
    pub fn parent(mut self, parent: &'static ClassInfo) -> Self {
        self.info.parent = Some(parent);
        self
    }

    /// Declares a multicast signal member
    pub fn signal(mut self, name: &'static str, accessor: fn(&T) -> &MulticastSignal) -> Self {
        self.info.signals.push(SignalInfo {
            name,
            access: Box::new(TypedSignalAccess { accessor }),
        });
        self
    }

    /// Declares a bindable method taking no arguments
    pub fn method0(self, name: &'static str, method: fn(&T)) -> Self {
        self.push_method(name, Signature::empty(), move |target: &T, args| {
            if !args.is_empty() {
                return false;
            }
            method(target);
            true
        })
    }

    /// Declares a bindable method taking one argument
    pub fn method1<A: Param>(self, name: &'static str, method: fn(&T, A)) -> Self {
        self.push_method(name, Signature::new(&[A::TYPE]), move |target: &T, args| {
            let [a] = args else {
                return false;
            };
            match A::from_value(a) {
                Some(a) => {
                    method(target, a);
                    true
                }
                None => false,
            }
        })
    }

    /// Declares a bindable method taking two arguments
    pub fn method2<A: Param, B: Param>(self, name: &'static str, method: fn(&T, A, B)) -> Self {
        let signature = Signature::new(&[A::TYPE, B::TYPE]);
        self.push_method(name, signature, move |target: &T, args| {
            let [a, b] = args else {
                return false;
            };
            match (A::from_value(a), B::from_value(b)) {
                (Some(a), Some(b)) => {
                    method(target, a, b);
                    true
                }
                _ => false,
            }
        })
    }

    /// Marks the most recently declared method as native-only (not bindable)
    pub fn native(mut self) -> Self {
        if let Some(method) = self.info.methods.last_mut() {
            method.callable = false;
        }
        self
    }

    pub fn build(self) -> ClassInfo {
        self.info
    }

    fn push_method<F>(mut self, name: &'static str, signature: Signature, invoke: F) -> Self
    where
        F: Fn(&T, &[Value]) -> bool + Send + Sync + 'static,
    {
        let invoker: MethodInvoker = Box::new(move |object: &dyn Any, args: &[Value]| {
            match object.downcast_ref::<T>() {
                Some(target) => invoke(target, args),
                None => false,
            }
        });
        self.info.methods.push(MethodInfo {
            name,
            signature,
            callable: true,
            invoker,
        });
        self
    }
}

// ----------------------------------------------------------------------------
// Resolved Handles
// ----------------------------------------------------------------------------

/// A signal member resolved against a class table
#[derive(Debug, Clone, Copy)]
pub struct SignalHandle {
    info: &'static SignalInfo,
}

impl SignalHandle {
    pub(crate) fn new(info: &'static SignalInfo) -> Self {
        Self { info }
    }

    pub fn name(&self) -> &'static str {
        self.info.name()
    }

    pub fn resolve<'a>(&self, object: &'a dyn BusObject) -> Option<&'a MulticastSignal> {
        self.info.resolve(object)
    }
}

/// A method member resolved against a class table
#[derive(Debug, Clone, Copy)]
pub struct MethodHandle {
    info: &'static MethodInfo,
}

impl MethodHandle {
    pub(crate) fn new(info: &'static MethodInfo) -> Self {
        Self { info }
    }

    pub fn name(&self) -> &'static str {
        self.info.name()
    }

    pub fn signature(&self) -> &'static Signature {
        self.info.signature()
    }

    pub fn is_callable(&self) -> bool {
        self.info.is_callable()
    }
}
