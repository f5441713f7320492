//! Test utilities for EventBus integration tests
//!
//! Provides a publisher and a listener with registered class tables, plus
//! helpers to hand them to the bus as type-erased object references.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

use eventbus_core::{
    impl_bus_object, ChannelTag, ClassInfo, ListenerBinding, MulticastSignal, ObjectHeader,
    ObjectRef, ParamType, PublisherBinding, Signature, Value,
};
use parking_lot::Mutex;

// ----------------------------------------------------------------------------
// Test Publisher
// ----------------------------------------------------------------------------

/// Publisher with a float signal, a (float, int) signal and a no-arg signal
pub struct TestPublisher {
    header: ObjectHeader,
    pub on_value_changed: MulticastSignal,
    pub on_pair: MulticastSignal,
    pub on_ping: MulticastSignal,
}

impl TestPublisher {
    pub fn new(name: &str) -> Arc<Self> {
        Arc::new(Self {
            header: ObjectHeader::new(name),
            on_value_changed: MulticastSignal::new(Signature::new(&[ParamType::Float])),
            on_pair: MulticastSignal::new(Signature::new(&[ParamType::Float, ParamType::Int])),
            on_ping: MulticastSignal::new(Signature::empty()),
        })
    }

    pub fn class_info() -> &'static ClassInfo {
        static CLASS: OnceLock<ClassInfo> = OnceLock::new();
        CLASS.get_or_init(|| {
            ClassInfo::builder::<TestPublisher>("TestPublisher")
                .signal("on_value_changed", |p| &p.on_value_changed)
                .signal("on_pair", |p| &p.on_pair)
                .signal("on_ping", |p| &p.on_ping)
                .build()
        })
    }

    pub fn fire(&self, value: f32) -> usize {
        self.on_value_changed.broadcast(&[Value::Float(value)])
    }
}

impl_bus_object!(TestPublisher, header, TestPublisher::class_info());

// ----------------------------------------------------------------------------
// Test Listener
// ----------------------------------------------------------------------------

/// Listener counting invocations per method
pub struct TestListener {
    header: ObjectHeader,
    pub value_calls: AtomicUsize,
    pub alt_calls: AtomicUsize,
    pub pair_calls: AtomicUsize,
    pub no_arg_calls: AtomicUsize,
    pub received: Mutex<Vec<f32>>,
}

impl TestListener {
    pub fn new(name: &str) -> Arc<Self> {
        Arc::new(Self {
            header: ObjectHeader::new(name),
            value_calls: AtomicUsize::new(0),
            alt_calls: AtomicUsize::new(0),
            pair_calls: AtomicUsize::new(0),
            no_arg_calls: AtomicUsize::new(0),
            received: Mutex::new(Vec::new()),
        })
    }

    pub fn class_info() -> &'static ClassInfo {
        static CLASS: OnceLock<ClassInfo> = OnceLock::new();
        CLASS.get_or_init(|| {
            ClassInfo::builder::<TestListener>("TestListener")
                .method1("on_value", TestListener::on_value)
                .method1("on_value_alt", TestListener::on_value_alt)
                .method2("on_pair", TestListener::on_pair)
                .method0("on_no_args", TestListener::on_no_args)
                .method1("internal_only", TestListener::internal_only)
                .native()
                .build()
        })
    }

    pub fn on_value(&self, value: f32) {
        self.value_calls.fetch_add(1, Ordering::SeqCst);
        self.received.lock().push(value);
    }

    pub fn on_value_alt(&self, _value: f32) {
        self.alt_calls.fetch_add(1, Ordering::SeqCst);
    }

    pub fn on_pair(&self, _value: f32, _count: i32) {
        self.pair_calls.fetch_add(1, Ordering::SeqCst);
    }

    pub fn on_no_args(&self) {
        self.no_arg_calls.fetch_add(1, Ordering::SeqCst);
    }

    pub fn internal_only(&self, _value: f32) {}

    pub fn value_calls(&self) -> usize {
        self.value_calls.load(Ordering::SeqCst)
    }

    pub fn alt_calls(&self) -> usize {
        self.alt_calls.load(Ordering::SeqCst)
    }

    pub fn no_arg_calls(&self) -> usize {
        self.no_arg_calls.load(Ordering::SeqCst)
    }
}

impl_bus_object!(TestListener, header, TestListener::class_info());

// ----------------------------------------------------------------------------
// Helpers
// ----------------------------------------------------------------------------

pub fn object<T: eventbus_core::BusObject>(value: &Arc<T>) -> ObjectRef {
    value.clone()
}

pub fn tag(name: &str) -> ChannelTag {
    ChannelTag::new(name)
}

pub fn signal(name: &str) -> PublisherBinding {
    PublisherBinding::new(name)
}

pub fn method(name: &str) -> ListenerBinding {
    ListenerBinding::new(name)
}
