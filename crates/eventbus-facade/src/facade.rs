//! Allowlist-gated entry point for scripting and tooling layers
//!
//! Validated adds consult the allowlist before reaching the bus and record
//! every successful bind into the runtime history. Removals go straight to
//! the bus.

use eventbus_core::{
    ChannelRegistration, ChannelTag, ClassInfo, EventBus, ListenerBinding, ObjectRef, PublisherBinding,
};
use tracing::{info, warn};

use crate::allowlist::AllowlistRegistry;
use crate::config::FacadeConfig;
use crate::error::Result;
use crate::history::RuntimeHistory;

/// Owns a bus, an optional allowlist and the runtime history
#[derive(Debug)]
pub struct EventBusFacade {
    bus: EventBus,
    registry: Option<AllowlistRegistry>,
    history: RuntimeHistory,
}

impl EventBusFacade {
    /// Facade with no allowlist installed; validated adds are denied
    pub fn new() -> Self {
        Self {
            bus: EventBus::new(),
            registry: None,
            history: RuntimeHistory::new(),
        }
    }

    pub fn with_registry(registry: AllowlistRegistry) -> Self {
        Self {
            registry: Some(registry),
            ..Self::new()
        }
    }

    /// Builds the bus from the manifest and installs the allowlist
    pub fn from_config(config: &FacadeConfig) -> Result<Self> {
        let bus = EventBus::from_config(&config.bus)?;
        info!(
            channels = config.bus.channels.len(),
            allowlist = config.allowlist.is_some(),
            "EventBus facade created"
        );
        Ok(Self {
            bus,
            registry: config.allowlist.clone(),
            history: RuntimeHistory::new(),
        })
    }

    pub fn set_registry(&mut self, registry: Option<AllowlistRegistry>) {
        self.registry = registry;
    }

    pub fn registry(&self) -> Option<&AllowlistRegistry> {
        self.registry.as_ref()
    }

    pub fn history(&self) -> &RuntimeHistory {
        &self.history
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut EventBus {
        &mut self.bus
    }

    // ------------------------------------------------------------------------
    // Channels
    // ------------------------------------------------------------------------

    pub fn register_channel(&mut self, tag: &ChannelTag, owns_publisher_callbacks: bool) -> bool {
        self.bus
            .register_channel(&ChannelRegistration::new(tag.clone(), owns_publisher_callbacks))
    }

    pub fn unregister_channel(&mut self, tag: &ChannelTag) -> bool {
        self.bus.unregister_channel(tag)
    }

    // ------------------------------------------------------------------------
    // Validated Operations
    // ------------------------------------------------------------------------

    pub fn add_publisher_validated(
        &mut self,
        tag: &ChannelTag,
        publisher: &ObjectRef,
        signal_name: &str,
    ) -> bool {
        if publisher.header().is_garbage() {
            warn!(channel = %tag, publisher = %publisher.describe(), "AddPublisherValidated rejected garbage object");
            return false;
        }

        let allowed = self
            .registry
            .as_ref()
            .map(|registry| registry.is_publisher_allowed(tag, publisher.class(), signal_name))
            .unwrap_or(false);
        if !allowed {
            warn!(
                channel = %tag,
                publisher = %publisher.describe(),
                signal = signal_name,
                "AddPublisherValidated denied"
            );
            return false;
        }

        let added = self
            .bus
            .add_publisher(tag, publisher, &PublisherBinding::new(signal_name));
        if added {
            self.history
                .record_publisher_binding(tag, publisher.class().name(), signal_name);
        }
        added
    }

    pub fn remove_publisher(&mut self, tag: &ChannelTag, publisher: &ObjectRef) -> bool {
        self.bus.remove_publisher(tag, publisher)
    }

    pub fn add_listener_validated(
        &mut self,
        tag: &ChannelTag,
        listener: &ObjectRef,
        method_name: &str,
    ) -> bool {
        if listener.header().is_garbage() {
            warn!(channel = %tag, listener = %listener.describe(), "AddListenerValidated rejected garbage object");
            return false;
        }

        let allowed = self
            .registry
            .as_ref()
            .map(|registry| registry.is_listener_allowed(tag, listener.class(), method_name))
            .unwrap_or(false);
        if !allowed {
            warn!(
                channel = %tag,
                listener = %listener.describe(),
                method = method_name,
                "AddListenerValidated denied"
            );
            return false;
        }

        let added = self
            .bus
            .add_listener(tag, listener, &ListenerBinding::new(method_name));
        if added {
            self.history
                .record_listener_binding(tag, listener.class().name(), method_name);
        }
        added
    }

    pub fn remove_listener(&mut self, tag: &ChannelTag, listener: &ObjectRef, method_name: &str) -> bool {
        self.bus
            .remove_listener(tag, listener, &ListenerBinding::new(method_name))
    }

    /// Methods the allowlist permits for `class` on `tag`; empty without a registry
    pub fn allowed_listener_methods(&self, tag: &ChannelTag, class: &ClassInfo) -> Vec<String> {
        self.registry
            .as_ref()
            .map(|registry| registry.allowed_listener_methods(tag, class))
            .unwrap_or_default()
    }

    /// Tears down every binding made through this facade
    pub fn shutdown(&mut self) {
        self.bus.reset();
        info!("EventBus facade shut down");
    }
}

impl Default for EventBusFacade {
    fn default() -> Self {
        Self::new()
    }
}
