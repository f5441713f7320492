//! The EventBus router
//!
//! Owns one `ChannelState` per registered channel tag and is the only entry
//! point for mutating bindings. Every operation first checks that it runs on
//! the thread that constructed the bus and fails closed otherwise.
//!
//! Operations come in two shapes: `try_*` methods return the error for
//! callers that need the [`ErrorKind`](crate::ErrorKind), and the plain
//! methods return `bool` after logging a structured warning on failure.

use std::thread::{self, ThreadId};

use hashbrown::HashMap;
use tracing::{debug, info, warn};

use crate::channel_state::{ChannelSnapshot, ChannelState};
use crate::config::EventBusConfig;
use crate::errors::{EventBusError, EventBusResult};
use crate::object::ObjectRef;
use crate::types::{ChannelRegistration, ChannelTag, ListenerBinding, PublisherBinding};
use crate::validation::{ensure_owning_thread, validate_channel_tag};

/// In-process publish/subscribe router bound to its constructing thread
pub struct EventBus {
    owner: ThreadId,
    log_signature_drift: bool,
    channels: HashMap<ChannelTag, ChannelState>,
}

impl EventBus {
    /// Create an empty bus owned by the calling thread
    pub fn new() -> Self {
        Self::with_drift_logging(true)
    }

    fn with_drift_logging(log_signature_drift: bool) -> Self {
        Self {
            owner: thread::current().id(),
            log_signature_drift,
            channels: HashMap::new(),
        }
    }

    /// Create a bus and register every channel in the manifest
    pub fn from_config(config: &EventBusConfig) -> EventBusResult<Self> {
        let mut bus = Self::with_drift_logging(config.log_signature_drift);
        for registration in &config.channels {
            bus.try_register_channel(registration)?;
        }
        info!(channels = bus.channels.len(), "EventBus created from config");
        Ok(bus)
    }

    pub fn owning_thread(&self) -> ThreadId {
        self.owner
    }

    // ------------------------------------------------------------------------
    // Channel Registration
    // ------------------------------------------------------------------------

    /// Registers a channel; re-registering with the same policy is a no-op
    pub fn try_register_channel(&mut self, registration: &ChannelRegistration) -> EventBusResult<()> {
        ensure_owning_thread(self.owner, "register_channel")?;
        validate_channel_tag(&registration.channel_tag)?;

        if let Some(existing) = self.channels.get(&registration.channel_tag) {
            if existing.owns_publisher_callbacks() != registration.owns_publisher_callbacks {
                return Err(EventBusError::OwnershipPolicyConflict {
                    tag: registration.channel_tag.to_string(),
                    existing: existing.owns_publisher_callbacks(),
                    requested: registration.owns_publisher_callbacks,
                });
            }
            return Ok(());
        }

        self.channels.insert(
            registration.channel_tag.clone(),
            ChannelState::new(
                registration.channel_tag.clone(),
                registration.owns_publisher_callbacks,
                self.log_signature_drift,
            ),
        );
        debug!(
            channel = %registration.channel_tag,
            owns_publisher_callbacks = registration.owns_publisher_callbacks,
            "Channel registered"
        );
        Ok(())
    }

    pub fn register_channel(&mut self, registration: &ChannelRegistration) -> bool {
        let result = self.try_register_channel(registration);
        report("register_channel", &registration.channel_tag, None, result).is_some()
    }

    /// Unbinds everything on the channel and forgets it
    pub fn try_unregister_channel(&mut self, tag: &ChannelTag) -> EventBusResult<()> {
        ensure_owning_thread(self.owner, "unregister_channel")?;
        validate_channel_tag(tag)?;

        let mut state = self
            .channels
            .remove(tag)
            .ok_or_else(|| EventBusError::channel_not_registered(tag))?;
        state.clear_and_unbind();
        debug!(channel = %tag, "Channel unregistered");
        Ok(())
    }

    pub fn unregister_channel(&mut self, tag: &ChannelTag) -> bool {
        let result = self.try_unregister_channel(tag);
        report("unregister_channel", tag, None, result).is_some()
    }

    pub fn try_is_channel_registered(&self, tag: &ChannelTag) -> EventBusResult<bool> {
        ensure_owning_thread(self.owner, "is_channel_registered")?;
        Ok(self.channels.contains_key(tag))
    }

    pub fn is_channel_registered(&self, tag: &ChannelTag) -> bool {
        let result = self.try_is_channel_registered(tag);
        report("is_channel_registered", tag, None, result).unwrap_or(false)
    }

    // ------------------------------------------------------------------------
    // Publishers
    // ------------------------------------------------------------------------

    pub fn try_add_publisher(
        &mut self,
        tag: &ChannelTag,
        publisher: &ObjectRef,
        binding: &PublisherBinding,
    ) -> EventBusResult<()> {
        self.channel_mut(tag, "add_publisher")?
            .add_publisher(publisher, binding)
    }

    pub fn add_publisher(
        &mut self,
        tag: &ChannelTag,
        publisher: &ObjectRef,
        binding: &PublisherBinding,
    ) -> bool {
        let result = self.try_add_publisher(tag, publisher, binding);
        report("add_publisher", tag, Some(publisher), result).is_some()
    }

    /// Returns whether any entry for the publisher was removed
    pub fn try_remove_publisher(
        &mut self,
        tag: &ChannelTag,
        publisher: &ObjectRef,
    ) -> EventBusResult<bool> {
        self.channel_mut(tag, "remove_publisher")?
            .remove_publisher(publisher)
    }

    pub fn remove_publisher(&mut self, tag: &ChannelTag, publisher: &ObjectRef) -> bool {
        let result = self.try_remove_publisher(tag, publisher);
        report("remove_publisher", tag, Some(publisher), result).unwrap_or(false)
    }

    // ------------------------------------------------------------------------
    // Listeners
    // ------------------------------------------------------------------------

    pub fn try_add_listener(
        &mut self,
        tag: &ChannelTag,
        listener: &ObjectRef,
        binding: &ListenerBinding,
    ) -> EventBusResult<()> {
        self.channel_mut(tag, "add_listener")?
            .add_listener(listener, binding)
    }

    pub fn add_listener(
        &mut self,
        tag: &ChannelTag,
        listener: &ObjectRef,
        binding: &ListenerBinding,
    ) -> bool {
        let result = self.try_add_listener(tag, listener, binding);
        report("add_listener", tag, Some(listener), result).is_some()
    }

    /// Returns whether any subscription was removed
    pub fn try_remove_listener(
        &mut self,
        tag: &ChannelTag,
        listener: &ObjectRef,
        binding: &ListenerBinding,
    ) -> EventBusResult<bool> {
        self.channel_mut(tag, "remove_listener")?
            .remove_listener(listener, binding)
    }

    pub fn remove_listener(
        &mut self,
        tag: &ChannelTag,
        listener: &ObjectRef,
        binding: &ListenerBinding,
    ) -> bool {
        let result = self.try_remove_listener(tag, listener, binding);
        report("remove_listener", tag, Some(listener), result).unwrap_or(false)
    }

    // ------------------------------------------------------------------------
    // Reset and Inspection
    // ------------------------------------------------------------------------

    /// Unbinds and forgets every channel
    pub fn try_reset(&mut self) -> EventBusResult<()> {
        ensure_owning_thread(self.owner, "reset")?;
        self.clear_channels();
        Ok(())
    }

    pub fn reset(&mut self) {
        if let Err(err) = self.try_reset() {
            warn!(operation = "reset", error_kind = %err.kind(), error = %err, "EventBus operation failed");
        }
    }

    /// Registered channel tags in sorted order; empty off the owning thread
    pub fn registered_channels(&self) -> Vec<ChannelTag> {
        if let Err(err) = ensure_owning_thread(self.owner, "registered_channels") {
            warn!(error_kind = %err.kind(), error = %err, "EventBus operation failed");
            return Vec::new();
        }
        let mut tags: Vec<ChannelTag> = self.channels.keys().cloned().collect();
        tags.sort();
        tags
    }

    pub fn channel_info(&self, tag: &ChannelTag) -> Option<ChannelSnapshot> {
        ensure_owning_thread(self.owner, "channel_info").ok()?;
        self.channels.get(tag).map(ChannelState::snapshot)
    }

    fn channel_mut(
        &mut self,
        tag: &ChannelTag,
        operation: &'static str,
    ) -> EventBusResult<&mut ChannelState> {
        ensure_owning_thread(self.owner, operation)?;
        validate_channel_tag(tag)?;
        self.channels
            .get_mut(tag)
            .ok_or_else(|| EventBusError::channel_not_registered(tag))
    }

    fn clear_channels(&mut self) {
        for state in self.channels.values_mut() {
            state.clear_and_unbind();
        }
        self.channels.clear();
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for EventBus {
    fn drop(&mut self) {
        // Teardown must happen even when the bus is dropped off its thread
        if thread::current().id() != self.owner {
            debug!("EventBus dropped off its owning thread");
        }
        self.clear_channels();
    }
}

impl core::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("EventBus")
            .field("owner", &self.owner)
            .field("channels", &self.channels.len())
            .finish()
    }
}

/// Logs a failed operation and converts the result into an option
fn report<T>(
    operation: &'static str,
    tag: &ChannelTag,
    object: Option<&ObjectRef>,
    result: EventBusResult<T>,
) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            let object = object.map(|object| object.describe());
            warn!(
                operation,
                channel = %tag,
                object = object.as_deref().unwrap_or("-"),
                error_kind = %err.kind(),
                error = %err,
                "EventBus operation failed"
            );
            None
        }
    }
}
