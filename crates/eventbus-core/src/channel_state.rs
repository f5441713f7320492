//! Per-channel binding state
//!
//! A `ChannelState` owns the publisher and listener records of one channel
//! and keeps every live publisher signal holding exactly one callback per
//! live listener entry. Objects are referenced weakly and re-validated at the
//! start of every mutating call; nothing is notified when they die.

use std::sync::{Arc, Weak};

use hashbrown::HashMap;
use serde::Serialize;
use smallvec::SmallVec;
use tracing::{debug, warn};

use crate::errors::{EventBusError, EventBusResult};
use crate::object::{BusObject, MethodHandle, ObjectId, ObjectRef, SignalHandle};
use crate::signal::{Callback, MulticastSignal, Signature};
use crate::types::{ChannelTag, ListenerBinding, ListenerKey, PublisherBinding};
use crate::validation::{
    build_listener_callback, check_signature, resolve_signal, signal_signature, validate_name,
    validate_object,
};

// ----------------------------------------------------------------------------
// Entries
// ----------------------------------------------------------------------------

struct PublisherEntry {
    publisher: Weak<dyn BusObject>,
    publisher_id: ObjectId,
    signal_name: String,
    signal: SignalHandle,
}

impl PublisherEntry {
    /// Strong handle to the publisher unless it is gone or pending destruction
    fn live(&self) -> Option<ObjectRef> {
        self.publisher
            .upgrade()
            .filter(|publisher| !publisher.header().is_garbage())
    }
}

struct ListenerEntry {
    listener: Weak<dyn BusObject>,
    method: MethodHandle,
    callback: Callback,
}

impl ListenerEntry {
    fn is_live(&self) -> bool {
        self.listener
            .upgrade()
            .map(|listener| !listener.header().is_garbage())
            .unwrap_or(false)
    }
}

/// Calls `f` with the signal of every live publisher, in entry order
fn each_live_signal(publishers: &[PublisherEntry], mut f: impl FnMut(&MulticastSignal)) {
    for entry in publishers {
        if let Some(publisher) = entry.live() {
            if let Some(signal) = entry.signal.resolve(publisher.as_ref()) {
                f(signal);
            }
        }
    }
}

/// Remove-then-add, so repeated binds never duplicate a subscription
fn bind(signal: &MulticastSignal, callback: &Callback) {
    signal.remove(callback);
    signal.add(callback.clone());
}

// ----------------------------------------------------------------------------
// Channel Snapshot
// ----------------------------------------------------------------------------

/// Read-only summary of one channel for diagnostics
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChannelSnapshot {
    pub tag: ChannelTag,
    pub owns_publisher_callbacks: bool,
    pub publishers: usize,
    pub listeners: usize,
    pub signature: Option<Signature>,
    pub signal_name: Option<String>,
}

// ----------------------------------------------------------------------------
// Channel State
// ----------------------------------------------------------------------------

/// Publishers, listeners and canonical signature of one registered channel
///
/// Only reachable through [`EventBus`](crate::EventBus), which checks the
/// owning thread before every call.
pub(crate) struct ChannelState {
    tag: ChannelTag,
    owns_publisher_callbacks: bool,
    log_signature_drift: bool,
    publishers: Vec<PublisherEntry>,
    listeners: HashMap<ListenerKey, ListenerEntry>,
    cached_signature: Option<Signature>,
    cached_signal_name: Option<String>,
}

impl ChannelState {
    pub(crate) fn new(tag: ChannelTag, owns_publisher_callbacks: bool, log_signature_drift: bool) -> Self {
        Self {
            tag,
            owns_publisher_callbacks,
            log_signature_drift,
            publishers: Vec::new(),
            listeners: HashMap::new(),
            cached_signature: None,
            cached_signal_name: None,
        }
    }

    pub(crate) fn owns_publisher_callbacks(&self) -> bool {
        self.owns_publisher_callbacks
    }

    pub(crate) fn snapshot(&self) -> ChannelSnapshot {
        ChannelSnapshot {
            tag: self.tag.clone(),
            owns_publisher_callbacks: self.owns_publisher_callbacks,
            publishers: self.publishers.len(),
            listeners: self.listeners.len(),
            signature: self.cached_signature.clone(),
            signal_name: self.cached_signal_name.clone(),
        }
    }

    // ------------------------------------------------------------------------
    // Publishers
    // ------------------------------------------------------------------------

    /// Adds or replaces `publisher`, binding every live listener to its signal
    ///
    /// Fails without changing anything when the signal disagrees with the
    /// channel signature or with any existing listener.
    pub(crate) fn add_publisher(
        &mut self,
        publisher: &ObjectRef,
        binding: &PublisherBinding,
    ) -> EventBusResult<()> {
        validate_object(publisher.as_ref())?;
        validate_name(&binding.signal_name)?;
        let signal = resolve_signal(publisher.as_ref(), &binding.signal_name)?;
        let signature = signal_signature(&signal, publisher.as_ref()).ok_or_else(|| {
            EventBusError::DelegateMemberNotFound {
                class: publisher.class().name().to_string(),
                signal: binding.signal_name.clone(),
            }
        })?;

        self.cleanup();

        if let Some(cached) = &self.cached_signature {
            check_signature(
                cached,
                &signature,
                &format!("publisher {} on {}", publisher.describe(), self.tag),
            )?;
        }

        for (key, entry) in &self.listeners {
            check_signature(
                &signature,
                entry.method.signature(),
                &format!("existing listener {} on {}", key, self.tag),
            )?;
        }

        let publisher_id = publisher.header().id();
        let entry = PublisherEntry {
            publisher: Arc::downgrade(publisher),
            publisher_id,
            signal_name: binding.signal_name.clone(),
            signal,
        };

        match self
            .publishers
            .iter()
            .position(|existing| existing.publisher_id == publisher_id)
        {
            Some(index) => {
                let previous = &self.publishers[index];
                if let Some(old_publisher) = previous.live() {
                    if let Some(old_signal) = previous.signal.resolve(old_publisher.as_ref()) {
                        for listener in self.listeners.values() {
                            old_signal.remove(&listener.callback);
                        }
                    }
                }
                self.publishers[index] = entry;
            }
            None => self.publishers.push(entry),
        }

        if self.cached_signature.is_none() {
            self.cached_signature = Some(signature);
            self.cached_signal_name = Some(binding.signal_name.clone());
        }

        if let Some(bound) = signal.resolve(publisher.as_ref()) {
            for listener in self.listeners.values() {
                bind(bound, &listener.callback);
            }
        }

        debug!(
            channel = %self.tag,
            publisher = %publisher.describe(),
            signal = %binding.signal_name,
            listeners = self.listeners.len(),
            "Publisher added"
        );
        Ok(())
    }

    /// Removes every entry for `publisher`, unbinding all listeners from it
    pub(crate) fn remove_publisher(&mut self, publisher: &ObjectRef) -> EventBusResult<bool> {
        validate_object(publisher.as_ref())?;
        self.cleanup();

        let publisher_id = publisher.header().id();
        let listeners = &self.listeners;
        let mut removed = false;

        self.publishers.retain(|entry| {
            if entry.publisher_id != publisher_id {
                return true;
            }
            if let Some(live) = entry.live() {
                if let Some(signal) = entry.signal.resolve(live.as_ref()) {
                    for listener in listeners.values() {
                        signal.remove(&listener.callback);
                    }
                }
            }
            removed = true;
            false
        });

        self.refresh_cached_signature();

        if removed {
            debug!(channel = %self.tag, publisher = %publisher.describe(), "Publisher removed");
        }
        Ok(removed)
    }

    // ------------------------------------------------------------------------
    // Listeners
    // ------------------------------------------------------------------------

    /// Adds or replaces the `(listener, method)` subscription
    pub(crate) fn add_listener(
        &mut self,
        listener: &ObjectRef,
        binding: &ListenerBinding,
    ) -> EventBusResult<()> {
        validate_object(listener.as_ref())?;
        validate_name(&binding.method_name)?;
        let (method, callback) = build_listener_callback(listener, &binding.method_name)?;

        self.cleanup();

        if let Some(cached) = &self.cached_signature {
            check_signature(
                cached,
                method.signature(),
                &format!("listener {} on {}", listener.describe(), self.tag),
            )?;
        }

        let key = ListenerKey::new(listener.header().id(), binding.method_name.as_str());
        if let Some(previous) = self.listeners.get(&key) {
            each_live_signal(&self.publishers, |signal| {
                signal.remove(&previous.callback);
            });
        }

        each_live_signal(&self.publishers, |signal| bind(signal, &callback));

        self.listeners.insert(
            key,
            ListenerEntry {
                listener: Arc::downgrade(listener),
                method,
                callback,
            },
        );

        debug!(
            channel = %self.tag,
            listener = %listener.describe(),
            method = %binding.method_name,
            publishers = self.publishers.len(),
            "Listener added"
        );
        Ok(())
    }

    /// Removes listener subscriptions according to the ownership policy
    ///
    /// An owning channel evicts every method `listener` bound here; a
    /// non-owning channel removes only the named one.
    pub(crate) fn remove_listener(
        &mut self,
        listener: &ObjectRef,
        binding: &ListenerBinding,
    ) -> EventBusResult<bool> {
        validate_object(listener.as_ref())?;
        validate_name(&binding.method_name)?;
        self.cleanup();

        let target = ListenerKey::new(listener.header().id(), binding.method_name.as_str());
        let selected: SmallVec<[ListenerKey; 4]> = if self.owns_publisher_callbacks {
            self.listeners
                .keys()
                .filter(|key| key.object_id == target.object_id)
                .cloned()
                .collect()
        } else if self.listeners.contains_key(&target) {
            SmallVec::from_elem(target, 1)
        } else {
            SmallVec::new()
        };

        for key in &selected {
            if let Some(entry) = self.listeners.remove(key) {
                each_live_signal(&self.publishers, |signal| {
                    signal.remove(&entry.callback);
                });
            }
        }

        if !selected.is_empty() {
            debug!(
                channel = %self.tag,
                listener = %listener.describe(),
                removed = selected.len(),
                "Listener removed"
            );
        }
        Ok(!selected.is_empty())
    }

    // ------------------------------------------------------------------------
    // Teardown
    // ------------------------------------------------------------------------

    /// Unbinds every listener from every publisher and forgets both sides
    pub(crate) fn clear_and_unbind(&mut self) {
        self.cleanup();

        let listeners = &self.listeners;
        each_live_signal(&self.publishers, |signal| {
            for listener in listeners.values() {
                signal.remove(&listener.callback);
            }
        });

        self.publishers.clear();
        self.listeners.clear();
        self.cached_signature = None;
        self.cached_signal_name = None;
    }

    // ------------------------------------------------------------------------
    // Cleanup
    // ------------------------------------------------------------------------

    /// Purges stale entries and recomputes the cached signature
    fn cleanup(&mut self) {
        self.cleanup_publishers();
        self.cleanup_listeners();
    }

    fn cleanup_publishers(&mut self) {
        let listeners = &self.listeners;
        let tag = &self.tag;

        self.publishers.retain(|entry| {
            let Some(publisher) = entry.publisher.upgrade() else {
                debug!(channel = %tag, publisher = %entry.publisher_id, "Dropping dead publisher");
                return false;
            };
            if !publisher.header().is_garbage() {
                return true;
            }
            // Still reachable, so detach listeners before forgetting it
            if let Some(signal) = entry.signal.resolve(publisher.as_ref()) {
                for listener in listeners.values() {
                    signal.remove(&listener.callback);
                }
            }
            debug!(channel = %tag, publisher = %entry.publisher_id, "Dropping garbage publisher");
            false
        });

        self.refresh_cached_signature();
    }

    fn cleanup_listeners(&mut self) {
        let stale: SmallVec<[ListenerKey; 4]> = self
            .listeners
            .iter()
            .filter(|(_, entry)| !entry.is_live())
            .map(|(key, _)| key.clone())
            .collect();

        for key in &stale {
            if let Some(entry) = self.listeners.remove(key) {
                each_live_signal(&self.publishers, |signal| {
                    signal.remove(&entry.callback);
                });
                debug!(channel = %self.tag, listener = %key, "Dropping stale listener");
            }
        }

        each_live_signal(&self.publishers, |signal| {
            signal.remove_stale();
        });
    }

    /// Takes the first live publisher's signature as canonical and reports
    /// later publishers whose signal has drifted away from it
    fn refresh_cached_signature(&mut self) {
        let mut canonical: Option<(Signature, String)> = None;

        for entry in &self.publishers {
            let Some(publisher) = entry.live() else {
                continue;
            };
            let Some(signature) = signal_signature(&entry.signal, publisher.as_ref()) else {
                continue;
            };
            if canonical.is_none() {
                canonical = Some((signature, entry.signal_name.clone()));
                continue;
            }
            if let Some((expected, _)) = &canonical {
                if self.log_signature_drift && !expected.is_compatible_with(&signature) {
                    warn!(
                        channel = %self.tag,
                        publisher = %publisher.describe(),
                        expected = %expected,
                        actual = %signature,
                        "Publisher signature drifted from channel signature"
                    );
                }
            }
        }

        match canonical {
            Some((signature, name)) => {
                self.cached_signature = Some(signature);
                self.cached_signal_name = Some(name);
            }
            None => {
                self.cached_signature = None;
                self.cached_signal_name = None;
            }
        }
    }
}

impl core::fmt::Debug for ChannelState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ChannelState")
            .field("tag", &self.tag)
            .field("owns_publisher_callbacks", &self.owns_publisher_callbacks)
            .field("publishers", &self.publishers.len())
            .field("listeners", &self.listeners.len())
            .field("cached_signature", &self.cached_signature)
            .finish()
    }
}
