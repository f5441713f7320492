//! Runtime binding history
//!
//! Populated as successful binds happen through the facade, so developer
//! tooling can offer the (channel, class, member) tuples seen at runtime.
//! Not a rule table: nothing here gates binding.

use eventbus_core::ChannelTag;
use serde::Serialize;
use tracing::debug;

/// One publisher binding seen at runtime
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublisherHistoryEntry {
    pub channel_tag: ChannelTag,
    pub publisher_class: String,
    pub signal_name: String,
}

/// Methods seen bound for one listener class on one channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListenerHistoryEntry {
    pub channel_tag: ChannelTag,
    pub listener_class: String,
    pub known_methods: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RuntimeHistory {
    publishers: Vec<PublisherHistoryEntry>,
    listeners: Vec<ListenerHistoryEntry>,
}

impl RuntimeHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a publisher binding once per (channel, class, signal)
    pub fn record_publisher_binding(&mut self, tag: &ChannelTag, class_name: &str, signal_name: &str) {
        let exists = self.publishers.iter().any(|entry| {
            entry.channel_tag == *tag
                && entry.publisher_class == class_name
                && entry.signal_name == signal_name
        });
        if exists {
            return;
        }

        self.publishers.push(PublisherHistoryEntry {
            channel_tag: tag.clone(),
            publisher_class: class_name.to_string(),
            signal_name: signal_name.to_string(),
        });
        debug!(channel = %tag, class = class_name, signal = signal_name, "Recorded publisher binding");
    }

    /// Adds `method_name` to the known methods of (channel, class)
    pub fn record_listener_binding(&mut self, tag: &ChannelTag, class_name: &str, method_name: &str) {
        let index = match self
            .listeners
            .iter()
            .position(|entry| entry.channel_tag == *tag && entry.listener_class == class_name)
        {
            Some(index) => index,
            None => {
                self.listeners.push(ListenerHistoryEntry {
                    channel_tag: tag.clone(),
                    listener_class: class_name.to_string(),
                    known_methods: Vec::new(),
                });
                self.listeners.len() - 1
            }
        };

        let entry = &mut self.listeners[index];
        if !entry.known_methods.iter().any(|known| known == method_name) {
            entry.known_methods.push(method_name.to_string());
            debug!(channel = %tag, class = class_name, method = method_name, "Recorded listener binding");
        }
    }

    /// Known methods for (channel, class), sorted
    pub fn known_listener_methods(&self, tag: &ChannelTag, class_name: &str) -> Vec<String> {
        let mut methods: Vec<String> = self
            .listeners
            .iter()
            .filter(|entry| entry.channel_tag == *tag && entry.listener_class == class_name)
            .flat_map(|entry| entry.known_methods.iter().cloned())
            .collect();
        methods.sort();
        methods.dedup();
        methods
    }

    pub fn publisher_entries(&self) -> &[PublisherHistoryEntry] {
        &self.publishers
    }

    pub fn listener_entries(&self) -> &[ListenerHistoryEntry] {
        &self.listeners
    }

    pub fn is_empty(&self) -> bool {
        self.publishers.is_empty() && self.listeners.is_empty()
    }

    pub fn clear(&mut self) {
        self.publishers.clear();
        self.listeners.clear();
    }

    /// Pretty JSON dump for tooling
    pub fn to_json(&self) -> crate::error::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
