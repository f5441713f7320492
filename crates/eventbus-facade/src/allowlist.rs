//! Allowlist registry
//!
//! Rules naming which (channel, class, member) tuples may be bound through
//! the facade. A class rule also covers every class descending from it.

use std::path::Path;

use eventbus_core::{ChannelTag, ClassInfo};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{FacadeError, Result};

// ----------------------------------------------------------------------------
// Rules
// ----------------------------------------------------------------------------

/// Allows one signal of a publisher class to feed a channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublisherRule {
    pub channel_tag: ChannelTag,
    pub publisher_class: String,
    pub signal_name: String,
}

impl PublisherRule {
    pub fn new(
        channel_tag: impl Into<ChannelTag>,
        publisher_class: impl Into<String>,
        signal_name: impl Into<String>,
    ) -> Self {
        Self {
            channel_tag: channel_tag.into(),
            publisher_class: publisher_class.into(),
            signal_name: signal_name.into(),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.channel_tag.is_valid()
            && !self.publisher_class.trim().is_empty()
            && !self.signal_name.trim().is_empty()
    }
}

/// Allows a set of methods of a listener class to receive a channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListenerRule {
    pub channel_tag: ChannelTag,
    pub listener_class: String,
    #[serde(default)]
    pub allowed_methods: Vec<String>,
}

impl ListenerRule {
    pub fn new<I, S>(channel_tag: impl Into<ChannelTag>, listener_class: impl Into<String>, methods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            channel_tag: channel_tag.into(),
            listener_class: listener_class.into(),
            allowed_methods: methods.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.channel_tag.is_valid() && !self.listener_class.trim().is_empty()
    }
}

// ----------------------------------------------------------------------------
// Registry
// ----------------------------------------------------------------------------

/// Publisher and listener allowlist consulted before validated adds
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AllowlistRegistry {
    pub publisher_rules: Vec<PublisherRule>,
    pub listener_rules: Vec<ListenerRule>,
}

impl AllowlistRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_publisher_rule(mut self, rule: PublisherRule) -> Self {
        self.publisher_rules.push(rule);
        self
    }

    pub fn with_listener_rule(mut self, rule: ListenerRule) -> Self {
        self.listener_rules.push(rule);
        self
    }

    /// True when some valid rule names this channel, class (or an ancestor)
    /// and signal
    pub fn is_publisher_allowed(&self, tag: &ChannelTag, class: &ClassInfo, signal_name: &str) -> bool {
        if !tag.is_valid() || signal_name.trim().is_empty() {
            warn!(
                channel = %tag,
                class = class.name(),
                signal = signal_name,
                "Allowlist publisher check with invalid input"
            );
            return false;
        }

        let matched = self.publisher_rules.iter().find(|rule| {
            rule.is_valid()
                && rule.channel_tag == *tag
                && class.is_a(&rule.publisher_class)
                && rule.signal_name == signal_name
        });

        match matched {
            Some(rule) => {
                debug!(
                    channel = %tag,
                    class = class.name(),
                    signal = signal_name,
                    rule_class = %rule.publisher_class,
                    "Allowlist publisher matched"
                );
                true
            }
            None => {
                warn!(
                    channel = %tag,
                    class = class.name(),
                    signal = signal_name,
                    rules_scanned = self.publisher_rules.len(),
                    "Allowlist publisher denied"
                );
                false
            }
        }
    }

    /// True when some valid rule for this channel and class (or an ancestor)
    /// lists the method
    pub fn is_listener_allowed(&self, tag: &ChannelTag, class: &ClassInfo, method_name: &str) -> bool {
        if !tag.is_valid() || method_name.trim().is_empty() {
            warn!(
                channel = %tag,
                class = class.name(),
                method = method_name,
                "Allowlist listener check with invalid input"
            );
            return false;
        }

        let matched = self.matching_listener_rules(tag, class).find(|rule| {
            rule.allowed_methods
                .iter()
                .any(|allowed| allowed == method_name)
        });

        match matched {
            Some(rule) => {
                debug!(
                    channel = %tag,
                    class = class.name(),
                    method = method_name,
                    rule_class = %rule.listener_class,
                    "Allowlist listener matched"
                );
                true
            }
            None => {
                warn!(
                    channel = %tag,
                    class = class.name(),
                    method = method_name,
                    rules_scanned = self.listener_rules.len(),
                    "Allowlist listener denied"
                );
                false
            }
        }
    }

    /// Every method allowed for `class` on `tag`, deduplicated and sorted
    pub fn allowed_listener_methods(&self, tag: &ChannelTag, class: &ClassInfo) -> Vec<String> {
        if !tag.is_valid() {
            warn!(channel = %tag, class = class.name(), "Allowlist method listing with invalid channel");
            return Vec::new();
        }

        let mut methods: Vec<String> = self
            .matching_listener_rules(tag, class)
            .flat_map(|rule| rule.allowed_methods.iter().cloned())
            .collect();
        methods.sort();
        methods.dedup();
        methods
    }

    fn matching_listener_rules<'a>(
        &'a self,
        tag: &'a ChannelTag,
        class: &'a ClassInfo,
    ) -> impl Iterator<Item = &'a ListenerRule> + 'a {
        self.listener_rules.iter().filter(move |rule| {
            rule.is_valid() && rule.channel_tag == *tag && class.is_a(&rule.listener_class)
        })
    }

    // ------------------------------------------------------------------------
    // Validation and Persistence
    // ------------------------------------------------------------------------

    /// Fails on the first malformed rule
    pub fn validate(&self) -> Result<()> {
        if let Some(rule) = self.publisher_rules.iter().find(|rule| !rule.is_valid()) {
            return Err(FacadeError::InvalidRule(format!(
                "publisher rule {} / {} / {}",
                rule.channel_tag, rule.publisher_class, rule.signal_name
            )));
        }
        if let Some(rule) = self.listener_rules.iter().find(|rule| !rule.is_valid()) {
            return Err(FacadeError::InvalidRule(format!(
                "listener rule {} / {}",
                rule.channel_tag, rule.listener_class
            )));
        }
        Ok(())
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|err| FacadeError::io(path, err))?;
        Self::from_toml_str(&contents)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        std::fs::write(path, self.to_toml_string()?).map_err(|err| FacadeError::io(path, err))
    }
}
