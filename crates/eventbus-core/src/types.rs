//! Binding descriptors for the EventBus
//!
//! Plain value types describing a channel registration, publisher and
//! listener binding requests, and the stable key used to deduplicate
//! listener subscriptions.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::EventBusError;
use crate::object::ObjectId;

// ----------------------------------------------------------------------------
// Channel Tag
// ----------------------------------------------------------------------------

/// Hierarchical dot-separated channel identifier, e.g. `Game.Combat.Damage`
///
/// Construction is unchecked so that invalid tags can reach the bus and be
/// rejected there with `InvalidChannel`; use [`ChannelTag::parse`] to
/// validate up front.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelTag(String);

impl ChannelTag {
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    /// Create a tag, failing with `InvalidChannel` when it is malformed
    pub fn parse(tag: &str) -> Result<Self, EventBusError> {
        let tag = Self::new(tag);
        if tag.is_valid() {
            Ok(tag)
        } else {
            Err(EventBusError::InvalidChannel { tag: tag.0 })
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Non-empty, with every segment non-empty and made of ASCII
    /// alphanumerics or underscores
    pub fn is_valid(&self) -> bool {
        !self.0.is_empty()
            && self.0.split('.').all(|segment| {
                !segment.is_empty()
                    && segment
                        .chars()
                        .all(|c| c.is_ascii_alphanumeric() || c == '_')
            })
    }

    /// Tag one level up the hierarchy, if any
    pub fn parent(&self) -> Option<ChannelTag> {
        self.0
            .rsplit_once('.')
            .map(|(parent, _)| ChannelTag(parent.to_string()))
    }

    /// True when this tag equals `other` or sits beneath it
    pub fn matches(&self, other: &ChannelTag) -> bool {
        self.0 == other.0
            || (self.0.len() > other.0.len()
                && self.0.starts_with(other.0.as_str())
                && self.0.as_bytes()[other.0.len()] == b'.')
    }
}

impl fmt::Display for ChannelTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ChannelTag {
    type Err = EventBusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<&str> for ChannelTag {
    fn from(tag: &str) -> Self {
        Self::new(tag)
    }
}

// ----------------------------------------------------------------------------
// Binding Requests
// ----------------------------------------------------------------------------

/// Request to create a channel with a fixed ownership policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelRegistration {
    pub channel_tag: ChannelTag,
    /// When set, removing a listener evicts every method it bound on the
    /// channel instead of only the named one
    #[serde(default)]
    pub owns_publisher_callbacks: bool,
}

impl ChannelRegistration {
    pub fn new(channel_tag: impl Into<ChannelTag>, owns_publisher_callbacks: bool) -> Self {
        Self {
            channel_tag: channel_tag.into(),
            owns_publisher_callbacks,
        }
    }
}

/// Names the signal member a publisher exposes on a channel
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PublisherBinding {
    pub signal_name: String,
}

impl PublisherBinding {
    pub fn new(signal_name: impl Into<String>) -> Self {
        Self {
            signal_name: signal_name.into(),
        }
    }
}

/// Names the method a listener wants invoked for a channel
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ListenerBinding {
    pub method_name: String,
}

impl ListenerBinding {
    pub fn new(method_name: impl Into<String>) -> Self {
        Self {
            method_name: method_name.into(),
        }
    }
}

// ----------------------------------------------------------------------------
// Listener Key
// ----------------------------------------------------------------------------

/// One listener subscription: stable object identity plus method name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ListenerKey {
    pub object_id: ObjectId,
    pub method_name: String,
}

impl ListenerKey {
    pub fn new(object_id: ObjectId, method_name: impl Into<String>) -> Self {
        Self {
            object_id,
            method_name: method_name.into(),
        }
    }
}

impl fmt::Display for ListenerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.object_id, self.method_name)
    }
}
