//! EventBus Core
//!
//! In-process publish/subscribe router. Publisher objects expose multicast
//! signals, listener objects expose named methods, and the [`EventBus`]
//! binds them through channels identified by hierarchical tags while keeping
//! one canonical signature per channel.
//!
//! The bus holds only weak references. Objects that die or are marked as
//! garbage are detected and unbound at the start of the next mutating call
//! on their channel.

// ----------------------------------------------------------------------------
// Module Declarations
// ----------------------------------------------------------------------------

pub mod bus;
pub mod channel_state;
pub mod config;
pub mod errors;
pub mod object;
pub mod signal;
pub mod typed;
pub mod types;
pub mod validation;

// ----------------------------------------------------------------------------
// Public API
// ----------------------------------------------------------------------------

pub use bus::EventBus;
pub use channel_state::ChannelSnapshot;
pub use config::EventBusConfig;
pub use errors::{ErrorKind, EventBusError, EventBusResult};
pub use object::{
    BusObject, ClassBuilder, ClassInfo, MethodHandle, MethodInfo, ObjectHeader, ObjectId,
    ObjectRef, SignalHandle, SignalInfo,
};
pub use signal::{Callback, MulticastSignal, Param, ParamType, Signature, Value};
pub use typed::{ChannelDef, ListenerMethod, TypedChannel};
pub use types::{ChannelRegistration, ChannelTag, ListenerBinding, ListenerKey, PublisherBinding};
