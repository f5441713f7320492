//! EventBus Facade
//!
//! Entry point for scripting and tooling layers on top of `eventbus-core`:
//! an allowlist registry gating which (channel, class, member) tuples may
//! bind, and a runtime history of the bindings that succeeded.

// ----------------------------------------------------------------------------
// Module Declarations
// ----------------------------------------------------------------------------

pub mod allowlist;
pub mod config;
pub mod error;
pub mod facade;
pub mod history;

// ----------------------------------------------------------------------------
// Public API
// ----------------------------------------------------------------------------

pub use allowlist::{AllowlistRegistry, ListenerRule, PublisherRule};
pub use config::FacadeConfig;
pub use error::{FacadeError, Result};
pub use facade::EventBusFacade;
pub use history::{ListenerHistoryEntry, PublisherHistoryEntry, RuntimeHistory};
