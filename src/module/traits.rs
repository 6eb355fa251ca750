//! Module system traits and interfaces
//!
//! Defines the capability set a module exposes to the registry: the required
//! level/priority pair, construction from the shared context, and the optional
//! typed lifecycle and named-event handlers.

use std::any::{type_name, Any};
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::module::context::ModuleContext;
use crate::module::events::{HandlerBinding, ModuleEvent};

/// Coarse activation tier
///
/// Higher levels are activated and dispatched before lower ones. Persisted
/// manifests carry the integer value.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(try_from = "i64", into = "i64")]
pub enum ModuleLevel {
    /// Infrastructure that business modules build on
    Foundation = 0,
    /// Shared services
    #[default]
    Basic = 1,
    /// Feature modules
    Business = 2,
}

impl TryFrom<i64> for ModuleLevel {
    type Error = ModuleError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(ModuleLevel::Foundation),
            1 => Ok(ModuleLevel::Basic),
            2 => Ok(ModuleLevel::Business),
            other => Err(ModuleError::InvalidLevel(other)),
        }
    }
}

impl From<ModuleLevel> for i64 {
    fn from(level: ModuleLevel) -> Self {
        level as i64
    }
}

impl fmt::Display for ModuleLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            ModuleLevel::Foundation => "foundation",
            ModuleLevel::Basic => "basic",
            ModuleLevel::Business => "business",
        })
    }
}

/// Module trait that all modules must implement
///
/// Handlers take `&self`: one instance can sit in several subscriber lists at
/// once, so modules that keep state use interior mutability.
pub trait Module: Any + Send + Sync {
    /// Activation tier, primary sort key (descending)
    fn level(&self) -> ModuleLevel;

    /// Tie-breaker within a level, lower dispatches earlier
    fn priority(&self) -> i32 {
        0
    }

    /// Whether `Init` delivery is deferred onto the host queue
    fn runs_async(&self) -> bool {
        false
    }

    /// Typed `Init` capability
    fn as_init(&self) -> Option<&dyn InitHandler> {
        None
    }

    /// Typed `TearDown` capability
    fn as_tear_down(&self) -> Option<&dyn TearDownHandler> {
        None
    }

    /// Named-event capability
    fn as_event_handler(&self) -> Option<&dyn EventHandler> {
        None
    }
}

/// A concrete module type the registry can construct
pub trait ModuleType: Module + Sized {
    /// Stable identity used in descriptors and persisted manifests
    ///
    /// Defaults to the Rust type name. Override it when the module is listed
    /// in a manifest, since type names are not stable across builds.
    fn identity() -> &'static str {
        type_name::<Self>()
    }

    /// Construct the single instance of this module
    fn construct(context: &Arc<ModuleContext>) -> Self;
}

/// Reacts to the reserved `Init` event
pub trait InitHandler {
    fn on_init(&self, context: &ModuleContext);
}

/// Reacts to the reserved `TearDown` event
pub trait TearDownHandler {
    fn on_tear_down(&self, context: &ModuleContext);
}

/// Reacts to named events
///
/// The registry binds each event identifier to a single handler name (the first
/// binding it sees wins). A module is subscribed to an event only when it
/// declares that exact `(event, handler)` pair.
pub trait EventHandler {
    /// Handler bindings this module implements
    fn bindings(&self) -> Vec<HandlerBinding>;

    /// Invoke the handler bound under `handler`
    fn handle(&self, handler: &str, context: &ModuleContext);

    /// Whether this module declares `handler` for `event`
    fn responds_to(&self, event: &ModuleEvent, handler: &str) -> bool {
        self.bindings()
            .iter()
            .any(|binding| &binding.event == event && binding.handler == handler)
    }
}

/// Module system errors
#[derive(Debug, Error)]
pub enum ModuleError {
    #[error("Invalid module manifest: {0}")]
    InvalidManifest(String),

    #[error("Invalid module level: {0}")]
    InvalidLevel(i64),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for ModuleError {
    fn from(e: std::io::Error) -> Self {
        ModuleError::Io(e.to_string())
    }
}

impl From<toml::de::Error> for ModuleError {
    fn from(e: toml::de::Error) -> Self {
        ModuleError::InvalidManifest(e.to_string())
    }
}

impl From<serde_json::Error> for ModuleError {
    fn from(e: serde_json::Error) -> Self {
        ModuleError::ConfigError(e.to_string())
    }
}
