//! modhost - bootstrap core of a modular application host
//!
//! Independently built feature modules register with a [`ModuleManager`],
//! which keeps them in a deterministic activation order and drives them through
//! a shared lifecycle (`Setup`, `Init`, `Splash`, `TearDown`) and through named
//! broadcast events, without the host knowing at compile time which modules
//! exist.
//!
//! ## Design Principles
//!
//! 1. **Deterministic order**: level descending, then priority ascending,
//!    stable for ties
//! 2. **Idempotent registration**: one live instance per module type
//! 3. **Best-effort broadcast**: missing handlers and unbound events are skipped,
//!    never reported as errors
//! 4. **Scoped payload**: the shared context carries the current event and
//!    parameters only for the duration of a dispatch pass
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use modhost::{HostConfig, Module, ModuleContext, ModuleEvent, ModuleLevel, ModuleManager, ModuleType};
//!
//! struct Analytics;
//!
//! impl Module for Analytics {
//!     fn level(&self) -> ModuleLevel {
//!         ModuleLevel::Business
//!     }
//! }
//!
//! impl ModuleType for Analytics {
//!     fn construct(_context: &Arc<ModuleContext>) -> Self {
//!         Analytics
//!     }
//! }
//!
//! let manager = ModuleManager::new(&HostConfig::for_application("shop"));
//! manager.register::<Analytics>(true);
//! manager.queue().drain();
//! manager.trigger_event(ModuleEvent::TearDown, None);
//! assert_eq!(manager.module_count(), 1);
//! ```

pub mod config;
pub mod module;
pub mod utils;

pub use config::{HostConfig, LoggingConfig};
pub use module::{
    DeferredQueue, EventHandler, EventParam, HandlerBinding, InitHandler, ManifestEntry,
    ManifestPolicy, Module, ModuleContext, ModuleDescriptor, ModuleError, ModuleEvent,
    ModuleLevel, ModuleManager, ModuleType, TearDownHandler,
};
