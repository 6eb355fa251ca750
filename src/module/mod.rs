//! Module system
//!
//! Feature modules register themselves with a [`ModuleManager`], which keeps
//! them in a deterministic activation order and drives them through the shared
//! lifecycle and through named broadcast events.
//!
//! ## Architecture
//!
//! - **Registry**: descriptors, live instances (one per type) and per-event
//!   subscriber lists, all sorted by level (descending) then priority (ascending)
//! - **Catalog**: identity → constructor map, so manifests can name modules
//! - **Dispatcher**: typed `Init`/`TearDown` delivery and name-bound delivery for
//!   every other event, with the shared context's payload scoped to each pass
//! - **Deferred queue**: single-consumer FIFO for `Splash` and async `Init`

pub mod context;
pub mod dispatcher;
pub mod events;
pub mod manager;
pub mod queue;
pub mod registry;
pub mod traits;

pub use context::{DispatchScope, EventParam, ModuleContext};
pub use dispatcher::LifecycleDispatcher;
pub use events::{HandlerBinding, ModuleEvent};
pub use manager::ModuleManager;
pub use queue::{DeferredJob, DeferredQueue};
pub use registry::{
    ManifestEntry, ManifestLoader, ManifestPolicy, ModuleDescriptor, ModuleHandle, ModuleManifest,
    ModuleRegistry, SubscriptionTable,
};
pub use traits::{
    EventHandler, InitHandler, Module, ModuleError, ModuleLevel, ModuleType, TearDownHandler,
};
