//! Module manager for orchestrating all modules
//!
//! Handles registration, manifest resolution, finalization and event triggering.
//!
//! Registry state sits behind a lock that is always released before module code
//! runs (constructors, handlers), so a handler may register modules or trigger
//! nested events. All registration and dispatch is still expected to happen on
//! one logical thread: the shared context's payload is scoped per call stack,
//! and two threads dispatching at once would observe each other's payload.

use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};
use tracing::{debug, info};

use crate::config::HostConfig;
use crate::module::context::{EventParam, ModuleContext};
use crate::module::dispatcher::LifecycleDispatcher;
use crate::module::events::ModuleEvent;
use crate::module::queue::DeferredQueue;
use crate::module::registry::{
    ManifestEntry, ManifestLoader, ManifestPolicy, ModuleCatalog, ModuleDescriptor, ModuleFactory,
    ModuleHandle, ModuleRegistry,
};
use crate::module::traits::ModuleType;
use crate::utils::error::log_error;
use crate::utils::profiler::{EventTimeProfiler, TimeProfiler};

/// Module manager coordinates all registered modules
///
/// Cheap to clone; clones share the same registry.
#[derive(Clone)]
pub struct ModuleManager {
    inner: Arc<ManagerInner>,
}

struct ManagerInner {
    registry: Mutex<ModuleRegistry>,
    catalog: RwLock<ModuleCatalog>,
    dispatcher: LifecycleDispatcher,
    context: Arc<ModuleContext>,
    queue: DeferredQueue,
    profiler: Arc<EventTimeProfiler>,
    loader: ManifestLoader,
    manifest_policy: ManifestPolicy,
}

impl ModuleManager {
    /// Create a new module manager
    pub fn new(config: &HostConfig) -> Self {
        let profiler = Arc::new(EventTimeProfiler::new(config.profiler_samples));
        let context = Arc::new(ModuleContext::new(
            config.application_name.clone(),
            config.context.clone(),
        ));
        let queue = DeferredQueue::new();
        let dispatcher = LifecycleDispatcher::new(
            Arc::clone(&context),
            Arc::clone(&profiler) as Arc<dyn TimeProfiler>,
            queue.clone(),
        );

        Self {
            inner: Arc::new(ManagerInner {
                registry: Mutex::new(ModuleRegistry::new()),
                catalog: RwLock::new(ModuleCatalog::new()),
                dispatcher,
                context,
                queue,
                profiler,
                loader: ManifestLoader::new(&config.manifest_dir),
                manifest_policy: config.manifest_policy,
            }),
        }
    }

    /// Make `M` resolvable by identity without instantiating it
    pub fn declare<M: ModuleType>(&self) {
        self.inner.catalog.write().declare::<M>();
    }

    /// Register `M`, constructing its single instance
    ///
    /// Registering a type that already has a live instance is a no-op. With
    /// `trigger_initial_sequence` the new instance receives `Setup`, then
    /// `Init`, and `Splash` is queued on the deferred queue.
    pub fn register<M: ModuleType>(&self, trigger_initial_sequence: bool) {
        let factory = self.inner.catalog.write().declare::<M>();
        self.register_factory(factory, trigger_initial_sequence);
    }

    /// Register a declared module by identity; unknown identities are ignored
    pub fn register_by_identity(&self, identity: &str, trigger_initial_sequence: bool) {
        let factory = self.inner.catalog.read().resolve(identity);
        match factory {
            Some(factory) => self.register_factory(factory, trigger_initial_sequence),
            None => debug!("No module type declared for {}, ignoring", identity),
        }
    }

    fn register_factory(&self, factory: ModuleFactory, trigger_initial_sequence: bool) {
        if self.inner.registry.lock().contains_type(factory.type_id()) {
            debug!("Module {} already registered", factory.identity());
            return;
        }

        let module = factory.construct(&self.inner.context);
        if !self.inner.registry.lock().insert(module.clone()) {
            // Constructor registered the same type re-entrantly
            debug!("Module {} already registered", factory.identity());
            return;
        }
        info!(
            "Registered module {} (level {}, priority {})",
            module.identity(),
            module.module().level(),
            module.module().priority()
        );

        if trigger_initial_sequence {
            self.dispatch_to(&ModuleEvent::Setup, &module, None);
            self.dispatch_to(&ModuleEvent::Init, &module, None);
            let inner = Arc::downgrade(&self.inner);
            self.inner.queue.defer(move || match Self::upgrade(&inner) {
                Some(manager) => manager.dispatch_to(&ModuleEvent::Splash, &module, None),
                None => debug!("Manager dropped, skipping splash for {}", module.identity()),
            });
        }
    }

    /// Queued jobs hold the manager weakly; the queue lives inside it
    fn upgrade(inner: &Weak<ManagerInner>) -> Option<Self> {
        inner.upgrade().map(|inner| Self { inner })
    }

    /// Bind `handler` to `event` ahead of any module; first binding wins
    pub fn bind_event(&self, event: ModuleEvent, handler: &str) -> bool {
        self.inner.registry.lock().bind_event(event, handler)
    }

    /// Load the persisted manifest for this application and resolve it
    ///
    /// A missing manifest is an empty list; an unreadable one is logged and
    /// treated the same way.
    pub fn load_local_modules(&self) {
        let application_name = self.inner.context.application_name();
        let context = format!(
            "Failed to load module manifest {:?}",
            self.inner.loader.manifest_path(application_name)
        );
        let entries =
            log_error(|| self.inner.loader.load(application_name), &context).unwrap_or_default();
        self.resolve_persisted_modules(entries);
    }

    /// Append manifest entries to the descriptor list
    ///
    /// With the default [`ManifestPolicy::KnownOnly`] only entries whose
    /// identity is already described are kept.
    pub fn resolve_persisted_modules(&self, candidates: Vec<ManifestEntry>) {
        let offered = candidates.len();
        let kept = self
            .inner
            .registry
            .lock()
            .resolve_persisted(candidates, self.inner.manifest_policy);
        info!(
            "Resolved {} of {} manifest entries ({:?})",
            kept, offered, self.inner.manifest_policy
        );
    }

    /// Instantiate every pending descriptor and rebuild all subscriptions
    pub fn finalize_registrations(&self) {
        let pending = {
            let mut registry = self.inner.registry.lock();
            registry.sort_descriptors();
            registry.pending_identities()
        };

        let mut constructed = 0;
        for identity in pending {
            let Some(factory) = self.inner.catalog.read().resolve(&identity) else {
                debug!("No module type declared for {}, skipping", identity);
                continue;
            };

            if self.inner.registry.lock().contains_type(factory.type_id()) {
                self.inner.registry.lock().mark_instantiated(&identity);
                continue;
            }

            let module = factory.construct(&self.inner.context);
            let mut registry = self.inner.registry.lock();
            if registry.adopt(module) {
                constructed += 1;
            }
            registry.mark_instantiated(&identity);
        }

        let mut registry = self.inner.registry.lock();
        registry.rebuild_subscriptions();
        info!(
            "Finalized registrations: {} constructed, {} live modules",
            constructed,
            registry.modules().len()
        );
    }

    /// Broadcast `event` to all of its subscribers
    pub fn trigger_event(&self, event: ModuleEvent, param: Option<EventParam>) {
        let (handler, subscribers) = {
            let registry = self.inner.registry.lock();
            let table = registry.subscriptions();
            (
                table.handler_for(&event).map(str::to_string),
                table.subscribers(&event),
            )
        };
        debug!("Triggering {} for {} subscribers", event, subscribers.len());
        self.inner
            .dispatcher
            .dispatch(&event, handler.as_deref(), &subscribers, param);
    }

    /// Dispatch `event` to `target` only, if it implements the handler
    fn dispatch_to(&self, event: &ModuleEvent, target: &ModuleHandle, param: Option<EventParam>) {
        let handler = self
            .inner
            .registry
            .lock()
            .subscriptions()
            .handler_for(event)
            .map(str::to_string);

        let implements = match event {
            ModuleEvent::Init => target.module().as_init().is_some(),
            ModuleEvent::TearDown => target.module().as_tear_down().is_some(),
            _ => match (&handler, target.module().as_event_handler()) {
                (Some(name), Some(events)) => events.responds_to(event, name),
                _ => false,
            },
        };
        if !implements {
            debug!("{} does not handle {}, skipping", target.identity(), event);
            return;
        }

        self.inner.dispatcher.dispatch(
            event,
            handler.as_deref(),
            std::slice::from_ref(target),
            param,
        );
    }

    pub fn context(&self) -> &Arc<ModuleContext> {
        &self.inner.context
    }

    pub fn queue(&self) -> &DeferredQueue {
        &self.inner.queue
    }

    pub fn profiler(&self) -> &Arc<EventTimeProfiler> {
        &self.inner.profiler
    }

    /// Snapshot of the descriptor list
    pub fn descriptors(&self) -> Vec<ModuleDescriptor> {
        self.inner.registry.lock().descriptors().to_vec()
    }

    /// Identities of live modules in activation order
    pub fn module_identities(&self) -> Vec<&'static str> {
        self.inner
            .registry
            .lock()
            .modules()
            .iter()
            .map(ModuleHandle::identity)
            .collect()
    }

    /// Identities subscribed to `event`, in dispatch order
    pub fn subscriber_identities(&self, event: &ModuleEvent) -> Vec<&'static str> {
        self.inner
            .registry
            .lock()
            .subscriptions()
            .subscribers(event)
            .iter()
            .map(ModuleHandle::identity)
            .collect()
    }

    pub fn handler_for(&self, event: &ModuleEvent) -> Option<String> {
        self.inner
            .registry
            .lock()
            .subscriptions()
            .handler_for(event)
            .map(str::to_string)
    }

    pub fn module_count(&self) -> usize {
        self.inner.registry.lock().modules().len()
    }

    pub fn is_declared(&self, identity: &str) -> bool {
        self.inner.catalog.read().contains(identity)
    }
}

impl Default for ModuleManager {
    fn default() -> Self {
        Self::new(&HostConfig::default())
    }
}
