//! Lifecycle and named-event dispatch
//!
//! A dispatch pass installs the event and its payload on the shared context,
//! walks the subscriber set in activation order and restores the previous
//! payload when the pass ends. `Init` and `TearDown` go through the typed
//! handler traits; every other event is delivered by its bound handler name.
//! Handlers report nothing back: a pass is best-effort broadcast.

use std::sync::Arc;

use tracing::{debug, trace};

use crate::module::context::{EventParam, ModuleContext};
use crate::module::events::ModuleEvent;
use crate::module::queue::DeferredQueue;
use crate::module::registry::ModuleHandle;
use crate::utils::profiler::TimeProfiler;

/// Executes dispatch passes against the shared context
#[derive(Clone)]
pub struct LifecycleDispatcher {
    context: Arc<ModuleContext>,
    profiler: Arc<dyn TimeProfiler>,
    queue: DeferredQueue,
}

impl LifecycleDispatcher {
    pub fn new(
        context: Arc<ModuleContext>,
        profiler: Arc<dyn TimeProfiler>,
        queue: DeferredQueue,
    ) -> Self {
        Self {
            context,
            profiler,
            queue,
        }
    }

    /// Run one pass of `event` over `subscribers`
    ///
    /// `handler` is the name bound to `event`; it is ignored for the typed
    /// events and a missing name turns any other event into a no-op.
    pub fn dispatch(
        &self,
        event: &ModuleEvent,
        handler: Option<&str>,
        subscribers: &[ModuleHandle],
        param: Option<EventParam>,
    ) {
        match event {
            ModuleEvent::Init => self.dispatch_init(subscribers, param),
            ModuleEvent::TearDown => self.dispatch_tear_down(subscribers, param),
            _ => match handler {
                Some(handler) => self.dispatch_named(event, handler, subscribers, param),
                None => debug!("No handler bound for {}, skipping dispatch", event),
            },
        }
    }

    fn dispatch_init(&self, subscribers: &[ModuleHandle], param: Option<EventParam>) {
        let _scope = self.context.enter_dispatch(ModuleEvent::Init, param);

        for module in subscribers {
            if module.module().as_init().is_none() {
                debug!("{} has no init handler, skipping", module.identity());
                continue;
            }
            self.profiler
                .record_event_time(&format!("{} -- mod_init", module.identity()));

            if module.module().runs_async() {
                let module = module.clone();
                let context = Arc::clone(&self.context);
                trace!("Deferring init of {}", module.identity());
                self.queue.defer(move || {
                    if let Some(init) = module.module().as_init() {
                        init.on_init(&context);
                    }
                });
            } else if let Some(init) = module.module().as_init() {
                init.on_init(&self.context);
            }
        }
    }

    fn dispatch_tear_down(&self, subscribers: &[ModuleHandle], param: Option<EventParam>) {
        let _scope = self.context.enter_dispatch(ModuleEvent::TearDown, param);

        for module in subscribers {
            match module.module().as_tear_down() {
                Some(tear_down) => tear_down.on_tear_down(&self.context),
                None => debug!("{} has no teardown handler, skipping", module.identity()),
            }
        }
    }

    fn dispatch_named(
        &self,
        event: &ModuleEvent,
        handler: &str,
        subscribers: &[ModuleHandle],
        param: Option<EventParam>,
    ) {
        let _scope = self.context.enter_dispatch(event.clone(), param);

        for module in subscribers {
            let Some(events) = module.module().as_event_handler() else {
                debug!("{} has no event handler, skipping", module.identity());
                continue;
            };
            trace!("Dispatching {} to {}::{}", event, module.identity(), handler);
            events.handle(handler, &self.context);
            self.profiler
                .record_event_time(&format!("{} --- {}", module.identity(), handler));
        }
    }
}
