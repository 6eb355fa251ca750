//! Event → subscriber tables

use std::collections::HashMap;

use tracing::{debug, trace};

use crate::module::events::ModuleEvent;
use crate::module::registry::descriptor::{sort_by_activation, ModuleHandle};

/// Subscribers of one event and the handler name bound to it
#[derive(Debug, Clone, Default)]
pub struct SubscriptionEntry {
    /// Bound handler name; `None` for the typed events
    pub handler: Option<String>,
    /// Interested instances in activation order
    pub subscribers: Vec<ModuleHandle>,
}

impl SubscriptionEntry {
    fn insert(&mut self, module: &ModuleHandle) -> bool {
        if self.subscribers.iter().any(|s| s.same_instance(module)) {
            return false;
        }
        self.subscribers.push(module.clone());
        sort_by_activation(&mut self.subscribers);
        true
    }
}

/// Subscription tables for every known event
#[derive(Debug, Clone)]
pub struct SubscriptionTable {
    entries: HashMap<ModuleEvent, SubscriptionEntry>,
}

impl Default for SubscriptionTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SubscriptionTable {
    /// Table with the built-in events bound to their default handler names
    pub fn new() -> Self {
        let mut table = Self {
            entries: HashMap::new(),
        };
        for event in ModuleEvent::builtin() {
            if let Some(handler) = event.default_handler() {
                table.bind(event, handler);
            }
        }
        table
    }

    /// Bind `handler` to `event` unless a binding already exists
    ///
    /// Returns `true` when this call recorded the binding. Typed events are
    /// never bound by name.
    pub fn bind(&mut self, event: ModuleEvent, handler: &str) -> bool {
        if event.is_typed() {
            debug!("Ignoring handler binding {} for typed event {}", handler, event);
            return false;
        }
        let entry = self.entries.entry(event.clone()).or_default();
        match &entry.handler {
            None => {
                entry.handler = Some(handler.to_string());
                true
            }
            Some(bound) => {
                if bound != handler {
                    debug!(
                        "Event {} already bound to {}, ignoring {}",
                        event, bound, handler
                    );
                }
                false
            }
        }
    }

    /// Add `module` to every event it implements a handler for
    pub fn subscribe(&mut self, module: &ModuleHandle) {
        let instance = module.module();

        if instance.as_init().is_some() {
            self.insert(ModuleEvent::Init, module);
        }
        if instance.as_tear_down().is_some() {
            self.insert(ModuleEvent::TearDown, module);
        }

        let Some(handler) = instance.as_event_handler() else {
            return;
        };
        let bindings = handler.bindings();
        for binding in &bindings {
            self.bind(binding.event.clone(), binding.handler);
        }

        let matched: Vec<ModuleEvent> = self
            .entries
            .iter()
            .filter_map(|(event, entry)| {
                let bound = entry.handler.as_deref()?;
                bindings
                    .iter()
                    .any(|b| &b.event == event && b.handler == bound)
                    .then(|| event.clone())
            })
            .collect();
        for event in matched {
            self.insert(event, module);
        }
    }

    fn insert(&mut self, event: ModuleEvent, module: &ModuleHandle) {
        let entry = self.entries.entry(event.clone()).or_default();
        if entry.insert(module) {
            trace!("Subscribed {} to {}", module.identity(), event);
        }
    }

    /// Snapshot of the subscribers of `event`, in activation order
    pub fn subscribers(&self, event: &ModuleEvent) -> Vec<ModuleHandle> {
        self.entries
            .get(event)
            .map(|entry| entry.subscribers.clone())
            .unwrap_or_default()
    }

    pub fn handler_for(&self, event: &ModuleEvent) -> Option<&str> {
        self.entries.get(event).and_then(|e| e.handler.as_deref())
    }
}
