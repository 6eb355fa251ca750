//! Shared module context
//!
//! One `ModuleContext` is created per host and handed to every module at
//! construction. Besides the static application data it carries the payload of
//! the dispatch currently in progress (`current_param` / `current_event`).
//! Those two fields are only written through a [`DispatchScope`], which puts the
//! previous values back when it is dropped, so a handler that triggers another
//! dispatch sees its own payload again once the nested pass returns.

use std::collections::HashMap;
use std::fmt::Display;
use std::str::FromStr;

use parking_lot::Mutex;
use serde_json::{Map, Value};

use crate::module::events::ModuleEvent;
use crate::utils::error::with_default;

/// Per-dispatch payload
pub type EventParam = Map<String, Value>;

#[derive(Debug, Clone, Default)]
struct Transient {
    param: Option<EventParam>,
    event: Option<ModuleEvent>,
}

/// Context shared by the host and all modules
#[derive(Debug)]
pub struct ModuleContext {
    application_name: String,
    config: HashMap<String, String>,
    transient: Mutex<Transient>,
}

impl ModuleContext {
    /// Create a new module context
    pub fn new(application_name: impl Into<String>, config: HashMap<String, String>) -> Self {
        Self {
            application_name: application_name.into(),
            config,
            transient: Mutex::new(Transient::default()),
        }
    }

    pub fn application_name(&self) -> &str {
        &self.application_name
    }

    /// Get a configuration value
    pub fn config_value(&self, key: &str) -> Option<&str> {
        self.config.get(key).map(String::as_str)
    }

    /// Get a configuration value with default
    pub fn config_or(&self, key: &str, default: &str) -> String {
        self.config_value(key).unwrap_or(default).to_string()
    }

    /// Parse a configuration value; absent or malformed values yield `default`
    pub fn config_parsed<T>(&self, key: &str, default: T) -> T
    where
        T: FromStr,
        T::Err: Display,
    {
        match self.config_value(key) {
            Some(raw) => with_default(
                || raw.parse::<T>(),
                default,
                &format!("Invalid config value {} = {:?}", key, raw),
            ),
            None => default,
        }
    }

    /// Payload of the dispatch in progress
    pub fn current_param(&self) -> Option<EventParam> {
        self.transient.lock().param.clone()
    }

    /// Event of the dispatch in progress
    pub fn current_event(&self) -> Option<ModuleEvent> {
        self.transient.lock().event.clone()
    }

    /// Install `event` and `param` until the returned scope is dropped
    pub fn enter_dispatch(&self, event: ModuleEvent, param: Option<EventParam>) -> DispatchScope<'_> {
        let mut transient = self.transient.lock();
        let saved = std::mem::replace(
            &mut *transient,
            Transient {
                param,
                event: Some(event),
            },
        );
        DispatchScope {
            context: self,
            saved: Some(saved),
        }
    }
}

/// Restores the context's transient fields on drop, including during unwinding
#[must_use = "the dispatch payload is restored as soon as the scope is dropped"]
pub struct DispatchScope<'a> {
    context: &'a ModuleContext,
    saved: Option<Transient>,
}

impl Drop for DispatchScope<'_> {
    fn drop(&mut self) {
        if let Some(saved) = self.saved.take() {
            *self.context.transient.lock() = saved;
        }
    }
}
