//! Event identifiers and handler bindings

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable token naming a lifecycle phase or an application broadcast
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleEvent {
    /// Registration-time setup, before `Init`
    Setup,
    /// Typed initialization
    Init,
    /// Typed teardown
    TearDown,
    /// Post-init announcement, delivered after the registering call returns
    Splash,
    QuickAction,
    WillResignActive,
    DidEnterBackground,
    WillEnterForeground,
    DidBecomeActive,
    WillTerminate,
    Unmount,
    OpenUrl,
    MemoryWarning,
    /// Application-defined event
    Custom(String),
}

impl ModuleEvent {
    /// Shorthand for an application-defined event
    pub fn custom(name: impl Into<String>) -> Self {
        ModuleEvent::Custom(name.into())
    }

    /// Events delivered through the typed handler traits rather than by name
    pub fn is_typed(&self) -> bool {
        matches!(self, ModuleEvent::Init | ModuleEvent::TearDown)
    }

    /// Handler name the registry pre-binds for this event
    pub fn default_handler(&self) -> Option<&'static str> {
        let name = match self {
            ModuleEvent::Setup => "mod_setup",
            ModuleEvent::Splash => "mod_splash",
            ModuleEvent::QuickAction => "mod_quick_action",
            ModuleEvent::WillResignActive => "mod_will_resign_active",
            ModuleEvent::DidEnterBackground => "mod_did_enter_background",
            ModuleEvent::WillEnterForeground => "mod_will_enter_foreground",
            ModuleEvent::DidBecomeActive => "mod_did_become_active",
            ModuleEvent::WillTerminate => "mod_will_terminate",
            ModuleEvent::Unmount => "mod_unmount",
            ModuleEvent::OpenUrl => "mod_open_url",
            ModuleEvent::MemoryWarning => "mod_memory_warning",
            ModuleEvent::Init | ModuleEvent::TearDown | ModuleEvent::Custom(_) => return None,
        };
        Some(name)
    }

    /// Every event that has a default handler name
    pub fn builtin() -> [ModuleEvent; 11] {
        [
            ModuleEvent::Setup,
            ModuleEvent::Splash,
            ModuleEvent::QuickAction,
            ModuleEvent::WillResignActive,
            ModuleEvent::DidEnterBackground,
            ModuleEvent::WillEnterForeground,
            ModuleEvent::DidBecomeActive,
            ModuleEvent::WillTerminate,
            ModuleEvent::Unmount,
            ModuleEvent::OpenUrl,
            ModuleEvent::MemoryWarning,
        ]
    }
}

impl fmt::Display for ModuleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModuleEvent::Custom(name) => write!(f, "custom:{}", name),
            other => write!(f, "{:?}", other),
        }
    }
}

/// An `(event, handler name)` pair declared by a module
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerBinding {
    pub event: ModuleEvent,
    pub handler: &'static str,
}

impl HandlerBinding {
    pub fn new(event: ModuleEvent, handler: &'static str) -> Self {
        Self { event, handler }
    }

    /// Bind `event` under its default handler name
    ///
    /// Returns `None` for typed and custom events, which have no default.
    pub fn default_for(event: ModuleEvent) -> Option<Self> {
        event
            .default_handler()
            .map(|handler| Self { event, handler })
    }
}
