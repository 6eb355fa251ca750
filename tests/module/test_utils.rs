//! Test utilities for module system testing
//!
//! Test modules write to a journal keyed by the application name of the
//! context they were built with, so tests running in parallel each get their
//! own journal as long as they use distinct application names.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;
use serde_json::{json, Value};
use tempfile::TempDir;

use modhost::{
    EventHandler, EventParam, HandlerBinding, HostConfig, InitHandler, ManifestPolicy, Module,
    ModuleContext, ModuleEvent, ModuleLevel, ModuleManager, ModuleType, TearDownHandler,
};

fn journals() -> &'static Mutex<HashMap<String, Vec<String>>> {
    static JOURNALS: OnceLock<Mutex<HashMap<String, Vec<String>>>> = OnceLock::new();
    JOURNALS.get_or_init(|| Mutex::new(HashMap::new()))
}

fn managers() -> &'static Mutex<HashMap<String, ModuleManager>> {
    static MANAGERS: OnceLock<Mutex<HashMap<String, ModuleManager>>> = OnceLock::new();
    MANAGERS.get_or_init(|| Mutex::new(HashMap::new()))
}

/// Append an entry to the journal of `context`'s application
pub fn record(context: &ModuleContext, entry: impl Into<String>) {
    journals()
        .lock()
        .entry(context.application_name().to_string())
        .or_default()
        .push(entry.into());
}

/// Journal entries recorded so far for `application`
pub fn journal(application: &str) -> Vec<String> {
    journals()
        .lock()
        .get(application)
        .cloned()
        .unwrap_or_default()
}

/// Journal entries that start with `prefix`
pub fn journal_matching(application: &str, prefix: &str) -> Vec<String> {
    journal(application)
        .into_iter()
        .filter(|entry| entry.starts_with(prefix))
        .collect()
}

/// Manager for a fresh application; handlers can reach it via [`manager_for`]
pub fn new_manager(application: &str) -> ModuleManager {
    new_manager_with(HostConfig::for_application(application))
}

pub fn new_manager_with(config: HostConfig) -> ModuleManager {
    let manager = ModuleManager::new(&config);
    managers()
        .lock()
        .insert(config.application_name.clone(), manager.clone());
    manager
}

pub fn manager_for(context: &ModuleContext) -> Option<ModuleManager> {
    managers().lock().get(context.application_name()).cloned()
}

pub fn param(key: &str, value: Value) -> EventParam {
    let mut map = EventParam::new();
    map.insert(key.to_string(), value);
    map
}

/// Describe the context payload as `event/param`
pub fn payload(context: &ModuleContext) -> String {
    let event = context
        .current_event()
        .map(|e| e.to_string())
        .unwrap_or_else(|| "-".to_string());
    let param = context
        .current_param()
        .map(|p| Value::Object(p).to_string())
        .unwrap_or_else(|| "-".to_string());
    format!("{}/{}", event, param)
}

pub fn refresh() -> ModuleEvent {
    ModuleEvent::custom("refresh")
}

/// Business level, priority 1: init, teardown, refresh, setup and splash
pub struct ModuleA;

impl Module for ModuleA {
    fn level(&self) -> ModuleLevel {
        ModuleLevel::Business
    }

    fn priority(&self) -> i32 {
        1
    }

    fn as_init(&self) -> Option<&dyn InitHandler> {
        Some(self)
    }

    fn as_tear_down(&self) -> Option<&dyn TearDownHandler> {
        Some(self)
    }

    fn as_event_handler(&self) -> Option<&dyn EventHandler> {
        Some(self)
    }
}

impl ModuleType for ModuleA {
    fn identity() -> &'static str {
        "module-a"
    }

    fn construct(context: &Arc<ModuleContext>) -> Self {
        record(context, "construct:module-a");
        ModuleA
    }
}

impl InitHandler for ModuleA {
    fn on_init(&self, context: &ModuleContext) {
        record(context, "init:module-a");
    }
}

impl TearDownHandler for ModuleA {
    fn on_tear_down(&self, context: &ModuleContext) {
        record(context, "teardown:module-a");
    }
}

impl EventHandler for ModuleA {
    fn bindings(&self) -> Vec<HandlerBinding> {
        vec![
            HandlerBinding::new(refresh(), "on_refresh"),
            HandlerBinding::new(ModuleEvent::Setup, "mod_setup"),
            HandlerBinding::new(ModuleEvent::Splash, "mod_splash"),
        ]
    }

    fn handle(&self, handler: &str, context: &ModuleContext) {
        match handler {
            "on_refresh" => record(context, format!("refresh:module-a:{}", payload(context))),
            "mod_setup" => record(context, "setup:module-a"),
            "mod_splash" => record(context, "splash:module-a"),
            _ => {}
        }
    }
}

/// Basic level, priority 5: teardown and a `sync` event only
pub struct ModuleB;

impl Module for ModuleB {
    fn level(&self) -> ModuleLevel {
        ModuleLevel::Basic
    }

    fn priority(&self) -> i32 {
        5
    }

    fn as_tear_down(&self) -> Option<&dyn TearDownHandler> {
        Some(self)
    }

    fn as_event_handler(&self) -> Option<&dyn EventHandler> {
        Some(self)
    }
}

impl ModuleType for ModuleB {
    fn identity() -> &'static str {
        "module-b"
    }

    fn construct(context: &Arc<ModuleContext>) -> Self {
        record(context, "construct:module-b");
        ModuleB
    }
}

impl TearDownHandler for ModuleB {
    fn on_tear_down(&self, context: &ModuleContext) {
        record(context, "teardown:module-b");
    }
}

impl EventHandler for ModuleB {
    fn bindings(&self) -> Vec<HandlerBinding> {
        vec![HandlerBinding::new(ModuleEvent::custom("sync"), "on_sync")]
    }

    fn handle(&self, handler: &str, context: &ModuleContext) {
        if handler == "on_sync" {
            record(context, "sync:module-b");
        }
    }
}

/// Business level, priority 0: init and refresh
pub struct ModuleC;

impl Module for ModuleC {
    fn level(&self) -> ModuleLevel {
        ModuleLevel::Business
    }

    fn as_init(&self) -> Option<&dyn InitHandler> {
        Some(self)
    }

    fn as_event_handler(&self) -> Option<&dyn EventHandler> {
        Some(self)
    }
}

impl ModuleType for ModuleC {
    fn identity() -> &'static str {
        "module-c"
    }

    fn construct(context: &Arc<ModuleContext>) -> Self {
        record(context, "construct:module-c");
        ModuleC
    }
}

impl InitHandler for ModuleC {
    fn on_init(&self, context: &ModuleContext) {
        record(context, "init:module-c");
    }
}

impl EventHandler for ModuleC {
    fn bindings(&self) -> Vec<HandlerBinding> {
        vec![HandlerBinding::new(refresh(), "on_refresh")]
    }

    fn handle(&self, handler: &str, context: &ModuleContext) {
        if handler == "on_refresh" {
            record(context, format!("refresh:module-c:{}", payload(context)));
        }
    }
}

/// Basic level, async init with setup and splash
pub struct AsyncModule;

impl Module for AsyncModule {
    fn level(&self) -> ModuleLevel {
        ModuleLevel::Basic
    }

    fn runs_async(&self) -> bool {
        true
    }

    fn as_init(&self) -> Option<&dyn InitHandler> {
        Some(self)
    }

    fn as_event_handler(&self) -> Option<&dyn EventHandler> {
        Some(self)
    }
}

impl ModuleType for AsyncModule {
    fn identity() -> &'static str {
        "async-module"
    }

    fn construct(_context: &Arc<ModuleContext>) -> Self {
        AsyncModule
    }
}

impl InitHandler for AsyncModule {
    fn on_init(&self, context: &ModuleContext) {
        record(context, "init:async-module");
    }
}

impl EventHandler for AsyncModule {
    fn bindings(&self) -> Vec<HandlerBinding> {
        [ModuleEvent::Setup, ModuleEvent::Splash]
            .into_iter()
            .filter_map(HandlerBinding::default_for)
            .collect()
    }

    fn handle(&self, handler: &str, context: &ModuleContext) {
        record(context, format!("{}:async-module", handler));
    }
}

/// Foundation level, no handlers at all
pub struct PlainModule;

impl Module for PlainModule {
    fn level(&self) -> ModuleLevel {
        ModuleLevel::Foundation
    }
}

impl ModuleType for PlainModule {
    fn identity() -> &'static str {
        "plain-module"
    }

    fn construct(context: &Arc<ModuleContext>) -> Self {
        record(context, "construct:plain-module");
        PlainModule
    }
}

/// Triggers `inner` from inside its `outer` handler
pub struct OuterModule;

impl Module for OuterModule {
    fn level(&self) -> ModuleLevel {
        ModuleLevel::Business
    }

    fn as_event_handler(&self) -> Option<&dyn EventHandler> {
        Some(self)
    }
}

impl ModuleType for OuterModule {
    fn identity() -> &'static str {
        "outer-module"
    }

    fn construct(_context: &Arc<ModuleContext>) -> Self {
        OuterModule
    }
}

impl EventHandler for OuterModule {
    fn bindings(&self) -> Vec<HandlerBinding> {
        vec![HandlerBinding::new(ModuleEvent::custom("outer"), "on_outer")]
    }

    fn handle(&self, _handler: &str, context: &ModuleContext) {
        record(context, format!("outer-before:{}", payload(context)));
        if let Some(manager) = manager_for(context) {
            manager.trigger_event(
                ModuleEvent::custom("inner"),
                Some(param("depth", json!(2))),
            );
        }
        record(context, format!("outer-after:{}", payload(context)));
    }
}

/// Listens to `inner`
pub struct InnerModule;

impl Module for InnerModule {
    fn level(&self) -> ModuleLevel {
        ModuleLevel::Basic
    }

    fn as_event_handler(&self) -> Option<&dyn EventHandler> {
        Some(self)
    }
}

impl ModuleType for InnerModule {
    fn identity() -> &'static str {
        "inner-module"
    }

    fn construct(_context: &Arc<ModuleContext>) -> Self {
        InnerModule
    }
}

impl EventHandler for InnerModule {
    fn bindings(&self) -> Vec<HandlerBinding> {
        vec![HandlerBinding::new(ModuleEvent::custom("inner"), "on_inner")]
    }

    fn handle(&self, _handler: &str, context: &ModuleContext) {
        record(context, format!("inner:{}", payload(context)));
    }
}

/// Test fixture with an isolated manifest directory
pub struct ModuleTestFixture {
    /// Temporary directory for test data
    pub temp_dir: TempDir,
    /// Manifest directory path
    pub manifest_dir: PathBuf,
    pub application: String,
}

impl ModuleTestFixture {
    pub fn new(application: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let temp_dir = TempDir::new()?;
        let manifest_dir = temp_dir.path().join("modules");
        std::fs::create_dir_all(&manifest_dir)?;

        Ok(Self {
            temp_dir,
            manifest_dir,
            application: application.to_string(),
        })
    }

    pub fn config(&self, policy: ManifestPolicy) -> HostConfig {
        HostConfig::for_application(self.application.clone())
            .with_manifest_dir(&self.manifest_dir)
            .with_manifest_policy(policy)
    }

    /// Write the manifest for this fixture's application
    pub fn write_manifest(&self, contents: &str) -> std::io::Result<PathBuf> {
        let path = self.manifest_path();
        std::fs::write(&path, contents)?;
        Ok(path)
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.manifest_dir.join(format!("{}.toml", self.application))
    }
}
