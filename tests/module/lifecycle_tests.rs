//! Initial lifecycle sequence and deferred queue tests

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use modhost::{
    HostConfig, InitHandler, Module, ModuleContext, ModuleEvent, ModuleLevel, ModuleManager,
    ModuleType,
};

use super::test_utils::*;

#[test]
fn test_initial_sequence_defers_splash() {
    let manager = new_manager("lifecycle-initial");

    manager.register::<ModuleA>(true);

    assert_eq!(
        journal("lifecycle-initial"),
        vec!["construct:module-a", "setup:module-a", "init:module-a"]
    );

    assert_eq!(manager.queue().drain(), 1);
    assert_eq!(
        journal_matching("lifecycle-initial", "splash:"),
        vec!["splash:module-a"]
    );
}

#[test]
fn test_initial_sequence_skips_missing_handlers() {
    let manager = new_manager("lifecycle-partial");

    manager.register::<ModuleB>(true);
    manager.register::<PlainModule>(true);
    manager.queue().drain();

    assert_eq!(
        journal("lifecycle-partial"),
        vec!["construct:module-b", "construct:plain-module"]
    );
}

#[test]
fn test_initial_sequence_targets_only_new_module() {
    let manager = new_manager("lifecycle-targeted");
    manager.register::<ModuleC>(false);

    manager.register::<ModuleA>(true);
    manager.queue().drain();

    assert!(journal_matching("lifecycle-targeted", "init:module-c").is_empty());
    assert_eq!(
        journal_matching("lifecycle-targeted", "init:"),
        vec!["init:module-a"]
    );
}

#[test]
fn test_second_register_does_not_replay_sequence() {
    let manager = new_manager("lifecycle-replay");

    manager.register::<ModuleA>(true);
    manager.register::<ModuleA>(true);
    assert_eq!(manager.queue().drain(), 1);

    assert_eq!(journal_matching("lifecycle-replay", "init:").len(), 1);
    assert_eq!(journal_matching("lifecycle-replay", "splash:").len(), 1);
}

#[test]
fn test_async_init_runs_from_queue() {
    let manager = new_manager("lifecycle-async");

    manager.register::<AsyncModule>(true);

    assert_eq!(journal("lifecycle-async"), vec!["mod_setup:async-module"]);

    assert_eq!(manager.queue().drain(), 2);
    assert_eq!(
        journal("lifecycle-async"),
        vec![
            "mod_setup:async-module",
            "init:async-module",
            "mod_splash:async-module",
        ]
    );
}

#[test]
fn test_async_init_broadcast_is_deferred() {
    let manager = new_manager("lifecycle-async-broadcast");
    manager.register::<ModuleA>(false);
    manager.register::<AsyncModule>(false);

    manager.trigger_event(ModuleEvent::Init, None);

    assert_eq!(
        journal_matching("lifecycle-async-broadcast", "init:"),
        vec!["init:module-a"]
    );
    manager.queue().drain();
    assert_eq!(
        journal_matching("lifecycle-async-broadcast", "init:"),
        vec!["init:module-a", "init:async-module"]
    );
}

#[tokio::test]
async fn test_consumer_task_runs_deferred_jobs() {
    let manager = new_manager("lifecycle-consumer");
    let consumer = manager.queue().spawn_consumer();
    assert!(consumer.is_some());
    assert!(manager.queue().spawn_consumer().is_none());

    manager.register::<ModuleA>(true);

    for _ in 0..50 {
        if !journal_matching("lifecycle-consumer", "splash:").is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    assert_eq!(
        journal_matching("lifecycle-consumer", "splash:"),
        vec!["splash:module-a"]
    );
    assert_eq!(manager.queue().drain(), 0);
}

static DROP_FLAGGED_RELEASED: AtomicBool = AtomicBool::new(false);

/// Sets a flag once its single instance is released
struct DropFlagged;

impl Module for DropFlagged {
    fn level(&self) -> ModuleLevel {
        ModuleLevel::Basic
    }

    fn as_init(&self) -> Option<&dyn InitHandler> {
        Some(self)
    }
}

impl ModuleType for DropFlagged {
    fn identity() -> &'static str {
        "drop-flagged"
    }

    fn construct(_context: &Arc<ModuleContext>) -> Self {
        DropFlagged
    }
}

impl InitHandler for DropFlagged {
    fn on_init(&self, _context: &ModuleContext) {}
}

impl Drop for DropFlagged {
    fn drop(&mut self) {
        DROP_FLAGGED_RELEASED.store(true, Ordering::SeqCst);
    }
}

#[test]
fn test_undrained_splash_does_not_keep_manager_alive() {
    // Built directly: managers created through test_utils stay in a shared map
    let manager = ModuleManager::new(&HostConfig::for_application("lifecycle-undrained"));
    manager.register::<DropFlagged>(true);
    let context = Arc::downgrade(manager.context());

    drop(manager);

    assert!(DROP_FLAGGED_RELEASED.load(Ordering::SeqCst));
    assert!(context.upgrade().is_none());
}
