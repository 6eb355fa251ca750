//! Module registry
//!
//! Owns descriptors, live instances and the subscription table. Everything here
//! is plain data manipulation; locking, construction-time context and dispatch
//! live in [`ModuleManager`](crate::module::manager::ModuleManager).

pub mod catalog;
pub mod descriptor;
pub mod manifest;
pub mod subscriptions;

use std::any::TypeId;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::module::events::ModuleEvent;

pub use catalog::{ModuleCatalog, ModuleFactory};
pub use descriptor::{activation_order, sort_by_activation, ModuleDescriptor, ModuleHandle, Ranked};
pub use manifest::{ManifestEntry, ManifestLoader, ModuleManifest};
pub use subscriptions::{SubscriptionEntry, SubscriptionTable};

/// How persisted manifest entries are reconciled with known descriptors
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ManifestPolicy {
    /// Keep only entries whose identity is already described
    #[default]
    KnownOnly,
    /// Keep only entries whose identity is not described yet
    MergeUnknown,
}

/// Descriptor list, live instances and subscriptions
#[derive(Debug, Default)]
pub struct ModuleRegistry {
    descriptors: Vec<ModuleDescriptor>,
    modules: Vec<ModuleHandle>,
    subscriptions: SubscriptionTable,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a live instance of this exact type exists
    pub fn contains_type(&self, type_id: TypeId) -> bool {
        self.modules.iter().any(|m| m.type_id() == type_id)
    }

    pub fn knows_identity(&self, identity: &str) -> bool {
        self.descriptors.iter().any(|d| d.identity == identity)
    }

    /// Insert a freshly constructed instance
    ///
    /// Appends the instance's descriptor; pending descriptors with the same
    /// identity keep their values and are only marked instantiated. Returns
    /// `false` if the type is already live.
    pub fn insert(&mut self, module: ModuleHandle) -> bool {
        if self.contains_type(module.type_id()) {
            return false;
        }

        self.mark_instantiated(module.identity());
        self.descriptors.push(module.descriptor());

        self.modules.push(module.clone());
        sort_by_activation(&mut self.modules);
        self.subscriptions.subscribe(&module);
        true
    }

    /// Append manifest candidates according to `policy`; returns how many were kept
    pub fn resolve_persisted(&mut self, candidates: Vec<ManifestEntry>, policy: ManifestPolicy) -> usize {
        let kept: Vec<ModuleDescriptor> = candidates
            .into_iter()
            .filter(|candidate| {
                let known = self.knows_identity(&candidate.identity);
                let keep = match policy {
                    ManifestPolicy::KnownOnly => known,
                    ManifestPolicy::MergeUnknown => !known,
                };
                if !keep {
                    debug!(
                        "Dropping manifest entry {} ({:?})",
                        candidate.identity, policy
                    );
                }
                keep
            })
            .map(ModuleDescriptor::from)
            .collect();

        let count = kept.len();
        self.descriptors.extend(kept);
        count
    }

    /// Sort descriptors into activation order
    pub fn sort_descriptors(&mut self) {
        sort_by_activation(&mut self.descriptors);
    }

    /// Identities of descriptors without a live instance, in descriptor order
    pub fn pending_identities(&self) -> Vec<String> {
        self.descriptors
            .iter()
            .filter(|d| !d.instantiated)
            .map(|d| d.identity.clone())
            .collect()
    }

    /// Mark every pending descriptor of `identity` as instantiated
    pub fn mark_instantiated(&mut self, identity: &str) {
        for descriptor in self.descriptors.iter_mut().filter(|d| d.identity == identity) {
            descriptor.instantiated = true;
        }
    }

    /// Append an instance during finalization without touching descriptors
    pub fn adopt(&mut self, module: ModuleHandle) -> bool {
        if self.contains_type(module.type_id()) {
            return false;
        }
        self.modules.push(module);
        true
    }

    /// Re-sort instances and subscribe every one of them
    pub fn rebuild_subscriptions(&mut self) {
        sort_by_activation(&mut self.modules);
        for module in &self.modules {
            self.subscriptions.subscribe(module);
        }
    }

    pub fn bind_event(&mut self, event: ModuleEvent, handler: &str) -> bool {
        self.subscriptions.bind(event, handler)
    }

    pub fn descriptors(&self) -> &[ModuleDescriptor] {
        &self.descriptors
    }

    pub fn modules(&self) -> &[ModuleHandle] {
        &self.modules
    }

    pub fn subscriptions(&self) -> &SubscriptionTable {
        &self.subscriptions
    }
}
