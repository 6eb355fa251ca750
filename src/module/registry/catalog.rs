//! Identity → constructor map
//!
//! Lets manifests and `register_by_identity` name a module without the host
//! knowing its type at the call site.

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::module::context::ModuleContext;
use crate::module::registry::descriptor::ModuleHandle;
use crate::module::traits::ModuleType;

/// Constructor for one module type
#[derive(Clone, Copy)]
pub struct ModuleFactory {
    identity: &'static str,
    type_id: TypeId,
    construct: fn(&Arc<ModuleContext>) -> ModuleHandle,
}

impl ModuleFactory {
    pub fn of<M: ModuleType>() -> Self {
        Self {
            identity: M::identity(),
            type_id: TypeId::of::<M>(),
            construct: |context| ModuleHandle::new(M::construct(context)),
        }
    }

    pub fn identity(&self) -> &'static str {
        self.identity
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn construct(&self, context: &Arc<ModuleContext>) -> ModuleHandle {
        (self.construct)(context)
    }
}

/// Known module types by identity
#[derive(Default)]
pub struct ModuleCatalog {
    factories: HashMap<&'static str, ModuleFactory>,
}

impl ModuleCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `M`; an identity already taken by another type keeps its first owner
    pub fn declare<M: ModuleType>(&mut self) -> ModuleFactory {
        let factory = ModuleFactory::of::<M>();
        let entry = self.factories.entry(factory.identity).or_insert(factory);
        if entry.type_id != factory.type_id {
            debug!(
                "Identity {} already declared by another module type, keeping the first",
                factory.identity
            );
        }
        factory
    }

    pub fn resolve(&self, identity: &str) -> Option<ModuleFactory> {
        self.factories.get(identity).copied()
    }

    pub fn contains(&self, identity: &str) -> bool {
        self.factories.contains_key(identity)
    }
}
