//! Module descriptors, live handles and the activation order they share

use std::any::TypeId;
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::module::traits::{Module, ModuleLevel, ModuleType};

/// Registry record of a module type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleDescriptor {
    /// Stable module identity
    pub identity: String,
    pub level: ModuleLevel,
    pub priority: i32,
    /// Whether a live instance backs this descriptor
    #[serde(default)]
    pub instantiated: bool,
}

impl ModuleDescriptor {
    pub fn new(identity: impl Into<String>, level: ModuleLevel, priority: i32) -> Self {
        Self {
            identity: identity.into(),
            level,
            priority,
            instantiated: false,
        }
    }
}

/// A live module instance together with its type identity
#[derive(Clone)]
pub struct ModuleHandle {
    type_id: TypeId,
    identity: &'static str,
    instance: Arc<dyn Module>,
}

impl ModuleHandle {
    pub fn new<M: ModuleType>(instance: M) -> Self {
        Self {
            type_id: TypeId::of::<M>(),
            identity: M::identity(),
            instance: Arc::new(instance),
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn identity(&self) -> &'static str {
        self.identity
    }

    pub fn module(&self) -> &dyn Module {
        self.instance.as_ref()
    }

    /// Instance identity, not structural equality
    pub fn same_instance(&self, other: &ModuleHandle) -> bool {
        Arc::ptr_eq(&self.instance, &other.instance)
    }

    pub(crate) fn descriptor(&self) -> ModuleDescriptor {
        ModuleDescriptor {
            identity: self.identity.to_string(),
            level: self.instance.level(),
            priority: self.instance.priority(),
            instantiated: true,
        }
    }
}

impl fmt::Debug for ModuleHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleHandle")
            .field("identity", &self.identity)
            .field("level", &self.instance.level())
            .field("priority", &self.instance.priority())
            .finish()
    }
}

/// Anything placed in activation order
pub trait Ranked {
    fn rank_level(&self) -> ModuleLevel;
    fn rank_priority(&self) -> i32;
}

impl Ranked for ModuleDescriptor {
    fn rank_level(&self) -> ModuleLevel {
        self.level
    }

    fn rank_priority(&self) -> i32 {
        self.priority
    }
}

impl Ranked for ModuleHandle {
    fn rank_level(&self) -> ModuleLevel {
        self.instance.level()
    }

    fn rank_priority(&self) -> i32 {
        self.instance.priority()
    }
}

/// Level descending, then priority ascending
pub fn activation_order<T: Ranked>(a: &T, b: &T) -> Ordering {
    b.rank_level()
        .cmp(&a.rank_level())
        .then_with(|| a.rank_priority().cmp(&b.rank_priority()))
}

/// Stable sort into activation order; ties keep insertion order
pub fn sort_by_activation<T: Ranked>(items: &mut [T]) {
    items.sort_by(activation_order);
}
