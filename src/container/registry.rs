//! The bean registry: singleton cache plus deferred definitions.
//!
//! # Responsibilities
//! - Store pre-built singletons and deferred construction recipes
//! - Resolve a requested type to an instance, caching singletons on demand
//! - Verify the declared dependency graph at startup
//!
//! # Design Decisions
//! - Instances live in a concurrent map; `resolve` is callable from any
//!   worker without external locking
//! - All registration happens before serving begins; the definition list is
//!   append-mostly and read-only afterwards
//! - Re-registering a type replaces the prior entry without error (singleton
//!   overwrite, definition replaced in place)

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use dashmap::DashMap;

use super::definition::{Bean, BeanDefinition, InterfaceBinding, StoredBean};
use super::resolver::Resolver;
use super::ResolveError;

#[derive(Default)]
struct DefinitionSet {
    /// Registration order, significant for the interface fallback scan.
    items: Vec<BeanDefinition>,
    by_type: HashMap<TypeId, usize>,
}

/// Dependency container shared by all workers.
#[derive(Default)]
pub struct Registry {
    instances: DashMap<TypeId, StoredBean>,
    definitions: RwLock<DefinitionSet>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a pre-built instance. Overwrites any existing entry for `T`.
    pub fn register_singleton<T: Send + Sync + 'static>(&self, instance: T) {
        self.register_arc(Arc::new(instance));
    }

    /// Store a pre-built, already-shared instance. Also accepts trait
    /// objects: `registry.register_arc::<dyn Clock>(clock)`.
    pub fn register_arc<T: ?Sized + Send + Sync + 'static>(&self, instance: Arc<T>) {
        tracing::debug!(bean = std::any::type_name::<T>(), "registering singleton");
        self.instances
            .insert(TypeId::of::<T>(), Arc::new(instance) as StoredBean);
    }

    /// Store a deferred construction recipe. Does not instantiate. A second
    /// definition for the same concrete type replaces the first in place.
    pub fn register<T: Send + Sync + 'static>(&self, bean: Bean<T>) {
        let definition = bean.into_definition();
        tracing::debug!(
            bean = definition.type_name,
            scope = ?definition.scope,
            "registering definition"
        );
        let mut set = self.definitions.write().expect("definition lock poisoned");
        match set.by_type.get(&definition.type_id) {
            Some(&index) => set.items[index] = definition,
            None => {
                let index = set.items.len();
                set.by_type.insert(definition.type_id, index);
                set.items.push(definition);
            }
        }
    }

    /// Resolve `T` to a shared instance, constructing and caching on demand.
    ///
    /// Resolution order: instance cache, direct definition, interface binding
    /// scan in registration order. Failures are local to this call; they
    /// never corrupt state for other types.
    pub fn resolve<T: ?Sized + Send + Sync + 'static>(&self) -> Result<Arc<T>, ResolveError> {
        Resolver::new(self).resolve::<T>()
    }

    /// Non-throwing variant for optional collaborators: `Ok(None)` when
    /// nothing provides `T`, `Err` when a provider exists but fails. Callers
    /// choose fail-open vs fail-closed explicitly.
    pub fn try_resolve<T: ?Sized + Send + Sync + 'static>(
        &self,
    ) -> Result<Option<Arc<T>>, ResolveError> {
        if !self.provides(&TypeId::of::<T>()) {
            return Ok(None);
        }
        self.resolve::<T>().map(Some)
    }

    /// Resolve `T`, falling back to `T::default()` cached as a singleton when
    /// nothing provides it.
    pub fn resolve_or_default<T: Default + Send + Sync + 'static>(
        &self,
    ) -> Result<Arc<T>, ResolveError> {
        if !self.provides(&TypeId::of::<T>()) {
            let instance = Arc::new(Arc::new(T::default())) as StoredBean;
            let winner = self.cache(TypeId::of::<T>(), instance);
            return winner
                .downcast_ref::<Arc<T>>()
                .cloned()
                .ok_or(ResolveError::Resolution {
                    type_name: std::any::type_name::<T>(),
                });
        }
        self.resolve::<T>()
    }

    /// Startup pass over the declared dependency graph. Reports the first
    /// cycle found with its full chain. Edges a factory resolves without
    /// declaring are caught at resolution time instead.
    pub fn verify(&self) -> Result<(), ResolveError> {
        let set = self.definitions.read().expect("definition lock poisoned");
        let mut done: Vec<TypeId> = Vec::new();
        for definition in &set.items {
            let mut stack: Vec<(TypeId, &'static str)> = Vec::new();
            self.walk(&set, definition, &mut stack, &mut done)?;
        }
        Ok(())
    }

    fn walk(
        &self,
        set: &DefinitionSet,
        definition: &BeanDefinition,
        stack: &mut Vec<(TypeId, &'static str)>,
        done: &mut Vec<TypeId>,
    ) -> Result<(), ResolveError> {
        if done.contains(&definition.type_id) {
            return Ok(());
        }
        if stack.iter().any(|(id, _)| *id == definition.type_id) {
            let mut chain: Vec<&str> = stack.iter().map(|(_, name)| *name).collect();
            chain.push(definition.type_name);
            return Err(ResolveError::Cycle {
                chain: chain.join(" -> "),
            });
        }
        stack.push((definition.type_id, definition.type_name));
        for dependency in &definition.dependencies {
            if let Some(&index) = set.by_type.get(&dependency.type_id) {
                self.walk(set, &set.items[index], stack, done)?;
            }
        }
        stack.pop();
        done.push(definition.type_id);
        Ok(())
    }

    // --- internals used by the resolver ---

    pub(crate) fn cached(&self, type_id: &TypeId) -> Option<StoredBean> {
        self.instances.get(type_id).map(|hit| hit.clone())
    }

    /// Insert into the instance cache; on a concurrent race the first writer
    /// wins and the loser's construction is discarded.
    pub(crate) fn cache(&self, type_id: TypeId, instance: StoredBean) -> StoredBean {
        self.instances.entry(type_id).or_insert(instance).clone()
    }

    pub(crate) fn definition(&self, type_id: &TypeId) -> Option<BeanDefinition> {
        let set = self.definitions.read().expect("definition lock poisoned");
        set.by_type.get(type_id).map(|&index| set.items[index].clone())
    }

    /// First definition in registration order carrying an interface binding
    /// for the requested trait object.
    pub(crate) fn interface_provider(
        &self,
        interface_id: &TypeId,
    ) -> Option<(BeanDefinition, InterfaceBinding)> {
        let set = self.definitions.read().expect("definition lock poisoned");
        for definition in &set.items {
            for binding in &definition.interfaces {
                if binding.interface_id == *interface_id {
                    return Some((definition.clone(), binding.clone()));
                }
            }
        }
        None
    }

    fn provides(&self, type_id: &TypeId) -> bool {
        if self.instances.contains_key(type_id) {
            return true;
        }
        let set = self.definitions.read().expect("definition lock poisoned");
        set.by_type.contains_key(type_id)
            || set
                .items
                .iter()
                .any(|d| d.interfaces.iter().any(|b| b.interface_id == *type_id))
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let set = self.definitions.read().expect("definition lock poisoned");
        f.debug_struct("Registry")
            .field("instances", &self.instances.len())
            .field("definitions", &set.items.len())
            .finish()
    }
}
