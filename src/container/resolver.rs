//! Per-resolution state: recursive dependency resolution and cycle detection.
//!
//! # Responsibilities
//! - Walk the resolution order (cache, definition, interface scan)
//! - Track the live resolution path to fail fast on cycles
//! - Wrap factory failures with the type being constructed
//!
//! # Design Decisions
//! - One `Resolver` per top-level `resolve` call; factories receive it and
//!   resolve their inputs through it, so the path reflects one logical call
//! - Construction runs with no registry lock held; the first cached instance
//!   wins a concurrent race and losing constructions are discarded

use std::any::TypeId;
use std::cell::RefCell;
use std::sync::Arc;

use super::definition::{BeanDefinition, Scope, StoredBean};
use super::registry::Registry;
use super::ResolveError;

/// Resolution context threaded through bean factories.
pub struct Resolver<'a> {
    registry: &'a Registry,
    path: RefCell<Vec<(TypeId, &'static str)>>,
}

impl<'a> Resolver<'a> {
    pub(crate) fn new(registry: &'a Registry) -> Self {
        Self {
            registry,
            path: RefCell::new(Vec::new()),
        }
    }

    /// Resolve a dependency. Works for concrete types and for trait objects
    /// (`resolver.resolve::<dyn UserDirectory>()`).
    pub fn resolve<T: ?Sized + Send + Sync + 'static>(&self) -> Result<Arc<T>, ResolveError> {
        let type_id = TypeId::of::<T>();
        let type_name = std::any::type_name::<T>();

        if let Some(instance) = self.registry.cached(&type_id) {
            return downcast::<T>(&instance, type_name);
        }

        // Direct definition for the requested type.
        if let Some(definition) = self.registry.definition(&type_id) {
            let built = self.construct(&definition)?;
            return downcast::<T>(&built, type_name);
        }

        // Interface fallback: first definition in registration order that
        // declares a binding for the requested trait object.
        if let Some((definition, binding)) = self.registry.interface_provider(&type_id) {
            tracing::debug!(
                interface = binding.interface_name,
                provider = definition.type_name,
                "resolving through interface binding"
            );
            let concrete = match self.registry.cached(&definition.type_id) {
                Some(hit) => hit,
                None => self.construct(&definition)?,
            };
            let coerced = (binding.cast)(&concrete);
            if definition.scope == Scope::Singleton {
                self.registry.cache(type_id, coerced.clone());
            }
            return downcast::<T>(&coerced, type_name);
        }

        Err(ResolveError::Resolution { type_name })
    }

    /// Build from a definition, guarding against re-entering a type already
    /// on the live resolution path.
    fn construct(&self, definition: &BeanDefinition) -> Result<StoredBean, ResolveError> {
        {
            let path = self.path.borrow();
            if path.iter().any(|(id, _)| *id == definition.type_id) {
                let mut chain: Vec<&str> = path.iter().map(|(_, name)| *name).collect();
                chain.push(definition.type_name);
                return Err(ResolveError::Cycle {
                    chain: chain.join(" -> "),
                });
            }
        }

        self.path
            .borrow_mut()
            .push((definition.type_id, definition.type_name));
        let built = (definition.factory)(self);
        self.path.borrow_mut().pop();

        let instance = built?;
        if definition.scope == Scope::Singleton {
            // First writer wins; a concurrent loser's instance is dropped.
            return Ok(self.registry.cache(definition.type_id, instance));
        }
        Ok(instance)
    }
}

fn downcast<T: ?Sized + Send + Sync + 'static>(
    stored: &StoredBean,
    type_name: &'static str,
) -> Result<Arc<T>, ResolveError> {
    stored
        .downcast_ref::<Arc<T>>()
        .cloned()
        .ok_or(ResolveError::Resolution { type_name })
}
