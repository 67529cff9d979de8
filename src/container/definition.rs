//! Bean definitions and the typed registration builder.
//!
//! # Responsibilities
//! - Describe how a type is constructed (factory, scope, declared deps)
//! - Carry interface bindings from a concrete type to trait objects
//! - Erase types so the registry can store heterogeneous definitions
//!
//! # Design Decisions
//! - Factories are explicit closures supplied at registration; there is no
//!   runtime constructor discovery
//! - Declared dependencies are metadata only, consumed by the startup
//!   verification pass; factories resolve their real inputs through the
//!   resolver they receive
//! - Stored beans are double-`Arc`ed (`Arc<dyn Any>` wrapping `Arc<T>`) so
//!   concrete types and trait objects cache through the same map

use std::any::{Any, TypeId};
use std::sync::Arc;

use super::resolver::Resolver;
use super::ResolveError;

/// A type-erased, shareable bean instance. The inner value is always an
/// `Arc<T>` for the concrete or trait-object type it was stored under.
pub(crate) type StoredBean = Arc<dyn Any + Send + Sync>;

pub(crate) type Factory =
    Arc<dyn Fn(&Resolver<'_>) -> Result<StoredBean, ResolveError> + Send + Sync>;

/// Lifecycle policy for a registered bean.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// One instance, created on first resolution and cached for the process
    /// lifetime.
    Singleton,
    /// A fresh instance on every resolution, never cached.
    PerRequest,
}

/// Declared dependency edge, used by `Registry::verify`.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Dependency {
    pub(crate) type_id: TypeId,
    pub(crate) type_name: &'static str,
}

/// Binding from a concrete definition to a trait object it satisfies.
pub(crate) struct InterfaceBinding {
    pub(crate) interface_id: TypeId,
    pub(crate) interface_name: &'static str,
    /// Coerces the erased concrete instance into an erased `Arc<dyn Trait>`.
    pub(crate) cast: Arc<dyn Fn(&StoredBean) -> StoredBean + Send + Sync>,
}

impl Clone for InterfaceBinding {
    fn clone(&self) -> Self {
        Self {
            interface_id: self.interface_id,
            interface_name: self.interface_name,
            cast: self.cast.clone(),
        }
    }
}

/// Deferred construction recipe held by the registry. Immutable once
/// registered.
#[derive(Clone)]
pub(crate) struct BeanDefinition {
    pub(crate) type_id: TypeId,
    pub(crate) type_name: &'static str,
    pub(crate) scope: Scope,
    pub(crate) dependencies: Vec<Dependency>,
    pub(crate) factory: Factory,
    pub(crate) interfaces: Vec<InterfaceBinding>,
}

/// Typed builder for a bean registration.
///
/// ```ignore
/// registry.register(
///     Bean::singleton(|r| Ok(UserService::new(r.resolve()?)))
///         .depends_on::<PgPool>()
///         .implements(|s: Arc<UserService>| s as Arc<dyn UserDirectory>),
/// );
/// ```
pub struct Bean<T> {
    scope: Scope,
    dependencies: Vec<Dependency>,
    factory: Factory,
    interfaces: Vec<InterfaceBinding>,
    _marker: std::marker::PhantomData<fn() -> T>,
}

impl<T: Send + Sync + 'static> Bean<T> {
    fn new<F>(scope: Scope, factory: F) -> Self
    where
        F: Fn(&Resolver<'_>) -> Result<T, ResolveError> + Send + Sync + 'static,
    {
        let erased: Factory = Arc::new(move |resolver| {
            factory(resolver).map(|value| Arc::new(Arc::new(value)) as StoredBean)
        });
        Self {
            scope,
            dependencies: Vec::new(),
            factory: erased,
            interfaces: Vec::new(),
            _marker: std::marker::PhantomData,
        }
    }

    /// A bean constructed once and cached for the process lifetime.
    pub fn singleton<F>(factory: F) -> Self
    where
        F: Fn(&Resolver<'_>) -> Result<T, ResolveError> + Send + Sync + 'static,
    {
        Self::new(Scope::Singleton, factory)
    }

    /// A bean constructed freshly on every resolution.
    pub fn per_request<F>(factory: F) -> Self
    where
        F: Fn(&Resolver<'_>) -> Result<T, ResolveError> + Send + Sync + 'static,
    {
        Self::new(Scope::PerRequest, factory)
    }

    /// Declare a dependency edge for the startup cycle check. Factories still
    /// resolve their inputs themselves; undeclared edges are caught at
    /// resolution time instead.
    pub fn depends_on<D: ?Sized + 'static>(mut self) -> Self {
        self.dependencies.push(Dependency {
            type_id: TypeId::of::<D>(),
            type_name: std::any::type_name::<D>(),
        });
        self
    }

    /// Declare that this bean satisfies the trait object `I`. A request for
    /// `Arc<I>` with no direct provider falls back to the first definition in
    /// registration order carrying a binding for `I`.
    pub fn implements<I: ?Sized + Send + Sync + 'static>(
        mut self,
        cast: fn(Arc<T>) -> Arc<I>,
    ) -> Self {
        let erased = Arc::new(move |stored: &StoredBean| -> StoredBean {
            let concrete = stored
                .downcast_ref::<Arc<T>>()
                .expect("interface binding built for a different concrete type")
                .clone();
            Arc::new(cast(concrete)) as StoredBean
        });
        self.interfaces.push(InterfaceBinding {
            interface_id: TypeId::of::<I>(),
            interface_name: std::any::type_name::<I>(),
            cast: erased,
        });
        self
    }

    pub(crate) fn into_definition(self) -> BeanDefinition {
        BeanDefinition {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            scope: self.scope,
            dependencies: self.dependencies,
            factory: self.factory,
            interfaces: self.interfaces,
        }
    }
}
