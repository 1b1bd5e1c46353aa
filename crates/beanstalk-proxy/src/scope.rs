//! Class-loading scopes
//!
//! A [`ClassLoaderScope`] is the namespace proxies are defined into. Each
//! container owns one; names are unique within a scope.

use crate::class::ProxyClass;
use crate::error::ProxyGenerationError;
use beanstalk_model::TypeName;
use indexmap::IndexMap;
use parking_lot::Mutex;
use std::fmt::{self, Display, Formatter};
use std::sync::Arc;
use uuid::Uuid;

/// Unique identifier for a class-loading scope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LoaderId(pub Uuid);

impl LoaderId {
    /// Create a new random id
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for LoaderId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for LoaderId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "loader-{}", self.0)
    }
}

#[derive(Debug)]
enum Loaded {
    Application,
    Proxy(Arc<ProxyClass>),
}

/// Namespace of loaded classes
#[derive(Debug)]
pub struct ClassLoaderScope {
    id: LoaderId,
    classes: Mutex<IndexMap<TypeName, Loaded>>,
}

impl Default for ClassLoaderScope {
    fn default() -> Self {
        Self::new()
    }
}

impl ClassLoaderScope {
    /// Empty scope with a fresh id
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: LoaderId::new(),
            classes: Mutex::new(IndexMap::new()),
        }
    }

    /// Scope id
    #[inline]
    #[must_use]
    pub fn id(&self) -> LoaderId {
        self.id
    }

    /// Record an application type as loaded
    ///
    /// Loading the same application type twice is a no-op.
    pub fn load_application_type(&self, name: TypeName) {
        self.classes.lock().entry(name).or_insert(Loaded::Application);
    }

    /// Whether any class with this name is loaded
    #[must_use]
    pub fn is_loaded(&self, name: &TypeName) -> bool {
        self.classes.lock().contains_key(name)
    }

    /// Define a proxy class
    ///
    /// # Errors
    /// Returns [`ProxyGenerationError::DuplicateDefinition`] if the name is taken.
    pub fn define(&self, class: ProxyClass) -> Result<Arc<ProxyClass>, ProxyGenerationError> {
        self.define_with(|_| Ok(class))
    }

    /// Build and define a proxy class while holding the scope lock
    ///
    /// `build` receives a loaded-name predicate, so picking an unused name
    /// and defining it cannot race with another definition.
    ///
    /// # Errors
    /// Propagates `build` failures; fails with
    /// [`ProxyGenerationError::DuplicateDefinition`] if the built name is taken.
    pub fn define_with<F>(&self, build: F) -> Result<Arc<ProxyClass>, ProxyGenerationError>
    where
        F: FnOnce(&dyn Fn(&TypeName) -> bool) -> Result<ProxyClass, ProxyGenerationError>,
    {
        let mut classes = self.classes.lock();
        let class = {
            let is_loaded = |name: &TypeName| classes.contains_key(name);
            build(&is_loaded)?
        };
        if classes.contains_key(class.name()) {
            return Err(ProxyGenerationError::DuplicateDefinition(class.name().clone()));
        }
        let class = Arc::new(class);
        classes.insert(class.name().clone(), Loaded::Proxy(Arc::clone(&class)));
        Ok(class)
    }

    /// Defined proxy class by name
    #[must_use]
    pub fn proxy(&self, name: &TypeName) -> Option<Arc<ProxyClass>> {
        match self.classes.lock().get(name) {
            Some(Loaded::Proxy(class)) => Some(Arc::clone(class)),
            _ => None,
        }
    }

    /// Number of proxy classes defined in the scope
    #[must_use]
    pub fn proxy_count(&self) -> usize {
        self.classes
            .lock()
            .values()
            .filter(|l| matches!(l, Loaded::Proxy(_)))
            .count()
    }
}
