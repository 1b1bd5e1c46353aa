//! Naming service boundary
//!
//! The container binds a reference to itself at deployment so host code can
//! find it by name.

use crate::error::NamingError;
use beanstalk_proxy::LoaderId;
use dashmap::DashMap;
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Value stored under a name
pub type Bound = Arc<dyn Any + Send + Sync>;

/// Directory the container publishes itself in
pub trait NamingService: Send + Sync {
    /// Bind a value, replacing any existing binding
    ///
    /// # Errors
    /// Returns a [`NamingError`] if the name is invalid or the backend fails.
    fn bind(&self, name: &str, value: Bound) -> Result<(), NamingError>;

    /// Bound value, if any
    fn lookup(&self, name: &str) -> Option<Bound>;

    /// Remove a binding
    ///
    /// # Errors
    /// Returns [`NamingError::NotBound`] if nothing is bound under the name.
    fn unbind(&self, name: &str) -> Result<(), NamingError>;
}

/// What the container binds under its manager name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ManagerReference {
    /// Container identity
    pub container: Uuid,
    /// Class-loader scope the container defines proxies in
    pub loader: LoaderId,
}

/// Process-local naming service
#[derive(Default)]
pub struct InMemoryNamingService {
    bindings: DashMap<String, Bound>,
}

impl fmt::Debug for InMemoryNamingService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemoryNamingService")
            .field("bindings", &self.bindings.len())
            .finish()
    }
}

impl InMemoryNamingService {
    /// Empty service
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of bindings
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Whether nothing is bound
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl NamingService for InMemoryNamingService {
    fn bind(&self, name: &str, value: Bound) -> Result<(), NamingError> {
        if name.trim().is_empty() {
            return Err(NamingError::InvalidName(name.to_string()));
        }
        self.bindings.insert(name.to_string(), value);
        Ok(())
    }

    fn lookup(&self, name: &str) -> Option<Bound> {
        self.bindings.get(name).map(|entry| Arc::clone(entry.value()))
    }

    fn unbind(&self, name: &str) -> Result<(), NamingError> {
        self.bindings
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| NamingError::NotBound(name.to_string()))
    }
}
