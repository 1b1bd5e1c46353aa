//! Declarative manifests
//!
//! A YAML document enabling interceptors, decorators and alternatives and
//! declaring beans outside the classpath scan:
//!
//! ```yaml
//! interceptors:
//!   - class: com.acme.AuditInterceptor
//!     priority: 10
//! decorators:
//!   - class: com.acme.LoudGreeter
//! alternatives:
//!   - com.acme.MockPayment
//! beans:
//!   - class: com.acme.SportsCar
//!     name: sports
//!     scope: beanstalk.ApplicationScoped
//!     specializes: true
//! ```

use crate::discovery::DeclarativeResource;
use crate::error::ContainerError;
use beanstalk_model::{TypeName, TypeUniverse};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

/// Interceptor or decorator enabled by a manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EnablementEntry {
    /// Enabled class
    pub class: TypeName,
    /// Priority overriding the class's own
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<i32>,
}

/// Bean declared by a manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeclaredBean {
    /// Implementation type
    pub class: TypeName,
    /// Bean name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Scope annotation type
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<TypeName>,
    /// Specializes its direct superclass
    #[serde(default)]
    pub specializes: bool,
    /// Declared as an alternative
    #[serde(default)]
    pub alternative: bool,
}

/// One parsed manifest
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Manifest {
    /// Enabled interceptors, in order
    pub interceptors: Vec<EnablementEntry>,
    /// Enabled decorators, in order
    pub decorators: Vec<EnablementEntry>,
    /// Enabled alternatives (bean classes or stereotypes)
    pub alternatives: Vec<TypeName>,
    /// Declared beans
    pub beans: Vec<DeclaredBean>,
}

impl Manifest {
    /// Parse a resource
    ///
    /// An empty document is an empty manifest.
    ///
    /// # Errors
    /// Returns [`ContainerError::Declarative`] naming the resource.
    pub fn parse(resource: &DeclarativeResource) -> Result<Self, ContainerError> {
        if resource.content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(&resource.content)
            .map_err(|e| ContainerError::Declarative(format!("{}: {e}", resource.locator)))
    }

    /// Check that every class exists and no list repeats an entry
    ///
    /// # Errors
    /// Returns [`ContainerError::Configuration`] for the first problem found.
    pub fn validate(&self, locator: &str, universe: &TypeUniverse) -> Result<(), ContainerError> {
        let lists: [(&str, Vec<&TypeName>); 4] = [
            ("interceptors", self.interceptors.iter().map(|e| &e.class).collect()),
            ("decorators", self.decorators.iter().map(|e| &e.class).collect()),
            ("alternatives", self.alternatives.iter().collect()),
            ("beans", self.beans.iter().map(|b| &b.class).collect()),
        ];
        for (list, classes) in lists {
            let mut seen = HashSet::new();
            for class in classes {
                if !universe.contains(class) {
                    return Err(ContainerError::configuration(format!(
                        "{locator}: {list} entry {class} is not a known type"
                    )));
                }
                if !seen.insert(class) {
                    return Err(ContainerError::configuration(format!(
                        "{locator}: {list} lists {class} more than once"
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Merged view of every manifest in a deployment
#[derive(Debug, Clone, Default)]
pub struct DeclarativeConfig {
    interceptors: IndexMap<TypeName, Option<i32>>,
    decorators: IndexMap<TypeName, Option<i32>>,
    alternatives: BTreeSet<TypeName>,
    beans: Vec<DeclaredBean>,
}

impl DeclarativeConfig {
    /// Empty configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a manifest; entries already enabled by an earlier manifest keep
    /// their position
    pub fn merge(&mut self, manifest: Manifest) {
        for entry in manifest.interceptors {
            self.interceptors.entry(entry.class).or_insert(entry.priority);
        }
        for entry in manifest.decorators {
            self.decorators.entry(entry.class).or_insert(entry.priority);
        }
        self.alternatives.extend(manifest.alternatives);
        self.beans.extend(manifest.beans);
    }

    /// Position and priority of an enabled interceptor
    #[must_use]
    pub fn interceptor(&self, class: &TypeName) -> Option<(usize, Option<i32>)> {
        self.interceptors.get_full(class).map(|(i, _, p)| (i, *p))
    }

    /// Position and priority of an enabled decorator
    #[must_use]
    pub fn decorator(&self, class: &TypeName) -> Option<(usize, Option<i32>)> {
        self.decorators.get_full(class).map(|(i, _, p)| (i, *p))
    }

    /// Enabled interceptor classes, in order
    pub fn interceptors(&self) -> impl Iterator<Item = &TypeName> {
        self.interceptors.keys()
    }

    /// Enabled decorator classes, in order
    pub fn decorators(&self) -> impl Iterator<Item = &TypeName> {
        self.decorators.keys()
    }

    /// Number of enabled interceptors
    #[inline]
    #[must_use]
    pub fn interceptor_count(&self) -> usize {
        self.interceptors.len()
    }

    /// Number of enabled decorators
    #[inline]
    #[must_use]
    pub fn decorator_count(&self) -> usize {
        self.decorators.len()
    }

    /// Enabled alternatives
    #[inline]
    #[must_use]
    pub fn alternatives(&self) -> &BTreeSet<TypeName> {
        &self.alternatives
    }

    /// Whether a class or stereotype is an enabled alternative
    #[inline]
    #[must_use]
    pub fn is_alternative_enabled(&self, class: &TypeName) -> bool {
        self.alternatives.contains(class)
    }

    /// Declared beans
    #[inline]
    #[must_use]
    pub fn beans(&self) -> &[DeclaredBean] {
        &self.beans
    }
}
