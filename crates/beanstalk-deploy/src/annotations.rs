//! Annotation catalog
//!
//! Decides what role an annotation type plays: qualifier, scope or
//! interceptor binding. Roles come from the built-in set, from meta-annotations
//! on the annotation's own descriptor, or from extension registrations.

use beanstalk_model::{wellknown, TypeName, TypeUniverse};
use std::collections::{BTreeMap, BTreeSet};

/// Properties of a scope annotation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeInfo {
    /// Normal scope: instances are reached through a client proxy
    pub normal: bool,
    /// Instances may be passivated
    pub passivating: bool,
}

impl ScopeInfo {
    /// Pseudo-scope such as `@Dependent`
    pub const PSEUDO: Self = Self {
        normal: false,
        passivating: false,
    };

    /// Normal, non-passivating scope
    pub const NORMAL: Self = Self {
        normal: true,
        passivating: false,
    };

    /// Normal, passivating scope
    pub const PASSIVATING: Self = Self {
        normal: true,
        passivating: true,
    };
}

/// Annotation roles known to one container
#[derive(Debug, Clone)]
pub struct AnnotationCatalog {
    qualifiers: BTreeSet<TypeName>,
    scopes: BTreeMap<TypeName, ScopeInfo>,
    bindings: BTreeSet<TypeName>,
}

impl Default for AnnotationCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl AnnotationCatalog {
    /// Catalog with the built-in qualifiers and scopes
    #[must_use]
    pub fn new() -> Self {
        let qualifiers = [wellknown::NAMED, wellknown::DEFAULT, wellknown::ANY]
            .into_iter()
            .map(TypeName::from_static)
            .collect();
        let scopes = [
            (wellknown::DEPENDENT, ScopeInfo::PSEUDO),
            (wellknown::SINGLETON, ScopeInfo::PSEUDO),
            (wellknown::APPLICATION_SCOPED, ScopeInfo::NORMAL),
            (wellknown::REQUEST_SCOPED, ScopeInfo::NORMAL),
            (wellknown::SESSION_SCOPED, ScopeInfo::PASSIVATING),
            (wellknown::CONVERSATION_SCOPED, ScopeInfo::PASSIVATING),
        ]
        .into_iter()
        .map(|(name, info)| (TypeName::from_static(name), info))
        .collect();
        Self {
            qualifiers,
            scopes,
            bindings: BTreeSet::new(),
        }
    }

    /// Register a qualifier type
    pub fn register_qualifier(&mut self, annotation_type: TypeName) {
        self.qualifiers.insert(annotation_type);
    }

    /// Register a scope type
    pub fn register_scope(&mut self, annotation_type: TypeName, info: ScopeInfo) {
        self.scopes.insert(annotation_type, info);
    }

    /// Register an interceptor binding type
    pub fn register_interceptor_binding(&mut self, annotation_type: TypeName) {
        self.bindings.insert(annotation_type);
    }

    /// Whether the annotation type is a qualifier
    #[must_use]
    pub fn is_qualifier(&self, universe: &TypeUniverse, annotation_type: &TypeName) -> bool {
        self.qualifiers.contains(annotation_type)
            || universe
                .get(annotation_type)
                .is_some_and(|d| d.has_annotation(wellknown::QUALIFIER))
    }

    /// Scope properties, if the annotation type is a scope
    #[must_use]
    pub fn scope_info(
        &self,
        universe: &TypeUniverse,
        annotation_type: &TypeName,
    ) -> Option<ScopeInfo> {
        if let Some(info) = self.scopes.get(annotation_type) {
            return Some(*info);
        }
        let descriptor = universe.get(annotation_type)?;
        if let Some(normal) = descriptor.annotation(wellknown::NORMAL_SCOPE) {
            return Some(ScopeInfo {
                normal: true,
                passivating: normal.bool_member("passivating").unwrap_or(false),
            });
        }
        descriptor
            .has_annotation(wellknown::SCOPE)
            .then_some(ScopeInfo::PSEUDO)
    }

    /// Whether the annotation type is a scope
    #[inline]
    #[must_use]
    pub fn is_scope(&self, universe: &TypeUniverse, annotation_type: &TypeName) -> bool {
        self.scope_info(universe, annotation_type).is_some()
    }

    /// Whether instances of the scope may be passivated
    #[must_use]
    pub fn is_passivating(&self, universe: &TypeUniverse, scope: &TypeName) -> bool {
        self.scope_info(universe, scope).is_some_and(|s| s.passivating)
    }

    /// Whether the scope is a normal scope
    #[must_use]
    pub fn is_normal(&self, universe: &TypeUniverse, scope: &TypeName) -> bool {
        self.scope_info(universe, scope).is_some_and(|s| s.normal)
    }

    /// Whether the annotation type is an interceptor binding
    #[must_use]
    pub fn is_interceptor_binding(
        &self,
        universe: &TypeUniverse,
        annotation_type: &TypeName,
    ) -> bool {
        self.bindings.contains(annotation_type)
            || universe
                .get(annotation_type)
                .is_some_and(|d| d.has_annotation(wellknown::INTERCEPTOR_BINDING))
    }
}
