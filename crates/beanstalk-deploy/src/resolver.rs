//! Typesafe resolution
//!
//! Matches injection points and names against enabled beans. Interceptors and
//! decorators are never candidates.

use crate::error::ContainerError;
use crate::registry::BeanRegistry;
use beanstalk_model::{AnnotationUse, BeanRecord, InjectionPoint, TypeRef};
use std::collections::BTreeSet;

/// Resolution engine over one registry
#[derive(Debug, Clone, Copy)]
pub struct TypesafeResolver<'a> {
    registry: &'a BeanRegistry,
}

impl<'a> TypesafeResolver<'a> {
    /// Resolver over a registry
    #[must_use]
    pub fn new(registry: &'a BeanRegistry) -> Self {
        Self { registry }
    }

    /// Enabled beans with the type and every qualifier
    ///
    /// An empty qualifier set means `@Default`.
    #[must_use]
    pub fn candidates(
        &self,
        required: &TypeRef,
        qualifiers: &BTreeSet<AnnotationUse>,
    ) -> Vec<&'a BeanRecord> {
        let default;
        let qualifiers = if qualifiers.is_empty() {
            default = BTreeSet::from([AnnotationUse::default_qualifier()]);
            &default
        } else {
            qualifiers
        };
        self.registry
            .enabled()
            .filter(|b| !b.is_interceptor_or_decorator())
            .filter(|b| b.has_type(required))
            .filter(|b| qualifiers.is_subset(&b.qualifiers))
            .collect()
    }

    /// Keep only alternatives when there is a choice and at least one
    /// alternative is among the candidates
    #[must_use]
    pub fn narrow_alternatives(candidates: Vec<&'a BeanRecord>) -> Vec<&'a BeanRecord> {
        if candidates.len() > 1 && candidates.iter().any(|b| b.alternative) {
            candidates.into_iter().filter(|b| b.alternative).collect()
        } else {
            candidates
        }
    }

    /// The single bean satisfying an injection point
    ///
    /// # Errors
    /// Returns [`ContainerError::UnsatisfiedResolution`] when nothing matches and
    /// [`ContainerError::AmbiguousResolution`] when more than one bean remains
    /// after alternative narrowing.
    pub fn resolve(
        &self,
        injection_point: &InjectionPoint,
    ) -> Result<&'a BeanRecord, ContainerError> {
        let found = self.candidates(
            &injection_point.required_type,
            &injection_point.effective_qualifiers(),
        );
        let mut found = Self::narrow_alternatives(found);
        match found.len() {
            0 => Err(ContainerError::UnsatisfiedResolution {
                injection_point: injection_point.to_string(),
            }),
            1 => Ok(found.remove(0)),
            _ => Err(ContainerError::AmbiguousResolution {
                what: injection_point.to_string(),
                candidates: found.iter().map(ToString::to_string).collect(),
            }),
        }
    }

    /// Enabled beans with a name, before alternative narrowing
    #[must_use]
    pub fn named(&self, name: &str) -> Vec<&'a BeanRecord> {
        self.registry
            .enabled()
            .filter(|b| !b.is_interceptor_or_decorator())
            .filter(|b| b.name.as_deref() == Some(name))
            .collect()
    }

    /// Beans answering to a name, after alternative narrowing
    #[must_use]
    pub fn resolve_by_name(&self, name: &str) -> Vec<&'a BeanRecord> {
        Self::narrow_alternatives(self.named(name))
    }
}
