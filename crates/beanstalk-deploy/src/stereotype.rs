//! Stereotype registry
//!
//! Resolves stereotype annotations to the defaults they carry. One registry
//! per container; registration is additive and idempotent.

use crate::annotations::AnnotationCatalog;
use crate::error::ContainerError;
use beanstalk_model::{wellknown, StereotypeModel, TypeName, TypeUniverse};
use indexmap::IndexMap;
use std::collections::HashSet;
use tracing::debug;

/// Stereotype models known to one container
#[derive(Debug, Clone, Default)]
pub struct StereotypeRegistry {
    models: IndexMap<TypeName, StereotypeModel>,
    builtins_registered: bool,
}

impl StereotypeRegistry {
    /// Empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the model, interceptor and decorator stereotypes
    ///
    /// Runs once; later calls do nothing.
    pub fn register_builtins(&mut self) {
        if self.builtins_registered {
            return;
        }
        self.builtins_registered = true;
        self.insert(
            StereotypeModel::new(TypeName::from_static(wellknown::MODEL))
                .with_default_scope(TypeName::from_static(wellknown::REQUEST_SCOPED))
                .with_name_defaulting(),
        );
        self.insert(StereotypeModel::new(TypeName::from_static(wellknown::INTERCEPTOR)));
        self.insert(StereotypeModel::new(TypeName::from_static(wellknown::DECORATOR)));
    }

    /// Add a model; a model already present for the same type wins
    pub fn insert(&mut self, model: StereotypeModel) {
        self.models.entry(model.annotation_type.clone()).or_insert(model);
    }

    /// Model of a registered stereotype
    #[inline]
    #[must_use]
    pub fn get(&self, annotation_type: &TypeName) -> Option<&StereotypeModel> {
        self.models.get(annotation_type)
    }

    /// Whether a model exists for the type
    #[inline]
    #[must_use]
    pub fn contains(&self, annotation_type: &TypeName) -> bool {
        self.models.contains_key(annotation_type)
    }

    /// Number of registered models
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.models.len()
    }

    /// Whether nothing is registered
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Registered models in registration order
    pub fn iter(&self) -> impl Iterator<Item = &StereotypeModel> {
        self.models.values()
    }

    /// Model for an annotation type, if it is a stereotype
    ///
    /// Returns `Ok(None)` when the annotation is not meta-annotated
    /// `@Stereotype`. The first successful classification is cached and
    /// returned by every later call.
    ///
    /// # Errors
    /// Returns [`ContainerError::Configuration`] when the stereotype declares
    /// more than one scope, a non-empty `@Named`, or a qualifier other than
    /// `@Named`.
    pub fn classify(
        &mut self,
        universe: &TypeUniverse,
        catalog: &AnnotationCatalog,
        annotation_type: &TypeName,
    ) -> Result<Option<StereotypeModel>, ContainerError> {
        let mut visiting = HashSet::new();
        self.classify_inner(universe, catalog, annotation_type, &mut visiting)
    }

    fn classify_inner(
        &mut self,
        universe: &TypeUniverse,
        catalog: &AnnotationCatalog,
        annotation_type: &TypeName,
        visiting: &mut HashSet<TypeName>,
    ) -> Result<Option<StereotypeModel>, ContainerError> {
        if let Some(model) = self.models.get(annotation_type) {
            return Ok(Some(model.clone()));
        }
        let Some(descriptor) = universe.get(annotation_type) else {
            return Ok(None);
        };
        if !descriptor.has_annotation(wellknown::STEREOTYPE) {
            return Ok(None);
        }
        if !visiting.insert(annotation_type.clone()) {
            // cycle between stereotypes
            return Ok(None);
        }

        let mut model = StereotypeModel::new(annotation_type.clone());
        let mut scopes = Vec::new();
        let mut inherited_scope = None;

        for meta in &descriptor.annotations {
            let meta_type = &meta.annotation_type;
            if meta.is(wellknown::STEREOTYPE) {
                continue;
            }
            if meta.is(wellknown::NAMED) {
                if meta.text_member("value").is_some_and(|v| !v.is_empty()) {
                    return Err(ContainerError::configuration(format!(
                        "stereotype {annotation_type} declares a non-empty @Named"
                    )));
                }
                model.name_defaulting = true;
            } else if catalog.is_qualifier(universe, meta_type) {
                return Err(ContainerError::configuration(format!(
                    "stereotype {annotation_type} declares qualifier {meta}"
                )));
            } else if catalog.is_scope(universe, meta_type) {
                scopes.push(meta_type.clone());
            } else if catalog.is_interceptor_binding(universe, meta_type) {
                model.interceptor_bindings.insert(meta.clone());
            } else if meta.is(wellknown::ALTERNATIVE) {
                model.alternative = true;
            } else if let Some(nested) =
                self.classify_inner(universe, catalog, meta_type, visiting)?
            {
                model.interceptor_bindings.extend(nested.interceptor_bindings);
                model.alternative |= nested.alternative;
                if inherited_scope.is_none() {
                    inherited_scope = nested.default_scope;
                }
            }
        }

        if scopes.len() > 1 {
            let names: Vec<_> = scopes.iter().map(ToString::to_string).collect();
            return Err(ContainerError::configuration(format!(
                "stereotype {annotation_type} declares more than one scope: {}",
                names.join(", ")
            )));
        }
        model.default_scope = scopes.pop().or(inherited_scope);

        debug!(stereotype = %annotation_type, "registered stereotype");
        self.models.insert(annotation_type.clone(), model.clone());
        Ok(Some(model))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use beanstalk_model::{AnnotationUse, TypeDescriptor, TypeKind};
    use proptest::prelude::*;

    fn name(s: &str) -> TypeName {
        TypeName::new(s).unwrap()
    }

    fn stereotype(n: &str, metas: Vec<AnnotationUse>) -> TypeDescriptor {
        let mut d = TypeDescriptor::new(name(n), TypeKind::Annotation);
        d.annotations.push(AnnotationUse::well_known(wellknown::STEREOTYPE));
        d.annotations.extend(metas);
        d
    }

    fn binding(n: &str) -> TypeDescriptor {
        let mut d = TypeDescriptor::new(name(n), TypeKind::Annotation);
        d.annotations.push(AnnotationUse::well_known(wellknown::INTERCEPTOR_BINDING));
        d
    }

    #[test]
    fn builtins_are_seeded_once() {
        let mut registry = StereotypeRegistry::new();
        registry.register_builtins();
        registry.register_builtins();
        assert_eq!(registry.len(), 3);
        let model = registry.get(&TypeName::from_static(wellknown::MODEL)).unwrap();
        assert!(model.name_defaulting);
        assert_eq!(
            model.default_scope,
            Some(TypeName::from_static(wellknown::REQUEST_SCOPED))
        );
    }

    #[test]
    fn plain_annotation_is_not_a_stereotype() {
        let universe = TypeUniverse::with_types([binding("com.acme.Logged")]);
        let mut registry = StereotypeRegistry::new();
        let result = registry
            .classify(&universe, &AnnotationCatalog::new(), &name("com.acme.Logged"))
            .unwrap();
        assert!(result.is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn stereotype_collects_scope_bindings_and_naming() {
        let universe = TypeUniverse::with_types([
            binding("com.acme.Logged"),
            stereotype(
                "com.acme.Action",
                vec![
                    AnnotationUse::well_known(wellknown::REQUEST_SCOPED),
                    AnnotationUse::marker(name("com.acme.Logged")),
                    AnnotationUse::named(""),
                ],
            ),
        ]);
        let mut registry = StereotypeRegistry::new();
        let model = registry
            .classify(&universe, &AnnotationCatalog::new(), &name("com.acme.Action"))
            .unwrap()
            .unwrap();
        assert_eq!(model.default_scope, Some(TypeName::from_static(wellknown::REQUEST_SCOPED)));
        assert!(model.name_defaulting);
        assert_eq!(model.interceptor_bindings.len(), 1);
    }

    #[test]
    fn two_scopes_are_rejected() {
        let universe = TypeUniverse::with_types([stereotype(
            "com.acme.Confused",
            vec![
                AnnotationUse::well_known(wellknown::REQUEST_SCOPED),
                AnnotationUse::well_known(wellknown::SESSION_SCOPED),
            ],
        )]);
        let err = StereotypeRegistry::new()
            .classify(&universe, &AnnotationCatalog::new(), &name("com.acme.Confused"))
            .unwrap_err();
        assert!(err.to_string().contains("more than one scope"));
    }

    #[test]
    fn named_value_and_qualifiers_are_rejected() {
        let universe = TypeUniverse::with_types([
            stereotype("com.acme.Labelled", vec![AnnotationUse::named("fixed")]),
            stereotype("com.acme.Qualified", vec![AnnotationUse::default_qualifier()]),
        ]);
        let catalog = AnnotationCatalog::new();
        let mut registry = StereotypeRegistry::new();
        assert!(registry.classify(&universe, &catalog, &name("com.acme.Labelled")).is_err());
        assert!(registry.classify(&universe, &catalog, &name("com.acme.Qualified")).is_err());
    }

    #[test]
    fn nested_stereotypes_inherit_and_cycles_terminate() {
        let universe = TypeUniverse::with_types([
            binding("com.acme.Logged"),
            stereotype(
                "com.acme.Base",
                vec![
                    AnnotationUse::well_known(wellknown::APPLICATION_SCOPED),
                    AnnotationUse::marker(name("com.acme.Logged")),
                    AnnotationUse::marker(name("com.acme.Derived")),
                ],
            ),
            stereotype("com.acme.Derived", vec![AnnotationUse::marker(name("com.acme.Base"))]),
        ]);
        let mut registry = StereotypeRegistry::new();
        let model = registry
            .classify(&universe, &AnnotationCatalog::new(), &name("com.acme.Derived"))
            .unwrap()
            .unwrap();
        assert_eq!(
            model.default_scope,
            Some(TypeName::from_static(wellknown::APPLICATION_SCOPED))
        );
        assert_eq!(model.interceptor_bindings.len(), 1);
    }

    proptest! {
        #[test]
        fn classify_is_idempotent(
            scope in prop::sample::select(vec![
                None,
                Some(wellknown::REQUEST_SCOPED),
                Some(wellknown::SESSION_SCOPED),
                Some(wellknown::APPLICATION_SCOPED),
            ]),
            named in any::<bool>(),
            bound in any::<bool>(),
            repeats in 2usize..5,
        ) {
            let mut metas = Vec::new();
            if let Some(scope) = scope {
                metas.push(AnnotationUse::well_known(scope));
            }
            if named {
                metas.push(AnnotationUse::named(""));
            }
            if bound {
                metas.push(AnnotationUse::marker(name("com.acme.Logged")));
            }
            let universe = TypeUniverse::with_types([
                binding("com.acme.Logged"),
                stereotype("com.acme.Generated", metas),
            ]);
            let catalog = AnnotationCatalog::new();
            let mut registry = StereotypeRegistry::new();
            registry.register_builtins();

            let generated = name("com.acme.Generated");
            let first = registry.classify(&universe, &catalog, &generated).unwrap();
            for _ in 0..repeats {
                let again = registry.classify(&universe, &catalog, &generated).unwrap();
                prop_assert_eq!(&again, &first);
                registry.register_builtins();
            }
            prop_assert_eq!(registry.len(), 4);
        }
    }
}
