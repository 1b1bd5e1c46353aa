//! Deployment validation
//!
//! Runs after the stacks are built. Checks manifest enablement, then the
//! injection points of decorators, interceptors and every other bean, then
//! passivation and bean names. The first problem found fails validation.

use crate::annotations::AnnotationCatalog;
use crate::error::ContainerError;
use crate::manifest::DeclarativeConfig;
use crate::registry::BeanRegistry;
use crate::resolver::TypesafeResolver;
use crate::stereotype::StereotypeRegistry;
use beanstalk_model::{wellknown, BeanKind, BeanRecord, TypeName, TypeUniverse};
use std::collections::BTreeSet;
use tracing::debug;

/// Validation over one deployed registry
#[derive(Debug, Clone, Copy)]
pub struct Validator<'a> {
    universe: &'a TypeUniverse,
    catalog: &'a AnnotationCatalog,
    stereotypes: &'a StereotypeRegistry,
    registry: &'a BeanRegistry,
    declarative: &'a DeclarativeConfig,
}

impl<'a> Validator<'a> {
    /// Validator over a deployment
    #[must_use]
    pub fn new(
        universe: &'a TypeUniverse,
        catalog: &'a AnnotationCatalog,
        stereotypes: &'a StereotypeRegistry,
        registry: &'a BeanRegistry,
        declarative: &'a DeclarativeConfig,
    ) -> Self {
        Self {
            universe,
            catalog,
            stereotypes,
            registry,
            declarative,
        }
    }

    /// Run every check in order
    ///
    /// # Errors
    /// Returns the first configuration or resolution problem.
    pub fn validate(&self) -> Result<(), ContainerError> {
        self.check_enablement()?;
        let resolver = TypesafeResolver::new(self.registry);
        let decorators = self.registry.decorators();
        let interceptors = self.registry.interceptors();
        let others = self.registry.enabled().filter(|b| !b.is_interceptor_or_decorator());
        for bean in decorators.chain(interceptors).chain(others) {
            self.check_bean(&resolver, bean)?;
        }
        self.check_names(&resolver)?;
        debug!(beans = self.registry.len(), "validation passed");
        Ok(())
    }

    /// Manifest-enabled classes must be of the kind they are enabled as
    fn check_enablement(&self) -> Result<(), ContainerError> {
        let is_kind = |class: &TypeName, kind: BeanKind| {
            self.registry.by_class(class).any(|b| b.kind == kind)
        };
        for class in self.declarative.interceptors() {
            if !is_kind(class, BeanKind::Interceptor) {
                return Err(ContainerError::configuration(format!(
                    "enabled interceptor {class} is not an interceptor"
                )));
            }
        }
        for class in self.declarative.decorators() {
            if !is_kind(class, BeanKind::Decorator) {
                return Err(ContainerError::configuration(format!(
                    "enabled decorator {class} is not a decorator"
                )));
            }
        }
        for class in self.declarative.alternatives() {
            let alternative_bean = self.registry.by_class(class).any(|b| b.alternative);
            let alternative_stereotype = self.stereotypes.get(class).is_some_and(|m| m.alternative);
            if !alternative_bean && !alternative_stereotype {
                return Err(ContainerError::configuration(format!(
                    "enabled alternative {class} is neither an alternative bean \
                     nor an alternative stereotype"
                )));
            }
        }
        Ok(())
    }

    fn check_bean(
        &self,
        resolver: &TypesafeResolver<'_>,
        bean: &BeanRecord,
    ) -> Result<(), ContainerError> {
        let dependent = bean.scope.as_str() == wellknown::DEPENDENT;
        for point in &bean.injection_points {
            if point.is_container_contract() && !dependent {
                return Err(ContainerError::configuration(format!(
                    "{point} injects {} into {}, which is not @Dependent",
                    point.required_type, bean.bean_class
                )));
            }
            if point.delegate {
                if bean.kind != BeanKind::Decorator {
                    return Err(ContainerError::configuration(format!(
                        "delegate injection point {point} declared by {}, which is not a decorator",
                        bean.bean_class
                    )));
                }
                continue;
            }
            resolver.resolve(point)?;
        }
        self.check_passivation(resolver, bean)
    }

    fn check_passivation(
        &self,
        resolver: &TypesafeResolver<'_>,
        bean: &BeanRecord,
    ) -> Result<(), ContainerError> {
        if !self.catalog.is_passivating(self.universe, &bean.scope) {
            return Ok(());
        }
        let producer = bean.kind == BeanKind::Producer;
        if !bean.passivation_capable && !producer {
            return Err(ContainerError::configuration(format!(
                "{bean} has passivating scope {} but is not passivation capable",
                bean.scope
            )));
        }
        for point in bean.injection_points.iter().filter(|p| !p.transient && !p.delegate) {
            let dependency = resolver.resolve(point)?;
            if !self.is_passivation_safe(dependency) {
                return Err(ContainerError::configuration(format!(
                    "{bean} has passivating scope {} but injection point {point} \
                     resolves to {dependency}, which is not passivation capable",
                    bean.scope
                )));
            }
        }
        Ok(())
    }

    fn is_passivation_safe(&self, dependency: &BeanRecord) -> bool {
        self.catalog.is_normal(self.universe, &dependency.scope) || dependency.passivation_capable
    }

    /// Equal names must resolve to one bean; no name may be a dotted
    /// extension of another
    fn check_names(&self, resolver: &TypesafeResolver<'_>) -> Result<(), ContainerError> {
        let names: BTreeSet<&str> = self
            .registry
            .enabled()
            .filter(|b| !b.is_interceptor_or_decorator())
            .filter_map(|b| b.name.as_deref())
            .collect();
        for name in &names {
            let found = resolver.resolve_by_name(name);
            if found.len() > 1 {
                return Err(ContainerError::AmbiguousResolution {
                    what: format!("bean name {name}"),
                    candidates: found.iter().map(ToString::to_string).collect(),
                });
            }
        }
        for name in &names {
            for other in &names {
                if other.len() > name.len()
                    && other.starts_with(name)
                    && other.as_bytes().get(name.len()) == Some(&b'.')
                {
                    return Err(ContainerError::configuration(format!(
                        "bean name {other} extends bean name {name} with a dotted suffix"
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use beanstalk_model::{
        AnnotationUse, BeanId, BeanSource, ComponentDescriptor, InjectionMember, InjectionPoint,
        TypeRef,
    };
    use beanstalk_test_utils::{tn, TypeBuilder};

    struct Deployment {
        universe: TypeUniverse,
        catalog: AnnotationCatalog,
        stereotypes: StereotypeRegistry,
        registry: BeanRegistry,
        declarative: DeclarativeConfig,
    }

    impl Deployment {
        fn new(classes: &[&str]) -> Self {
            Self {
                universe: TypeUniverse::with_types(
                    classes.iter().map(|c| TypeBuilder::class(c).build()),
                ),
                catalog: AnnotationCatalog::new(),
                stereotypes: StereotypeRegistry::new(),
                registry: BeanRegistry::new(),
                declarative: DeclarativeConfig::new(),
            }
        }

        fn bean(&mut self, class: &str, scope: &'static str, name: Option<&str>) -> BeanId {
            let mut component = ComponentDescriptor::new(tn(class));
            component.name = name.map(str::to_string);
            if let Some(name) = name {
                component.qualifiers.insert(AnnotationUse::named(name));
            }
            let record = BeanRecord::from_component(
                self.registry.next_id(),
                BeanKind::ManagedBean,
                BeanSource::Classpath,
                &component,
                [TypeRef::Object(tn(class)), TypeRef::root()].into(),
                TypeName::from_static(scope),
            );
            self.registry.add(record)
        }

        fn inject(&mut self, into: BeanId, field: &str, required: &str) {
            let bean = self.registry.get_mut(into).unwrap();
            let point = InjectionPoint::new(
                bean.bean_class.clone(),
                InjectionMember::Field { name: field.into() },
                required.parse().unwrap(),
            );
            bean.injection_points.push(point);
        }

        fn validate(&self) -> Result<(), ContainerError> {
            Validator::new(
                &self.universe,
                &self.catalog,
                &self.stereotypes,
                &self.registry,
                &self.declarative,
            )
            .validate()
        }
    }

    #[test]
    fn satisfied_deployment_validates() {
        let mut d = Deployment::new(&["com.acme.Garage", "com.acme.Car"]);
        let garage = d.bean("com.acme.Garage", wellknown::DEPENDENT, None);
        d.bean("com.acme.Car", wellknown::APPLICATION_SCOPED, Some("car"));
        d.inject(garage, "car", "com.acme.Car");
        d.validate().unwrap();
    }

    #[test]
    fn unsatisfied_point_fails() {
        let mut d = Deployment::new(&["com.acme.Garage"]);
        let garage = d.bean("com.acme.Garage", wellknown::DEPENDENT, None);
        d.inject(garage, "car", "com.acme.Car");
        assert!(matches!(d.validate(), Err(ContainerError::UnsatisfiedResolution { .. })));
    }

    #[test]
    fn container_contract_needs_dependent_scope() {
        let mut d = Deployment::new(&["com.acme.Service"]);
        let service = d.bean("com.acme.Service", wellknown::APPLICATION_SCOPED, None);
        d.inject(service, "point", wellknown::INJECTION_POINT);
        let err = d.validate().unwrap_err();
        assert!(err.to_string().contains("not @Dependent"));
    }

    #[test]
    fn delegate_outside_decorator_names_class() {
        let mut d = Deployment::new(&["com.acme.Decorator1"]);
        let id = d.bean("com.acme.Decorator1", wellknown::DEPENDENT, None);
        d.inject(id, "delegate", "com.acme.Greeter");
        d.registry.get_mut(id).unwrap().injection_points[0].delegate = true;
        let err = d.validate().unwrap_err();
        let message = err.to_string();
        assert!(message.contains("com.acme.Decorator1"));
        assert!(message.contains("delegate"));
    }

    #[test]
    fn passivating_scope_needs_capable_bean() {
        let mut d = Deployment::new(&["com.acme.Cart"]);
        d.bean("com.acme.Cart", wellknown::SESSION_SCOPED, None);
        let err = d.validate().unwrap_err();
        assert!(err.to_string().contains("not passivation capable"));
    }

    #[test]
    fn passivating_bean_dependencies_must_be_safe() {
        let mut d = Deployment::new(&["com.acme.Wallet", "com.acme.Coin", "com.acme.Ledger"]);
        let wallet = d.bean("com.acme.Wallet", wellknown::SESSION_SCOPED, None);
        d.registry.get_mut(wallet).unwrap().passivation_capable = true;
        d.bean("com.acme.Coin", wellknown::DEPENDENT, None);
        d.bean("com.acme.Ledger", wellknown::APPLICATION_SCOPED, None);
        d.inject(wallet, "ledger", "com.acme.Ledger");
        d.validate().unwrap();

        d.inject(wallet, "coin", "com.acme.Coin");
        assert!(d.validate().is_err());

        d.registry.get_mut(wallet).unwrap().injection_points[1].transient = true;
        d.validate().unwrap();
    }

    #[test]
    fn dotted_names_conflict() {
        let mut d = Deployment::new(&["com.acme.X", "com.acme.XY"]);
        d.bean("com.acme.X", wellknown::DEPENDENT, Some("x"));
        d.bean("com.acme.XY", wellknown::DEPENDENT, Some("x.y"));
        assert!(matches!(d.validate(), Err(ContainerError::Configuration(_))));
    }

    #[test]
    fn duplicate_names_are_ambiguous() {
        let mut d = Deployment::new(&["com.acme.A", "com.acme.B"]);
        d.bean("com.acme.A", wellknown::DEPENDENT, Some("thing"));
        d.bean("com.acme.B", wellknown::DEPENDENT, Some("thing"));
        assert!(matches!(d.validate(), Err(ContainerError::AmbiguousResolution { .. })));
    }

    #[test]
    fn manifest_interceptor_must_be_an_interceptor() {
        let mut d = Deployment::new(&["com.acme.Plain"]);
        d.bean("com.acme.Plain", wellknown::DEPENDENT, None);
        d.declarative.merge(
            serde_yaml::from_str("interceptors:\n  - class: com.acme.Plain\n").unwrap(),
        );
        let err = d.validate().unwrap_err();
        assert!(err.to_string().contains("is not an interceptor"));
    }
}
