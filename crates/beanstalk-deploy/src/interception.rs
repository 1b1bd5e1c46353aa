//! Interceptor and decorator stacks
//!
//! Decides which interceptors and decorators are enabled, orders them, and
//! attaches an [`InterceptionPlan`] to every enabled managed bean.

use crate::annotations::AnnotationCatalog;
use crate::error::ContainerError;
use crate::manifest::DeclarativeConfig;
use crate::registry::BeanRegistry;
use beanstalk_model::{
    AnnotationUse, BeanId, BeanKind, BeanRecord, DecoratorRef, InterceptionPlan, InterceptionType,
    InterceptorRef, MethodSignature, TypeRef, TypeUniverse,
};
use std::cmp::Reverse;
use tracing::debug;

/// Enable interceptors and decorators and fix their priority and order
///
/// A class is enabled by a priority or by a manifest entry. A manifest
/// priority overrides the class's own. Manifest entries order first, in
/// manifest order; the others follow in discovery order. Effective values
/// are recomputed from the declared ones, so repeated calls agree.
pub fn resolve_enablement(registry: &mut BeanRegistry, declarative: &DeclarativeConfig) {
    let interceptor_count = declarative.interceptor_count();
    let decorator_count = declarative.decorator_count();
    for bean in registry.iter_mut() {
        if let Some(meta) = bean.interceptor.as_mut() {
            match declarative.interceptor(&bean.bean_class) {
                Some((index, priority)) => {
                    meta.declaration_order = index;
                    meta.priority = priority.or(meta.declared_priority);
                    bean.enabled = true;
                }
                None => {
                    meta.declaration_order = meta.discovery_order + interceptor_count;
                    meta.priority = meta.declared_priority;
                    bean.enabled = meta.priority.is_some();
                }
            }
        }
        if let Some(meta) = bean.decorator.as_mut() {
            match declarative.decorator(&bean.bean_class) {
                Some((index, priority)) => {
                    meta.declaration_order = index;
                    meta.priority = priority.or(meta.declared_priority);
                    bean.enabled = true;
                }
                None => {
                    meta.declaration_order = meta.discovery_order + decorator_count;
                    meta.priority = meta.declared_priority;
                    bean.enabled = meta.priority.is_some();
                }
            }
        }
        if bean.is_interceptor_or_decorator() && !bean.enabled {
            debug!(bean = %bean, "not enabled");
        }
    }
}

/// Enabled interceptors in invocation order: ascending priority, ties by
/// declaration order, unprioritized last
#[must_use]
pub fn ordered_interceptors(registry: &BeanRegistry) -> Vec<&BeanRecord> {
    let mut interceptors: Vec<_> = registry
        .interceptors()
        .filter(|b| b.interceptor.is_some())
        .collect();
    interceptors.sort_by_key(|b| {
        b.interceptor
            .as_ref()
            .map(|m| (m.priority.is_none(), m.priority, m.declaration_order))
    });
    interceptors
}

/// Enabled decorators outermost first: descending priority, ties by
/// declaration order, unprioritized last
#[must_use]
pub fn ordered_decorators(registry: &BeanRegistry) -> Vec<&BeanRecord> {
    let mut decorators: Vec<_> = registry
        .decorators()
        .filter(|b| b.decorator.is_some())
        .collect();
    decorators.sort_by_key(|b| {
        b.decorator
            .as_ref()
            .map(|m| (m.priority.is_none(), Reverse(m.priority), m.declaration_order))
    });
    decorators
}

fn interceptor_ref(bean: &BeanRecord) -> Option<InterceptorRef> {
    bean.interceptor.as_ref().map(|meta| InterceptorRef {
        bean: bean.id,
        class: bean.bean_class.clone(),
        priority: meta.priority,
        declaration_order: meta.declaration_order,
    })
}

fn decorator_ref(bean: &BeanRecord) -> Option<DecoratorRef> {
    bean.decorator.as_ref().map(|meta| DecoratorRef {
        bean: bean.id,
        class: bean.bean_class.clone(),
        priority: meta.priority,
        declaration_order: meta.declaration_order,
    })
}

/// Builds interception plans over one universe
#[derive(Debug, Clone, Copy)]
pub struct StackBuilder<'a> {
    universe: &'a TypeUniverse,
    catalog: &'a AnnotationCatalog,
}

impl<'a> StackBuilder<'a> {
    /// Builder over a universe
    #[must_use]
    pub fn new(universe: &'a TypeUniverse, catalog: &'a AnnotationCatalog) -> Self {
        Self { universe, catalog }
    }

    /// Attach a plan to every enabled managed bean
    ///
    /// Returns the number of beans whose plan is not empty.
    ///
    /// # Errors
    /// Fails if a bean class is missing from the universe.
    pub fn build(&self, registry: &mut BeanRegistry) -> Result<usize, ContainerError> {
        let interceptors = ordered_interceptors(registry);
        let decorators = ordered_decorators(registry);
        let mut plans: Vec<(BeanId, InterceptionPlan)> = Vec::new();
        for bean in registry
            .enabled()
            .filter(|b| b.kind == BeanKind::ManagedBean)
        {
            plans.push((bean.id, self.plan_for(bean, &interceptors, &decorators)?));
        }

        let mut non_empty = 0;
        for (id, plan) in plans {
            if !plan.is_empty() {
                non_empty += 1;
            }
            if let Some(bean) = registry.get_mut(id) {
                bean.plan = Some(plan);
            }
        }
        debug!(non_empty, "interception plans attached");
        Ok(non_empty)
    }

    fn method_bindings(&self, annotations: &[AnnotationUse]) -> Vec<AnnotationUse> {
        annotations
            .iter()
            .filter(|a| self.catalog.is_interceptor_binding(self.universe, &a.annotation_type))
            .cloned()
            .collect()
    }

    /// Plan of one bean given the ordered enabled interceptors and decorators
    ///
    /// # Errors
    /// Fails if the bean class is missing from the universe.
    pub fn plan_for(
        &self,
        bean: &BeanRecord,
        interceptors: &[&BeanRecord],
        decorators: &[&BeanRecord],
    ) -> Result<InterceptionPlan, ContainerError> {
        let mut plan = InterceptionPlan::default();
        let methods: Vec<_> = self
            .universe
            .hierarchy_methods(&bean.bean_class)?
            .into_iter()
            .filter(|m| m.method.is_interceptable() && !m.declaring_type.is_root())
            .collect();
        let class_bindings = &bean.interceptor_bindings;

        for visible in &methods {
            let mut bindings = class_bindings.clone();
            bindings.extend(self.method_bindings(&visible.method.annotations));
            let chain: Vec<_> = interceptors
                .iter()
                .filter(|i| {
                    i.interceptor.as_ref().is_some_and(|meta| {
                        meta.interception_types.contains(&InterceptionType::AroundInvoke)
                            && !meta.bindings.is_empty()
                            && meta.bindings.is_subset(&bindings)
                    })
                })
                .filter_map(|i| interceptor_ref(i))
                .collect();
            if !chain.is_empty() {
                plan.around_invoke.insert(visible.method.signature(), chain);
            }
        }

        for kind in InterceptionType::LIFECYCLE {
            let chain: Vec<_> = interceptors
                .iter()
                .filter(|i| {
                    i.interceptor.as_ref().is_some_and(|meta| {
                        meta.interception_types.contains(&kind)
                            && !meta.bindings.is_empty()
                            && meta.bindings.is_subset(class_bindings)
                    })
                })
                .filter_map(|i| interceptor_ref(i))
                .collect();
            if !chain.is_empty() {
                plan.lifecycle.insert(kind, chain);
            }
        }

        let applicable: Vec<&BeanRecord> = decorators
            .iter()
            .copied()
            .filter(|d| {
                d.decorator.as_ref().is_some_and(|meta| {
                    bean.has_type(&meta.delegate.required_type)
                        && meta.delegate.effective_qualifiers().is_subset(&bean.qualifiers)
                })
            })
            .collect();
        plan.decorators = applicable.iter().filter_map(|d| decorator_ref(d)).collect();

        for visible in &methods {
            let signature = visible.method.signature();
            let chain: Vec<_> = applicable
                .iter()
                .filter(|d| self.decorates(bean, d, &signature))
                .filter_map(|d| decorator_ref(d))
                .collect();
            if !chain.is_empty() {
                plan.decorated_methods.insert(signature, chain);
            }
        }
        Ok(plan)
    }

    /// Whether a decorator implements a method one of its decorated types
    /// declares for the bean
    fn decorates(
        &self,
        bean: &BeanRecord,
        decorator: &BeanRecord,
        signature: &MethodSignature,
    ) -> bool {
        let Some(meta) = &decorator.decorator else {
            return false;
        };
        let declared = meta.decorated_types.iter().any(|t| {
            bean.has_type(&TypeRef::Object(t.clone()))
                && self
                    .universe
                    .get(t)
                    .is_some_and(|d| d.declared_method(signature).is_some())
        });
        if !declared {
            return false;
        }
        self.universe
            .hierarchy_methods(&decorator.bean_class)
            .is_ok_and(|methods| {
                methods.iter().any(|m| {
                    &m.method.signature() == signature && !m.method.modifiers.is_abstract()
                })
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::BeanDefiner;
    use crate::stereotype::StereotypeRegistry;
    use beanstalk_model::{BeanSource, TypeDescriptor, TypeName};
    use beanstalk_test_utils::{decorator_fixture, interceptor_fixture, tn, Fixture};
    use pretty_assertions::assert_eq;

    /// Define every candidate the way classpath deployment does
    fn define(fixture: &Fixture, catalog: &AnnotationCatalog) -> BeanRegistry {
        let mut stereotypes = StereotypeRegistry::new();
        stereotypes.register_builtins();
        let mut registry = BeanRegistry::new();
        for (order, class) in fixture.candidates.iter().enumerate() {
            let descriptor: TypeDescriptor = fixture.universe.get(class).unwrap().clone();
            let mut definer = BeanDefiner::new(&fixture.universe, catalog, &mut stereotypes);
            if !definer.is_injectable(&descriptor).unwrap() {
                continue;
            }
            let component = definer.component(&descriptor).unwrap();
            let types = definer.class_types(class).unwrap();
            let scope = component.scope.clone().unwrap();
            let kind = if descriptor.has_annotation(beanstalk_model::wellknown::INTERCEPTOR) {
                BeanKind::Interceptor
            } else if descriptor.has_annotation(beanstalk_model::wellknown::DECORATOR) {
                BeanKind::Decorator
            } else {
                BeanKind::ManagedBean
            };
            let mut record = BeanRecord::from_component(
                registry.next_id(),
                kind,
                BeanSource::Classpath,
                &component,
                types,
                scope,
            );
            match kind {
                BeanKind::Interceptor => {
                    let meta = definer.interceptor_meta(&descriptor, &component, order);
                    record.interceptor = Some(meta.unwrap());
                }
                BeanKind::Decorator => {
                    let meta = definer.decorator_meta(&descriptor, &component, order);
                    record.decorator = Some(meta.unwrap());
                }
                _ => {}
            }
            registry.add(record);
        }
        resolve_enablement(&mut registry, &DeclarativeConfig::new());
        registry
    }

    fn classes(refs: &[InterceptorRef]) -> Vec<&str> {
        refs.iter().map(|r| r.class.simple_name()).collect()
    }

    #[test]
    fn interceptors_order_by_priority_then_declaration() {
        let fixture = interceptor_fixture();
        let catalog = AnnotationCatalog::new();
        let mut registry = define(&fixture, &catalog);
        StackBuilder::new(&fixture.universe, &catalog).build(&mut registry).unwrap();

        let service = registry.class_bean(&tn("com.acme.OrderService")).unwrap();
        let plan = service.plan.as_ref().unwrap();
        let place = MethodSignature::new("place", vec![ty_ref("int"), ty_ref("long")]);
        assert_eq!(
            classes(plan.interceptors_for(&place)),
            vec!["AuditInterceptor", "TimingInterceptor", "LoggingInterceptor"]
        );
        let finish = MethodSignature::new("finish", vec![]);
        assert!(plan.interceptors_for(&finish).is_empty());
        assert!(plan.requires_proxy());
    }

    #[test]
    fn unbound_bean_gets_an_empty_plan() {
        let fixture = interceptor_fixture();
        let catalog = AnnotationCatalog::new();
        let mut registry = define(&fixture, &catalog);
        StackBuilder::new(&fixture.universe, &catalog).build(&mut registry).unwrap();
        let pojo = registry.class_bean(&tn("com.acme.Pojo")).unwrap();
        assert!(pojo.plan.as_ref().unwrap().is_empty());
        let interceptor = registry.class_bean(&tn("com.acme.AuditInterceptor"));
        assert!(interceptor.is_none() || interceptor.unwrap().plan.is_none());
    }

    #[test]
    fn decorators_are_outermost_first() {
        let fixture = decorator_fixture();
        let catalog = AnnotationCatalog::new();
        let mut registry = define(&fixture, &catalog);
        StackBuilder::new(&fixture.universe, &catalog).build(&mut registry).unwrap();

        let greeter = registry.class_bean(&tn("com.acme.PoliteGreeter")).unwrap();
        let plan = greeter.plan.as_ref().unwrap();
        let order: Vec<_> = plan.decorators.iter().map(|d| d.class.simple_name()).collect();
        assert_eq!(order, vec!["LoudGreeter", "ExclaimGreeter"]);

        let greet = MethodSignature::new("greet", vec![ty_ref(beanstalk_model::wellknown::STRING)]);
        assert_eq!(plan.decorators_for(&greet).len(), 2);
        let farewell = MethodSignature::new("farewell", vec![]);
        assert!(plan.decorators_for(&farewell).is_empty());
    }

    #[test]
    fn manifest_enables_and_overrides_priority() {
        let fixture = interceptor_fixture();
        let catalog = AnnotationCatalog::new();
        let mut registry = define(&fixture, &catalog);
        let mut declarative = DeclarativeConfig::new();
        declarative.merge(
            serde_yaml::from_str(
                "interceptors:\n  - class: com.acme.LoggingInterceptor\n    priority: 1\n",
            )
            .unwrap(),
        );
        resolve_enablement(&mut registry, &declarative);
        let order: Vec<TypeName> = ordered_interceptors(&registry)
            .iter()
            .map(|b| b.bean_class.clone())
            .collect();
        assert_eq!(order[0], tn("com.acme.LoggingInterceptor"));
    }

    fn interceptor_positions(registry: &BeanRegistry) -> Vec<(String, Option<i32>, usize)> {
        ordered_interceptors(registry)
            .iter()
            .filter_map(|b| {
                let meta = b.interceptor.as_ref()?;
                Some((b.bean_class.to_string(), meta.priority, meta.declaration_order))
            })
            .collect()
    }

    #[test]
    fn enablement_can_be_resolved_again() {
        let fixture = interceptor_fixture();
        let catalog = AnnotationCatalog::new();
        let mut registry = define(&fixture, &catalog);
        let plain = interceptor_positions(&registry);

        let mut declarative = DeclarativeConfig::new();
        declarative.merge(
            serde_yaml::from_str(
                "interceptors:\n  - class: com.acme.TimingInterceptor\n    priority: 1\n",
            )
            .unwrap(),
        );
        resolve_enablement(&mut registry, &declarative);
        let overridden = interceptor_positions(&registry);
        resolve_enablement(&mut registry, &declarative);
        assert_eq!(interceptor_positions(&registry), overridden);
        assert_eq!(overridden[0].0, "com.acme.TimingInterceptor");

        resolve_enablement(&mut registry, &DeclarativeConfig::new());
        assert_eq!(interceptor_positions(&registry), plain);
    }

    fn ty_ref(spelling: &str) -> TypeRef {
        spelling.parse().unwrap()
    }
}
