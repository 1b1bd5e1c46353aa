//! Deployment pipeline
//!
//! Runs the ordered deployment steps over one discovery: extensions,
//! manager binding, built-in beans, before-discovery, declarative beans,
//! stereotypes, default beans, the classpath scan, extension types,
//! specialization, after-discovery, stack building, validation and
//! after-validation. Every failure is reported with the phase it
//! happened in.

use crate::annotations::AnnotationCatalog;
use crate::builtin;
use crate::config::ContainerConfig;
use crate::definition::BeanDefiner;
use crate::discovery::{DeclarativeResource, Discovery};
use crate::error::{ContainerError, DeploymentError, DeploymentPhase};
use crate::events::{
    AnnotatedType, BeforeBeanDiscovery, CustomDecorator, CustomInterceptor, Extension,
    ObserverRegistry,
};
use crate::interception::{resolve_enablement, StackBuilder};
use crate::manifest::{DeclarativeConfig, DeclaredBean, Manifest};
use crate::naming::{ManagerReference, NamingService};
use crate::registry::BeanRegistry;
use crate::specialization;
use crate::stereotype::StereotypeRegistry;
use crate::validation::Validator;
use beanstalk_model::{
    wellknown, AnnotationUse, BeanKind, BeanRecord, BeanSource, ComponentDescriptor, DecoratorMeta,
    InjectionMember, InjectionPoint, InterceptorMeta, ProducerMeta, SpecializationEdge,
    SpecializationSource, TypeDescriptor, TypeName, TypeRef, TypeUniverse,
};
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;
use tracing::{debug, info};

/// Hook deciding whether a non-injectable class is an enterprise component
pub trait EnterpriseClassifier: Send + Sync {
    /// Whether the class is an enterprise component
    fn classify(&self, descriptor: &TypeDescriptor) -> bool;
}

/// Everything a successful deployment produces
#[derive(Debug, Default)]
pub struct Deployment {
    pub(crate) universe: TypeUniverse,
    pub(crate) catalog: AnnotationCatalog,
    pub(crate) stereotypes: StereotypeRegistry,
    pub(crate) registry: BeanRegistry,
    pub(crate) declarative: DeclarativeConfig,
    pub(crate) specializations: Vec<SpecializationEdge>,
}

impl Deployment {
    /// Types of the deployment, including extension-added ones
    #[inline]
    #[must_use]
    pub fn universe(&self) -> &TypeUniverse {
        &self.universe
    }

    /// Deployed beans
    #[inline]
    #[must_use]
    pub fn registry(&self) -> &BeanRegistry {
        &self.registry
    }

    /// Known stereotypes
    #[inline]
    #[must_use]
    pub fn stereotypes(&self) -> &StereotypeRegistry {
        &self.stereotypes
    }

    /// Merged manifests
    #[inline]
    #[must_use]
    pub fn declarative(&self) -> &DeclarativeConfig {
        &self.declarative
    }

    /// Applied specializations
    #[inline]
    #[must_use]
    pub fn specializations(&self) -> &[SpecializationEdge] {
        &self.specializations
    }
}

fn at(phase: DeploymentPhase) -> impl FnOnce(ContainerError) -> DeploymentError {
    move |source| DeploymentError::new(phase, source)
}

/// One run of the deployment pipeline
pub(crate) struct Deployer<'a> {
    config: &'a ContainerConfig,
    extensions: &'a [Arc<dyn Extension>],
    naming: &'a dyn NamingService,
    classifier: Option<&'a dyn EnterpriseClassifier>,
    reference: ManagerReference,
    observers: ObserverRegistry,
    state: Deployment,
    interceptor_sequence: usize,
    decorator_sequence: usize,
    custom_classes: HashSet<TypeName>,
    declared_classes: HashSet<TypeName>,
    declarative_specializers: Vec<TypeName>,
    extension_types: Vec<TypeDescriptor>,
    vetoed: HashSet<TypeName>,
}

impl<'a> Deployer<'a> {
    pub(crate) fn new(
        config: &'a ContainerConfig,
        extensions: &'a [Arc<dyn Extension>],
        naming: &'a dyn NamingService,
        classifier: Option<&'a dyn EnterpriseClassifier>,
        reference: ManagerReference,
    ) -> Self {
        Self {
            config,
            extensions,
            naming,
            classifier,
            reference,
            observers: ObserverRegistry::new(),
            state: Deployment::default(),
            interceptor_sequence: 0,
            decorator_sequence: 0,
            custom_classes: HashSet::new(),
            declared_classes: HashSet::new(),
            declarative_specializers: Vec::new(),
            extension_types: Vec::new(),
            vetoed: HashSet::new(),
        }
    }

    pub(crate) fn run(mut self, discovery: &dyn Discovery) -> Result<Deployment, DeploymentError> {
        let candidates = discovery.candidates();
        info!(
            candidates = candidates.len(),
            resources = discovery.declarative_resources().len(),
            extensions = self.extensions.len(),
            "deployment started"
        );
        self.state.universe = discovery.universe().clone();
        self.state.stereotypes.register_builtins();

        self.load_extensions();
        self.bind_manager().map_err(at(DeploymentPhase::BindManager))?;
        builtin::register_manager(&mut self.state.registry);
        self.before_discovery().map_err(at(DeploymentPhase::BeforeDiscovery))?;
        self.deploy_declarative(discovery.declarative_resources())
            .map_err(at(DeploymentPhase::DeclarativeDeployment))?;
        self.validate_stereotypes(candidates)
            .map_err(at(DeploymentPhase::StereotypeValidation))?;
        self.register_default_beans();
        self.deploy_classpath(candidates)
            .map_err(at(DeploymentPhase::ClasspathDeployment))?;
        self.deploy_extension_types()
            .map_err(at(DeploymentPhase::ExtensionTypes))?;
        self.specialize(candidates).map_err(at(DeploymentPhase::Specialization))?;
        self.observers
            .fire_after_discovery(&self.state.registry)
            .map_err(at(DeploymentPhase::AfterDiscovery))?;
        self.build_stacks().map_err(at(DeploymentPhase::StackBuilding))?;
        self.validate().map_err(at(DeploymentPhase::Validation))?;
        self.observers
            .fire_after_validation(&self.state.registry)
            .map_err(at(DeploymentPhase::AfterValidation))?;

        info!(
            beans = self.state.registry.len(),
            enabled = self.state.registry.enabled().count(),
            specializations = self.state.specializations.len(),
            "deployment finished"
        );
        Ok(self.state)
    }

    fn load_extensions(&mut self) {
        for extension in self.extensions {
            extension.register(&mut self.observers);
            debug!(extension = extension.name(), "extension loaded");
        }
    }

    fn bind_manager(&self) -> Result<(), ContainerError> {
        if !self.config.naming.bind_manager {
            debug!("manager binding disabled");
            return Ok(());
        }
        self.naming
            .bind(&self.config.naming.manager_name, Arc::new(self.reference))?;
        info!(name = %self.config.naming.manager_name, "bean manager bound");
        Ok(())
    }

    fn before_discovery(&mut self) -> Result<(), ContainerError> {
        let mut event = BeforeBeanDiscovery::default();
        self.observers.fire_before_discovery(&mut event)?;

        for qualifier in event.qualifiers {
            self.state.catalog.register_qualifier(qualifier);
        }
        for (scope, info) in event.scopes {
            self.state.catalog.register_scope(scope, info);
        }
        for binding in event.interceptor_bindings {
            self.state.catalog.register_interceptor_binding(binding);
        }
        for model in event.stereotypes {
            self.state.stereotypes.insert(model);
        }
        for interceptor in event.interceptors {
            self.add_custom_interceptor(interceptor)?;
        }
        for decorator in event.decorators {
            self.add_custom_decorator(decorator)?;
        }
        self.extension_types = event.annotated_types;
        Ok(())
    }

    fn custom_types(&self, class: &TypeName) -> Result<BTreeSet<TypeRef>, ContainerError> {
        if self.state.universe.contains(class) {
            Ok(self
                .state
                .universe
                .type_closure(class)?
                .into_iter()
                .map(TypeRef::Object)
                .collect())
        } else {
            Ok(BTreeSet::from([TypeRef::Object(class.clone()), TypeRef::root()]))
        }
    }

    fn add_custom_interceptor(
        &mut self,
        interceptor: CustomInterceptor,
    ) -> Result<(), ContainerError> {
        if interceptor.bindings.is_empty() {
            return Err(ContainerError::configuration(format!(
                "custom interceptor {} declares no interceptor binding",
                interceptor.class
            )));
        }
        let mut component = ComponentDescriptor::new(interceptor.class.clone());
        component.interceptor_bindings = interceptor.bindings.clone();
        let types = self.custom_types(&interceptor.class)?;
        let mut record = BeanRecord::from_component(
            self.state.registry.next_id(),
            BeanKind::Interceptor,
            BeanSource::Extension,
            &component,
            types,
            TypeName::from_static(wellknown::DEPENDENT),
        );
        let order = self.next_interceptor();
        record.interceptor = Some(InterceptorMeta {
            bindings: interceptor.bindings,
            interception_types: interceptor.interception_types,
            declared_priority: interceptor.priority,
            discovery_order: order,
            priority: interceptor.priority,
            declaration_order: order,
            custom: true,
        });
        debug!(class = %interceptor.class, "custom interceptor registered");
        self.custom_classes.insert(interceptor.class);
        self.state.registry.add(record);
        Ok(())
    }

    fn add_custom_decorator(&mut self, decorator: CustomDecorator) -> Result<(), ContainerError> {
        let mut delegate = InjectionPoint::new(
            decorator.class.clone(),
            InjectionMember::Field {
                name: "delegate".to_string(),
            },
            decorator.delegate_type.clone(),
        )
        .as_delegate();
        delegate.qualifiers = decorator.delegate_qualifiers;

        let universe = &self.state.universe;
        let closure = universe.type_closure(&decorator.class).unwrap_or_default();
        let mut decorated_types: BTreeSet<TypeName> = closure
            .into_iter()
            .filter(|t| t.as_str() != wellknown::SERIALIZABLE)
            .filter(|t| universe.get(t).is_some_and(TypeDescriptor::is_interface))
            .collect();
        if decorated_types.is_empty() {
            decorated_types.extend(decorator.delegate_type.as_object().cloned());
        }

        let mut component = ComponentDescriptor::new(decorator.class.clone());
        component.injection_points.push(delegate.clone());
        let types = self.custom_types(&decorator.class)?;
        let mut record = BeanRecord::from_component(
            self.state.registry.next_id(),
            BeanKind::Decorator,
            BeanSource::Extension,
            &component,
            types,
            TypeName::from_static(wellknown::DEPENDENT),
        );
        let order = self.next_decorator();
        record.decorator = Some(DecoratorMeta {
            delegate,
            decorated_types,
            declared_priority: decorator.priority,
            discovery_order: order,
            priority: decorator.priority,
            declaration_order: order,
            custom: true,
        });
        debug!(class = %decorator.class, "custom decorator registered");
        self.custom_classes.insert(decorator.class);
        self.state.registry.add(record);
        Ok(())
    }

    fn next_interceptor(&mut self) -> usize {
        self.interceptor_sequence += 1;
        self.interceptor_sequence - 1
    }

    fn next_decorator(&mut self) -> usize {
        self.decorator_sequence += 1;
        self.decorator_sequence - 1
    }

    fn deploy_declarative(
        &mut self,
        resources: &[DeclarativeResource],
    ) -> Result<(), ContainerError> {
        for resource in resources {
            let manifest = Manifest::parse(resource)?;
            manifest.validate(&resource.locator, &self.state.universe)?;
            debug!(locator = %resource.locator, "manifest merged");
            self.state.declarative.merge(manifest);
        }
        let declared: Vec<DeclaredBean> = self.state.declarative.beans().to_vec();
        for bean in &declared {
            let descriptor = self.state.universe.require(&bean.class)?.clone();
            self.declared_classes.insert(bean.class.clone());
            if bean.specializes {
                self.declarative_specializers.push(bean.class.clone());
            }
            self.define(&descriptor, BeanSource::Declarative, Some(bean))?;
        }
        info!(
            interceptors = self.state.declarative.interceptor_count(),
            decorators = self.state.declarative.decorator_count(),
            alternatives = self.state.declarative.alternatives().len(),
            beans = declared.len(),
            "declarative configuration deployed"
        );
        Ok(())
    }

    fn validate_stereotypes(&mut self, candidates: &[TypeName]) -> Result<(), ContainerError> {
        let universe = &self.state.universe;
        let mut annotation_types: BTreeSet<TypeName> = universe
            .iter()
            .filter(|t| t.is_annotation() && t.has_annotation(wellknown::STEREOTYPE))
            .map(|t| t.name.clone())
            .collect();
        for candidate in candidates {
            if let Some(descriptor) = universe.get(candidate) {
                let used = descriptor.annotations.iter().map(|a| a.annotation_type.clone());
                annotation_types.extend(used);
            }
        }
        for annotation_type in &annotation_types {
            self.state
                .stereotypes
                .classify(universe, &self.state.catalog, annotation_type)?;
        }
        debug!(stereotypes = self.state.stereotypes.len(), "stereotypes validated");
        Ok(())
    }

    fn register_default_beans(&mut self) {
        builtin::register_defaults(&mut self.state.registry);
        let universe = &self.state.universe;
        builtin::register_platform(&mut self.state.registry, self.config.platform, |contract| {
            universe.contains(contract)
        });
    }

    fn deploy_classpath(&mut self, candidates: &[TypeName]) -> Result<(), ContainerError> {
        let before = self.state.registry.len();
        for class in candidates {
            if self.custom_classes.contains(class) || self.declared_classes.contains(class) {
                debug!(%class, "deployed elsewhere, skipped in scan");
                continue;
            }
            let descriptor = self.state.universe.require(class)?.clone();
            self.deploy_type(descriptor, BeanSource::Classpath)?;
        }
        info!(
            beans = self.state.registry.len() - before,
            vetoed = self.vetoed.len(),
            "classpath deployed"
        );
        Ok(())
    }

    fn deploy_extension_types(&mut self) -> Result<(), ContainerError> {
        for descriptor in std::mem::take(&mut self.extension_types) {
            if self.state.registry.contains_class(&descriptor.name) {
                debug!(class = %descriptor.name, "extension type already deployed");
                continue;
            }
            self.state.universe.insert(descriptor.clone());
            self.deploy_type(descriptor, BeanSource::Extension)?;
        }
        Ok(())
    }

    /// Offer a type to observers, then define it unless vetoed
    fn deploy_type(
        &mut self,
        descriptor: TypeDescriptor,
        source: BeanSource,
    ) -> Result<(), ContainerError> {
        if descriptor.is_annotation() {
            return Ok(());
        }
        let mut annotated = AnnotatedType::new(descriptor);
        if !self.observers.fire_process_annotated_type(&mut annotated)? {
            debug!(class = %annotated.name(), "vetoed");
            self.vetoed.insert(annotated.name().clone());
            return Ok(());
        }
        let descriptor = annotated.into_descriptor();
        self.state.universe.insert(descriptor.clone());
        self.define(&descriptor, source, None)
    }

    fn alternative_enabled(&self, component: &ComponentDescriptor) -> bool {
        let declarative = &self.state.declarative;
        component.priority.is_some()
            || declarative.is_alternative_enabled(&component.type_name)
            || component.stereotypes.iter().any(|s| {
                declarative.is_alternative_enabled(s)
                    && self.state.stereotypes.get(s).is_some_and(|m| m.alternative)
            })
    }

    /// Define the beans of one class
    fn define(
        &mut self,
        descriptor: &TypeDescriptor,
        source: BeanSource,
        declared: Option<&DeclaredBean>,
    ) -> Result<(), ContainerError> {
        let is_interceptor = descriptor.has_annotation(wellknown::INTERCEPTOR);
        let is_decorator = descriptor.has_annotation(wellknown::DECORATOR);
        let mut definer = BeanDefiner::new(
            &self.state.universe,
            &self.state.catalog,
            &mut self.state.stereotypes,
        );
        let injectable = definer.is_injectable(descriptor)?;

        let kind = if is_interceptor {
            BeanKind::Interceptor
        } else if is_decorator {
            BeanKind::Decorator
        } else if injectable {
            BeanKind::ManagedBean
        } else if self.config.enterprise_discovery
            && self.classifier.is_some_and(|c| c.classify(descriptor))
        {
            BeanKind::Enterprise
        } else {
            debug!(class = %descriptor.name, "not a bean");
            return Ok(());
        };

        let mut component = definer.component(descriptor)?;
        if let Some(declared) = declared {
            apply_declaration(&mut component, declared, &self.state.catalog, &self.state.universe)?;
        }
        let types = definer.class_types(&descriptor.name)?;
        let producers = if kind == BeanKind::ManagedBean {
            definer.producers(descriptor)?
        } else {
            Vec::new()
        };
        let interceptor = if kind == BeanKind::Interceptor {
            Some(definer.interceptor_meta(descriptor, &component, self.interceptor_sequence)?)
        } else {
            None
        };
        let decorator = if kind == BeanKind::Decorator {
            Some(definer.decorator_meta(descriptor, &component, self.decorator_sequence)?)
        } else {
            None
        };
        if interceptor.is_some() {
            self.interceptor_sequence += 1;
        }
        if decorator.is_some() {
            self.decorator_sequence += 1;
        }

        let scope = component
            .scope
            .clone()
            .unwrap_or_else(|| TypeName::from_static(wellknown::DEPENDENT));
        let mut record = BeanRecord::from_component(
            self.state.registry.next_id(),
            kind,
            source,
            &component,
            types,
            scope,
        );
        record.interceptor = interceptor;
        record.decorator = decorator;
        if component.alternative {
            record.enabled = self.alternative_enabled(&component);
        }
        let declaring_enabled = record.enabled;
        let declaring = self.state.registry.add(record);
        debug!(class = %descriptor.name, ?kind, enabled = declaring_enabled, "bean defined");

        for producer in producers {
            let mut record = BeanRecord::from_component(
                self.state.registry.next_id(),
                BeanKind::Producer,
                source,
                &producer.component,
                producer.types,
                producer.scope,
            );
            record.producer = Some(ProducerMeta {
                declaring_bean: declaring,
                member: producer.member,
                member_kind: producer.member_kind,
            });
            let component = &producer.component;
            record.enabled = declaring_enabled
                && (!component.alternative || self.alternative_enabled(component));
            debug!(bean = %record, "producer defined");
            self.state.registry.add(record);
        }
        Ok(())
    }

    fn specialize(&mut self, candidates: &[TypeName]) -> Result<(), ContainerError> {
        let universe = &self.state.universe;
        let extension_classes: Vec<TypeName> = self
            .state
            .registry
            .iter()
            .filter(|b| b.source == BeanSource::Extension)
            .map(|b| b.bean_class.clone())
            .collect();
        let classpath: Vec<TypeName> = candidates
            .iter()
            .chain(&extension_classes)
            .filter(|c| !self.declared_classes.contains(*c) && !self.vetoed.contains(*c))
            .filter(|c| universe.get(c).is_some_and(|d| d.has_annotation(wellknown::SPECIALIZES)))
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let mut edges =
            specialization::collect(universe, &classpath, SpecializationSource::Classpath)?;
        edges.extend(specialization::collect(
            universe,
            &self.declarative_specializers,
            SpecializationSource::Declarative,
        )?);
        let applied = specialization::apply(universe, &mut self.state.registry, &edges)?;
        info!(specializations = applied.len(), "specialization applied");
        self.state.specializations = applied;
        Ok(())
    }

    fn build_stacks(&mut self) -> Result<(), ContainerError> {
        resolve_enablement(&mut self.state.registry, &self.state.declarative);
        let planned = StackBuilder::new(&self.state.universe, &self.state.catalog)
            .build(&mut self.state.registry)?;
        info!(
            interceptors = self.state.registry.interceptors().count(),
            decorators = self.state.registry.decorators().count(),
            planned,
            "interceptor and decorator stacks built"
        );
        Ok(())
    }

    fn validate(&self) -> Result<(), ContainerError> {
        Validator::new(
            &self.state.universe,
            &self.state.catalog,
            &self.state.stereotypes,
            &self.state.registry,
            &self.state.declarative,
        )
        .validate()
    }
}

/// Apply a manifest declaration over the annotations of a class
fn apply_declaration(
    component: &mut ComponentDescriptor,
    declared: &DeclaredBean,
    catalog: &AnnotationCatalog,
    universe: &TypeUniverse,
) -> Result<(), ContainerError> {
    if let Some(name) = &declared.name {
        component.qualifiers.retain(|q| !q.is(wellknown::NAMED));
        component.qualifiers.insert(AnnotationUse::named(name.clone()));
        component.name = Some(name.clone());
    }
    if let Some(scope) = &declared.scope {
        if !catalog.is_scope(universe, scope) {
            return Err(ContainerError::configuration(format!(
                "declared bean {} uses {scope}, which is not a scope",
                declared.class
            )));
        }
        component.scope = Some(scope.clone());
    }
    component.alternative |= declared.alternative;
    component.specializes |= declared.specializes;
    Ok(())
}
