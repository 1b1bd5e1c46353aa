//! Extension events and observers
//!
//! Extensions register typed callbacks for four checkpoints. Before-discovery
//! and per-type callbacks abort deployment on the first error; the two
//! after-* checkpoints run every observer and report accumulated errors
//! together.

use crate::annotations::ScopeInfo;
use crate::error::{Checkpoint, ContainerError};
use crate::registry::BeanRegistry;
use beanstalk_model::{
    AnnotationUse, InterceptionType, StereotypeModel, TypeDescriptor, TypeName, TypeRef,
};
use std::collections::BTreeSet;
use std::fmt;

/// Outcome of a per-type observer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Keep processing the type
    Continue,
    /// Drop the type silently
    Veto,
    /// Abort deployment
    Error(String),
}

/// Interceptor class registered by an extension instead of annotations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomInterceptor {
    /// Interceptor class
    pub class: TypeName,
    /// Bindings it applies to
    pub bindings: BTreeSet<AnnotationUse>,
    /// Supported interception kinds
    pub interception_types: BTreeSet<InterceptionType>,
    /// Priority
    pub priority: Option<i32>,
}

/// Decorator class registered by an extension instead of annotations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomDecorator {
    /// Decorator class
    pub class: TypeName,
    /// Delegate type
    pub delegate_type: TypeRef,
    /// Delegate qualifiers
    pub delegate_qualifiers: BTreeSet<AnnotationUse>,
    /// Priority
    pub priority: Option<i32>,
}

/// Before-discovery event: extensions add metadata the scan cannot see
#[derive(Debug, Clone, Default)]
pub struct BeforeBeanDiscovery {
    pub(crate) annotated_types: Vec<TypeDescriptor>,
    pub(crate) qualifiers: Vec<TypeName>,
    pub(crate) scopes: Vec<(TypeName, ScopeInfo)>,
    pub(crate) interceptor_bindings: Vec<TypeName>,
    pub(crate) stereotypes: Vec<StereotypeModel>,
    pub(crate) interceptors: Vec<CustomInterceptor>,
    pub(crate) decorators: Vec<CustomDecorator>,
}

impl BeforeBeanDiscovery {
    /// Contribute a type to deploy after the classpath scan
    pub fn add_annotated_type(&mut self, descriptor: TypeDescriptor) {
        self.annotated_types.push(descriptor);
    }

    /// Declare an annotation type as a qualifier
    pub fn add_qualifier(&mut self, annotation_type: TypeName) {
        self.qualifiers.push(annotation_type);
    }

    /// Declare an annotation type as a scope
    pub fn add_scope(&mut self, annotation_type: TypeName, normal: bool, passivating: bool) {
        self.scopes.push((annotation_type, ScopeInfo { normal, passivating }));
    }

    /// Declare an annotation type as an interceptor binding
    pub fn add_interceptor_binding(&mut self, annotation_type: TypeName) {
        self.interceptor_bindings.push(annotation_type);
    }

    /// Declare a stereotype
    pub fn add_stereotype(&mut self, model: StereotypeModel) {
        self.stereotypes.push(model);
    }

    /// Register an interceptor class; the scan will skip it
    pub fn add_interceptor(&mut self, interceptor: CustomInterceptor) {
        self.interceptors.push(interceptor);
    }

    /// Register a decorator class; the scan will skip it
    pub fn add_decorator(&mut self, decorator: CustomDecorator) {
        self.decorators.push(decorator);
    }
}

/// Mutable view of a discovered type, offered to per-type observers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotatedType {
    descriptor: TypeDescriptor,
}

impl AnnotatedType {
    /// View over a descriptor
    #[must_use]
    pub fn new(descriptor: TypeDescriptor) -> Self {
        Self { descriptor }
    }

    /// Type name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &TypeName {
        &self.descriptor.name
    }

    /// Current descriptor
    #[inline]
    #[must_use]
    pub fn descriptor(&self) -> &TypeDescriptor {
        &self.descriptor
    }

    /// Type-level annotations
    #[inline]
    #[must_use]
    pub fn annotations(&self) -> &[AnnotationUse] {
        &self.descriptor.annotations
    }

    /// Add a type-level annotation
    pub fn add_annotation(&mut self, annotation: AnnotationUse) {
        self.descriptor.annotations.push(annotation);
    }

    /// Remove every type-level annotation of a type; returns how many were removed
    pub fn remove_annotation(&mut self, annotation_type: &str) -> usize {
        let before = self.descriptor.annotations.len();
        self.descriptor.annotations.retain(|a| !a.is(annotation_type));
        before - self.descriptor.annotations.len()
    }

    /// Take the descriptor back
    #[must_use]
    pub fn into_descriptor(self) -> TypeDescriptor {
        self.descriptor
    }
}

/// After-discovery event
pub struct AfterBeanDiscovery<'a> {
    beans: &'a BeanRegistry,
    errors: Vec<String>,
}

impl<'a> AfterBeanDiscovery<'a> {
    pub(crate) fn new(beans: &'a BeanRegistry) -> Self {
        Self {
            beans,
            errors: Vec::new(),
        }
    }

    /// Every bean defined so far
    #[inline]
    #[must_use]
    pub fn beans(&self) -> &BeanRegistry {
        self.beans
    }

    /// Report a definition error; deployment aborts after all observers ran
    pub fn add_definition_error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }
}

/// After-validation event
pub struct AfterDeploymentValidation<'a> {
    beans: &'a BeanRegistry,
    errors: Vec<String>,
}

impl<'a> AfterDeploymentValidation<'a> {
    pub(crate) fn new(beans: &'a BeanRegistry) -> Self {
        Self {
            beans,
            errors: Vec::new(),
        }
    }

    /// Every validated bean
    #[inline]
    #[must_use]
    pub fn beans(&self) -> &BeanRegistry {
        self.beans
    }

    /// Report a deployment problem; deployment aborts after all observers ran
    pub fn add_deployment_problem(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }
}

type BeforeDiscoveryObserver =
    Box<dyn Fn(&mut BeforeBeanDiscovery) -> Result<(), String> + Send + Sync>;
type AnnotatedTypeObserver = Box<dyn Fn(&mut AnnotatedType) -> Verdict + Send + Sync>;
type AfterDiscoveryObserver = Box<dyn Fn(&mut AfterBeanDiscovery<'_>) + Send + Sync>;
type AfterValidationObserver = Box<dyn Fn(&mut AfterDeploymentValidation<'_>) + Send + Sync>;

/// Observer callbacks registered by extensions, per checkpoint
#[derive(Default)]
pub struct ObserverRegistry {
    before_discovery: Vec<BeforeDiscoveryObserver>,
    process_annotated_type: Vec<AnnotatedTypeObserver>,
    after_discovery: Vec<AfterDiscoveryObserver>,
    after_validation: Vec<AfterValidationObserver>,
}

impl fmt::Debug for ObserverRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObserverRegistry")
            .field("before_discovery", &self.before_discovery.len())
            .field("process_annotated_type", &self.process_annotated_type.len())
            .field("after_discovery", &self.after_discovery.len())
            .field("after_validation", &self.after_validation.len())
            .finish()
    }
}

impl ObserverRegistry {
    /// Empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Observe the before-discovery checkpoint
    pub fn on_before_discovery<F>(&mut self, observer: F)
    where
        F: Fn(&mut BeforeBeanDiscovery) -> Result<(), String> + Send + Sync + 'static,
    {
        self.before_discovery.push(Box::new(observer));
    }

    /// Observe every discovered type
    pub fn on_process_annotated_type<F>(&mut self, observer: F)
    where
        F: Fn(&mut AnnotatedType) -> Verdict + Send + Sync + 'static,
    {
        self.process_annotated_type.push(Box::new(observer));
    }

    /// Observe the after-discovery checkpoint
    pub fn on_after_discovery<F>(&mut self, observer: F)
    where
        F: Fn(&mut AfterBeanDiscovery<'_>) + Send + Sync + 'static,
    {
        self.after_discovery.push(Box::new(observer));
    }

    /// Observe the after-validation checkpoint
    pub fn on_after_validation<F>(&mut self, observer: F)
    where
        F: Fn(&mut AfterDeploymentValidation<'_>) + Send + Sync + 'static,
    {
        self.after_validation.push(Box::new(observer));
    }

    /// Total number of observers
    #[must_use]
    pub fn len(&self) -> usize {
        self.before_discovery.len()
            + self.process_annotated_type.len()
            + self.after_discovery.len()
            + self.after_validation.len()
    }

    /// Whether no observer is registered
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fire before-discovery; the first error aborts
    ///
    /// # Errors
    /// Returns [`ContainerError::Observer`] with the failing observer's message.
    pub fn fire_before_discovery(
        &self,
        event: &mut BeforeBeanDiscovery,
    ) -> Result<(), ContainerError> {
        for observer in &self.before_discovery {
            observer(event).map_err(|message| ContainerError::Observer {
                checkpoint: Checkpoint::BeforeBeanDiscovery,
                errors: vec![message],
            })?;
        }
        Ok(())
    }

    /// Fire the per-type event; returns `false` if the type was vetoed
    ///
    /// A veto skips the remaining observers.
    ///
    /// # Errors
    /// Returns [`ContainerError::Observer`] when an observer answers
    /// [`Verdict::Error`].
    pub fn fire_process_annotated_type(
        &self,
        annotated: &mut AnnotatedType,
    ) -> Result<bool, ContainerError> {
        for observer in &self.process_annotated_type {
            match observer(annotated) {
                Verdict::Continue => {}
                Verdict::Veto => return Ok(false),
                Verdict::Error(message) => {
                    return Err(ContainerError::Observer {
                        checkpoint: Checkpoint::ProcessAnnotatedType,
                        errors: vec![format!("{}: {message}", annotated.name())],
                    })
                }
            }
        }
        Ok(true)
    }

    /// Fire after-discovery and check the accumulator
    ///
    /// # Errors
    /// Returns [`ContainerError::Observer`] carrying every reported error.
    pub fn fire_after_discovery(&self, beans: &BeanRegistry) -> Result<(), ContainerError> {
        let mut event = AfterBeanDiscovery::new(beans);
        for observer in &self.after_discovery {
            observer(&mut event);
        }
        accumulated(Checkpoint::AfterBeanDiscovery, event.errors)
    }

    /// Fire after-validation and check the accumulator
    ///
    /// # Errors
    /// Returns [`ContainerError::Observer`] carrying every reported problem.
    pub fn fire_after_validation(&self, beans: &BeanRegistry) -> Result<(), ContainerError> {
        let mut event = AfterDeploymentValidation::new(beans);
        for observer in &self.after_validation {
            observer(&mut event);
        }
        accumulated(Checkpoint::AfterDeploymentValidation, event.errors)
    }
}

fn accumulated(checkpoint: Checkpoint, errors: Vec<String>) -> Result<(), ContainerError> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ContainerError::Observer { checkpoint, errors })
    }
}

/// Pluggable container extension
pub trait Extension: Send + Sync {
    /// Name used in logs
    fn name(&self) -> &str;

    /// Register observers
    fn register(&self, observers: &mut ObserverRegistry);
}

#[cfg(test)]
mod tests {
    use super::*;
    use beanstalk_model::TypeKind;

    fn pojo() -> AnnotatedType {
        AnnotatedType::new(TypeDescriptor::new(
            TypeName::new("com.acme.Pojo").unwrap(),
            TypeKind::Class,
        ))
    }

    #[test]
    fn veto_skips_later_observers() {
        let mut observers = ObserverRegistry::new();
        observers.on_process_annotated_type(|_| Verdict::Veto);
        observers.on_process_annotated_type(|_| Verdict::Error("unreachable".into()));
        assert!(!observers.fire_process_annotated_type(&mut pojo()).unwrap());
    }

    #[test]
    fn observers_can_rewrite_annotations() {
        let mut observers = ObserverRegistry::new();
        observers.on_process_annotated_type(|at| {
            at.add_annotation(AnnotationUse::named("pojo"));
            Verdict::Continue
        });
        let mut at = pojo();
        assert!(observers.fire_process_annotated_type(&mut at).unwrap());
        assert_eq!(at.annotations().len(), 1);
        assert_eq!(at.remove_annotation(beanstalk_model::wellknown::NAMED), 1);
    }

    #[test]
    fn per_type_error_names_the_type() {
        let mut observers = ObserverRegistry::new();
        observers.on_process_annotated_type(|_| Verdict::Error("not allowed".into()));
        let err = observers.fire_process_annotated_type(&mut pojo()).unwrap_err();
        assert!(err.to_string().contains("com.acme.Pojo: not allowed"));
    }

    #[test]
    fn after_discovery_errors_accumulate() {
        let mut observers = ObserverRegistry::new();
        observers.on_after_discovery(|e| e.add_definition_error("first"));
        observers.on_after_discovery(|e| e.add_definition_error("second"));
        let err = observers.fire_after_discovery(&BeanRegistry::new()).unwrap_err();
        assert_eq!(
            err,
            ContainerError::Observer {
                checkpoint: Checkpoint::AfterBeanDiscovery,
                errors: vec!["first".into(), "second".into()],
            }
        );
        assert_eq!(observers.len(), 2);
    }

    #[test]
    fn before_discovery_error_aborts() {
        let mut observers = ObserverRegistry::new();
        observers.on_before_discovery(|_| Err("boom".into()));
        let err = observers
            .fire_before_discovery(&mut BeforeBeanDiscovery::default())
            .unwrap_err();
        assert!(matches!(
            err,
            ContainerError::Observer {
                checkpoint: Checkpoint::BeforeBeanDiscovery,
                ..
            }
        ));
    }
}
