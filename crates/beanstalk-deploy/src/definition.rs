//! Bean definition
//!
//! Turns type descriptors into component descriptors and bean records:
//! the injectable predicate, name and scope resolution, injection point
//! extraction, producer members, and interceptor and decorator metadata.

use crate::annotations::AnnotationCatalog;
use crate::error::ContainerError;
use crate::stereotype::StereotypeRegistry;
use beanstalk_model::{
    find_annotation, wellknown, AnnotationUse, ComponentDescriptor, DecoratorMeta, InjectionMember,
    InjectionPoint, InterceptionType, InterceptorMeta, ParameterDescriptor, ProducerMember,
    TypeDescriptor, TypeKind, TypeName, TypeRef, TypeUniverse,
};
use std::collections::BTreeSet;

/// Lower-case the first character of a simple name
#[must_use]
pub fn decapitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Property name of a producer member: `getPrice` and `isOpen` become
/// `price` and `open`
#[must_use]
pub fn property_name(member: &str) -> String {
    for prefix in ["get", "is"] {
        if let Some(rest) = member.strip_prefix(prefix) {
            if rest.chars().next().is_some_and(char::is_uppercase) {
                return decapitalize(rest);
            }
        }
    }
    member.to_string()
}

/// Metadata read off one annotation list
#[derive(Debug, Clone, Default)]
struct Declared {
    qualifiers: BTreeSet<AnnotationUse>,
    stereotypes: BTreeSet<TypeName>,
    bindings: BTreeSet<AnnotationUse>,
    scope: Option<TypeName>,
    named: Option<String>,
    name_defaulting: bool,
    alternative: bool,
    priority: Option<i32>,
}

/// Producer member turned into a component
#[derive(Debug, Clone)]
pub struct ProducerDefinition {
    /// Component of the produced bean; its type is the declaring class
    pub component: ComponentDescriptor,
    /// Bean types of the produced value
    pub types: BTreeSet<TypeRef>,
    /// Resolved scope
    pub scope: TypeName,
    /// Member name
    pub member: String,
    /// Method or field
    pub member_kind: ProducerMember,
}

/// Definition rules over one universe
#[derive(Debug)]
pub struct BeanDefiner<'a> {
    universe: &'a TypeUniverse,
    catalog: &'a AnnotationCatalog,
    stereotypes: &'a mut StereotypeRegistry,
}

impl<'a> BeanDefiner<'a> {
    /// Definer over a universe and the container's registries
    pub fn new(
        universe: &'a TypeUniverse,
        catalog: &'a AnnotationCatalog,
        stereotypes: &'a mut StereotypeRegistry,
    ) -> Self {
        Self {
            universe,
            catalog,
            stereotypes,
        }
    }

    /// Whether a type can be a managed bean
    ///
    /// A concrete top-level or static nested class (abstract only for
    /// decorators), not vetoed, with a no-arg constructor or exactly one
    /// `@Inject` constructor.
    ///
    /// # Errors
    /// Returns [`ContainerError::Configuration`] for more than one `@Inject`
    /// constructor.
    pub fn is_injectable(&self, descriptor: &TypeDescriptor) -> Result<bool, ContainerError> {
        if descriptor.kind != TypeKind::Class || descriptor.inner {
            return Ok(false);
        }
        if descriptor.has_annotation(wellknown::VETOED) {
            return Ok(false);
        }
        if descriptor.is_abstract() && !descriptor.has_annotation(wellknown::DECORATOR) {
            return Ok(false);
        }
        match descriptor.inject_constructors().count() {
            0 => Ok(descriptor.has_no_arg_constructor()),
            1 => Ok(true),
            n => Err(ContainerError::configuration(format!(
                "{} declares {n} @Inject constructors",
                descriptor.name
            ))),
        }
    }

    /// Bean types of a class: its type closure
    ///
    /// # Errors
    /// Fails if the class is unknown.
    pub fn class_types(&self, class: &TypeName) -> Result<BTreeSet<TypeRef>, ContainerError> {
        Ok(self
            .universe
            .type_closure(class)?
            .into_iter()
            .map(TypeRef::Object)
            .collect())
    }

    /// Bean types of a produced value
    ///
    /// # Errors
    /// Returns [`ContainerError::Configuration`] for `void`.
    pub fn value_types(&self, produced: &TypeRef) -> Result<BTreeSet<TypeRef>, ContainerError> {
        match produced.boxed() {
            TypeRef::Void => Err(ContainerError::configuration("a producer cannot produce void")),
            TypeRef::Object(name) if self.universe.contains(&name) => self.class_types(&name),
            other => Ok(BTreeSet::from([other, TypeRef::root()])),
        }
    }

    /// Whether a class implements the serialization marker
    #[must_use]
    pub fn is_serializable(&self, class: &TypeName) -> bool {
        self.universe
            .type_closure(class)
            .is_ok_and(|closure| closure.contains(wellknown::SERIALIZABLE))
    }

    fn declared(
        &mut self,
        owner: &str,
        annotations: &[AnnotationUse],
    ) -> Result<Declared, ContainerError> {
        let mut declared = Declared::default();
        let mut scopes = Vec::new();
        let mut stereotype_scopes = BTreeSet::new();

        for annotation in annotations {
            let annotation_type = &annotation.annotation_type;
            if annotation.is(wellknown::NAMED) {
                let value = annotation.text_member("value").unwrap_or_default();
                declared.named = Some(value.to_string());
            } else if self.catalog.is_qualifier(self.universe, annotation_type) {
                declared.qualifiers.insert(annotation.clone());
            } else if self.catalog.is_scope(self.universe, annotation_type) {
                scopes.push(annotation_type.clone());
            } else if self.catalog.is_interceptor_binding(self.universe, annotation_type) {
                declared.bindings.insert(annotation.clone());
            } else if annotation.is(wellknown::ALTERNATIVE) {
                declared.alternative = true;
            } else if annotation.is(wellknown::PRIORITY) {
                declared.priority = annotation
                    .int_member("value")
                    .and_then(|p| i32::try_from(p).ok());
            } else if let Some(model) =
                self.stereotypes.classify(self.universe, self.catalog, annotation_type)?
            {
                declared.bindings.extend(model.interceptor_bindings.iter().cloned());
                declared.name_defaulting |= model.name_defaulting;
                declared.alternative |= model.alternative;
                if let Some(scope) = &model.default_scope {
                    stereotype_scopes.insert(scope.clone());
                }
                declared.stereotypes.insert(model.annotation_type);
            }
        }

        if scopes.len() > 1 {
            let names: Vec<_> = scopes.iter().map(ToString::to_string).collect();
            return Err(ContainerError::configuration(format!(
                "{owner} declares more than one scope: {}",
                names.join(", ")
            )));
        }
        declared.scope = match scopes.pop() {
            Some(scope) => Some(scope),
            None if stereotype_scopes.len() > 1 => {
                let names: Vec<_> = stereotype_scopes.iter().map(ToString::to_string).collect();
                return Err(ContainerError::configuration(format!(
                    "{owner} inherits conflicting default scopes from its stereotypes: {}",
                    names.join(", ")
                )));
            }
            None => stereotype_scopes.pop_first(),
        };
        Ok(declared)
    }

    /// Component descriptor of a class
    ///
    /// # Errors
    /// Fails on scope conflicts, invalid stereotypes and unknown types.
    pub fn component(
        &mut self,
        descriptor: &TypeDescriptor,
    ) -> Result<ComponentDescriptor, ContainerError> {
        let declared = self.declared(descriptor.name.as_str(), &descriptor.annotations)?;
        let default_name = || decapitalize(descriptor.name.simple_name());
        let name = match &declared.named {
            Some(value) if !value.is_empty() => Some(value.clone()),
            Some(_) => Some(default_name()),
            None if declared.name_defaulting => Some(default_name()),
            None => None,
        };

        let mut component = ComponentDescriptor::new(descriptor.name.clone());
        component.qualifiers = declared.qualifiers;
        if let Some(name) = &name {
            component.qualifiers.insert(AnnotationUse::named(name.clone()));
        }
        component.name = name;
        component.stereotypes = declared.stereotypes;
        component.interceptor_bindings = declared.bindings;
        component.scope = Some(
            declared
                .scope
                .unwrap_or_else(|| TypeName::from_static(wellknown::DEPENDENT)),
        );
        component.alternative = declared.alternative;
        component.specializes = descriptor.has_annotation(wellknown::SPECIALIZES);
        component.priority = declared.priority;
        component.passivation_capable = self.is_serializable(&descriptor.name);
        component.injection_points = self.injection_points(descriptor)?;
        Ok(component)
    }

    fn point(
        &self,
        owner: &TypeName,
        member: InjectionMember,
        required_type: TypeRef,
        annotations: &[AnnotationUse],
    ) -> InjectionPoint {
        let mut point = InjectionPoint::new(owner.clone(), member, required_type);
        point.qualifiers = annotations
            .iter()
            .filter(|a| self.catalog.is_qualifier(self.universe, &a.annotation_type))
            .cloned()
            .collect();
        point.delegate = find_annotation(annotations, wellknown::DELEGATE).is_some();
        point
    }

    fn parameter_points(
        &self,
        owner: &TypeName,
        parameters: &[ParameterDescriptor],
        member: impl Fn(usize) -> InjectionMember,
    ) -> Vec<InjectionPoint> {
        parameters
            .iter()
            .enumerate()
            .map(|(index, p)| {
                self.point(owner, member(index), p.param_type.clone(), &p.annotations)
            })
            .collect()
    }

    /// Injection points of a class and its superclasses, superclasses first
    ///
    /// # Errors
    /// Fails if the class is unknown.
    pub fn injection_points(
        &self,
        descriptor: &TypeDescriptor,
    ) -> Result<Vec<InjectionPoint>, ContainerError> {
        let mut levels: Vec<&TypeDescriptor> = self
            .universe
            .superclass_chain(&descriptor.name)?
            .iter()
            .filter(|name| !name.is_root())
            .filter_map(|name| self.universe.get(name))
            .collect();
        levels.reverse();
        levels.push(descriptor);

        let mut points = Vec::new();
        for level in levels {
            for field in &level.fields {
                if !field.has_annotation(wellknown::INJECT) || field.modifiers.is_static() {
                    continue;
                }
                let mut point = self.point(
                    &level.name,
                    InjectionMember::Field {
                        name: field.name.clone(),
                    },
                    field.field_type.clone(),
                    &field.annotations,
                );
                point.transient = field.modifiers.is_transient();
                points.push(point);
            }
            if std::ptr::eq(level, descriptor) {
                if let Some(constructor) = level.inject_constructors().next() {
                    let parameters = &constructor.parameters;
                    points.extend(self.parameter_points(&level.name, parameters, |index| {
                        InjectionMember::ConstructorParameter { index }
                    }));
                }
            }
            for method in &level.methods {
                if method.has_annotation(wellknown::INJECT) && !method.modifiers.is_static() {
                    points.extend(self.parameter_points(&level.name, &method.parameters, |index| {
                        InjectionMember::MethodParameter {
                            method: method.name.clone(),
                            index,
                        }
                    }));
                }
            }
        }
        Ok(points)
    }

    /// Producer members declared by a class
    ///
    /// # Errors
    /// Fails on scope conflicts and void producers.
    pub fn producers(
        &mut self,
        descriptor: &TypeDescriptor,
    ) -> Result<Vec<ProducerDefinition>, ContainerError> {
        let mut producers = Vec::new();
        for method in &descriptor.methods {
            if !method.has_annotation(wellknown::PRODUCES) {
                continue;
            }
            let owner = format!("{}.{}()", descriptor.name, method.name);
            let mut definition = self.producer(
                descriptor,
                &owner,
                &method.name,
                ProducerMember::Method,
                &method.return_type,
                &method.annotations,
            )?;
            definition.component.injection_points =
                self.parameter_points(&descriptor.name, &method.parameters, |index| {
                    InjectionMember::MethodParameter {
                        method: method.name.clone(),
                        index,
                    }
                });
            producers.push(definition);
        }
        for field in &descriptor.fields {
            if !field.has_annotation(wellknown::PRODUCES) {
                continue;
            }
            let owner = format!("{}.{}", descriptor.name, field.name);
            producers.push(self.producer(
                descriptor,
                &owner,
                &field.name,
                ProducerMember::Field,
                &field.field_type,
                &field.annotations,
            )?);
        }
        Ok(producers)
    }

    fn producer(
        &mut self,
        declaring: &TypeDescriptor,
        owner: &str,
        member: &str,
        member_kind: ProducerMember,
        produced: &TypeRef,
        annotations: &[AnnotationUse],
    ) -> Result<ProducerDefinition, ContainerError> {
        let types = self
            .value_types(produced)
            .map_err(|_| ContainerError::configuration(format!("producer {owner} produces void")))?;
        let declared = self.declared(owner, annotations)?;
        let name = match &declared.named {
            Some(value) if !value.is_empty() => Some(value.clone()),
            Some(_) => Some(property_name(member)),
            None if declared.name_defaulting => Some(property_name(member)),
            None => None,
        };

        let mut component = ComponentDescriptor::new(declaring.name.clone());
        component.qualifiers = declared.qualifiers;
        if let Some(name) = &name {
            component.qualifiers.insert(AnnotationUse::named(name.clone()));
        }
        component.name = name;
        component.stereotypes = declared.stereotypes;
        component.alternative = declared.alternative;
        component.priority = declared.priority;
        component.passivation_capable = match produced {
            TypeRef::Primitive(_) => true,
            TypeRef::Object(name) => self.is_serializable(name),
            _ => false,
        };
        let scope = declared
            .scope
            .unwrap_or_else(|| TypeName::from_static(wellknown::DEPENDENT));
        component.scope = Some(scope.clone());
        Ok(ProducerDefinition {
            component,
            types,
            scope,
            member: member.to_string(),
            member_kind,
        })
    }

    /// Interceptor metadata of an `@Interceptor` class
    ///
    /// # Errors
    /// Returns [`ContainerError::Configuration`] when the interceptor declares
    /// no binding or no interceptor method.
    pub fn interceptor_meta(
        &self,
        descriptor: &TypeDescriptor,
        component: &ComponentDescriptor,
        declaration_order: usize,
    ) -> Result<InterceptorMeta, ContainerError> {
        if component.interceptor_bindings.is_empty() {
            return Err(ContainerError::configuration(format!(
                "interceptor {} declares no interceptor binding",
                descriptor.name
            )));
        }
        let methods = self.universe.hierarchy_methods(&descriptor.name)?;
        let interception_types: BTreeSet<_> = [
            InterceptionType::AroundInvoke,
            InterceptionType::PostConstruct,
            InterceptionType::PreDestroy,
        ]
        .into_iter()
        .filter(|kind| {
            methods
                .iter()
                .any(|m| m.method.has_annotation(kind.marker_annotation()))
        })
        .collect();
        if interception_types.is_empty() {
            return Err(ContainerError::configuration(format!(
                "interceptor {} declares no interceptor method",
                descriptor.name
            )));
        }
        Ok(InterceptorMeta {
            bindings: component.interceptor_bindings.clone(),
            interception_types,
            declared_priority: component.priority,
            discovery_order: declaration_order,
            priority: component.priority,
            declaration_order,
            custom: false,
        })
    }

    /// Decorator metadata of a `@Decorator` class
    ///
    /// # Errors
    /// Returns [`ContainerError::Configuration`] unless the decorator has
    /// exactly one delegate injection point.
    pub fn decorator_meta(
        &self,
        descriptor: &TypeDescriptor,
        component: &ComponentDescriptor,
        declaration_order: usize,
    ) -> Result<DecoratorMeta, ContainerError> {
        let delegates: Vec<_> = component
            .injection_points
            .iter()
            .filter(|ip| ip.delegate)
            .collect();
        let [delegate] = delegates.as_slice() else {
            return Err(ContainerError::configuration(format!(
                "decorator {} must declare exactly one delegate injection point, found {}",
                descriptor.name,
                delegates.len()
            )));
        };
        let decorated_types = self
            .universe
            .type_closure(&descriptor.name)?
            .into_iter()
            .filter(|t| t.as_str() != wellknown::SERIALIZABLE)
            .filter(|t| self.universe.get(t).is_some_and(TypeDescriptor::is_interface))
            .collect();
        Ok(DecoratorMeta {
            delegate: (*delegate).clone(),
            decorated_types,
            declared_priority: component.priority,
            discovery_order: declaration_order,
            priority: component.priority,
            declaration_order,
            custom: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use beanstalk_model::{ConstructorDescriptor, FieldDescriptor, Modifier, Modifiers};
    use beanstalk_test_utils::{ann, named, ty, MethodBuilder, TypeBuilder};

    struct Env {
        universe: TypeUniverse,
        catalog: AnnotationCatalog,
        stereotypes: StereotypeRegistry,
    }

    impl Env {
        fn new(types: Vec<TypeDescriptor>) -> Self {
            let mut stereotypes = StereotypeRegistry::new();
            stereotypes.register_builtins();
            Self {
                universe: TypeUniverse::with_types(types),
                catalog: AnnotationCatalog::new(),
                stereotypes,
            }
        }

        fn definer(&mut self) -> BeanDefiner<'_> {
            BeanDefiner::new(&self.universe, &self.catalog, &mut self.stereotypes)
        }

        fn get(&self, name: &str) -> TypeDescriptor {
            self.universe.get(name).unwrap().clone()
        }
    }

    #[test]
    fn names_are_decapitalized() {
        assert_eq!(decapitalize("ShoppingCart"), "shoppingCart");
        assert_eq!(decapitalize(""), "");
        assert_eq!(property_name("getPrice"), "price");
        assert_eq!(property_name("isOpen"), "open");
        assert_eq!(property_name("issue"), "issue");
        assert_eq!(property_name("connection"), "connection");
    }

    #[test]
    fn injectable_predicate() {
        let two_ctors = TypeBuilder::class("com.acme.Two")
            .inject_constructor(&["int"])
            .inject_constructor(&["long"])
            .build();
        let mut private_ctor = TypeBuilder::class("com.acme.Private").build();
        private_ctor.constructors.push(ConstructorDescriptor {
            parameters: vec![],
            modifiers: Modifiers::none().with(Modifier::Private),
            annotations: vec![],
        });
        let mut env = Env::new(vec![
            TypeBuilder::class("com.acme.Plain").build(),
            TypeBuilder::class("com.acme.Inner").inner().build(),
            TypeBuilder::class("com.acme.Shape").modifier(Modifier::Abstract).build(),
            TypeBuilder::interface("com.acme.Api").build(),
            TypeBuilder::class("com.acme.Ignored").annotate(wellknown::VETOED).build(),
            TypeBuilder::class("com.acme.Wired").inject_constructor(&["com.acme.Plain"]).build(),
            two_ctors,
            private_ctor,
        ]);
        let plain = env.get("com.acme.Plain");
        let inner = env.get("com.acme.Inner");
        let shape = env.get("com.acme.Shape");
        let api = env.get("com.acme.Api");
        let ignored = env.get("com.acme.Ignored");
        let wired = env.get("com.acme.Wired");
        let two = env.get("com.acme.Two");
        let private = env.get("com.acme.Private");
        let definer = env.definer();
        assert!(definer.is_injectable(&plain).unwrap());
        assert!(!definer.is_injectable(&inner).unwrap());
        assert!(!definer.is_injectable(&shape).unwrap());
        assert!(!definer.is_injectable(&api).unwrap());
        assert!(!definer.is_injectable(&ignored).unwrap());
        assert!(definer.is_injectable(&wired).unwrap());
        assert!(!definer.is_injectable(&private).unwrap());
        assert!(matches!(definer.is_injectable(&two), Err(ContainerError::Configuration(_))));
    }

    #[test]
    fn component_resolves_name_scope_and_points() {
        let mut env = Env::new(vec![
            TypeBuilder::annotation("com.acme.Fast").annotate(wellknown::QUALIFIER).build(),
            TypeBuilder::class("com.acme.Engine").build(),
            TypeBuilder::class("com.acme.ShoppingCart")
                .serializable()
                .annotate_with(named(""))
                .annotate(wellknown::SESSION_SCOPED)
                .inject("engine", "com.acme.Engine", &[ann("com.acme.Fast")])
                .inject_transient("cache", "com.acme.Engine")
                .inject_constructor(&["int"])
                .build(),
        ]);
        let cart = env.get("com.acme.ShoppingCart");
        let component = env.definer().component(&cart).unwrap();
        assert_eq!(component.name.as_deref(), Some("shoppingCart"));
        assert!(component.qualifiers.contains(&AnnotationUse::named("shoppingCart")));
        assert_eq!(component.scope, Some(TypeName::from_static(wellknown::SESSION_SCOPED)));
        assert!(component.passivation_capable);
        assert_eq!(component.injection_points.len(), 3);
        let engine = &component.injection_points[0];
        assert_eq!(engine.qualifiers.len(), 1);
        assert!(component.injection_points[1].transient);
        assert_eq!(
            component.injection_points[2].member,
            InjectionMember::ConstructorParameter { index: 0 }
        );
    }

    #[test]
    fn model_stereotype_defaults_name_and_scope() {
        let mut env = Env::new(vec![TypeBuilder::class("com.acme.LoginForm")
            .annotate(wellknown::MODEL)
            .build()]);
        let form = env.get("com.acme.LoginForm");
        let component = env.definer().component(&form).unwrap();
        assert_eq!(component.name.as_deref(), Some("loginForm"));
        assert_eq!(component.scope, Some(TypeName::from_static(wellknown::REQUEST_SCOPED)));
        assert!(component.stereotypes.contains(wellknown::MODEL));
    }

    #[test]
    fn two_scopes_on_a_class_are_rejected() {
        let mut env = Env::new(vec![TypeBuilder::class("com.acme.Confused")
            .annotate(wellknown::REQUEST_SCOPED)
            .annotate(wellknown::APPLICATION_SCOPED)
            .build()]);
        let confused = env.get("com.acme.Confused");
        let err = env.definer().component(&confused).unwrap_err();
        assert!(err.to_string().contains("more than one scope"));
    }

    #[test]
    fn unscoped_class_is_dependent() {
        let mut env = Env::new(vec![TypeBuilder::class("com.acme.Pojo").build()]);
        let pojo = env.get("com.acme.Pojo");
        let component = env.definer().component(&pojo).unwrap();
        assert_eq!(component.scope, Some(TypeName::from_static(wellknown::DEPENDENT)));
        assert_eq!(component.name, None);
        assert!(!component.passivation_capable);
    }

    #[test]
    fn producers_get_member_names_and_value_types() {
        let mut field = FieldDescriptor::new("rate", ty("double"));
        field.annotations = vec![ann(wellknown::PRODUCES), named("")];
        let mut env = Env::new(vec![TypeBuilder::class("com.acme.Factory")
            .method(
                MethodBuilder::new("getConnection")
                    .param("com.acme.Factory")
                    .returns(wellknown::STRING)
                    .annotate(wellknown::PRODUCES)
                    .annotate_with(named(""))
                    .build(),
            )
            .field(field)
            .build()]);
        let factory = env.get("com.acme.Factory");
        let producers = env.definer().producers(&factory).unwrap();
        assert_eq!(producers.len(), 2);

        let method = &producers[0];
        assert_eq!(method.component.name.as_deref(), Some("connection"));
        assert!(method.types.contains(&ty(wellknown::STRING)));
        assert_eq!(method.component.injection_points.len(), 1);
        assert!(method.component.passivation_capable);

        let field = &producers[1];
        assert_eq!(field.member_kind, ProducerMember::Field);
        assert!(field.types.contains(&ty(wellknown::DOUBLE)));
        assert_eq!(field.component.name.as_deref(), Some("rate"));
    }

    #[test]
    fn void_producer_is_rejected() {
        let mut env = Env::new(vec![TypeBuilder::class("com.acme.Factory")
            .method(MethodBuilder::new("nothing").annotate(wellknown::PRODUCES).build())
            .build()]);
        let factory = env.get("com.acme.Factory");
        let err = env.definer().producers(&factory).unwrap_err();
        assert!(err.to_string().contains("produces void"));
    }

    #[test]
    fn decorator_needs_exactly_one_delegate() {
        let mut env = Env::new(vec![
            TypeBuilder::interface("com.acme.Greeter").build(),
            TypeBuilder::class("com.acme.Loud")
                .modifier(Modifier::Abstract)
                .implements("com.acme.Greeter")
                .annotate(wellknown::DECORATOR)
                .build(),
        ]);
        let loud = env.get("com.acme.Loud");
        let mut definer = env.definer();
        let component = definer.component(&loud).unwrap();
        let err = definer.decorator_meta(&loud, &component, 0).unwrap_err();
        assert!(err.to_string().contains("found 0"));
    }

    #[test]
    fn interceptor_without_binding_is_rejected() {
        let mut env = Env::new(vec![TypeBuilder::class("com.acme.Bare")
            .annotate(wellknown::INTERCEPTOR)
            .method(MethodBuilder::new("around").annotate(wellknown::AROUND_INVOKE).build())
            .build()]);
        let bare = env.get("com.acme.Bare");
        let mut definer = env.definer();
        let component = definer.component(&bare).unwrap();
        let err = definer.interceptor_meta(&bare, &component, 0).unwrap_err();
        assert!(err.to_string().contains("no interceptor binding"));
    }
}
