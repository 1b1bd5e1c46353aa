//! Testing utilities for the Beanstalk workspace
//!
//! Descriptor builders and canned type universes shared by the crate tests.

#![allow(missing_docs)]

use beanstalk_model::{
    wellknown, AnnotationUse, AnnotationValue, ConstructorDescriptor, FieldDescriptor,
    MethodDescriptor, Modifier, Modifiers, ParameterDescriptor, TypeDescriptor, TypeKind, TypeName,
    TypeRef, TypeUniverse,
};

pub fn tn(name: &str) -> TypeName {
    TypeName::new(name).unwrap()
}

pub fn ty(spelling: &str) -> TypeRef {
    spelling.parse().unwrap()
}

pub fn ann(annotation_type: &str) -> AnnotationUse {
    AnnotationUse::marker(tn(annotation_type))
}

pub fn named(value: &str) -> AnnotationUse {
    AnnotationUse::named(value)
}

pub fn priority(value: i64) -> AnnotationUse {
    ann(wellknown::PRIORITY).with_member("value", AnnotationValue::Int(value))
}

#[derive(Debug, Clone)]
pub struct TypeBuilder {
    descriptor: TypeDescriptor,
}

impl TypeBuilder {
    pub fn class(name: &str) -> Self {
        Self {
            descriptor: TypeDescriptor::new(tn(name), TypeKind::Class),
        }
    }

    pub fn interface(name: &str) -> Self {
        Self {
            descriptor: TypeDescriptor::new(tn(name), TypeKind::Interface),
        }
    }

    pub fn annotation(name: &str) -> Self {
        Self {
            descriptor: TypeDescriptor::new(tn(name), TypeKind::Annotation),
        }
    }

    pub fn extends(mut self, superclass: &str) -> Self {
        self.descriptor.superclass = Some(tn(superclass));
        self
    }

    pub fn implements(mut self, interface: &str) -> Self {
        self.descriptor.interfaces.push(tn(interface));
        self
    }

    pub fn serializable(self) -> Self {
        self.implements(wellknown::SERIALIZABLE)
    }

    pub fn annotate(self, annotation_type: &str) -> Self {
        self.annotate_with(ann(annotation_type))
    }

    pub fn annotate_with(mut self, annotation: AnnotationUse) -> Self {
        self.descriptor.annotations.push(annotation);
        self
    }

    pub fn modifier(mut self, modifier: Modifier) -> Self {
        self.descriptor.modifiers = self.descriptor.modifiers.with(modifier);
        self
    }

    pub fn inner(mut self) -> Self {
        self.descriptor.inner = true;
        self
    }

    pub fn field(mut self, field: FieldDescriptor) -> Self {
        self.descriptor.fields.push(field);
        self
    }

    /// `@Inject` field with optional qualifiers
    pub fn inject(self, name: &str, field_type: &str, qualifiers: &[AnnotationUse]) -> Self {
        let mut field = FieldDescriptor::new(name, ty(field_type));
        field.annotations.push(ann(wellknown::INJECT));
        field.annotations.extend(qualifiers.iter().cloned());
        self.field(field)
    }

    /// `@Inject transient` field
    pub fn inject_transient(self, name: &str, field_type: &str) -> Self {
        let mut field = FieldDescriptor::new(name, ty(field_type));
        field.modifiers = field.modifiers.with(Modifier::Transient);
        field.annotations.push(ann(wellknown::INJECT));
        self.field(field)
    }

    /// `@Inject @Delegate` field
    pub fn delegate(self, name: &str, field_type: &str) -> Self {
        let mut field = FieldDescriptor::new(name, ty(field_type));
        field.annotations.push(ann(wellknown::INJECT));
        field.annotations.push(ann(wellknown::DELEGATE));
        self.field(field)
    }

    pub fn method(mut self, method: MethodDescriptor) -> Self {
        self.descriptor.methods.push(method);
        self
    }

    pub fn constructor(mut self, constructor: ConstructorDescriptor) -> Self {
        self.descriptor.constructors.push(constructor);
        self
    }

    /// `@Inject` constructor taking the given parameter types
    pub fn inject_constructor(self, parameters: &[&str]) -> Self {
        self.constructor(ConstructorDescriptor {
            parameters: parameters.iter().map(|p| ParameterDescriptor::new(ty(p))).collect(),
            modifiers: Modifiers::public(),
            annotations: vec![ann(wellknown::INJECT)],
        })
    }

    pub fn build(self) -> TypeDescriptor {
        self.descriptor
    }
}

#[derive(Debug, Clone)]
pub struct MethodBuilder {
    method: MethodDescriptor,
}

impl MethodBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            method: MethodDescriptor::new(name),
        }
    }

    pub fn param(mut self, param_type: &str) -> Self {
        self.method.parameters.push(ParameterDescriptor::new(ty(param_type)));
        self
    }

    pub fn returns(mut self, return_type: &str) -> Self {
        self.method.return_type = ty(return_type);
        self
    }

    pub fn annotate(self, annotation_type: &str) -> Self {
        self.annotate_with(ann(annotation_type))
    }

    pub fn annotate_with(mut self, annotation: AnnotationUse) -> Self {
        self.method.annotations.push(annotation);
        self
    }

    pub fn modifier(mut self, modifier: Modifier) -> Self {
        self.method.modifiers = self.method.modifiers.with(modifier);
        self
    }

    pub fn build(self) -> MethodDescriptor {
        self.method
    }
}

/// A type universe plus the candidate types discovery would report
#[derive(Debug, Clone)]
pub struct Fixture {
    pub universe: TypeUniverse,
    pub candidates: Vec<TypeName>,
}

impl Fixture {
    /// Every non-library type in `types` becomes a candidate
    pub fn new(types: Vec<TypeDescriptor>) -> Self {
        let candidates = types
            .iter()
            .filter(|t| t.kind != TypeKind::Annotation)
            .map(|t| t.name.clone())
            .collect();
        Self {
            universe: TypeUniverse::with_types(types),
            candidates,
        }
    }

    /// Add types to the universe without making them candidates
    pub fn with_library(mut self, types: Vec<TypeDescriptor>) -> Self {
        self.universe.extend(types);
        self
    }
}

/// A single plain class with one business method
pub fn pojo_fixture() -> Fixture {
    Fixture::new(vec![TypeBuilder::class("com.acme.Pojo")
        .method(MethodBuilder::new("work").returns("int").build())
        .build()])
}

/// `Car`, plus `TopCar` and `LuxuryCar` both specializing it
pub fn car_fixture() -> Fixture {
    Fixture::new(vec![
        TypeBuilder::interface("com.acme.Vehicle").build(),
        TypeBuilder::class("com.acme.Car")
            .implements("com.acme.Vehicle")
            .method(MethodBuilder::new("drive").build())
            .build(),
        TypeBuilder::class("com.acme.TopCar")
            .extends("com.acme.Car")
            .annotate(wellknown::SPECIALIZES)
            .build(),
        TypeBuilder::class("com.acme.LuxuryCar")
            .extends("com.acme.Car")
            .annotate(wellknown::SPECIALIZES)
            .build(),
    ])
}

/// `Car` specialized only by `TopCar`, with a garage injecting a vehicle
pub fn specialized_car_fixture() -> Fixture {
    Fixture::new(vec![
        TypeBuilder::interface("com.acme.Vehicle").build(),
        TypeBuilder::class("com.acme.Car")
            .implements("com.acme.Vehicle")
            .annotate_with(named("car"))
            .annotate(wellknown::APPLICATION_SCOPED)
            .build(),
        TypeBuilder::class("com.acme.TopCar")
            .extends("com.acme.Car")
            .annotate(wellknown::SPECIALIZES)
            .build(),
        TypeBuilder::class("com.acme.Garage")
            .inject("car", "com.acme.Car", &[])
            .inject("vehicle", "com.acme.Vehicle", &[])
            .build(),
    ])
}

/// `Decorator1`, a plain class with a delegate injection point
pub fn delegate_misuse_fixture() -> Fixture {
    Fixture::new(vec![
        TypeBuilder::interface("com.acme.Greeter").build(),
        TypeBuilder::class("com.acme.PlainGreeter")
            .implements("com.acme.Greeter")
            .build(),
        TypeBuilder::class("com.acme.Decorator1")
            .delegate("delegate", "com.acme.Greeter")
            .build(),
    ])
}

/// Interceptor binding `@Logged`, two interceptors for it and a bound service
///
/// `AuditInterceptor` has priority 5, `LoggingInterceptor` priority 10, and
/// `TimingInterceptor` priority 5 declared after `AuditInterceptor`.
/// `OrderService` is bound at class level; `finish` is final.
pub fn interceptor_fixture() -> Fixture {
    let around = || {
        MethodBuilder::new("intercept")
            .param("beanstalk.InvocationContext")
            .returns(wellknown::OBJECT)
            .annotate(wellknown::AROUND_INVOKE)
            .build()
    };
    Fixture::new(vec![
        TypeBuilder::annotation("com.acme.Logged")
            .annotate(wellknown::INTERCEPTOR_BINDING)
            .build(),
        TypeBuilder::class("com.acme.LoggingInterceptor")
            .annotate(wellknown::INTERCEPTOR)
            .annotate("com.acme.Logged")
            .annotate_with(priority(10))
            .method(around())
            .build(),
        TypeBuilder::class("com.acme.AuditInterceptor")
            .annotate(wellknown::INTERCEPTOR)
            .annotate("com.acme.Logged")
            .annotate_with(priority(5))
            .method(around())
            .build(),
        TypeBuilder::class("com.acme.TimingInterceptor")
            .annotate(wellknown::INTERCEPTOR)
            .annotate("com.acme.Logged")
            .annotate_with(priority(5))
            .method(around())
            .build(),
        TypeBuilder::class("com.acme.OrderService")
            .annotate("com.acme.Logged")
            .method(MethodBuilder::new("place").param("int").param("long").returns("long").build())
            .method(MethodBuilder::new("describe").returns(wellknown::STRING).build())
            .method(
                MethodBuilder::new("finish")
                    .modifier(Modifier::Final)
                    .build(),
            )
            .build(),
        TypeBuilder::class("com.acme.Pojo").build(),
    ])
    .with_library(vec![TypeBuilder::interface("beanstalk.InvocationContext").build()])
}

/// `Greeter` implemented by `PoliteGreeter`, decorated by `LoudGreeter`
/// (priority 20) and `ExclaimGreeter` (priority 10)
pub fn decorator_fixture() -> Fixture {
    let greet = || {
        MethodBuilder::new("greet")
            .param(wellknown::STRING)
            .returns(wellknown::STRING)
            .build()
    };
    let decorator = |name: &str, prio: i64| {
        TypeBuilder::class(name)
            .modifier(Modifier::Abstract)
            .implements("com.acme.Greeter")
            .annotate(wellknown::DECORATOR)
            .annotate_with(priority(prio))
            .delegate("delegate", "com.acme.Greeter")
            .method(greet())
            .build()
    };
    Fixture::new(vec![
        TypeBuilder::interface("com.acme.Greeter")
            .method(greet().tap_abstract())
            .build(),
        TypeBuilder::class("com.acme.PoliteGreeter")
            .implements("com.acme.Greeter")
            .method(greet())
            .method(MethodBuilder::new("farewell").returns(wellknown::STRING).build())
            .build(),
        decorator("com.acme.LoudGreeter", 20),
        decorator("com.acme.ExclaimGreeter", 10),
    ])
}

/// Session-scoped beans: one not serializable, one serializable, and a
/// producer of a non-serializable type into session scope
pub fn passivation_fixture() -> Fixture {
    Fixture::new(vec![
        TypeBuilder::class("com.acme.Cart")
            .annotate(wellknown::SESSION_SCOPED)
            .build(),
        TypeBuilder::class("com.acme.Wallet")
            .serializable()
            .annotate(wellknown::SESSION_SCOPED)
            .build(),
        TypeBuilder::class("com.acme.Connection").build(),
        TypeBuilder::class("com.acme.ConnectionFactory")
            .method(
                MethodBuilder::new("connection")
                    .returns("com.acme.Connection")
                    .annotate(wellknown::PRODUCES)
                    .annotate(wellknown::SESSION_SCOPED)
                    .annotate_with(ann("com.acme.Pooled"))
                    .build(),
            )
            .build(),
        TypeBuilder::annotation("com.acme.Pooled")
            .annotate(wellknown::QUALIFIER)
            .build(),
    ])
}

trait TapAbstract {
    fn tap_abstract(self) -> Self;
}

impl TapAbstract for MethodDescriptor {
    fn tap_abstract(mut self) -> Self {
        self.modifiers = self.modifiers.with(Modifier::Abstract);
        self
    }
}
