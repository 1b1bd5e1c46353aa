//! Beanstalk Metadata Model
//!
//! Explicit descriptors for everything the container reasons about.
//!
//! # Core Concepts
//!
//! - [`TypeName`] / [`TypeRef`]: type identities and signature types
//! - [`TypeDescriptor`]: a discovered type with its members and annotations
//! - [`TypeUniverse`]: every type known to one deployment
//! - [`ComponentDescriptor`]: what a candidate declares about itself
//! - [`BeanRecord`]: the container's canonical view of a bean
//! - [`InterceptionPlan`]: interceptor and decorator chains for a bean
//!
//! # Example
//!
//! ```rust
//! use beanstalk_model::{TypeDescriptor, TypeKind, TypeName, TypeUniverse};
//!
//! let car = TypeDescriptor::new(TypeName::new("com.acme.Car")?, TypeKind::Class);
//! let universe = TypeUniverse::with_types([car]);
//! let closure = universe.type_closure(&TypeName::new("com.acme.Car")?)?;
//! assert!(closure.contains(&TypeName::root()));
//! # Ok::<(), beanstalk_model::ModelError>(())
//! ```

mod annotation;
mod bean;
mod component;
mod descriptor;
mod error;
mod injection;
mod name;
mod plan;
mod types;
mod universe;

pub mod wellknown;

pub use annotation::{find as find_annotation, AnnotationUse, AnnotationValue};
pub use bean::{
    BeanId, BeanKind, BeanRecord, BeanSource, DecoratorMeta, InterceptorMeta, ProducerMember,
    ProducerMeta,
};
pub use component::{ComponentDescriptor, SpecializationEdge, SpecializationSource, StereotypeModel};
pub use descriptor::{
    ConstructorDescriptor, FieldDescriptor, MethodDescriptor, MethodSignature, ParameterDescriptor,
    TypeDescriptor, FINALIZER,
};
pub use error::ModelError;
pub use injection::{InjectionMember, InjectionPoint};
pub use name::TypeName;
pub use plan::{DecoratorRef, InterceptionPlan, InterceptionType, InterceptorRef};
pub use types::{Modifier, Modifiers, PrimitiveKind, TypeKind, TypeRef};
pub use universe::{TypeUniverse, VisibleMethod};

/// Prelude for common imports
pub mod prelude {
    pub use super::{
        AnnotationUse, BeanId, BeanKind, BeanRecord, InjectionPoint, InterceptionPlan,
        MethodDescriptor, MethodSignature, ModelError, TypeDescriptor, TypeKind, TypeName,
        TypeRef, TypeUniverse,
    };
}

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
