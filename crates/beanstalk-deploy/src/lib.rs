//! Beanstalk Deployment
//!
//! Turns discovered types into a validated set of beans.
//!
//! # Architecture
//!
//! ```text
//! Discovery ──► Deployer (14 phases) ──► Deployment
//!                  │                        │
//!   extensions ────┤ BeanDefiner            ├─► TypesafeResolver
//!   manifests ─────┤ specialization         │
//!                  │ StackBuilder           └─► Container::proxy_class
//!                  └ Validator                        (ProxyFactory)
//! ```
//!
//! # Example
//!
//! ```rust
//! use beanstalk_deploy::{Container, StaticDiscovery};
//! use beanstalk_model::{TypeDescriptor, TypeKind, TypeName, TypeUniverse};
//!
//! let pojo = TypeName::new("com.acme.Pojo")?;
//! let universe = TypeUniverse::with_types([TypeDescriptor::new(pojo.clone(), TypeKind::Class)]);
//! let discovery = StaticDiscovery::new(universe).with_candidate(pojo.clone());
//!
//! let mut container = Container::builder().build();
//! container.deploy(&discovery)?;
//! assert!(container.class_bean(&pojo).is_some());
//! assert!(container.proxy_class(&pojo)?.is_none());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod annotations;
mod builtin;
mod config;
mod container;
mod definition;
mod deployer;
mod discovery;
mod error;
mod events;
mod interception;
mod manifest;
mod naming;
mod registry;
mod resolver;
mod specialization;
mod stereotype;
mod validation;

pub use annotations::{AnnotationCatalog, ScopeInfo};
pub use builtin::{platform_contracts, DEFAULT_BEANS};
pub use config::{ContainerConfig, NamingConfig, PlatformProfile, ProxyConfig, DEFAULT_MANAGER_NAME};
pub use container::{Container, ContainerBuilder, ContainerState};
pub use definition::{decapitalize, property_name, BeanDefiner, ProducerDefinition};
pub use deployer::{Deployment, EnterpriseClassifier};
pub use discovery::{ApplicationDescriptor, DeclarativeResource, Discovery, StaticDiscovery};
pub use error::{
    Checkpoint, ConfigError, ContainerError, DeploymentError, DeploymentPhase, NamingError,
};
pub use events::{
    AfterBeanDiscovery, AfterDeploymentValidation, AnnotatedType, BeforeBeanDiscovery,
    CustomDecorator, CustomInterceptor, Extension, ObserverRegistry, Verdict,
};
pub use interception::{ordered_decorators, ordered_interceptors, resolve_enablement, StackBuilder};
pub use manifest::{DeclarativeConfig, DeclaredBean, EnablementEntry, Manifest};
pub use naming::{Bound, InMemoryNamingService, ManagerReference, NamingService};
pub use registry::BeanRegistry;
pub use resolver::TypesafeResolver;
pub use stereotype::StereotypeRegistry;
pub use validation::Validator;

/// Specialization edges and their application to a registry
pub mod specializations {
    pub use crate::specialization::{apply, collect};
}

/// Prelude for common imports
pub mod prelude {
    pub use super::{
        Container, ContainerConfig, ContainerError, DeploymentError, DeploymentPhase, Discovery,
        Extension, ObserverRegistry, StaticDiscovery, Verdict,
    };
}

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
