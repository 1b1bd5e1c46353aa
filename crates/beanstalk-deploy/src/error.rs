//! Error types for Beanstalk deployment
//!
//! Every failure inside the pipeline is a [`ContainerError`]; the deployer
//! wraps it once, together with the phase it happened in, as a
//! [`DeploymentError`].

use beanstalk_model::{ModelError, TypeName};
use beanstalk_proxy::ProxyGenerationError;
use std::fmt::{self, Display, Formatter};

/// Failure of a deployment step, lookup or proxy request
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContainerError {
    /// Structural or declarative mistake
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Two specializers for the same target
    #[error("inconsistent specialization of {target}: specialized by {}", join(.specializers))]
    InconsistentSpecialization {
        /// Specialized type
        target: TypeName,
        /// Competing specializers
        specializers: Vec<TypeName>,
    },

    /// No bean satisfies an injection point
    #[error("unsatisfied dependency for injection point {injection_point}")]
    UnsatisfiedResolution {
        /// Offending injection point
        injection_point: String,
    },

    /// More than one bean satisfies an injection point or name
    #[error("ambiguous resolution of {what}: candidates {}", join(.candidates))]
    AmbiguousResolution {
        /// Injection point or bean name being resolved
        what: String,
        /// Matching beans
        candidates: Vec<String>,
    },

    /// Observers reported errors at a checkpoint
    #[error("{checkpoint} observers reported {} error(s): {}", .errors.len(), .errors.join("; "))]
    Observer {
        /// Checkpoint the errors were raised at
        checkpoint: Checkpoint,
        /// Accumulated messages
        errors: Vec<String>,
    },

    /// Naming service failure
    #[error("naming error: {0}")]
    Naming(#[from] NamingError),

    /// Declarative resource could not be read
    #[error("declarative configuration error: {0}")]
    Declarative(String),

    /// Proxy synthesis failure
    #[error("proxy generation failed: {0}")]
    Proxy(#[from] ProxyGenerationError),

    /// The container failed to deploy or was shut down
    #[error("container is unusable after a failed deployment or shutdown")]
    ContainerUnusable,

    /// The container has not been deployed yet
    #[error("container is not deployed")]
    NotDeployed,

    /// Metadata lookup failure
    #[error("model error: {0}")]
    Model(#[from] ModelError),
}

impl ContainerError {
    /// Shorthand for [`ContainerError::Configuration`]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }
}

/// Naming service failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NamingError {
    /// Empty or malformed name
    #[error("invalid name: {0:?}")]
    InvalidName(String),

    /// Nothing is bound under the name
    #[error("name not bound: {0}")]
    NotBound(String),

    /// Backend refused the operation
    #[error("naming service unavailable: {0}")]
    Unavailable(String),
}

/// Configuration file failure
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File could not be read
    #[error("cannot read configuration: {0}")]
    Io(#[from] std::io::Error),

    /// TOML did not match the configuration schema
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Extension event checkpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Checkpoint {
    /// Before any type is discovered
    BeforeBeanDiscovery,
    /// Once per discovered type
    ProcessAnnotatedType,
    /// After all beans are defined
    AfterBeanDiscovery,
    /// After validation
    AfterDeploymentValidation,
}

impl Display for Checkpoint {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::BeforeBeanDiscovery => "before-bean-discovery",
            Self::ProcessAnnotatedType => "process-annotated-type",
            Self::AfterBeanDiscovery => "after-bean-discovery",
            Self::AfterDeploymentValidation => "after-deployment-validation",
        };
        f.write_str(s)
    }
}

/// Pipeline phase an error was raised in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeploymentPhase {
    /// Before the pipeline starts
    Startup,
    /// Extension observers are registered
    LoadExtensions,
    /// Container self-reference is bound in the naming service
    BindManager,
    /// Container self-reference bean is registered
    RegisterManager,
    /// Before-discovery event
    BeforeDiscovery,
    /// Declarative resources are deployed
    DeclarativeDeployment,
    /// Stereotypes used by candidates are checked
    StereotypeValidation,
    /// Framework-provided beans are registered
    DefaultBeans,
    /// Discovered candidates are defined
    ClasspathDeployment,
    /// Extension-contributed types are defined
    ExtensionTypes,
    /// Specializations are resolved and applied
    Specialization,
    /// After-discovery event
    AfterDiscovery,
    /// Interceptor and decorator stacks are built
    StackBuilding,
    /// Injection points, passivation and names are validated
    Validation,
    /// After-validation event
    AfterValidation,
}

impl Display for DeploymentPhase {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Startup => "startup",
            Self::LoadExtensions => "extension loading",
            Self::BindManager => "manager binding",
            Self::RegisterManager => "manager registration",
            Self::BeforeDiscovery => "before-discovery",
            Self::DeclarativeDeployment => "declarative deployment",
            Self::StereotypeValidation => "stereotype validation",
            Self::DefaultBeans => "default bean registration",
            Self::ClasspathDeployment => "classpath deployment",
            Self::ExtensionTypes => "extension type deployment",
            Self::Specialization => "specialization",
            Self::AfterDiscovery => "after-discovery",
            Self::StackBuilding => "stack building",
            Self::Validation => "validation",
            Self::AfterValidation => "after-validation",
        };
        f.write_str(s)
    }
}

/// Fatal deployment failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("deployment failed during {phase}: {source}")]
pub struct DeploymentError {
    /// Phase the failure happened in
    pub phase: DeploymentPhase,
    /// Underlying failure
    pub source: ContainerError,
}

impl DeploymentError {
    /// Wrap a failure
    #[must_use]
    pub fn new(phase: DeploymentPhase, source: ContainerError) -> Self {
        Self { phase, source }
    }

    /// Underlying failure
    #[inline]
    #[must_use]
    pub fn error(&self) -> &ContainerError {
        &self.source
    }

    /// Structural or declarative mistake
    #[inline]
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(self.source, ContainerError::Configuration(_))
    }

    /// Competing specializers
    #[inline]
    #[must_use]
    pub fn is_specialization_conflict(&self) -> bool {
        matches!(self.source, ContainerError::InconsistentSpecialization { .. })
    }

    /// Unsatisfied injection point
    #[inline]
    #[must_use]
    pub fn is_unsatisfied(&self) -> bool {
        matches!(self.source, ContainerError::UnsatisfiedResolution { .. })
    }

    /// Ambiguous injection point or name
    #[inline]
    #[must_use]
    pub fn is_ambiguous(&self) -> bool {
        matches!(self.source, ContainerError::AmbiguousResolution { .. })
    }

    /// Errors reported by extension observers
    #[inline]
    #[must_use]
    pub fn is_observer(&self) -> bool {
        matches!(self.source, ContainerError::Observer { .. })
    }

    /// Redeploy of a failed or shut down container
    #[inline]
    #[must_use]
    pub fn is_container_unusable(&self) -> bool {
        matches!(self.source, ContainerError::ContainerUnusable)
    }
}

fn join<T: Display>(items: &[T]) -> String {
    items.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}
