//! Container facade
//!
//! One container owns its configuration, extensions, registries, class
//! loader scope and proxy factory. Nothing is shared between containers.

use crate::config::ContainerConfig;
use crate::deployer::{Deployer, Deployment, EnterpriseClassifier};
use crate::discovery::Discovery;
use crate::error::{ContainerError, DeploymentError, DeploymentPhase};
use crate::events::Extension;
use crate::naming::{InMemoryNamingService, ManagerReference, NamingService};
use crate::registry::BeanRegistry;
use crate::resolver::TypesafeResolver;
use beanstalk_model::{
    AnnotationUse, BeanId, BeanRecord, InjectionPoint, SpecializationEdge, TypeName, TypeRef,
    TypeUniverse,
};
use beanstalk_proxy::{ClassLoaderScope, ProxyClass, ProxyFactory, ProxyRequest, ProxySynthesizer};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Lifecycle state of a container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerState {
    /// Built, not deployed yet
    Fresh,
    /// Deployment succeeded
    Deployed,
    /// Deployment failed; the container cannot be used
    Failed,
    /// Shut down
    ShutDown,
}

impl fmt::Display for ContainerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Fresh => "fresh",
            Self::Deployed => "deployed",
            Self::Failed => "failed",
            Self::ShutDown => "shut down",
        };
        f.write_str(s)
    }
}

/// Builder for [`Container`]
#[derive(Default)]
pub struct ContainerBuilder {
    config: ContainerConfig,
    extensions: Vec<Arc<dyn Extension>>,
    naming: Option<Arc<dyn NamingService>>,
    classifier: Option<Arc<dyn EnterpriseClassifier>>,
}

impl ContainerBuilder {
    /// Builder with the default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a configuration
    #[must_use]
    pub fn config(mut self, config: ContainerConfig) -> Self {
        self.config = config;
        self
    }

    /// Register an extension
    #[must_use]
    pub fn extension(mut self, extension: impl Extension + 'static) -> Self {
        self.extensions.push(Arc::new(extension));
        self
    }

    /// Use a naming service instead of a private in-memory one
    #[must_use]
    pub fn naming(mut self, naming: Arc<dyn NamingService>) -> Self {
        self.naming = Some(naming);
        self
    }

    /// Classify non-injectable classes as enterprise components
    ///
    /// Only consulted when enterprise discovery is enabled.
    #[must_use]
    pub fn enterprise_classifier(
        mut self,
        classifier: impl EnterpriseClassifier + 'static,
    ) -> Self {
        self.classifier = Some(Arc::new(classifier));
        self
    }

    /// Build the container
    #[must_use]
    pub fn build(self) -> Container {
        let synthesizer = ProxySynthesizer::with_suffix(self.config.proxy.name_suffix.clone());
        let proxies = ProxyFactory::new(synthesizer);
        Container {
            id: Uuid::new_v4(),
            config: self.config,
            extensions: self.extensions,
            naming: self
                .naming
                .unwrap_or_else(|| Arc::new(InMemoryNamingService::new())),
            classifier: self.classifier,
            scope: ClassLoaderScope::new(),
            proxies,
            state: ContainerState::Fresh,
            deployment: None,
        }
    }
}

impl fmt::Debug for ContainerBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContainerBuilder")
            .field("config", &self.config)
            .field("extensions", &self.extensions.len())
            .field("custom_naming", &self.naming.is_some())
            .field("classifier", &self.classifier.is_some())
            .finish()
    }
}

/// Dependency injection container
pub struct Container {
    id: Uuid,
    config: ContainerConfig,
    extensions: Vec<Arc<dyn Extension>>,
    naming: Arc<dyn NamingService>,
    classifier: Option<Arc<dyn EnterpriseClassifier>>,
    scope: ClassLoaderScope,
    proxies: ProxyFactory,
    state: ContainerState,
    deployment: Option<Deployment>,
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("loader", &self.scope.id())
            .field("beans", &self.deployment.as_ref().map(|d| d.registry.len()))
            .finish_non_exhaustive()
    }
}

impl Container {
    /// Builder with the default configuration
    #[must_use]
    pub fn builder() -> ContainerBuilder {
        ContainerBuilder::new()
    }

    /// Container identity
    #[inline]
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Configuration in use
    #[inline]
    #[must_use]
    pub fn config(&self) -> &ContainerConfig {
        &self.config
    }

    /// Lifecycle state
    #[inline]
    #[must_use]
    pub fn state(&self) -> ContainerState {
        self.state
    }

    /// Whether deployment succeeded and the container is not shut down
    #[inline]
    #[must_use]
    pub fn is_deployed(&self) -> bool {
        self.state == ContainerState::Deployed
    }

    /// Reference bound in the naming service
    #[must_use]
    pub fn manager_reference(&self) -> ManagerReference {
        ManagerReference {
            container: self.id,
            loader: self.scope.id(),
        }
    }

    /// Naming service the container binds itself in
    #[must_use]
    pub fn naming(&self) -> &Arc<dyn NamingService> {
        &self.naming
    }

    /// Deploy an application
    ///
    /// Deploying an already deployed container does nothing.
    ///
    /// # Errors
    /// Returns the failing phase and cause. After a failure, or after
    /// shutdown, every call fails with [`ContainerError::ContainerUnusable`].
    pub fn deploy(&mut self, discovery: &dyn Discovery) -> Result<(), DeploymentError> {
        match self.state {
            ContainerState::Deployed => {
                debug!(container = %self.id, "already deployed");
                return Ok(());
            }
            ContainerState::Failed | ContainerState::ShutDown => {
                return Err(DeploymentError::new(
                    DeploymentPhase::Startup,
                    ContainerError::ContainerUnusable,
                ));
            }
            ContainerState::Fresh => {}
        }

        let deployer = Deployer::new(
            &self.config,
            &self.extensions,
            self.naming.as_ref(),
            self.classifier.as_deref(),
            self.manager_reference(),
        );
        match deployer.run(discovery) {
            Ok(deployment) => {
                for class in deployment.universe.iter().map(|t| t.name.clone()) {
                    self.scope.load_application_type(class);
                }
                self.deployment = Some(deployment);
                self.state = ContainerState::Deployed;
                info!(container = %self.id, "container deployed");
                Ok(())
            }
            Err(err) => {
                warn!(container = %self.id, error = %err, "deployment failed");
                self.unbind_manager();
                self.state = ContainerState::Failed;
                Err(err)
            }
        }
    }

    fn deployment(&self) -> Result<&Deployment, ContainerError> {
        match (&self.deployment, self.state) {
            (Some(deployment), ContainerState::Deployed) => Ok(deployment),
            _ => Err(ContainerError::NotDeployed),
        }
    }

    /// Deployed beans
    ///
    /// # Errors
    /// Returns [`ContainerError::NotDeployed`] before a successful deployment.
    pub fn beans(&self) -> Result<&BeanRegistry, ContainerError> {
        self.deployment().map(|d| &d.registry)
    }

    /// Bean by id
    #[must_use]
    pub fn bean(&self, id: BeanId) -> Option<&BeanRecord> {
        self.deployment().ok()?.registry.get(id)
    }

    /// The managed bean of a class
    #[must_use]
    pub fn class_bean(&self, class: &TypeName) -> Option<&BeanRecord> {
        self.deployment().ok()?.registry.class_bean(class)
    }

    /// Types of the deployment
    ///
    /// # Errors
    /// Returns [`ContainerError::NotDeployed`] before a successful deployment.
    pub fn universe(&self) -> Result<&TypeUniverse, ContainerError> {
        self.deployment().map(|d| &d.universe)
    }

    /// Specializations applied during deployment
    ///
    /// # Errors
    /// Returns [`ContainerError::NotDeployed`] before a successful deployment.
    pub fn specializations(&self) -> Result<&[SpecializationEdge], ContainerError> {
        self.deployment().map(|d| d.specializations.as_slice())
    }

    /// Enabled beans with a type and qualifiers, alternatives narrowed
    ///
    /// # Errors
    /// Returns [`ContainerError::NotDeployed`] before a successful deployment.
    pub fn beans_by_type(
        &self,
        required: &TypeRef,
        qualifiers: &[AnnotationUse],
    ) -> Result<Vec<&BeanRecord>, ContainerError> {
        let deployment = self.deployment()?;
        let qualifiers: BTreeSet<AnnotationUse> = qualifiers.iter().cloned().collect();
        let found = TypesafeResolver::new(&deployment.registry).candidates(required, &qualifiers);
        Ok(TypesafeResolver::narrow_alternatives(found))
    }

    /// The bean an injection point resolves to
    ///
    /// # Errors
    /// Returns resolution errors, or [`ContainerError::NotDeployed`].
    pub fn resolve(&self, injection_point: &InjectionPoint) -> Result<&BeanRecord, ContainerError> {
        TypesafeResolver::new(&self.deployment()?.registry).resolve(injection_point)
    }

    /// Beans answering to a name, alternatives narrowed
    ///
    /// # Errors
    /// Returns [`ContainerError::NotDeployed`] before a successful deployment.
    pub fn resolve_by_name(&self, name: &str) -> Result<Vec<&BeanRecord>, ContainerError> {
        Ok(TypesafeResolver::new(&self.deployment()?.registry).resolve_by_name(name))
    }

    /// Proxy class of a managed bean, synthesized on first request
    ///
    /// Returns `None` for classes without a bean and for beans whose plan
    /// intercepts no method.
    ///
    /// # Errors
    /// Returns [`ContainerError::NotDeployed`] before deployment and
    /// [`ContainerError::Proxy`] when synthesis fails.
    pub fn proxy_class(&self, class: &TypeName) -> Result<Option<Arc<ProxyClass>>, ContainerError> {
        let deployment = self.deployment()?;
        let Some(bean) = deployment.registry.class_bean(class) else {
            return Ok(None);
        };
        let Some(plan) = bean.plan.as_ref().filter(|p| p.requires_proxy()) else {
            return Ok(None);
        };
        let intercepted = plan.intercepted_methods();
        let passivation_id = bean.passivation_id();
        let request = ProxyRequest {
            universe: &deployment.universe,
            class,
            intercepted: &intercepted,
            passivation_id: &passivation_id,
        };
        let proxy = self.proxies.get_or_create(&self.scope, request)?;
        debug!(class = %class, proxy = %proxy.name(), "proxy ready");
        Ok(Some(proxy))
    }

    /// Proxy factory of this container
    #[inline]
    #[must_use]
    pub fn proxies(&self) -> &ProxyFactory {
        &self.proxies
    }

    /// Class loader scope proxies are defined in
    #[inline]
    #[must_use]
    pub fn loader_scope(&self) -> &ClassLoaderScope {
        &self.scope
    }

    fn unbind_manager(&self) {
        if !self.config.naming.bind_manager {
            return;
        }
        if let Err(err) = self.naming.unbind(&self.config.naming.manager_name) {
            debug!(error = %err, "manager was not bound");
        }
    }

    /// Release the container: drop cached proxies and unbind the manager
    pub fn shutdown(&mut self) {
        if self.state == ContainerState::ShutDown {
            return;
        }
        self.proxies.evict_scope(self.scope.id());
        if self.state == ContainerState::Deployed {
            self.unbind_manager();
        }
        self.deployment = None;
        self.state = ContainerState::ShutDown;
        info!(container = %self.id, "container shut down");
    }
}
