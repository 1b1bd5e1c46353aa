//! Bean records
//!
//! A [`BeanRecord`] is the container's canonical view of one bean. The deployer
//! creates and adjusts records; once deployment finishes they are only handed
//! out by shared reference.

use crate::annotation::AnnotationUse;
use crate::component::ComponentDescriptor;
use crate::injection::InjectionPoint;
use crate::name::TypeName;
use crate::plan::{InterceptionPlan, InterceptionType};
use crate::types::TypeRef;
use crate::wellknown;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt::{self, Display, Formatter};

/// Dense index of a bean within one container
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BeanId(u32);

impl BeanId {
    /// Wrap a raw index
    #[inline]
    #[must_use]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    /// Position in the registry
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl Display for BeanId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Classification of a bean
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BeanKind {
    /// Plain managed bean
    ManagedBean,
    /// Interceptor class
    Interceptor,
    /// Decorator class
    Decorator,
    /// Producer method or field
    Producer,
    /// Container-provided bean
    BuiltIn,
    /// Component claimed by the enterprise classifier
    Enterprise,
}

impl BeanKind {
    /// Short tag used in passivation identifiers
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::ManagedBean => "MANAGED",
            Self::Interceptor => "INTERCEPTOR",
            Self::Decorator => "DECORATOR",
            Self::Producer => "PRODUCER",
            Self::BuiltIn => "BUILTIN",
            Self::Enterprise => "ENTERPRISE",
        }
    }
}

impl Display for BeanKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::ManagedBean => "managed bean",
            Self::Interceptor => "interceptor",
            Self::Decorator => "decorator",
            Self::Producer => "producer",
            Self::BuiltIn => "built-in bean",
            Self::Enterprise => "enterprise bean",
        };
        f.write_str(s)
    }
}

/// How the bean entered the deployment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BeanSource {
    /// Discovered candidate type
    Classpath,
    /// Declared in a manifest
    Declarative,
    /// Contributed by an extension
    Extension,
    /// Provided by the container itself
    Container,
}

/// Interceptor-specific data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterceptorMeta {
    /// Declared bindings; an interceptor with none never applies
    pub bindings: BTreeSet<AnnotationUse>,
    /// Supported interception kinds
    pub interception_types: BTreeSet<InterceptionType>,
    /// Priority declared on the class or at registration
    pub declared_priority: Option<i32>,
    /// Position in discovery order
    pub discovery_order: usize,
    /// Effective priority, after manifest overrides
    pub priority: Option<i32>,
    /// Effective position: manifest entries first, then discovery order
    pub declaration_order: usize,
    /// Registered by an extension rather than annotated
    pub custom: bool,
}

/// Decorator-specific data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecoratorMeta {
    /// The `@Delegate` injection point
    pub delegate: InjectionPoint,
    /// Interfaces whose methods the decorator intercepts
    pub decorated_types: BTreeSet<TypeName>,
    /// Priority declared on the class or at registration
    pub declared_priority: Option<i32>,
    /// Position in discovery order
    pub discovery_order: usize,
    /// Effective priority, after manifest overrides
    pub priority: Option<i32>,
    /// Effective position: manifest entries first, then discovery order
    pub declaration_order: usize,
    /// Registered by an extension rather than annotated
    pub custom: bool,
}

/// Kind of producer member
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProducerMember {
    /// `@Produces` method
    Method,
    /// `@Produces` field
    Field,
}

/// Producer-specific data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProducerMeta {
    /// Bean declaring the producer member
    pub declaring_bean: BeanId,
    /// Member name
    pub member: String,
    /// Member kind
    pub member_kind: ProducerMember,
}

/// Canonical unit of the container: one bean
#[derive(Debug, Clone)]
pub struct BeanRecord {
    /// Registry index
    pub id: BeanId,
    /// Classification
    pub kind: BeanKind,
    /// Origin
    pub source: BeanSource,
    /// Implementation type (declaring class for producers)
    pub bean_class: TypeName,
    /// Bean types (type closure)
    pub types: BTreeSet<TypeRef>,
    /// Qualifiers, with `@Default` and `@Any` applied
    pub qualifiers: BTreeSet<AnnotationUse>,
    /// Resolved name
    pub name: Option<String>,
    /// Resolved scope
    pub scope: TypeName,
    /// Applied stereotypes
    pub stereotypes: BTreeSet<TypeName>,
    /// Class-level interceptor bindings
    pub interceptor_bindings: BTreeSet<AnnotationUse>,
    /// Dependencies
    pub injection_points: Vec<InjectionPoint>,
    /// Participates in resolution
    pub enabled: bool,
    /// Alternative bean
    pub alternative: bool,
    /// Passivation capable
    pub passivation_capable: bool,
    /// Interceptor data, for interceptors
    pub interceptor: Option<InterceptorMeta>,
    /// Decorator data, for decorators
    pub decorator: Option<DecoratorMeta>,
    /// Producer data, for producers
    pub producer: Option<ProducerMeta>,
    /// Interception plan, once the stack builder ran
    pub plan: Option<InterceptionPlan>,
    /// Bean that replaced this one through specialization
    pub specialized_by: Option<BeanId>,
}

impl BeanRecord {
    /// Record for a component, with qualifier defaults applied
    ///
    /// `types` is the bean type closure; `scope` the resolved scope.
    #[must_use]
    pub fn from_component(
        id: BeanId,
        kind: BeanKind,
        source: BeanSource,
        component: &ComponentDescriptor,
        types: BTreeSet<TypeRef>,
        scope: TypeName,
    ) -> Self {
        let mut record = Self {
            id,
            kind,
            source,
            bean_class: component.type_name.clone(),
            types,
            qualifiers: component.qualifiers.clone(),
            name: component.name.clone(),
            scope,
            stereotypes: component.stereotypes.clone(),
            interceptor_bindings: component.interceptor_bindings.clone(),
            injection_points: component.injection_points.clone(),
            enabled: true,
            alternative: component.alternative,
            passivation_capable: component.passivation_capable,
            interceptor: None,
            decorator: None,
            producer: None,
            plan: None,
            specialized_by: None,
        };
        record.apply_default_qualifiers();
        record
    }

    /// Container-provided bean of a single contract type
    #[must_use]
    pub fn built_in(
        id: BeanId,
        contract: TypeName,
        types: BTreeSet<TypeRef>,
        scope: TypeName,
    ) -> Self {
        let mut record = Self {
            id,
            kind: BeanKind::BuiltIn,
            source: BeanSource::Container,
            bean_class: contract,
            types,
            qualifiers: BTreeSet::new(),
            name: None,
            scope,
            stereotypes: BTreeSet::new(),
            interceptor_bindings: BTreeSet::new(),
            injection_points: Vec::new(),
            enabled: true,
            alternative: false,
            passivation_capable: true,
            interceptor: None,
            decorator: None,
            producer: None,
            plan: None,
            specialized_by: None,
        };
        record.apply_default_qualifiers();
        record
    }

    /// Add `@Any`, and `@Default` when only `@Named` (or nothing) is declared
    pub fn apply_default_qualifiers(&mut self) {
        if self.qualifiers.iter().all(|q| q.is(wellknown::NAMED) || q.is(wellknown::ANY)) {
            self.qualifiers.insert(AnnotationUse::default_qualifier());
        }
        self.qualifiers.insert(AnnotationUse::any_qualifier());
    }

    /// Whether the bean is an interceptor or decorator
    #[inline]
    #[must_use]
    pub fn is_interceptor_or_decorator(&self) -> bool {
        matches!(self.kind, BeanKind::Interceptor | BeanKind::Decorator)
    }

    /// Whether the bean has the given bean type
    #[must_use]
    pub fn has_type(&self, required: &TypeRef) -> bool {
        self.types.contains(&required.boxed())
    }

    /// Stable identifier used when the bean's instances are passivated
    #[must_use]
    pub fn passivation_id(&self) -> String {
        let mut id = format!("{}#{}", self.kind.tag(), self.bean_class);
        if let Some(producer) = &self.producer {
            id.push('#');
            id.push_str(&producer.member);
        }
        for q in &self.qualifiers {
            id.push('#');
            id.push_str(&q.to_string());
        }
        id
    }
}

impl Display for BeanRecord {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.kind, self.id, self.bean_class)?;
        if let Some(producer) = &self.producer {
            write!(f, ".{}", producer.member)?;
        }
        if let Some(name) = &self.name {
            write!(f, " named {name:?}")?;
        }
        Ok(())
    }
}
