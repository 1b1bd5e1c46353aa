//! Component descriptors, stereotype models and specialization edges

use crate::annotation::AnnotationUse;
use crate::injection::InjectionPoint;
use crate::name::TypeName;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt::{self, Display, Formatter};

/// What a discovered component declares about itself
///
/// Built once per candidate after extensions had their chance to adjust the
/// annotated type; never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentDescriptor {
    /// Implementation type
    pub type_name: TypeName,
    /// Explicitly declared scope, if any
    pub scope: Option<TypeName>,
    /// Declared qualifiers (without defaults)
    pub qualifiers: BTreeSet<AnnotationUse>,
    /// Applied stereotypes
    pub stereotypes: BTreeSet<TypeName>,
    /// Class-level interceptor bindings, including stereotype-inherited ones
    pub interceptor_bindings: BTreeSet<AnnotationUse>,
    /// Bean name after defaulting
    pub name: Option<String>,
    /// Implements the serialization marker
    pub passivation_capable: bool,
    /// Dependencies in declaration order
    pub injection_points: Vec<InjectionPoint>,
    /// Declared or stereotype-implied alternative
    pub alternative: bool,
    /// Annotated `@Specializes`
    pub specializes: bool,
    /// `@Priority` value
    pub priority: Option<i32>,
}

impl ComponentDescriptor {
    /// Descriptor with nothing declared
    #[must_use]
    pub fn new(type_name: TypeName) -> Self {
        Self {
            type_name,
            scope: None,
            qualifiers: BTreeSet::new(),
            stereotypes: BTreeSet::new(),
            interceptor_bindings: BTreeSet::new(),
            name: None,
            passivation_capable: false,
            injection_points: Vec::new(),
            alternative: false,
            specializes: false,
            priority: None,
        }
    }
}

/// Resolved stereotype
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StereotypeModel {
    /// Stereotype annotation type
    pub annotation_type: TypeName,
    /// Scope applied to beans that declare none
    pub default_scope: Option<TypeName>,
    /// Bindings applied to every bean carrying the stereotype
    pub interceptor_bindings: BTreeSet<AnnotationUse>,
    /// Beans carrying the stereotype get a defaulted name
    pub name_defaulting: bool,
    /// Beans carrying the stereotype are alternatives
    pub alternative: bool,
}

impl StereotypeModel {
    /// Model with no defaults
    #[must_use]
    pub fn new(annotation_type: TypeName) -> Self {
        Self {
            annotation_type,
            default_scope: None,
            interceptor_bindings: BTreeSet::new(),
            name_defaulting: false,
            alternative: false,
        }
    }

    /// Set the default scope
    #[must_use]
    pub fn with_default_scope(mut self, scope: TypeName) -> Self {
        self.default_scope = Some(scope);
        self
    }

    /// Enable name defaulting
    #[must_use]
    pub fn with_name_defaulting(mut self) -> Self {
        self.name_defaulting = true;
        self
    }
}

/// Where a specializer was declared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpecializationSource {
    /// `@Specializes` on a discovered class
    Classpath,
    /// `specializes` entry in a declarative manifest
    Declarative,
}

/// `specializer` replaces `target`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SpecializationEdge {
    /// Specializing type
    pub specializer: TypeName,
    /// Specialized (replaced) type, the specializer's direct superclass
    pub target: TypeName,
    /// Declaration source
    pub source: SpecializationSource,
}

impl Display for SpecializationEdge {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} specializes {}", self.specializer, self.target)
    }
}
