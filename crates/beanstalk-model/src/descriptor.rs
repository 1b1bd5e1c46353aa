//! Type descriptors
//!
//! Explicit, serializable descriptions of discovered types. Discovery hands the
//! container these instead of letting it reflect over a host runtime.

use crate::annotation::{self, AnnotationUse};
use crate::name::TypeName;
use crate::types::{Modifiers, TypeKind, TypeRef};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Name of the finalizer method, which is never intercepted or proxied
pub const FINALIZER: &str = "finalize";

/// Method or constructor parameter
///
/// Deserializes from a bare type (`int`) or a map with `type` and `annotations`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "ParameterRepr")]
pub struct ParameterDescriptor {
    /// Declared type
    #[serde(rename = "type")]
    pub param_type: TypeRef,
    /// Parameter annotations
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<AnnotationUse>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ParameterRepr {
    Bare(TypeRef),
    Full {
        #[serde(rename = "type")]
        param_type: TypeRef,
        #[serde(default)]
        annotations: Vec<AnnotationUse>,
    },
}

impl From<ParameterRepr> for ParameterDescriptor {
    fn from(value: ParameterRepr) -> Self {
        match value {
            ParameterRepr::Bare(param_type) => Self::new(param_type),
            ParameterRepr::Full {
                param_type,
                annotations,
            } => Self {
                param_type,
                annotations,
            },
        }
    }
}

impl ParameterDescriptor {
    /// Unannotated parameter
    #[inline]
    #[must_use]
    pub fn new(param_type: TypeRef) -> Self {
        Self {
            param_type,
            annotations: Vec::new(),
        }
    }

    /// Add an annotation
    #[must_use]
    pub fn with_annotation(mut self, annotation: AnnotationUse) -> Self {
        self.annotations.push(annotation);
        self
    }
}

/// Override identity of a method: name plus parameter types
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MethodSignature {
    /// Method name
    pub name: String,
    /// Parameter types
    pub parameters: Vec<TypeRef>,
}

impl MethodSignature {
    /// Create a signature
    #[must_use]
    pub fn new(name: impl Into<String>, parameters: Vec<TypeRef>) -> Self {
        Self {
            name: name.into(),
            parameters,
        }
    }
}

impl Display for MethodSignature {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        for (i, p) in self.parameters.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{p}")?;
        }
        f.write_str(")")
    }
}

/// Declared method
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodDescriptor {
    /// Method name
    pub name: String,
    /// Parameters in order
    #[serde(default)]
    pub parameters: Vec<ParameterDescriptor>,
    /// Return type
    #[serde(default = "void")]
    pub return_type: TypeRef,
    /// Modifiers
    #[serde(default)]
    pub modifiers: Modifiers,
    /// Method annotations
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<AnnotationUse>,
}

fn void() -> TypeRef {
    TypeRef::Void
}

impl MethodDescriptor {
    /// Public no-arg void method
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parameters: Vec::new(),
            return_type: TypeRef::Void,
            modifiers: Modifiers::public(),
            annotations: Vec::new(),
        }
    }

    /// Override identity
    #[must_use]
    pub fn signature(&self) -> MethodSignature {
        MethodSignature::new(
            self.name.clone(),
            self.parameters.iter().map(|p| p.param_type.clone()).collect(),
        )
    }

    /// Whether this is the no-arg finalizer
    #[inline]
    #[must_use]
    pub fn is_finalizer(&self) -> bool {
        self.name == FINALIZER && self.parameters.is_empty()
    }

    /// Whether an interceptor may wrap this method
    ///
    /// Excludes private, static, final and native methods and the finalizer.
    #[must_use]
    pub fn is_interceptable(&self) -> bool {
        let m = self.modifiers;
        !(m.is_private() || m.is_static() || m.is_final() || m.is_native() || self.is_finalizer())
    }

    /// Whether a subclass proxy may override this method
    ///
    /// Same as [`Self::is_interceptable`], additionally excluding abstract methods.
    #[must_use]
    pub fn is_proxyable(&self) -> bool {
        self.is_interceptable() && !self.modifiers.is_abstract()
    }

    /// Find a method annotation
    #[must_use]
    pub fn annotation(&self, annotation_type: &str) -> Option<&AnnotationUse> {
        annotation::find(&self.annotations, annotation_type)
    }

    /// Whether the method carries an annotation
    #[must_use]
    pub fn has_annotation(&self, annotation_type: &str) -> bool {
        self.annotation(annotation_type).is_some()
    }

    /// Parameter types in order
    pub fn parameter_types(&self) -> impl Iterator<Item = &TypeRef> {
        self.parameters.iter().map(|p| &p.param_type)
    }
}

/// Declared field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    /// Field name
    pub name: String,
    /// Declared type
    #[serde(rename = "type")]
    pub field_type: TypeRef,
    /// Modifiers
    #[serde(default)]
    pub modifiers: Modifiers,
    /// Field annotations
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<AnnotationUse>,
}

impl FieldDescriptor {
    /// Private field of the given type
    #[must_use]
    pub fn new(name: impl Into<String>, field_type: TypeRef) -> Self {
        Self {
            name: name.into(),
            field_type,
            modifiers: Modifiers::none().with(crate::types::Modifier::Private),
            annotations: Vec::new(),
        }
    }

    /// Whether the field carries an annotation
    #[must_use]
    pub fn has_annotation(&self, annotation_type: &str) -> bool {
        annotation::find(&self.annotations, annotation_type).is_some()
    }
}

/// Declared constructor
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstructorDescriptor {
    /// Parameters in order
    #[serde(default)]
    pub parameters: Vec<ParameterDescriptor>,
    /// Modifiers
    #[serde(default)]
    pub modifiers: Modifiers,
    /// Constructor annotations
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<AnnotationUse>,
}

impl ConstructorDescriptor {
    /// Whether the constructor carries an annotation
    #[must_use]
    pub fn has_annotation(&self, annotation_type: &str) -> bool {
        annotation::find(&self.annotations, annotation_type).is_some()
    }
}

/// Full description of a discovered type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDescriptor {
    /// Fully qualified name
    pub name: TypeName,
    /// Declaration kind
    #[serde(default)]
    pub kind: TypeKind,
    /// Modifiers
    #[serde(default)]
    pub modifiers: Modifiers,
    /// Declared superclass; classes without one extend the root type
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub superclass: Option<TypeName>,
    /// Directly implemented (or extended, for interfaces) interfaces
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub interfaces: Vec<TypeName>,
    /// Type-level annotations
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<AnnotationUse>,
    /// Declared fields
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldDescriptor>,
    /// Declared constructors; empty means an implicit no-arg constructor
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub constructors: Vec<ConstructorDescriptor>,
    /// Declared methods
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub methods: Vec<MethodDescriptor>,
    /// Non-static nested class
    #[serde(default)]
    pub inner: bool,
}

impl TypeDescriptor {
    /// Public class extending the root type
    #[must_use]
    pub fn new(name: TypeName, kind: TypeKind) -> Self {
        Self {
            name,
            kind,
            modifiers: Modifiers::public(),
            superclass: None,
            interfaces: Vec::new(),
            annotations: Vec::new(),
            fields: Vec::new(),
            constructors: Vec::new(),
            methods: Vec::new(),
            inner: false,
        }
    }

    /// Superclass after defaulting
    ///
    /// Classes and enums without a declared superclass extend the root type;
    /// interfaces, annotations and the root itself have none.
    #[must_use]
    pub fn effective_superclass(&self) -> Option<TypeName> {
        if self.name.is_root() {
            return None;
        }
        match self.kind {
            TypeKind::Class | TypeKind::Enum => {
                Some(self.superclass.clone().unwrap_or_else(TypeName::root))
            }
            TypeKind::Interface | TypeKind::Annotation => None,
        }
    }

    /// Whether this is a class (not an interface, annotation or enum)
    #[inline]
    #[must_use]
    pub fn is_class(&self) -> bool {
        self.kind == TypeKind::Class
    }

    /// Whether this is an interface
    #[inline]
    #[must_use]
    pub fn is_interface(&self) -> bool {
        self.kind == TypeKind::Interface
    }

    /// Whether this is an annotation type
    #[inline]
    #[must_use]
    pub fn is_annotation(&self) -> bool {
        self.kind == TypeKind::Annotation
    }

    /// Whether the type is declared abstract
    #[inline]
    #[must_use]
    pub fn is_abstract(&self) -> bool {
        self.modifiers.is_abstract()
    }

    /// Find a type-level annotation
    #[must_use]
    pub fn annotation(&self, annotation_type: &str) -> Option<&AnnotationUse> {
        annotation::find(&self.annotations, annotation_type)
    }

    /// Whether the type carries an annotation
    #[must_use]
    pub fn has_annotation(&self, annotation_type: &str) -> bool {
        self.annotation(annotation_type).is_some()
    }

    /// Declared method with the given signature
    #[must_use]
    pub fn declared_method(&self, signature: &MethodSignature) -> Option<&MethodDescriptor> {
        self.methods.iter().find(|m| &m.signature() == signature)
    }

    /// Whether a no-arg constructor exists (declared or implicit)
    #[must_use]
    pub fn has_no_arg_constructor(&self) -> bool {
        self.constructors.is_empty()
            || self
                .constructors
                .iter()
                .any(|c| c.parameters.is_empty() && !c.modifiers.is_private())
    }

    /// Constructors annotated `@Inject`
    pub fn inject_constructors(&self) -> impl Iterator<Item = &ConstructorDescriptor> {
        self.constructors
            .iter()
            .filter(|c| c.has_annotation(crate::wellknown::INJECT))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Modifier, PrimitiveKind};
    use crate::wellknown;

    fn name(s: &str) -> TypeName {
        TypeName::new(s).unwrap()
    }

    #[test]
    fn class_defaults_to_root_superclass() {
        let car = TypeDescriptor::new(name("com.acme.Car"), TypeKind::Class);
        assert_eq!(car.effective_superclass(), Some(TypeName::root()));

        let iface = TypeDescriptor::new(name("com.acme.Vehicle"), TypeKind::Interface);
        assert_eq!(iface.effective_superclass(), None);

        let root = TypeDescriptor::new(TypeName::root(), TypeKind::Class);
        assert_eq!(root.effective_superclass(), None);
    }

    #[test]
    fn signature_ignores_return_type() {
        let mut a = MethodDescriptor::new("speed");
        a.parameters.push(ParameterDescriptor::new(TypeRef::Primitive(PrimitiveKind::Int)));
        let mut b = a.clone();
        b.return_type = TypeRef::Primitive(PrimitiveKind::Long);
        assert_eq!(a.signature(), b.signature());
        assert_eq!(a.signature().to_string(), "speed(int)");
    }

    #[test]
    fn finalizer_is_not_interceptable() {
        let mut finalize = MethodDescriptor::new(FINALIZER);
        finalize.modifiers = Modifiers::none().with(Modifier::Protected);
        assert!(finalize.is_finalizer());
        assert!(!finalize.is_interceptable());
    }

    #[test]
    fn abstract_method_is_interceptable_but_not_proxyable() {
        let mut m = MethodDescriptor::new("run");
        m.modifiers = Modifiers::public().with(Modifier::Abstract);
        assert!(m.is_interceptable());
        assert!(!m.is_proxyable());
    }

    #[test]
    fn implicit_constructor_counts_as_no_arg() {
        let mut car = TypeDescriptor::new(name("com.acme.Car"), TypeKind::Class);
        assert!(car.has_no_arg_constructor());

        car.constructors.push(ConstructorDescriptor {
            parameters: vec![ParameterDescriptor::new(TypeRef::Primitive(PrimitiveKind::Int))],
            modifiers: Modifiers::public(),
            annotations: vec![AnnotationUse::well_known(wellknown::INJECT)],
        });
        assert!(!car.has_no_arg_constructor());
        assert_eq!(car.inject_constructors().count(), 1);
    }

    #[test]
    fn deserializes_compact_yaml() {
        let yaml = r"
name: com.acme.Car
annotations: [beanstalk.Named]
methods:
  - name: drive
    parameters: [int, {type: com.acme.Road, annotations: [com.acme.Paved]}]
    return_type: boolean
";
        let car: TypeDescriptor = serde_yaml::from_str(yaml).unwrap();
        assert!(car.is_class());
        assert!(car.has_annotation(wellknown::NAMED));
        let drive = &car.methods[0];
        assert_eq!(drive.signature().to_string(), "drive(int,com.acme.Road)");
        assert_eq!(drive.parameters[1].annotations.len(), 1);
        assert_eq!(drive.modifiers, Modifiers::none());
    }
}
