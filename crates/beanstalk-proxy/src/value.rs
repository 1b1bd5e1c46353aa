//! Runtime values passed through proxied calls

use beanstalk_model::{wellknown, PrimitiveKind, TypeName, TypeRef};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Opaque reference to an application object
#[derive(Clone)]
pub struct ObjectRef {
    class: TypeName,
    handle: Arc<dyn Any + Send + Sync>,
}

impl ObjectRef {
    /// Wrap an object of the given class
    #[must_use]
    pub fn new(class: TypeName, handle: Arc<dyn Any + Send + Sync>) -> Self {
        Self { class, handle }
    }

    /// Runtime class
    #[inline]
    #[must_use]
    pub fn class(&self) -> &TypeName {
        &self.class
    }

    /// Borrow the object as a concrete type
    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.handle.downcast_ref()
    }
}

impl PartialEq for ObjectRef {
    fn eq(&self, other: &Self) -> bool {
        self.class == other.class && Arc::ptr_eq(&self.handle, &other.handle)
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectRef({})", self.class)
    }
}

/// A value on the proxy operand stack or in an argument list
///
/// Primitive variants are raw values; [`Value::Boxed`] is a primitive inside
/// its wrapper object.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Result of a void method
    Void,
    /// Null reference
    Null,
    /// `boolean`
    Boolean(bool),
    /// `char`
    Char(char),
    /// `byte`
    Byte(i8),
    /// `short`
    Short(i16),
    /// `int`
    Int(i32),
    /// `long`
    Long(i64),
    /// `float`
    Float(f32),
    /// `double`
    Double(f64),
    /// Boxed primitive
    Boxed(Box<Value>),
    /// String reference
    Text(String),
    /// Array reference
    Array(Vec<Value>),
    /// Any other object
    Object(ObjectRef),
}

impl Value {
    /// Primitive kind of a raw primitive value
    #[must_use]
    pub fn primitive_kind(&self) -> Option<PrimitiveKind> {
        match self {
            Self::Boolean(_) => Some(PrimitiveKind::Boolean),
            Self::Char(_) => Some(PrimitiveKind::Char),
            Self::Byte(_) => Some(PrimitiveKind::Byte),
            Self::Short(_) => Some(PrimitiveKind::Short),
            Self::Int(_) => Some(PrimitiveKind::Int),
            Self::Long(_) => Some(PrimitiveKind::Long),
            Self::Float(_) => Some(PrimitiveKind::Float),
            Self::Double(_) => Some(PrimitiveKind::Double),
            _ => None,
        }
    }

    /// Whether this is an object reference (including null)
    #[must_use]
    pub fn is_reference(&self) -> bool {
        matches!(
            self,
            Self::Null | Self::Boxed(_) | Self::Text(_) | Self::Array(_) | Self::Object(_)
        )
    }

    /// Box a raw primitive; references pass through
    #[must_use]
    pub fn into_boxed(self) -> Self {
        if self.primitive_kind().is_some() {
            Self::Boxed(Box::new(self))
        } else {
            self
        }
    }

    /// Unbox a boxed primitive; everything else passes through
    #[must_use]
    pub fn into_unboxed(self) -> Self {
        match self {
            Self::Boxed(inner) => *inner,
            other => other,
        }
    }

    /// Whether the value may be passed where `ty` is declared
    ///
    /// Reference types are only checked for being references, except for
    /// primitive wrappers and `String`.
    #[must_use]
    pub fn conforms_to(&self, ty: &TypeRef) -> bool {
        match ty {
            TypeRef::Void => matches!(self, Self::Void),
            TypeRef::Primitive(kind) => self.primitive_kind() == Some(*kind),
            TypeRef::Array(_) => matches!(self, Self::Null | Self::Array(_)),
            TypeRef::Object(name) => self.conforms_to_class(name),
        }
    }

    fn conforms_to_class(&self, name: &TypeName) -> bool {
        if let Some(kind) = PrimitiveKind::ALL
            .into_iter()
            .find(|k| k.wrapper_name() == name.as_str())
        {
            return match self {
                Self::Null => true,
                Self::Boxed(inner) => inner.primitive_kind() == Some(kind),
                _ => false,
            };
        }
        if name.as_str() == wellknown::STRING {
            return matches!(self, Self::Null | Self::Text(_));
        }
        self.is_reference()
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Int(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Long(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Double(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}
