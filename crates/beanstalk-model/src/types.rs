//! Type references, primitive kinds and modifiers

use crate::error::ModelError;
use crate::name::TypeName;
use crate::wellknown;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// The eight primitive kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveKind {
    /// `boolean`
    Boolean,
    /// `char`
    Char,
    /// `byte`
    Byte,
    /// `short`
    Short,
    /// `int`
    Int,
    /// `long`
    Long,
    /// `float`
    Float,
    /// `double`
    Double,
}

impl PrimitiveKind {
    /// Every primitive kind, in declaration order
    pub const ALL: [Self; 8] = [
        Self::Boolean,
        Self::Char,
        Self::Byte,
        Self::Short,
        Self::Int,
        Self::Long,
        Self::Float,
        Self::Double,
    ];

    /// Source keyword
    #[must_use]
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Boolean => "boolean",
            Self::Char => "char",
            Self::Byte => "byte",
            Self::Short => "short",
            Self::Int => "int",
            Self::Long => "long",
            Self::Float => "float",
            Self::Double => "double",
        }
    }

    /// Parse a source keyword
    #[must_use]
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.keyword() == keyword)
    }

    /// Number of local variable slots a value of this kind occupies
    #[inline]
    #[must_use]
    pub const fn slot_width(self) -> u16 {
        match self {
            Self::Long | Self::Double => 2,
            _ => 1,
        }
    }

    /// Whether values are handled with the int instruction family
    #[inline]
    #[must_use]
    pub const fn is_int_like(self) -> bool {
        matches!(
            self,
            Self::Boolean | Self::Char | Self::Byte | Self::Short | Self::Int
        )
    }

    /// Name of the boxing wrapper type
    #[must_use]
    pub const fn wrapper_name(self) -> &'static str {
        match self {
            Self::Boolean => wellknown::BOOLEAN,
            Self::Char => wellknown::CHARACTER,
            Self::Byte => wellknown::BYTE,
            Self::Short => wellknown::SHORT,
            Self::Int => wellknown::INTEGER,
            Self::Long => wellknown::LONG,
            Self::Float => wellknown::FLOAT,
            Self::Double => wellknown::DOUBLE,
        }
    }

    /// Wrapper type as a [`TypeName`]
    #[must_use]
    pub fn wrapper_type(self) -> TypeName {
        TypeName::from_static(self.wrapper_name())
    }
}

impl Display for PrimitiveKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// Reference to a type as it appears in a signature
///
/// Serialized as its source spelling: `void`, `int`, `com.acme.Car`, `int[]`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TypeRef {
    /// No value
    Void,
    /// Primitive value
    Primitive(PrimitiveKind),
    /// Reference to a class or interface
    Object(TypeName),
    /// Array of a component type
    Array(Box<TypeRef>),
}

impl TypeRef {
    /// Reference to a named type
    #[inline]
    #[must_use]
    pub fn object(name: TypeName) -> Self {
        Self::Object(name)
    }

    /// Reference to the universal root type
    #[must_use]
    pub fn root() -> Self {
        Self::Object(TypeName::root())
    }

    /// Named type, if this is an object reference
    #[must_use]
    pub fn as_object(&self) -> Option<&TypeName> {
        match self {
            Self::Object(name) => Some(name),
            _ => None,
        }
    }

    /// Primitive kind, if this is a primitive
    #[must_use]
    pub fn as_primitive(&self) -> Option<PrimitiveKind> {
        match self {
            Self::Primitive(kind) => Some(*kind),
            _ => None,
        }
    }

    /// Whether this is `void`
    #[inline]
    #[must_use]
    pub fn is_void(&self) -> bool {
        matches!(self, Self::Void)
    }

    /// Whether values are object references (objects and arrays)
    #[inline]
    #[must_use]
    pub fn is_reference(&self) -> bool {
        matches!(self, Self::Object(_) | Self::Array(_))
    }

    /// Local variable slots occupied by a value of this type
    #[must_use]
    pub fn slot_width(&self) -> u16 {
        match self {
            Self::Void => 0,
            Self::Primitive(kind) => kind.slot_width(),
            Self::Object(_) | Self::Array(_) => 1,
        }
    }

    /// The boxed form: primitives become their wrapper, everything else is unchanged
    #[must_use]
    pub fn boxed(&self) -> Self {
        match self {
            Self::Primitive(kind) => Self::Object(kind.wrapper_type()),
            other => other.clone(),
        }
    }
}

impl Display for TypeRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Void => f.write_str("void"),
            Self::Primitive(kind) => Display::fmt(kind, f),
            Self::Object(name) => Display::fmt(name, f),
            Self::Array(component) => write!(f, "{component}[]"),
        }
    }
}

impl FromStr for TypeRef {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(component) = s.strip_suffix("[]") {
            let component: Self = component.parse()?;
            if component.is_void() {
                return Err(ModelError::InvalidTypeRef(s.to_string()));
            }
            return Ok(Self::Array(Box::new(component)));
        }
        if s == "void" {
            return Ok(Self::Void);
        }
        if let Some(kind) = PrimitiveKind::from_keyword(s) {
            return Ok(Self::Primitive(kind));
        }
        TypeName::new(s)
            .map(Self::Object)
            .map_err(|_| ModelError::InvalidTypeRef(s.to_string()))
    }
}

impl TryFrom<String> for TypeRef {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TypeRef> for String {
    fn from(value: TypeRef) -> Self {
        value.to_string()
    }
}

impl From<TypeName> for TypeRef {
    fn from(value: TypeName) -> Self {
        Self::Object(value)
    }
}

impl From<PrimitiveKind> for TypeRef {
    fn from(value: PrimitiveKind) -> Self {
        Self::Primitive(value)
    }
}

/// Kind of type declaration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeKind {
    /// Concrete or abstract class
    #[default]
    Class,
    /// Interface
    Interface,
    /// Annotation type
    Annotation,
    /// Enumeration
    Enum,
}

/// A single declaration modifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modifier {
    /// `public`
    Public,
    /// `protected`
    Protected,
    /// `private`
    Private,
    /// `abstract`
    Abstract,
    /// `final`
    Final,
    /// `static`
    Static,
    /// `native`
    Native,
    /// `transient`
    Transient,
    /// `synthetic`
    Synthetic,
}

impl Modifier {
    const ALL: [Self; 9] = [
        Self::Public,
        Self::Protected,
        Self::Private,
        Self::Abstract,
        Self::Final,
        Self::Static,
        Self::Native,
        Self::Transient,
        Self::Synthetic,
    ];

    #[inline]
    const fn bit(self) -> u16 {
        1 << (self as u16)
    }
}

/// Set of declaration modifiers
///
/// Serialized as a list: `[public, final]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Vec<Modifier>", into = "Vec<Modifier>")]
pub struct Modifiers(u16);

impl Modifiers {
    /// No modifiers (package visibility)
    #[inline]
    #[must_use]
    pub const fn none() -> Self {
        Self(0)
    }

    /// Just `public`
    #[inline]
    #[must_use]
    pub const fn public() -> Self {
        Self(Modifier::Public.bit())
    }

    /// Add a modifier
    #[inline]
    #[must_use]
    pub const fn with(self, modifier: Modifier) -> Self {
        Self(self.0 | modifier.bit())
    }

    /// Check for a modifier
    #[inline]
    #[must_use]
    pub const fn has(self, modifier: Modifier) -> bool {
        self.0 & modifier.bit() != 0
    }

    /// `private`
    #[inline]
    #[must_use]
    pub const fn is_private(self) -> bool {
        self.has(Modifier::Private)
    }

    /// `abstract`
    #[inline]
    #[must_use]
    pub const fn is_abstract(self) -> bool {
        self.has(Modifier::Abstract)
    }

    /// `final`
    #[inline]
    #[must_use]
    pub const fn is_final(self) -> bool {
        self.has(Modifier::Final)
    }

    /// `static`
    #[inline]
    #[must_use]
    pub const fn is_static(self) -> bool {
        self.has(Modifier::Static)
    }

    /// `native`
    #[inline]
    #[must_use]
    pub const fn is_native(self) -> bool {
        self.has(Modifier::Native)
    }

    /// `transient`
    #[inline]
    #[must_use]
    pub const fn is_transient(self) -> bool {
        self.has(Modifier::Transient)
    }

    /// Modifiers in canonical order
    pub fn iter(self) -> impl Iterator<Item = Modifier> {
        Modifier::ALL.into_iter().filter(move |m| self.has(*m))
    }
}

impl From<Vec<Modifier>> for Modifiers {
    fn from(value: Vec<Modifier>) -> Self {
        value.into_iter().fold(Self::none(), Self::with)
    }
}

impl From<Modifiers> for Vec<Modifier> {
    fn from(value: Modifiers) -> Self {
        value.iter().collect()
    }
}
