//! Annotation uses
//!
//! An [`AnnotationUse`] is an annotation type applied to a declaration together
//! with its member values. Equality covers member values, which is what
//! qualifier matching relies on.

use crate::name::TypeName;
use crate::wellknown;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};

/// Value of an annotation member
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnnotationValue {
    /// Boolean member
    Bool(bool),
    /// Integer member
    Int(i64),
    /// String, class literal or enum constant member
    Text(String),
    /// Array member
    List(Vec<AnnotationValue>),
}

impl Display for AnnotationValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Text(s) => write!(f, "{s:?}"),
            Self::List(items) => {
                f.write_str("{")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("}")
            }
        }
    }
}

/// An annotation applied to a declaration
///
/// Deserializes from either a bare type name (`beanstalk.Inject`) or a map
/// with `type` and `members`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "AnnotationRepr")]
pub struct AnnotationUse {
    /// Annotation type
    #[serde(rename = "type")]
    pub annotation_type: TypeName,
    /// Member values by member name
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub members: BTreeMap<String, AnnotationValue>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum AnnotationRepr {
    Marker(TypeName),
    Full {
        #[serde(rename = "type")]
        annotation_type: TypeName,
        #[serde(default)]
        members: BTreeMap<String, AnnotationValue>,
    },
}

impl From<AnnotationRepr> for AnnotationUse {
    fn from(value: AnnotationRepr) -> Self {
        match value {
            AnnotationRepr::Marker(annotation_type) => Self::marker(annotation_type),
            AnnotationRepr::Full {
                annotation_type,
                members,
            } => Self {
                annotation_type,
                members,
            },
        }
    }
}

impl AnnotationUse {
    /// Annotation without members
    #[inline]
    #[must_use]
    pub fn marker(annotation_type: TypeName) -> Self {
        Self {
            annotation_type,
            members: BTreeMap::new(),
        }
    }

    /// Marker annotation for a well-known type
    #[inline]
    #[must_use]
    pub fn well_known(annotation_type: &'static str) -> Self {
        Self::marker(TypeName::from_static(annotation_type))
    }

    /// `@Named(value)`
    #[must_use]
    pub fn named(value: impl Into<String>) -> Self {
        Self::well_known(wellknown::NAMED).with_member("value", AnnotationValue::Text(value.into()))
    }

    /// `@Default`
    #[must_use]
    pub fn default_qualifier() -> Self {
        Self::well_known(wellknown::DEFAULT)
    }

    /// `@Any`
    #[must_use]
    pub fn any_qualifier() -> Self {
        Self::well_known(wellknown::ANY)
    }

    /// Set a member value
    #[must_use]
    pub fn with_member(mut self, name: impl Into<String>, value: AnnotationValue) -> Self {
        self.members.insert(name.into(), value);
        self
    }

    /// Whether the annotation has the given type
    #[inline]
    #[must_use]
    pub fn is(&self, annotation_type: &str) -> bool {
        self.annotation_type.as_str() == annotation_type
    }

    /// Raw member value
    #[inline]
    #[must_use]
    pub fn member(&self, name: &str) -> Option<&AnnotationValue> {
        self.members.get(name)
    }

    /// String member value
    #[must_use]
    pub fn text_member(&self, name: &str) -> Option<&str> {
        match self.members.get(name) {
            Some(AnnotationValue::Text(s)) => Some(s),
            _ => None,
        }
    }

    /// Integer member value
    #[must_use]
    pub fn int_member(&self, name: &str) -> Option<i64> {
        match self.members.get(name) {
            Some(AnnotationValue::Int(i)) => Some(*i),
            _ => None,
        }
    }

    /// Boolean member value
    #[must_use]
    pub fn bool_member(&self, name: &str) -> Option<bool> {
        match self.members.get(name) {
            Some(AnnotationValue::Bool(b)) => Some(*b),
            _ => None,
        }
    }
}

impl Display for AnnotationUse {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.annotation_type.simple_name())?;
        if self.members.is_empty() {
            return Ok(());
        }
        f.write_str("(")?;
        for (i, (name, value)) in self.members.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{name}={value}")?;
        }
        f.write_str(")")
    }
}

/// Find an annotation of the given type in a list
#[must_use]
pub fn find<'a>(
    annotations: &'a [AnnotationUse],
    annotation_type: &str,
) -> Option<&'a AnnotationUse> {
    annotations.iter().find(|a| a.is(annotation_type))
}
