//! Fully qualified type names
//!
//! Provides [`TypeName`], the identity used for every type the container knows about.

use crate::error::ModelError;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;
use std::sync::Arc;

/// Fully qualified, dot separated type name
///
/// Cheap to clone (shared `Arc<str>`).
///
/// # Examples
/// - `com.acme.Car`
/// - `com.acme.Outer$Inner`
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TypeName(Arc<str>);

impl TypeName {
    /// Parse and validate a type name
    ///
    /// # Errors
    /// Returns error if a segment is empty or contains characters other than
    /// alphanumerics, `_` and `$`.
    pub fn new(name: impl AsRef<str>) -> Result<Self, ModelError> {
        let name = name.as_ref();
        if name.is_empty() {
            return Err(ModelError::InvalidTypeName(name.to_string()));
        }
        for segment in name.split('.') {
            let valid = !segment.is_empty()
                && segment
                    .chars()
                    .all(|c| c.is_alphanumeric() || c == '_' || c == '$');
            if !valid {
                return Err(ModelError::InvalidTypeName(name.to_string()));
            }
        }
        Ok(Self(Arc::from(name)))
    }

    /// Build a name from a trusted static string without validation
    #[inline]
    #[must_use]
    pub fn from_static(name: &'static str) -> Self {
        Self(Arc::from(name))
    }

    /// The universal root type every class ultimately extends
    #[inline]
    #[must_use]
    pub fn root() -> Self {
        Self::from_static(crate::wellknown::OBJECT)
    }

    /// Whether this is the universal root type
    #[inline]
    #[must_use]
    pub fn is_root(&self) -> bool {
        &*self.0 == crate::wellknown::OBJECT
    }

    /// Full name
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Last segment (`Car` for `com.acme.Car`)
    #[must_use]
    pub fn simple_name(&self) -> &str {
        self.0.rsplit('.').next().unwrap_or(&self.0)
    }

    /// Everything before the last segment, if any
    #[must_use]
    pub fn package(&self) -> Option<&str> {
        self.0.rfind('.').map(|i| &self.0[..i])
    }

    /// Append a suffix to the last segment (`Car` + `$$Proxy0`)
    ///
    /// The suffix is not validated; callers use it for generated names.
    #[must_use]
    pub fn with_suffix(&self, suffix: &str) -> Self {
        Self(Arc::from(format!("{}{}", self.0, suffix)))
    }
}

impl fmt::Debug for TypeName {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "TypeName({})", self.0)
    }
}

impl Display for TypeName {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for TypeName {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for TypeName {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TypeName> for String {
    fn from(value: TypeName) -> Self {
        value.0.to_string()
    }
}

impl AsRef<str> for TypeName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for TypeName {
    fn borrow(&self) -> &str {
        &self.0
    }
}
