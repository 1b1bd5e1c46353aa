//! Injection points

use crate::annotation::AnnotationUse;
use crate::name::TypeName;
use crate::types::TypeRef;
use crate::wellknown;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt::{self, Display, Formatter};

/// Member through which a dependency is injected
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "member", rename_all = "snake_case")]
pub enum InjectionMember {
    /// Injected field
    Field {
        /// Field name
        name: String,
    },
    /// Parameter of the bean constructor
    ConstructorParameter {
        /// Zero-based parameter position
        index: usize,
    },
    /// Parameter of an initializer, producer or observer method
    MethodParameter {
        /// Method name
        method: String,
        /// Zero-based parameter position
        index: usize,
    },
}

impl Display for InjectionMember {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field { name } => write!(f, "field {name}"),
            Self::ConstructorParameter { index } => write!(f, "constructor parameter {index}"),
            Self::MethodParameter { method, index } => write!(f, "parameter {index} of {method}()"),
        }
    }
}

/// A dependency a bean needs satisfied
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InjectionPoint {
    /// Type declaring the member
    pub owner: TypeName,
    /// Injected member
    #[serde(flatten)]
    pub member: InjectionMember,
    /// Type the injected value must be assignable to
    pub required_type: TypeRef,
    /// Required qualifiers; empty means `@Default`
    #[serde(default)]
    pub qualifiers: BTreeSet<AnnotationUse>,
    /// Annotated `@Delegate`
    #[serde(default)]
    pub delegate: bool,
    /// Declared on a transient field
    #[serde(default)]
    pub transient: bool,
}

impl InjectionPoint {
    /// Unqualified, non-delegate injection point
    #[must_use]
    pub fn new(owner: TypeName, member: InjectionMember, required_type: TypeRef) -> Self {
        Self {
            owner,
            member,
            required_type,
            qualifiers: BTreeSet::new(),
            delegate: false,
            transient: false,
        }
    }

    /// Add a required qualifier
    #[must_use]
    pub fn with_qualifier(mut self, qualifier: AnnotationUse) -> Self {
        self.qualifiers.insert(qualifier);
        self
    }

    /// Mark as a delegate injection point
    #[must_use]
    pub fn as_delegate(mut self) -> Self {
        self.delegate = true;
        self
    }

    /// Whether the required type is the container self-reference
    /// or injection point metadata
    #[must_use]
    pub fn is_container_contract(&self) -> bool {
        self.required_type.as_object().is_some_and(|name| {
            name.as_str() == wellknown::BEAN_MANAGER || name.as_str() == wellknown::INJECTION_POINT
        })
    }

    /// Qualifiers to match, with `@Default` filled in when none are declared
    ///
    /// `@Named` alone also implies `@Default`.
    #[must_use]
    pub fn effective_qualifiers(&self) -> BTreeSet<AnnotationUse> {
        let mut qualifiers = self.qualifiers.clone();
        if qualifiers.iter().all(|q| q.is(wellknown::NAMED)) {
            qualifiers.insert(AnnotationUse::default_qualifier());
        }
        qualifiers
    }
}

impl Display for InjectionPoint {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.required_type, self.owner)?;
        write!(f, " ({})", self.member)?;
        for q in &self.qualifiers {
            write!(f, " {q}")?;
        }
        if self.delegate {
            f.write_str(" @Delegate")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn car_field() -> InjectionPoint {
        InjectionPoint::new(
            TypeName::new("com.acme.Garage").unwrap(),
            InjectionMember::Field { name: "car".into() },
            TypeRef::Object(TypeName::new("com.acme.Car").unwrap()),
        )
    }

    #[test]
    fn unqualified_point_requires_default() {
        let ip = car_field();
        let q = ip.effective_qualifiers();
        assert_eq!(q.len(), 1);
        assert!(q.contains(&AnnotationUse::default_qualifier()));
    }

    #[test]
    fn named_point_still_requires_default() {
        let ip = car_field().with_qualifier(AnnotationUse::named("car"));
        assert_eq!(ip.effective_qualifiers().len(), 2);
    }

    #[test]
    fn custom_qualifier_replaces_default() {
        let fast = AnnotationUse::marker(TypeName::new("com.acme.Fast").unwrap());
        let ip = car_field().with_qualifier(fast.clone());
        let q = ip.effective_qualifiers();
        assert_eq!(q.len(), 1);
        assert!(q.contains(&fast));
    }

    #[test]
    fn display_identifies_member() {
        let ip = car_field().as_delegate();
        let shown = ip.to_string();
        assert!(shown.contains("com.acme.Garage"));
        assert!(shown.contains("field car"));
        assert!(shown.ends_with("@Delegate"));
    }

    #[test]
    fn detects_container_contracts() {
        let mut ip = car_field();
        assert!(!ip.is_container_contract());
        ip.required_type = TypeRef::Object(TypeName::from_static(wellknown::BEAN_MANAGER));
        assert!(ip.is_container_contract());
    }
}
