//! Discovery boundary
//!
//! Discovery hands the container an explicit list of type descriptors; the
//! container never inspects a host type system.

use beanstalk_model::{TypeDescriptor, TypeKind, TypeName, TypeUniverse};
use serde::{Deserialize, Serialize};

/// Declarative configuration resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclarativeResource {
    /// Where the resource came from, used in error messages
    pub locator: String,
    /// YAML text
    pub content: String,
}

impl DeclarativeResource {
    /// Resource from a locator and its text
    #[must_use]
    pub fn new(locator: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            locator: locator.into(),
            content: content.into(),
        }
    }
}

/// Source of candidate types for one deployment
///
/// Must return the same data for the duration of a deployment.
pub trait Discovery {
    /// Every known type, libraries included
    fn universe(&self) -> &TypeUniverse;

    /// Types to consider as beans, in discovery order
    fn candidates(&self) -> &[TypeName];

    /// Declarative configuration resources
    fn declarative_resources(&self) -> &[DeclarativeResource];
}

/// Discovery over a fixed list
#[derive(Debug, Clone, Default)]
pub struct StaticDiscovery {
    universe: TypeUniverse,
    candidates: Vec<TypeName>,
    resources: Vec<DeclarativeResource>,
}

impl StaticDiscovery {
    /// Discovery over a universe, with no candidates yet
    #[must_use]
    pub fn new(universe: TypeUniverse) -> Self {
        Self {
            universe,
            candidates: Vec::new(),
            resources: Vec::new(),
        }
    }

    /// Add one candidate
    #[must_use]
    pub fn with_candidate(mut self, name: TypeName) -> Self {
        self.candidates.push(name);
        self
    }

    /// Add candidates
    #[must_use]
    pub fn with_candidates(mut self, names: impl IntoIterator<Item = TypeName>) -> Self {
        self.candidates.extend(names);
        self
    }

    /// Add a declarative resource
    #[must_use]
    pub fn with_resource(mut self, resource: DeclarativeResource) -> Self {
        self.resources.push(resource);
        self
    }
}

impl Discovery for StaticDiscovery {
    fn universe(&self) -> &TypeUniverse {
        &self.universe
    }

    fn candidates(&self) -> &[TypeName] {
        &self.candidates
    }

    fn declarative_resources(&self) -> &[DeclarativeResource] {
        &self.resources
    }
}

/// Serialized application: the types of an archive plus its libraries
///
/// Every non-annotation type in `types` is a candidate; `library` types are
/// only visible for lookups.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationDescriptor {
    /// Application types
    #[serde(default)]
    pub types: Vec<TypeDescriptor>,
    /// Library types
    #[serde(default)]
    pub library: Vec<TypeDescriptor>,
}

impl ApplicationDescriptor {
    /// Parse YAML (JSON is valid YAML)
    ///
    /// # Errors
    /// Returns the parser error.
    pub fn from_yaml(source: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(source)
    }

    /// Parse JSON
    ///
    /// # Errors
    /// Returns the parser error.
    pub fn from_json(source: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(source)
    }

    /// Discovery over the described types
    #[must_use]
    pub fn into_discovery(self) -> StaticDiscovery {
        let candidates: Vec<TypeName> = self
            .types
            .iter()
            .filter(|t| t.kind != TypeKind::Annotation)
            .map(|t| t.name.clone())
            .collect();
        let mut universe = TypeUniverse::with_types(self.library);
        universe.extend(self.types);
        StaticDiscovery::new(universe).with_candidates(candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const APP: &str = r"
types:
  - name: com.acme.Logged
    kind: annotation
    annotations: [beanstalk.InterceptorBinding]
  - name: com.acme.Car
    annotations: [com.acme.Logged]
library:
  - name: com.lib.Engine
";

    #[test]
    fn annotations_are_not_candidates() {
        let discovery = ApplicationDescriptor::from_yaml(APP).unwrap().into_discovery();
        let candidates: Vec<_> = discovery.candidates().iter().map(TypeName::as_str).collect();
        assert_eq!(candidates, vec!["com.acme.Car"]);
        assert!(discovery.universe().contains("com.lib.Engine"));
        assert!(discovery.universe().contains("com.acme.Logged"));
    }

    #[test]
    fn json_descriptors_parse() {
        let json = r#"{"types": [{"name": "com.acme.Pojo"}]}"#;
        let discovery = ApplicationDescriptor::from_json(json).unwrap().into_discovery();
        assert_eq!(discovery.candidates().len(), 1);
        assert!(discovery.declarative_resources().is_empty());
    }
}
