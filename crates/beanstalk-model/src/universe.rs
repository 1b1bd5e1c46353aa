//! Type universe
//!
//! All type descriptors known to one deployment: platform library types,
//! application types and container contracts supplied by discovery.

use crate::descriptor::{MethodDescriptor, MethodSignature, TypeDescriptor};
use crate::error::ModelError;
use crate::name::TypeName;
use crate::types::{Modifier, Modifiers, PrimitiveKind, TypeKind, TypeRef};
use crate::wellknown;
use indexmap::IndexMap;
use std::collections::{BTreeSet, HashSet};

/// A method visible on a class, paired with the type that declares it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisibleMethod<'a> {
    /// Declaring type
    pub declaring_type: &'a TypeName,
    /// Method
    pub method: &'a MethodDescriptor,
}

/// Map of every type descriptor known to a deployment
#[derive(Debug, Clone)]
pub struct TypeUniverse {
    types: IndexMap<TypeName, TypeDescriptor>,
}

impl Default for TypeUniverse {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeUniverse {
    /// Universe seeded with the platform library types
    ///
    /// Contains the root type, the serialization marker, `String` and the
    /// eight primitive wrappers.
    #[must_use]
    pub fn new() -> Self {
        let mut universe = Self {
            types: IndexMap::new(),
        };
        universe.insert(root_descriptor());

        let serializable = TypeName::from_static(wellknown::SERIALIZABLE);
        universe.insert(TypeDescriptor::new(serializable.clone(), TypeKind::Interface));

        let mut string = TypeDescriptor::new(
            TypeName::from_static(wellknown::STRING),
            TypeKind::Class,
        );
        string.modifiers = Modifiers::public().with(Modifier::Final);
        string.interfaces.push(serializable.clone());
        universe.insert(string);

        for kind in PrimitiveKind::ALL {
            let mut wrapper = TypeDescriptor::new(kind.wrapper_type(), TypeKind::Class);
            wrapper.modifiers = Modifiers::public().with(Modifier::Final);
            wrapper.interfaces.push(serializable.clone());
            universe.insert(wrapper);
        }
        universe
    }

    /// Universe seeded with the platform types plus the given descriptors
    #[must_use]
    pub fn with_types(types: impl IntoIterator<Item = TypeDescriptor>) -> Self {
        let mut universe = Self::new();
        universe.extend(types);
        universe
    }

    /// Insert a descriptor, returning the one it replaced
    pub fn insert(&mut self, descriptor: TypeDescriptor) -> Option<TypeDescriptor> {
        self.types.insert(descriptor.name.clone(), descriptor)
    }

    /// Insert many descriptors
    pub fn extend(&mut self, descriptors: impl IntoIterator<Item = TypeDescriptor>) {
        for d in descriptors {
            self.insert(d);
        }
    }

    /// Look up a descriptor
    #[inline]
    #[must_use]
    pub fn get(&self, name: impl AsRef<str>) -> Option<&TypeDescriptor> {
        self.types.get(name.as_ref())
    }

    /// Look up a descriptor that must exist
    ///
    /// # Errors
    /// Returns [`ModelError::UnknownType`] if the type is not in the universe.
    pub fn require(&self, name: &TypeName) -> Result<&TypeDescriptor, ModelError> {
        self.types
            .get(name)
            .ok_or_else(|| ModelError::UnknownType(name.clone()))
    }

    /// Whether the universe knows the type
    #[inline]
    #[must_use]
    pub fn contains(&self, name: impl AsRef<str>) -> bool {
        self.types.contains_key(name.as_ref())
    }

    /// Number of known types
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Whether the universe is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Descriptors in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &TypeDescriptor> {
        self.types.values()
    }

    /// Superclasses from the direct superclass up to the root, inclusive
    ///
    /// A superclass missing from the universe ends the chain after it is listed.
    ///
    /// # Errors
    /// Returns [`ModelError::UnknownType`] if `name` itself is unknown.
    pub fn superclass_chain(&self, name: &TypeName) -> Result<Vec<TypeName>, ModelError> {
        let mut chain = Vec::new();
        let mut seen = HashSet::new();
        let mut current = self.require(name)?.effective_superclass();
        while let Some(next) = current {
            if !seen.insert(next.clone()) {
                break;
            }
            current = self.get(&next).and_then(TypeDescriptor::effective_superclass);
            chain.push(next);
        }
        Ok(chain)
    }

    /// The type, all its superclasses and all interfaces transitively
    ///
    /// The root type is always included.
    ///
    /// # Errors
    /// Returns [`ModelError::UnknownType`] if `name` itself is unknown.
    pub fn type_closure(&self, name: &TypeName) -> Result<BTreeSet<TypeName>, ModelError> {
        self.require(name)?;
        let mut closure = BTreeSet::new();
        let mut pending = vec![name.clone()];
        while let Some(next) = pending.pop() {
            if !closure.insert(next.clone()) {
                continue;
            }
            if let Some(descriptor) = self.get(&next) {
                pending.extend(descriptor.effective_superclass());
                pending.extend(descriptor.interfaces.iter().cloned());
            }
        }
        closure.insert(TypeName::root());
        Ok(closure)
    }

    /// Whether a value of type `from` can be used where `to` is expected
    #[must_use]
    pub fn is_assignable(&self, from: &TypeName, to: &TypeName) -> bool {
        if from == to || to.is_root() {
            return true;
        }
        self.type_closure(from)
            .map(|closure| closure.contains(to))
            .unwrap_or(false)
    }

    /// Whether a value of type `from` can be used where `to` is expected,
    /// for arbitrary type references
    ///
    /// Primitives are compared through their wrapper type.
    #[must_use]
    pub fn is_assignable_ref(&self, from: &TypeRef, to: &TypeRef) -> bool {
        match (from.boxed(), to.boxed()) {
            (TypeRef::Object(f), TypeRef::Object(t)) => self.is_assignable(&f, &t),
            (TypeRef::Array(_), TypeRef::Object(t)) => t.is_root(),
            (f, t) => f == t,
        }
    }

    /// All methods callable on instances of a class
    ///
    /// Walks the class and its superclasses; the most derived declaration of
    /// each signature wins. Private methods of superclasses are not visible.
    /// Order: the class's own methods first, then each superclass in turn.
    ///
    /// # Errors
    /// Returns [`ModelError::UnknownType`] if `name` itself is unknown.
    pub fn hierarchy_methods(&self, name: &TypeName) -> Result<Vec<VisibleMethod<'_>>, ModelError> {
        let own = self.require(name)?;
        let mut seen: HashSet<MethodSignature> = HashSet::new();
        let mut visible = Vec::new();

        let mut levels = vec![own];
        for ancestor in self.superclass_chain(name)? {
            if let Some(descriptor) = self.get(&ancestor) {
                levels.push(descriptor);
            }
        }

        for (depth, descriptor) in levels.into_iter().enumerate() {
            for method in &descriptor.methods {
                if depth > 0 && method.modifiers.is_private() {
                    continue;
                }
                if seen.insert(method.signature()) {
                    visible.push(VisibleMethod {
                        declaring_type: &descriptor.name,
                        method,
                    });
                }
            }
        }
        Ok(visible)
    }
}

fn root_descriptor() -> TypeDescriptor {
    use crate::descriptor::ParameterDescriptor;

    let mut root = TypeDescriptor::new(TypeName::root(), TypeKind::Class);

    let mut to_string = MethodDescriptor::new("toString");
    to_string.return_type = TypeRef::Object(TypeName::from_static(wellknown::STRING));

    let mut hash_code = MethodDescriptor::new("hashCode");
    hash_code.return_type = TypeRef::Primitive(PrimitiveKind::Int);

    let mut equals = MethodDescriptor::new("equals");
    equals.parameters.push(ParameterDescriptor::new(TypeRef::root()));
    equals.return_type = TypeRef::Primitive(PrimitiveKind::Boolean);

    let mut finalize = MethodDescriptor::new(crate::descriptor::FINALIZER);
    finalize.modifiers = Modifiers::none().with(Modifier::Protected);

    root.methods = vec![to_string, hash_code, equals, finalize];
    root
}
