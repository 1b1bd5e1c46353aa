//! Emitted proxy classes

use crate::instruction::{Insn, PASSIVATION_ID_FIELD};
use beanstalk_model::{MethodSignature, TypeName, TypeRef};
use std::collections::BTreeSet;

/// How a proxy method dispatches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProxyMethodKind {
    /// Routed through the invocation handler
    Intercepted,
    /// Calls the superclass implementation directly
    Forwarded,
}

/// Field declared by a proxy class
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyField {
    /// Field name
    pub name: String,
    /// Field type
    pub field_type: TypeRef,
    /// Static (class-level) field
    pub is_static: bool,
    /// Constant initial value for static string fields
    pub constant: Option<String>,
}

/// Overriding method emitted into a proxy class
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyMethod {
    /// Overridden method
    pub signature: MethodSignature,
    /// Declared return type
    pub return_type: TypeRef,
    /// Dispatch kind
    pub kind: ProxyMethodKind,
    /// Local slots used by the body, including the receiver
    pub max_locals: u16,
    /// Instruction body
    pub body: Vec<Insn>,
}

/// A synthesized subclass of a bean implementation type
///
/// Defined once per (class-loader scope, implementation type) and shared
/// behind an `Arc`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyClass {
    pub(crate) name: TypeName,
    pub(crate) super_type: TypeName,
    pub(crate) interfaces: Vec<TypeName>,
    pub(crate) fields: Vec<ProxyField>,
    pub(crate) constructor: Vec<Insn>,
    pub(crate) methods: Vec<ProxyMethod>,
}

impl ProxyClass {
    /// Proxy class name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &TypeName {
        &self.name
    }

    /// Implementation type the proxy extends
    #[inline]
    #[must_use]
    pub fn super_type(&self) -> &TypeName {
        &self.super_type
    }

    /// Implemented interfaces, starting with the proxy marker
    #[inline]
    #[must_use]
    pub fn interfaces(&self) -> &[TypeName] {
        &self.interfaces
    }

    /// Declared fields
    #[inline]
    #[must_use]
    pub fn fields(&self) -> &[ProxyField] {
        &self.fields
    }

    /// Body of the single constructor
    #[inline]
    #[must_use]
    pub fn constructor(&self) -> &[Insn] {
        &self.constructor
    }

    /// Overriding methods
    #[inline]
    #[must_use]
    pub fn methods(&self) -> &[ProxyMethod] {
        &self.methods
    }

    /// Overriding method for a signature
    #[must_use]
    pub fn method(&self, signature: &MethodSignature) -> Option<&ProxyMethod> {
        self.methods.iter().find(|m| &m.signature == signature)
    }

    /// Signatures routed through the handler
    #[must_use]
    pub fn intercepted_methods(&self) -> BTreeSet<MethodSignature> {
        self.signatures_of(ProxyMethodKind::Intercepted)
    }

    /// Signatures forwarded to `super`
    #[must_use]
    pub fn forwarded_methods(&self) -> BTreeSet<MethodSignature> {
        self.signatures_of(ProxyMethodKind::Forwarded)
    }

    /// Passivation id carried in the static field
    #[must_use]
    pub fn passivation_id(&self) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.is_static && f.name == PASSIVATION_ID_FIELD)
            .and_then(|f| f.constant.as_deref())
    }

    fn signatures_of(&self, kind: ProxyMethodKind) -> BTreeSet<MethodSignature> {
        self.methods
            .iter()
            .filter(|m| m.kind == kind)
            .map(|m| m.signature.clone())
            .collect()
    }
}
