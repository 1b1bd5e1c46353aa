//! Method partition
//!
//! Splits the methods visible on an implementation type into those routed
//! through the invocation handler and those forwarded straight to `super`.

use crate::error::ProxyGenerationError;
use beanstalk_model::{MethodDescriptor, MethodSignature, TypeName, TypeUniverse};
use std::collections::BTreeSet;

/// Intercepted and forwarded methods of one implementation type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodPartition {
    /// Methods whose override calls the handler, in hierarchy order
    pub intercepted: Vec<MethodDescriptor>,
    /// Methods whose override calls `super`, in hierarchy order
    pub forwarded: Vec<MethodDescriptor>,
}

impl MethodPartition {
    /// Partition the methods visible on `class`
    ///
    /// Methods that cannot be overridden (private, static, final, native,
    /// abstract, the finalizer) land in neither set.
    ///
    /// # Errors
    /// Fails if `class` is unknown, if an intercepted signature is not visible
    /// on the class, or if an intercepted method cannot be overridden.
    pub fn compute(
        universe: &TypeUniverse,
        class: &TypeName,
        intercepted: &BTreeSet<MethodSignature>,
    ) -> Result<Self, ProxyGenerationError> {
        let visible = universe.hierarchy_methods(class)?;

        let mut partition = Self {
            intercepted: Vec::new(),
            forwarded: Vec::new(),
        };
        let mut found = BTreeSet::new();

        for entry in visible {
            let method = entry.method;
            let signature = method.signature();
            if intercepted.contains(&signature) {
                if let Some(reason) = unproxyable_reason(method) {
                    return Err(ProxyGenerationError::UnproxyableMethod {
                        class: class.clone(),
                        method: signature,
                        reason,
                    });
                }
                found.insert(signature);
                partition.intercepted.push(method.clone());
            } else if method.is_proxyable() {
                partition.forwarded.push(method.clone());
            }
        }

        if let Some(missing) = intercepted.difference(&found).next() {
            return Err(ProxyGenerationError::UnknownMethod {
                class: class.clone(),
                method: missing.clone(),
            });
        }
        Ok(partition)
    }

    /// Signatures of the intercepted methods
    #[must_use]
    pub fn intercepted_signatures(&self) -> BTreeSet<MethodSignature> {
        self.intercepted.iter().map(MethodDescriptor::signature).collect()
    }

    /// Signatures of the forwarded methods
    #[must_use]
    pub fn forwarded_signatures(&self) -> BTreeSet<MethodSignature> {
        self.forwarded.iter().map(MethodDescriptor::signature).collect()
    }
}

fn unproxyable_reason(method: &MethodDescriptor) -> Option<&'static str> {
    let m = method.modifiers;
    if method.is_finalizer() {
        Some("the finalizer")
    } else if m.is_private() {
        Some("private")
    } else if m.is_static() {
        Some("static")
    } else if m.is_final() {
        Some("final")
    } else if m.is_native() {
        Some("native")
    } else if m.is_abstract() {
        Some("abstract")
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use beanstalk_model::{Modifier, Modifiers, TypeDescriptor, TypeKind};

    fn universe() -> (TypeUniverse, TypeName) {
        let name = TypeName::new("com.acme.Engine").unwrap();
        let mut engine = TypeDescriptor::new(name.clone(), TypeKind::Class);
        engine.methods.push(MethodDescriptor::new("start"));
        engine.methods.push(MethodDescriptor::new("stop"));
        let mut locked = MethodDescriptor::new("serial");
        locked.modifiers = Modifiers::public().with(Modifier::Final);
        engine.methods.push(locked);
        let mut helper = MethodDescriptor::new("helper");
        helper.modifiers = Modifiers::none().with(Modifier::Private);
        engine.methods.push(helper);
        (TypeUniverse::with_types([engine]), name)
    }

    fn sig(name: &str) -> MethodSignature {
        MethodSignature::new(name, vec![])
    }

    #[test]
    fn splits_intercepted_and_forwarded() {
        let (universe, engine) = universe();
        let intercepted = BTreeSet::from([sig("start")]);
        let partition = MethodPartition::compute(&universe, &engine, &intercepted).unwrap();

        assert_eq!(partition.intercepted_signatures(), intercepted);
        let forwarded = partition.forwarded_signatures();
        assert!(forwarded.contains(&sig("stop")));
        assert!(forwarded.contains(&sig("toString")));
        assert!(!forwarded.contains(&sig("serial")));
        assert!(!forwarded.contains(&sig("helper")));
        assert!(!forwarded.contains(&sig("finalize")));
    }

    #[test]
    fn intercepting_final_method_fails() {
        let (universe, engine) = universe();
        let err = MethodPartition::compute(&universe, &engine, &BTreeSet::from([sig("serial")]))
            .unwrap_err();
        assert!(matches!(
            err,
            ProxyGenerationError::UnproxyableMethod { reason: "final", .. }
        ));
    }

    #[test]
    fn intercepting_missing_method_fails() {
        let (universe, engine) = universe();
        let err = MethodPartition::compute(&universe, &engine, &BTreeSet::from([sig("fly")]))
            .unwrap_err();
        assert!(matches!(err, ProxyGenerationError::UnknownMethod { .. }));
    }
}
