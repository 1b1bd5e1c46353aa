//! Interception plans
//!
//! The fixed invocation chain attached to a managed bean: interceptor chains
//! per intercepted method and per lifecycle callback, plus the decorator stack.

use crate::bean::BeanId;
use crate::descriptor::MethodSignature;
use crate::name::TypeName;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{self, Display, Formatter};

/// Kind of interception an interceptor supports
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterceptionType {
    /// Wraps business method calls
    AroundInvoke,
    /// Runs after construction and injection
    PostConstruct,
    /// Runs before destruction
    PreDestroy,
}

impl InterceptionType {
    /// Lifecycle interception kinds
    pub const LIFECYCLE: [Self; 2] = [Self::PostConstruct, Self::PreDestroy];

    /// Annotation marking the interceptor method for this kind
    #[must_use]
    pub const fn marker_annotation(self) -> &'static str {
        match self {
            Self::AroundInvoke => crate::wellknown::AROUND_INVOKE,
            Self::PostConstruct => crate::wellknown::POST_CONSTRUCT,
            Self::PreDestroy => crate::wellknown::PRE_DESTROY,
        }
    }
}

impl Display for InterceptionType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::AroundInvoke => "around-invoke",
            Self::PostConstruct => "post-construct",
            Self::PreDestroy => "pre-destroy",
        };
        f.write_str(s)
    }
}

/// Reference to an interceptor in a chain
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InterceptorRef {
    /// Interceptor bean
    pub bean: BeanId,
    /// Interceptor class
    pub class: TypeName,
    /// Application-level priority
    pub priority: Option<i32>,
    /// Position among enabled interceptors, used to break ties
    pub declaration_order: usize,
}

/// Reference to a decorator in a stack
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DecoratorRef {
    /// Decorator bean
    pub bean: BeanId,
    /// Decorator class
    pub class: TypeName,
    /// Application-level priority
    pub priority: Option<i32>,
    /// Position among enabled decorators, used to break ties
    pub declaration_order: usize,
}

/// Invocation chain attached to a managed bean
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InterceptionPlan {
    /// Around-invoke chain per intercepted method, in invocation order
    pub around_invoke: BTreeMap<MethodSignature, Vec<InterceptorRef>>,
    /// Lifecycle chains, in invocation order
    pub lifecycle: BTreeMap<InterceptionType, Vec<InterceptorRef>>,
    /// Decorators applied to the bean, outermost first
    pub decorators: Vec<DecoratorRef>,
    /// Decorators per decorated method, outermost first
    pub decorated_methods: BTreeMap<MethodSignature, Vec<DecoratorRef>>,
}

impl InterceptionPlan {
    /// Whether nothing applies to the bean
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.around_invoke.values().all(Vec::is_empty)
            && self.lifecycle.values().all(Vec::is_empty)
            && self.decorators.is_empty()
            && self.decorated_methods.values().all(Vec::is_empty)
    }

    /// Methods with a non-empty interceptor or decorator chain
    #[must_use]
    pub fn intercepted_methods(&self) -> BTreeSet<MethodSignature> {
        let intercepted = self
            .around_invoke
            .iter()
            .filter(|(_, chain)| !chain.is_empty())
            .map(|(sig, _)| sig);
        let decorated = self
            .decorated_methods
            .iter()
            .filter(|(_, chain)| !chain.is_empty())
            .map(|(sig, _)| sig);
        intercepted.chain(decorated).cloned().collect()
    }

    /// Whether business calls need to go through a proxy
    #[must_use]
    pub fn requires_proxy(&self) -> bool {
        !self.intercepted_methods().is_empty()
    }

    /// Interceptor chain for a method
    #[must_use]
    pub fn interceptors_for(&self, method: &MethodSignature) -> &[InterceptorRef] {
        self.around_invoke.get(method).map_or(&[], Vec::as_slice)
    }

    /// Decorator chain for a method
    #[must_use]
    pub fn decorators_for(&self, method: &MethodSignature) -> &[DecoratorRef] {
        self.decorated_methods.get(method).map_or(&[], Vec::as_slice)
    }

    /// Lifecycle chain
    #[must_use]
    pub fn lifecycle_for(&self, kind: InterceptionType) -> &[InterceptorRef] {
        self.lifecycle.get(&kind).map_or(&[], Vec::as_slice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PrimitiveKind, TypeRef};

    fn interceptor(id: u32) -> InterceptorRef {
        InterceptorRef {
            bean: BeanId::new(id),
            class: TypeName::new(format!("com.acme.I{id}")).unwrap(),
            priority: Some(100),
            declaration_order: id as usize,
        }
    }

    #[test]
    fn default_plan_is_empty() {
        let plan = InterceptionPlan::default();
        assert!(plan.is_empty());
        assert!(!plan.requires_proxy());
    }

    #[test]
    fn empty_chains_do_not_count() {
        let mut plan = InterceptionPlan::default();
        plan.around_invoke.insert(MethodSignature::new("drive", vec![]), Vec::new());
        assert!(plan.is_empty());
        assert!(plan.intercepted_methods().is_empty());
    }

    #[test]
    fn lifecycle_only_plan_needs_no_proxy() {
        let mut plan = InterceptionPlan::default();
        plan.lifecycle.insert(InterceptionType::PostConstruct, vec![interceptor(1)]);
        assert!(!plan.is_empty());
        assert!(!plan.requires_proxy());
        assert_eq!(plan.lifecycle_for(InterceptionType::PostConstruct).len(), 1);
    }

    #[test]
    fn intercepted_methods_merge_interceptors_and_decorators() {
        let drive = MethodSignature::new("drive", vec![TypeRef::Primitive(PrimitiveKind::Int)]);
        let stop = MethodSignature::new("stop", vec![]);
        let mut plan = InterceptionPlan::default();
        plan.around_invoke.insert(drive.clone(), vec![interceptor(1)]);
        plan.decorated_methods.insert(
            stop.clone(),
            vec![DecoratorRef {
                bean: BeanId::new(2),
                class: TypeName::new("com.acme.D").unwrap(),
                priority: None,
                declaration_order: 0,
            }],
        );
        let methods: Vec<_> = plan.intercepted_methods().into_iter().collect();
        assert_eq!(methods, vec![drive.clone(), stop.clone()]);
        assert_eq!(plan.interceptors_for(&drive).len(), 1);
        assert!(plan.interceptors_for(&stop).is_empty());
        assert_eq!(plan.decorators_for(&stop).len(), 1);
    }
}
