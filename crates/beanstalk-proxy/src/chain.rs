//! Interceptor chains
//!
//! [`InterceptorChain`] is the invocation handler built from a bean's
//! interception plan. A call runs the method's interceptors in plan order,
//! then its decorators from outermost to innermost, then the target.

use crate::error::InvocationError;
use crate::runtime::{BeanInstance, InvocationHandler};
use crate::value::Value;
use beanstalk_model::{BeanId, InterceptionPlan, InterceptionType, MethodSignature};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Interceptor or decorator logic around a call
pub trait AroundInvoke: Send + Sync {
    /// Run around the call; `ctx.proceed()` continues down the chain
    ///
    /// # Errors
    /// Any error aborts the call.
    fn around_invoke(&self, ctx: &mut InvocationContext<'_>) -> Result<Value, InvocationError>;
}

/// State of one call travelling down a chain
pub struct InvocationContext<'a> {
    target: Option<&'a dyn BeanInstance>,
    method: &'a MethodSignature,
    args: Vec<Value>,
    remaining: &'a [Arc<dyn AroundInvoke>],
}

impl<'a> InvocationContext<'a> {
    /// Invoked method
    #[inline]
    #[must_use]
    pub fn method(&self) -> &MethodSignature {
        self.method
    }

    /// Boxed arguments
    #[inline]
    #[must_use]
    pub fn args(&self) -> &[Value] {
        &self.args
    }

    /// Replace the arguments passed further down the chain
    pub fn set_args(&mut self, args: Vec<Value>) {
        self.args = args;
    }

    /// Target instance; `None` for lifecycle callbacks
    #[must_use]
    pub fn target(&self) -> Option<&'a dyn BeanInstance> {
        self.target
    }

    /// Continue with the next link, or call the target at the end
    ///
    /// # Errors
    /// Propagates errors from the remaining links or the target.
    pub fn proceed(&mut self) -> Result<Value, InvocationError> {
        match self.remaining.split_first() {
            Some((link, rest)) => {
                let mut next = InvocationContext {
                    target: self.target,
                    method: self.method,
                    args: self.args.clone(),
                    remaining: rest,
                };
                link.around_invoke(&mut next)
            }
            None => match self.target {
                Some(target) => {
                    let raw = self.args.iter().cloned().map(Value::into_unboxed).collect();
                    target.invoke(self.method, raw).map(Value::into_boxed)
                }
                None => Ok(Value::Void),
            },
        }
    }
}

/// Invocation handler assembled from an interception plan
#[derive(Clone, Default)]
pub struct InterceptorChain {
    methods: BTreeMap<MethodSignature, Vec<Arc<dyn AroundInvoke>>>,
    lifecycle: BTreeMap<InterceptionType, Vec<Arc<dyn AroundInvoke>>>,
}

impl std::fmt::Debug for InterceptorChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let methods: Vec<_> = self
            .methods
            .iter()
            .map(|(k, v)| (k.to_string(), v.len()))
            .collect();
        let lifecycle: Vec<_> = self.lifecycle.iter().map(|(k, v)| (*k, v.len())).collect();
        f.debug_struct("InterceptorChain")
            .field("methods", &methods)
            .field("lifecycle", &lifecycle)
            .finish()
    }
}

impl InterceptorChain {
    /// Build the chain for a plan from interceptor and decorator instances
    ///
    /// # Errors
    /// Returns [`InvocationError::MissingInstance`] if the plan references a
    /// bean with no instance.
    pub fn from_plan(
        plan: &InterceptionPlan,
        instances: &HashMap<BeanId, Arc<dyn AroundInvoke>>,
    ) -> Result<Self, InvocationError> {
        let lookup = |id: BeanId| {
            instances
                .get(&id)
                .cloned()
                .ok_or(InvocationError::MissingInstance(id))
        };

        let mut methods = BTreeMap::new();
        for signature in plan.intercepted_methods() {
            let mut links = Vec::new();
            for interceptor in plan.interceptors_for(&signature) {
                links.push(lookup(interceptor.bean)?);
            }
            for decorator in plan.decorators_for(&signature) {
                links.push(lookup(decorator.bean)?);
            }
            methods.insert(signature, links);
        }

        let mut lifecycle = BTreeMap::new();
        for kind in InterceptionType::LIFECYCLE {
            let chain = plan.lifecycle_for(kind);
            if chain.is_empty() {
                continue;
            }
            let links = chain
                .iter()
                .map(|i| lookup(i.bean))
                .collect::<Result<Vec<_>, _>>()?;
            lifecycle.insert(kind, links);
        }

        Ok(Self { methods, lifecycle })
    }

    /// Number of links for a method
    #[must_use]
    pub fn chain_len(&self, method: &MethodSignature) -> usize {
        self.methods.get(method).map_or(0, Vec::len)
    }

    /// Run a lifecycle chain
    ///
    /// # Errors
    /// Propagates interceptor errors.
    pub fn invoke_lifecycle(&self, kind: InterceptionType) -> Result<(), InvocationError> {
        let Some(links) = self.lifecycle.get(&kind) else {
            return Ok(());
        };
        let method = MethodSignature::new(kind.to_string(), Vec::new());
        let mut ctx = InvocationContext {
            target: None,
            method: &method,
            args: Vec::new(),
            remaining: links,
        };
        ctx.proceed().map(|_| ())
    }
}

impl InvocationHandler for InterceptorChain {
    fn invoke(
        &self,
        target: &dyn BeanInstance,
        method: &MethodSignature,
        args: Vec<Value>,
    ) -> Result<Value, InvocationError> {
        let links = self.methods.get(method).map_or(&[][..], Vec::as_slice);
        let mut ctx = InvocationContext {
            target: Some(target),
            method,
            args,
            remaining: links,
        };
        ctx.proceed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use beanstalk_model::{DecoratorRef, InterceptorRef, TypeName};
    use parking_lot::Mutex;

    struct Tracer {
        label: &'static str,
        log: Arc<Mutex<Vec<String>>>,
    }

    impl AroundInvoke for Tracer {
        fn around_invoke(&self, ctx: &mut InvocationContext<'_>) -> Result<Value, InvocationError> {
            self.log.lock().push(format!("{}>", self.label));
            let result = ctx.proceed();
            self.log.lock().push(format!("<{}", self.label));
            result
        }
    }

    struct Doubler;

    impl AroundInvoke for Doubler {
        fn around_invoke(&self, ctx: &mut InvocationContext<'_>) -> Result<Value, InvocationError> {
            let doubled = ctx
                .args()
                .iter()
                .map(|v| match v {
                    Value::Boxed(inner) => match **inner {
                        Value::Int(i) => Value::Int(i * 2).into_boxed(),
                        _ => v.clone(),
                    },
                    _ => v.clone(),
                })
                .collect();
            ctx.set_args(doubled);
            ctx.proceed()
        }
    }

    struct Target {
        class: TypeName,
        log: Arc<Mutex<Vec<String>>>,
    }

    impl BeanInstance for Target {
        fn class_name(&self) -> &TypeName {
            &self.class
        }

        fn invoke(
            &self,
            _method: &MethodSignature,
            args: Vec<Value>,
        ) -> Result<Value, InvocationError> {
            self.log.lock().push("target".into());
            Ok(args.into_iter().next().unwrap_or(Value::Void))
        }
    }

    fn iref(id: u32) -> InterceptorRef {
        InterceptorRef {
            bean: BeanId::new(id),
            class: TypeName::new(format!("com.acme.I{id}")).unwrap(),
            priority: Some(10),
            declaration_order: 0,
        }
    }

    fn dref(id: u32) -> DecoratorRef {
        DecoratorRef {
            bean: BeanId::new(id),
            class: TypeName::new(format!("com.acme.D{id}")).unwrap(),
            priority: Some(10),
            declaration_order: 0,
        }
    }

    #[test]
    fn interceptors_then_decorators_then_target() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let run = MethodSignature::new("run", vec![]);
        let mut plan = InterceptionPlan::default();
        plan.around_invoke.insert(run.clone(), vec![iref(1), iref(2)]);
        plan.decorated_methods.insert(run.clone(), vec![dref(3)]);

        let mut instances: HashMap<BeanId, Arc<dyn AroundInvoke>> = HashMap::new();
        for (id, label) in [(1, "i1"), (2, "i2"), (3, "d3")] {
            instances.insert(BeanId::new(id), Arc::new(Tracer { label, log: Arc::clone(&log) }));
        }
        let chain = InterceptorChain::from_plan(&plan, &instances).unwrap();
        assert_eq!(chain.chain_len(&run), 3);

        let target = Target {
            class: TypeName::new("com.acme.Job").unwrap(),
            log: Arc::clone(&log),
        };
        chain.invoke(&target, &run, vec![]).unwrap();
        assert_eq!(
            *log.lock(),
            vec!["i1>", "i2>", "d3>", "target", "<d3", "<i2", "<i1"]
        );
    }

    #[test]
    fn interceptor_can_rewrite_arguments() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let int = beanstalk_model::TypeRef::Primitive(beanstalk_model::PrimitiveKind::Int);
        let echo = MethodSignature::new("echo", vec![int]);
        let mut plan = InterceptionPlan::default();
        plan.around_invoke.insert(echo.clone(), vec![iref(1)]);
        let mut instances: HashMap<BeanId, Arc<dyn AroundInvoke>> = HashMap::new();
        instances.insert(BeanId::new(1), Arc::new(Doubler));

        let chain = InterceptorChain::from_plan(&plan, &instances).unwrap();
        let target = Target {
            class: TypeName::new("com.acme.Echo").unwrap(),
            log,
        };
        let result = chain
            .invoke(&target, &echo, vec![Value::Int(21).into_boxed()])
            .unwrap();
        assert_eq!(result, Value::Int(42).into_boxed());
    }

    #[test]
    fn missing_instance_is_reported() {
        let mut plan = InterceptionPlan::default();
        plan.around_invoke.insert(MethodSignature::new("run", vec![]), vec![iref(9)]);
        let err = InterceptorChain::from_plan(&plan, &HashMap::new()).unwrap_err();
        assert_eq!(err, InvocationError::MissingInstance(BeanId::new(9)));
    }

    #[test]
    fn lifecycle_chain_runs_without_target() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut plan = InterceptionPlan::default();
        plan.lifecycle.insert(InterceptionType::PostConstruct, vec![iref(1)]);
        let mut instances: HashMap<BeanId, Arc<dyn AroundInvoke>> = HashMap::new();
        instances.insert(BeanId::new(1), Arc::new(Tracer { label: "pc", log: Arc::clone(&log) }));

        let chain = InterceptorChain::from_plan(&plan, &instances).unwrap();
        chain.invoke_lifecycle(InterceptionType::PostConstruct).unwrap();
        chain.invoke_lifecycle(InterceptionType::PreDestroy).unwrap();
        assert_eq!(*log.lock(), vec!["pc>", "<pc"]);
    }
}
