//! Proxy runtime
//!
//! A [`ProxyInstance`] is the wrapper object standing in for a subclass
//! instance: it holds the real bean instance and the invocation handler, and
//! runs the emitted instruction bodies of its [`ProxyClass`].

use crate::class::{ProxyClass, ProxyMethod};
use crate::error::InvocationError;
use crate::instruction::{Insn, LoadInsn, HANDLER_FIELD};
use crate::value::Value;
use beanstalk_model::{MethodSignature, TypeName, TypeRef};
use std::fmt;
use std::sync::Arc;

/// Something that can receive method calls
pub trait BeanInstance: Send + Sync {
    /// Runtime class of the instance
    fn class_name(&self) -> &TypeName;

    /// Call a method with raw (unboxed) arguments
    ///
    /// # Errors
    /// Returns an error if the method does not exist or fails.
    fn invoke(&self, method: &MethodSignature, args: Vec<Value>) -> Result<Value, InvocationError>;
}

/// Receives intercepted calls from a proxy
///
/// Arguments arrive boxed; the result must be boxed (or null, or void for
/// void methods).
pub trait InvocationHandler: Send + Sync {
    /// Handle one intercepted call
    ///
    /// # Errors
    /// Any error aborts the proxied call.
    fn invoke(
        &self,
        target: &dyn BeanInstance,
        method: &MethodSignature,
        args: Vec<Value>,
    ) -> Result<Value, InvocationError>;
}

/// Live proxy object
#[derive(Clone)]
pub struct ProxyInstance {
    class: Arc<ProxyClass>,
    target: Arc<dyn BeanInstance>,
    handler: Option<Arc<dyn InvocationHandler>>,
}

impl fmt::Debug for ProxyInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyInstance")
            .field("class", self.class.name())
            .field("target", self.target.class_name())
            .field("wired", &self.handler.is_some())
            .finish()
    }
}

impl ProxyClass {
    /// Construct a proxy instance by running the emitted constructor
    ///
    /// # Errors
    /// Fails if the constructor body is malformed or does not wire the handler.
    pub fn instantiate(
        self: &Arc<Self>,
        target: Arc<dyn BeanInstance>,
        handler: Arc<dyn InvocationHandler>,
    ) -> Result<ProxyInstance, InvocationError> {
        let mut wired = None;
        let locals = vec![Operand::This, Operand::Handler(handler)];
        Frame::new(locals, target.as_ref(), &mut wired).run(self.constructor())?;
        if wired.is_none() {
            return Err(InvocationError::HandlerNotWired);
        }
        Ok(ProxyInstance {
            class: Arc::clone(self),
            target,
            handler: wired,
        })
    }
}

impl ProxyInstance {
    /// Proxy class
    #[inline]
    #[must_use]
    pub fn proxy_class(&self) -> &Arc<ProxyClass> {
        &self.class
    }

    /// Wrapped bean instance
    #[inline]
    #[must_use]
    pub fn target(&self) -> &Arc<dyn BeanInstance> {
        &self.target
    }

    fn execute(&self, method: &ProxyMethod, args: Vec<Value>) -> Result<Value, InvocationError> {
        if args.len() != method.signature.parameters.len() {
            return Err(InvocationError::ArityMismatch {
                method: method.signature.clone(),
                expected: method.signature.parameters.len(),
                actual: args.len(),
            });
        }

        let mut locals = Vec::with_capacity(usize::from(method.max_locals));
        locals.push(Operand::This);
        for (value, ty) in args.into_iter().zip(&method.signature.parameters) {
            if !value.conforms_to(ty) {
                return Err(InvocationError::mismatch(ty, &value));
            }
            locals.push(Operand::Value(value));
            if ty.slot_width() == 2 {
                locals.push(Operand::Top);
            }
        }

        let mut handler = self.handler.clone();
        Frame::new(locals, self.target.as_ref(), &mut handler).run(&method.body)
    }
}

impl BeanInstance for ProxyInstance {
    fn class_name(&self) -> &TypeName {
        self.class.name()
    }

    fn invoke(&self, method: &MethodSignature, args: Vec<Value>) -> Result<Value, InvocationError> {
        match self.class.method(method) {
            Some(proxy_method) => self.execute(proxy_method, args),
            // not overridden: the inherited implementation runs
            None => self.target.invoke(method, args),
        }
    }
}

enum Operand {
    This,
    Handler(Arc<dyn InvocationHandler>),
    Method(MethodSignature),
    Value(Value),
    /// Second slot of a long or double local
    Top,
}

impl fmt::Debug for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::This => f.write_str("this"),
            Self::Handler(_) => f.write_str("handler"),
            Self::Method(m) => write!(f, "method {m}"),
            Self::Value(v) => write!(f, "{v:?}"),
            Self::Top => f.write_str("top"),
        }
    }
}

struct Frame<'a> {
    locals: Vec<Operand>,
    stack: Vec<Operand>,
    target: &'a dyn BeanInstance,
    handler: &'a mut Option<Arc<dyn InvocationHandler>>,
}

impl<'a> Frame<'a> {
    fn new(
        locals: Vec<Operand>,
        target: &'a dyn BeanInstance,
        handler: &'a mut Option<Arc<dyn InvocationHandler>>,
    ) -> Self {
        Self {
            locals,
            stack: Vec::new(),
            target,
            handler,
        }
    }

    fn run(mut self, body: &[Insn]) -> Result<Value, InvocationError> {
        for insn in body {
            match insn {
                Insn::LoadThis => self.stack.push(Operand::This),
                Insn::Load { insn, slot } => {
                    let operand = match self.locals.get(usize::from(*slot)) {
                        Some(Operand::Value(v)) if insn.accepts(v) => Operand::Value(v.clone()),
                        Some(Operand::Handler(h)) if *insn == LoadInsn::ALoad => {
                            Operand::Handler(Arc::clone(h))
                        }
                        other => return Err(InvocationError::mismatch(format!("{insn:?}"), other)),
                    };
                    self.stack.push(operand);
                }
                Insn::GetField(name) => {
                    self.pop_this()?;
                    if name != HANDLER_FIELD {
                        return Err(InvocationError::InvalidBody(format!("unknown field {name}")));
                    }
                    let handler = self.handler.clone().ok_or(InvocationError::HandlerNotWired)?;
                    self.stack.push(Operand::Handler(handler));
                }
                Insn::PutField(name) => {
                    let value = self.pop()?;
                    self.pop_this()?;
                    match value {
                        Operand::Handler(h) if name == HANDLER_FIELD => *self.handler = Some(h),
                        other => {
                            return Err(InvocationError::InvalidBody(format!(
                                "cannot store {other:?} into {name}"
                            )))
                        }
                    }
                }
                Insn::PushInt(c) => self.stack.push(Operand::Value(Value::Int(c.value()))),
                Insn::NewArray(_) => {
                    let length = match self.pop_value()? {
                        Value::Int(n) => usize::try_from(n).map_err(|_| {
                            InvocationError::InvalidBody(format!("negative array length {n}"))
                        })?,
                        other => return Err(InvocationError::mismatch("int", other)),
                    };
                    self.stack.push(Operand::Value(Value::Array(vec![Value::Null; length])));
                }
                Insn::Box(kind) => {
                    let value = self.pop_value()?;
                    if value.primitive_kind() != Some(*kind) {
                        return Err(InvocationError::mismatch(kind, value));
                    }
                    self.stack.push(Operand::Value(value.into_boxed()));
                }
                Insn::ArrayStore => {
                    let value = self.pop_value()?;
                    let index = match self.pop_value()? {
                        Value::Int(i) => usize::try_from(i).unwrap_or(usize::MAX),
                        other => return Err(InvocationError::mismatch("int", other)),
                    };
                    let mut array = match self.pop_value()? {
                        Value::Array(items) => items,
                        other => return Err(InvocationError::mismatch("array", other)),
                    };
                    let slot = array.get_mut(index).ok_or_else(|| {
                        InvocationError::InvalidBody(format!("array index {index} out of bounds"))
                    })?;
                    *slot = value;
                    self.stack.push(Operand::Value(Value::Array(array)));
                }
                Insn::MethodRef(method) => self.stack.push(Operand::Method(method.clone())),
                Insn::InvokeHandler => {
                    let args = match self.pop_value()? {
                        Value::Array(items) => items,
                        other => return Err(InvocationError::mismatch("argument array", other)),
                    };
                    let method = match self.pop()? {
                        Operand::Method(m) => m,
                        other => return Err(InvocationError::mismatch("method reference", other)),
                    };
                    self.pop_this()?;
                    let handler = match self.pop()? {
                        Operand::Handler(h) => h,
                        other => return Err(InvocationError::mismatch("handler", other)),
                    };
                    let result = handler.invoke(self.target, &method, args)?;
                    self.stack.push(Operand::Value(result));
                }
                Insn::CheckCast(ty) => match self.stack.last() {
                    Some(Operand::Value(v)) if v.conforms_to(ty) => {}
                    other => return Err(InvocationError::mismatch(ty, other)),
                },
                Insn::Unbox { kind, .. } => {
                    let unboxed = match self.pop_value()? {
                        Value::Boxed(inner) if inner.primitive_kind() == Some(*kind) => *inner,
                        Value::Null => {
                            return Err(InvocationError::NullUnbox(TypeRef::Primitive(*kind)))
                        }
                        other => return Err(InvocationError::mismatch(kind.wrapper_name(), other)),
                    };
                    self.stack.push(Operand::Value(unboxed));
                }
                Insn::InvokeSuper { method, returns } => {
                    let mut args = Vec::with_capacity(method.parameters.len());
                    for _ in &method.parameters {
                        args.push(self.pop_value()?);
                    }
                    args.reverse();
                    self.pop_this()?;
                    let result = self.target.invoke(method, args)?;
                    if !returns.is_void() {
                        if !result.conforms_to(returns) {
                            return Err(InvocationError::mismatch(returns, result));
                        }
                        self.stack.push(Operand::Value(result));
                    }
                }
                Insn::InvokeSuperConstructor => self.pop_this()?,
                Insn::Pop => {
                    self.pop()?;
                }
                Insn::Return(ret) => {
                    if *ret == crate::instruction::ReturnInsn::Return {
                        return Ok(Value::Void);
                    }
                    let value = self.pop_value()?;
                    if !ret.accepts(&value) {
                        return Err(InvocationError::mismatch(format!("{ret:?}"), value));
                    }
                    return Ok(value);
                }
            }
        }
        Err(InvocationError::InvalidBody("body ended without return".into()))
    }

    fn pop(&mut self) -> Result<Operand, InvocationError> {
        self.stack
            .pop()
            .ok_or_else(|| InvocationError::InvalidBody("operand stack underflow".into()))
    }

    fn pop_value(&mut self) -> Result<Value, InvocationError> {
        match self.pop()? {
            Operand::Value(v) => Ok(v),
            other => Err(InvocationError::mismatch("value", other)),
        }
    }

    fn pop_this(&mut self) -> Result<(), InvocationError> {
        match self.pop()? {
            Operand::This => Ok(()),
            other => Err(InvocationError::mismatch("this", other)),
        }
    }
}
