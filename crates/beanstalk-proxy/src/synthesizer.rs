//! Proxy synthesizer
//!
//! Turns an implementation type and its intercepted method set into a
//! [`ProxyClass`]: one constructor wiring the handler, one handler-routing
//! override per intercepted method and one `super`-forwarding override per
//! remaining overridable method.

use crate::class::{ProxyClass, ProxyField, ProxyMethod, ProxyMethodKind};
use crate::error::ProxyGenerationError;
use crate::instruction::{
    unbox_method, Insn, IntConst, LoadInsn, ReturnInsn, HANDLER_FIELD, PASSIVATION_ID_FIELD,
};
use crate::partition::MethodPartition;
use crate::scope::ClassLoaderScope;
use beanstalk_model::{
    wellknown, MethodDescriptor, MethodSignature, TypeName, TypeRef, TypeUniverse,
};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::debug;

/// Suffix appended to the implementation type name
pub const DEFAULT_PROXY_SUFFIX: &str = "$$BeanstalkProxy";

/// Numbered names tried after the plain proxy name is taken
pub const MAX_NAME_ATTEMPTS: u32 = 10_000;

/// Everything needed to synthesize one proxy
#[derive(Debug, Clone, Copy)]
pub struct ProxyRequest<'a> {
    /// Types known to the deployment
    pub universe: &'a TypeUniverse,
    /// Implementation type to subclass
    pub class: &'a TypeName,
    /// Methods routed through the handler
    pub intercepted: &'a BTreeSet<MethodSignature>,
    /// Bean passivation id stored in the proxy
    pub passivation_id: &'a str,
}

/// Emits proxy classes
#[derive(Debug, Clone)]
pub struct ProxySynthesizer {
    suffix: String,
}

impl Default for ProxySynthesizer {
    fn default() -> Self {
        Self::new()
    }
}

impl ProxySynthesizer {
    /// Synthesizer using [`DEFAULT_PROXY_SUFFIX`]
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::with_suffix(DEFAULT_PROXY_SUFFIX)
    }

    /// Synthesizer with a custom name suffix
    #[must_use]
    pub fn with_suffix(suffix: impl Into<String>) -> Self {
        Self {
            suffix: suffix.into(),
        }
    }

    /// Desired proxy name for an implementation type
    #[must_use]
    pub fn base_name(&self, class: &TypeName) -> TypeName {
        class.with_suffix(&self.suffix)
    }

    /// First proxy name not loaded in a scope
    ///
    /// Tries the plain name, then the plain name followed by 0, 1, 2 and so on.
    ///
    /// # Errors
    /// Returns [`ProxyGenerationError::NameExhausted`] after
    /// [`MAX_NAME_ATTEMPTS`] numbered names are all taken.
    pub fn unused_name(
        &self,
        class: &TypeName,
        is_loaded: &dyn Fn(&TypeName) -> bool,
    ) -> Result<TypeName, ProxyGenerationError> {
        let base = self.base_name(class);
        if !is_loaded(&base) {
            return Ok(base);
        }
        for attempt in 0..MAX_NAME_ATTEMPTS {
            let candidate = base.with_suffix(&attempt.to_string());
            if !is_loaded(&candidate) {
                return Ok(candidate);
            }
        }
        Err(ProxyGenerationError::NameExhausted {
            base,
            attempts: MAX_NAME_ATTEMPTS,
        })
    }

    /// Synthesize and define a proxy in a scope
    ///
    /// Name selection and definition happen under the scope lock.
    ///
    /// # Errors
    /// Propagates validation, partition, naming and definition failures.
    pub fn synthesize(
        &self,
        scope: &ClassLoaderScope,
        request: ProxyRequest<'_>,
    ) -> Result<Arc<ProxyClass>, ProxyGenerationError> {
        let partition = self.prepare(request)?;
        let proxy = scope.define_with(|is_loaded| {
            let name = self.unused_name(request.class, is_loaded)?;
            Ok(emit_class(name, request, &partition))
        })?;
        debug!(
            proxy = %proxy.name(),
            scope = %scope.id(),
            intercepted = partition.intercepted.len(),
            forwarded = partition.forwarded.len(),
            "synthesized proxy class"
        );
        Ok(proxy)
    }

    /// Emit a proxy class with a fixed name, without defining it anywhere
    ///
    /// # Errors
    /// Fails if the type cannot be subclassed or the partition is invalid.
    pub fn build(
        &self,
        request: ProxyRequest<'_>,
        name: TypeName,
    ) -> Result<ProxyClass, ProxyGenerationError> {
        let partition = self.prepare(request)?;
        Ok(emit_class(name, request, &partition))
    }

    #[allow(clippy::unused_self)]
    fn prepare(&self, request: ProxyRequest<'_>) -> Result<MethodPartition, ProxyGenerationError> {
        let descriptor = request.universe.require(request.class)?;
        if !descriptor.is_class() {
            return Err(ProxyGenerationError::NotAClass(request.class.clone()));
        }
        if descriptor.modifiers.is_final() {
            return Err(ProxyGenerationError::FinalClass(request.class.clone()));
        }
        MethodPartition::compute(request.universe, request.class, request.intercepted)
    }
}

fn emit_class(
    name: TypeName,
    request: ProxyRequest<'_>,
    partition: &MethodPartition,
) -> ProxyClass {
    let fields = vec![
        ProxyField {
            name: PASSIVATION_ID_FIELD.to_string(),
            field_type: TypeRef::Object(TypeName::from_static(wellknown::STRING)),
            is_static: true,
            constant: Some(request.passivation_id.to_string()),
        },
        ProxyField {
            name: HANDLER_FIELD.to_string(),
            field_type: TypeRef::root(),
            is_static: false,
            constant: None,
        },
    ];

    let methods = partition
        .intercepted
        .iter()
        .map(emit_intercepted)
        .chain(partition.forwarded.iter().map(emit_forwarded))
        .collect();

    ProxyClass {
        name,
        super_type: request.class.clone(),
        interfaces: vec![TypeName::from_static(wellknown::PROXY_MARKER)],
        fields,
        constructor: emit_constructor(),
        methods,
    }
}

/// Constructor body: chain to the superclass constructor, then store the handler
/// passed in local 1
#[must_use]
pub fn emit_constructor() -> Vec<Insn> {
    vec![
        Insn::LoadThis,
        Insn::InvokeSuperConstructor,
        Insn::LoadThis,
        Insn::Load {
            insn: LoadInsn::ALoad,
            slot: 1,
        },
        Insn::PutField(HANDLER_FIELD.to_string()),
        Insn::Return(ReturnInsn::Return),
    ]
}

/// Override that boxes the arguments and calls the handler
#[must_use]
pub fn emit_intercepted(method: &MethodDescriptor) -> ProxyMethod {
    let signature = method.signature();
    let mut body = vec![
        Insn::LoadThis,
        Insn::GetField(HANDLER_FIELD.to_string()),
        Insn::LoadThis,
        Insn::MethodRef(signature.clone()),
        Insn::PushInt(IntConst::for_value(count_to_i32(method.parameters.len()))),
        Insn::NewArray(TypeName::root()),
    ];

    let mut slot: u16 = 1;
    for (index, ty) in method.parameter_types().enumerate() {
        body.push(Insn::PushInt(IntConst::for_value(count_to_i32(index))));
        if let Some(insn) = LoadInsn::for_type(ty) {
            body.push(Insn::Load { insn, slot });
        }
        if let TypeRef::Primitive(kind) = ty {
            body.push(Insn::Box(*kind));
        }
        body.push(Insn::ArrayStore);
        slot += ty.slot_width();
    }

    body.push(Insn::InvokeHandler);
    match &method.return_type {
        TypeRef::Void => body.push(Insn::Pop),
        TypeRef::Primitive(kind) => {
            body.push(Insn::CheckCast(TypeRef::Object(kind.wrapper_type())));
            body.push(Insn::Unbox {
                kind: *kind,
                method: unbox_method(*kind),
            });
        }
        reference => body.push(Insn::CheckCast(reference.clone())),
    }
    body.push(Insn::Return(ReturnInsn::for_type(&method.return_type)));

    ProxyMethod {
        signature,
        return_type: method.return_type.clone(),
        kind: ProxyMethodKind::Intercepted,
        max_locals: slot,
        body,
    }
}

/// Override that passes the arguments straight to `super`
#[must_use]
pub fn emit_forwarded(method: &MethodDescriptor) -> ProxyMethod {
    let signature = method.signature();
    let mut body = vec![Insn::LoadThis];

    let mut slot: u16 = 1;
    for ty in method.parameter_types() {
        if let Some(insn) = LoadInsn::for_type(ty) {
            body.push(Insn::Load { insn, slot });
        }
        slot += ty.slot_width();
    }

    body.push(Insn::InvokeSuper {
        method: signature.clone(),
        returns: method.return_type.clone(),
    });
    body.push(Insn::Return(ReturnInsn::for_type(&method.return_type)));

    ProxyMethod {
        signature,
        return_type: method.return_type.clone(),
        kind: ProxyMethodKind::Forwarded,
        max_locals: slot,
        body,
    }
}

fn count_to_i32(n: usize) -> i32 {
    i32::try_from(n).unwrap_or(i32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use beanstalk_model::{ParameterDescriptor, PrimitiveKind};
    use pretty_assertions::assert_eq;

    fn name(s: &str) -> TypeName {
        TypeName::new(s).unwrap()
    }

    #[test]
    fn plain_name_is_preferred() {
        let synth = ProxySynthesizer::new();
        let chosen = synth.unused_name(&name("com.acme.Car"), &|_| false).unwrap();
        assert_eq!(chosen.as_str(), "com.acme.Car$$BeanstalkProxy");
    }

    #[test]
    fn collisions_get_numbered_suffix() {
        let synth = ProxySynthesizer::new();
        let taken = [
            name("com.acme.Car$$BeanstalkProxy"),
            name("com.acme.Car$$BeanstalkProxy0"),
        ];
        let chosen = synth
            .unused_name(&name("com.acme.Car"), &|n| taken.contains(n))
            .unwrap();
        assert_eq!(chosen.as_str(), "com.acme.Car$$BeanstalkProxy1");
    }

    #[test]
    fn exhausted_names_fail() {
        let synth = ProxySynthesizer::new();
        let err = synth.unused_name(&name("com.acme.Car"), &|_| true).unwrap_err();
        assert_eq!(
            err,
            ProxyGenerationError::NameExhausted {
                base: name("com.acme.Car$$BeanstalkProxy"),
                attempts: MAX_NAME_ATTEMPTS,
            }
        );
    }

    #[test]
    fn custom_suffix() {
        let synth = ProxySynthesizer::with_suffix("$Proxy");
        assert_eq!(synth.base_name(&name("a.B")).as_str(), "a.B$Proxy");
    }

    #[test]
    fn intercepted_body_boxes_wide_arguments() {
        let mut m = MethodDescriptor::new("move");
        m.parameters = vec![
            ParameterDescriptor::new(TypeRef::Primitive(PrimitiveKind::Long)),
            ParameterDescriptor::new(TypeRef::Primitive(PrimitiveKind::Int)),
        ];
        m.return_type = TypeRef::Primitive(PrimitiveKind::Double);

        let emitted = emit_intercepted(&m);
        assert_eq!(emitted.max_locals, 4);
        assert_eq!(
            emitted.body,
            vec![
                Insn::LoadThis,
                Insn::GetField(HANDLER_FIELD.into()),
                Insn::LoadThis,
                Insn::MethodRef(m.signature()),
                Insn::PushInt(IntConst::IConst(2)),
                Insn::NewArray(TypeName::root()),
                Insn::PushInt(IntConst::IConst(0)),
                Insn::Load { insn: LoadInsn::LLoad, slot: 1 },
                Insn::Box(PrimitiveKind::Long),
                Insn::ArrayStore,
                Insn::PushInt(IntConst::IConst(1)),
                Insn::Load { insn: LoadInsn::ILoad, slot: 3 },
                Insn::Box(PrimitiveKind::Int),
                Insn::ArrayStore,
                Insn::InvokeHandler,
                Insn::CheckCast(TypeRef::Object(PrimitiveKind::Double.wrapper_type())),
                Insn::Unbox { kind: PrimitiveKind::Double, method: "doubleValue" },
                Insn::Return(ReturnInsn::DReturn),
            ]
        );
    }

    #[test]
    fn void_intercepted_body_pops_result() {
        let emitted = emit_intercepted(&MethodDescriptor::new("stop"));
        let tail: Vec<_> = emitted.body.iter().rev().take(2).cloned().collect();
        assert_eq!(tail, vec![Insn::Return(ReturnInsn::Return), Insn::Pop]);
    }

    #[test]
    fn forwarded_body_loads_and_calls_super() {
        let mut m = MethodDescriptor::new("rename");
        m.parameters = vec![ParameterDescriptor::new(TypeRef::Object(name(wellknown::STRING)))];
        m.return_type = TypeRef::Object(name(wellknown::STRING));
        let emitted = emit_forwarded(&m);
        assert_eq!(emitted.kind, ProxyMethodKind::Forwarded);
        assert_eq!(
            emitted.body,
            vec![
                Insn::LoadThis,
                Insn::Load { insn: LoadInsn::ALoad, slot: 1 },
                Insn::InvokeSuper { method: m.signature(), returns: m.return_type.clone() },
                Insn::Return(ReturnInsn::AReturn),
            ]
        );
    }
}
