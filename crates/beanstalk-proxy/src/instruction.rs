//! Proxy instruction set and instruction selection
//!
//! Proxy bodies are emitted as a small stack-machine instruction list. The
//! selection functions in this module are total over the eight primitive
//! kinds plus void and references; none of them has a fallback arm.

use crate::value::Value;
use beanstalk_model::{MethodSignature, PrimitiveKind, TypeName, TypeRef};
use std::fmt::{self, Display, Formatter};

/// Name of the instance field holding the invocation handler
pub const HANDLER_FIELD: &str = "$handler";
/// Name of the static field holding the bean passivation id
pub const PASSIVATION_ID_FIELD: &str = "$passivationId";

/// Local variable load instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoadInsn {
    /// `boolean`, `char`, `byte`, `short`, `int`
    ILoad,
    /// `long`
    LLoad,
    /// `float`
    FLoad,
    /// `double`
    DLoad,
    /// References
    ALoad,
}

impl LoadInsn {
    /// Load instruction for a primitive kind
    #[must_use]
    pub const fn for_primitive(kind: PrimitiveKind) -> Self {
        match kind {
            PrimitiveKind::Boolean
            | PrimitiveKind::Char
            | PrimitiveKind::Byte
            | PrimitiveKind::Short
            | PrimitiveKind::Int => Self::ILoad,
            PrimitiveKind::Long => Self::LLoad,
            PrimitiveKind::Float => Self::FLoad,
            PrimitiveKind::Double => Self::DLoad,
        }
    }

    /// Load instruction for a parameter type; `None` for void
    #[must_use]
    pub fn for_type(ty: &TypeRef) -> Option<Self> {
        match ty {
            TypeRef::Void => None,
            TypeRef::Primitive(kind) => Some(Self::for_primitive(*kind)),
            TypeRef::Object(_) | TypeRef::Array(_) => Some(Self::ALoad),
        }
    }

    /// Whether the instruction can load the value
    #[must_use]
    pub fn accepts(self, value: &Value) -> bool {
        match self {
            Self::ILoad => value.primitive_kind().is_some_and(PrimitiveKind::is_int_like),
            Self::LLoad => matches!(value, Value::Long(_)),
            Self::FLoad => matches!(value, Value::Float(_)),
            Self::DLoad => matches!(value, Value::Double(_)),
            Self::ALoad => value.is_reference(),
        }
    }
}

/// Return instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReturnInsn {
    /// `void`
    Return,
    /// `boolean`, `char`, `byte`, `short`, `int`
    IReturn,
    /// `long`
    LReturn,
    /// `float`
    FReturn,
    /// `double`
    DReturn,
    /// References
    AReturn,
}

impl ReturnInsn {
    /// Return instruction for a return type
    #[must_use]
    pub const fn for_type(ty: &TypeRef) -> Self {
        match ty {
            TypeRef::Void => Self::Return,
            TypeRef::Primitive(kind) => match kind {
                PrimitiveKind::Boolean
                | PrimitiveKind::Char
                | PrimitiveKind::Byte
                | PrimitiveKind::Short
                | PrimitiveKind::Int => Self::IReturn,
                PrimitiveKind::Long => Self::LReturn,
                PrimitiveKind::Float => Self::FReturn,
                PrimitiveKind::Double => Self::DReturn,
            },
            TypeRef::Object(_) | TypeRef::Array(_) => Self::AReturn,
        }
    }

    /// Whether the instruction can return the value
    #[must_use]
    pub fn accepts(self, value: &Value) -> bool {
        match self {
            Self::Return => matches!(value, Value::Void),
            Self::IReturn => LoadInsn::ILoad.accepts(value),
            Self::LReturn => LoadInsn::LLoad.accepts(value),
            Self::FReturn => LoadInsn::FLoad.accepts(value),
            Self::DReturn => LoadInsn::DLoad.accepts(value),
            Self::AReturn => LoadInsn::ALoad.accepts(value),
        }
    }
}

/// Method that unboxes a wrapper into its primitive
#[must_use]
pub const fn unbox_method(kind: PrimitiveKind) -> &'static str {
    match kind {
        PrimitiveKind::Boolean => "booleanValue",
        PrimitiveKind::Char => "charValue",
        PrimitiveKind::Byte => "byteValue",
        PrimitiveKind::Short => "shortValue",
        PrimitiveKind::Int => "intValue",
        PrimitiveKind::Long => "longValue",
        PrimitiveKind::Float => "floatValue",
        PrimitiveKind::Double => "doubleValue",
    }
}

/// Integer constant push, smallest encoding first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntConst {
    /// Dedicated constant instruction for -1 through 5
    IConst(i8),
    /// Signed byte operand
    BiPush(i8),
    /// Signed short operand
    SiPush(i16),
    /// Constant pool entry
    Ldc(i32),
}

impl IntConst {
    /// Smallest encoding for the value
    #[must_use]
    pub fn for_value(value: i32) -> Self {
        match i8::try_from(value) {
            Ok(b) if (-1..=5).contains(&b) => Self::IConst(b),
            Ok(b) => Self::BiPush(b),
            Err(_) => i16::try_from(value).map_or(Self::Ldc(value), Self::SiPush),
        }
    }

    /// Pushed value
    #[must_use]
    pub fn value(self) -> i32 {
        match self {
            Self::IConst(v) | Self::BiPush(v) => i32::from(v),
            Self::SiPush(v) => i32::from(v),
            Self::Ldc(v) => v,
        }
    }
}

/// One proxy instruction
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Insn {
    /// Push the proxy itself
    LoadThis,
    /// Push a local variable
    Load {
        /// Instruction selected for the local's type
        insn: LoadInsn,
        /// Local slot
        slot: u16,
    },
    /// Pop the receiver, push an instance field
    GetField(String),
    /// Pop a value and the receiver, store an instance field
    PutField(String),
    /// Push an integer constant
    PushInt(IntConst),
    /// Pop a length, push a new array of the component type
    NewArray(TypeName),
    /// Pop a raw primitive, push it boxed in its wrapper
    Box(PrimitiveKind),
    /// Pop value, index and array; store; push the array back
    ArrayStore,
    /// Push a reference to a method
    MethodRef(MethodSignature),
    /// Pop arguments array, method, receiver and handler; push the handler result
    InvokeHandler,
    /// Check the top of the stack against a type
    CheckCast(TypeRef),
    /// Pop a boxed value, push the primitive
    Unbox {
        /// Primitive kind
        kind: PrimitiveKind,
        /// Wrapper unboxing method
        method: &'static str,
    },
    /// Pop arguments and receiver, call the superclass implementation
    InvokeSuper {
        /// Invoked method
        method: MethodSignature,
        /// Its return type; void pushes nothing
        returns: TypeRef,
    },
    /// Pop the receiver, run the superclass constructor
    InvokeSuperConstructor,
    /// Discard the top of the stack
    Pop,
    /// Return from the body
    Return(ReturnInsn),
}

impl Display for Insn {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::LoadThis => f.write_str("aload 0"),
            Self::Load { insn, slot } => write!(f, "{insn:?} {slot}"),
            Self::GetField(name) => write!(f, "getfield {name}"),
            Self::PutField(name) => write!(f, "putfield {name}"),
            Self::PushInt(c) => write!(f, "{c:?}"),
            Self::NewArray(ty) => write!(f, "anewarray {ty}"),
            Self::Box(kind) => write!(f, "box {}", kind.wrapper_name()),
            Self::ArrayStore => f.write_str("aastore"),
            Self::MethodRef(m) => write!(f, "methodref {m}"),
            Self::InvokeHandler => f.write_str("invokehandler"),
            Self::CheckCast(ty) => write!(f, "checkcast {ty}"),
            Self::Unbox { kind, method } => {
                write!(f, "invokevirtual {}.{method}", kind.wrapper_name())
            }
            Self::InvokeSuper { method, .. } => write!(f, "invokespecial super.{method}"),
            Self::InvokeSuperConstructor => f.write_str("invokespecial super.<init>"),
            Self::Pop => f.write_str("pop"),
            Self::Return(r) => write!(f, "{r:?}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_like_primitives_share_int_family() {
        for kind in [
            PrimitiveKind::Boolean,
            PrimitiveKind::Char,
            PrimitiveKind::Byte,
            PrimitiveKind::Short,
            PrimitiveKind::Int,
        ] {
            assert_eq!(LoadInsn::for_primitive(kind), LoadInsn::ILoad);
            assert_eq!(ReturnInsn::for_type(&TypeRef::Primitive(kind)), ReturnInsn::IReturn);
        }
    }

    #[test]
    fn wide_and_floating_primitives_have_own_instructions() {
        assert_eq!(LoadInsn::for_primitive(PrimitiveKind::Long), LoadInsn::LLoad);
        assert_eq!(LoadInsn::for_primitive(PrimitiveKind::Float), LoadInsn::FLoad);
        assert_eq!(LoadInsn::for_primitive(PrimitiveKind::Double), LoadInsn::DLoad);
        assert_eq!(
            ReturnInsn::for_type(&TypeRef::Primitive(PrimitiveKind::Double)),
            ReturnInsn::DReturn
        );
    }

    #[test]
    fn void_and_references() {
        assert_eq!(LoadInsn::for_type(&TypeRef::Void), None);
        assert_eq!(ReturnInsn::for_type(&TypeRef::Void), ReturnInsn::Return);
        let array: TypeRef = "int[]".parse().unwrap();
        assert_eq!(LoadInsn::for_type(&array), Some(LoadInsn::ALoad));
        assert_eq!(ReturnInsn::for_type(&array), ReturnInsn::AReturn);
    }

    #[test]
    fn unbox_methods_are_distinct() {
        let methods: std::collections::BTreeSet<_> =
            PrimitiveKind::ALL.into_iter().map(unbox_method).collect();
        assert_eq!(methods.len(), 8);
        assert_eq!(unbox_method(PrimitiveKind::Int), "intValue");
    }

    #[test]
    fn integer_push_uses_smallest_encoding() {
        assert_eq!(IntConst::for_value(-1), IntConst::IConst(-1));
        assert_eq!(IntConst::for_value(5), IntConst::IConst(5));
        assert_eq!(IntConst::for_value(6), IntConst::BiPush(6));
        assert_eq!(IntConst::for_value(-2), IntConst::BiPush(-2));
        assert_eq!(IntConst::for_value(127), IntConst::BiPush(127));
        assert_eq!(IntConst::for_value(128), IntConst::SiPush(128));
        assert_eq!(IntConst::for_value(-32768), IntConst::SiPush(-32768));
        assert_eq!(IntConst::for_value(40_000), IntConst::Ldc(40_000));
    }

    #[test]
    fn load_accepts_matching_values_only() {
        assert!(LoadInsn::ILoad.accepts(&Value::Char('x')));
        assert!(!LoadInsn::ILoad.accepts(&Value::Long(1)));
        assert!(LoadInsn::ALoad.accepts(&Value::Null));
        assert!(!LoadInsn::ALoad.accepts(&Value::Int(1)));
    }
}
