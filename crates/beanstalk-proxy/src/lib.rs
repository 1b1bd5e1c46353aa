//! Beanstalk Proxy Synthesis
//!
//! Generates subclass proxies that route intercepted methods through an
//! invocation handler and forward everything else to the superclass.
//!
//! # Architecture
//!
//! ```text
//! MethodPartition ──► ProxySynthesizer ──► ProxyClass (emitted Insn bodies)
//!                           │                    │
//!                  ClassLoaderScope (names)      ▼
//!                           │             ProxyInstance ──► InvocationHandler
//!                     ProxyFactory (moka)                    (InterceptorChain)
//! ```
//!
//! Proxies are emitted as instruction bodies for a small stack machine and run
//! by [`ProxyInstance`], a wrapper that holds the target instance and the
//! handler. Instruction selection per primitive lives in [`instruction`].

mod chain;
mod class;
mod error;
mod factory;
pub mod instruction;
mod partition;
mod runtime;
mod scope;
mod synthesizer;
mod value;

pub use chain::{AroundInvoke, InterceptorChain, InvocationContext};
pub use class::{ProxyClass, ProxyField, ProxyMethod, ProxyMethodKind};
pub use error::{InvocationError, ProxyGenerationError};
pub use factory::{ProxyCacheKey, ProxyCacheStats, ProxyFactory};
pub use instruction::{Insn, IntConst, LoadInsn, ReturnInsn};
pub use partition::MethodPartition;
pub use runtime::{BeanInstance, InvocationHandler, ProxyInstance};
pub use scope::{ClassLoaderScope, LoaderId};
pub use synthesizer::{ProxyRequest, ProxySynthesizer, DEFAULT_PROXY_SUFFIX, MAX_NAME_ATTEMPTS};
pub use value::{ObjectRef, Value};

/// Prelude for common imports
pub mod prelude {
    pub use super::{
        AroundInvoke, BeanInstance, ClassLoaderScope, InterceptorChain, InvocationContext,
        InvocationError, InvocationHandler, ProxyClass, ProxyFactory, ProxyGenerationError,
        ProxyRequest, ProxySynthesizer, Value,
    };
}

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
