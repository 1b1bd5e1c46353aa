//! Well-known type names
//!
//! Platform library types under their full platform names, container
//! annotations and container contracts. Annotation and contract names live
//! under the `beanstalk` package.

/// Universal root type
pub const OBJECT: &str = "java.lang.Object";
/// Serialization marker interface
pub const SERIALIZABLE: &str = "java.io.Serializable";
/// String type
pub const STRING: &str = "java.lang.String";

/// Wrapper for `boolean`
pub const BOOLEAN: &str = "java.lang.Boolean";
/// Wrapper for `char`
pub const CHARACTER: &str = "java.lang.Character";
/// Wrapper for `byte`
pub const BYTE: &str = "java.lang.Byte";
/// Wrapper for `short`
pub const SHORT: &str = "java.lang.Short";
/// Wrapper for `int`
pub const INTEGER: &str = "java.lang.Integer";
/// Wrapper for `long`
pub const LONG: &str = "java.lang.Long";
/// Wrapper for `float`
pub const FLOAT: &str = "java.lang.Float";
/// Wrapper for `double`
pub const DOUBLE: &str = "java.lang.Double";

/// All wrapper type names
pub const WRAPPERS: [&str; 8] = [BOOLEAN, CHARACTER, BYTE, SHORT, INTEGER, LONG, FLOAT, DOUBLE];

// Injection and naming

/// `@Inject`
pub const INJECT: &str = "beanstalk.Inject";
/// `@Named`
pub const NAMED: &str = "beanstalk.Named";
/// `@Qualifier` meta-annotation
pub const QUALIFIER: &str = "beanstalk.Qualifier";
/// `@Default` qualifier
pub const DEFAULT: &str = "beanstalk.Default";
/// `@Any` qualifier
pub const ANY: &str = "beanstalk.Any";
/// `@Produces`
pub const PRODUCES: &str = "beanstalk.Produces";
/// `@Vetoed`
pub const VETOED: &str = "beanstalk.Vetoed";

// Stereotypes, alternatives, specialization

/// `@Stereotype` meta-annotation
pub const STEREOTYPE: &str = "beanstalk.Stereotype";
/// Built-in `@Model` stereotype
pub const MODEL: &str = "beanstalk.Model";
/// `@Alternative`
pub const ALTERNATIVE: &str = "beanstalk.Alternative";
/// `@Specializes`
pub const SPECIALIZES: &str = "beanstalk.Specializes";
/// `@Priority`
pub const PRIORITY: &str = "beanstalk.Priority";

// Interception

/// `@InterceptorBinding` meta-annotation
pub const INTERCEPTOR_BINDING: &str = "beanstalk.InterceptorBinding";
/// `@Interceptor`
pub const INTERCEPTOR: &str = "beanstalk.Interceptor";
/// `@Decorator`
pub const DECORATOR: &str = "beanstalk.Decorator";
/// `@Delegate`
pub const DELEGATE: &str = "beanstalk.Delegate";
/// `@AroundInvoke`
pub const AROUND_INVOKE: &str = "beanstalk.AroundInvoke";
/// `@PostConstruct`
pub const POST_CONSTRUCT: &str = "beanstalk.PostConstruct";
/// `@PreDestroy`
pub const PRE_DESTROY: &str = "beanstalk.PreDestroy";

// Scopes

/// `@NormalScope` meta-annotation (member `passivating`)
pub const NORMAL_SCOPE: &str = "beanstalk.NormalScope";
/// `@Scope` meta-annotation for pseudo scopes
pub const SCOPE: &str = "beanstalk.Scope";
/// `@Dependent`
pub const DEPENDENT: &str = "beanstalk.Dependent";
/// `@ApplicationScoped`
pub const APPLICATION_SCOPED: &str = "beanstalk.ApplicationScoped";
/// `@RequestScoped`
pub const REQUEST_SCOPED: &str = "beanstalk.RequestScoped";
/// `@SessionScoped`
pub const SESSION_SCOPED: &str = "beanstalk.SessionScoped";
/// `@ConversationScoped`
pub const CONVERSATION_SCOPED: &str = "beanstalk.ConversationScoped";
/// `@Singleton`
pub const SINGLETON: &str = "beanstalk.Singleton";

// Container contracts

/// Container self-reference
pub const BEAN_MANAGER: &str = "beanstalk.BeanManager";
/// Injection point metadata
pub const INJECTION_POINT: &str = "beanstalk.InjectionPoint";
/// Programmatic lookup
pub const INSTANCE: &str = "beanstalk.Instance";
/// Event dispatch
pub const EVENT: &str = "beanstalk.Event";
/// Conversation control
pub const CONVERSATION: &str = "beanstalk.Conversation";
/// Caller principal
pub const PRINCIPAL: &str = "beanstalk.security.Principal";
/// Bean validator
pub const VALIDATOR: &str = "beanstalk.validation.Validator";
/// Bean validator factory
pub const VALIDATOR_FACTORY: &str = "beanstalk.validation.ValidatorFactory";
/// Transaction control
pub const USER_TRANSACTION: &str = "beanstalk.transaction.UserTransaction";

/// Marker interface implemented by every synthesized proxy
pub const PROXY_MARKER: &str = "beanstalk.proxy.BeanstalkProxy";

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TypeName;

    #[test]
    fn platform_types_use_full_package_names() {
        for name in [OBJECT, SERIALIZABLE, STRING].into_iter().chain(WRAPPERS) {
            let name = TypeName::new(name).unwrap();
            let package = name.package().unwrap();
            assert!(package == "java.lang" || package == "java.io", "{name}");
        }
    }
}
