//! End-to-end deployments through the container facade

use beanstalk_deploy::prelude::*;
use beanstalk_deploy::{
    AfterBeanDiscovery, ContainerState, DeclarativeResource, InMemoryNamingService,
    ManagerReference, NamingService, PlatformProfile, DEFAULT_MANAGER_NAME,
};
use beanstalk_model::{
    wellknown, BeanId, BeanKind, MethodSignature, TypeName, TypeRef, TypeUniverse,
};
use beanstalk_proxy::{
    AroundInvoke, BeanInstance, InterceptorChain, InvocationContext, InvocationError, Value,
};
use beanstalk_test_utils::{
    car_fixture, decorator_fixture, delegate_misuse_fixture, interceptor_fixture, named,
    passivation_fixture, pojo_fixture, specialized_car_fixture, tn, ty, Fixture, MethodBuilder,
    TypeBuilder,
};
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use std::collections::HashMap;
use std::sync::Arc;

fn discovery(fixture: Fixture) -> StaticDiscovery {
    StaticDiscovery::new(fixture.universe).with_candidates(fixture.candidates)
}

fn deployed(discovery: &StaticDiscovery) -> Container {
    let mut container = Container::builder().build();
    container.deploy(discovery).unwrap();
    container
}

fn class_names<'a>(beans: impl IntoIterator<Item = &'a TypeName>) -> Vec<&'a str> {
    beans.into_iter().map(TypeName::simple_name).collect()
}

#[test]
fn plain_class_gets_an_empty_plan_and_no_proxy() {
    let container = deployed(&discovery(pojo_fixture()));
    let pojo = tn("com.acme.Pojo");
    let bean = container.class_bean(&pojo).unwrap();
    assert_eq!(bean.kind, BeanKind::ManagedBean);
    assert!(bean.plan.as_ref().unwrap().is_empty());
    assert!(container.proxy_class(&pojo).unwrap().is_none());
    assert_eq!(container.proxies().stats().syntheses, 0);
}

#[test]
fn delegate_outside_a_decorator_is_rejected() {
    let mut container = Container::builder().build();
    let err = container.deploy(&discovery(delegate_misuse_fixture())).unwrap_err();
    assert_eq!(err.phase, DeploymentPhase::Validation);
    assert!(err.is_configuration());
    assert!(err.to_string().contains("Decorator1"));
    assert_eq!(container.state(), ContainerState::Failed);
}

#[test]
fn competing_specializers_fail_deployment() {
    let mut container = Container::builder().build();
    let err = container.deploy(&discovery(car_fixture())).unwrap_err();
    assert_eq!(err.phase, DeploymentPhase::Specialization);
    assert!(err.is_specialization_conflict());
    assert!(err.to_string().contains("com.acme.Car"));
}

#[test]
fn specializer_replaces_its_superclass() {
    let container = deployed(&discovery(specialized_car_fixture()));
    let car = container.beans().unwrap().by_class(&tn("com.acme.Car")).next().unwrap();
    assert!(!car.enabled);

    let garage = container.class_bean(&tn("com.acme.Garage")).unwrap();
    assert_eq!(garage.injection_points.len(), 2);
    for point in &garage.injection_points {
        let resolved = container.resolve(point).unwrap();
        assert_eq!(resolved.bean_class.as_str(), "com.acme.TopCar");
    }

    let named = container.resolve_by_name("car").unwrap();
    assert_eq!(named.len(), 1);
    assert_eq!(named[0].bean_class.as_str(), "com.acme.TopCar");

    let edges = container.specializations().unwrap();
    assert_eq!(edges.len(), 1);
    assert_eq!(edges[0].target.as_str(), "com.acme.Car");
}

fn price_lists(sale_overrides_producer: bool) -> StaticDiscovery {
    let price = || {
        MethodBuilder::new("price")
            .returns("com.acme.Price")
            .annotate(wellknown::PRODUCES)
            .build()
    };
    let mut sale = TypeBuilder::class("com.acme.SalePriceList")
        .extends("com.acme.PriceList")
        .annotate(wellknown::SPECIALIZES);
    if sale_overrides_producer {
        sale = sale.method(price());
    }
    let universe = TypeUniverse::with_types([
        TypeBuilder::interface("com.acme.Price").build(),
        TypeBuilder::class("com.acme.PriceList").method(price()).build(),
        sale.build(),
        TypeBuilder::class("com.acme.Shop")
            .inject("price", "com.acme.Price", &[])
            .build(),
    ]);
    StaticDiscovery::new(universe).with_candidates([
        tn("com.acme.PriceList"),
        tn("com.acme.SalePriceList"),
        tn("com.acme.Shop"),
    ])
}

#[test]
fn specialized_bean_stops_producing() {
    let container = deployed(&price_lists(true));
    let sale = container.class_bean(&tn("com.acme.SalePriceList")).unwrap().id;
    let shop = container.class_bean(&tn("com.acme.Shop")).unwrap();

    let resolved = container.resolve(&shop.injection_points[0]).unwrap();
    assert_eq!(resolved.kind, BeanKind::Producer);
    assert_eq!(resolved.producer.as_ref().map(|p| p.declaring_bean), Some(sale));

    let base_producers: Vec<_> = container
        .beans()
        .unwrap()
        .iter()
        .filter(|b| b.kind == BeanKind::Producer && b.id != resolved.id)
        .collect();
    assert_eq!(base_producers.len(), 1);
    assert!(!base_producers[0].enabled);
}

#[test]
fn producer_of_a_specialized_bean_cannot_satisfy_injection() {
    let err = Container::builder().build().deploy(&price_lists(false)).unwrap_err();
    assert_eq!(err.phase, DeploymentPhase::Validation);
    assert!(err.is_unsatisfied());
}

#[test]
fn dotted_name_extension_is_a_configuration_error() {
    let universe = TypeUniverse::with_types([
        TypeBuilder::class("com.acme.Short").annotate_with(named("x")).build(),
        TypeBuilder::class("com.acme.Long").annotate_with(named("x.y")).build(),
    ]);
    let discovery = StaticDiscovery::new(universe)
        .with_candidates([tn("com.acme.Short"), tn("com.acme.Long")]);
    let err = Container::builder().build().deploy(&discovery).unwrap_err();
    assert!(err.is_configuration());
    assert!(err.to_string().contains("x.y"));
}

#[test]
fn passivating_scope_requires_passivation_capable_beans() {
    let fixture = passivation_fixture();
    let universe = fixture.universe.clone();

    let err = Container::builder().build().deploy(&discovery(fixture)).unwrap_err();
    assert!(err.is_configuration());
    assert!(err.to_string().contains("com.acme.Cart"));

    let without_cart = StaticDiscovery::new(universe).with_candidates([
        tn("com.acme.Wallet"),
        tn("com.acme.Connection"),
        tn("com.acme.ConnectionFactory"),
    ]);
    let container = deployed(&without_cart);
    let producer = container
        .beans()
        .unwrap()
        .iter()
        .find(|b| b.kind == BeanKind::Producer)
        .unwrap();
    assert_eq!(producer.scope.as_str(), wellknown::SESSION_SCOPED);
    assert!(container.class_bean(&tn("com.acme.Wallet")).unwrap().passivation_capable);
}

#[test]
fn interceptors_are_ordered_by_priority_then_discovery() {
    let container = deployed(&discovery(interceptor_fixture()));
    let service = container.class_bean(&tn("com.acme.OrderService")).unwrap();
    let plan = service.plan.as_ref().unwrap();
    let place = MethodSignature::new("place", vec![ty("int"), ty("long")]);
    let chain = class_names(plan.interceptors_for(&place).iter().map(|i| &i.class));
    assert_eq!(chain, ["AuditInterceptor", "TimingInterceptor", "LoggingInterceptor"]);
    assert!(plan.interceptors_for(&MethodSignature::new("finish", vec![])).is_empty());
}

#[test]
fn manifest_priority_overrides_annotation_priority() {
    let manifest = "interceptors:\n  - class: com.acme.LoggingInterceptor\n    priority: 1\n";
    let discovery = discovery(interceptor_fixture())
        .with_resource(DeclarativeResource::new("beans.yaml", manifest));
    let container = deployed(&discovery);
    let plan = container
        .class_bean(&tn("com.acme.OrderService"))
        .and_then(|b| b.plan.clone())
        .unwrap();
    let place = MethodSignature::new("place", vec![ty("int"), ty("long")]);
    let chain = class_names(plan.interceptors_for(&place).iter().map(|i| &i.class));
    assert_eq!(chain, ["LoggingInterceptor", "AuditInterceptor", "TimingInterceptor"]);
}

#[test]
fn manifest_entry_must_name_an_interceptor() {
    let manifest = "interceptors:\n  - class: com.acme.Pojo\n";
    let discovery = discovery(interceptor_fixture())
        .with_resource(DeclarativeResource::new("beans.yaml", manifest));
    let err = Container::builder().build().deploy(&discovery).unwrap_err();
    assert_eq!(err.phase, DeploymentPhase::Validation);
    assert!(err.to_string().contains("com.acme.Pojo"));
}

#[test]
fn decorators_wrap_only_the_methods_they_implement() {
    let container = deployed(&discovery(decorator_fixture()));
    let greeter = container.class_bean(&tn("com.acme.PoliteGreeter")).unwrap();
    let plan = greeter.plan.as_ref().unwrap();
    let greet = MethodSignature::new("greet", vec![ty(wellknown::STRING)]);
    let farewell = MethodSignature::new("farewell", vec![]);
    let chain = class_names(plan.decorators_for(&greet).iter().map(|d| &d.class));
    assert_eq!(chain, ["LoudGreeter", "ExclaimGreeter"]);
    assert!(plan.decorators_for(&farewell).is_empty());

    let proxy = container.proxy_class(&tn("com.acme.PoliteGreeter")).unwrap().unwrap();
    assert!(proxy.intercepted_methods().contains(&greet));
    assert!(!proxy.intercepted_methods().contains(&farewell));
}

struct OrderService;

impl BeanInstance for OrderService {
    fn class_name(&self) -> &TypeName {
        static CLASS: std::sync::OnceLock<TypeName> = std::sync::OnceLock::new();
        CLASS.get_or_init(|| tn("com.acme.OrderService"))
    }

    fn invoke(&self, method: &MethodSignature, args: Vec<Value>) -> Result<Value, InvocationError> {
        match (method.name.as_str(), args.as_slice()) {
            ("place", [Value::Int(quantity), Value::Long(unit)]) => {
                Ok(Value::Long(i64::from(*quantity) * unit))
            }
            ("describe", []) => Ok(Value::Text("orders".into())),
            _ => Err(InvocationError::NoSuchMethod {
                class: self.class_name().clone(),
                method: method.clone(),
            }),
        }
    }
}

struct Recorder {
    label: &'static str,
    log: Arc<Mutex<Vec<&'static str>>>,
}

impl AroundInvoke for Recorder {
    fn around_invoke(&self, ctx: &mut InvocationContext<'_>) -> Result<Value, InvocationError> {
        self.log.lock().push(self.label);
        ctx.proceed()
    }
}

#[test]
fn deployed_plan_drives_a_synthesized_proxy() {
    let container = deployed(&discovery(interceptor_fixture()));
    let class = tn("com.acme.OrderService");
    let proxy_class = container.proxy_class(&class).unwrap().unwrap();
    assert_eq!(proxy_class.name().as_str(), "com.acme.OrderService$$BeanstalkProxy");
    let again = container.proxy_class(&class).unwrap().unwrap();
    assert!(Arc::ptr_eq(&proxy_class, &again));

    let log = Arc::new(Mutex::new(Vec::new()));
    let mut instances: HashMap<BeanId, Arc<dyn AroundInvoke>> = HashMap::new();
    for (interceptor, label) in [
        ("com.acme.AuditInterceptor", "audit"),
        ("com.acme.TimingInterceptor", "timing"),
        ("com.acme.LoggingInterceptor", "logging"),
    ] {
        let id = container.beans().unwrap().by_class(&tn(interceptor)).next().unwrap().id;
        instances.insert(id, Arc::new(Recorder { label, log: Arc::clone(&log) }));
    }
    let plan = container.class_bean(&class).and_then(|b| b.plan.as_ref()).unwrap();
    let chain = InterceptorChain::from_plan(plan, &instances).unwrap();

    let proxy = proxy_class.instantiate(Arc::new(OrderService), Arc::new(chain)).unwrap();
    let place = MethodSignature::new("place", vec![ty("int"), ty("long")]);
    let total = proxy.invoke(&place, vec![Value::Int(6), Value::Long(7)]).unwrap();
    assert_eq!(total, Value::Long(42));
    assert_eq!(*log.lock(), vec!["audit", "timing", "logging"]);
}

#[test]
fn deploying_twice_is_a_no_op() {
    let discovery = discovery(pojo_fixture());
    let mut container = deployed(&discovery);
    let beans = container.beans().unwrap().len();
    container.deploy(&discovery).unwrap();
    assert_eq!(container.beans().unwrap().len(), beans);
}

#[test]
fn failed_container_refuses_further_use() {
    let mut container = Container::builder().build();
    assert!(container.deploy(&discovery(car_fixture())).is_err());
    let err = container.deploy(&discovery(pojo_fixture())).unwrap_err();
    assert!(err.is_container_unusable());
    assert!(matches!(container.beans(), Err(ContainerError::NotDeployed)));
}

struct Veto(&'static str);

impl Extension for Veto {
    fn name(&self) -> &str {
        "veto"
    }

    fn register(&self, observers: &mut ObserverRegistry) {
        let vetoed = self.0;
        observers.on_process_annotated_type(move |at| {
            if at.name().as_str() == vetoed {
                Verdict::Veto
            } else {
                Verdict::Continue
            }
        });
    }
}

#[test]
fn vetoed_type_gets_no_bean() {
    let mut container = Container::builder().extension(Veto("com.acme.Pojo")).build();
    container.deploy(&discovery(pojo_fixture())).unwrap();
    assert!(container.class_bean(&tn("com.acme.Pojo")).is_none());
}

#[test]
fn vetoed_specializer_does_not_specialize() {
    let mut container = Container::builder().extension(Veto("com.acme.LuxuryCar")).build();
    container.deploy(&discovery(car_fixture())).unwrap();
    let specializations = container.specializations().unwrap();
    assert_eq!(specializations.len(), 1);
    assert_eq!(specializations[0].specializer.as_str(), "com.acme.TopCar");
}

struct Complainer;

impl Extension for Complainer {
    fn name(&self) -> &str {
        "complainer"
    }

    fn register(&self, observers: &mut ObserverRegistry) {
        observers.on_after_discovery(|e: &mut AfterBeanDiscovery<'_>| {
            e.add_definition_error("first");
        });
        observers.on_after_discovery(|e: &mut AfterBeanDiscovery<'_>| {
            e.add_definition_error("second");
        });
    }
}

#[test]
fn after_discovery_errors_are_reported_together() {
    let mut container = Container::builder().extension(Complainer).build();
    let err = container.deploy(&discovery(pojo_fixture())).unwrap_err();
    assert_eq!(err.phase, DeploymentPhase::AfterDiscovery);
    assert!(err.is_observer());
    let message = err.to_string();
    assert!(message.contains("first") && message.contains("second"));
}

struct Contributor;

impl Extension for Contributor {
    fn name(&self) -> &str {
        "contributor"
    }

    fn register(&self, observers: &mut ObserverRegistry) {
        observers.on_before_discovery(|e| {
            e.add_annotated_type(TypeBuilder::class("com.acme.Generated").build());
            Ok(())
        });
    }
}

#[test]
fn extension_types_are_deployed_after_the_scan() {
    let mut container = Container::builder().extension(Contributor).build();
    container.deploy(&discovery(pojo_fixture())).unwrap();
    let generated = container.class_bean(&tn("com.acme.Generated")).unwrap();
    assert_eq!(generated.source, beanstalk_model::BeanSource::Extension);
    assert!(container.universe().unwrap().contains("com.acme.Generated"));
}

#[test]
fn manager_reference_is_bound_until_shutdown() {
    let naming: Arc<dyn NamingService> = Arc::new(InMemoryNamingService::new());
    let mut container = Container::builder().naming(Arc::clone(&naming)).build();
    container.deploy(&discovery(pojo_fixture())).unwrap();

    let bound = naming.lookup(DEFAULT_MANAGER_NAME).unwrap();
    assert_eq!(bound.downcast_ref::<ManagerReference>(), Some(&container.manager_reference()));

    let manager = container
        .beans_by_type(&TypeRef::Object(TypeName::from_static(wellknown::BEAN_MANAGER)), &[])
        .unwrap();
    assert_eq!(manager.len(), 1);
    assert_eq!(manager[0].kind, BeanKind::BuiltIn);

    container.shutdown();
    assert!(naming.lookup(DEFAULT_MANAGER_NAME).is_none());
    assert_eq!(container.state(), ContainerState::ShutDown);
}

#[test]
fn failed_deployment_unbinds_the_manager() {
    let naming: Arc<dyn NamingService> = Arc::new(InMemoryNamingService::new());
    let mut container = Container::builder().naming(Arc::clone(&naming)).build();
    assert!(container.deploy(&discovery(car_fixture())).is_err());
    assert!(naming.lookup(DEFAULT_MANAGER_NAME).is_none());
}

#[test]
fn platform_beans_follow_the_profile_and_known_contracts() {
    let principal = TypeRef::Object(TypeName::from_static(wellknown::PRINCIPAL));
    let fixture =
        pojo_fixture().with_library(vec![TypeBuilder::interface(wellknown::PRINCIPAL).build()]);

    let config = ContainerConfig::default().with_platform(PlatformProfile::Web);
    let mut web = Container::builder().config(config).build();
    web.deploy(&discovery(fixture.clone())).unwrap();
    assert_eq!(web.beans_by_type(&principal, &[]).unwrap().len(), 1);

    let standalone = deployed(&discovery(fixture));
    assert!(standalone.beans_by_type(&principal, &[]).unwrap().is_empty());

    let config = ContainerConfig::default().with_platform(PlatformProfile::Web);
    let mut missing = Container::builder().config(config).build();
    missing.deploy(&discovery(pojo_fixture())).unwrap();
    assert!(missing.beans_by_type(&principal, &[]).unwrap().is_empty());
}
