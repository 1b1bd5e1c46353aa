//! Beanstalk command-line driver
//!
//! Deploys an application descriptor (YAML or JSON) into a fresh container
//! and reports the resulting beans, or the phase deployment failed in.

use anyhow::{bail, Context, Result};
use beanstalk_deploy::{
    ApplicationDescriptor, Container, ContainerConfig, DeclarativeResource, StaticDiscovery,
};
use beanstalk_model::{BeanRecord, TypeName};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

fn cli() -> Command {
    let descriptor = Arg::new("descriptor")
        .required(true)
        .value_parser(value_parser!(PathBuf))
        .help("Application descriptor (.yaml, .yml or .json)");
    let config = Arg::new("config")
        .long("config")
        .value_parser(value_parser!(PathBuf))
        .help("Container configuration (TOML)");
    let manifest = Arg::new("manifest")
        .long("manifest")
        .action(ArgAction::Append)
        .value_parser(value_parser!(PathBuf))
        .help("Declarative manifest (YAML); may be repeated");

    Command::new("beanstalk")
        .version(beanstalk_deploy::VERSION)
        .about("Deploy applications into a Beanstalk container")
        .arg_required_else_help(true)
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Log at debug level unless RUST_LOG is set"),
        )
        .subcommand(
            Command::new("deploy")
                .about("Deploy and list the beans")
                .arg(descriptor.clone())
                .arg(config.clone())
                .arg(manifest.clone())
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output as JSON"),
                ),
        )
        .subcommand(
            Command::new("proxy")
                .about("Deploy and show the proxy class of a bean")
                .arg(descriptor)
                .arg(
                    Arg::new("class")
                        .required(true)
                        .help("Bean class, e.g. com.acme.OrderService"),
                )
                .arg(config)
                .arg(manifest),
        )
}

fn init_logging(verbose: bool) {
    let fallback = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_application(path: &Path) -> Result<StaticDiscovery> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("reading application descriptor {}", path.display()))?;
    let is_json = path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    let descriptor = if is_json {
        ApplicationDescriptor::from_json(&source)?
    } else {
        ApplicationDescriptor::from_yaml(&source)?
    };
    debug!(
        types = descriptor.types.len(),
        library = descriptor.library.len(),
        "application descriptor loaded"
    );
    Ok(descriptor.into_discovery())
}

fn load_config(path: Option<&PathBuf>) -> Result<ContainerConfig> {
    match path {
        Some(path) => ContainerConfig::from_toml_file(path)
            .with_context(|| format!("loading configuration {}", path.display())),
        None => Ok(ContainerConfig::default()),
    }
}

fn with_manifests(mut discovery: StaticDiscovery, args: &ArgMatches) -> Result<StaticDiscovery> {
    for path in args.get_many::<PathBuf>("manifest").into_iter().flatten() {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading manifest {}", path.display()))?;
        let resource = DeclarativeResource::new(path.display().to_string(), content);
        discovery = discovery.with_resource(resource);
    }
    Ok(discovery)
}

fn deployed(args: &ArgMatches) -> Result<Container> {
    let Some(descriptor) = args.get_one::<PathBuf>("descriptor") else {
        bail!("missing application descriptor");
    };
    let config = load_config(args.get_one::<PathBuf>("config"))?;
    let discovery = with_manifests(load_application(descriptor)?, args)?;

    let mut container = Container::builder().config(config).build();
    container
        .deploy(&discovery)
        .with_context(|| format!("deploying {}", descriptor.display()))?;
    info!(container = %container.id(), "deployment succeeded");
    Ok(container)
}

#[derive(Debug, Serialize)]
struct BeanReport {
    id: String,
    kind: String,
    class: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    scope: String,
    enabled: bool,
    qualifiers: Vec<String>,
    intercepted: Vec<String>,
}

impl From<&BeanRecord> for BeanReport {
    fn from(bean: &BeanRecord) -> Self {
        Self {
            id: bean.id.to_string(),
            kind: bean.kind.to_string(),
            class: bean.bean_class.to_string(),
            name: bean.name.clone(),
            scope: bean.scope.simple_name().to_string(),
            enabled: bean.enabled,
            qualifiers: bean.qualifiers.iter().map(ToString::to_string).collect(),
            intercepted: bean
                .plan
                .iter()
                .flat_map(|p| p.intercepted_methods())
                .map(|m| m.to_string())
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
struct DeploymentReport {
    container: String,
    beans: Vec<BeanReport>,
    specializations: Vec<String>,
}

fn report(container: &Container) -> Result<DeploymentReport> {
    let beans = container.beans()?.iter().map(BeanReport::from).collect();
    let specializations = container
        .specializations()?
        .iter()
        .map(|e| format!("{} -> {}", e.specializer, e.target))
        .collect();
    Ok(DeploymentReport {
        container: container.id().to_string(),
        beans,
        specializations,
    })
}

fn print_report(report: &DeploymentReport) {
    println!("Container {}", report.container);
    println!("Beans ({}):", report.beans.len());
    for bean in &report.beans {
        let state = if bean.enabled { "" } else { " (disabled)" };
        let name = bean.name.as_deref().map(|n| format!(" {n:?}")).unwrap_or_default();
        println!("  {} {} {}{name} @{}{state}", bean.id, bean.kind, bean.class, bean.scope);
        for method in &bean.intercepted {
            println!("      intercepts {method}");
        }
    }
    if !report.specializations.is_empty() {
        println!("Specializations:");
        for edge in &report.specializations {
            println!("  {edge}");
        }
    }
}

fn run_deploy(args: &ArgMatches) -> Result<()> {
    let container = deployed(args)?;
    let report = report(&container)?;
    if args.get_flag("json") {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}

fn run_proxy(args: &ArgMatches) -> Result<()> {
    let Some(class) = args.get_one::<String>("class") else {
        bail!("missing bean class");
    };
    let class = TypeName::new(class.as_str())?;
    let container = deployed(args)?;
    match container.proxy_class(&class)? {
        Some(proxy) => {
            println!("{} extends {}", proxy.name(), proxy.super_type());
            for method in proxy.intercepted_methods() {
                println!("  intercepted {method}");
            }
            for method in proxy.forwarded_methods() {
                println!("  forwarded   {method}");
            }
        }
        None => println!("{class} needs no proxy"),
    }
    Ok(())
}

fn main() -> Result<()> {
    let matches = cli().get_matches();
    init_logging(matches.get_flag("verbose"));

    match matches.subcommand() {
        Some(("deploy", args)) => run_deploy(args),
        Some(("proxy", args)) => run_proxy(args),
        _ => {
            cli().print_help()?;
            Ok(())
        }
    }
}
