/// End-to-end scenarios over small declaration graphs.
///
/// Each test builds a graph the way a front-end would, runs a full pass and
/// checks the plan and rendered artifacts.

use ferrous_di_codegen::config::EngineOptions;
use ferrous_di_codegen::constructor::ArgumentPlan;
use ferrous_di_codegen::engine::Engine;
use ferrous_di_codegen::model::{
    ConstructorCandidate, Marker, MethodDecl, ModuleDecl, Parameter, SectionMarker, TypeDeclaration, TypeGraph,
    TypeRef,
};
use ferrous_di_codegen::{DiagnosticId, Lifetime};

fn app(types: Vec<TypeDeclaration>) -> TypeGraph {
    let mut module = ModuleDecl::new("App");
    for t in types {
        module = module.with_type(t);
    }
    TypeGraph::new("App").with_module(module)
}

fn order_service() -> TypeDeclaration {
    TypeDeclaration::class("App", "App.OrderService").implementing(TypeRef::interface("App.IOrderService"))
}

#[test]
fn parameterless_service_is_a_singleton() {
    let graph = app(vec![TypeDeclaration::interface("App", "App.IOrderService"), order_service()]);
    let output = Engine::new(EngineOptions::default()).run(&graph).unwrap();

    assert!(output.diagnostics.is_empty());
    let service = output.plan.service("App.OrderService").unwrap();
    assert_eq!(service.lifetime, Lifetime::Singleton);
    assert!(service.constructor.is_parameterless());
    assert_eq!(service.interfaces, vec![TypeRef::interface("App.IOrderService")]);
}

#[test]
fn single_decorator_wraps_the_service() {
    let target = TypeRef::interface("App.IOrderService");
    let decorator = TypeDeclaration::class("App", "App.D")
        .implementing(target.clone())
        .with_marker(Marker::DecoratorFor {
            target: target.clone(),
            order: 1,
        })
        .with_constructor(ConstructorCandidate::with_parameters(vec![Parameter::new("inner", target.clone())]));
    let graph = app(vec![order_service(), decorator]);
    let plan = Engine::new(EngineOptions::default()).plan(&graph).unwrap();

    // The decorator itself is never registered as a service
    assert!(plan.service("App.D").is_none());
    assert_eq!(plan.decorator_chains.len(), 1);
    let chain = &plan.decorator_chains[0];
    assert_eq!(chain.target, target);
    assert_eq!(chain.implementations, vec!["App.OrderService"]);
    assert_eq!(chain.nesting("App.OrderService"), vec!["App.D", "App.OrderService"]);
    assert!(matches!(chain.links[0].constructor.arguments[0], ArgumentPlan::Inner { .. }));
}

#[test]
fn unused_validator_is_reported_once() {
    let options = TypeDeclaration::class("App", "App.DatabaseOptions")
        .with_marker(Marker::ConfigurationSection(SectionMarker {
            section: Some("Database".into()),
            validate_on_start: true,
            ..SectionMarker::default()
        }))
        .with_marker(Marker::ConfigurationSection(SectionMarker {
            section: Some("Database".into()),
            name: Some("Replica".into()),
            validate_on_start: false,
            ..SectionMarker::default()
        }))
        .with_method(MethodDecl::new("Validate"));
    let graph = app(vec![options]);
    let output = Engine::new(EngineOptions::default()).run(&graph).unwrap();

    let unused: Vec<_> = output
        .diagnostics
        .iter()
        .filter(|d| d.id == DiagnosticId::ValidatorUnused)
        .collect();
    assert_eq!(unused.len(), 1);
    assert_eq!(unused[0].args[2], "Database (Replica)");
    assert_eq!(output.plan.configuration.len(), 2);
}

#[test]
fn two_implementations_keep_their_own_lifetimes() {
    let cache = TypeRef::interface("App.ICache");
    let graph = app(vec![
        TypeDeclaration::class("App", "App.MemoryCache").implementing(cache.clone()),
        TypeDeclaration::class("App", "App.RedisCache")
            .implementing(cache.clone())
            .with_marker(Marker::Lifetime(Lifetime::Transient)),
    ]);
    let plan = Engine::new(EngineOptions::default()).plan(&graph).unwrap();

    let triples = plan.interface_triples();
    assert_eq!(
        triples,
        vec![
            ("App.MemoryCache".to_string(), "App.ICache".to_string(), Lifetime::Singleton),
            ("App.RedisCache".to_string(), "App.ICache".to_string(), Lifetime::Transient),
        ]
    );
}

#[test]
fn factory_source_gets_a_factory_not_a_registration() {
    let report = TypeDeclaration::class("App", "App.Report")
        .with_marker(Marker::FactorySource)
        .with_constructor(ConstructorCandidate::with_parameters(vec![
            Parameter::new("clock", TypeRef::interface("App.IClock")),
            Parameter::new("title", TypeRef::string()),
        ]));
    let graph = app(vec![report]);
    let output = Engine::new(EngineOptions::default()).run(&graph).unwrap();

    assert!(output.plan.services.is_empty());
    assert_eq!(output.plan.factories[0].factory_name, "App.ReportFactory");
    let registry = &output.artifacts[0].contents;
    assert!(registry.contains("factory: \"App.ReportFactory\""));
    assert!(registry.contains("Arg::Runtime(\"title\", \"string\")"));
}

#[test]
fn intercepted_service_registers_through_its_proxy() {
    let service = order_service()
        .with_marker(Marker::Intercept {
            interceptor: TypeRef::class("App.Timing"),
            order: 0,
        })
        .with_method(MethodDecl::new("Place"));
    let graph = app(vec![service]);
    let output = Engine::new(EngineOptions::default()).run(&graph).unwrap();

    assert_eq!(output.plan.intercepted.len(), 1);
    let registry = &output.artifacts[0].contents;
    assert!(registry.contains("proxy: Some(\"App.OrderServiceProxy\")"));
    assert!(registry.contains("ProxiedMethod { name: \"Place\", interceptors: &[\"App.Timing\"] }"));
}

#[test]
fn exempt_types_are_left_alone() {
    let graph = app(vec![
        order_service().with_marker(Marker::ExemptFromRegistration),
        TypeDeclaration::class("App", "App.Other"),
    ]);
    let plan = Engine::new(EngineOptions::default()).plan(&graph).unwrap();
    let names: Vec<_> = plan.services.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["App.Other"]);
}
