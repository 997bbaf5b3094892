/// Rendering and publication: determinism, ordering, renderers and sinks.

use ferrous_di_codegen::config::{BreadcrumbLevel, EngineOptions};
use ferrous_di_codegen::emit::{ArtifactKind, JsonRenderer};
use ferrous_di_codegen::engine::Engine;
use ferrous_di_codegen::model::{
    ConstructorCandidate, Marker, ModuleDecl, Parameter, TypeDeclaration, TypeGraph, TypeRef,
};
use ferrous_di_codegen::sink::{ArtifactSink, DirectorySink, MemorySink};
use ferrous_di_codegen::{GenError, Lifetime};

/// Routes engine logs to the test harness; `RUST_LOG=ferrous_di_codegen=trace` shows them.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn sample_graph() -> TypeGraph {
    let repository = TypeRef::interface("App.IOrderRepository");
    TypeGraph::new("App")
        .with_module(
            ModuleDecl::new("Lib")
                .participating()
                .with_type(TypeDeclaration::class("Lib", "Lib.SystemClock").implementing(TypeRef::interface("Lib.IClock"))),
        )
        .with_module(
            ModuleDecl::new("App")
                .with_type(
                    TypeDeclaration::class("App", "App.SqlOrderRepository")
                        .implementing(repository.clone())
                        .with_marker(Marker::Lifetime(Lifetime::Scoped))
                        .with_marker(Marker::Keyed("primary".into()))
                        .at("src/orders.cs", 12, 5),
                )
                .with_type(
                    TypeDeclaration::class("App", "App.OrderService")
                        .implementing(TypeRef::interface("App.IOrderService"))
                        .with_constructor(ConstructorCandidate::with_parameters(vec![
                            Parameter::new("repository", repository),
                            Parameter::new("clock", TypeRef::interface("Lib.IClock")),
                        ]))
                        .at("src/orders.cs", 40, 5),
                ),
        )
}

#[test]
fn identical_input_gives_identical_bytes() {
    init_tracing();
    let options = EngineOptions {
        diagnostics: true,
        breadcrumbs: BreadcrumbLevel::Verbose,
        ..EngineOptions::default()
    };
    let first = Engine::new(options.clone()).run(&sample_graph()).unwrap();
    let second = Engine::new(options).run(&sample_graph()).unwrap();

    assert_eq!(first.artifacts.len(), 6);
    for (a, b) in first.artifacts.iter().zip(&second.artifacts) {
        assert_eq!(a.name, b.name);
        assert_eq!(a.contents, b.contents);
    }
}

#[test]
fn module_declaration_order_does_not_matter() {
    let graph = sample_graph();
    let mut reversed = graph.clone();
    reversed.modules.reverse();

    let a = Engine::new(EngineOptions::default()).run(&graph).unwrap();
    let b = Engine::new(EngineOptions::default()).run(&reversed).unwrap();
    assert_eq!(a.artifacts, b.artifacts);
}

#[test]
fn current_module_is_emitted_first_then_names_in_order() {
    let output = Engine::new(EngineOptions::default()).run(&sample_graph()).unwrap();
    let registry = &output.artifact(ArtifactKind::ServiceRegistry).unwrap().contents;

    let order_service = registry.find("\"App.OrderService\"").unwrap();
    let repository = registry.find("\"App.SqlOrderRepository\"").unwrap();
    let clock = registry.find("\"Lib.SystemClock\"").unwrap();
    assert!(order_service < repository);
    assert!(repository < clock);
}

#[test]
fn verbose_breadcrumbs_name_the_declaration_site() {
    let options = EngineOptions {
        breadcrumbs: BreadcrumbLevel::Verbose,
        ..EngineOptions::default()
    };
    let output = Engine::new(options).run(&sample_graph()).unwrap();
    let registry = &output.artifact(ArtifactKind::ServiceRegistry).unwrap().contents;

    assert!(registry.contains("// App :: App.OrderService"));
    assert!(registry.contains("// declared at src/orders.cs:40:5"));
    assert!(registry.contains("with 2 argument(s)"));
}

#[test]
fn json_renderer_produces_structured_artifacts() {
    let engine = Engine::new(EngineOptions::default()).with_renderer(Box::new(JsonRenderer));
    let output = engine.run(&sample_graph()).unwrap();

    let names: Vec<_> = output.artifacts.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "ServiceRegistry.json",
            "PluginRegistry.json",
            "DecoratorApplication.json",
            "ConfigurationBinding.json",
            "Bootstrap.json",
        ]
    );

    let registry: serde_json::Value =
        serde_json::from_str(&output.artifact(ArtifactKind::ServiceRegistry).unwrap().contents).unwrap();
    assert_eq!(registry["artifact"], "ServiceRegistry");
    assert_eq!(registry["services"][1]["name"], "App.SqlOrderRepository");
    let keys: Vec<_> = registry["services"][1]["registration_keys"]
        .as_array()
        .unwrap()
        .iter()
        .map(|k| k.as_str().unwrap().to_string())
        .collect();
    assert_eq!(
        keys,
        vec![
            "App.SqlOrderRepository",
            "App.IOrderRepository",
            "App.SqlOrderRepository[primary]",
            "App.IOrderRepository[primary]",
        ]
    );

    let bootstrap: serde_json::Value =
        serde_json::from_str(&output.artifact(ArtifactKind::Bootstrap).unwrap().contents).unwrap();
    assert_eq!(bootstrap["modules"][0], "Lib");
}

#[test]
fn directory_sink_receives_every_artifact() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let mut sink = DirectorySink::new(dir.path().join("obj/generated")).unwrap();
    let output = Engine::new(EngineOptions::default())
        .generate(&sample_graph(), &mut sink)
        .unwrap();

    for artifact in &output.artifacts {
        let written = std::fs::read_to_string(sink.root().join(&artifact.name)).unwrap();
        assert_eq!(written, artifact.contents);
    }
    // A second publication of the same pass is refused
    assert!(matches!(
        output.publish_to(&mut sink),
        Err(GenError::DuplicateArtifact(name)) if name == "ServiceRegistry.g.rs"
    ));
}

#[test]
fn memory_sink_names_are_sorted() {
    let mut sink = MemorySink::new();
    Engine::new(EngineOptions::default())
        .generate(&sample_graph(), &mut sink)
        .unwrap();
    assert_eq!(
        sink.names(),
        vec![
            "Bootstrap.g.rs",
            "ConfigurationBinding.g.rs",
            "DecoratorApplication.g.rs",
            "PluginRegistry.g.rs",
            "ServiceRegistry.g.rs",
        ]
    );
    assert!(sink.get("Bootstrap.g.rs").unwrap().contains("loader.force_load(\"Lib\")"));
    let output = Engine::new(EngineOptions::default()).run(&sample_graph()).unwrap();
    assert!(matches!(
        sink.publish(&output.artifacts[0]),
        Err(GenError::DuplicateArtifact(_))
    ));
    assert_eq!(sink.len(), 5);
}

#[test]
fn report_filter_limits_listed_services() {
    let options = EngineOptions {
        diagnostics: true,
        diagnostics_filter: vec!["Lib.".into()],
        ..EngineOptions::default()
    };
    let output = Engine::new(options).run(&sample_graph()).unwrap();
    let report = &output.artifact(ArtifactKind::DiagnosticReport).unwrap().contents;

    assert!(report.contains("Lib.SystemClock"));
    assert!(!report.contains("App.OrderService"));
}

#[cfg(feature = "yaml")]
#[test]
fn yaml_renderer_uses_yaml_extension() {
    use ferrous_di_codegen::emit::YamlRenderer;

    let engine = Engine::new(EngineOptions::default()).with_renderer(Box::new(YamlRenderer));
    let output = engine.run(&sample_graph()).unwrap();
    let bootstrap = output.artifact(ArtifactKind::Bootstrap).unwrap();
    assert_eq!(bootstrap.name, "Bootstrap.yaml");
    let parsed: serde_json::Value = serde_yaml::from_str(&bootstrap.contents).unwrap();
    assert_eq!(parsed["modules"][0], "Lib");
}
