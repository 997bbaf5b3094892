/// Configuration binding: section inference, coercions, nested filtering and
/// the two binding modes.

use ferrous_di_codegen::binding::Coercion;
use ferrous_di_codegen::config::{BreadcrumbLevel, EngineOptions};
use ferrous_di_codegen::emit::ArtifactKind;
use ferrous_di_codegen::engine::Engine;
use ferrous_di_codegen::model::{
    ConstructorCandidate, DeclarationKind, Marker, ModuleDecl, Parameter, PropertyDecl, SectionMarker,
    TypeDeclaration, TypeGraph, TypeRef,
};
use ferrous_di_codegen::plan::BindingMode;
use ferrous_di_codegen::DiagnosticId;

fn section(name: Option<&str>) -> Marker {
    Marker::ConfigurationSection(SectionMarker {
        section: name.map(str::to_string),
        ..SectionMarker::default()
    })
}

fn graph(types: Vec<TypeDeclaration>) -> TypeGraph {
    let mut module = ModuleDecl::new("App");
    for t in types {
        module = module.with_type(t);
    }
    TypeGraph::new("App").with_module(module)
}

fn server_options() -> TypeDeclaration {
    TypeDeclaration::class("App", "App.ServerOptions")
        .with_marker(section(None))
        .with_property(PropertyDecl::new("Host", TypeRef::string()))
        .with_property(PropertyDecl::new("Port", TypeRef::primitive("int")))
        .with_property(PropertyDecl::new("Secure", TypeRef::primitive("bool")))
        .with_property(PropertyDecl::new("Timeout", TypeRef::class("TimeSpan")))
        .with_property(PropertyDecl::new("InstanceId", TypeRef::class("System.Guid")).init_only())
        .with_property(PropertyDecl::new("Level", TypeRef::enumeration("App.LogLevel")))
        .with_property(PropertyDecl::new("Retries", TypeRef::class("Nullable").with_arg(TypeRef::primitive("int"))))
        .with_property(PropertyDecl::new("Computed", TypeRef::string()).read_only())
        .with_property(PropertyDecl::new("Handler", TypeRef::interface("App.IHandler")))
}

fn log_level() -> TypeDeclaration {
    TypeDeclaration::enumeration("App", "App.LogLevel", &["Debug", "Info", "Warn"])
}

#[test]
fn section_is_inferred_from_the_type_name() {
    let plan = Engine::new(EngineOptions::default())
        .plan(&graph(vec![server_options(), log_level()]))
        .unwrap();
    assert_eq!(plan.configuration.len(), 1);
    assert_eq!(plan.configuration[0].section, "Server");
}

#[test]
fn blank_section_falls_back_to_inference() {
    let options = TypeDeclaration::class("App", "App.MailSettings").with_marker(section(Some("  ")));
    let plan = Engine::new(EngineOptions::default()).plan(&graph(vec![options])).unwrap();
    assert_eq!(plan.configuration[0].section, "Mail");
}

#[test]
fn explicit_section_wins() {
    let options = TypeDeclaration::class("App", "App.MailSettings").with_marker(section(Some("Smtp:Primary")));
    let plan = Engine::new(EngineOptions::default()).plan(&graph(vec![options])).unwrap();
    assert_eq!(plan.configuration[0].section, "Smtp:Primary");
}

#[test]
fn every_property_gets_its_coercion() {
    let plan = Engine::new(EngineOptions::default())
        .plan(&graph(vec![server_options(), log_level()]))
        .unwrap();
    let properties = &plan.configuration[0].properties;

    let names: Vec<_> = properties.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["Host", "Port", "Secure", "Timeout", "InstanceId", "Level", "Retries"]);

    assert_eq!(properties[0].coercion, Coercion::Passthrough);
    assert_eq!(properties[1].coercion, Coercion::Numeric("int".into()));
    assert_eq!(properties[2].coercion, Coercion::Boolean);
    assert_eq!(properties[3].coercion, Coercion::Temporal("TimeSpan".into()));
    assert_eq!(properties[4].coercion, Coercion::Guid);
    assert!(properties[4].init_only);
    assert_eq!(
        properties[5].coercion,
        Coercion::Enum {
            type_name: "App.LogLevel".into(),
            members: vec!["Debug".into(), "Info".into(), "Warn".into()],
        }
    );
    assert_eq!(properties[6].coercion, Coercion::Numeric("int".into()));
    assert!(properties[6].nullable);
}

fn parent_and_child() -> Vec<TypeDeclaration> {
    vec![
        TypeDeclaration::class("App", "App.ParentOptions")
            .with_marker(section(Some("Parent")))
            .with_property(PropertyDecl::new("Name", TypeRef::string()))
            .with_property(PropertyDecl::new("Child", TypeRef::class("App.ChildOptions"))),
        TypeDeclaration::class("App", "App.ChildOptions")
            .with_marker(section(Some("Child")))
            .with_property(PropertyDecl::new("Depth", TypeRef::primitive("int"))),
    ]
}

#[test]
fn nested_type_is_bound_through_its_parent_only() {
    let plan = Engine::new(EngineOptions::default()).plan(&graph(parent_and_child())).unwrap();

    assert_eq!(plan.configuration.len(), 1);
    let parent = &plan.configuration[0];
    assert_eq!(parent.bound_type, "App.ParentOptions");
    match &parent.properties[1].coercion {
        Coercion::Nested { type_name, properties } => {
            assert_eq!(type_name, "App.ChildOptions");
            assert_eq!(properties[0].name, "Depth");
        }
        other => panic!("expected nested coercion, got {other:?}"),
    }
}

#[test]
fn reflective_mode_defers_to_the_runtime_binder() {
    let options = EngineOptions {
        breadcrumbs: BreadcrumbLevel::None,
        ..EngineOptions::default()
    };
    let output = Engine::new(options).run(&graph(parent_and_child())).unwrap();

    assert_eq!(output.plan.binding_mode, BindingMode::Reflective);
    let source = &output.artifact(ArtifactKind::ConfigurationBinding).unwrap().contents;
    assert!(source.contains("binder.bind_reflective(\"App.ParentOptions\", \"Parent\", None, Validation::None);"));
    assert!(!source.contains("Property {"));
}

#[test]
fn generated_mode_emits_property_tables() {
    let options = EngineOptions {
        aot: true,
        breadcrumbs: BreadcrumbLevel::None,
        ..EngineOptions::default()
    };
    let output = Engine::new(options).run(&graph(parent_and_child())).unwrap();

    assert_eq!(output.plan.binding_mode, BindingMode::Generated);
    let source = &output.artifact(ArtifactKind::ConfigurationBinding).unwrap().contents;
    assert!(source.contains("binder.bind(&Binding {"));
    assert!(source.contains("path: \"Parent:Name\""));
    assert!(source.contains("Coercion::Nested(\"App.ChildOptions\", &["));
    assert!(source.contains("path: \"Parent:Child:Depth\""));
    assert!(source.contains("generated_constructor: false"));
}

#[test]
fn validator_is_wired_when_validating_on_start() {
    let options = TypeDeclaration::class("App", "App.DatabaseOptions")
        .with_marker(Marker::ConfigurationSection(SectionMarker {
            validate_on_start: true,
            validator: Some(TypeRef::class("App.DatabaseOptionsValidator")),
            ..SectionMarker::default()
        }));
    let output = Engine::new(EngineOptions::default()).run(&graph(vec![options])).unwrap();

    assert!(output.diagnostics.is_empty());
    let source = &output.artifact(ArtifactKind::ConfigurationBinding).unwrap().contents;
    assert!(source.contains("Validation::OnStart(Some(Validator::Type(\"App.DatabaseOptionsValidator\")))"));
}

#[test]
fn record_without_default_constructor_needs_extensibility() {
    let positional = ConstructorCandidate::with_parameters(vec![Parameter::new("host", TypeRef::string())]);
    let sealed = TypeDeclaration::class("App", "App.SealedOptions")
        .with_kind(DeclarationKind::Record)
        .with_constructor(positional.clone())
        .with_marker(section(None));
    let open = TypeDeclaration::class("App", "App.OpenOptions")
        .with_kind(DeclarationKind::Record)
        .extensible()
        .with_constructor(positional)
        .with_marker(section(None));
    let output = Engine::new(EngineOptions::default()).run(&graph(vec![sealed, open])).unwrap();

    let ids: Vec<_> = output.diagnostics.iter().map(|d| d.id).collect();
    assert_eq!(ids, vec![DiagnosticId::ConfigurationTypeNotExtensible]);
    assert_eq!(output.diagnostics[0].args[0], "App.SealedOptions");

    let open_binding = output
        .plan
        .configuration
        .iter()
        .find(|b| b.bound_type == "App.OpenOptions")
        .unwrap();
    assert!(open_binding.needs_generated_constructor);
}

#[test]
fn child_without_default_constructor_is_still_not_top_level() {
    let graph = graph(vec![
        TypeDeclaration::class("App", "App.ParentOptions")
            .with_marker(section(Some("Parent")))
            .with_property(PropertyDecl::new("Child", TypeRef::class("App.ChildOptions"))),
        TypeDeclaration::class("App", "App.ChildOptions")
            .with_marker(section(Some("Child")))
            .with_constructor(ConstructorCandidate::with_parameters(vec![Parameter::new(
                "depth",
                TypeRef::primitive("int"),
            )])),
    ]);
    let output = Engine::new(EngineOptions::default()).run(&graph).unwrap();

    let top_level: Vec<_> = output.plan.configuration.iter().map(|b| b.bound_type.as_str()).collect();
    assert_eq!(top_level, vec!["App.ParentOptions"]);
    // The child cannot be nested, so the parent binds no property for it
    assert!(output.plan.configuration[0].properties.is_empty());
    let ids: Vec<_> = output.diagnostics.iter().map(|d| d.id).collect();
    assert_eq!(ids, vec![DiagnosticId::ConfigurationTypeNotExtensible]);
    assert_eq!(output.diagnostics[0].args[0], "App.ChildOptions");
}
