/// Reachability and participation checks across modules.

use ferrous_di_codegen::config::EngineOptions;
use ferrous_di_codegen::emit::ArtifactKind;
use ferrous_di_codegen::engine::Engine;
use ferrous_di_codegen::model::{Accessibility, Marker, ModuleDecl, TypeDeclaration, TypeGraph, TypeRef};
use ferrous_di_codegen::{DiagnosticId, GenError, Severity};

fn plugin_contract() -> TypeDeclaration {
    TypeDeclaration::interface("App", "App.IPlugin").with_marker(Marker::PluginContract)
}

fn plugin(module: &str, name: &str) -> TypeDeclaration {
    TypeDeclaration::class(module, name).implementing(TypeRef::interface("App.IPlugin"))
}

#[test]
fn internal_types_of_the_current_module_are_reachable() {
    let graph = TypeGraph::new("App").with_module(
        ModuleDecl::new("App")
            .with_type(TypeDeclaration::class("App", "App.Internal").with_accessibility(Accessibility::Internal))
            .with_type(TypeDeclaration::class("App", "App.Inner").nested_in(Accessibility::Internal)),
    );
    let output = Engine::new(EngineOptions::default()).run(&graph).unwrap();
    assert!(output.diagnostics.is_empty());
    assert_eq!(output.plan.services.len(), 2);
}

#[test]
fn private_chain_in_the_current_module_is_an_error() {
    let graph = TypeGraph::new("App").with_module(
        ModuleDecl::new("App")
            .with_type(TypeDeclaration::class("App", "App.Hidden").nested_in(Accessibility::Private))
            .with_type(TypeDeclaration::class("App", "App.Visible")),
    );
    let output = Engine::new(EngineOptions::default()).run(&graph).unwrap();

    assert_eq!(output.diagnostics.len(), 1);
    let diagnostic = &output.diagnostics[0];
    assert_eq!(diagnostic.id, DiagnosticId::InaccessibleCandidate);
    assert_eq!(diagnostic.severity, Severity::Error);
    assert_eq!(diagnostic.args, vec!["App.Hidden", "App"]);
    // Unreachable types are never emitted
    let names: Vec<_> = output.plan.services.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["App.Visible"]);

    match output.into_result() {
        Err(GenError::Reachability(errors)) => assert_eq!(errors[0].args[0], "App.Hidden"),
        other => panic!("expected reachability error, got {other:?}"),
    }
}

#[test]
fn exempt_or_filtered_types_are_not_reported() {
    let options = EngineOptions {
        namespace_prefixes: vec!["App.Services".into()],
        ..EngineOptions::default()
    };
    let graph = TypeGraph::new("App").with_module(
        ModuleDecl::new("App")
            .with_type(
                TypeDeclaration::class("App", "App.Services.Secret")
                    .with_accessibility(Accessibility::Private)
                    .with_marker(Marker::ExemptFromRegistration),
            )
            .with_type(TypeDeclaration::class("App", "App.Tools.Private").with_accessibility(Accessibility::Private))
            .with_type(TypeDeclaration::class("App", "App.Services.Billing")),
    );
    let output = Engine::new(options).run(&graph).unwrap();

    assert!(output.diagnostics.is_empty());
    let names: Vec<_> = output.plan.services.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["App.Services.Billing"]);
}

#[test]
fn silent_plugin_module_is_reported_and_not_scanned() {
    let graph = TypeGraph::new("App")
        .with_module(ModuleDecl::new("App").with_type(plugin_contract()))
        .with_module(
            ModuleDecl::new("Lib.Reports")
                .with_type(plugin("Lib.Reports", "Lib.Reports.Pdf"))
                .with_type(plugin("Lib.Reports", "Lib.Reports.Csv"))
                .with_type(TypeDeclaration::class("Lib.Reports", "Lib.Reports.Helper")),
        );
    let output = Engine::new(EngineOptions::default()).run(&graph).unwrap();

    assert!(!output.has_errors());
    assert_eq!(output.diagnostics.len(), 1);
    let warning = &output.diagnostics[0];
    assert_eq!(warning.id, DiagnosticId::ModuleNotParticipating);
    assert_eq!(warning.severity, Severity::Warning);
    assert_eq!(warning.args, vec!["Lib.Reports", "Lib.Reports.Pdf", "2"]);

    assert!(output.plan.plugins.is_empty());
    assert!(output.plan.services.is_empty());
    assert!(output.plan.bootstrap_modules.is_empty());
}

#[test]
fn participating_modules_are_scanned_and_bootstrapped() {
    let graph = TypeGraph::new("App")
        .with_module(
            ModuleDecl::new("App")
                .with_type(plugin_contract())
                .with_type(plugin("App", "App.LocalPlugin")),
        )
        .with_module(
            ModuleDecl::new("Lib.Zeta")
                .participating()
                .with_type(plugin("Lib.Zeta", "Lib.Zeta.RemotePlugin").with_marker(Marker::Order(3))),
        )
        .with_module(
            ModuleDecl::new("Lib.Alpha")
                .participating()
                .with_type(TypeDeclaration::class("Lib.Alpha", "Lib.Alpha.Clock")),
        );
    let output = Engine::new(EngineOptions::default()).run(&graph).unwrap();

    assert!(output.diagnostics.is_empty());
    let plugins: Vec<_> = output.plan.plugins.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(plugins, vec!["App.LocalPlugin", "Lib.Zeta.RemotePlugin"]);
    assert_eq!(output.plan.plugins[1].order, Some(3));
    assert_eq!(output.plan.bootstrap_modules, vec!["Lib.Alpha", "Lib.Zeta"]);

    let bootstrap = &output.artifact(ArtifactKind::Bootstrap).unwrap().contents;
    let alpha = bootstrap.find("loader.force_load(\"Lib.Alpha\")").unwrap();
    let zeta = bootstrap.find("loader.force_load(\"Lib.Zeta\")").unwrap();
    assert!(alpha < zeta);
}

#[test]
fn private_type_in_participating_module_is_an_error() {
    let graph = TypeGraph::new("App").with_module(ModuleDecl::new("App")).with_module(
        ModuleDecl::new("Lib")
            .participating()
            .with_type(TypeDeclaration::class("Lib", "Lib.Internal").with_accessibility(Accessibility::Internal))
            .with_type(TypeDeclaration::class("Lib", "Lib.Public")),
    );
    let output = Engine::new(EngineOptions::default()).run(&graph).unwrap();

    assert!(output.has_errors());
    assert_eq!(output.diagnostics[0].args, vec!["Lib.Internal", "Lib"]);
    assert_eq!(output.plan.services.len(), 1);
}
