/// Property tests over generated graphs.
///
/// Output must not depend on declaration order, and the interface
/// registrations must agree with a direct reading of the declarations.

use std::collections::BTreeSet;

use proptest::prelude::*;

use ferrous_di_codegen::config::EngineOptions;
use ferrous_di_codegen::engine::Engine;
use ferrous_di_codegen::model::{Accessibility, Marker, ModuleDecl, TypeDeclaration, TypeGraph, TypeRef};
use ferrous_di_codegen::Lifetime;

const INTERFACES: [&str; 4] = ["App.IAlpha", "App.IBeta", "App.IGamma", "App.IDelta"];

#[derive(Debug, Clone)]
struct Shape {
    interfaces: Vec<usize>,
    lifetime: Option<Lifetime>,
    exempt: bool,
    private: bool,
}

fn lifetime() -> impl Strategy<Value = Option<Lifetime>> {
    prop_oneof![
        Just(None),
        Just(Some(Lifetime::Singleton)),
        Just(Some(Lifetime::Scoped)),
        Just(Some(Lifetime::Transient)),
    ]
}

fn shape() -> impl Strategy<Value = Shape> {
    (
        prop::collection::vec(0..INTERFACES.len(), 0..4),
        lifetime(),
        prop::bool::weighted(0.15),
        prop::bool::weighted(0.1),
    )
        .prop_map(|(interfaces, lifetime, exempt, private)| Shape {
            interfaces,
            lifetime,
            exempt,
            private,
        })
}

fn declaration(index: usize, shape: &Shape) -> TypeDeclaration {
    let mut declaration = TypeDeclaration::class("App", format!("App.Service{index}"));
    for i in &shape.interfaces {
        declaration = declaration.implementing(TypeRef::interface(INTERFACES[*i]));
    }
    if let Some(lifetime) = shape.lifetime {
        declaration = declaration.with_marker(Marker::Lifetime(lifetime));
    }
    if shape.exempt {
        declaration = declaration.with_marker(Marker::ExemptFromRegistration);
    }
    if shape.private {
        declaration = declaration.with_accessibility(Accessibility::Private);
    }
    declaration
}

fn build(shapes: &[Shape], reversed: bool) -> TypeGraph {
    let mut declarations: Vec<TypeDeclaration> = shapes.iter().enumerate().map(|(i, s)| declaration(i, s)).collect();
    if reversed {
        declarations.reverse();
    }
    let mut module = ModuleDecl::new("App");
    for d in declarations {
        module = module.with_type(d);
    }
    TypeGraph::new("App").with_module(module)
}

/// Reads the triples straight off the shapes.
fn naive_triples(shapes: &[Shape]) -> Vec<(String, String, Lifetime)> {
    let mut services: Vec<(String, &Shape)> = shapes
        .iter()
        .enumerate()
        .filter(|(_, s)| !s.exempt && !s.private)
        .map(|(i, s)| (format!("App.Service{i}"), s))
        .collect();
    services.sort_by(|a, b| a.0.cmp(&b.0));

    let mut triples = Vec::new();
    for (name, shape) in services {
        let mut seen = BTreeSet::new();
        for i in &shape.interfaces {
            if seen.insert(*i) {
                triples.push((name.clone(), INTERFACES[*i].to_string(), shape.lifetime.unwrap_or_default()));
            }
        }
    }
    triples
}

proptest! {
    #[test]
    fn declaration_order_does_not_change_output(shapes in prop::collection::vec(shape(), 0..12)) {
        let engine = Engine::new(EngineOptions { diagnostics: true, ..EngineOptions::default() });
        let forward = engine.run(&build(&shapes, false)).unwrap();
        let backward = engine.run(&build(&shapes, true)).unwrap();
        prop_assert_eq!(forward.artifacts, backward.artifacts);
        prop_assert_eq!(forward.diagnostics, backward.diagnostics);
    }

    #[test]
    fn interface_registrations_match_declarations(shapes in prop::collection::vec(shape(), 0..12)) {
        let plan = Engine::new(EngineOptions::default()).plan(&build(&shapes, false)).unwrap();
        prop_assert_eq!(plan.interface_triples(), naive_triples(&shapes));
    }

    #[test]
    fn every_private_type_is_reported(shapes in prop::collection::vec(shape(), 0..12)) {
        let output = Engine::new(EngineOptions::default()).run(&build(&shapes, false)).unwrap();
        let expected = shapes.iter().filter(|s| s.private && !s.exempt).count();
        let errors = output.diagnostics.iter().filter(|d| d.is_error()).count();
        prop_assert_eq!(errors, expected);
        prop_assert_eq!(output.has_errors(), expected > 0);
    }
}
