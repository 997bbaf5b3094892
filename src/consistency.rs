//! Cross-module consistency checks over the raw graph.
//!
//! These run after the classification barrier. Classification silently
//! drops what it cannot reach; this pass reports the cases a user most
//! likely did not intend.

use crate::classify::Classifier;
use crate::diagnostics::{Diagnostic, DiagnosticId, DiagnosticLocation};
use crate::model::{ModuleDecl, TypeDeclaration, TypeGraph};

/// Eligible types in scanned modules that generated code cannot reach.
pub fn inaccessible_candidates(graph: &TypeGraph, classifier: &Classifier<'_, '_>) -> Vec<Diagnostic> {
    graph
        .scanned_modules()
        .flat_map(|module| module.types.iter())
        .filter(|t| is_candidate(classifier, t) && !classifier.is_reachable(t))
        .map(|t| {
            Diagnostic::at(
                DiagnosticId::InaccessibleCandidate,
                vec![t.name.clone(), t.module.clone()],
                t.location.as_ref(),
                &t.module,
            )
        })
        .collect()
}

/// Referenced modules that hold plugins but never opted in, one diagnostic
/// per module.
pub fn non_participating_modules(graph: &TypeGraph, classifier: &Classifier<'_, '_>) -> Vec<Diagnostic> {
    let mut modules: Vec<&ModuleDecl> = graph
        .modules
        .iter()
        .filter(|m| !graph.is_current(&m.name) && !m.participates)
        .collect();
    modules.sort_by(|a, b| a.name.cmp(&b.name));

    modules
        .into_iter()
        .filter_map(|module| {
            let plugins: Vec<&TypeDeclaration> = module
                .types
                .iter()
                .filter(|t| classifier.is_plugin_candidate(t))
                .collect();
            let first = plugins.first()?;
            Some(Diagnostic::new(
                DiagnosticId::ModuleNotParticipating,
                vec![module.name.clone(), first.name.clone(), plugins.len().to_string()],
                DiagnosticLocation::Module(module.name.clone()),
            ))
        })
        .collect()
}

fn is_candidate(classifier: &Classifier<'_, '_>, declaration: &TypeDeclaration) -> bool {
    classifier.matches_namespace(declaration)
        && (classifier.is_injectable_candidate(declaration) || classifier.is_plugin_candidate(declaration))
}

/// Runs every cross-module check.
pub fn check(graph: &TypeGraph, classifier: &Classifier<'_, '_>) -> Vec<Diagnostic> {
    let mut diagnostics = inaccessible_candidates(graph, classifier);
    diagnostics.extend(non_participating_modules(graph, classifier));
    tracing::debug!(count = diagnostics.len(), "consistency check finished");
    diagnostics
}
