#![no_main]

use ferrous_di_codegen::config::EngineOptions;
use ferrous_di_codegen::engine::Engine;
use ferrous_di_codegen::model::TypeGraph;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    // Malformed graphs must be rejected, never panic
    let Ok(graph) = TypeGraph::from_json(text) else {
        return;
    };
    let engine = Engine::new(EngineOptions {
        diagnostics: true,
        ..EngineOptions::default()
    });
    if let Ok(first) = engine.run(&graph) {
        let second = engine.run(&graph).expect("second pass over a valid graph");
        assert_eq!(first.artifacts, second.artifacts);
    }
});
