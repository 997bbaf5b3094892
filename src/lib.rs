//! # ferrous-di-codegen
//!
//! Compile-time dependency injection planning and registration emission, the
//! build-time companion of a ferrous-di container.
//!
//! A compiler front-end hands the engine a [`model::TypeGraph`]: every type
//! declaration visible to the build, with its constructors, interfaces and
//! role markers. The engine decides how everything is wired and renders
//! registration artifacts that the runtime container loads without any
//! runtime type inspection.
//!
//! ## Features
//!
//! - **Classification**: services, plugins, decorators, open decorators,
//!   factory sources, configuration-bound options and intercepted services
//! - **Deterministic wiring**: constructor choice, lifetimes, decorator order
//! - **Configuration binding**: section inference, per-property coercion,
//!   validator wiring, reflective or generated binders
//! - **Cross-module checks**: unreachable candidates and silent plugin modules
//! - **Swappable renderers**: Rust source, JSON, and YAML (`yaml` feature)
//! - **Byte-identical output** for identical input
//!
//! ## Quick Start
//!
//! ```rust
//! use ferrous_di_codegen::config::EngineOptions;
//! use ferrous_di_codegen::engine::Engine;
//! use ferrous_di_codegen::model::{
//!     ConstructorCandidate, Marker, ModuleDecl, Parameter, TypeDeclaration, TypeGraph, TypeRef,
//! };
//! use ferrous_di_codegen::sink::MemorySink;
//! use ferrous_di_codegen::Lifetime;
//!
//! let order_service = TypeDeclaration::class("App", "App.OrderService")
//!     .implementing(TypeRef::interface("App.IOrderService"))
//!     .with_marker(Marker::Lifetime(Lifetime::Scoped))
//!     .with_constructor(ConstructorCandidate::with_parameters(vec![
//!         Parameter::new("repository", TypeRef::interface("App.IOrderRepository")),
//!     ]));
//!
//! let graph = TypeGraph::new("App").with_module(ModuleDecl::new("App").with_type(order_service));
//!
//! let mut sink = MemorySink::new();
//! let output = Engine::new(EngineOptions::default()).generate(&graph, &mut sink).unwrap();
//!
//! assert_eq!(output.plan.services[0].lifetime, Lifetime::Scoped);
//! let registry = sink.get("ServiceRegistry.g.rs").unwrap();
//! assert!(registry.contains("Arg::Service(\"App.IOrderRepository\")"));
//! ```
//!
//! ## Build Properties
//!
//! Options are read from the host's key/value property store through
//! [`config::PropertySource`]s; every key is prefixed with `ferrous_di.`.
//!
//! ```rust
//! use std::collections::BTreeMap;
//! use ferrous_di_codegen::config::{BreadcrumbLevel, EngineOptions};
//!
//! let mut properties = BTreeMap::new();
//! properties.insert("ferrous_di.breadcrumbs".to_string(), "verbose".to_string());
//! properties.insert("ferrous_di.aot".to_string(), "true".to_string());
//!
//! let options = EngineOptions::from_properties(&properties).unwrap();
//! assert_eq!(options.breadcrumbs, BreadcrumbLevel::Verbose);
//! assert!(options.aot);
//! ```

pub mod binding;
pub mod classify;
pub mod config;
pub mod consistency;
pub mod constructor;
pub mod decoration;
pub mod diagnostics;
pub mod emit;
pub mod engine;
pub mod error;
pub mod factory;
pub mod interception;
pub mod key;
pub mod lifetime;
pub mod model;
pub mod plan;
pub mod sink;

pub use classify::{DiscoveredPlugin, DiscoveredService, Role};
pub use constructor::select_constructor;
pub use diagnostics::{Diagnostic, DiagnosticId, Severity};
pub use engine::{Engine, GenerationOutput};
pub use error::{GenError, GenResult};
pub use key::Key;
pub use lifetime::{resolve_lifetime, Lifetime};
pub use plan::ResolutionPlan;
