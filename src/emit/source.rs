//! Rust registration source.
//!
//! The generated files are plain static tables plus two small routines
//! (configuration binding and bootstrap) written against the runtime
//! container's `ferrous_di::generated` surface. Nothing in them inspects
//! types at runtime.

use crate::binding::{BindableProperty, Coercion, ConfigurationBinding, ValidatorRef};
use crate::config::{BreadcrumbLevel, EngineOptions};
use crate::constructor::{ArgumentPlan, ChosenConstructor};
use crate::emit::report::DiagnosticReport;
use crate::emit::{ArtifactKind, ArtifactRenderer, RenderFormat};
use crate::error::GenResult;
use crate::model::{SourceLocation, TypeRef};
use crate::plan::{BindingMode, ResolutionPlan};

/// Renders artifacts as Rust source.
///
/// # Examples
///
/// ```rust
/// use ferrous_di_codegen::config::EngineOptions;
/// use ferrous_di_codegen::emit::{ArtifactKind, ArtifactRenderer, SourceRenderer};
/// use ferrous_di_codegen::plan::ResolutionPlan;
///
/// let mut plan = ResolutionPlan::new("App");
/// plan.bootstrap_modules = vec!["Lib.Plugins".to_string()];
///
/// let source = SourceRenderer
///     .render(ArtifactKind::Bootstrap, &plan, &EngineOptions::default())
///     .unwrap();
/// assert!(source.contains("loader.force_load(\"Lib.Plugins\");"));
/// ```
#[derive(Debug, Default, Clone, Copy)]
pub struct SourceRenderer;

impl ArtifactRenderer for SourceRenderer {
    fn format(&self) -> RenderFormat {
        RenderFormat::Source
    }

    fn render(&self, kind: ArtifactKind, plan: &ResolutionPlan, options: &EngineOptions) -> GenResult<String> {
        let mut out = header(kind, plan);
        match kind {
            ArtifactKind::ServiceRegistry => self.service_registry(&mut out, plan, options),
            ArtifactKind::PluginRegistry => self.plugin_registry(&mut out, plan, options),
            ArtifactKind::DecoratorApplication => self.decorator_application(&mut out, plan),
            ArtifactKind::ConfigurationBinding => self.configuration_binding(&mut out, plan, options),
            ArtifactKind::Bootstrap => self.bootstrap(&mut out, plan),
            ArtifactKind::DiagnosticReport => {
                for line in DiagnosticReport::build(plan, options).to_text().lines() {
                    if line.is_empty() {
                        out.push_str("//\n");
                    } else {
                        out.push_str(&format!("// {line}\n"));
                    }
                }
            }
        }
        Ok(out)
    }
}

fn header(kind: ArtifactKind, plan: &ResolutionPlan) -> String {
    let mut out = String::new();
    out.push_str(&format!("// <auto-generated> {} for module {}\n", kind, plan.current_module));
    out.push_str("// Generated at build time; do not edit.\n\n");
    if kind != ArtifactKind::DiagnosticReport {
        out.push_str("#[allow(unused_imports)]\nuse ferrous_di::generated::*;\n\n");
    }
    out
}

/// A Rust string literal.
fn lit(value: &str) -> String {
    format!("{value:?}")
}

fn str_slice<I, S>(items: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let parts: Vec<String> = items.into_iter().map(|s| lit(s.as_ref())).collect();
    format!("&[{}]", parts.join(", "))
}

fn type_slice(types: &[TypeRef]) -> String {
    str_slice(types.iter().map(ToString::to_string))
}

fn argument(plan: &ArgumentPlan) -> String {
    match plan {
        ArgumentPlan::Service { ty, .. } => format!("Arg::Service({})", lit(&ty.to_string())),
        ArgumentPlan::Keyed { ty, key, .. } => format!("Arg::Keyed({}, {})", lit(&ty.to_string()), lit(key)),
        ArgumentPlan::Runtime { name, ty } => format!("Arg::Runtime({}, {})", lit(name), lit(&ty.to_string())),
        ArgumentPlan::Inner { ty, .. } => format!("Arg::Inner({})", lit(&ty.to_string())),
    }
}

fn arguments(constructor: &ChosenConstructor) -> String {
    let parts: Vec<String> = constructor.arguments.iter().map(argument).collect();
    format!("&[{}]", parts.join(", "))
}

fn breadcrumb(
    out: &mut String,
    level: BreadcrumbLevel,
    indent: &str,
    module: &str,
    name: &str,
    location: Option<&SourceLocation>,
    constructor: Option<&ChosenConstructor>,
) {
    if level == BreadcrumbLevel::None {
        return;
    }
    out.push_str(&format!("{indent}// {module} :: {name}\n"));
    if level == BreadcrumbLevel::Verbose {
        if let Some(loc) = location {
            out.push_str(&format!("{indent}// declared at {}:{}:{}\n", loc.file, loc.line, loc.column));
        }
        if let Some(ctor) = constructor {
            out.push_str(&format!(
                "{indent}// constructor #{} with {} argument(s)\n",
                ctor.index,
                ctor.arguments.len()
            ));
        }
    }
}

fn coercion(coercion: &Coercion, path: &str, indent: &str) -> String {
    match coercion {
        Coercion::Passthrough => "Coercion::Passthrough".to_string(),
        Coercion::Numeric(ty) => format!("Coercion::Numeric({})", lit(ty)),
        Coercion::Boolean => "Coercion::Boolean".to_string(),
        Coercion::Temporal(ty) => format!("Coercion::Temporal({})", lit(ty)),
        Coercion::Guid => "Coercion::Guid".to_string(),
        Coercion::Enum { type_name, members } => {
            format!("Coercion::Enum({}, {})", lit(type_name), str_slice(members))
        }
        Coercion::Nested { type_name, properties } => {
            let mut nested = format!("Coercion::Nested({}, &[\n", lit(type_name));
            property_table(&mut nested, properties, path, &format!("{indent}    "));
            nested.push_str(&format!("{indent}])"));
            nested
        }
    }
}

fn property_table(out: &mut String, properties: &[BindableProperty], section: &str, indent: &str) {
    for property in properties {
        let path = format!("{section}:{}", property.name);
        out.push_str(&format!(
            "{indent}Property {{ name: {}, path: {}, nullable: {}, init_only: {}, coercion: {} }},\n",
            lit(&property.name),
            lit(&path),
            property.nullable,
            property.init_only,
            coercion(&property.coercion, &path, indent),
        ));
    }
}

fn validation(binding: &ConfigurationBinding) -> String {
    if !binding.validate_on_start {
        return "Validation::None".to_string();
    }
    match &binding.validator {
        None => "Validation::OnStart(None)".to_string(),
        Some(ValidatorRef::External(ty)) => {
            format!("Validation::OnStart(Some(Validator::Type({})))", lit(&ty.to_string()))
        }
        Some(ValidatorRef::Method(name)) => format!("Validation::OnStart(Some(Validator::Method({})))", lit(name)),
    }
}

fn option_lit(value: Option<&str>) -> String {
    match value {
        Some(v) => format!("Some({})", lit(v)),
        None => "None".to_string(),
    }
}

impl SourceRenderer {
    fn service_registry(&self, out: &mut String, plan: &ResolutionPlan, options: &EngineOptions) {
        out.push_str("pub static SERVICES: &[Registration] = &[\n");
        for service in &plan.services {
            breadcrumb(
                out,
                options.breadcrumbs,
                "    ",
                &service.module,
                &service.name,
                service.location.as_ref(),
                Some(&service.constructor),
            );
            let proxy = plan.proxy_for(&service.name).map(|p| p.proxy_name.as_str());
            out.push_str("    Registration {\n");
            out.push_str(&format!("        implementation: {},\n", lit(&service.name)));
            out.push_str(&format!("        lifetime: Lifetime::{},\n", service.lifetime));
            out.push_str(&format!("        interfaces: {},\n", type_slice(&service.interfaces)));
            out.push_str(&format!("        keys: {},\n", str_slice(&service.keys)));
            out.push_str(&format!("        arguments: {},\n", arguments(&service.constructor)));
            out.push_str(&format!("        proxy: {},\n", option_lit(proxy)));
            out.push_str("    },\n");
        }
        out.push_str("];\n\n");

        out.push_str("pub static FACTORIES: &[FactoryRegistration] = &[\n");
        for factory in &plan.factories {
            breadcrumb(
                out,
                options.breadcrumbs,
                "    ",
                &factory.module,
                &factory.product,
                factory.location.as_ref(),
                Some(&factory.constructor),
            );
            out.push_str("    FactoryRegistration {\n");
            out.push_str(&format!("        factory: {},\n", lit(&factory.factory_name)));
            out.push_str(&format!("        product: {},\n", lit(&factory.product)));
            out.push_str(&format!("        lifetime: Lifetime::{},\n", factory.lifetime));
            out.push_str(&format!("        interfaces: {},\n", type_slice(&factory.interfaces)));
            out.push_str(&format!("        arguments: {},\n", arguments(&factory.constructor)));
            out.push_str("    },\n");
        }
        out.push_str("];\n\n");

        out.push_str("pub static PROXIES: &[ProxyRegistration] = &[\n");
        for proxy in &plan.intercepted {
            breadcrumb(
                out,
                options.breadcrumbs,
                "    ",
                &proxy.module,
                &proxy.service,
                proxy.location.as_ref(),
                None,
            );
            out.push_str("    ProxyRegistration {\n");
            out.push_str(&format!("        proxy: {},\n", lit(&proxy.proxy_name)));
            out.push_str(&format!("        service: {},\n", lit(&proxy.service)));
            out.push_str(&format!("        interfaces: {},\n", type_slice(&proxy.interfaces)));
            out.push_str("        methods: &[\n");
            for method in &proxy.methods {
                let interceptors: Vec<String> = method.interceptors.iter().map(|i| i.interceptor.to_string()).collect();
                out.push_str(&format!(
                    "            ProxiedMethod {{ name: {}, interceptors: {} }},\n",
                    lit(&method.name),
                    str_slice(&interceptors)
                ));
            }
            out.push_str("        ],\n");
            out.push_str("    },\n");
        }
        out.push_str("];\n");
    }

    fn plugin_registry(&self, out: &mut String, plan: &ResolutionPlan, options: &EngineOptions) {
        out.push_str("pub static PLUGINS: &[PluginRegistration] = &[\n");
        for plugin in &plan.plugins {
            breadcrumb(
                out,
                options.breadcrumbs,
                "    ",
                &plugin.module,
                &plugin.name,
                plugin.location.as_ref(),
                None,
            );
            let order = match plugin.order {
                Some(order) => format!("Some({order})"),
                None => "None".to_string(),
            };
            out.push_str("    PluginRegistration {\n");
            out.push_str(&format!("        implementation: {},\n", lit(&plugin.name)));
            out.push_str(&format!("        interfaces: {},\n", type_slice(&plugin.interfaces)));
            out.push_str(&format!("        markers: {},\n", str_slice(&plugin.markers)));
            out.push_str(&format!("        order: {order},\n"));
            out.push_str("    },\n");
        }
        out.push_str("];\n");
    }

    fn decorator_application(&self, out: &mut String, plan: &ResolutionPlan) {
        out.push_str("pub static DECORATOR_CHAINS: &[DecoratorChain] = &[\n");
        for chain in &plan.decorator_chains {
            let nesting: Vec<String> = chain.outermost_first().iter().map(ToString::to_string).collect();
            out.push_str(&format!("    // {}: {} -> implementation\n", chain.target, nesting.join(" -> ")));
            out.push_str("    DecoratorChain {\n");
            out.push_str(&format!("        target: {},\n", lit(&chain.target.to_string())));
            out.push_str(&format!("        implementations: {},\n", str_slice(&chain.implementations)));
            out.push_str("        decorators: &[\n");
            for link in &chain.links {
                out.push_str(&format!(
                    "            Decorator {{ ty: {}, position: {}, order: {}, synthesized: {}, arguments: {} }},\n",
                    lit(&link.decorator.to_string()),
                    link.position,
                    link.order,
                    link.synthesized,
                    arguments(&link.constructor)
                ));
            }
            out.push_str("        ],\n");
            out.push_str("    },\n");
        }
        out.push_str("];\n");
    }

    fn configuration_binding(&self, out: &mut String, plan: &ResolutionPlan, options: &EngineOptions) {
        out.push_str("pub fn bind_configuration(binder: &mut dyn ConfigurationBinder) {\n");
        for binding in &plan.configuration {
            breadcrumb(
                out,
                options.breadcrumbs,
                "    ",
                &binding.module,
                &binding.bound_type,
                binding.location.as_ref(),
                None,
            );
            match plan.binding_mode {
                BindingMode::Reflective => {
                    out.push_str(&format!(
                        "    binder.bind_reflective({}, {}, {}, {});\n",
                        lit(&binding.bound_type),
                        lit(&binding.section),
                        option_lit(binding.instance_name.as_deref()),
                        validation(binding)
                    ));
                }
                BindingMode::Generated => {
                    out.push_str("    binder.bind(&Binding {\n");
                    out.push_str(&format!("        ty: {},\n", lit(&binding.bound_type)));
                    out.push_str(&format!("        section: {},\n", lit(&binding.section)));
                    out.push_str(&format!(
                        "        name: {},\n",
                        option_lit(binding.instance_name.as_deref())
                    ));
                    out.push_str(&format!("        validation: {},\n", validation(binding)));
                    out.push_str(&format!(
                        "        generated_constructor: {},\n",
                        binding.needs_generated_constructor
                    ));
                    out.push_str("        properties: &[\n");
                    property_table(out, &binding.properties, &binding.section, "            ");
                    out.push_str("        ],\n");
                    out.push_str("    });\n");
                }
            }
        }
        out.push_str("}\n");
    }

    fn bootstrap(&self, out: &mut String, plan: &ResolutionPlan) {
        out.push_str(&format!(
            "pub static BOOTSTRAP_MODULES: &[&str] = {};\n\n",
            str_slice(&plan.bootstrap_modules)
        ));
        out.push_str("pub fn bootstrap(loader: &mut dyn ModuleLoader) {\n");
        for module in &plan.bootstrap_modules {
            out.push_str(&format!("    loader.force_load({});\n", lit(module)));
        }
        out.push_str("}\n");
    }
}
