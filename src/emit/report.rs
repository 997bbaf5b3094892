//! The diagnostic report: a service index, decorator chains and lifetime
//! counts for humans and tooling.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::EngineOptions;
use crate::lifetime::{histogram, Lifetime};
use crate::plan::ResolutionPlan;

/// One service in the index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportEntry {
    pub name: String,
    pub module: String,
    pub lifetime: Lifetime,
    pub interfaces: Vec<String>,
    pub keys: Vec<String>,
    /// Number of constructor arguments
    pub arity: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy: Option<String>,
}

/// One decorator chain, as nesting strings per implementation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportChain {
    pub target: String,
    /// Decorators, outermost first
    pub decorators: Vec<String>,
    pub implementations: Vec<String>,
}

/// Report contents, filtered by the report's type-name prefixes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticReport {
    pub module: String,
    pub services: Vec<ReportEntry>,
    pub decorator_chains: Vec<ReportChain>,
    /// Lifetime name to count, over the listed services
    pub lifetimes: BTreeMap<String, usize>,
    /// Rendered diagnostics, most severe first
    pub diagnostics: Vec<String>,
}

impl DiagnosticReport {
    pub fn build(plan: &ResolutionPlan, options: &EngineOptions) -> Self {
        let services: Vec<ReportEntry> = plan
            .services
            .iter()
            .filter(|s| options.matches_report_filter(&s.name))
            .map(|s| ReportEntry {
                name: s.name.clone(),
                module: s.module.clone(),
                lifetime: s.lifetime,
                interfaces: s.interfaces.iter().map(ToString::to_string).collect(),
                keys: s.keys.clone(),
                arity: s.constructor.arguments.len(),
                proxy: plan.proxy_for(&s.name).map(|p| p.proxy_name.clone()),
            })
            .collect();

        let decorator_chains = plan
            .decorator_chains
            .iter()
            .filter(|c| options.matches_report_filter(c.target.base_name()))
            .map(|c| ReportChain {
                target: c.target.to_string(),
                decorators: c.outermost_first().iter().map(ToString::to_string).collect(),
                implementations: c.implementations.clone(),
            })
            .collect();

        let lifetimes = histogram(services.iter().map(|s| s.lifetime))
            .into_iter()
            .map(|(lifetime, count)| (lifetime.to_string(), count))
            .collect();

        Self {
            module: plan.current_module.clone(),
            services,
            decorator_chains,
            lifetimes,
            diagnostics: plan.diagnostics.iter().map(ToString::to_string).collect(),
        }
    }

    /// Plain-text rendering.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("Dependency graph report for {}\n\n", self.module));
        out.push_str(&format!("Services ({}):\n", self.services.len()));
        for entry in &self.services {
            out.push_str(&format!("  {} [{}]", entry.name, entry.lifetime));
            if !entry.interfaces.is_empty() {
                out.push_str(&format!(" as {}", entry.interfaces.join(", ")));
            }
            if !entry.keys.is_empty() {
                out.push_str(&format!(" keys {}", entry.keys.join(", ")));
            }
            if let Some(proxy) = &entry.proxy {
                out.push_str(&format!(" via {proxy}"));
            }
            out.push_str(&format!(" ({} args, module {})\n", entry.arity, entry.module));
        }
        out.push_str(&format!("\nDecorator chains ({}):\n", self.decorator_chains.len()));
        for chain in &self.decorator_chains {
            out.push_str(&format!("  {}: {}\n", chain.target, chain.decorators.join(" -> ")));
            for implementation in &chain.implementations {
                out.push_str(&format!("    wraps {implementation}\n"));
            }
        }
        out.push_str("\nLifetimes:\n");
        for (lifetime, count) in &self.lifetimes {
            out.push_str(&format!("  {lifetime}: {count}\n"));
        }
        if !self.diagnostics.is_empty() {
            out.push_str(&format!("\nDiagnostics ({}):\n", self.diagnostics.len()));
            for diagnostic in &self.diagnostics {
                out.push_str(&format!("  {diagnostic}\n"));
            }
        }
        out
    }
}
