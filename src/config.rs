//! Build-time options for the generation pass.
//!
//! The host build system exposes a key/value property store. This module
//! reads it through layered [`PropertySource`]s and turns the recognised keys
//! into [`EngineOptions`].

use std::collections::BTreeMap;
use std::env;
use std::path::PathBuf;

use crate::error::{GenError, GenResult};

/// Prefix shared by every recognised build property.
pub const PROPERTY_PREFIX: &str = "ferrous_di.";

/// How much provenance the source renderer writes next to each registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BreadcrumbLevel {
    /// No provenance comments
    None,
    /// Declaring module and type
    #[default]
    Minimal,
    /// Module, type, source location and chosen constructor
    Verbose,
}

impl BreadcrumbLevel {
    fn parse(key: &str, value: &str) -> GenResult<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "none" | "off" => Ok(BreadcrumbLevel::None),
            "minimal" => Ok(BreadcrumbLevel::Minimal),
            "verbose" => Ok(BreadcrumbLevel::Verbose),
            _ => Err(invalid(key, value, "expected none, minimal or verbose")),
        }
    }
}

/// Options controlling one generation pass.
///
/// # Examples
///
/// ```rust
/// use ferrous_di_codegen::config::{EngineOptions, MapSource, PropertyProvider};
///
/// let mut provider = PropertyProvider::new();
/// provider.add_source(Box::new(
///     MapSource::new()
///         .with("ferrous_di.aot", "true")
///         .with("ferrous_di.plugin_interfaces", "App.IPlugin, App.IStartupHook"),
/// ));
///
/// let options = EngineOptions::from_provider(&provider).unwrap();
/// assert!(options.aot);
/// assert_eq!(options.plugin_interfaces, vec!["App.IPlugin", "App.IStartupHook"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EngineOptions {
    pub breadcrumbs: BreadcrumbLevel,
    /// Render the diagnostic report artifact
    pub diagnostics: bool,
    /// Also write the report to this file
    pub diagnostics_path: Option<PathBuf>,
    /// Type-name prefixes included in the report (empty = all)
    pub diagnostics_filter: Vec<String>,
    /// Generated binder mode for configuration binding
    pub aot: bool,
    /// Only types under these namespace prefixes are classified (empty = all)
    pub namespace_prefixes: Vec<String>,
    /// Interfaces whose implementations are plugins, besides marked contracts
    pub plugin_interfaces: Vec<String>,
    /// Interfaces never exposed as services
    pub ignored_interfaces: Vec<String>,
}

impl EngineOptions {
    /// Reads every recognised key; unset keys keep their defaults.
    pub fn from_provider(provider: &PropertyProvider) -> GenResult<Self> {
        let mut options = EngineOptions::default();
        if let Some((key, value)) = provider.lookup("breadcrumbs") {
            options.breadcrumbs = BreadcrumbLevel::parse(&key, &value)?;
        }
        if let Some((key, value)) = provider.lookup("diagnostics") {
            options.diagnostics = parse_bool(&key, &value)?;
        }
        if let Some((_, value)) = provider.lookup("diagnostics_path") {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                options.diagnostics_path = Some(PathBuf::from(trimmed));
            }
        }
        if let Some((_, value)) = provider.lookup("diagnostics_filter") {
            options.diagnostics_filter = parse_list(&value);
        }
        if let Some((key, value)) = provider.lookup("aot") {
            options.aot = parse_bool(&key, &value)?;
        }
        if let Some((_, value)) = provider.lookup("namespace_prefixes") {
            options.namespace_prefixes = parse_list(&value);
        }
        if let Some((_, value)) = provider.lookup("plugin_interfaces") {
            options.plugin_interfaces = parse_list(&value);
        }
        if let Some((_, value)) = provider.lookup("ignored_interfaces") {
            options.ignored_interfaces = parse_list(&value);
        }
        Ok(options)
    }

    /// Convenience for a single in-memory property map.
    pub fn from_properties(properties: &BTreeMap<String, String>) -> GenResult<Self> {
        let mut provider = PropertyProvider::new();
        provider.add_source(Box::new(MapSource::from(properties.clone())));
        Self::from_provider(&provider)
    }

    /// True when `name` falls under the namespace filter.
    pub fn matches_namespace(&self, name: &str) -> bool {
        self.namespace_prefixes.is_empty()
            || self
                .namespace_prefixes
                .iter()
                .any(|prefix| name == prefix || name.starts_with(&format!("{prefix}.")))
    }

    /// True when `name` should appear in the diagnostic report.
    pub fn matches_report_filter(&self, name: &str) -> bool {
        self.diagnostics_filter.is_empty() || self.diagnostics_filter.iter().any(|p| name.starts_with(p.as_str()))
    }
}

/// A source of build properties.
pub trait PropertySource: Send + Sync + std::fmt::Debug {
    /// Get a property by full key
    fn get(&self, key: &str) -> Option<String>;
}

/// In-memory property source, typically filled from the host build system.
#[derive(Debug, Clone, Default)]
pub struct MapSource {
    values: BTreeMap<String, String>,
}

impl MapSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }
}

impl From<BTreeMap<String, String>> for MapSource {
    fn from(values: BTreeMap<String, String>) -> Self {
        Self { values }
    }
}

impl PropertySource for MapSource {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }
}

/// Environment variable property source.
///
/// `ferrous_di.aot` is looked up as `FERROUS_DI_AOT`, or `<PREFIX>_AOT` with
/// a custom prefix.
#[derive(Debug, Default)]
pub struct EnvironmentSource {
    prefix: Option<String>,
}

impl EnvironmentSource {
    pub fn new() -> Self {
        Self { prefix: None }
    }

    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
        }
    }

    fn env_key(&self, key: &str) -> String {
        let short = key.strip_prefix(PROPERTY_PREFIX).unwrap_or(key);
        let prefix = self.prefix.as_deref().unwrap_or("FERROUS_DI");
        format!("{}_{}", prefix.to_uppercase(), short.to_uppercase())
    }
}

impl PropertySource for EnvironmentSource {
    fn get(&self, key: &str) -> Option<String> {
        env::var(self.env_key(key)).ok()
    }
}

/// Layered property lookup; sources added first win.
#[derive(Debug, Default)]
pub struct PropertyProvider {
    sources: Vec<Box<dyn PropertySource>>,
}

impl PropertyProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a property source (higher priority sources should be added first)
    pub fn add_source(&mut self, source: Box<dyn PropertySource>) {
        self.sources.push(source);
    }

    /// Get a property by full key, checking sources in priority order
    pub fn get(&self, key: &str) -> Option<String> {
        self.sources.iter().find_map(|source| source.get(key))
    }

    fn lookup(&self, short_key: &str) -> Option<(String, String)> {
        let key = format!("{PROPERTY_PREFIX}{short_key}");
        self.get(&key).map(|value| (key, value))
    }
}

fn parse_bool(key: &str, value: &str) -> GenResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" | "" => Ok(false),
        _ => Err(invalid(key, value, "expected a boolean")),
    }
}

fn parse_list(value: &str) -> Vec<String> {
    value
        .split([',', ';'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn invalid(key: &str, value: &str, reason: &'static str) -> GenError {
    GenError::InvalidProperty {
        key: key.to_string(),
        value: value.to_string(),
        reason,
    }
}
