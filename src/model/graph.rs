//! The declaration graph handed to the engine for one build.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::{GenError, GenResult};
use crate::model::declaration::{DeclarationKind, Marker, TypeDeclaration};
use crate::model::type_ref::TypeRef;

/// One module (compilation unit or referenced library) of the graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleDecl {
    pub name: String,
    /// Module-level opt-in to graph participation
    #[serde(default)]
    pub participates: bool,
    #[serde(default)]
    pub types: Vec<TypeDeclaration>,
}

impl ModuleDecl {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            participates: false,
            types: Vec::new(),
        }
    }

    pub fn participating(mut self) -> Self {
        self.participates = true;
        self
    }

    pub fn with_type(mut self, declaration: TypeDeclaration) -> Self {
        self.types.push(declaration);
        self
    }
}

/// Immutable snapshot of every declaration visible to one build.
///
/// # Examples
///
/// ```rust
/// use ferrous_di_codegen::model::{ModuleDecl, TypeDeclaration, TypeGraph};
///
/// let graph = TypeGraph::new("App").with_module(
///     ModuleDecl::new("App").with_type(TypeDeclaration::class("App", "App.OrderService")),
/// );
/// assert!(graph.validate().is_ok());
/// assert!(graph.find_type("App.OrderService").is_some());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeGraph {
    /// Name of the module being compiled
    pub current_module: String,
    pub modules: Vec<ModuleDecl>,
}

impl TypeGraph {
    pub fn new(current_module: impl Into<String>) -> Self {
        Self {
            current_module: current_module.into(),
            modules: Vec::new(),
        }
    }

    pub fn with_module(mut self, module: ModuleDecl) -> Self {
        self.modules.push(module);
        self
    }

    /// Parses the front-end's JSON document and validates it.
    pub fn from_json(json: &str) -> GenResult<Self> {
        let graph: TypeGraph = serde_json::from_str(json)?;
        graph.validate()?;
        Ok(graph)
    }

    pub fn to_json(&self) -> GenResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Checks the structural invariants the rest of the pass relies on.
    pub fn validate(&self) -> GenResult<()> {
        let mut modules = BTreeSet::new();
        for module in &self.modules {
            if !modules.insert(module.name.as_str()) {
                return Err(GenError::DuplicateModule(module.name.clone()));
            }
            let mut names = BTreeSet::new();
            for declaration in &module.types {
                if declaration.module != module.name {
                    return Err(GenError::ModuleMismatch {
                        type_name: declaration.name.clone(),
                        listed: module.name.clone(),
                        declared: declaration.module.clone(),
                    });
                }
                if !names.insert(declaration.name.as_str()) {
                    return Err(GenError::DuplicateType {
                        module: module.name.clone(),
                        type_name: declaration.name.clone(),
                    });
                }
            }
        }
        if !modules.contains(self.current_module.as_str()) {
            return Err(GenError::UnknownModule(self.current_module.clone()));
        }
        Ok(())
    }

    pub fn module(&self, name: &str) -> Option<&ModuleDecl> {
        self.modules.iter().find(|m| m.name == name)
    }

    pub fn is_current(&self, module: &str) -> bool {
        self.current_module == module
    }

    /// Modules whose types are classified into the plan: the current module
    /// plus every participating referenced module.
    pub fn scanned_modules(&self) -> impl Iterator<Item = &ModuleDecl> {
        self.modules
            .iter()
            .filter(move |m| self.is_current(&m.name) || m.participates)
    }

    /// Referenced modules that opted in, ordered by name.
    pub fn participating_references(&self) -> Vec<&ModuleDecl> {
        let mut modules: Vec<&ModuleDecl> = self
            .modules
            .iter()
            .filter(|m| !self.is_current(&m.name) && m.participates)
            .collect();
        modules.sort_by(|a, b| a.name.cmp(&b.name));
        modules
    }

    pub fn types(&self) -> impl Iterator<Item = &TypeDeclaration> {
        self.modules.iter().flat_map(|m| m.types.iter())
    }

    /// First declaration with the given qualified name, current module first.
    pub fn find_type(&self, name: &str) -> Option<&TypeDeclaration> {
        self.module(&self.current_module)
            .and_then(|m| m.types.iter().find(|t| t.name == name))
            .or_else(|| self.types().find(|t| t.name == name))
    }

    /// Indexes the graph for repeated lookups.
    pub fn index(&self) -> GraphIndex<'_> {
        GraphIndex::new(self)
    }
}

/// Name-keyed lookup tables over a [`TypeGraph`].
#[derive(Debug)]
pub struct GraphIndex<'g> {
    graph: &'g TypeGraph,
    by_name: BTreeMap<&'g str, &'g TypeDeclaration>,
    plugin_contracts: BTreeSet<String>,
}

impl<'g> GraphIndex<'g> {
    fn new(graph: &'g TypeGraph) -> Self {
        let mut by_name = BTreeMap::new();
        // Current module wins on name clashes across modules
        for declaration in graph.types() {
            let current = graph.is_current(&declaration.module);
            by_name
                .entry(declaration.name.as_str())
                .and_modify(|existing| {
                    if current {
                        *existing = declaration;
                    }
                })
                .or_insert(declaration);
        }
        let plugin_contracts = graph
            .types()
            .filter(|t| t.kind == DeclarationKind::Interface)
            .filter(|t| t.has_marker(|m| matches!(m, Marker::PluginContract)))
            .map(|t| t.name.clone())
            .collect();
        Self {
            graph,
            by_name,
            plugin_contracts,
        }
    }

    pub fn graph(&self) -> &'g TypeGraph {
        self.graph
    }

    pub fn get(&self, name: &str) -> Option<&'g TypeDeclaration> {
        self.by_name.get(name).copied()
    }

    pub fn resolve(&self, type_ref: &TypeRef) -> Option<&'g TypeDeclaration> {
        self.get(type_ref.base_name())
    }

    /// Interfaces declared with the plugin-contract marker.
    pub fn plugin_contracts(&self) -> &BTreeSet<String> {
        &self.plugin_contracts
    }
}
