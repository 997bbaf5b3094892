//! Build diagnostics collected during a generation pass.
//!
//! Diagnostics are values: produced once, never mutated, and handed to the
//! caller (and the optional report) at the end of the pass.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::SourceLocation;

/// Severity of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
        })
    }
}

/// Stable diagnostic identifiers.
///
/// # Examples
///
/// ```rust
/// use ferrous_di_codegen::{DiagnosticId, Severity};
///
/// assert_eq!(DiagnosticId::InaccessibleCandidate.code(), "DI0001");
/// assert_eq!(DiagnosticId::InaccessibleCandidate.severity(), Severity::Error);
/// assert_eq!(DiagnosticId::ValidatorUnused.severity(), Severity::Warning);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DiagnosticId {
    /// Eligible type is not reachable from generated code
    InaccessibleCandidate,
    /// Referenced module holds plugins but did not opt in
    ModuleNotParticipating,
    /// Decorator marker without a constructor taking the decorated interface
    DecoratorMissingInner,
    /// Configuration type lacks a parameterless constructor and cannot get one
    ConfigurationTypeNotExtensible,
    /// Validator exists but the binding does not validate on start
    ValidatorUnused,
    /// Open decorator marker names a closed type
    OpenDecoratorTargetClosed,
    /// Interceptors on a type that exposes no interface
    InterceptedWithoutInterface,
    /// Factory source without runtime arguments
    FactoryUnnecessary,
    /// Decorator marker on a type that cannot be constructed
    DecoratorNotConstructible,
}

impl DiagnosticId {
    pub fn code(self) -> &'static str {
        match self {
            DiagnosticId::InaccessibleCandidate => "DI0001",
            DiagnosticId::ModuleNotParticipating => "DI0002",
            DiagnosticId::DecoratorMissingInner => "DI0003",
            DiagnosticId::ConfigurationTypeNotExtensible => "DI0004",
            DiagnosticId::ValidatorUnused => "DI0005",
            DiagnosticId::OpenDecoratorTargetClosed => "DI0006",
            DiagnosticId::InterceptedWithoutInterface => "DI0007",
            DiagnosticId::FactoryUnnecessary => "DI0008",
            DiagnosticId::DecoratorNotConstructible => "DI0009",
        }
    }

    pub fn severity(self) -> Severity {
        match self {
            DiagnosticId::InaccessibleCandidate => Severity::Error,
            DiagnosticId::FactoryUnnecessary => Severity::Info,
            _ => Severity::Warning,
        }
    }

    fn template(self) -> &'static str {
        match self {
            DiagnosticId::InaccessibleCandidate => {
                "Type '{0}' in module '{1}' is eligible for registration but is not publicly reachable from generated code"
            }
            DiagnosticId::ModuleNotParticipating => {
                "Module '{0}' contains plugin type '{1}' ({2} in total) but does not opt in to graph generation; none of its types will be scanned"
            }
            DiagnosticId::DecoratorMissingInner => {
                "Decorator '{0}' targets '{1}' but has no constructor accepting '{1}'"
            }
            DiagnosticId::ConfigurationTypeNotExtensible => {
                "Configuration type '{0}' has no parameterless constructor and is not open for extension; binding code may not compile"
            }
            DiagnosticId::ValidatorUnused => {
                "Configuration type '{0}' has validator '{1}' but binding '{2}' does not validate on start"
            }
            DiagnosticId::OpenDecoratorTargetClosed => {
                "Open decorator '{0}' targets '{1}', which is not an open generic interface"
            }
            DiagnosticId::InterceptedWithoutInterface => {
                "Type '{0}' declares interceptors but exposes no interface to proxy; it is registered without interception"
            }
            DiagnosticId::FactoryUnnecessary => {
                "Factory source '{0}' has no runtime arguments; it could be registered directly"
            }
            DiagnosticId::DecoratorNotConstructible => {
                "Decorator '{0}' targets '{1}' but is not a concrete class; it is not applied"
            }
        }
    }
}

/// Where a diagnostic points.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DiagnosticLocation {
    Source(SourceLocation),
    Module(String),
}

impl fmt::Display for DiagnosticLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticLocation::Source(loc) => write!(f, "{}:{}:{}", loc.file, loc.line, loc.column),
            DiagnosticLocation::Module(name) => write!(f, "module {name}"),
        }
    }
}

/// A single diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub id: DiagnosticId,
    pub severity: Severity,
    /// Message parameters substituted into the id's template
    pub args: Vec<String>,
    pub location: DiagnosticLocation,
}

impl Diagnostic {
    pub fn new(id: DiagnosticId, args: Vec<String>, location: DiagnosticLocation) -> Self {
        Self {
            id,
            severity: id.severity(),
            args,
            location,
        }
    }

    /// Points at `location` when present, otherwise at `module`.
    pub fn at(
        id: DiagnosticId,
        args: Vec<String>,
        location: Option<&SourceLocation>,
        module: &str,
    ) -> Self {
        let location = match location {
            Some(loc) => DiagnosticLocation::Source(loc.clone()),
            None => DiagnosticLocation::Module(module.to_string()),
        };
        Self::new(id, args, location)
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// Human-readable message.
    pub fn message(&self) -> String {
        let mut message = self.id.template().to_string();
        for (i, arg) in self.args.iter().enumerate() {
            message = message.replace(&format!("{{{i}}}"), arg);
        }
        message
    }

    fn sort_key(&self) -> (Severity, DiagnosticId, &DiagnosticLocation, &[String]) {
        (self.severity, self.id, &self.location, &self.args)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}: {} [{}]", self.severity, self.id.code(), self.message(), self.location)
    }
}

/// Accumulates diagnostics for a pass.
#[derive(Debug, Clone, Default)]
pub struct DiagnosticBag {
    items: Vec<Diagnostic>,
}

impl DiagnosticBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        tracing::debug!(code = diagnostic.id.code(), severity = %diagnostic.severity, "{}", diagnostic.message());
        self.items.push(diagnostic);
    }

    /// Sorted by severity, id, location, then arguments; duplicates removed.
    pub fn into_sorted(mut self) -> Vec<Diagnostic> {
        self.items.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        self.items.dedup();
        self.items
    }
}
