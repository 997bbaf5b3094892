//! Service lifetime definitions and lifetime resolution.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::{Marker, TypeDeclaration};

/// Service lifetimes controlling instance caching behavior in the consuming
/// container.
///
/// The generator only records the lifetime; caching is the runtime
/// container's business.
///
/// - **Singleton**: created once and shared for the whole application
/// - **Scoped**: created once per scope
/// - **Transient**: created on every resolution
///
/// # Examples
///
/// ```rust
/// use ferrous_di_codegen::Lifetime;
///
/// assert_eq!(Lifetime::default(), Lifetime::Singleton);
/// assert_eq!(Lifetime::Scoped.to_string(), "Scoped");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum Lifetime {
    /// Single instance per root provider, cached forever
    #[default]
    Singleton,
    /// Single instance per scope, cached for scope lifetime
    Scoped,
    /// New instance per resolution, never cached
    Transient,
}

impl Lifetime {
    /// All lifetimes in declaration order.
    pub const ALL: [Lifetime; 3] = [Lifetime::Singleton, Lifetime::Scoped, Lifetime::Transient];

    /// Name used in generated source.
    pub fn as_str(self) -> &'static str {
        match self {
            Lifetime::Singleton => "Singleton",
            Lifetime::Scoped => "Scoped",
            Lifetime::Transient => "Transient",
        }
    }
}

impl fmt::Display for Lifetime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Assigns the lifetime of an injectable type.
///
/// Singleton unless a type-level `Lifetime` marker asks for something else.
/// When a declaration carries several lifetime markers the last one wins.
///
/// # Examples
///
/// ```rust
/// use ferrous_di_codegen::{resolve_lifetime, Lifetime};
/// use ferrous_di_codegen::model::{Marker, TypeDeclaration};
///
/// let plain = TypeDeclaration::class("App", "App.OrderService");
/// assert_eq!(resolve_lifetime(&plain), Lifetime::Singleton);
///
/// let scoped = TypeDeclaration::class("App", "App.RequestContext")
///     .with_marker(Marker::Lifetime(Lifetime::Scoped));
/// assert_eq!(resolve_lifetime(&scoped), Lifetime::Scoped);
/// ```
pub fn resolve_lifetime(declaration: &TypeDeclaration) -> Lifetime {
    declaration
        .markers
        .iter()
        .filter_map(|marker| match marker {
            Marker::Lifetime(lifetime) => Some(*lifetime),
            _ => None,
        })
        .last()
        .unwrap_or_default()
}

/// Counts lifetimes, always reporting all three buckets.
pub fn histogram<I>(lifetimes: I) -> BTreeMap<Lifetime, usize>
where
    I: IntoIterator<Item = Lifetime>,
{
    let mut counts: BTreeMap<Lifetime, usize> = Lifetime::ALL.iter().map(|l| (*l, 0)).collect();
    for lifetime in lifetimes {
        *counts.entry(lifetime).or_insert(0) += 1;
    }
    counts
}
