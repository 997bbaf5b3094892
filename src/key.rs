//! Registration keys emitted into the service registry.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Key a registration is published under in the consuming container.
///
/// Every injectable type registers under its own concrete type and under each
/// exposed interface. Keyed services additionally register the keyed
/// variants, one per declared key.
///
/// # Key Types
///
/// - **Type**: the concrete implementation
/// - **Interface**: an exposed interface (many implementations may share it)
/// - **Keyed variants**: the above with a service key
///
/// # Examples
///
/// ```rust
/// use ferrous_di_codegen::Key;
///
/// let plain = Key::Interface("App.IOrderService".to_string());
/// assert_eq!(plain.display_name(), "App.IOrderService");
/// assert_eq!(plain.service_key(), None);
///
/// let keyed = Key::InterfaceKeyed("App.ICache".to_string(), "primary".to_string());
/// assert_eq!(keyed.service_key(), Some("primary"));
/// assert_eq!(keyed.to_string(), "App.ICache[primary]");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Key {
    /// Concrete implementation type
    Type(String),
    /// Exposed interface
    Interface(String),
    /// Concrete type with a service key
    TypeKeyed(String, String),
    /// Interface with a service key
    InterfaceKeyed(String, String),
}

impl Key {
    /// Get the type or interface name for display
    pub fn display_name(&self) -> &str {
        match self {
            Key::Type(name) | Key::Interface(name) => name,
            Key::TypeKeyed(name, _) | Key::InterfaceKeyed(name, _) => name,
        }
    }

    /// Get the service key for keyed registrations, or None otherwise
    pub fn service_key(&self) -> Option<&str> {
        match self {
            Key::Type(_) | Key::Interface(_) => None,
            Key::TypeKeyed(_, key) | Key::InterfaceKeyed(_, key) => Some(key),
        }
    }

    pub fn is_interface(&self) -> bool {
        matches!(self, Key::Interface(_) | Key::InterfaceKeyed(_, _))
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.service_key() {
            Some(key) => write!(f, "{}[{}]", self.display_name(), key),
            None => f.write_str(self.display_name()),
        }
    }
}

/// All keys for a registration, in emission order: the concrete type, then
/// interfaces in declaration order, then keyed variants.
pub fn keys_for(type_name: &str, interfaces: &[String], service_keys: &[String]) -> Vec<Key> {
    let mut keys = vec![Key::Type(type_name.to_string())];
    keys.extend(interfaces.iter().map(|i| Key::Interface(i.clone())));
    for service_key in service_keys {
        keys.push(Key::TypeKeyed(type_name.to_string(), service_key.clone()));
        keys.extend(
            interfaces
                .iter()
                .map(|i| Key::InterfaceKeyed(i.clone(), service_key.clone())),
        );
    }
    keys
}
