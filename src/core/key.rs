//! State identities and destination references.
//!
//! Every state declaration is identified by a [`StateKey`]: the namespace
//! (module path) and name of the Rust type backing it. Transitions name their
//! destination through a [`StateRef`], which may be a symbolic forward
//! reference that is only resolved once every declaration has been collected.

use serde::{Deserialize, Serialize};
use std::any::type_name;
use std::fmt;

/// Identity of a state declaration.
///
/// Derived from the fully-qualified type path of the state type, so two
/// states with the same name in different modules never collide.
///
/// The path comes from [`std::any::type_name`], which is best-effort and may
/// change between compiler versions. Keys serve display and symbolic
/// destination lookup; held states are matched by `TypeId`, and two types
/// rendering the same path are rejected as `ConfigError::AmbiguousIdentity`.
///
/// # Example
///
/// ```rust
/// use statehold::StateKey;
///
/// struct Ordered;
///
/// let key = StateKey::of::<Ordered>();
/// assert_eq!(key.name(), "Ordered");
/// assert_eq!(StateKey::from_path("shop::Ordered").namespace(), "shop");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StateKey {
    namespace: String,
    name: String,
}

impl StateKey {
    /// Create a key from an explicit namespace and name.
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Key of the Rust type `T`.
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self::from_path(type_name::<T>())
    }

    /// Parse a `::`-separated path; the last segment becomes the name.
    pub fn from_path(path: &str) -> Self {
        let (namespace, name) = split_path(path);
        Self::new(namespace, name)
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for StateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace.is_empty() {
            f.write_str(&self.name)
        } else {
            write!(f, "{}::{}", self.namespace, self.name)
        }
    }
}

/// Reference to the destination of a transition.
///
/// A symbolic reference containing `::` is treated as a fully-qualified
/// identity. A bare name is looked up in the namespace of the state that
/// declares the transition, which allows referring to states declared later
/// in the same module.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StateRef {
    /// Already known identity.
    Key(StateKey),
    /// Forward reference, resolved against the full identity table.
    Symbol(String),
}

impl StateRef {
    /// Reference the state backed by type `T`.
    pub fn to<T: ?Sized + 'static>() -> Self {
        StateRef::Key(StateKey::of::<T>())
    }

    /// Turn the reference into a key, resolving bare names in `namespace`.
    pub fn resolve_in(&self, namespace: &str) -> StateKey {
        match self {
            StateRef::Key(key) => key.clone(),
            StateRef::Symbol(symbol) if symbol.contains("::") => StateKey::from_path(symbol),
            StateRef::Symbol(symbol) => StateKey::new(namespace, symbol.as_str()),
        }
    }
}

impl fmt::Display for StateRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateRef::Key(key) => key.fmt(f),
            StateRef::Symbol(symbol) => f.write_str(symbol),
        }
    }
}

impl From<StateKey> for StateRef {
    fn from(key: StateKey) -> Self {
        StateRef::Key(key)
    }
}

impl From<&str> for StateRef {
    fn from(symbol: &str) -> Self {
        StateRef::Symbol(symbol.to_string())
    }
}

impl From<String> for StateRef {
    fn from(symbol: String) -> Self {
        StateRef::Symbol(symbol)
    }
}

/// Last path segment of the type name of `T`, used in diagnostics.
pub(crate) fn short_type_name<T: ?Sized + 'static>() -> String {
    split_path(type_name::<T>()).1.to_string()
}

// Splits at the last `::` that is not nested inside generic arguments.
fn split_path(path: &str) -> (&str, &str) {
    let bytes = path.as_bytes();
    let mut depth = 0usize;
    let mut split = None;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'<' => depth += 1,
            b'>' => depth = depth.saturating_sub(1),
            b':' if depth == 0 && bytes.get(i + 1) == Some(&b':') => {
                split = Some(i);
                i += 1;
            }
            _ => {}
        }
        i += 1;
    }
    match split {
        Some(at) => (&path[..at], &path[at + 2..]),
        None => ("", path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Demanded;

    #[allow(dead_code)]
    struct Wrapper<T>(T);

    #[test]
    fn key_of_type_uses_module_path() {
        let key = StateKey::of::<Demanded>();

        assert_eq!(key.name(), "Demanded");
        assert!(key.namespace().ends_with("core::key::tests"));
    }

    #[test]
    fn generic_arguments_stay_in_name() {
        let key = StateKey::from_path("shop::Wrapper<shop::Item>");

        assert_eq!(key.namespace(), "shop");
        assert_eq!(key.name(), "Wrapper<shop::Item>");
    }

    #[test]
    fn path_without_namespace() {
        let key = StateKey::from_path("Solo");

        assert_eq!(key.namespace(), "");
        assert_eq!(key.to_string(), "Solo");
    }

    #[test]
    fn bare_symbol_resolves_in_owner_namespace() {
        let reference = StateRef::from("Ordered");

        assert_eq!(
            reference.resolve_in("shop::article"),
            StateKey::new("shop::article", "Ordered")
        );
    }

    #[test]
    fn qualified_symbol_ignores_owner_namespace() {
        let reference = StateRef::from("billing::Paid");

        assert_eq!(
            reference.resolve_in("shop"),
            StateKey::new("billing", "Paid")
        );
    }

    #[test]
    fn short_type_name_strips_path() {
        assert_eq!(short_type_name::<Demanded>(), "Demanded");
        assert_eq!(short_type_name::<Wrapper<Demanded>>().split('<').next(), Some("Wrapper"));
    }
}
