//! Class-level facts: which types are states, and how they are shaped.

use crate::core::{projection, AnyState, Base, Constructor, StateKey, StateMember};
use crate::error::ConfigError;
use indexmap::IndexMap;
use std::any::{Any, TypeId};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// Everything declared about one state type at class level.
#[derive(Clone)]
pub struct ClassFacts {
    pub(crate) key: StateKey,
    pub(crate) type_id: TypeId,
    pub(crate) initial: bool,
    pub(crate) is_abstract: bool,
    pub(crate) attributes: IndexMap<String, StateMember>,
    pub(crate) bases: Vec<Base>,
    pub(crate) constructor: Option<Constructor>,
}

impl ClassFacts {
    pub fn key(&self) -> &StateKey {
        &self.key
    }

    pub fn is_initial(&self) -> bool {
        self.initial
    }

    pub fn is_abstract(&self) -> bool {
        self.is_abstract
    }

    pub fn attributes(&self) -> impl Iterator<Item = &StateMember> {
        self.attributes.values()
    }

    pub fn bases(&self) -> &[Base] {
        &self.bases
    }
}

impl fmt::Debug for ClassFacts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassFacts")
            .field("key", &self.key)
            .field("initial", &self.initial)
            .field("is_abstract", &self.is_abstract)
            .field("attributes", &self.attributes.keys().collect::<Vec<_>>())
            .field("bases", &self.bases)
            .field("constructible", &self.constructor.is_some())
            .finish()
    }
}

/// Builder describing a state type `S`.
///
/// Problems found while building (a repeated attribute name) are reported
/// when the spec is registered.
///
/// # Example
///
/// ```rust
/// use statehold::StateSpec;
///
/// #[derive(Default)]
/// struct Demanded;
///
/// struct Ordered {
///     cost: f64,
/// }
///
/// let demanded = StateSpec::<Demanded>::new().initial();
/// let ordered = StateSpec::<Ordered>::new().attribute("cost", |s: &Ordered| s.cost);
/// assert!(demanded.into_facts().unwrap().is_initial());
/// assert_eq!(ordered.into_facts().unwrap().attributes().count(), 1);
/// ```
pub struct StateSpec<S> {
    facts: ClassFacts,
    duplicate: Option<String>,
    _phantom: PhantomData<fn() -> S>,
}

impl<S: Any + Send + Sync> StateSpec<S> {
    pub fn new() -> Self {
        Self {
            facts: ClassFacts {
                key: StateKey::of::<S>(),
                type_id: TypeId::of::<S>(),
                initial: false,
                is_abstract: false,
                attributes: IndexMap::new(),
                bases: Vec::new(),
                constructor: None,
            },
            duplicate: None,
            _phantom: PhantomData,
        }
    }

    /// Mark as the initial state, built with `S::default()` whenever a host
    /// is constructed.
    pub fn initial(self) -> Self
    where
        S: Default,
    {
        self.initial_with(S::default)
    }

    /// Mark as the initial state, built with `constructor`.
    pub fn initial_with<F>(mut self, constructor: F) -> Self
    where
        F: Fn() -> S + Send + Sync + 'static,
    {
        self.facts.initial = true;
        self.facts.constructor = Some(Arc::new(move || Box::new(constructor()) as Box<AnyState>));
        self
    }

    /// Mark as initial without a way to build it. Resolution rejects such a
    /// machine; hosts would have nothing to start in.
    pub fn mark_initial(mut self) -> Self {
        self.facts.initial = true;
        self
    }

    /// Abstract states only contribute members to states listing them as a
    /// base and are never held by a host.
    pub fn abstract_state(mut self) -> Self {
        self.facts.is_abstract = true;
        self
    }

    /// Expose a field of the state as an attribute.
    pub fn attribute<T, F>(mut self, name: impl Into<String>, getter: F) -> Self
    where
        T: serde::Serialize + 'static,
        F: Fn(&S) -> T + Send + Sync + 'static,
    {
        let member = StateMember::attribute(name, getter);
        let name = member.name().to_string();
        if self.facts.attributes.contains_key(&name) {
            self.duplicate.get_or_insert(name);
        } else {
            self.facts.attributes.insert(name, member);
        }
        self
    }

    /// Take over the members of state `B`, found inside `S` through `get`.
    ///
    /// Bases listed later take precedence over earlier ones; members declared
    /// on `S` itself take precedence over all bases.
    pub fn base<B, F>(mut self, get: F) -> Self
    where
        B: Any + Send + Sync,
        F: Fn(&S) -> &B + Send + Sync + 'static,
    {
        let projection = projection(move |state: &AnyState| {
            state.downcast_ref::<S>().map(|s| get(s) as &AnyState)
        });
        self.facts.bases.push(Base {
            key: StateKey::of::<B>(),
            projection,
        });
        self
    }

    /// Finish the spec.
    pub fn into_facts(self) -> Result<ClassFacts, ConfigError> {
        match self.duplicate {
            Some(member) => Err(ConfigError::DuplicateMember {
                state: self.facts.key,
                member,
            }),
            None => Ok(self.facts),
        }
    }
}

impl<S: Any + Send + Sync> Default for StateSpec<S> {
    fn default() -> Self {
        Self::new()
    }
}

/// Collects class-level facts, keyed by state identity.
#[derive(Clone, Debug, Default)]
pub struct ClassRegistry {
    states: IndexMap<StateKey, ClassFacts>,
}

impl ClassRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the facts of one state. Each identity may be registered once.
    pub fn register(&mut self, facts: ClassFacts) -> Result<(), ConfigError> {
        if let Some(existing) = self.states.get(&facts.key) {
            if existing.type_id != facts.type_id {
                return Err(ConfigError::AmbiguousIdentity(facts.key));
            }
            return Err(ConfigError::DuplicateState(facts.key));
        }
        self.states.insert(facts.key.clone(), facts);
        Ok(())
    }

    pub fn get(&self, key: &StateKey) -> Option<&ClassFacts> {
        self.states.get(key)
    }

    pub fn contains(&self, key: &StateKey) -> bool {
        self.states.contains_key(key)
    }

    /// Facts in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &ClassFacts> {
        self.states.values()
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}
