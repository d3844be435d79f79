//! Declaration surface for state machines.
//!
//! Facts are collected by two independent registries: [`ClassRegistry`] for
//! class-level facts (is this type a state, is it initial or abstract, which
//! attributes and bases does it have) and [`MemberRegistry`] for methods,
//! properties and transitions. [`StateRegistry`] owns both and hands them to
//! the resolver. Registration only detects duplicates; every cross-state rule
//! is checked on resolution.

mod class;
mod member;

pub use class::{ClassFacts, ClassRegistry, StateSpec};
pub use member::MemberRegistry;

use crate::core::{Args, StateMember, StateRef};
use crate::definition::StateMachineDefinition;
use crate::error::{ConfigError, MemberError};
use crate::resolver::Resolver;
use serde::Serialize;
use std::any::Any;

/// Collects the declarations of one state machine.
///
/// # Example
///
/// ```rust
/// use statehold::{Args, StateRegistry, StateSpec};
///
/// #[derive(Debug, Default)]
/// struct Idle;
///
/// #[derive(Debug)]
/// struct Busy {
///     job: String,
/// }
///
/// let mut registry = StateRegistry::new();
/// registry
///     .state(StateSpec::<Idle>::new().initial())?
///     .state(StateSpec::<Busy>::new().attribute("job", |s: &Busy| s.job.clone()))?
///     .transition("start", |_: &Idle, args: &Args| Ok(Busy { job: args.get("job")? }))?
///     .transition("finish", |_: &Busy, _: &Args| Ok(Idle))?;
///
/// let machine = registry.resolve()?;
/// assert_eq!(machine.initial().key().name(), "Idle");
/// # Ok::<(), statehold::ConfigError>(())
/// ```
#[derive(Clone, Debug, Default)]
pub struct StateRegistry {
    classes: ClassRegistry,
    members: MemberRegistry,
    resolved: bool,
}

impl StateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a state type.
    pub fn state<S: Any + Send + Sync>(
        &mut self,
        spec: StateSpec<S>,
    ) -> Result<&mut Self, ConfigError> {
        self.check_unresolved()?;
        self.classes.register(spec.into_facts()?)?;
        Ok(self)
    }

    /// Register a method of state `S`.
    pub fn method<S, T, F>(&mut self, name: &str, body: F) -> Result<&mut Self, ConfigError>
    where
        S: Any + Send + Sync,
        T: Serialize + 'static,
        F: Fn(&S, &Args) -> Result<T, MemberError> + Send + Sync + 'static,
    {
        self.member(StateMember::method(name, body))
    }

    /// Register a computed, read-only property of state `S`.
    pub fn property<S, T, F>(&mut self, name: &str, compute: F) -> Result<&mut Self, ConfigError>
    where
        S: Any + Send + Sync,
        T: Serialize + 'static,
        F: Fn(&S) -> T + Send + Sync + 'static,
    {
        self.member(StateMember::property(name, compute))
    }

    /// Register a transition from `S` to the state `D` its body returns.
    pub fn transition<S, D, F>(&mut self, name: &str, body: F) -> Result<&mut Self, ConfigError>
    where
        S: Any + Send + Sync,
        D: Any + Send + Sync,
        F: Fn(&S, &Args) -> Result<D, MemberError> + Send + Sync + 'static,
    {
        self.member(StateMember::transition(name, StateRef::to::<D>(), body))
    }

    /// Register a transition with an explicitly declared destination.
    ///
    /// A bare name such as `"Ordered"` refers to a state in the module of
    /// `S`; it does not need to be registered yet.
    pub fn transition_to<S, D, F>(
        &mut self,
        name: &str,
        destination: impl Into<StateRef>,
        body: F,
    ) -> Result<&mut Self, ConfigError>
    where
        S: Any + Send + Sync,
        D: Any + Send + Sync,
        F: Fn(&S, &Args) -> Result<D, MemberError> + Send + Sync + 'static,
    {
        self.member(StateMember::transition(name, destination, body))
    }

    /// Register a prepared member under its declaring state.
    pub fn member(&mut self, member: StateMember) -> Result<&mut Self, ConfigError> {
        self.check_unresolved()?;
        self.members.register(member)?;
        Ok(self)
    }

    pub fn classes(&self) -> &ClassRegistry {
        &self.classes
    }

    pub fn members(&self) -> &MemberRegistry {
        &self.members
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved
    }

    /// Unresolved copy of everything collected so far.
    pub fn extend(&self) -> StateRegistry {
        StateRegistry {
            classes: self.classes.clone(),
            members: self.members.clone(),
            resolved: false,
        }
    }

    /// Validate the collected declarations and freeze them into a machine.
    ///
    /// The registry cannot be used for further registrations afterwards,
    /// whether or not resolution succeeds.
    pub fn resolve(&mut self) -> Result<StateMachineDefinition, ConfigError> {
        self.check_unresolved()?;
        self.resolved = true;
        Resolver::new(&self.classes, &self.members).resolve()
    }

    fn check_unresolved(&self) -> Result<(), ConfigError> {
        if self.resolved {
            return Err(ConfigError::RegistryResolved);
        }
        Ok(())
    }
}
