//! Binding resolved machines to host types.
//!
//! Binding builds a delegation table once per host type: every member name of
//! the machine maps to its kind and to the implementation of each state that
//! supports it. Instances built through the resulting [`BoundType`] carry a
//! [`HostBinding`] that forwards every access through that table.

mod binding;
mod host;
mod table;

pub use binding::{HostBinding, Stateful};
pub use host::Host;

use crate::core::{short_type_name, AnyState, StateKey};
use crate::definition::StateMachineDefinition;
use crate::error::ConfigError;
use crate::settings::Settings;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use table::DelegationTable;
use tracing::debug;
use uuid::Uuid;

// Machine each host type is bound to, process-wide.
static BOUND_HOSTS: Lazy<Mutex<HashMap<TypeId, Uuid>>> = Lazy::new(|| Mutex::new(HashMap::new()));

pub struct Binder;

impl Binder {
    /// Bind `definition` to the host type `H`.
    ///
    /// A host type carries at most one machine. Binding the same machine
    /// again returns another handle to it; binding a different one fails.
    /// The handle starts with [`Settings::default`]; the process environment
    /// is never consulted here.
    pub fn bind<H: Host>(definition: &StateMachineDefinition) -> Result<BoundType<H>, ConfigError> {
        let host = short_type_name::<H>();

        if let Some(member) = H::host_members()
            .iter()
            .find(|member| definition.has_member(member))
        {
            return Err(ConfigError::HostMemberCollision {
                host,
                member: member.to_string(),
            });
        }

        let table = DelegationTable::build(definition, host.clone())?;

        {
            let mut bound = BOUND_HOSTS.lock();
            match bound.get(&TypeId::of::<H>()).copied() {
                Some(id) if id != definition.id() => {
                    return Err(ConfigError::AlreadyBound(type_name::<H>().to_string()));
                }
                Some(_) => {}
                None => {
                    bound.insert(TypeId::of::<H>(), definition.id());
                }
            }
        }

        debug!(
            host = %host,
            machine = %definition.id(),
            states = definition.states().len(),
            "bound host type"
        );
        Ok(BoundType {
            table: Arc::new(table),
            settings: Settings::default(),
            _host: PhantomData,
        })
    }
}

/// A host type augmented with a state machine.
///
/// # Example
///
/// ```rust
/// use statehold::{Args, Host, StateRegistry, StateSpec};
///
/// #[derive(Default)]
/// struct Locked;
///
/// struct Unlocked;
///
/// struct Door;
///
/// impl Host for Door {}
///
/// let mut registry = StateRegistry::new();
/// registry
///     .state(StateSpec::<Locked>::new().initial())?
///     .state(StateSpec::<Unlocked>::new())?
///     .transition("unlock", |_: &Locked, _: &Args| Ok(Unlocked))?
///     .transition("lock", |_: &Unlocked, _: &Args| Ok(Locked))?
///     .property("open", |_: &Unlocked| true)?;
///
/// let doors = registry.resolve()?.bind::<Door>()?;
/// let door = doors.construct(Door);
///
/// assert!(door.is_in::<Locked>());
/// assert!(door.get("open").is_err());
///
/// door.fire("unlock", &Args::new()).unwrap();
/// assert_eq!(door.get_as::<bool>("open").unwrap(), true);
/// # Ok::<(), statehold::ConfigError>(())
/// ```
pub struct BoundType<H> {
    table: Arc<DelegationTable>,
    settings: Settings,
    _host: PhantomData<fn() -> H>,
}

impl<H: Host> BoundType<H> {
    /// Wrap `host`, starting in a fresh initial state.
    pub fn construct(&self, host: H) -> Stateful<H> {
        let (index, state) = self.table.construct_initial();
        Stateful::new(host, self.binding(index, state))
    }

    /// Wrap `host`, starting in the given concrete state.
    pub fn construct_in<S: Any + Send + Sync>(
        &self,
        host: H,
        state: S,
    ) -> Result<Stateful<H>, ConfigError> {
        let index = self
            .table
            .index_of_type(TypeId::of::<S>())
            .ok_or_else(|| ConfigError::ForeignState(type_name::<S>().to_string()))?;
        Ok(Stateful::new(host, self.binding(index, Box::new(state))))
    }

    /// Use `settings` for instances constructed from now on, e.g.
    /// `Settings::from_env()?` to honour the environment.
    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Id of the machine this type is bound to.
    pub fn machine_id(&self) -> Uuid {
        self.table.machine_id()
    }

    /// Short host type name used in error messages.
    pub fn host_name(&self) -> &str {
        self.table.host()
    }

    /// Concrete states, initial first.
    pub fn states(&self) -> &[StateKey] {
        self.table.states()
    }

    /// Every member name reachable through instances of this type.
    pub fn member_names(&self) -> Vec<&str> {
        self.table.member_names().collect()
    }

    fn binding(&self, index: usize, state: Box<AnyState>) -> HostBinding {
        HostBinding::new(Arc::clone(&self.table), self.settings.clone(), index, state)
    }
}

impl<H> Clone for BoundType<H> {
    fn clone(&self) -> Self {
        Self {
            table: Arc::clone(&self.table),
            settings: self.settings.clone(),
            _host: PhantomData,
        }
    }
}

impl<H> fmt::Debug for BoundType<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundType")
            .field("host", &self.table.host())
            .field("machine", &self.table.machine_id())
            .field("settings", &self.settings)
            .finish()
    }
}
