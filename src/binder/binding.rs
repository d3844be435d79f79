//! Per-instance delegation: the held state and the generic forwarding
//! routine every member access goes through.

use super::table::{DelegationEntry, DelegationTable, Dispatch};
use crate::core::{
    from_value, AnyState, Args, Implementation, MemberKind, StateHistory, StateKey,
    StateTransition,
};
use crate::error::{Error, MemberError, StateError};
use crate::settings::Settings;
use chrono::Utc;
use parking_lot::{RwLock, RwLockUpgradableReadGuard};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::any::{Any, TypeId};
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use tracing::trace;

struct Slot {
    index: usize,
    state: Arc<AnyState>,
    history: StateHistory,
}

/// Runtime association between one host instance and the state it holds.
///
/// The held state is an immutable snapshot. Reads clone the snapshot and run
/// the member outside the lock; a transition computes the next state while
/// holding an upgradable read and swaps it in with a single write, so a
/// reader sees either the old state or the new one.
pub struct HostBinding {
    table: Arc<DelegationTable>,
    settings: Settings,
    slot: RwLock<Slot>,
}

impl HostBinding {
    pub(crate) fn new(
        table: Arc<DelegationTable>,
        settings: Settings,
        index: usize,
        state: Box<AnyState>,
    ) -> Self {
        Self {
            table,
            settings,
            slot: RwLock::new(Slot {
                index,
                state: Arc::from(state),
                history: StateHistory::new(),
            }),
        }
    }

    /// Identity of the held state.
    pub fn current_state(&self) -> StateKey {
        self.table.state_key(self.slot.read().index).clone()
    }

    /// Whether the held state implements `name`.
    pub fn supports(&self, name: &str) -> bool {
        let index = self.slot.read().index;
        self.table
            .entry(name)
            .is_some_and(|entry| entry.for_state(index).is_some())
    }

    /// Read an attribute or property.
    pub fn get(&self, name: &str) -> Result<Value, Error> {
        let entry = self.entry(name, MemberKind::is_readable, "readable member")?;
        let (index, state) = self.snapshot();
        match &self.supported(entry, name, index)?.implementation {
            Implementation::Read(read) => Ok(read(state.as_ref())?),
            _ => Err(wrong_kind(name, entry, "readable member")),
        }
    }

    /// Call a method.
    pub fn call(&self, name: &str, args: &Args) -> Result<Value, Error> {
        let entry = self.entry(name, |kind| kind == MemberKind::Method, "method")?;
        let (index, state) = self.snapshot();
        match &self.supported(entry, name, index)?.implementation {
            Implementation::Call(call) => Ok(call(state.as_ref(), args)?),
            _ => Err(wrong_kind(name, entry, "method")),
        }
    }

    /// Fire a transition and swap in the state it produces.
    pub fn fire(&self, name: &str, args: &Args) -> Result<(), Error> {
        let entry = self.entry(name, |kind| kind == MemberKind::Transition, "transition")?;

        // Only one upgradable guard exists at a time, so concurrent
        // transitions are serialized while readers continue.
        let slot = self.slot.upgradable_read();
        let from = slot.index;
        let dispatch = self.supported(entry, name, from)?;
        let (Implementation::Transition(transition), Some(to)) =
            (&dispatch.implementation, dispatch.destination)
        else {
            return Err(wrong_kind(name, entry, "transition"));
        };
        let next = transition(slot.state.as_ref(), args)?;

        let mut slot = RwLockUpgradableReadGuard::upgrade(slot);
        slot.index = to;
        slot.state = Arc::from(next);
        if self.settings.record_history {
            let record = StateTransition {
                from: self.table.state_key(from).clone(),
                to: self.table.state_key(to).clone(),
                transition: name.to_string(),
                timestamp: Utc::now(),
            };
            slot.history.push_bounded(record, self.settings.history_limit);
        }
        drop(slot);

        trace!(
            host = self.table.host(),
            transition = name,
            from = %self.table.state_key(from),
            to = %self.table.state_key(to),
            "fired transition"
        );
        Ok(())
    }

    /// Kind-agnostic entry point: reads attributes and properties, calls
    /// methods and fires transitions. A fired transition yields `null`.
    pub fn invoke(&self, name: &str, args: &Args) -> Result<Value, Error> {
        let kind = self
            .table
            .entry(name)
            .map(|entry| entry.kind)
            .ok_or_else(|| self.unknown(name))?;
        match kind {
            MemberKind::Attribute | MemberKind::Property => self.get(name),
            MemberKind::Method => self.call(name, args),
            MemberKind::Transition => self.fire(name, args).map(|()| Value::Null),
        }
    }

    /// Snapshot of the recorded transitions.
    pub fn history(&self) -> StateHistory {
        self.slot.read().history.clone()
    }

    /// Run `f` against the held state if it is an `S`.
    pub fn with_state<S: Any, R>(&self, f: impl FnOnce(&S) -> R) -> Option<R> {
        let (_, state) = self.snapshot();
        state.downcast_ref::<S>().map(f)
    }

    pub fn is_in<S: Any>(&self) -> bool {
        self.table.index_of_type(TypeId::of::<S>()) == Some(self.slot.read().index)
    }

    fn snapshot(&self) -> (usize, Arc<AnyState>) {
        let slot = self.slot.read();
        (slot.index, Arc::clone(&slot.state))
    }

    fn entry(
        &self,
        name: &str,
        accepts: impl Fn(MemberKind) -> bool,
        expected: &'static str,
    ) -> Result<&DelegationEntry, Error> {
        let entry = self.table.entry(name).ok_or_else(|| self.unknown(name))?;
        if !accepts(entry.kind) {
            return Err(wrong_kind(name, entry, expected));
        }
        Ok(entry)
    }

    fn supported<'e>(
        &self,
        entry: &'e DelegationEntry,
        name: &str,
        index: usize,
    ) -> Result<&'e Dispatch, Error> {
        entry.for_state(index).ok_or_else(|| {
            StateError {
                host: self.table.host().to_string(),
                state: self.table.state_key(index).name().to_string(),
                member: name.to_string(),
            }
            .into()
        })
    }

    fn unknown(&self, name: &str) -> Error {
        MemberError::UnknownMember {
            host: self.table.host().to_string(),
            member: name.to_string(),
        }
        .into()
    }
}

fn wrong_kind(name: &str, entry: &DelegationEntry, expected: &'static str) -> Error {
    MemberError::WrongKind {
        member: name.to_string(),
        expected,
        actual: entry.kind,
    }
    .into()
}

impl fmt::Debug for HostBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let slot = self.slot.read();
        f.debug_struct("HostBinding")
            .field("host", &self.table.host())
            .field("state", self.table.state_key(slot.index))
            .field("transitions", &slot.history.len())
            .finish()
    }
}

/// A host value together with the state machine it carries.
///
/// Dereferences to the host, so the host's own fields and methods stay
/// directly reachable; machine members go through [`get`](Self::get),
/// [`call`](Self::call), [`fire`](Self::fire) and [`invoke`](Self::invoke).
pub struct Stateful<H> {
    host: H,
    binding: HostBinding,
}

impl<H> Stateful<H> {
    pub(crate) fn new(host: H, binding: HostBinding) -> Self {
        Self { host, binding }
    }

    pub fn current_state(&self) -> StateKey {
        self.binding.current_state()
    }

    /// Whether the held state is the Rust type `S`.
    pub fn is_in<S: Any>(&self) -> bool {
        self.binding.is_in::<S>()
    }

    /// Typed read access to the held state.
    pub fn with_state<S: Any, R>(&self, f: impl FnOnce(&S) -> R) -> Option<R> {
        self.binding.with_state(f)
    }

    pub fn supports(&self, name: &str) -> bool {
        self.binding.supports(name)
    }

    pub fn get(&self, name: &str) -> Result<Value, Error> {
        self.binding.get(name)
    }

    /// Read an attribute or property as `T`.
    pub fn get_as<T: DeserializeOwned>(&self, name: &str) -> Result<T, Error> {
        Ok(from_value(name, self.get(name)?)?)
    }

    pub fn call(&self, name: &str, args: &Args) -> Result<Value, Error> {
        self.binding.call(name, args)
    }

    /// Call a method and convert its result to `T`.
    pub fn call_as<T: DeserializeOwned>(&self, name: &str, args: &Args) -> Result<T, Error> {
        Ok(from_value(name, self.call(name, args)?)?)
    }

    pub fn fire(&self, name: &str, args: &Args) -> Result<(), Error> {
        self.binding.fire(name, args)
    }

    pub fn invoke(&self, name: &str, args: &Args) -> Result<Value, Error> {
        self.binding.invoke(name, args)
    }

    pub fn history(&self) -> StateHistory {
        self.binding.history()
    }

    /// States visited within the recorded history, ending with the held one.
    pub fn path(&self) -> Vec<StateKey> {
        let history = self.binding.history();
        if history.is_empty() {
            return vec![self.current_state()];
        }
        history.get_path().into_iter().cloned().collect()
    }

    pub fn binding(&self) -> &HostBinding {
        &self.binding
    }

    /// Drop the machine and return the bare host.
    pub fn into_host(self) -> H {
        self.host
    }
}

impl<H> Deref for Stateful<H> {
    type Target = H;

    fn deref(&self) -> &H {
        &self.host
    }
}

impl<H> DerefMut for Stateful<H> {
    fn deref_mut(&mut self) -> &mut H {
        &mut self.host
    }
}

impl<H: fmt::Debug> fmt::Debug for Stateful<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stateful")
            .field("host", &self.host)
            .field("state", &self.current_state())
            .finish()
    }
}
