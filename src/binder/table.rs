//! Delegation table shared by every instance of a bound host type.

use crate::core::{AnyState, Constructor, Implementation, MemberKind, StateKey, StateMember};
use crate::definition::StateMachineDefinition;
use crate::error::ConfigError;
use indexmap::IndexMap;
use std::any::TypeId;
use std::collections::HashMap;
use uuid::Uuid;

/// How one state implements a member. Transitions also carry the index of
/// the state they produce.
#[derive(Clone)]
pub(crate) struct Dispatch {
    pub(crate) implementation: Implementation,
    pub(crate) destination: Option<usize>,
}

/// Every implementation of one member name, keyed by state index.
#[derive(Clone)]
pub(crate) struct DelegationEntry {
    pub(crate) kind: MemberKind,
    pub(crate) dispatch: HashMap<usize, Dispatch>,
}

impl DelegationEntry {
    /// Capability check for the state at `index`.
    pub(crate) fn for_state(&self, index: usize) -> Option<&Dispatch> {
        self.dispatch.get(&index)
    }
}

pub(crate) struct DelegationTable {
    machine_id: Uuid,
    host: String,
    states: Vec<StateKey>,
    by_type: HashMap<TypeId, usize>,
    initial: usize,
    constructor: Constructor,
    entries: IndexMap<String, DelegationEntry>,
}

impl DelegationTable {
    pub(crate) fn build(
        definition: &StateMachineDefinition,
        host: String,
    ) -> Result<Self, ConfigError> {
        let initial = definition.initial();
        let constructor = initial
            .constructor
            .clone()
            .ok_or_else(|| ConfigError::InitialNotConstructible(initial.key().clone()))?;

        let mut entries: IndexMap<String, DelegationEntry> = IndexMap::new();
        let mut by_type = HashMap::new();
        for (index, declaration) in definition.states().iter().enumerate() {
            if let Some(type_id) = declaration.type_id {
                by_type.insert(type_id, index);
            }
            for member in declaration.members() {
                let dispatch = Dispatch {
                    implementation: member.implementation().clone(),
                    destination: destination_index(definition, member),
                };
                entries
                    .entry(member.name().to_string())
                    .or_insert_with(|| DelegationEntry {
                        kind: member.kind(),
                        dispatch: HashMap::new(),
                    })
                    .dispatch
                    .insert(index, dispatch);
            }
        }

        Ok(Self {
            machine_id: definition.id(),
            host,
            states: definition.states().iter().map(|d| d.key().clone()).collect(),
            by_type,
            initial: 0,
            constructor,
            entries,
        })
    }

    pub(crate) fn machine_id(&self) -> Uuid {
        self.machine_id
    }

    /// Short type name of the host, as used in error messages.
    pub(crate) fn host(&self) -> &str {
        &self.host
    }

    pub(crate) fn states(&self) -> &[StateKey] {
        &self.states
    }

    pub(crate) fn state_key(&self, index: usize) -> &StateKey {
        &self.states[index]
    }

    pub(crate) fn index_of_type(&self, type_id: TypeId) -> Option<usize> {
        self.by_type.get(&type_id).copied()
    }

    pub(crate) fn entry(&self, name: &str) -> Option<&DelegationEntry> {
        self.entries.get(name)
    }

    pub(crate) fn member_names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// A fresh initial state and its index.
    pub(crate) fn construct_initial(&self) -> (usize, Box<AnyState>) {
        (self.initial, (self.constructor)())
    }
}

fn destination_index(definition: &StateMachineDefinition, member: &StateMember) -> Option<usize> {
    member
        .destination()
        .and_then(|destination| definition.index_of(destination.produces()))
}
