//! State declarations: the nodes of a state machine.

use super::key::StateKey;
use super::member::{AnyState, MemberKind, Projection, StateMember};
use indexmap::IndexMap;
use std::any::TypeId;
use std::fmt;
use std::sync::Arc;

/// Builds a fresh value of a state that needs no arguments.
pub(crate) type Constructor = Arc<dyn Fn() -> Box<AnyState> + Send + Sync>;

/// A base a declaration takes members from, and how to reach the base's
/// value from inside the derived state.
#[derive(Clone)]
pub struct Base {
    pub(crate) key: StateKey,
    pub(crate) projection: Projection,
}

impl Base {
    pub fn key(&self) -> &StateKey {
        &self.key
    }
}

impl fmt::Debug for Base {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Base").field(&self.key).finish()
    }
}

/// One named node of a state machine.
///
/// Before resolution `members` holds what was declared for the state itself.
/// After resolution it holds the effective members, including those merged
/// in from bases.
#[derive(Clone)]
pub struct StateDeclaration {
    pub(crate) key: StateKey,
    pub(crate) type_id: Option<TypeId>,
    pub(crate) is_initial: bool,
    pub(crate) is_abstract: bool,
    pub(crate) members: IndexMap<String, StateMember>,
    pub(crate) bases: Vec<Base>,
    pub(crate) constructor: Option<Constructor>,
}

impl StateDeclaration {
    /// Declaration that only contributes members to others.
    pub(crate) fn mixin(key: StateKey, members: IndexMap<String, StateMember>) -> Self {
        Self {
            key,
            type_id: None,
            is_initial: false,
            is_abstract: true,
            members,
            bases: Vec::new(),
            constructor: None,
        }
    }

    pub fn key(&self) -> &StateKey {
        &self.key
    }

    pub fn is_initial(&self) -> bool {
        self.is_initial
    }

    pub fn is_abstract(&self) -> bool {
        self.is_abstract
    }

    pub fn is_concrete(&self) -> bool {
        !self.is_abstract
    }

    /// Whether the state can be built without any arguments.
    pub fn is_constructible(&self) -> bool {
        self.constructor.is_some()
    }

    pub fn bases(&self) -> &[Base] {
        &self.bases
    }

    pub fn members(&self) -> impl Iterator<Item = &StateMember> {
        self.members.values()
    }

    pub fn member(&self, name: &str) -> Option<&StateMember> {
        self.members.get(name)
    }

    pub fn has_member(&self, name: &str) -> bool {
        self.members.contains_key(name)
    }

    pub fn member_names(&self) -> impl Iterator<Item = &str> {
        self.members.keys().map(String::as_str)
    }

    pub fn transitions(&self) -> impl Iterator<Item = &StateMember> {
        self.members
            .values()
            .filter(|member| member.kind() == MemberKind::Transition)
    }

    pub(crate) fn with_members(mut self, members: IndexMap<String, StateMember>) -> Self {
        self.members = members;
        self
    }
}

impl fmt::Debug for StateDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateDeclaration")
            .field("key", &self.key)
            .field("is_initial", &self.is_initial)
            .field("is_abstract", &self.is_abstract)
            .field("members", &self.members.keys().collect::<Vec<_>>())
            .field("bases", &self.bases)
            .finish()
    }
}
