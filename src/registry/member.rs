//! Member-level facts: methods, properties and transitions per state.

use crate::core::{StateKey, StateMember};
use crate::error::ConfigError;
use indexmap::IndexMap;

/// Collects members, keyed by the identity of the state declaring them.
///
/// Transition destinations are kept exactly as declared; they are resolved
/// once every state is known.
#[derive(Clone, Debug, Default)]
pub struct MemberRegistry {
    members: IndexMap<StateKey, IndexMap<String, StateMember>>,
}

impl MemberRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a member under its declaring state.
    pub fn register(&mut self, member: StateMember) -> Result<(), ConfigError> {
        let owner = self
            .members
            .entry(member.declaring_state().clone())
            .or_default();
        if owner.contains_key(member.name()) {
            return Err(ConfigError::DuplicateMember {
                state: member.declaring_state().clone(),
                member: member.name().to_string(),
            });
        }
        owner.insert(member.name().to_string(), member);
        Ok(())
    }

    /// Members declared for `key`, in registration order.
    pub fn members_of(&self, key: &StateKey) -> impl Iterator<Item = &StateMember> {
        self.members.get(key).into_iter().flat_map(|m| m.values())
    }

    pub fn contains(&self, key: &StateKey) -> bool {
        self.members.contains_key(key)
    }

    /// Identities with at least one member, in registration order.
    pub fn keys(&self) -> impl Iterator<Item = &StateKey> {
        self.members.keys()
    }

    pub(crate) fn take(&self, key: &StateKey) -> IndexMap<String, StateMember> {
        self.members.get(key).cloned().unwrap_or_default()
    }
}
