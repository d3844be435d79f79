//! The resolved, validated state machine.

use crate::binder::{Binder, BoundType, Host};
use crate::core::{MemberKind, StateDeclaration, StateKey, StateMember};
use crate::error::ConfigError;
use crate::resolver::Declarations;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};
use uuid::Uuid;

/// A frozen state machine.
///
/// Only concrete states are kept; the initial state comes first, the others
/// follow in declaration order. Abstract declarations survive only through
/// the members they contributed.
#[derive(Clone, Debug)]
pub struct StateMachineDefinition {
    id: Uuid,
    states: Vec<StateDeclaration>,
    index: HashMap<StateKey, usize>,
}

impl StateMachineDefinition {
    pub(crate) fn freeze(declarations: Declarations, initial: &StateKey) -> Self {
        let (mut states, rest): (Vec<_>, Vec<_>) = declarations
            .into_values()
            .filter(StateDeclaration::is_concrete)
            .partition(|d| d.key() == initial);
        states.extend(rest);

        let index = states
            .iter()
            .enumerate()
            .map(|(i, d)| (d.key().clone(), i))
            .collect();

        Self {
            id: Uuid::new_v4(),
            states,
            index,
        }
    }

    /// Identity of this resolution. Two resolutions never share an id.
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn initial(&self) -> &StateDeclaration {
        &self.states[0]
    }

    /// Concrete states, initial first.
    pub fn states(&self) -> &[StateDeclaration] {
        &self.states
    }

    pub fn state(&self, key: &StateKey) -> Option<&StateDeclaration> {
        self.index.get(key).map(|&i| &self.states[i])
    }

    pub fn contains(&self, key: &StateKey) -> bool {
        self.index.contains_key(key)
    }

    pub(crate) fn index_of(&self, key: &StateKey) -> Option<usize> {
        self.index.get(key).copied()
    }

    /// Member names supported by each concrete state.
    pub fn implementation_map(&self) -> HashMap<StateKey, BTreeSet<String>> {
        self.states
            .iter()
            .map(|d| {
                let names = d.member_names().map(str::to_string).collect();
                (d.key().clone(), names)
            })
            .collect()
    }

    /// Whether the state `key` implements the member `name`.
    pub fn supports(&self, key: &StateKey, name: &str) -> bool {
        self.state(key).is_some_and(|d| d.has_member(name))
    }

    /// Whether any state implements the member `name`.
    pub fn has_member(&self, name: &str) -> bool {
        self.states.iter().any(|d| d.has_member(name))
    }

    /// Every member name across the machine, in first-declared order.
    pub fn member_names(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.states
            .iter()
            .flat_map(StateDeclaration::member_names)
            .filter(|name| seen.insert(*name))
            .collect()
    }

    /// One member per name, listed attributes first, then properties,
    /// methods and transitions. Within a kind, declaration order is kept.
    pub fn ordered_members(&self) -> Vec<&StateMember> {
        let mut seen = HashSet::new();
        let mut members: Vec<&StateMember> = self
            .states
            .iter()
            .flat_map(StateDeclaration::members)
            .filter(|member| seen.insert(member.name()))
            .collect();
        members.sort_by_key(|member| member.kind());
        members
    }

    /// Serializable description of the machine for documentation tooling.
    pub fn summary(&self) -> MachineSummary {
        let states = self
            .states
            .iter()
            .map(|d| StateSummary {
                key: d.key().clone(),
                initial: d.is_initial(),
                members: d
                    .members()
                    .map(|member| MemberSummary {
                        name: member.name().to_string(),
                        kind: member.kind(),
                        type_tag: member.type_tag().map(str::to_string),
                        declared_on: member.declaring_state().clone(),
                    })
                    .collect(),
            })
            .collect();

        let transitions = self
            .states
            .iter()
            .flat_map(|d| {
                d.transitions().filter_map(move |transition| {
                    transition.destination().map(|destination| TransitionSummary {
                        from: d.key().clone(),
                        name: transition.name().to_string(),
                        to: destination.produces().clone(),
                    })
                })
            })
            .collect();

        MachineSummary {
            id: self.id,
            initial: self.initial().key().clone(),
            states,
            transitions,
        }
    }

    /// Bind this machine to the host type `H`.
    pub fn bind<H: Host>(&self) -> Result<BoundType<H>, ConfigError> {
        Binder::bind(self)
    }
}

/// Serializable view of a [`StateMachineDefinition`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MachineSummary {
    pub id: Uuid,
    pub initial: StateKey,
    pub states: Vec<StateSummary>,
    pub transitions: Vec<TransitionSummary>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StateSummary {
    pub key: StateKey,
    pub initial: bool,
    pub members: Vec<MemberSummary>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MemberSummary {
    pub name: String,
    pub kind: MemberKind,
    pub type_tag: Option<String>,
    pub declared_on: StateKey,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransitionSummary {
    pub from: StateKey,
    pub name: String,
    pub to: StateKey,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Args;
    use crate::registry::{StateRegistry, StateSpec};
    use pretty_assertions::assert_eq;

    #[derive(Default)]
    struct Draft;

    struct Review {
        reviewer: String,
    }

    struct Published;

    fn machine() -> StateMachineDefinition {
        let mut registry = StateRegistry::new();
        registry
            .state(StateSpec::<Published>::new())
            .unwrap()
            .state(
                StateSpec::<Review>::new()
                    .attribute("reviewer", |s: &Review| s.reviewer.clone()),
            )
            .unwrap()
            .state(StateSpec::<Draft>::new().initial())
            .unwrap()
            .transition("publish", |_: &Review, _: &Args| Ok(Published))
            .unwrap()
            .method("comment", |s: &Review, args: &Args| {
                Ok(format!("{}: {}", s.reviewer, args.get::<String>("text")?))
            })
            .unwrap()
            .property("editable", |_: &Draft| true)
            .unwrap()
            .transition("submit", |_: &Draft, args: &Args| {
                Ok(Review {
                    reviewer: args.get("reviewer")?,
                })
            })
            .unwrap();
        registry.resolve().unwrap()
    }

    #[test]
    fn initial_state_comes_first() {
        let machine = machine();
        let names: Vec<_> = machine.states().iter().map(|d| d.key().name()).collect();

        assert_eq!(names, vec!["Draft", "Published", "Review"]);
        assert_eq!(machine.initial().key(), &StateKey::of::<Draft>());
    }

    #[test]
    fn ordered_members_follow_kind_priority() {
        let machine = machine();
        let names: Vec<_> = machine
            .ordered_members()
            .iter()
            .map(|member| member.name())
            .collect();

        assert_eq!(
            names,
            vec!["reviewer", "editable", "comment", "submit", "publish"]
        );
    }

    #[test]
    fn implementation_map_lists_members_per_state() {
        let machine = machine();
        let map = machine.implementation_map();

        let review: Vec<_> = map[&StateKey::of::<Review>()].iter().cloned().collect();
        assert_eq!(review, vec!["comment", "publish", "reviewer"]);
        assert!(map[&StateKey::of::<Published>()].is_empty());
        assert!(machine.supports(&StateKey::of::<Draft>(), "submit"));
        assert!(!machine.supports(&StateKey::of::<Draft>(), "publish"));
        assert!(machine.has_member("publish"));
    }

    #[test]
    fn summary_serializes_transitions() {
        let summary = machine().summary();

        assert_eq!(summary.initial, StateKey::of::<Draft>());
        assert_eq!(
            summary
                .transitions
                .iter()
                .map(|t| (t.from.name(), t.name.as_str(), t.to.name()))
                .collect::<Vec<_>>(),
            vec![("Draft", "submit", "Review"), ("Review", "publish", "Published")]
        );

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["states"][0]["members"][0]["kind"], "Property");
    }

    #[test]
    fn every_resolution_has_its_own_id() {
        assert_ne!(machine().id(), machine().id());
    }
}
