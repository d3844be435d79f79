//! Structural checks over composed declarations.

use super::Declarations;
use crate::core::{Destination, MemberKind, StateDeclaration, StateKey, StateMember};
use crate::error::ConfigError;
use std::collections::{HashMap, HashSet};
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;

/// Abstract declarations must contribute something, member names must keep
/// one kind across the concrete states, and every member needs a concrete
/// implementation. Unimplemented members are collected and reported
/// together.
///
/// Kinds are compared on effective members only: a derived state that
/// replaces a base member with one of another kind overrides it.
pub(super) fn completeness(declarations: &Declarations) -> Result<(), ConfigError> {
    if let Some(empty) = declarations
        .values()
        .find(|d| d.is_abstract() && d.members.is_empty())
    {
        return Err(ConfigError::EmptyAbstract(empty.key().clone()));
    }

    let mut kinds: HashMap<&str, MemberKind> = HashMap::new();
    for member in declarations
        .values()
        .filter(|d| d.is_concrete())
        .flat_map(StateDeclaration::members)
    {
        match kinds.get(member.name()) {
            Some(&first) if !compatible(first, member.kind()) => {
                return Err(ConfigError::MemberKindConflict {
                    member: member.name().to_string(),
                    first,
                    second: member.kind(),
                });
            }
            Some(_) => {}
            None => {
                kinds.insert(member.name(), member.kind());
            }
        }
    }

    let mut names: Vec<&str> = Vec::new();
    for name in declarations.values().flat_map(StateDeclaration::member_names) {
        if !names.contains(&name) {
            names.push(name);
        }
    }

    let implemented: HashSet<&str> = declarations
        .values()
        .filter(|d| d.is_concrete())
        .flat_map(StateDeclaration::member_names)
        .collect();

    let checks: Vec<Validation<(), NonEmptyVec<String>>> = names
        .into_iter()
        .map(|name| {
            if implemented.contains(name) {
                Validation::success(())
            } else {
                Validation::fail(name.to_string())
            }
        })
        .collect();

    match Validation::all_vec(checks) {
        Validation::Success(_) => Ok(()),
        Validation::Failure(missing) => Err(ConfigError::Unimplemented(
            missing.iter().cloned().collect(),
        )),
    }
}

// Attributes and properties are both read like fields, so one state may
// store what another computes.
fn compatible(first: MemberKind, second: MemberKind) -> bool {
    first == second || (first.is_readable() && second.is_readable())
}

/// Key of the single initial declaration, which must be concrete and
/// constructible without arguments.
pub(super) fn initial(declarations: &Declarations) -> Result<StateKey, ConfigError> {
    let initials: Vec<&StateDeclaration> =
        declarations.values().filter(|d| d.is_initial()).collect();

    match initials.as_slice() {
        [] => Err(ConfigError::MissingInitial),
        [initial] if initial.is_abstract() => {
            Err(ConfigError::AbstractInitial(initial.key().clone()))
        }
        [initial] if !initial.is_constructible() => {
            Err(ConfigError::InitialNotConstructible(initial.key().clone()))
        }
        [initial] => Ok(initial.key().clone()),
        many => Err(ConfigError::MultipleInitial(
            many.iter().map(|d| d.key().clone()).collect(),
        )),
    }
}

/// Resolve every transition destination against the full identity table.
///
/// Bare names are looked up in the namespace of the state that declared the
/// transition. The resolved destination must be concrete and must be the
/// state the transition body actually returns.
pub(super) fn destinations(declarations: &Declarations) -> Result<Declarations, ConfigError> {
    let mut resolved = Declarations::with_capacity(declarations.len());

    for (key, declaration) in declarations {
        let mut members = declaration.members.clone();
        for member in members.values_mut() {
            if let Some(destination) = member.destination() {
                let target = destination_of(declarations, member, destination)?;
                *member = member.clone().with_resolved_destination(target);
            }
        }
        resolved.insert(key.clone(), declaration.clone().with_members(members));
    }

    Ok(resolved)
}

fn destination_of(
    declarations: &Declarations,
    member: &StateMember,
    destination: &Destination,
) -> Result<StateKey, ConfigError> {
    let owner = member.declaring_state();
    let target = destination.declared().resolve_in(owner.namespace());

    let Some(found) = declarations.get(&target) else {
        return Err(ConfigError::UnresolvedDestination {
            state: owner.clone(),
            transition: member.name().to_string(),
            destination: destination.declared().to_string(),
        });
    };
    if found.is_abstract() {
        return Err(ConfigError::AbstractDestination {
            state: owner.clone(),
            transition: member.name().to_string(),
            destination: target,
        });
    }
    if &target != destination.produces() {
        return Err(ConfigError::DestinationMismatch {
            state: owner.clone(),
            transition: member.name().to_string(),
            declared: target,
            produced: destination.produces().clone(),
        });
    }

    Ok(target)
}
