//! Turns the two flat registries into one validated machine.
//!
//! Resolution runs in fixed passes; the first violation found is returned:
//!
//! 1. match class facts and member facts by identity
//! 2. merge members of bases into derived declarations
//! 3. check completeness (no empty abstracts, no unimplemented members)
//! 4. check there is exactly one usable initial state
//! 5. resolve transition destinations against the full identity table
//! 6. check every concrete state is reachable from the initial one
//!
//! The result is frozen into a [`StateMachineDefinition`].

mod inheritance;
mod reachability;
mod validate;

use crate::core::{StateDeclaration, StateKey, StateMember};
use crate::definition::StateMachineDefinition;
use crate::error::ConfigError;
use crate::registry::{ClassRegistry, MemberRegistry};
use indexmap::IndexMap;
use tracing::debug;

pub(crate) type Declarations = IndexMap<StateKey, StateDeclaration>;

pub(crate) struct Resolver<'a> {
    classes: &'a ClassRegistry,
    members: &'a MemberRegistry,
}

impl<'a> Resolver<'a> {
    pub(crate) fn new(classes: &'a ClassRegistry, members: &'a MemberRegistry) -> Self {
        Self { classes, members }
    }

    pub(crate) fn resolve(&self) -> Result<StateMachineDefinition, ConfigError> {
        let declarations = self.matched()?;
        let declarations = inheritance::compose(declarations)?;
        validate::completeness(&declarations)?;
        let initial = validate::initial(&declarations)?;
        let declarations = validate::destinations(&declarations)?;
        reachability::check(&declarations, &initial)?;

        let definition = StateMachineDefinition::freeze(declarations, &initial);
        debug!(
            machine = %definition.id(),
            initial = %initial,
            states = definition.states().len(),
            "resolved state machine"
        );
        Ok(definition)
    }

    // Class facts first, in registration order, then identities that only
    // have members. The latter can only serve as bases.
    fn matched(&self) -> Result<Declarations, ConfigError> {
        let mut declarations = Declarations::new();

        for facts in self.classes.iter() {
            let mut members = facts.attributes.clone();
            for (name, member) in self.members.take(&facts.key) {
                if member.declaring_type() != facts.type_id {
                    return Err(ConfigError::AmbiguousIdentity(facts.key.clone()));
                }
                if members.contains_key(&name) {
                    return Err(ConfigError::DuplicateMember {
                        state: facts.key.clone(),
                        member: name,
                    });
                }
                members.insert(name, member);
            }

            declarations.insert(
                facts.key.clone(),
                StateDeclaration {
                    key: facts.key.clone(),
                    type_id: Some(facts.type_id),
                    is_initial: facts.initial,
                    is_abstract: facts.is_abstract,
                    members,
                    bases: facts.bases.clone(),
                    constructor: facts.constructor.clone(),
                },
            );
        }

        for key in self.members.keys() {
            if !declarations.contains_key(key) {
                let members = self.members.take(key);
                let mut types = members.values().map(StateMember::declaring_type);
                if let Some(first) = types.next() {
                    if types.any(|type_id| type_id != first) {
                        return Err(ConfigError::AmbiguousIdentity(key.clone()));
                    }
                }
                declarations.insert(key.clone(), StateDeclaration::mixin(key.clone(), members));
            }
        }

        Ok(declarations)
    }
}
