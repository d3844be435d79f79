//! Composition between declarations.
//!
//! A declaration takes over the effective members of each of its bases,
//! reached through the base's projection. Bases are merged in the order they
//! were listed, so a later base overrides an earlier one, and the
//! declaration's own members override everything inherited.

use super::Declarations;
use crate::core::{StateKey, StateMember};
use crate::error::ConfigError;
use indexmap::IndexMap;
use std::collections::HashMap;
use tracing::trace;

type Members = IndexMap<String, StateMember>;

/// Replace the members of every declaration with its effective members.
pub(super) fn compose(declarations: Declarations) -> Result<Declarations, ConfigError> {
    let mut done = HashMap::new();
    let mut visiting = Vec::new();
    for key in declarations.keys() {
        effective_members(&declarations, key, &mut done, &mut visiting)?;
    }

    Ok(declarations
        .into_iter()
        .map(|(key, declaration)| {
            let members = done.remove(&key).unwrap_or_default();
            (key, declaration.with_members(members))
        })
        .collect())
}

fn effective_members(
    declarations: &Declarations,
    key: &StateKey,
    done: &mut HashMap<StateKey, Members>,
    visiting: &mut Vec<StateKey>,
) -> Result<Members, ConfigError> {
    if let Some(members) = done.get(key) {
        return Ok(members.clone());
    }
    if visiting.contains(key) {
        return Err(ConfigError::CyclicBase(key.clone()));
    }
    let Some(declaration) = declarations.get(key) else {
        return Ok(Members::new());
    };

    visiting.push(key.clone());
    let mut merged = Members::new();
    for base in declaration.bases() {
        if !declarations.contains_key(base.key()) {
            return Err(ConfigError::UnknownBase {
                state: key.clone(),
                base: base.key().clone(),
            });
        }
        for (name, member) in effective_members(declarations, base.key(), done, visiting)? {
            trace!(state = %key, base = %base.key(), member = %name, "merging inherited member");
            merged.insert(name, member.projected(&base.projection));
        }
    }
    for (name, member) in &declaration.members {
        merged.insert(name.clone(), member.clone());
    }
    visiting.pop();

    done.insert(key.clone(), merged.clone());
    Ok(merged)
}
