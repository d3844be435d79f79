//! Error types for declaring, resolving and driving state machines.

use crate::core::{MemberKind, StateKey};
use thiserror::Error;

fn join<T: ToString>(items: &[T]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Structural defects in a machine definition or in how it is applied to a
/// host type. Detected while registering, resolving or binding.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigError {
    #[error("State {0} is already registered")]
    DuplicateState(StateKey),

    #[error("State {0} names more than one Rust type")]
    AmbiguousIdentity(StateKey),

    #[error("Member '{member}' is already registered for state {state}")]
    DuplicateMember { state: StateKey, member: String },

    #[error("Registry was resolved and cannot be used anymore to register states or members")]
    RegistryResolved,

    #[error("There must be exactly one initial state, but none was declared")]
    MissingInitial,

    #[error("There must be exactly one initial state, but multiple were declared: {}", join(.0))]
    MultipleInitial(Vec<StateKey>),

    #[error("Declared initial state must not be abstract: {0}")]
    AbstractInitial(StateKey),

    #[error("Initial state {0} must be constructible without arguments")]
    InitialNotConstructible(StateKey),

    #[error("Abstract state {0} needs to define members. Otherwise, do not register it")]
    EmptyAbstract(StateKey),

    #[error("The following members are not implemented by any concrete state: {}", join(.0))]
    Unimplemented(Vec<String>),

    #[error("Member '{member}' is a {first} in one state and a {second} in another")]
    MemberKindConflict {
        member: String,
        first: MemberKind,
        second: MemberKind,
    },

    #[error("State {state} lists unknown base {base}")]
    UnknownBase { state: StateKey, base: StateKey },

    #[error("Bases of state {0} form a cycle")]
    CyclicBase(StateKey),

    #[error("Transition '{transition}' of state {state} leads to unknown state '{destination}'")]
    UnresolvedDestination {
        state: StateKey,
        transition: String,
        destination: String,
    },

    #[error("Transition '{transition}' of state {state} leads to abstract state {destination}")]
    AbstractDestination {
        state: StateKey,
        transition: String,
        destination: StateKey,
    },

    #[error(
        "Transition '{transition}' of state {state} declares destination {declared} but produces {produced}"
    )]
    DestinationMismatch {
        state: StateKey,
        transition: String,
        declared: StateKey,
        produced: StateKey,
    },

    #[error("There are states that cannot be reached by transitions from {initial}: {}", join(.unreachable))]
    Unreachable {
        initial: StateKey,
        unreachable: Vec<StateKey>,
    },

    #[error("Cannot add member '{member}' to {host} as it already has a member with this name")]
    HostMemberCollision { host: String, member: String },

    #[error("Host type {0} is already bound to a different state machine")]
    AlreadyBound(String),

    #[error("Value of type {0} is not a concrete state of this machine")]
    ForeignState(String),

    #[error("Setting {key} has invalid value '{value}', expected {expected}")]
    InvalidSetting {
        key: String,
        value: String,
        expected: &'static str,
    },
}

/// The state currently held by a host does not support the requested member.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Member {member} is not available on class {host} in state {state}.")]
pub struct StateError {
    pub host: String,
    pub state: String,
    pub member: String,
}

/// Failures raised by member bodies, argument extraction and misuse of the
/// delegation entry points.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum MemberError {
    #[error("Missing argument '{0}'")]
    MissingArgument(String),

    #[error("Argument '{name}' is invalid: {reason}")]
    InvalidArgument { name: String, reason: String },

    #[error("Value of member '{member}' could not be converted: {reason}")]
    Conversion { member: String, reason: String },

    #[error("No member named '{member}' on {host}")]
    UnknownMember { host: String, member: String },

    #[error("Member '{member}' is a {actual}, not a {expected}")]
    WrongKind {
        member: String,
        expected: &'static str,
        actual: MemberKind,
    },

    #[error("Member '{member}' was invoked on a state that is not a {expected}")]
    StateMismatch {
        member: String,
        expected: &'static str,
    },

    #[error("{0}")]
    Failed(String),
}

impl MemberError {
    /// Failure reported by application code inside a member body.
    pub fn failed(message: impl Into<String>) -> Self {
        MemberError::Failed(message.into())
    }
}

/// Any error surfaced by the crate.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    State(#[from] StateError),

    #[error(transparent)]
    Member(#[from] MemberError),
}
