//! Declaration model for state machines.
//!
//! This module contains the immutable descriptions the rest of the crate
//! works on:
//! - State identities and forward references (`StateKey`, `StateRef`)
//! - Keyword arguments for member calls (`Args`)
//! - Members and the declarations that own them
//! - Transition history

mod args;
mod declaration;
mod history;
mod key;
mod macros;
mod member;

pub(crate) use args::from_value;
pub use args::Args;
pub(crate) use declaration::Constructor;
pub use declaration::{Base, StateDeclaration};
pub use history::{StateHistory, StateTransition};
pub(crate) use key::short_type_name;
pub use key::{StateKey, StateRef};
pub(crate) use member::{projection, Implementation};
pub use member::{AnyState, Destination, MemberKind, StateMember};
