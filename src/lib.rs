//! Statehold: declarative state machines bound to host types
//!
//! States are plain Rust types. Their attributes, properties, methods and
//! transitions are declared once in a registry, the registry is resolved into
//! a validated machine, and the machine is bound to a host type. Every member
//! access on a host instance is then forwarded to whichever state it holds.
//!
//! # Core Concepts
//!
//! - **Declarations**: states and their members, collected by `StateRegistry`
//! - **Resolution**: composition between states, completeness, a single
//!   initial state and full reachability are all checked up front
//! - **Delegation**: a host only reaches the members of its current state;
//!   anything else fails with a `StateError`
//! - **History**: every fired transition is recorded
//!
//! # Example
//!
//! ```rust
//! use statehold::{args, Args, Error, Host, StateRegistry, StateSpec};
//!
//! #[derive(Default)]
//! struct Demanded;
//!
//! struct Ordered {
//!     cost: f64,
//! }
//!
//! struct Article;
//!
//! impl Host for Article {}
//!
//! let mut registry = StateRegistry::new();
//! registry
//!     .state(StateSpec::<Demanded>::new().initial())?
//!     .state(StateSpec::<Ordered>::new().attribute("cost", |s: &Ordered| s.cost))?
//!     .transition("order", |_: &Demanded, args: &Args| {
//!         Ok(Ordered { cost: args.get("cost")? })
//!     })?;
//!
//! let articles = registry.resolve()?.bind::<Article>()?;
//! let article = articles.construct(Article);
//!
//! assert!(matches!(article.get("cost"), Err(Error::State(_))));
//!
//! article.fire("order", &args! { "cost" => 3.59 })?;
//! assert_eq!(article.get_as::<f64>("cost")?, 3.59);
//! # Ok::<(), Error>(())
//! ```

pub mod binder;
pub mod core;
pub mod definition;
pub mod error;
pub mod registry;
pub(crate) mod resolver;
pub mod settings;

// Re-export commonly used types
pub use binder::{Binder, BoundType, Host, HostBinding, Stateful};
pub use core::{
    Args, Base, Destination, MemberKind, StateDeclaration, StateHistory, StateKey,
    StateMember, StateRef, StateTransition,
};
pub use definition::{
    MachineSummary, MemberSummary, StateMachineDefinition, StateSummary, TransitionSummary,
};
pub use error::{ConfigError, Error, MemberError, StateError};
pub use registry::{ClassFacts, ClassRegistry, MemberRegistry, StateRegistry, StateSpec};
pub use settings::Settings;
