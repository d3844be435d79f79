//! State members: attributes, properties, methods and transitions.
//!
//! Members are stored type-erased so that declarations of different state
//! types can live in one registry. Each typed constructor downcasts the held
//! state back to the concrete type it was declared for.

use super::args::{to_value, Args};
use super::key::{StateKey, StateRef};
use crate::error::MemberError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::any::{type_name, Any, TypeId};
use std::fmt;
use std::sync::Arc;

/// A state value as held by a host.
pub type AnyState = dyn Any + Send + Sync;

pub(crate) type ReadFn = Arc<dyn Fn(&AnyState) -> Result<Value, MemberError> + Send + Sync>;
pub(crate) type CallFn =
    Arc<dyn Fn(&AnyState, &Args) -> Result<Value, MemberError> + Send + Sync>;
pub(crate) type TransitionFn =
    Arc<dyn Fn(&AnyState, &Args) -> Result<Box<AnyState>, MemberError> + Send + Sync>;

/// Maps a derived state value onto the embedded value its base operates on.
pub(crate) type Projection =
    Arc<dyn for<'a> Fn(&'a AnyState) -> Option<&'a AnyState> + Send + Sync>;

pub(crate) fn projection<F>(f: F) -> Projection
where
    F: for<'a> Fn(&'a AnyState) -> Option<&'a AnyState> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Kind of a state member.
///
/// The ordering is the priority used when members are listed for
/// documentation: attributes, then properties, methods, transitions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MemberKind {
    Attribute,
    Property,
    Method,
    Transition,
}

impl MemberKind {
    /// Attributes and properties are both read like fields.
    pub fn is_readable(self) -> bool {
        matches!(self, MemberKind::Attribute | MemberKind::Property)
    }
}

impl fmt::Display for MemberKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MemberKind::Attribute => "attribute",
            MemberKind::Property => "property",
            MemberKind::Method => "method",
            MemberKind::Transition => "transition",
        })
    }
}

#[derive(Clone)]
pub(crate) enum Implementation {
    Read(ReadFn),
    Call(CallFn),
    Transition(TransitionFn),
}

impl Implementation {
    // Applies the member to the value found through `projection`.
    fn projected(&self, member: &str, projection: &Projection) -> Self {
        let member = member.to_string();
        let projection = Arc::clone(projection);
        match self {
            Implementation::Read(read) => {
                let read = Arc::clone(read);
                Implementation::Read(Arc::new(move |state: &AnyState| {
                    read(project(&projection, &member, state)?)
                }))
            }
            Implementation::Call(call) => {
                let call = Arc::clone(call);
                Implementation::Call(Arc::new(move |state: &AnyState, args: &Args| {
                    call(project(&projection, &member, state)?, args)
                }))
            }
            Implementation::Transition(transition) => {
                let transition = Arc::clone(transition);
                Implementation::Transition(Arc::new(move |state: &AnyState, args: &Args| {
                    transition(project(&projection, &member, state)?, args)
                }))
            }
        }
    }
}

fn project<'a>(
    projection: &Projection,
    member: &str,
    state: &'a AnyState,
) -> Result<&'a AnyState, MemberError> {
    projection(state).ok_or_else(|| MemberError::StateMismatch {
        member: member.to_string(),
        expected: "composed state",
    })
}

fn downcast<'a, S: Any>(member: &str, state: &'a AnyState) -> Result<&'a S, MemberError> {
    state
        .downcast_ref::<S>()
        .ok_or_else(|| MemberError::StateMismatch {
            member: member.to_string(),
            expected: type_name::<S>(),
        })
}

/// Declared destination of a transition.
#[derive(Clone, Debug, PartialEq)]
pub struct Destination {
    declared: StateRef,
    produces: StateKey,
}

impl Destination {
    /// Destination as written in the declaration.
    pub fn declared(&self) -> &StateRef {
        &self.declared
    }

    /// State the transition body actually returns.
    pub fn produces(&self) -> &StateKey {
        &self.produces
    }
}

/// One member of a state declaration.
#[derive(Clone)]
pub struct StateMember {
    name: String,
    declaring_state: StateKey,
    declaring_type: TypeId,
    kind: MemberKind,
    type_tag: Option<&'static str>,
    destination: Option<Destination>,
    implementation: Implementation,
}

impl StateMember {
    /// Declared data of state `S`, read through `getter`.
    pub fn attribute<S, T, F>(name: impl Into<String>, getter: F) -> Self
    where
        S: Any + Send + Sync,
        T: Serialize + 'static,
        F: Fn(&S) -> T + Send + Sync + 'static,
    {
        let name = name.into();
        let member = name.clone();
        let read: ReadFn = Arc::new(move |state: &AnyState| {
            to_value(&member, getter(downcast::<S>(&member, state)?))
        });
        Self::declared_on::<S>(
            name,
            MemberKind::Attribute,
            Some(type_name::<T>()),
            None,
            Implementation::Read(read),
        )
    }

    /// Computed, read-only field of state `S`.
    pub fn property<S, T, F>(name: impl Into<String>, compute: F) -> Self
    where
        S: Any + Send + Sync,
        T: Serialize + 'static,
        F: Fn(&S) -> T + Send + Sync + 'static,
    {
        let name = name.into();
        let member = name.clone();
        let read: ReadFn = Arc::new(move |state: &AnyState| {
            to_value(&member, compute(downcast::<S>(&member, state)?))
        });
        Self::declared_on::<S>(
            name,
            MemberKind::Property,
            Some(type_name::<T>()),
            None,
            Implementation::Read(read),
        )
    }

    /// Method of state `S`, called with the caller's arguments.
    pub fn method<S, T, F>(name: impl Into<String>, body: F) -> Self
    where
        S: Any + Send + Sync,
        T: Serialize + 'static,
        F: Fn(&S, &Args) -> Result<T, MemberError> + Send + Sync + 'static,
    {
        let name = name.into();
        let member = name.clone();
        let call: CallFn = Arc::new(move |state: &AnyState, args: &Args| {
            to_value(&member, body(downcast::<S>(&member, state)?, args)?)
        });
        Self::declared_on::<S>(
            name,
            MemberKind::Method,
            Some(type_name::<T>()),
            None,
            Implementation::Call(call),
        )
    }

    /// Transition from state `S` producing a new `D` state.
    ///
    /// `destination` is the declared target; it may be a forward reference
    /// and must resolve to `D` when the machine is resolved.
    pub fn transition<S, D, F>(
        name: impl Into<String>,
        destination: impl Into<StateRef>,
        body: F,
    ) -> Self
    where
        S: Any + Send + Sync,
        D: Any + Send + Sync,
        F: Fn(&S, &Args) -> Result<D, MemberError> + Send + Sync + 'static,
    {
        let name = name.into();
        let member = name.clone();
        let destination = Destination {
            declared: destination.into(),
            produces: StateKey::of::<D>(),
        };
        let transition: TransitionFn = Arc::new(move |state: &AnyState, args: &Args| {
            let next = body(downcast::<S>(&member, state)?, args)?;
            Ok(Box::new(next) as Box<AnyState>)
        });
        Self::declared_on::<S>(
            name,
            MemberKind::Transition,
            None,
            Some(destination),
            Implementation::Transition(transition),
        )
    }

    fn declared_on<S: Any>(
        name: String,
        kind: MemberKind,
        type_tag: Option<&'static str>,
        destination: Option<Destination>,
        implementation: Implementation,
    ) -> Self {
        Self {
            name,
            declaring_state: StateKey::of::<S>(),
            declaring_type: TypeId::of::<S>(),
            kind,
            type_tag,
            destination,
            implementation,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// State the member was declared on. Inherited members keep the key of
    /// the base that declared them.
    pub fn declaring_state(&self) -> &StateKey {
        &self.declaring_state
    }

    pub(crate) fn declaring_type(&self) -> TypeId {
        self.declaring_type
    }

    pub fn kind(&self) -> MemberKind {
        self.kind
    }

    /// Rust type name of the value an attribute, property or method yields.
    pub fn type_tag(&self) -> Option<&'static str> {
        self.type_tag
    }

    pub fn destination(&self) -> Option<&Destination> {
        self.destination.as_ref()
    }

    pub(crate) fn implementation(&self) -> &Implementation {
        &self.implementation
    }

    /// Copy of this member operating on the value found through `projection`.
    pub(crate) fn projected(&self, projection: &Projection) -> Self {
        Self {
            implementation: self.implementation.projected(&self.name, projection),
            ..self.clone()
        }
    }

    /// Replace the declared destination with its resolved key.
    pub(crate) fn with_resolved_destination(mut self, key: StateKey) -> Self {
        if let Some(destination) = self.destination.as_mut() {
            destination.declared = StateRef::Key(key);
        }
        self
    }
}

impl fmt::Debug for StateMember {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateMember")
            .field("name", &self.name)
            .field("declaring_state", &self.declaring_state)
            .field("kind", &self.kind)
            .field("type_tag", &self.type_tag)
            .field("destination", &self.destination)
            .finish()
    }
}
