//! State transition history tracking.
//!
//! Every transition fired on a host is recorded as an immutable
//! [`StateTransition`]; the ordered list forms the host's [`StateHistory`].

use super::key::StateKey;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Record of a single fired transition.
///
/// # Example
///
/// ```rust
/// use statehold::{StateKey, StateTransition};
/// use chrono::Utc;
///
/// let transition = StateTransition {
///     from: StateKey::new("shop", "Demanded"),
///     to: StateKey::new("shop", "Ordered"),
///     transition: "order".to_string(),
///     timestamp: Utc::now(),
/// };
/// assert_eq!(transition.to.name(), "Ordered");
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StateTransition {
    /// The state being transitioned from
    pub from: StateKey,
    /// The state being transitioned to
    pub to: StateKey,
    /// Name of the transition member that fired
    pub transition: String,
    /// When the transition occurred
    pub timestamp: DateTime<Utc>,
}

/// Ordered history of state transitions.
///
/// `record` returns a new history with the transition added and leaves the
/// original untouched.
///
/// # Example
///
/// ```rust
/// use statehold::{StateHistory, StateKey, StateTransition};
/// use chrono::Utc;
///
/// let history = StateHistory::new().record(StateTransition {
///     from: StateKey::new("shop", "Demanded"),
///     to: StateKey::new("shop", "Ordered"),
///     transition: "order".to_string(),
///     timestamp: Utc::now(),
/// });
///
/// let path = history.get_path();
/// assert_eq!(path.len(), 2); // Demanded -> Ordered
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StateHistory {
    transitions: Vec<StateTransition>,
}

impl StateHistory {
    /// Create a new empty history.
    pub fn new() -> Self {
        Self {
            transitions: Vec::new(),
        }
    }

    /// Record a transition, returning a new history.
    pub fn record(&self, transition: StateTransition) -> Self {
        let mut transitions = self.transitions.clone();
        transitions.push(transition);
        Self { transitions }
    }

    /// Append in place, dropping the oldest entries beyond `limit`.
    pub(crate) fn push_bounded(&mut self, transition: StateTransition, limit: Option<usize>) {
        self.transitions.push(transition);
        if let Some(limit) = limit {
            let excess = self.transitions.len().saturating_sub(limit);
            self.transitions.drain(..excess);
        }
    }

    /// Get the path of states traversed.
    ///
    /// Returns the first recorded `from` state, then the `to` state of each
    /// transition.
    pub fn get_path(&self) -> Vec<&StateKey> {
        let mut path = Vec::new();
        if let Some(first) = self.transitions.first() {
            path.push(&first.from);
        }
        for transition in &self.transitions {
            path.push(&transition.to);
        }
        path
    }

    /// Duration from the first to the last transition, `None` when empty.
    pub fn duration(&self) -> Option<Duration> {
        if let (Some(first), Some(last)) = (self.transitions.first(), self.transitions.last()) {
            let duration = last.timestamp.signed_duration_since(first.timestamp);
            duration.to_std().ok()
        } else {
            None
        }
    }

    /// Get all transitions in order.
    pub fn transitions(&self) -> &[StateTransition] {
        &self.transitions
    }

    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(name: &str) -> StateKey {
        StateKey::new("shop", name)
    }

    fn transition(from: &str, to: &str) -> StateTransition {
        StateTransition {
            from: key(from),
            to: key(to),
            transition: format!("{from}_to_{to}"),
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn new_history_is_empty() {
        let history = StateHistory::new();
        assert!(history.is_empty());
        assert!(history.get_path().is_empty());
        assert!(history.duration().is_none());
    }

    #[test]
    fn record_is_immutable() {
        let history = StateHistory::new();

        let new_history = history.record(transition("Demanded", "Ordered"));

        assert_eq!(history.len(), 0);
        assert_eq!(new_history.len(), 1);
    }

    #[test]
    fn get_path_returns_state_sequence() {
        let history = StateHistory::new()
            .record(transition("Demanded", "Ordered"))
            .record(transition("Ordered", "InStock"));

        let path = history.get_path();
        assert_eq!(path, vec![&key("Demanded"), &key("Ordered"), &key("InStock")]);
    }

    #[test]
    fn bounded_push_keeps_latest_entries() {
        let mut history = StateHistory::new();
        history.push_bounded(transition("Demanded", "Ordered"), Some(2));
        history.push_bounded(transition("Ordered", "InStock"), Some(2));
        history.push_bounded(transition("InStock", "OnDispatch"), Some(2));

        assert_eq!(history.len(), 2);
        assert_eq!(history.transitions()[0].from, key("Ordered"));
        assert_eq!(history.transitions()[1].to, key("OnDispatch"));
    }

    #[test]
    fn single_transition_has_duration_zero() {
        let history = StateHistory::new().record(transition("Demanded", "Ordered"));

        assert_eq!(history.duration(), Some(std::time::Duration::from_secs(0)));
    }

    #[test]
    fn history_serializes_correctly() {
        let history = StateHistory::new().record(transition("Demanded", "Ordered"));

        let json = serde_json::to_string(&history).unwrap();
        let deserialized: StateHistory = serde_json::from_str(&json).unwrap();

        assert_eq!(history, deserialized);
    }
}
