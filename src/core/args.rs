//! Keyword arguments passed to methods and transitions.

use crate::error::MemberError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Named arguments for a member call.
///
/// Values are stored as JSON so member bodies can pull them out with the
/// type they expect.
///
/// # Example
///
/// ```rust
/// use statehold::Args;
///
/// let args = Args::new().with("cost", 3.59).with("stock_location", 331);
///
/// assert_eq!(args.get::<f64>("cost").unwrap(), 3.59);
/// assert!(args.get::<String>("address").is_err());
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Args(Map<String, Value>);

impl Args {
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Add an argument, consuming and returning the arguments.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(name.into(), value.into());
    }

    /// Extract a required argument.
    pub fn get<T: DeserializeOwned>(&self, name: &str) -> Result<T, MemberError> {
        self.get_opt(name)?
            .ok_or_else(|| MemberError::MissingArgument(name.to_string()))
    }

    /// Extract an optional argument. `null` counts as absent.
    pub fn get_opt<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>, MemberError> {
        match self.0.get(name) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => T::deserialize(value)
                .map(Some)
                .map_err(|err| MemberError::InvalidArgument {
                    name: name.to_string(),
                    reason: err.to_string(),
                }),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Map<String, Value>> for Args {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Serialize a member's result.
pub(crate) fn to_value<T: Serialize>(member: &str, value: T) -> Result<Value, MemberError> {
    serde_json::to_value(value).map_err(|err| MemberError::Conversion {
        member: member.to_string(),
        reason: err.to_string(),
    })
}

/// Deserialize a member's result into the type the caller expects.
pub(crate) fn from_value<T: DeserializeOwned>(member: &str, value: Value) -> Result<T, MemberError> {
    serde_json::from_value(value).map_err(|err| MemberError::Conversion {
        member: member.to_string(),
        reason: err.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_argument_is_reported_by_name() {
        let args = Args::new();

        assert_eq!(
            args.get::<f64>("cost"),
            Err(MemberError::MissingArgument("cost".to_string()))
        );
    }

    #[test]
    fn wrong_shape_is_invalid() {
        let args = Args::new().with("cost", "cheap");

        assert!(matches!(
            args.get::<f64>("cost"),
            Err(MemberError::InvalidArgument { name, .. }) if name == "cost"
        ));
    }

    #[test]
    fn null_is_absent_for_optional_arguments() {
        let args = Args::new().with("address", Value::Null);

        assert_eq!(args.get_opt::<String>("address"), Ok(None));
        assert!(args.contains("address"));
    }

    #[test]
    fn inserted_arguments_are_retrievable() {
        let mut args = Args::new();
        args.insert("address", "Main Street 1");
        args.insert("price_sold", 4.99);

        assert_eq!(args.len(), 2);
        assert_eq!(args.get::<String>("address").unwrap(), "Main Street 1");
        assert_eq!(args.get::<f64>("price_sold").unwrap(), 4.99);
    }
}
