//! User references that may carry either identity form.
//!
//! Users are known by their internal database id and, when they signed in
//! through the identity provider, by that provider's subject id. Callers
//! hand either form around as a [`UserRef`]; stores resolve it in the order
//! given by [`UserRef::internal_candidate`] then
//! [`UserRef::external_candidate`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::DbId;

/// A user reference as supplied by a caller.
///
/// Deserializes from a JSON number (internal id) or string (external
/// identity id, or a numeric id sent as text).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UserRef {
    Id(DbId),
    External(String),
}

impl UserRef {
    /// Candidate tried first: the reference read as an internal id.
    pub fn internal_candidate(&self) -> Option<DbId> {
        match self {
            UserRef::Id(id) => Some(*id),
            UserRef::External(key) => key.trim().parse().ok(),
        }
    }

    /// Candidate tried second: the reference read as an external identity id.
    pub fn external_candidate(&self) -> String {
        match self {
            UserRef::Id(id) => id.to_string(),
            UserRef::External(key) => key.trim().to_string(),
        }
    }

    /// The error reported when neither candidate resolves.
    pub fn not_found(&self) -> CoreError {
        match self {
            UserRef::Id(id) => CoreError::NotFound {
                entity: "User",
                id: *id,
            },
            UserRef::External(key) => CoreError::NotFoundByKey {
                entity: "User",
                key: key.clone(),
            },
        }
    }
}

impl From<DbId> for UserRef {
    fn from(id: DbId) -> Self {
        UserRef::Id(id)
    }
}

impl From<&str> for UserRef {
    fn from(key: &str) -> Self {
        UserRef::External(key.to_string())
    }
}

impl From<String> for UserRef {
    fn from(key: String) -> Self {
        UserRef::External(key)
    }
}

impl fmt::Display for UserRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserRef::Id(id) => write!(f, "{id}"),
            UserRef::External(key) => f.write_str(key),
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn internal_id_is_tried_as_both_forms() {
        let user = UserRef::from(42_i64);
        assert_eq!(user.internal_candidate(), Some(42));
        assert_eq!(user.external_candidate(), "42");
    }

    #[test]
    fn numeric_text_is_tried_as_internal_id_first() {
        let user = UserRef::from("17");
        assert_eq!(user.internal_candidate(), Some(17));
        assert_eq!(user.external_candidate(), "17");
    }

    #[test]
    fn provider_subject_has_no_internal_candidate() {
        let user = UserRef::from("user_2f9a");
        assert_eq!(user.internal_candidate(), None);
        assert_eq!(user.external_candidate(), "user_2f9a");
    }

    #[test]
    fn deserializes_number_and_string() {
        let id: UserRef = serde_json::from_str("7").unwrap();
        assert_eq!(id, UserRef::Id(7));

        let ext: UserRef = serde_json::from_str("\"idp|abc\"").unwrap();
        assert_eq!(ext, UserRef::External("idp|abc".into()));
    }

    #[test]
    fn not_found_keeps_the_reference_form() {
        assert_matches!(
            UserRef::from(9_i64).not_found(),
            CoreError::NotFound { entity: "User", id: 9 }
        );
        assert_matches!(
            UserRef::from("ghost").not_found(),
            CoreError::NotFoundByKey { entity: "User", key } if key == "ghost"
        );
    }
}
