use serde::{Deserialize, Serialize};

use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Access {
    Allow,
    Deny,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Match,
    Recursive,
}

/// Either a user or a group a permission applies to. Never both, never neither.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Subject {
    User(String),
    Group(String),
}

/// A permission event: the payload for a single create/delete of a permission
/// on one component's resource. Immutable once constructed — `new` is the only
/// way to build one, and it enforces the user-xor-group invariant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    pub component_name: String,
    pub resource_id: String,
    pub resource_full_name: String,
    pub name: String,
    pub access: Access,
    pub scope: Scope,
    subject: Subject,
}

impl Permission {
    pub fn new(
        component_name: impl Into<String>,
        resource_id: impl Into<String>,
        resource_full_name: impl Into<String>,
        name: impl Into<String>,
        access: Access,
        scope: Scope,
        user: Option<String>,
        group: Option<String>,
    ) -> Result<Self, Error> {
        let subject = match (user, group) {
            (Some(u), None) => Subject::User(u),
            (None, Some(g)) => Subject::Group(g),
            (Some(_), Some(_)) => {
                return Err(Error::validation(
                    "user/group",
                    "exactly one of user or group must be set, got both",
                ))
            }
            (None, None) => {
                return Err(Error::validation(
                    "user/group",
                    "exactly one of user or group must be set, got neither",
                ))
            }
        };
        Ok(Self {
            component_name: component_name.into(),
            resource_id: resource_id.into(),
            resource_full_name: resource_full_name.into(),
            name: name.into(),
            access,
            scope,
            subject,
        })
    }

    pub fn user(&self) -> Option<&str> {
        match &self.subject {
            Subject::User(u) => Some(u.as_str()),
            Subject::Group(_) => None,
        }
    }

    pub fn group(&self) -> Option<&str> {
        match &self.subject {
            Subject::Group(g) => Some(g.as_str()),
            Subject::User(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_both_user_and_group() {
        let err = Permission::new(
            "svc",
            "1",
            "a/b",
            "read",
            Access::Allow,
            Scope::Match,
            Some("u1".into()),
            Some("g1".into()),
        )
        .unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
    }

    #[test]
    fn rejects_neither_user_nor_group() {
        let err = Permission::new(
            "svc",
            "1",
            "a/b",
            "read",
            Access::Allow,
            Scope::Match,
            None,
            None,
        )
        .unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
    }

    #[test]
    fn accepts_user_only() {
        let perm = Permission::new(
            "svc",
            "1",
            "a/b",
            "read",
            Access::Allow,
            Scope::Match,
            Some("u1".into()),
            None,
        )
        .unwrap();
        assert_eq!(perm.user(), Some("u1"));
        assert_eq!(perm.group(), None);
    }
}
