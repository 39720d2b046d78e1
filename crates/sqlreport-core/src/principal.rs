//! Authenticated principal as seen by the access resolver.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

const ROLE_PREFIX: &str = "ROLE_";
const ADMIN_ROLE: &str = "ADMIN";

/// An already-authenticated caller.
///
/// Role names are stored normalized (uppercase, `ROLE_` prefix stripped), so
/// comparisons against ACL role subjects are plain set lookups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "PrincipalRecord", into = "PrincipalRecord")]
pub struct Principal {
    user_id: Uuid,
    email: String,
    role_names: BTreeSet<String>,
}

impl Principal {
    pub fn new<I, S>(user_id: Uuid, email: impl Into<String>, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            user_id,
            email: email.into(),
            role_names: roles
                .into_iter()
                .map(|r| normalize_role_name(r.as_ref()))
                .filter(|r| !r.is_empty())
                .collect(),
        }
    }

    /// Build a principal from granted authorities, keeping only `ROLE_*` ones.
    pub fn from_authorities<I, S>(user_id: Uuid, email: impl Into<String>, authorities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let roles: Vec<String> = authorities
            .into_iter()
            .filter_map(|a| a.as_ref().strip_prefix(ROLE_PREFIX).map(str::to_string))
            .collect();
        Self::new(user_id, email, roles)
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn role_names(&self) -> &BTreeSet<String> {
        &self.role_names
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.role_names.contains(role)
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(ADMIN_ROLE)
    }
}

/// Uppercase and strip a leading `ROLE_`.
pub fn normalize_role_name(name: &str) -> String {
    let upper = name.trim().to_uppercase();
    match upper.strip_prefix(ROLE_PREFIX) {
        Some(stripped) => stripped.to_string(),
        None => upper,
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PrincipalRecord {
    user_id: Uuid,
    #[serde(default)]
    email: String,
    #[serde(default)]
    role_names: Vec<String>,
}

impl From<PrincipalRecord> for Principal {
    fn from(record: PrincipalRecord) -> Self {
        Principal::new(record.user_id, record.email, record.role_names)
    }
}

impl From<Principal> for PrincipalRecord {
    fn from(principal: Principal) -> Self {
        PrincipalRecord {
            user_id: principal.user_id,
            email: principal.email,
            role_names: principal.role_names.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roles_are_normalized() {
        let p = Principal::new(Uuid::nil(), "a@b.c", ["role_manager", " Analyst ", ""]);
        assert!(p.has_role("MANAGER"));
        assert!(p.has_role("ANALYST"));
        assert_eq!(p.role_names().len(), 2);
        assert!(!p.is_admin());
    }

    #[test]
    fn test_from_authorities_keeps_role_prefixed_only() {
        let p = Principal::from_authorities(
            Uuid::nil(),
            "a@b.c",
            ["ROLE_ADMIN", "report:write", "ROLE_viewer"],
        );
        assert!(p.is_admin());
        assert!(p.has_role("VIEWER"));
        assert_eq!(p.role_names().len(), 2);
    }

    #[test]
    fn test_deserialize_normalizes() {
        let p: Principal = serde_json::from_str(
            r#"{"userId":"00000000-0000-0000-0000-000000000000","email":"x@y.z","roleNames":["ROLE_admin"]}"#,
        )
        .unwrap();
        assert!(p.is_admin());
    }
}
