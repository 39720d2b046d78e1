//! Hierarchical folder/report ACL resolution.
//!
//! Decision procedure:
//! 1. Admins are always allowed.
//! 2. Applicable entries are the resource's own entries plus, for a report,
//!    its folder's entries.
//! 3. No applicable entries: allowed unless `acl_default_deny` is set.
//! 4. Otherwise allowed iff some entry matches the principal and its grants
//!    cover the action (delete > edit > run > view).
//!
//! Report-level and folder-level matches are combined with OR. A report entry
//! for a subject therefore cannot narrow what the same subject already holds
//! through the folder.
//
// FIXME(product review): the OR above lets a folder grant override a more
// restrictive report entry for the same subject. Kept for compatibility with
// existing ACL data; revisit before relying on report entries to restrict.

use serde::Serialize;
use sqlreport_core::{
    AccessAction, AclEntry, Principal, Resource, SecurityConfig, Subject, normalize_role_name,
};

/// Why a decision came out the way it did. Never shown to the requester.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionReason {
    /// Principal holds the ADMIN role.
    Admin,
    /// No applicable entries; the default policy decided.
    DefaultPolicy,
    /// Matched an entry on the report itself.
    ReportEntry,
    /// Matched an entry on the folder (directly, or inherited by a report).
    FolderEntry,
    /// Entries exist but none grants the action to this principal.
    NoMatchingEntry,
}

/// Result of an access check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AccessDecision {
    pub allowed: bool,
    pub reason: DecisionReason,
}

impl AccessDecision {
    fn allow(reason: DecisionReason) -> Self {
        Self {
            allowed: true,
            reason,
        }
    }

    fn deny(reason: DecisionReason) -> Self {
        Self {
            allowed: false,
            reason,
        }
    }
}

/// Decides whether a principal may perform an action on a folder or report.
#[derive(Debug, Clone, Copy, Default)]
pub struct AccessControlResolver {
    /// Deny when a resource has no applicable ACL entries.
    default_deny: bool,
}

impl AccessControlResolver {
    pub fn new(acl_default_deny: bool) -> Self {
        Self {
            default_deny: acl_default_deny,
        }
    }

    pub fn from_config(config: &SecurityConfig) -> Self {
        Self::new(config.acl_default_deny)
    }

    pub fn default_deny(&self) -> bool {
        self.default_deny
    }

    /// Whether `principal` may perform `action` on `resource`.
    pub fn can_access(&self, principal: &Principal, resource: &Resource, action: AccessAction) -> bool {
        self.decide(principal, resource, action).allowed
    }

    /// Full decision including the reason, for logging.
    pub fn decide(
        &self,
        principal: &Principal,
        resource: &Resource,
        action: AccessAction,
    ) -> AccessDecision {
        let decision = self.evaluate(principal, resource, action);
        tracing::debug!(
            user_id = %principal.user_id(),
            resource_kind = resource.kind(),
            resource_id = %resource.id(),
            action = %action,
            allowed = decision.allowed,
            reason = ?decision.reason,
            "ACL decision"
        );
        decision
    }

    fn evaluate(&self, principal: &Principal, resource: &Resource, action: AccessAction) -> AccessDecision {
        if principal.is_admin() {
            return AccessDecision::allow(DecisionReason::Admin);
        }

        let (own, folder): (&[AclEntry], &[AclEntry]) = match resource {
            Resource::Folder(folder) => (&[], folder.entries.as_slice()),
            Resource::Report(report) => (
                report.entries.as_slice(),
                report
                    .folder
                    .as_ref()
                    .map(|f| f.entries.as_slice())
                    .unwrap_or_default(),
            ),
        };

        if own.is_empty() && folder.is_empty() {
            return if self.default_deny {
                AccessDecision::deny(DecisionReason::DefaultPolicy)
            } else {
                AccessDecision::allow(DecisionReason::DefaultPolicy)
            };
        }

        if any_grants(own, principal, action) {
            return AccessDecision::allow(DecisionReason::ReportEntry);
        }
        if any_grants(folder, principal, action) {
            return AccessDecision::allow(DecisionReason::FolderEntry);
        }
        AccessDecision::deny(DecisionReason::NoMatchingEntry)
    }
}

fn any_grants(entries: &[AclEntry], principal: &Principal, action: AccessAction) -> bool {
    entries
        .iter()
        .any(|entry| subject_matches(&entry.subject, principal) && entry.grants.allows(action))
}

fn subject_matches(subject: &Subject, principal: &Principal) -> bool {
    match subject {
        Subject::User(key) => {
            key.eq_ignore_ascii_case(&principal.user_id().to_string())
                || (!principal.email().is_empty() && key.eq_ignore_ascii_case(principal.email()))
        }
        Subject::Role(name) => principal.has_role(&normalize_role_name(name)),
    }
}
