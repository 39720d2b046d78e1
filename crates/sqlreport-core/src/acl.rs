//! Access control records for folders and reports.
//!
//! Folders are one level deep: a report may sit in at most one folder and a
//! folder has no parent. Entries are loaded by the caller and passed in as
//! plain data together with the resource they belong to.

use crate::error::ValidationError;
use crate::principal::normalize_role_name;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Operation requested on a folder or report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AccessAction {
    View,
    Run,
    Edit,
    Delete,
}

impl fmt::Display for AccessAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessAction::View => write!(f, "VIEW"),
            AccessAction::Run => write!(f, "RUN"),
            AccessAction::Edit => write!(f, "EDIT"),
            AccessAction::Delete => write!(f, "DELETE"),
        }
    }
}

/// The four independent grant flags of an ACL entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Grants {
    #[serde(default, alias = "canView")]
    pub view: bool,
    #[serde(default, alias = "canRun")]
    pub run: bool,
    #[serde(default, alias = "canEdit")]
    pub edit: bool,
    #[serde(default, alias = "canDelete")]
    pub delete: bool,
}

impl Grants {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn all() -> Self {
        Self {
            view: true,
            run: true,
            edit: true,
            delete: true,
        }
    }

    pub fn view_run() -> Self {
        Self {
            view: true,
            run: true,
            ..Self::default()
        }
    }

    /// Whether these flags cover `action`. A flag implies every action below it:
    /// delete > edit > run > view.
    pub fn allows(&self, action: AccessAction) -> bool {
        match action {
            AccessAction::View => self.view || self.run || self.edit || self.delete,
            AccessAction::Run => self.run || self.edit || self.delete,
            AccessAction::Edit => self.edit || self.delete,
            AccessAction::Delete => self.delete,
        }
    }
}

/// Grantee of an ACL entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "SubjectRecord", into = "SubjectRecord")]
pub enum Subject {
    /// A user, keyed by id (UUID) or email.
    User(String),
    /// A role, stored normalized.
    Role(String),
}

impl Subject {
    pub fn user(key: impl Into<String>) -> Self {
        Subject::User(key.into().trim().to_string())
    }

    pub fn role(name: &str) -> Self {
        Subject::Role(normalize_role_name(name))
    }

    /// Decode a stored `(subject_type, subject_key)` pair.
    pub fn parse(subject_type: &str, key: &str) -> Result<Self, ValidationError> {
        let normalized_type = subject_type.trim().to_uppercase();
        let key = key.trim();
        match normalized_type.as_str() {
            "USER" => {
                if Uuid::parse_str(key).is_ok() || looks_like_email(key) {
                    Ok(Subject::User(key.to_string()))
                } else {
                    Err(ValidationError::invalid_subject_key("USER", key))
                }
            }
            "ROLE" => {
                let role = normalize_role_name(key);
                if role.is_empty() {
                    Err(ValidationError::invalid_subject_key("ROLE", key))
                } else {
                    Ok(Subject::Role(role))
                }
            }
            _ => Err(ValidationError::invalid_subject_type(subject_type)),
        }
    }

    pub fn subject_type(&self) -> &'static str {
        match self {
            Subject::User(_) => "USER",
            Subject::Role(_) => "ROLE",
        }
    }

    pub fn key(&self) -> &str {
        match self {
            Subject::User(key) | Subject::Role(key) => key,
        }
    }
}

fn looks_like_email(key: &str) -> bool {
    match key.split_once('@') {
        Some((local, domain)) => !local.is_empty() && !domain.is_empty() && !domain.contains('@'),
        None => false,
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubjectRecord {
    subject_type: String,
    subject_key: String,
}

impl TryFrom<SubjectRecord> for Subject {
    type Error = ValidationError;

    fn try_from(record: SubjectRecord) -> Result<Self, Self::Error> {
        Subject::parse(&record.subject_type, &record.subject_key)
    }
}

impl From<Subject> for SubjectRecord {
    fn from(subject: Subject) -> Self {
        SubjectRecord {
            subject_type: subject.subject_type().to_string(),
            subject_key: subject.key().to_string(),
        }
    }
}

/// One grant of flags to one subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AclEntry {
    #[serde(flatten)]
    pub subject: Subject,
    #[serde(flatten)]
    pub grants: Grants,
}

impl AclEntry {
    pub fn new(subject: Subject, grants: Grants) -> Self {
        Self { subject, grants }
    }
}

/// A folder together with its ACL entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderAcl {
    pub folder_id: Uuid,
    #[serde(default)]
    pub entries: Vec<AclEntry>,
}

/// A report, its ACL entries, and its parent folder's ACL if it has one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportAcl {
    pub report_id: Uuid,
    #[serde(default)]
    pub entries: Vec<AclEntry>,
    #[serde(default)]
    pub folder: Option<FolderAcl>,
}

/// The resource an access decision is made about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Resource {
    Folder(FolderAcl),
    Report(ReportAcl),
}

impl Resource {
    pub fn kind(&self) -> &'static str {
        match self {
            Resource::Folder(_) => "folder",
            Resource::Report(_) => "report",
        }
    }

    pub fn id(&self) -> Uuid {
        match self {
            Resource::Folder(folder) => folder.folder_id,
            Resource::Report(report) => report.report_id,
        }
    }
}
