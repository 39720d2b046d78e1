//! Core types shared across all SqlReport crates.
//!
//! Everything here is a plain, immutable record. Callers load report, folder,
//! variable and ACL data up front and hand it to the renderer and the access
//! resolver; nothing in this crate performs I/O except configuration loading.

pub mod acl;
pub mod config;
pub mod error;
pub mod principal;
pub mod report;
pub mod variable;

pub use acl::{AccessAction, AclEntry, FolderAcl, Grants, ReportAcl, Resource, Subject};
pub use config::{
    ConfigError, LoggingConfig, ReportsConfig, SecurityConfig, SqlReportConfig, UpstreamConfig,
};
pub use error::{ValidationError, ValidationErrorKind};
pub use principal::{Principal, normalize_role_name};
pub use report::ReportDefinition;
pub use variable::{VariableDefinition, VariableInput, VariableType, normalize_variables};
