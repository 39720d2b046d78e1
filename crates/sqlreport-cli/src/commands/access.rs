//! `sqlreport access`

use super::input::{print_json, read_document};
use anyhow::Result;
use sqlreport_core::{AccessAction, Principal, Resource, SqlReportConfig};
use sqlreport_policy::AccessControlResolver;
use std::path::Path;

pub fn run(
    config: &SqlReportConfig,
    principal_path: &Path,
    resource_path: &Path,
    action: AccessAction,
) -> Result<()> {
    let principal: Principal = read_document(principal_path)?;
    let resource: Resource = read_document(resource_path)?;

    let decision = AccessControlResolver::from_config(&config.security).decide(&principal, &resource, action);
    print_json(&decision)
}
