//! # sqlreport-sql
//!
//! SQL handling for report templates.
//!
//! This crate provides functionality to:
//! - Reject SQL that is not a single read-only `SELECT`/`WITH` statement
//! - Find `:name` placeholders in a template
//! - Encode typed parameter values as SQL literals
//! - Render a template into literal SQL
//! - Check a template against its variable definitions before saving it
//!
//! ## Rendering
//!
//! **Template:**
//! ```sql
//! SELECT * FROM orders WHERE status IN :status AND created_on >= :since
//! ```
//!
//! **Rendered** (`status = ["OPEN", "PENDING"]`, `since = "2026-01-31"`):
//! ```sql
//! SELECT * FROM orders WHERE status IN ('OPEN', 'PENDING') AND created_on >= '2026-01-31'
//! ```
//!
//! Nothing here executes SQL. The rendered text is handed to an external
//! executor.

pub mod consistency;
pub mod guard;
pub mod literal;
pub mod placeholder;
pub mod template;

pub use consistency::{check_consistency, require_consistent};
pub use guard::ReadOnlyQueryGuard;
pub use literal::to_sql_literal;
pub use placeholder::{Placeholder, extract_placeholders, scan_placeholders};
pub use template::SqlTemplateEngine;
