//! SqlReport runtime.
//!
//! Composes the access resolver, the read-only guard and the template engine
//! into report operations, and talks to the remote SQL executor.
//!
//! Failures fall into three classes that callers must keep apart:
//! validation, authorization and upstream execution. See [`ReportError`].

pub mod error;
pub mod executor;
pub mod http;
pub mod options;
pub mod orchestrator;
pub mod tabular;
pub mod upstream;
pub mod validation;

pub use error::{FailureClass, ReportError, UpstreamError};
pub use executor::SqlExecutor;
pub use http::HttpSqlExecutor;
pub use options::{VariableOption, VariableOptionsRequest};
pub use orchestrator::{ReportOrchestrator, ReportRun, RunMeta};
pub use tabular::{ColumnSummary, TabularResult};
pub use upstream::UpstreamContext;
pub use validation::{DefinitionValidation, DefinitionValidationRequest};
