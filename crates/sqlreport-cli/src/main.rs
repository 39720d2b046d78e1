use clap::{Parser, Subcommand, ValueEnum};
use sqlreport_core::{AccessAction, SqlReportConfig};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser, Debug)]
#[command(name = "sqlreport", version, about = "SqlReport CLI")]
struct Cli {
    /// Configuration file (YAML). Defaults apply when omitted.
    #[arg(long, short, global = true, env = "SQLREPORT_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a report's SQL with parameters, without executing it.
    Render {
        /// Report file (YAML/JSON): name, sql, variables
        report: PathBuf,

        /// Parameter file (YAML/JSON object)
        #[arg(long)]
        params: Option<PathBuf>,

        /// Render missing required parameters as NULL instead of failing
        #[arg(long, default_value_t = false)]
        lenient: bool,
    },

    /// Validate a report definition and print every problem found.
    Validate {
        /// Validation request file (YAML/JSON): sql, variables, params, flags
        file: PathBuf,

        /// Also EXPLAIN the rendered query on the configured executor
        #[arg(long, default_value_t = false)]
        syntax: bool,

        /// Bearer credential for the executor; falls back to the configured token
        #[arg(long, env = "SQLREPORT_AUTHORIZATION")]
        authorization: Option<String>,
    },

    /// Decide whether a principal may perform an action on a folder or report.
    Access {
        /// Principal file (YAML/JSON): userId, email, roleNames
        #[arg(long)]
        principal: PathBuf,

        /// Resource file (YAML/JSON) with its ACL entries
        #[arg(long)]
        resource: PathBuf,

        #[arg(long, value_enum, default_value_t = ActionArg::View)]
        action: ActionArg,
    },

    /// Run a report on the configured executor.
    Run {
        report: PathBuf,

        #[arg(long)]
        params: Option<PathBuf>,

        #[arg(long)]
        principal: PathBuf,

        /// Resource file with ACL entries. Without it the report has none.
        #[arg(long)]
        resource: Option<PathBuf>,

        #[arg(long, env = "SQLREPORT_AUTHORIZATION")]
        authorization: Option<String>,
    },

    /// List the selectable values of a report variable.
    Options {
        report: PathBuf,

        /// Variable key (case-insensitive)
        variable: String,

        #[arg(long)]
        params: Option<PathBuf>,

        #[arg(long)]
        principal: PathBuf,

        #[arg(long)]
        resource: Option<PathBuf>,

        /// Maximum options; defaults to `reports.options_limit`
        #[arg(long)]
        limit: Option<usize>,

        #[arg(long, env = "SQLREPORT_AUTHORIZATION")]
        authorization: Option<String>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ActionArg {
    View,
    Run,
    Edit,
    Delete,
}

impl From<ActionArg> for AccessAction {
    fn from(action: ActionArg) -> Self {
        match action {
            ActionArg::View => AccessAction::View,
            ActionArg::Run => AccessAction::Run,
            ActionArg::Edit => AccessAction::Edit,
            ActionArg::Delete => AccessAction::Delete,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    init_tracing(&config.logging.level);

    match cli.cmd {
        Command::Render {
            report,
            params,
            lenient,
        } => commands::render::run(&report, params.as_deref(), lenient)?,

        Command::Validate {
            file,
            syntax,
            authorization,
        } => commands::validate::run(&config, &file, syntax, authorization.as_deref()).await?,

        Command::Access {
            principal,
            resource,
            action,
        } => commands::access::run(&config, &principal, &resource, action.into())?,

        Command::Run {
            report,
            params,
            principal,
            resource,
            authorization,
        } => {
            let inputs = commands::run::ReportInputs {
                report,
                params,
                principal,
                resource,
            };
            commands::run::run(&config, &inputs, authorization.as_deref()).await?
        }

        Command::Options {
            report,
            variable,
            params,
            principal,
            resource,
            limit,
            authorization,
        } => {
            let inputs = commands::run::ReportInputs {
                report,
                params,
                principal,
                resource,
            };
            commands::run::options(&config, &inputs, &variable, limit, authorization.as_deref())
                .await?
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> anyhow::Result<SqlReportConfig> {
    match path {
        Some(path) => SqlReportConfig::from_file(path)
            .map_err(|e| anyhow::anyhow!("Failed to load config {}: {e}", path.display())),
        None => Ok(SqlReportConfig::default()),
    }
}

/// `RUST_LOG` wins over the configured level. Logs go to stderr so stdout
/// carries only command output.
fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
