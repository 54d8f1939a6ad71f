//! Cohort CLI - compile cohort queries and datasets to SQL
//!
//! Usage:
//!   cohort cohort --query <query.json> --panels <panels.json>
//!   cohort dataset --dataset <dataset.json> --query-id <uuid> [--early <ts>] [--late <ts>]
//!   cohort demographics --demographic <demographic.json> --query-id <uuid> [--restrict-phi]
//!   cohort validate <fragment.sql>
//!
//! Examples:
//!   cohort --dialect postgres cohort --query q.json --panels panels.json
//!   cohort dataset --dataset labs.json --query-id 7d0c... --early 2020-01-01T00:00:00Z
//!   cohort demographics --demographic demo.json --query-id 7d0c... --session research

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use cohort_compiler::cohort::SharedCohortPreparer;
use cohort_compiler::compiler::{
    CohortSqlCompiler, ContextScope, DatasetCompilerContext, DatasetSqlCompiler,
    DemographicCompilerContext, DemographicSqlCompiler, FixedEntitlement, PrecompiledPanels,
    QueryContext, SessionType, UserContext,
};
use cohort_compiler::config::{CompilerOptions, Settings};
use cohort_compiler::model::{DatasetQuery, DemographicQuery, Panel, Query};
use cohort_compiler::sql::Dialect;
use cohort_compiler::validation::SqlValidator;

#[derive(Parser)]
#[command(name = "cohort")]
#[command(about = "Compile clinical cohort queries and datasets to multi-dialect SQL")]
#[command(version)]
struct Cli {
    /// Path to cohort.toml (defaults to the usual search locations)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// SQL dialect to generate (overrides the config file)
    #[arg(short, long, global = true)]
    dialect: Option<DialectArg>,

    /// Output format
    #[arg(short, long, global = true, default_value = "json")]
    output: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a query's panels into one cohort statement
    Cohort {
        /// Query JSON
        #[arg(long)]
        query: PathBuf,

        /// Panel SQL keyed by panel index (JSON)
        #[arg(long)]
        panels: PathBuf,

        #[command(flatten)]
        scope: ScopeArgs,
    },

    /// Compile a dataset against a persisted cohort
    Dataset {
        /// DatasetQuery JSON
        #[arg(long)]
        dataset: PathBuf,

        #[arg(long)]
        query_id: Uuid,

        /// Window start (RFC 3339)
        #[arg(long)]
        early: Option<DateTime<Utc>>,

        /// Window end (RFC 3339); defaults to now
        #[arg(long)]
        late: Option<DateTime<Utc>>,

        /// Panel JSON whose encounters the cohort is joined to
        #[arg(long, requires = "panels")]
        join_panel: Option<PathBuf>,

        /// Panel SQL keyed by panel index (JSON)
        #[arg(long)]
        panels: Option<PathBuf>,

        #[command(flatten)]
        scope: ScopeArgs,
    },

    /// Compile the demographics dataset
    Demographics {
        /// DemographicQuery JSON
        #[arg(long)]
        demographic: PathBuf,

        #[arg(long)]
        query_id: Uuid,

        /// Restrict PHI when no session is given
        #[arg(long)]
        restrict_phi: bool,

        #[command(flatten)]
        scope: ScopeArgs,
    },

    /// Check a SQL fragment against the statement denylist
    Validate {
        /// File holding the fragment
        file: PathBuf,
    },
}

#[derive(clap::Args)]
struct ScopeArgs {
    /// Session type of the caller; enables context parameters
    #[arg(long)]
    session: Option<SessionArg>,

    /// Caller may see identified data
    #[arg(long)]
    identified: bool,
}

impl ScopeArgs {
    fn resolve(&self) -> Result<Option<ContextScope>, String> {
        let Some(session) = self.session.clone() else {
            return Ok(None);
        };
        let user = UserContext::new("cli", Some(session.into()));
        ContextScope::resolve(&user, &FixedEntitlement(self.identified))
            .map(Some)
            .map_err(|e| e.to_string())
    }
}

#[derive(Clone, ValueEnum)]
enum SessionArg {
    Research,
    Qi,
}

impl From<SessionArg> for SessionType {
    fn from(arg: SessionArg) -> Self {
        match arg {
            SessionArg::Research => SessionType::Research,
            SessionArg::Qi => SessionType::QualityImprovement,
        }
    }
}

#[derive(Clone, ValueEnum)]
enum DialectArg {
    Tsql,
    Postgres,
    Mysql,
    Oracle,
    Bigquery,
}

impl From<DialectArg> for Dialect {
    fn from(arg: DialectArg) -> Self {
        match arg {
            DialectArg::Tsql => Dialect::TSql,
            DialectArg::Postgres => Dialect::Postgres,
            DialectArg::Mysql => Dialect::MySql,
            DialectArg::Oracle => Dialect::Oracle,
            DialectArg::Bigquery => Dialect::BigQuery,
        }
    }
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// SQL, parameters and staging statements as JSON
    Json,
    /// SQL only
    Sql,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => Settings::from_file(path),
        None => Settings::load(),
    };
    let settings = match settings {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    init_tracing(&settings.logging.level);

    let mut options = settings.compiler;
    if let Some(dialect) = cli.dialect {
        options = options.with_dialect(dialect.into());
    }

    let result = match cli.command {
        Commands::Cohort {
            query,
            panels,
            scope,
        } => cmd_cohort(options, &query, &panels, &scope, &cli.output),
        Commands::Dataset {
            dataset,
            query_id,
            early,
            late,
            join_panel,
            panels,
            scope,
        } => {
            let args = DatasetArgs {
                dataset,
                query_id,
                early,
                late,
                join_panel,
                panels,
            };
            cmd_dataset(options, args, &scope, &cli.output).await
        }
        Commands::Demographics {
            demographic,
            query_id,
            restrict_phi,
            scope,
        } => cmd_demographics(options, &demographic, query_id, restrict_phi, &scope, &cli.output).await,
        Commands::Validate { file } => cmd_validate(options, &file),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// `RUST_LOG` wins over the configured level.
fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, String> {
    let text = fs::read_to_string(path)
        .map_err(|e| format!("reading '{}': {}", path.display(), e))?;
    serde_json::from_str(&text).map_err(|e| format!("parsing '{}': {}", path.display(), e))
}

fn emit<T: Serialize>(value: &T, sql: &str, output: &OutputFormat) -> Result<(), String> {
    match output {
        OutputFormat::Sql => println!("{}", sql),
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(value).map_err(|e| e.to_string())?;
            println!("{}", json);
        }
    }
    Ok(())
}

fn cmd_cohort(
    options: CompilerOptions,
    query: &Path,
    panels: &Path,
    scope: &ScopeArgs,
    output: &OutputFormat,
) -> Result<(), String> {
    let query: Query = read_json(query)?;
    let panels: PrecompiledPanels = read_json(panels)?;
    let scope = scope.resolve()?;

    let compiler = CohortSqlCompiler::new(options, Arc::new(panels));
    let compiled = compiler
        .compile(&query, scope.as_ref())
        .map_err(|e| e.to_string())?;
    emit(&compiled, &compiled.compiled_query, output)
}

struct DatasetArgs {
    dataset: PathBuf,
    query_id: Uuid,
    early: Option<DateTime<Utc>>,
    late: Option<DateTime<Utc>>,
    join_panel: Option<PathBuf>,
    panels: Option<PathBuf>,
}

async fn cmd_dataset(
    options: CompilerOptions,
    args: DatasetArgs,
    scope: &ScopeArgs,
    output: &OutputFormat,
) -> Result<(), String> {
    let dataset: DatasetQuery = read_json(&args.dataset)?;
    let mut query_context = QueryContext::new(args.query_id);
    if let Some(scope) = scope.resolve()? {
        query_context = query_context.with_scope(scope);
    }

    let mut ctx = DatasetCompilerContext::new(query_context, dataset).with_bounds(args.early, args.late);
    if let Some(path) = &args.join_panel {
        let panel: Panel = read_json(path)?;
        ctx = ctx.join_to_panel(panel);
    }

    let preparer = Arc::new(SharedCohortPreparer::new(options.clone()));
    let mut compiler = DatasetSqlCompiler::new(options, preparer);
    if let Some(path) = &args.panels {
        let panels: PrecompiledPanels = read_json(path)?;
        compiler = compiler.with_panels(Arc::new(panels));
    }

    let compiled = compiler
        .build_dataset_sql(&ctx)
        .await
        .map_err(|e| e.to_string())?;
    emit(&compiled, &compiled.compiled_query, output)
}

async fn cmd_demographics(
    options: CompilerOptions,
    demographic: &Path,
    query_id: Uuid,
    restrict_phi: bool,
    scope: &ScopeArgs,
    output: &OutputFormat,
) -> Result<(), String> {
    let demographic_query: DemographicQuery = read_json(demographic)?;
    let mut query_context = QueryContext::new(query_id);
    let scope = scope.resolve()?;
    if let Some(scope) = scope {
        query_context = query_context.with_scope(scope);
    }
    let ctx = DemographicCompilerContext {
        query_context,
        demographic_query,
    };

    let preparer = Arc::new(SharedCohortPreparer::new(options.clone()));
    let compiler = DemographicSqlCompiler::new(options, preparer);
    let compiled = match scope {
        Some(_) => compiler.build_scoped(&ctx).await,
        None => compiler.build_demographic_sql(&ctx, restrict_phi).await,
    }
    .map_err(|e| e.to_string())?;
    emit(&compiled, &compiled.execution.compiled_query, output)
}

fn cmd_validate(options: CompilerOptions, file: &Path) -> Result<(), String> {
    let text = fs::read_to_string(file)
        .map_err(|e| format!("reading '{}': {}", file.display(), e))?;
    let source = file.display().to_string();
    SqlValidator::for_dialect(options.dialect)
        .validate_named(&source, &text)
        .map_err(|e| e.to_string())?;
    println!("OK: {} is valid", file.display());
    Ok(())
}
