//! strictql CLI
//!
//! Command-line tool for generating typed Python query wrappers.

use std::collections::BTreeMap;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use sqlx::postgres::{PgPool, PgPoolOptions};
use strictql_core::resolve::DeclaredParam;
use strictql_core::QueryMode;
use tracing::{debug, error, info, Level};
use tracing_subscriber::FmtSubscriber;

use strictql_gen::config::{DatabaseConfig, DEFAULT_CONFIG_FILE};
use strictql_gen::{
    CodeImprover, Config, ExternalCommand, GenerateError, Generator, Passthrough, QueryToGenerate,
};

/// Typed Python wrappers for Postgres statements.
#[derive(Parser)]
#[command(name = "strictql")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file.
    #[arg(short, long, env = "STRICTQL_CONFIG", default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate code for every configured query and publish it.
    Generate,

    /// Check that the generated code is up to date without writing it.
    Check,

    /// Print the generated code for a single statement.
    Render {
        /// Database name from the configuration.
        #[arg(short, long)]
        database: String,

        /// Name of the generated function.
        #[arg(short, long)]
        function: String,

        /// fetch_all, fetch_row or execute.
        #[arg(short, long, default_value = "fetch_all")]
        mode: QueryMode,

        /// Parameter names in `$1..$N` order.
        #[arg(short, long = "param")]
        params: Vec<String>,

        /// The statement.
        sql: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match run(cli).await {
        Ok(true) => Ok(()),
        Ok(false) => std::process::exit(1),
        Err(err) => {
            error!("{err}");
            std::process::exit(1);
        }
    }
}

/// Returns `false` when `check` found differences.
async fn run(cli: Cli) -> Result<bool, GenerateError> {
    let config = Config::load(&cli.config)?;
    let pools = match &cli.command {
        Commands::Render { database, .. } => connect(config.databases.get(database)).await?,
        _ => connect(config.databases_in_use()).await?,
    };
    let assume = config.assume_params_optional;

    match ExternalCommand::from_argv(&config.formatter) {
        Some(formatter) => {
            info!(formatter = %config.formatter.join(" "), "Using external formatter");
            execute(cli.command, &config, Generator::new(pools, formatter, assume)).await
        }
        None => execute(cli.command, &config, Generator::new(pools, Passthrough, assume)).await,
    }
}

/// Opens a pool per database. Names with no pool are reported when a query
/// asks for them.
async fn connect<'a>(
    databases: impl IntoIterator<Item = &'a DatabaseConfig>,
) -> Result<BTreeMap<String, PgPool>, GenerateError> {
    let mut pools = BTreeMap::new();
    for database in databases {
        let name = &database.name;
        info!(database = %name, max_connections = database.max_connections, "Connecting");
        let pool = PgPoolOptions::new()
            .max_connections(database.max_connections)
            .connect(&database.url)
            .await
            .map_err(|source| GenerateError::Connection {
                database: name.clone(),
                source,
            })?;
        pools.insert(name.clone(), pool);
    }
    Ok(pools)
}

async fn execute<I: CodeImprover>(
    command: Commands,
    config: &Config,
    generator: Generator<PgPool, I>,
) -> Result<bool, GenerateError> {
    let result = match command {
        Commands::Generate => generator
            .generate(&config.queries, &config.output_dir)
            .await
            .map(|manifest| {
                info!(
                    path = %config.output_dir.display(),
                    files = manifest.files_checksums.len(),
                    "Wrote generated code"
                );
                true
            }),

        Commands::Check => generator
            .check(&config.queries, &config.output_dir)
            .await
            .map(|diff| {
                for path in &diff.changed {
                    error!(file = %path, "Generated file is stale");
                }
                for path in &diff.missing {
                    error!(file = %path, "Generated file is missing");
                }
                for path in &diff.extra {
                    error!(file = %path, "Unexpected file in output directory");
                }
                if diff.is_empty() {
                    info!("Generated code is up to date");
                }
                diff.is_empty()
            }),

        Commands::Render {
            database,
            function,
            mode,
            params,
            sql,
        } => {
            let query = QueryToGenerate {
                relative_path: PathBuf::from(format!("{function}.py")),
                function_name: function,
                sql,
                params: params.into_iter().map(DeclaredParam::new).collect(),
                database,
                mode,
            };
            generator.render(&query).await.map(|code| {
                print!("{code}");
                true
            })
        }
    };

    for (name, pool) in generator.sources() {
        debug!(database = %name, "Closing connection pool");
        pool.close().await;
    }
    result
}
