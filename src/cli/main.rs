//! sql-ingest CLI
//!
//! Splits, parses and runs SQL scripts against a table service.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufRead, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{Level, info, warn};
use tracing_subscriber::FmtSubscriber;

use sql_ingest::build::{ModelBuilderRegistry, StatementKind};
use sql_ingest::cli::output::{self, ParsedStatement};
use sql_ingest::config::IngestConfig;
use sql_ingest::parser::{QueryParser, SqlDialect};
use sql_ingest::segment::{LineMode, split_statements};

/// Ingest SQL scripts into a table service.
#[derive(Parser)]
#[command(name = "sql-ingest")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file (TOML).
    #[arg(short, long, env = "SQL_INGEST_CONFIG")]
    config: Option<PathBuf>,

    /// SQL dialect, overrides the configuration file.
    #[arg(short, long)]
    dialect: Option<SqlDialect>,

    /// Line handling of the segmenter (reset-per-line, continuous).
    #[arg(short, long)]
    line_mode: Option<LineMode>,

    /// Print JSON instead of text.
    #[arg(long)]
    json: bool,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the statements of a script.
    Split {
        /// Script path, `-` for stdin.
        input: PathBuf,
    },

    /// Parse a script and print the models built from it.
    Parse {
        /// Script path, `-` for stdin.
        input: PathBuf,
    },

    /// Run a script against the configured table service.
    Run {
        /// Script path, `-` for stdin.
        input: PathBuf,

        /// Table service URL, overrides the configuration file.
        #[arg(long, env = "SQL_INGEST_BASE_URL")]
        base_url: Option<String>,

        /// Bearer token for the table service.
        #[arg(long, env = "SQL_INGEST_TOKEN", hide_env_values = true)]
        token: Option<String>,
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
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut config = match &cli.config {
        Some(path) => IngestConfig::load(path)?,
        None => IngestConfig::new(),
    };
    if let Some(dialect) = cli.dialect {
        config = config.with_dialect(dialect);
    }
    if let Some(line_mode) = cli.line_mode {
        config = config.with_line_mode(line_mode);
    }

    match cli.command {
        Commands::Split { input } => {
            let script = read_script(&input).await?;
            let statements: Vec<String> =
                split_statements(&script, config.segmenter.line_mode).collect();

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&statements)?);
            } else {
                print!("{}", output::format_statements(&statements));
            }
        }

        Commands::Parse { input } => {
            let script = read_script(&input).await?;
            let parser = config.build_parser();
            let builders = ModelBuilderRegistry::new();

            let parsed: Vec<(String, ParsedStatement)> =
                split_statements(&script, config.segmenter.line_mode)
                    .map(|statement| {
                        let result = match parser.parse(&statement) {
                            Err(e) => ParsedStatement::Error(e.to_string()),
                            Ok(tree) => match builders.build(&tree) {
                                Ok(Some(model)) => ParsedStatement::Model(model),
                                Ok(None) => {
                                    ParsedStatement::Unsupported(StatementKind::of(&tree).to_string())
                                }
                                Err(e) => ParsedStatement::Error(e.to_string()),
                            },
                        };
                        (statement, result)
                    })
                    .collect();

            if cli.json {
                let models: Vec<_> = parsed
                    .iter()
                    .filter_map(|(_, result)| match result {
                        ParsedStatement::Model(model) => Some(model),
                        _ => None,
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&models)?);
            } else {
                print!("{}", output::format_parsed(&parsed));
            }
        }

        Commands::Run {
            input,
            base_url,
            token,
        } => {
            if let Some(base_url) = base_url {
                config = config.with_base_url(base_url);
            }
            if let Some(token) = token {
                config = config.with_auth_token(token);
            }
            let processor = config.build_processor()?;

            let cancel = CancellationToken::new();
            let on_interrupt = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    warn!("Interrupted, cancelling script");
                    on_interrupt.cancel();
                }
            });

            info!(input = %input.display(), base_url = %config.backend.base_url, "Running script");
            let reader = open_script(&input).await?;

            match processor.process(reader, &cancel).await {
                Ok(report) => {
                    if cli.json {
                        println!("{}", serde_json::to_string_pretty(&report)?);
                    } else {
                        print!("{}", output::format_report(&report));
                    }
                }
                Err(e) => {
                    let status = e.status_code();
                    let report = e.to_error_report(input.display().to_string());
                    if cli.json {
                        eprintln!("{}", serde_json::to_string_pretty(&report)?);
                    } else {
                        eprint!("{}", output::format_error_report(status, &report));
                    }
                    return Err(e).context("Script run failed");
                }
            }
        }
    }

    Ok(())
}

fn is_stdin(path: &Path) -> bool {
    path.as_os_str() == "-"
}

async fn read_script(path: &Path) -> anyhow::Result<String> {
    if is_stdin(path) {
        use tokio::io::AsyncReadExt;
        let mut script = String::new();
        tokio::io::stdin().read_to_string(&mut script).await?;
        return Ok(script);
    }
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))
}

async fn open_script(path: &Path) -> anyhow::Result<Box<dyn AsyncBufRead + Unpin + Send>> {
    if is_stdin(path) {
        return Ok(Box::new(BufReader::new(tokio::io::stdin())));
    }
    let file = tokio::fs::File::open(path)
        .await
        .with_context(|| format!("Failed to open {}", path.display()))?;
    Ok(Box::new(BufReader::new(file)))
}
