//! Command line interface
//!
//! ```text
//! docquery query "page where name =~ /^Proj/ limit 2" --data records.json
//! docquery eval notes/ --data records.json --diff
//! docquery scrub notes/index.md
//! ```

use clap::{Parser, Subcommand};
use colored::Colorize;
use similar::{ChangeTag, TextDiff};
use std::path::{Path, PathBuf};
use tracing::info;
use walkdir::WalkDir;

use crate::config::{self, Config};
use crate::document::{load_record_file, DocumentEvaluator};
use crate::error::{DocqueryError, DocqueryResult};
use docquery_core::{scrub_directives, InMemoryRecordSource, QueryEngine};

#[derive(Parser, Debug)]
#[command(name = "docquery")]
#[command(about = "Evaluate query directives embedded in markdown documents", long_about = None)]
pub struct Cli {
    /// Directory holding docquery.toml and .env (defaults to the working directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run one query and print the results as JSON
    Query {
        /// Query text, e.g. "page where done = false order by name"
        query: String,

        /// Record data file (JSON object of tables)
        #[arg(long, short)]
        data: Option<PathBuf>,
    },

    /// Evaluate the query directives of documents
    Eval {
        /// Documents or directories to evaluate
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Record data file (JSON object of tables)
        #[arg(long, short)]
        data: Option<PathBuf>,

        /// Write evaluated documents back in place
        #[arg(long, short)]
        write: bool,

        /// Show a diff instead of the evaluated text
        #[arg(long)]
        diff: bool,
    },

    /// Blank out every directive while keeping text offsets
    Scrub {
        /// Document to scrub
        path: PathBuf,
    },
}

/// Execute a CLI command
pub fn execute(cli: Cli) -> anyhow::Result<()> {
    let config_dir = match &cli.config {
        Some(dir) => dir.clone(),
        None => std::env::current_dir()?,
    };
    let config = Config::load(&config_dir)?;

    match cli.command {
        Command::Query { query, data } => {
            let source = load_source(&config, &config_dir, data.as_deref())?;
            cmd_query(&query, source)
        }
        Command::Eval {
            paths,
            data,
            write,
            diff,
        } => {
            let source = load_source(&config, &config_dir, data.as_deref())?;
            cmd_eval(&paths, &config, source, write, diff)
        }
        Command::Scrub { path } => cmd_scrub(&path),
    }
}

/// Record data named on the command line, else the configured one.
fn load_source(
    config: &Config,
    config_dir: &Path,
    data: Option<&Path>,
) -> DocqueryResult<InMemoryRecordSource> {
    let path = data
        .map(Path::to_path_buf)
        .or_else(|| config.data_path(config_dir))
        .ok_or_else(|| {
            DocqueryError::ConfigError(format!(
                "no record data given; pass --data, set {} or add 'data' to {}",
                config::ENV_DATA,
                config::CONFIG_FILE_NAME
            ))
        })?;
    load_record_file(&path)
}

fn cmd_query(query: &str, source: InMemoryRecordSource) -> anyhow::Result<()> {
    let engine = QueryEngine::new(source);
    let results = engine.execute(query)?;
    println!("{}", serde_json::to_string_pretty(&results)?);
    Ok(())
}

fn cmd_eval(
    paths: &[PathBuf],
    config: &Config,
    source: InMemoryRecordSource,
    write: bool,
    diff: bool,
) -> anyhow::Result<()> {
    let evaluator = DocumentEvaluator::new(source);
    let mut failures = 0;

    for path in paths {
        for file in collect_documents(path, config)? {
            let text = std::fs::read_to_string(&file)?;
            let evaluation = evaluator.evaluate(&text);

            for outcome in &evaluation.outcomes {
                if let Err(message) = &outcome.result {
                    eprintln!(
                        "{} {}: {}\n    {}",
                        "✗".red(),
                        file.display(),
                        outcome.query,
                        message.red()
                    );
                }
            }
            failures += evaluation.failures();

            if diff {
                if evaluation.text != text {
                    println!("{}", file.display().to_string().bold());
                    print_diff(&text, &evaluation.text);
                }
            } else if !write {
                print!("{}", evaluation.text);
            }

            if write && evaluation.text != text {
                std::fs::write(&file, &evaluation.text)?;
                info!("Updated {}", file.display());
                println!(
                    "{} Updated {} ({} queries)",
                    "✓".green(),
                    file.display(),
                    evaluation.outcomes.len()
                );
            }
        }
    }

    if failures > 0 {
        anyhow::bail!("{} query directive(s) failed", failures);
    }
    Ok(())
}

fn cmd_scrub(path: &Path) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(path)?;
    print!("{}", scrub_directives(&text));
    Ok(())
}

/// Collect the documents under a path
///
/// A file is always taken as given; directories are walked and filtered
/// through the configured extensions and ignore patterns.
pub fn collect_documents(path: &Path, config: &Config) -> DocqueryResult<Vec<PathBuf>> {
    let mut files = Vec::new();

    if path.is_file() {
        files.push(path.to_path_buf());
    } else if path.is_dir() {
        for entry in WalkDir::new(path)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let entry_path = entry.path();
            if entry_path.is_file() && config.is_document(entry_path) {
                files.push(entry_path.to_path_buf());
            }
        }
    } else {
        return Err(DocqueryError::IoError(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("{} does not exist", path.display()),
        )));
    }

    Ok(files)
}

/// Print a colored diff
fn print_diff(old: &str, new: &str) {
    let diff = TextDiff::from_lines(old, new);

    for change in diff.iter_all_changes() {
        let sign = match change.tag() {
            ChangeTag::Delete => "-".red(),
            ChangeTag::Insert => "+".green(),
            ChangeTag::Equal => " ".normal(),
        };
        print!("  {}{}", sign, change);
    }
    println!();
}
