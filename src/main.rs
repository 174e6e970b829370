use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use cleo_files::config::Config;
use cleo_files::ftms::extract::mime_for;
use cleo_files::ftms::save::{delete_document, load_document, save_candidates};
use cleo_files::ftms::{FileIndex, FileStorage, FileType, ProcessOptions, ResponseProcessor};
use serde_json::json;
use std::path::PathBuf;
use tokio::io::AsyncReadExt;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "cleo-files",
    version,
    about = "Extract, detect and store files in assistant responses"
)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Post-process one assistant response (read from --input or stdin)
    Process {
        /// File holding the response text
        #[arg(short, long)]
        input: Option<PathBuf>,
        /// The user message that produced the response
        #[arg(short, long)]
        user_message: Option<String>,
        /// Only extract hidden markers, never guess
        #[arg(long)]
        skip_heuristics: bool,
        /// Save detected files to the document store
        #[arg(long)]
        save: bool,
        /// Session the saved files belong to
        #[arg(long)]
        session: Option<String>,
    },
    /// List saved documents, newest first
    List {
        #[arg(long)]
        session: Option<String>,
        /// md, txt or doc
        #[arg(long = "type")]
        file_type: Option<FileType>,
        #[arg(long, default_value_t = 0)]
        offset: usize,
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Full-text search over saved documents
    Search {
        query: String,
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Print a saved document with its metadata
    Show { id: String },
    /// Delete a saved document
    Delete { id: String },
    /// Inspect configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Generate shell completions
    Completions { shell: Shell },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the JSON Schema of the config file
    Schema,
    /// Print the config file location
    Path,
    /// Print the effective configuration as TOML
    Show,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;
    init_logging(&config);

    match cli.command {
        Commands::Process {
            input,
            user_message,
            skip_heuristics,
            save,
            session,
        } => {
            let response = read_response(input).await?;
            let processor = ResponseProcessor::from_config(&config.ftms);
            let options = ProcessOptions {
                skip_heuristics: skip_heuristics || config.ftms.skip_heuristics,
            };
            let processed = processor.process(&response, user_message.as_deref(), options);

            if save && !processed.files.is_empty() {
                let (storage, index) = open_store(&config)?;
                let saved =
                    save_candidates(&storage, &index, &processed.files, session.as_deref()).await?;
                print_json(&json!({ "processed": processed, "saved": saved }))?;
            } else {
                print_json(&processed)?;
            }
        }
        Commands::List {
            session,
            file_type,
            offset,
            limit,
        } => {
            let (_, index) = open_store(&config)?;
            print_json(&index.list(offset, limit, session.as_deref(), file_type)?)?;
        }
        Commands::Search { query, limit } => {
            let (_, index) = open_store(&config)?;
            print_json(&index.search(&query, limit)?)?;
        }
        Commands::Show { id } => {
            let (storage, index) = open_store(&config)?;
            let (record, content) = load_document(&storage, &index, &id).await?;
            let mime_type = mime_for(record.file_type);
            print_json(&json!({
                "document": record,
                "mimeType": mime_type,
                "content": content,
            }))?;
        }
        Commands::Delete { id } => {
            let (storage, index) = open_store(&config)?;
            delete_document(&storage, &index, &id).await?;
            print_json(&json!({ "deleted": id }))?;
        }
        Commands::Config { action } => match action {
            ConfigAction::Schema => println!("{}", Config::json_schema()?),
            ConfigAction::Path => match cli.config {
                Some(path) => println!("{}", path.display()),
                None => println!("{}", Config::config_path()?.display()),
            },
            ConfigAction::Show => print!("{}", config.to_toml()?),
        },
        Commands::Completions { shell } => {
            clap_complete::generate(
                shell,
                &mut Cli::command(),
                "cleo-files",
                &mut std::io::stdout(),
            );
        }
    }

    Ok(())
}

fn init_logging(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn read_response(input: Option<PathBuf>) -> Result<String> {
    match input {
        Some(path) => tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read {}", path.display())),
        None => {
            let mut buf = String::new();
            tokio::io::stdin()
                .read_to_string(&mut buf)
                .await
                .context("Failed to read response from stdin")?;
            Ok(buf)
        }
    }
}

fn open_store(config: &Config) -> Result<(FileStorage, FileIndex)> {
    let workspace = config.workspace_path();
    let index = FileIndex::new(&workspace)
        .with_context(|| format!("Failed to open document index in {}", workspace.display()))?;
    Ok((FileStorage::new(&workspace), index))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
