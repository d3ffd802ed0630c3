//! CLI command implementations.
//!
//! Each command returns its rendered output; `main` prints it.

// Allow certain patterns that improve readability in CLI output formatting
#![allow(clippy::uninlined_format_args)]

use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::agent::{AgentContext, AgentStages, LlmConfig, LlmGateway, PromptSet};
use crate::cli::output::{
    OutputFormat, format_article, format_article_list, format_prompts_written, format_validation,
};
use crate::cli::parser::{ArticleCommands, Cli, Commands, PromptCommands};
use crate::core::{ArticleQuery, Difficulty, Domain, NewArticle};
use crate::error::{Error, Result};
use crate::http::{AppState, ServerConfig, serve};
use crate::service::Services;
use crate::storage::SqliteStorage;

/// Executes the CLI command.
///
/// # Errors
///
/// Returns an error if the command fails to execute.
pub fn execute(cli: &Cli) -> Result<String> {
    let format = OutputFormat::parse(&cli.format);
    let db_path = cli.get_db_path();
    let prompt_dir = cli.prompt_dir.as_deref();

    match &cli.command {
        Commands::Init { force } => cmd_init(&db_path, *force, format),
        Commands::Serve { host, port } => cmd_serve(&db_path, prompt_dir, host.as_deref(), *port),
        Commands::Article(cmd) => execute_article(cmd, &db_path, prompt_dir, format),
        Commands::Prompts(PromptCommands::Init { dir }) => {
            cmd_init_prompts(dir.as_deref(), format)
        }
    }
}

fn execute_article(
    cmd: &ArticleCommands,
    db_path: &Path,
    prompt_dir: Option<&Path>,
    format: OutputFormat,
) -> Result<String> {
    let services = build_services(open_storage(db_path)?, prompt_dir)?;

    match cmd {
        ArticleCommands::Add {
            file,
            title,
            domain,
            difficulty,
            source_url,
            author,
        } => {
            let content = read_content(file)?;
            let title = match title {
                Some(t) => t.clone(),
                None => file
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .filter(|s| *s != "-")
                    .map(String::from)
                    .ok_or_else(|| Error::Command("--title is required when reading stdin".into()))?,
            };
            let word_count = u32::try_from(content.split_whitespace().count()).unwrap_or(u32::MAX);
            let article = services.articles.create(NewArticle {
                title,
                domain: parse_domain(domain)?,
                difficulty: parse_difficulty(difficulty)?,
                content,
                word_count,
                source_url: source_url.clone(),
                author: author.clone(),
                tags: Vec::new(),
                scheduled_for: None,
            })?;
            Ok(format_article(&article, format))
        }
        ArticleCommands::List {
            domain,
            difficulty,
            search,
            limit,
            offset,
        } => {
            let query = ArticleQuery {
                offset: *offset,
                limit: *limit,
                domain: domain.as_deref().map(parse_domain).transpose()?,
                difficulty: difficulty.as_deref().map(parse_difficulty).transpose()?,
                search: search.clone(),
            };
            let page = services.articles.find_all(&query)?;
            Ok(format_article_list(&page, format))
        }
        ArticleCommands::Show { id } => {
            let article = services.articles.find_one(id)?;
            Ok(format_article(&article, format))
        }
        ArticleCommands::Process { id } => {
            let article = runtime()?.block_on(services.articles.process_with_ai(id))?;
            Ok(format_article(&article, format))
        }
        ArticleCommands::Validate { id } => {
            let validation = runtime()?.block_on(services.articles.validate_content(id))?;
            Ok(format_validation(&validation, format))
        }
    }
}

/// Opens an existing database.
fn open_storage(db_path: &Path) -> Result<SqliteStorage> {
    if !db_path.exists() {
        return Err(Error::Command(format!(
            "No database at {}. Run `daily-english init` first.",
            db_path.display()
        )));
    }
    Ok(SqliteStorage::open(db_path)?)
}

/// Wires the services over `storage`, with LLM settings from the
/// environment.
fn build_services(storage: SqliteStorage, prompt_dir: Option<&Path>) -> Result<Services> {
    let mut builder = LlmConfig::builder();
    if let Some(dir) = prompt_dir {
        builder = builder.prompt_dir(dir);
    }
    let config = builder.from_env().build()?;
    let prompts = PromptSet::load(config.prompt_dir.as_deref());
    let gateway = LlmGateway::new(config)?;
    let ctx = AgentContext::new(Arc::new(gateway), Arc::new(prompts));
    Ok(Services::new(
        Arc::new(storage),
        Arc::new(AgentStages::new(&ctx)),
    ))
}

fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Runtime::new()
        .map_err(|e| Error::Command(format!("Failed to create async runtime: {e}")))
}

fn read_content(file: &Path) -> Result<String> {
    let content = if file.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        std::fs::read_to_string(file)?
    };
    if content.trim().is_empty() {
        return Err(Error::Command(format!("{} is empty", file.display())));
    }
    Ok(content)
}

fn parse_domain(s: &str) -> Result<Domain> {
    Domain::parse(s).ok_or_else(|| {
        let known: Vec<_> = Domain::ALL.iter().map(Domain::as_str).collect();
        Error::Command(format!("Unknown domain '{}' (expected one of: {})", s, known.join(", ")))
    })
}

fn parse_difficulty(s: &str) -> Result<Difficulty> {
    Difficulty::parse(s).ok_or_else(|| {
        let known: Vec<_> = Difficulty::ALL.iter().map(Difficulty::as_str).collect();
        Error::Command(format!(
            "Unknown difficulty '{}' (expected one of: {})",
            s,
            known.join(", ")
        ))
    })
}

// ==================== Command Implementations ====================

fn cmd_init(db_path: &Path, force: bool, format: OutputFormat) -> Result<String> {
    if db_path.exists() && !force {
        return Err(Error::Command(
            "Database already exists. Use --force to reinitialize.".to_string(),
        ));
    }

    if let Some(parent) = db_path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        std::fs::create_dir_all(parent)
            .map_err(|e| Error::Command(format!("Failed to create directory: {e}")))?;
    }

    if force && db_path.exists() {
        std::fs::remove_file(db_path)
            .map_err(|e| Error::Command(format!("Failed to remove existing database: {e}")))?;
    }

    // Opening runs the migrations.
    SqliteStorage::open(db_path)?;

    match format {
        OutputFormat::Text => Ok(format!(
            "Initialized database at: {}\n",
            db_path.display()
        )),
        OutputFormat::Json => {
            let json = serde_json::json!({
                "success": true,
                "path": db_path.to_string_lossy(),
                "force": force
            });
            Ok(format.to_json(&json))
        }
    }
}

/// Starts the API server and blocks until it shuts down.
fn cmd_serve(
    db_path: &Path,
    prompt_dir: Option<&Path>,
    host: Option<&str>,
    port: Option<u16>,
) -> Result<String> {
    let mut config = ServerConfig::from_env();
    config.database_path = db_path.to_path_buf();
    if let Some(host) = host {
        config.host = host.to_string();
    }
    if let Some(port) = port {
        config.port = port;
    }

    if let Some(parent) = db_path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    let services = build_services(SqliteStorage::open(db_path)?, prompt_dir)?;

    runtime()?
        .block_on(serve(
            AppState::new(services),
            &config,
            CancellationToken::new(),
        ))
        .map_err(|e| Error::Command(format!("Server error: {e}")))?;

    Ok(String::new())
}

fn cmd_init_prompts(dir: Option<&Path>, format: OutputFormat) -> Result<String> {
    let target_dir = dir
        .map(Path::to_path_buf)
        .or_else(PromptSet::default_dir)
        .ok_or_else(|| {
            Error::Command(
                "Could not determine home directory for default prompt path".to_string(),
            )
        })?;

    let written = PromptSet::write_defaults(&target_dir)
        .map_err(|e| Error::Command(format!("Failed to write prompt templates: {e}")))?;

    Ok(format_prompts_written(&target_dir, &written, format))
}
