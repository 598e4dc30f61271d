use crate::api::auth::check_token;
use crate::api::client::RequestResult;
use crate::api::handle::{ResourceHandle, ResourceKind};
use crate::api::{ApiSession, CreateOutcome};
use crate::cli::args::*;
use crate::cli::completions::handle_completion_command;
use crate::config::ServerRegistry;
use crate::storage::HandleCache;
use crate::utils::errors::{CertifyError, Result};
use crate::utils::output::OutputFormat;
use crate::utils::paths::AppPaths;
use crate::workflow::{self, ConsoleNotifier, ConsoleReporter};
use serde_json::Value;
use std::fs;
use std::io;
use std::path::PathBuf;

/// Dispatch a parsed command line. Returns the process exit code.
pub async fn handle_command(cli: Cli) -> Result<i32> {
    // Initialize logging - always to stderr
    if !cli.quiet {
        let log_level = match cli.verbose {
            0 => "certifyme_rs=warn",  // Default: warnings only
            1 => "certifyme_rs=info",  // -v: info level
            2 => "certifyme_rs=debug", // -vv: debug level
            _ => "certifyme_rs=trace", // -vvv+: trace level
        };

        tracing_subscriber::fmt()
            .with_writer(io::stderr)
            .with_env_filter(log_level)
            .init();
    }

    let output = OutputFormat::new(cli.raw);

    match cli.command {
        Commands::Completion { ref command } => {
            handle_completion_command(command)?;
            Ok(0)
        }
        Commands::Cache { ref command } => {
            crate::cache::handle_cache_commands(command, &cli.server, &output)?;
            Ok(0)
        }
        Commands::Servers { ref command } => {
            let registry = load_registry(&cli)?;
            match command {
                ServersCommands::List => list_servers(&registry, &output),
            }
            Ok(0)
        }
        Commands::Run { ref servers, all } => {
            let registry = load_registry(&cli)?;
            let keys = run_targets(&registry, servers, all, &cli.server)?;
            run_workflow(&cli, &registry, &keys).await
        }
        Commands::Auth { ref command } => {
            let session = open_session(&cli, &load_registry(&cli)?, &cli.server)?;
            match command {
                AuthCommands::Check => {
                    let status = check_token(&session).await;
                    println!("{}: {status}", cli.server);
                    Ok(if status.is_valid() { 0 } else { 1 })
                }
            }
        }
        Commands::Credential { ref command } => {
            let session = open_session(&cli, &load_registry(&cli)?, &cli.server)?;
            handle_credential_command(command, &session, &output).await
        }
        Commands::Template { ref command } => {
            let session = open_session(&cli, &load_registry(&cli)?, &cli.server)?;
            handle_template_command(command, &session, &output).await
        }
        Commands::Folder { ref command } => {
            let session = open_session(&cli, &load_registry(&cli)?, &cli.server)?;
            handle_folder_command(command, &session, &output).await
        }
        Commands::Analytics { ref command } => {
            let session = open_session(&cli, &load_registry(&cli)?, &cli.server)?;
            match command {
                AnalyticsCommands::Template { id } => {
                    let handle = ResourceHandle::server(ResourceKind::Template, id);
                    let result = session.analytics().template(&handle).await;
                    Ok(print_result(&result, &output))
                }
            }
        }
    }
}

fn load_registry(cli: &Cli) -> Result<ServerRegistry> {
    ServerRegistry::load(&config_path(cli.config.as_deref())?)
}

fn config_path(flag: Option<&str>) -> Result<PathBuf> {
    match flag {
        Some(path) => AppPaths::expand_home(path),
        None => AppPaths::servers_file(),
    }
}

/// Resolve a profile and build its session, with the handle cache attached
fn open_session(cli: &Cli, registry: &ServerRegistry, key: &str) -> Result<ApiSession> {
    let profile = if cli.prompt_token {
        if registry.entry(key).is_none() {
            return Err(CertifyError::ServerNotFound(key.to_string()));
        }
        let token = rpassword::prompt_password(format!("API token for '{key}': "))
            .map_err(|e| CertifyError::Auth(format!("Failed to read token: {e}")))?;
        let token = token.trim().to_string();
        if token.is_empty() {
            return Err(CertifyError::Auth("Empty token".to_string()));
        }
        registry.resolve_with(key, |_| Some(token.clone()))?
    } else {
        registry.profile(key)?
    };
    tracing::debug!("Using profile {profile:?}");

    let session = ApiSession::new(profile)?;
    match HandleCache::for_server(key) {
        Ok(cache) => Ok(session.with_cache(cache)),
        Err(e) => {
            tracing::warn!("Handle cache unavailable for '{key}': {e}");
            Ok(session)
        }
    }
}

/// Servers a `run` targets: every configured one, the `--on` list, or `--server`
fn run_targets(
    registry: &ServerRegistry,
    servers: &[String],
    all: bool,
    default_server: &str,
) -> Result<Vec<String>> {
    let keys = if all {
        registry.keys()
    } else if servers.is_empty() {
        vec![default_server.to_string()]
    } else {
        servers.to_vec()
    };
    if keys.is_empty() {
        return Err(CertifyError::Config("No servers configured".to_string()));
    }
    Ok(keys)
}

async fn run_workflow(cli: &Cli, registry: &ServerRegistry, keys: &[String]) -> Result<i32> {
    let reporter = ConsoleReporter::new(cli.quiet);
    let results = workflow::run_sequentially(
        keys,
        |key: &str| open_session(cli, registry, key),
        registry.workflow(),
        &reporter,
        &ConsoleNotifier,
    )
    .await;

    let failed: Vec<&str> = results
        .iter()
        .filter(|r| !r.success())
        .map(|r| r.server.as_str())
        .collect();
    if failed.is_empty() {
        Ok(0)
    } else {
        tracing::error!("Workflow failed on: {}", failed.join(", "));
        Ok(1)
    }
}

async fn handle_credential_command(
    command: &CredentialCommands,
    session: &ApiSession,
    output: &OutputFormat,
) -> Result<i32> {
    let credentials = session.credentials();
    let handle = |id: &String| ResourceHandle::server(ResourceKind::Credential, id.as_str());

    let code = match command {
        CredentialCommands::Create { payload } => {
            let outcome = credentials.create(&parse_payload(payload)?).await;
            print_created(&outcome, output)
        }
        CredentialCommands::Get { id } => print_result(&credentials.get(&handle(id)).await, output),
        CredentialCommands::Edit { id, payload } => {
            let payload = payload.as_deref().map(parse_payload).transpose()?;
            print_result(&credentials.edit(&handle(id), payload.as_ref()).await, output)
        }
        CredentialCommands::Delete { id } => {
            print_result(&credentials.delete(&handle(id)).await, output)
        }
    };
    Ok(code)
}

async fn handle_template_command(
    command: &TemplateCommands,
    session: &ApiSession,
    output: &OutputFormat,
) -> Result<i32> {
    let templates = session.templates();
    let handle = |id: &String| ResourceHandle::server(ResourceKind::Template, id.as_str());

    let code = match command {
        TemplateCommands::Create { payload } => {
            let outcome = templates.create(&parse_payload(payload)?).await;
            print_created(&outcome, output)
        }
        TemplateCommands::Get { id } => print_result(&templates.get(&handle(id)).await, output),
        TemplateCommands::Edit { id, payload } => {
            let payload = payload.as_deref().map(parse_payload).transpose()?;
            print_result(&templates.edit(&handle(id), payload.as_ref()).await, output)
        }
        TemplateCommands::Delete { id } => print_result(&templates.delete(&handle(id)).await, output),
        TemplateCommands::Copy { id, payload } => {
            let payload = parse_payload(payload)?;
            print_result(&templates.copy(&handle(id), &payload).await, output)
        }
        TemplateCommands::List { institution_id } => {
            print_result(&templates.list_all(institution_id).await, output)
        }
        TemplateCommands::Credentials { id } => {
            print_result(&templates.credentials(&handle(id)).await, output)
        }
    };
    Ok(code)
}

async fn handle_folder_command(
    command: &FolderCommands,
    session: &ApiSession,
    output: &OutputFormat,
) -> Result<i32> {
    let folders = session.folders();
    let handle = |id: &String| ResourceHandle::server(ResourceKind::Folder, id.as_str());

    let code = match command {
        FolderCommands::Create { name, extra } => {
            let extra = extra.as_deref().map(parse_payload).transpose()?;
            let outcome = folders.create(name, extra.as_ref()).await;
            print_created(&outcome, output)
        }
        FolderCommands::Get { id } => print_result(&folders.get(&handle(id)).await, output),
        FolderCommands::List { institution_id } => {
            print_result(&folders.list_all(institution_id).await, output)
        }
        FolderCommands::Delete { id } => print_result(&folders.delete(&handle(id)).await, output),
    };
    Ok(code)
}

/// Parse a JSON argument; `@path` reads the JSON from a file
fn parse_payload(arg: &str) -> Result<Value> {
    let content = match arg.strip_prefix('@') {
        Some(path) => fs::read_to_string(AppPaths::expand_home(path)?)?,
        None => arg.to_string(),
    };
    serde_json::from_str(&content)
        .map_err(|e| CertifyError::InvalidInput(format!("Payload is not valid JSON: {e}")))
}

/// Print status and body; the exit code follows the outcome
fn print_result(result: &RequestResult, output: &OutputFormat) -> i32 {
    if result.succeeded {
        eprintln!("Status: {}", result.status_code);
    } else {
        eprintln!("Failed: {}", result.summary());
    }
    if let Some(body) = &result.body {
        output.print_json(&body.to_value());
    }
    if result.succeeded {
        0
    } else {
        1
    }
}

fn print_created(outcome: &CreateOutcome, output: &OutputFormat) -> i32 {
    let code = print_result(&outcome.result, output);
    if let Some(handle) = &outcome.handle {
        if handle.is_verified() {
            output.print_key_value(&[("id", handle.id())]);
        } else {
            eprintln!(
                "Warning: no identifier in the response, placeholder {} is not usable",
                handle.id()
            );
        }
    }
    code
}

fn list_servers(registry: &ServerRegistry, output: &OutputFormat) {
    let mut rows = vec![vec![
        "KEY".to_string(),
        "BASE_URL".to_string(),
        "TIMEOUT".to_string(),
        "AUTH".to_string(),
        "TOKEN".to_string(),
    ]];

    for key in registry.keys() {
        let Some(entry) = registry.entry(&key) else {
            continue;
        };
        let fingerprint = registry
            .profile(&key)
            .map(|profile| profile.token_fingerprint())
            .unwrap_or_else(|_| "missing".to_string());
        rows.push(vec![
            key.clone(),
            entry.base_url.clone(),
            format!("{}s", entry.timeout_secs),
            entry.auth_scheme.to_string(),
            fingerprint,
        ]);
    }

    output.print_table(&rows);
}
