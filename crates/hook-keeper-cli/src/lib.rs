//! # Hook-Keeper CLI
//!
//! Command-line interface for the Hook-Keeper webhook configuration core.
//!
//! This module provides CLI commands for:
//! - Validating a webhook payload file, optionally saving it to a store file
//! - Showing the masked view of a stored webhook
//! - Listing the configured presets
//! - Printing the resolved CLI configuration
//! - Generating shell completions
//!
//! Command output goes to stdout; logs go to stderr.

use anyhow::Context;
use clap::{CommandFactory, Parser, Subcommand};
use hook_keeper_core::{
    ConfigurationValidator, EntityLookup, FieldErrors, InMemoryWebhookStore,
    JinjaTemplateEvaluator, LookupError, OrganizationId, PresetError, PresetTable,
    RequestContext, StoreError, TeamId, UserId, ValidatorSettings, WebhookConfig,
    WebhookConfigError, WebhookId, WebhookPayload, WebhookView,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{
    io::Write,
    path::{Path, PathBuf},
};
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

// ============================================================================
// CLI Structure
// ============================================================================

/// Hook-Keeper CLI - Validation for outbound webhook configurations
#[derive(Parser)]
#[command(name = "hook-keeper")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Validate and inspect outbound webhook configurations")]
#[command(
    long_about = "Hook-Keeper validates webhook configurations: templates are checked against a synthetic payload, secrets are masked and restored, and presets control which fields apply"
)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "HOOK_KEEPER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Logging level, overrides the configured level
    #[arg(short, long)]
    pub log_level: Option<String>,

    /// Enable JSON logging
    #[arg(long)]
    pub json_logs: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Validate a webhook payload file
    Validate(ValidateArgs),

    /// Show the masked view of a stored webhook
    Show {
        /// Public identifier of the webhook
        webhook: String,

        /// Organization owning the webhook
        #[arg(short, long, env = "HOOK_KEEPER_ORGANIZATION")]
        organization: String,

        /// Store snapshot file
        #[arg(short, long)]
        store: Option<PathBuf>,

        /// Output format
        #[arg(short, long)]
        format: Option<OutputFormat>,
    },

    /// Preset commands
    Presets {
        #[command(subcommand)]
        action: PresetCommands,
    },

    /// Show the resolved configuration
    Config {
        /// Output format
        #[arg(short, long)]
        format: Option<OutputFormat>,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Arguments of the validate command
#[derive(clap::Args, Debug)]
pub struct ValidateArgs {
    /// Payload file (JSON, or YAML with a .yaml/.yml extension)
    pub payload: PathBuf,

    /// Organization the request is made for
    #[arg(short, long, env = "HOOK_KEEPER_ORGANIZATION")]
    pub organization: String,

    /// User making the request
    #[arg(short, long, env = "HOOK_KEEPER_USER")]
    pub user: String,

    /// Current team of the user
    #[arg(short, long)]
    pub team: Option<String>,

    /// Stored webhook being updated
    #[arg(short, long)]
    pub webhook: Option<String>,

    /// Store snapshot file
    #[arg(short, long)]
    pub store: Option<PathBuf>,

    /// Persist the validated webhook to the store file
    #[arg(long)]
    pub save: bool,

    /// Output format
    #[arg(short, long)]
    pub format: Option<OutputFormat>,
}

/// Preset subcommands
#[derive(Subcommand)]
pub enum PresetCommands {
    /// List every known preset
    List {
        /// Output format
        #[arg(short, long)]
        format: Option<OutputFormat>,
    },
}

/// Output format options
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// YAML output
    Yaml,
}

// ============================================================================
// CLI Error Types
// ============================================================================

/// CLI-specific errors
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),

    #[error("Webhook configuration rejected: {count} invalid field(s)")]
    Rejected { count: usize },

    #[error("{}", .0.get_user_message())]
    Webhook(#[from] WebhookConfigError),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Lookup error: {0}")]
    Lookup(#[from] LookupError),

    #[error("Preset error: {0}")]
    Preset(#[from] PresetError),

    #[error("Invalid argument: {arg} - {message}")]
    InvalidArgument { arg: String, message: String },

    #[error("Invalid input: {0:#}")]
    Input(#[from] anyhow::Error),

    #[error("Output error: {message}")]
    Output { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration could not be loaded: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid log level '{level}': {message}")]
    InvalidLogLevel { level: String, message: String },

    #[error("Logging could not be initialized: {message}")]
    Logging { message: String },
}

// ============================================================================
// Configuration Types
// ============================================================================

/// Configuration settings for the CLI
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct CliConfig {
    /// Logging configuration
    pub logging: LoggingConfig,

    /// Output preferences
    pub output: OutputConfig,

    /// Preset table file; the built-in presets are used when unset
    pub presets_file: Option<PathBuf>,

    /// Store snapshot used when a command gets no `--store`
    pub store_file: Option<PathBuf>,

    /// Validator behaviour
    pub validator: ValidatorSettings,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter used when `RUST_LOG` is unset
    pub level: String,

    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: LogFormat::Text,
        }
    }
}

/// Log output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum LogFormat {
    #[serde(rename = "text")]
    Text,
    #[serde(rename = "json")]
    Json,
}

/// Output preferences
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Format used when a command gets no `--format`
    pub default_format: OutputFormat,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            default_format: OutputFormat::Json,
        }
    }
}

/// Load configuration from all sources
///
/// Sources, later ones overriding earlier ones:
/// 1. `<config dir>/hook-keeper/config.{toml,yaml,json}` if present
/// 2. The explicit file, which must exist
/// 3. Environment variables prefixed `HOOK_KEEPER__`, e.g.
///    `HOOK_KEEPER__LOGGING__LEVEL=debug`
pub fn load_configuration(explicit: Option<&Path>) -> Result<CliConfig, ConfigError> {
    let mut builder = config::Config::builder();

    if let Some(dir) = dirs::config_dir() {
        let default_path = dir.join("hook-keeper").join("config");
        builder = builder.add_source(
            config::File::with_name(&default_path.to_string_lossy()).required(false),
        );
    }

    if let Some(path) = explicit {
        builder = builder.add_source(config::File::from(path).required(true));
    }

    let config = builder
        .add_source(config::Environment::with_prefix("HOOK_KEEPER").separator("__"))
        .build()?;

    Ok(config.try_deserialize()?)
}

/// Install the global tracing subscriber, writing to stderr
pub fn initialize_logging(level: &str, format: LogFormat) -> Result<(), ConfigError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .map_err(|e| ConfigError::InvalidLogLevel {
            level: level.to_string(),
            message: e.to_string(),
        })?;

    let registry = tracing_subscriber::registry().with(filter);
    let result = match format {
        LogFormat::Text => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init(),
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .try_init(),
    };

    result.map_err(|e| ConfigError::Logging {
        message: e.to_string(),
    })
}

// ============================================================================
// Main Entry Point
// ============================================================================

/// Parse arguments, load configuration and run the selected command
pub fn run_cli() -> Result<(), CliError> {
    let cli = Cli::parse();

    let config = load_configuration(cli.config.as_deref())?;

    let level = cli
        .log_level
        .clone()
        .unwrap_or_else(|| config.logging.level.clone());
    let format = if cli.json_logs {
        LogFormat::Json
    } else {
        config.logging.format
    };
    initialize_logging(&level, format)?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    execute(cli.command, &config, &mut out)
}

/// Run a command, writing its output to `out`
pub fn execute(command: Commands, config: &CliConfig, out: &mut dyn Write) -> Result<(), CliError> {
    match command {
        Commands::Validate(args) => execute_validate_command(args, config, out),
        Commands::Show {
            webhook,
            organization,
            store,
            format,
        } => execute_show_command(&webhook, &organization, store, format, config, out),
        Commands::Presets { action } => execute_presets_command(action, config, out),
        Commands::Config { format } => {
            emit(out, format.unwrap_or(config.output.default_format), config)
        }
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "hook-keeper", out);
            Ok(())
        }
    }
}

// ============================================================================
// Command Implementations
// ============================================================================

#[derive(Serialize)]
struct Rejection<'a> {
    errors: &'a FieldErrors,
}

fn execute_validate_command(
    args: ValidateArgs,
    config: &CliConfig,
    out: &mut dyn Write,
) -> Result<(), CliError> {
    let format = args.format.unwrap_or(config.output.default_format);
    let store_path = args.store.clone().or_else(|| config.store_file.clone());
    if args.save && store_path.is_none() {
        return Err(CliError::InvalidArgument {
            arg: "save".to_string(),
            message: "a store file is required to save".to_string(),
        });
    }

    let presets = load_presets(config)?;
    let store = open_store(store_path.as_deref())?;
    let ctx = request_context(&args)?;

    let bound = match args.webhook.as_deref() {
        Some(raw) => Some(fetch(&store, &parse_webhook_id(raw)?, &ctx.organization)?),
        None => None,
    };

    let payload: WebhookPayload = read_document(&args.payload)?;
    info!(
        payload = %args.payload.display(),
        organization = %ctx.organization,
        update = bound.is_some(),
        "Validating webhook payload"
    );

    let validator = ConfigurationValidator::new(&presets, JinjaTemplateEvaluator::new(), &store)
        .with_settings(config.validator);
    let normalized = match validator.validate(payload, &ctx, bound.as_ref()) {
        Ok(normalized) => normalized,
        Err(WebhookConfigError::Rejected { errors }) => {
            emit(out, format, &Rejection { errors: &errors })?;
            return Err(CliError::Rejected {
                count: errors.len(),
            });
        }
        Err(e) => return Err(e.into()),
    };

    let webhook = match (store_path, args.save) {
        (Some(path), true) => {
            let stored = match &bound {
                Some(existing) => store.update(&existing.id, normalized)?,
                None => store.create(normalized)?,
            };
            store.save(&path)?;
            stored
        }
        _ => {
            let id = bound
                .as_ref()
                .map_or_else(WebhookId::generate, |b| b.id.clone());
            debug!(webhook = %id, "Rendering unsaved webhook");
            WebhookConfig::from_normalized(id, normalized)
        }
    };

    emit(out, format, &WebhookView::render(&webhook, &store))
}

fn execute_show_command(
    webhook: &str,
    organization: &str,
    store: Option<PathBuf>,
    format: Option<OutputFormat>,
    config: &CliConfig,
    out: &mut dyn Write,
) -> Result<(), CliError> {
    let path = store
        .or_else(|| config.store_file.clone())
        .ok_or_else(|| CliError::InvalidArgument {
            arg: "store".to_string(),
            message: "a store file is required".to_string(),
        })?;

    let organization =
        OrganizationId::new(organization).map_err(|e| invalid_argument("organization", e))?;
    let store = InMemoryWebhookStore::load(&path)?;
    let webhook = fetch(&store, &parse_webhook_id(webhook)?, &organization)?;

    emit(
        out,
        format.unwrap_or(config.output.default_format),
        &WebhookView::render(&webhook, &store),
    )
}

fn execute_presets_command(
    action: PresetCommands,
    config: &CliConfig,
    out: &mut dyn Write,
) -> Result<(), CliError> {
    match action {
        PresetCommands::List { format } => {
            let presets = load_presets(config)?;
            let policies: Vec<_> = presets.policies().collect();
            emit(out, format.unwrap_or(config.output.default_format), &policies)
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn load_presets(config: &CliConfig) -> Result<PresetTable, PresetError> {
    match &config.presets_file {
        Some(path) => {
            debug!(path = %path.display(), "Loading preset table");
            PresetTable::load_from_file(path)
        }
        None => Ok(PresetTable::builtin()),
    }
}

fn open_store(path: Option<&Path>) -> Result<InMemoryWebhookStore, StoreError> {
    match path {
        Some(path) => InMemoryWebhookStore::load(path),
        None => Ok(InMemoryWebhookStore::new()),
    }
}

fn request_context(args: &ValidateArgs) -> Result<RequestContext, CliError> {
    let organization = OrganizationId::new(args.organization.as_str())
        .map_err(|e| invalid_argument("organization", e))?;
    let user = UserId::new(args.user.as_str()).map_err(|e| invalid_argument("user", e))?;
    let team = args
        .team
        .as_deref()
        .map(TeamId::new)
        .transpose()
        .map_err(|e| invalid_argument("team", e))?;

    Ok(RequestContext::new(organization, user, team))
}

fn fetch(
    store: &InMemoryWebhookStore,
    id: &WebhookId,
    organization: &OrganizationId,
) -> Result<WebhookConfig, CliError> {
    store.find(id, organization).map_err(|e| match e {
        LookupError::NotFound { id } => CliError::Store(StoreError::NotFound { id }),
        other => CliError::Lookup(other),
    })
}

fn parse_webhook_id(raw: &str) -> Result<WebhookId, CliError> {
    WebhookId::new(raw).map_err(|e| invalid_argument("webhook", e))
}

fn invalid_argument(arg: &str, err: impl std::fmt::Display) -> CliError {
    CliError::InvalidArgument {
        arg: arg.to_string(),
        message: err.to_string(),
    }
}

/// Read a JSON or YAML document, choosing the parser by extension
fn read_document<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    match path.extension().and_then(|e| e.to_str()) {
        Some("yaml" | "yml") => serde_yaml::from_str(&content)
            .with_context(|| format!("Invalid YAML in {}", path.display())),
        _ => serde_json::from_str(&content)
            .with_context(|| format!("Invalid JSON in {}", path.display())),
    }
}

fn emit<T: Serialize + ?Sized>(
    out: &mut dyn Write,
    format: OutputFormat,
    value: &T,
) -> Result<(), CliError> {
    let rendered = match format {
        OutputFormat::Json => serde_json::to_string_pretty(value).map_err(|e| CliError::Output {
            message: e.to_string(),
        })?,
        OutputFormat::Yaml => serde_yaml::to_string(value).map_err(|e| CliError::Output {
            message: e.to_string(),
        })?,
    };

    writeln!(out, "{}", rendered.trim_end())?;
    Ok(())
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
