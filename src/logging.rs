//! Logging System
//!
//! Structured logging through `tracing`. The `[logging]` section picks level, format
//! and destination; the `AGENTRY_LOG*` environment variables override it.
//!
//! Discovery, resolution fallbacks and agent execution log under their module
//! targets (`agentry::registry`, `agentry::compat`, `agentry::agent`), so
//! `modules = { "agentry::compat" = "debug" }` surfaces every legacy-layout hit.

use crate::error::RegistryError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::fmt::writer::{BoxMakeWriter, MakeWriterExt};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

const ENV_FILTER: &str = "AGENTRY_LOG";
const ENV_FORMAT: &str = "AGENTRY_LOG_FORMAT";
const ENV_OUTPUT: &str = "AGENTRY_LOG_OUTPUT";
const ENV_MODULES: &str = "AGENTRY_LOG_MODULES";
const ENV_FILE: &str = "AGENTRY_LOG_FILE";

/// Logging configuration (`[logging]`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// trace, debug, info, warn, error or off
    #[serde(default = "default_log_level")]
    pub level: String,

    /// json or text
    #[serde(default = "default_format")]
    pub format: String,

    /// stdout, stderr, file, file+stderr or both
    #[serde(default = "default_output")]
    pub output: String,

    /// Log file when the output includes a file; unset means the platform state dir
    #[serde(default)]
    pub file: Option<PathBuf>,

    /// ANSI colors for text output to a terminal stream
    #[serde(default = "default_true")]
    pub color: bool,

    /// Per-target levels, e.g. `agentry::registry = "debug"`
    #[serde(default)]
    pub modules: HashMap<String, String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_format() -> String {
    "text".to_string()
}

fn default_output() -> String {
    "stderr".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_log_level(),
            format: default_format(),
            output: default_output(),
            file: None,
            color: true,
            modules: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LogFormat {
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(RegistryError::ConfigError(format!(
                "Invalid log format: {} (must be 'json' or 'text')",
                other
            ))),
        }
    }
}

/// Where log lines go
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LogOutput {
    Stdout,
    Stderr,
    File,
    FileAndStderr,
    StdoutAndStderr,
}

impl LogOutput {
    fn writes_file(self) -> bool {
        matches!(self, LogOutput::File | LogOutput::FileAndStderr)
    }
}

impl FromStr for LogOutput {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "stdout" => Ok(LogOutput::Stdout),
            "stderr" => Ok(LogOutput::Stderr),
            "file" => Ok(LogOutput::File),
            "file+stderr" => Ok(LogOutput::FileAndStderr),
            "both" => Ok(LogOutput::StdoutAndStderr),
            other => Err(RegistryError::ConfigError(format!(
                "Invalid log output: {} (expected stdout, stderr, file, file+stderr or both)",
                other
            ))),
        }
    }
}

/// Non-empty value of an environment variable
fn env_value(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Log file location. Precedence: explicit path, `AGENTRY_LOG_FILE`, config, default.
///
/// The default lives in the platform state directory, namespaced by the canonical
/// workspace path when one is given.
pub fn resolve_log_file_path(
    explicit: Option<PathBuf>,
    configured: Option<PathBuf>,
    workspace: Option<&Path>,
) -> Result<PathBuf, RegistryError> {
    let non_empty = |p: &PathBuf| !p.as_os_str().is_empty();
    if let Some(path) = explicit.filter(non_empty) {
        return Ok(path);
    }
    if let Some(path) = env_value(ENV_FILE) {
        return Ok(PathBuf::from(path));
    }
    if let Some(path) = configured.filter(non_empty) {
        return Ok(path);
    }

    let state_dir = directories::ProjectDirs::from("", "agentry", "agentry")
        .and_then(|dirs| dirs.state_dir().map(Path::to_path_buf))
        .ok_or_else(|| {
            RegistryError::ConfigError(
                "Platform state directory not available for log file".to_string(),
            )
        })?;

    let mut dir = state_dir;
    if let Some(ws) = workspace {
        let canonical = dunce::canonicalize(ws).map_err(|e| RegistryError::io(ws, e))?;
        dir.extend(canonical.components().filter_map(|c| match c {
            std::path::Component::Normal(name) => Some(name),
            _ => None,
        }));
    }
    Ok(dir.join("agentry.log"))
}

/// Install the global subscriber.
///
/// Environment variables beat the configuration; the binary folds its CLI flags
/// into the configuration before calling this. A second call fails rather than
/// replacing the installed subscriber.
pub fn init_logging(config: Option<&LoggingConfig>) -> Result<(), RegistryError> {
    let defaults = LoggingConfig::default();
    let config = config.unwrap_or(&defaults);
    let installed = |e: tracing_subscriber::util::TryInitError| {
        RegistryError::ConfigError(format!("Failed to init logging: {}", e))
    };

    if !config.enabled {
        return Registry::default()
            .with(EnvFilter::new("off"))
            .with(fmt::layer().with_writer(std::io::sink))
            .try_init()
            .map_err(installed);
    }

    let filter = build_env_filter(config)?;
    let format = match env_value(ENV_FORMAT).and_then(|f| f.parse::<LogFormat>().ok()) {
        Some(format) => format,
        None => config.format.parse::<LogFormat>()?,
    };
    let output = match env_value(ENV_OUTPUT) {
        Some(output) => output.parse::<LogOutput>()?,
        None => config.output.parse::<LogOutput>()?,
    };

    let writer = match output {
        LogOutput::Stdout => BoxMakeWriter::new(std::io::stdout),
        LogOutput::Stderr => BoxMakeWriter::new(std::io::stderr),
        LogOutput::StdoutAndStderr => BoxMakeWriter::new(std::io::stdout.and(std::io::stderr)),
        LogOutput::File => BoxMakeWriter::new(open_log_file(config)?),
        LogOutput::FileAndStderr => {
            BoxMakeWriter::new(open_log_file(config)?.and(std::io::stderr))
        }
    };

    let subscriber = Registry::default().with(filter);
    let result = match format {
        LogFormat::Json => subscriber
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_writer(writer),
            )
            .try_init(),
        LogFormat::Text => subscriber
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_ansi(config.color && !output.writes_file())
                    .with_writer(writer),
            )
            .try_init(),
    };
    result.map_err(installed)
}

fn open_log_file(config: &LoggingConfig) -> Result<std::sync::Mutex<std::fs::File>, RegistryError> {
    let path = resolve_log_file_path(None, config.file.clone(), None)?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| RegistryError::io(parent, e))?;
    }
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(|e| RegistryError::io(&path, e))?;
    Ok(std::sync::Mutex::new(file))
}

/// `AGENTRY_LOG` replaces everything; otherwise the base level plus per-module
/// directives from the config and then from `AGENTRY_LOG_MODULES`.
fn build_env_filter(config: &LoggingConfig) -> Result<EnvFilter, RegistryError> {
    if let Ok(filter) = EnvFilter::try_from_env(ENV_FILTER) {
        return Ok(filter);
    }
    if config.level == "off" {
        return Ok(EnvFilter::new("off"));
    }

    let mut directives: Vec<(String, String)> = config
        .modules
        .iter()
        .map(|(module, level)| (module.clone(), level.clone()))
        .collect();
    directives.sort();
    if let Some(modules) = env_value(ENV_MODULES) {
        directives.extend(parse_module_levels(&modules));
    }

    directives
        .into_iter()
        .try_fold(EnvFilter::new(&config.level), |filter, (module, level)| {
            let directive = format!("{}={}", module, level).parse().map_err(|e| {
                RegistryError::ConfigError(format!(
                    "Invalid log directive '{}={}': {}",
                    module, level, e
                ))
            })?;
            Ok(filter.add_directive(directive))
        })
}

/// `agentry::registry=debug,agentry::llm=trace` -> pairs; malformed entries are ignored.
fn parse_module_levels(list: &str) -> Vec<(String, String)> {
    list.split(',')
        .filter_map(|entry| entry.split_once('='))
        .map(|(module, level)| (module.trim().to_string(), level.trim().to_string()))
        .filter(|(module, level)| !module.is_empty() && !level.is_empty())
        .collect()
}
