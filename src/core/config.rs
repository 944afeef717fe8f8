//! # Configuration
//!
//! Centralizes all settings with a clear override hierarchy:
//! defaults → config file → env vars → CLI flags.
//!
//! Config lives at `~/.banter/config.toml`. If missing on first run, a
//! commented-out default is generated so users can discover all options.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::PathBuf;

// ============================================================================
// Config Structs (all fields Option<T> for sparse TOML)
// ============================================================================

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct BanterConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub anthropic: AnthropicConfig,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct GeneralConfig {
    pub model: Option<String>,
    pub max_output_tokens: Option<u32>,
    pub system_prompt: Option<String>,
    pub system_prompt_file: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct AnthropicConfig {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
}

// ============================================================================
// Defaults
// ============================================================================

pub const DEFAULT_MODEL: &str = "claude-3-5-sonnet-20240620";
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 4096;
pub const DEFAULT_ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";

const DEFAULT_SYSTEM_PROMPT: &str = "You are a patient coding tutor chatting in a terminal. \
    Your student is a professional writer learning to program and to build AI tools. \
    Keep responses complete yet concise, prefer worked examples over abstract explanation, \
    and ask a disambiguation question when the request is unclear.";

// ============================================================================
// Resolved Config (concrete values, no Options)
// ============================================================================

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub model_name: String,
    pub max_output_tokens: u32,
    pub system_prompt: String,
    pub api_key: Option<String>,
    pub base_url: String,
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "config I/O error: {e}"),
            ConfigError::Parse(e) => write!(f, "config parse error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Loading
// ============================================================================

/// Returns the path to `~/.banter/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".banter").join("config.toml"))
}

/// Load config from `~/.banter/config.toml`.
///
/// If the file doesn't exist, generates a commented-out default and
/// returns `BanterConfig::default()`. If it exists but is malformed,
/// returns `ConfigError::Parse`.
pub fn load_config() -> Result<BanterConfig, ConfigError> {
    let path = match config_path() {
        Some(p) => p,
        None => {
            warn!("Could not determine home directory, using default config");
            return Ok(BanterConfig::default());
        }
    };

    if !path.exists() {
        info!("No config file found, generating default at {}", path.display());
        generate_default_config(&path);
        return Ok(BanterConfig::default());
    }

    let contents = fs::read_to_string(&path).map_err(ConfigError::Io)?;
    let config: BanterConfig = toml::from_str(&contents).map_err(ConfigError::Parse)?;
    info!("Loaded config from {}", path.display());
    debug!("Config: {:?}", config);
    Ok(config)
}

/// Generates a commented-out default config file at the given path.
fn generate_default_config(path: &PathBuf) {
    let default_content = r#"# Banter Configuration
# All settings are optional - defaults are used for anything not specified.
# Override hierarchy: defaults → this file → env vars → CLI flags.

# [general]
# model = "claude-3-5-sonnet-20240620"
# max_output_tokens = 4096
# system_prompt = "You are a helpful assistant."
# system_prompt_file = "system.md"   # Path relative to ~/.banter/

# [anthropic]
# api_key = "sk-ant-..."             # Or set ANTHROPIC_API_KEY env var
# base_url = "https://api.anthropic.com"
"#;

    if let Some(parent) = path.parent() {
        if let Err(e) = fs::create_dir_all(parent) {
            warn!("Failed to create config directory: {}", e);
            return;
        }
    }
    if let Err(e) = fs::write(path, default_content) {
        warn!("Failed to write default config: {}", e);
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// Resolve the final config by collapsing: defaults → config file → env vars → CLI.
///
/// `cli_model` is from the `--model` flag (None = not specified).
pub fn resolve(config: &BanterConfig, cli_model: Option<&str>) -> ResolvedConfig {
    // Model: CLI → env → config → default
    let model_name = cli_model
        .map(|s| s.to_string())
        .or_else(|| std::env::var("BANTER_MODEL").ok())
        .or_else(|| config.general.model.clone())
        .unwrap_or_else(|| DEFAULT_MODEL.to_string());

    // System prompt: inline config wins over file, both win over default
    let system_prompt = resolve_system_prompt(config);

    // API key: env → config
    let api_key = std::env::var("ANTHROPIC_API_KEY")
        .ok()
        .or_else(|| config.anthropic.api_key.clone());

    // Base URL: env → config → default
    let base_url = std::env::var("ANTHROPIC_BASE_URL")
        .ok()
        .or_else(|| config.anthropic.base_url.clone())
        .unwrap_or_else(|| DEFAULT_ANTHROPIC_BASE_URL.to_string());

    ResolvedConfig {
        model_name,
        max_output_tokens: config
            .general
            .max_output_tokens
            .unwrap_or(DEFAULT_MAX_OUTPUT_TOKENS),
        system_prompt,
        api_key,
        base_url,
    }
}

/// Resolves the system prompt: inline wins over file, both win over default.
fn resolve_system_prompt(config: &BanterConfig) -> String {
    // Inline system_prompt takes priority
    if let Some(ref prompt) = config.general.system_prompt {
        return prompt.clone();
    }

    // Try loading from system_prompt_file (relative to ~/.banter/)
    if let Some(ref file) = config.general.system_prompt_file {
        if let Some(home) = dirs::home_dir() {
            let prompt_path = home.join(".banter").join(file);
            match fs::read_to_string(&prompt_path) {
                Ok(contents) => {
                    let trimmed = contents.trim().to_string();
                    if !trimmed.is_empty() {
                        info!("Loaded system prompt from {}", prompt_path.display());
                        return trimmed;
                    }
                    warn!("System prompt file is empty: {}", prompt_path.display());
                }
                Err(e) => {
                    warn!(
                        "Failed to read system prompt file {}: {}",
                        prompt_path.display(),
                        e
                    );
                }
            }
        }
    }

    DEFAULT_SYSTEM_PROMPT.to_string()
}
