//! Application configuration for ClarifyMD.
//!
//! User config lives at `~/.clarifymd/clarifymd.toml`.
//! CLI flags override config file values, which override defaults.
//! The gateway endpoint and API key are never stored in the file: the config
//! only names the environment variables they are read from.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ClarifyError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "clarifymd.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".clarifymd";

// ---------------------------------------------------------------------------
// Config structs (matching clarifymd.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Gemini endpoint settings.
    #[serde(default)]
    pub gemini: GeminiConfig,

    /// CLI output preferences.
    #[serde(default)]
    pub output: OutputConfig,
}

/// `[gemini]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    /// Name of the env var holding the full `generateContent` endpoint URL.
    #[serde(default = "default_base_url_env")]
    pub base_url_env: String,

    /// Name of the env var holding the API key (never store the key itself).
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            base_url_env: default_base_url_env(),
            api_key_env: default_api_key_env(),
        }
    }
}

fn default_base_url_env() -> String {
    "GEMINI_BASE_URL".into()
}
fn default_api_key_env() -> String {
    "GEMINI_API_KEY".into()
}

/// How the CLI renders a settled run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// `[output]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Default rendering of analysis results.
    #[serde(default)]
    pub format: OutputFormat,

    /// Read explanations aloud after a run settles.
    #[serde(default)]
    pub speak: bool,
}

// ---------------------------------------------------------------------------
// Gateway settings (runtime, resolved from the environment)
// ---------------------------------------------------------------------------

/// Endpoint and credentials for the language-model gateway.
///
/// Missing environment values resolve to empty strings; the gateway reports
/// them when a call is made, not at startup.
#[derive(Clone, Default)]
pub struct GatewaySettings {
    /// Full endpoint URL, without the `key` query parameter.
    pub base_url: String,
    /// API key sent as the `key` query parameter.
    pub api_key: String,
}

impl GatewaySettings {
    /// Resolve settings from the process environment.
    pub fn from_env(config: &AppConfig) -> Self {
        Self::resolve(config, |name| std::env::var(name).ok())
    }

    /// Resolve settings through an arbitrary variable lookup.
    pub fn resolve(config: &AppConfig, lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            base_url: lookup(&config.gemini.base_url_env).unwrap_or_default(),
            api_key: lookup(&config.gemini.api_key_env).unwrap_or_default(),
        }
    }
}

impl std::fmt::Debug for GatewaySettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewaySettings")
            .field("base_url", &self.base_url)
            .field("api_key", &if self.api_key.is_empty() { "<unset>" } else { "<redacted>" })
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.clarifymd/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| ClarifyError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.clarifymd/clarifymd.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| ClarifyError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| ClarifyError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| ClarifyError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| ClarifyError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| ClarifyError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}
