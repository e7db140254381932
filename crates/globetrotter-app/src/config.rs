// Configuration loading and parsing (globetrotter.toml).

use std::path::{Path, PathBuf};
use std::time::Duration;

use globetrotter_core::{UserId, DEFAULT_MAX_ROUNDS};
use serde::Deserialize;
use thiserror::Error;

/// File name looked up under `config/` and `defaults/`.
pub const CONFIG_FILE: &str = "globetrotter.toml";

/// Environment variable that overrides `player.user_id`.
pub const USER_ENV_VAR: &str = "GLOBETROTTER_USER";

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// Config structs
// ---------------------------------------------------------------------------

/// Contents of globetrotter.toml. Every section is optional so a partial
/// file falls back to defaults.
#[derive(Debug, Clone, PartialEq, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub game: GameConfig,
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub player: PlayerConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GameConfig {
    /// Questions per game.
    #[serde(default = "default_max_rounds")]
    pub max_rounds: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig {
            max_rounds: default_max_rounds(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ServiceConfig {
    /// Root of the quiz backend API, without a trailing slash.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-request timeout applied by the HTTP client.
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl ServiceConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        ServiceConfig {
            base_url: default_base_url(),
            request_timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Default)]
pub struct PlayerConfig {
    /// Identity issued by the registration flow. Games cannot start without it.
    #[serde(default)]
    pub user_id: Option<String>,
}

impl PlayerConfig {
    pub fn user_id(&self) -> Option<UserId> {
        self.user_id.clone().and_then(UserId::parse)
    }
}

fn default_max_rounds() -> u32 {
    DEFAULT_MAX_ROUNDS
}

fn default_base_url() -> String {
    "http://localhost:5000/api".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Parse and validate a config document.
pub fn parse_config(text: &str, path: &Path) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(text).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })?;
    validate(&config)?;
    Ok(config)
}

/// Load and validate `config/globetrotter.toml` relative to `base_dir`.
///
/// This is the lower-level loading primitive that does not auto-copy defaults.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let path = base_dir.join("config").join(CONFIG_FILE);
    let text = read_file(&path)?;
    parse_config(&text, &path)
}

/// Ensure config files exist by copying missing ones from `defaults/`.
/// Returns the list of files that were copied. Skips `.example` files.
pub fn ensure_config_files(base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let defaults_dir = base_dir.join("defaults");
    let config_dir = base_dir.join("config");

    if !defaults_dir.exists() {
        if !config_dir.exists() {
            return Err(ConfigError::DefaultsCopyError {
                message: format!(
                    "neither defaults/ nor config/ directory found in {}; \
                     run from the project root or ensure defaults/ is present",
                    base_dir.display()
                ),
            });
        }
        return Ok(vec![]);
    }

    std::fs::create_dir_all(&config_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to create config directory: {e}"),
    })?;

    let entries = std::fs::read_dir(&defaults_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to read defaults directory: {e}"),
    })?;

    let mut copied = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| ConfigError::DefaultsCopyError {
            message: format!("failed to read defaults entry: {e}"),
        })?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(file_name) = path.file_name() else {
            continue;
        };
        if file_name.to_str().is_some_and(|n| n.ends_with(".example")) {
            continue;
        }

        let target = config_dir.join(file_name);
        if target.exists() {
            continue;
        }
        std::fs::copy(&path, &target).map_err(|e| ConfigError::DefaultsCopyError {
            message: format!("failed to copy {} to {}: {e}", path.display(), target.display()),
        })?;
        copied.push(target);
    }

    Ok(copied)
}

/// Load config relative to the current working directory, copying defaults
/// first and applying the `GLOBETROTTER_USER` override.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    ensure_config_files(&cwd)?;
    let mut config = load_config_from(&cwd)?;
    if let Ok(user) = std::env::var(USER_ENV_VAR) {
        apply_user_override(&mut config, &user);
    }
    Ok(config)
}

/// Replace the configured player identity when `user` is non-blank.
pub fn apply_user_override(config: &mut Config, user: &str) {
    if let Some(id) = UserId::parse(user) {
        config.player.user_id = Some(id.as_str().to_string());
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.game.max_rounds == 0 {
        return Err(ConfigError::ValidationError {
            field: "game.max_rounds".into(),
            message: "must be greater than 0".into(),
        });
    }

    let url = config.service.base_url.trim();
    if url.is_empty() {
        return Err(ConfigError::ValidationError {
            field: "service.base_url".into(),
            message: "must not be empty".into(),
        });
    }
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(ConfigError::ValidationError {
            field: "service.base_url".into(),
            message: format!("must be an http(s) URL, got `{url}`"),
        });
    }

    if config.service.request_timeout_secs == 0 {
        return Err(ConfigError::ValidationError {
            field: "service.request_timeout_secs".into(),
            message: "must be greater than 0".into(),
        });
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const SAMPLE: &str = r#"
[game]
max_rounds = 7

[service]
base_url = "https://quiz.example.com/api"
request_timeout_secs = 3

[player]
user_id = "65f0c0ffee"
"#;

    #[test]
    fn parses_full_file() {
        let config = parse_config(SAMPLE, Path::new("sample.toml")).unwrap();
        assert_eq!(config.game.max_rounds, 7);
        assert_eq!(config.service.base_url, "https://quiz.example.com/api");
        assert_eq!(config.service.request_timeout(), Duration::from_secs(3));
        assert_eq!(config.player.user_id().unwrap().as_str(), "65f0c0ffee");
    }

    #[test]
    fn shipped_defaults_parse() {
        let text = include_str!("../../../defaults/globetrotter.toml");
        let config = parse_config(text, Path::new("defaults/globetrotter.toml")).unwrap();
        assert_eq!(config.game.max_rounds, DEFAULT_MAX_ROUNDS);
        assert_eq!(config.service.base_url, "http://localhost:5000/api");
        assert!(config.player.user_id().is_none());
    }

    #[test]
    fn empty_file_uses_defaults() {
        let config = parse_config("", Path::new("empty.toml")).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.game.max_rounds, 5);
        assert!(config.player.user_id().is_none());
    }

    #[test]
    fn blank_user_id_is_no_identity() {
        let config = parse_config("[player]\nuser_id = \"  \"\n", Path::new("p.toml")).unwrap();
        assert!(config.player.user_id().is_none());
    }

    #[test]
    fn rejects_zero_rounds() {
        let err = parse_config("[game]\nmax_rounds = 0\n", Path::new("g.toml")).unwrap_err();
        match err {
            ConfigError::ValidationError { field, .. } => assert_eq!(field, "game.max_rounds"),
            other => panic!("expected ValidationError, got: {other}"),
        }
    }

    #[test]
    fn rejects_non_http_base_url() {
        let err = parse_config("[service]\nbase_url = \"ftp://x\"\n", Path::new("s.toml"))
            .unwrap_err();
        assert!(err.to_string().contains("service.base_url"));
    }

    #[test]
    fn rejects_zero_timeout() {
        let err = parse_config("[service]\nrequest_timeout_secs = 0\n", Path::new("s.toml"))
            .unwrap_err();
        assert!(err.to_string().contains("request_timeout_secs"));
    }

    #[test]
    fn parse_error_for_invalid_toml() {
        let err = parse_config("[game\nmax_rounds = ", Path::new("bad.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn user_override_replaces_configured_identity() {
        let mut config = Config::default();
        apply_user_override(&mut config, " player-9 ");
        assert_eq!(config.player.user_id().unwrap().as_str(), "player-9");

        apply_user_override(&mut config, "");
        assert_eq!(config.player.user_id().unwrap().as_str(), "player-9");
    }

    #[test]
    fn file_not_found_for_missing_config() {
        let tmp = std::env::temp_dir().join("globetrotter_config_missing");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(&tmp).unwrap();

        let err = load_config_from(&tmp).unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound { .. }));

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn ensure_config_files_copies_missing_files() {
        let tmp = std::env::temp_dir().join("globetrotter_config_ensure_copies");
        let _ = fs::remove_dir_all(&tmp);
        let defaults_dir = tmp.join("defaults");
        fs::create_dir_all(&defaults_dir).unwrap();
        fs::write(defaults_dir.join(CONFIG_FILE), SAMPLE).unwrap();
        fs::write(defaults_dir.join("notes.toml.example"), "# example\n").unwrap();

        let copied = ensure_config_files(&tmp).unwrap();
        assert_eq!(copied.len(), 1);
        assert!(tmp.join("config").join(CONFIG_FILE).exists());
        assert!(!tmp.join("config/notes.toml.example").exists());

        let config = load_config_from(&tmp).unwrap();
        assert_eq!(config.game.max_rounds, 7);

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn ensure_config_files_skips_existing() {
        let tmp = std::env::temp_dir().join("globetrotter_config_ensure_skips");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(tmp.join("defaults")).unwrap();
        fs::create_dir_all(tmp.join("config")).unwrap();
        fs::write(tmp.join("defaults").join(CONFIG_FILE), SAMPLE).unwrap();
        fs::write(tmp.join("config").join(CONFIG_FILE), "# custom\n").unwrap();

        let copied = ensure_config_files(&tmp).unwrap();
        assert!(copied.is_empty());
        let content = fs::read_to_string(tmp.join("config").join(CONFIG_FILE)).unwrap();
        assert_eq!(content, "# custom\n");

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn ensure_config_files_errors_when_both_dirs_missing() {
        let tmp = std::env::temp_dir().join("globetrotter_config_both_missing");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(&tmp).unwrap();

        let err = ensure_config_files(&tmp).unwrap_err();
        match &err {
            ConfigError::DefaultsCopyError { message } => {
                assert!(message.contains("neither defaults/ nor config/"));
            }
            other => panic!("expected DefaultsCopyError, got: {other}"),
        }

        let _ = fs::remove_dir_all(&tmp);
    }
}
