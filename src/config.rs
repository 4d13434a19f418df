//! Console configuration: a TOML file with per-section defaults.
//!
//! Resolution order: explicit `--config` path, then `UNIBOS_CONFIG`, then
//! `<config dir>/unibos/config.toml`. A missing file means defaults; a file
//! that exists but does not parse is an error.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::Profile;

pub const ENV_UNIBOS_CONFIG: &str = "UNIBOS_CONFIG";

const DEFAULT_PROJECT_ROOT: &str = ".";
const DEFAULT_MODULES_DIR: &str = "modules";
const DEFAULT_TICK_MS: u64 = 250;
const MIN_TICK_MS: u64 = 50;
const MAX_TICK_MS: u64 = 5000;
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_PROBE_ADDR: &str = "1.1.1.1:53";
const DEFAULT_PROBE_INTERVAL_SECS: u64 = 30;
const MIN_PROBE_INTERVAL_SECS: u64 = 1;
const DEFAULT_PROBE_TIMEOUT_MS: u64 = 300;
const DEFAULT_SERVICES: &[&str] = &["unibos", "nginx", "postgresql"];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0}")]
    Message(String),
}

impl ConfigError {
    fn configuration(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }
}

// ============================================================================
// SCHEMA
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    #[serde(default)]
    pub default_profile: Profile,
    #[serde(default = "default_project_root")]
    pub project_root: PathBuf,
    #[serde(default = "default_modules_dir")]
    pub modules_dir: PathBuf,
    #[serde(default)]
    pub ui: UiConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub manager: ManagerConfig,
    #[serde(default)]
    pub custom: Vec<CustomItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UiConfig {
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub file: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NetworkConfig {
    /// `host:port` dialed to decide the footer's connectivity indicator.
    /// Empty disables probing.
    #[serde(default = "default_probe_addr")]
    pub probe_addr: String,
    #[serde(default = "default_probe_interval_secs")]
    pub probe_interval_secs: u64,
    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServerConfig {
    #[serde(default = "default_services")]
    pub services: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ManagerConfig {
    #[serde(default)]
    pub targets: Vec<Target>,
}

/// A remote host the manager profile operates on.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Target {
    pub name: String,
    pub host: String,
    /// systemd unit inspected on the target.
    #[serde(default = "default_target_service")]
    pub service: String,
}

/// A user-defined command item appended to a profile's menu.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CustomItem {
    /// Restrict to one profile; `None` adds the item everywhere.
    #[serde(default)]
    pub profile: Option<Profile>,
    #[serde(default = "default_custom_section")]
    pub section: String,
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub description: String,
    pub command: String,
}

fn default_project_root() -> PathBuf {
    PathBuf::from(DEFAULT_PROJECT_ROOT)
}

fn default_modules_dir() -> PathBuf {
    PathBuf::from(DEFAULT_MODULES_DIR)
}

fn default_tick_ms() -> u64 {
    DEFAULT_TICK_MS
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_probe_addr() -> String {
    DEFAULT_PROBE_ADDR.to_string()
}

fn default_probe_interval_secs() -> u64 {
    DEFAULT_PROBE_INTERVAL_SECS
}

fn default_probe_timeout_ms() -> u64 {
    DEFAULT_PROBE_TIMEOUT_MS
}

fn default_services() -> Vec<String> {
    DEFAULT_SERVICES.iter().map(|s| s.to_string()).collect()
}

fn default_target_service() -> String {
    "unibos".to_string()
}

fn default_custom_section() -> String {
    "Custom".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Config {
            default_profile: Profile::default(),
            project_root: default_project_root(),
            modules_dir: default_modules_dir(),
            ui: UiConfig::default(),
            logging: LoggingConfig::default(),
            network: NetworkConfig::default(),
            server: ServerConfig::default(),
            manager: ManagerConfig::default(),
            custom: Vec::new(),
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        UiConfig {
            tick_ms: DEFAULT_TICK_MS,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: default_log_level(),
            file: None,
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        NetworkConfig {
            probe_addr: default_probe_addr(),
            probe_interval_secs: DEFAULT_PROBE_INTERVAL_SECS,
            probe_timeout_ms: DEFAULT_PROBE_TIMEOUT_MS,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            services: default_services(),
        }
    }
}

impl Config {
    /// Modules directory resolved against the project root.
    pub fn modules_path(&self) -> PathBuf {
        if self.modules_dir.is_absolute() {
            self.modules_dir.clone()
        } else {
            self.project_root.join(&self.modules_dir)
        }
    }

    /// Log file location, defaulting under the local data directory.
    pub fn log_path(&self) -> PathBuf {
        match &self.logging.file {
            Some(path) => path.clone(),
            None => dirs::data_local_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join("unibos")
                .join("unibos.log"),
        }
    }
}

// ============================================================================
// LOADING
// ============================================================================

/// Load configuration, honoring an explicit path before the environment.
pub fn load(explicit: Option<&Path>) -> Result<(Config, PathBuf), ConfigError> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => config_path_from_env()?,
    };
    let config = load_from_path(&path)?;
    Ok((config, path))
}

pub fn load_from_path(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Ok(Config::default());
        }
        Err(err) => {
            return Err(ConfigError::configuration(format!(
                "Failed to read config from {}: {err}",
                path.display()
            )));
        }
    };

    parse(&raw).map_err(|err| {
        ConfigError::configuration(format!("Failed to parse config from {}: {err}", path.display()))
    })
}

/// Parse and normalize a TOML document.
pub fn parse(raw: &str) -> Result<Config, ConfigError> {
    let mut config: Config =
        toml::from_str(raw).map_err(|err| ConfigError::configuration(err.to_string()))?;
    normalize(&mut config)?;
    Ok(config)
}

pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    let base = dirs::config_dir().ok_or_else(|| {
        ConfigError::configuration("Unable to resolve the user configuration directory")
    })?;
    Ok(base.join("unibos").join("config.toml"))
}

fn config_path_from_env() -> Result<PathBuf, ConfigError> {
    match std::env::var(ENV_UNIBOS_CONFIG) {
        Ok(raw) if !raw.trim().is_empty() => Ok(raw.into()),
        Ok(_) | Err(std::env::VarError::NotPresent) => default_config_path(),
        Err(_) => Err(ConfigError::configuration(
            "UNIBOS_CONFIG contained invalid UTF-8",
        )),
    }
}

fn normalize(config: &mut Config) -> Result<(), ConfigError> {
    config.ui.tick_ms = config.ui.tick_ms.clamp(MIN_TICK_MS, MAX_TICK_MS);
    config.network.probe_interval_secs = config.network.probe_interval_secs.max(MIN_PROBE_INTERVAL_SECS);
    config.network.probe_addr = config.network.probe_addr.trim().to_string();

    if config.project_root.as_os_str().is_empty() {
        config.project_root = default_project_root();
    }

    for item in &config.custom {
        if item.id.trim().is_empty() {
            return Err(ConfigError::configuration(format!(
                "custom item '{}' has an empty id",
                item.label
            )));
        }
        if item.command.trim().is_empty() {
            return Err(ConfigError::configuration(format!(
                "custom item '{}' has an empty command",
                item.id
            )));
        }
    }

    for target in &config.manager.targets {
        if target.host.trim().is_empty() {
            return Err(ConfigError::configuration(format!(
                "manager target '{}' has an empty host",
                target.name
            )));
        }
    }

    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let config = load_from_path(dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.default_profile, Profile::Dev);
        assert_eq!(config.ui.tick_ms, DEFAULT_TICK_MS);
        assert_eq!(config.server.services, vec!["unibos", "nginx", "postgresql"]);
    }

    #[test]
    fn explicit_path_is_used_and_returned() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("console.toml");
        std::fs::write(&path, "default_profile = \"server\"\n").unwrap();

        let (config, resolved) = load(Some(&path)).unwrap();
        assert_eq!(resolved, path);
        assert_eq!(config.default_profile, Profile::Server);
    }

    #[test]
    fn parses_full_document() {
        let raw = r#"
            default_profile = "manager"
            project_root = "/srv/unibos"
            modules_dir = "apps"

            [ui]
            tick_ms = 100

            [logging]
            level = "debug"
            file = "/tmp/unibos.log"

            [network]
            probe_addr = ""

            [[manager.targets]]
            name = "rocksteady"
            host = "rocksteady.example.org"

            [[custom]]
            profile = "dev"
            id = "custom:migrate"
            label = "Show migrations"
            command = "./manage.py showmigrations"
        "#;
        let config = parse(raw).unwrap();
        assert_eq!(config.default_profile, Profile::Manager);
        assert_eq!(config.modules_path(), PathBuf::from("/srv/unibos/apps"));
        assert_eq!(config.ui.tick_ms, 100);
        assert_eq!(config.log_path(), PathBuf::from("/tmp/unibos.log"));
        assert!(config.network.probe_addr.is_empty());
        assert_eq!(config.manager.targets[0].service, "unibos");
        assert_eq!(config.custom[0].section, "Custom");
        assert_eq!(config.custom[0].profile, Some(Profile::Dev));
    }

    #[test]
    fn tick_is_clamped() {
        let config = parse("[ui]\ntick_ms = 1\n").unwrap();
        assert_eq!(config.ui.tick_ms, MIN_TICK_MS);
        let config = parse("[ui]\ntick_ms = 999999\n").unwrap();
        assert_eq!(config.ui.tick_ms, MAX_TICK_MS);
    }

    #[test]
    fn probe_interval_has_a_floor() {
        let config = parse("[network]\nprobe_interval_secs = 0\n").unwrap();
        assert_eq!(config.network.probe_interval_secs, MIN_PROBE_INTERVAL_SECS);
        let config = parse("[network]\nprobe_interval_secs = 120\n").unwrap();
        assert_eq!(config.network.probe_interval_secs, 120);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "default_profile = [").unwrap();
        let err = load_from_path(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config"));
    }

    #[test]
    fn unknown_profile_is_rejected() {
        assert!(parse("default_profile = \"admin\"\n").is_err());
    }

    #[test]
    fn custom_item_without_command_is_rejected() {
        let raw = r#"
            [[custom]]
            id = "x"
            label = "X"
            command = "  "
        "#;
        let err = parse(raw).unwrap_err();
        assert!(err.to_string().contains("empty command"));
    }

    #[test]
    fn target_without_host_is_rejected() {
        let raw = r#"
            [[manager.targets]]
            name = "nowhere"
            host = ""
        "#;
        assert!(parse(raw).is_err());
    }
}
