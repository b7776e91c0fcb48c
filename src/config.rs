//! Configuration for libranet paths and lending policy.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variable (LIBRANET_HOME)
//! 2. Config file (.libranet/config.yaml)
//! 3. Defaults (~/.libranet)
//!
//! Config file discovery:
//! - Searches current directory and parents for .libranet/config.yaml
//! - Paths in config file are relative to the .libranet/ directory

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::core::LendingPolicy;

/// Global cached configuration (stores Result to handle init errors)
static CONFIG: OnceLock<Result<ResolvedConfig, String>> = OnceLock::new();

pub const HOME_ENV: &str = "LIBRANET_HOME";
pub const CONFIG_DIR: &str = ".libranet";
pub const CONFIG_FILE: &str = "config.yaml";

pub const DEFAULT_CATALOG_FILE: &str = "inventory.txt";
pub const DEFAULT_LEDGER_FILE: &str = "borrowed.txt";
pub const DEFAULT_ERROR_LOG: &str = "errors.log";
pub const DEFAULT_USER: &str = "U001";

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    pub version: String,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub lending: Option<LendingConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathsConfig {
    /// Data directory (relative to .libranet/)
    pub home: Option<String>,
    /// Catalog file (relative to home)
    pub catalog: Option<String>,
    /// Loan ledger file (relative to home)
    pub ledger: Option<String>,
    /// Error log file (relative to home)
    pub error_log: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LendingConfig {
    /// User id for borrow/due commands when --user is not given
    pub default_user: Option<String>,
    #[serde(flatten)]
    pub policy: LendingPolicy,
}

/// Resolved configuration with absolute paths
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// Data directory
    pub home: PathBuf,
    pub catalog_path: PathBuf,
    pub ledger_path: PathBuf,
    pub error_log_path: PathBuf,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
    pub default_user: String,
    pub policy: LendingPolicy,
}

impl ResolvedConfig {
    /// Defaults rooted at `home`
    pub fn with_home(home: impl Into<PathBuf>) -> Self {
        let home = home.into();
        Self {
            catalog_path: home.join(DEFAULT_CATALOG_FILE),
            ledger_path: home.join(DEFAULT_LEDGER_FILE),
            error_log_path: home.join(DEFAULT_ERROR_LOG),
            home,
            config_file: None,
            default_user: DEFAULT_USER.to_string(),
            policy: LendingPolicy::default(),
        }
    }
}

/// Find config file by searching current directory and parents
fn find_config_file() -> Option<PathBuf> {
    let mut current = std::env::current_dir().ok()?;

    loop {
        let config_path = current.join(CONFIG_DIR).join(CONFIG_FILE);
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    None
}

/// Load and parse config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Resolve a path that may be relative to `base`
fn resolve_path(base: &Path, path_str: &str) -> PathBuf {
    let path = PathBuf::from(path_str);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
            .canonicalize()
            .unwrap_or_else(|_| base.join(path_str))
    }
}

/// Apply a parsed config file on top of the defaults
fn resolve(
    config: ConfigFile,
    config_path: &Path,
    env_home: Option<PathBuf>,
    default_home: PathBuf,
) -> ResolvedConfig {
    let config_dir = config_path.parent().unwrap_or(Path::new("."));

    let home = if let Some(env_home) = env_home {
        env_home
    } else if let Some(ref home_path) = config.paths.home {
        resolve_path(config_dir, home_path)
    } else {
        default_home
    };

    let file_in_home = |configured: &Option<String>, default: &str| match configured {
        Some(p) => resolve_path(&home, p),
        None => home.join(default),
    };

    let catalog_path = file_in_home(&config.paths.catalog, DEFAULT_CATALOG_FILE);
    let ledger_path = file_in_home(&config.paths.ledger, DEFAULT_LEDGER_FILE);
    let error_log_path = file_in_home(&config.paths.error_log, DEFAULT_ERROR_LOG);

    let default_user = config
        .lending
        .as_ref()
        .and_then(|l| l.default_user.clone())
        .unwrap_or_else(|| DEFAULT_USER.to_string());

    let policy = config.lending.map(|l| l.policy).unwrap_or_default();

    ResolvedConfig {
        home,
        catalog_path,
        ledger_path,
        error_log_path,
        config_file: Some(config_path.to_path_buf()),
        default_user,
        policy,
    }
}

/// Load configuration from all sources
fn load_config() -> Result<ResolvedConfig> {
    let default_home = dirs::home_dir()
        .context("Failed to determine home directory")?
        .join(CONFIG_DIR);

    let env_home = std::env::var(HOME_ENV).ok().map(PathBuf::from);

    match find_config_file() {
        Some(config_path) => {
            let config = load_config_file(&config_path)?;
            Ok(resolve(config, &config_path, env_home, default_home))
        }
        None => Ok(ResolvedConfig::with_home(env_home.unwrap_or(default_home))),
    }
}

/// Get the global configuration (loads once, then cached)
pub fn config() -> Result<&'static ResolvedConfig> {
    let result = CONFIG.get_or_init(|| load_config().map_err(|e| e.to_string()));

    match result {
        Ok(config) => Ok(config),
        Err(e) => anyhow::bail!("{}", e),
    }
}

/// Force reload configuration (useful for testing)
pub fn reload_config() -> Result<ResolvedConfig> {
    load_config()
}
