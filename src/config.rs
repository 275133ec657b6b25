use crate::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    #[serde(default)]
    pub ledger: LedgerConfig,
    #[serde(default)]
    pub transaction: TransactionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerConfig {
    #[serde(default = "default_true")]
    pub reconcile_enabled: bool,
    #[serde(default = "default_reconcile_interval")]
    pub reconcile_interval_secs: u64,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            reconcile_enabled: true,
            reconcile_interval_secs: default_reconcile_interval(),
        }
    }
}

/// 事务超时配置。worker 本身不使用，
/// 由嵌入本库的调用方通过 `Config::transaction_timeout()` 传给 `database::with_deadline`。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionConfig {
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for TransactionConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
        }
    }
}

fn default_max_connections() -> u32 {
    10
}

fn default_true() -> bool {
    true
}

fn default_reconcile_interval() -> u64 {
    3600
}

fn default_timeout_ms() -> u64 {
    5000
}

impl Config {
    pub fn from_toml() -> AppResult<Self> {
        let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
        use std::io::ErrorKind;

        // 尝试读取配置文件，如果不存在则完全依赖环境变量
        let mut config = match std::fs::read_to_string(&config_path) {
            Ok(config_str) => Self::from_toml_str(&config_str)?,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                // 数据库 URL 在无配置文件时必须提供
                let database_url = env::var("DATABASE_URL").map_err(|_| {
                    AppError::ConfigError(format!(
                        "DATABASE_URL is not set and {config_path} was not found"
                    ))
                })?;

                Config {
                    database: DatabaseConfig {
                        url: database_url,
                        max_connections: default_max_connections(),
                    },
                    ledger: LedgerConfig::default(),
                    transaction: TransactionConfig::default(),
                }
            }
            Err(e) => {
                return Err(AppError::ConfigError(format!(
                    "Failed to read {config_path}: {e}"
                )));
            }
        };

        // 环境变量覆盖（即便文件存在时也覆盖）
        config.apply_env_overrides();
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> AppResult<Self> {
        toml::from_str(content)
            .map_err(|e| AppError::ConfigError(format!("Failed to parse config: {e}")))
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = v;
        }
        if let Ok(v) = env::var("DB_MAX_CONNECTIONS")
            && let Ok(mc) = v.parse()
        {
            self.database.max_connections = mc;
        }
        if let Ok(v) = env::var("RECONCILE_ENABLED")
            && let Ok(b) = v.parse()
        {
            self.ledger.reconcile_enabled = b;
        }
        if let Ok(v) = env::var("RECONCILE_INTERVAL_SECS")
            && let Ok(n) = v.parse()
        {
            self.ledger.reconcile_interval_secs = n;
        }
        if let Ok(v) = env::var("TX_TIMEOUT_MS")
            && let Ok(n) = v.parse()
        {
            self.transaction.timeout_ms = n;
        }
    }

    pub fn transaction_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.transaction.timeout_ms)
    }
}
