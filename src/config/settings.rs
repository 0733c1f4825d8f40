use std::time::Duration;

use serde::{Deserialize, Serialize};

use config::{Config, Environment};

use super::ClientConfig;
use crate::error::ConfigError;

/// Процессные настройки шины, собираемые из переменных окружения `XBUS_*`.
#[derive(Debug, Serialize, Deserialize)]
pub struct Settings {
    pub log_level: String,
    pub node_id: Option<String>,
    pub ignore_capacity: usize,
    pub lock_timeout_ms: u64,
}

impl Settings {
    pub fn load() -> Result<Self, ConfigError> {
        let cfg = Config::builder()
            // Значения по умолчанию
            .set_default("log_level", "info")?
            .set_default("ignore_capacity", 1024_i64)?
            .set_default("lock_timeout_ms", 5000_i64)?
            // Переменные окружения с префиксом XBUS_
            .add_source(Environment::with_prefix("XBUS"))
            .build()?;

        // Десериализуем конфигурацию в нашу структуру
        Ok(cfg.try_deserialize()?)
    }

    /// Переводит процессные настройки в конфигурацию одного клиента.
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            node_id: self.node_id.clone(),
            ignore_capacity: self.ignore_capacity,
            lock_timeout: Duration::from_millis(self.lock_timeout_ms),
        }
    }
}
