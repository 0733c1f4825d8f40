//! Настройка логирования шины.
//!
//! Тонкая обёртка над `tracing-subscriber`: консольный вывод с env-filter.
//! Уровень берётся из `XBUS_LOG` (синтаксис директив `tracing`), при его
//! отсутствии — из конфигурации.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::config::Settings;

/// Переменная окружения с директивами фильтра (`info`, `xbus=debug`, ...).
pub const LOG_ENV_VAR: &str = "XBUS_LOG";

/// Конфигурация логирования.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Уровень по умолчанию, если `XBUS_LOG` не задан.
    pub level: String,
    /// Цветной вывод.
    pub ansi: bool,
    /// JSON-строки вместо человекочитаемых.
    pub json: bool,
    /// Печатать ли target события.
    pub show_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            ansi: true,
            json: false,
            show_target: false,
        }
    }
}

impl LoggingConfig {
    /// Конфигурация из процессных настроек: уровень берёт из них,
    /// остальные поля оставляет по умолчанию.
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            level: settings.log_level.clone(),
            ..Self::default()
        }
    }
}

/// Инициализация логирования с конфигурацией.
///
/// Повторный вызов вернёт ошибку: глобальный subscriber ставится один раз.
pub fn init_logging(config: &LoggingConfig) -> Result<(), Box<dyn std::error::Error>> {
    let env_filter =
        EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new(&config.level));

    let fmt_layer: Box<dyn Layer<_> + Send + Sync> = if config.json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_target(config.show_target)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_ansi(config.ansi)
            .with_target(config.show_target)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()?;

    tracing::debug!("logging initialized, default level {}", config.level);
    Ok(())
}

#[cfg(test)]
mod tests {
    use serial_test::serial;

    use super::*;

    /// Тест проверяет значения конфигурации логирования по умолчанию.
    #[test]
    fn test_default_logging_config() {
        let cfg = LoggingConfig::default();
        assert_eq!(cfg.level, "info");
        assert!(cfg.ansi);
        assert!(!cfg.json);
    }

    /// Тест проверяет перенос уровня из процессных настроек.
    #[test]
    fn test_config_from_settings() {
        let settings = Settings {
            log_level: "debug".into(),
            node_id: None,
            ignore_capacity: 1024,
            lock_timeout_ms: 5000,
        };

        let cfg = LoggingConfig::from_settings(&settings);
        assert_eq!(cfg.level, "debug");
        assert!(cfg.ansi);
        assert!(!cfg.json);
    }

    /// Тест проверяет, что первая инициализация проходит, а повторная
    /// возвращает ошибку, а не панику.
    #[test]
    #[serial]
    fn test_double_init_returns_error() {
        let cfg = LoggingConfig::default();
        let first = init_logging(&cfg);
        let second = init_logging(&cfg);
        // какой-то из вызовов обязан не пройти: глобальный subscriber один
        assert!(first.is_ok() || second.is_err());
        assert!(second.is_err());
    }
}
