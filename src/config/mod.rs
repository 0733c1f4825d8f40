//! Конфигурация клиента шины.
//!
//! `ClientConfig` — то, с чем собирается конкретный клиент; `Settings` —
//! процессные настройки, прочитанные из окружения (`XBUS_*`).

pub mod settings;

pub use settings::Settings;

use std::time::Duration;

/// Ёмкость списка подавления собственных сообщений по умолчанию.
pub const DEFAULT_IGNORE_CAPACITY: usize = 1024;
/// Advisory-таймаут блокировки по умолчанию (как в исходном протоколе: 5 с).
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_millis(5000);

/// Параметры сборки клиента.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Идентификатор узла. `None` — клиент сгенерирует случайный.
    pub node_id: Option<String>,
    /// Ёмкость LRU-списка собственных идентификаторов.
    pub ignore_capacity: usize,
    /// Таймаут блокировок для `Client::lock`.
    pub lock_timeout: Duration,
}

impl ClientConfig {
    /// Конфигурация по умолчанию с заданным идентификатором узла.
    pub fn with_node_id(node_id: impl Into<String>) -> Self {
        Self {
            node_id: Some(node_id.into()),
            ..Self::default()
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            node_id: None,
            ignore_capacity: DEFAULT_IGNORE_CAPACITY,
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
        }
    }
}
