use thiserror::Error;

/// Ошибки конфигурации клиента.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Ignore capacity must be greater than zero")]
    ZeroIgnoreCapacity,

    #[error("Node id must not be empty")]
    EmptyNodeId,

    #[error("Settings error: {0}")]
    Settings(#[from] ::config::ConfigError),
}
