use thiserror::Error;

pub type BusResult<T> = Result<T, BusError>;

/// Ошибки, возникающие при обработке сообщений на шине.
///
/// Ошибка фильтра снимает сообщение с конвейера, ошибка подписчика
/// изолируется и не мешает остальным подписчикам того же канала.
#[derive(Debug, Error)]
pub enum BusError {
    // ==== Wire / payload ====
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // ==== Pipeline ====
    #[error("Filter failed: {0}")]
    Filter(String),

    // ==== Dispatch ====
    #[error("Handler failed: {0}")]
    Handler(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Тест проверяет текстовое представление ошибок конвейера.
    #[test]
    fn test_bus_error_display() {
        assert_eq!(
            BusError::Filter("veto".into()).to_string(),
            "Filter failed: veto"
        );
        assert_eq!(
            BusError::Handler("boom".into()).to_string(),
            "Handler failed: boom"
        );
    }

    /// Тест проверяет конвертацию ошибок serde_json.
    #[test]
    fn test_serde_conversion() {
        let err = serde_json::from_str::<serde_json::Value>("{broken").unwrap_err();
        let converted: BusError = err.into();
        match converted {
            BusError::Serialization(_) => {}
            other => panic!("Expected Serialization, got {other:?}"),
        }
    }
}
