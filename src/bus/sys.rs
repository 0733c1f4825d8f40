//! Служебное пространство каналов `!sys.*`.
//!
//! Эти каналы зарезервированы протоколом шины: по ним узлы объявляют свои
//! подписки и договариваются о блокировках. Формы нагрузок зафиксированы
//! здесь же, чтобы внешние арбитры могли говорить с клиентом на одном языке.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Узел объявил подписку на канал.
pub const CHANNELS_ADD: &str = "!sys.channels.add";
/// Узел снял подписку с канала.
pub const CHANNELS_REMOVE: &str = "!sys.channels.remove";
/// Запрос на захват блокировки.
pub const LOCK_REQUEST: &str = "!sys.lock.request";
/// Арбитр выдал блокировку: `request_id` указывает на конверт запроса.
pub const LOCK_ACQUIRED: &str = "!sys.lock.acquired";
/// Держатель освободил блокировку.
pub const LOCK_RELEASE: &str = "!sys.lock.release";

/// Проверяет, лежит ли канал в служебном пространстве имён.
pub fn is_system_channel(channel: &str) -> bool {
    channel.starts_with("!sys.")
}

/// Нагрузка `!sys.lock.request`: имя блокировки и её advisory-таймаут в мс.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LockRequestPayload {
    pub id: String,
    pub timeout: u64,
}

impl LockRequestPayload {
    pub fn to_value(&self) -> Value {
        json!({ "id": self.id, "timeout": self.timeout })
    }
}

/// Нагрузка `!sys.lock.acquired`: идентификатор конверта выигравшего запроса.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LockAcquiredPayload {
    pub request_id: String,
}

impl LockAcquiredPayload {
    pub fn to_value(&self) -> Value {
        json!({ "request_id": self.request_id })
    }
}

/// Нагрузка `!sys.lock.release`: имя освобождаемой блокировки.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LockReleasePayload {
    pub id: String,
}

impl LockReleasePayload {
    pub fn to_value(&self) -> Value {
        json!({ "id": self.id })
    }
}

/// Нагрузка объявлений `!sys.channels.*`: имя канала.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelPayload {
    pub channel: String,
}

impl ChannelPayload {
    pub fn to_value(&self) -> Value {
        json!({ "channel": self.channel })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Тест проверяет имена зарезервированных каналов.
    #[test]
    fn test_reserved_channel_names() {
        assert_eq!(CHANNELS_ADD, "!sys.channels.add");
        assert_eq!(CHANNELS_REMOVE, "!sys.channels.remove");
        assert_eq!(LOCK_REQUEST, "!sys.lock.request");
        assert_eq!(LOCK_ACQUIRED, "!sys.lock.acquired");
        assert_eq!(LOCK_RELEASE, "!sys.lock.release");
    }

    /// Тест проверяет предикат служебного пространства имён.
    #[test]
    fn test_system_channel_predicate() {
        assert!(is_system_channel("!sys.lock.request"));
        assert!(is_system_channel("!sys.custom"));
        assert!(!is_system_channel("chat.room"));
        assert!(!is_system_channel("sys.lock.request"));
    }

    /// Тест проверяет точную форму нагрузок на проводе: имена полей
    /// входят в протокол и не должны дрейфовать.
    #[test]
    fn test_payload_wire_shapes() {
        let req = LockRequestPayload {
            id: "write".into(),
            timeout: 5000,
        };
        assert_eq!(req.to_value(), json!({"id": "write", "timeout": 5000}));

        let acq = LockAcquiredPayload {
            request_id: "node_3".into(),
        };
        assert_eq!(acq.to_value(), json!({"request_id": "node_3"}));

        let rel = LockReleasePayload { id: "write".into() };
        assert_eq!(rel.to_value(), json!({"id": "write"}));

        let ch = ChannelPayload {
            channel: "news".into(),
        };
        assert_eq!(ch.to_value(), json!({"channel": "news"}));
    }

    /// Тест проверяет, что ручная сборка и derive-десериализация согласованы.
    #[test]
    fn test_payloads_round_trip() {
        let req = LockRequestPayload {
            id: "l".into(),
            timeout: 250,
        };
        let back: LockRequestPayload = serde_json::from_value(req.to_value()).unwrap();
        assert_eq!(back, req);

        let acq = LockAcquiredPayload {
            request_id: "n_0".into(),
        };
        let back: LockAcquiredPayload = serde_json::from_value(acq.to_value()).unwrap();
        assert_eq!(back, acq);
    }
}
