use std::sync::Arc;

use parking_lot::Mutex;

use super::{MessageCallback, Router};
use crate::bus::Envelope;

struct MockShared {
    sent: Mutex<Vec<(String, Envelope)>>,
    callback: Mutex<Option<MessageCallback>>,
}

/// Ручной транспорт для тестов.
///
/// Записывает всё, что клиент разослал, и позволяет вручную «доставить»
/// конверт, как будто он пришёл с провода. Эха нет: исходящее и входящее
/// полностью под контролем теста.
#[derive(Clone)]
pub struct MockRouter {
    shared: Arc<MockShared>,
}

impl MockRouter {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(MockShared {
                sent: Mutex::new(Vec::new()),
                callback: Mutex::new(None),
            }),
        }
    }

    /// Снимок исходящего трафика в порядке отправки.
    pub fn sent(&self) -> Vec<(String, Envelope)> {
        self.shared.sent.lock().clone()
    }

    /// Конверты, разосланные в конкретный канал.
    pub fn sent_on(&self, channel: &str) -> Vec<Envelope> {
        self.shared
            .sent
            .lock()
            .iter()
            .filter(|(ch, _)| ch == channel)
            .map(|(_, envelope)| envelope.clone())
            .collect()
    }

    /// Подаёт конверт на вход клиента, будто он пришёл по сети.
    pub fn deliver(&self, channel: &str, envelope: Envelope) {
        let callback = self.shared.callback.lock();
        if let Some(callback) = callback.as_ref() {
            callback(channel, envelope);
        }
    }
}

impl Default for MockRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl Router for MockRouter {
    fn broadcast(&self, channel: &str, envelope: Envelope) {
        self.shared.sent.lock().push((channel.to_string(), envelope));
    }

    fn onmessage(&self, callback: MessageCallback) {
        *self.shared.callback.lock() = Some(callback);
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    /// Тест проверяет запись исходящего трафика и выборку по каналу.
    #[test]
    fn test_mock_records_broadcasts() {
        let router = MockRouter::new();
        router.broadcast("a", Envelope::new("n", 0, json!(1)));
        router.broadcast("b", Envelope::new("n", 1, json!(2)));
        router.broadcast("a", Envelope::new("n", 2, json!(3)));

        assert_eq!(router.sent().len(), 3);
        let on_a = router.sent_on("a");
        assert_eq!(on_a.len(), 2);
        assert_eq!(on_a[0].id, "n_0");
        assert_eq!(on_a[1].id, "n_2");
    }

    /// Тест проверяет ручную доставку в зарегистрированный колбэк.
    #[test]
    fn test_mock_delivers_to_callback() {
        let router = MockRouter::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let seen_clone = seen.clone();
        router.onmessage(Box::new(move |channel, envelope| {
            seen_clone.lock().push((channel.to_string(), envelope.id));
        }));

        router.deliver("room", Envelope::new("peer", 5, json!("x")));
        assert_eq!(
            seen.lock().as_slice(),
            &[("room".to_string(), "peer_5".to_string())]
        );
    }

    /// Тест проверяет, что доставка без колбэка безопасна.
    #[test]
    fn test_deliver_without_callback_is_noop() {
        let router = MockRouter::new();
        router.deliver("room", Envelope::new("peer", 0, json!(null)));
        assert!(router.sent().is_empty());
    }
}
