use std::sync::Arc;

use parking_lot::RwLock;

use super::{MessageCallback, Router};
use crate::bus::Envelope;

struct HubShared {
    callbacks: RwLock<Vec<MessageCallback>>,
}

/// Внутрипроцессный хаб: общая шина для нескольких клиентов одного процесса.
///
/// Каждому клиенту выдаётся своя конечная точка через [`InMemoryHub::endpoint`].
/// Конверт, разосланный любой точкой, доходит до колбэков всех точек хаба,
/// включая отправившую.
pub struct InMemoryHub {
    shared: Arc<HubShared>,
}

impl InMemoryHub {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(HubShared {
                callbacks: RwLock::new(Vec::new()),
            }),
        }
    }

    /// Создаёт конечную точку, пригодную для передачи клиенту.
    pub fn endpoint(&self) -> InMemoryRouter {
        InMemoryRouter {
            shared: self.shared.clone(),
        }
    }
}

impl Default for InMemoryHub {
    fn default() -> Self {
        Self::new()
    }
}

/// Конечная точка хаба, реализующая [`Router`].
#[derive(Clone)]
pub struct InMemoryRouter {
    shared: Arc<HubShared>,
}

impl Router for InMemoryRouter {
    fn broadcast(&self, channel: &str, envelope: Envelope) {
        let callbacks = self.shared.callbacks.read();
        for callback in callbacks.iter() {
            callback(channel, envelope.clone());
        }
    }

    fn onmessage(&self, callback: MessageCallback) {
        self.shared.callbacks.write().push(callback);
    }
}

#[cfg(test)]
mod tests {
    use parking_lot::Mutex;
    use serde_json::json;

    use super::*;

    /// Тест проверяет веерную рассылку: конверт доходит до всех точек хаба,
    /// включая точку отправителя.
    #[test]
    fn test_hub_fans_out_to_all_endpoints() {
        let hub = InMemoryHub::new();
        let a = hub.endpoint();
        let b = hub.endpoint();

        let seen = Arc::new(Mutex::new(Vec::new()));

        for tag in ["a", "b"] {
            let endpoint = if tag == "a" { &a } else { &b };
            let seen = seen.clone();
            endpoint.onmessage(Box::new(move |channel, envelope| {
                seen.lock().push((tag, channel.to_string(), envelope.id));
            }));
        }

        a.broadcast("news", Envelope::new("n1", 0, json!("hi")));

        let seen = seen.lock();
        assert_eq!(seen.len(), 2);
        assert!(seen.contains(&("a", "news".to_string(), "n1_0".to_string())));
        assert!(seen.contains(&("b", "news".to_string(), "n1_0".to_string())));
    }

    /// Тест проверяет, что точка без колбэка просто молчит.
    #[test]
    fn test_endpoint_without_callback_is_silent() {
        let hub = InMemoryHub::new();
        let a = hub.endpoint();
        let _b = hub.endpoint();

        // ни одного onmessage — рассылка не должна паниковать
        a.broadcast("void", Envelope::new("n", 1, json!(null)));
    }
}
