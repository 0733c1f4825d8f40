use std::{fmt, mem, sync::Arc};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::intern::intern_channel;
use crate::lock::LockIntent;

/// Единица обмена между узлами шины.
///
/// `id` глобально уникален: он склеен из идентификатора узла и монотонного
/// счётчика сообщений этого узла (`<node>_<seq>`). По `id` клиент отличает
/// свои сообщения от чужих и связывает ответы протокола блокировок
/// с исходным запросом.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub id: String,
    pub node_id: String,
    pub data: Value,
}

impl Envelope {
    pub fn new(node_id: &str, seq: u64, data: Value) -> Self {
        Self {
            id: format!("{node_id}_{seq}"),
            node_id: node_id.to_string(),
            data,
        }
    }
}

/// Служебный груз кадра, который не уходит на провод.
///
/// Протокол блокировок прикрепляет сюда колбэк захвата: исходящий фильтр
/// снимает его перед отправкой, поэтому сериализуется всегда чистый
/// `Envelope`.
pub(crate) enum Attachment {
    None,
    Lock(LockIntent),
}

impl fmt::Debug for Attachment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Attachment::None => f.write_str("None"),
            Attachment::Lock(_) => f.write_str("Lock(..)"),
        }
    }
}

/// Кадр — конверт вместе с каналом, по которому он движется.
///
/// Именно кадры текут через конвейеры фильтров: фильтр может переписать
/// и канал, и содержимое конверта, прежде чем кадр дойдёт до терминала.
#[derive(Debug)]
pub struct Frame {
    pub channel: Arc<str>,
    pub envelope: Envelope,
    pub(crate) attachment: Attachment,
}

impl Frame {
    pub fn new(channel: &str, envelope: Envelope) -> Self {
        Self {
            channel: intern_channel(channel),
            envelope,
            attachment: Attachment::None,
        }
    }

    pub(crate) fn with_attachment(
        channel: &str,
        envelope: Envelope,
        attachment: Attachment,
    ) -> Self {
        Self {
            channel: intern_channel(channel),
            envelope,
            attachment,
        }
    }

    /// Перенаправляет кадр в другой канал (имя интернируется заново).
    pub fn set_channel(&mut self, channel: &str) {
        self.channel = intern_channel(channel);
    }

    pub(crate) fn take_attachment(&mut self) -> Attachment {
        mem::replace(&mut self.attachment, Attachment::None)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use serde_json::json;

    use super::*;

    /// Тест проверяет формат идентификатора конверта: `<node>_<seq>`.
    #[test]
    fn test_envelope_id_format() {
        let env = Envelope::new("n42", 7, json!({"k": "v"}));
        assert_eq!(env.id, "n42_7");
        assert_eq!(env.node_id, "n42");
        assert_eq!(env.data, json!({"k": "v"}));
    }

    /// Тест проверяет форму конверта на проводе: ровно три поля.
    #[test]
    fn test_envelope_wire_shape() {
        let env = Envelope::new("node", 0, json!("hello"));
        let wire = serde_json::to_value(&env).unwrap();
        assert_eq!(
            wire,
            json!({"id": "node_0", "node_id": "node", "data": "hello"})
        );

        let back: Envelope = serde_json::from_value(wire).unwrap();
        assert_eq!(back, env);
    }

    /// Тест проверяет, что кадр интернирует канал и что перенаправление
    /// меняет указатель.
    #[test]
    fn test_frame_channel_interned() {
        let a = Frame::new("room", Envelope::new("n", 1, json!(null)));
        let b = Frame::new("room", Envelope::new("n", 2, json!(null)));
        assert!(Arc::ptr_eq(&a.channel, &b.channel));

        let mut c = Frame::new("room", Envelope::new("n", 3, json!(null)));
        c.set_channel("other");
        assert_eq!(&*c.channel, "other");
        assert!(!Arc::ptr_eq(&a.channel, &c.channel));
    }

    /// Тест проверяет, что забор груза оставляет кадр пустым.
    #[test]
    fn test_take_attachment_leaves_none() {
        let mut frame = Frame::new("ch", Envelope::new("n", 1, json!(1)));
        assert!(matches!(frame.take_attachment(), Attachment::None));
        assert!(matches!(frame.attachment, Attachment::None));
    }

    proptest! {
        /// Тест проверяет, что разные порядковые номера одного узла
        /// всегда дают разные идентификаторы.
        #[test]
        fn test_ids_unique_per_node(node in "[a-z0-9]{1,16}", a in any::<u64>(), b in any::<u64>()) {
            prop_assume!(a != b);
            let ea = Envelope::new(&node, a, json!(null));
            let eb = Envelope::new(&node, b, json!(null));
            prop_assert_ne!(ea.id, eb.id);
        }
    }
}
