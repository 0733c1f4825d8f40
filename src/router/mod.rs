//! Транспортная способность шины.
//!
//! Клиент не знает, как устроена доставка: ему передают объект с парой
//! операций — «разослать всем» и «подписаться на всё входящее». Здесь
//! определён сам контракт и два внутрипроцессных транспорта:
//!
//! - `local`: хаб, веерно раздающий конверты всем подключённым клиентам.
//! - `mock`: ручной транспорт для тестов с записью исходящего трафика.

pub mod local;
pub mod mock;

pub use local::{InMemoryHub, InMemoryRouter};
pub use mock::MockRouter;

use crate::bus::Envelope;

/// Колбэк доставки входящего конверта: `(канал, конверт)`.
pub type MessageCallback = Box<dyn Fn(&str, Envelope) + Send + Sync>;

/// Контракт транспорта.
///
/// `broadcast` рассылает конверт всем узлам шины, включая отправителя:
/// транспорт не фильтрует эхо, это забота клиента. `onmessage` регистрирует
/// колбэк на весь входящий трафик без разбора каналов. Обе операции
/// fire-and-forget: подтверждений доставки у шины нет.
pub trait Router: Send + Sync + 'static {
    fn broadcast(&self, channel: &str, envelope: Envelope);
    fn onmessage(&self, callback: MessageCallback);
}
