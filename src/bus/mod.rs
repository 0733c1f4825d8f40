//! Базовая сантехника шины сообщений.
//!
//! Модуль собирает всё, из чего клиент строит путь сообщения:
//!
//! - `envelope`: конверт с глобально уникальным `id` и кадр, текущий через
//!   конвейеры.
//! - `filter`: упорядоченные асинхронные конвейеры с правом переписать
//!   или снять кадр.
//! - `subscription`: обработчики каналов и привязки таблицы подписок.
//! - `sys`: зарезервированные каналы `!sys.*` и их wire-нагрузки.
//! - `intern` (приватный): пул интернированных имён каналов.

pub mod envelope;
pub mod filter;
mod intern;
pub mod subscription;
pub mod sys;

pub use envelope::{Envelope, Frame};
pub use filter::{filter_fn, Filter, FilterResult, FnFilter, Verdict};
pub use subscription::{handler_fn, FnHandler, Handler, SubscriptionId};

pub(crate) use envelope::Attachment;
pub(crate) use filter::{run_chain, Direction};
pub(crate) use intern::intern_channel;
pub(crate) use subscription::Binding;
