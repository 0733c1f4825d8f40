//! Протокол распределённых блокировок поверх служебных каналов.
//!
//! Клиентская сторона устроена из двух предустановленных фильтров:
//! исходящий снимает колбэк с запроса и регистрирует его в таблице
//! ожидания, входящий ловит выдачу и вызывает колбэк с ручкой [`Unlock`].
//! Серверная сторона — [`LockArbiter`], выдающий блокировки в порядке
//! поступления запросов.

pub mod arbiter;
mod filters;
mod pending;

pub use arbiter::LockArbiter;
pub use pending::Unlock;

pub(crate) use filters::install;
pub(crate) use pending::{LockIntent, PendingLocks};
