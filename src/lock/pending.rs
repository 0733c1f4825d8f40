use std::{collections::HashMap, sync::Weak, time::Duration};

use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::debug;

use crate::{
    bus::{sys, Attachment},
    client::ClientInner,
};

/// Колбэк, вызываемый при выдаче блокировки этому узлу.
pub(crate) type LockCallback = Box<dyn FnOnce(Unlock) + Send>;

/// Намерение захватить блокировку.
///
/// Прикрепляется к исходящему кадру `!sys.lock.request` и снимается
/// исходящим фильтром до того, как конверт уйдёт на провод.
pub(crate) struct LockIntent {
    pub(crate) lock_id: String,
    pub(crate) timeout: Duration,
    pub(crate) on_acquired: LockCallback,
}

/// Запись об отправленном запросе, ждущем `!sys.lock.acquired`.
pub(crate) struct PendingLock {
    pub(crate) lock_id: String,
    pub(crate) deadline: Instant,
    pub(crate) on_acquired: LockCallback,
}

/// Таблица ожидающих запросов, ключ — id конверта запроса.
///
/// Таблица ограничена временем жизни записей: просроченные выметаются
/// при каждой новой регистрации, а опоздавшая выдача не срабатывает.
/// Забытые запросы не копятся бесконечно.
#[derive(Default)]
pub(crate) struct PendingLocks {
    inner: Mutex<HashMap<String, PendingLock>>,
}

impl PendingLocks {
    pub(crate) fn register(&self, request_id: String, intent: LockIntent) {
        let now = Instant::now();
        let mut map = self.inner.lock();
        map.retain(|_, pending| pending.deadline > now);
        map.insert(
            request_id,
            PendingLock {
                lock_id: intent.lock_id,
                deadline: now + intent.timeout,
                on_acquired: intent.on_acquired,
            },
        );
    }

    /// Забирает запись по id конверта запроса, если она ещё жива.
    pub(crate) fn claim(&self, request_id: &str) -> Option<PendingLock> {
        let pending = self.inner.lock().remove(request_id)?;
        if pending.deadline <= Instant::now() {
            debug!(
                "grant for '{}' (request {}) arrived after deadline, ignored",
                pending.lock_id, request_id
            );
            return None;
        }
        Some(pending)
    }

    pub(crate) fn len(&self) -> usize {
        self.inner.lock().len()
    }
}

/// Ручка освобождения выданной блокировки.
///
/// Потребляется при использовании: освободить блокировку можно ровно один
/// раз. Потерянная ручка не освобождает блокировку сама — её вернёт шине
/// advisory-таймаут арбитра.
#[derive(Debug)]
pub struct Unlock {
    pub(crate) client: Weak<ClientInner>,
    pub(crate) lock_id: String,
}

impl Unlock {
    /// Имя удерживаемой блокировки.
    pub fn lock_id(&self) -> &str {
        &self.lock_id
    }

    /// Освобождает блокировку, рассылая `!sys.lock.release`.
    pub fn unlock(self) {
        if let Some(inner) = self.client.upgrade() {
            let payload = sys::LockReleasePayload { id: self.lock_id }.to_value();
            ClientInner::emit_frame(&inner, sys::LOCK_RELEASE, payload, false, Attachment::None);
        }
    }
}
