use std::sync::{Arc, Weak};

use async_trait::async_trait;
use serde_json::from_value;
use tracing::{debug, warn};

use super::pending::Unlock;
use crate::{
    bus::{sys, Attachment, Filter, FilterResult, Frame, Verdict},
    client::ClientInner,
};

/// Исходящий фильтр протокола блокировок.
///
/// Снимает с кадра `!sys.lock.request` прикреплённое намерение и кладёт его
/// в таблицу ожидания под id конверта. На провод конверт уходит уже чистым:
/// колбэк через транспорт не путешествует.
pub(crate) struct LockRequestFilter {
    client: Weak<ClientInner>,
}

#[async_trait]
impl Filter for LockRequestFilter {
    async fn apply(&self, mut frame: Frame) -> FilterResult {
        if &*frame.channel == sys::LOCK_REQUEST {
            if let Attachment::Lock(intent) = frame.take_attachment() {
                if let Some(client) = self.client.upgrade() {
                    client
                        .pending_locks
                        .register(frame.envelope.id.clone(), intent);
                }
            }
        }
        Ok(Verdict::Forward(frame))
    }
}

/// Входящий фильтр протокола блокировок.
///
/// На `!sys.lock.acquired` находит ожидающий запрос по `request_id` и
/// вызывает его колбэк с ручкой освобождения. Кадр после этого идёт дальше:
/// обычные подписчики канала тоже вправе его увидеть.
pub(crate) struct LockAcquiredFilter {
    client: Weak<ClientInner>,
}

#[async_trait]
impl Filter for LockAcquiredFilter {
    async fn apply(&self, frame: Frame) -> FilterResult {
        if &*frame.channel == sys::LOCK_ACQUIRED {
            if let Some(client) = self.client.upgrade() {
                match from_value::<sys::LockAcquiredPayload>(frame.envelope.data.clone()) {
                    Ok(payload) => {
                        if let Some(pending) = client.pending_locks.claim(&payload.request_id) {
                            debug!("lock '{}' granted to this node", pending.lock_id);
                            let unlock = Unlock {
                                client: self.client.clone(),
                                lock_id: pending.lock_id,
                            };
                            (pending.on_acquired)(unlock);
                        }
                    }
                    Err(err) => {
                        warn!("malformed payload on '{}' ignored: {}", sys::LOCK_ACQUIRED, err)
                    }
                }
            }
        }
        Ok(Verdict::Forward(frame))
    }
}

/// Ставит фильтры протокола в конвейеры клиента.
///
/// Вызывается при создании клиента, поэтому фильтры блокировок всегда
/// стоят раньше пользовательских.
pub(crate) fn install(inner: &Arc<ClientInner>) {
    inner.filters_out.write().push(Arc::new(LockRequestFilter {
        client: Arc::downgrade(inner),
    }));
    inner.filters_in.write().push(Arc::new(LockAcquiredFilter {
        client: Arc::downgrade(inner),
    }));
}
