use std::{
    collections::{HashMap, VecDeque},
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Weak,
    },
    time::Duration,
};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::from_value;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::{
    bus::{sys, Filter, FilterResult, Frame, Verdict},
    client::Client,
};

/// Выигравший или ожидающий запрос на блокировку.
#[derive(Debug, Clone)]
struct Grant {
    request_id: String,
    timeout: Duration,
    generation: u64,
}

/// Очередь на одну блокировку: текущий держатель и хвост ожидающих.
struct LockQueue {
    holder: Option<Grant>,
    waiting: VecDeque<Grant>,
}

struct ArbiterState {
    client: Client,
    locks: Mutex<HashMap<String, LockQueue>>,
    generation: AtomicU64,
}

/// Арбитр блокировок, обслуживающий шину через приданного клиента.
///
/// Слушает `!sys.lock.request` и `!sys.lock.release` входным фильтром
/// клиента и выдаёт `!sys.lock.acquired` в порядке поступления запросов.
/// Advisory-таймаут запроса — страховка шины: держатель, не отпустивший
/// блокировку вовремя, теряет её принудительно.
///
/// Арбитр действует, пока жив возвращённый объект: после его дропа фильтр
/// превращается в пустышку и запросы остаются без ответа.
pub struct LockArbiter {
    state: Arc<ArbiterState>,
}

impl LockArbiter {
    /// Вешает арбитра на клиента. С этого момента узел клиента отвечает
    /// за раздачу блокировок всей шине.
    pub fn attach(client: &Client) -> Self {
        let state = Arc::new(ArbiterState {
            client: client.clone(),
            locks: Mutex::new(HashMap::new()),
            generation: AtomicU64::new(0),
        });
        client.filter_in(ArbiterFilter {
            state: Arc::downgrade(&state),
        });
        LockArbiter { state }
    }

    /// Сколько блокировок сейчас выдано.
    pub fn held_count(&self) -> usize {
        self.state
            .locks
            .lock()
            .values()
            .filter(|queue| queue.holder.is_some())
            .count()
    }

    /// Сколько запросов стоит в очередях.
    pub fn waiting_count(&self) -> usize {
        self.state
            .locks
            .lock()
            .values()
            .map(|queue| queue.waiting.len())
            .sum()
    }
}

struct ArbiterFilter {
    state: Weak<ArbiterState>,
}

#[async_trait]
impl Filter for ArbiterFilter {
    async fn apply(&self, frame: Frame) -> FilterResult {
        let Some(state) = self.state.upgrade() else {
            return Ok(Verdict::Forward(frame));
        };
        // обычный трафик арбитра не касается
        if !sys::is_system_channel(&frame.channel) {
            return Ok(Verdict::Forward(frame));
        }
        match &*frame.channel {
            sys::LOCK_REQUEST => {
                match from_value::<sys::LockRequestPayload>(frame.envelope.data.clone()) {
                    Ok(payload) => {
                        let grant = Grant {
                            request_id: frame.envelope.id.clone(),
                            timeout: Duration::from_millis(payload.timeout),
                            generation: state.generation.fetch_add(1, Ordering::Relaxed),
                        };
                        handle_request(&state, &payload.id, grant);
                    }
                    Err(err) => {
                        warn!("malformed payload on '{}' ignored: {}", sys::LOCK_REQUEST, err)
                    }
                }
            }
            sys::LOCK_RELEASE => {
                match from_value::<sys::LockReleasePayload>(frame.envelope.data.clone()) {
                    Ok(payload) => handle_release(&state, &payload.id),
                    Err(err) => {
                        warn!("malformed payload on '{}' ignored: {}", sys::LOCK_RELEASE, err)
                    }
                }
            }
            _ => {}
        }
        Ok(Verdict::Forward(frame))
    }
}

fn handle_request(state: &Arc<ArbiterState>, lock_id: &str, grant: Grant) {
    let granted = {
        let mut locks = state.locks.lock();
        let queue = locks.entry(lock_id.to_string()).or_insert_with(|| LockQueue {
            holder: None,
            waiting: VecDeque::new(),
        });
        if queue.holder.is_none() {
            queue.holder = Some(grant.clone());
            true
        } else {
            debug!(
                "lock '{}' busy, request {} queued at position {}",
                lock_id,
                grant.request_id,
                queue.waiting.len() + 1
            );
            queue.waiting.push_back(grant.clone());
            false
        }
    };
    if granted {
        announce(state, lock_id, grant);
    }
}

fn handle_release(state: &Arc<ArbiterState>, lock_id: &str) {
    let next = {
        let mut locks = state.locks.lock();
        let Some(queue) = locks.get_mut(lock_id) else {
            debug!("release of unknown lock '{}' ignored", lock_id);
            return;
        };
        queue.holder = queue.waiting.pop_front();
        let next = queue.holder.clone();
        if next.is_none() {
            // пустая очередь не живёт в таблице
            locks.remove(lock_id);
        }
        next
    };
    if let Some(grant) = next {
        announce(state, lock_id, grant);
    }
}

/// Отзывает блокировку по advisory-таймауту, если её всё ещё держит
/// то самое поколение, для которого взводился таймер.
fn expire(state: &Arc<ArbiterState>, lock_id: &str, generation: u64) {
    let next = {
        let mut locks = state.locks.lock();
        let Some(queue) = locks.get_mut(lock_id) else {
            return;
        };
        let reclaimed = match queue.holder.take() {
            Some(holder) if holder.generation == generation => holder,
            other => {
                // держатель уже сменился, таймер устарел
                queue.holder = other;
                return;
            }
        };
        warn!(
            "lock '{}' held past its advisory timeout, reclaimed from request {}",
            lock_id, reclaimed.request_id
        );
        queue.holder = queue.waiting.pop_front();
        let next = queue.holder.clone();
        if next.is_none() {
            locks.remove(lock_id);
        }
        next
    };
    if let Some(grant) = next {
        announce(state, lock_id, grant);
    }
}

fn announce(state: &Arc<ArbiterState>, lock_id: &str, grant: Grant) {
    info!("lock '{}' granted to request {}", lock_id, grant.request_id);
    state.client.emit(
        sys::LOCK_ACQUIRED,
        sys::LockAcquiredPayload {
            request_id: grant.request_id.clone(),
        }
        .to_value(),
    );

    let weak = Arc::downgrade(state);
    let lock_id = lock_id.to_string();
    tokio::spawn(async move {
        sleep(grant.timeout).await;
        if let Some(state) = weak.upgrade() {
            expire(&state, &lock_id, grant.generation);
        }
    });
}
