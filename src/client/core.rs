use std::{
    fmt,
    num::NonZeroUsize,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

use lru::LruCache;
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use tracing::{debug, info, trace, warn};
use uuid::Uuid;

use crate::{
    bus::{
        intern_channel, run_chain, sys, Attachment, Binding, Direction, Envelope, Filter, Frame,
        Handler, SubscriptionId,
    },
    config::ClientConfig,
    error::ConfigError,
    lock::{self, LockIntent, PendingLocks, Unlock},
    router::Router,
};

/// Разделяемое состояние клиента: им владеют все клоны [`Client`],
/// колбэк транспорта и фильтры протокола блокировок (через `Weak`).
pub(crate) struct ClientInner {
    node_id: String,
    counter: AtomicU64,
    router: Box<dyn Router>,
    pub(crate) filters_in: RwLock<Vec<Arc<dyn Filter>>>,
    pub(crate) filters_out: RwLock<Vec<Arc<dyn Filter>>>,
    subscriptions: RwLock<Vec<Binding>>,
    ignore: Mutex<LruCache<String, ()>>,
    pub(crate) pending_locks: PendingLocks,
    next_subscription: AtomicU64,
    lock_timeout: Duration,
}

impl ClientInner {
    /// Общий исходящий путь: нумерует конверт, при необходимости заносит
    /// его id в список подавления и запускает конвейер исходящих фильтров.
    /// Терминал конвейера — `router.broadcast`.
    pub(crate) fn emit_frame(
        inner: &Arc<ClientInner>,
        channel: &str,
        data: Value,
        deliver_to_self: bool,
        attachment: Attachment,
    ) {
        let seq = inner.counter.fetch_add(1, Ordering::Relaxed);
        let envelope = Envelope::new(&inner.node_id, seq, data);

        if !deliver_to_self {
            // заносим до отправки: эхо транспорта не обгонит запись
            inner.ignore.lock().put(envelope.id.clone(), ());
        }

        let frame = Frame::with_attachment(channel, envelope, attachment);
        let filters = inner.filters_out.read().clone();
        let task_inner = inner.clone();
        tokio::spawn(async move {
            if let Some(frame) = run_chain(&filters, frame, Direction::Outbound).await {
                trace!("конверт {} уходит в '{}'", frame.envelope.id, frame.channel);
                task_inner.router.broadcast(&frame.channel, frame.envelope);
            }
        });
    }

    /// Терминал входящего конвейера: подавление собственных конвертов
    /// и раздача подписчикам в порядке регистрации.
    async fn dispatch(&self, frame: Frame) {
        if self.ignore.lock().contains(frame.envelope.id.as_str()) {
            trace!("собственный конверт {} подавлен", frame.envelope.id);
            return;
        }

        let matched: Vec<(SubscriptionId, Arc<dyn Handler>)> = {
            let subscriptions = self.subscriptions.read();
            subscriptions
                .iter()
                .filter(|binding| binding.channel == frame.channel)
                .map(|binding| (binding.id, binding.handler.clone()))
                .collect()
        };

        for (id, handler) in matched {
            if let Err(err) = handler
                .handle(frame.envelope.data.clone(), frame.channel.clone())
                .await
            {
                // ошибка одного подписчика не трогает остальных
                warn!("обработчик {} на '{}' упал: {}", id, frame.channel, err);
            }
        }
    }
}

/// Клиент шины сообщений.
///
/// Лёгкая ручка над разделяемым состоянием: клонируется свободно, все
/// клоны говорят от имени одного узла. Конвейеры фильтров и доставка
/// выполняются в задачах tokio, поэтому клиенту нужен работающий runtime.
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

impl Client {
    /// Создаёт клиента поверх транспортной способности.
    ///
    /// Фильтры протокола блокировок встают в конвейеры первыми, до любых
    /// пользовательских. Слушать входящий трафик клиент начинает сразу.
    pub fn new(router: impl Router, config: ClientConfig) -> Result<Self, ConfigError> {
        let capacity =
            NonZeroUsize::new(config.ignore_capacity).ok_or(ConfigError::ZeroIgnoreCapacity)?;
        let node_id = match config.node_id {
            Some(id) if id.is_empty() => return Err(ConfigError::EmptyNodeId),
            Some(id) => id,
            None => Uuid::new_v4().simple().to_string(),
        };

        let inner = Arc::new(ClientInner {
            node_id,
            counter: AtomicU64::new(0),
            router: Box::new(router),
            filters_in: RwLock::new(Vec::new()),
            filters_out: RwLock::new(Vec::new()),
            subscriptions: RwLock::new(Vec::new()),
            ignore: Mutex::new(LruCache::new(capacity)),
            pending_locks: PendingLocks::default(),
            next_subscription: AtomicU64::new(0),
            lock_timeout: config.lock_timeout,
        });

        lock::install(&inner);

        let weak = Arc::downgrade(&inner);
        inner.router.onmessage(Box::new(move |channel, envelope| {
            let Some(inner) = weak.upgrade() else { return };
            let frame = Frame::new(channel, envelope);
            let filters = inner.filters_in.read().clone();
            let task_inner = inner.clone();
            tokio::spawn(async move {
                if let Some(frame) = run_chain(&filters, frame, Direction::Inbound).await {
                    task_inner.dispatch(frame).await;
                }
            });
        }));

        info!("клиент шины готов: узел {}", inner.node_id);
        Ok(Client { inner })
    }

    /// Рассылает сообщение всем узлам шины, кроме самого себя.
    ///
    /// Конвейер фильтров каждого конверта живёт в собственной задаче:
    /// если фильтр засыпает, следующий `emit` может уйти в транспорт
    /// раньше. FIFO по каналу между разными конвертами шина не обещает.
    pub fn emit(&self, channel: &str, data: Value) {
        ClientInner::emit_frame(&self.inner, channel, data, false, Attachment::None);
    }

    /// Рассылает сообщение всем узлам, включая собственные подписки.
    pub fn emit_to_self(&self, channel: &str, data: Value) {
        ClientInner::emit_frame(&self.inner, channel, data, true, Attachment::None);
    }

    /// Подписывает обработчик на канал и объявляет подписку шине
    /// через `!sys.channels.add`.
    ///
    /// Обработчики одного канала вызываются в порядке регистрации.
    pub fn on(&self, channel: &str, handler: impl Handler + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.inner.next_subscription.fetch_add(1, Ordering::Relaxed));
        self.inner.subscriptions.write().push(Binding {
            id,
            channel: intern_channel(channel),
            handler: Arc::new(handler),
        });
        debug!("подписка {} на '{}'", id, channel);

        self.emit(
            sys::CHANNELS_ADD,
            sys::ChannelPayload {
                channel: channel.to_string(),
            }
            .to_value(),
        );
        id
    }

    /// Снимает все подписки канала и возвращает их число.
    ///
    /// За каждую снятую привязку шине уходит отдельное объявление
    /// `!sys.channels.remove` — ровно столько, сколько было `add`.
    pub fn off(&self, channel: &str) -> usize {
        let removed = {
            let mut subscriptions = self.inner.subscriptions.write();
            let before = subscriptions.len();
            subscriptions.retain(|binding| &*binding.channel != channel);
            before - subscriptions.len()
        };
        if removed > 0 {
            debug!("снято {} подписок с '{}'", removed, channel);
        }
        for _ in 0..removed {
            self.emit(
                sys::CHANNELS_REMOVE,
                sys::ChannelPayload {
                    channel: channel.to_string(),
                }
                .to_value(),
            );
        }
        removed
    }

    /// Снимает одну подписку по идентификатору.
    pub fn off_handler(&self, channel: &str, id: SubscriptionId) -> bool {
        let removed = {
            let mut subscriptions = self.inner.subscriptions.write();
            let before = subscriptions.len();
            subscriptions.retain(|binding| !(binding.id == id && &*binding.channel == channel));
            before != subscriptions.len()
        };
        if removed {
            self.emit(
                sys::CHANNELS_REMOVE,
                sys::ChannelPayload {
                    channel: channel.to_string(),
                }
                .to_value(),
            );
        }
        removed
    }

    /// Добавляет фильтр входящего конвейера, в хвост цепочки.
    pub fn filter_in(&self, filter: impl Filter + 'static) {
        self.inner.filters_in.write().push(Arc::new(filter));
    }

    /// Добавляет фильтр исходящего конвейера, в хвост цепочки.
    pub fn filter_out(&self, filter: impl Filter + 'static) {
        self.inner.filters_out.write().push(Arc::new(filter));
    }

    /// Запрашивает распределённую блокировку с таймаутом по умолчанию.
    ///
    /// Колбэк вызовется один раз, когда арбитр выдаст блокировку этому
    /// узлу. Полученную ручку [`Unlock`] нужно использовать: потерянная
    /// ручка держит блокировку до advisory-таймаута.
    pub fn lock(&self, lock_id: &str, on_acquired: impl FnOnce(Unlock) + Send + 'static) {
        self.lock_with_timeout(lock_id, self.inner.lock_timeout, on_acquired);
    }

    /// Запрашивает блокировку с явным advisory-таймаутом.
    pub fn lock_with_timeout(
        &self,
        lock_id: &str,
        timeout: Duration,
        on_acquired: impl FnOnce(Unlock) + Send + 'static,
    ) {
        let payload = sys::LockRequestPayload {
            id: lock_id.to_string(),
            timeout: timeout.as_millis() as u64,
        };
        let intent = LockIntent {
            lock_id: lock_id.to_string(),
            timeout,
            on_acquired: Box::new(on_acquired),
        };
        ClientInner::emit_frame(
            &self.inner,
            sys::LOCK_REQUEST,
            payload.to_value(),
            false,
            Attachment::Lock(intent),
        );
    }

    /// Идентификатор узла этого клиента.
    pub fn node_id(&self) -> &str {
        &self.inner.node_id
    }

    /// Сколько активных подписок в таблице.
    pub fn subscription_count(&self) -> usize {
        self.inner.subscriptions.read().len()
    }

    /// Сколько запросов блокировок ждёт выдачи.
    pub fn pending_lock_count(&self) -> usize {
        self.inner.pending_locks.len()
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("node_id", &self.inner.node_id)
            .finish_non_exhaustive()
    }
}
