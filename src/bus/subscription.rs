use std::{fmt, future::Future, sync::Arc};

use async_trait::async_trait;
use serde_json::Value;

use crate::error::BusResult;

/// Подписчик канала.
///
/// Получает полезную нагрузку конверта (не сам конверт) и имя канала,
/// в который кадр пришёл после входных фильтров. Ошибка обработчика
/// изолируется: остальные подписчики канала всё равно будут вызваны.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn handle(&self, payload: Value, channel: Arc<str>) -> BusResult<()>;
}

/// Адаптер, превращающий асинхронное замыкание в [`Handler`].
pub struct FnHandler<F> {
    f: F,
}

/// Оборачивает замыкание `(payload, channel) -> Future<Result>` в обработчик.
pub fn handler_fn<F, Fut>(f: F) -> FnHandler<F>
where
    F: Fn(Value, Arc<str>) -> Fut + Send + Sync,
    Fut: Future<Output = BusResult<()>> + Send + 'static,
{
    FnHandler { f }
}

#[async_trait]
impl<F, Fut> Handler for FnHandler<F>
where
    F: Fn(Value, Arc<str>) -> Fut + Send + Sync,
    Fut: Future<Output = BusResult<()>> + Send + 'static,
{
    async fn handle(&self, payload: Value, channel: Arc<str>) -> BusResult<()> {
        (self.f)(payload, channel).await
    }
}

/// Идентификатор подписки, выдаваемый `Client::on`.
///
/// Позволяет снять конкретную привязку, не трогая другие подписки
/// того же канала.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub(crate) u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// Запись таблицы подписок: обработчик, привязанный к каналу.
pub(crate) struct Binding {
    pub(crate) id: SubscriptionId,
    pub(crate) channel: Arc<str>,
    pub(crate) handler: Arc<dyn Handler>,
}
