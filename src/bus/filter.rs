use std::{fmt, future::Future, sync::Arc};

use async_trait::async_trait;
use tracing::{debug, warn};

use super::Frame;
use crate::error::BusError;

/// Результат одного шага фильтра.
pub type FilterResult = Result<Verdict, BusError>;

/// Вердикт фильтра: передать кадр дальше (возможно, изменённым) или снять
/// его с конвейера. Снятый кадр не доходит ни до терминала, ни до
/// последующих фильтров.
#[derive(Debug)]
pub enum Verdict {
    Forward(Frame),
    Drop,
}

/// Шаг конвейера фильтров.
///
/// Фильтры применяются строго в порядке регистрации. Фильтр владеет кадром
/// на время шага: он может переписать канал или содержимое и вернуть кадр
/// через `Verdict::Forward`, либо поглотить его через `Verdict::Drop`.
#[async_trait]
pub trait Filter: Send + Sync {
    async fn apply(&self, frame: Frame) -> FilterResult;
}

/// Адаптер, превращающий асинхронное замыкание в [`Filter`].
pub struct FnFilter<F> {
    f: F,
}

/// Оборачивает замыкание `Frame -> Future<FilterResult>` в фильтр.
pub fn filter_fn<F, Fut>(f: F) -> FnFilter<F>
where
    F: Fn(Frame) -> Fut + Send + Sync,
    Fut: Future<Output = FilterResult> + Send + 'static,
{
    FnFilter { f }
}

#[async_trait]
impl<F, Fut> Filter for FnFilter<F>
where
    F: Fn(Frame) -> Fut + Send + Sync,
    Fut: Future<Output = FilterResult> + Send + 'static,
{
    async fn apply(&self, frame: Frame) -> FilterResult {
        (self.f)(frame).await
    }
}

/// Направление конвейера, различимое только в логах.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Direction {
    Inbound,
    Outbound,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Inbound => f.write_str("inbound"),
            Direction::Outbound => f.write_str("outbound"),
        }
    }
}

/// Прогоняет кадр через цепочку фильтров.
///
/// Возвращает `Some(frame)`, если все фильтры передали кадр дальше.
/// `Drop` и ошибка фильтра завершают конвейер: ошибка уходит в лог,
/// у остальных участников шины ничего не ломается.
pub(crate) async fn run_chain(
    filters: &[Arc<dyn Filter>],
    mut frame: Frame,
    direction: Direction,
) -> Option<Frame> {
    for filter in filters {
        let channel = frame.channel.clone();
        match filter.apply(frame).await {
            Ok(Verdict::Forward(next)) => frame = next,
            Ok(Verdict::Drop) => {
                debug!("{} filter dropped message on '{}'", direction, channel);
                return None;
            }
            Err(err) => {
                warn!(
                    "{} filter failed on '{}', message dropped: {}",
                    direction, channel, err
                );
                return None;
            }
        }
    }
    Some(frame)
}
