use std::sync::Arc;

use dashmap::DashMap;
use once_cell::sync::Lazy;

/// Пул каналов: одно имя канала — один общий `Arc<str>` на весь процесс.
/// Crate-private: внешний код получает интернированные имена только через `Frame`.
static CHANNEL_POOL: Lazy<DashMap<String, Arc<str>>> = Lazy::new(DashMap::new);

/// Возвращает интернированный `Arc<str>` для имени канала.
///
/// Повторные вызовы с тем же именем возвращают клон одного и того же `Arc`,
/// поэтому сравнение каналов в таблице подписок сводится к сравнению указателей.
#[inline(always)]
pub(crate) fn intern_channel<S: AsRef<str>>(chan: S) -> Arc<str> {
    let key = chan.as_ref();
    if let Some(existing) = CHANNEL_POOL.get(key) {
        return existing.clone();
    }
    CHANNEL_POOL
        .entry(key.to_string())
        .or_insert_with(|| Arc::from(key))
        .clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Тест проверяет, что повторное интернирование одного имени
    /// возвращает тот же самый Arc (по указателю).
    #[test]
    fn test_intern_returns_shared_arc() {
        let a = intern_channel("chat.room");
        let b = intern_channel("chat.room");
        assert_eq!(&*a, "chat.room");
        assert!(Arc::ptr_eq(&a, &b), "same channel must share one Arc");
    }

    /// Тест проверяет, что разные имена каналов дают разные Arc.
    #[test]
    fn test_intern_distinct_names() {
        let a = intern_channel("alpha");
        let b = intern_channel("beta");
        assert!(!Arc::ptr_eq(&a, &b));
    }

    /// Тест проверяет интернирование из String и из литерала.
    #[test]
    fn test_intern_string_and_literal() {
        let owned = String::from("!sys.lock.request");
        let a = intern_channel(&owned);
        let b = intern_channel("!sys.lock.request");
        assert!(Arc::ptr_eq(&a, &b));
    }

    /// Тест проверяет, что конкурентные вызовы для одного имени
    /// сходятся к единственному Arc.
    #[test]
    fn test_intern_concurrent_same_key() {
        let handles: Vec<_> = (0..8)
            .map(|_| std::thread::spawn(|| intern_channel("racey")))
            .collect();
        let arcs: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        for arc in &arcs[1..] {
            assert!(Arc::ptr_eq(&arcs[0], arc));
        }
    }
}
