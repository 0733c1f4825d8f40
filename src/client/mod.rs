pub mod core;

// Публичный экспорт типов клиента, чтобы упростить
// доступ к ним из внешнего кода.
pub use core::Client;

pub(crate) use core::ClientInner;
