//! Адаптер оконного менеджера.
//!
//! Здесь только чтение состояния (мониторы, рабочие столы, окна) и две
//! операции над окнами: перенос на монитор и активация. Решение о переносе
//! принимает SwapCoordinator.

#[cfg(test)]
pub mod fake;
mod sway;
mod sway_events;
mod sway_tree;
mod r#trait;

pub use self::r#trait::{create_window_host, WindowHost};
