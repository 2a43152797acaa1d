use thiserror::Error;

#[derive(Error, Debug)]
pub enum FocusSwapError {
    #[error("Ошибка ввода-вывода: {0}")]
    Io(#[from] std::io::Error),

    #[error("Ошибка разбора JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Ошибка наблюдения за файлом: {0}")]
    Watcher(#[from] notify::Error),

    #[error("Команда оконного менеджера не выполнена: {0}")]
    HostCommand(String),

    #[error("Окно не найдено: {0}")]
    WindowNotFound(String),

    #[error("Сервис недоступен: {0}")]
    ServiceUnavailable(String),

    #[error("Внутренняя ошибка: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, FocusSwapError>;

// Удобные макросы для создания ошибок
#[macro_export]
macro_rules! swap_error {
    (host, $($arg:tt)*) => {
        $crate::error::FocusSwapError::HostCommand(format!($($arg)*))
    };
    (window_not_found, $($arg:tt)*) => {
        $crate::error::FocusSwapError::WindowNotFound(format!($($arg)*))
    };
    (service_unavailable, $($arg:tt)*) => {
        $crate::error::FocusSwapError::ServiceUnavailable(format!($($arg)*))
    };
    (internal, $($arg:tt)*) => {
        $crate::error::FocusSwapError::Internal(format!($($arg)*))
    };
}
