use thiserror::Error;

#[derive(Error, Debug)]
pub enum GripError {
    #[error("Ошибка конфигурации: {0}")]
    Config(#[from] anyhow::Error),

    #[error("Ошибка ввода-вывода: {0}")]
    Io(#[from] std::io::Error),

    #[error("Ошибка uinput: {0}")]
    Uinput(#[from] uinput::Error),

    #[error("Устройство не найдено: {0}")]
    DeviceNotFound(String),

    #[error("Недостаточно прав доступа: {0}")]
    Permission(String),

    #[error("Сочетание уже занято: {0}")]
    HotkeyConflict(String),

    #[error("Ошибка внешней утилиты: {0}")]
    Backend(String),

    #[error("Не удалось разобрать вывод: {0}")]
    Parse(String),

    #[error("Внутренняя ошибка: {0}")]
    Internal(String),
}

impl GripError {
    pub fn device_not_found<T>(msg: impl Into<String>) -> Result<T> {
        Err(GripError::DeviceNotFound(msg.into()))
    }
}

pub type Result<T> = std::result::Result<T, GripError>;

// Удобные макросы для создания ошибок
#[macro_export]
macro_rules! grip_error {
    (device_not_found, $($arg:tt)*) => {
        $crate::error::GripError::DeviceNotFound(format!($($arg)*))
    };
    (permission, $($arg:tt)*) => {
        $crate::error::GripError::Permission(format!($($arg)*))
    };
    (conflict, $($arg:tt)*) => {
        $crate::error::GripError::HotkeyConflict(format!($($arg)*))
    };
    (backend, $($arg:tt)*) => {
        $crate::error::GripError::Backend(format!($($arg)*))
    };
    (parse, $($arg:tt)*) => {
        $crate::error::GripError::Parse(format!($($arg)*))
    };
    (internal, $($arg:tt)*) => {
        $crate::error::GripError::Internal(format!($($arg)*))
    };
}
