use serde::{Deserialize, Serialize};
use std::fmt;

/// Количество единиц прокрутки на один "щелчок" колеса
pub const WHEEL_DELTA: i32 = 120;

/// Кнопки мыши, которые участвуют в жестах
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MouseButton {
    Middle,
    Back,
    Forward,
}

impl MouseButton {
    /// evdev BTN_MIDDLE / BTN_SIDE / BTN_EXTRA
    pub fn from_evdev_code(code: u16) -> Option<Self> {
        match code {
            0x112 => Some(MouseButton::Middle),
            0x113 => Some(MouseButton::Back),
            0x114 => Some(MouseButton::Forward),
            _ => None,
        }
    }
}

/// Событие мыши из низкоуровневого потока
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseEvent {
    Button { button: MouseButton, pressed: bool },
    /// Положительное значение - прокрутка вверх, в единицах WHEEL_DELTA на щелчок
    Scroll { delta: i32 },
}

impl fmt::Display for MouseEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MouseEvent::Button { button, pressed } => {
                write!(f, "{:?} {}", button, if *pressed { "down" } else { "up" })
            }
            MouseEvent::Scroll { delta } => write!(f, "scroll {}", delta),
        }
    }
}
