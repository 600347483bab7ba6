pub mod keyboard;
pub mod mouse;
pub mod window;

pub use keyboard::{KeyCode, KeyEvent, KeyState, Modifiers};
pub use mouse::{MouseButton, MouseEvent, WHEEL_DELTA};
pub use window::{Monitor, Point, Rect, WindowId};

/// Синтетическое событие клавиатуры для виртуального устройства
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyntheticKey {
    pub key_code: KeyCode,
    pub state: KeyState,
}

impl SyntheticKey {
    pub fn press(key_code: KeyCode) -> Self {
        Self {
            key_code,
            state: KeyState::Pressed,
        }
    }

    pub fn release(key_code: KeyCode) -> Self {
        Self {
            key_code,
            state: KeyState::Released,
        }
    }
}
