//! Возможности ОС, которые потребляет ядро.
//!
//! Ядро зависит только от семантики этих трейтов. Реализации:
//! - X11 утилиты (xdotool / xprop / wmctrl / xrandr) через `std::process::Command`;
//! - uinput для синтетического ввода;
//! - evdev сопоставление для глобальных сочетаний;
//! - `FakeDesktop` для сухого режима и тестов.

pub mod dry_run;
pub mod hotkeys;
pub mod injector;
pub mod x11;

pub use dry_run::FakeDesktop;
pub use hotkeys::{EvdevHotkeyBackend, HotkeyId};
pub use injector::{UinputInjector, INJECTED_DEVICE_NAME};

use crate::error::Result;
use crate::events::{KeyCode, Modifiers, Monitor, Point, Rect, SyntheticKey, WindowId};
use std::sync::Arc;

pub trait CursorSource: Send + Sync {
    fn cursor_position(&self) -> Result<Point>;
}

pub trait MonitorSource: Send + Sync {
    /// Монитор, содержащий точку (или ближайший к ней)
    fn monitor_at(&self, point: Point) -> Result<Option<Monitor>>;
}

pub trait WindowBackend: Send + Sync {
    fn window_under_cursor(&self) -> Result<Option<WindowId>>;
    fn rect(&self, window: WindowId) -> Result<Rect>;
    fn set_rect(&self, window: WindowId, rect: Rect) -> Result<()>;
    fn is_maximized(&self, window: WindowId) -> Result<bool>;
    fn maximize(&self, window: WindowId) -> Result<()>;
    fn restore(&self, window: WindowId) -> Result<()>;
    fn minimize(&self, window: WindowId) -> Result<()>;
    /// Непрозрачность в диапазоне 0.0..=1.0
    fn opacity(&self, window: WindowId) -> Result<f64>;
    fn set_opacity(&self, window: WindowId, opacity: f64) -> Result<()>;
}

/// Синтетический ввод. Все события помечаются приватным маркером,
/// по которому собственный хук их распознаёт и игнорирует.
pub trait InputInjector: Send + Sync {
    fn inject(&self, keys: &[SyntheticKey]) -> Result<()>;
}

/// Системная регистрация глобальных сочетаний
pub trait HotkeyBackend: Send + Sync {
    fn register(&self, id: HotkeyId, modifiers: Modifiers, key: KeyCode) -> Result<()>;
    fn unregister(&self, id: HotkeyId) -> Result<()>;
}

/// Набор возможностей ОС, которым владеет оркестратор
#[derive(Clone)]
pub struct Platform {
    pub cursor: Arc<dyn CursorSource>,
    pub monitors: Arc<dyn MonitorSource>,
    pub windows: Arc<dyn WindowBackend>,
    pub injector: Arc<dyn InputInjector>,
    pub hotkeys: Arc<dyn HotkeyBackend>,
}

impl Platform {
    /// Все возможности поверх одного in-memory рабочего стола
    pub fn fake(desktop: Arc<FakeDesktop>) -> Self {
        Self {
            cursor: desktop.clone(),
            monitors: desktop.clone(),
            windows: desktop.clone(),
            injector: desktop.clone(),
            hotkeys: desktop,
        }
    }

    /// X11 утилиты + uinput + evdev сопоставление сочетаний
    pub fn x11(hotkeys: Arc<EvdevHotkeyBackend>, injector: Arc<UinputInjector>) -> Self {
        let x11 = Arc::new(x11::X11Desktop::new());
        Self {
            cursor: x11.clone(),
            monitors: x11.clone(),
            windows: x11,
            injector,
            hotkeys,
        }
    }
}
