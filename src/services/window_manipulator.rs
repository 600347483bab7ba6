use crate::actions::Action;
use crate::error::Result;
use crate::events::{Monitor, Rect, WindowId};
use crate::platform::{MonitorSource, WindowBackend};
use std::sync::Arc;
use tracing::info;

/// Шаг и нижняя граница непрозрачности
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OpacitySettings {
    pub step: f64,
    pub minimum: f64,
}

impl Default for OpacitySettings {
    fn default() -> Self {
        Self { step: 0.1, minimum: 0.2 }
    }
}

/// Операции над окном без собственного состояния
#[derive(Clone)]
pub struct WindowManipulator {
    windows: Arc<dyn WindowBackend>,
    monitors: Arc<dyn MonitorSource>,
    opacity: OpacitySettings,
}

impl WindowManipulator {
    pub fn new(windows: Arc<dyn WindowBackend>, monitors: Arc<dyn MonitorSource>, opacity: OpacitySettings) -> Self {
        Self {
            windows,
            monitors,
            opacity,
        }
    }

    pub fn set_opacity_settings(&mut self, opacity: OpacitySettings) {
        self.opacity = opacity;
    }

    pub fn rect(&self, window: WindowId) -> Result<Rect> {
        self.windows.rect(window)
    }

    pub fn set_rect(&self, window: WindowId, rect: Rect) -> Result<()> {
        self.windows.set_rect(window, rect)
    }

    /// Монитор, на котором находится центр окна
    pub fn monitor_of(&self, window: WindowId) -> Result<Option<Monitor>> {
        let rect = self.windows.rect(window)?;
        self.monitors.monitor_at(rect.center())
    }

    /// Снимает развёрнутое состояние, если оно есть. Возвращает true, если окно было развёрнуто.
    pub fn ensure_normal(&self, window: WindowId) -> Result<bool> {
        if self.windows.is_maximized(window)? {
            self.windows.restore(window)?;
            return Ok(true);
        }
        Ok(false)
    }

    pub fn minimize(&self, window: WindowId) -> Result<()> {
        self.windows.minimize(window)
    }

    pub fn toggle_maximize(&self, window: WindowId) -> Result<()> {
        if self.windows.is_maximized(window)? {
            self.windows.restore(window)
        } else {
            self.windows.maximize(window)
        }
    }

    pub fn restore(&self, window: WindowId) -> Result<()> {
        self.windows.restore(window)
    }

    pub fn adjust_opacity(&self, window: WindowId, delta: f64) -> Result<f64> {
        let current = self.windows.opacity(window)?;
        let target = (current + delta).clamp(self.opacity.minimum, 1.0);
        // Округление до сотых, чтобы шаги не накапливали погрешность
        let target = (target * 100.0).round() / 100.0;
        self.windows.set_opacity(window, target)?;
        Ok(target)
    }

    pub fn reset_opacity(&self, window: WindowId) -> Result<()> {
        self.windows.set_opacity(window, 1.0)
    }

    /// Центрирует окно в рабочей области его монитора
    pub fn center(&self, window: WindowId) -> Result<()> {
        self.ensure_normal(window)?;
        let rect = self.windows.rect(window)?;
        let Some(monitor) = self.monitors.monitor_at(rect.center())? else {
            return Ok(());
        };
        let area = monitor.work_area;
        let x = area.x + (area.width - rect.width) / 2;
        let y = area.y + (area.height - rect.height) / 2;
        self.windows.set_rect(window, Rect::new(x, y, rect.width, rect.height))
    }

    /// Выполняет простое (не перетаскивание и не привязку к краю) действие
    pub fn apply(&self, action: Action, window: WindowId) -> Result<()> {
        match action {
            Action::Minimize => self.minimize(window),
            Action::Maximize => self.toggle_maximize(window),
            Action::Restore => self.restore(window),
            Action::OpacityUp => self.adjust_opacity(window, self.opacity.step).map(|_| ()),
            Action::OpacityDown => self.adjust_opacity(window, -self.opacity.step).map(|_| ()),
            Action::OpacityReset => self.reset_opacity(window),
            Action::Center => self.center(window),
            Action::StartMove | Action::StartResize | Action::SnapLeft | Action::SnapRight => {
                info!("Действие {} не выполняется манипулятором окна", action);
                Ok(())
            }
        }
    }
}
