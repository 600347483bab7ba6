use super::{CursorSource, HotkeyBackend, HotkeyId, InputInjector, MonitorSource, WindowBackend};
use crate::error::{GripError, Result};
use crate::events::{KeyCode, Modifiers, Monitor, Point, Rect, SyntheticKey, WindowId};
use parking_lot::Mutex;
use std::collections::HashMap;
use tracing::info;

#[derive(Debug, Clone, PartialEq)]
pub struct FakeWindow {
    pub rect: Rect,
    pub maximized: bool,
    pub minimized: bool,
    pub opacity: f64,
    restore_rect: Rect,
}

#[derive(Debug, Default)]
struct DesktopState {
    cursor: Point,
    monitors: Vec<Monitor>,
    windows: HashMap<WindowId, FakeWindow>,
    // Порядок наложения, верхнее окно последним
    stacking: Vec<WindowId>,
    injected: Vec<SyntheticKey>,
    hotkeys: HashMap<HotkeyId, (Modifiers, KeyCode)>,
    // Сочетания, "занятые другим процессом"
    foreign: Vec<(Modifiers, KeyCode)>,
    fail_injection: bool,
}

/// Рабочий стол в памяти: сухой режим и тестовый двойник для всех возможностей ОС
#[derive(Debug, Default)]
pub struct FakeDesktop {
    state: Mutex<DesktopState>,
    verbose: bool,
}

impl FakeDesktop {
    pub fn new(monitors: Vec<Monitor>) -> Self {
        Self {
            state: Mutex::new(DesktopState {
                monitors,
                ..DesktopState::default()
            }),
            verbose: false,
        }
    }

    /// Логировать каждое изменение с префиксом [DRY RUN]
    pub fn verbose(mut self) -> Self {
        self.verbose = true;
        self
    }

    pub fn add_window(&self, id: WindowId, rect: Rect) {
        let mut state = self.state.lock();
        state.windows.insert(
            id,
            FakeWindow {
                rect,
                maximized: false,
                minimized: false,
                opacity: 1.0,
                restore_rect: rect,
            },
        );
        state.stacking.retain(|w| *w != id);
        state.stacking.push(id);
    }

    pub fn set_cursor(&self, point: Point) {
        self.state.lock().cursor = point;
    }

    #[allow(dead_code)]
    pub fn window(&self, id: WindowId) -> Option<FakeWindow> {
        self.state.lock().windows.get(&id).cloned()
    }

    #[allow(dead_code)]
    pub fn injected(&self) -> Vec<SyntheticKey> {
        self.state.lock().injected.clone()
    }

    #[allow(dead_code)]
    pub fn registered_hotkeys(&self) -> usize {
        self.state.lock().hotkeys.len()
    }

    /// Сочетание уже принадлежит другому процессу
    #[allow(dead_code)]
    pub fn occupy(&self, modifiers: Modifiers, key: KeyCode) {
        self.state.lock().foreign.push((modifiers, key));
    }

    #[allow(dead_code)]
    pub fn fail_injection(&self, fail: bool) {
        self.state.lock().fail_injection = fail;
    }

    fn log(&self, message: std::fmt::Arguments<'_>) {
        if self.verbose {
            info!("[DRY RUN] {}", message);
        }
    }

    fn with_window<T>(&self, id: WindowId, f: impl FnOnce(&mut FakeWindow, &[Monitor]) -> T) -> Result<T> {
        let mut state = self.state.lock();
        let DesktopState { windows, monitors, .. } = &mut *state;
        let window = windows
            .get_mut(&id)
            .ok_or_else(|| crate::grip_error!(backend, "окно {} не существует", id))?;
        Ok(f(window, monitors.as_slice()))
    }
}

fn monitor_for(monitors: &[Monitor], point: Point) -> Option<Monitor> {
    monitors
        .iter()
        .find(|m| m.bounds.contains(point))
        .or_else(|| monitors.first())
        .copied()
}

impl CursorSource for FakeDesktop {
    fn cursor_position(&self) -> Result<Point> {
        Ok(self.state.lock().cursor)
    }
}

impl MonitorSource for FakeDesktop {
    fn monitor_at(&self, point: Point) -> Result<Option<Monitor>> {
        Ok(monitor_for(&self.state.lock().monitors, point))
    }
}

impl WindowBackend for FakeDesktop {
    fn window_under_cursor(&self) -> Result<Option<WindowId>> {
        let state = self.state.lock();
        let cursor = state.cursor;
        Ok(state
            .stacking
            .iter()
            .rev()
            .copied()
            .find(|id| {
                state
                    .windows
                    .get(id)
                    .is_some_and(|w| !w.minimized && w.rect.contains(cursor))
            }))
    }

    fn rect(&self, window: WindowId) -> Result<Rect> {
        self.with_window(window, |w, _| w.rect)
    }

    fn set_rect(&self, window: WindowId, rect: Rect) -> Result<()> {
        self.log(format_args!("окно {} -> {}", window, rect));
        self.with_window(window, |w, _| {
            w.rect = rect;
            w.maximized = false;
        })
    }

    fn is_maximized(&self, window: WindowId) -> Result<bool> {
        self.with_window(window, |w, _| w.maximized)
    }

    fn maximize(&self, window: WindowId) -> Result<()> {
        self.log(format_args!("развернуть окно {}", window));
        self.with_window(window, |w, monitors| {
            if !w.maximized {
                w.restore_rect = w.rect;
            }
            if let Some(monitor) = monitor_for(monitors, w.rect.center()) {
                w.rect = monitor.work_area;
            }
            w.maximized = true;
        })
    }

    fn restore(&self, window: WindowId) -> Result<()> {
        self.log(format_args!("восстановить окно {}", window));
        self.with_window(window, |w, _| {
            if w.maximized {
                w.rect = w.restore_rect;
            }
            w.maximized = false;
            w.minimized = false;
        })
    }

    fn minimize(&self, window: WindowId) -> Result<()> {
        self.log(format_args!("свернуть окно {}", window));
        self.with_window(window, |w, _| w.minimized = true)
    }

    fn opacity(&self, window: WindowId) -> Result<f64> {
        self.with_window(window, |w, _| w.opacity)
    }

    fn set_opacity(&self, window: WindowId, opacity: f64) -> Result<()> {
        self.log(format_args!("прозрачность окна {} -> {:.2}", window, opacity));
        self.with_window(window, |w, _| w.opacity = opacity)
    }
}

impl InputInjector for FakeDesktop {
    fn inject(&self, keys: &[SyntheticKey]) -> Result<()> {
        self.log(format_args!("синтетический ввод: {:?}", keys));
        let mut state = self.state.lock();
        if state.fail_injection {
            return Err(GripError::Internal("инъекция отклонена".to_string()));
        }
        state.injected.extend_from_slice(keys);
        Ok(())
    }
}

impl HotkeyBackend for FakeDesktop {
    fn register(&self, id: HotkeyId, modifiers: Modifiers, key: KeyCode) -> Result<()> {
        let mut state = self.state.lock();
        let taken = state.foreign.contains(&(modifiers, key))
            || state.hotkeys.values().any(|combo| *combo == (modifiers, key));
        if taken {
            return Err(crate::grip_error!(conflict, "{}+{}", modifiers, key));
        }
        state.hotkeys.insert(id, (modifiers, key));
        Ok(())
    }

    fn unregister(&self, id: HotkeyId) -> Result<()> {
        self.state.lock().hotkeys.remove(&id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn desktop() -> FakeDesktop {
        let desktop = FakeDesktop::new(vec![Monitor::new(
            Rect::new(0, 0, 1920, 1080),
            Rect::new(0, 0, 1920, 1040),
        )]);
        desktop.add_window(WindowId(1), Rect::new(100, 100, 400, 300));
        desktop.add_window(WindowId(2), Rect::new(300, 200, 400, 300));
        desktop
    }

    #[test]
    fn test_topmost_window_under_cursor() {
        let desktop = desktop();
        desktop.set_cursor(Point::new(350, 250));
        assert_eq!(desktop.window_under_cursor().unwrap(), Some(WindowId(2)));

        desktop.set_cursor(Point::new(150, 150));
        assert_eq!(desktop.window_under_cursor().unwrap(), Some(WindowId(1)));

        desktop.set_cursor(Point::new(1500, 900));
        assert_eq!(desktop.window_under_cursor().unwrap(), None);
    }

    #[test]
    fn test_maximize_and_restore() {
        let desktop = desktop();
        desktop.maximize(WindowId(1)).unwrap();
        assert_eq!(desktop.rect(WindowId(1)).unwrap(), Rect::new(0, 0, 1920, 1040));

        desktop.restore(WindowId(1)).unwrap();
        let window = desktop.window(WindowId(1)).unwrap();
        assert!(!window.maximized);
        assert_eq!(window.rect, Rect::new(100, 100, 400, 300));
    }

    #[test]
    fn test_hotkey_conflicts() {
        let desktop = desktop();
        desktop.occupy(Modifiers::CTRL, KeyCode(30));

        assert!(desktop.register(HotkeyId(1), Modifiers::CTRL, KeyCode(30)).is_err());
        assert!(desktop.register(HotkeyId(2), Modifiers::ALT, KeyCode(30)).is_ok());
        assert!(desktop.register(HotkeyId(3), Modifiers::ALT, KeyCode(30)).is_err());
        assert_eq!(desktop.registered_hotkeys(), 1);
    }

    #[test]
    fn test_unknown_window_is_backend_error() {
        let desktop = desktop();
        assert!(matches!(desktop.rect(WindowId(99)), Err(GripError::Backend(_))));
    }
}
