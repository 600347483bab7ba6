//! Движок жестов: взведение по удерживаемым модификаторам, опрос движения
//! с паузой после срабатывания и дискретные жесты (кнопки и колесо).

use crate::actions::{Action, GestureFamily, GestureKind};
use crate::bindings::BindingTables;
use crate::events::{Modifiers, MouseButton};
use crate::motion::{
    CursorSample, EdgeFlickParams, EdgeFlickRecognizer, MotionHistory, ShakeParams, ShakeRecognizer, SwipeParams,
    SwipeRecognizer,
};
use crate::platform::{CursorSource, MonitorSource};
use crate::{debug_if_enabled, trace_if_enabled};
use smallvec::SmallVec;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GestureSettings {
    pub enabled: bool,
    pub cooldown_ms: u64,
    pub scroll_quantum: i32,
}

impl Default for GestureSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            cooldown_ms: 400,
            scroll_quantum: crate::events::WHEEL_DELTA,
        }
    }
}

/// Распознанный жест, у которого есть привязка
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GestureFired {
    pub kind: GestureKind,
    pub action: Action,
    pub modifiers: Modifiers,
}

pub type FiredGestures = SmallVec<[GestureFired; 2]>;

pub struct GestureEngine {
    cursor: Arc<dyn CursorSource>,
    monitors: Arc<dyn MonitorSource>,
    settings: GestureSettings,
    armed_for: Option<Modifiers>,
    history: MotionHistory,
    shake: ShakeRecognizer,
    scroll_accumulator: i32,
    cooldown_until_ms: Option<u64>,
    epoch: Instant,
}

impl GestureEngine {
    pub fn new(cursor: Arc<dyn CursorSource>, monitors: Arc<dyn MonitorSource>, settings: GestureSettings) -> Self {
        Self {
            cursor,
            monitors,
            settings,
            armed_for: None,
            history: MotionHistory::new(),
            shake: ShakeRecognizer::new(),
            scroll_accumulator: 0,
            cooldown_until_ms: None,
            epoch: Instant::now(),
        }
    }

    pub fn is_armed(&self) -> bool {
        self.armed_for.is_some()
    }

    /// Новые настройки применяются сразу, включая пересчёт состояния "вооружён"
    pub fn set_settings(&mut self, settings: GestureSettings, modifiers: Modifiers, tables: &BindingTables) {
        self.settings = settings;
        self.update_modifiers(modifiers, tables);
    }

    pub fn set_enabled(&mut self, enabled: bool, modifiers: Modifiers, tables: &BindingTables) {
        self.settings.enabled = enabled;
        self.update_modifiers(modifiers, tables);
    }

    /// Пересчёт при каждом изменении удерживаемых модификаторов.
    /// Возвращает Some(armed), если состояние изменилось.
    pub fn update_modifiers(&mut self, modifiers: Modifiers, tables: &BindingTables) -> Option<bool> {
        let target = (self.settings.enabled && tables.has_gestures_for(modifiers)).then_some(modifiers);
        if target == self.armed_for {
            return None;
        }

        let was_armed = self.armed_for.is_some();
        self.armed_for = target;
        self.clear_transient();

        match target {
            Some(mods) => debug!("Жесты включены для {}", mods),
            None => debug!("Жесты выключены"),
        }
        (was_armed != target.is_some()).then_some(target.is_some())
    }

    fn clear_transient(&mut self) {
        self.history.clear();
        self.shake.reset();
        self.scroll_accumulator = 0;
        self.cooldown_until_ms = None;
    }

    fn now_ms(&self) -> u64 {
        self.epoch.elapsed().as_millis() as u64
    }

    fn cooling_down(&mut self, now_ms: u64) -> bool {
        match self.cooldown_until_ms {
            Some(until) if now_ms < until => true,
            Some(_) => {
                self.cooldown_until_ms = None;
                false
            }
            None => false,
        }
    }

    fn enter_cooldown(&mut self, now_ms: u64) {
        self.cooldown_until_ms = Some(now_ms + self.settings.cooldown_ms);
        self.history.clear();
        self.shake.reset();
    }

    pub fn tick(&mut self, dragging: bool, tables: &BindingTables) -> Option<GestureFired> {
        let now = self.now_ms();
        self.tick_at(now, dragging, tables)
    }

    /// Шаг опроса с явным временем. Вне режима "вооружён" ничего не делает.
    pub fn tick_at(&mut self, now_ms: u64, dragging: bool, tables: &BindingTables) -> Option<GestureFired> {
        let modifiers = self.armed_for?;

        let position = match self.cursor.cursor_position() {
            Ok(position) => position,
            Err(e) => {
                debug_if_enabled!("Позиция курсора недоступна: {}", e);
                return None;
            }
        };
        let sample = CursorSample::new(position.x, position.y, now_ms);
        self.history.add(sample);

        if dragging || self.cooling_down(now_ms) {
            return None;
        }

        let fired = self.recognize(sample, modifiers, tables)?;
        debug!("Жест {:?} -> {}", fired.kind, fired.action);
        self.enter_cooldown(now_ms);
        Some(fired)
    }

    // Порядок проверки фиксирован: shake, swipe, edge flick
    fn recognize(&mut self, sample: CursorSample, modifiers: Modifiers, tables: &BindingTables) -> Option<GestureFired> {
        let bound = |kind: GestureKind| {
            tables.gesture(modifiers, kind).map(|action| GestureFired {
                kind,
                action,
                modifiers,
            })
        };

        let shake_params = ShakeParams::from_params(tables.params_for(modifiers, GestureFamily::Shake));
        if let Some(fired) = self.shake.update(sample, &shake_params).and_then(bound) {
            return Some(fired);
        }

        let swipe_params = SwipeParams::from_params(tables.params_for(modifiers, GestureFamily::Swipe));
        if let Some(fired) = SwipeRecognizer::evaluate(&self.history, &swipe_params).and_then(bound) {
            return Some(fired);
        }

        // Монитор запрашивается только при наличии привязок этого семейства
        let flick_params = tables.params_for(modifiers, GestureFamily::EdgeFlick)?;
        let flick_params = EdgeFlickParams::from_params(Some(flick_params));
        let position = crate::events::Point::new(sample.x, sample.y);
        let monitor = match self.monitors.monitor_at(position) {
            Ok(Some(monitor)) => monitor,
            Ok(None) => return None,
            Err(e) => {
                debug_if_enabled!("Монитор под курсором недоступен: {}", e);
                return None;
            }
        };
        EdgeFlickRecognizer::evaluate(&self.history, &monitor.bounds, &flick_params).and_then(bound)
    }

    /// Кнопки мыши срабатывают сразу, без задержки повторного срабатывания
    pub fn on_button(
        &mut self,
        button: MouseButton,
        pressed: bool,
        dragging: bool,
        tables: &BindingTables,
    ) -> Option<GestureFired> {
        let modifiers = self.armed_for?;
        if !pressed || dragging {
            return None;
        }

        let kind = match button {
            MouseButton::Middle => GestureKind::MiddleClick,
            MouseButton::Back => GestureKind::BackButton,
            MouseButton::Forward => GestureKind::ForwardButton,
        };
        let action = tables.gesture(modifiers, kind)?;
        debug!("Жест {:?} -> {}", kind, action);
        Some(GestureFired {
            kind,
            action,
            modifiers,
        })
    }

    /// Прокрутка накапливается и срабатывает по одному действию на квант
    pub fn on_scroll(&mut self, delta: i32, dragging: bool, tables: &BindingTables) -> FiredGestures {
        let mut fired = FiredGestures::new();
        let Some(modifiers) = self.armed_for else {
            return fired;
        };
        if dragging {
            return fired;
        }

        let quantum = self.settings.scroll_quantum.max(1);
        self.scroll_accumulator += delta;
        trace_if_enabled!("Прокрутка {} (накоплено {})", delta, self.scroll_accumulator);

        while self.scroll_accumulator.abs() >= quantum {
            let kind = if self.scroll_accumulator > 0 {
                self.scroll_accumulator -= quantum;
                GestureKind::ScrollUp
            } else {
                self.scroll_accumulator += quantum;
                GestureKind::ScrollDown
            };
            if let Some(action) = tables.gesture(modifiers, kind) {
                fired.push(GestureFired {
                    kind,
                    action,
                    modifiers,
                });
            }
        }
        fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GestureEntry;
    use crate::events::{Monitor, Point, Rect};
    use crate::platform::FakeDesktop;
    use std::collections::HashMap;

    fn mods() -> Modifiers {
        Modifiers::SUPER | Modifiers::SHIFT
    }

    fn gesture(kind: &str, action: &str) -> GestureEntry {
        GestureEntry {
            name: kind.to_string(),
            gesture: kind.to_string(),
            modifiers: vec!["super".to_string(), "shift".to_string()],
            action: action.to_string(),
            params: HashMap::new(),
        }
    }

    fn tables() -> BindingTables {
        BindingTables::build(
            &[],
            &[
                gesture("swipe_left", "snap_left"),
                gesture("swipe_right", "snap_right"),
                gesture("shake_horizontal", "restore"),
                gesture("edge_flick_top", "maximize"),
                gesture("scroll_up", "opacity_up"),
                gesture("scroll_down", "opacity_down"),
                gesture("middle_click", "center"),
            ],
        )
    }

    fn setup() -> (Arc<FakeDesktop>, GestureEngine) {
        let desktop = Arc::new(FakeDesktop::new(vec![Monitor::full(Rect::new(0, 0, 1920, 1080))]));
        desktop.set_cursor(Point::new(960, 540));
        let engine = GestureEngine::new(desktop.clone(), desktop.clone(), GestureSettings::default());
        (desktop, engine)
    }

    /// Прогоняет путь курсора по кадрам 20мс начиная с `start_ms`
    fn drive(
        desktop: &FakeDesktop,
        engine: &mut GestureEngine,
        tables: &BindingTables,
        start_ms: u64,
        path: &[(i32, i32)],
    ) -> Vec<GestureFired> {
        path.iter()
            .enumerate()
            .filter_map(|(i, &(x, y))| {
                desktop.set_cursor(Point::new(x, y));
                engine.tick_at(start_ms + i as u64 * 20, false, tables)
            })
            .collect()
    }

    #[test]
    fn test_arming_follows_modifiers() {
        let (_desktop, mut engine) = setup();
        let tables = tables();

        assert_eq!(engine.update_modifiers(Modifiers::SUPER, &tables), None);
        assert_eq!(engine.update_modifiers(mods(), &tables), Some(true));
        assert!(engine.is_armed());
        assert_eq!(engine.update_modifiers(mods() | Modifiers::CTRL, &tables), Some(false));

        engine.update_modifiers(mods(), &tables);
        engine.set_enabled(false, mods(), &tables);
        assert!(!engine.is_armed());
    }

    #[test]
    fn test_tick_disarmed_is_noop() {
        let (desktop, mut engine) = setup();
        let tables = tables();
        let fired = drive(&desktop, &mut engine, &tables, 0, &[(900, 500), (850, 500), (800, 500)]);
        assert!(fired.is_empty());
        assert!(engine.history.is_empty());
    }

    #[test]
    fn test_swipe_fires_once_then_cooldown() {
        let (desktop, mut engine) = setup();
        let tables = tables();
        engine.update_modifiers(mods(), &tables);

        let path: Vec<(i32, i32)> = (0..6).map(|i| (1000 - i * 25, 500)).collect();
        let fired = drive(&desktop, &mut engine, &tables, 0, &path);
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].kind, GestureKind::SwipeLeft);
        assert_eq!(fired[0].action, Action::SnapLeft);

        // Продолжение того же движения внутри задержки не срабатывает
        let path: Vec<(i32, i32)> = (0..6).map(|i| (850 - i * 25, 500)).collect();
        assert!(drive(&desktop, &mut engine, &tables, 120, &path).is_empty());

        // После задержки новый жест распознаётся
        let path: Vec<(i32, i32)> = (0..6).map(|i| (600 + i * 25, 500)).collect();
        let fired = drive(&desktop, &mut engine, &tables, 1000, &path);
        assert_eq!(fired.first().map(|f| f.kind), Some(GestureKind::SwipeRight));
    }

    #[test]
    fn test_shake_has_priority() {
        let (desktop, mut engine) = setup();
        let tables = tables();
        engine.update_modifiers(mods(), &tables);

        let path = [(500, 500), (560, 500), (500, 500), (560, 500), (500, 500)];
        let fired = drive(&desktop, &mut engine, &tables, 0, &path);
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].kind, GestureKind::ShakeHorizontal);
    }

    #[test]
    fn test_edge_flick_top() {
        let (desktop, mut engine) = setup();
        let tables = tables();
        engine.update_modifiers(mods(), &tables);

        let path = [(960, 200), (960, 130), (960, 60), (960, 2)];
        let fired = drive(&desktop, &mut engine, &tables, 0, &path);
        assert_eq!(fired.first().map(|f| f.kind), Some(GestureKind::EdgeFlickTop));
    }

    #[test]
    fn test_no_recognition_while_dragging() {
        let (desktop, mut engine) = setup();
        let tables = tables();
        engine.update_modifiers(mods(), &tables);

        for (i, x) in [1000, 960, 920, 880, 840].iter().enumerate() {
            desktop.set_cursor(Point::new(*x, 500));
            assert!(engine.tick_at(i as u64 * 20, true, &tables).is_none());
        }
        assert_eq!(engine.history.len(), 5);
        assert!(engine.on_button(MouseButton::Middle, true, true, &tables).is_none());
        assert!(engine.on_scroll(240, true, &tables).is_empty());
    }

    #[test]
    fn test_scroll_quantum_accumulation() {
        let (_desktop, mut engine) = setup();
        let tables = tables();
        engine.update_modifiers(mods(), &tables);

        // Колесо высокого разрешения: 4 события по 30 дают один квант
        let mut fired = FiredGestures::new();
        for _ in 0..4 {
            fired.extend(engine.on_scroll(30, false, &tables));
        }
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].action, Action::OpacityUp);

        let fired = engine.on_scroll(-250, false, &tables);
        assert_eq!(fired.len(), 2);
        assert!(fired.iter().all(|f| f.kind == GestureKind::ScrollDown));
        assert_eq!(engine.scroll_accumulator, -10);
    }

    #[test]
    fn test_buttons_fire_immediately_without_cooldown() {
        let (_desktop, mut engine) = setup();
        let tables = tables();
        assert!(engine.on_button(MouseButton::Middle, true, false, &tables).is_none());

        engine.update_modifiers(mods(), &tables);
        for _ in 0..3 {
            let fired = engine.on_button(MouseButton::Middle, true, false, &tables);
            assert_eq!(fired.map(|f| f.action), Some(Action::Center));
        }
        assert!(engine.on_button(MouseButton::Middle, false, false, &tables).is_none());
        assert!(engine.on_button(MouseButton::Back, true, false, &tables).is_none());
    }
}
