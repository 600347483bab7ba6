//! Оркестратор: единственная последовательная очередь задач.
//!
//! Одна задача tokio владеет всем состоянием движка. Сообщения слушателей,
//! отложенные задачи и два независимых таймера опроса (перетаскивание и жесты)
//! обрабатываются строго по очереди, общего изменяемого состояния нет.

use crate::actions::{Action, GestureKind};
use crate::bindings::BindingTables;
use crate::config::Config;
use crate::error::Result;
use crate::events::{KeyEvent, KeyState, Modifiers, MouseEvent, Point, WindowId};
use crate::platform::{HotkeyId, Platform, INJECTED_DEVICE_NAME};
use crate::services::drag_handler::{DragEnd, DragHandler, DragMode, DragSettings};
use crate::services::edge_snap::EdgeSnapper;
use crate::services::gesture_engine::{GestureEngine, GestureFired, GestureSettings};
use crate::services::hotkey_registrar::HotkeyRegistrar;
use crate::services::modifier_session::{ModifierSession, SessionEvent, Trigger};
use crate::services::snap_cycle::SnapCycleTracker;
use crate::services::window_manipulator::{OpacitySettings, WindowManipulator};
use crate::{debug_if_enabled, trace_if_enabled};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

/// Числовые параметры и флаги движка из конфигурации
#[derive(Debug, Clone, PartialEq)]
pub struct EngineSettings {
    pub edge_snap: bool,
    pub edge_snap_threshold: i32,
    pub poll_interval: Duration,
    pub gestures: GestureSettings,
    pub drag: DragSettings,
    pub snap_fractions: Vec<f64>,
    pub opacity: OpacitySettings,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl EngineSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            edge_snap: config.general.edge_snap,
            edge_snap_threshold: config.drag.edge_snap_threshold,
            poll_interval: Duration::from_millis(config.general.poll_interval_ms),
            gestures: GestureSettings {
                enabled: config.general.gestures_enabled,
                cooldown_ms: config.gesture.cooldown_ms,
                scroll_quantum: config.gesture.scroll_quantum,
            },
            drag: DragSettings {
                min_width: config.drag.min_width,
                min_height: config.drag.min_height,
            },
            snap_fractions: config.snap.fractions.clone(),
            opacity: OpacitySettings {
                step: config.opacity.step,
                minimum: config.opacity.minimum,
            },
        }
    }
}

/// Целиковый снимок для замены "пересобрать и подменить"
#[derive(Debug, Clone)]
pub struct EngineSnapshot {
    pub tables: Arc<BindingTables>,
    pub settings: EngineSettings,
}

impl EngineSnapshot {
    pub fn from_config(config: &Config) -> Self {
        Self {
            tables: Arc::new(BindingTables::build(&config.hotkeys, &config.gestures)),
            settings: EngineSettings::from_config(config),
        }
    }
}

/// Однократная задача, выполняемая после возврата из текущего обработчика
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeferredTask {
    EdgeSnap { cursor: Point },
}

#[derive(Debug)]
pub enum EngineMessage {
    Key(KeyEvent),
    Mouse(MouseEvent),
    HotkeyFired(HotkeyId),
    Rebuild(EngineSnapshot),
    SetGesturesEnabled(bool),
    Deferred(DeferredTask),
    Shutdown,
}

/// Откуда пришло действие
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerSource {
    Hotkey,
    KeySwitch,
    ModifierOnly,
    Gesture(GestureKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineEvent {
    ActionDispatched { action: Action, source: TriggerSource },
    DragModeChanged(DragMode),
    ModifierFlagsChanged(Modifiers),
}

pub type EngineSender = mpsc::UnboundedSender<EngineMessage>;
pub type EngineReceiver = mpsc::UnboundedReceiver<EngineMessage>;

pub fn engine_channel() -> (EngineSender, EngineReceiver) {
    mpsc::unbounded_channel()
}

pub struct Orchestrator {
    platform: Platform,
    tables: Arc<BindingTables>,
    settings: EngineSettings,
    session: ModifierSession,
    registrar: HotkeyRegistrar,
    gestures: GestureEngine,
    drag: DragHandler,
    snap_cycle: SnapCycleTracker,
    manipulator: WindowManipulator,
    edge_snapper: EdgeSnapper,
    loopback: EngineSender,
    events: broadcast::Sender<EngineEvent>,
}

impl Orchestrator {
    pub fn new(platform: Platform, snapshot: EngineSnapshot, loopback: EngineSender) -> Self {
        let EngineSnapshot { tables, settings } = snapshot;

        let manipulator = WindowManipulator::new(platform.windows.clone(), platform.monitors.clone(), settings.opacity);
        let drag = DragHandler::new(platform.cursor.clone(), manipulator.clone(), settings.drag);
        let gestures = GestureEngine::new(platform.cursor.clone(), platform.monitors.clone(), settings.gestures);
        let edge_snapper = EdgeSnapper::new(
            platform.injector.clone(),
            platform.monitors.clone(),
            settings.edge_snap_threshold,
        );
        let mut registrar = HotkeyRegistrar::new(platform.hotkeys.clone());
        registrar.register_all(&tables);

        let (events, _) = broadcast::channel(256);

        Self {
            snap_cycle: SnapCycleTracker::new(settings.snap_fractions.clone()),
            platform,
            tables,
            settings,
            session: ModifierSession::new(),
            registrar,
            gestures,
            drag,
            manipulator,
            edge_snapper,
            loopback,
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.events.subscribe()
    }

    pub async fn run(mut self, mut rx: EngineReceiver) -> Result<()> {
        let period = self.settings.poll_interval;
        let mut drag_timer = tokio::time::interval(period);
        let mut gesture_timer = tokio::time::interval(period);
        drag_timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
        gesture_timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            "Оркестратор запущен: {} глобальных сочетаний, опрос каждые {:?}",
            self.registrar.len(),
            period
        );

        loop {
            tokio::select! {
                message = rx.recv() => match message {
                    Some(message) => {
                        if !self.handle(message) {
                            break;
                        }
                    }
                    None => break,
                },
                _ = drag_timer.tick() => self.drag_tick(),
                _ = gesture_timer.tick() => self.gesture_tick(),
            }
        }

        if let Some(end) = self.drag.end() {
            debug!("Перетаскивание окна {} прервано при остановке", end.window);
        }
        self.registrar.unregister_all();
        info!("Оркестратор остановлен");
        Ok(())
    }

    /// Обработка одного сообщения. false - пора останавливаться.
    pub fn handle(&mut self, message: EngineMessage) -> bool {
        match message {
            EngineMessage::Key(event) => self.on_key(event),
            EngineMessage::Mouse(event) => self.on_mouse(event),
            EngineMessage::HotkeyFired(id) => self.on_hotkey(id),
            EngineMessage::Rebuild(snapshot) => self.rebuild(snapshot),
            EngineMessage::SetGesturesEnabled(enabled) => {
                info!("Жесты {}", if enabled { "включены" } else { "выключены" });
                self.gestures.set_enabled(enabled, self.session.modifiers(), &self.tables);
            }
            EngineMessage::Deferred(task) => self.run_deferred(task),
            EngineMessage::Shutdown => {
                info!("Получена команда остановки");
                return false;
            }
        }
        true
    }

    fn publish(&self, event: EngineEvent) {
        // Ошибка означает только отсутствие подписчиков
        let _ = self.events.send(event);
    }

    fn on_key(&mut self, event: KeyEvent) {
        if event.device_name == INJECTED_DEVICE_NAME {
            trace_if_enabled!("Пропущено собственное синтетическое событие {}", event);
            return;
        }
        let down = match event.state {
            KeyState::Pressed => true,
            KeyState::Released => false,
            KeyState::Repeat => return,
        };
        let key = event.key_code;

        if !down {
            if let Some(end) = self.drag.on_key_released(key) {
                self.finish_drag(end);
            }
        }

        // Одноразовый флаг снимается на каждом нажатии основной клавиши
        let already_fired = down && !key.is_modifier() && self.session.consume_if_fired(key);

        for session_event in self.session.on_key(key, down, &self.tables) {
            match session_event {
                SessionEvent::ModifierFlagsChanged(modifiers) => self.modifiers_changed(modifiers),
                SessionEvent::ActionTriggered(trigger) => {
                    if already_fired {
                        debug_if_enabled!("Повтор {} подавлен: уже обработано сочетанием", trigger.action);
                        continue;
                    }
                    let source = if trigger.key.is_some() {
                        TriggerSource::KeySwitch
                    } else {
                        TriggerSource::ModifierOnly
                    };
                    self.dispatch(trigger, source);
                }
            }
        }
    }

    fn on_hotkey(&mut self, id: HotkeyId) {
        let Some(hotkey) = self.registrar.resolve(id) else {
            debug!("Сочетание {} не зарегистрировано, пропуск", id);
            return;
        };

        let outcome = self.session.on_hotkey_fired(hotkey.modifiers, hotkey.key);
        if let Some(modifiers) = outcome.flags_changed {
            self.modifiers_changed(modifiers);
        }
        if !outcome.dispatch {
            debug_if_enabled!("Сочетание {} уже обработано переключением клавиши", id);
            return;
        }

        self.dispatch(
            Trigger {
                action: hotkey.action,
                modifiers: hotkey.modifiers,
                key: Some(hotkey.key),
            },
            TriggerSource::Hotkey,
        );
    }

    fn on_mouse(&mut self, event: MouseEvent) {
        let dragging = self.drag.is_active();
        match event {
            MouseEvent::Button { button, pressed } => {
                if let Some(fired) = self.gestures.on_button(button, pressed, dragging, &self.tables) {
                    self.dispatch_gesture(fired);
                }
            }
            MouseEvent::Scroll { delta } => {
                for fired in self.gestures.on_scroll(delta, dragging, &self.tables) {
                    self.dispatch_gesture(fired);
                }
            }
        }
    }

    fn modifiers_changed(&mut self, modifiers: Modifiers) {
        debug_if_enabled!("Модификаторы: {}", modifiers);
        self.publish(EngineEvent::ModifierFlagsChanged(modifiers));
        self.gestures.update_modifiers(modifiers, &self.tables);
    }

    fn rebuild(&mut self, snapshot: EngineSnapshot) {
        let EngineSnapshot { tables, settings } = snapshot;
        if settings.poll_interval != self.settings.poll_interval {
            warn!("Изменение poll_interval_ms применяется только после перезапуска");
        }

        self.tables = tables;
        self.registrar.reload(&self.tables);
        self.manipulator.set_opacity_settings(settings.opacity);
        self.drag.set_settings(settings.drag);
        self.edge_snapper.set_threshold(settings.edge_snap_threshold);
        self.snap_cycle.set_fractions(settings.snap_fractions.clone());
        self.gestures
            .set_settings(settings.gestures, self.session.modifiers(), &self.tables);
        self.settings = settings;

        info!("Таблицы привязок заменены");
    }

    fn run_deferred(&mut self, task: DeferredTask) {
        match task {
            DeferredTask::EdgeSnap { cursor } => {
                match self.edge_snapper.snap(cursor, self.session.modifiers()) {
                    Ok(Some(edge)) => info!("Окно привязано к краю {:?}", edge),
                    Ok(None) => {}
                    Err(e) => warn!("Привязка к краю не удалась: {}", e),
                }
            }
        }
    }

    fn dispatch_gesture(&mut self, fired: GestureFired) {
        self.dispatch(
            Trigger {
                action: fired.action,
                modifiers: fired.modifiers,
                key: None,
            },
            TriggerSource::Gesture(fired.kind),
        );
    }

    fn target_window(&self, action: Action) -> Option<WindowId> {
        if action.is_drag() {
            if let Some(window) = self.drag.window() {
                return Some(window);
            }
        }
        match self.platform.windows.window_under_cursor() {
            Ok(window) => window,
            Err(e) => {
                warn!("Не удалось определить окно под курсором: {}", e);
                None
            }
        }
    }

    /// Единственная точка исполнения действий
    fn dispatch(&mut self, trigger: Trigger, source: TriggerSource) {
        let action = trigger.action;
        info!("Действие {} ({:?})", action, source);
        self.publish(EngineEvent::ActionDispatched { action, source });

        let Some(window) = self.target_window(action) else {
            debug!("Нет окна под курсором для {}", action);
            return;
        };

        if action.snap_direction().is_none() {
            self.snap_cycle.reset_for(window);
        }

        let result = match action {
            Action::StartMove | Action::StartResize => {
                let mode = if action == Action::StartMove {
                    DragMode::Move
                } else {
                    DragMode::Resize
                };
                self.start_drag(mode, window, trigger)
            }
            Action::SnapLeft | Action::SnapRight => match action.snap_direction() {
                Some(direction) => self
                    .snap_cycle
                    .snap(&self.manipulator, window, direction)
                    .map(|_| ()),
                None => Ok(()),
            },
            _ => self.manipulator.apply(action, window),
        };

        if let Err(e) = result {
            error!("Действие {} для окна {} не выполнено: {}", action, window, e);
        }
    }

    fn start_drag(&mut self, mode: DragMode, window: WindowId, trigger: Trigger) -> Result<()> {
        let previous = self.drag.mode();
        let modifiers = trigger.modifiers | self.session.modifiers();
        self.drag.start(mode, window, modifiers, trigger.key)?;
        if self.drag.mode() != previous {
            self.publish(EngineEvent::DragModeChanged(mode));
        }
        Ok(())
    }

    fn finish_drag(&mut self, end: DragEnd) {
        self.publish(EngineEvent::DragModeChanged(DragMode::Idle));

        if end.mode == DragMode::Move && self.settings.edge_snap {
            // Инъекция ввода из обработчика хука запрещена: только следующей итерацией
            let task = DeferredTask::EdgeSnap { cursor: end.last_cursor };
            if self.loopback.send(EngineMessage::Deferred(task)).is_err() {
                warn!("Очередь оркестратора закрыта, привязка к краю пропущена");
            }
        }
    }

    pub fn drag_tick(&mut self) {
        if !self.drag.is_active() {
            return;
        }
        if let Err(e) = self.drag.tick() {
            warn!("Перетаскивание прервано: {}", e);
            if let Some(end) = self.drag.end() {
                debug!("Окно {} больше недоступно", end.window);
                self.publish(EngineEvent::DragModeChanged(DragMode::Idle));
            }
        }
    }

    pub fn gesture_tick(&mut self) {
        if !self.gestures.is_armed() {
            return;
        }
        if let Some(fired) = self.gestures.tick(self.drag.is_active(), &self.tables) {
            self.dispatch_gesture(fired);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{KeyCode, Monitor, Rect, SyntheticKey};
    use crate::platform::{FakeDesktop, HotkeyBackend};

    const WINDOW: WindowId = WindowId(0x100);
    const Z: KeyCode = KeyCode(44);
    const X: KeyCode = KeyCode(45);
    const M: KeyCode = KeyCode(50);

    struct Harness {
        desktop: Arc<FakeDesktop>,
        orchestrator: Orchestrator,
        rx: EngineReceiver,
        events: broadcast::Receiver<EngineEvent>,
    }

    impl Harness {
        fn new() -> Self {
            Self::with_config(Config::default())
        }

        fn with_config(config: Config) -> Self {
            let desktop = Arc::new(FakeDesktop::new(vec![Monitor::new(
                Rect::new(0, 0, 1920, 1080),
                Rect::new(0, 0, 1920, 1040),
            )]));
            desktop.add_window(WINDOW, Rect::new(400, 300, 800, 600));
            desktop.set_cursor(Point::new(600, 500));

            let (tx, rx) = engine_channel();
            let orchestrator = Orchestrator::new(Platform::fake(desktop.clone()), EngineSnapshot::from_config(&config), tx);
            let events = orchestrator.subscribe();
            Self {
                desktop,
                orchestrator,
                rx,
                events,
            }
        }

        fn key(&mut self, key: KeyCode, down: bool) {
            let state = if down { KeyState::Pressed } else { KeyState::Released };
            self.orchestrator
                .handle(EngineMessage::Key(KeyEvent::new(key, state, "test-keyboard".to_string())));
        }

        fn hotkey(&mut self, key: KeyCode) {
            let id = self
                .orchestrator
                .registrar
                .registered_id(Modifiers::SUPER | Modifiers::SHIFT, key)
                .expect("сочетание зарегистрировано");
            self.orchestrator.handle(EngineMessage::HotkeyFired(id));
        }

        /// Нажатие основной клавиши так, как его доставляет слушатель: хук, затем сочетание
        fn press_combo_key(&mut self, key: KeyCode) {
            self.key(key, true);
            self.hotkey(key);
        }

        fn hold_super_shift(&mut self) {
            self.key(KeyCode::LEFT_META, true);
            self.key(KeyCode::LEFT_SHIFT, true);
        }

        /// Выполнить отложенные задачи из собственной очереди
        fn drain_deferred(&mut self) {
            while let Ok(message) = self.rx.try_recv() {
                self.orchestrator.handle(message);
            }
        }

        fn events(&mut self) -> Vec<EngineEvent> {
            let mut events = Vec::new();
            while let Ok(event) = self.events.try_recv() {
                events.push(event);
            }
            events
        }

        fn drag_modes(&mut self) -> Vec<DragMode> {
            self.events()
                .into_iter()
                .filter_map(|e| match e {
                    EngineEvent::DragModeChanged(mode) => Some(mode),
                    _ => None,
                })
                .collect()
        }

        fn rect(&self) -> Rect {
            self.desktop.window(WINDOW).unwrap().rect
        }
    }

    #[test]
    fn test_move_then_switch_to_resize_without_idle() {
        let mut h = Harness::new();
        h.hold_super_shift();

        h.press_combo_key(Z);
        assert_eq!(h.orchestrator.drag.mode(), DragMode::Move);

        h.desktop.set_cursor(Point::new(650, 520));
        h.orchestrator.drag_tick();
        assert_eq!(h.rect(), Rect::new(450, 320, 800, 600));

        // X при удерживаемых модификаторах: переключение в изменение размера
        h.press_combo_key(X);
        assert_eq!(h.orchestrator.drag.mode(), DragMode::Resize);

        h.key(Z, false);
        assert_eq!(h.orchestrator.drag.mode(), DragMode::Resize);

        h.desktop.set_cursor(Point::new(700, 520));
        h.orchestrator.drag_tick();
        assert_eq!(h.rect(), Rect::new(450, 320, 850, 600));

        h.key(X, false);
        assert_eq!(h.drag_modes(), vec![DragMode::Move, DragMode::Resize, DragMode::Idle]);
    }

    #[test]
    fn test_each_physical_press_dispatches_once() {
        let mut h = Harness::new();
        h.hold_super_shift();
        h.events();

        // Порядок "хук, затем сочетание"
        h.press_combo_key(Z);
        // Порядок "сочетание, затем хук"
        h.hotkey(X);
        h.key(X, true);

        let dispatched: Vec<Action> = h
            .events()
            .into_iter()
            .filter_map(|e| match e {
                EngineEvent::ActionDispatched { action, .. } => Some(action),
                _ => None,
            })
            .collect();
        assert_eq!(dispatched, vec![Action::StartMove, Action::StartResize]);
    }

    #[test]
    fn test_modifier_release_ends_move_and_defers_edge_snap() {
        let mut h = Harness::new();
        h.hold_super_shift();
        h.press_combo_key(Z);

        h.desktop.set_cursor(Point::new(3, 500));
        h.orchestrator.drag_tick();
        h.desktop.set_cursor(Point::new(900, 500));

        h.key(KeyCode::LEFT_SHIFT, false);
        assert!(!h.orchestrator.drag.is_active());
        // Инъекция не выполняется внутри обработчика клавиши
        assert!(h.desktop.injected().is_empty());

        h.drain_deferred();
        let injected = h.desktop.injected();
        assert!(injected.contains(&SyntheticKey::press(KeyCode::LEFT)));
        assert!(injected.contains(&SyntheticKey::release(KeyCode::LEFT)));
    }

    #[test]
    fn test_resize_end_does_not_snap() {
        let mut h = Harness::new();
        h.hold_super_shift();
        h.press_combo_key(X);
        h.desktop.set_cursor(Point::new(3, 3));
        h.orchestrator.drag_tick();
        h.key(X, false);
        h.drain_deferred();
        assert!(h.desktop.injected().is_empty());
    }

    #[test]
    fn test_injection_failure_is_ignored() {
        let mut h = Harness::new();
        h.desktop.fail_injection(true);
        h.hold_super_shift();
        h.press_combo_key(Z);
        h.desktop.set_cursor(Point::new(600, 2));
        h.orchestrator.drag_tick();
        h.key(Z, false);
        h.drain_deferred();

        // Движок продолжает работать
        h.press_combo_key(M);
        assert!(h.desktop.window(WINDOW).unwrap().minimized);
    }

    #[test]
    fn test_synthetic_events_are_ignored() {
        let mut h = Harness::new();
        h.events();
        h.orchestrator.handle(EngineMessage::Key(KeyEvent::new(
            KeyCode::LEFT_META,
            KeyState::Pressed,
            INJECTED_DEVICE_NAME.to_string(),
        )));
        assert!(h.events().is_empty());
        assert_eq!(h.orchestrator.session.modifiers(), Modifiers::NONE);
    }

    #[test]
    fn test_snap_cycle_resets_on_other_action() {
        let mut h = Harness::new();
        h.hold_super_shift();
        h.press_combo_key(KeyCode::LEFT);
        assert_eq!(h.rect().width, 1280);
        h.key(KeyCode::LEFT, false);
        h.press_combo_key(KeyCode::LEFT);
        assert_eq!(h.rect().width, 960);
        h.key(KeyCode::LEFT, false);

        h.desktop.set_cursor(Point::new(100, 500));
        h.orchestrator.handle(EngineMessage::Key(KeyEvent::new(
            KeyCode(104),
            KeyState::Pressed,
            "test-keyboard".to_string(),
        )));
        h.hotkey(KeyCode(104));
        h.key(KeyCode(104), false);

        h.press_combo_key(KeyCode::LEFT);
        assert_eq!(h.rect().width, 1280);
    }

    #[test]
    fn test_gesture_scroll_dispatches_opacity() {
        let mut h = Harness::new();
        h.hold_super_shift();
        assert!(h.orchestrator.gestures.is_armed());

        h.orchestrator.handle(EngineMessage::Mouse(MouseEvent::Scroll { delta: -120 }));
        assert!((h.desktop.window(WINDOW).unwrap().opacity - 0.9).abs() < 1e-9);

        h.orchestrator.handle(EngineMessage::SetGesturesEnabled(false));
        h.orchestrator.handle(EngineMessage::Mouse(MouseEvent::Scroll { delta: -120 }));
        assert!((h.desktop.window(WINDOW).unwrap().opacity - 0.9).abs() < 1e-9);
    }

    #[test]
    fn test_rebuild_replaces_registrations() {
        let mut h = Harness::new();
        assert_eq!(h.desktop.registered_hotkeys(), 10);

        let mut config = Config::default();
        config.hotkeys.truncate(2);
        h.orchestrator
            .handle(EngineMessage::Rebuild(EngineSnapshot::from_config(&config)));
        assert_eq!(h.desktop.registered_hotkeys(), 2);

        // Старый идентификатор больше не разрешается
        h.hold_super_shift();
        h.orchestrator.handle(EngineMessage::HotkeyFired(HotkeyId(1)));
        assert!(!h.orchestrator.drag.is_active());
    }

    #[test]
    fn test_conflicting_hotkey_is_inert() {
        let desktop = Arc::new(FakeDesktop::new(vec![Monitor::full(Rect::new(0, 0, 1920, 1080))]));
        desktop.occupy(Modifiers::SUPER | Modifiers::SHIFT, M);
        let (tx, _rx) = engine_channel();
        let orchestrator = Orchestrator::new(
            Platform::fake(desktop.clone()),
            EngineSnapshot::from_config(&Config::default()),
            tx,
        );
        assert_eq!(orchestrator.registrar.len(), 9);
        assert!(desktop.unregister(HotkeyId(999)).is_ok());
    }

    #[tokio::test]
    async fn test_run_loop_processes_queue_until_shutdown() {
        let desktop = Arc::new(FakeDesktop::new(vec![Monitor::full(Rect::new(0, 0, 1920, 1080))]));
        desktop.add_window(WINDOW, Rect::new(100, 100, 400, 300));
        desktop.set_cursor(Point::new(200, 200));

        let (tx, rx) = engine_channel();
        let orchestrator = Orchestrator::new(
            Platform::fake(desktop.clone()),
            EngineSnapshot::from_config(&Config::default()),
            tx.clone(),
        );
        let mut events = orchestrator.subscribe();
        let handle = tokio::spawn(orchestrator.run(rx));

        let press = |key: KeyCode, state: KeyState| EngineMessage::Key(KeyEvent::new(key, state, "kbd".to_string()));
        tx.send(press(KeyCode::LEFT_META, KeyState::Pressed)).unwrap();
        tx.send(press(KeyCode::LEFT_SHIFT, KeyState::Pressed)).unwrap();
        tx.send(press(Z, KeyState::Pressed)).unwrap();

        let mut seen_flags = false;
        while let Ok(Ok(event)) = tokio::time::timeout(Duration::from_millis(200), events.recv()).await {
            if event == EngineEvent::ModifierFlagsChanged(Modifiers::SUPER | Modifiers::SHIFT) {
                seen_flags = true;
                break;
            }
        }
        assert!(seen_flags);

        tx.send(EngineMessage::Shutdown).unwrap();
        let result = tokio::time::timeout(Duration::from_secs(2), handle).await;
        assert!(matches!(result, Ok(Ok(Ok(())))));
        assert_eq!(desktop.registered_hotkeys(), 0);
    }
}
