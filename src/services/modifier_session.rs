//! Сессия модификаторов.
//!
//! Сессия начинается с первого нажатого модификатора и заканчивается, когда отпущены все.
//! Внутри сессии отслеживается основная клавиша, что позволяет "переключать" клавиши:
//! удерживая модификаторы, нажать A, затем B - сработают оба действия по очереди.
//! Первое нажатие в сессии обрабатывает регистратор глобальных сочетаний; сессия
//! срабатывает только на переключениях.
//!
//! Глобальное сочетание доставляется асинхронно, а хук - синхронно, поэтому одно
//! физическое нажатие может прийти обоими путями в любом порядке. Дубликат
//! отсекается одноразовыми флагами: `on_hotkey_fired` / `consume_if_fired`.

use crate::actions::Action;
use crate::bindings::BindingTables;
use crate::debug_if_enabled;
use crate::events::{KeyCode, Modifiers};
use smallvec::{smallvec, SmallVec};

/// Разрешённое действие вместе с сочетанием, которое его вызвало
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Trigger {
    pub action: Action,
    pub modifiers: Modifiers,
    pub key: Option<KeyCode>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    ActionTriggered(Trigger),
    ModifierFlagsChanged(Modifiers),
}

pub type SessionEvents = SmallVec<[SessionEvent; 2]>;

/// Последняя основная клавиша, которая считается удерживаемой
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrimaryKeyState {
    pub key: KeyCode,
    pub released: bool,
}

/// Результат доставки глобального сочетания
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HotkeyOutcome {
    /// false - это нажатие уже отработано путём хука
    pub dispatch: bool,
    pub flags_changed: Option<Modifiers>,
}

#[derive(Debug, Default)]
pub struct ModifierSession {
    modifiers: Modifiers,
    primary: Option<PrimaryKeyState>,
    seeded: bool,
    // Сочетание "только модификаторы", которое уже сработало в этой сессии
    last_fired_combo: Option<Modifiers>,
    // Глобальное сочетание сработало раньше, чем хук увидел нажатие
    just_fired: Option<KeyCode>,
    // Хук сработал на переключении раньше, чем пришло глобальное сочетание
    switch_fired: Option<(Modifiers, KeyCode)>,
}

impl ModifierSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    pub fn primary(&self) -> Option<PrimaryKeyState> {
        self.primary
    }

    pub fn is_seeded(&self) -> bool {
        self.seeded
    }

    /// Обработка нажатия/отпускания любой клавиши из потока хука
    pub fn on_key(&mut self, key: KeyCode, down: bool, tables: &BindingTables) -> SessionEvents {
        match (key.modifier(), down) {
            (Some(flag), true) => self.on_modifier_down(flag, tables),
            (Some(flag), false) => self.on_modifier_up(flag),
            (None, true) => self.on_primary_down(key, tables),
            (None, false) => {
                self.on_primary_up(key);
                SessionEvents::new()
            }
        }
    }

    fn on_modifier_down(&mut self, flag: Modifiers, tables: &BindingTables) -> SessionEvents {
        if self.modifiers.contains(flag) {
            return SessionEvents::new();
        }
        self.modifiers.insert(flag);
        let mut events: SessionEvents = smallvec![SessionEvent::ModifierFlagsChanged(self.modifiers)];

        let primary_held = self.primary.is_some_and(|p| !p.released);
        if !primary_held && self.last_fired_combo != Some(self.modifiers) {
            if let Some(action) = tables.modifier_only(self.modifiers) {
                debug_if_enabled!("Сочетание модификаторов {} -> {}", self.modifiers, action);
                self.last_fired_combo = Some(self.modifiers);
                events.push(SessionEvent::ActionTriggered(Trigger {
                    action,
                    modifiers: self.modifiers,
                    key: None,
                }));
            }
        }
        events
    }

    fn on_modifier_up(&mut self, flag: Modifiers) -> SessionEvents {
        // Левый и правый варианты схлопнуты в один флаг, снимается оба
        if !self.modifiers.contains(flag) {
            return SessionEvents::new();
        }
        self.modifiers.remove(flag);
        self.last_fired_combo = None;

        if self.modifiers.is_empty() {
            self.end_session();
        }
        smallvec![SessionEvent::ModifierFlagsChanged(self.modifiers)]
    }

    fn on_primary_down(&mut self, key: KeyCode, tables: &BindingTables) -> SessionEvents {
        if self.modifiers.is_empty() {
            return SessionEvents::new();
        }
        self.switch_fired = None;

        let is_switch = match self.primary {
            Some(primary) => primary.key != key || primary.released,
            None => true,
        };
        if !is_switch {
            return SessionEvents::new();
        }

        // Неназначенные переключения тоже отслеживаются, чтобы следующая
        // назначенная клавиша распозналась как переключение
        self.primary = Some(PrimaryKeyState { key, released: false });

        if !self.seeded {
            return SessionEvents::new();
        }

        match tables.hotkey(self.modifiers, key) {
            Some(action) => {
                debug_if_enabled!("Переключение клавиши {}+{} -> {}", self.modifiers, key, action);
                self.switch_fired = Some((self.modifiers, key));
                smallvec![SessionEvent::ActionTriggered(Trigger {
                    action,
                    modifiers: self.modifiers,
                    key: Some(key),
                })]
            }
            None => SessionEvents::new(),
        }
    }

    fn on_primary_up(&mut self, key: KeyCode) {
        if let Some(primary) = self.primary.as_mut() {
            if primary.key == key {
                primary.released = true;
            }
        }
    }

    /// Глобальное сочетание доставлено. Засевает сессию из его содержимого,
    /// само действие не вызывает - решение о диспетчеризации за вызывающим.
    pub fn on_hotkey_fired(&mut self, modifiers: Modifiers, key: KeyCode) -> HotkeyOutcome {
        let before = self.modifiers;
        self.modifiers |= modifiers;
        let flags_changed = (self.modifiers != before).then_some(self.modifiers);

        if self.switch_fired == Some((modifiers, key)) {
            self.switch_fired = None;
            return HotkeyOutcome {
                dispatch: false,
                flags_changed,
            };
        }

        let hook_saw_press = self.primary == Some(PrimaryKeyState { key, released: false });
        self.primary = Some(PrimaryKeyState { key, released: false });
        self.seeded = true;
        if !hook_saw_press {
            self.just_fired = Some(key);
        }

        HotkeyOutcome {
            dispatch: true,
            flags_changed,
        }
    }

    /// Одноразовая проверка: это нажатие уже отработано глобальным сочетанием.
    /// Флаг снимается при любом вызове, чтобы не "висеть" до следующего нажатия.
    pub fn consume_if_fired(&mut self, key: KeyCode) -> bool {
        self.just_fired.take() == Some(key)
    }

    fn end_session(&mut self) {
        self.primary = None;
        self.seeded = false;
        self.last_fired_combo = None;
        self.just_fired = None;
        self.switch_fired = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HotkeyEntry;

    const Z: KeyCode = KeyCode(44);
    const X: KeyCode = KeyCode(45);
    const Q: KeyCode = KeyCode(16);

    fn entry(modifiers: &[&str], key: Option<&str>, action: &str) -> HotkeyEntry {
        HotkeyEntry {
            name: action.to_string(),
            modifiers: modifiers.iter().map(|m| m.to_string()).collect(),
            key: key.map(str::to_string),
            action: action.to_string(),
        }
    }

    fn tables() -> BindingTables {
        BindingTables::build(
            &[
                entry(&["super", "shift"], Some("z"), "start_move"),
                entry(&["super", "shift"], Some("x"), "start_resize"),
                entry(&["ctrl", "alt"], None, "maximize"),
            ],
            &[],
        )
    }

    fn actions(events: &SessionEvents) -> Vec<Action> {
        events
            .iter()
            .filter_map(|e| match e {
                SessionEvent::ActionTriggered(t) => Some(t.action),
                _ => None,
            })
            .collect()
    }

    fn hold_super_shift(session: &mut ModifierSession, tables: &BindingTables) {
        session.on_key(KeyCode::LEFT_META, true, tables);
        session.on_key(KeyCode::LEFT_SHIFT, true, tables);
    }

    #[test]
    fn test_flags_changed_on_every_transition() {
        let tables = tables();
        let mut session = ModifierSession::new();

        let events = session.on_key(KeyCode::LEFT_META, true, &tables);
        assert_eq!(events.as_slice(), &[SessionEvent::ModifierFlagsChanged(Modifiers::SUPER)]);

        let events = session.on_key(KeyCode::RIGHT_SHIFT, true, &tables);
        assert_eq!(
            events.as_slice(),
            &[SessionEvent::ModifierFlagsChanged(Modifiers::SUPER | Modifiers::SHIFT)]
        );

        let events = session.on_key(KeyCode::LEFT_SHIFT, false, &tables);
        assert_eq!(events.as_slice(), &[SessionEvent::ModifierFlagsChanged(Modifiers::SUPER)]);

        let events = session.on_key(KeyCode::RIGHT_META, false, &tables);
        assert_eq!(events.as_slice(), &[SessionEvent::ModifierFlagsChanged(Modifiers::NONE)]);
    }

    #[test]
    fn test_initial_press_is_left_to_registrar() {
        let tables = tables();
        let mut session = ModifierSession::new();
        hold_super_shift(&mut session, &tables);

        let events = session.on_key(Z, true, &tables);
        assert!(actions(&events).is_empty());
        assert_eq!(session.primary(), Some(PrimaryKeyState { key: Z, released: false }));
        assert!(!session.is_seeded());
    }

    #[test]
    fn test_key_switch_fires_after_seeding() {
        let tables = tables();
        let mut session = ModifierSession::new();
        hold_super_shift(&mut session, &tables);

        let outcome = session.on_hotkey_fired(Modifiers::SUPER | Modifiers::SHIFT, Z);
        assert!(outcome.dispatch);
        assert!(session.consume_if_fired(Z));

        let events = session.on_key(X, true, &tables);
        assert_eq!(actions(&events), vec![Action::StartResize]);
    }

    #[test]
    fn test_same_key_repress_after_release_is_a_switch() {
        let tables = tables();
        let mut session = ModifierSession::new();
        hold_super_shift(&mut session, &tables);
        session.on_key(Z, true, &tables);
        session.on_hotkey_fired(Modifiers::SUPER | Modifiers::SHIFT, Z);

        assert!(actions(&session.on_key(Z, true, &tables)).is_empty());
        session.on_key(Z, false, &tables);
        assert_eq!(session.primary(), Some(PrimaryKeyState { key: Z, released: true }));
        assert_eq!(session.modifiers(), Modifiers::SUPER | Modifiers::SHIFT);

        assert_eq!(actions(&session.on_key(Z, true, &tables)), vec![Action::StartMove]);
    }

    #[test]
    fn test_unconfigured_switch_is_tracked_but_silent() {
        let tables = tables();
        let mut session = ModifierSession::new();
        hold_super_shift(&mut session, &tables);
        session.on_hotkey_fired(Modifiers::SUPER | Modifiers::SHIFT, Z);

        assert!(actions(&session.on_key(Q, true, &tables)).is_empty());
        assert_eq!(session.primary().map(|p| p.key), Some(Q));

        assert_eq!(actions(&session.on_key(Z, true, &tables)), vec![Action::StartMove]);
    }

    #[test]
    fn test_hotkey_first_then_hook_echo() {
        let tables = tables();
        let mut session = ModifierSession::new();
        hold_super_shift(&mut session, &tables);

        let outcome = session.on_hotkey_fired(Modifiers::SUPER | Modifiers::SHIFT, Z);
        assert!(outcome.dispatch);

        let events = session.on_key(Z, true, &tables);
        assert!(actions(&events).is_empty());
        assert!(session.consume_if_fired(Z));
        assert!(!session.consume_if_fired(Z));
    }

    #[test]
    fn test_hook_first_then_hotkey() {
        let tables = tables();
        let mut session = ModifierSession::new();
        hold_super_shift(&mut session, &tables);

        assert!(actions(&session.on_key(Z, true, &tables)).is_empty());
        assert!(!session.consume_if_fired(Z));

        let outcome = session.on_hotkey_fired(Modifiers::SUPER | Modifiers::SHIFT, Z);
        assert!(outcome.dispatch);
        // Хук уже видел нажатие - флаг не взводится и не подавит следующее переключение
        assert!(!session.consume_if_fired(X));
        assert_eq!(actions(&session.on_key(X, true, &tables)), vec![Action::StartResize]);
    }

    #[test]
    fn test_switch_hook_first_suppresses_late_hotkey() {
        let tables = tables();
        let mut session = ModifierSession::new();
        hold_super_shift(&mut session, &tables);
        session.on_hotkey_fired(Modifiers::SUPER | Modifiers::SHIFT, Z);
        session.consume_if_fired(Z);

        assert_eq!(actions(&session.on_key(X, true, &tables)), vec![Action::StartResize]);
        assert!(!session.consume_if_fired(X));

        let outcome = session.on_hotkey_fired(Modifiers::SUPER | Modifiers::SHIFT, X);
        assert!(!outcome.dispatch);
    }

    #[test]
    fn test_switch_hotkey_first_suppresses_hook() {
        let tables = tables();
        let mut session = ModifierSession::new();
        hold_super_shift(&mut session, &tables);
        session.on_hotkey_fired(Modifiers::SUPER | Modifiers::SHIFT, Z);
        session.consume_if_fired(Z);

        let outcome = session.on_hotkey_fired(Modifiers::SUPER | Modifiers::SHIFT, X);
        assert!(outcome.dispatch);

        let events = session.on_key(X, true, &tables);
        assert!(actions(&events).is_empty());
        assert!(session.consume_if_fired(X));
    }

    #[test]
    fn test_modifier_only_fires_once_per_combo() {
        let tables = tables();
        let mut session = ModifierSession::new();

        session.on_key(KeyCode::LEFT_CTRL, true, &tables);
        let events = session.on_key(KeyCode::LEFT_ALT, true, &tables);
        assert_eq!(actions(&events), vec![Action::Maximize]);

        // Повторное нажатие правого Alt не меняет набор и не срабатывает
        assert!(session.on_key(KeyCode::RIGHT_ALT, true, &tables).is_empty());

        // После отпускания модификатора сочетание снова может сработать
        session.on_key(KeyCode::LEFT_ALT, false, &tables);
        let events = session.on_key(KeyCode::LEFT_ALT, true, &tables);
        assert_eq!(actions(&events), vec![Action::Maximize]);
    }

    #[test]
    fn test_modifier_only_suppressed_while_primary_held() {
        let tables = tables();
        let mut session = ModifierSession::new();
        session.on_key(KeyCode::LEFT_CTRL, true, &tables);
        session.on_key(Q, true, &tables);

        let events = session.on_key(KeyCode::LEFT_ALT, true, &tables);
        assert!(actions(&events).is_empty());
    }

    #[test]
    fn test_full_release_ends_session() {
        let tables = tables();
        let sequences: [&[(KeyCode, bool)]; 3] = [
            &[
                (KeyCode::LEFT_META, true),
                (KeyCode::LEFT_SHIFT, true),
                (Z, true),
                (KeyCode::LEFT_SHIFT, false),
                (KeyCode::LEFT_META, false),
            ],
            &[
                (KeyCode::LEFT_CTRL, true),
                (KeyCode::RIGHT_CTRL, true),
                (Q, true),
                (Q, false),
                (KeyCode::RIGHT_CTRL, false),
            ],
            &[
                (KeyCode::LEFT_ALT, true),
                (X, true),
                (KeyCode::LEFT_META, true),
                (KeyCode::LEFT_ALT, false),
                (KeyCode::RIGHT_META, false),
            ],
        ];

        for sequence in sequences {
            let mut session = ModifierSession::new();
            session.on_hotkey_fired(Modifiers::SUPER | Modifiers::SHIFT, Z);
            for &(key, down) in sequence {
                session.on_key(key, down, &tables);
            }
            assert_eq!(session.modifiers(), Modifiers::NONE);
            assert_eq!(session.primary(), None);
            assert!(!session.is_seeded());
            assert!(!session.consume_if_fired(Z));
        }
    }
}
