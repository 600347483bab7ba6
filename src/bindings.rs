//! Неизменяемый снимок таблиц привязок.
//!
//! Таблицы строятся целиком из конфигурации и заменяются атомарно
//! (`Arc<BindingTables>`), читатели никогда не видят частично обновлённое состояние.
//! Неразборчивые записи пропускаются по одной и никогда не ломают всю таблицу.

use crate::actions::{Action, GestureFamily, GestureKind};
use crate::config::{GestureEntry, HotkeyEntry};
use crate::events::{KeyCode, Modifiers};
use crate::mappings::KeyNames;
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

/// Параметры распознавателя из конфигурации (`min_velocity`, `window_ms`, ...)
pub type GestureParams = HashMap<String, f64>;

#[derive(Debug, Clone, PartialEq)]
pub struct HotkeyBinding {
    pub name: String,
    pub modifiers: Modifiers,
    pub key: KeyCode,
    pub action: Action,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GestureBinding {
    pub name: String,
    pub kind: GestureKind,
    pub modifiers: Modifiers,
    pub action: Action,
    pub params: GestureParams,
}

#[derive(Debug, Default)]
pub struct BindingTables {
    hotkeys: HashMap<(Modifiers, KeyCode), HotkeyBinding>,
    modifier_only: HashMap<Modifiers, Action>,
    gestures: HashMap<(Modifiers, GestureKind), GestureBinding>,
    // Порядок записей в конфигурации, нужен для выбора параметров семейства
    gesture_order: Vec<(Modifiers, GestureKind)>,
    gesture_modifiers: HashSet<Modifiers>,
    skipped: usize,
}

fn parse_modifiers(names: &[String]) -> Option<Modifiers> {
    let mut modifiers = Modifiers::NONE;
    for name in names {
        modifiers |= Modifiers::parse_name(name)?;
    }
    Some(modifiers)
}

impl BindingTables {
    pub fn build(hotkeys: &[HotkeyEntry], gestures: &[GestureEntry]) -> Self {
        let mut tables = Self::default();

        for entry in hotkeys {
            if let Err(reason) = tables.add_hotkey(entry) {
                warn!("Привязка '{}' пропущена: {}", entry.name, reason);
                tables.skipped += 1;
            }
        }

        for entry in gestures {
            if let Err(reason) = tables.add_gesture(entry) {
                warn!("Жест '{}' пропущен: {}", entry.name, reason);
                tables.skipped += 1;
            }
        }

        debug!(
            "Таблицы привязок построены: {} сочетаний, {} только модификаторы, {} жестов, {} пропущено",
            tables.hotkeys.len(),
            tables.modifier_only.len(),
            tables.gestures.len(),
            tables.skipped
        );

        tables
    }

    fn add_hotkey(&mut self, entry: &HotkeyEntry) -> Result<(), String> {
        let modifiers = parse_modifiers(&entry.modifiers)
            .ok_or_else(|| format!("неизвестный модификатор в {:?}", entry.modifiers))?;
        let action =
            Action::parse(&entry.action).ok_or_else(|| format!("неизвестное действие '{}'", entry.action))?;

        if modifiers.is_empty() {
            return Err("сочетание без модификаторов".to_string());
        }

        match entry.key.as_deref().map(str::trim).filter(|k| !k.is_empty()) {
            None => {
                if self.modifier_only.contains_key(&modifiers) {
                    return Err(format!("сочетание {} уже занято", modifiers));
                }
                self.modifier_only.insert(modifiers, action);
            }
            Some(key_name) => {
                let key = KeyNames::keycode(key_name)
                    .ok_or_else(|| format!("неизвестная клавиша '{}'", key_name))?;
                if key.is_modifier() {
                    return Err(format!("'{}' - модификатор, а не основная клавиша", key_name));
                }
                if self.hotkeys.contains_key(&(modifiers, key)) {
                    return Err(format!("сочетание {}+{} уже занято", modifiers, key_name));
                }
                self.hotkeys.insert(
                    (modifiers, key),
                    HotkeyBinding {
                        name: entry.name.clone(),
                        modifiers,
                        key,
                        action,
                    },
                );
            }
        }
        Ok(())
    }

    fn add_gesture(&mut self, entry: &GestureEntry) -> Result<(), String> {
        let kind = GestureKind::parse(&entry.gesture)
            .ok_or_else(|| format!("неизвестный жест '{}'", entry.gesture))?;
        let modifiers = parse_modifiers(&entry.modifiers)
            .ok_or_else(|| format!("неизвестный модификатор в {:?}", entry.modifiers))?;
        let action =
            Action::parse(&entry.action).ok_or_else(|| format!("неизвестное действие '{}'", entry.action))?;

        if modifiers.is_empty() {
            return Err("жест без модификаторов".to_string());
        }
        if self.gestures.contains_key(&(modifiers, kind)) {
            return Err(format!("жест {:?} для {} уже привязан", kind, modifiers));
        }

        self.gestures.insert(
            (modifiers, kind),
            GestureBinding {
                name: entry.name.clone(),
                kind,
                modifiers,
                action,
                params: entry.params.clone(),
            },
        );
        self.gesture_order.push((modifiers, kind));
        self.gesture_modifiers.insert(modifiers);
        Ok(())
    }

    pub fn hotkey(&self, modifiers: Modifiers, key: KeyCode) -> Option<Action> {
        self.hotkeys.get(&(modifiers, key)).map(|b| b.action)
    }

    pub fn modifier_only(&self, modifiers: Modifiers) -> Option<Action> {
        self.modifier_only.get(&modifiers).copied()
    }

    pub fn gesture(&self, modifiers: Modifiers, kind: GestureKind) -> Option<Action> {
        self.gestures.get(&(modifiers, kind)).map(|b| b.action)
    }

    /// Есть ли хотя бы один жест для этого набора модификаторов
    pub fn has_gestures_for(&self, modifiers: Modifiers) -> bool {
        self.gesture_modifiers.contains(&modifiers)
    }

    /// Параметры первой (в порядке конфигурации) привязки семейства для модификаторов
    pub fn params_for(&self, modifiers: Modifiers, family: GestureFamily) -> Option<&GestureParams> {
        self.gesture_order
            .iter()
            .filter(|(mods, kind)| *mods == modifiers && kind.family() == family)
            .find_map(|key| self.gestures.get(key))
            .map(|binding| &binding.params)
    }

    pub fn hotkeys(&self) -> impl Iterator<Item = &HotkeyBinding> {
        self.hotkeys.values()
    }

    #[allow(dead_code)]
    pub fn skipped(&self) -> usize {
        self.skipped
    }
}
