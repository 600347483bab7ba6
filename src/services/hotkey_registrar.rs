use crate::actions::Action;
use crate::bindings::BindingTables;
use crate::error::GripError;
use crate::events::{KeyCode, Modifiers};
use crate::platform::{HotkeyBackend, HotkeyId};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisteredHotkey {
    pub modifiers: Modifiers,
    pub key: KeyCode,
    pub action: Action,
}

/// Регистрирует сочетания с клавишей в системной службе глобальных сочетаний.
/// Сочетания только из модификаторов сюда не попадают, их ведёт сессия модификаторов.
pub struct HotkeyRegistrar {
    backend: Arc<dyn HotkeyBackend>,
    registered: HashMap<HotkeyId, RegisteredHotkey>,
    next_id: u32,
}

impl HotkeyRegistrar {
    pub fn new(backend: Arc<dyn HotkeyBackend>) -> Self {
        Self {
            backend,
            registered: HashMap::new(),
            next_id: 1,
        }
    }

    /// Регистрирует все сочетания снимка. Занятые сочетания пропускаются:
    /// частичная регистрация допустима.
    pub fn register_all(&mut self, tables: &BindingTables) {
        let mut conflicts = 0;

        for binding in tables.hotkeys() {
            let id = HotkeyId(self.next_id);
            self.next_id += 1;

            match self.backend.register(id, binding.modifiers, binding.key) {
                Ok(()) => {
                    debug!("Сочетание {} зарегистрировано: {}+{}", id, binding.modifiers, binding.key);
                    self.registered.insert(
                        id,
                        RegisteredHotkey {
                            modifiers: binding.modifiers,
                            key: binding.key,
                            action: binding.action,
                        },
                    );
                }
                Err(GripError::HotkeyConflict(combo)) => {
                    warn!("Сочетание '{}' ({}) занято, привязка неактивна", binding.name, combo);
                    conflicts += 1;
                }
                Err(e) => {
                    warn!("Не удалось зарегистрировать '{}': {}", binding.name, e);
                    conflicts += 1;
                }
            }
        }

        info!(
            "Зарегистрировано глобальных сочетаний: {} (пропущено: {})",
            self.registered.len(),
            conflicts
        );
    }

    /// Идемпотентно: повторный вызов и вызов без регистраций безопасны
    pub fn unregister_all(&mut self) {
        for (id, _) in self.registered.drain() {
            if let Err(e) = self.backend.unregister(id) {
                warn!("Не удалось снять сочетание {}: {}", id, e);
            }
        }
    }

    /// Применение нового снимка таблиц
    pub fn reload(&mut self, tables: &BindingTables) {
        self.unregister_all();
        self.register_all(tables);
    }

    pub fn resolve(&self, id: HotkeyId) -> Option<RegisteredHotkey> {
        self.registered.get(&id).copied()
    }

    /// Идентификатор, под которым зарегистрировано сочетание
    pub fn registered_id(&self, modifiers: Modifiers, key: KeyCode) -> Option<HotkeyId> {
        self.registered
            .iter()
            .find(|(_, hotkey)| hotkey.modifiers == modifiers && hotkey.key == key)
            .map(|(id, _)| *id)
    }

    pub fn len(&self) -> usize {
        self.registered.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.registered.is_empty()
    }
}

impl Drop for HotkeyRegistrar {
    fn drop(&mut self) {
        self.unregister_all();
    }
}
