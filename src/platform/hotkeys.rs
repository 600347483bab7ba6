use super::HotkeyBackend;
use crate::error::Result;
use crate::events::{KeyCode, Modifiers};
use dashmap::DashMap;
use std::fmt;

/// Внутренний числовой идентификатор зарегистрированного сочетания
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HotkeyId(pub u32);

impl fmt::Display for HotkeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Глобальные сочетания поверх evdev: слушатель клавиатуры сверяет каждое
/// физическое нажатие с таблицей и отправляет `HotkeyFired` в очередь оркестратора.
/// Таблица разделяется между оркестратором (регистрация) и слушателем (сопоставление).
#[derive(Debug, Default)]
pub struct EvdevHotkeyBackend {
    combos: DashMap<HotkeyId, (Modifiers, KeyCode)>,
}

impl EvdevHotkeyBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn match_combo(&self, modifiers: Modifiers, key: KeyCode) -> Option<HotkeyId> {
        self.combos
            .iter()
            .find(|entry| *entry.value() == (modifiers, key))
            .map(|entry| *entry.key())
    }

    #[allow(dead_code)]
    pub fn len(&self) -> usize {
        self.combos.len()
    }
}

impl HotkeyBackend for EvdevHotkeyBackend {
    fn register(&self, id: HotkeyId, modifiers: Modifiers, key: KeyCode) -> Result<()> {
        if let Some(owner) = self.match_combo(modifiers, key) {
            if owner != id {
                return Err(crate::grip_error!(
                    conflict,
                    "{}+{} уже зарегистрировано как {}",
                    modifiers,
                    key,
                    owner
                ));
            }
        }
        self.combos.insert(id, (modifiers, key));
        Ok(())
    }

    fn unregister(&self, id: HotkeyId) -> Result<()> {
        self.combos.remove(&id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_match() {
        let backend = EvdevHotkeyBackend::new();
        let mods = Modifiers::SUPER | Modifiers::SHIFT;
        backend.register(HotkeyId(1), mods, KeyCode(44)).unwrap();

        assert_eq!(backend.match_combo(mods, KeyCode(44)), Some(HotkeyId(1)));
        assert_eq!(backend.match_combo(Modifiers::SUPER, KeyCode(44)), None);

        backend.unregister(HotkeyId(1)).unwrap();
        assert_eq!(backend.match_combo(mods, KeyCode(44)), None);
    }

    #[test]
    fn test_conflicting_registration_fails() {
        let backend = EvdevHotkeyBackend::new();
        backend.register(HotkeyId(1), Modifiers::CTRL, KeyCode(30)).unwrap();
        assert!(backend.register(HotkeyId(2), Modifiers::CTRL, KeyCode(30)).is_err());
        assert_eq!(backend.len(), 1);
    }
}
