use crate::events::{KeyCode, Modifiers};
use smallvec::SmallVec;

/// Физически удерживаемые модификаторы с учётом левого и правого вариантов:
/// флаг снимается, только когда отпущены оба.
#[derive(Debug, Default)]
pub struct ModifierState {
    held: SmallVec<[KeyCode; 8]>,
}

impl ModifierState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn to_modifiers(&self) -> Modifiers {
        self.held
            .iter()
            .filter_map(|key| key.modifier())
            .fold(Modifiers::NONE, |acc, flag| acc | flag)
    }

    pub fn update_key(&mut self, key: KeyCode, pressed: bool) {
        if !key.is_modifier() {
            return;
        }
        if pressed {
            if !self.held.contains(&key) {
                self.held.push(key);
            }
        } else {
            self.held.retain(|held| *held != key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_left_and_right_variants() {
        let mut state = ModifierState::new();
        state.update_key(KeyCode::LEFT_SHIFT, true);
        state.update_key(KeyCode::RIGHT_SHIFT, true);
        state.update_key(KeyCode::LEFT_META, true);
        assert_eq!(state.to_modifiers(), Modifiers::SHIFT | Modifiers::SUPER);

        state.update_key(KeyCode::LEFT_SHIFT, false);
        assert_eq!(state.to_modifiers(), Modifiers::SHIFT | Modifiers::SUPER);

        state.update_key(KeyCode::RIGHT_SHIFT, false);
        assert_eq!(state.to_modifiers(), Modifiers::SUPER);
    }

    #[test]
    fn test_primary_keys_are_ignored() {
        let mut state = ModifierState::new();
        state.update_key(KeyCode(30), true);
        assert!(state.to_modifiers().is_empty());
    }
}
