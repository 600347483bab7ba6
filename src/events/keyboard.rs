use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// Состояние клавиши
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyState {
    Pressed,
    Released,
    Repeat,
}

impl KeyState {
    pub fn from_evdev_value(value: i32) -> Option<Self> {
        match value {
            0 => Some(KeyState::Released),
            1 => Some(KeyState::Pressed),
            2 => Some(KeyState::Repeat),
            _ => None,
        }
    }

    pub fn evdev_value(self) -> i32 {
        match self {
            KeyState::Released => 0,
            KeyState::Pressed => 1,
            KeyState::Repeat => 2,
        }
    }
}

/// Код клавиши (evdev коды)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct KeyCode(pub u16);

impl KeyCode {
    pub const LEFT_CTRL: KeyCode = KeyCode(29);
    pub const RIGHT_CTRL: KeyCode = KeyCode(97);
    pub const LEFT_SHIFT: KeyCode = KeyCode(42);
    pub const RIGHT_SHIFT: KeyCode = KeyCode(54);
    pub const LEFT_ALT: KeyCode = KeyCode(56);
    pub const RIGHT_ALT: KeyCode = KeyCode(100);
    pub const LEFT_META: KeyCode = KeyCode(125);
    pub const RIGHT_META: KeyCode = KeyCode(126);

    pub const UP: KeyCode = KeyCode(103);
    pub const LEFT: KeyCode = KeyCode(105);
    pub const RIGHT: KeyCode = KeyCode(106);
    pub const DOWN: KeyCode = KeyCode(108);

    pub fn new(code: u16) -> Self {
        Self(code)
    }

    pub fn value(&self) -> u16 {
        self.0
    }

    /// Флаг модификатора для этой клавиши (левый и правый варианты схлопываются)
    pub fn modifier(self) -> Option<Modifiers> {
        match self {
            Self::LEFT_CTRL | Self::RIGHT_CTRL => Some(Modifiers::CTRL),
            Self::LEFT_ALT | Self::RIGHT_ALT => Some(Modifiers::ALT),
            Self::LEFT_SHIFT | Self::RIGHT_SHIFT => Some(Modifiers::SHIFT),
            Self::LEFT_META | Self::RIGHT_META => Some(Modifiers::SUPER),
            _ => None,
        }
    }

    pub fn is_modifier(self) -> bool {
        self.modifier().is_some()
    }
}

impl fmt::Display for KeyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KEY_{}", self.0)
    }
}

/// Модификаторы клавиш в канонической форме (битовая маска)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Modifiers(u8);

impl Modifiers {
    pub const NONE: Modifiers = Modifiers(0);
    pub const CTRL: Modifiers = Modifiers(0b0001);
    pub const ALT: Modifiers = Modifiers(0b0010);
    pub const SHIFT: Modifiers = Modifiers(0b0100);
    pub const SUPER: Modifiers = Modifiers(0b1000);

    const ALL: [(Modifiers, &'static str); 4] = [
        (Modifiers::CTRL, "ctrl"),
        (Modifiers::ALT, "alt"),
        (Modifiers::SHIFT, "shift"),
        (Modifiers::SUPER, "super"),
    ];

    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_bits(bits: u8) -> Self {
        Self(bits & 0b1111)
    }

    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn with_ctrl(self, ctrl: bool) -> Self {
        self.with(Modifiers::CTRL, ctrl)
    }

    pub fn with_alt(self, alt: bool) -> Self {
        self.with(Modifiers::ALT, alt)
    }

    pub fn with_shift(self, shift: bool) -> Self {
        self.with(Modifiers::SHIFT, shift)
    }

    pub fn with_super(self, super_key: bool) -> Self {
        self.with(Modifiers::SUPER, super_key)
    }

    fn with(mut self, flag: Modifiers, on: bool) -> Self {
        if on {
            self.insert(flag);
        } else {
            self.remove(flag);
        }
        self
    }

    pub fn insert(&mut self, other: Modifiers) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: Modifiers) {
        self.0 &= !other.0;
    }

    pub fn contains(self, other: Modifiers) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn has_any(self) -> bool {
        !self.is_empty()
    }

    /// Отдельные флаги, из которых состоит маска
    pub fn iter(self) -> impl Iterator<Item = Modifiers> {
        Self::ALL
            .into_iter()
            .map(|(flag, _)| flag)
            .filter(move |flag| self.contains(*flag))
    }

    pub fn to_vec(self) -> Vec<&'static str> {
        Self::ALL
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect()
    }

    /// Разбор имени модификатора из конфигурации
    pub fn parse_name(name: &str) -> Option<Modifiers> {
        match name.trim().to_lowercase().as_str() {
            "ctrl" | "control" => Some(Modifiers::CTRL),
            "alt" => Some(Modifiers::ALT),
            "shift" => Some(Modifiers::SHIFT),
            "super" | "win" | "meta" => Some(Modifiers::SUPER),
            _ => None,
        }
    }
}

impl BitOr for Modifiers {
    type Output = Modifiers;

    fn bitor(self, rhs: Self) -> Self::Output {
        Modifiers(self.0 | rhs.0)
    }
}

impl BitOrAssign for Modifiers {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for Modifiers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let modifiers = self.to_vec();
        if modifiers.is_empty() {
            write!(f, "none")
        } else {
            write!(f, "{}", modifiers.join("+"))
        }
    }
}

/// Событие клавиатуры
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEvent {
    pub key_code: KeyCode,
    pub state: KeyState,
    pub timestamp: std::time::Instant,
    pub device_name: String,
}

impl KeyEvent {
    pub fn new(key_code: KeyCode, state: KeyState, device_name: String) -> Self {
        Self {
            key_code,
            state,
            timestamp: std::time::Instant::now(),
            device_name,
        }
    }

    pub fn is_down(&self) -> bool {
        self.state == KeyState::Pressed
    }
}

impl fmt::Display for KeyEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}[{}] {:?} ({})",
            self.key_code,
            self.device_name,
            self.state,
            self.timestamp.elapsed().as_millis()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modifiers_creation() {
        let modifiers = Modifiers::new().with_ctrl(true).with_shift(true);

        assert!(modifiers.contains(Modifiers::CTRL));
        assert!(modifiers.contains(Modifiers::SHIFT));
        assert!(!modifiers.contains(Modifiers::ALT));
        assert!(!modifiers.contains(Modifiers::SUPER));
        assert!(modifiers.has_any());
        assert_eq!(modifiers.bits(), 0b0101);
    }

    #[test]
    fn test_left_and_right_collapse() {
        assert_eq!(KeyCode::LEFT_SHIFT.modifier(), KeyCode::RIGHT_SHIFT.modifier());
        assert_eq!(KeyCode::RIGHT_META.modifier(), Some(Modifiers::SUPER));
        assert_eq!(KeyCode(44).modifier(), None);
    }

    #[test]
    fn test_modifiers_display() {
        let modifiers = Modifiers::SUPER | Modifiers::SHIFT;
        assert_eq!(modifiers.to_string(), "shift+super");
        assert_eq!(Modifiers::NONE.to_string(), "none");
        assert_eq!(modifiers.iter().count(), 2);
    }

    #[test]
    fn test_parse_modifier_names() {
        assert_eq!(Modifiers::parse_name("Win"), Some(Modifiers::SUPER));
        assert_eq!(Modifiers::parse_name("control"), Some(Modifiers::CTRL));
        assert_eq!(Modifiers::parse_name("hyper"), None);
    }
}
