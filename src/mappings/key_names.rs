use crate::events::KeyCode;
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Маппинг между именами клавиш из конфигурации и кодами evdev
pub struct KeyNames;

// Статическая карта основных клавиш
static KEY_NAME_TO_CODE: Lazy<HashMap<&'static str, u16>> = Lazy::new(|| {
    let mut map = HashMap::new();

    // Буквенные клавиши
    for (name, code) in [
        ("q", 16), ("w", 17), ("e", 18), ("r", 19), ("t", 20), ("y", 21), ("u", 22),
        ("i", 23), ("o", 24), ("p", 25), ("a", 30), ("s", 31), ("d", 32), ("f", 33),
        ("g", 34), ("h", 35), ("j", 36), ("k", 37), ("l", 38), ("z", 44), ("x", 45),
        ("c", 46), ("v", 47), ("b", 48), ("n", 49), ("m", 50),
    ] {
        map.insert(name, code);
    }

    // Цифровые клавиши (верхний ряд)
    for (name, code) in [
        ("1", 2), ("2", 3), ("3", 4), ("4", 5), ("5", 6),
        ("6", 7), ("7", 8), ("8", 9), ("9", 10), ("0", 11),
    ] {
        map.insert(name, code);
    }

    // Функциональные клавиши
    for (name, code) in [
        ("f1", 59), ("f2", 60), ("f3", 61), ("f4", 62), ("f5", 63), ("f6", 64),
        ("f7", 65), ("f8", 66), ("f9", 67), ("f10", 68), ("f11", 87), ("f12", 88),
    ] {
        map.insert(name, code);
    }

    // Специальные клавиши
    map.insert("escape", 1);
    map.insert("minus", 12);
    map.insert("equal", 13);
    map.insert("backspace", 14);
    map.insert("tab", 15);
    map.insert("leftbrace", 26);
    map.insert("rightbrace", 27);
    map.insert("enter", 28);
    map.insert("semicolon", 39);
    map.insert("apostrophe", 40);
    map.insert("grave", 41);
    map.insert("backslash", 43);
    map.insert("comma", 51);
    map.insert("dot", 52);
    map.insert("slash", 53);
    map.insert("space", 57);
    map.insert("home", 102);
    map.insert("pageup", 104);
    map.insert("end", 107);
    map.insert("pagedown", 109);
    map.insert("insert", 110);
    map.insert("delete", 111);

    // Стрелки
    map.insert("up", 103);
    map.insert("left", 105);
    map.insert("right", 106);
    map.insert("down", 108);

    // Модификаторы
    map.insert("ctrl", 29);
    map.insert("shift", 42);
    map.insert("alt", 56);
    map.insert("super", 125);

    map
});

// Синонимы, которые встречаются в конфигурациях
static KEY_ALIASES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("esc", "escape"),
        ("return", "enter"),
        ("pgup", "pageup"),
        ("pgdn", "pagedown"),
        ("del", "delete"),
        ("ins", "insert"),
        ("win", "super"),
        ("meta", "super"),
        ("control", "ctrl"),
    ])
});

static CODE_TO_KEY_NAME: Lazy<HashMap<u16, &'static str>> = Lazy::new(|| {
    KEY_NAME_TO_CODE.iter().map(|(&name, &code)| (code, name)).collect()
});

impl KeyNames {
    /// Получить код клавиши по её имени
    pub fn keycode(key_name: &str) -> Option<KeyCode> {
        let normalized = key_name.trim().to_lowercase();
        let canonical = KEY_ALIASES
            .get(normalized.as_str())
            .copied()
            .unwrap_or(normalized.as_str());
        KEY_NAME_TO_CODE.get(canonical).copied().map(KeyCode)
    }

    /// Получить имя клавиши по её коду
    pub fn name(key_code: KeyCode) -> Option<&'static str> {
        if let Some(modifier) = key_code.modifier() {
            return modifier.to_vec().first().copied();
        }
        CODE_TO_KEY_NAME.get(&key_code.value()).copied()
    }

    /// Проверить, является ли клавиша модификатором
    pub fn is_modifier(key_name: &str) -> bool {
        Self::keycode(key_name).is_some_and(KeyCode::is_modifier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_key_mapping() {
        assert_eq!(KeyNames::keycode("a"), Some(KeyCode(30)));
        assert_eq!(KeyNames::keycode("z"), Some(KeyCode(44)));
        assert_eq!(KeyNames::keycode("space"), Some(KeyCode(57)));
        assert_eq!(KeyNames::keycode("f12"), Some(KeyCode(88)));
    }

    #[test]
    fn test_case_insensitive_and_aliases() {
        assert_eq!(KeyNames::keycode("X"), Some(KeyCode(45)));
        assert_eq!(KeyNames::keycode("Esc"), Some(KeyCode(1)));
        assert_eq!(KeyNames::keycode("PgDn"), Some(KeyCode(109)));
    }

    #[test]
    fn test_reverse_mapping() {
        assert_eq!(KeyNames::name(KeyCode(30)), Some("a"));
        assert_eq!(KeyNames::name(KeyCode::RIGHT_CTRL), Some("ctrl"));
        assert_eq!(KeyNames::name(KeyCode(999)), None);
    }

    #[test]
    fn test_invalid_key() {
        assert!(KeyNames::keycode("invalid_key").is_none());
    }

    #[test]
    fn test_modifier_detection() {
        assert!(KeyNames::is_modifier("ctrl"));
        assert!(KeyNames::is_modifier("Win"));
        assert!(!KeyNames::is_modifier("a"));
    }
}
