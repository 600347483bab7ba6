use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Полная конфигурация. Ядро получает из неё только снимок таблиц привязок
/// (см. `bindings::BindingTables`) и несколько числовых параметров.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub drag: DragConfig,
    #[serde(default)]
    pub gesture: GestureConfig,
    #[serde(default)]
    pub snap: SnapConfig,
    #[serde(default)]
    pub opacity: OpacityConfig,
    #[serde(default = "default_hotkeys")]
    pub hotkeys: Vec<HotkeyEntry>,
    #[serde(default = "default_gestures")]
    pub gestures: Vec<GestureEntry>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InputConfig {
    pub keyboard_device: String,
    pub mouse_device: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GeneralConfig {
    pub edge_snap: bool,
    pub gestures_enabled: bool,
    pub poll_interval_ms: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DragConfig {
    pub min_width: i32,
    pub min_height: i32,
    pub edge_snap_threshold: i32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GestureConfig {
    pub cooldown_ms: u64,
    pub scroll_quantum: i32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SnapConfig {
    pub fractions: Vec<f64>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OpacityConfig {
    pub step: f64,
    pub minimum: f64,
}

/// Привязка сочетания клавиш. `key = None` означает сочетание только из модификаторов.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct HotkeyEntry {
    pub name: String,
    pub modifiers: Vec<String>,
    #[serde(default)]
    pub key: Option<String>,
    pub action: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct GestureEntry {
    pub name: String,
    pub gesture: String,
    pub modifiers: Vec<String>,
    pub action: String,
    #[serde(default)]
    pub params: HashMap<String, f64>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            keyboard_device: "auto".to_string(),
            mouse_device: "auto".to_string(),
        }
    }
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            edge_snap: true,
            gestures_enabled: true,
            poll_interval_ms: 16,
        }
    }
}

impl Default for DragConfig {
    fn default() -> Self {
        Self {
            min_width: 160,
            min_height: 120,
            edge_snap_threshold: 10,
        }
    }
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            cooldown_ms: 400,
            scroll_quantum: crate::events::WHEEL_DELTA,
        }
    }
}

impl Default for SnapConfig {
    fn default() -> Self {
        Self {
            fractions: vec![2.0 / 3.0, 0.5, 1.0 / 3.0],
        }
    }
}

impl Default for OpacityConfig {
    fn default() -> Self {
        Self {
            step: 0.1,
            minimum: 0.2,
        }
    }
}

fn hotkey(name: &str, key: &str, action: &str) -> HotkeyEntry {
    HotkeyEntry {
        name: name.to_string(),
        modifiers: vec!["super".to_string(), "shift".to_string()],
        key: Some(key.to_string()),
        action: action.to_string(),
    }
}

fn gesture(gesture: &str, action: &str) -> GestureEntry {
    GestureEntry {
        name: gesture.to_string(),
        gesture: gesture.to_string(),
        modifiers: vec!["super".to_string(), "shift".to_string()],
        action: action.to_string(),
        params: HashMap::new(),
    }
}

fn default_hotkeys() -> Vec<HotkeyEntry> {
    vec![
        hotkey("move", "z", "start_move"),
        hotkey("resize", "x", "start_resize"),
        hotkey("minimize", "m", "minimize"),
        hotkey("maximize", "up", "maximize"),
        hotkey("restore", "down", "restore"),
        hotkey("snap-left", "left", "snap_left"),
        hotkey("snap-right", "right", "snap_right"),
        hotkey("opacity-up", "pageup", "opacity_up"),
        hotkey("opacity-down", "pagedown", "opacity_down"),
        hotkey("center", "c", "center"),
    ]
}

fn default_gestures() -> Vec<GestureEntry> {
    vec![
        gesture("swipe_left", "snap_left"),
        gesture("swipe_right", "snap_right"),
        gesture("swipe_up", "maximize"),
        gesture("swipe_down", "minimize"),
        gesture("shake_horizontal", "restore"),
        gesture("scroll_up", "opacity_up"),
        gesture("scroll_down", "opacity_down"),
        gesture("middle_click", "center"),
    ]
}

impl Default for Config {
    fn default() -> Self {
        Self {
            logging: LoggingConfig::default(),
            input: InputConfig::default(),
            general: GeneralConfig::default(),
            drag: DragConfig::default(),
            gesture: GestureConfig::default(),
            snap: SnapConfig::default(),
            opacity: OpacityConfig::default(),
            hotkeys: default_hotkeys(),
            gestures: default_gestures(),
        }
    }
}

impl Config {
    /// Загрузка: значения по умолчанию -> TOML файл -> переменные HOTGRIP_*.
    /// Отсутствующий файл не ошибка, используются значения по умолчанию.
    pub fn load<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        let config_path = config_path.as_ref();

        let figment = Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(config_path))
            .merge(Env::prefixed("HOTGRIP_").split("__"));

        let config: Config = figment
            .extract()
            .with_context(|| format!("Не удалось загрузить конфигурацию из {:?}", config_path))?;

        config.validate()?;

        Ok(config)
    }

    /// Структурная валидация. Ошибки в отдельных привязках сюда не относятся:
    /// такие записи пропускаются при построении таблиц.
    pub fn validate(&self) -> Result<()> {
        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!("Неверный уровень логирования: {}", self.logging.level),
        }

        match self.logging.format.as_str() {
            "pretty" | "json" => {}
            _ => anyhow::bail!("Неверный формат логирования: {}", self.logging.format),
        }

        if self.general.poll_interval_ms == 0 || self.general.poll_interval_ms > 100 {
            anyhow::bail!(
                "poll_interval_ms должно быть в диапазоне 1..=100, получено {}",
                self.general.poll_interval_ms
            );
        }

        if self.drag.min_width <= 0 || self.drag.min_height <= 0 {
            anyhow::bail!("Минимальный размер окна должен быть положительным");
        }

        if self.drag.edge_snap_threshold < 0 {
            anyhow::bail!("edge_snap_threshold не может быть отрицательным");
        }

        if self.gesture.scroll_quantum <= 0 {
            anyhow::bail!("scroll_quantum должно быть больше 0");
        }

        if self.snap.fractions.is_empty() {
            anyhow::bail!("Список snap.fractions пуст");
        }

        for fraction in &self.snap.fractions {
            if !(*fraction > 0.0 && *fraction <= 1.0) {
                anyhow::bail!("Неверная доля ширины в snap.fractions: {}", fraction);
            }
        }

        if !(self.opacity.step > 0.0 && self.opacity.step <= 1.0) {
            anyhow::bail!("opacity.step должно быть в диапазоне (0, 1]");
        }

        if !(self.opacity.minimum > 0.0 && self.opacity.minimum <= 1.0) {
            anyhow::bail!("opacity.minimum должно быть в диапазоне (0, 1]");
        }

        Ok(())
    }
}
