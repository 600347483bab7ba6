use crate::error::{GripError, Result};
use crate::platform::INJECTED_DEVICE_NAME;
use evdev::{Device, KeyCode as EvKey, RelativeAxisCode};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Тип устройства ввода, которое нужно найти
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceKind {
    Keyboard,
    Mouse,
}

impl DeviceKind {
    fn label(self) -> &'static str {
        match self {
            DeviceKind::Keyboard => "клавиатурное",
            DeviceKind::Mouse => "указательное",
        }
    }

    /// Приоритет по имени ссылки в /dev/input/by-id. None - не подходит.
    fn by_id_priority(self, name: &str) -> Option<u32> {
        if !name.contains("event") {
            return None;
        }
        let lower = name.to_lowercase();
        match self {
            DeviceKind::Keyboard => {
                if lower.contains("mouse") {
                    None
                } else if name.ends_with("event-kbd") {
                    Some(100)
                } else if lower.contains("keyboard") || lower.contains("kbd") {
                    Some(50)
                } else {
                    None
                }
            }
            DeviceKind::Mouse => {
                if name.ends_with("event-mouse") {
                    Some(100)
                } else if lower.contains("mouse") {
                    Some(50)
                } else {
                    None
                }
            }
        }
    }

    fn matches(self, device: &Device) -> bool {
        match self {
            DeviceKind::Keyboard => is_keyboard(device),
            DeviceKind::Mouse => is_mouse(device),
        }
    }
}

fn is_keyboard(device: &Device) -> bool {
    let name = device.name().unwrap_or("Unknown").to_lowercase();
    if name.contains("mouse") || name.contains("touchpad") || name.contains("trackpoint") {
        return false;
    }

    device.supported_keys().is_some_and(|keys| {
        let basic_keys =
            keys.contains(EvKey::KEY_A) && keys.contains(EvKey::KEY_SPACE) && keys.contains(EvKey::KEY_ENTER);
        // У настоящей клавиатуры много клавиш
        basic_keys && keys.iter().count() > 20
    })
}

fn is_mouse(device: &Device) -> bool {
    let has_axes = device
        .supported_relative_axes()
        .is_some_and(|axes| axes.contains(RelativeAxisCode::REL_X) && axes.contains(RelativeAxisCode::REL_Y));
    let has_buttons = device
        .supported_keys()
        .is_some_and(|keys| keys.contains(EvKey::BTN_LEFT));
    has_axes && has_buttons
}

/// Поддерживает ли устройство колесо высокого разрешения
pub fn has_hi_res_wheel(device: &Device) -> bool {
    device
        .supported_relative_axes()
        .is_some_and(|axes| axes.contains(RelativeAxisCode::REL_WHEEL_HI_RES))
}

pub struct DeviceFinder;

impl DeviceFinder {
    pub fn find_keyboard_device(device_path: &str) -> Result<PathBuf> {
        Self::find_device(device_path, DeviceKind::Keyboard)
    }

    pub fn find_mouse_device(device_path: &str) -> Result<PathBuf> {
        Self::find_device(device_path, DeviceKind::Mouse)
    }

    /// `"auto"` - автопоиск, иначе явный путь к устройству
    pub fn find_device(device_path: &str, kind: DeviceKind) -> Result<PathBuf> {
        if device_path != "auto" {
            let path = PathBuf::from(device_path);
            return if path.exists() {
                info!("Используется указанное устройство: {:?}", path);
                Ok(path)
            } else {
                GripError::device_not_found(format!("Указанное устройство не найдено: {:?}", path))
            };
        }

        info!("Автопоиск: {} устройство", kind.label());

        if let Ok(device) = Self::find_by_id(kind) {
            info!("Найдено устройство по ID: {:?}", device);
            return Ok(device);
        }

        if let Ok(device) = Self::find_by_event_devices(kind) {
            info!("Найдено устройство среди event устройств: {:?}", device);
            return Ok(device);
        }

        GripError::device_not_found(format!(
            "Не удалось найти {} устройство. Убедитесь, что пользователь добавлен в группу 'input'",
            kind.label()
        ))
    }

    fn find_by_id(kind: DeviceKind) -> Result<PathBuf> {
        let by_id_dir = Path::new("/dev/input/by-id");

        if !by_id_dir.exists() {
            debug!("Директория /dev/input/by-id не существует");
            return GripError::device_not_found("Директория by-id не найдена");
        }

        let entries = fs::read_dir(by_id_dir)
            .map_err(|e| crate::grip_error!(permission, "Нет доступа к /dev/input/by-id: {}", e))?;

        let mut candidates = Vec::new();
        for entry in entries {
            let path = entry?.path();
            let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("").to_string();

            let Some(priority) = kind.by_id_priority(&name) else {
                continue;
            };
            if !Self::is_device_accessible(&path) {
                warn!("Устройство {:?} недоступно", path);
                continue;
            }
            if Self::probe(&path, kind) {
                debug!("Кандидат: {} (приоритет {})", name, priority);
                candidates.push((path, priority));
            }
        }

        candidates.sort_by(|a, b| b.1.cmp(&a.1));
        match candidates.into_iter().next() {
            Some((path, _)) => Ok(path),
            None => GripError::device_not_found("Устройство не найдено в by-id"),
        }
    }

    fn find_by_event_devices(kind: DeviceKind) -> Result<PathBuf> {
        let entries = fs::read_dir("/dev/input")
            .map_err(|e| crate::grip_error!(permission, "Нет доступа к /dev/input: {}", e))?;

        let mut event_devices = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with("event"))
            {
                event_devices.push(path);
            }
        }
        event_devices.sort();

        event_devices
            .into_iter()
            .find(|path| Self::is_device_accessible(path) && Self::probe(path, kind))
            .ok_or_else(|| crate::grip_error!(device_not_found, "Среди event устройств нет подходящего"))
    }

    /// Открывает устройство и проверяет возможности. Собственное виртуальное устройство пропускается.
    fn probe(path: &Path, kind: DeviceKind) -> bool {
        match Device::open(path) {
            Ok(device) => {
                if device.name() == Some(INJECTED_DEVICE_NAME) {
                    debug!("Пропуск собственного виртуального устройства {:?}", path);
                    return false;
                }
                kind.matches(&device)
            }
            Err(e) => {
                debug!("Не удалось открыть устройство {:?}: {}", path, e);
                false
            }
        }
    }

    fn is_device_accessible(device_path: &Path) -> bool {
        match fs::File::open(device_path) {
            Ok(_) => true,
            Err(e) => {
                debug!("Устройство {:?} недоступно: {}", device_path, e);
                false
            }
        }
    }
}
