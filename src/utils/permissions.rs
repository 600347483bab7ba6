use crate::error::Result;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use tracing::{info, warn};

/// Проверка доступа к устройствам ввода и к /dev/uinput
pub fn check_permissions() -> Result<()> {
    info!("Проверка прав доступа...");

    check_input_devices_access()?;
    check_uinput_access()?;
    check_display();
    check_not_root();

    info!("Проверка прав доступа завершена успешно");
    Ok(())
}

fn check_input_devices_access() -> Result<()> {
    let input_dir = "/dev/input";

    if !Path::new(input_dir).exists() {
        return Err(crate::grip_error!(permission, "Директория {} не существует", input_dir));
    }

    fs::read_dir(input_dir).map_err(|e| {
        crate::grip_error!(
            permission,
            "Нет доступа к {}: {}. Добавьте пользователя в группу 'input'",
            input_dir,
            e
        )
    })?;

    info!("Доступ к {} подтвержден", input_dir);
    Ok(())
}

/// Без uinput не работает только привязка к краю, поэтому отсутствие модуля не фатально
fn check_uinput_access() -> Result<()> {
    let uinput_device = "/dev/uinput";

    if !Path::new(uinput_device).exists() {
        warn!("{} не существует, привязка к краю будет недоступна (sudo modprobe uinput)", uinput_device);
        return Ok(());
    }

    let metadata = fs::metadata(uinput_device).map_err(|e| {
        crate::grip_error!(permission, "Не удалось проверить права доступа к {}: {}", uinput_device, e)
    })?;

    if !mode_allows_group_or_other(metadata.permissions().mode()) {
        return Err(crate::grip_error!(
            permission,
            "Нет прав доступа к {}. Добавьте пользователя в группу 'uinput' или 'input'",
            uinput_device
        ));
    }

    info!("Доступ к {} подтвержден", uinput_device);
    Ok(())
}

fn mode_allows_group_or_other(mode: u32) -> bool {
    mode & 0o006 != 0 || mode & 0o060 != 0
}

fn check_display() {
    match std::env::var("DISPLAY") {
        Ok(display_name) if !display_name.is_empty() => info!("X11 дисплей: {}", display_name),
        _ => warn!("DISPLAY не задан, операции с окнами через xdotool/wmctrl не будут работать"),
    }
}

fn check_not_root() {
    match std::env::var("USER") {
        Ok(user) if user == "root" => {
            warn!("Приложение запущено от имени root");
            warn!("Рекомендуется: sudo usermod -a -G input,uinput $USER и запуск от обычного пользователя");
        }
        Ok(user) => info!("Приложение запущено от имени пользователя: {}", user),
        Err(_) => warn!("Не удалось определить пользователя"),
    }
}
