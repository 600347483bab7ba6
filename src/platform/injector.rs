use super::InputInjector;
use crate::error::{GripError, Result};
use crate::events::SyntheticKey;
use parking_lot::Mutex;
use tracing::{debug, info};

/// Имя виртуального устройства - приватный маркер синтетического ввода.
/// События с этим именем устройства собственный хук игнорирует.
pub const INJECTED_DEVICE_NAME: &str = "hotgrip-synthetic-input";

pub struct UinputInjector {
    device: Option<Mutex<uinput::Device>>,
    dry_run: bool,
}

impl UinputInjector {
    pub fn new(dry_run: bool) -> Result<Self> {
        info!("Инициализация UinputInjector (dry_run: {})", dry_run);

        let device = if dry_run {
            None
        } else {
            Some(Mutex::new(Self::create_virtual_device()?))
        };

        Ok(Self { device, dry_run })
    }

    fn create_virtual_device() -> Result<uinput::Device> {
        info!("Создание виртуального устройства uinput '{}'", INJECTED_DEVICE_NAME);

        let device = uinput::default()?
            .name(INJECTED_DEVICE_NAME)?
            .event(uinput::event::Keyboard::All)?
            .create()?;

        info!("Виртуальное устройство '{}' создано успешно", INJECTED_DEVICE_NAME);
        Ok(device)
    }
}

impl InputInjector for UinputInjector {
    fn inject(&self, keys: &[SyntheticKey]) -> Result<()> {
        if self.dry_run {
            info!("[DRY RUN] Синтетический ввод: {:?}", keys);
            return Ok(());
        }

        let Some(device) = &self.device else {
            return Err(GripError::Internal("Виртуальное устройство недоступно".to_string()));
        };
        let mut device = device.lock();

        for key in keys {
            let code = i32::from(key.key_code.value());
            device
                .write(1, code, key.state.evdev_value())
                .map_err(|e| GripError::Internal(format!("Не удалось отправить клавишу {}: {}", code, e)))?;

            // Синхронизация после каждого события, чтобы аккорд пришёл в нужном порядке
            device
                .write(0, 0, 0)
                .map_err(|e| GripError::Internal(format!("Не удалось синхронизировать события: {}", e)))?;
        }

        debug!("Отправлено {} синтетических событий", keys.len());
        Ok(())
    }
}

impl Drop for UinputInjector {
    fn drop(&mut self) {
        if !self.dry_run {
            info!("Закрытие виртуального устройства");
        }
    }
}
