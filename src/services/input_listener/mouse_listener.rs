use crate::config::Config;
use crate::error::{GripError, Result};
use crate::events::{MouseButton, MouseEvent, WHEEL_DELTA};
use crate::services::orchestrator::{EngineMessage, EngineSender};
use crate::trace_if_enabled;
use crate::utils::device_finder::has_hi_res_wheel;
use crate::utils::DeviceFinder;
use evdev::{Device, EventType, RelativeAxisCode};
use tracing::{error, info};

use super::r#trait::InputListenerTrait;

/// Кнопки и колесо мыши в сообщения оркестратора.
/// Колесо нормализуется к WHEEL_DELTA на щелчок; при наличии REL_WHEEL_HI_RES
/// обычный REL_WHEEL игнорируется, иначе каждый щелчок был бы учтён дважды.
pub(super) struct MouseRouter {
    sender: EngineSender,
    hi_res: bool,
}

impl MouseRouter {
    pub(super) fn new(sender: EngineSender, hi_res: bool) -> Self {
        Self { sender, hi_res }
    }

    pub(super) fn route(&mut self, event_type: EventType, code: u16, value: i32) -> Result<()> {
        let event = match event_type {
            EventType::KEY => {
                let Some(button) = MouseButton::from_evdev_code(code) else {
                    return Ok(());
                };
                match value {
                    0 => MouseEvent::Button { button, pressed: false },
                    1 => MouseEvent::Button { button, pressed: true },
                    _ => return Ok(()),
                }
            }
            EventType::RELATIVE => {
                let delta = if code == RelativeAxisCode::REL_WHEEL_HI_RES.0 && self.hi_res {
                    value
                } else if code == RelativeAxisCode::REL_WHEEL.0 && !self.hi_res {
                    value * WHEEL_DELTA
                } else {
                    return Ok(());
                };
                MouseEvent::Scroll { delta }
            }
            _ => return Ok(()),
        };

        trace_if_enabled!("Событие мыши: {}", event);
        self.sender
            .send(EngineMessage::Mouse(event))
            .map_err(|_| crate::grip_error!(internal, "очередь оркестратора закрыта"))
    }
}

pub struct RealMouseListener {
    device: Device,
    router: MouseRouter,
}

impl RealMouseListener {
    pub fn new(config: &Config, sender: EngineSender) -> Result<Self> {
        info!("Инициализация RealMouseListener");

        let device_path = DeviceFinder::find_mouse_device(&config.input.mouse_device)?;
        let device = Device::open(&device_path).map_err(|e| {
            GripError::DeviceNotFound(format!("Не удалось открыть устройство {:?}: {}", device_path, e))
        })?;

        let hi_res = has_hi_res_wheel(&device);
        info!(
            "Мышь: {} ({:?}), колесо высокого разрешения: {}",
            device.name().unwrap_or("Unknown"),
            device_path,
            hi_res
        );

        Ok(Self {
            device,
            router: MouseRouter::new(sender, hi_res),
        })
    }

    async fn run_impl(self) -> Result<()> {
        let Self { device, mut router } = self;
        let mut events = device.into_event_stream()?;
        info!("RealMouseListener запущен");

        loop {
            let event = match events.next_event().await {
                Ok(event) => event,
                Err(e) => {
                    error!("Ошибка чтения событий мыши: {}", e);
                    tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
                    continue;
                }
            };

            if let Err(e) = router.route(event.event_type(), event.code(), event.value()) {
                info!("Слушатель мыши остановлен: {}", e);
                return Ok(());
            }
        }
    }
}

#[async_trait::async_trait]
impl InputListenerTrait for RealMouseListener {
    async fn run(self: Box<Self>) -> Result<()> {
        (*self).run_impl().await
    }
}
