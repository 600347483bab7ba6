use crate::config::Config;
use crate::error::{GripError, Result};
use crate::events::{KeyCode, KeyEvent, KeyState};
use crate::platform::EvdevHotkeyBackend;
use crate::services::orchestrator::{EngineMessage, EngineSender};
use crate::trace_if_enabled;
use crate::utils::DeviceFinder;
use evdev::{Device, EventType, InputEvent};
use std::sync::Arc;
use tracing::{debug, error, info};

use super::modifier_state::ModifierState;
use super::r#trait::InputListenerTrait;

/// Перевод сырых событий клавиатуры в сообщения оркестратора.
/// Хук (Key) отправляется первым, совпавшее глобальное сочетание (HotkeyFired) следом.
pub(super) struct KeyRouter {
    device_name: String,
    hotkeys: Arc<EvdevHotkeyBackend>,
    sender: EngineSender,
    modifier_state: ModifierState,
}

impl KeyRouter {
    pub(super) fn new(device_name: String, hotkeys: Arc<EvdevHotkeyBackend>, sender: EngineSender) -> Self {
        Self {
            device_name,
            hotkeys,
            sender,
            modifier_state: ModifierState::new(),
        }
    }

    pub(super) fn route(&mut self, code: u16, value: i32) -> Result<()> {
        let Some(state) = KeyState::from_evdev_value(value) else {
            debug!("Неизвестное значение события клавиши: {}", value);
            return Ok(());
        };
        // Автоповтор не меняет состояние
        if state == KeyState::Repeat {
            return Ok(());
        }

        let key = KeyCode(code);
        let pressed = state == KeyState::Pressed;
        self.modifier_state.update_key(key, pressed);

        let event = KeyEvent::new(key, state, self.device_name.clone());
        trace_if_enabled!("Событие клавиши: {}", event);
        self.send(EngineMessage::Key(event))?;

        if pressed && !key.is_modifier() {
            let modifiers = self.modifier_state.to_modifiers();
            if let Some(id) = self.hotkeys.match_combo(modifiers, key) {
                debug!("Глобальное сочетание {} ({}+{})", id, modifiers, key);
                self.send(EngineMessage::HotkeyFired(id))?;
            }
        }
        Ok(())
    }

    fn send(&self, message: EngineMessage) -> Result<()> {
        self.sender
            .send(message)
            .map_err(|_| crate::grip_error!(internal, "очередь оркестратора закрыта"))
    }
}

pub struct RealKeyboardListener {
    device: Device,
    router: KeyRouter,
}

impl RealKeyboardListener {
    pub fn new(config: &Config, hotkeys: Arc<EvdevHotkeyBackend>, sender: EngineSender) -> Result<Self> {
        info!("Инициализация RealKeyboardListener");

        let device_path = DeviceFinder::find_keyboard_device(&config.input.keyboard_device)?;
        let device = Device::open(&device_path).map_err(|e| {
            GripError::DeviceNotFound(format!("Не удалось открыть устройство {:?}: {}", device_path, e))
        })?;

        let device_name = device.name().unwrap_or("Unknown").to_string();
        info!("Клавиатура: {} ({:?})", device_name, device_path);
        info!("Физический путь: {:?}", device.physical_path());

        Ok(Self {
            device,
            router: KeyRouter::new(device_name, hotkeys, sender),
        })
    }

    async fn run_impl(self) -> Result<()> {
        let Self { device, mut router } = self;
        let mut events = device.into_event_stream()?;
        info!("RealKeyboardListener запущен, начинаем чтение событий");

        loop {
            let event: InputEvent = match events.next_event().await {
                Ok(event) => event,
                Err(e) => {
                    error!("Ошибка чтения событий клавиатуры: {}", e);
                    tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
                    continue;
                }
            };

            if event.event_type() != EventType::KEY {
                continue;
            }
            if let Err(e) = router.route(event.code(), event.value()) {
                info!("Слушатель клавиатуры остановлен: {}", e);
                return Ok(());
            }
        }
    }
}

#[async_trait::async_trait]
impl InputListenerTrait for RealKeyboardListener {
    async fn run(self: Box<Self>) -> Result<()> {
        (*self).run_impl().await
    }
}
