use crate::config::Config;
use crate::error::Result;
use crate::platform::EvdevHotkeyBackend;
use crate::services::orchestrator::EngineSender;
use std::sync::Arc;

/// Trait for input listeners that can run in different modes
#[async_trait::async_trait]
pub trait InputListenerTrait {
    /// Run the listener until the device or the engine queue goes away
    async fn run(self: Box<Self>) -> Result<()>;
}

/// Factory function to create a keyboard listener based on the dry_run flag
pub fn create_keyboard_listener(
    config: &Config,
    hotkeys: Arc<EvdevHotkeyBackend>,
    sender: EngineSender,
    dry_run: bool,
) -> Result<Box<dyn InputListenerTrait + Send>> {
    if dry_run {
        Ok(Box::new(super::dry_listener::DryRunListener::new("keyboard")))
    } else {
        Ok(Box::new(super::keyboard_listener::RealKeyboardListener::new(
            config, hotkeys, sender,
        )?))
    }
}

/// Factory function to create a mouse listener based on the dry_run flag
pub fn create_mouse_listener(
    config: &Config,
    sender: EngineSender,
    dry_run: bool,
) -> Result<Box<dyn InputListenerTrait + Send>> {
    if dry_run {
        Ok(Box::new(super::dry_listener::DryRunListener::new("mouse")))
    } else {
        Ok(Box::new(super::mouse_listener::RealMouseListener::new(config, sender)?))
    }
}
