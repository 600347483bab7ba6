pub mod drag_handler;
pub mod edge_snap;
pub mod gesture_engine;
pub mod hotkey_registrar;
pub mod input_listener;
pub mod modifier_session;
pub mod orchestrator;
pub mod snap_cycle;
pub mod window_manipulator;

pub use input_listener::{create_keyboard_listener, create_mouse_listener};
pub use orchestrator::{engine_channel, EngineEvent, EngineMessage, EngineSnapshot, Orchestrator};
