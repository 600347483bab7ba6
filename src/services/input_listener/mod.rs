mod dry_listener;
mod keyboard_listener;
mod modifier_state;
mod mouse_listener;
mod r#trait;

pub use self::r#trait::{create_keyboard_listener, create_mouse_listener, InputListenerTrait};
