use serde::{Deserialize, Serialize};
use std::fmt;

/// Идентификатор действия. Ядро не знает, что делает действие,
/// кроме перетаскивания, которое возвращается в DragHandler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    StartMove,
    StartResize,
    Minimize,
    Maximize,
    Restore,
    SnapLeft,
    SnapRight,
    OpacityUp,
    OpacityDown,
    OpacityReset,
    Center,
}

impl Action {
    pub fn parse(name: &str) -> Option<Self> {
        let action = match name.trim().to_lowercase().replace('-', "_").as_str() {
            "start_move" | "move" => Action::StartMove,
            "start_resize" | "resize" => Action::StartResize,
            "minimize" => Action::Minimize,
            "maximize" | "toggle_maximize" => Action::Maximize,
            "restore" => Action::Restore,
            "snap_left" => Action::SnapLeft,
            "snap_right" => Action::SnapRight,
            "opacity_up" => Action::OpacityUp,
            "opacity_down" => Action::OpacityDown,
            "opacity_reset" => Action::OpacityReset,
            "center" => Action::Center,
            _ => return None,
        };
        Some(action)
    }

    pub fn is_drag(self) -> bool {
        matches!(self, Action::StartMove | Action::StartResize)
    }

    pub fn snap_direction(self) -> Option<SnapDirection> {
        match self {
            Action::SnapLeft => Some(SnapDirection::Left),
            Action::SnapRight => Some(SnapDirection::Right),
            _ => None,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Action::StartMove => "start_move",
            Action::StartResize => "start_resize",
            Action::Minimize => "minimize",
            Action::Maximize => "maximize",
            Action::Restore => "restore",
            Action::SnapLeft => "snap_left",
            Action::SnapRight => "snap_right",
            Action::OpacityUp => "opacity_up",
            Action::OpacityDown => "opacity_down",
            Action::OpacityReset => "opacity_reset",
            Action::Center => "center",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SnapDirection {
    Left,
    Right,
}

/// Семейство распознавателя, к которому относится жест
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GestureFamily {
    Swipe,
    Shake,
    EdgeFlick,
    Scroll,
    Button,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GestureKind {
    SwipeLeft,
    SwipeRight,
    SwipeUp,
    SwipeDown,
    ShakeHorizontal,
    ShakeVertical,
    EdgeFlickLeft,
    EdgeFlickRight,
    EdgeFlickTop,
    EdgeFlickBottom,
    ScrollUp,
    ScrollDown,
    MiddleClick,
    BackButton,
    ForwardButton,
}

impl GestureKind {
    pub fn parse(name: &str) -> Option<Self> {
        let kind = match name.trim().to_lowercase().replace('-', "_").as_str() {
            "swipe_left" => GestureKind::SwipeLeft,
            "swipe_right" => GestureKind::SwipeRight,
            "swipe_up" => GestureKind::SwipeUp,
            "swipe_down" => GestureKind::SwipeDown,
            "shake_horizontal" | "shake" => GestureKind::ShakeHorizontal,
            "shake_vertical" => GestureKind::ShakeVertical,
            "edge_flick_left" => GestureKind::EdgeFlickLeft,
            "edge_flick_right" => GestureKind::EdgeFlickRight,
            "edge_flick_top" => GestureKind::EdgeFlickTop,
            "edge_flick_bottom" => GestureKind::EdgeFlickBottom,
            "scroll_up" => GestureKind::ScrollUp,
            "scroll_down" => GestureKind::ScrollDown,
            "middle_click" => GestureKind::MiddleClick,
            "back_button" | "xbutton1" => GestureKind::BackButton,
            "forward_button" | "xbutton2" => GestureKind::ForwardButton,
            _ => return None,
        };
        Some(kind)
    }

    pub fn family(self) -> GestureFamily {
        match self {
            GestureKind::SwipeLeft
            | GestureKind::SwipeRight
            | GestureKind::SwipeUp
            | GestureKind::SwipeDown => GestureFamily::Swipe,
            GestureKind::ShakeHorizontal | GestureKind::ShakeVertical => GestureFamily::Shake,
            GestureKind::EdgeFlickLeft
            | GestureKind::EdgeFlickRight
            | GestureKind::EdgeFlickTop
            | GestureKind::EdgeFlickBottom => GestureFamily::EdgeFlick,
            GestureKind::ScrollUp | GestureKind::ScrollDown => GestureFamily::Scroll,
            GestureKind::MiddleClick | GestureKind::BackButton | GestureKind::ForwardButton => {
                GestureFamily::Button
            }
        }
    }
}
