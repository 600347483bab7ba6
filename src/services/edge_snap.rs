use crate::error::Result;
use crate::events::{KeyCode, Modifiers, Point, Rect, SyntheticKey};
use crate::platform::{InputInjector, MonitorSource};
use smallvec::SmallVec;
use std::sync::Arc;
use tracing::debug;

/// Край монитора, к которому привязывается окно
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapEdge {
    Top,
    Left,
    Right,
}

impl SnapEdge {
    /// Стрелка в нативном сочетании Super+стрелка
    fn arrow(self) -> KeyCode {
        match self {
            SnapEdge::Top => KeyCode::UP,
            SnapEdge::Left => KeyCode::LEFT,
            SnapEdge::Right => KeyCode::RIGHT,
        }
    }
}

/// Верхний край приоритетнее боковых
pub fn detect_edge(cursor: Point, bounds: &Rect, threshold: i32) -> Option<SnapEdge> {
    if cursor.y - bounds.y <= threshold {
        Some(SnapEdge::Top)
    } else if cursor.x - bounds.x <= threshold {
        Some(SnapEdge::Left)
    } else if (bounds.right() - 1) - cursor.x <= threshold {
        Some(SnapEdge::Right)
    } else {
        None
    }
}

fn modifier_keys(flag: Modifiers) -> [KeyCode; 2] {
    match flag {
        Modifiers::CTRL => [KeyCode::LEFT_CTRL, KeyCode::RIGHT_CTRL],
        Modifiers::ALT => [KeyCode::LEFT_ALT, KeyCode::RIGHT_ALT],
        Modifiers::SHIFT => [KeyCode::LEFT_SHIFT, KeyCode::RIGHT_SHIFT],
        _ => [KeyCode::LEFT_META, KeyCode::RIGHT_META],
    }
}

/// Синтетическое сочетание для края. Удерживаемые модификаторы, кроме Super,
/// сначала отпускаются, иначе система увидит другое сочетание.
pub fn snap_chord(edge: SnapEdge, held: Modifiers) -> SmallVec<[SyntheticKey; 12]> {
    let mut keys = SmallVec::new();

    for flag in held.iter().filter(|flag| *flag != Modifiers::SUPER) {
        for key in modifier_keys(flag) {
            keys.push(SyntheticKey::release(key));
        }
    }

    let press_super = !held.contains(Modifiers::SUPER);
    if press_super {
        keys.push(SyntheticKey::press(KeyCode::LEFT_META));
    }
    keys.push(SyntheticKey::press(edge.arrow()));
    keys.push(SyntheticKey::release(edge.arrow()));
    if press_super {
        keys.push(SyntheticKey::release(KeyCode::LEFT_META));
    }
    keys
}

/// Отложенная привязка окна к краю после перетаскивания
pub struct EdgeSnapper {
    injector: Arc<dyn InputInjector>,
    monitors: Arc<dyn MonitorSource>,
    threshold: i32,
}

impl EdgeSnapper {
    pub fn new(injector: Arc<dyn InputInjector>, monitors: Arc<dyn MonitorSource>, threshold: i32) -> Self {
        Self {
            injector,
            monitors,
            threshold,
        }
    }

    pub fn set_threshold(&mut self, threshold: i32) {
        self.threshold = threshold;
    }

    /// `cursor` - последняя позиция, увиденная во время перетаскивания
    pub fn snap(&self, cursor: Point, held: Modifiers) -> Result<Option<SnapEdge>> {
        let Some(monitor) = self.monitors.monitor_at(cursor)? else {
            return Ok(None);
        };
        let Some(edge) = detect_edge(cursor, &monitor.bounds, self.threshold) else {
            return Ok(None);
        };

        debug!("Привязка к краю {:?} в точке {}", edge, cursor);
        self.injector.inject(&snap_chord(edge, held))?;
        Ok(Some(edge))
    }
}
