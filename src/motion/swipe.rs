use super::{oldest_within, param, MotionHistory, MIN_ELAPSED_MS};
use crate::actions::GestureKind;
use crate::bindings::GestureParams;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwipeParams {
    /// Минимальная средняя скорость по доминирующей оси, px/s
    pub min_velocity: f64,
    /// Минимальное смещение по доминирующей оси, px
    pub min_displacement: f64,
    /// Максимальное смещение по поперечной оси, px
    pub max_cross_axis: f64,
    pub window_ms: u64,
}

impl Default for SwipeParams {
    fn default() -> Self {
        Self {
            min_velocity: 800.0,
            min_displacement: 80.0,
            max_cross_axis: 40.0,
            window_ms: 150,
        }
    }
}

impl SwipeParams {
    pub fn from_params(params: Option<&GestureParams>) -> Self {
        let defaults = Self::default();
        Self {
            min_velocity: param(params, "min_velocity", defaults.min_velocity),
            min_displacement: param(params, "min_displacement", defaults.min_displacement),
            max_cross_axis: param(params, "max_cross_axis", defaults.max_cross_axis),
            window_ms: param(params, "window_ms", defaults.window_ms as f64).max(0.0) as u64,
        }
    }
}

pub struct SwipeRecognizer;

impl SwipeRecognizer {
    pub fn evaluate(history: &MotionHistory, params: &SwipeParams) -> Option<GestureKind> {
        let (oldest, newest) = oldest_within(history, params.window_ms)?;

        let elapsed_ms = newest.timestamp_ms.saturating_sub(oldest.timestamp_ms);
        if elapsed_ms < MIN_ELAPSED_MS {
            return None;
        }
        let elapsed_s = elapsed_ms as f64 / 1000.0;

        let dx = f64::from(newest.x - oldest.x);
        let dy = f64::from(newest.y - oldest.y);

        let horizontal = dx.abs() >= dy.abs();
        let (dominant, cross) = if horizontal { (dx, dy) } else { (dy, dx) };

        if dominant.abs() < params.min_displacement || cross.abs() > params.max_cross_axis {
            return None;
        }
        if dominant.abs() / elapsed_s < params.min_velocity {
            return None;
        }

        let kind = match (horizontal, dominant < 0.0) {
            (true, true) => GestureKind::SwipeLeft,
            (true, false) => GestureKind::SwipeRight,
            (false, true) => GestureKind::SwipeUp,
            (false, false) => GestureKind::SwipeDown,
        };
        Some(kind)
    }
}
