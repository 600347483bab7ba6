use super::{oldest_within, param, MotionHistory, MIN_ELAPSED_MS};
use crate::actions::GestureKind;
use crate::bindings::GestureParams;
use crate::events::Rect;

/// Короткое окно для мгновенной скорости
pub const EDGE_FLICK_WINDOW_MS: u64 = 100;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeFlickParams {
    /// Минимальная скорость к краю, px/s
    pub min_velocity: f64,
    /// Расстояние до края монитора, при котором курсор считается "у края", px
    pub edge_threshold: i32,
}

impl Default for EdgeFlickParams {
    fn default() -> Self {
        Self {
            min_velocity: 1200.0,
            edge_threshold: 4,
        }
    }
}

impl EdgeFlickParams {
    pub fn from_params(params: Option<&GestureParams>) -> Self {
        let defaults = Self::default();
        Self {
            min_velocity: param(params, "min_velocity", defaults.min_velocity),
            edge_threshold: param(params, "edge_threshold", f64::from(defaults.edge_threshold)) as i32,
        }
    }
}

pub struct EdgeFlickRecognizer;

impl EdgeFlickRecognizer {
    /// `monitor` - границы монитора под текущим положением курсора
    pub fn evaluate(history: &MotionHistory, monitor: &Rect, params: &EdgeFlickParams) -> Option<GestureKind> {
        let (oldest, newest) = oldest_within(history, EDGE_FLICK_WINDOW_MS)?;

        let elapsed_ms = newest.timestamp_ms.saturating_sub(oldest.timestamp_ms);
        if elapsed_ms < MIN_ELAPSED_MS {
            return None;
        }
        let elapsed_s = elapsed_ms as f64 / 1000.0;
        let vx = f64::from(newest.x - oldest.x) / elapsed_s;
        let vy = f64::from(newest.y - oldest.y) / elapsed_s;

        let threshold = params.edge_threshold;
        let near_left = newest.x - monitor.x <= threshold;
        let near_right = (monitor.right() - 1) - newest.x <= threshold;
        let near_top = newest.y - monitor.y <= threshold;
        let near_bottom = (monitor.bottom() - 1) - newest.y <= threshold;

        // Край, к которому курсор прижат и продолжает двигаться
        let candidates = [
            (near_left, -vx, GestureKind::EdgeFlickLeft),
            (near_right, vx, GestureKind::EdgeFlickRight),
            (near_top, -vy, GestureKind::EdgeFlickTop),
            (near_bottom, vy, GestureKind::EdgeFlickBottom),
        ];

        candidates
            .into_iter()
            .filter(|(near, toward, _)| *near && *toward > 0.0 && *toward >= params.min_velocity)
            .map(|(_, _, kind)| kind)
            .next()
    }
}
