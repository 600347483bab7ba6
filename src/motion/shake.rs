use super::{param, CursorSample};
use crate::actions::GestureKind;
use crate::bindings::GestureParams;
use smallvec::SmallVec;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShakeParams {
    /// Смещения меньше порога считаются дрожанием и игнорируются, px
    pub noise_threshold: i32,
    pub min_reversals: usize,
    pub window_ms: u64,
}

impl Default for ShakeParams {
    fn default() -> Self {
        Self {
            noise_threshold: 8,
            min_reversals: 3,
            window_ms: 600,
        }
    }
}

impl ShakeParams {
    pub fn from_params(params: Option<&GestureParams>) -> Self {
        let defaults = Self::default();
        Self {
            noise_threshold: param(params, "noise_threshold", f64::from(defaults.noise_threshold)) as i32,
            min_reversals: param(params, "min_reversals", defaults.min_reversals as f64).max(1.0) as usize,
            window_ms: param(params, "window_ms", defaults.window_ms as f64).max(0.0) as u64,
        }
    }
}

/// Отслеживание направления по одной оси
#[derive(Debug, Default, Clone)]
struct AxisTracker {
    // Последняя значимая позиция по оси
    anchor: Option<i32>,
    direction: i32,
    reversals: SmallVec<[u64; 8]>,
}

impl AxisTracker {
    fn update(&mut self, position: i32, timestamp_ms: u64, params: &ShakeParams) -> bool {
        self.reversals
            .retain(|at| timestamp_ms.saturating_sub(*at) <= params.window_ms);

        let Some(anchor) = self.anchor else {
            self.anchor = Some(position);
            return false;
        };

        let delta = position - anchor;
        if delta.abs() < params.noise_threshold.max(1) {
            return false;
        }

        let direction = delta.signum();
        if self.direction != 0 && direction != self.direction {
            self.reversals.push(timestamp_ms);
        }
        self.direction = direction;
        self.anchor = Some(position);

        self.reversals.len() >= params.min_reversals
    }

    fn reset(&mut self) {
        self.anchor = None;
        self.direction = 0;
        self.reversals.clear();
    }
}

/// Распознаватель "встряхивания": несколько разворотов направления в коротком окне.
/// После срабатывания полностью сбрасывает внутреннее состояние.
#[derive(Debug, Default, Clone)]
pub struct ShakeRecognizer {
    x: AxisTracker,
    y: AxisTracker,
}

impl ShakeRecognizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, sample: CursorSample, params: &ShakeParams) -> Option<GestureKind> {
        let horizontal = self.x.update(sample.x, sample.timestamp_ms, params);
        let vertical = self.y.update(sample.y, sample.timestamp_ms, params);

        let kind = if horizontal {
            GestureKind::ShakeHorizontal
        } else if vertical {
            GestureKind::ShakeVertical
        } else {
            return None;
        };

        self.reset();
        Some(kind)
    }

    pub fn reset(&mut self) {
        self.x.reset();
        self.y.reset();
    }

    #[cfg(test)]
    fn pending_reversals(&self) -> usize {
        self.x.reversals.len() + self.y.reversals.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(recognizer: &mut ShakeRecognizer, points: &[(i32, i32, u64)]) -> Option<GestureKind> {
        let params = ShakeParams::default();
        let mut result = None;
        for &(x, y, t) in points {
            if let Some(kind) = recognizer.update(CursorSample::new(x, y, t), &params) {
                result = Some(kind);
            }
        }
        result
    }

    #[test]
    fn test_three_reversals_within_window_fire_and_reset() {
        let mut recognizer = ShakeRecognizer::new();
        let result = feed(
            &mut recognizer,
            &[(0, 0, 0), (50, 0, 100), (0, 0, 200), (50, 0, 300), (0, 0, 400)],
        );

        assert_eq!(result, Some(GestureKind::ShakeHorizontal));
        assert_eq!(recognizer.pending_reversals(), 0);
        assert_eq!(recognizer.x.anchor, None);
    }

    #[test]
    fn test_spaced_reversals_are_pruned() {
        let mut recognizer = ShakeRecognizer::new();
        let result = feed(
            &mut recognizer,
            &[(0, 0, 0), (50, 0, 1_000), (0, 0, 2_000), (50, 0, 3_000), (0, 0, 4_000), (50, 0, 5_000)],
        );

        assert_eq!(result, None);
        assert!(recognizer.pending_reversals() <= 1);
    }

    #[test]
    fn test_jitter_below_noise_threshold_ignored() {
        let mut recognizer = ShakeRecognizer::new();
        let result = feed(
            &mut recognizer,
            &[(0, 0, 0), (3, 0, 20), (-3, 0, 40), (3, 0, 60), (-3, 0, 80), (3, 0, 100)],
        );

        assert_eq!(result, None);
        assert_eq!(recognizer.pending_reversals(), 0);
    }

    #[test]
    fn test_vertical_shake() {
        let mut recognizer = ShakeRecognizer::new();
        let result = feed(
            &mut recognizer,
            &[(0, 0, 0), (0, 40, 80), (0, 0, 160), (0, 40, 240), (0, 0, 320)],
        );
        assert_eq!(result, Some(GestureKind::ShakeVertical));
    }
}
