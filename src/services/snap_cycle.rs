use crate::actions::SnapDirection;
use crate::error::Result;
use crate::events::{Rect, WindowId};
use crate::services::window_manipulator::WindowManipulator;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SnapCycleState {
    window: WindowId,
    direction: SnapDirection,
    index: usize,
}

/// Повторная привязка того же окна в ту же сторону перебирает доли ширины
/// рабочей области; смена окна или стороны начинает цикл заново.
#[derive(Debug)]
pub struct SnapCycleTracker {
    fractions: Vec<f64>,
    state: Option<SnapCycleState>,
}

impl SnapCycleTracker {
    pub fn new(fractions: Vec<f64>) -> Self {
        Self { fractions, state: None }
    }

    pub fn set_fractions(&mut self, fractions: Vec<f64>) {
        self.fractions = fractions;
        self.state = None;
    }

    /// Индекс доли для очередного вызова
    pub fn advance(&mut self, window: WindowId, direction: SnapDirection) -> usize {
        let index = match self.state {
            Some(state) if state.window == window && state.direction == direction => {
                (state.index + 1) % self.fractions.len().max(1)
            }
            _ => 0,
        };
        self.state = Some(SnapCycleState {
            window,
            direction,
            index,
        });
        index
    }

    pub fn reset(&mut self) {
        self.state = None;
    }

    /// Сброс, только если цикл относится к этому окну
    pub fn reset_for(&mut self, window: WindowId) {
        if self.state.is_some_and(|s| s.window == window) {
            self.state = None;
        }
    }

    pub fn target_rect(&self, work_area: Rect, direction: SnapDirection, index: usize) -> Rect {
        let fraction = self.fractions.get(index).copied().unwrap_or(0.5);
        let width = (work_area.width as f64 * fraction).round() as i32;
        let x = match direction {
            SnapDirection::Left => work_area.x,
            SnapDirection::Right => work_area.right() - width,
        };
        Rect::new(x, work_area.y, width, work_area.height)
    }

    /// Привязывает окно к краю рабочей области, продвигая цикл
    pub fn snap(&mut self, manipulator: &WindowManipulator, window: WindowId, direction: SnapDirection) -> Result<Rect> {
        manipulator.ensure_normal(window)?;
        let Some(monitor) = manipulator.monitor_of(window)? else {
            return Err(crate::grip_error!(backend, "нет монитора для окна {}", window));
        };

        let index = self.advance(window, direction);
        let rect = self.target_rect(monitor.work_area, direction, index);
        debug!("Привязка окна {} {:?}: шаг {} -> {}", window, direction, index, rect);
        manipulator.set_rect(window, rect)?;
        Ok(rect)
    }
}
