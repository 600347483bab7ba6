//! Перетаскивание и изменение размера окна по опросу курсора.
//!
//! Idle -> Move/Resize, Move <-> Resize без скачка (пересчёт опорной точки),
//! любое -> Idle при отпускании отслеживаемой клавиши.

use crate::error::Result;
use crate::events::{KeyCode, Modifiers, Point, Rect, WindowId};
use crate::platform::CursorSource;
use crate::services::window_manipulator::WindowManipulator;
use crate::{debug_if_enabled, trace_if_enabled};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DragMode {
    #[default]
    Idle,
    Move,
    Resize,
}

impl fmt::Display for DragMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DragMode::Idle => write!(f, "idle"),
            DragMode::Move => write!(f, "move"),
            DragMode::Resize => write!(f, "resize"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DragSettings {
    pub min_width: i32,
    pub min_height: i32,
}

impl Default for DragSettings {
    fn default() -> Self {
        Self {
            min_width: 160,
            min_height: 120,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct ActiveDrag {
    mode: DragMode,
    window: WindowId,
    origin_cursor: Point,
    origin_rect: Rect,
    last_cursor: Point,
    last_applied: Rect,
    work_area: Option<Rect>,
    modifiers: Modifiers,
    trigger_key: Option<KeyCode>,
}

/// Итог завершённого перетаскивания
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DragEnd {
    pub mode: DragMode,
    pub window: WindowId,
    /// Последняя позиция курсора, увиденная во время опроса
    pub last_cursor: Point,
}

pub struct DragHandler {
    cursor: Arc<dyn CursorSource>,
    manipulator: WindowManipulator,
    settings: DragSettings,
    drag: Option<ActiveDrag>,
}

impl DragHandler {
    pub fn new(cursor: Arc<dyn CursorSource>, manipulator: WindowManipulator, settings: DragSettings) -> Self {
        Self {
            cursor,
            manipulator,
            settings,
            drag: None,
        }
    }

    pub fn set_settings(&mut self, settings: DragSettings) {
        self.settings = settings;
    }

    pub fn mode(&self) -> DragMode {
        self.drag.map(|d| d.mode).unwrap_or_default()
    }

    pub fn is_active(&self) -> bool {
        self.drag.is_some()
    }

    pub fn window(&self) -> Option<WindowId> {
        self.drag.map(|d| d.window)
    }

    /// Начинает перетаскивание или переключает режим текущего.
    /// При переключении окно остаётся прежним, опорные точки берутся из текущего состояния.
    pub fn start(
        &mut self,
        mode: DragMode,
        window: WindowId,
        modifiers: Modifiers,
        trigger_key: Option<KeyCode>,
    ) -> Result<()> {
        if mode == DragMode::Idle {
            self.end();
            return Ok(());
        }

        let cursor = self.cursor.cursor_position()?;

        if let Some(drag) = self.drag.as_mut() {
            let rect = self.manipulator.rect(drag.window)?;
            // За время перемещения окно могло уйти на другой монитор
            let work_area = self.manipulator.monitor_of(drag.window)?.map(|m| m.work_area);
            debug!("Переключение режима {} -> {} для окна {}", drag.mode, mode, drag.window);
            drag.mode = mode;
            drag.origin_cursor = cursor;
            drag.origin_rect = rect;
            drag.last_cursor = cursor;
            drag.last_applied = rect;
            drag.work_area = work_area;
            drag.modifiers |= modifiers;
            drag.trigger_key = trigger_key;
            return Ok(());
        }

        if self.manipulator.ensure_normal(window)? {
            debug!("Окно {} было развёрнуто, восстановлено перед перетаскиванием", window);
        }
        let rect = self.manipulator.rect(window)?;
        let work_area = self.manipulator.monitor_of(window)?.map(|m| m.work_area);

        debug!("Начато перетаскивание {} окна {} из {}", mode, window, rect);
        self.drag = Some(ActiveDrag {
            mode,
            window,
            origin_cursor: cursor,
            origin_rect: rect,
            last_cursor: cursor,
            last_applied: rect,
            work_area,
            modifiers,
            trigger_key,
        });
        Ok(())
    }

    /// Один шаг опроса. Без активного перетаскивания ничего не делает.
    pub fn tick(&mut self) -> Result<()> {
        let Some(drag) = self.drag.as_mut() else {
            return Ok(());
        };

        let cursor = self.cursor.cursor_position()?;
        drag.last_cursor = cursor;

        let dx = cursor.x - drag.origin_cursor.x;
        let dy = cursor.y - drag.origin_cursor.y;
        let origin = drag.origin_rect;

        let target = match drag.mode {
            DragMode::Move => Rect::new(origin.x + dx, origin.y + dy, origin.width, origin.height),
            DragMode::Resize => {
                // Граница ограничивает только рост: окно, уже выходящее за рабочую
                // область, сохраняет свой размер, пока его не уменьшат
                let max_width = drag
                    .work_area
                    .map(|area| (area.right() - origin.x).max(origin.width))
                    .unwrap_or(i32::MAX)
                    .max(self.settings.min_width);
                let max_height = drag
                    .work_area
                    .map(|area| (area.bottom() - origin.y).max(origin.height))
                    .unwrap_or(i32::MAX)
                    .max(self.settings.min_height);

                let raw_width = origin.width + dx;
                let raw_height = origin.height + dy;
                let width = raw_width.clamp(self.settings.min_width, max_width);
                let height = raw_height.clamp(self.settings.min_height, max_height);

                // Перенос опорной точки на величину выхода за границу:
                // разворот движения сразу меняет размер, без "мёртвой зоны"
                drag.origin_cursor.x += raw_width - width;
                drag.origin_cursor.y += raw_height - height;

                Rect::new(origin.x, origin.y, width, height)
            }
            DragMode::Idle => return Ok(()),
        };

        if target == drag.last_applied {
            return Ok(());
        }

        trace_if_enabled!("Шаг перетаскивания {}: {} -> {}", drag.mode, cursor, target);
        drag.last_applied = target;
        self.manipulator.set_rect(drag.window, target)
    }

    /// Отпускание клавиши завершает перетаскивание, если клавиша отслеживается:
    /// текущая клавиша-триггер или любой из модификаторов перетаскивания.
    pub fn on_key_released(&mut self, key: KeyCode) -> Option<DragEnd> {
        let drag = self.drag?;
        let tracked = match key.modifier() {
            Some(flag) => drag.modifiers.contains(flag),
            None => drag.trigger_key == Some(key),
        };
        if !tracked {
            return None;
        }
        debug_if_enabled!("Отпущена клавиша {}, перетаскивание завершено", key);
        self.end()
    }

    pub fn end(&mut self) -> Option<DragEnd> {
        let drag = self.drag.take()?;
        Some(DragEnd {
            mode: drag.mode,
            window: drag.window,
            last_cursor: drag.last_cursor,
        })
    }
}
