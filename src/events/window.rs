use serde::{Deserialize, Serialize};
use std::fmt;

/// Идентификатор окна (X11 window id или id в сухом режиме)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WindowId(pub u64);

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:x}", self.0)
    }
}

/// Точка в координатах рабочего стола
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Геометрия окна или монитора
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }

    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x && point.x < self.right() && point.y >= self.y && point.y < self.bottom()
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2, self.y + self.height / 2)
    }

    /// Пересечение прямоугольников, `None` если они не пересекаются
    pub fn intersect(&self, other: &Rect) -> Option<Rect> {
        let left = self.x.max(other.x);
        let top = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        if right <= left || bottom <= top {
            return None;
        }
        Some(Rect::new(left, top, right - left, bottom - top))
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}+{}+{}", self.width, self.height, self.x, self.y)
    }
}

/// Монитор: полные границы и рабочая область (без панелей)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Monitor {
    pub bounds: Rect,
    pub work_area: Rect,
}

impl Monitor {
    pub fn new(bounds: Rect, work_area: Rect) -> Self {
        Self { bounds, work_area }
    }

    #[allow(dead_code)]
    pub fn full(bounds: Rect) -> Self {
        Self::new(bounds, bounds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_edges_and_contains() {
        let rect = Rect::new(100, 50, 200, 100);
        assert_eq!(rect.right(), 300);
        assert_eq!(rect.bottom(), 150);
        assert!(rect.contains(Point::new(100, 50)));
        assert!(!rect.contains(Point::new(300, 60)));
        assert_eq!(rect.center(), Point::new(200, 100));
    }

    #[test]
    fn test_rect_intersection() {
        let monitor = Rect::new(0, 0, 1920, 1080);
        let workarea = Rect::new(0, 32, 3840, 1048);
        assert_eq!(monitor.intersect(&workarea), Some(Rect::new(0, 32, 1920, 1048)));

        let far = Rect::new(5000, 0, 10, 10);
        assert_eq!(monitor.intersect(&far), None);
    }
}
