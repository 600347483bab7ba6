use super::{CursorSource, MonitorSource, WindowBackend};
use crate::error::{GripError, Result};
use crate::events::{Monitor, Point, Rect, WindowId};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::process::Command;
use std::time::{Duration, Instant};
use tracing::debug;

const MONITOR_CACHE_TTL: Duration = Duration::from_secs(2);
const OPACITY_ATOM: &str = "_NET_WM_WINDOW_OPACITY";

/// Окна и мониторы X11 через xdotool, xprop, wmctrl и xrandr
pub struct X11Desktop {
    monitors: Mutex<Option<(Instant, Vec<Monitor>)>>,
}

impl Default for X11Desktop {
    fn default() -> Self {
        Self::new()
    }
}

fn run(program: &str, args: &[&str]) -> Result<String> {
    let output = Command::new(program)
        .args(args)
        .output()
        .map_err(|e| GripError::Backend(format!("{} не найден: {}", program, e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        debug!("{} {:?} вернул ошибку: {}", program, args, stderr.trim());
        return Err(GripError::Backend(format!("{} вернул ошибку: {}", program, stderr.trim())));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Разбор вывода `xdotool ... --shell` (строки KEY=VALUE)
pub fn parse_shell_vars(output: &str) -> HashMap<String, String> {
    output
        .lines()
        .filter_map(|line| line.split_once('='))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .collect()
}

fn shell_int(vars: &HashMap<String, String>, key: &str) -> Result<i64> {
    vars.get(key)
        .ok_or_else(|| crate::grip_error!(parse, "нет поля {}", key))?
        .parse::<i64>()
        .map_err(|e| crate::grip_error!(parse, "поле {}: {}", key, e))
}

/// Разбор `xrandr --listactivemonitors`:
/// ` 0: +*DP-1 2560/597x1440/336+0+0  DP-1`
pub fn parse_xrandr_monitors(output: &str) -> Vec<Rect> {
    output
        .lines()
        .skip_while(|line| line.starts_with("Monitors:"))
        .filter_map(|line| line.split_whitespace().nth(2))
        .filter_map(parse_xrandr_geometry)
        .collect()
}

fn parse_xrandr_geometry(token: &str) -> Option<Rect> {
    let mut parts = token.split('+');
    let size = parts.next()?;
    let x = parts.next()?.parse().ok()?;
    let y = parts.next()?.parse().ok()?;
    let (width, height) = size.split_once('x')?;
    let width = width.split('/').next()?.parse().ok()?;
    let height = height.split('/').next()?.parse().ok()?;
    Some(Rect::new(x, y, width, height))
}

/// Разбор `xprop -root _NET_WORKAREA`, берётся рабочая область первого рабочего стола
pub fn parse_workarea(output: &str) -> Option<Rect> {
    let (_, values) = output.split_once('=')?;
    let numbers: Vec<i32> = values
        .split(',')
        .filter_map(|v| v.trim().parse().ok())
        .take(4)
        .collect();
    match numbers.as_slice() {
        [x, y, width, height] => Some(Rect::new(*x, *y, *width, *height)),
        _ => None,
    }
}

/// Разбор `xprop -id <w> _NET_WM_STATE`
pub fn parse_maximized(output: &str) -> bool {
    output.contains("_NET_WM_STATE_MAXIMIZED_VERT") && output.contains("_NET_WM_STATE_MAXIMIZED_HORZ")
}

/// Разбор `xprop -id <w> _NET_WM_WINDOW_OPACITY`, отсутствие свойства означает 1.0
pub fn parse_opacity(output: &str) -> f64 {
    output
        .split_once('=')
        .and_then(|(_, value)| value.trim().parse::<u64>().ok())
        .map(|raw| raw as f64 / f64::from(u32::MAX))
        .unwrap_or(1.0)
}

impl X11Desktop {
    pub fn new() -> Self {
        Self {
            monitors: Mutex::new(None),
        }
    }

    fn mouse_location(&self) -> Result<HashMap<String, String>> {
        Ok(parse_shell_vars(&run("xdotool", &["getmouselocation", "--shell"])?))
    }

    fn load_monitors(&self) -> Result<Vec<Monitor>> {
        let bounds = parse_xrandr_monitors(&run("xrandr", &["--listactivemonitors"])?);
        let workarea = run("xprop", &["-root", "_NET_WORKAREA"])
            .ok()
            .and_then(|out| parse_workarea(&out));

        let monitors: Vec<Monitor> = bounds
            .into_iter()
            .map(|bounds| {
                let work_area = workarea
                    .and_then(|area| bounds.intersect(&area))
                    .unwrap_or(bounds);
                Monitor::new(bounds, work_area)
            })
            .collect();

        debug!("Обнаружено мониторов: {}", monitors.len());
        Ok(monitors)
    }

    fn monitors(&self) -> Result<Vec<Monitor>> {
        let mut cache = self.monitors.lock();
        if let Some((loaded_at, monitors)) = cache.as_ref() {
            if loaded_at.elapsed() < MONITOR_CACHE_TTL {
                return Ok(monitors.clone());
            }
        }
        let monitors = self.load_monitors()?;
        *cache = Some((Instant::now(), monitors.clone()));
        Ok(monitors)
    }
}

impl CursorSource for X11Desktop {
    fn cursor_position(&self) -> Result<Point> {
        let vars = self.mouse_location()?;
        Ok(Point::new(shell_int(&vars, "X")? as i32, shell_int(&vars, "Y")? as i32))
    }
}

impl MonitorSource for X11Desktop {
    fn monitor_at(&self, point: Point) -> Result<Option<Monitor>> {
        let monitors = self.monitors()?;
        Ok(monitors
            .iter()
            .find(|m| m.bounds.contains(point))
            .or_else(|| monitors.first())
            .copied())
    }
}

impl WindowBackend for X11Desktop {
    fn window_under_cursor(&self) -> Result<Option<WindowId>> {
        let vars = self.mouse_location()?;
        let window = shell_int(&vars, "WINDOW")?;
        Ok((window > 0).then_some(WindowId(window as u64)))
    }

    fn rect(&self, window: WindowId) -> Result<Rect> {
        let id = window.0.to_string();
        let vars = parse_shell_vars(&run("xdotool", &["getwindowgeometry", "--shell", &id])?);
        Ok(Rect::new(
            shell_int(&vars, "X")? as i32,
            shell_int(&vars, "Y")? as i32,
            shell_int(&vars, "WIDTH")? as i32,
            shell_int(&vars, "HEIGHT")? as i32,
        ))
    }

    fn set_rect(&self, window: WindowId, rect: Rect) -> Result<()> {
        let id = window.0.to_string();
        let (x, y) = (rect.x.to_string(), rect.y.to_string());
        let (w, h) = (rect.width.to_string(), rect.height.to_string());
        run("xdotool", &["windowsize", &id, &w, &h, "windowmove", &id, &x, &y])?;
        Ok(())
    }

    fn is_maximized(&self, window: WindowId) -> Result<bool> {
        let id = window.0.to_string();
        Ok(parse_maximized(&run("xprop", &["-id", &id, "_NET_WM_STATE"])?))
    }

    fn maximize(&self, window: WindowId) -> Result<()> {
        let id = format!("0x{:x}", window.0);
        run("wmctrl", &["-i", "-r", &id, "-b", "add,maximized_vert,maximized_horz"])?;
        Ok(())
    }

    fn restore(&self, window: WindowId) -> Result<()> {
        let id = format!("0x{:x}", window.0);
        run("wmctrl", &["-i", "-r", &id, "-b", "remove,maximized_vert,maximized_horz"])?;
        Ok(())
    }

    fn minimize(&self, window: WindowId) -> Result<()> {
        let id = window.0.to_string();
        run("xdotool", &["windowminimize", &id])?;
        Ok(())
    }

    fn opacity(&self, window: WindowId) -> Result<f64> {
        let id = window.0.to_string();
        Ok(parse_opacity(&run("xprop", &["-id", &id, OPACITY_ATOM])?))
    }

    fn set_opacity(&self, window: WindowId, opacity: f64) -> Result<()> {
        let id = window.0.to_string();
        if opacity >= 1.0 {
            run("xprop", &["-id", &id, "-remove", OPACITY_ATOM])?;
        } else {
            let raw = ((opacity.clamp(0.0, 1.0)) * f64::from(u32::MAX)).round() as u64;
            let raw = raw.to_string();
            run("xprop", &["-id", &id, "-f", OPACITY_ATOM, "32c", "-set", OPACITY_ATOM, &raw])?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mouse_location() {
        let vars = parse_shell_vars("X=812\nY=401\nSCREEN=0\nWINDOW=62914566\n");
        assert_eq!(shell_int(&vars, "X").unwrap(), 812);
        assert_eq!(shell_int(&vars, "WINDOW").unwrap(), 62914566);
        assert!(shell_int(&vars, "WIDTH").is_err());
    }

    #[test]
    fn test_parse_xrandr_monitors() {
        let output = "Monitors: 2\n 0: +*DP-1 2560/597x1440/336+0+0  DP-1\n 1: +HDMI-1 1920/527x1080/296+2560+180  HDMI-1\n";
        assert_eq!(
            parse_xrandr_monitors(output),
            vec![Rect::new(0, 0, 2560, 1440), Rect::new(2560, 180, 1920, 1080)]
        );
    }

    #[test]
    fn test_parse_workarea() {
        let output = "_NET_WORKAREA(CARDINAL) = 0, 32, 4480, 1588, 0, 32, 4480, 1588\n";
        assert_eq!(parse_workarea(output), Some(Rect::new(0, 32, 4480, 1588)));
        assert_eq!(parse_workarea("_NET_WORKAREA:  not found.\n"), None);
    }

    #[test]
    fn test_parse_window_state() {
        let maximized = "_NET_WM_STATE(ATOM) = _NET_WM_STATE_MAXIMIZED_VERT, _NET_WM_STATE_MAXIMIZED_HORZ\n";
        assert!(parse_maximized(maximized));
        assert!(!parse_maximized("_NET_WM_STATE(ATOM) = _NET_WM_STATE_MAXIMIZED_VERT\n"));
    }

    #[test]
    fn test_parse_opacity() {
        assert_eq!(parse_opacity("_NET_WM_WINDOW_OPACITY:  not found.\n"), 1.0);
        let half = parse_opacity("_NET_WM_WINDOW_OPACITY(CARDINAL) = 2147483648\n");
        assert!((half - 0.5).abs() < 0.001);
    }
}
