//! История движения курсора и распознаватели жестов поверх неё.
//!
//! Распознаватели swipe и edge flick не хранят состояние между вызовами,
//! shake - единственный с памятью (развороты направления).

pub mod edge_flick;
pub mod ring_buffer;
pub mod shake;
pub mod swipe;

pub use edge_flick::{EdgeFlickParams, EdgeFlickRecognizer};
pub use ring_buffer::{CursorSample, MotionHistory, RingBuffer};
pub use shake::{ShakeParams, ShakeRecognizer};
pub use swipe::{SwipeParams, SwipeRecognizer};

use crate::bindings::GestureParams;

/// Один кадр при 60 Гц. Меньший интервал даёт взрывной рост скорости.
pub const MIN_ELAPSED_MS: u64 = 16;

pub(crate) fn param(params: Option<&GestureParams>, key: &str, default: f64) -> f64 {
    params.and_then(|p| p.get(key)).copied().unwrap_or(default)
}

/// Самый старый отсчёт внутри окна `window_ms`, отсчитанного от самого нового
pub(crate) fn oldest_within(history: &MotionHistory, window_ms: u64) -> Option<(CursorSample, CursorSample)> {
    let newest = history.newest()?;
    let mut oldest = newest;
    for age in 1..history.len() {
        match history.get_by_age(age) {
            Some(sample) if newest.timestamp_ms.saturating_sub(sample.timestamp_ms) <= window_ms => {
                oldest = sample;
            }
            _ => break,
        }
    }
    Some((oldest, newest))
}
