/// Отсчёт положения курсора с монотонной меткой времени в миллисекундах
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CursorSample {
    pub x: i32,
    pub y: i32,
    pub timestamp_ms: u64,
}

impl CursorSample {
    pub fn new(x: i32, y: i32, timestamp_ms: u64) -> Self {
        Self { x, y, timestamp_ms }
    }
}

/// Ёмкость истории движения: ~1 секунда при 60 Гц
pub const MOTION_HISTORY_CAPACITY: usize = 64;

pub type MotionHistory = RingBuffer<CursorSample, MOTION_HISTORY_CAPACITY>;

/// Кольцевой буфер фиксированной ёмкости. При переполнении затирается самый старый элемент.
/// Вставка и доступ O(1), без аллокаций после создания.
#[derive(Debug, Clone)]
pub struct RingBuffer<T: Copy + Default, const N: usize> {
    items: [T; N],
    // Индекс, куда попадёт следующий элемент
    head: usize,
    len: usize,
}

impl<T: Copy + Default, const N: usize> Default for RingBuffer<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Copy + Default, const N: usize> RingBuffer<T, N> {
    pub fn new() -> Self {
        Self {
            items: [T::default(); N],
            head: 0,
            len: 0,
        }
    }

    pub fn add(&mut self, item: T) {
        if N == 0 {
            return;
        }
        self.items[self.head] = item;
        self.head = (self.head + 1) % N;
        if self.len < N {
            self.len += 1;
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn clear(&mut self) {
        self.head = 0;
        self.len = 0;
    }

    /// `get_by_age(0)` - самый новый элемент, `get_by_age(k)` - k-й от нового к старому
    pub fn get_by_age(&self, age: usize) -> Option<T> {
        if age >= self.len {
            return None;
        }
        let index = (self.head + N - 1 - age) % N;
        Some(self.items[index])
    }

    /// Адресация от самого старого: `get_by_index(0)` - самый старый
    #[allow(dead_code)]
    pub fn get_by_index(&self, index: usize) -> Option<T> {
        if index >= self.len {
            return None;
        }
        let start = (self.head + N - self.len) % N;
        Some(self.items[(start + index) % N])
    }

    pub fn newest(&self) -> Option<T> {
        self.get_by_age(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_buffer() {
        let buffer: RingBuffer<u32, 4> = RingBuffer::new();
        assert!(buffer.is_empty());
        assert_eq!(buffer.newest(), None);
        assert_eq!(buffer.get_by_index(0), None);
    }

    #[test]
    fn test_age_and_index_addressing() {
        let mut buffer: RingBuffer<u32, 4> = RingBuffer::new();
        buffer.add(1);
        buffer.add(2);
        buffer.add(3);

        assert_eq!(buffer.get_by_age(0), Some(3));
        assert_eq!(buffer.get_by_age(2), Some(1));
        assert_eq!(buffer.get_by_age(3), None);
        assert_eq!(buffer.get_by_index(0), Some(1));
        assert_eq!(buffer.get_by_index(2), Some(3));
    }

    #[test]
    fn test_overflow_overwrites_oldest() {
        let mut buffer: RingBuffer<u32, 4> = RingBuffer::new();
        for value in 1..=6 {
            buffer.add(value);
        }

        assert_eq!(buffer.len(), 4);
        assert_eq!(buffer.get_by_index(0), Some(3));
        assert_eq!(buffer.newest(), Some(6));
        assert_eq!(buffer.get_by_index(3), Some(6));
        assert_eq!(buffer.get_by_age(3), Some(3));
    }

    #[test]
    fn test_clear_resets_history() {
        let mut history = MotionHistory::new();
        history.add(CursorSample::new(1, 2, 3));
        history.clear();
        assert!(history.is_empty());
        assert_eq!(history.newest(), None);

        for i in 0..(MOTION_HISTORY_CAPACITY as i32 + 1) {
            history.add(CursorSample::new(i, 0, i as u64));
        }
        assert_eq!(history.len(), MOTION_HISTORY_CAPACITY);
    }
}
