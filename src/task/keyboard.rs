//! 键盘中断侧的缓冲
//!
//! The interrupt handler reads one byte from the controller, parks it in a
//! bounded queue and raises the keyboard line. The event loop later drains
//! the queue through a [`ScancodeReader`].

use alloc::sync::Arc;

use conquer_once::spin::OnceCell;
use crossbeam::queue::ArrayQueue;
use log::warn;

use crate::config::{Config, ScanSetSelection};
use crate::error::DetectError;
use crate::io::ByteSource;
use crate::keyboard::{detect, ScanCodeSet};

/// 键盘的IRQ线路
pub const KEYBOARD_IRQ: u8 = 1;

static SCANCODE_QUEUE: OnceCell<ScancodeQueue> = OnceCell::uninit();

/// Producer side of the scancode buffer.
#[derive(Clone)]
pub struct ScancodeQueue {
    queue: Arc<ArrayQueue<u8>>,
}

impl ScancodeQueue {
    pub fn new(depth: usize) -> Self {
        Self {
            queue: Arc::new(ArrayQueue::new(depth.max(1))),
        }
    }

    /// Queue a byte; a full queue drops it.
    pub fn push(&self, scancode: u8) -> bool {
        if self.queue.push(scancode).is_err() {
            warn!("警告：键盘扫描码队列已满; 正在丢弃键盘输入");
            return false;
        }
        true
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn reader(&self) -> ScancodeReader {
        ScancodeReader {
            queue: self.queue.clone(),
        }
    }
}

/// Consumer side of the scancode buffer.
pub struct ScancodeReader {
    queue: Arc<ArrayQueue<u8>>,
}

impl ByteSource for ScancodeReader {
    fn try_read_byte(&mut self) -> Option<u8> {
        self.queue.pop()
    }
}

/// Set up the global queue used by [`add_scancode`].
///
/// Later calls return another reader for the queue created first.
pub fn init(config: &Config) -> ScancodeReader {
    SCANCODE_QUEUE
        .get_or_init(|| ScancodeQueue::new(config.scancode_queue_depth))
        .reader()
}

pub fn add_scancode(scancode: u8) {
    if let Ok(queue) = SCANCODE_QUEUE.try_get() {
        queue.push(scancode);
    } else {
        warn!("警告：键盘扫描码队列尚未初始化");
    }
}

/// 键盘中断处理函数
#[cfg(target_arch = "x86_64")]
pub fn keyboard_interrupt_handler() {
    let scancode: u8 = unsafe { x86::io::inb(crate::io::ps2::DATA_PORT) };
    add_scancode(scancode);
    crate::interrupts::raise(KEYBOARD_IRQ);
}

/// Discard everything `source` has buffered; returns how many bytes went.
pub fn flush<B: ByteSource + ?Sized>(source: &mut B) -> usize {
    core::iter::from_fn(|| source.try_read_byte()).count()
}

/// Scan code set for a keyboard: the configured one, or detected from the
/// bytes of one key press.
pub fn select_scan_set<I>(config: &Config, calibration: I) -> Result<ScanCodeSet, DetectError>
where
    I: IntoIterator<Item = u8>,
{
    match config.scan_set {
        ScanSetSelection::Fixed(set) => Ok(set),
        ScanSetSelection::Detect => detect(calibration),
    }
}

#[cfg(test)]
mod tests {
    use alloc::collections::VecDeque;

    use super::*;

    #[test]
    fn test_full_queue_drops_newest() {
        let queue = ScancodeQueue::new(2);
        let mut reader = queue.reader();
        assert!(queue.push(0x1C));
        assert!(queue.push(0xF0));
        assert!(!queue.push(0x1C));
        assert_eq!(queue.len(), 2);

        assert_eq!(reader.try_read_byte(), Some(0x1C));
        assert_eq!(reader.try_read_byte(), Some(0xF0));
        assert_eq!(reader.try_read_byte(), None);
    }

    #[test]
    fn test_global_queue() {
        let mut reader = init(&Config::default());
        add_scancode(0x2A);
        assert_eq!(reader.try_read_byte(), Some(0x2A));
    }

    #[test]
    fn test_flush_counts() {
        let mut bytes: VecDeque<u8> = [0xFA, 0xAA, 0x1C].into_iter().collect();
        assert_eq!(flush(&mut bytes), 3);
        assert_eq!(flush(&mut bytes), 0);
    }

    #[test]
    fn test_select_scan_set() {
        let fixed = Config::default();
        assert_eq!(select_scan_set(&fixed, []), Ok(ScanCodeSet::Set2));

        let detect = Config {
            scan_set: ScanSetSelection::Detect,
            ..Config::default()
        };
        assert_eq!(select_scan_set(&detect, [0xFA, 0x1E, 0x9E]), Ok(ScanCodeSet::Set1));
        assert_eq!(select_scan_set(&detect, []), Err(DetectError::Incomplete));
    }
}
