//! PS/2 扫描码解码
//!
//! [`Ps2Decoder`] turns raw keyboard bytes into [`KeyEvent`]s. It owns no
//! hardware and does no I/O: one call per byte, fully determined by the
//! current state and the byte.

use core::fmt;

use log::trace;

pub use detect::{detect, Detection, ScanSetDetector};
pub use keymap::{KeyState, Leds};
pub use vkey::{KeyEvent, VirtualKey};

pub mod command;
mod detect;
mod keymap;
pub mod scancodes;
mod vkey;

/// Set-2 release marker.
pub const RELEASE: u8 = 0xF0;
/// Extended key prefix.
pub const EXTENDED: u8 = 0xE0;
/// Pause key escape.
pub const PAUSE: u8 = 0xE1;

/// 扫描码集
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ScanCodeSet {
    /// Release is the high bit of the code (`0x1E` / `0x9E`).
    Set1,
    /// Release is a `0xF0` byte before the code (`0x1C` / `0xF0 0x1C`).
    Set2,
}

impl ScanCodeSet {
    pub const fn from_number(n: u8) -> Option<Self> {
        match n {
            1 => Some(ScanCodeSet::Set1),
            2 => Some(ScanCodeSet::Set2),
            _ => None,
        }
    }

    pub const fn number(self) -> u8 {
        match self {
            ScanCodeSet::Set1 => 1,
            ScanCodeSet::Set2 => 2,
        }
    }

    /// Bytes of the Pause sequence that follow the `0xE1` escape.
    pub const fn pause_tail_len(self) -> u8 {
        match self {
            // E1 1D 45 E1 9D C5
            ScanCodeSet::Set1 => 5,
            // E1 14 77 E1 F0 14 F0 77
            ScanCodeSet::Set2 => 7,
        }
    }
}

impl fmt::Display for ScanCodeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "scan code set {}", self.number())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    Normal,
    /// `0xE0` seen; the next code is looked up in the extended space.
    ExtendedPrefixSeen,
    /// Swallow this many more bytes.
    IgnoringBytes(u8),
}

/// What a single byte did to the decoder.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Decoded {
    Event(KeyEvent),
    /// A prefix or marker byte; more bytes are needed.
    Pending,
    /// Consumed by the Pause ignore window.
    Ignored,
    /// Unrecognized scan code (full code, extended prefix included). The
    /// decoder is back in [`Mode::Normal`].
    Dropped(u16),
}

#[derive(Clone, Debug)]
pub struct Ps2Decoder {
    mode: Mode,
    /// 下一个扫描码为松开（仅扫描码集2）
    release_pending: bool,
    set: ScanCodeSet,
}

impl Ps2Decoder {
    pub const fn new(set: ScanCodeSet) -> Self {
        Self {
            mode: Mode::Normal,
            release_pending: false,
            set,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn release_pending(&self) -> bool {
        self.release_pending
    }

    pub fn scan_set(&self) -> ScanCodeSet {
        self.set
    }

    /// Switch scan code sets; any partial sequence is forgotten.
    pub fn set_scan_set(&mut self, set: ScanCodeSet) {
        self.set = set;
        self.reset();
    }

    pub fn reset(&mut self) {
        self.mode = Mode::Normal;
        self.release_pending = false;
    }

    /// Feed one byte; returns a key event once a sequence completes.
    pub fn push_byte(&mut self, raw: u8) -> Option<KeyEvent> {
        match self.advance(raw) {
            Decoded::Event(event) => Some(event),
            _ => None,
        }
    }

    /// [`Self::push_byte`] with the reason when no event is produced.
    pub fn advance(&mut self, raw: u8) -> Decoded {
        if let Mode::IgnoringBytes(n) = self.mode {
            self.mode = if n <= 1 {
                Mode::Normal
            } else {
                Mode::IgnoringBytes(n - 1)
            };
            return Decoded::Ignored;
        }

        match raw {
            RELEASE if self.set == ScanCodeSet::Set2 => {
                self.release_pending = true;
                return Decoded::Pending;
            }
            EXTENDED => {
                if self.mode == Mode::ExtendedPrefixSeen {
                    // 连续的0xE0前缀不做猜测，按未识别处理
                    trace!("dropping repeated extended prefix");
                    self.reset();
                    return Decoded::Dropped(0xE0E0);
                }
                self.mode = Mode::ExtendedPrefixSeen;
                return Decoded::Pending;
            }
            PAUSE => {
                // Pause没有松开事件
                self.release_pending = false;
                self.mode = Mode::IgnoringBytes(self.set.pause_tail_len());
                return Decoded::Event(KeyEvent::pressed(VirtualKey::Pause));
            }
            _ => {}
        }

        let mut code = u16::from(raw);
        if self.mode == Mode::ExtendedPrefixSeen {
            code |= u16::from(EXTENDED) << 8;
        }
        let pressed = match self.set {
            ScanCodeSet::Set1 => {
                code &= !0x80;
                raw & 0x80 == 0
            }
            ScanCodeSet::Set2 => !self.release_pending,
        };
        self.reset();

        match scancodes::lookup(self.set, code) {
            Some(vkey) => Decoded::Event(KeyEvent::new(vkey, pressed)),
            None => {
                trace!("dropping unrecognized scan code {:#06x}", code);
                Decoded::Dropped(code)
            }
        }
    }

    /// Lazily decode `bytes`, yielding only completed key events.
    pub fn decode<I>(&mut self, bytes: I) -> KeyEvents<'_, I::IntoIter>
    where
        I: IntoIterator<Item = u8>,
    {
        KeyEvents {
            decoder: self,
            bytes: bytes.into_iter(),
        }
    }
}

impl Default for Ps2Decoder {
    fn default() -> Self {
        Self::new(ScanCodeSet::Set2)
    }
}

/// Iterator returned by [`Ps2Decoder::decode`].
pub struct KeyEvents<'a, I> {
    decoder: &'a mut Ps2Decoder,
    bytes: I,
}

impl<I: Iterator<Item = u8>> Iterator for KeyEvents<'_, I> {
    type Item = KeyEvent;

    fn next(&mut self) -> Option<KeyEvent> {
        let decoder = &mut *self.decoder;
        self.bytes.find_map(|byte| decoder.push_byte(byte))
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec::Vec;

    use super::*;

    fn feed(decoder: &mut Ps2Decoder, bytes: &[u8]) -> Vec<Decoded> {
        bytes.iter().map(|&b| decoder.advance(b)).collect()
    }

    #[test]
    fn test_set2_press_release() {
        let mut decoder = Ps2Decoder::new(ScanCodeSet::Set2);
        assert_eq!(decoder.push_byte(0x1C), Some(KeyEvent::pressed(VirtualKey::A)));
        assert_eq!(decoder.push_byte(0xF0), None);
        assert!(decoder.release_pending());
        assert_eq!(decoder.push_byte(0x1C), Some(KeyEvent::released(VirtualKey::A)));
        assert!(!decoder.release_pending());
        assert_eq!(decoder.mode(), Mode::Normal);
    }

    #[test]
    fn test_set1_press_release() {
        let mut decoder = Ps2Decoder::new(ScanCodeSet::Set1);
        assert_eq!(decoder.push_byte(0x1E), Some(KeyEvent::pressed(VirtualKey::A)));
        assert_eq!(decoder.push_byte(0x9E), Some(KeyEvent::released(VirtualKey::A)));
    }

    #[test]
    fn test_set1_extended_release() {
        let mut decoder = Ps2Decoder::new(ScanCodeSet::Set1);
        let events: Vec<_> = decoder.decode([0xE0, 0x48, 0xE0, 0xC8]).collect();
        assert_eq!(
            events,
            [KeyEvent::pressed(VirtualKey::Up), KeyEvent::released(VirtualKey::Up)]
        );
    }

    #[test]
    fn test_set2_extended_release() {
        let mut decoder = Ps2Decoder::new(ScanCodeSet::Set2);
        let events: Vec<_> = decoder.decode([0xE0, 0x75, 0xE0, 0xF0, 0x75]).collect();
        assert_eq!(
            events,
            [KeyEvent::pressed(VirtualKey::Up), KeyEvent::released(VirtualKey::Up)]
        );
    }

    #[test]
    fn test_set1_treats_f0_as_code() {
        let mut decoder = Ps2Decoder::new(ScanCodeSet::Set1);
        assert_eq!(decoder.advance(0xF0), Decoded::Dropped(0x70));
        assert!(!decoder.release_pending());
    }

    #[test]
    fn test_pause_window_set2() {
        let mut decoder = Ps2Decoder::new(ScanCodeSet::Set2);
        let out = feed(&mut decoder, &[0xE1, 0x14, 0x77, 0xE1, 0xF0, 0x14, 0xF0, 0x77]);
        assert_eq!(out[0], Decoded::Event(KeyEvent::pressed(VirtualKey::Pause)));
        assert!(out[1..].iter().all(|d| *d == Decoded::Ignored));
        assert_eq!(decoder.mode(), Mode::Normal);
        assert_eq!(decoder.push_byte(0x1C), Some(KeyEvent::pressed(VirtualKey::A)));
    }

    #[test]
    fn test_pause_window_set1() {
        let mut decoder = Ps2Decoder::new(ScanCodeSet::Set1);
        assert_eq!(decoder.push_byte(0xE1), Some(KeyEvent::pressed(VirtualKey::Pause)));
        assert_eq!(decoder.mode(), Mode::IgnoringBytes(5));
        // 窗口内的字节无论取值都被忽略
        for b in [0x1E, 0xE0, 0xE1, 0x9E, 0xF0] {
            assert_eq!(decoder.advance(b), Decoded::Ignored);
        }
        assert_eq!(decoder.push_byte(0x1E), Some(KeyEvent::pressed(VirtualKey::A)));
    }

    #[test]
    fn test_unknown_code_recovers() {
        let mut decoder = Ps2Decoder::new(ScanCodeSet::Set2);
        assert_eq!(decoder.advance(0xF0), Decoded::Pending);
        assert_eq!(decoder.advance(0x02), Decoded::Dropped(0x02));
        assert!(!decoder.release_pending());
        assert_eq!(decoder.push_byte(0x1C), Some(KeyEvent::pressed(VirtualKey::A)));
    }

    #[test]
    fn test_repeated_prefix_dropped() {
        let mut decoder = Ps2Decoder::new(ScanCodeSet::Set1);
        assert_eq!(feed(&mut decoder, &[0xE0, 0xE0]), [Decoded::Pending, Decoded::Dropped(0xE0E0)]);
        assert_eq!(decoder.mode(), Mode::Normal);
        // 0x48 回到基本码表
        assert_eq!(decoder.push_byte(0x48), Some(KeyEvent::pressed(VirtualKey::Numpad8)));
    }

    #[test]
    fn test_print_screen_set2() {
        let mut decoder = Ps2Decoder::new(ScanCodeSet::Set2);
        let events: Vec<_> = decoder.decode([0xE0, 0x12, 0xE0, 0x7C]).collect();
        assert_eq!(events, [KeyEvent::pressed(VirtualKey::PrintScreen)]);
    }

    #[test]
    fn test_set_scan_set_resets() {
        let mut decoder = Ps2Decoder::new(ScanCodeSet::Set2);
        decoder.push_byte(0xE0);
        decoder.push_byte(0xF0);
        decoder.set_scan_set(ScanCodeSet::Set1);
        assert_eq!(decoder.mode(), Mode::Normal);
        assert!(!decoder.release_pending());
        assert_eq!(decoder.scan_set(), ScanCodeSet::Set1);
    }

    #[test]
    fn test_scan_set_numbers() {
        assert_eq!(ScanCodeSet::from_number(1), Some(ScanCodeSet::Set1));
        assert_eq!(ScanCodeSet::from_number(3), None);
        assert_eq!(ScanCodeSet::Set2.number(), 2);
    }
}
