//! Scan code → virtual key tables.
//!
//! Codes are `u16`: plain codes are the byte itself, extended codes carry the
//! `0xE0` prefix in the high byte (`0xE048`). Set 1 codes are looked up with
//! the release bit already masked off.

use super::vkey::VirtualKey::{self, *};
use super::ScanCodeSet;

pub fn lookup(set: ScanCodeSet, code: u16) -> Option<VirtualKey> {
    match set {
        ScanCodeSet::Set1 => set1(code),
        ScanCodeSet::Set2 => set2(code),
    }
}

fn set1(code: u16) -> Option<VirtualKey> {
    let vkey = match code {
        0x01 => Escape,
        0x02 => Digit1,
        0x03 => Digit2,
        0x04 => Digit3,
        0x05 => Digit4,
        0x06 => Digit5,
        0x07 => Digit6,
        0x08 => Digit7,
        0x09 => Digit8,
        0x0A => Digit9,
        0x0B => Digit0,
        0x0C => Minus,
        0x0D => Equals,
        0x0E => Backspace,
        0x0F => Tab,
        0x10 => Q,
        0x11 => W,
        0x12 => E,
        0x13 => R,
        0x14 => T,
        0x15 => Y,
        0x16 => U,
        0x17 => I,
        0x18 => O,
        0x19 => P,
        0x1A => LeftBracket,
        0x1B => RightBracket,
        0x1C => Enter,
        0x1D => LeftCtrl,
        0x1E => A,
        0x1F => S,
        0x20 => D,
        0x21 => F,
        0x22 => G,
        0x23 => H,
        0x24 => J,
        0x25 => K,
        0x26 => L,
        0x27 => Semicolon,
        0x28 => Quote,
        0x29 => Backquote,
        0x2A => LeftShift,
        0x2B => Backslash,
        0x2C => Z,
        0x2D => X,
        0x2E => C,
        0x2F => V,
        0x30 => B,
        0x31 => N,
        0x32 => M,
        0x33 => Comma,
        0x34 => Period,
        0x35 => Slash,
        0x36 => RightShift,
        0x37 => NumpadMultiply,
        0x38 => LeftAlt,
        0x39 => Space,
        0x3A => CapsLock,
        0x3B => F1,
        0x3C => F2,
        0x3D => F3,
        0x3E => F4,
        0x3F => F5,
        0x40 => F6,
        0x41 => F7,
        0x42 => F8,
        0x43 => F9,
        0x44 => F10,
        0x45 => NumLock,
        0x46 => ScrollLock,
        0x47 => Numpad7,
        0x48 => Numpad8,
        0x49 => Numpad9,
        0x4A => NumpadSubtract,
        0x4B => Numpad4,
        0x4C => Numpad5,
        0x4D => Numpad6,
        0x4E => NumpadAdd,
        0x4F => Numpad1,
        0x50 => Numpad2,
        0x51 => Numpad3,
        0x52 => Numpad0,
        0x53 => NumpadDecimal,
        0x57 => F11,
        0x58 => F12,

        0xE01C => Enter,
        0xE01D => RightCtrl,
        0xE035 => NumpadDivide,
        0xE037 => PrintScreen,
        0xE038 => RightAlt,
        0xE047 => Home,
        0xE048 => Up,
        0xE049 => PageUp,
        0xE04B => Left,
        0xE04D => Right,
        0xE04F => End,
        0xE050 => Down,
        0xE051 => PageDown,
        0xE052 => Insert,
        0xE053 => Delete,
        0xE05B => LeftGui,
        0xE05C => RightGui,
        0xE05D => Apps,
        _ => return None,
    };
    Some(vkey)
}

fn set2(code: u16) -> Option<VirtualKey> {
    let vkey = match code {
        0x01 => F9,
        0x03 => F5,
        0x04 => F3,
        0x05 => F1,
        0x06 => F2,
        0x07 => F12,
        0x09 => F10,
        0x0A => F8,
        0x0B => F6,
        0x0C => F4,
        0x0D => Tab,
        0x0E => Backquote,
        0x11 => LeftAlt,
        0x12 => LeftShift,
        0x14 => LeftCtrl,
        0x15 => Q,
        0x16 => Digit1,
        0x1A => Z,
        0x1B => S,
        0x1C => A,
        0x1D => W,
        0x1E => Digit2,
        0x21 => C,
        0x22 => X,
        0x23 => D,
        0x24 => E,
        0x25 => Digit4,
        0x26 => Digit3,
        0x29 => Space,
        0x2A => V,
        0x2B => F,
        0x2C => T,
        0x2D => R,
        0x2E => Digit5,
        0x31 => N,
        0x32 => B,
        0x33 => H,
        0x34 => G,
        0x35 => Y,
        0x36 => Digit6,
        0x3A => M,
        0x3B => J,
        0x3C => U,
        0x3D => Digit7,
        0x3E => Digit8,
        0x41 => Comma,
        0x42 => K,
        0x43 => I,
        0x44 => O,
        0x45 => Digit0,
        0x46 => Digit9,
        0x49 => Period,
        0x4A => Slash,
        0x4B => L,
        0x4C => Semicolon,
        0x4D => P,
        0x4E => Minus,
        0x52 => Quote,
        0x54 => LeftBracket,
        0x55 => Equals,
        0x58 => CapsLock,
        0x59 => RightShift,
        0x5A => Enter,
        0x5B => RightBracket,
        0x5D => Backslash,
        0x66 => Backspace,
        0x69 => Numpad1,
        0x6B => Numpad4,
        0x6C => Numpad7,
        0x70 => Numpad0,
        0x71 => NumpadDecimal,
        0x72 => Numpad2,
        0x73 => Numpad5,
        0x74 => Numpad6,
        0x75 => Numpad8,
        0x76 => Escape,
        0x77 => NumLock,
        0x78 => F11,
        0x79 => NumpadAdd,
        0x7A => Numpad3,
        0x7B => NumpadSubtract,
        0x7C => NumpadMultiply,
        0x7D => Numpad9,
        0x7E => ScrollLock,
        0x83 => F7,

        0xE011 => RightAlt,
        0xE014 => RightCtrl,
        0xE01F => LeftGui,
        0xE027 => RightGui,
        0xE02F => Apps,
        0xE04A => NumpadDivide,
        0xE05A => Enter,
        0xE069 => End,
        0xE06B => Left,
        0xE06C => Home,
        0xE070 => Insert,
        0xE071 => Delete,
        0xE072 => Down,
        0xE074 => Right,
        0xE075 => Up,
        0xE07A => PageDown,
        0xE07C => PrintScreen,
        0xE07D => PageUp,
        _ => return None,
    };
    Some(vkey)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_letter_a_in_both_sets() {
        assert_eq!(lookup(ScanCodeSet::Set1, 0x1E), Some(A));
        assert_eq!(lookup(ScanCodeSet::Set2, 0x1C), Some(A));
    }

    #[test]
    fn test_extended_space_is_separate() {
        assert_eq!(lookup(ScanCodeSet::Set1, 0x48), Some(Numpad8));
        assert_eq!(lookup(ScanCodeSet::Set1, 0xE048), Some(Up));
        assert_eq!(lookup(ScanCodeSet::Set2, 0x75), Some(Numpad8));
        assert_eq!(lookup(ScanCodeSet::Set2, 0xE075), Some(Up));
    }

    #[test]
    fn test_fake_shift_is_unmapped() {
        // Print Screen 前缀中的假shift
        assert_eq!(lookup(ScanCodeSet::Set1, 0xE02A), None);
        assert_eq!(lookup(ScanCodeSet::Set2, 0xE012), None);
    }
}
