//! Key state tracking and US-layout character translation.

use bit_field::BitField;
use log::debug;

use super::vkey::{KeyEvent, VirtualKey};

/// 键盘指示灯
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Leds {
    pub scroll_lock: bool,
    pub num_lock: bool,
    pub caps_lock: bool,
}

impl Leds {
    /// Parameter byte of the set-LEDs command.
    pub fn bits(self) -> u8 {
        let mut bits = 0u8;
        bits.set_bit(0, self.scroll_lock);
        bits.set_bit(1, self.num_lock);
        bits.set_bit(2, self.caps_lock);
        bits
    }
}

/// Which keys are down, lock state, and press → character translation.
#[derive(Clone, Debug)]
pub struct KeyState {
    /// 每个vkey一位
    down: [u64; 4],
    leds: Leds,
    led_changed: bool,
}

impl KeyState {
    /// Num Lock starts on, everything else off.
    pub fn new() -> Self {
        Self {
            down: [0; 4],
            leds: Leds {
                num_lock: true,
                ..Leds::default()
            },
            led_changed: false,
        }
    }

    pub fn is_down(&self, vkey: VirtualKey) -> bool {
        let code = vkey.code() as usize;
        self.down[code / 64].get_bit(code % 64)
    }

    pub fn shift(&self) -> bool {
        self.is_down(VirtualKey::LeftShift) || self.is_down(VirtualKey::RightShift)
    }

    pub fn ctrl(&self) -> bool {
        self.is_down(VirtualKey::LeftCtrl) || self.is_down(VirtualKey::RightCtrl)
    }

    pub fn alt(&self) -> bool {
        self.is_down(VirtualKey::LeftAlt) || self.is_down(VirtualKey::RightAlt)
    }

    pub fn leds(&self) -> Leds {
        self.leds
    }

    /// New LED state if a lock key toggled since the last call.
    pub fn take_led_change(&mut self) -> Option<Leds> {
        core::mem::take(&mut self.led_changed).then_some(self.leds)
    }

    /// Record `event`; returns the typed character for presses that produce one.
    pub fn process(&mut self, event: KeyEvent) -> Option<char> {
        let code = event.vkey.code() as usize;
        self.down[code / 64].set_bit(code % 64, event.pressed);

        if !event.pressed {
            return None;
        }

        let lock = match event.vkey {
            VirtualKey::CapsLock => Some(&mut self.leds.caps_lock),
            VirtualKey::NumLock => Some(&mut self.leds.num_lock),
            VirtualKey::ScrollLock => Some(&mut self.leds.scroll_lock),
            _ => None,
        };
        if let Some(flag) = lock {
            *flag = !*flag;
            self.led_changed = true;
            debug!("lock keys changed: {:?}", self.leds);
        }

        self.translate(event.vkey)
    }

    fn translate(&self, vkey: VirtualKey) -> Option<char> {
        use VirtualKey::*;

        let code = vkey.code();
        let shift = self.shift();

        if (A.code()..=Z.code()).contains(&code) {
            if self.ctrl() {
                // Ctrl+字母产生控制字符
                return Some(char::from(code & 0x1F));
            }
            let upper = shift != self.leds.caps_lock;
            let c = char::from(code);
            return Some(if upper { c } else { c.to_ascii_lowercase() });
        }

        if (Digit0.code()..=Digit9.code()).contains(&code) {
            if !shift {
                return Some(char::from(code));
            }
            let shifted = b")!@#$%^&*(";
            return Some(char::from(shifted[(code - Digit0.code()) as usize]));
        }

        if (Numpad0.code()..=Numpad9.code()).contains(&code) {
            return self
                .leds
                .num_lock
                .then(|| char::from(b'0' + (code - Numpad0.code())));
        }

        let (plain, shifted) = match vkey {
            Space => (' ', ' '),
            Enter => ('\n', '\n'),
            Tab => ('\t', '\t'),
            Backspace => ('\x08', '\x08'),
            Escape => ('\x1B', '\x1B'),
            Minus => ('-', '_'),
            Equals => ('=', '+'),
            LeftBracket => ('[', '{'),
            RightBracket => (']', '}'),
            Backslash => ('\\', '|'),
            Semicolon => (';', ':'),
            Quote => ('\'', '"'),
            Backquote => ('`', '~'),
            Comma => (',', '<'),
            Period => ('.', '>'),
            Slash => ('/', '?'),
            NumpadMultiply => ('*', '*'),
            NumpadAdd => ('+', '+'),
            NumpadSubtract => ('-', '-'),
            NumpadDivide => ('/', '/'),
            NumpadDecimal if self.leds.num_lock => ('.', '.'),
            _ => return None,
        };
        Some(if shift { shifted } else { plain })
    }
}

impl Default for KeyState {
    fn default() -> Self {
        Self::new()
    }
}
