//! Keyboard command bytes and responses used during bring-up.

use super::{Leds, ScanCodeSet};

pub const ACK: u8 = 0xFA;
pub const RESEND: u8 = 0xFE;
/// Basic Assurance Test passed.
pub const BAT_OK: u8 = 0xAA;
pub const ECHO: u8 = 0xEE;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    SetLeds(Leds),
    Echo,
    SetScanCodeSet(ScanCodeSet),
    EnableScanning,
    DisableScanning,
    /// 复位并自检
    Reset,
}

impl Command {
    pub const fn opcode(self) -> u8 {
        match self {
            Command::SetLeds(_) => 0xED,
            Command::Echo => ECHO,
            Command::SetScanCodeSet(_) => 0xF0,
            Command::EnableScanning => 0xF4,
            Command::DisableScanning => 0xF5,
            Command::Reset => 0xFF,
        }
    }

    /// Data byte sent after the opcode, if any.
    pub fn parameter(self) -> Option<u8> {
        match self {
            Command::SetLeds(leds) => Some(leds.bits()),
            Command::SetScanCodeSet(set) => Some(set.number()),
            _ => None,
        }
    }
}

/// 键盘应答
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Response {
    Ack,
    Resend,
    SelfTestPassed,
    /// `0xFC` / `0xFD`
    SelfTestFailed(u8),
    Echo,
    Other(u8),
}

impl Response {
    pub const fn from_byte(byte: u8) -> Self {
        match byte {
            ACK => Response::Ack,
            RESEND => Response::Resend,
            BAT_OK => Response::SelfTestPassed,
            0xFC | 0xFD => Response::SelfTestFailed(byte),
            ECHO => Response::Echo,
            other => Response::Other(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoding() {
        assert_eq!(Command::Reset.opcode(), 0xFF);
        assert_eq!(Command::Reset.parameter(), None);
        let set2 = Command::SetScanCodeSet(ScanCodeSet::Set2);
        assert_eq!((set2.opcode(), set2.parameter()), (0xF0, Some(2)));

        let leds = Leds {
            scroll_lock: true,
            num_lock: false,
            caps_lock: true,
        };
        assert_eq!(Command::SetLeds(leds).parameter(), Some(0b101));
    }

    #[test]
    fn test_responses() {
        assert_eq!(Response::from_byte(0xFA), Response::Ack);
        assert_eq!(Response::from_byte(0xFC), Response::SelfTestFailed(0xFC));
        assert_eq!(Response::from_byte(0x1C), Response::Other(0x1C));
    }
}
