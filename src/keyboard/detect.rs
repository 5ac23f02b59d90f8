//! One-shot scan code set detection.
//!
//! Watches the bytes of a single key press and release during bring-up:
//! set 1 keyboards send `code, code + 0x80`, set 2 keyboards send
//! `code, 0xF0, code`. Controller chatter (ACK, resend, reset echo, zero)
//! before the first key byte is skipped.

use crate::error::DetectError;

use super::command::{ACK, RESEND};
use super::{ScanCodeSet, RELEASE};

/// 检测前需要跳过的字节
const SKIPPED: [u8; 4] = [ACK, RESEND, 0xFF, 0x00];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Detection {
    /// 需要更多字节
    Pending,
    Detected(ScanCodeSet),
    Failed(DetectError),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Stage {
    AwaitFirst,
    AwaitSecond(u8),
    AwaitRepeat(u8),
    Done(Detection),
}

#[derive(Clone, Debug)]
pub struct ScanSetDetector {
    stage: Stage,
}

impl ScanSetDetector {
    pub const fn new() -> Self {
        Self {
            stage: Stage::AwaitFirst,
        }
    }

    /// Feed one byte. Once a result is reached it is repeated for every
    /// further byte.
    pub fn push_byte(&mut self, byte: u8) -> Detection {
        let mismatch = |first| Detection::Failed(DetectError::Mismatch { first, second: byte });
        let stage = match self.stage {
            Stage::Done(result) => return result,
            Stage::AwaitFirst if SKIPPED.contains(&byte) => Stage::AwaitFirst,
            Stage::AwaitFirst => Stage::AwaitSecond(byte),
            Stage::AwaitSecond(first) if first.checked_add(0x80) == Some(byte) => {
                Stage::Done(Detection::Detected(ScanCodeSet::Set1))
            }
            Stage::AwaitSecond(first) if byte == RELEASE => Stage::AwaitRepeat(first),
            Stage::AwaitSecond(first) => Stage::Done(mismatch(first)),
            Stage::AwaitRepeat(first) if byte == first => Stage::Done(Detection::Detected(ScanCodeSet::Set2)),
            Stage::AwaitRepeat(first) => Stage::Done(mismatch(first)),
        };
        self.stage = stage;
        match stage {
            Stage::Done(result) => result,
            _ => Detection::Pending,
        }
    }
}

impl Default for ScanSetDetector {
    fn default() -> Self {
        Self::new()
    }
}

/// Run a detector over `bytes` until it settles.
pub fn detect<I: IntoIterator<Item = u8>>(bytes: I) -> Result<ScanCodeSet, DetectError> {
    let mut detector = ScanSetDetector::new();
    for byte in bytes {
        match detector.push_byte(byte) {
            Detection::Pending => continue,
            Detection::Detected(set) => return Ok(set),
            Detection::Failed(err) => return Err(err),
        }
    }
    Err(DetectError::Incomplete)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_set1() {
        assert_eq!(detect([0x1E, 0x9E]), Ok(ScanCodeSet::Set1));
    }

    #[test]
    fn test_detect_set2() {
        assert_eq!(detect([0x1C, 0xF0, 0x1C]), Ok(ScanCodeSet::Set2));
    }

    #[test]
    fn test_skips_controller_chatter() {
        assert_eq!(detect([0xFA, 0x00, 0xFE, 0x1C, 0xF0, 0x1C]), Ok(ScanCodeSet::Set2));
    }

    #[test]
    fn test_mismatch() {
        assert_eq!(
            detect([0x1C, 0x1D]),
            Err(DetectError::Mismatch {
                first: 0x1C,
                second: 0x1D
            })
        );
        assert_eq!(
            detect([0x1C, 0xF0, 0x1B]),
            Err(DetectError::Mismatch {
                first: 0x1C,
                second: 0x1B
            })
        );
    }

    #[test]
    fn test_high_first_byte_is_not_set1() {
        // 0x83 + 0x80 溢出，不能回绕成 0x03
        assert_eq!(
            detect([0x83, 0x03]),
            Err(DetectError::Mismatch {
                first: 0x83,
                second: 0x03
            })
        );
    }

    #[test]
    fn test_incomplete() {
        assert_eq!(detect([0xFA, 0x1C, 0xF0]), Err(DetectError::Incomplete));
    }

    #[test]
    fn test_result_is_sticky() {
        let mut detector = ScanSetDetector::new();
        detector.push_byte(0x1E);
        assert_eq!(detector.push_byte(0x9E), Detection::Detected(ScanCodeSet::Set1));
        assert_eq!(detector.push_byte(0x00), Detection::Detected(ScanCodeSet::Set1));
    }
}
