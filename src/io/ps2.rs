//! i8042 PS/2 控制器
//!
//! Port `0x60` carries data in both directions, port `0x64` is the status
//! register. The keyboard interrupt only says "a byte is there"; the byte is
//! read through [`ByteSource`].

use bit_field::BitField;
use log::{debug, trace, warn};

use crate::error::Ps2Error;
use crate::keyboard::command::{Command, Response, BAT_OK};
use crate::keyboard::{Leds, ScanCodeSet};
use crate::task::keyboard::flush;

use super::{ByteSource, PortIo};

pub const DATA_PORT: u16 = 0x60;
pub const STATUS_PORT: u16 = 0x64;

/// 输出缓冲区满（可读）
const STATUS_OUTPUT_FULL: usize = 0;
/// 输入缓冲区满（不可写）
const STATUS_INPUT_FULL: usize = 1;

const SPIN_LIMIT: u32 = 100_000;
const RETRIES: u32 = 3;

pub struct I8042<P> {
    ports: P,
}

impl<P: PortIo> I8042<P> {
    pub const fn new(ports: P) -> Self {
        Self { ports }
    }

    pub fn into_inner(self) -> P {
        self.ports
    }

    fn status(&mut self) -> u8 {
        self.ports.read(STATUS_PORT)
    }

    fn write_data(&mut self, byte: u8) -> Result<(), Ps2Error> {
        for _ in 0..SPIN_LIMIT {
            if !self.status().get_bit(STATUS_INPUT_FULL) {
                self.ports.write(DATA_PORT, byte);
                return Ok(());
            }
            core::hint::spin_loop();
        }
        Err(Ps2Error::Timeout("input"))
    }

    fn read_data(&mut self) -> Result<u8, Ps2Error> {
        for _ in 0..SPIN_LIMIT {
            if let Some(byte) = self.try_read_byte() {
                return Ok(byte);
            }
            core::hint::spin_loop();
        }
        Err(Ps2Error::Timeout("output"))
    }

    /// Send a keyboard command, resending while the keyboard asks for it.
    ///
    /// Returns the keyboard's final response. A reset also waits for the
    /// self-test result.
    pub fn send(&mut self, command: Command) -> Result<Response, Ps2Error> {
        for attempt in 1..=RETRIES {
            self.write_data(command.opcode())?;
            let mut response = Response::from_byte(self.read_data()?);
            if let (Response::Ack, Some(parameter)) = (response, command.parameter()) {
                self.write_data(parameter)?;
                response = Response::from_byte(self.read_data()?);
            }

            match response {
                Response::Resend => {
                    trace!("keyboard asked to resend {:#04x} (attempt {})", command.opcode(), attempt);
                }
                Response::Ack if command == Command::Reset => {
                    let result = self.read_data()?;
                    if result != BAT_OK {
                        return Err(Ps2Error::SelfTestFailed(result));
                    }
                    return Ok(Response::SelfTestPassed);
                }
                response => return Ok(response),
            }
        }
        Err(Ps2Error::NoAck(command.opcode(), RETRIES))
    }

    /// [`Self::send`] that insists on an acknowledgement.
    pub fn command(&mut self, command: Command) -> Result<(), Ps2Error> {
        match self.send(command)? {
            Response::Ack | Response::SelfTestPassed => Ok(()),
            Response::Echo if command == Command::Echo => Ok(()),
            other => {
                warn!("unexpected keyboard response {:?} to {:?}", other, command);
                Err(Ps2Error::NoAck(command.opcode(), 1))
            }
        }
    }

    pub fn set_leds(&mut self, leds: Leds) -> Result<(), Ps2Error> {
        self.command(Command::SetLeds(leds))
    }

    /// 键盘初始化：停止扫描、清空缓冲区、复位、选择扫描码集、恢复扫描
    pub fn init(&mut self, set: ScanCodeSet) -> Result<(), Ps2Error> {
        self.command(Command::DisableScanning)?;
        let dropped = flush(self);
        if dropped > 0 {
            debug!("discarded {} stale keyboard bytes", dropped);
        }
        self.command(Command::Reset)?;
        self.command(Command::SetScanCodeSet(set))?;
        self.command(Command::EnableScanning)?;
        debug!("keyboard ready, {}", set);
        Ok(())
    }
}

impl<P: PortIo> ByteSource for I8042<P> {
    fn try_read_byte(&mut self) -> Option<u8> {
        self.status()
            .get_bit(STATUS_OUTPUT_FULL)
            .then(|| self.ports.read(DATA_PORT))
    }
}
