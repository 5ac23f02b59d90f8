//! 串口（16550 UART）
//!
//! Used both as an input device for the event loop and, on COM1, as the
//! logging sink (QEMU forwards it to stdio).

use core::fmt;

use bit_field::BitField;

use super::{ByteSource, PortIo};

pub const COM1: u16 = 0x3F8;
pub const COM2: u16 = 0x2F8;

/// 115200 / 3 = 38400 baud
pub const DEFAULT_DIVISOR: u16 = 3;

// 寄存器偏移
const DATA: u16 = 0;
const INT_ENABLE: u16 = 1;
const FIFO_CONTROL: u16 = 2;
const LINE_CONTROL: u16 = 3;
const MODEM_CONTROL: u16 = 4;
/// Line status register offset.
const LINE_STATUS: u16 = 5;

/// 接收缓冲区有数据
const LSR_DATA_READY: usize = 0;
/// IER: interrupt when received data is available.
const IER_RX_AVAILABLE: usize = 0;
/// LCR: divisor latch access.
const LCR_DLAB: usize = 7;
/// MCR bits: DTR, RTS and OUT2 (OUT2 gates the IRQ line on PCs).
const MCR_DTR: usize = 0;
const MCR_RTS: usize = 1;
const MCR_OUT2: usize = 3;

pub struct SerialPort<P> {
    ports: P,
    base: u16,
}

impl<P: PortIo> SerialPort<P> {
    pub const fn new(ports: P, base: u16) -> Self {
        Self { ports, base }
    }

    pub fn base(&self) -> u16 {
        self.base
    }

    /// 初始化UART：8N1，FIFO，接收中断
    ///
    /// `divisor` divides the 115200 baud base clock.
    pub fn init(&mut self, divisor: u16) {
        let [low, high] = divisor.to_le_bytes();
        // 先关闭所有中断
        self.ports.write(self.base + INT_ENABLE, 0);

        let mut lcr = 0u8;
        lcr.set_bit(LCR_DLAB, true);
        self.ports.write(self.base + LINE_CONTROL, lcr);
        self.ports.write(self.base + DATA, low);
        self.ports.write(self.base + INT_ENABLE, high);

        // 8位数据，无校验，1位停止位
        let mut lcr = 0u8;
        lcr.set_bits(0..2, 0b11);
        self.ports.write(self.base + LINE_CONTROL, lcr);

        // 启用并清空FIFO，14字节触发
        let mut fcr = 0u8;
        fcr.set_bits(0..3, 0b111);
        fcr.set_bits(6..8, 0b11);
        self.ports.write(self.base + FIFO_CONTROL, fcr);

        let mut mcr = 0u8;
        mcr.set_bit(MCR_DTR, true);
        mcr.set_bit(MCR_RTS, true);
        mcr.set_bit(MCR_OUT2, true);
        self.ports.write(self.base + MODEM_CONTROL, mcr);

        let mut ier = 0u8;
        ier.set_bit(IER_RX_AVAILABLE, true);
        self.ports.write(self.base + INT_ENABLE, ier);
    }

    pub fn write_byte(&mut self, byte: u8) {
        self.ports.write(self.base + DATA, byte);
    }

    pub fn into_inner(self) -> P {
        self.ports
    }
}

impl<P: PortIo> ByteSource for SerialPort<P> {
    fn try_read_byte(&mut self) -> Option<u8> {
        let status = self.ports.read(self.base + LINE_STATUS);
        status
            .get_bit(LSR_DATA_READY)
            .then(|| self.ports.read(self.base + DATA))
    }
}

impl<P: PortIo> fmt::Write for SerialPort<P> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for byte in s.bytes() {
            self.write_byte(byte);
        }
        Ok(())
    }
}

#[cfg(target_arch = "x86_64")]
mod com1 {
    use core::fmt::{self, Write};

    use lazy_static::lazy_static;
    use spin::Mutex;

    use super::{SerialPort, COM1, DEFAULT_DIVISOR};
    use crate::interrupts::without_interrupts;
    use crate::io::X86Ports;

    lazy_static! {
        static ref COM1_PORT: Mutex<SerialPort<X86Ports>> = {
            let mut port = SerialPort::new(unsafe { X86Ports::new() }, COM1);
            port.init(DEFAULT_DIVISOR);
            Mutex::new(port)
        };
    }

    /// Writer handle for COM1; every write takes the port lock.
    #[derive(Clone, Copy, Debug, Default)]
    pub struct Com1Writer;

    impl Write for Com1Writer {
        fn write_str(&mut self, s: &str) -> fmt::Result {
            // 防止死锁
            without_interrupts(|| COM1_PORT.lock().write_str(s))
        }
    }

    #[doc(hidden)]
    pub fn _serial_print(args: fmt::Arguments) {
        // 串口写入不会失败
        let _ = Com1Writer.write_fmt(args);
    }
}

#[cfg(target_arch = "x86_64")]
pub use com1::{Com1Writer, _serial_print};

#[cfg(target_arch = "x86_64")]
#[macro_export]
macro_rules! serial_print {
    ($($arg:tt)*) => ($crate::io::serial::_serial_print(format_args!($($arg)*)));
}

#[cfg(target_arch = "x86_64")]
#[macro_export]
macro_rules! serial_println {
    () => ($crate::serial_print!("\n"));
    ($($arg:tt)*) => ($crate::serial_print!("{}\n", format_args!($($arg)*)));
}
