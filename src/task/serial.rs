//! 串口中断处理
//!
//! The handlers only raise the line. Received bytes stay in the UART until
//! the event loop drains the port through its [`ByteSource`] impl.
//!
//! [`ByteSource`]: crate::io::ByteSource

use crate::io::serial::{COM1, COM2};

/// COM1的IRQ线路
pub const COM1_IRQ: u8 = 4;
/// COM2的IRQ线路
pub const COM2_IRQ: u8 = 3;

/// IRQ line a standard PC wires to the UART at `base`.
pub fn irq_line(base: u16) -> Option<u8> {
    match base {
        COM1 => Some(COM1_IRQ),
        COM2 => Some(COM2_IRQ),
        _ => None,
    }
}

/// 串口中断处理函数
pub fn serial_interrupt_handler(line: u8) {
    crate::interrupts::raise(line);
}

pub fn com1_interrupt_handler() {
    serial_interrupt_handler(COM1_IRQ);
}

pub fn com2_interrupt_handler() {
    serial_interrupt_handler(COM2_IRQ);
}
