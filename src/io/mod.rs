//! 设备接口
//!
//! The narrow seams the event loop talks through: a non-blocking
//! [`ByteSource`] per device and an [`InterruptControl`] that binds sources
//! to interrupt lines and re-arms them.

use alloc::boxed::Box;
use alloc::collections::VecDeque;
use core::fmt;

use crate::error::IrqError;
use crate::event::Signaller;

pub mod ps2;
pub mod serial;

/// Caller-chosen identity of a device, stable across tag reassignment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SourceId(pub usize);

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// 非阻塞字节源
pub trait ByteSource {
    /// Next pending byte, or `None` when the device has nothing buffered.
    fn try_read_byte(&mut self) -> Option<u8>;
}

impl<T: ByteSource + ?Sized> ByteSource for &mut T {
    fn try_read_byte(&mut self) -> Option<u8> {
        (**self).try_read_byte()
    }
}

impl<T: ByteSource + ?Sized> ByteSource for Box<T> {
    fn try_read_byte(&mut self) -> Option<u8> {
        (**self).try_read_byte()
    }
}

impl ByteSource for VecDeque<u8> {
    fn try_read_byte(&mut self) -> Option<u8> {
        self.pop_front()
    }
}

/// Interrupt registration facility.
pub trait InterruptControl {
    /// Route the interrupt of `id` to `signaller`.
    fn bind(&mut self, id: SourceId, signaller: Signaller) -> Result<(), IrqError>;

    /// Re-arm the interrupt of `id` after its bytes were drained.
    fn acknowledge(&mut self, id: SourceId) -> Result<(), IrqError>;

    /// Stop routing the interrupt of `id`.
    fn release(&mut self, _id: SourceId) {}
}

impl<T: InterruptControl + ?Sized> InterruptControl for &mut T {
    fn bind(&mut self, id: SourceId, signaller: Signaller) -> Result<(), IrqError> {
        (**self).bind(id, signaller)
    }

    fn acknowledge(&mut self, id: SourceId) -> Result<(), IrqError> {
        (**self).acknowledge(id)
    }

    fn release(&mut self, id: SourceId) {
        (**self).release(id)
    }
}

/// 8-bit port access.
pub trait PortIo {
    fn read(&mut self, port: u16) -> u8;
    fn write(&mut self, port: u16, value: u8);
}

/// Real x86 I/O ports.
#[cfg(target_arch = "x86_64")]
#[derive(Debug)]
pub struct X86Ports {
    _private: (),
}

#[cfg(target_arch = "x86_64")]
impl X86Ports {
    /// # Safety
    ///
    /// The caller must own the ports it will touch through this handle.
    pub const unsafe fn new() -> Self {
        Self { _private: () }
    }
}

#[cfg(target_arch = "x86_64")]
impl PortIo for X86Ports {
    fn read(&mut self, port: u16) -> u8 {
        unsafe { x86::io::inb(port) }
    }

    fn write(&mut self, port: u16, value: u8) {
        unsafe { x86::io::outb(port, value) }
    }
}
