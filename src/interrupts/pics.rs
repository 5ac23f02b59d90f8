use lazy_static::lazy_static;
use pic8259::ChainedPics;
use spin::Mutex;

use super::{EndOfInterrupt, LineControl, IRQ_TABLE};

pub const PIC_1_OFFSET: u8 = 32;
pub const PIC_2_OFFSET: u8 = PIC_1_OFFSET + 8;

lazy_static! {
    pub static ref PICS: Mutex<ChainedPics> =
        Mutex::new(unsafe { ChainedPics::new(PIC_1_OFFSET, PIC_2_OFFSET) });
}

#[derive(Debug, Clone, Copy)]
#[repr(u8)]
pub enum InterruptIndex {
    Timer = PIC_1_OFFSET,
    Keyboard,
    Com2 = PIC_1_OFFSET + 3,
    Com1,
    Mouse = PIC_1_OFFSET + 12,
}

impl InterruptIndex {
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn as_usize(self) -> usize {
        usize::from(self.as_u8())
    }

    /// IRQ线路号
    pub fn line(self) -> u8 {
        self.as_u8() - PIC_1_OFFSET
    }
}

/// 初始化并重映射8259
pub fn init() {
    unsafe { PICS.lock().initialize() };
}

/// End-of-interrupt through the chained 8259s.
#[derive(Debug, Default)]
pub struct PicEoi;

impl EndOfInterrupt for PicEoi {
    fn end_of_interrupt(&mut self, line: u8) {
        super::without_interrupts(|| unsafe {
            PICS.lock().notify_end_of_interrupt(PIC_1_OFFSET + line)
        });
    }
}

pub type PicControl = LineControl<PicEoi>;

impl PicControl {
    /// Line control over the global table, re-armed through [`PICS`].
    pub fn pic() -> Self {
        LineControl::new(&IRQ_TABLE, PicEoi)
    }
}
