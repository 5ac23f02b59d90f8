//! 中断线路表
//!
//! Interrupt handlers do not know about the hub. They call [`raise`] with
//! their IRQ line; the line table forwards that to whichever [`Signaller`]
//! was bound to the line. Re-arming is deferred until the event loop has
//! drained the device and calls [`InterruptControl::acknowledge`].

use alloc::collections::BTreeMap;

use log::{debug, trace};
use spin::Mutex;

use crate::error::IrqError;
use crate::event::Signaller;
use crate::io::{InterruptControl, SourceId};

#[cfg(target_arch = "x86_64")]
pub mod pics;

#[cfg(target_arch = "x86_64")]
pub use pics::{PicControl, PicEoi};

/// Legacy IRQ lines of a pair of 8259s.
pub const IRQ_LINES: usize = 16;

pub struct IrqTable {
    lines: [Option<Signaller>; IRQ_LINES],
}

impl IrqTable {
    pub const fn new() -> Self {
        const UNBOUND: Option<Signaller> = None;
        Self {
            lines: [UNBOUND; IRQ_LINES],
        }
    }

    fn slot(&mut self, line: u8) -> Result<&mut Option<Signaller>, IrqError> {
        self.lines
            .get_mut(usize::from(line))
            .ok_or(IrqError::InvalidLine(line))
    }

    pub fn bind(&mut self, line: u8, signaller: Signaller) -> Result<(), IrqError> {
        let slot = self.slot(line)?;
        if slot.is_some() {
            return Err(IrqError::LineInUse(line));
        }
        *slot = Some(signaller);
        Ok(())
    }

    pub fn unbind(&mut self, line: u8) -> Option<Signaller> {
        self.slot(line).ok()?.take()
    }

    /// Signal whatever is bound to `line`; `false` if nothing is.
    pub fn raise(&self, line: u8) -> bool {
        match self.lines.get(usize::from(line)) {
            Some(Some(signaller)) => {
                signaller.signal();
                true
            }
            _ => false,
        }
    }
}

impl Default for IrqTable {
    fn default() -> Self {
        Self::new()
    }
}

/// 全局中断线路表，中断处理函数通过 [`raise`] 访问
pub static IRQ_TABLE: Mutex<IrqTable> = Mutex::new(IrqTable::new());

/// Entry point for interrupt handlers.
pub fn raise(line: u8) {
    if !IRQ_TABLE.lock().raise(line) {
        trace!("spurious irq {}", line);
    }
}

/// Run `f` with interrupts masked so a handler cannot spin on a lock we hold.
///
/// Only bare-metal x86_64 touches the interrupt flag; hosted builds run `f`
/// directly.
pub(crate) fn without_interrupts<R>(f: impl FnOnce() -> R) -> R {
    #[cfg(all(target_arch = "x86_64", target_os = "none"))]
    {
        x86_64::instructions::interrupts::without_interrupts(f)
    }
    #[cfg(not(all(target_arch = "x86_64", target_os = "none")))]
    {
        f()
    }
}

/// Re-arms one IRQ line at the interrupt controller.
pub trait EndOfInterrupt {
    fn end_of_interrupt(&mut self, line: u8);
}

/// [`InterruptControl`] over a line table.
///
/// Every source must be given a line with [`LineControl::assign`] before the
/// event loop binds it.
pub struct LineControl<E> {
    table: &'static Mutex<IrqTable>,
    assigned: BTreeMap<SourceId, u8>,
    bound: BTreeMap<SourceId, u8>,
    eoi: E,
}

impl<E: EndOfInterrupt> LineControl<E> {
    pub fn new(table: &'static Mutex<IrqTable>, eoi: E) -> Self {
        Self {
            table,
            assigned: BTreeMap::new(),
            bound: BTreeMap::new(),
            eoi,
        }
    }

    pub fn assign(&mut self, id: SourceId, line: u8) -> Result<(), IrqError> {
        if usize::from(line) >= IRQ_LINES {
            return Err(IrqError::InvalidLine(line));
        }
        self.assigned.insert(id, line);
        Ok(())
    }

    pub fn line_of(&self, id: SourceId) -> Option<u8> {
        self.assigned.get(&id).copied()
    }

    pub fn eoi(&self) -> &E {
        &self.eoi
    }
}

impl<E: EndOfInterrupt> InterruptControl for LineControl<E> {
    fn bind(&mut self, id: SourceId, signaller: Signaller) -> Result<(), IrqError> {
        let line = self.line_of(id).ok_or(IrqError::NotAssigned(id))?;
        let table = self.table;
        without_interrupts(|| table.lock().bind(line, signaller))?;
        self.bound.insert(id, line);
        debug!("source {} bound to irq {}", id, line);
        Ok(())
    }

    fn acknowledge(&mut self, id: SourceId) -> Result<(), IrqError> {
        let line = *self.bound.get(&id).ok_or(IrqError::NotBound(id))?;
        self.eoi.end_of_interrupt(line);
        Ok(())
    }

    fn release(&mut self, id: SourceId) {
        if let Some(line) = self.bound.remove(&id) {
            let table = self.table;
            without_interrupts(|| table.lock().unbind(line));
            debug!("source {} released irq {}", id, line);
        }
    }
}
