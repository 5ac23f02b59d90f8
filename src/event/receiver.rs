//! The shared waitable receiver.
//!
//! One signal word per hub. Interrupt-side code ORs its tag into the word and
//! never blocks; the loop side takes the whole word at once. A signal raised
//! while nobody waits stays in the word until the next take.

use alloc::sync::Arc;
use core::future::Future;
use core::pin::Pin;
use core::sync::atomic::{AtomicU64, Ordering};
use core::task::{Context, Poll};

use futures_util::task::AtomicWaker;
use futures_util::Stream;

use super::mask::{Mask, SourceTag};

pub struct Receiver {
    /// 累积的信号字
    word: AtomicU64,
    waker: AtomicWaker,
}

impl Receiver {
    pub const fn new() -> Self {
        Self {
            word: AtomicU64::new(0),
            waker: AtomicWaker::new(),
        }
    }

    /// OR `tag` into the signal word. Never blocks; safe from interrupt context.
    pub fn signal(&self, tag: SourceTag) {
        self.word.fetch_or(tag.value(), Ordering::AcqRel);
        self.waker.wake();
    }

    /// Take and clear the accumulated word (empty if nothing is pending).
    pub fn poll(&self) -> Mask {
        Mask::from_raw(self.word.swap(0, Ordering::AcqRel))
    }

    pub fn has_signals(&self) -> bool {
        self.word.load(Ordering::Acquire) != 0
    }

    /// Drop a pending bit without delivering it.
    pub(crate) fn discard(&self, tag: SourceTag) {
        self.word.fetch_and(!tag.value(), Ordering::AcqRel);
    }

    /// Block until the word is non-zero, calling `idle` between checks.
    pub fn wait(&self, idle: fn(&Receiver)) -> Mask {
        loop {
            let mask = self.poll();
            if !mask.is_empty() {
                return mask;
            }
            idle(self);
        }
    }

    fn poll_mask(&self, cx: &mut Context<'_>) -> Poll<Mask> {
        let mask = self.poll();
        if !mask.is_empty() {
            return Poll::Ready(mask);
        }

        self.waker.register(cx.waker());
        let mask = self.poll();
        if mask.is_empty() {
            Poll::Pending
        } else {
            self.waker.take();
            Poll::Ready(mask)
        }
    }
}

impl Default for Receiver {
    fn default() -> Self {
        Self::new()
    }
}

/// Interrupt-side handle: signals one tag on one receiver.
///
/// This is the badged capability of the hub: whoever holds it can only ever
/// raise its own bit.
#[derive(Clone)]
pub struct Signaller {
    receiver: Arc<Receiver>,
    tag: SourceTag,
}

impl Signaller {
    pub(crate) fn new(receiver: Arc<Receiver>, tag: SourceTag) -> Self {
        Self { receiver, tag }
    }

    pub fn tag(&self) -> SourceTag {
        self.tag
    }

    pub fn signal(&self) {
        self.receiver.signal(self.tag);
    }
}

impl core::fmt::Debug for Signaller {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Signaller").field("tag", &self.tag).finish()
    }
}

/// Future returned by [`super::NotificationHub::wait_async`].
pub struct Wait<'a> {
    receiver: &'a Receiver,
}

impl<'a> Wait<'a> {
    pub(crate) fn new(receiver: &'a Receiver) -> Self {
        Self { receiver }
    }
}

impl Future for Wait<'_> {
    type Output = Mask;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Mask> {
        self.receiver.poll_mask(cx)
    }
}

/// Endless stream of wake-up masks.
pub struct Notifications {
    receiver: Arc<Receiver>,
}

impl Notifications {
    pub(crate) fn new(receiver: Arc<Receiver>) -> Self {
        Self { receiver }
    }
}

impl Stream for Notifications {
    type Item = Mask;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Mask>> {
        self.receiver.poll_mask(cx).map(Some)
    }
}

/// Idle strategies for [`Receiver::wait`].
pub mod idle {
    use super::Receiver;

    /// 忙等
    pub fn spin(_receiver: &Receiver) {
        core::hint::spin_loop();
    }

    /// Halt until the next interrupt.
    ///
    /// Interrupts are disabled around the check so a signal that lands between
    /// the check and `hlt` still wakes the CPU.
    #[cfg(target_arch = "x86_64")]
    pub fn halt(receiver: &Receiver) {
        use x86_64::instructions::interrupts::{disable, enable, enable_and_hlt};
        // 关中断
        disable();

        if receiver.has_signals() {
            enable();
        } else {
            enable_and_hlt();
        }
    }
}
