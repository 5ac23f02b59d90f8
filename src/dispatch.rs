//! 事件循环
//!
//! Blocks on the hub, services every source whose tag fired (lowest tag
//! first), then re-arms that source's interrupt. Waiting on the hub is the
//! only place the loop suspends.

use alloc::boxed::Box;
use core::convert::Infallible;

use log::{error, info, trace};

use crate::config::Config;
use crate::error::DispatchError;
use crate::event::{Mask, NotificationHub, Signaller, SourceTag};
use crate::io::{ByteSource, InterruptControl, SourceId};
use crate::keyboard::{KeyEvent, Ps2Decoder, ScanCodeSet};

/// Callbacks for what the loop pulls out of its sources.
pub trait Handler {
    fn key_event(&mut self, id: SourceId, event: KeyEvent);

    fn serial_byte(&mut self, _id: SourceId, _byte: u8) {}

    /// A source without data (a timer) fired.
    fn tick(&mut self, _id: SourceId) {}
}

pub enum SourceKind {
    Keyboard {
        decoder: Ps2Decoder,
        bytes: Box<dyn ByteSource>,
    },
    Serial {
        bytes: Box<dyn ByteSource>,
    },
    Timer,
}

/// A device registered with the loop.
pub struct Source {
    id: SourceId,
    kind: SourceKind,
}

impl Source {
    pub fn id(&self) -> SourceId {
        self.id
    }

    pub fn kind(&self) -> &SourceKind {
        &self.kind
    }

    pub fn decoder(&self) -> Option<&Ps2Decoder> {
        match &self.kind {
            SourceKind::Keyboard { decoder, .. } => Some(decoder),
            _ => None,
        }
    }

    /// Drain the device completely; returns the number of bytes read.
    fn service<H: Handler + ?Sized>(&mut self, handler: &mut H) -> usize {
        let id = self.id;
        match &mut self.kind {
            SourceKind::Keyboard { decoder, bytes } => {
                let mut count = 0;
                while let Some(byte) = bytes.try_read_byte() {
                    count += 1;
                    if let Some(event) = decoder.push_byte(byte) {
                        handler.key_event(id, event);
                    }
                }
                count
            }
            SourceKind::Serial { bytes } => {
                let mut count = 0;
                while let Some(byte) = bytes.try_read_byte() {
                    count += 1;
                    handler.serial_byte(id, byte);
                }
                count
            }
            SourceKind::Timer => {
                handler.tick(id);
                0
            }
        }
    }
}

pub struct EventLoop<C> {
    hub: NotificationHub<Source>,
    irq: C,
}

impl<C: InterruptControl> EventLoop<C> {
    pub fn new(irq: C) -> Self {
        Self::with_hub(NotificationHub::new(), irq)
    }

    pub fn with_hub(hub: NotificationHub<Source>, irq: C) -> Self {
        Self { hub, irq }
    }

    pub fn from_config(config: &Config, irq: C) -> Result<Self, DispatchError> {
        Ok(Self::with_hub(NotificationHub::from_config(config)?, irq))
    }

    pub fn hub(&self) -> &NotificationHub<Source> {
        &self.hub
    }

    pub fn hub_mut(&mut self) -> &mut NotificationHub<Source> {
        &mut self.hub
    }

    pub fn irq(&self) -> &C {
        &self.irq
    }

    pub fn irq_mut(&mut self) -> &mut C {
        &mut self.irq
    }

    pub fn bind_keyboard<B>(&mut self, id: SourceId, set: ScanCodeSet, bytes: B) -> Result<SourceTag, DispatchError>
    where
        B: ByteSource + 'static,
    {
        self.bind(Source {
            id,
            kind: SourceKind::Keyboard {
                decoder: Ps2Decoder::new(set),
                bytes: Box::new(bytes),
            },
        })
    }

    pub fn bind_serial<B>(&mut self, id: SourceId, bytes: B) -> Result<SourceTag, DispatchError>
    where
        B: ByteSource + 'static,
    {
        self.bind(Source {
            id,
            kind: SourceKind::Serial {
                bytes: Box::new(bytes),
            },
        })
    }

    /// A source that only signals, used to bound waits.
    pub fn bind_timer(&mut self, id: SourceId) -> Result<SourceTag, DispatchError> {
        self.bind(Source {
            id,
            kind: SourceKind::Timer,
        })
    }

    /// 注册到hub，再把中断绑定到分配的tag上
    fn bind(&mut self, source: Source) -> Result<SourceTag, DispatchError> {
        let id = source.id;
        let tag = self.hub.register(source)?;
        let signaller = Signaller::new(self.hub.receiver().clone(), tag);
        if let Err(cause) = self.irq.bind(id, signaller) {
            self.hub.unregister(tag);
            return Err(DispatchError::Bind { id, cause });
        }
        info!("source {} bound with tag {}", id, tag);
        Ok(tag)
    }

    /// Remove a source and release its interrupt.
    pub fn unbind(&mut self, tag: SourceTag) -> Option<Source> {
        let id = self.hub.source(tag)?.id;
        // 先断开中断线路，之后才能清除挂起位
        self.irq.release(id);
        let source = self.hub.unregister(tag)?;
        info!("source {} unbound", source.id);
        Some(source)
    }

    /// Service every source in `mask`, lowest tag first.
    ///
    /// Tags without a source (unbound while their signal was in flight) are
    /// skipped. A failed acknowledge stops dispatch: that line will never fire
    /// again.
    pub fn dispatch<H: Handler + ?Sized>(&mut self, mask: Mask, handler: &mut H) -> Result<(), DispatchError> {
        for tag in NotificationHub::<Source>::sources_in(mask) {
            let Some(source) = self.hub.source_mut(tag) else {
                trace!("no source for tag {}, skipping", tag);
                continue;
            };
            let id = source.id;
            let drained = source.service(handler);
            trace!("source {} drained {} bytes", id, drained);

            self.irq.acknowledge(id).map_err(|cause| {
                error!("failed to acknowledge interrupt for source {}: {}", id, cause);
                DispatchError::UnacknowledgedInterrupt { id, cause }
            })?;
        }
        Ok(())
    }

    /// One wait and the dispatch that follows it.
    pub fn run_once<H: Handler + ?Sized>(&mut self, handler: &mut H) -> Result<Mask, DispatchError> {
        let mask = self.hub.wait();
        self.dispatch(mask, handler)?;
        Ok(mask)
    }

    /// Dispatch forever; only returns on a fatal error.
    pub fn run<H: Handler + ?Sized>(&mut self, handler: &mut H) -> Result<Infallible, DispatchError> {
        loop {
            self.run_once(handler)?;
        }
    }

    /// [`Self::run`] for an async executor; suspends instead of idling.
    pub async fn run_async<H: Handler + ?Sized>(&mut self, handler: &mut H) -> Result<Infallible, DispatchError> {
        loop {
            let mask = self.hub.wait_async().await;
            self.dispatch(mask, handler)?;
        }
    }
}
