//! 中断通知中心
//!
//! [`NotificationHub`] multiplexes many interrupt sources onto one waitable
//! [`Receiver`]. Each registered source gets a distinct [`SourceTag`] bit;
//! concurrent signals are OR-ed together and split again with
//! [`NotificationHub::sources_in`].

use alloc::collections::BTreeMap;
use alloc::sync::Arc;

use log::{debug, trace};

pub use mask::{Mask, SourceTag, Tags, MASK_BITS};
pub use receiver::{idle, Notifications, Receiver, Signaller, Wait};

use crate::config::Config;
use crate::error::HubError;

mod mask;
mod receiver;

pub struct NotificationHub<S> {
    /// 共享的接收端
    receiver: Arc<Receiver>,
    /// tag到事件源的映射
    sources: BTreeMap<SourceTag, S>,
    /// 可用的tag位数
    capacity: u32,
    idle: fn(&Receiver),
}

impl<S> NotificationHub<S> {
    /// A hub using the full 64-bit word.
    pub fn new() -> Self {
        Self {
            receiver: Arc::new(Receiver::new()),
            sources: BTreeMap::new(),
            capacity: MASK_BITS,
            idle: idle::spin,
        }
    }

    /// A hub limited to `capacity` tags (1..=64).
    pub fn with_capacity(capacity: u32) -> Result<Self, HubError> {
        if capacity == 0 || capacity > MASK_BITS {
            return Err(HubError::InvalidCapacity(capacity));
        }
        Ok(Self {
            capacity,
            ..Self::new()
        })
    }

    /// Capacity and idle strategy both come from `config`.
    pub fn from_config(config: &Config) -> Result<Self, HubError> {
        let mut hub = Self::with_capacity(config.hub_capacity)?;
        hub.set_idle(config.idle.hook());
        Ok(hub)
    }

    /// Replace what [`Self::wait`] does while nothing is pending.
    pub fn set_idle(&mut self, idle: fn(&Receiver)) {
        self.idle = idle;
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Union of all currently registered tags.
    pub fn registered(&self) -> Mask {
        self.sources.keys().copied().collect()
    }

    /// 注册一个事件源，分配最低的空闲位
    pub fn register(&mut self, source: S) -> Result<SourceTag, HubError> {
        let usable = if self.capacity == MASK_BITS {
            u64::MAX
        } else {
            (1u64 << self.capacity) - 1
        };
        let free = usable & !self.registered().raw();
        // free为0时trailing_zeros为64，from_bit返回None
        let tag = SourceTag::from_bit(free.trailing_zeros()).ok_or(HubError::CapacityExceeded {
            capacity: self.capacity,
        })?;

        self.sources.insert(tag, source);
        debug!("registered source with tag {}", tag);
        Ok(tag)
    }

    /// Remove a source.
    ///
    /// A signal for `tag` that is still pending is dropped; one that was
    /// already taken by a wait finds no source at dispatch and is skipped.
    pub fn unregister(&mut self, tag: SourceTag) -> Option<S> {
        let source = self.sources.remove(&tag)?;
        self.receiver.discard(tag);
        debug!("unregistered source with tag {}", tag);
        Some(source)
    }

    pub fn source(&self, tag: SourceTag) -> Option<&S> {
        self.sources.get(&tag)
    }

    pub fn source_mut(&mut self, tag: SourceTag) -> Option<&mut S> {
        self.sources.get_mut(&tag)
    }

    /// Handle for the interrupt side of `tag`.
    pub fn signaller(&self, tag: SourceTag) -> Option<Signaller> {
        self.sources
            .contains_key(&tag)
            .then(|| Signaller::new(self.receiver.clone(), tag))
    }

    pub fn receiver(&self) -> &Arc<Receiver> {
        &self.receiver
    }

    /// Block until at least one source signalled.
    ///
    /// Returns the OR of every tag signalled since the previous wait returned.
    /// This is the only suspension point of the dispatcher.
    pub fn wait(&self) -> Mask {
        let mask = self.receiver.wait(self.idle);
        trace!("wait returned {:?}", mask);
        mask
    }

    /// Non-blocking [`Self::wait`]; empty when nothing is pending.
    pub fn poll(&self) -> Mask {
        self.receiver.poll()
    }

    pub fn wait_async(&self) -> Wait<'_> {
        Wait::new(&self.receiver)
    }

    pub fn notifications(&self) -> Notifications {
        Notifications::new(self.receiver.clone())
    }

    /// Tags contained in `mask`, lowest first.
    pub fn sources_in(mask: Mask) -> Tags {
        mask.iter()
    }
}

impl<S> Default for NotificationHub<S> {
    fn default() -> Self {
        Self::new()
    }
}
