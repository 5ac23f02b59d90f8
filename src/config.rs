//! 启动配置

use log::LevelFilter;

use crate::error::{ConfigError, HubError};
use crate::event::{idle, Receiver, MASK_BITS};
use crate::keyboard::ScanCodeSet;

/// Depth of the interrupt-side scancode queue.
pub const DEFAULT_QUEUE_DEPTH: usize = 100;

/// How the keyboard's scan code set is chosen at bring-up.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScanSetSelection {
    /// 固定使用某个扫描码集
    Fixed(ScanCodeSet),
    /// 根据一次按键的字节序列判断
    Detect,
}

/// What a blocking wait does while no tag is pending.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum IdleStrategy {
    /// 忙等
    #[default]
    Spin,
    /// `hlt` until the next interrupt. Only available on bare-metal x86_64;
    /// elsewhere it falls back to [`IdleStrategy::Spin`].
    Halt,
}

impl IdleStrategy {
    pub fn hook(self) -> fn(&Receiver) {
        match self {
            IdleStrategy::Spin => idle::spin,
            #[cfg(all(target_arch = "x86_64", target_os = "none"))]
            IdleStrategy::Halt => idle::halt,
            #[cfg(not(all(target_arch = "x86_64", target_os = "none")))]
            IdleStrategy::Halt => idle::spin,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    /// Number of source tags the hub may hand out.
    pub hub_capacity: u32,
    pub scan_set: ScanSetSelection,
    pub scancode_queue_depth: usize,
    pub log_level: LevelFilter,
    pub idle: IdleStrategy,
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.hub_capacity == 0 || self.hub_capacity > MASK_BITS {
            return Err(HubError::InvalidCapacity(self.hub_capacity).into());
        }
        if self.scancode_queue_depth == 0 {
            return Err(ConfigError::EmptyQueue);
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            hub_capacity: MASK_BITS,
            // 大部分键盘开机后默认使用扫描码集2
            scan_set: ScanSetSelection::Fixed(ScanCodeSet::Set2),
            scancode_queue_depth: DEFAULT_QUEUE_DEPTH,
            log_level: LevelFilter::Debug,
            idle: IdleStrategy::Spin,
        }
    }
}
