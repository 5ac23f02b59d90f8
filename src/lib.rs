// src/lib.rs

//! Interrupt multiplexing and PS/2 keyboard decoding for a single-threaded
//! root task.
//!
//! Interrupt handlers raise their line ([`interrupts::raise`]); the line's
//! [`event::Signaller`] ORs a tag bit into the hub's receiver; the
//! [`dispatch::EventLoop`] wakes, drains each fired device and feeds keyboard
//! bytes through a [`keyboard::Ps2Decoder`].

#![cfg_attr(not(test), no_std)] // 不链接Rust标准库

extern crate alloc;

pub mod config;
pub mod dispatch;
pub mod error;
pub mod event;
pub mod interrupts;
pub mod io;
pub mod keyboard;
pub mod logger;
pub mod task;

pub use config::{Config, IdleStrategy};
pub use dispatch::{EventLoop, Handler};
pub use error::{DispatchError, HubError};
pub use event::{Mask, NotificationHub, SourceTag};
pub use io::{ByteSource, InterruptControl, SourceId};
pub use keyboard::{KeyEvent, Ps2Decoder, ScanCodeSet, VirtualKey};

/// 启动：安装串口日志并初始化8259
#[cfg(target_arch = "x86_64")]
pub fn init(config: &Config) -> Result<(), log::SetLoggerError> {
    logger::init_serial(config.log_level)?;
    interrupts::pics::init();
    log::info!("irqmux initialized, idle {:?}", config.idle);
    Ok(())
}
