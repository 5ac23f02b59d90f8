//! 错误类型
//!
//! Unknown scan codes are deliberately absent here: the decoder drops them
//! silently and only reports them through [`crate::keyboard::Decoded::Dropped`].

use thiserror::Error;

use crate::io::SourceId;

/// Errors returned by [`crate::event::NotificationHub`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum HubError {
    /// 所有的tag位都已被占用
    #[error("all {capacity} source tags are in use")]
    CapacityExceeded { capacity: u32 },

    /// 容量必须在1..=64之间
    #[error("hub capacity must be between 1 and 64, got {0}")]
    InvalidCapacity(u32),
}

/// Failures reported by an [`crate::io::InterruptControl`] implementation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum IrqError {
    #[error("source {0} has no interrupt line assigned")]
    NotAssigned(SourceId),

    #[error("source {0} is not bound to an interrupt line")]
    NotBound(SourceId),

    #[error("interrupt line {0} is already bound")]
    LineInUse(u8),

    #[error("interrupt line {0} does not exist")]
    InvalidLine(u8),

    #[error("interrupt controller rejected the request: {0}")]
    Rejected(&'static str),
}

/// Errors that end the event loop.
///
/// Everything except [`DispatchError::Hub`] is fatal to the root task: there is
/// nobody above it to restart the loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Hub(#[from] HubError),

    #[error("failed to bind interrupt for source {id}")]
    Bind {
        id: SourceId,
        #[source]
        cause: IrqError,
    },

    /// 中断未能确认，之后不会再有任何中断送达
    #[error("interrupt for source {id} was not acknowledged")]
    UnacknowledgedInterrupt {
        id: SourceId,
        #[source]
        cause: IrqError,
    },
}

/// Rejected [`crate::config::Config`] values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Hub(#[from] HubError),

    #[error("scancode queue depth must be non-zero")]
    EmptyQueue,
}

/// Scan code set detection did not match either calibration pattern.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum DetectError {
    #[error("calibration bytes {first:#04x}, {second:#04x} match no scan code set")]
    Mismatch { first: u8, second: u8 },

    #[error("byte stream ended before the calibration sequence completed")]
    Incomplete,
}

/// PS/2 controller or keyboard command failures.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum Ps2Error {
    #[error("keyboard did not acknowledge command {0:#04x} after {1} attempts")]
    NoAck(u8, u32),

    #[error("keyboard self test failed with {0:#04x}")]
    SelfTestFailed(u8),

    #[error("controller timed out waiting for the {0} buffer")]
    Timeout(&'static str),
}
