//! error types for social-recovery

use std::time::Duration;

use thiserror::Error;

use crate::timelock::format_duration;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    // === split parameters ===
    #[error("invalid split parameters: {0}")]
    InvalidParams(String),

    #[error("invalid time delay: {0}")]
    InvalidDelay(String),

    // === reconstruction ===
    #[error("not enough shares: have {have}, need {need}")]
    InsufficientShares { have: usize, need: usize },

    #[error("share #{0} supplied more than once")]
    DuplicateShare(u8),

    #[error("shares do not belong to the same split: {0}")]
    InconsistentShareSet(&'static str),

    #[error("share #{index} is time-locked for another {}", format_duration(.remaining))]
    ShareNotYetUsable { index: u8, remaining: Duration },

    // === encoding ===
    #[error("share checksum mismatch")]
    CorruptShare,

    #[error("malformed share: {0}")]
    MalformedShare(&'static str),

    #[error("invalid user backup: {0}")]
    InvalidBackup(&'static str),

    // === clock ===
    #[error("system clock is set before the unix epoch")]
    ClockBeforeEpoch,

    // === field ===
    #[error("division by zero in GF(256)")]
    DivisionByZero,
}
