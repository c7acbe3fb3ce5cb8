//! time-delayed emergency shares
//!
//! one share of a split can carry a "not before" timestamp. until that moment
//! the share is treated as absent when reconstructing.
//!
//! ## limitation
//!
//! this is a procedural gate, not a cryptographic one. the share's index and
//! value sit in the encoded string from the moment it is created, and the
//! timestamp is only protected by the transcription checksum. a holder who
//! re-encodes the share or patches the client can use it immediately. it
//! slows down casual or coerced early recovery, nothing more, and must not be
//! presented to users as tamper-proof.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::share::Share;
use crate::{Error, Result};

const MINUTE: u64 = 60;
const HOUR: u64 = 60 * MINUTE;
const DAY: u64 = 24 * HOUR;
const WEEK: u64 = 7 * DAY;

/// earliest unix time (seconds) at which a share may be used
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeLock {
    pub not_before: u64,
}

impl TimeLock {
    /// lock that opens `delay` after `now`
    pub fn after(now: u64, delay: Duration) -> Result<Self> {
        let not_before = now
            .checked_add(delay.as_secs())
            .ok_or_else(|| Error::InvalidDelay("delay overflows the clock".into()))?;
        Ok(Self { not_before })
    }

    pub fn is_open(&self, now: u64) -> bool {
        now >= self.not_before
    }

    /// time left until the lock opens, `None` once open
    pub fn remaining(&self, now: u64) -> Option<Duration> {
        if self.is_open(now) {
            None
        } else {
            Some(Duration::from_secs(self.not_before - now))
        }
    }
}

/// whether a share may take part in reconstruction at `now`
pub fn is_currently_valid(share: &Share, now: u64) -> bool {
    share.time_lock.map_or(true, |lock| lock.is_open(now))
}

/// wait left before a share becomes usable
pub fn remaining_delay(share: &Share, now: u64) -> Option<Duration> {
    share.time_lock.and_then(|lock| lock.remaining(now))
}

/// split shares into (usable, still locked) at `now`
pub fn partition_usable(shares: Vec<Share>, now: u64) -> (Vec<Share>, Vec<Share>) {
    shares
        .into_iter()
        .partition(|share| is_currently_valid(share, now))
}

/// current unix time in seconds
pub fn unix_now() -> Result<u64> {
    unix_seconds(SystemTime::now())
}

/// unix seconds of `time`; a pre-epoch clock is an error, not zero
fn unix_seconds(time: SystemTime) -> Result<u64> {
    time.duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .map_err(|_| Error::ClockBeforeEpoch)
}

/// parse a human delay like `0`, `3600`, `30d`, `2 weeks` or `1d 12h`
///
/// a bare number is seconds and must stand alone.
pub fn parse_delay(input: &str) -> Result<Duration> {
    let invalid = || Error::InvalidDelay(format!("cannot parse '{}'", input));

    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidDelay("empty delay".into()));
    }
    if trimmed.bytes().all(|b| b.is_ascii_digit()) {
        let secs: u64 = trimmed.parse().map_err(|_| invalid())?;
        return Ok(Duration::from_secs(secs));
    }

    let mut total: u64 = 0;
    let mut rest = trimmed;
    while !rest.is_empty() {
        let digits = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len());
        if digits == 0 {
            return Err(invalid());
        }
        let value: u64 = rest[..digits].parse().map_err(|_| invalid())?;
        rest = rest[digits..].trim_start();

        let letters = rest
            .find(|c: char| !c.is_ascii_alphabetic())
            .unwrap_or(rest.len());
        let unit = unit_seconds(&rest[..letters]).ok_or_else(invalid)?;
        rest = rest[letters..].trim_start_matches(|c: char| c.is_whitespace() || c == ',');

        total = value
            .checked_mul(unit)
            .and_then(|secs| total.checked_add(secs))
            .ok_or_else(invalid)?;
    }

    Ok(Duration::from_secs(total))
}

fn unit_seconds(unit: &str) -> Option<u64> {
    match unit.to_ascii_lowercase().as_str() {
        "s" | "sec" | "secs" | "second" | "seconds" => Some(1),
        "m" | "min" | "mins" | "minute" | "minutes" => Some(MINUTE),
        "h" | "hr" | "hrs" | "hour" | "hours" => Some(HOUR),
        "d" | "day" | "days" => Some(DAY),
        "w" | "wk" | "week" | "weeks" => Some(WEEK),
        _ => None,
    }
}

/// render a wait as its two most significant units, e.g. `29d 23h`
pub fn format_duration(duration: &Duration) -> String {
    let mut secs = duration.as_secs();
    if secs == 0 {
        return "0s".into();
    }

    let mut parts = Vec::with_capacity(2);
    for (size, suffix) in [(DAY, "d"), (HOUR, "h"), (MINUTE, "m"), (1, "s")] {
        let count = secs / size;
        secs %= size;
        if count > 0 {
            parts.push(format!("{}{}", count, suffix));
        }
        if parts.len() == 2 {
            break;
        }
    }
    parts.join(" ")
}
