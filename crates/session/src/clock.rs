//! Wall-clock source for trip timestamps and the circadian risk hour

use chrono::{DateTime, FixedOffset, Local};

/// Current local time with its UTC offset
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<FixedOffset>;
}

/// System local time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Local::now().into()
    }
}
