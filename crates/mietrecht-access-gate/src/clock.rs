//! Wall-clock source for time-of-day risk.

use chrono::{Local, Timelike};

/// Failure to read the clock.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
#[error("clock unavailable: {0}")]
pub struct ClockError(pub String);

/// Source of the current local hour-of-day.
pub trait Clock: Send + Sync {
    /// Current hour in `[0, 23]`, local process time.
    fn local_hour(&self) -> Result<u32, ClockError>;
}

/// The process clock in the local timezone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn local_hour(&self) -> Result<u32, ClockError> {
        Ok(Local::now().hour())
    }
}

/// A clock frozen at one hour.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    hour: u32,
}

impl FixedClock {
    /// Create a fixed clock. Fails for hours outside `[0, 23]`.
    pub fn at_hour(hour: u32) -> Result<Self, ClockError> {
        if hour > 23 {
            return Err(ClockError(format!("hour {hour} out of range")));
        }
        Ok(Self { hour })
    }
}

impl Clock for FixedClock {
    fn local_hour(&self) -> Result<u32, ClockError> {
        Ok(self.hour)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_clock_in_range() {
        let hour = SystemClock.local_hour().unwrap();
        assert!(hour <= 23);
    }

    #[test]
    fn test_fixed_clock() {
        assert_eq!(FixedClock::at_hour(3).unwrap().local_hour(), Ok(3));
        assert_eq!(FixedClock::at_hour(0).unwrap().local_hour(), Ok(0));
        assert!(FixedClock::at_hour(24).is_err());
    }
}
