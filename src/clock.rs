//! Time-of-day source for packet millistamps.
//!
//! Packets carry the milliseconds elapsed since local midnight. The packet
//! layer only needs a [`TimeSource`]; [`DayClock`] is a ready-made one built
//! on any free-running millisecond counter ([`Monotonic`]) plus occasional
//! synchronisation from a GPS, host or RTC.

use crate::consts::MILLIS_PER_DAY;
use crate::error::ClockError;

/// Provides the current time as milliseconds since midnight.
pub trait TimeSource {
    /// Milliseconds since local midnight, or a non-zero status code if the
    /// underlying clock could not be read.
    fn millis_since_midnight(&mut self) -> Result<u32, u8>;
}

/// A free-running millisecond counter, allowed to wrap at `u32::MAX`.
pub trait Monotonic {
    /// Milliseconds since an arbitrary epoch (typically boot).
    fn now_ms(&mut self) -> u32;
}

/// Time of day derived from a monotonic counter and the last synchronisation.
///
/// Before the first [`jump`](DayClock::jump) the counter itself is reported,
/// modulo one day.
#[derive(Debug)]
pub struct DayClock<M> {
    monotonic: M,
    /// `(millis since midnight, counter value)` at the last sync.
    synced: Option<(u32, u32)>,
    second_accuracy: bool,
    millisecond_accuracy: bool,
}

impl<M: Monotonic> DayClock<M> {
    /// Creates an unsynchronised clock.
    pub fn new(monotonic: M) -> Self {
        Self {
            monotonic,
            synced: None,
            second_accuracy: false,
            millisecond_accuracy: false,
        }
    }

    /// Synchronises to a millisecond-accurate time of day.
    pub fn jump(&mut self, millis_since_midnight: u32) -> Result<(), ClockError> {
        if millis_since_midnight >= MILLIS_PER_DAY {
            return Err(ClockError::BeyondMidnight(millis_since_midnight));
        }
        debug!("clock jump to {} ms", millis_since_midnight);
        let now = self.monotonic.now_ms();
        self.synced = Some((millis_since_midnight, now));
        self.second_accuracy = true;
        self.millisecond_accuracy = true;
        Ok(())
    }

    /// Synchronises to a time of day with one-second resolution, as read
    /// from a real-time clock.
    pub fn jump_hms(&mut self, hours: u8, minutes: u8, seconds: u8) -> Result<(), ClockError> {
        if hours >= 24 || minutes >= 60 || seconds >= 60 {
            return Err(ClockError::InvalidTime {
                hours,
                minutes,
                seconds,
            });
        }
        let secs = u32::from(hours) * 3600 + u32::from(minutes) * 60 + u32::from(seconds);
        self.jump(secs * 1000)?;
        self.millisecond_accuracy = false;
        Ok(())
    }

    /// The current time in milliseconds since midnight.
    pub fn millis(&mut self) -> u32 {
        let now = self.monotonic.now_ms();
        match self.synced {
            Some((base, at)) => {
                let elapsed = now.wrapping_sub(at) % MILLIS_PER_DAY;
                (base + elapsed) % MILLIS_PER_DAY
            }
            None => now % MILLIS_PER_DAY,
        }
    }

    /// Whether the clock has been synchronised to at least whole seconds.
    pub fn has_second_accuracy(&self) -> bool {
        self.second_accuracy
    }

    /// Whether the last synchronisation was millisecond accurate.
    pub fn has_millisecond_accuracy(&self) -> bool {
        self.millisecond_accuracy
    }

    /// Returns the underlying counter.
    pub fn release(self) -> M {
        self.monotonic
    }
}

impl<M: Monotonic> TimeSource for DayClock<M> {
    fn millis_since_midnight(&mut self) -> Result<u32, u8> {
        Ok(self.millis())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Counter(u32);

    impl Monotonic for Counter {
        fn now_ms(&mut self) -> u32 {
            self.0
        }
    }

    #[test]
    fn test_unsynced_wraps_at_midnight() {
        let mut clock = DayClock::new(Counter(MILLIS_PER_DAY + 5));
        assert_eq!(clock.millis(), 5);
        assert!(!clock.has_second_accuracy());
    }

    #[test]
    fn test_jump_tracks_elapsed_time() {
        let mut clock = DayClock::new(Counter(10_000));
        clock.jump(3_600_000).unwrap();
        clock.monotonic.0 = 12_500;
        assert_eq!(clock.millis_since_midnight(), Ok(3_602_500));
        assert!(clock.has_millisecond_accuracy());
    }

    #[test]
    fn test_rolls_over_midnight() {
        let mut clock = DayClock::new(Counter(0));
        clock.jump(MILLIS_PER_DAY - 1).unwrap();
        clock.monotonic.0 = 2;
        assert_eq!(clock.millis(), 1);
    }

    #[test]
    fn test_counter_wrap() {
        let mut clock = DayClock::new(Counter(u32::MAX - 9));
        clock.jump(0).unwrap();
        clock.monotonic.0 = 10;
        assert_eq!(clock.millis(), 20);
    }

    #[test]
    fn test_rejects_out_of_range() {
        let mut clock = DayClock::new(Counter(0));
        assert_eq!(
            clock.jump(MILLIS_PER_DAY),
            Err(ClockError::BeyondMidnight(MILLIS_PER_DAY))
        );
        assert!(matches!(
            clock.jump_hms(24, 0, 0),
            Err(ClockError::InvalidTime { hours: 24, .. })
        ));
    }

    #[test]
    fn test_jump_hms_second_accuracy() {
        let mut clock = DayClock::new(Counter(0));
        clock.jump_hms(1, 2, 3).unwrap();
        assert_eq!(clock.millis(), 3_723_000);
        assert!(clock.has_second_accuracy());
        assert!(!clock.has_millisecond_accuracy());
    }
}
