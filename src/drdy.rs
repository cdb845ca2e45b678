//! Data-ready signalling between the interrupt context and the driver.
//!
//! The converter pulls DRDY low when a conversion result is available. The
//! board's interrupt handler calls [`DataReady::signal`] on that falling edge;
//! the driver polls and consumes the flag before every bus exchange.
//!
//! The flag has a single writer (the interrupt) and a single reader (the
//! driver). Consuming it is an atomic swap, so an edge that arrives between
//! the check and the clear is never lost.
//!
//! ## Example
//!
//! ```rust
//! use telemetry_core::drdy::DataReady;
//!
//! static READY: DataReady = DataReady::new();
//!
//! // In the DRDY falling-edge interrupt handler:
//! READY.signal();
//!
//! // In the main context:
//! assert!(READY.poll().is_ok());
//! assert!(READY.poll().is_err());
//! ```

use embedded_hal::delay::DelayNs;
use portable_atomic::{AtomicBool, Ordering};

use crate::error::AdcError;

/// A pending wait was cancelled by [`DataReady::cancel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct Cancelled;

/// The shared data-ready indicator.
///
/// Intended to live in a `static` so the interrupt handler can reach it.
#[derive(Debug)]
pub struct DataReady {
    ready: AtomicBool,
    cancelled: AtomicBool,
}

impl DataReady {
    /// Creates a cleared indicator.
    pub const fn new() -> Self {
        Self {
            ready: AtomicBool::new(false),
            cancelled: AtomicBool::new(false),
        }
    }

    /// Marks a conversion as ready. Call from the DRDY interrupt.
    pub fn signal(&self) {
        self.ready.store(true, Ordering::Release);
    }

    /// Aborts the current (or next) wait with [`AdcError::Cancelled`].
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Consumes a pending ready signal.
    ///
    /// Returns `WouldBlock` while no signal is pending. A cancellation takes
    /// precedence and is consumed as well.
    pub fn poll(&self) -> nb::Result<(), Cancelled> {
        if self.cancelled.swap(false, Ordering::AcqRel) {
            return Err(nb::Error::Other(Cancelled));
        }
        if self.ready.swap(false, Ordering::AcqRel) {
            Ok(())
        } else {
            Err(nb::Error::WouldBlock)
        }
    }

    /// Whether a ready signal is pending, without consuming it.
    pub fn is_pending(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// Drops any pending ready or cancel signal.
    pub fn clear(&self) {
        self.ready.store(false, Ordering::Release);
        self.cancelled.store(false, Ordering::Release);
    }
}

impl Default for DataReady {
    fn default() -> Self {
        Self::new()
    }
}

/// Routes the DRDY falling edge to a [`DataReady`].
///
/// Implemented by the board: typically this configures the pin's external
/// interrupt and stores `ready` where the handler can call
/// [`DataReady::signal`].
pub trait InterruptSource {
    /// Error raised while configuring the interrupt.
    type Error: core::fmt::Debug;

    /// Arms the falling-edge interrupt so that it signals `ready`.
    fn attach(&mut self, ready: &'static DataReady) -> Result<(), Self::Error>;
}

/// Blocks until `ready` is signalled, checking every `poll_us`.
///
/// Gives up with [`AdcError::Timeout`] once `timeout_us` has been spent
/// sleeping.
pub(crate) fn wait_ready<D, S, P>(
    ready: &DataReady,
    delay: &mut D,
    timeout_us: u32,
    poll_us: u32,
) -> Result<(), AdcError<S, P>>
where
    D: DelayNs,
{
    let step = poll_us.max(1);
    let mut waited: u32 = 0;
    loop {
        match ready.poll() {
            Ok(()) => return Ok(()),
            Err(nb::Error::Other(Cancelled)) => return Err(AdcError::Cancelled),
            Err(nb::Error::WouldBlock) => {}
        }
        if waited >= timeout_us {
            warn!("no data ready after {} us", waited);
            return Err(AdcError::Timeout(timeout_us));
        }
        delay.delay_us(step);
        waited = waited.saturating_add(step);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Error = AdcError<(), ()>;

    /// Counts requested sleep and signals after `fire_after_us`.
    struct Sleeper {
        ready: &'static DataReady,
        slept_us: u32,
        fire_after_us: Option<u32>,
    }

    impl DelayNs for Sleeper {
        fn delay_ns(&mut self, ns: u32) {
            self.slept_us += ns / 1_000;
            if let Some(t) = self.fire_after_us {
                if self.slept_us >= t {
                    self.ready.signal();
                }
            }
        }
    }

    #[test]
    fn test_poll_consumes_signal() {
        static READY: DataReady = DataReady::new();
        assert_eq!(READY.poll(), Err(nb::Error::WouldBlock));
        READY.signal();
        assert!(READY.is_pending());
        assert_eq!(READY.poll(), Ok(()));
        assert_eq!(READY.poll(), Err(nb::Error::WouldBlock));
    }

    #[test]
    fn test_cancel_takes_precedence() {
        static READY: DataReady = DataReady::new();
        READY.signal();
        READY.cancel();
        assert_eq!(READY.poll(), Err(nb::Error::Other(Cancelled)));
        assert_eq!(READY.poll(), Ok(()));
    }

    #[test]
    fn test_clear() {
        static READY: DataReady = DataReady::new();
        READY.signal();
        READY.cancel();
        READY.clear();
        assert!(!READY.is_pending());
        assert_eq!(READY.poll(), Err(nb::Error::WouldBlock));
    }

    #[test]
    fn test_wait_returns_once_signalled() {
        static READY: DataReady = DataReady::new();
        let mut delay = Sleeper {
            ready: &READY,
            slept_us: 0,
            fire_after_us: Some(50),
        };
        let result: Result<(), Error> = wait_ready(&READY, &mut delay, 1_000, 10);
        assert_eq!(result, Ok(()));
        assert_eq!(delay.slept_us, 50);
    }

    #[test]
    fn test_wait_times_out() {
        static READY: DataReady = DataReady::new();
        let mut delay = Sleeper {
            ready: &READY,
            slept_us: 0,
            fire_after_us: None,
        };
        let result: Result<(), Error> = wait_ready(&READY, &mut delay, 100, 10);
        assert_eq!(result, Err(AdcError::Timeout(100)));
        assert_eq!(delay.slept_us, 100);
    }

    #[test]
    fn test_wait_cancelled() {
        static READY: DataReady = DataReady::new();
        READY.cancel();
        let mut delay = Sleeper {
            ready: &READY,
            slept_us: 0,
            fire_after_us: None,
        };
        let result: Result<(), Error> = wait_ready(&READY, &mut delay, 100, 10);
        assert_eq!(result, Err(AdcError::Cancelled));
        assert_eq!(delay.slept_us, 0);
    }
}
