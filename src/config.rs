//! Timing and reference configuration for the ADC driver.
//!
//! Defaults follow the ADS1256 datasheet timing (t6, t11, reset pulse) with
//! generous margins, and a 2.5 V reference.

/// Driver configuration.
///
/// ```rust
/// use telemetry_core::config::AdcConfig;
///
/// let config = AdcConfig::default()
///     .with_vref(2.048)
///     .with_drdy_timeout_us(250_000);
/// assert_eq!(config.t6_us, 7);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct AdcConfig {
    /// Reference voltage in volts.
    pub vref: f32,
    /// Longest wait for data ready before giving up, in microseconds.
    pub drdy_timeout_us: u32,
    /// Interval between data-ready checks, in microseconds.
    pub drdy_poll_us: u32,
    /// Length of the RESET low pulse, in milliseconds.
    pub reset_low_ms: u32,
    /// Settle time after releasing RESET, in milliseconds.
    pub reset_settle_ms: u32,
    /// Settle time after each register access, in milliseconds.
    pub register_settle_ms: u32,
    /// Settle time after preloading the first cycling channel, in milliseconds.
    pub cycle_preload_ms: u32,
    /// Delay between SYNC and WAKEUP (t11), in microseconds.
    pub sync_settle_us: u32,
    /// Delay between a read command and clocking out data (t6), in microseconds.
    pub t6_us: u32,
    /// Delay after asserting chip select, in microseconds.
    pub cs_setup_us: u32,
}

impl AdcConfig {
    /// Sets the reference voltage.
    pub const fn with_vref(mut self, vref: f32) -> Self {
        self.vref = vref;
        self
    }

    /// Sets the data-ready timeout.
    pub const fn with_drdy_timeout_us(mut self, us: u32) -> Self {
        self.drdy_timeout_us = us;
        self
    }

    /// Sets the data-ready polling interval.
    pub const fn with_drdy_poll_us(mut self, us: u32) -> Self {
        self.drdy_poll_us = us;
        self
    }

    /// Sets the reset pulse and the settle time that follows it.
    pub const fn with_reset_timing(mut self, low_ms: u32, settle_ms: u32) -> Self {
        self.reset_low_ms = low_ms;
        self.reset_settle_ms = settle_ms;
        self
    }

    /// Sets the settle time after register accesses.
    pub const fn with_register_settle_ms(mut self, ms: u32) -> Self {
        self.register_settle_ms = ms;
        self
    }

    /// Sets the settle time after preloading a cycling session.
    pub const fn with_cycle_preload_ms(mut self, ms: u32) -> Self {
        self.cycle_preload_ms = ms;
        self
    }
}

impl Default for AdcConfig {
    fn default() -> Self {
        Self {
            vref: 2.5,
            drdy_timeout_us: 1_000_000,
            drdy_poll_us: 10,
            reset_low_ms: 200,
            reset_settle_ms: 1_000,
            register_settle_ms: 100,
            cycle_preload_ms: 50,
            sync_settle_us: 4,
            t6_us: 7,
            cs_setup_us: 5,
        }
    }
}
