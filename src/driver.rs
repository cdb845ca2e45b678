//! ADS1256 24-bit delta-sigma ADC driver.
//!
//! This module provides the [`Ads1256`] struct, which configures the converter
//! over SPI and reads conversion results synchronised to its DRDY signal. It is
//! written against the `embedded-hal` 1.0 traits and runs without an allocator.
//!
//! Every bus exchange is gated on data ready: the board routes the DRDY
//! falling edge to a [`DataReady`] (see [`InterruptSource`]) and the driver
//! consumes that flag before talking to the device. Waits are bounded by
//! [`AdcConfig::drdy_timeout_us`] and can be aborted with
//! [`DataReady::cancel`].
//!
//! ## Acquisition modes
//!
//! - [`read_single`](Ads1256::read_single): one `RDATA` per call
//! - [`read_continuous`](Ads1256::read_continuous): `RDATAC` once, then one
//!   result per data ready
//! - [`cycle_single_ended`](Ads1256::cycle_single_ended) and
//!   [`cycle_differential`](Ads1256::cycle_differential): rotate the
//!   multiplexer through 8 single-ended or 4 differential inputs, one step per
//!   call
//!
//! Continuous and cycling sessions keep chip select asserted until
//! [`stop_conversion`](Ads1256::stop_conversion). Register access is refused
//! with [`AdcError::SessionActive`] while one is running.
//!
//! ## Example
//!
//! ```rust,no_run
//! # use embedded_hal_mock::eh1::delay::NoopDelay;
//! # use embedded_hal_mock::eh1::digital::Mock as Pin;
//! # use embedded_hal_mock::eh1::spi::Mock as Spi;
//! # use telemetry_core::drdy::InterruptSource;
//! # struct Exti;
//! # impl InterruptSource for Exti {
//! #     type Error = embedded_hal::digital::ErrorKind;
//! #     fn attach(&mut self, _: &'static DataReady) -> Result<(), Self::Error> { Ok(()) }
//! # }
//! # let (spi, cs) = (Spi::new(&[]), Pin::new(&[]));
//! use telemetry_core::config::AdcConfig;
//! use telemetry_core::drdy::DataReady;
//! use telemetry_core::driver::Ads1256;
//! use telemetry_core::registers::Gain;
//!
//! static READY: DataReady = DataReady::new();
//!
//! let mut adc: Ads1256<Spi<u8>, Pin, Pin, Pin, Exti, NoopDelay> =
//!     Ads1256::new(spi, cs, Exti, NoopDelay::new(), &READY, AdcConfig::default());
//! adc.init().unwrap();
//! adc.set_gain(Gain::X4).unwrap();
//!
//! loop {
//!     let raw = adc.cycle_differential().unwrap();
//!     let volts = adc.convert_to_voltage(raw);
//!     # let _ = volts;
//! }
//! ```
//!
//! ## Pipeline delay while cycling
//!
//! Each cycling step selects the *next* channel before reading, so the value
//! returned belongs to the channel selected on the previous call. The first
//! call returns the preloaded first channel.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{self, OutputPin};
use embedded_hal::spi::{self, SpiBus};

use crate::config::AdcConfig;
use crate::consts::{opcode, register};
use crate::drdy::{self, DataReady, InterruptSource};
use crate::error::AdcError;
use crate::registers::{
    Adcon, ByteOrder, ClockOut, DataRate, Direction, Drate, Gain, Gpio, Input, Mux, Register,
    SensorDetect, Status,
};

/// Result of a driver operation on bus `SPI` with pins of type `CS`.
pub type AdcResult<T, SPI, CS> = Result<
    T,
    AdcError<<SPI as spi::ErrorType>::Error, <CS as digital::ErrorType>::Error>,
>;

/// STATUS written by [`Ads1256::init`]: buffer and auto-calibration on, MSB first.
const INIT_STATUS: u8 = 0x36;
/// MUX written by [`Ads1256::init`]: AIN0 against AIN1.
const INIT_MUX: u8 = 0x01;
/// ADCON written by [`Ads1256::init`]: clock out off, sensor detect off, gain 1.
const INIT_ADCON: u8 = 0x00;
/// DRATE written by [`Ads1256::init`]: 100 SPS.
const INIT_DRATE: u8 = 0x82;

const SINGLE_ENDED: [Mux; 8] = [
    Mux::select(Input::Ain0, Input::AinCom),
    Mux::select(Input::Ain1, Input::AinCom),
    Mux::select(Input::Ain2, Input::AinCom),
    Mux::select(Input::Ain3, Input::AinCom),
    Mux::select(Input::Ain4, Input::AinCom),
    Mux::select(Input::Ain5, Input::AinCom),
    Mux::select(Input::Ain6, Input::AinCom),
    Mux::select(Input::Ain7, Input::AinCom),
];

const DIFFERENTIAL: [Mux; 4] = [
    Mux::select(Input::Ain0, Input::Ain1),
    Mux::select(Input::Ain2, Input::Ain3),
    Mux::select(Input::Ain4, Input::Ain5),
    Mux::select(Input::Ain6, Input::Ain7),
];

/// Which multiplexer rotation a cycling session runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum CycleMode {
    /// AIN0-AIN7, each against AINCOM.
    SingleEnded,
    /// AIN0/1, AIN2/3, AIN4/5, AIN6/7.
    Differential,
}

impl CycleMode {
    /// The multiplexer settings visited, in order.
    pub fn channels(self) -> &'static [Mux] {
        match self {
            Self::SingleEnded => &SINGLE_ENDED,
            Self::Differential => &DIFFERENTIAL,
        }
    }
}

/// What the converter is currently doing on the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum Acquisition {
    /// No session; registers may be accessed.
    #[default]
    Idle,
    /// Read data continuously (`RDATAC`) is active.
    Continuous,
    /// A multiplexed cycling session is active.
    Cycling {
        /// The rotation in progress.
        mode: CycleMode,
        /// Index of the channel currently selected on the multiplexer.
        index: u8,
    },
}

/// Sign-extends a 24-bit two's-complement conversion result.
pub fn sign_extend_24(raw: u32) -> i32 {
    ((raw << 8) as i32) >> 8
}

/// Converts a raw 24-bit result to volts.
///
/// `voltage = (2 · vref / 2^23) · raw / 2^gain`. Scaling is done with exact
/// power-of-two steps, so the result is reproducible bit for bit.
pub fn to_voltage(raw: u32, vref: f32, gain: Gain) -> f32 {
    let counts = sign_extend_24(raw) as f32;
    let lsb = libm::ldexpf(2.0 * vref, -23);
    libm::ldexpf(lsb * counts, -i32::from(gain.exponent()))
}

/// A driver for the ADS1256 on an exclusively owned SPI bus.
///
/// ## Type Parameters
///
/// - `SPI`: the bus, SPI mode 1, at most f_CLKIN / 4
/// - `CS`: chip select output
/// - `RST`, `SYNC`: optional RESET and SYNC/PDWN outputs
/// - `IRQ`: routes the DRDY falling edge to the shared [`DataReady`]
/// - `D`: delay provider for datasheet timings and data-ready polling
///
/// The driver keeps a shadow copy of every control register. Setters update
/// one field of the shadow, write the whole register, and only then commit
/// the new shadow, so the shadow always matches the device.
#[derive(Debug)]
pub struct Ads1256<SPI, CS, RST, SYNC, IRQ, D> {
    spi: SPI,
    cs: CS,
    reset: Option<RST>,
    sync: Option<SYNC>,
    irq: IRQ,
    delay: D,
    ready: &'static DataReady,
    config: AdcConfig,
    status: Status,
    mux: Mux,
    adcon: Adcon,
    drate: Drate,
    gpio: Gpio,
    acquisition: Acquisition,
}

impl<SPI, CS, RST, SYNC, IRQ, D> Ads1256<SPI, CS, RST, SYNC, IRQ, D>
where
    SPI: SpiBus<u8>,
    CS: OutputPin,
    RST: OutputPin<Error = CS::Error>,
    SYNC: OutputPin<Error = CS::Error>,
    IRQ: InterruptSource,
    D: DelayNs,
{
    /// Creates a driver. Nothing is sent until [`init`](Ads1256::init).
    ///
    /// Register shadows start at the device's power-on values.
    pub fn new(
        spi: SPI,
        cs: CS,
        irq: IRQ,
        delay: D,
        ready: &'static DataReady,
        config: AdcConfig,
    ) -> Self {
        Self {
            spi,
            cs,
            reset: None,
            sync: None,
            irq,
            delay,
            ready,
            config,
            status: Status::new(),
            mux: Mux::select(Input::Ain0, Input::Ain1),
            adcon: Adcon::new().with_clk(ClockOut::Full),
            drate: Drate::new().with_rate(Ok(DataRate::Sps30000)),
            gpio: Gpio::RESET,
            acquisition: Acquisition::Idle,
        }
    }

    /// Adds a RESET line, pulsed by [`init`](Ads1256::init).
    pub fn with_reset(mut self, reset: RST) -> Self {
        self.reset = Some(reset);
        self
    }

    /// Adds a SYNC/PDWN line, driven high by [`init`](Ads1256::init).
    pub fn with_sync(mut self, sync: SYNC) -> Self {
        self.sync = Some(sync);
        self
    }

    /// Resets and configures the converter.
    ///
    /// Asserts chip select, pulses RESET and raises SYNC if present, arms the
    /// data-ready interrupt, writes the default STATUS, MUX, ADCON and DRATE
    /// values and runs a self-calibration. Leaves the driver idle.
    pub fn init(&mut self) -> AdcResult<(), SPI, CS> {
        self.acquisition = Acquisition::Idle;
        self.ready.clear();
        self.select()?;

        if let Some(reset) = self.reset.as_mut() {
            reset.set_low().map_err(AdcError::Pin)?;
            self.delay.delay_ms(self.config.reset_low_ms);
            reset.set_high().map_err(AdcError::Pin)?;
            self.delay.delay_ms(self.config.reset_settle_ms);
        }
        if let Some(sync) = self.sync.as_mut() {
            sync.set_high().map_err(AdcError::Pin)?;
        }

        if self.irq.attach(self.ready).is_err() {
            warn!("could not arm the data-ready interrupt");
            let _ = self.deselect();
            return Err(AdcError::Interrupt);
        }

        self.status = self.write_shadow(Status::from_bits(INIT_STATUS))?;
        self.mux = self.write_shadow(Mux::from_bits(INIT_MUX))?;
        self.adcon = self.write_shadow(Adcon::from_bits(INIT_ADCON))?;
        self.drate = self.write_shadow(Drate::from_bits(INIT_DRATE))?;
        self.self_calibrate()?;
        debug!("ADS1256 initialised");
        Ok(())
    }

    /// Sends a single-byte command with chip select asserted around it.
    ///
    /// Refused with [`AdcError::SessionActive`] while a session holds the bus.
    pub fn send_command(&mut self, command: u8) -> AdcResult<(), SPI, CS> {
        self.ensure_idle()?;
        self.select()?;
        let sent = self.command_selected(command);
        self.release_on_error(sent)?;
        self.deselect()
    }

    /// Runs offset and gain self-calibration (`SELFCAL`).
    pub fn self_calibrate(&mut self) -> AdcResult<(), SPI, CS> {
        self.send_command(opcode::SELFCAL)?;
        self.delay.delay_ms(self.config.register_settle_ms);
        Ok(())
    }

    /// Reads one register.
    pub fn read_register(&mut self, address: u8) -> AdcResult<u8, SPI, CS> {
        if address > register::LAST {
            return Err(AdcError::InvalidRegister(address));
        }
        self.ensure_idle()?;
        self.wait()?;

        self.select()?;
        let read = self.read_register_selected(address);
        let value = self.release_on_error(read)?;
        self.deselect()?;
        self.delay.delay_ms(self.config.register_settle_ms);
        trace!("RREG {:#x} -> {:#x}", address, value);
        Ok(value)
    }

    /// Selects the input pair.
    pub fn set_mux(&mut self, mux: Mux) -> AdcResult<(), SPI, CS> {
        self.mux = self.write_shadow(mux)?;
        Ok(())
    }

    /// Selects `positive` against `negative`.
    pub fn set_inputs(&mut self, positive: Input, negative: Input) -> AdcResult<(), SPI, CS> {
        self.set_mux(Mux::select(positive, negative))
    }

    /// Sets the data rate.
    pub fn set_data_rate(&mut self, rate: DataRate) -> AdcResult<(), SPI, CS> {
        self.drate = self.write_shadow(self.drate.with_rate(Ok(rate)))?;
        Ok(())
    }

    /// Sets the amplifier gain. Clock out and sensor detect are preserved.
    pub fn set_gain(&mut self, gain: Gain) -> AdcResult<(), SPI, CS> {
        self.adcon = self.write_shadow(self.adcon.with_pga(gain))?;
        Ok(())
    }

    /// Sets the D0/CLKOUT rate.
    pub fn set_clock_out(&mut self, clock: ClockOut) -> AdcResult<(), SPI, CS> {
        self.adcon = self.write_shadow(self.adcon.with_clk(clock))?;
        Ok(())
    }

    /// Sets the sensor detect current sources.
    pub fn set_sensor_detect(&mut self, sdcs: SensorDetect) -> AdcResult<(), SPI, CS> {
        self.adcon = self.write_shadow(self.adcon.with_sdcs(sdcs))?;
        Ok(())
    }

    /// Sets the bit order of each output byte.
    pub fn set_byte_order(&mut self, order: ByteOrder) -> AdcResult<(), SPI, CS> {
        self.status = self.write_shadow(self.status.with_order(order))?;
        Ok(())
    }

    /// Enables or disables auto-calibration.
    pub fn set_auto_calibration(&mut self, enabled: bool) -> AdcResult<(), SPI, CS> {
        self.status = self.write_shadow(self.status.with_acal(enabled))?;
        Ok(())
    }

    /// Enables or disables the analog input buffer.
    pub fn set_buffer(&mut self, enabled: bool) -> AdcResult<(), SPI, CS> {
        self.status = self.write_shadow(self.status.with_bufen(enabled))?;
        Ok(())
    }

    /// Sets the direction of D0-D3. Pin levels in the shadow are preserved.
    pub fn set_gpio_direction(&mut self, directions: [Direction; 4]) -> AdcResult<(), SPI, CS> {
        let dir = directions
            .iter()
            .enumerate()
            .fold(0u8, |acc, (pin, d)| acc | (d.into_bits() << pin));
        self.gpio = self.write_shadow(self.gpio.with_dir(dir))?;
        Ok(())
    }

    /// Sets the levels driven on D0-D3. Only pins configured as outputs are
    /// affected on the device.
    pub fn write_gpio(&mut self, levels: [bool; 4]) -> AdcResult<(), SPI, CS> {
        let dio = levels
            .iter()
            .enumerate()
            .fold(0u8, |acc, (pin, &high)| acc | (u8::from(high) << pin));
        self.gpio = self.write_shadow(self.gpio.with_dio(dio))?;
        Ok(())
    }

    /// Reads the level of GPIO `pin` (0-3), refreshing the GPIO shadow.
    pub fn read_gpio(&mut self, pin: u8) -> AdcResult<bool, SPI, CS> {
        if pin >= Gpio::PINS {
            return Err(AdcError::InvalidGpioPin(pin));
        }
        self.gpio = Gpio::from_bits(self.read_register(Gpio::ADDRESS)?);
        self.gpio.level(pin).ok_or(AdcError::InvalidGpioPin(pin))
    }

    /// Reads one conversion with `RDATA`.
    ///
    /// Chip select is released whether or not the read succeeds.
    pub fn read_single(&mut self) -> AdcResult<u32, SPI, CS> {
        self.ensure_idle()?;
        self.select()?;
        let read = self.read_single_selected();
        let raw = self.release_on_error(read)?;
        self.deselect()?;
        Ok(raw)
    }

    /// Reads the next conversion in read-data-continuous mode.
    ///
    /// The first call issues `RDATAC` and leaves chip select asserted. End the
    /// session with [`stop_conversion`](Ads1256::stop_conversion).
    pub fn read_continuous(&mut self) -> AdcResult<u32, SPI, CS> {
        match self.acquisition {
            Acquisition::Idle => {
                self.select()?;
                let started = self.start_continuous_selected();
                self.release_on_error(started)?;
                self.acquisition = Acquisition::Continuous;
                debug!("continuous conversion started");
            }
            Acquisition::Continuous => self.wait()?,
            Acquisition::Cycling { .. } => return Err(AdcError::SessionActive),
        }
        self.read_sample()
    }

    /// Advances the single-ended rotation by one step.
    ///
    /// Returns the conversion of the channel selected on the previous call.
    ///
    /// The next channel is committed to the MUX shadow and the cycle index as
    /// soon as it is written to the device. If a later part of the step fails,
    /// that step's sample is lost and the following call resumes from the
    /// channel the device actually holds.
    pub fn cycle_single_ended(&mut self) -> AdcResult<u32, SPI, CS> {
        self.cycle(CycleMode::SingleEnded)
    }

    /// Advances the differential rotation by one step.
    ///
    /// Returns the conversion of the pair selected on the previous call.
    pub fn cycle_differential(&mut self) -> AdcResult<u32, SPI, CS> {
        self.cycle(CycleMode::Differential)
    }

    /// Ends a continuous or cycling session and releases chip select.
    ///
    /// Does nothing when idle.
    pub fn stop_conversion(&mut self) -> AdcResult<(), SPI, CS> {
        if self.acquisition == Acquisition::Idle {
            return Ok(());
        }
        self.wait()?;
        self.write(&[opcode::SDATAC])?;
        self.spi.flush().map_err(AdcError::Spi)?;
        self.deselect()?;
        self.acquisition = Acquisition::Idle;
        debug!("conversion stopped");
        Ok(())
    }

    /// Converts a raw result to volts with the configured reference and the
    /// current gain.
    pub fn convert_to_voltage(&self, raw: u32) -> f32 {
        to_voltage(raw, self.config.vref, self.adcon.pga())
    }

    /// STATUS shadow.
    pub fn status(&self) -> Status {
        self.status
    }

    /// MUX shadow.
    pub fn mux(&self) -> Mux {
        self.mux
    }

    /// ADCON shadow.
    pub fn adcon(&self) -> Adcon {
        self.adcon
    }

    /// DRATE shadow.
    pub fn drate(&self) -> Drate {
        self.drate
    }

    /// GPIO shadow.
    pub fn gpio(&self) -> Gpio {
        self.gpio
    }

    /// The configured gain.
    pub fn gain(&self) -> Gain {
        self.adcon.pga()
    }

    /// Driver configuration.
    pub fn config(&self) -> &AdcConfig {
        &self.config
    }

    /// Current acquisition session.
    pub fn acquisition(&self) -> Acquisition {
        self.acquisition
    }

    /// Whether a continuous or cycling session is running.
    pub fn is_running(&self) -> bool {
        self.acquisition != Acquisition::Idle
    }

    /// Index of the channel currently selected by a cycling session.
    pub fn cycle_index(&self) -> Option<u8> {
        match self.acquisition {
            Acquisition::Cycling { index, .. } => Some(index),
            _ => None,
        }
    }

    /// Destroys the driver and returns its collaborators.
    pub fn release(self) -> (SPI, CS, Option<RST>, Option<SYNC>, IRQ, D) {
        (
            self.spi, self.cs, self.reset, self.sync, self.irq, self.delay,
        )
    }

    fn cycle(&mut self, mode: CycleMode) -> AdcResult<u32, SPI, CS> {
        let index = match self.acquisition {
            Acquisition::Cycling { mode: running, index } if running == mode => index,
            Acquisition::Idle => {
                self.preload(mode)?;
                0
            }
            _ => return Err(AdcError::SessionActive),
        };

        let channels = mode.channels();
        let next = (usize::from(index) + 1) % channels.len();

        self.wait()?;
        self.write(&[opcode::WREG | register::MUX, 0x00, channels[next].into_bits()])?;
        self.mux = channels[next];
        self.acquisition = Acquisition::Cycling {
            mode,
            // At most 8 channels
            index: next as u8,
        };

        self.write(&[opcode::SYNC])?;
        self.delay.delay_us(self.config.sync_settle_us);
        self.write(&[opcode::WAKEUP])?;
        self.write(&[opcode::RDATA])?;
        self.delay.delay_us(self.config.t6_us);
        self.read_sample()
    }

    fn preload(&mut self, mode: CycleMode) -> AdcResult<(), SPI, CS> {
        let first = mode.channels()[0];
        self.select()?;
        self.write(&[opcode::WREG | register::MUX, 0x00, first.into_bits()])?;
        self.spi.flush().map_err(AdcError::Spi)?;
        self.deselect()?;
        self.delay.delay_ms(self.config.cycle_preload_ms);
        self.select()?;
        self.mux = first;
        self.acquisition = Acquisition::Cycling { mode, index: 0 };
        debug!("cycling started");
        Ok(())
    }

    fn write_register(&mut self, address: u8, value: u8) -> AdcResult<(), SPI, CS> {
        self.ensure_idle()?;
        self.wait()?;

        self.select()?;
        self.delay.delay_us(self.config.cs_setup_us);
        let written = self.write(&[opcode::WREG | address, 0x00, value]);
        let written = written.and_then(|()| self.spi.flush().map_err(AdcError::Spi));
        self.release_on_error(written)?;
        self.deselect()?;
        self.delay.delay_ms(self.config.register_settle_ms);
        trace!("WREG {:#x} <- {:#x}", address, value);
        Ok(())
    }

    /// Writes `value` and hands it back for committing to the shadow.
    fn write_shadow<R: Register>(&mut self, value: R) -> AdcResult<R, SPI, CS> {
        self.write_register(R::ADDRESS, value.into())?;
        Ok(value)
    }

    fn command_selected(&mut self, command: u8) -> AdcResult<(), SPI, CS> {
        self.delay.delay_us(self.config.cs_setup_us);
        self.write(&[command])?;
        self.delay.delay_us(self.config.cs_setup_us);
        self.spi.flush().map_err(AdcError::Spi)
    }

    fn read_register_selected(&mut self, address: u8) -> AdcResult<u8, SPI, CS> {
        self.write(&[opcode::RREG | address, 0x00])?;
        self.delay.delay_us(self.config.t6_us);
        let mut value = [0u8; 1];
        self.spi.read(&mut value).map_err(AdcError::Spi)?;
        self.spi.flush().map_err(AdcError::Spi)?;
        Ok(value[0])
    }

    fn read_single_selected(&mut self) -> AdcResult<u32, SPI, CS> {
        self.wait()?;
        self.write(&[opcode::RDATA])?;
        self.delay.delay_us(self.config.t6_us);
        self.read_sample()
    }

    fn start_continuous_selected(&mut self) -> AdcResult<(), SPI, CS> {
        self.wait()?;
        self.write(&[opcode::RDATAC])?;
        self.delay.delay_us(self.config.t6_us);
        Ok(())
    }

    /// Drops chip select if `result` is an error, then passes it on.
    fn release_on_error<T>(
        &mut self,
        result: AdcResult<T, SPI, CS>,
    ) -> AdcResult<T, SPI, CS> {
        if result.is_err() {
            let _ = self.deselect();
        }
        result
    }

    fn read_sample(&mut self) -> AdcResult<u32, SPI, CS> {
        let mut bytes = [0u8; 3];
        self.spi.read(&mut bytes).map_err(AdcError::Spi)?;
        self.spi.flush().map_err(AdcError::Spi)?;
        if self.status.order() == ByteOrder::LsbFirst {
            for b in bytes.iter_mut() {
                *b = b.reverse_bits();
            }
        }
        Ok(u32::from_be_bytes([0, bytes[0], bytes[1], bytes[2]]))
    }

    fn ensure_idle(&self) -> AdcResult<(), SPI, CS> {
        if self.is_running() {
            return Err(AdcError::SessionActive);
        }
        Ok(())
    }

    fn wait(&mut self) -> AdcResult<(), SPI, CS> {
        drdy::wait_ready(
            self.ready,
            &mut self.delay,
            self.config.drdy_timeout_us,
            self.config.drdy_poll_us,
        )
    }

    fn write(&mut self, bytes: &[u8]) -> AdcResult<(), SPI, CS> {
        self.spi.write(bytes).map_err(AdcError::Spi)
    }

    fn select(&mut self) -> AdcResult<(), SPI, CS> {
        self.cs.set_low().map_err(AdcError::Pin)
    }

    fn deselect(&mut self) -> AdcResult<(), SPI, CS> {
        self.cs.set_high().map_err(AdcError::Pin)
    }
}
