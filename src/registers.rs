//! Bit layouts of the ADS1256 control registers (datasheet Table 23).

use bitfield_struct::bitfield;

use crate::consts::register;

/// A register with a fixed address in the device map.
pub trait Register: Copy + From<u8> + Into<u8> {
    /// The register address, OR'd into `RREG`/`WREG`.
    const ADDRESS: u8;
}

/// 0x00 Status.
#[cfg_attr(not(feature = "defmt-0-3"), bitfield(u8))]
#[cfg_attr(feature = "defmt-0-3", bitfield(u8, defmt = true))]
#[derive(PartialEq, Eq, Hash)]
pub struct Status {
    /// Mirrors the DRDY pin. Active low.
    #[bits(1, access = RO)]
    pub drdy: bool,
    /// Analog input buffer enable.
    pub bufen: bool,
    /// Auto-calibration on data rate, gain or buffer change.
    pub acal: bool,
    /// Output byte order.
    #[bits(1)]
    pub order: ByteOrder,
    /// Factory programmed identification.
    #[bits(4, access = RO)]
    pub id: u8,
}

impl Register for Status {
    const ADDRESS: u8 = register::STATUS;
}

/// 0x01 Input multiplexer.
#[cfg_attr(not(feature = "defmt-0-3"), bitfield(u8))]
#[cfg_attr(feature = "defmt-0-3", bitfield(u8, defmt = true))]
#[derive(PartialEq, Eq, Hash)]
pub struct Mux {
    /// Negative input channel.
    #[bits(4)]
    pub nsel: Input,
    /// Positive input channel.
    #[bits(4)]
    pub psel: Input,
}

impl Mux {
    /// Selects `positive` against `negative`.
    pub const fn select(positive: Input, negative: Input) -> Self {
        Self::new().with_psel(positive).with_nsel(negative)
    }
}

impl Register for Mux {
    const ADDRESS: u8 = register::MUX;
}

/// 0x02 A/D control.
#[cfg_attr(not(feature = "defmt-0-3"), bitfield(u8))]
#[cfg_attr(feature = "defmt-0-3", bitfield(u8, defmt = true))]
#[derive(PartialEq, Eq, Hash)]
pub struct Adcon {
    /// Programmable gain amplifier setting.
    #[bits(3)]
    pub pga: Gain,
    /// Sensor detect current sources.
    #[bits(2)]
    pub sdcs: SensorDetect,
    /// D0/CLKOUT output rate.
    #[bits(2)]
    pub clk: ClockOut,
    __: bool,
}

impl Register for Adcon {
    const ADDRESS: u8 = register::ADCON;
}

/// 0x03 A/D data rate.
#[cfg_attr(not(feature = "defmt-0-3"), bitfield(u8))]
#[cfg_attr(feature = "defmt-0-3", bitfield(u8, defmt = true))]
#[derive(PartialEq, Eq, Hash)]
pub struct Drate {
    /// Data rate code. Codes not in the datasheet table are kept as raw bits.
    #[bits(8, from = DataRate::from_bits, into = DataRate::into_bits)]
    pub rate: Result<DataRate, u8>,
}

impl Register for Drate {
    const ADDRESS: u8 = register::DRATE;
}

/// 0x04 GPIO control.
///
/// Each of the four digital pins has a direction bit (1 = input) and a level
/// bit. Levels of output pins are driven; levels of input pins reflect the pin.
#[cfg_attr(not(feature = "defmt-0-3"), bitfield(u8))]
#[cfg_attr(feature = "defmt-0-3", bitfield(u8, defmt = true))]
#[derive(PartialEq, Eq, Hash)]
pub struct Gpio {
    /// Pin levels, D0 in bit 0.
    #[bits(4)]
    pub dio: u8,
    /// Pin directions, D0 in bit 0.
    #[bits(4)]
    pub dir: u8,
}

impl Gpio {
    /// Power-on value: D0 output, D1-D3 inputs, all low.
    pub const RESET: Self = Self::from_bits(0xe0);

    /// Number of digital pins.
    pub const PINS: u8 = 4;

    /// Level of pin `pin`, or `None` outside 0-3.
    pub const fn level(&self, pin: u8) -> Option<bool> {
        if pin >= Self::PINS {
            return None;
        }
        Some(self.dio() & (1 << pin) != 0)
    }

    /// Direction of pin `pin`, or `None` outside 0-3.
    pub const fn direction(&self, pin: u8) -> Option<Direction> {
        if pin >= Self::PINS {
            return None;
        }
        Some(Direction::from_bits((self.dir() >> pin) & 1))
    }
}

impl Register for Gpio {
    const ADDRESS: u8 = register::IO;
}

/// Order of the three conversion bytes on the bus.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum ByteOrder {
    /// Most significant byte first (default).
    MsbFirst = 0,
    /// Least significant byte first.
    LsbFirst = 1,
}

impl ByteOrder {
    /// Register encoding.
    pub const fn into_bits(self) -> u8 {
        self as u8
    }

    /// Decodes from the register bit.
    pub const fn from_bits(v: u8) -> Self {
        match v {
            0 => Self::MsbFirst,
            _ => Self::LsbFirst,
        }
    }
}

/// An analog input for the multiplexer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum Input {
    /// AIN0.
    Ain0 = 0,
    /// AIN1.
    Ain1 = 1,
    /// AIN2.
    Ain2 = 2,
    /// AIN3.
    Ain3 = 3,
    /// AIN4.
    Ain4 = 4,
    /// AIN5.
    Ain5 = 5,
    /// AIN6.
    Ain6 = 6,
    /// AIN7.
    Ain7 = 7,
    /// AINCOM, the common reference.
    AinCom = 8,
}

impl Input {
    /// Register encoding.
    pub const fn into_bits(self) -> u8 {
        self as u8
    }

    /// Decodes a 4-bit selector. Any value with bit 3 set is AINCOM.
    pub const fn from_bits(v: u8) -> Self {
        match v {
            0 => Self::Ain0,
            1 => Self::Ain1,
            2 => Self::Ain2,
            3 => Self::Ain3,
            4 => Self::Ain4,
            5 => Self::Ain5,
            6 => Self::Ain6,
            7 => Self::Ain7,
            _ => Self::AinCom,
        }
    }
}

/// Programmable gain amplifier setting.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum Gain {
    /// 1x, ±2·VREF full scale.
    X1 = 0,
    /// 2x.
    X2 = 1,
    /// 4x.
    X4 = 2,
    /// 8x.
    X8 = 3,
    /// 16x.
    X16 = 4,
    /// 32x.
    X32 = 5,
    /// 64x.
    X64 = 6,
}

impl Gain {
    /// Register encoding, also the base-2 exponent of the gain.
    pub const fn into_bits(self) -> u8 {
        self as u8
    }

    /// Decodes the 3-bit field. Code 7 also selects 64x.
    pub const fn from_bits(v: u8) -> Self {
        match v {
            0 => Self::X1,
            1 => Self::X2,
            2 => Self::X4,
            3 => Self::X8,
            4 => Self::X16,
            5 => Self::X32,
            _ => Self::X64,
        }
    }

    /// The base-2 exponent of the gain.
    pub const fn exponent(self) -> u8 {
        self.into_bits()
    }
}

/// Sensor detect current source magnitude.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum SensorDetect {
    /// Sources off (default).
    Off = 0,
    /// 0.5 µA.
    MicroAmp0_5 = 1,
    /// 2 µA.
    MicroAmp2 = 2,
    /// 10 µA.
    MicroAmp10 = 3,
}

impl SensorDetect {
    /// Register encoding.
    pub const fn into_bits(self) -> u8 {
        self as u8
    }

    /// Decodes the 2-bit field.
    pub const fn from_bits(v: u8) -> Self {
        match v & 0b11 {
            0 => Self::Off,
            1 => Self::MicroAmp0_5,
            2 => Self::MicroAmp2,
            _ => Self::MicroAmp10,
        }
    }
}

/// Rate of the clock driven on D0/CLKOUT.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum ClockOut {
    /// Clock output off.
    Off = 0,
    /// f_CLKIN.
    Full = 1,
    /// f_CLKIN / 2.
    Half = 2,
    /// f_CLKIN / 4.
    Quarter = 3,
}

impl ClockOut {
    /// Register encoding.
    pub const fn into_bits(self) -> u8 {
        self as u8
    }

    /// Decodes the 2-bit field.
    pub const fn from_bits(v: u8) -> Self {
        match v & 0b11 {
            0 => Self::Off,
            1 => Self::Full,
            2 => Self::Half,
            _ => Self::Quarter,
        }
    }
}

/// Programmed data rate, in samples per second (datasheet Table 13).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum DataRate {
    /// 30,000 SPS.
    Sps30000 = 0xf0,
    /// 15,000 SPS.
    Sps15000 = 0xe0,
    /// 7,500 SPS.
    Sps7500 = 0xd0,
    /// 3,750 SPS.
    Sps3750 = 0xc0,
    /// 2,000 SPS.
    Sps2000 = 0xb0,
    /// 1,000 SPS.
    Sps1000 = 0xa1,
    /// 500 SPS.
    Sps500 = 0x92,
    /// 100 SPS.
    Sps100 = 0x82,
    /// 60 SPS.
    Sps60 = 0x72,
    /// 50 SPS.
    Sps50 = 0x63,
    /// 30 SPS.
    Sps30 = 0x53,
    /// 25 SPS.
    Sps25 = 0x43,
    /// 15 SPS.
    Sps15 = 0x33,
    /// 10 SPS.
    Sps10 = 0x23,
    /// 5 SPS.
    Sps5 = 0x13,
    /// 2.5 SPS.
    Sps2_5 = 0x03,
}

impl DataRate {
    /// Register encoding.
    pub const fn into_bits(this: Result<Self, u8>) -> u8 {
        match this {
            Ok(v) => v as u8,
            Err(v) => v,
        }
    }

    /// Decodes a data rate code.
    pub const fn from_bits(v: u8) -> Result<Self, u8> {
        match v {
            0xf0 => Ok(Self::Sps30000),
            0xe0 => Ok(Self::Sps15000),
            0xd0 => Ok(Self::Sps7500),
            0xc0 => Ok(Self::Sps3750),
            0xb0 => Ok(Self::Sps2000),
            0xa1 => Ok(Self::Sps1000),
            0x92 => Ok(Self::Sps500),
            0x82 => Ok(Self::Sps100),
            0x72 => Ok(Self::Sps60),
            0x63 => Ok(Self::Sps50),
            0x53 => Ok(Self::Sps30),
            0x43 => Ok(Self::Sps25),
            0x33 => Ok(Self::Sps15),
            0x23 => Ok(Self::Sps10),
            0x13 => Ok(Self::Sps5),
            0x03 => Ok(Self::Sps2_5),
            _ => Err(v),
        }
    }
}

/// Direction of a GPIO pin.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum Direction {
    /// Driven by the converter.
    Output = 0,
    /// Sensed by the converter.
    Input = 1,
}

impl Direction {
    /// Register encoding.
    pub const fn into_bits(self) -> u8 {
        self as u8
    }

    /// Decodes a direction bit.
    pub const fn from_bits(v: u8) -> Self {
        match v {
            0 => Self::Output,
            _ => Self::Input,
        }
    }
}
