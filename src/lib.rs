//! # telemetry-core
//!
//! A portable, no_std core for a sensor telemetry node: framing and packet
//! protocol for the serial link, and a driver for the ADS1256 24-bit ADC.
//!
//! The crate provides:
//! - COBS byte stuffing, so each frame ends at a single `0x00` delimiter
//! - bit-packed packets (27-bit millistamp, 6-bit topic, 4-bit command,
//!   11-bit length) protected by CRC-16/XMODEM
//! - a time-of-day clock that stamps packets with milliseconds since midnight
//! - an `embedded-hal` 1.0 driver for the ADS1256, synchronised to its DRDY
//!   interrupt, with single, continuous and multiplexed cycling acquisition
//!
//! ## Crate features
//! | Feature            | Description |
//! |--------------------|-------------|
//! | `std`              | Disables `#![no_std]` support and replaces `heapless::Vec`s with `std::vec::Vec`s |
//! | `critical-section` | Atomic swap via `critical-section` on targets without native atomics |
//! | `defmt-0-3`        | Uses `defmt` logging and derives `defmt::Format` |
//! | `log`              | Uses `log` logging |
//!
//! ## Usage
//!
//! ```rust
//! use telemetry_core::clock::{DayClock, Monotonic};
//! use telemetry_core::link;
//! use telemetry_core::packet::Message;
//!
//! struct Ticks(u32);
//! impl Monotonic for Ticks {
//!     fn now_ms(&mut self) -> u32 { self.0 }
//! }
//!
//! let mut clock = DayClock::new(Ticks(0));
//! clock.jump(12 * 3_600_000).unwrap();
//!
//! let mut msg = Message::new();
//! msg.configure(7, 1, &[0x01, 0x02, 0x03]).unwrap();
//! msg.stamp(&mut clock).unwrap();
//! let frame = link::frame(&mut msg).unwrap();
//!
//! let received = link::unframe(&frame).unwrap();
//! assert_eq!(received.millistamp(), Some(43_200_000));
//! ```
//!
//! ## Integration Notes
//!
//! - The DRDY falling edge must be routed to a `static` [`drdy::DataReady`]
//!   through an [`drdy::InterruptSource`] implementation.
//! - Only one driver instance should share a given `DataReady`.
//!
//! --
//! Designed for `#![no_std]` use in resource-constrained embedded environments.

#![deny(
    bad_style,
    dead_code,
    improper_ctypes,
    non_shorthand_field_patterns,
    no_mangle_generic_items,
    overflowing_literals,
    path_statements,
    patterns_in_fns_without_body,
    unconditional_recursion,
    unused,
    while_true,
    missing_debug_implementations,
    missing_docs,
    trivial_casts,
    trivial_numeric_casts,
    unused_extern_crates,
    unused_import_braces,
    unused_qualifications,
    unused_results
)]
#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
pub use heapless;

#[macro_use]
mod macros;

pub mod buffer;
pub(crate) mod checksum;
pub mod clock;
pub mod cobs;
pub mod config;
pub mod consts;
pub mod drdy;
pub mod driver;
pub mod error;
pub mod link;
pub mod packet;
pub mod registers;

pub use checksum::{crc16_xmodem, crc16_xmodem_parts};
