//! HAL for the TM4C123 microcontrollers
//!
//! This crate manages the general purpose I/O pins of the TM4C123 family:
//! per-pin electrical configuration, binding of pins to peripheral alternate
//! functions and routing of port interrupts to per-pin handlers. Pins
//! implement the [`embedded-hal`](https://crates.io/crates/embedded-hal)
//! digital traits.
//!
//! NOTE This HAL is still under active development. This API will remain volatile until 1.0.0
//!
//! # Crate features
//!
//! * **critical-section-impl** -
//!   critical section for single core use, backed by `cortex-m`
//! * **defmt** -
//!   Implement `defmt::Format` for several types and emit internal log messages through `defmt`.

#![warn(missing_docs)]
#![no_std]

#[cfg(test)]
extern crate std;

#[doc(hidden)]
pub use paste;

#[macro_use]
mod fmt;

pub mod gpio;
pub mod sleep;

pub use gpio::{Error, Gpio, Pin, PinId, Port};
