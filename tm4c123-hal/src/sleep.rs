//! Low power sleep persistence
//!
//! GPIO state is lost in the deeper sleep modes of the TM4C123. A low power
//! manager that wants pins restored after wake implements [`SleepPersistence`]
//! and attaches itself to the controller with
//! [`Gpio::with_sleep`](crate::gpio::Gpio::with_sleep). The controller only
//! ever calls out through this trait; replaying the configuration after wake
//! is up to the implementor.
//!
//! ```ignore
//! struct Lpds;
//!
//! impl SleepPersistence for Lpds {
//!     fn register_wake_callback(&self, pin: PinId, reconfigure: fn(PinId)) {
//!         // remember (pin, reconfigure), call it on wake
//!     }
//! }
//!
//! static LPDS: Lpds = Lpds;
//! static GPIO: Gpio<Tm4c123, 43> =
//!     Gpio::new(unsafe { Tm4c123::new() }, &board::PINS).with_sleep(&LPDS, wake);
//!
//! fn wake(pin: PinId) {
//!     GPIO.reconfigure(pin);
//! }
//! ```

use crate::gpio::PinId;

/// Collaborator that replays pin configuration after a low power wake.
pub trait SleepPersistence: Sync {
    /// Remember that `pin` must be restored with `reconfigure` on wake.
    ///
    /// Called every time a pin configuration is committed and every time an
    /// interrupt is registered with [`PowerMode::LPDS`](crate::gpio::PowerMode::LPDS).
    /// Implementations should treat repeated registrations of the same pin
    /// as a single entry.
    fn register_wake_callback(&self, pin: PinId, reconfigure: fn(PinId));
}
