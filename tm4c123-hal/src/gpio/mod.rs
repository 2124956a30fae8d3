//! General Purpose Input and Output (GPIO)
//!
//! The TM4C123 groups its pins in six ports of eight pins each. Every pin can
//! be used as a plain digital input or output, or handed over to one of the
//! peripheral signals listed in its alternate function catalog. All pins of a
//! port share one interrupt vector.
//!
//! A board describes its pins once in a `static` table of [`PinDesc`]. The
//! [`Gpio`] controller built from that table owns the mutable state of every
//! pin and is normally placed in a `static` so that the port interrupt
//! vectors can reach it.
//!
//! ## Basic usage
//! ```ignore
//! use embedded_hal::digital::{InputPin, OutputPin};
//! use tm4c123_hal::gpio::{tm4c123::Tm4c123, Gpio, PeripheralFunction, PinInit, Pull};
//!
//! static GPIO: Gpio<Tm4c123, 43> = Gpio::new(unsafe { Tm4c123::new() }, &board::PINS);
//!
//! GPIO.init();
//! let mut led = GPIO.pin("PF1")?;
//! led.init(PinInit::output(false))?;
//! led.set_high()?;
//!
//! let mut button = GPIO.pin("PF4")?;
//! button.init(PinInit::input(Pull::Up))?;
//! let pressed = button.is_low()?;
//!
//! // UART1 receive on PB0, transmit on PB1
//! GPIO.assign_peripheral(&[Some("PB0".into()), Some("PB1".into())], Pull::None, PeripheralFunction::Uart, 1)?;
//! ```

// Design Notes:
//
// - Pins are an arena indexed by `PinId`. The static descriptor table never changes, the
//   mutable half of each pin lives in a `critical_section::Mutex<Cell<_>>` slot so that the
//   port interrupt routine can read it.
// - Every foreground mutation of a field the router reads is bracketed by `IrqMasked`, which
//   masks the pin's interrupt line for the duration of the change.
// - Hardware access goes through `PortRegisters`. `tm4c123::Tm4c123` drives the real
//   registers, the host tests use a recording mock.

use core::cell::Cell;
use core::cmp::Ordering;
use core::fmt;

use critical_section::Mutex;

mod config;
mod func;
mod irq;
mod pin;
mod pull;
mod reg;
pub mod tm4c123;

#[cfg(test)]
mod mock;

pub use config::PinInit;
pub use func::{AltFunction, PeripheralFunction};
pub use irq::{IrqHandle, IrqHandler, PowerMode, Priority, Trigger};
pub use pin::{Pin, PinConfig, PinDesc, PinId, PinSelector};
pub use pull::Pull;
pub use reg::{Direction, PortRegisters};

use irq::IrqState;

/// Error type for GPIO operations.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Error {
    /// A mode, pull, drive, trigger, priority, power mode or alternate
    /// function value outside of its legal set.
    InvalidArgument,
    /// No pin matches the identifier, or no catalog entry matches the
    /// requested peripheral signal.
    NotFound,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidArgument => f.write_str("invalid argument"),
            Error::NotFound => f.write_str("not found"),
        }
    }
}

impl embedded_hal::digital::Error for Error {
    fn kind(&self) -> embedded_hal::digital::ErrorKind {
        embedded_hal::digital::ErrorKind::Other
    }
}

/// GPIO port, a bank of eight pins sharing one set of registers and one
/// interrupt vector.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[allow(missing_docs)]
pub enum Port {
    A,
    B,
    C,
    D,
    E,
    F,
}

impl Port {
    /// All ports, in bank order.
    pub const ALL: [Port; 6] = [Port::A, Port::B, Port::C, Port::D, Port::E, Port::F];

    /// Bank number of the port, `A` being 0.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Pin operating mode.
///
/// The discriminants are the raw values accepted by [`Pin::set_field`].
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Mode {
    /// Digital input.
    Input = 0x0,
    /// Push-pull digital output.
    Output = 0x1,
    /// The pin is driven by the peripheral selected through its alternate
    /// function.
    AlternateFunction = 0x2,
    /// Open-drain output. The pin only ever pulls low or floats.
    OpenDrain = 0x9,
}

impl TryFrom<u32> for Mode {
    type Error = Error;

    fn try_from(raw: u32) -> Result<Self, Self::Error> {
        match raw {
            0x0 => Ok(Mode::Input),
            0x1 => Ok(Mode::Output),
            0x2 => Ok(Mode::AlternateFunction),
            0x9 => Ok(Mode::OpenDrain),
            _ => Err(Error::InvalidArgument),
        }
    }
}

/// The amount of current that a pin can drive when used as an output.
///
/// The discriminants are the raw values accepted by [`Pin::set_field`].
#[allow(clippy::enum_variant_names)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Eq, PartialEq, Debug)]
#[repr(u8)]
pub enum OutputDriveStrength {
    /// 2 mA, the low power setting
    TwoMilliAmps = 0x1,
    /// 4 mA
    FourMilliAmps = 0x2,
    /// 8 mA, the high power setting
    EightMilliAmps = 0x66,
}

impl TryFrom<u32> for OutputDriveStrength {
    type Error = Error;

    fn try_from(raw: u32) -> Result<Self, Self::Error> {
        match raw {
            0x1 => Ok(OutputDriveStrength::TwoMilliAmps),
            0x2 => Ok(OutputDriveStrength::FourMilliAmps),
            0x66 => Ok(OutputDriveStrength::EightMilliAmps),
            _ => Err(Error::InvalidArgument),
        }
    }
}

/// Configuration field addressed by [`Pin::set_field`] and [`Pin::field`].
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Field {
    /// [`Mode`]
    Mode,
    /// [`Pull`]
    Pull,
    /// [`OutputDriveStrength`]
    Drive,
}

//==============================================================================
//  Registry
//==============================================================================

const NO_PIN: u8 = u8::MAX;

/// Hook handed to the sleep persistence collaborator with every commit.
#[derive(Clone, Copy)]
struct SleepHook {
    service: &'static dyn crate::sleep::SleepPersistence,
    reconfigure: fn(PinId),
}

/// GPIO controller.
///
/// Holds the board pin table, the mutable state of every pin and the
/// hardware backend. `N` is the number of pins on the board.
pub struct Gpio<R: PortRegisters, const N: usize> {
    regs: R,
    table: &'static [PinDesc; N],
    config: [Mutex<Cell<PinConfig>>; N],
    irq: [Mutex<Cell<IrqState<R, N>>>; N],
    by_name: [u8; N],
    by_port_bit: [[u8; 8]; 6],
    vectors: Mutex<Cell<u8>>,
    sleep: Option<SleepHook>,
}

impl<R: PortRegisters, const N: usize> Gpio<R, N> {
    /// Build a controller over `table`.
    ///
    /// Every pin starts out as an unused floating input. Call [`Gpio::init`]
    /// once to push that state to the hardware.
    ///
    /// # Panics
    ///
    /// When two pins share a name or a port and bit, or when the table holds
    /// 255 pins or more. In a `static` initializer this is a compile time
    /// error.
    pub const fn new(regs: R, table: &'static [PinDesc; N]) -> Self {
        Self {
            regs,
            table,
            config: [const { Mutex::new(Cell::new(PinConfig::RESET)) }; N],
            irq: [const { Mutex::new(Cell::new(IrqState::IDLE)) }; N],
            by_name: name_index(table),
            by_port_bit: port_bit_index(table),
            vectors: Mutex::new(Cell::new(0)),
            sleep: None,
        }
    }

    /// Attach the low power collaborator.
    ///
    /// `reconfigure` is what the collaborator calls on wake. It normally
    /// forwards to [`Gpio::reconfigure`] on the `static` controller.
    pub const fn with_sleep(
        mut self,
        service: &'static dyn crate::sleep::SleepPersistence,
        reconfigure: fn(PinId),
    ) -> Self {
        self.sleep = Some(SleepHook {
            service,
            reconfigure,
        });
        self
    }

    /// The hardware backend.
    #[inline]
    pub fn registers(&self) -> &R {
        &self.regs
    }

    /// Number of pins on the board.
    #[inline]
    pub const fn len(&self) -> usize {
        N
    }

    /// `true` for a board without pins.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        N == 0
    }

    /// Resolve a pin by handle, index or name.
    pub fn pin<'a>(&self, selector: impl Into<PinSelector<'a>>) -> Result<Pin<'_, R, N>, Error> {
        let id = self.resolve(selector.into())?;
        Ok(Pin::new(self, id))
    }

    /// Resolve the pin at `bit` (0..8) of `port`.
    pub fn pin_at(&self, port: Port, bit: u8) -> Result<Pin<'_, R, N>, Error> {
        self.id_at(port, bit)
            .map(|id| Pin::new(self, id))
            .ok_or(Error::NotFound)
    }

    /// All pins, in table order.
    pub fn pins(&self) -> impl Iterator<Item = Pin<'_, R, N>> + '_ {
        (0..N).map(move |i| Pin::new(self, PinId(i as u8)))
    }

    pub(crate) fn resolve(&self, selector: PinSelector<'_>) -> Result<PinId, Error> {
        match selector {
            PinSelector::Id(id) if id.index() < N => Ok(id),
            PinSelector::Id(_) => Err(Error::NotFound),
            PinSelector::Name(name) => self
                .by_name
                .binary_search_by(|&i| self.table[usize::from(i)].name.cmp(name))
                .map(|pos| PinId(self.by_name[pos]))
                .map_err(|_| Error::NotFound),
        }
    }

    pub(crate) fn id_at(&self, port: Port, bit: u8) -> Option<PinId> {
        let slot = *self.by_port_bit[port.index()].get(usize::from(bit))?;
        (slot != NO_PIN).then_some(PinId(slot))
    }

    #[inline]
    pub(crate) fn desc(&self, id: PinId) -> &'static PinDesc {
        &self.table[id.index()]
    }

    #[inline]
    pub(crate) fn load(&self, id: PinId) -> PinConfig {
        critical_section::with(|cs| self.config[id.index()].borrow(cs).get())
    }

    #[inline]
    pub(crate) fn store(&self, id: PinId, config: PinConfig) {
        critical_section::with(|cs| self.config[id.index()].borrow(cs).set(config));
    }
}

const fn compare(a: &str, b: &str) -> Ordering {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    let mut i = 0;
    while i < a.len() && i < b.len() {
        if a[i] != b[i] {
            return if a[i] < b[i] {
                Ordering::Less
            } else {
                Ordering::Greater
            };
        }
        i += 1;
    }
    if a.len() < b.len() {
        Ordering::Less
    } else if a.len() > b.len() {
        Ordering::Greater
    } else {
        Ordering::Equal
    }
}

/// Table indices sorted by pin name.
const fn name_index<const N: usize>(table: &[PinDesc; N]) -> [u8; N] {
    assert!(N < NO_PIN as usize, "too many pins in the table");
    let mut index = [0u8; N];
    let mut i = 0;
    while i < N {
        index[i] = i as u8;
        i += 1;
    }
    // insertion sort, the tables are small
    let mut i = 1;
    while i < N {
        let mut j = i;
        while j > 0
            && matches!(
                compare(table[index[j] as usize].name, table[index[j - 1] as usize].name),
                Ordering::Less
            )
        {
            let tmp = index[j];
            index[j] = index[j - 1];
            index[j - 1] = tmp;
            j -= 1;
        }
        i += 1;
    }
    let mut i = 1;
    while i < N {
        assert!(
            !matches!(
                compare(table[index[i] as usize].name, table[index[i - 1] as usize].name),
                Ordering::Equal
            ),
            "duplicate pin name"
        );
        i += 1;
    }
    index
}

/// Table index of every (port, bit) coordinate, `NO_PIN` where the board has
/// no pin.
const fn port_bit_index<const N: usize>(table: &[PinDesc; N]) -> [[u8; 8]; 6] {
    let mut index = [[NO_PIN; 8]; 6];
    let mut i = 0;
    while i < N {
        let desc = &table[i];
        let port = desc.port.index();
        let bit = desc.bit.trailing_zeros() as usize;
        assert!(index[port][bit] == NO_PIN, "duplicate port and bit");
        index[port][bit] = i as u8;
        i += 1;
    }
    index
}
