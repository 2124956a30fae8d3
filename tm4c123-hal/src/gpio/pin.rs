use core::fmt;

use super::func::AltFunction;
use super::{Gpio, Mode, OutputDriveStrength, Port, PortRegisters, Pull};

//==============================================================================
//  PinDesc
//==============================================================================

/// Static description of a board pin.
///
/// Board support crates list their pins in a `static` array of these and hand
/// it to [`Gpio::new`](super::Gpio::new).
#[derive(Debug)]
pub struct PinDesc {
    pub(crate) name: &'static str,
    pub(crate) port: Port,
    pub(crate) bit: u8,
    pub(crate) pin_num: u8,
    pub(crate) alt: &'static [AltFunction],
}

impl PinDesc {
    /// Describe pin `bit` (0..8) of `port`.
    ///
    /// `pin_num` is the package pin number. `alt` lists every peripheral
    /// signal the pin can carry; its order is kept and decides which entry
    /// wins when a lookup matches more than one.
    ///
    /// # Panics
    ///
    /// When `bit` is 8 or more.
    pub const fn new(
        name: &'static str,
        port: Port,
        bit: u8,
        pin_num: u8,
        alt: &'static [AltFunction],
    ) -> Self {
        assert!(bit < 8, "pin bit out of range");
        Self {
            name,
            port,
            bit: 1 << bit,
            pin_num,
            alt,
        }
    }

    /// Pin name, unique on the board.
    #[inline]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Port the pin belongs to.
    #[inline]
    pub const fn port(&self) -> Port {
        self.port
    }

    /// Single bit mask locating the pin in its port.
    #[inline]
    pub const fn bit(&self) -> u8 {
        self.bit
    }

    /// Bit position of the pin in its port.
    #[inline]
    pub const fn bit_index(&self) -> u8 {
        self.bit.trailing_zeros() as u8
    }

    /// Package pin number.
    #[inline]
    pub const fn pin_num(&self) -> u8 {
        self.pin_num
    }

    /// The alternate function catalog, in table order.
    #[inline]
    pub const fn alt_functions(&self) -> &'static [AltFunction] {
        self.alt
    }

    /// Catalog entry selected by multiplexer value `mux`.
    pub(crate) fn alt_by_mux(&self, mux: u8) -> Option<&'static AltFunction> {
        self.alt.iter().find(|af| af.mux == mux)
    }
}

//==============================================================================
//  PinId
//==============================================================================

/// Stable index of a pin in its controller.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PinId(pub(crate) u8);

impl PinId {
    /// Position of the pin in the board table.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Anything that identifies a pin: a resolved handle, an index or a name.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PinSelector<'a> {
    /// Already resolved pin.
    Id(PinId),
    /// Pin name as given in the board table.
    Name(&'a str),
}

impl From<PinId> for PinSelector<'_> {
    fn from(id: PinId) -> Self {
        PinSelector::Id(id)
    }
}

impl<'a> From<&'a str> for PinSelector<'a> {
    fn from(name: &'a str) -> Self {
        PinSelector::Name(name)
    }
}

impl<R: PortRegisters, const N: usize> From<Pin<'_, R, N>> for PinSelector<'_> {
    fn from(pin: Pin<'_, R, N>) -> Self {
        PinSelector::Id(pin.id)
    }
}

//==============================================================================
//  PinConfig
//==============================================================================

/// Snapshot of the mutable configuration of a pin.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PinConfig {
    /// Operating mode.
    pub mode: Mode,
    /// Pull resistor.
    pub pull: Pull,
    /// Output drive strength.
    pub drive: OutputDriveStrength,
    /// Last level written to the output.
    pub value: bool,
    /// Multiplexer value of the bound alternate function, 0 when unbound.
    pub alt: u8,
    /// `false` while the pin is an unclaimed floating input.
    pub used: bool,
}

impl PinConfig {
    /// Configuration of a pin nobody has claimed.
    pub const RESET: Self = Self {
        mode: Mode::Input,
        pull: Pull::None,
        drive: OutputDriveStrength::TwoMilliAmps,
        value: false,
        alt: 0,
        used: false,
    };
}

//==============================================================================
//  Pin
//==============================================================================

/// Handle to one pin of a [`Gpio`] controller.
///
/// Handles are cheap to copy. All of them refer to the same pin state, which
/// lives in the controller.
pub struct Pin<'g, R: PortRegisters, const N: usize> {
    pub(crate) gpio: &'g Gpio<R, N>,
    pub(crate) id: PinId,
}

impl<R: PortRegisters, const N: usize> Clone for Pin<'_, R, N> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R: PortRegisters, const N: usize> Copy for Pin<'_, R, N> {}

impl<'g, R: PortRegisters, const N: usize> Pin<'g, R, N> {
    #[inline]
    pub(crate) fn new(gpio: &'g Gpio<R, N>, id: PinId) -> Self {
        Self { gpio, id }
    }

    /// The controller this pin belongs to.
    #[inline]
    pub fn gpio(&self) -> &'g Gpio<R, N> {
        self.gpio
    }

    /// Stable index of the pin.
    #[inline]
    pub fn id(&self) -> PinId {
        self.id
    }

    /// Static description of the pin.
    #[inline]
    pub fn desc(&self) -> &'static PinDesc {
        self.gpio.desc(self.id)
    }

    #[allow(missing_docs)]
    #[inline]
    pub fn name(&self) -> &'static str {
        self.desc().name
    }

    #[allow(missing_docs)]
    #[inline]
    pub fn port(&self) -> Port {
        self.desc().port
    }

    /// Single bit mask locating the pin in its port.
    #[inline]
    pub fn bit(&self) -> u8 {
        self.desc().bit
    }

    /// Package pin number.
    #[inline]
    pub fn pin_num(&self) -> u8 {
        self.desc().pin_num
    }

    /// Snapshot of the current configuration.
    #[inline]
    pub fn config(&self) -> PinConfig {
        self.gpio.load(self.id)
    }

    #[allow(missing_docs)]
    #[inline]
    pub fn mode(&self) -> Mode {
        self.config().mode
    }

    #[allow(missing_docs)]
    #[inline]
    pub fn pull(&self) -> Pull {
        self.config().pull
    }

    #[allow(missing_docs)]
    #[inline]
    pub fn drive(&self) -> OutputDriveStrength {
        self.config().drive
    }

    /// Multiplexer value of the bound alternate function, 0 when unbound.
    #[inline]
    pub fn alt(&self) -> u8 {
        self.config().alt
    }

    /// `false` while the pin is an unclaimed floating input.
    #[inline]
    pub fn is_used(&self) -> bool {
        self.config().used
    }
}

impl<R: PortRegisters, const N: usize> fmt::Debug for Pin<'_, R, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let config = self.config();
        f.debug_struct("Pin")
            .field("name", &self.name())
            .field("mode", &config.mode)
            .field("pull", &config.pull)
            .field("drive", &config.drive)
            .field("alt", &config.alt)
            .field("value", &config.value)
            .field("used", &config.used)
            .finish()
    }
}

impl<R: PortRegisters, const N: usize> embedded_hal::digital::ErrorType for Pin<'_, R, N> {
    type Error = super::Error;
}

impl<R: PortRegisters, const N: usize> embedded_hal::digital::InputPin for Pin<'_, R, N> {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.value())
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.value())
    }
}

impl<R: PortRegisters, const N: usize> embedded_hal::digital::OutputPin for Pin<'_, R, N> {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.set_value(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.set_value(true);
        Ok(())
    }
}

impl<R: PortRegisters, const N: usize> embedded_hal::digital::StatefulOutputPin
    for Pin<'_, R, N>
{
    fn is_set_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.config().value)
    }

    fn is_set_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.config().value)
    }
}
