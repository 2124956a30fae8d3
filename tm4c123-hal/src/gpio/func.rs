use super::{Error, Gpio, Mode, OutputDriveStrength, Pin, PinConfig, PinSelector, PortRegisters, Pull};

/// Value-level `enum` for the peripheral behind an alternate function.
#[allow(missing_docs)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PeripheralFunction {
    Uart,
    Ssi,
    I2c,
    Can,
    /// 16/32-bit general purpose timer capture/compare
    Timer,
    /// 32/64-bit wide timer capture/compare
    WideTimer,
    Pwm,
    /// Quadrature encoder interface
    Qei,
    Usb,
    /// Analog comparator output
    Comparator,
    Nmi,
    Jtag,
}

/// One peripheral signal a pin can carry.
///
/// A signal is identified by the triple (function, unit, signal): the
/// peripheral kind, its instance number and the signal within the instance
/// (for a UART: 0 receive, 1 transmit, 2 RTS, 3 CTS).
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AltFunction {
    pub(crate) name: &'static str,
    pub(crate) function: PeripheralFunction,
    pub(crate) unit: u8,
    pub(crate) signal: u8,
    pub(crate) mux: u8,
}

impl AltFunction {
    /// Describe signal `signal` of instance `unit` of `function`, selected
    /// by multiplexer value `mux` (1..=15).
    ///
    /// # Panics
    ///
    /// When `mux` is out of range.
    pub const fn new(
        name: &'static str,
        function: PeripheralFunction,
        unit: u8,
        signal: u8,
        mux: u8,
    ) -> Self {
        assert!(mux >= 1 && mux <= 15, "multiplexer value out of range");
        Self {
            name,
            function,
            unit,
            signal,
            mux,
        }
    }

    /// Signal name, as printed in the datasheet.
    #[inline]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    #[allow(missing_docs)]
    #[inline]
    pub const fn function(&self) -> PeripheralFunction {
        self.function
    }

    #[allow(missing_docs)]
    #[inline]
    pub const fn unit(&self) -> u8 {
        self.unit
    }

    #[allow(missing_docs)]
    #[inline]
    pub const fn signal(&self) -> u8 {
        self.signal
    }

    /// Multiplexer value selecting this signal.
    #[inline]
    pub const fn mux(&self) -> u8 {
        self.mux
    }

    #[inline]
    fn is(&self, function: PeripheralFunction, unit: u8, signal: u8) -> bool {
        self.function == function && self.unit == unit && self.signal == signal
    }
}

impl<'g, R: PortRegisters, const N: usize> Pin<'g, R, N> {
    /// Multiplexer value of an exact (function, unit, signal) match.
    pub fn lookup_af(
        &self,
        function: PeripheralFunction,
        unit: u8,
        signal: u8,
    ) -> Result<u8, Error> {
        self.desc()
            .alt
            .iter()
            .find(|af| af.is(function, unit, signal))
            .map(|af| af.mux)
            .ok_or(Error::NotFound)
    }

    /// Unit of the first catalog entry for `function` and `signal`.
    pub fn find_unit(&self, function: PeripheralFunction, signal: u8) -> Result<u8, Error> {
        self.desc()
            .alt
            .iter()
            .find(|af| af.function == function && af.signal == signal)
            .map(|af| af.unit)
            .ok_or(Error::NotFound)
    }

    /// Signal of the first catalog entry for `function` and `unit`.
    pub fn find_type(&self, function: PeripheralFunction, unit: u8) -> Result<u8, Error> {
        self.desc()
            .alt
            .iter()
            .find(|af| af.function == function && af.unit == unit)
            .map(|af| af.signal)
            .ok_or(Error::NotFound)
    }

    /// Names and multiplexer values of every signal the pin can carry.
    pub fn alt_list(&self) -> impl Iterator<Item = (&'static str, u8)> + 'g {
        self.desc().alt.iter().map(|af| (af.name, af.mux))
    }

    /// The peripheral signal the pin currently carries.
    pub fn bound_signal(&self) -> Option<&'static AltFunction> {
        let config = self.config();
        if config.mode != Mode::AlternateFunction {
            return None;
        }
        self.desc().alt_by_mux(config.alt)
    }
}

impl<R: PortRegisters, const N: usize> Gpio<R, N> {
    /// Multiplexer value of (function, unit, signal) on the selected pin.
    ///
    /// Fails with [`Error::NotFound`] for an unknown pin and with
    /// [`Error::InvalidArgument`] when the pin cannot carry the signal.
    pub fn find_af_index<'a>(
        &self,
        selector: impl Into<PinSelector<'a>>,
        function: PeripheralFunction,
        unit: u8,
        signal: u8,
    ) -> Result<u8, Error> {
        self.pin(selector)?
            .lookup_af(function, unit, signal)
            .map_err(|_| Error::InvalidArgument)
    }

    /// [`Pin::find_unit`] on the selected pin.
    pub fn find_unit<'a>(
        &self,
        selector: impl Into<PinSelector<'a>>,
        function: PeripheralFunction,
        signal: u8,
    ) -> Result<u8, Error> {
        self.pin(selector)?
            .find_unit(function, signal)
            .map_err(|_| Error::InvalidArgument)
    }

    /// [`Pin::find_type`] on the selected pin.
    pub fn find_type<'a>(
        &self,
        selector: impl Into<PinSelector<'a>>,
        function: PeripheralFunction,
        unit: u8,
    ) -> Result<u8, Error> {
        self.pin(selector)?
            .find_type(function, unit)
            .map_err(|_| Error::InvalidArgument)
    }

    /// Pins currently carrying (function, unit, signal). There is never more
    /// than one.
    pub fn holders(
        &self,
        function: PeripheralFunction,
        unit: u8,
        signal: u8,
    ) -> impl Iterator<Item = Pin<'_, R, N>> + '_ {
        self.pins().filter(move |pin| {
            pin.bound_signal()
                .is_some_and(|af| af.is(function, unit, signal))
        })
    }

    /// Release (function, unit, signal) from every pin carrying it.
    ///
    /// Released pins become unclaimed floating inputs. This completes before
    /// any new pin is given the signal.
    pub fn evict_conflicting(&self, function: PeripheralFunction, unit: u8, signal: u8) {
        for pin in self.pins() {
            if pin
                .bound_signal()
                .is_some_and(|af| af.is(function, unit, signal))
            {
                debug!(
                    "gpio: releasing {} from {}",
                    pin.bound_signal().map(|af| af.name),
                    pin.name()
                );
                self.deassign(pin.id());
            }
        }
    }

    /// Connect instance `unit` of `function` to `pins`.
    ///
    /// Entry `i` of `pins` receives signal `i` of the instance. Each signal is
    /// first released from whichever pin holds it; a `None` entry leaves that
    /// signal unconnected. Assigned pins get the open-drain pad, `pull` and
    /// 2 mA drive.
    ///
    /// Signals before a failing entry stay assigned, the failing signal stays
    /// released.
    pub fn assign_peripheral(
        &self,
        pins: &[Option<PinSelector<'_>>],
        pull: Pull,
        function: PeripheralFunction,
        unit: u8,
    ) -> Result<(), Error> {
        for (signal, selector) in pins.iter().enumerate() {
            let signal = u8::try_from(signal).map_err(|_| Error::InvalidArgument)?;
            self.evict_conflicting(function, unit, signal);
            let Some(selector) = selector else {
                continue;
            };
            let pin = self.pin(*selector)?;
            let mux = pin
                .lookup_af(function, unit, signal)
                .map_err(|_| Error::InvalidArgument)?;
            let config = PinConfig {
                mode: Mode::AlternateFunction,
                pull,
                drive: OutputDriveStrength::TwoMilliAmps,
                alt: mux,
                used: true,
                ..pin.config()
            };
            self.commit(pin.id(), config);
        }
        Ok(())
    }
}
