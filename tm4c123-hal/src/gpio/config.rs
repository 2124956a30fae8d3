//! Pin configuration
//!
//! Stored pin fields are pushed to the hardware in a fixed order: clock,
//! direction and output level first, then the function multiplexer, then the
//! pad. A peripheral bus attached to the pin never sees an intermediate state
//! that drives it.

use super::irq::IrqMasked;
use super::{
    Direction, Error, Field, Gpio, Mode, OutputDriveStrength, Pin, PinConfig, PinId,
    PortRegisters, Pull,
};

/// Full configuration request for [`Pin::init`].
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PinInit {
    /// Operating mode.
    pub mode: Mode,
    /// Pull resistor.
    pub pull: Pull,
    /// Output level, `None` keeps the last written one.
    pub value: Option<bool>,
    /// Output drive strength.
    pub drive: OutputDriveStrength,
    /// Multiplexer value of the alternate function. Required with
    /// [`Mode::AlternateFunction`], rejected with every other mode.
    pub alt: Option<u8>,
}

impl Default for PinInit {
    fn default() -> Self {
        Self {
            mode: Mode::Input,
            pull: Pull::None,
            value: None,
            drive: OutputDriveStrength::FourMilliAmps,
            alt: None,
        }
    }
}

impl PinInit {
    /// Digital input with the given pull resistor.
    pub fn input(pull: Pull) -> Self {
        Self {
            pull,
            ..Self::default()
        }
    }

    /// Push-pull output starting at `value`.
    pub fn output(value: bool) -> Self {
        Self {
            mode: Mode::Output,
            value: Some(value),
            ..Self::default()
        }
    }

    /// Open-drain output starting at `value`.
    pub fn open_drain(value: bool, pull: Pull) -> Self {
        Self {
            mode: Mode::OpenDrain,
            pull,
            value: Some(value),
            ..Self::default()
        }
    }

    /// Hand the pin to the peripheral signal with multiplexer value `alt`.
    pub fn alternate(alt: u8, pull: Pull) -> Self {
        Self {
            mode: Mode::AlternateFunction,
            pull,
            alt: Some(alt),
            ..Self::default()
        }
    }
}

impl<R: PortRegisters, const N: usize> Gpio<R, N> {
    /// Force every pin to an unclaimed floating input with no alternate
    /// function and no interrupt handler.
    ///
    /// Call once at start up so that no peripheral signal is claimed by a
    /// configuration left over from before a soft restart.
    pub fn init(&self) {
        for i in 0..N {
            let id = PinId(i as u8);
            self.reset_irq(id);
            self.deassign(id);
        }
    }

    /// Write the stored configuration of `id` to the hardware again.
    ///
    /// This is what a low power manager calls on wake.
    pub fn reconfigure(&self, id: PinId) {
        if id.index() < N {
            self.configure(id);
        } else {
            warn!("gpio: reconfigure of unknown pin {}", id);
        }
    }

    pub(crate) fn configure(&self, id: PinId) {
        let desc = self.desc(id);
        let config = self.load(id);
        let regs = &self.regs;

        regs.enable_clock(desc.port);
        match config.mode {
            Mode::Input => {
                regs.set_direction(desc, Direction::Input);
                regs.write(desc.port, desc.bit, config.value);
            }
            Mode::Output | Mode::OpenDrain => {
                regs.set_direction(desc, Direction::Output);
                regs.write(desc.port, desc.bit, config.value);
            }
            Mode::AlternateFunction => {
                regs.set_direction(desc, Direction::Output);
                regs.write(desc.port, desc.bit, config.value);
                regs.select_function(desc, config.alt);
                regs.set_direction(desc, Direction::Hardware);
            }
        }
        let open_drain = matches!(config.mode, Mode::OpenDrain | Mode::AlternateFunction);
        regs.set_pad(desc, config.drive, config.pull, open_drain);
    }

    /// Store `config`, push it to the hardware and register the pin with the
    /// sleep collaborator.
    pub(crate) fn commit(&self, id: PinId, config: PinConfig) {
        {
            let _masked = IrqMasked::new(self, id);
            self.store(id, config);
            self.configure(id);
        }
        if let Some(hook) = self.sleep {
            hook.service.register_wake_callback(id, hook.reconfigure);
        }
    }

    /// Return a pin to the unclaimed floating input state.
    pub(crate) fn deassign(&self, id: PinId) {
        let config = PinConfig {
            mode: Mode::Input,
            pull: Pull::None,
            drive: OutputDriveStrength::TwoMilliAmps,
            alt: 0,
            used: false,
            ..self.load(id)
        };
        self.commit(id, config);
    }
}

impl<R: PortRegisters, const N: usize> Pin<'_, R, N> {
    /// Reconfigure the pin in one go.
    ///
    /// When an alternate function is requested every other pin holding the
    /// same peripheral signal is released first. Nothing changes when the
    /// request is invalid.
    pub fn init(&self, init: PinInit) -> Result<(), Error> {
        let alt = match (init.mode, init.alt) {
            (Mode::AlternateFunction, Some(alt)) if (1..=15).contains(&alt) => alt,
            (Mode::AlternateFunction, _) => return Err(Error::InvalidArgument),
            (_, None) => 0,
            (_, Some(_)) => return Err(Error::InvalidArgument),
        };
        if alt != 0 {
            let af = self.desc().alt_by_mux(alt).ok_or(Error::InvalidArgument)?;
            self.gpio.evict_conflicting(af.function, af.unit, af.signal);
        }

        let current = self.config();
        self.gpio.commit(
            self.id,
            PinConfig {
                mode: init.mode,
                pull: init.pull,
                drive: init.drive,
                value: init.value.unwrap_or(current.value),
                alt,
                used: true,
            },
        );
        Ok(())
    }

    /// Set a configuration field from its raw value.
    pub fn set_field(&self, field: Field, raw: u32) -> Result<(), Error> {
        match field {
            Field::Mode => self.set_mode(Mode::try_from(raw)?),
            Field::Pull => {
                self.set_pull(Pull::try_from(raw)?);
                Ok(())
            }
            Field::Drive => {
                self.set_drive(OutputDriveStrength::try_from(raw)?);
                Ok(())
            }
        }
    }

    /// Raw value of a configuration field.
    pub fn field(&self, field: Field) -> u32 {
        let config = self.config();
        match field {
            Field::Mode => config.mode as u32,
            Field::Pull => config.pull as u32,
            Field::Drive => config.drive as u32,
        }
    }

    /// Change the operating mode.
    ///
    /// Leaving [`Mode::AlternateFunction`] releases the bound peripheral
    /// signal. Entering it is only possible through [`Pin::init`] or
    /// [`Gpio::assign_peripheral`], which say which signal to bind; here it
    /// fails with [`Error::InvalidArgument`] unless a signal is already bound.
    pub fn set_mode(&self, mode: Mode) -> Result<(), Error> {
        let mut config = self.config();
        if mode == Mode::AlternateFunction {
            if config.alt == 0 {
                return Err(Error::InvalidArgument);
            }
        } else {
            config.alt = 0;
        }
        config.mode = mode;
        config.used = true;
        self.gpio.commit(self.id, config);
        Ok(())
    }

    #[allow(missing_docs)]
    pub fn set_pull(&self, pull: Pull) {
        let config = PinConfig {
            pull,
            used: true,
            ..self.config()
        };
        self.gpio.commit(self.id, config);
    }

    #[allow(missing_docs)]
    pub fn set_drive(&self, drive: OutputDriveStrength) {
        let config = PinConfig {
            drive,
            used: true,
            ..self.config()
        };
        self.gpio.commit(self.id, config);
    }

    /// Read the level on the pin.
    ///
    /// An open-drain pin is briefly switched to input for the read and then
    /// drives its last written level again, so that a device pulling the line
    /// low is never fought.
    pub fn value(&self) -> bool {
        let desc = self.desc();
        let regs = self.gpio.registers();
        let config = self.config();
        if config.mode != Mode::OpenDrain {
            return regs.read(desc.port, desc.bit);
        }
        regs.set_direction(desc, Direction::Input);
        let level = regs.read(desc.port, desc.bit);
        regs.set_direction(desc, Direction::Output);
        regs.write(desc.port, desc.bit, config.value);
        level
    }

    /// Drive the pin high or low and remember the level.
    pub fn set_value(&self, high: bool) {
        let desc = self.desc();
        self.gpio.update(self.id, |config| config.value = high);
        self.gpio.registers().write(desc.port, desc.bit, high);
    }
}

impl<R: PortRegisters, const N: usize> Gpio<R, N> {
    pub(crate) fn update(&self, id: PinId, f: impl FnOnce(&mut PinConfig)) {
        critical_section::with(|cs| {
            let slot = self.config[id.index()].borrow(cs);
            let mut config = slot.get();
            f(&mut config);
            slot.set(config);
        });
    }
}

#[cfg(test)]
mod tests {
    use std::vec::Vec;

    use super::super::mock::{board, board_with_sleep, handler, Op};
    use super::super::{Port, PowerMode, Trigger};
    use super::*;

    #[test]
    fn setting_input_mode_releases_the_signal() {
        let gpio = board();
        for pin in gpio.pins() {
            if let Some(af) = pin.desc().alt_functions().first() {
                pin.init(PinInit::alternate(af.mux(), Pull::None)).unwrap();
                assert_eq!(pin.alt(), af.mux());
            }
            pin.set_field(Field::Mode, Mode::Input as u32).unwrap();
            assert_eq!(pin.alt(), 0);
            assert_eq!(pin.mode(), Mode::Input);
            assert_eq!(pin.field(Field::Mode), 0x0);
        }
    }

    #[test]
    fn illegal_drive_leaves_the_drive_alone() {
        let gpio = board();
        let pin = gpio.pin("PF2").unwrap();
        pin.set_drive(OutputDriveStrength::EightMilliAmps);
        gpio.registers().clear_ops();

        assert_eq!(pin.set_field(Field::Drive, 0x3), Err(Error::InvalidArgument));
        assert_eq!(pin.drive(), OutputDriveStrength::EightMilliAmps);
        assert!(gpio.registers().ops().is_empty());
    }

    #[test]
    fn illegal_mode_and_pull_are_rejected() {
        let gpio = board();
        let pin = gpio.pin("PF2").unwrap();
        assert_eq!(pin.set_field(Field::Mode, 0x3), Err(Error::InvalidArgument));
        assert_eq!(pin.set_field(Field::Pull, 0x0), Err(Error::InvalidArgument));
        assert_eq!(pin.config(), PinConfig::RESET);
    }

    #[test]
    fn raw_fields_round_trip() {
        let gpio = board();
        let pin = gpio.pin("PF2").unwrap();
        pin.set_field(Field::Mode, 0x9).unwrap();
        pin.set_field(Field::Pull, 0xA).unwrap();
        pin.set_field(Field::Drive, 0x2).unwrap();
        assert_eq!(pin.mode(), Mode::OpenDrain);
        assert_eq!(pin.pull(), Pull::Up);
        assert_eq!(pin.drive(), OutputDriveStrength::FourMilliAmps);
        assert_eq!(pin.field(Field::Pull), 0xA);
        assert!(pin.is_used());
    }

    #[test]
    fn alternate_mode_needs_a_signal() {
        let gpio = board();
        let pin = gpio.pin("PB0").unwrap();
        assert_eq!(
            pin.set_mode(Mode::AlternateFunction),
            Err(Error::InvalidArgument)
        );
        assert_eq!(
            pin.init(PinInit {
                mode: Mode::AlternateFunction,
                ..PinInit::default()
            }),
            Err(Error::InvalidArgument)
        );
        // not in the catalog of PB0
        assert_eq!(
            pin.init(PinInit::alternate(3, Pull::None)),
            Err(Error::InvalidArgument)
        );
        assert_eq!(
            pin.init(PinInit::alternate(16, Pull::None)),
            Err(Error::InvalidArgument)
        );
        // alt without alternate mode
        assert_eq!(
            pin.init(PinInit {
                alt: Some(1),
                ..PinInit::output(true)
            }),
            Err(Error::InvalidArgument)
        );
        assert_eq!(pin.config(), PinConfig::RESET);

        pin.init(PinInit::alternate(7, Pull::Up)).unwrap();
        pin.set_mode(Mode::AlternateFunction).unwrap();
        assert_eq!(pin.alt(), 7);
    }

    #[test]
    fn alternate_function_write_order() {
        let gpio = board();
        let pin = gpio.pin("PB1").unwrap();
        gpio.registers().clear_ops();

        pin.init(PinInit::alternate(1, Pull::Up)).unwrap();
        assert_eq!(
            gpio.registers().ops(),
            [
                Op::Clock(Port::B),
                Op::Direction("PB1", Direction::Output),
                Op::Write(Port::B, 1 << 1, false),
                Op::Function("PB1", 1),
                Op::Direction("PB1", Direction::Hardware),
                Op::Pad("PB1", OutputDriveStrength::FourMilliAmps, Pull::Up, true),
            ]
        );
    }

    #[test]
    fn output_write_order() {
        let gpio = board();
        let pin = gpio.pin("PF2").unwrap();
        gpio.registers().clear_ops();

        pin.init(PinInit::output(true)).unwrap();
        assert_eq!(
            gpio.registers().ops(),
            [
                Op::Clock(Port::F),
                Op::Direction("PF2", Direction::Output),
                Op::Write(Port::F, 1 << 2, true),
                Op::Pad("PF2", OutputDriveStrength::FourMilliAmps, Pull::None, false),
            ]
        );
        assert!(pin.config().value);
    }

    #[test]
    fn open_drain_output_is_forced_to_output_with_the_open_drain_pad() {
        let gpio = board();
        let pin = gpio.pin("PE5").unwrap();
        gpio.registers().clear_ops();

        pin.init(PinInit::open_drain(true, Pull::Up)).unwrap();
        let ops = gpio.registers().ops();
        assert_eq!(ops[1], Op::Direction("PE5", Direction::Output));
        assert_eq!(
            ops.last(),
            Some(&Op::Pad("PE5", OutputDriveStrength::FourMilliAmps, Pull::Up, true))
        );
    }

    #[test]
    fn open_drain_read_releases_the_line() {
        let gpio = board();
        let pin = gpio.pin("PE5").unwrap();
        pin.init(PinInit::open_drain(true, Pull::Up)).unwrap();
        gpio.registers().set_level(Port::E, 1 << 5, false);
        gpio.registers().clear_ops();

        assert!(!pin.value());
        assert_eq!(
            gpio.registers().ops(),
            [
                Op::Direction("PE5", Direction::Input),
                Op::Read(Port::E, 1 << 5),
                Op::Direction("PE5", Direction::Output),
                Op::Write(Port::E, 1 << 5, true),
            ]
        );
    }

    #[test]
    fn push_pull_read_is_plain() {
        let gpio = board();
        let pin = gpio.pin("PF4").unwrap();
        gpio.registers().set_level(Port::F, 1 << 4, true);
        gpio.registers().clear_ops();

        assert!(pin.value());
        assert_eq!(gpio.registers().ops(), [Op::Read(Port::F, 1 << 4)]);
    }

    #[test]
    fn init_value_none_keeps_the_shadow() {
        let gpio = board();
        let pin = gpio.pin("PF2").unwrap();
        pin.init(PinInit::output(true)).unwrap();
        pin.init(PinInit {
            mode: Mode::Output,
            ..PinInit::default()
        })
        .unwrap();
        assert!(pin.config().value);
    }

    #[test]
    fn init_unclaims_every_pin() {
        let gpio = board();
        let uart = gpio.pin("PA0").unwrap();
        uart.init(PinInit::alternate(1, Pull::Up)).unwrap();
        let led = gpio.pin("PF2").unwrap();
        led.init(PinInit::output(true)).unwrap();
        led.set_drive(OutputDriveStrength::EightMilliAmps);

        gpio.init();
        for pin in gpio.pins() {
            let config = pin.config();
            assert_eq!(config.mode, Mode::Input);
            assert_eq!(config.pull, Pull::None);
            assert_eq!(config.drive, OutputDriveStrength::TwoMilliAmps);
            assert_eq!(config.alt, 0);
            assert!(!config.used);
        }
        // the output shadow survives
        assert!(led.config().value);
    }

    #[test]
    fn init_drops_interrupt_handlers() {
        let gpio = board();
        let pin = gpio.pin("PF4").unwrap();
        let handle = pin
            .register_irq(Trigger::Falling, 1, PowerMode::ACTIVE, handler(|_| Ok(())))
            .unwrap();
        gpio.init();
        assert!(!handle.is_active());
        assert!(!handle.is_enabled());
    }

    #[test]
    fn every_commit_reaches_the_sleep_collaborator() {
        let (gpio, sleep) = board_with_sleep();
        let pin = gpio.pin("PF2").unwrap();
        pin.init(PinInit::output(false)).unwrap();
        pin.set_pull(Pull::Down);
        pin.set_drive(OutputDriveStrength::TwoMilliAmps);
        assert_eq!(sleep.calls(), [pin.id(); 3]);

        // rejected requests do not register
        let _ = pin.set_field(Field::Drive, 0);
        assert_eq!(sleep.calls().len(), 3);
    }

    #[test]
    fn reconfigure_replays_the_stored_fields() {
        let gpio = board();
        let pin = gpio.pin("PC4").unwrap();
        pin.init(PinInit::alternate(2, Pull::Up)).unwrap();
        let first = gpio.registers().ops();
        gpio.registers().clear_ops();

        gpio.reconfigure(pin.id());
        let replay: Vec<Op> = gpio.registers().ops();
        assert_eq!(replay[..], first[first.len() - replay.len()..]);
        assert!(replay.contains(&Op::Function("PC4", 2)));

        gpio.registers().clear_ops();
        gpio.reconfigure(PinId(99));
        assert!(gpio.registers().ops().is_empty());
    }
}
