use super::{OutputDriveStrength, PinDesc, Port, Priority, Pull, Trigger};

/// Direction of a pin as seen by its port.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// Driven by the outside world, read through the data register.
    Input,
    /// Driven from the data register.
    Output,
    /// Handed over to the peripheral selected by the function multiplexer.
    Hardware,
}

/// Access to the GPIO port registers.
///
/// Pin level operations take the static [`PinDesc`], data and interrupt
/// operations take the port and a bit mask. Implementations only translate
/// requests into register accesses; ordering and bookkeeping stay with
/// [`Gpio`](super::Gpio).
pub trait PortRegisters: 'static {
    /// Enable the clock of `port` and wait until its registers respond.
    fn enable_clock(&self, port: Port);

    /// Set the direction of a pin. [`Direction::Hardware`] engages the
    /// function multiplexer.
    fn set_direction(&self, pin: &PinDesc, direction: Direction);

    /// Select multiplexer value `mux` for a pin.
    fn select_function(&self, pin: &PinDesc, mux: u8);

    /// Write the pad configuration of a pin.
    fn set_pad(&self, pin: &PinDesc, drive: OutputDriveStrength, pull: Pull, open_drain: bool);

    /// Drive the pins in `mask` high or low.
    fn write(&self, port: Port, mask: u8, high: bool);

    /// Read the level of the pins in `mask`, `true` when any of them is high.
    fn read(&self, port: Port, mask: u8) -> bool;

    /// Select what the pins in `mask` interrupt on.
    fn set_interrupt_type(&self, port: Port, mask: u8, trigger: Trigger);

    /// Stop the pins in `mask` from raising the port interrupt.
    fn mask_interrupt(&self, port: Port, mask: u8);

    /// Let the pins in `mask` raise the port interrupt.
    fn unmask_interrupt(&self, port: Port, mask: u8);

    /// Clear latched interrupt status of the pins in `mask`.
    fn clear_interrupt(&self, port: Port, mask: u8);

    /// Read the masked interrupt status of `port` and clear exactly the bits
    /// that were read.
    fn take_pending(&self, port: Port) -> u8;

    /// Route the interrupt of `port` to the CPU.
    fn install_vector(&self, port: Port);

    /// Set the priority of the interrupt of `port`.
    fn set_priority(&self, port: Port, priority: Priority);
}
