//! Pin interrupts
//!
//! Every port raises a single interrupt. [`Gpio::on_port_interrupt`] takes the
//! port's pending bits and runs the handler registered on each pin in
//! ascending bit order. While a handler runs, [`Pin::irq_flags`] says what
//! fired.

use core::ops::BitOr;

use super::{Error, Gpio, Pin, PinId, Port, PortRegisters};

/// What a pin interrupts on.
///
/// The discriminants are the raw trigger values accepted through
/// `TryFrom<u32>`.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Trigger {
    /// On falling edge
    Falling = 0x01,
    /// On rising edge
    Rising = 0x02,
    /// On both edges. The router reports each event as [`Trigger::Rising`]
    /// or [`Trigger::Falling`] from the level it samples on entry.
    BothEdges = 0x03,
    /// While low
    LowLevel = 0x04,
    /// While high
    HighLevel = 0x08,
}

impl TryFrom<u32> for Trigger {
    type Error = Error;

    fn try_from(raw: u32) -> Result<Self, Self::Error> {
        match raw {
            0x01 => Ok(Trigger::Falling),
            0x02 => Ok(Trigger::Rising),
            0x03 => Ok(Trigger::BothEdges),
            0x04 => Ok(Trigger::LowLevel),
            0x08 => Ok(Trigger::HighLevel),
            _ => Err(Error::InvalidArgument),
        }
    }
}

/// Interrupt priority level, 1 (least urgent) to 7 (most urgent).
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Priority(u8);

impl Priority {
    #[allow(missing_docs)]
    pub const LOWEST: Priority = Priority(1);
    #[allow(missing_docs)]
    pub const HIGHEST: Priority = Priority(7);

    /// Validate a priority level.
    pub const fn new(level: u8) -> Result<Self, Error> {
        if level >= Self::LOWEST.0 && level <= Self::HIGHEST.0 {
            Ok(Priority(level))
        } else {
            Err(Error::InvalidArgument)
        }
    }

    #[allow(missing_docs)]
    #[inline]
    pub const fn level(self) -> u8 {
        self.0
    }

    /// Value for the NVIC priority register. The TM4C123 implements the top
    /// three bits, lower values are more urgent.
    #[inline]
    pub const fn nvic(self) -> u8 {
        (8 - self.0) << 5
    }
}

/// Power modes an interrupt registration applies to.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PowerMode(u8);

impl PowerMode {
    /// Normal run mode: the port vector is set up and fires.
    pub const ACTIVE: PowerMode = PowerMode(0x1);
    /// Low power deep sleep: the pin is registered for wake replay.
    pub const LPDS: PowerMode = PowerMode(0x2);
    /// Hibernation.
    pub const HIBERNATE: PowerMode = PowerMode(0x4);

    const ALL: u8 = 0x7;

    #[allow(missing_docs)]
    #[inline]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// `true` when every flag of `other` is set in `self`.
    #[inline]
    pub const fn contains(self, other: PowerMode) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for PowerMode {
    type Output = PowerMode;

    fn bitor(self, rhs: Self) -> Self {
        PowerMode(self.0 | rhs.0)
    }
}

impl TryFrom<u32> for PowerMode {
    type Error = Error;

    fn try_from(raw: u32) -> Result<Self, Self::Error> {
        if raw & !u32::from(Self::ALL) != 0 {
            return Err(Error::InvalidArgument);
        }
        Ok(PowerMode(raw as u8))
    }
}

/// Callback run from the port interrupt.
///
/// Handlers run in interrupt context: they must not block and must not
/// reconfigure the pin they were called for. Returning an error disables the
/// interrupt of the pin and drops the handler.
///
/// Any `Fn(Pin) -> Result<(), Error>` that is `Sync` is a handler.
pub trait IrqHandler<R: PortRegisters, const N: usize>: Sync {
    /// Called for every interrupt of `pin`.
    fn on_interrupt(&self, pin: Pin<'_, R, N>) -> Result<(), Error>;
}

impl<R, const N: usize, F> IrqHandler<R, N> for F
where
    R: PortRegisters,
    F: Fn(Pin<'_, R, N>) -> Result<(), Error> + Sync,
{
    fn on_interrupt(&self, pin: Pin<'_, R, N>) -> Result<(), Error> {
        self(pin)
    }
}

/// Interrupt state of one pin.
pub(crate) struct IrqState<R: PortRegisters, const N: usize> {
    trigger: Option<Trigger>,
    flags: Option<Trigger>,
    enabled: bool,
    // bumped by every registration and every drop of the handler
    generation: u32,
    handler: Option<&'static dyn IrqHandler<R, N>>,
}

impl<R: PortRegisters, const N: usize> Clone for IrqState<R, N> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R: PortRegisters, const N: usize> Copy for IrqState<R, N> {}

impl<R: PortRegisters, const N: usize> IrqState<R, N> {
    pub(crate) const IDLE: Self = Self {
        trigger: None,
        flags: None,
        enabled: false,
        generation: 0,
        handler: None,
    };
}

/// Registration of a handler on a pin.
///
/// A newer registration on the same pin, or [`Gpio::init`], retires the
/// handle: from then on [`IrqHandle::enable`] and [`IrqHandle::disable`] do
/// nothing.
pub struct IrqHandle<'g, R: PortRegisters, const N: usize> {
    gpio: &'g Gpio<R, N>,
    id: PinId,
    generation: u32,
}

impl<'g, R: PortRegisters, const N: usize> IrqHandle<'g, R, N> {
    /// The pin the handler is registered on.
    pub fn pin(&self) -> Pin<'g, R, N> {
        Pin::new(self.gpio, self.id)
    }

    /// `false` once a newer registration replaced this one.
    pub fn is_active(&self) -> bool {
        self.gpio.irq_state(self.id).generation == self.generation
    }

    /// `true` while the handle is active and its interrupt unmasked.
    pub fn is_enabled(&self) -> bool {
        let state = self.gpio.irq_state(self.id);
        state.generation == self.generation && state.enabled
    }

    /// The trigger the handler was registered with.
    pub fn trigger(&self) -> Option<Trigger> {
        let state = self.gpio.irq_state(self.id);
        (state.generation == self.generation)
            .then_some(state.trigger)
            .flatten()
    }

    /// Clear stale status and unmask the interrupt.
    pub fn enable(&self) {
        self.gpio.enable_irq(self.id, Some(self.generation));
    }

    /// Mask the interrupt. A handler already running finishes normally.
    pub fn disable(&self) {
        self.gpio.disable_irq(self.id, Some(self.generation));
    }

    /// What fired, while the handler runs. `None` at any other time.
    pub fn pending_flags(&self) -> Option<Trigger> {
        let state = self.gpio.irq_state(self.id);
        (state.generation == self.generation)
            .then_some(state.flags)
            .flatten()
    }
}

/// Keeps the interrupt of a pin masked while its configuration changes.
///
/// Only masks when the interrupt is enabled, and on drop only unmasks when it
/// still is.
pub(crate) struct IrqMasked<'g, R: PortRegisters, const N: usize> {
    gpio: &'g Gpio<R, N>,
    id: PinId,
    masked: bool,
}

impl<'g, R: PortRegisters, const N: usize> IrqMasked<'g, R, N> {
    pub(crate) fn new(gpio: &'g Gpio<R, N>, id: PinId) -> Self {
        let desc = gpio.desc(id);
        let masked = critical_section::with(|cs| {
            let enabled = gpio.irq[id.index()].borrow(cs).get().enabled;
            if enabled {
                gpio.regs.mask_interrupt(desc.port, desc.bit);
            }
            enabled
        });
        Self { gpio, id, masked }
    }
}

impl<R: PortRegisters, const N: usize> Drop for IrqMasked<'_, R, N> {
    fn drop(&mut self) {
        if !self.masked {
            return;
        }
        let desc = self.gpio.desc(self.id);
        critical_section::with(|cs| {
            if self.gpio.irq[self.id.index()].borrow(cs).get().enabled {
                self.gpio.regs.unmask_interrupt(desc.port, desc.bit);
            }
        });
    }
}

impl<'g, R: PortRegisters, const N: usize> Pin<'g, R, N> {
    /// Run `handler` whenever `trigger` happens on the pin.
    ///
    /// `priority` is a level from 1 (least urgent) to 7 (most urgent) and
    /// applies to the whole port. With [`PowerMode::ACTIVE`] the port
    /// interrupt is set up; with [`PowerMode::LPDS`] the pin is registered
    /// with the sleep collaborator. Any earlier registration on the pin is
    /// disabled first and its handle retired.
    pub fn register_irq(
        &self,
        trigger: Trigger,
        priority: u8,
        power: PowerMode,
        handler: &'static dyn IrqHandler<R, N>,
    ) -> Result<IrqHandle<'g, R, N>, Error> {
        let priority = Priority::new(priority)?;
        let gpio = self.gpio;
        let desc = self.desc();
        let index = self.id.index();

        let generation = critical_section::with(|cs| {
            let slot = gpio.irq[index].borrow(cs);
            gpio.regs.mask_interrupt(desc.port, desc.bit);
            let mut state = slot.get();
            state.enabled = false;
            state.handler = None;
            state.generation = state.generation.wrapping_add(1);
            slot.set(state);
            state.generation
        });

        if power.contains(PowerMode::ACTIVE) {
            gpio.regs.set_interrupt_type(desc.port, desc.bit, trigger);
            gpio.install_vector(desc.port);
            gpio.regs.set_priority(desc.port, priority);
        }

        critical_section::with(|cs| {
            let slot = gpio.irq[index].borrow(cs);
            let mut state = slot.get();
            state.trigger = Some(trigger);
            state.handler = Some(handler);
            slot.set(state);
        });

        if power.contains(PowerMode::LPDS) {
            if let Some(hook) = gpio.sleep {
                hook.service.register_wake_callback(self.id, hook.reconfigure);
            }
        }

        debug!("gpio: irq on {} for {}", desc.name, trigger);
        gpio.enable_irq(self.id, None);
        Ok(IrqHandle {
            gpio,
            id: self.id,
            generation,
        })
    }

    /// What fired, while a handler of this pin runs. `None` at any other time.
    pub fn irq_flags(&self) -> Option<Trigger> {
        self.gpio.irq_state(self.id).flags
    }

    /// The trigger of the registered handler.
    pub fn irq_trigger(&self) -> Option<Trigger> {
        self.gpio.irq_state(self.id).trigger
    }
}

impl<R: PortRegisters, const N: usize> Gpio<R, N> {
    /// Dispatch the pending interrupts of `port`.
    ///
    /// Call this from the port's interrupt vector, see
    /// [`gpio_interrupt_handlers!`](crate::gpio_interrupt_handlers). The
    /// pending bits are read and cleared in one go, then each pin's handler
    /// runs to completion in ascending bit order.
    pub fn on_port_interrupt(&self, port: Port) {
        let pending = self.regs.take_pending(port);
        for bit in 0..8 {
            if pending & (1 << bit) == 0 {
                continue;
            }
            match self.id_at(port, bit) {
                Some(id) => self.dispatch(id),
                None => warn!("gpio: interrupt on P{}{} without a pin", port, bit),
            }
        }
    }

    fn dispatch(&self, id: PinId) {
        let desc = self.desc(id);
        let state = self.irq_state(id);
        let (true, Some(trigger), Some(handler)) = (state.enabled, state.trigger, state.handler)
        else {
            warn!("gpio: spurious interrupt on {}", desc.name);
            return;
        };

        let flags = match trigger {
            Trigger::BothEdges if self.regs.read(desc.port, desc.bit) => Trigger::Rising,
            Trigger::BothEdges => Trigger::Falling,
            trigger => trigger,
        };
        self.set_flags(id, Some(flags));
        trace!("gpio: {} fired {}", desc.name, flags);
        let result = handler.on_interrupt(Pin::new(self, id));
        self.set_flags(id, None);

        if let Err(error) = result {
            warn!("gpio: handler of {} failed: {}, disabling", desc.name, error);
            critical_section::with(|cs| {
                let slot = self.irq[id.index()].borrow(cs);
                let mut current = slot.get();
                // the handler may have registered a replacement
                if current.generation == state.generation {
                    self.regs.mask_interrupt(desc.port, desc.bit);
                    current.enabled = false;
                    current.handler = None;
                    current.generation = current.generation.wrapping_add(1);
                    slot.set(current);
                }
            });
        }
    }

    pub(crate) fn irq_state(&self, id: PinId) -> IrqState<R, N> {
        critical_section::with(|cs| self.irq[id.index()].borrow(cs).get())
    }

    fn set_flags(&self, id: PinId, flags: Option<Trigger>) {
        critical_section::with(|cs| {
            let slot = self.irq[id.index()].borrow(cs);
            let mut state = slot.get();
            state.flags = flags;
            slot.set(state);
        });
    }

    /// Clear stale status, then unmask. With `generation` set, only acts on
    /// that registration.
    fn enable_irq(&self, id: PinId, generation: Option<u32>) {
        let desc = self.desc(id);
        critical_section::with(|cs| {
            let slot = self.irq[id.index()].borrow(cs);
            let mut state = slot.get();
            if generation.is_some_and(|g| g != state.generation) {
                return;
            }
            self.regs.clear_interrupt(desc.port, desc.bit);
            state.enabled = true;
            slot.set(state);
            self.regs.unmask_interrupt(desc.port, desc.bit);
        });
    }

    fn disable_irq(&self, id: PinId, generation: Option<u32>) {
        let desc = self.desc(id);
        critical_section::with(|cs| {
            let slot = self.irq[id.index()].borrow(cs);
            let mut state = slot.get();
            if generation.is_some_and(|g| g != state.generation) {
                return;
            }
            self.regs.mask_interrupt(desc.port, desc.bit);
            state.enabled = false;
            slot.set(state);
        });
    }

    /// Mask the interrupt of `id`, drop its handler and retire its handle.
    pub(crate) fn reset_irq(&self, id: PinId) {
        let desc = self.desc(id);
        critical_section::with(|cs| {
            let slot = self.irq[id.index()].borrow(cs);
            self.regs.mask_interrupt(desc.port, desc.bit);
            let generation = slot.get().generation.wrapping_add(1);
            slot.set(IrqState {
                generation,
                ..IrqState::IDLE
            });
        });
    }

    fn install_vector(&self, port: Port) {
        let bit = 1 << port.index();
        let fresh = critical_section::with(|cs| {
            let installed = self.vectors.borrow(cs);
            let fresh = installed.get() & bit == 0;
            installed.set(installed.get() | bit);
            fresh
        });
        if fresh {
            self.regs.install_vector(port);
        }
    }
}
