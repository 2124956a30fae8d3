//! Register backend for the TM4C123 GPIO ports
//!
//! Drives the APB aperture of ports A to F, the `RCGCGPIO` clock gate and the
//! NVIC lines of the six port interrupts.

use cortex_m::interrupt::InterruptNumber;
use cortex_m::peripheral::NVIC;
use vcell::VolatileCell;

use super::{Direction, OutputDriveStrength, PinDesc, Port, PortRegisters, Priority, Pull, Trigger};

const PORT_BASE: [usize; 6] = [
    0x4000_4000,
    0x4000_5000,
    0x4000_6000,
    0x4000_7000,
    0x4002_4000,
    0x4002_5000,
];

/// GPIO run mode clock gating control
const RCGCGPIO: usize = 0x400F_E608;
/// GPIO peripheral ready
const PRGPIO: usize = 0x400F_EA08;

/// Unlocks the commit register of a port.
const LOCK_KEY: u32 = 0x4C4F_434B;

#[allow(dead_code)]
#[repr(C)]
struct RegisterBlock {
    /// Address bits 9:2 mask the access
    data: [VolatileCell<u32>; 256],
    dir: VolatileCell<u32>,
    is: VolatileCell<u32>,
    ibe: VolatileCell<u32>,
    iev: VolatileCell<u32>,
    im: VolatileCell<u32>,
    ris: VolatileCell<u32>,
    mis: VolatileCell<u32>,
    icr: VolatileCell<u32>,
    afsel: VolatileCell<u32>,
    _reserved0: [u32; 55],
    dr2r: VolatileCell<u32>,
    dr4r: VolatileCell<u32>,
    dr8r: VolatileCell<u32>,
    odr: VolatileCell<u32>,
    pur: VolatileCell<u32>,
    pdr: VolatileCell<u32>,
    slr: VolatileCell<u32>,
    den: VolatileCell<u32>,
    lock: VolatileCell<u32>,
    cr: VolatileCell<u32>,
    amsel: VolatileCell<u32>,
    pctl: VolatileCell<u32>,
    adcctl: VolatileCell<u32>,
    dmactl: VolatileCell<u32>,
}

#[inline]
fn modify(reg: &VolatileCell<u32>, mask: u32, set: bool) {
    let value = reg.get();
    reg.set(if set { value | mask } else { value & !mask });
}

/// Interrupt lines of the GPIO ports.
#[allow(missing_docs)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u16)]
pub enum Interrupt {
    GPIOA = 0,
    GPIOB = 1,
    GPIOC = 2,
    GPIOD = 3,
    GPIOE = 4,
    GPIOF = 30,
}

impl From<Port> for Interrupt {
    fn from(port: Port) -> Self {
        match port {
            Port::A => Interrupt::GPIOA,
            Port::B => Interrupt::GPIOB,
            Port::C => Interrupt::GPIOC,
            Port::D => Interrupt::GPIOD,
            Port::E => Interrupt::GPIOE,
            Port::F => Interrupt::GPIOF,
        }
    }
}

// SAFETY: the discriminants are the TM4C123 vector numbers of the GPIO ports.
unsafe impl InterruptNumber for Interrupt {
    #[inline]
    fn number(self) -> u16 {
        self as u16
    }
}

/// The TM4C123 GPIO hardware.
pub struct Tm4c123 {
    _private: (),
}

impl Tm4c123 {
    /// Take the GPIO hardware.
    ///
    /// # Safety
    ///
    /// Only one `Tm4c123` may exist, and nothing else may write the GPIO port
    /// registers, `RCGCGPIO` or the NVIC entries of the GPIO ports.
    pub const unsafe fn new() -> Self {
        Self { _private: () }
    }

    #[inline]
    fn block(&self, port: Port) -> &'static RegisterBlock {
        // SAFETY: fixed peripheral address, exclusive per the contract of `new`
        unsafe { &*(PORT_BASE[port.index()] as *const RegisterBlock) }
    }

    /// Lift the commit protection of the pins in `mask`. Only PD7 and PF0 are
    /// protected after reset.
    #[inline]
    fn unlock(&self, block: &RegisterBlock, mask: u32) {
        block.lock.set(LOCK_KEY);
        modify(&block.cr, mask, true);
        block.lock.set(0);
    }
}

impl PortRegisters for Tm4c123 {
    fn enable_clock(&self, port: Port) {
        let bit = 1 << port.index();
        // SAFETY: fixed SYSCTL addresses, exclusive per the contract of `new`
        let (rcgc, pr) = unsafe {
            (
                &*(RCGCGPIO as *const VolatileCell<u32>),
                &*(PRGPIO as *const VolatileCell<u32>),
            )
        };
        if rcgc.get() & bit != 0 {
            return;
        }
        modify(rcgc, bit, true);
        while pr.get() & bit == 0 {
            core::hint::spin_loop();
        }
    }

    fn set_direction(&self, pin: &PinDesc, direction: Direction) {
        let block = self.block(pin.port);
        let mask = u32::from(pin.bit);
        self.unlock(block, mask);
        match direction {
            Direction::Input => {
                modify(&block.dir, mask, false);
                modify(&block.afsel, mask, false);
            }
            Direction::Output => {
                modify(&block.dir, mask, true);
                modify(&block.afsel, mask, false);
            }
            Direction::Hardware => {
                modify(&block.dir, mask, false);
                modify(&block.afsel, mask, true);
            }
        }
    }

    fn select_function(&self, pin: &PinDesc, mux: u8) {
        let block = self.block(pin.port);
        self.unlock(block, u32::from(pin.bit));
        let shift = u32::from(pin.bit_index()) * 4;
        let pctl = block.pctl.get() & !(0xF << shift);
        block.pctl.set(pctl | (u32::from(mux & 0xF) << shift));
    }

    fn set_pad(&self, pin: &PinDesc, drive: OutputDriveStrength, pull: Pull, open_drain: bool) {
        let block = self.block(pin.port);
        let mask = u32::from(pin.bit);
        self.unlock(block, mask);
        modify(&block.dr2r, mask, drive == OutputDriveStrength::TwoMilliAmps);
        modify(&block.dr4r, mask, drive == OutputDriveStrength::FourMilliAmps);
        modify(&block.dr8r, mask, drive == OutputDriveStrength::EightMilliAmps);
        modify(&block.slr, mask, false);
        modify(&block.odr, mask, open_drain);
        modify(&block.pur, mask, pull == Pull::Up);
        modify(&block.pdr, mask, pull == Pull::Down);
        modify(&block.amsel, mask, false);
        modify(&block.den, mask, true);
    }

    fn write(&self, port: Port, mask: u8, high: bool) {
        let block = self.block(port);
        block.data[usize::from(mask)].set(if high { u32::from(mask) } else { 0 });
    }

    fn read(&self, port: Port, mask: u8) -> bool {
        self.block(port).data[usize::from(mask)].get() != 0
    }

    fn set_interrupt_type(&self, port: Port, mask: u8, trigger: Trigger) {
        let block = self.block(port);
        let mask = u32::from(mask);
        let (level, both, high) = match trigger {
            Trigger::Falling => (false, false, false),
            Trigger::Rising => (false, false, true),
            Trigger::BothEdges => (false, true, false),
            Trigger::LowLevel => (true, false, false),
            Trigger::HighLevel => (true, false, true),
        };
        modify(&block.ibe, mask, both);
        modify(&block.is, mask, level);
        modify(&block.iev, mask, high);
    }

    fn mask_interrupt(&self, port: Port, mask: u8) {
        modify(&self.block(port).im, u32::from(mask), false);
    }

    fn unmask_interrupt(&self, port: Port, mask: u8) {
        modify(&self.block(port).im, u32::from(mask), true);
    }

    fn clear_interrupt(&self, port: Port, mask: u8) {
        self.block(port).icr.set(u32::from(mask));
    }

    fn take_pending(&self, port: Port) -> u8 {
        let block = self.block(port);
        let pending = block.mis.get() & 0xFF;
        block.icr.set(pending);
        pending as u8
    }

    fn install_vector(&self, port: Port) {
        // SAFETY: the vector forwards to `Gpio::on_port_interrupt`, which
        // only touches state guarded by critical sections
        unsafe { NVIC::unmask(Interrupt::from(port)) };
    }

    fn set_priority(&self, port: Port, priority: Priority) {
        // SAFETY: only the priority byte of a GPIO line is written, which
        // belongs to this backend per the contract of `new`
        unsafe {
            let mut peripherals = cortex_m::Peripherals::steal();
            peripherals
                .NVIC
                .set_priority(Interrupt::from(port), priority.nvic());
        }
    }
}

/// Define the six GPIO port interrupt vectors, forwarding to a `static`
/// [`Gpio`](super::Gpio) controller.
///
/// The vectors are exported under the names a TM4C123 device vector table
/// links against (`GPIOA` to `GPIOF`). Use it once per firmware image.
///
/// ```ignore
/// static GPIO: Gpio<Tm4c123, 43> = Gpio::new(unsafe { Tm4c123::new() }, &board::PINS);
///
/// tm4c123_hal::gpio_interrupt_handlers!(GPIO);
/// ```
#[macro_export]
macro_rules! gpio_interrupt_handlers {
    ($gpio:expr) => {
        $crate::gpio_interrupt_handlers!(@ports $gpio; A, B, C, D, E, F);
    };
    (@ports $gpio:expr; $($port:ident),*) => {
        $crate::paste::paste! {
            $(
                #[allow(non_snake_case)]
                #[no_mangle]
                extern "C" fn [<GPIO $port>]() {
                    $gpio.on_port_interrupt($crate::gpio::Port::$port);
                }
            )*
        }
    };
}
