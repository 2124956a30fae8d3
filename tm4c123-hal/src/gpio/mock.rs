//! Recording register backend for the host tests.

use core::cell::RefCell;
use std::boxed::Box;
use std::sync::Mutex as StdMutex;
use std::vec::Vec;

use super::func::PeripheralFunction::{Can, I2c, Pwm, Qei, Ssi, Timer, Uart, Usb, WideTimer};
use super::{
    AltFunction, Direction, Error, Gpio, IrqHandler, OutputDriveStrength, Pin, PinDesc, PinId,
    Port, PortRegisters, Priority, Pull, Trigger,
};
use crate::sleep::SleepPersistence;

/// One register level request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Op {
    Clock(Port),
    Direction(&'static str, Direction),
    Function(&'static str, u8),
    Pad(&'static str, OutputDriveStrength, Pull, bool),
    Write(Port, u8, bool),
    Read(Port, u8),
    InterruptType(Port, u8, Trigger),
    Mask(Port, u8),
    Unmask(Port, u8),
    Clear(Port, u8),
    Vector(Port),
    Priority(Port, u8),
}

#[derive(Default)]
struct State {
    ops: Vec<Op>,
    // externally driven pin levels
    level: [u8; 6],
    // raw interrupt status
    ris: [u8; 6],
    // interrupt mask, 1 = unmasked
    im: [u8; 6],
}

pub(crate) struct MockPort {
    state: RefCell<State>,
}

impl MockPort {
    pub(crate) fn new() -> Self {
        Self {
            state: RefCell::new(State::default()),
        }
    }

    pub(crate) fn ops(&self) -> Vec<Op> {
        self.state.borrow().ops.clone()
    }

    pub(crate) fn clear_ops(&self) {
        self.state.borrow_mut().ops.clear();
    }

    pub(crate) fn set_level(&self, port: Port, mask: u8, high: bool) {
        let level = &mut self.state.borrow_mut().level[port.index()];
        if high {
            *level |= mask;
        } else {
            *level &= !mask;
        }
    }

    /// Latch an interrupt event on the pins in `mask`.
    pub(crate) fn raise(&self, port: Port, mask: u8) {
        self.state.borrow_mut().ris[port.index()] |= mask;
    }

    pub(crate) fn pending(&self, port: Port) -> u8 {
        self.state.borrow().ris[port.index()]
    }

    pub(crate) fn unmasked(&self, port: Port, mask: u8) -> bool {
        self.state.borrow().im[port.index()] & mask == mask
    }

    pub(crate) fn unmask_all(&self, port: Port) {
        self.state.borrow_mut().im[port.index()] = 0xFF;
    }

    fn record(&self, op: Op) {
        self.state.borrow_mut().ops.push(op);
    }
}

impl PortRegisters for MockPort {
    fn enable_clock(&self, port: Port) {
        self.record(Op::Clock(port));
    }

    fn set_direction(&self, pin: &PinDesc, direction: Direction) {
        self.record(Op::Direction(pin.name(), direction));
    }

    fn select_function(&self, pin: &PinDesc, mux: u8) {
        self.record(Op::Function(pin.name(), mux));
    }

    fn set_pad(&self, pin: &PinDesc, drive: OutputDriveStrength, pull: Pull, open_drain: bool) {
        self.record(Op::Pad(pin.name(), drive, pull, open_drain));
    }

    fn write(&self, port: Port, mask: u8, high: bool) {
        self.record(Op::Write(port, mask, high));
    }

    fn read(&self, port: Port, mask: u8) -> bool {
        self.record(Op::Read(port, mask));
        self.state.borrow().level[port.index()] & mask != 0
    }

    fn set_interrupt_type(&self, port: Port, mask: u8, trigger: Trigger) {
        self.record(Op::InterruptType(port, mask, trigger));
    }

    fn mask_interrupt(&self, port: Port, mask: u8) {
        self.record(Op::Mask(port, mask));
        self.state.borrow_mut().im[port.index()] &= !mask;
    }

    fn unmask_interrupt(&self, port: Port, mask: u8) {
        self.record(Op::Unmask(port, mask));
        self.state.borrow_mut().im[port.index()] |= mask;
    }

    fn clear_interrupt(&self, port: Port, mask: u8) {
        self.record(Op::Clear(port, mask));
        self.state.borrow_mut().ris[port.index()] &= !mask;
    }

    fn take_pending(&self, port: Port) -> u8 {
        let mut state = self.state.borrow_mut();
        let i = port.index();
        let pending = state.ris[i] & state.im[i];
        state.ris[i] &= !pending;
        pending
    }

    fn install_vector(&self, port: Port) {
        self.record(Op::Vector(port));
    }

    fn set_priority(&self, port: Port, priority: Priority) {
        self.record(Op::Priority(port, priority.nvic()));
    }
}

/// Records the pins registered for wake replay.
pub(crate) struct SleepRecorder {
    calls: StdMutex<Vec<PinId>>,
}

impl SleepRecorder {
    pub(crate) fn calls(&self) -> Vec<PinId> {
        self.calls.lock().unwrap().clone()
    }
}

impl SleepPersistence for SleepRecorder {
    fn register_wake_callback(&self, pin: PinId, _reconfigure: fn(PinId)) {
        self.calls.lock().unwrap().push(pin);
    }
}

pub(crate) const PINS: usize = 10;

/// A slice of the TM4C123GH6PM pin map.
pub(crate) static BOARD: [PinDesc; PINS] = [
    PinDesc::new(
        "PA0",
        Port::A,
        0,
        17,
        &[
            AltFunction::new("U0RX", Uart, 0, 0, 1),
            AltFunction::new("CAN1RX", Can, 1, 0, 8),
        ],
    ),
    PinDesc::new(
        "PA1",
        Port::A,
        1,
        18,
        &[
            AltFunction::new("U0TX", Uart, 0, 1, 1),
            AltFunction::new("CAN1TX", Can, 1, 1, 8),
        ],
    ),
    PinDesc::new(
        "PB0",
        Port::B,
        0,
        45,
        &[
            AltFunction::new("U1RX", Uart, 1, 0, 1),
            AltFunction::new("T2CCP0", Timer, 2, 0, 7),
        ],
    ),
    PinDesc::new(
        "PB1",
        Port::B,
        1,
        46,
        &[
            AltFunction::new("U1TX", Uart, 1, 1, 1),
            AltFunction::new("T2CCP1", Timer, 2, 1, 7),
        ],
    ),
    PinDesc::new(
        "PC4",
        Port::C,
        4,
        16,
        &[
            AltFunction::new("U4RX", Uart, 4, 0, 1),
            AltFunction::new("U1RX", Uart, 1, 0, 2),
            AltFunction::new("M0PWM6", Pwm, 0, 6, 4),
            AltFunction::new("IDX1", Qei, 1, 0, 6),
            AltFunction::new("WT0CCP0", WideTimer, 0, 0, 7),
            AltFunction::new("U1RTS", Uart, 1, 2, 8),
        ],
    ),
    PinDesc::new(
        "PC5",
        Port::C,
        5,
        15,
        &[
            AltFunction::new("U4TX", Uart, 4, 1, 1),
            AltFunction::new("U1TX", Uart, 1, 1, 2),
            AltFunction::new("M0PWM7", Pwm, 0, 7, 4),
            AltFunction::new("PHA1", Qei, 1, 1, 6),
            AltFunction::new("WT0CCP1", WideTimer, 0, 1, 7),
            AltFunction::new("U1CTS", Uart, 1, 3, 8),
        ],
    ),
    PinDesc::new("PE2", Port::E, 2, 8, &[]),
    PinDesc::new(
        "PE5",
        Port::E,
        5,
        60,
        &[
            AltFunction::new("U5TX", Uart, 5, 1, 1),
            AltFunction::new("I2C2SDA", I2c, 2, 1, 3),
            AltFunction::new("CAN0TX", Can, 0, 1, 8),
        ],
    ),
    PinDesc::new(
        "PF2",
        Port::F,
        2,
        30,
        &[
            AltFunction::new("SSI1CLK", Ssi, 1, 0, 2),
            AltFunction::new("M1PWM6", Pwm, 1, 6, 5),
            AltFunction::new("T1CCP0", Timer, 1, 0, 7),
        ],
    ),
    PinDesc::new(
        "PF4",
        Port::F,
        4,
        5,
        &[
            AltFunction::new("M1FAULT0", Pwm, 1, 8, 5),
            AltFunction::new("IDX0", Qei, 0, 0, 6),
            AltFunction::new("T2CCP0", Timer, 2, 0, 7),
            AltFunction::new("USB0EPEN", Usb, 0, 0, 8),
        ],
    ),
];

pub(crate) fn board() -> Gpio<MockPort, PINS> {
    Gpio::new(MockPort::new(), &BOARD)
}

pub(crate) fn board_with_sleep() -> (Gpio<MockPort, PINS>, &'static SleepRecorder) {
    fn wake(_: PinId) {}

    let sleep: &'static SleepRecorder = Box::leak(Box::new(SleepRecorder {
        calls: StdMutex::new(Vec::new()),
    }));
    (Gpio::new(MockPort::new(), &BOARD).with_sleep(sleep, wake), sleep)
}

pub(crate) fn handler<F>(f: F) -> &'static dyn IrqHandler<MockPort, PINS>
where
    F: Fn(Pin<'_, MockPort, PINS>) -> Result<(), Error> + Sync + 'static,
{
    Box::leak(Box::new(f))
}
