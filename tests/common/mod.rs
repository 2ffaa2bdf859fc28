//! Register-file mock of the MPR121 shared by the integration tests.

#![allow(dead_code)]

use mpr121_touch::consts::{reg, SOFTRESET_MAGIC};
use mpr121_touch::{Channel, RegisterBus};
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    Write { register: u8, data: Vec<u8> },
    Read { register: u8, len: usize },
}

#[derive(thiserror::Error, Debug)]
#[error("mock bus failure at register 0x{0:02X}")]
pub struct MockBusError(pub u8);

#[derive(Default)]
struct State {
    registers: Vec<u8>,
    log: Vec<Op>,
    writes: usize,
    fail_write_index: Option<usize>,
    fail_reads: bool,
    fail_writes: bool,
}

/// Bus handle given to the driver; clones share the same chip state.
#[derive(Clone)]
pub struct MockBus {
    state: Rc<RefCell<State>>,
}

impl MockBus {
    pub fn new() -> Self {
        init_logging();
        Self {
            state: Rc::new(RefCell::new(State {
                registers: vec![0; 256],
                ..State::default()
            })),
        }
    }

    pub fn set_register(&self, register: u8, value: u8) {
        self.state.borrow_mut().registers[register as usize] = value;
    }

    pub fn register(&self, register: u8) -> u8 {
        self.state.borrow().registers[register as usize]
    }

    /// Puts `bitmap` into the touch status registers.
    pub fn set_touch_status(&self, bitmap: u16) {
        let [lo, hi] = bitmap.to_le_bytes();
        self.set_register(reg::TOUCHSTATUS_L, lo);
        self.set_register(reg::TOUCHSTATUS_H, hi);
    }

    /// Fails the `index`-th write transaction (0-based) and only that one.
    pub fn fail_write_at(&self, index: usize) {
        self.state.borrow_mut().fail_write_index = Some(index);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.state.borrow_mut().fail_writes = fail;
    }

    pub fn fail_reads(&self, fail: bool) {
        self.state.borrow_mut().fail_reads = fail;
    }

    pub fn log(&self) -> Vec<Op> {
        self.state.borrow().log.clone()
    }

    pub fn clear_log(&self) {
        self.state.borrow_mut().log.clear();
    }

    /// Registers written, in order.
    pub fn written_registers(&self) -> Vec<u8> {
        self.log()
            .into_iter()
            .filter_map(|op| match op {
                Op::Write { register, .. } => Some(register),
                Op::Read { .. } => None,
            })
            .collect()
    }

    /// Every value written to `register`, in order.
    pub fn writes_to(&self, register: u8) -> Vec<u8> {
        let mut values = Vec::new();
        for op in self.log() {
            if let Op::Write { register: start, data } = op {
                for (offset, value) in data.into_iter().enumerate() {
                    if start as usize + offset == register as usize {
                        values.push(value);
                    }
                }
            }
        }
        values
    }
}

impl RegisterBus for MockBus {
    type Error = MockBusError;

    fn write_register_block(
        &mut self,
        address: u8,
        register: u8,
        data: &[u8],
    ) -> Result<(), Self::Error> {
        assert_eq!(address, 0x5A, "unexpected device address");
        let mut state = self.state.borrow_mut();
        state.log.push(Op::Write {
            register,
            data: data.to_vec(),
        });
        let index = state.writes;
        state.writes += 1;
        if state.fail_writes || state.fail_write_index == Some(index) {
            return Err(MockBusError(register));
        }

        match (register, data) {
            (reg::SOFTRESET, [SOFTRESET_MAGIC]) => state.registers.iter_mut().for_each(|r| *r = 0),
            (reg::GPIOSET, [mask]) => state.registers[reg::GPIODATA as usize] |= mask,
            (reg::GPIOCLR, [mask]) => state.registers[reg::GPIODATA as usize] &= !mask,
            (reg::GPIOTOGGLE, [mask]) => state.registers[reg::GPIODATA as usize] ^= mask,
            _ => {
                for (offset, value) in data.iter().enumerate() {
                    state.registers[register as usize + offset] = *value;
                }
            }
        }
        Ok(())
    }

    fn read_register_block(
        &mut self,
        address: u8,
        register: u8,
        buffer: &mut [u8],
    ) -> Result<(), Self::Error> {
        assert_eq!(address, 0x5A, "unexpected device address");
        let mut state = self.state.borrow_mut();
        state.log.push(Op::Read {
            register,
            len: buffer.len(),
        });
        if state.fail_reads {
            return Err(MockBusError(register));
        }
        let start = register as usize;
        buffer.copy_from_slice(&state.registers[start..start + buffer.len()]);
        Ok(())
    }
}

/// Channel recording every bit it is handed.
#[derive(Clone, Default)]
pub struct Recorder {
    pub bits: Rc<RefCell<Vec<bool>>>,
    pub setups: Rc<RefCell<usize>>,
}

impl Recorder {
    pub fn bits(&self) -> Vec<bool> {
        self.bits.borrow().clone()
    }
}

impl Channel for Recorder {
    fn setup(&mut self) {
        *self.setups.borrow_mut() += 1;
    }

    fn process(&mut self, touched: bool) {
        self.bits.borrow_mut().push(touched);
    }
}

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
