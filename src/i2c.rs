//! Register-level bus access used by the driver.

use embedded_hal::i2c::{self, ErrorKind};
use log::trace;
use thiserror::Error;

/// Register transport for a device at a fixed 7-bit I2C address.
///
/// Each call is one complete bus transaction. Retries, arbitration and
/// sharing a physical bus between devices are the implementor's business.
pub trait RegisterBus {
    /// Transport error, boxed into [`crate::Error::Communication`] by the driver.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Writes `data` to consecutive registers starting at `register`.
    fn write_register_block(
        &mut self,
        address: u8,
        register: u8,
        data: &[u8],
    ) -> Result<(), Self::Error>;

    /// Reads `buffer.len()` consecutive registers starting at `register`.
    fn read_register_block(
        &mut self,
        address: u8,
        register: u8,
        buffer: &mut [u8],
    ) -> Result<(), Self::Error>;

    /// Writes a single register.
    fn write_register(&mut self, address: u8, register: u8, value: u8) -> Result<(), Self::Error> {
        self.write_register_block(address, register, &[value])
    }
}

impl<T: RegisterBus + ?Sized> RegisterBus for &mut T {
    type Error = T::Error;

    fn write_register_block(
        &mut self,
        address: u8,
        register: u8,
        data: &[u8],
    ) -> Result<(), Self::Error> {
        (**self).write_register_block(address, register, data)
    }

    fn read_register_block(
        &mut self,
        address: u8,
        register: u8,
        buffer: &mut [u8],
    ) -> Result<(), Self::Error> {
        (**self).read_register_block(address, register, buffer)
    }

    fn write_register(&mut self, address: u8, register: u8, value: u8) -> Result<(), Self::Error> {
        (**self).write_register(address, register, value)
    }
}

/// Error of an `embedded-hal` I2C transaction, reduced to its kind.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("I2C bus error: {0:?}")]
pub struct HalBusError(pub ErrorKind);

/// [`RegisterBus`] over any blocking `embedded-hal` 1.0 I2C implementation.
#[derive(Debug)]
pub struct HalI2c<I> {
    i2c: I,
}

impl<I: i2c::I2c> HalI2c<I> {
    pub fn new(i2c: I) -> Self {
        Self { i2c }
    }

    /// Releases the wrapped bus.
    pub fn release(self) -> I {
        self.i2c
    }
}

impl<I: i2c::I2c> RegisterBus for HalI2c<I> {
    type Error = HalBusError;

    fn write_register_block(
        &mut self,
        address: u8,
        register: u8,
        data: &[u8],
    ) -> Result<(), Self::Error> {
        let mut frame = Vec::with_capacity(data.len() + 1);
        frame.push(register);
        frame.extend_from_slice(data);
        trace!("I2C write 0x{:02X}: {:02X?}", address, &frame);
        self.i2c
            .write(address, &frame)
            .map_err(|e| HalBusError(i2c::Error::kind(&e)))
    }

    fn read_register_block(
        &mut self,
        address: u8,
        register: u8,
        buffer: &mut [u8],
    ) -> Result<(), Self::Error> {
        self.i2c
            .write_read(address, &[register], buffer)
            .map_err(|e| HalBusError(i2c::Error::kind(&e)))?;
        trace!(
            "I2C read 0x{:02X} reg 0x{:02X}: {:02X?}",
            address,
            register,
            buffer
        );
        Ok(())
    }
}
