//! [`RegisterBus`] over USB through an XR2280x USB-HID to I2C bridge.
//!
//! Lets a desktop host talk to an MPR121 breakout wired to the bridge's I2C
//! pins. Only 7-bit addressing and transfers of up to 32 bytes are supported.

use crate::consts::hid as consts;
use crate::error::{Error, Result};
use crate::i2c::RegisterBus;
use hidapi::{HidApi, HidDevice};
use log::{debug, trace, warn};
use std::ffi::CStr;

/// Default I2C timeout in milliseconds.
const DEFAULT_I2C_TIMEOUT_MS: i32 = 500;

/// XR2280x I2C interface acting as the MPR121 bus.
pub struct Xr2280xBus {
    device: HidDevice,
    timeout_ms: i32,
}

impl Xr2280xBus {
    /// Opens the first XR2280x I2C interface. **Warning:** Ambiguous if multiple bridges exist.
    pub fn open_first(hid_api: &HidApi) -> Result<Self> {
        let info = hid_api
            .device_list()
            .find(|info| {
                info.vendor_id() == consts::EXAR_VID
                    && info.product_id() == consts::XR2280X_I2C_PID
            })
            .ok_or(Error::DeviceNotFound)?;
        debug!("Found XR2280x I2C interface at {:?}", info.path());
        let device = hid_api.open_path(info.path())?;
        Ok(Self::from_device(device))
    }

    /// Opens a bridge by its platform-specific path.
    pub fn open_by_path(hid_api: &HidApi, path: &CStr) -> Result<Self> {
        let device = hid_api.open_path(path)?;
        debug!("Opened XR2280x I2C interface at {:?}", path);
        Ok(Self::from_device(device))
    }

    pub fn from_device(device: HidDevice) -> Self {
        Self {
            device,
            timeout_ms: DEFAULT_I2C_TIMEOUT_MS,
        }
    }

    /// Sets how long to wait for the bridge's status report.
    pub fn set_timeout_ms(&mut self, timeout_ms: i32) {
        self.timeout_ms = timeout_ms;
    }

    /// Sets the I2C bus speed (approximated). Max supported is 400 kHz.
    pub fn set_speed_khz(&self, speed_khz: u32) -> Result<()> {
        let (low, high) = scl_cycles(speed_khz)?;
        debug!(
            "Setting I2C speed ~{}kHz: SCL_LOW=0x{:04X}, SCL_HIGH=0x{:04X}",
            speed_khz, low, high
        );
        self.write_hid_register(consts::REG_SCL_LOW, low)?;
        self.write_hid_register(consts::REG_SCL_HIGH, high)
    }

    fn write_hid_register(&self, reg_addr: u16, value: u16) -> Result<()> {
        let [reg_lo, reg_hi] = reg_addr.to_le_bytes();
        let [val_lo, val_hi] = value.to_le_bytes();
        let buf = [
            consts::REPORT_ID_WRITE_HID_REGISTER,
            reg_lo,
            reg_hi,
            val_lo,
            val_hi,
        ];
        trace!("Writing Feature Report: {:02X?}", &buf[..]);
        self.device.send_feature_report(&buf)?;
        Ok(())
    }

    /// One START..STOP transaction: write `write_data`, then read into `read_buffer`.
    fn transfer(&self, address: u8, write_data: &[u8], read_buffer: &mut [u8]) -> Result<()> {
        let out_buf = encode_out_report(address, write_data, read_buffer.len())?;
        trace!("I2C OUT buffer: {:02X?}", &out_buf);

        let written = self.device.write(&out_buf)?;
        if written != out_buf.len() {
            warn!("Partial write: sent {} of {} bytes", written, out_buf.len());
            return Err(Error::Io(std::io::Error::other("Partial HID write")));
        }

        let mut in_buf = [0u8; consts::IN_REPORT_SIZE];
        let received = self.device.read_timeout(&mut in_buf, self.timeout_ms)?;
        trace!("I2C IN buffer: {:02X?}", &in_buf[..received]);
        decode_in_report(address, &in_buf[..received], read_buffer)
    }
}

impl RegisterBus for Xr2280xBus {
    type Error = Error;

    fn write_register_block(&mut self, address: u8, register: u8, data: &[u8]) -> Result<()> {
        let mut frame = Vec::with_capacity(data.len() + 1);
        frame.push(register);
        frame.extend_from_slice(data);
        self.transfer(address, &frame, &mut [])
    }

    fn read_register_block(&mut self, address: u8, register: u8, buffer: &mut [u8]) -> Result<()> {
        self.transfer(address, &[register], buffer)
    }
}

/// SCL low/high cycle counts of the bridge's 60 MHz clock for `speed_khz`.
fn scl_cycles(speed_khz: u32) -> Result<(u16, u16)> {
    if speed_khz == 0 || speed_khz > 400 {
        return Err(Error::ArgumentOutOfRange(format!(
            "I2C speed {} kHz out of range (1-400)",
            speed_khz
        )));
    }
    let total = 60_000 / speed_khz;
    let low = total / 2;
    let high = total - low;
    let (min_low, min_high) = if speed_khz <= 100 { (252, 240) } else { (78, 36) };
    Ok((low.max(min_low) as u16, high.max(min_high) as u16))
}

/// Builds an I2C_SLAVE_OUT report for a 7-bit address.
fn encode_out_report(
    address: u8,
    write_data: &[u8],
    read_len: usize,
) -> Result<[u8; consts::OUT_REPORT_SIZE]> {
    if address > 0x7F {
        return Err(Error::ArgumentOutOfRange(
            "7-bit I2C address must be 0-127".to_string(),
        ));
    }
    for len in [write_data.len(), read_len] {
        if len > consts::REPORT_MAX_DATA_SIZE {
            return Err(Error::OperationTooLarge {
                max: consts::REPORT_MAX_DATA_SIZE,
                actual: len,
            });
        }
    }
    let mut out = [0u8; consts::OUT_REPORT_SIZE];
    out[0] = consts::out_flags::START_BIT | consts::out_flags::STOP_BIT;
    out[1] = write_data.len() as u8;
    out[2] = read_len as u8;
    out[3] = address << 1;
    out[4..4 + write_data.len()].copy_from_slice(write_data);
    Ok(out)
}

/// Checks an I2C_SLAVE_IN report and copies any read data out of it.
fn decode_in_report(address: u8, report: &[u8], read_buffer: &mut [u8]) -> Result<()> {
    if report.len() < consts::IN_REPORT_HEADER {
        return Err(Error::InvalidReport(report.len()));
    }
    let status = report[0];
    if status & consts::in_flags::REQUEST_ERROR != 0 {
        return Err(Error::I2cRequestError { address });
    }
    if status & consts::in_flags::NAK_RECEIVED != 0 {
        return Err(Error::I2cNack { address });
    }
    if status & consts::in_flags::ARBITRATION_LOST != 0 {
        return Err(Error::I2cArbitrationLost { address });
    }
    if status & consts::in_flags::TIMEOUT != 0 {
        return Err(Error::I2cTimeout { address });
    }
    if status & 0x0F != 0 {
        return Err(Error::I2cUnknownError {
            address,
            flags: status,
        });
    }

    if !read_buffer.is_empty() {
        let reported = report[2] as usize;
        if reported != read_buffer.len() {
            warn!(
                "I2C read length mismatch: expected {}, got {}",
                read_buffer.len(),
                reported
            );
        }
        let available = report.len() - consts::IN_REPORT_HEADER;
        let n = reported.min(read_buffer.len()).min(available);
        let data = &report[consts::IN_REPORT_HEADER..consts::IN_REPORT_HEADER + n];
        read_buffer[..n].copy_from_slice(data);
    }
    Ok(())
}
