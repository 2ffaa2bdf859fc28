//! Register addresses, bit definitions and power-on configuration values.

/// Default 7-bit I2C address of the MPR121 (ADDR pin tied to GND).
pub const DEFAULT_ADDRESS: u8 = 0x5A;

/// Number of electrodes on the chip (ELE0-ELE11 plus the proximity channel).
pub const CHANNEL_COUNT: u8 = 13;

/// Highest index accepted for `max_touch_channel`.
pub const MAX_TOUCH_CHANNEL: u8 = 12;

/// First electrode usable as GPIO (ELE4).
pub const GPIO_FIRST_CHANNEL: u8 = 4;
/// Last electrode usable as GPIO (ELE11).
pub const GPIO_LAST_CHANNEL: u8 = 11;
/// Number of GPIO lines backed by the 8-bit shadow masks.
pub const GPIO_PIN_COUNT: u8 = 8;

/// Register map.
pub mod reg {
    // Status and measurement data
    pub const TOUCHSTATUS_L: u8 = 0x00;
    pub const TOUCHSTATUS_H: u8 = 0x01;
    pub const FILTDATA_0L: u8 = 0x04;
    pub const FILTDATA_0H: u8 = 0x05;
    pub const BASELINE_0: u8 = 0x1E;

    // Baseline filter, rising edge
    pub const MHDR: u8 = 0x2B;
    pub const NHDR: u8 = 0x2C;
    pub const NCLR: u8 = 0x2D;
    pub const FDLR: u8 = 0x2E;
    // Baseline filter, falling edge
    pub const MHDF: u8 = 0x2F;
    pub const NHDF: u8 = 0x30;
    pub const NCLF: u8 = 0x31;
    pub const FDLF: u8 = 0x32;
    // Baseline filter, touched
    pub const NHDT: u8 = 0x33;
    pub const NCLT: u8 = 0x34;
    pub const FDLT: u8 = 0x35;

    /// Touch threshold of ELE0; channel `n` lives at `TOUCHTH_0 + 2 * n`.
    pub const TOUCHTH_0: u8 = 0x41;
    /// Release threshold of ELE0; channel `n` lives at `RELEASETH_0 + 2 * n`.
    pub const RELEASETH_0: u8 = 0x42;
    pub const DEBOUNCE: u8 = 0x5B;
    pub const CONFIG1: u8 = 0x5C;
    pub const CONFIG2: u8 = 0x5D;
    pub const ECR: u8 = 0x5E;
    pub const CHARGECURR_0: u8 = 0x5F;
    pub const CHARGETIME_1: u8 = 0x6C;

    // GPIO over ELE4-ELE11
    pub const GPIOCTL0: u8 = 0x73;
    pub const GPIOCTL1: u8 = 0x74;
    pub const GPIODATA: u8 = 0x75;
    pub const GPIODIR: u8 = 0x76;
    pub const GPIOEN: u8 = 0x77;
    pub const GPIOSET: u8 = 0x78;
    pub const GPIOCLR: u8 = 0x79;
    pub const GPIOTOGGLE: u8 = 0x7A;

    // Auto-configuration
    pub const AUTOCONFIG0: u8 = 0x7B;
    pub const AUTOCONFIG1: u8 = 0x7C;
    pub const UPLIMIT: u8 = 0x7D;
    pub const LOWLIMIT: u8 = 0x7E;
    pub const TARGETLIMIT: u8 = 0x7F;

    pub const SOFTRESET: u8 = 0x80;
}

/// Value that triggers a soft reset when written to [`reg::SOFTRESET`].
pub const SOFTRESET_MAGIC: u8 = 0x63;

/// ECR bits.
pub mod ecr {
    /// Stop mode; every configuration register is writable.
    pub const STOP: u8 = 0x00;
    /// Calibration lock "baseline tracking enabled, initial value loaded from 5 high bits".
    pub const CL_TRACKING_5BIT: u8 = 0x80;
}

/// Baseline filter values written during setup, in register order.
pub const BASELINE_FILTER: [(u8, u8); 11] = [
    (reg::MHDR, 0x01),
    (reg::NHDR, 0x01),
    (reg::NCLR, 0x0E),
    (reg::FDLR, 0x00),
    (reg::MHDF, 0x01),
    (reg::NHDF, 0x05),
    (reg::NCLF, 0x01),
    (reg::FDLF, 0x00),
    (reg::NHDT, 0x00),
    (reg::NCLT, 0x00),
    (reg::FDLT, 0x00),
];

/// 16 uA charge current, 6 samples in the first filter.
pub const CONFIG1_DEFAULT: u8 = 0x10;
/// 0.5 us charge time, 4 samples second filter, 1 ms sample period.
pub const CONFIG2_DEFAULT: u8 = 0x20;

/// Auto-config enabled with auto-reconfig, baseline value adjust, retry disabled.
pub const AUTOCONFIG0_DEFAULT: u8 = 0x0B;
/// Auto-config interrupts and skip-charge-time-search disabled.
pub const AUTOCONFIG1_DEFAULT: u8 = 0x00;

/// Electrode discharge drop assumed by the auto-configuration limits.
pub const ELECTRODE_DROP_MV: u32 = 700;

#[cfg(feature = "hid")]
/// Constants of the XR2280x USB-HID I2C bridge used by [`crate::hid`].
pub(crate) mod hid {
    /// Exar Corporation vendor ID.
    pub const EXAR_VID: u16 = 0x04E2;
    /// Product ID of the XR2280x I2C HID interface (common for XR22800/1/2/4).
    pub const XR2280X_I2C_PID: u16 = 0x1100;

    pub const REPORT_ID_WRITE_HID_REGISTER: u8 = 0x3C;

    pub const REG_SCL_LOW: u16 = 0x0341;
    pub const REG_SCL_HIGH: u16 = 0x0342;

    pub const REPORT_MAX_DATA_SIZE: usize = 32;
    // Flags(1) + WrSize(1) + RdSize(1) + SlaveAddr(1) + Data(32)
    pub const OUT_REPORT_SIZE: usize = 36;
    // Flags(1) + WrSize(1) + RdSize(1) + Reserved(1) + Data(32)
    pub const IN_REPORT_SIZE: usize = 36;
    pub const IN_REPORT_HEADER: usize = 4;

    pub mod out_flags {
        pub const START_BIT: u8 = 1 << 0;
        pub const STOP_BIT: u8 = 1 << 1;
    }

    pub mod in_flags {
        pub const REQUEST_ERROR: u8 = 1 << 0;
        pub const NAK_RECEIVED: u8 = 1 << 1;
        pub const ARBITRATION_LOST: u8 = 1 << 2;
        pub const TIMEOUT: u8 = 1 << 3;
    }
}
