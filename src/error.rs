use std::fmt;
use thiserror::Error;

/// Boxed transport error carried by [`Error::Communication`].
pub type BusError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur when using the MPR121 driver.
///
/// Covers bus communication, argument checks on pins and channels, and
/// (with the `hid` feature) failures of the XR2280x USB-HID transport.
#[derive(Error, Debug)]
pub enum Error {
    /// A register transaction with the chip failed.
    #[error("Communication with MPR121 failed at register 0x{register:02X}: {source}")]
    Communication {
        /// The register being accessed.
        register: u8,
        /// The transport error.
        #[source]
        source: BusError,
    },
    /// The driver failed during setup and refuses further bus access.
    #[error("MPR121 is marked failed; setup did not complete")]
    ComponentFailed,
    /// GPIO pin or channel number is outside the GPIO-capable range.
    #[error("GPIO pin {pin} argument out of range: {message}")]
    PinArgumentOutOfRange {
        /// The invalid pin or channel number.
        pin: u8,
        /// Detailed error message explaining the constraint.
        message: String,
    },
    /// Electrode index is outside 0-12.
    #[error("Channel {0} out of range (0-12)")]
    ChannelArgumentOutOfRange(u8),
    /// Error from the underlying HID API layer.
    #[cfg(feature = "hid")]
    #[error("HID API error: {0}")]
    Hid(#[from] hidapi::HidError),
    /// No XR2280x bridge was found.
    #[cfg(feature = "hid")]
    #[error("Device not found with specified VID/PID")]
    DeviceNotFound,
    /// General I/O error during device communication.
    #[cfg(feature = "hid")]
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Invalid or malformed HID report received from the bridge.
    #[cfg(feature = "hid")]
    #[error("Invalid HID report received or unexpected size ({0} bytes)")]
    InvalidReport(usize),
    /// Function argument is outside the valid range.
    #[cfg(feature = "hid")]
    #[error("Argument out of range: {0}")]
    ArgumentOutOfRange(String),
    /// I2C slave did not acknowledge.
    #[cfg(feature = "hid")]
    #[error("No device found at I2C address 0x{address:02X}: Device did not acknowledge (NACK)")]
    I2cNack {
        /// The 7-bit address that sent the NACK.
        address: u8,
    },
    /// I2C bus arbitration was lost during the transaction.
    #[cfg(feature = "hid")]
    #[error("I2C bus conflict at address 0x{address:02X}: Arbitration lost")]
    I2cArbitrationLost {
        /// The 7-bit address being accessed.
        address: u8,
    },
    /// The bridge reported a bus timeout.
    #[cfg(feature = "hid")]
    #[error("I2C timeout at address 0x{address:02X}: Device did not respond within timeout period")]
    I2cTimeout {
        /// The 7-bit address being accessed.
        address: u8,
    },
    /// The bridge rejected the request parameters.
    #[cfg(feature = "hid")]
    #[error("I2C request error at address 0x{address:02X}: Invalid parameters sent to XR2280x firmware")]
    I2cRequestError {
        /// The 7-bit address being accessed.
        address: u8,
    },
    /// Unknown status bits set in the bridge response.
    #[cfg(feature = "hid")]
    #[error("I2C unknown error at address 0x{address:02X} (Status: 0x{flags:02X})")]
    I2cUnknownError {
        /// The 7-bit address being accessed.
        address: u8,
        /// Raw status flags from the bridge.
        flags: u8,
    },
    /// Requested transfer exceeds the bridge report size.
    #[cfg(feature = "hid")]
    #[error("Requested operation size is too large (max {max}, got {actual})")]
    OperationTooLarge {
        /// Maximum allowed size for this operation.
        max: usize,
        /// Actual size requested.
        actual: usize,
    },
}

/// Result type alias for MPR121 operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn communication<E>(register: u8, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Error::Communication {
            register,
            source: Box::new(source),
        }
    }
}

impl embedded_hal::digital::Error for Error {
    fn kind(&self) -> embedded_hal::digital::ErrorKind {
        embedded_hal::digital::ErrorKind::Other
    }
}

/// Last failure recorded by the driver, reported by `dump_config`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorCode {
    #[default]
    None,
    CommunicationFailed,
    /// Reserved; no chip identity check is performed.
    WrongChipState,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCode::None => write!(f, "none"),
            ErrorCode::CommunicationFailed => write!(f, "communication failed"),
            ErrorCode::WrongChipState => write!(f, "wrong chip state"),
        }
    }
}
