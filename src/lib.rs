//! # mpr121-touch
//!
//! A Rust driver for the NXP/Freescale MPR121 12-electrode capacitive touch
//! sensor, with GPIO on the electrodes not used for touch sensing.
//!
//! ## Features
//!
//! *   Chip setup (`Mpr121::setup`): soft reset, baseline filter, per-electrode
//!     touch/release thresholds, debounce, charge current/time, auto-configuration
//!     limits derived from the supply voltage, electrode enable.
//! *   Touch polling (`Mpr121::poll`): reads the touch status and hands each
//!     registered [`Channel`] its bit, in registration order.
//! *   Ready-made [`TouchChannel`] reporting `Touched`/`Released` transitions.
//! *   GPIO on electrodes ELE4-ELE11:
//!     *   Driver helpers `pin_mode`, `digital_write`, `digital_read`, `flush_gpio`
//!         backed by enable/direction/output/input shadow masks.
//!     *   [`Mpr121Pin`] implementing the crate's [`Pin`] trait and the
//!         `embedded-hal` digital traits, with optional inversion.
//! *   Diagnostics: filtered electrode data, baselines, `dump_config`.
//! *   Transports: any `embedded-hal` 1.0 I2C bus via [`HalI2c`]; with the `hid`
//!     feature, an XR2280x USB-to-I2C bridge via `hid::Xr2280xBus`.
//!
//! ## Failure model
//!
//! A bus error during `setup` is final: the driver enters
//! [`DriverState::Failed`], `poll` turns into a no-op and GPIO calls return
//! [`Error::ComponentFailed`]. Errors after a successful setup are reported and
//! recorded in [`Mpr121::error_code`] without failing the driver.
//!
//! Configuration values are not range checked. They are written into
//! fixed-width register fields as-is.
//!
//! ## Basic Usage
//!
//! ```no_run
//! use mpr121_touch::{Config, HalI2c, Mpr121, Mpr121Pin, Pin, PinFlags, TouchChannel, TouchEvent};
//! # fn run<I: embedded_hal::i2c::I2c>(i2c: I) -> mpr121_touch::Result<()> {
//! let config = Config::default().with_thresholds(40, 20).with_max_touch_channel(2);
//! let mut mpr121 = Mpr121::new(HalI2c::new(i2c), config);
//!
//! mpr121.register_channel(
//!     0,
//!     TouchChannel::new("left").on_event(|e| println!("left: {:?}", e)),
//! )?;
//! mpr121.register_channel(
//!     1,
//!     TouchChannel::new("right").on_event(|e| if e == TouchEvent::Touched { println!("right") }),
//! )?;
//!
//! mpr121.setup()?;
//!
//! // Pin 0 is electrode ELE4.
//! let mut led = Mpr121Pin::new(&mpr121, 0, PinFlags::OUTPUT)?;
//! led.setup()?;
//! led.digital_write(true)?;
//!
//! loop {
//!     mpr121.poll()?;
//! #   break;
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Pin Mapping
//!
//! *   Electrodes ELE0-ELE3 are kept for touch sensing.
//! *   GPIO pins 0-7 map to electrodes ELE4-ELE11 and to bits 0-7 of the
//!     chip's GPIO registers.
//! *   Electrodes below `max_touch_channel` are enabled for touch sensing; the
//!     chip only offers GPIO on electrodes that are not.
//!
//! ## License
//!
//! This project is licensed under the WTFPL.

pub mod channel;
mod config;
pub mod consts;
mod device;
mod error;
pub mod gpio;
#[cfg(feature = "hid")]
pub mod hid;
pub mod i2c;

pub use channel::{Channel, Thresholds, TouchChannel, TouchEvent};
pub use config::Config;
pub use device::{DriverState, GpioMasks, Mpr121};
pub use error::{BusError, Error, ErrorCode, Result};
pub use gpio::{Mpr121Pin, Pin, PinFlags};
pub use i2c::{HalBusError, HalI2c, RegisterBus};
