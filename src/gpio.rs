//! GPIO pins on electrodes ELE4-ELE11.

use crate::consts;
use crate::device::Mpr121;
use crate::error::{Error, Result};
use crate::i2c::RegisterBus;
use embedded_hal::digital::{ErrorType, InputPin, OutputPin, StatefulOutputPin};
use std::fmt;
use std::ops::BitOr;

/// Pin mode flags.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PinFlags(u8);

impl PinFlags {
    pub const NONE: PinFlags = PinFlags(0);
    pub const INPUT: PinFlags = PinFlags(1 << 0);
    pub const OUTPUT: PinFlags = PinFlags(1 << 1);
    /// Not supported by the MPR121; accepted and ignored.
    pub const PULLUP: PinFlags = PinFlags(1 << 2);
    /// Not supported by the MPR121; accepted and ignored.
    pub const PULLDOWN: PinFlags = PinFlags(1 << 3);

    #[inline]
    pub fn bits(&self) -> u8 {
        self.0
    }

    /// True if every flag in `other` is set.
    #[inline]
    pub fn contains(&self, other: PinFlags) -> bool {
        self.0 & other.0 == other.0
    }

    /// True if any flag in `other` is set.
    #[inline]
    pub fn intersects(&self, other: PinFlags) -> bool {
        self.0 & other.0 != 0
    }
}

impl BitOr for PinFlags {
    type Output = PinFlags;

    fn bitor(self, rhs: PinFlags) -> PinFlags {
        PinFlags(self.0 | rhs.0)
    }
}

impl fmt::Debug for PinFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = [
            (PinFlags::INPUT, "INPUT"),
            (PinFlags::OUTPUT, "OUTPUT"),
            (PinFlags::PULLUP, "PULLUP"),
            (PinFlags::PULLDOWN, "PULLDOWN"),
        ];
        let mut first = true;
        for (flag, name) in names {
            if self.contains(flag) {
                if !first {
                    f.write_str(" | ")?;
                }
                f.write_str(name)?;
                first = false;
            }
        }
        if first {
            f.write_str("NONE")?;
        }
        Ok(())
    }
}

/// Generic single-pin interface.
pub trait Pin {
    /// Applies the pin's configured flags.
    fn setup(&mut self) -> Result<()>;
    fn pin_mode(&mut self, flags: PinFlags) -> Result<()>;
    fn digital_read(&mut self) -> Result<bool>;
    fn digital_write(&mut self, value: bool) -> Result<()>;
    /// Human-readable identity for diagnostics.
    fn describe(&self) -> String;
}

/// One of the eight MPR121 GPIO lines.
///
/// Pin `n` (0-7) is electrode `n + 4`. The pin borrows its driver, so the
/// driver outlives every pin handed out for it.
pub struct Mpr121Pin<'a, B: RegisterBus> {
    parent: &'a Mpr121<B>,
    pin: u8,
    inverted: bool,
    flags: PinFlags,
}

impl<'a, B: RegisterBus> Mpr121Pin<'a, B> {
    /// Creates a pin, returning an error if the number is out of range (0-7).
    pub fn new(parent: &'a Mpr121<B>, pin: u8, flags: PinFlags) -> Result<Self> {
        if pin < consts::GPIO_PIN_COUNT {
            Ok(Self {
                parent,
                pin,
                inverted: false,
                flags,
            })
        } else {
            Err(Error::PinArgumentOutOfRange {
                pin,
                message: "Pin number must be 0-7".to_string(),
            })
        }
    }

    /// Makes reads and writes active-low.
    pub fn inverted(mut self, inverted: bool) -> Self {
        self.inverted = inverted;
        self
    }

    #[inline]
    pub fn number(&self) -> u8 {
        self.pin
    }

    /// The electrode this pin drives.
    #[inline]
    pub fn channel(&self) -> u8 {
        self.pin + consts::GPIO_FIRST_CHANNEL
    }

    pub fn is_inverted(&self) -> bool {
        self.inverted
    }

    pub fn flags(&self) -> PinFlags {
        self.flags
    }
}

impl<B: RegisterBus> Pin for Mpr121Pin<'_, B> {
    fn setup(&mut self) -> Result<()> {
        self.parent.pin_mode(self.channel(), self.flags)
    }

    fn pin_mode(&mut self, flags: PinFlags) -> Result<()> {
        self.flags = flags;
        self.parent.pin_mode(self.channel(), flags)
    }

    fn digital_read(&mut self) -> Result<bool> {
        Ok(self.parent.digital_read(self.channel())? != self.inverted)
    }

    fn digital_write(&mut self, value: bool) -> Result<()> {
        self.parent.digital_write(self.channel(), value != self.inverted)
    }

    fn describe(&self) -> String {
        format!("ELE{} on MPR121", self.channel())
    }
}

impl<B: RegisterBus> fmt::Debug for Mpr121Pin<'_, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mpr121Pin")
            .field("pin", &self.pin)
            .field("inverted", &self.inverted)
            .field("flags", &self.flags)
            .finish()
    }
}

impl<B: RegisterBus> ErrorType for Mpr121Pin<'_, B> {
    type Error = Error;
}

impl<B: RegisterBus> InputPin for Mpr121Pin<'_, B> {
    fn is_high(&mut self) -> Result<bool> {
        self.digital_read()
    }

    fn is_low(&mut self) -> Result<bool> {
        self.digital_read().map(|high| !high)
    }
}

impl<B: RegisterBus> OutputPin for Mpr121Pin<'_, B> {
    fn set_low(&mut self) -> Result<()> {
        self.digital_write(false)
    }

    fn set_high(&mut self) -> Result<()> {
        self.digital_write(true)
    }
}

impl<B: RegisterBus> StatefulOutputPin for Mpr121Pin<'_, B> {
    // Answered from the output shadow mask, no bus traffic.
    fn is_set_high(&mut self) -> Result<bool> {
        let mask = 1 << self.pin;
        Ok((self.parent.gpio_masks().output & mask != 0) != self.inverted)
    }

    fn is_set_low(&mut self) -> Result<bool> {
        self.is_set_high().map(|high| !high)
    }
}
