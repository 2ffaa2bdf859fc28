use crate::consts;

/// Driver configuration, applied by [`crate::Mpr121::setup`].
///
/// Values are not range checked. Each one is written into a fixed-width
/// register field and anything wider is truncated by the chip layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// 7-bit I2C address.
    pub address: u8,
    /// Touch threshold for channels without an override.
    pub touch_threshold: u8,
    /// Release threshold for channels without an override.
    pub release_threshold: u8,
    /// Consecutive samples before a touch registers (0-7).
    pub touch_debounce: u8,
    /// Consecutive samples before a release registers (0-7).
    pub release_debounce: u8,
    /// Number of electrodes enabled for touch sensing, counted from ELE0.
    pub max_touch_channel: u8,
    /// Supply voltage in millivolts, used for the auto-configuration limits.
    pub supply_voltage_mv: u16,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            address: consts::DEFAULT_ADDRESS,
            touch_threshold: 0x0C,
            release_threshold: 0x06,
            touch_debounce: 0,
            release_debounce: 0,
            max_touch_channel: 3,
            supply_voltage_mv: 3300,
        }
    }
}

impl Config {
    pub fn with_address(mut self, address: u8) -> Self {
        self.address = address;
        self
    }

    pub fn with_thresholds(mut self, touch: u8, release: u8) -> Self {
        self.touch_threshold = touch;
        self.release_threshold = release;
        self
    }

    pub fn with_debounce(mut self, touch: u8, release: u8) -> Self {
        self.touch_debounce = touch;
        self.release_debounce = release;
        self
    }

    pub fn with_max_touch_channel(mut self, max_touch_channel: u8) -> Self {
        self.max_touch_channel = max_touch_channel;
        self
    }

    pub fn with_supply_voltage_mv(mut self, millivolts: u16) -> Self {
        self.supply_voltage_mv = millivolts;
        self
    }

    /// DEBOUNCE register value: touch count in the high nibble, release in the low.
    pub fn debounce_register(&self) -> u8 {
        (self.touch_debounce << 4) | self.release_debounce
    }

    /// Electrode configuration value that leaves stop mode with the touch channels enabled.
    pub fn ecr_register(&self) -> u8 {
        consts::ecr::CL_TRACKING_5BIT | self.max_touch_channel
    }

    /// Auto-configuration `(up, target, low)` limits for the configured supply.
    pub fn autoconfig_limits(&self) -> (u8, u8, u8) {
        let vdd = u32::from(self.supply_voltage_mv).max(consts::ELECTRODE_DROP_MV + 1);
        let up = ((vdd - consts::ELECTRODE_DROP_MV) * 256 / vdd).min(255);
        let target = up * 9 / 10;
        let low = up * 65 / 100;
        (up as u8, target as u8, low as u8)
    }
}
