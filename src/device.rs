//! The MPR121 driver: setup sequence, touch polling and GPIO shadow registers.

use crate::channel::{Channel, ChannelKind, Registration, Thresholds};
use crate::config::Config;
use crate::consts::{self, reg};
use crate::error::{Error, ErrorCode, Result};
use crate::gpio::PinFlags;
use crate::i2c::RegisterBus;
use log::{debug, error, info, trace, warn};
use std::cell::{Cell, RefCell};

/// Lifecycle of a driver instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    Uninitialized,
    Configuring,
    Ready,
    /// Setup hit a bus error. Absorbing: polling stops and GPIO calls fail.
    Failed,
}

/// In-memory copy of the GPIO registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GpioMasks {
    /// 1 = electrode used as GPIO.
    pub enable: u8,
    /// 1 = output.
    pub direction: u8,
    /// Requested output levels.
    pub output: u8,
    /// Levels seen by the last GPIODATA read or poll.
    pub input: u8,
}

#[derive(Debug, Clone, Copy, Default)]
struct GpioShadow {
    masks: GpioMasks,
    // Values the chip holds; `None` after reset or before the first flush.
    flushed_enable: Option<u8>,
    flushed_direction: Option<u8>,
}

/// Driver for one MPR121 chip.
///
/// All bus-facing methods take `&self` so that [`crate::Mpr121Pin`]s can
/// share the driver by reference. The type is not `Sync`; calls must come
/// from a single thread and must not overlap.
pub struct Mpr121<B: RegisterBus> {
    bus: RefCell<B>,
    config: Config,
    channels: RefCell<Vec<Registration>>,
    state: Cell<DriverState>,
    error_code: Cell<ErrorCode>,
    gpio: Cell<GpioShadow>,
}

impl<B: RegisterBus> Mpr121<B> {
    /// Creates an unconfigured driver. Nothing touches the bus until [`Mpr121::setup`].
    pub fn new(bus: B, config: Config) -> Self {
        Self {
            bus: RefCell::new(bus),
            config,
            channels: RefCell::new(Vec::new()),
            state: Cell::new(DriverState::Uninitialized),
            error_code: Cell::new(ErrorCode::None),
            gpio: Cell::new(GpioShadow::default()),
        }
    }

    /// Gives the bus back.
    pub fn release(self) -> B {
        self.bus.into_inner()
    }

    // --- Configuration ---

    /// The configuration setup will write (or wrote).
    pub fn config(&self) -> &Config {
        &self.config
    }

    fn configurable(&self, what: &str) -> bool {
        if self.state.get() == DriverState::Uninitialized {
            true
        } else {
            warn!("Ignoring {} change after setup", what);
            false
        }
    }

    /// Sets the default touch threshold. Ignored after setup.
    pub fn set_touch_threshold(&mut self, threshold: u8) {
        if self.configurable("touch threshold") {
            self.config.touch_threshold = threshold;
        }
    }

    /// Sets the default release threshold. Ignored after setup.
    pub fn set_release_threshold(&mut self, threshold: u8) {
        if self.configurable("release threshold") {
            self.config.release_threshold = threshold;
        }
    }

    /// Sets the touch debounce count (0-7). Ignored after setup.
    pub fn set_touch_debounce(&mut self, debounce: u8) {
        if self.configurable("touch debounce") {
            self.config.touch_debounce = debounce;
        }
    }

    /// Sets the release debounce count (0-7). Ignored after setup.
    pub fn set_release_debounce(&mut self, debounce: u8) {
        if self.configurable("release debounce") {
            self.config.release_debounce = debounce;
        }
    }

    /// Sets how many electrodes, from ELE0 up, are enabled and polled. Ignored after setup.
    pub fn set_max_touch_channel(&mut self, max_touch_channel: u8) {
        if self.configurable("max touch channel") {
            self.config.max_touch_channel = max_touch_channel;
        }
    }

    /// Registers a touch channel on electrode `index`.
    ///
    /// Channels are dispatched in registration order. Several channels may
    /// share an index, and an index may also be used as GPIO; keeping them
    /// apart is up to the caller.
    pub fn register_channel<C>(&mut self, index: u8, channel: C) -> Result<()>
    where
        C: Channel + 'static,
    {
        check_channel(index)?;
        self.channels.get_mut().push(Registration {
            index,
            kind: ChannelKind::Touch(Box::new(channel)),
        });
        Ok(())
    }

    /// Registers electrode `index` (4-11) as a GPIO input fed by the poll.
    pub fn register_gpio_channel(&mut self, index: u8) -> Result<()> {
        gpio_bit(index)?;
        self.channels.get_mut().push(Registration {
            index,
            kind: ChannelKind::Gpio,
        });
        Ok(())
    }

    // --- State ---

    /// Current lifecycle state.
    pub fn state(&self) -> DriverState {
        self.state.get()
    }

    /// True once setup has failed. Never cleared.
    pub fn is_failed(&self) -> bool {
        self.state.get() == DriverState::Failed
    }

    /// Last recorded failure, [`ErrorCode::None`] if there was none.
    pub fn error_code(&self) -> ErrorCode {
        self.error_code.get()
    }

    /// Snapshot of the GPIO shadow masks.
    pub fn gpio_masks(&self) -> GpioMasks {
        self.gpio.get().masks
    }

    // --- Register access ---

    fn write_register(&self, register: u8, value: u8) -> Result<()> {
        trace!("Write reg 0x{:02X} = 0x{:02X}", register, value);
        self.bus
            .borrow_mut()
            .write_register(self.config.address, register, value)
            .map_err(|e| Error::communication(register, e))
    }

    fn write_register_block(&self, register: u8, data: &[u8]) -> Result<()> {
        trace!("Write reg 0x{:02X} = {:02X?}", register, data);
        self.bus
            .borrow_mut()
            .write_register_block(self.config.address, register, data)
            .map_err(|e| Error::communication(register, e))
    }

    fn read_register_block(&self, register: u8, buffer: &mut [u8]) -> Result<()> {
        self.bus
            .borrow_mut()
            .read_register_block(self.config.address, register, buffer)
            .map_err(|e| Error::communication(register, e))?;
        trace!("Read reg 0x{:02X} = {:02X?}", register, buffer);
        Ok(())
    }

    fn communication_failed<T>(&self, err: Error) -> Result<T> {
        warn!("{}", err);
        self.error_code.set(ErrorCode::CommunicationFailed);
        Err(err)
    }

    fn ensure_usable(&self) -> Result<()> {
        if self.is_failed() {
            Err(Error::ComponentFailed)
        } else {
            Ok(())
        }
    }

    // --- Setup & polling ---

    /// Resets and configures the chip, then starts touch sensing.
    ///
    /// The first bus error aborts the sequence and leaves the driver in
    /// [`DriverState::Failed`] for good.
    pub fn setup(&self) -> Result<()> {
        match self.state.get() {
            DriverState::Uninitialized => {}
            DriverState::Failed => return Err(Error::ComponentFailed),
            state => {
                warn!("setup() called again in state {:?}, ignoring", state);
                return Ok(());
            }
        }
        debug!("Setting up MPR121 at 0x{:02X}", self.config.address);
        self.state.set(DriverState::Configuring);

        match self.configure() {
            Ok(()) => {
                self.state.set(DriverState::Ready);
                debug!("MPR121 ready");
                Ok(())
            }
            Err(err) => {
                error!("MPR121 setup failed: {}", err);
                self.error_code.set(ErrorCode::CommunicationFailed);
                self.state.set(DriverState::Failed);
                Err(err)
            }
        }
    }

    fn configure(&self) -> Result<()> {
        let config = self.config;

        self.write_register(reg::SOFTRESET, consts::SOFTRESET_MAGIC)?;
        self.reset_gpio_flush_state();
        // Stop mode, otherwise configuration writes are ignored.
        self.write_register(reg::ECR, consts::ecr::STOP)?;

        for (register, value) in consts::BASELINE_FILTER {
            self.write_register(register, value)?;
        }

        let overrides = self.setup_channels();
        let defaults = Thresholds {
            touch: config.touch_threshold,
            release: config.release_threshold,
        };
        for channel in 0..consts::CHANNEL_COUNT {
            let t = overrides[channel as usize].unwrap_or(defaults);
            self.write_register_block(reg::TOUCHTH_0 + 2 * channel, &[t.touch, t.release])?;
        }

        self.write_register(reg::DEBOUNCE, config.debounce_register())?;
        self.write_register(reg::CONFIG1, consts::CONFIG1_DEFAULT)?;
        self.write_register(reg::CONFIG2, consts::CONFIG2_DEFAULT)?;

        let (up, target, low) = config.autoconfig_limits();
        debug!(
            "Auto-config limits for {} mV: up={} target={} low={}",
            config.supply_voltage_mv, up, target, low
        );
        self.write_register(reg::UPLIMIT, up)?;
        self.write_register(reg::TARGETLIMIT, target)?;
        self.write_register(reg::LOWLIMIT, low)?;
        self.write_register(reg::AUTOCONFIG0, consts::AUTOCONFIG0_DEFAULT)?;
        self.write_register(reg::AUTOCONFIG1, consts::AUTOCONFIG1_DEFAULT)?;

        self.write_register(reg::ECR, config.ecr_register())?;

        // Pins configured before setup were wiped by the reset.
        if self.gpio.get().masks.enable != 0 {
            self.write_gpio_masks()?;
        }
        Ok(())
    }

    /// Runs `setup` on every touch channel and collects threshold overrides.
    fn setup_channels(&self) -> [Option<Thresholds>; consts::CHANNEL_COUNT as usize] {
        let mut overrides = [None; consts::CHANNEL_COUNT as usize];
        for registration in self.channels.borrow_mut().iter_mut() {
            if let ChannelKind::Touch(channel) = &mut registration.kind {
                channel.setup();
                if let Some(t) = channel.thresholds() {
                    overrides[registration.index as usize] = Some(t);
                }
            }
        }
        overrides
    }

    /// Reads the touch status and hands each registered channel its bit.
    ///
    /// Only electrodes below `max_touch_channel` are dispatched. Does nothing
    /// unless setup completed. A read error is recorded and returned but does
    /// not fail the driver.
    pub fn poll(&self) -> Result<()> {
        if self.state.get() != DriverState::Ready {
            return Ok(());
        }
        let status = match self.read_touch_status() {
            Ok(status) => status,
            Err(err) => return self.communication_failed(err),
        };

        let limit = self.config.max_touch_channel.min(consts::CHANNEL_COUNT);
        for registration in self.channels.borrow_mut().iter_mut() {
            if registration.index >= limit {
                continue;
            }
            let touched = status & (1 << registration.index) != 0;
            match &mut registration.kind {
                ChannelKind::Touch(channel) => channel.process(touched),
                ChannelKind::Gpio => {
                    // Fresh copy: listeners may have driven GPIOs during dispatch.
                    let mut shadow = self.gpio.get();
                    let mask = 1 << (registration.index - consts::GPIO_FIRST_CHANNEL);
                    if touched {
                        shadow.masks.input |= mask;
                    } else {
                        shadow.masks.input &= !mask;
                    }
                    self.gpio.set(shadow);
                }
            }
        }
        Ok(())
    }

    /// Current 13-bit touch bitmap, ELE0 in bit 0.
    pub fn read_touch_status(&self) -> Result<u16> {
        let mut buf = [0u8; 2];
        self.read_register_block(reg::TOUCHSTATUS_L, &mut buf)?;
        Ok(u16::from_le_bytes(buf) & 0x1FFF)
    }

    /// Filtered 10-bit electrode data of `channel`.
    pub fn read_filtered_data(&self, channel: u8) -> Result<u16> {
        check_channel(channel)?;
        self.ensure_usable()?;
        let mut buf = [0u8; 2];
        self.read_register_block(reg::FILTDATA_0L + 2 * channel, &mut buf)?;
        Ok(u16::from_le_bytes(buf) & 0x03FF)
    }

    /// Baseline of `channel`, scaled to the 10-bit filtered-data range.
    pub fn read_baseline(&self, channel: u8) -> Result<u16> {
        check_channel(channel)?;
        self.ensure_usable()?;
        let mut buf = [0u8; 1];
        self.read_register_block(reg::BASELINE_0 + channel, &mut buf)?;
        Ok(u16::from(buf[0]) << 2)
    }

    /// Logs the configuration and failure state.
    pub fn dump_config(&self) {
        let config = &self.config;
        info!("MPR121:");
        info!("  Address: 0x{:02X}", config.address);
        info!(
            "  Thresholds: touch={} release={}",
            config.touch_threshold, config.release_threshold
        );
        info!(
            "  Debounce: touch={} release={}",
            config.touch_debounce, config.release_debounce
        );
        info!("  Max touch channel: {}", config.max_touch_channel);
        // Unavailable while a channel callback is running.
        if let Ok(channels) = self.channels.try_borrow() {
            info!("  Registered channels: {}", channels.len());
        }
        match self.error_code.get() {
            ErrorCode::None => {}
            ErrorCode::CommunicationFailed => warn!("  Communication with MPR121 failed!"),
            ErrorCode::WrongChipState => warn!("  MPR121 reported an unexpected chip state!"),
        }
    }

    // --- GPIO helpers ---

    /// Configures electrode `channel` (4-11) as a GPIO.
    pub fn pin_mode(&self, channel: u8, flags: PinFlags) -> Result<()> {
        let mask = gpio_bit(channel)?;
        self.ensure_usable()?;
        if flags.intersects(PinFlags::PULLUP | PinFlags::PULLDOWN) {
            warn!("ELE{}: MPR121 has no internal pull resistors, ignoring", channel);
        }
        let mut shadow = self.gpio.get();
        shadow.masks.enable |= mask;
        if flags.contains(PinFlags::OUTPUT) {
            shadow.masks.direction |= mask;
        } else {
            shadow.masks.direction &= !mask;
        }
        self.gpio.set(shadow);
        debug!("ELE{} mode {:?}", channel, flags);
        self.flush_gpio()
    }

    /// Drives the GPIO on electrode `channel` through GPIOSET/GPIOCLR.
    pub fn digital_write(&self, channel: u8, value: bool) -> Result<()> {
        let mask = gpio_bit(channel)?;
        self.ensure_usable()?;
        let register = if value { reg::GPIOSET } else { reg::GPIOCLR };
        if let Err(err) = self.write_register(register, mask) {
            return self.communication_failed(err);
        }
        let mut shadow = self.gpio.get();
        if value {
            shadow.masks.output |= mask;
        } else {
            shadow.masks.output &= !mask;
        }
        self.gpio.set(shadow);
        Ok(())
    }

    /// Reads GPIODATA and returns the level of electrode `channel`.
    pub fn digital_read(&self, channel: u8) -> Result<bool> {
        let mask = gpio_bit(channel)?;
        self.ensure_usable()?;
        let mut buf = [0u8; 1];
        if let Err(err) = self.read_register_block(reg::GPIODATA, &mut buf) {
            return self.communication_failed(err);
        }
        let mut shadow = self.gpio.get();
        shadow.masks.input = buf[0];
        self.gpio.set(shadow);
        Ok(buf[0] & mask != 0)
    }

    /// Writes the direction and enable masks that changed since the last flush.
    pub fn flush_gpio(&self) -> Result<()> {
        self.ensure_usable()?;
        match self.write_gpio_masks() {
            Ok(()) => Ok(()),
            Err(err) => self.communication_failed(err),
        }
    }

    fn write_gpio_masks(&self) -> Result<()> {
        let mut shadow = self.gpio.get();
        if shadow.flushed_direction != Some(shadow.masks.direction) {
            self.write_register(reg::GPIODIR, shadow.masks.direction)?;
            shadow.flushed_direction = Some(shadow.masks.direction);
            self.gpio.set(shadow);
        }
        if shadow.flushed_enable != Some(shadow.masks.enable) {
            self.write_register(reg::GPIOEN, shadow.masks.enable)?;
            shadow.flushed_enable = Some(shadow.masks.enable);
            self.gpio.set(shadow);
        }
        Ok(())
    }

    fn reset_gpio_flush_state(&self) {
        let mut shadow = self.gpio.get();
        shadow.flushed_direction = None;
        shadow.flushed_enable = None;
        self.gpio.set(shadow);
    }
}

fn check_channel(index: u8) -> Result<()> {
    if index <= consts::MAX_TOUCH_CHANNEL {
        Ok(())
    } else {
        Err(Error::ChannelArgumentOutOfRange(index))
    }
}

/// Shadow-mask bit of a GPIO-capable electrode.
fn gpio_bit(channel: u8) -> Result<u8> {
    if (consts::GPIO_FIRST_CHANNEL..=consts::GPIO_LAST_CHANNEL).contains(&channel) {
        Ok(1 << (channel - consts::GPIO_FIRST_CHANNEL))
    } else {
        Err(Error::PinArgumentOutOfRange {
            pin: channel,
            message: "GPIO is only available on electrodes 4-11".to_string(),
        })
    }
}
