//! GPIO helpers, shadow masks and the pin adapter.

mod common;

use common::{MockBus, Op};
use embedded_hal::digital::{InputPin, OutputPin, StatefulOutputPin};
use mpr121_touch::consts::reg;
use mpr121_touch::{Config, Error, ErrorCode, GpioMasks, Mpr121, Mpr121Pin, Pin, PinFlags};

fn ready_driver() -> (MockBus, Mpr121<MockBus>) {
    let bus = MockBus::new();
    let driver = Mpr121::new(bus.clone(), Config::default());
    driver.setup().unwrap();
    bus.clear_log();
    (bus, driver)
}

#[test]
fn test_output_round_trip() {
    let (_bus, driver) = ready_driver();
    let mut pin = Mpr121Pin::new(&driver, 2, PinFlags::OUTPUT).unwrap();
    pin.setup().unwrap();

    // The mock echoes GPIOSET/GPIOCLR into GPIODATA like the chip does.
    pin.digital_write(true).unwrap();
    assert!(pin.digital_read().unwrap());
    pin.digital_write(false).unwrap();
    assert!(!pin.digital_read().unwrap());
}

#[test]
fn test_inverted_round_trip() {
    let (bus, driver) = ready_driver();
    let mut pin = Mpr121Pin::new(&driver, 2, PinFlags::OUTPUT)
        .unwrap()
        .inverted(true);
    pin.setup().unwrap();

    pin.digital_write(true).unwrap();
    // Active low: the chip line is driven low.
    assert_eq!(bus.writes_to(reg::GPIOCLR), vec![0b0000_0100]);
    assert!(pin.digital_read().unwrap());

    // Seen from a non-inverted pin on the same line, the level is low.
    let mut raw = Mpr121Pin::new(&driver, 2, PinFlags::INPUT).unwrap();
    assert!(!raw.digital_read().unwrap());
}

#[test]
fn test_digital_write_is_a_single_set_or_clear_write() {
    let (bus, driver) = ready_driver();
    driver.pin_mode(7, PinFlags::OUTPUT).unwrap();
    bus.clear_log();

    driver.digital_write(7, true).unwrap();
    assert_eq!(
        bus.log(),
        vec![Op::Write {
            register: reg::GPIOSET,
            data: vec![0b0000_1000]
        }]
    );

    bus.clear_log();
    driver.digital_write(7, false).unwrap();
    assert_eq!(
        bus.log(),
        vec![Op::Write {
            register: reg::GPIOCLR,
            data: vec![0b0000_1000]
        }]
    );
    assert_eq!(driver.gpio_masks().output, 0);
}

#[test]
fn test_digital_read_refreshes_input_mask() {
    let (bus, driver) = ready_driver();
    bus.set_register(reg::GPIODATA, 0b1010_0000);

    assert!(driver.digital_read(11).unwrap());
    assert!(!driver.digital_read(10).unwrap());
    assert_eq!(driver.gpio_masks().input, 0b1010_0000);
    assert_eq!(
        bus.log(),
        vec![
            Op::Read {
                register: reg::GPIODATA,
                len: 1
            };
            2
        ]
    );
}

#[test]
fn test_pin_mode_updates_shadow_masks() {
    let (bus, driver) = ready_driver();
    driver.pin_mode(4, PinFlags::OUTPUT).unwrap();
    driver.pin_mode(6, PinFlags::INPUT).unwrap();

    assert_eq!(
        driver.gpio_masks(),
        GpioMasks {
            enable: 0b0000_0101,
            direction: 0b0000_0001,
            output: 0,
            input: 0,
        }
    );
    assert_eq!(bus.register(reg::GPIOEN), 0b0000_0101);
    assert_eq!(bus.register(reg::GPIODIR), 0b0000_0001);

    // Switching back to input clears only the direction bit.
    driver.pin_mode(4, PinFlags::INPUT).unwrap();
    assert_eq!(driver.gpio_masks().enable, 0b0000_0101);
    assert_eq!(driver.gpio_masks().direction, 0);
}

#[test]
fn test_flush_writes_only_changed_masks() {
    let (bus, driver) = ready_driver();

    driver.pin_mode(5, PinFlags::OUTPUT).unwrap();
    assert_eq!(bus.written_registers(), vec![reg::GPIODIR, reg::GPIOEN]);

    // Unchanged masks: no traffic.
    bus.clear_log();
    driver.flush_gpio().unwrap();
    driver.flush_gpio().unwrap();
    assert!(bus.log().is_empty());

    // Same mode again changes nothing either.
    driver.pin_mode(5, PinFlags::OUTPUT).unwrap();
    assert!(bus.log().is_empty());

    // Direction flips, enable stays.
    driver.pin_mode(5, PinFlags::INPUT).unwrap();
    assert_eq!(bus.written_registers(), vec![reg::GPIODIR]);

    // New input pin: enable changes, direction stays.
    bus.clear_log();
    driver.pin_mode(9, PinFlags::INPUT).unwrap();
    assert_eq!(bus.written_registers(), vec![reg::GPIOEN]);
}

#[test]
fn test_flush_failure_sets_error_code() {
    let (bus, driver) = ready_driver();
    bus.fail_writes(true);

    let err = driver.pin_mode(4, PinFlags::OUTPUT).unwrap_err();
    assert!(matches!(err, Error::Communication { register, .. } if register == reg::GPIODIR));
    assert_eq!(driver.error_code(), ErrorCode::CommunicationFailed);
    assert!(!driver.is_failed());

    // The failed write is retried on the next flush.
    bus.fail_writes(false);
    bus.clear_log();
    driver.flush_gpio().unwrap();
    assert_eq!(bus.written_registers(), vec![reg::GPIODIR, reg::GPIOEN]);
}

#[test]
fn test_gpio_read_write_failures_set_error_code() {
    let (bus, driver) = ready_driver();
    bus.fail_reads(true);
    assert!(driver.digital_read(4).is_err());
    assert_eq!(driver.error_code(), ErrorCode::CommunicationFailed);

    let (bus, driver) = ready_driver();
    bus.fail_writes(true);
    assert!(driver.digital_write(4, true).is_err());
    assert_eq!(driver.error_code(), ErrorCode::CommunicationFailed);
    // The shadow only follows levels the chip accepted.
    assert_eq!(driver.gpio_masks().output, 0);
    let mut pin = Mpr121Pin::new(&driver, 0, PinFlags::OUTPUT).unwrap();
    assert!(pin.is_set_low().unwrap());
}

#[test]
fn test_failed_driver_rejects_gpio() {
    let bus = MockBus::new();
    let driver = Mpr121::new(bus.clone(), Config::default());
    bus.fail_write_at(0);
    assert!(driver.setup().is_err());
    bus.clear_log();

    assert!(matches!(
        driver.pin_mode(4, PinFlags::OUTPUT),
        Err(Error::ComponentFailed)
    ));
    assert!(matches!(driver.digital_write(4, true), Err(Error::ComponentFailed)));
    assert!(matches!(driver.digital_read(4), Err(Error::ComponentFailed)));
    assert!(matches!(driver.flush_gpio(), Err(Error::ComponentFailed)));
    assert!(bus.log().is_empty());
    assert_eq!(driver.gpio_masks(), GpioMasks::default());
}

#[test]
fn test_pins_configured_before_setup_survive_reset() {
    let bus = MockBus::new();
    let driver = Mpr121::new(bus.clone(), Config::default());
    let mut pin = Mpr121Pin::new(&driver, 1, PinFlags::OUTPUT).unwrap();
    pin.setup().unwrap();
    assert_eq!(bus.register(reg::GPIOEN), 0b0000_0010);

    driver.setup().unwrap();
    let written = bus.written_registers();
    let tail = &written[written.len() - 3..];
    assert_eq!(tail, &[reg::ECR, reg::GPIODIR, reg::GPIOEN]);
    assert_eq!(bus.register(reg::GPIOEN), 0b0000_0010);
    assert_eq!(bus.register(reg::GPIODIR), 0b0000_0010);
}

#[test]
fn test_helper_channel_range() {
    let (bus, driver) = ready_driver();
    for channel in [0, 3, 12, 200] {
        assert!(matches!(
            driver.pin_mode(channel, PinFlags::OUTPUT),
            Err(Error::PinArgumentOutOfRange { pin, .. }) if pin == channel
        ));
        assert!(driver.digital_write(channel, true).is_err());
        assert!(driver.digital_read(channel).is_err());
    }
    assert!(bus.log().is_empty());
}

#[test]
fn test_pin_adapter_maps_to_electrode() {
    let (bus, driver) = ready_driver();
    assert!(Mpr121Pin::new(&driver, 8, PinFlags::INPUT).is_err());

    let mut pin = Mpr121Pin::new(&driver, 7, PinFlags::INPUT).unwrap();
    assert_eq!(pin.channel(), 11);
    assert_eq!(pin.describe(), "ELE11 on MPR121");

    pin.pin_mode(PinFlags::OUTPUT | PinFlags::PULLUP).unwrap();
    assert_eq!(pin.flags(), PinFlags::OUTPUT | PinFlags::PULLUP);
    assert_eq!(bus.register(reg::GPIOEN), 0b1000_0000);
    assert_eq!(bus.register(reg::GPIODIR), 0b1000_0000);
}

#[test]
fn test_embedded_hal_traits() {
    let (bus, driver) = ready_driver();
    let mut pin = Mpr121Pin::new(&driver, 0, PinFlags::OUTPUT).unwrap();
    pin.setup().unwrap();

    pin.set_high().unwrap();
    assert!(pin.is_set_high().unwrap());
    assert!(pin.is_high().unwrap());
    assert_eq!(bus.register(reg::GPIODATA), 0b0000_0001);

    pin.toggle().unwrap();
    assert!(pin.is_set_low().unwrap());
    assert!(pin.is_low().unwrap());

    pin.set_low().unwrap();
    assert_eq!(bus.register(reg::GPIODATA), 0);
}
