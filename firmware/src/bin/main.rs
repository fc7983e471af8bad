#![no_std]
#![no_main]

use defmt::{info, unwrap};
use defmt_rtt as _;
use embassy_executor::Spawner;
use embassy_futures::select::{select, Either};
use embassy_rp::bind_interrupts;
use embassy_rp::flash::{Blocking, Flash};
use embassy_rp::gpio::{Input, Pull};
use embassy_rp::peripherals::{FLASH, PIO0, USB};
use embassy_rp::pio::Pio;
use embassy_rp::pio_programs::ws2812::{PioWs2812, PioWs2812Program};
use embassy_rp::usb::Driver;
use embassy_time::{Delay, Duration, Instant, Ticker};
use keypad_core::config::POLL_INTERVAL_MS;
use keypad_core::{ConfigStore, FlashEeprom, Keypad, KeypadPins};
use keypad_firmware::board::{CONFIG_FLASH_OFFSET, FLASH_SIZE};
use keypad_firmware::usb::{self, UsbDriver};
use keypad_firmware::{UsbHid, UsbHidOutput, Ws2812Leds};

#[cfg(feature = "dev-panic")]
use panic_probe as _;
#[cfg(feature = "prod-panic")]
use panic_reset as _;

bind_interrupts!(struct Irqs {
    USBCTRL_IRQ => embassy_rp::usb::InterruptHandler<USB>;
    PIO0_IRQ_0 => embassy_rp::pio::InterruptHandler<PIO0>;
});

type ConfigFlash = Flash<'static, FLASH, Blocking, FLASH_SIZE>;
type Board = Keypad<FlashEeprom<ConfigFlash>, UsbHidOutput, Delay, Ws2812Leds<'static, PIO0, 0>>;
type Pins = KeypadPins<Input<'static>>;

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Macro keypad starting...");

    let p = embassy_rp::init(embassy_rp::config::Config::default());

    // --- Configuration storage ---
    let flash = ConfigFlash::new_blocking(p.FLASH);
    let eeprom = unwrap!(FlashEeprom::new(flash, CONFIG_FLASH_OFFSET));
    let store = ConfigStore::open(eeprom);

    // --- Inputs ---
    let mut pins = KeypadPins {
        buttons: [
            Input::new(p.PIN_2, Pull::Up),
            Input::new(p.PIN_3, Pull::Up),
            Input::new(p.PIN_4, Pull::Up),
        ],
        encoder_a: Input::new(p.PIN_6, Pull::Up),
        encoder_b: Input::new(p.PIN_7, Pull::Up),
        encoder_switch: Input::new(p.PIN_8, Pull::Up),
    };
    let initial = pins.sample();

    // --- LEDs ---
    let Pio {
        mut common, sm0, ..
    } = Pio::new(p.PIO0, Irqs);
    let program = PioWs2812Program::new(&mut common);
    let leds = Ws2812Leds::new(PioWs2812::new(
        &mut common,
        sm0,
        p.DMA_CH0,
        p.PIN_16,
        &program,
    ));

    // --- USB ---
    let driver: UsbDriver = Driver::new(p.USB, Irqs);
    let UsbHid { device, output } = usb::init(driver);

    let keypad = Keypad::new(store, output, Delay, leds, &initial);

    // Spawn tasks (unwrap the SpawnToken, then spawn)
    spawner.spawn(usb_task(device).unwrap());
    spawner.spawn(keypad_task(keypad, pins).unwrap());

    info!("Macro keypad initialized");
}

/// USB device task - runs the USB stack.
#[embassy_executor::task]
async fn usb_task(mut device: embassy_usb::UsbDevice<'static, UsbDriver>) {
    device.run().await;
}

/// Keypad task - serves host requests and polls the inputs.
#[embassy_executor::task]
async fn keypad_task(mut keypad: Board, mut pins: Pins) {
    let mut ticker = Ticker::every(Duration::from_millis(POLL_INTERVAL_MS));
    loop {
        match select(usb::REQUESTS.wait(), ticker.next()).await {
            Either::First(frame) => {
                if let Some(response) = keypad.handle_report(&frame) {
                    usb::publish_response(response.to_bytes());
                }
            }
            Either::Second(()) => {
                let snapshot = pins.sample();
                keypad.poll(&snapshot, Instant::now().as_millis()).await;
            }
        }
    }
}
