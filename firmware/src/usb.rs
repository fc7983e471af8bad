//! USB composite device: keyboard, mouse, consumer control and the
//! configuration interface.
//!
//! The first three interfaces use the `usbd-hid` descriptors and only send
//! input reports. The configuration interface carries a single 64-byte
//! Feature Report (report id 4). SET_REPORT frames are handed to the keypad
//! task through [`REQUESTS`]; the answer is parked in a slot that the next
//! GET_REPORT reads.

use core::cell::Cell;

use defmt::{info, warn};
use embassy_rp::peripherals::USB;
use embassy_rp::usb::Driver;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::signal::Signal;
use embassy_usb::class::hid::{
    Config as HidConfig, HidBootProtocol, HidSubclass, HidWriter, ReportId, RequestHandler, State,
};
use embassy_usb::control::OutResponse;
use embassy_usb::{Builder, Config as UsbConfig, Handler, UsbDevice};
use keypad_core::{HidReport, HidSink, OutputError};
use keypad_proto::report::CONFIG_REPORT_ID;
use keypad_proto::{Frame, REPORT_LEN};
use portable_atomic::{AtomicBool, Ordering};
use static_cell::StaticCell;
use usbd_hid::descriptor::{KeyboardReport, MediaKeyboardReport, MouseReport, SerializedDescriptor};

use crate::board;

pub type UsbDriver = Driver<'static, USB>;

/// Largest input report on any interface.
const MAX_REPORT: usize = 8;

type Writer = HidWriter<'static, UsbDriver, MAX_REPORT>;

/// Configuration interface report descriptor: one vendor Feature Report.
pub const CONFIG_REPORT_DESCRIPTOR: &[u8] = &[
    0x06, 0x00, 0xFF, // Usage Page (Vendor Defined 0xFF00)
    0x09, 0x01, // Usage (0x01)
    0xA1, 0x01, // Collection (Application)
    0x85, CONFIG_REPORT_ID, //   Report ID (4)
    0x09, 0x02, //   Usage (0x02)
    0x15, 0x00, //   Logical Minimum (0)
    0x26, 0xFF, 0x00, //   Logical Maximum (255)
    0x75, 0x08, //   Report Size (8)
    0x95, (REPORT_LEN - 1) as u8, //   Report Count (63)
    0xB1, 0x02, //   Feature (Data, Variable, Absolute)
    0xC0, // End Collection
];

/// Configuration requests from the host, latest wins.
pub static REQUESTS: Signal<CriticalSectionRawMutex, Frame> = Signal::new();

/// Response to the most recent request, if it has been handled.
static RESPONSE: Mutex<CriticalSectionRawMutex, Cell<Option<Frame>>> = Mutex::new(Cell::new(None));

/// Set while the host has the device configured.
static CONFIGURED: AtomicBool = AtomicBool::new(false);

/// Make `frame` the answer to the next GET_REPORT.
pub fn publish_response(frame: Frame) {
    RESPONSE.lock(|slot| slot.set(Some(frame)));
}

/// Rebuild a full frame from SET_REPORT data, with or without the leading id.
fn frame_from(data: &[u8]) -> Frame {
    let mut frame = [0u8; REPORT_LEN];
    let (dst, src) = if data.len() == REPORT_LEN - 1 {
        frame[0] = CONFIG_REPORT_ID;
        (&mut frame[1..], data)
    } else {
        let len = data.len().min(REPORT_LEN);
        (&mut frame[..len], &data[..len])
    };
    dst.copy_from_slice(src);
    frame
}

/// Feature Report handler for the configuration interface.
pub struct ConfigRequestHandler;

impl RequestHandler for ConfigRequestHandler {
    fn get_report(&mut self, id: ReportId, buf: &mut [u8]) -> Option<usize> {
        if !matches!(id, ReportId::Feature(CONFIG_REPORT_ID)) {
            return None;
        }
        let frame = RESPONSE.lock(Cell::get)?;
        let len = buf.len().min(REPORT_LEN);
        buf[..len].copy_from_slice(&frame[..len]);
        Some(len)
    }

    fn set_report(&mut self, id: ReportId, data: &[u8]) -> OutResponse {
        if !matches!(id, ReportId::Feature(CONFIG_REPORT_ID)) {
            warn!("unexpected SET_REPORT {}", data.len());
            return OutResponse::Rejected;
        }
        // A stale answer must never be read back for this request.
        RESPONSE.lock(|slot| slot.set(None));
        REQUESTS.signal(frame_from(data));
        OutResponse::Accepted
    }

    fn set_idle_ms(&mut self, _id: Option<ReportId>, _duration_ms: u32) {}

    fn get_idle_ms(&mut self, _id: Option<ReportId>) -> Option<u32> {
        None
    }
}

struct DeviceStateHandler;

impl Handler for DeviceStateHandler {
    fn configured(&mut self, configured: bool) {
        info!("USB configured: {}", configured);
        CONFIGURED.store(configured, Ordering::Release);
    }
}

/// HID output over the keyboard, mouse and consumer interfaces.
pub struct UsbHidOutput {
    keyboard: Writer,
    mouse: Writer,
    consumer: Writer,
}

impl HidSink for UsbHidOutput {
    async fn send(&mut self, report: &HidReport) -> Result<(), OutputError> {
        if !self.is_ready() {
            return Err(OutputError::NotReady);
        }
        let result = match report {
            HidReport::Keyboard(r) => self.keyboard.write(&r.as_bytes()).await,
            HidReport::Mouse(r) => self.mouse.write(&r.as_bytes()).await,
            HidReport::Consumer(r) => self.consumer.write(&r.as_bytes()).await,
        };
        result.map_err(|_| OutputError::Io)
    }

    fn is_ready(&self) -> bool {
        CONFIGURED.load(Ordering::Acquire)
    }
}

/// Build result: the device runner and the report output.
pub struct UsbHid {
    pub device: UsbDevice<'static, UsbDriver>,
    pub output: UsbHidOutput,
}

static CONFIG_DESCRIPTOR: StaticCell<[u8; 256]> = StaticCell::new();
static BOS_DESCRIPTOR: StaticCell<[u8; 256]> = StaticCell::new();
static MSOS_DESCRIPTOR: StaticCell<[u8; 256]> = StaticCell::new();
static CONTROL_BUF: StaticCell<[u8; 128]> = StaticCell::new();

static KEYBOARD_STATE: StaticCell<State> = StaticCell::new();
static MOUSE_STATE: StaticCell<State> = StaticCell::new();
static CONSUMER_STATE: StaticCell<State> = StaticCell::new();
static CONFIG_STATE: StaticCell<State> = StaticCell::new();
static CONFIG_HANDLER: StaticCell<ConfigRequestHandler> = StaticCell::new();
static DEVICE_HANDLER: StaticCell<DeviceStateHandler> = StaticCell::new();

fn hid_config(
    report_descriptor: &'static [u8],
    request_handler: Option<&'static mut dyn RequestHandler>,
    max_packet_size: u16,
) -> HidConfig<'static> {
    HidConfig {
        report_descriptor,
        request_handler,
        poll_ms: board::USB_HID_POLL_MS,
        max_packet_size,
        hid_subclass: HidSubclass::No,
        hid_boot_protocol: HidBootProtocol::None,
    }
}

/// Create the composite device. Must be called exactly once.
pub fn init(driver: UsbDriver) -> UsbHid {
    let mut usb_config = UsbConfig::new(board::USB_VID, board::USB_PID);
    usb_config.manufacturer = Some(board::USB_MANUFACTURER);
    usb_config.product = Some(board::USB_PRODUCT);
    usb_config.serial_number = Some(board::USB_SERIAL_NUMBER);
    usb_config.max_power = 100;
    usb_config.max_packet_size_0 = 64;

    let mut builder = Builder::new(
        driver,
        usb_config,
        CONFIG_DESCRIPTOR.init([0; 256]),
        BOS_DESCRIPTOR.init([0; 256]),
        MSOS_DESCRIPTOR.init([0; 256]),
        CONTROL_BUF.init([0; 128]),
    );
    builder.handler(DEVICE_HANDLER.init(DeviceStateHandler));

    let keyboard_config = HidConfig {
        hid_subclass: HidSubclass::Boot,
        hid_boot_protocol: HidBootProtocol::Keyboard,
        ..hid_config(KeyboardReport::desc(), None, 8)
    };
    let keyboard = HidWriter::new(&mut builder, KEYBOARD_STATE.init(State::new()), keyboard_config);

    let mouse = HidWriter::new(
        &mut builder,
        MOUSE_STATE.init(State::new()),
        hid_config(MouseReport::desc(), None, 8),
    );

    let consumer = HidWriter::new(
        &mut builder,
        CONSUMER_STATE.init(State::new()),
        hid_config(MediaKeyboardReport::desc(), None, 8),
    );

    // Only control transfers are used; the IN endpoint stays idle.
    let _config: Writer = HidWriter::new(
        &mut builder,
        CONFIG_STATE.init(State::new()),
        hid_config(
            CONFIG_REPORT_DESCRIPTOR,
            Some(CONFIG_HANDLER.init(ConfigRequestHandler)),
            8,
        ),
    );

    let device = builder.build();
    info!("USB composite device initialised");

    UsbHid {
        device,
        output: UsbHidOutput {
            keyboard,
            mouse,
            consumer,
        },
    }
}
