//! End-to-end scenarios: host requests and physical input against one keypad.

use core::future::Future;
use core::pin::Pin;
use core::task::{Context, Poll, RawWaker, RawWakerVTable, Waker};
use std::sync::{Arc, Mutex};

use embedded_hal_async::delay::DelayNs;
use embedded_storage::{ReadStorage, Storage};
use keypad_core::{
    ConfigStore, ConsumerReport, HidReport, HidSink, InputSnapshot, Keypad, LedFrame, LedOutput,
    OutputError,
};
use keypad_proto::config::ACTION_BLOCK_SIZE;
use keypad_proto::report::{FACTORY_RESET_MAGIC, TRANSFER_CHUNK};
use keypad_proto::{
    Action, Color, ConfigError, Configuration, Input, Request, Response, Status, CONFIG_SIZE,
};

fn block_on<F: Future>(mut f: F) -> F::Output {
    fn noop_raw_waker() -> RawWaker {
        fn noop(_: *const ()) {}
        fn clone(_: *const ()) -> RawWaker {
            noop_raw_waker()
        }
        static VTABLE: RawWakerVTable = RawWakerVTable::new(clone, noop, noop, noop);
        RawWaker::new(core::ptr::null(), &VTABLE)
    }

    let waker = unsafe { Waker::from_raw(noop_raw_waker()) };
    let mut cx = Context::from_waker(&waker);
    let mut f = unsafe { Pin::new_unchecked(&mut f) };
    match f.as_mut().poll(&mut cx) {
        Poll::Ready(result) => result,
        Poll::Pending => panic!("Mock future returned Pending unexpectedly"),
    }
}

#[derive(Clone, Default)]
struct Sink(Arc<Mutex<Vec<HidReport>>>);

impl Sink {
    fn take(&self) -> Vec<HidReport> {
        std::mem::take(&mut *self.0.lock().unwrap())
    }
}

impl HidSink for Sink {
    fn send(&mut self, report: &HidReport) -> impl Future<Output = Result<(), OutputError>> {
        self.0.lock().unwrap().push(*report);
        core::future::ready(Ok(()))
    }

    fn is_ready(&self) -> bool {
        true
    }
}

struct NoDelay;

impl DelayNs for NoDelay {
    async fn delay_ns(&mut self, _ns: u32) {}
}

struct NoLeds;

impl LedOutput for NoLeds {
    fn write(&mut self, _frame: &LedFrame) -> impl Future<Output = Result<(), OutputError>> {
        core::future::ready(Ok(()))
    }
}

/// Storage whose bytes outlive the keypad, so a test can "reboot".
#[derive(Clone)]
struct SharedStorage {
    bytes: Arc<Mutex<[u8; CONFIG_SIZE]>>,
    writes_left: Arc<Mutex<Option<usize>>>,
}

#[derive(Debug)]
struct PowerLost;

impl SharedStorage {
    fn erased() -> Self {
        Self {
            bytes: Arc::new(Mutex::new([0xFF; CONFIG_SIZE])),
            writes_left: Arc::new(Mutex::new(None)),
        }
    }

    fn image(&self) -> [u8; CONFIG_SIZE] {
        *self.bytes.lock().unwrap()
    }

    fn lose_power_after(&self, writes: usize) {
        *self.writes_left.lock().unwrap() = Some(writes);
    }

    fn restore_power(&self) {
        *self.writes_left.lock().unwrap() = None;
    }
}

impl ReadStorage for SharedStorage {
    type Error = PowerLost;

    fn read(&mut self, offset: u32, bytes: &mut [u8]) -> Result<(), Self::Error> {
        let start = offset as usize;
        bytes.copy_from_slice(&self.bytes.lock().unwrap()[start..start + bytes.len()]);
        Ok(())
    }

    fn capacity(&self) -> usize {
        CONFIG_SIZE
    }
}

impl Storage for SharedStorage {
    fn write(&mut self, offset: u32, bytes: &[u8]) -> Result<(), Self::Error> {
        if let Some(left) = self.writes_left.lock().unwrap().as_mut() {
            if *left == 0 {
                return Err(PowerLost);
            }
            *left -= 1;
        }
        let start = offset as usize;
        self.bytes.lock().unwrap()[start..start + bytes.len()].copy_from_slice(bytes);
        Ok(())
    }
}

type TestKeypad = Keypad<SharedStorage, Sink, NoDelay, NoLeds>;

fn boot(storage: &SharedStorage) -> (TestKeypad, Sink) {
    let sink = Sink::default();
    let keypad = Keypad::new(
        ConfigStore::open(storage.clone()),
        sink.clone(),
        NoDelay,
        NoLeds,
        &InputSnapshot::default(),
    );
    (keypad, sink)
}

fn request(keypad: &mut TestKeypad, command: u8, payload: &[u8]) -> Response {
    let frame = Request::new(command, payload);
    keypad
        .handle_report(frame.as_bytes())
        .expect("config requests are always answered")
}

fn read_image(keypad: &mut TestKeypad) -> [u8; CONFIG_SIZE] {
    let mut image = [0u8; CONFIG_SIZE];
    for seq in 0..3u8 {
        let response = request(keypad, 0x01, &[]);
        assert_eq!(response.status(), Some(Status::Success));
        assert_eq!(response.bytes(3, 2), &[seq, 3]);
        let start = usize::from(seq) * TRANSFER_CHUNK;
        let len = TRANSFER_CHUNK.min(CONFIG_SIZE - start);
        image[start..start + len].copy_from_slice(response.bytes(5, len));
    }
    image
}

fn write_all_packet(seq: u8, block: &[u8; ACTION_BLOCK_SIZE], slot: u8) -> Vec<u8> {
    let start = usize::from(seq) * TRANSFER_CHUNK;
    let end = (start + TRANSFER_CHUNK).min(ACTION_BLOCK_SIZE);
    let mut payload = vec![seq, 3];
    payload.extend_from_slice(&block[start..end]);
    if seq == 2 {
        payload.extend_from_slice(&[slot, 1]);
    }
    payload
}

#[test]
fn write_action_then_read_config() {
    let storage = SharedStorage::erased();
    let (mut keypad, _) = boot(&storage);

    let action = Action::media(0x00CD).with_colors(Color::Red, Color::Red);
    let mut payload = vec![1, Input::Button3 as u8];
    payload.extend_from_slice(&action.to_bytes());
    let response = request(&mut keypad, 0x02, &payload);
    assert_eq!(response.status(), Some(Status::Success));

    let image = read_image(&mut keypad);
    let config = Configuration::from_image(&image).unwrap();
    let stored = config.slots[1].action(Input::Button3);
    assert_eq!(stored.to_string(), "Play/Pause");
    assert_eq!(Color::from_index(stored.color_idle), Color::Red);
    assert_eq!(image, storage.image());
}

#[test]
fn write_all_replaces_every_slot() {
    let storage = SharedStorage::erased();
    let (mut keypad, _) = boot(&storage);

    let mut source = Configuration::defaults();
    source.slots.reverse();
    let block = source.action_block();

    for seq in 0..3u8 {
        let response = request(&mut keypad, 0x03, &write_all_packet(seq, &block, 2));
        assert_eq!(response.status(), Some(Status::Success));
        assert_eq!(response.bytes(3, 2), &[seq, 3]);
    }

    let config = keypad.store().config();
    assert_eq!(config.slots, source.slots);
    assert_eq!(config.active_slot, 2);
    assert_eq!(Configuration::from_image(&storage.image()).unwrap(), *config);
}

#[test]
fn write_all_with_missing_packet_changes_nothing() {
    let storage = SharedStorage::erased();
    let (mut keypad, _) = boot(&storage);
    let before = storage.image();

    let mut source = Configuration::defaults();
    source.slots.reverse();
    let block = source.action_block();

    let first = request(&mut keypad, 0x03, &write_all_packet(0, &block, 1));
    assert_eq!(first.status(), Some(Status::Success));
    let last = request(&mut keypad, 0x03, &write_all_packet(2, &block, 1));
    assert_eq!(last.status(), Some(Status::InvalidCommand));

    assert_eq!(*keypad.store().config(), Configuration::defaults());
    assert_eq!(storage.image(), before);
}

#[test]
fn corrupted_frame_gets_checksum_error() {
    let storage = SharedStorage::erased();
    let (mut keypad, _) = boot(&storage);

    let mut frame = *Request::new(0x05, &[1, 1]).as_bytes();
    frame[2] ^= 0x02;
    let response = keypad.handle_report(&frame).unwrap();
    assert_eq!(response.command_byte(), 0xFF);
    assert_eq!(response.status(), Some(Status::ChecksumError));
    assert_eq!(keypad.store().config().active_slot, 0);
}

#[test]
fn corrupted_write_action_leaves_flash_alone() {
    let storage = SharedStorage::erased();
    let (mut keypad, _) = boot(&storage);
    let before = *keypad.store().config();
    let image = storage.image();

    let mut payload = [0u8; 10];
    payload[0] = 1;
    payload[1] = 2;
    payload[2..].copy_from_slice(&Action::media(0x00E2).to_bytes());
    let mut frame = *Request::new(0x02, &payload).as_bytes();
    frame[5] ^= 0x01;

    let response = keypad.handle_report(&frame).unwrap();
    assert_eq!(response.command_byte(), 0xFF);
    assert_eq!(response.status(), Some(Status::ChecksumError));
    assert_eq!(*keypad.store().config(), before);
    assert_eq!(storage.image(), image);
}

#[test]
fn factory_reset_needs_magic() {
    let storage = SharedStorage::erased();
    let (mut keypad, _) = boot(&storage);
    request(&mut keypad, 0x07, &[200, 1]);
    assert_eq!(keypad.store().config().brightness, 200);

    let wrong = request(&mut keypad, 0x06, &[0xEF, 0xBE, 0xAD, 0x00]);
    assert_eq!(wrong.status(), Some(Status::InvalidCommand));
    assert_eq!(keypad.store().config().brightness, 200);

    let right = request(&mut keypad, 0x06, &FACTORY_RESET_MAGIC);
    assert_eq!(right.status(), Some(Status::Success));
    assert_eq!(*keypad.store().config(), Configuration::defaults());
    assert_eq!(storage.image(), Configuration::defaults().to_image());
}

#[test]
fn interrupted_save_is_rejected_after_reboot() {
    let storage = SharedStorage::erased();
    let (mut keypad, _) = boot(&storage);
    request(&mut keypad, 0x05, &[2, 1]);

    // Power drops right after the pending marker is written.
    storage.lose_power_after(1);
    let mut payload = vec![0, 0];
    payload.extend_from_slice(&Action::NONE.to_bytes());
    let response = request(&mut keypad, 0x02, &payload);
    assert_eq!(response.status(), Some(Status::StorageFailure));
    assert_eq!(keypad.store().config().active_slot, 2);
    assert_ne!(*keypad.store().config().slots[0].action(Input::Button1), Action::NONE);

    assert_eq!(
        Configuration::from_image(&storage.image()),
        Err(ConfigError::Interrupted)
    );

    storage.restore_power();
    let (rebooted, _) = boot(&storage);
    assert_eq!(*rebooted.store().config(), Configuration::defaults());
    assert!(Configuration::from_image(&storage.image()).is_ok());
}

#[test]
fn settings_survive_reboot() {
    let storage = SharedStorage::erased();
    let (mut keypad, _) = boot(&storage);
    request(&mut keypad, 0x05, &[1, 1]);
    request(&mut keypad, 0x07, &[42, 1]);
    let expected = *keypad.store().config();
    drop(keypad);

    let (rebooted, _) = boot(&storage);
    assert_eq!(*rebooted.store().config(), expected);
    assert_eq!(rebooted.store().config().active_slot, 1);
}

#[test]
fn encoder_detent_runs_encoder_action() {
    let storage = SharedStorage::erased();
    let (mut keypad, sink) = boot(&storage);

    // Clockwise: 00 -> 10 -> 11 -> 01 -> 00.
    let steps = [(true, false), (true, true), (false, true), (false, false)];
    for (i, (a, b)) in steps.into_iter().enumerate() {
        let snapshot = InputSnapshot {
            encoder_a: a,
            encoder_b: b,
            ..InputSnapshot::default()
        };
        block_on(keypad.poll(&snapshot, i as u64 * 5));
        if i < 3 {
            assert!(sink.take().is_empty());
        }
    }
    assert_eq!(
        sink.take(),
        vec![
            HidReport::Consumer(ConsumerReport { usage: 0x00E9 }),
            HidReport::Consumer(ConsumerReport { usage: 0 }),
        ]
    );
}
