//! Mocks and a minimal executor shared by the unit tests.

extern crate std;

use core::future::Future;
use core::pin::Pin;
use core::task::{Context, Poll, RawWaker, RawWakerVTable, Waker};
use std::sync::{Arc, Mutex};
use std::vec::Vec;

use embedded_hal_async::delay::DelayNs;
use embedded_storage::{ReadStorage, Storage};
use keypad_proto::CONFIG_SIZE;
use smart_leds::RGB8;

use crate::hid::{HidReport, HidSink, OutputError};
use crate::led::{LedFrame, LedOutput};

// Helper to run a future to completion (simple blocking executor)
pub fn block_on<F: Future>(mut f: F) -> F::Output {
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

    // SAFETY: We don't move f after pinning
    let mut f = unsafe { Pin::new_unchecked(&mut f) };

    loop {
        match f.as_mut().poll(&mut cx) {
            Poll::Ready(result) => return result,
            Poll::Pending => {
                panic!("Mock future returned Pending unexpectedly");
            }
        }
    }
}

/// HID sink that records every report.
#[derive(Clone, Default)]
pub struct RecordingSink {
    pub sent: Arc<Mutex<Vec<HidReport>>>,
    pub fail: bool,
}

impl RecordingSink {
    pub fn take(&self) -> Vec<HidReport> {
        core::mem::take(&mut *self.sent.lock().unwrap())
    }
}

impl HidSink for RecordingSink {
    fn send(&mut self, report: &HidReport) -> impl Future<Output = Result<(), OutputError>> {
        let result = if self.fail {
            Err(OutputError::Io)
        } else {
            self.sent.lock().unwrap().push(*report);
            Ok(())
        };
        core::future::ready(result)
    }

    fn is_ready(&self) -> bool {
        !self.fail
    }
}

/// Delay that returns immediately and records the requested durations.
#[derive(Clone, Default)]
pub struct RecordingDelay {
    pub waits_ns: Arc<Mutex<Vec<u32>>>,
}

impl RecordingDelay {
    pub fn waits_ms(&self) -> Vec<u32> {
        self.waits_ns.lock().unwrap().iter().map(|ns| ns / 1_000_000).collect()
    }
}

impl DelayNs for RecordingDelay {
    async fn delay_ns(&mut self, ns: u32) {
        self.waits_ns.lock().unwrap().push(ns);
    }
}

/// LED output that records every flushed frame.
#[derive(Clone, Default)]
pub struct RecordingLeds {
    pub frames: Arc<Mutex<Vec<LedFrame>>>,
}

impl RecordingLeds {
    pub fn last(&self) -> Option<LedFrame> {
        self.frames.lock().unwrap().last().copied()
    }

    pub fn count(&self) -> usize {
        self.frames.lock().unwrap().len()
    }
}

impl LedOutput for RecordingLeds {
    fn write(&mut self, frame: &[RGB8; 3]) -> impl Future<Output = Result<(), OutputError>> {
        self.frames.lock().unwrap().push(*frame);
        core::future::ready(Ok(()))
    }
}

/// RAM-backed storage that can be told to fail after a number of writes.
pub struct MemStorage {
    pub bytes: [u8; CONFIG_SIZE],
    pub writes: Vec<(u32, usize)>,
    pub fail_after: Option<usize>,
}

impl MemStorage {
    pub fn erased() -> Self {
        Self {
            bytes: [0xFF; CONFIG_SIZE],
            writes: Vec::new(),
            fail_after: None,
        }
    }

    pub fn with_image(image: [u8; CONFIG_SIZE]) -> Self {
        Self {
            bytes: image,
            ..Self::erased()
        }
    }
}

#[derive(Debug)]
pub struct MemError;

impl ReadStorage for MemStorage {
    type Error = MemError;

    fn read(&mut self, offset: u32, bytes: &mut [u8]) -> Result<(), Self::Error> {
        let start = offset as usize;
        let src = self.bytes.get(start..start + bytes.len()).ok_or(MemError)?;
        bytes.copy_from_slice(src);
        Ok(())
    }

    fn capacity(&self) -> usize {
        CONFIG_SIZE
    }
}

impl Storage for MemStorage {
    fn write(&mut self, offset: u32, bytes: &[u8]) -> Result<(), Self::Error> {
        if self.fail_after == Some(self.writes.len()) {
            return Err(MemError);
        }
        let start = offset as usize;
        let dst = self.bytes.get_mut(start..start + bytes.len()).ok_or(MemError)?;
        dst.copy_from_slice(bytes);
        self.writes.push((offset, bytes.len()));
        Ok(())
    }
}
