//! Feature Report command handling.
//!
//! One request in, at most one response out. Multi-packet transfers
//! (READ_CONFIG, WRITE_ALL) are tracked by an explicit [`Transfer`] state
//! that any other command resets.

use embedded_storage::Storage;
use keypad_proto::config::ACTION_BLOCK_SIZE;
use keypad_proto::report::{FACTORY_RESET_MAGIC, TRANSFER_CHUNK, TRANSFER_PACKETS};
use keypad_proto::{
    Action, Command, FrameError, Input, Request, Response, Status, ACTION_SIZE, CONFIG_SIZE,
    SLOT_COUNT,
};

use crate::config::DEVICE_INFO;
use crate::store::{ConfigStore, StoreError};

/// Bytes of the action block carried by the last WRITE_ALL packet.
const WRITE_TAIL: usize = ACTION_BLOCK_SIZE - 2 * TRANSFER_CHUNK;

/// Progress of a multi-packet transfer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transfer {
    Idle,
    /// READ_CONFIG: the next packet to send.
    Reading { next: u8 },
    /// WRITE_ALL: the next packet expected and the action block so far.
    Writing {
        expect: u8,
        staged: [u8; ACTION_BLOCK_SIZE],
    },
}

/// Serves configuration requests against a [`ConfigStore`].
pub struct ProtocolHandler {
    transfer: Transfer,
}

impl Default for ProtocolHandler {
    fn default() -> Self {
        Self::new()
    }
}

fn store_status(result: Result<(), StoreError>) -> Status {
    match result {
        Ok(()) => Status::Success,
        Err(e) => {
            warn!("persisting configuration failed: {:?}", e);
            Status::StorageFailure
        }
    }
}

impl ProtocolHandler {
    pub const fn new() -> Self {
        Self {
            transfer: Transfer::Idle,
        }
    }

    #[inline]
    pub fn transfer(&self) -> &Transfer {
        &self.transfer
    }

    /// Handle one raw Feature Report.
    ///
    /// Returns `None` for frames not addressed to this interface. A frame
    /// with a bad checksum is answered without being interpreted.
    pub fn handle<S: Storage>(&mut self, data: &[u8], store: &mut ConfigStore<S>) -> Option<Response> {
        let request = match Request::parse(data) {
            Ok(request) => request,
            Err(FrameError::Ignored) => return None,
            Err(FrameError::Checksum { stored, computed }) => {
                warn!(
                    "request checksum mismatch: stored {} computed {}",
                    stored,
                    computed
                );
                return Some(Response::checksum_error());
            }
        };

        // Every handler decides whether the transfer continues.
        let transfer = core::mem::replace(&mut self.transfer, Transfer::Idle);
        let command = request.command_byte();

        let response = match request.command() {
            Some(Command::ReadConfig) => self.read_config(transfer, store),
            Some(Command::WriteAction) => Self::write_action(&request, store),
            Some(Command::WriteAll) => self.write_all(transfer, &request, store),
            Some(Command::GetInfo) => {
                let mut response = Response::new(command, Status::Success);
                DEVICE_INFO.write_to(&mut response);
                response
            }
            Some(Command::SetSlot) => Self::set_slot(&request, store),
            Some(Command::FactoryReset) => Self::factory_reset(&request, store),
            Some(Command::SetBrightness) => Self::set_brightness(&request, store),
            None => {
                warn!("unknown command {}", command);
                Response::new(command, Status::InvalidCommand)
            }
        };
        Some(response)
    }

    fn read_config<S: Storage>(&mut self, transfer: Transfer, store: &ConfigStore<S>) -> Response {
        let seq = match transfer {
            Transfer::Reading { next } => next,
            _ => 0,
        };
        let image = store.config().to_image();
        let start = usize::from(seq) * TRANSFER_CHUNK;
        let end = (start + TRANSFER_CHUNK).min(CONFIG_SIZE);

        let mut response = Response::new(Command::ReadConfig as u8, Status::Success);
        response
            .put(3, &[seq, TRANSFER_PACKETS])
            .put(5, &image[start..end]);

        let next = seq + 1;
        if next < TRANSFER_PACKETS {
            self.transfer = Transfer::Reading { next };
        }
        response
    }

    fn write_action<S: Storage>(request: &Request, store: &mut ConfigStore<S>) -> Response {
        let command = Command::WriteAction as u8;
        let slot = usize::from(request.byte(2));
        if slot >= SLOT_COUNT {
            warn!("write action: invalid slot {}", slot);
            return Response::new(command, Status::InvalidSlot);
        }
        let Some(input) = Input::from_index(request.byte(3)) else {
            warn!("write action: invalid input {}", request.byte(3));
            return Response::new(command, Status::InvalidInput);
        };
        let action = Action::from_bytes(&request.array::<ACTION_SIZE>(4));
        let status = store_status(store.update(true, |config| {
            *config.slots[slot].action_mut(input) = action;
        }));
        if status == Status::Success {
            info!("slot {} input {:?} updated", slot, input);
        }
        Response::new(command, status)
    }

    fn write_all<S: Storage>(
        &mut self,
        transfer: Transfer,
        request: &Request,
        store: &mut ConfigStore<S>,
    ) -> Response {
        let command = Command::WriteAll as u8;
        let seq = request.byte(2);
        let total = request.byte(3);
        let reject = |status: Status| {
            warn!("write all: packet {} of {} rejected ({:?})", seq, total, status);
            Response::new(command, status)
        };
        if total != TRANSFER_PACKETS || seq >= TRANSFER_PACKETS {
            return reject(Status::InvalidCommand);
        }

        let mut staged = match (seq, transfer) {
            (0, _) => [0u8; ACTION_BLOCK_SIZE],
            (_, Transfer::Writing { expect, staged }) if expect == seq => staged,
            _ => return reject(Status::InvalidCommand),
        };

        let start = usize::from(seq) * TRANSFER_CHUNK;
        if seq < TRANSFER_PACKETS - 1 {
            staged[start..start + TRANSFER_CHUNK]
                .copy_from_slice(&request.array::<TRANSFER_CHUNK>(4));
            self.transfer = Transfer::Writing {
                expect: seq + 1,
                staged,
            };
        } else {
            staged[start..].copy_from_slice(&request.array::<WRITE_TAIL>(4));
            let slot = request.byte(4 + WRITE_TAIL);
            let commit = request.byte(5 + WRITE_TAIL) != 0;
            if usize::from(slot) >= SLOT_COUNT {
                return reject(Status::InvalidSlot);
            }
            let status = store_status(store.update(commit, |config| {
                config.set_action_block(&staged);
                config.active_slot = slot;
            }));
            if status != Status::Success {
                return Response::new(command, status);
            }
            info!("configuration replaced, active slot {} committed {}", slot, commit);
        }

        let mut response = Response::new(command, Status::Success);
        response.put(3, &[seq, total]);
        response
    }

    fn set_slot<S: Storage>(request: &Request, store: &mut ConfigStore<S>) -> Response {
        let command = Command::SetSlot as u8;
        let slot = request.byte(2);
        if usize::from(slot) >= SLOT_COUNT {
            warn!("set slot: invalid slot {}", slot);
            return Response::new(command, Status::InvalidSlot);
        }
        let save = request.byte(3) != 0;
        let status = store_status(store.update(save, |config| config.active_slot = slot));
        if status == Status::Success {
            info!("active slot {} (saved: {})", slot, save);
        }
        Response::new(command, status)
    }

    fn factory_reset<S: Storage>(request: &Request, store: &mut ConfigStore<S>) -> Response {
        let command = Command::FactoryReset as u8;
        if request.array::<4>(2) != FACTORY_RESET_MAGIC {
            warn!("factory reset: bad magic");
            return Response::new(command, Status::InvalidCommand);
        }
        let status = store_status(store.reset_to_defaults());
        if status == Status::Success {
            info!("factory defaults restored");
        }
        Response::new(command, status)
    }

    fn set_brightness<S: Storage>(request: &Request, store: &mut ConfigStore<S>) -> Response {
        let brightness = request.byte(2);
        let save = request.byte(3) != 0;
        let status = store_status(store.update(save, |config| config.brightness = brightness));
        Response::new(Command::SetBrightness as u8, status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::MemStorage;
    use keypad_proto::report::CHECKSUM_ERROR_COMMAND;
    use keypad_proto::{Configuration, DeviceInfo, Modifiers};

    fn setup() -> (ProtocolHandler, ConfigStore<MemStorage>) {
        (ProtocolHandler::new(), ConfigStore::open(MemStorage::erased()))
    }

    fn send(
        handler: &mut ProtocolHandler,
        store: &mut ConfigStore<MemStorage>,
        command: Command,
        payload: &[u8],
    ) -> Response {
        let request = Request::new(command as u8, payload);
        handler.handle(request.as_bytes(), store).unwrap()
    }

    fn write_all_packet(seq: u8, data: &[u8], trailer: &[u8]) -> [u8; 62] {
        let mut payload = [0u8; 62];
        payload[0] = seq;
        payload[1] = 3;
        payload[2..2 + data.len()].copy_from_slice(data);
        payload[2 + data.len()..2 + data.len() + trailer.len()].copy_from_slice(trailer);
        payload
    }

    #[test]
    fn foreign_reports_are_ignored() {
        let (mut handler, mut store) = setup();
        let mut frame = *Request::new(0x01, &[]).as_bytes();
        frame[0] = 0x02;
        assert!(handler.handle(&frame, &mut store).is_none());
        assert!(handler.handle(&frame[..10], &mut store).is_none());
    }

    #[test]
    fn bad_checksum_mutates_nothing() {
        let (mut handler, mut store) = setup();
        let before = *store.config();
        let writes = store.storage().writes.len();

        let mut frame = *Request::new(Command::SetSlot as u8, &[2, 1]).as_bytes();
        frame[63] ^= 0x55;
        let response = handler.handle(&frame, &mut store).unwrap();

        assert_eq!(response.command_byte(), CHECKSUM_ERROR_COMMAND);
        assert_eq!(response.status(), Some(Status::ChecksumError));
        assert_eq!(*store.config(), before);
        assert_eq!(store.storage().writes.len(), writes);
    }

    #[test]
    fn bad_checksum_write_action_is_not_stored() {
        let (mut handler, mut store) = setup();
        let before = *store.config();
        let writes = store.storage().writes.len();

        let mut payload = [0u8; 10];
        payload[0] = 0;
        payload[1] = 1;
        payload[2..].copy_from_slice(&Action::key(Modifiers::GUI, b'l').to_bytes());
        let mut frame = *Request::new(Command::WriteAction as u8, &payload).as_bytes();
        frame[63] = frame[63].wrapping_add(1);
        let response = handler.handle(&frame, &mut store).unwrap();

        assert_eq!(response.command_byte(), CHECKSUM_ERROR_COMMAND);
        assert_eq!(response.status(), Some(Status::ChecksumError));
        assert_eq!(*store.config(), before);
        assert_eq!(store.storage().writes.len(), writes);
        assert_eq!(*handler.transfer(), Transfer::Idle);
    }

    #[test]
    fn unknown_command() {
        let (mut handler, mut store) = setup();
        let response = handler
            .handle(Request::new(0x42, &[]).as_bytes(), &mut store)
            .unwrap();
        assert_eq!(response.command_byte(), 0x42);
        assert_eq!(response.status(), Some(Status::InvalidCommand));
    }

    #[test]
    fn read_config_in_three_packets() {
        let (mut handler, mut store) = setup();
        let image = store.config().to_image();
        let mut reassembled = [0u8; CONFIG_SIZE];
        for seq in 0..3u8 {
            let response = send(&mut handler, &mut store, Command::ReadConfig, &[]);
            assert_eq!(response.status(), Some(Status::Success));
            assert_eq!(response.byte(3), seq);
            assert_eq!(response.byte(4), 3);
            let start = usize::from(seq) * 56;
            let len = (CONFIG_SIZE - start).min(56);
            reassembled[start..start + len].copy_from_slice(response.bytes(5, len));
        }
        assert_eq!(reassembled, image);
        assert_eq!(*handler.transfer(), Transfer::Idle);

        // Counter wraps back to the first packet.
        let response = send(&mut handler, &mut store, Command::ReadConfig, &[]);
        assert_eq!(response.byte(3), 0);
    }

    #[test]
    fn other_command_restarts_read() {
        let (mut handler, mut store) = setup();
        send(&mut handler, &mut store, Command::ReadConfig, &[]);
        send(&mut handler, &mut store, Command::GetInfo, &[]);
        let response = send(&mut handler, &mut store, Command::ReadConfig, &[]);
        assert_eq!(response.byte(3), 0);
    }

    #[test]
    fn write_action_validates_and_persists() {
        let (mut handler, mut store) = setup();
        let action = Action::key(Modifiers::GUI, b'l');

        let mut payload = [0u8; 10];
        payload[0] = 3;
        payload[1] = 0;
        payload[2..].copy_from_slice(&action.to_bytes());
        let response = send(&mut handler, &mut store, Command::WriteAction, &payload);
        assert_eq!(response.status(), Some(Status::InvalidSlot));

        payload[0] = 1;
        payload[1] = 5;
        let response = send(&mut handler, &mut store, Command::WriteAction, &payload);
        assert_eq!(response.status(), Some(Status::InvalidInput));

        payload[1] = 4;
        let response = send(&mut handler, &mut store, Command::WriteAction, &payload);
        assert_eq!(response.status(), Some(Status::Success));
        assert_eq!(*store.config().slots[1].action(Input::EncoderCcw), action);
        assert_eq!(store.storage().bytes, store.config().to_image());
    }

    #[test]
    fn write_action_storage_failure_rolls_back() {
        let (mut handler, mut store) = setup();
        store.storage_mut().fail_after = Some(store.storage().writes.len());
        let mut payload = [0u8; 10];
        payload[2..].copy_from_slice(&Action::media(0x00E2).to_bytes());
        let response = send(&mut handler, &mut store, Command::WriteAction, &payload);
        assert_eq!(response.status(), Some(Status::StorageFailure));
        assert_eq!(*store.config(), Configuration::defaults());
    }

    #[test]
    fn write_all_in_order_with_commit() {
        let (mut handler, mut store) = setup();
        // Reserved bytes of each action stay zero so the block round-trips.
        let block: [u8; ACTION_BLOCK_SIZE] =
            core::array::from_fn(|i| if i % ACTION_SIZE < 5 { (i % 5) as u8 } else { 0 });

        for (seq, data, trailer) in [
            (0u8, &block[0..56], &[][..]),
            (1, &block[56..112], &[][..]),
            (2, &block[112..120], &[2, 1][..]),
        ] {
            let payload = write_all_packet(seq, data, trailer);
            let response = send(&mut handler, &mut store, Command::WriteAll, &payload);
            assert_eq!(response.status(), Some(Status::Success), "packet {seq}");
            assert_eq!(response.bytes(3, 2), &[seq, 3]);
        }

        assert_eq!(store.config().action_block(), block);
        assert_eq!(store.config().active_slot, 2);
        assert_eq!(store.storage().bytes, store.config().to_image());
        assert_eq!(*handler.transfer(), Transfer::Idle);
    }

    #[test]
    fn write_all_without_commit_stays_in_memory() {
        let (mut handler, mut store) = setup();
        let persisted = store.storage().bytes;
        let block = [0u8; ACTION_BLOCK_SIZE];
        for (seq, data, trailer) in [
            (0u8, &block[0..56], &[][..]),
            (1, &block[56..112], &[][..]),
            (2, &block[112..120], &[1, 0][..]),
        ] {
            send(&mut handler, &mut store, Command::WriteAll, &write_all_packet(seq, data, trailer));
        }
        assert_eq!(store.config().active_slot, 1);
        assert_eq!(store.storage().bytes, persisted);
    }

    #[test]
    fn write_all_skipped_packet_is_rejected() {
        let (mut handler, mut store) = setup();
        let before = *store.config();
        let block = [0x11u8; ACTION_BLOCK_SIZE];

        send(&mut handler, &mut store, Command::WriteAll, &write_all_packet(0, &block[..56], &[]));
        let response = send(
            &mut handler,
            &mut store,
            Command::WriteAll,
            &write_all_packet(2, &block[112..], &[1, 1]),
        );
        assert_eq!(response.status(), Some(Status::InvalidCommand));
        assert_eq!(*handler.transfer(), Transfer::Idle);
        assert_eq!(*store.config(), before);

        // Packet 1 is not accepted either once the transfer was reset.
        let response = send(
            &mut handler,
            &mut store,
            Command::WriteAll,
            &write_all_packet(1, &block[56..112], &[]),
        );
        assert_eq!(response.status(), Some(Status::InvalidCommand));
    }

    #[test]
    fn write_all_bad_total_or_slot() {
        let (mut handler, mut store) = setup();
        let mut payload = write_all_packet(0, &[0; 56], &[]);
        payload[1] = 4;
        let response = send(&mut handler, &mut store, Command::WriteAll, &payload);
        assert_eq!(response.status(), Some(Status::InvalidCommand));

        let block = [0u8; ACTION_BLOCK_SIZE];
        send(&mut handler, &mut store, Command::WriteAll, &write_all_packet(0, &block[..56], &[]));
        send(&mut handler, &mut store, Command::WriteAll, &write_all_packet(1, &block[56..112], &[]));
        let response = send(
            &mut handler,
            &mut store,
            Command::WriteAll,
            &write_all_packet(2, &block[112..], &[3, 1]),
        );
        assert_eq!(response.status(), Some(Status::InvalidSlot));
        assert_eq!(*handler.transfer(), Transfer::Idle);
        assert_eq!(*store.config(), Configuration::defaults());
    }

    #[test]
    fn interleaved_command_aborts_write() {
        let (mut handler, mut store) = setup();
        let block = [0u8; ACTION_BLOCK_SIZE];
        send(&mut handler, &mut store, Command::WriteAll, &write_all_packet(0, &block[..56], &[]));
        send(&mut handler, &mut store, Command::GetInfo, &[]);
        let response = send(
            &mut handler,
            &mut store,
            Command::WriteAll,
            &write_all_packet(1, &block[56..112], &[]),
        );
        assert_eq!(response.status(), Some(Status::InvalidCommand));
    }

    #[test]
    fn get_info() {
        let (mut handler, mut store) = setup();
        let response = send(&mut handler, &mut store, Command::GetInfo, &[]);
        assert_eq!(response.status(), Some(Status::Success));
        assert_eq!(DeviceInfo::read_from(&response), DEVICE_INFO);
    }

    #[test]
    fn set_slot_with_and_without_save() {
        let (mut handler, mut store) = setup();
        let response = send(&mut handler, &mut store, Command::SetSlot, &[3, 1]);
        assert_eq!(response.status(), Some(Status::InvalidSlot));

        send(&mut handler, &mut store, Command::SetSlot, &[1, 0]);
        assert_eq!(store.config().active_slot, 1);
        assert_eq!(store.storage().bytes[3], 0);

        send(&mut handler, &mut store, Command::SetSlot, &[2, 1]);
        assert_eq!(store.storage().bytes[3], 2);
    }

    #[test]
    fn factory_reset_requires_magic() {
        let (mut handler, mut store) = setup();
        send(&mut handler, &mut store, Command::SetSlot, &[2, 1]);

        let response = send(&mut handler, &mut store, Command::FactoryReset, &[0xDE, 0xAD, 0xBE, 0xEF]);
        assert_eq!(response.status(), Some(Status::InvalidCommand));
        assert_eq!(store.config().active_slot, 2);

        let response = send(&mut handler, &mut store, Command::FactoryReset, &FACTORY_RESET_MAGIC);
        assert_eq!(response.status(), Some(Status::Success));
        assert_eq!(*store.config(), Configuration::defaults());
        assert_eq!(store.storage().bytes, Configuration::defaults().to_image());
    }

    #[test]
    fn set_brightness() {
        let (mut handler, mut store) = setup();
        send(&mut handler, &mut store, Command::SetBrightness, &[200, 0]);
        assert_eq!(store.config().brightness, 200);
        assert_eq!(store.storage().bytes[6], 10);
        send(&mut handler, &mut store, Command::SetBrightness, &[50, 1]);
        assert_eq!(store.storage().bytes[6], 50);
    }
}
