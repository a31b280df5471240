//! Record dispatch and the ACK/NACK policy.
//!
//! One dispatcher serves every interface. Handlers are plain function
//! pointers looked up by TLV type or by control command byte; registries are
//! mutex-protected so registration may happen at runtime, but the lock is
//! only ever held to copy a slot, never across a handler or sender call.
//!
//! Reply policy for a valid frame:
//! - only ACK/NACK records inside: notify the upper layer, send nothing
//!   (this is what stops two peers from acknowledging each other forever);
//! - anything else inside: handle every record, then exactly one ACK when
//!   all of them succeeded, otherwise exactly one NACK.
//!
//! Parser errors are answered with an immediate NACK carrying the
//! best-known frame id.

use core::cell::{Cell, RefCell};

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::blocking_mutex::Mutex;
use heapless::LinearMap;

use crate::config::{
    FRAME_OVERHEAD, MAX_CMD_HANDLERS, MAX_RECORDS_PER_FRAME, MAX_TYPE_HANDLERS, TYPE_ACK,
    TYPE_CONTROL_CMD, TYPE_NACK,
};
use crate::error::{Error, Result};
use crate::frame::{build_ack_frame, build_nack_frame, split_segment};
use crate::parser::{FrameParser, FrameView, ParseEvent};
use crate::record::TlvRecord;
use crate::transport::Transport;
use crate::Interface;

/// Handles one record; `true` means handled successfully.
pub type TypeHandler = fn(&TlvRecord<'_>, Interface) -> bool;
/// Handles one control command byte; `true` means handled successfully.
pub type CmdHandler = fn(u8, Interface) -> bool;
/// Notified with the original frame id carried by a received ACK or NACK.
pub type AckNotify = fn(u8, Interface);

/// Reply frames carry a single one-byte record.
const REPLY_BUF_SIZE: usize = FRAME_OVERHEAD + 3;

pub struct Dispatcher<M: RawMutex> {
    type_handlers: Mutex<M, RefCell<LinearMap<u8, TypeHandler, MAX_TYPE_HANDLERS>>>,
    cmd_handlers: Mutex<M, RefCell<LinearMap<u8, CmdHandler, MAX_CMD_HANDLERS>>>,
    ack_notify: Mutex<M, Cell<Option<AckNotify>>>,
    nack_notify: Mutex<M, Cell<Option<AckNotify>>>,
}

impl<M: RawMutex> Dispatcher<M> {
    pub const fn new() -> Self {
        Self {
            type_handlers: Mutex::new(RefCell::new(LinearMap::new())),
            cmd_handlers: Mutex::new(RefCell::new(LinearMap::new())),
            ack_notify: Mutex::new(Cell::new(None)),
            nack_notify: Mutex::new(Cell::new(None)),
        }
    }

    /// Register a handler for a TLV type. Replaces any previous handler for
    /// the same type.
    pub fn register_type_handler(&self, type_id: u8, handler: TypeHandler) -> Result<()> {
        self.type_handlers.lock(|map| {
            map.borrow_mut()
                .insert(type_id, handler)
                .map(|_| ())
                .map_err(|_| Error::RegistryFull)
        })
    }

    pub fn unregister_type_handler(&self, type_id: u8) {
        self.type_handlers.lock(|map| {
            map.borrow_mut().remove(&type_id);
        });
    }

    /// Register a handler for a control command byte. Replaces any previous
    /// handler for the same command.
    pub fn register_cmd_handler(&self, command: u8, handler: CmdHandler) -> Result<()> {
        self.cmd_handlers.lock(|map| {
            map.borrow_mut()
                .insert(command, handler)
                .map(|_| ())
                .map_err(|_| Error::RegistryFull)
        })
    }

    pub fn unregister_cmd_handler(&self, command: u8) {
        self.cmd_handlers.lock(|map| {
            map.borrow_mut().remove(&command);
        });
    }

    /// Called with the original frame id when a pure-ACK frame arrives.
    pub fn set_ack_notify(&self, notify: Option<AckNotify>) {
        self.ack_notify.lock(|slot| slot.set(notify));
    }

    /// Called with the original frame id when a pure-NACK frame arrives.
    pub fn set_nack_notify(&self, notify: Option<AckNotify>) {
        self.nack_notify.lock(|slot| slot.set(notify));
    }

    /// Drive `parser` over a received byte run, dispatching every completed
    /// frame and answering parser errors with a NACK.
    pub fn feed(&self, parser: &mut FrameParser, transport: &Transport<M>, bytes: &[u8]) {
        let interface = parser.interface();
        for &byte in bytes {
            match parser.push_byte(byte) {
                Some(ParseEvent::Frame(frame)) => self.handle_frame(&frame, transport),
                Some(ParseEvent::Error { frame_id, error }) => {
                    #[cfg(feature = "log")]
                    log::debug!("{:?} rx error: {}, nacking frame {:#04x}", interface, error, frame_id);
                    #[cfg(not(feature = "log"))]
                    let _ = error;
                    self.send_nack(frame_id, interface, transport);
                }
                None => {}
            }
        }
    }

    /// Apply the dispatch and reply policy to one valid frame.
    pub fn handle_frame(&self, frame: &FrameView<'_>, transport: &Transport<M>) {
        let mut records: heapless::Vec<TlvRecord<'_>, MAX_RECORDS_PER_FRAME> = heapless::Vec::new();
        for record in split_segment(frame.data) {
            if records.push(record).is_err() {
                break;
            }
        }
        if records.is_empty() {
            return;
        }

        let pure_reply = records
            .iter()
            .all(|r| r.type_id() == TYPE_ACK || r.type_id() == TYPE_NACK);
        if pure_reply {
            // Never answer an acknowledgement.
            for record in &records {
                let value = record.value();
                if value.is_empty() {
                    continue;
                }
                let notify = if record.type_id() == TYPE_ACK {
                    self.ack_notify.lock(|slot| slot.get())
                } else {
                    self.nack_notify.lock(|slot| slot.get())
                };
                if let Some(notify) = notify {
                    notify(value[0], frame.interface);
                }
            }
            return;
        }

        let mut all_ok = true;
        for record in &records {
            let ok = match record.type_id() {
                // Embedded in a data frame these are informational only.
                TYPE_ACK | TYPE_NACK => true,
                TYPE_CONTROL_CMD => self.run_command(record, frame.interface),
                type_id => match self.type_handler(type_id) {
                    Some(handler) => handler(record, frame.interface),
                    None => false,
                },
            };
            all_ok &= ok;
        }

        if all_ok {
            self.send_ack(frame.frame_id, frame.interface, transport);
        } else {
            #[cfg(feature = "log")]
            log::debug!("frame {:#04x}: record failed or unhandled, nacking", frame.frame_id);
            self.send_nack(frame.frame_id, frame.interface, transport);
        }
    }

    fn run_command(&self, record: &TlvRecord<'_>, interface: Interface) -> bool {
        let value = record.value();
        if value.is_empty() {
            return false;
        }
        match self.cmd_handler(value[0]) {
            Some(handler) => handler(value[0], interface),
            None => false,
        }
    }

    fn type_handler(&self, type_id: u8) -> Option<TypeHandler> {
        self.type_handlers
            .lock(|map| map.borrow().get(&type_id).copied())
    }

    fn cmd_handler(&self, command: u8) -> Option<CmdHandler> {
        self.cmd_handlers
            .lock(|map| map.borrow().get(&command).copied())
    }

    fn send_ack(&self, original_id: u8, interface: Interface, transport: &Transport<M>) {
        let mut buf = [0u8; REPLY_BUF_SIZE];
        if let Ok(len) = build_ack_frame(original_id, &mut buf) {
            let _ = transport.send_bytes(interface, &buf[..len]);
        }
    }

    fn send_nack(&self, original_id: u8, interface: Interface, transport: &Transport<M>) {
        let mut buf = [0u8; REPLY_BUF_SIZE];
        if let Ok(len) = build_nack_frame(original_id, &mut buf) {
            let _ = transport.send_bytes(interface, &buf[..len]);
        }
    }
}
