//! Per-interface send path and frame id allocation.

use core::cell::Cell;
use core::sync::atomic::{AtomicU8, Ordering};

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::blocking_mutex::Mutex;

use crate::config::MAX_FRAME_SIZE;
use crate::error::{Error, Result, SendError};
use crate::frame::build_frame;
use crate::record::TlvRecord;
use crate::Interface;

/// Low-level sender for one interface. Returns the number of bytes written;
/// the caller only interprets success or failure. May block.
pub type SendFn = fn(&[u8]) -> core::result::Result<usize, SendError>;

pub struct Transport<M: RawMutex> {
    senders: Mutex<M, [Cell<Option<SendFn>>; Interface::COUNT]>,
    frame_id: AtomicU8,
}

impl<M: RawMutex> Transport<M> {
    pub const fn new() -> Self {
        Self {
            senders: Mutex::new([Cell::new(None), Cell::new(None)]),
            frame_id: AtomicU8::new(0),
        }
    }

    /// Install or replace the sender for an interface; `None` clears it.
    pub fn register_sender(&self, interface: Interface, sender: Option<SendFn>) {
        self.senders
            .lock(|slots| slots[interface.index()].set(sender));
        #[cfg(feature = "log")]
        log::trace!(
            "{:?} sender {}",
            interface,
            if sender.is_some() { "registered" } else { "cleared" }
        );
    }

    fn sender(&self, interface: Interface) -> Option<SendFn> {
        self.senders.lock(|slots| slots[interface.index()].get())
    }

    /// Hand raw bytes to the registered sender. The sender slot is copied
    /// out first; no lock is held while the sender runs.
    pub fn send_bytes(&self, interface: Interface, bytes: &[u8]) -> Result<usize> {
        let sender = self.sender(interface).ok_or(Error::SenderUnavailable)?;
        sender(bytes).map_err(|_| Error::SendFailed)
    }

    /// Build a frame from `records` on the stack and send it.
    pub fn send_records(
        &self,
        interface: Interface,
        frame_id: u8,
        records: &[TlvRecord<'_>],
    ) -> Result<usize> {
        let mut buffer = [0u8; MAX_FRAME_SIZE];
        let len = build_frame(frame_id, records, &mut buffer)?;
        self.send_bytes(interface, &buffer[..len])
    }

    /// Allocate a frame id for an outgoing data frame. Wraps modulo 256;
    /// id 0 is handed out too but only reply frames rely on it.
    pub fn next_frame_id(&self) -> u8 {
        self.frame_id.fetch_add(1, Ordering::Relaxed).wrapping_add(1)
    }
}
