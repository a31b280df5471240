//! Link-agnostic TLV framing and dispatch for byte-oriented transports.
//!
//! Peers exchange self-delimiting frames over a serial line or USB CDC.
//! Each frame carries a run of Type/Length/Value records, is integrity
//! checked, and is positively or negatively acknowledged:
//!
//! ```text
//! [0xF0 0x0F] [frame id] [data len] [TLV data segment] [CRC16] [0xE0 0x0D]
//!                                    TLV: [type] [len] [value..]
//! ```
//!
//! The crate is `no_std`, allocation-free on the steady path, and runs
//! unchanged on a microcontroller and on a host PC. The three shared pieces
//! ([`Transport`], [`Dispatcher`] and one [`FrameParser`] per receive
//! context) are generic over an `embassy-sync` raw mutex so the same code
//! works under a critical section on target and under threads on the host:
//!
//! ```ignore
//! use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
//! use tlvlink::{Dispatcher, FrameParser, Interface, Transport};
//!
//! static TRANSPORT: Transport<CriticalSectionRawMutex> = Transport::new();
//! static DISPATCH: Dispatcher<CriticalSectionRawMutex> = Dispatcher::new();
//!
//! TRANSPORT.register_sender(Interface::Uart, Some(uart_write));
//! DISPATCH.register_cmd_handler(0x01, |cmd, _| { /* ... */ true })?;
//!
//! // Receive context, e.g. the UART reader:
//! let mut parser = FrameParser::new(Interface::Uart);
//! loop {
//!     let chunk = read_some_bytes();
//!     DISPATCH.feed(&mut parser, &TRANSPORT, chunk);
//! }
//! ```
//!
//! Wire constants live in [`config`] and must match the peer's.

#![no_std]

#[cfg(test)]
extern crate std;

pub mod config;
pub mod crc;
pub mod dispatch;
mod error;
pub mod frame;
pub mod parser;
pub mod record;
pub mod transport;

pub use dispatch::{AckNotify, CmdHandler, Dispatcher, TypeHandler};
pub use error::{Error, Result, SendError};
pub use parser::{FrameParser, FrameView, ParseEvent};
pub use record::TlvRecord;
pub use transport::{SendFn, Transport};

/// Physical byte transport a frame travels over. Sends are routed by it and
/// received records are tagged with it so handlers can tell the origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Interface {
    Uart,
    Usb,
}

impl Interface {
    pub(crate) const COUNT: usize = 2;

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}
