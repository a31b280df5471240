//! Byte-fed frame parser.
//!
//! One parser per receive context: bytes may come from a UART interrupt, a
//! DMA-drained ring or a reader thread, but only ever from one of them for a
//! given parser. The machine holds a single fixed receive buffer, never
//! allocates, and hunts for a fresh header after any error.

use crate::config::{
    FRAME_HEADER_0, FRAME_HEADER_1, FRAME_TAIL_0, FRAME_TAIL_1, MAX_DATA_LENGTH,
};
use crate::crc::Crc16;
use crate::error::Error;
use crate::Interface;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    HeaderLow,
    HeaderHigh,
    FrameId,
    DataLen,
    Data,
    CrcHigh,
    CrcLow,
    TailLow,
    TailHigh,
}

/// A decoded frame. `data` borrows the parser's receive buffer and is valid
/// only until the next byte is pushed; copy out anything that must persist.
#[derive(Debug)]
pub struct FrameView<'a> {
    pub frame_id: u8,
    pub data: &'a [u8],
    pub interface: Interface,
}

/// Outcome of feeding one byte.
#[derive(Debug)]
pub enum ParseEvent<'a> {
    /// Header, tail and CRC all checked out.
    Frame(FrameView<'a>),
    /// The frame id is best-effort: stale or zero when the error hit before
    /// the id byte was seen.
    Error { frame_id: u8, error: Error },
}

pub struct FrameParser {
    state: State,
    interface: Interface,
    frame_id: u8,
    data_length: u8,
    buffer: heapless::Vec<u8, MAX_DATA_LENGTH>,
    crc: Crc16,
    crc_received: u16,
}

impl FrameParser {
    pub const fn new(interface: Interface) -> Self {
        Self {
            state: State::HeaderLow,
            interface,
            frame_id: 0,
            data_length: 0,
            buffer: heapless::Vec::new(),
            crc: Crc16::new(),
            crc_received: 0,
        }
    }

    pub fn interface(&self) -> Interface {
        self.interface
    }

    /// Drop any partial frame and return to header hunt.
    pub fn reset(&mut self) {
        self.state = State::HeaderLow;
        self.buffer.clear();
        self.crc.reset();
    }

    /// Advance the state machine by one byte.
    ///
    /// A byte that does not match an expected header or tail marker
    /// resynchronizes without being re-examined, so a stray `0xF0` right
    /// after a malformed frame costs one extra byte of hunt.
    pub fn push_byte(&mut self, byte: u8) -> Option<ParseEvent<'_>> {
        match self.state {
            State::HeaderLow => {
                if byte == FRAME_HEADER_0 {
                    self.state = State::HeaderHigh;
                    self.buffer.clear();
                    self.crc.reset();
                }
                None
            }
            State::HeaderHigh => {
                self.state = if byte == FRAME_HEADER_1 {
                    State::FrameId
                } else {
                    State::HeaderLow
                };
                None
            }
            State::FrameId => {
                self.frame_id = byte;
                self.crc.update(byte);
                self.state = State::DataLen;
                None
            }
            State::DataLen => {
                if byte as usize > MAX_DATA_LENGTH {
                    self.state = State::HeaderLow;
                    return Some(ParseEvent::Error {
                        frame_id: self.frame_id,
                        error: Error::LengthOverflow,
                    });
                }
                self.data_length = byte;
                self.crc.update(byte);
                self.state = if byte == 0 { State::CrcHigh } else { State::Data };
                None
            }
            State::Data => {
                // Cannot overflow: data_length is bounded by the capacity.
                let _ = self.buffer.push(byte);
                self.crc.update(byte);
                if self.buffer.len() >= self.data_length as usize {
                    self.state = State::CrcHigh;
                }
                None
            }
            State::CrcHigh => {
                self.crc_received = (byte as u16) << 8;
                self.state = State::CrcLow;
                None
            }
            State::CrcLow => {
                self.crc_received |= byte as u16;
                self.state = State::TailLow;
                None
            }
            State::TailLow => {
                self.state = if byte == FRAME_TAIL_0 {
                    State::TailHigh
                } else {
                    State::HeaderLow
                };
                None
            }
            State::TailHigh => {
                self.state = State::HeaderLow;
                if byte != FRAME_TAIL_1 {
                    // Bad tail: drop the frame silently.
                    return None;
                }
                if self.crc.finish() == self.crc_received {
                    Some(ParseEvent::Frame(FrameView {
                        frame_id: self.frame_id,
                        data: self.buffer.as_slice(),
                        interface: self.interface,
                    }))
                } else {
                    Some(ParseEvent::Error {
                        frame_id: self.frame_id,
                        error: Error::CrcMismatch,
                    })
                }
            }
        }
    }
}
