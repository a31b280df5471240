//! Frame serialization and TLV segment splitting.
//!
//! Wire layout of one frame:
//!
//! ```text
//! [0xF0 0x0F] [frame id] [data len] [TLV1 .. TLVn] [CRC hi] [CRC lo] [0xE0 0x0D]
//! ```
//!
//! The CRC covers frame id, data length and the data segment. It is the only
//! big-endian field on the wire; integer payloads are little-endian.

use crate::config::{
    FRAME_HEADER_0, FRAME_HEADER_1, FRAME_OVERHEAD, FRAME_TAIL_0, FRAME_TAIL_1, MAX_DATA_LENGTH,
    REPLY_FRAME_ID,
};
use crate::crc::crc16;
use crate::error::{Error, Result};
use crate::record::TlvRecord;

/// Serialize a frame into `out`, returning the number of bytes written.
///
/// Fails with [`Error::Overflow`] when the records exceed the 240-byte data
/// segment or `out` cannot hold the complete frame. Zero-length records emit
/// their type and length bytes only.
pub fn build_frame(frame_id: u8, records: &[TlvRecord<'_>], out: &mut [u8]) -> Result<usize> {
    let mut data_length = 0usize;
    for record in records {
        data_length += 2 + record.len() as usize;
    }
    if data_length > MAX_DATA_LENGTH || out.len() < FRAME_OVERHEAD + data_length {
        return Err(Error::Overflow);
    }

    out[0] = FRAME_HEADER_0;
    out[1] = FRAME_HEADER_1;
    out[2] = frame_id;
    out[3] = data_length as u8;

    let mut idx = 4;
    for record in records {
        out[idx] = record.type_id();
        out[idx + 1] = record.len();
        idx += 2;
        let value = record.value();
        out[idx..idx + value.len()].copy_from_slice(value);
        idx += value.len();
    }

    // Frame id through end of data segment.
    let crc = crc16(&out[2..idx]);
    out[idx] = (crc >> 8) as u8;
    out[idx + 1] = crc as u8;
    out[idx + 2] = FRAME_TAIL_0;
    out[idx + 3] = FRAME_TAIL_1;

    Ok(idx + 4)
}

/// Reply frame acknowledging `original_id`. Reply frames carry frame id 0
/// so they can never themselves be acknowledged.
pub fn build_ack_frame(original_id: u8, out: &mut [u8]) -> Result<usize> {
    build_frame(REPLY_FRAME_ID, &[TlvRecord::ack(original_id)], out)
}

/// Reply frame rejecting `original_id`.
pub fn build_nack_frame(original_id: u8, out: &mut [u8]) -> Result<usize> {
    build_frame(REPLY_FRAME_ID, &[TlvRecord::nack(original_id)], out)
}

/// Walk the data segment of a valid frame, yielding borrowed records.
///
/// Iteration stops when fewer than two bytes remain or a declared length
/// would overrun the segment; trailing malformed bytes are never yielded.
pub fn split_segment(segment: &[u8]) -> SegmentRecords<'_> {
    SegmentRecords { segment, idx: 0 }
}

pub struct SegmentRecords<'a> {
    segment: &'a [u8],
    idx: usize,
}

impl<'a> Iterator for SegmentRecords<'a> {
    type Item = TlvRecord<'a>;

    fn next(&mut self) -> Option<TlvRecord<'a>> {
        if self.idx + 2 > self.segment.len() {
            return None;
        }
        let type_id = self.segment[self.idx];
        let len = self.segment[self.idx + 1] as usize;
        let start = self.idx + 2;
        if start + len > self.segment.len() {
            // Malformed trailer; park at the end so the iterator stays done.
            self.idx = self.segment.len();
            return None;
        }
        self.idx = start + len;
        Some(TlvRecord::from_view(type_id, &self.segment[start..start + len]))
    }
}
