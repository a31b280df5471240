//! Wire configuration shared with the peer.
//!
//! Both ends of a link must agree on every constant in this module; treat it
//! as the published configuration artifact for a deployment. Changing a
//! value here is a wire-format change.

/// Frame header bytes, in wire order.
pub const FRAME_HEADER_0: u8 = 0xF0;
pub const FRAME_HEADER_1: u8 = 0x0F;

/// Frame tail bytes, in wire order.
pub const FRAME_TAIL_0: u8 = 0xE0;
pub const FRAME_TAIL_1: u8 = 0x0D;

/// Upper bound on the TLV data segment of one frame.
pub const MAX_DATA_LENGTH: usize = 240;

/// Header (2) + frame id (1) + data length (1) + CRC (2) + tail (2).
pub const FRAME_OVERHEAD: usize = 8;

/// Largest possible frame on the wire.
pub const MAX_FRAME_SIZE: usize = FRAME_OVERHEAD + MAX_DATA_LENGTH;

/// Frame id used for ACK/NACK reply frames. Data frames allocate ids from
/// the transport counter instead.
pub const REPLY_FRAME_ID: u8 = 0;

// ── Well-known TLV types ──────────────────────────────────────────────────────

/// Single-byte control command; the payload byte selects the command.
pub const TYPE_CONTROL_CMD: u8 = 0x01;
/// Signed 32-bit integer, little-endian.
pub const TYPE_INTEGER: u8 = 0x02;
/// UTF-8 text, not null-terminated.
pub const TYPE_STRING: u8 = 0x03;
/// Positive acknowledgement; payload carries the original frame id.
pub const TYPE_ACK: u8 = 0x08;
/// Negative acknowledgement; payload carries the original frame id.
pub const TYPE_NACK: u8 = 0x09;

// ── Scaled measurement types (i32, value x 10000) ─────────────────────────────

pub const INFO_VBUS: u8 = 0xA1;
pub const INFO_IBUS: u8 = 0xA3;
pub const INFO_PBUS: u8 = 0xA5;
pub const INFO_VSET: u8 = 0xB9;
pub const INFO_ISET: u8 = 0xA9;
pub const INFO_VOUT: u8 = 0xB1;
pub const INFO_IOUT: u8 = 0xB3;
pub const INFO_POUT: u8 = 0xB5;
pub const SENSOR_TEMP: u8 = 0x24;

/// Fixed-point factor for the scaled measurement types.
pub const SCALE_FACTOR: f32 = 10000.0;

// ── Capacities ────────────────────────────────────────────────────────────────

/// Registry capacity for TLV type handlers.
pub const MAX_TYPE_HANDLERS: usize = 32;
/// Registry capacity for control command handlers.
pub const MAX_CMD_HANDLERS: usize = 32;
/// Records decoded from a single frame; later records are ignored.
pub const MAX_RECORDS_PER_FRAME: usize = 16;
