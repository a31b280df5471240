//! In-memory TLV records.
//!
//! A record is one Type/Length/Value triple. Values built by the encoding
//! helpers (integers, commands, acknowledgements, strings) are copied into
//! inline storage so the record is self-contained; `raw` borrows the
//! caller's bytes instead. Records produced by the segment splitter borrow
//! the parser's receive buffer and are only valid while the frame is being
//! handled.

use micromath::F32Ext;

use crate::config::{
    INFO_IBUS, INFO_IOUT, INFO_ISET, INFO_PBUS, INFO_POUT, INFO_VBUS, INFO_VOUT, INFO_VSET,
    SCALE_FACTOR, SENSOR_TEMP, TYPE_ACK, TYPE_CONTROL_CMD, TYPE_NACK, TYPE_STRING,
};
use crate::error::{Error, Result};

/// Inline storage covers the widest helper-built payload (a copied string).
const INLINE_CAP: usize = 255;

#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
enum TlvValue<'a> {
    Inline { len: u8, bytes: [u8; INLINE_CAP] },
    Borrowed(&'a [u8]),
}

#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TlvRecord<'a> {
    type_id: u8,
    value: TlvValue<'a>,
}

impl<'a> TlvRecord<'a> {
    /// Record borrowing an arbitrary byte run. Fails when the slice cannot
    /// be described by the one-byte length field.
    pub fn raw(type_id: u8, value: &'a [u8]) -> Result<Self> {
        if value.len() > u8::MAX as usize {
            return Err(Error::Overflow);
        }
        Ok(Self {
            type_id,
            value: TlvValue::Borrowed(value),
        })
    }

    /// Signed 32-bit integer, little-endian.
    pub fn int32(type_id: u8, value: i32) -> Self {
        let mut bytes = [0u8; INLINE_CAP];
        bytes[..4].copy_from_slice(&value.to_le_bytes());
        Self {
            type_id,
            value: TlvValue::Inline { len: 4, bytes },
        }
    }

    /// IEEE-754 binary32, transported through its i32 bit pattern.
    pub fn float32(type_id: u8, value: f32) -> Self {
        Self::int32(type_id, value.to_bits() as i32)
    }

    /// Fixed-point value, `round(value x 10000)` as i32.
    pub fn scaled(type_id: u8, value: f32) -> Self {
        // Qualified: on hosted targets the inherent f32::round would shadow
        // the micromath method.
        Self::int32(type_id, F32Ext::round(value * SCALE_FACTOR) as i32)
    }

    /// Control command record; the single payload byte selects the command.
    pub fn control_cmd(command: u8) -> Self {
        Self::single(TYPE_CONTROL_CMD, command)
    }

    /// UTF-8 text record. Copies up to 255 bytes into inline storage;
    /// longer payloads are truncated on a char boundary.
    pub fn string(text: &str) -> Self {
        let mut end = text.len().min(INLINE_CAP);
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        let mut bytes = [0u8; INLINE_CAP];
        bytes[..end].copy_from_slice(&text.as_bytes()[..end]);
        Self {
            type_id: TYPE_STRING,
            value: TlvValue::Inline {
                len: end as u8,
                bytes,
            },
        }
    }

    /// Acknowledgement of `original_id`.
    pub fn ack(original_id: u8) -> Self {
        Self::single(TYPE_ACK, original_id)
    }

    /// Negative acknowledgement of `original_id`.
    pub fn nack(original_id: u8) -> Self {
        Self::single(TYPE_NACK, original_id)
    }

    fn single(type_id: u8, byte: u8) -> Self {
        let mut bytes = [0u8; INLINE_CAP];
        bytes[0] = byte;
        Self {
            type_id,
            value: TlvValue::Inline { len: 1, bytes },
        }
    }

    /// View into an already-encoded segment; the splitter guarantees the
    /// slice length fits the wire length field.
    pub(crate) fn from_view(type_id: u8, value: &'a [u8]) -> Self {
        Self {
            type_id,
            value: TlvValue::Borrowed(value),
        }
    }

    pub fn type_id(&self) -> u8 {
        self.type_id
    }

    pub fn len(&self) -> u8 {
        match &self.value {
            TlvValue::Inline { len, .. } => *len,
            TlvValue::Borrowed(slice) => slice.len() as u8,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn value(&self) -> &[u8] {
        match &self.value {
            TlvValue::Inline { len, bytes } => &bytes[..*len as usize],
            TlvValue::Borrowed(slice) => slice,
        }
    }

    /// Little-endian i32 payload.
    pub fn extract_int32(&self) -> Result<i32> {
        let value = self.value();
        if value.len() != 4 {
            return Err(Error::MalformedValue);
        }
        Ok(i32::from_le_bytes([value[0], value[1], value[2], value[3]]))
    }

    /// binary32 payload, the inverse of [`TlvRecord::float32`].
    pub fn extract_float32(&self) -> Result<f32> {
        Ok(f32::from_bits(self.extract_int32()? as u32))
    }

    /// Fixed-point payload, the inverse of [`TlvRecord::scaled`].
    pub fn extract_scaled(&self) -> Result<f32> {
        Ok(self.extract_int32()? as f32 / SCALE_FACTOR)
    }
}

// ── Named scaled measurements ─────────────────────────────────────────────────

pub fn voltage_bus(volts: f32) -> TlvRecord<'static> {
    TlvRecord::scaled(INFO_VBUS, volts)
}

pub fn current_bus(amps: f32) -> TlvRecord<'static> {
    TlvRecord::scaled(INFO_IBUS, amps)
}

pub fn power_bus(watts: f32) -> TlvRecord<'static> {
    TlvRecord::scaled(INFO_PBUS, watts)
}

pub fn voltage_out(volts: f32) -> TlvRecord<'static> {
    TlvRecord::scaled(INFO_VOUT, volts)
}

pub fn current_out(amps: f32) -> TlvRecord<'static> {
    TlvRecord::scaled(INFO_IOUT, amps)
}

pub fn power_out(watts: f32) -> TlvRecord<'static> {
    TlvRecord::scaled(INFO_POUT, watts)
}

pub fn voltage_set(volts: f32) -> TlvRecord<'static> {
    TlvRecord::scaled(INFO_VSET, volts)
}

pub fn current_set(amps: f32) -> TlvRecord<'static> {
    TlvRecord::scaled(INFO_ISET, amps)
}

pub fn temperature(celsius: f32) -> TlvRecord<'static> {
    TlvRecord::scaled(SENSOR_TEMP, celsius)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TYPE_INTEGER;

    #[test]
    fn int32_is_little_endian() {
        let record = TlvRecord::int32(TYPE_INTEGER, 0x12345678);
        assert_eq!(record.type_id(), TYPE_INTEGER);
        assert_eq!(record.value(), &[0x78, 0x56, 0x34, 0x12]);
        assert_eq!(record.extract_int32().unwrap(), 0x12345678);
    }

    #[test]
    fn negative_int32_round_trips() {
        let record = TlvRecord::int32(0x40, -123_456);
        assert_eq!(record.extract_int32().unwrap(), -123_456);
    }

    #[test]
    fn float32_round_trips_bit_exact() {
        let record = TlvRecord::float32(0x41, 3.1415926);
        assert_eq!(record.len(), 4);
        assert_eq!(record.extract_float32().unwrap(), 3.1415926);
    }

    #[test]
    fn scaled_rounds_to_fixed_point() {
        let record = TlvRecord::scaled(INFO_VBUS, 12.3456);
        assert_eq!(record.extract_int32().unwrap(), 123_456);
        assert_eq!(record.extract_scaled().unwrap(), 12.3456);

        // Rounding, not truncation.
        let record = TlvRecord::scaled(INFO_VBUS, 0.00009);
        assert_eq!(record.extract_int32().unwrap(), 1);
    }

    #[test]
    fn scaled_handles_negative_values() {
        let record = temperature(-12.5);
        assert_eq!(record.type_id(), SENSOR_TEMP);
        assert_eq!(record.extract_int32().unwrap(), -125_000);
        assert_eq!(record.extract_scaled().unwrap(), -12.5);
    }

    #[test]
    fn control_cmd_single_byte() {
        let record = TlvRecord::control_cmd(0x02);
        assert_eq!(record.type_id(), TYPE_CONTROL_CMD);
        assert_eq!(record.value(), &[0x02]);
    }

    #[test]
    fn string_copies_utf8() {
        let record = TlvRecord::string("HELLO");
        assert_eq!(record.type_id(), TYPE_STRING);
        assert_eq!(record.value(), b"HELLO");
    }

    #[test]
    fn string_record_outlives_its_source() {
        let record = {
            let text = std::string::String::from("transient");
            TlvRecord::string(&text)
        };
        assert_eq!(record.value(), b"transient");
    }

    #[test]
    fn string_truncates_on_char_boundary() {
        // 129 x "é" (2 bytes each) = 258 bytes; cutting at 255 would split
        // a char, so the record must stop at 254.
        let text: std::string::String = core::iter::repeat('é').take(129).collect();
        let record = TlvRecord::string(&text);
        assert_eq!(record.len(), 254);
        assert!(core::str::from_utf8(record.value()).is_ok());
    }

    #[test]
    fn raw_rejects_oversized_slices() {
        let big = [0u8; 300];
        assert_eq!(TlvRecord::raw(0x50, &big).unwrap_err(), Error::Overflow);
        assert!(TlvRecord::raw(0x50, &big[..255]).is_ok());
    }

    #[test]
    fn extract_rejects_wrong_length() {
        let record = TlvRecord::raw(0x40, &[1, 2, 3]).unwrap();
        assert_eq!(record.extract_int32().unwrap_err(), Error::MalformedValue);
        assert_eq!(record.extract_scaled().unwrap_err(), Error::MalformedValue);
    }

    #[test]
    fn empty_record() {
        let record = TlvRecord::raw(0x60, &[]).unwrap();
        assert!(record.is_empty());
        assert_eq!(record.value(), &[] as &[u8]);
    }
}
