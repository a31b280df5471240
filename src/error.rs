use thiserror::Error;

pub type Result<T> = core::result::Result<T, Error>;

/// Errors observable at the crate boundaries.
///
/// Parser errors (`LengthOverflow`, `CrcMismatch`) are reported through
/// [`ParseEvent::Error`](crate::parser::ParseEvent) and answered with a NACK
/// by the dispatch engine; builder and transport errors are returned to the
/// caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Declared data length exceeds the 240-byte segment limit.
    #[error("data length exceeds frame limit")]
    LengthOverflow,
    /// Computed CRC differs from the received CRC.
    #[error("frame CRC mismatch")]
    CrcMismatch,
    /// Records do not fit in the data segment or the output buffer.
    #[error("frame does not fit")]
    Overflow,
    /// A value payload has the wrong length for the requested extraction.
    #[error("malformed value payload")]
    MalformedValue,
    /// No sender is registered for the interface.
    #[error("no sender registered")]
    SenderUnavailable,
    /// The registered sender reported a failure.
    #[error("sender failed")]
    SendFailed,
    /// A handler registry is at capacity.
    #[error("handler registry full")]
    RegistryFull,
}

/// Failure reported by a registered sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[error("send failed")]
pub struct SendError;
