// SPDX-License-Identifier: MPL-2.0

//! Error taxonomy for the codec engine.

use thiserror::Error as ThisError;

/// Result alias used throughout this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while registering types, or encoding/decoding values.
///
/// The first error encountered during a codec call aborts the call; codecs
/// never retry and never expose a partial decode.
#[derive(Debug, ThisError)]
pub enum Error {
    /// The stream contained bytes that do not form a valid encoding: a bad
    /// length prefix, an unknown back-reference index, a length past a
    /// configured ceiling, or a stream that ended early.
    #[error("malformed stream: {0}")]
    Malformed(String),

    /// A type mismatch was detected at the resolver boundary or inside a
    /// decode (a back-reference disagreeing with the expected descriptor, or
    /// a loose interface substitute failing its required trait bound).
    #[error("type mismatch: expected {expected}, found {found}")]
    BadType {
        /// The descriptor (or trait) the caller expected.
        expected: String,
        /// The descriptor actually present on the wire.
        found: String,
    },

    /// The caller supplied a destination that cannot be written into (e.g.
    /// an interface slot whose required trait the substitute type does not
    /// implement).
    #[error("invalid decode target: {0}")]
    InvalidTarget(String),

    /// The underlying byte sink/source failed.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Two distinct descriptors fingerprinted to the same value, or the same
    /// fingerprint was registered against two distinct descriptors. Raised at
    /// registration time, never during encode/decode.
    #[error("registration error: {0}")]
    Registration(String),
}

impl Error {
    /// Build a `Malformed` error from a displayable context.
    pub fn malformed(context: impl std::fmt::Display) -> Self {
        Self::Malformed(context.to_string())
    }

    /// Build a `BadType` error.
    pub fn bad_type(expected: impl std::fmt::Display, found: impl std::fmt::Display) -> Self {
        Self::BadType {
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }

    /// Build an `InvalidTarget` error.
    pub fn invalid_target(context: impl std::fmt::Display) -> Self {
        Self::InvalidTarget(context.to_string())
    }

    /// Build a `Registration` error.
    pub fn registration(context: impl std::fmt::Display) -> Self {
        Self::Registration(context.to_string())
    }
}
