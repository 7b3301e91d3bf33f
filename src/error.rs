// ABOUTME: Uniform error taxonomy surfaced to every user-facing handler in the core
// ABOUTME: Transport-level causes are attached but never drive branching logic

use std::io;
use thiserror::Error;

/// Boxed user error, used for the pluggable [`crate::codec::Encode`]/[`crate::codec::Decode`]
/// failures which must not be pinned to a concrete type.
pub type UserError = Box<dyn std::error::Error + Send + Sync>;

/// Errors surfaced by any async operation in the core.
///
/// There is no `Success` variant: success is the `Ok` arm of the
/// `Result<T, Error>` every public operation returns. See spec §3/§7.
#[derive(Debug, Error)]
pub enum Error {
    /// The operation's endpoint was closed before it completed, either by a
    /// deadline timer expiring, an override-slot cancellation, or an explicit
    /// `stop()`.
    #[error("operation aborted")]
    Aborted,

    /// The transport reported an I/O error, or a send/receive transferred
    /// fewer bytes than the frame required.
    #[error("operation failed")]
    FailedOperation {
        #[source]
        cause: Option<io::Error>,
    },

    /// The user-supplied encoder rejected the outgoing message.
    #[error("encoding failed: {0}")]
    Encoding(#[source] UserError),

    /// The user-supplied decoder rejected the incoming bytes.
    #[error("decoding failed: {0}")]
    Decoding(#[source] UserError),

    /// A datagram's length prefix was inconsistent with the bytes actually
    /// received (too short for a header, or header promises more payload
    /// than arrived).
    #[error("invalid frame")]
    InvalidFrame,
}

impl Error {
    pub fn failed_operation(cause: io::Error) -> Self {
        Error::FailedOperation { cause: Some(cause) }
    }

    pub fn failed_operation_no_cause() -> Self {
        Error::FailedOperation { cause: None }
    }
}

impl From<io::Error> for Error {
    fn from(cause: io::Error) -> Self {
        Error::failed_operation(cause)
    }
}

/// Convenience alias used throughout the core.
pub type Result<T> = std::result::Result<T, Error>;
