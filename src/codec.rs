// ABOUTME: Pluggable user-supplied message codec, specified at the interface only
// ABOUTME: Grounded on the teacher's codec.rs Encodable/Decodable trait shape, bodies not carried over

use crate::error::UserError;

/// Converts a typed message into wire bytes. Implemented by the caller for
/// their own message type; this crate never inspects the bytes it produces.
pub trait Encode<M> {
    fn encode(&self, message: &M) -> Result<Vec<u8>, UserError>;
}

/// Converts wire bytes back into a typed message. The inverse of [`Encode`].
pub trait Decode<M> {
    fn decode(&self, bytes: &[u8]) -> Result<M, UserError>;
}
