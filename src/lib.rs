//! An asynchronous networking core: length-prefixed framing over TCP and
//! UDP, deadline-bound operations, per-owner operation queues and override
//! slots, and cancellation expressed uniformly as closing an endpoint.
//!
//! The pieces here are the machinery four user-facing façades are built
//! from — [`service::ServiceClient`], [`service::ServiceServer`],
//! [`datagram::DatagramSender`], [`datagram::DatagramReceiver`] — not a
//! general-purpose networking toolkit. Message encoding is a pure user
//! concern: implement [`codec::Encode`]/[`codec::Decode`] for your message
//! type and hand the codec to a façade.

pub mod closeable;
pub mod codec;
pub mod config;
pub mod datagram;
pub mod deadline;
pub mod error;
pub mod executor;
pub mod frame;
pub mod override_op;
pub mod queue;
pub mod resolver;
pub mod service;
pub mod strand;
pub mod timer;
pub mod transport;
pub mod wait;

pub use error::{Error, Result};
pub use executor::Executor;
