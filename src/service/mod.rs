// ABOUTME: Typed request/response façade over a fresh TCP connection per call
// ABOUTME: Grounded on the teacher's client/traits.rs layering, generalized beyond SMPP

pub mod client;
pub mod server;

pub use client::ServiceClient;
pub use server::ServiceServer;
