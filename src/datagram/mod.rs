// ABOUTME: Typed datagram facades: queue-serialized sender, override-slot-serialized receiver
// ABOUTME: Grounded on original_source/include/asionet/Socket.h and DatagramReceiver.h

pub mod receiver;
pub mod sender;

pub use receiver::DatagramReceiver;
pub use sender::DatagramSender;
