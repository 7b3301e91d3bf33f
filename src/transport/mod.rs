// ABOUTME: Length-prefixed transport operations over stream and datagram sockets
// ABOUTME: Grounded on the teacher's Connection plus original_source Socket.h/DatagramReceiver.h

pub mod datagram;
pub mod stream;
