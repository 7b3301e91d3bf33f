// ABOUTME: Demonstrates DatagramSender/DatagramReceiver with a self-rearming receive loop
// ABOUTME: Mirrors spec §8 scenarios 3 and 4; compare with the teacher's examples/long_running_client.rs shape

use netcore::codec::Decode;
use netcore::codec::Encode;
use netcore::datagram::{DatagramReceiver, DatagramSender};
use netcore::error::UserError;
use std::time::Duration;

#[derive(Clone)]
struct RawBytes;

impl Encode<Vec<u8>> for RawBytes {
    fn encode(&self, message: &Vec<u8>) -> Result<Vec<u8>, UserError> {
        Ok(message.clone())
    }
}

impl Decode<Vec<u8>> for RawBytes {
    fn decode(&self, bytes: &[u8]) -> Result<Vec<u8>, UserError> {
        Ok(bytes.to_vec())
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let receiver: DatagramReceiver<Vec<u8>, RawBytes> =
        DatagramReceiver::new(RawBytes, 10_000, 1024).expect("bind receiver");
    let sender: DatagramSender<Vec<u8>, RawBytes> =
        DatagramSender::new(RawBytes, 1024).expect("bind sender");

    let receiving = tokio::spawn(async move {
        let mut values = Vec::new();
        for _ in 0..10u8 {
            let (payload, from) = receiver
                .receive(Duration::from_secs(1))
                .await
                .expect("receive should succeed");
            tracing::info!(%from, value = payload[0], "received datagram");
            values.push(payload[0]);
        }
        values
    });

    tokio::time::sleep(Duration::from_millis(20)).await;
    for value in 0u8..10 {
        sender
            .send(&vec![value], [127, 0, 0, 1].into(), 10_000, Duration::from_secs(1))
            .await
            .expect("send should succeed");
    }

    let values = receiving.await.expect("receiver task panicked");
    println!("received in order: {values:?}");
}
