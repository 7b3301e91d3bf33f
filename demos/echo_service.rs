// ABOUTME: Demonstrates ServiceServer/ServiceClient with a reversing echo handler
// ABOUTME: Mirrors spec §8 scenario 1; compare with the teacher's examples/send_sms.rs shape

use netcore::codec::{Decode, Encode};
use netcore::error::UserError;
use netcore::executor::Executor;
use netcore::service::{ServiceClient, ServiceServer};
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
struct PlainText;

impl Encode<String> for PlainText {
    fn encode(&self, message: &String) -> Result<Vec<u8>, UserError> {
        Ok(message.as_bytes().to_vec())
    }
}

impl Decode<String> for PlainText {
    fn decode(&self, bytes: &[u8]) -> Result<String, UserError> {
        Ok(String::from_utf8(bytes.to_vec())?)
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let executor = Executor::current();
    let server: ServiceServer<String, String, PlainText> =
        ServiceServer::new(executor, PlainText, 10_000, 64 * 1024);
    let server = Arc::new(server);

    let advertiser = {
        let server = server.clone();
        tokio::spawn(async move {
            server
                .advertise(
                    |peer, request: String| async move {
                        tracing::info!(%peer, %request, "handling request");
                        request.chars().rev().collect::<String>()
                    },
                    None,
                    None,
                )
                .await
        })
    };

    tokio::time::sleep(Duration::from_millis(50)).await;

    let client: ServiceClient<String, String, PlainText> = ServiceClient::new(PlainText, 64 * 1024);
    let response = client
        .call(&"hello".to_string(), "127.0.0.1", 10_000, Duration::from_secs(3))
        .await
        .expect("echo call should succeed");
    println!("server replied: {response}");

    server.stop();
    let _ = advertiser.await;
}
