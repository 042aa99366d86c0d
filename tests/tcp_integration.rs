//! TCP transport integration tests
//!
//! Runs the client against a fake relay bound to a local port. The fake
//! relay reads the request until the client half-closes, records it, and
//! answers the way the real IN line does (HTTP/1.0, Content-Length, close).

use a3s_relay::{RelayClient, RelayConfig, RelayError, WatchEvent};
use serde_json::json;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Start a fake relay that answers one connection with `response`
///
/// Returns the port and a handle yielding the raw request received.
async fn fake_relay(response: Vec<u8>) -> (u16, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = Vec::new();
        socket.read_to_end(&mut request).await.unwrap();
        socket.write_all(&response).await.unwrap();
        socket.shutdown().await.unwrap();
        String::from_utf8(request).unwrap()
    });

    (port, handle)
}

fn ok(body: &str) -> Vec<u8> {
    format!(
        "HTTP/1.0 200 OK\r\nContent-Type: text/plain\r\nContent-Length: {}\r\n\r\n{}",
        body.len(),
        body
    )
    .into_bytes()
}

#[tokio::test]
async fn test_tcp_publish() {
    let (port, relay) = fake_relay(ok("ns_a 11\nns_b 12\n")).await;
    let config = RelayConfig::new("127.0.0.1", port).with_namespace("ns_");
    let client = RelayClient::new(config).unwrap();

    let result = client
        .send([("a", Some(10)), ("b", None)], &json!({"text": "hi"}))
        .await
        .unwrap();

    assert_eq!(result["a"], 11);
    assert_eq!(result["b"], 12);

    let request = relay.await.unwrap();
    assert_eq!(
        request,
        "POST / HTTP/1.1\r\n\
         Host: 127.0.0.1\r\n\
         Content-Length: 13\r\n\
         X-Realplexor: identifier=10:ns_a,ns_b\r\n\
         \r\n\
         {\"text\":\"hi\"}"
    );
}

#[tokio::test]
async fn test_tcp_online_and_watch() {
    let (port, relay) = fake_relay(ok("ns_u1 2\n")).await;
    let client = RelayClient::new(RelayConfig::new("127.0.0.1", port).with_namespace("ns_")).unwrap();
    let counters = client.online_with_counters(&[]).await.unwrap();
    assert_eq!(counters["u1"], 2);
    assert!(relay.await.unwrap().ends_with("\r\n\r\nonline ns_\n"));

    let (port, relay) = fake_relay(ok("online 3:ns_u1\noffline 4:ns_u2\n")).await;
    let client = RelayClient::new(RelayConfig::new("127.0.0.1", port).with_namespace("ns_")).unwrap();
    let events = client.watch(2, &["u"]).await.unwrap();
    assert_eq!(
        events,
        vec![
            WatchEvent::new("online", 3, "u1"),
            WatchEvent::new("offline", 4, "u2"),
        ]
    );
    assert!(relay.await.unwrap().ends_with("\r\n\r\nwatch 2 ns_u\n"));
}

#[tokio::test]
async fn test_tcp_access_denied() {
    let body = "access denied for guest user\n";
    let response = format!(
        "HTTP/1.0 403 Access Deined\r\nContent-Type: text/plain\r\nContent-Length: {}\r\n\r\n{}",
        body.len(),
        body
    );
    let (port, relay) = fake_relay(response.into_bytes()).await;
    let client = RelayClient::new(RelayConfig::new("127.0.0.1", port)).unwrap();

    let err = client.online(&[]).await.unwrap_err();
    match err {
        RelayError::RequestFailed { status, body } => {
            assert!(status.starts_with("403"));
            assert_eq!(body, "access denied for guest user\n");
        }
        other => panic!("unexpected error: {:?}", other),
    }
    relay.await.unwrap();
}

#[tokio::test]
async fn test_tcp_relay_closes_without_reply() {
    let (port, relay) = fake_relay(Vec::new()).await;
    let client = RelayClient::new(RelayConfig::new("127.0.0.1", port)).unwrap();

    let result = client.send(vec!["a"], &json!(null)).await.unwrap();

    assert!(result.is_empty());
    relay.await.unwrap();
}

#[tokio::test]
async fn test_tcp_credentials_on_the_wire() {
    let (port, relay) = fake_relay(ok("")).await;
    let mut client = RelayClient::new(RelayConfig::new("127.0.0.1", port)).unwrap();
    client.logon("acme", "pw");

    client.stats().await.unwrap();

    let request = relay.await.unwrap();
    assert!(request.contains("X-Realplexor: identifier=acme:pw@\r\n"));
}
