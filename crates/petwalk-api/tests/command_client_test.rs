#![allow(clippy::unwrap_used)]
// Integration tests for `CommandClient` against a loopback WebSocket server.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;

use petwalk_api::{CommandClient, DeviceCommand, Error};

// ── Helpers ─────────────────────────────────────────────────────────

/// What the loopback server answers with.
enum Reply {
    Text(String),
    Binary,
    Close,
}

/// Accept one connection, answer the first request, and return what was sent.
async fn serve_once(reply: Reply) -> (CommandClient, JoinHandle<Value>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let handle = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();

        let request = match ws.next().await.unwrap().unwrap() {
            Message::Text(text) => serde_json::from_str::<Value>(text.as_str()).unwrap(),
            other => panic!("expected text request, got {other:?}"),
        };

        match reply {
            Reply::Text(body) => ws.send(Message::text(body)).await.unwrap(),
            Reply::Binary => ws.send(Message::binary(vec![1_u8, 2, 3])).await.unwrap(),
            Reply::Close => ws.close(None).await.unwrap(),
        }

        // Drain until the client closes
        while let Some(Ok(_)) = ws.next().await {}
        request
    });

    let client = CommandClient::new("127.0.0.1", port, Duration::from_secs(5)).unwrap();
    (client, handle)
}

// ── Exchanges ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_device_info_round_trip() {
    let reply = json!({ "responses": [{ "DeviceInfo": [{ "device_name": "door" }] }] });
    let (client, server) = serve_once(Reply::Text(reply.to_string())).await;

    let result = client.device_info().await.unwrap();
    assert_eq!(result, reply);

    let request = server.await.unwrap();
    assert_eq!(
        request,
        json!({ "requests": [{ "function": "DeviceInfo", "params": [] }] })
    );
}

#[tokio::test]
async fn test_params_are_sent_positionally() {
    let (client, server) = serve_once(Reply::Text("{}".into())).await;

    client.zigbee_name_device("comp-1", "Back door").await.unwrap();

    let request = server.await.unwrap();
    assert_eq!(request["requests"][0]["function"], json!("ZigBeeNameDevice"));
    assert_eq!(
        request["requests"][0]["params"],
        json!(["comp-1", "Back door"])
    );
}

#[tokio::test]
async fn test_zigbee_start_join_uses_default_type() {
    let (client, server) = serve_once(Reply::Text("{}".into())).await;

    client.zigbee_start_join(None).await.unwrap();

    let request = server.await.unwrap();
    assert_eq!(
        request["requests"][0]["params"],
        json!(["start", "petWALK_ALB"])
    );
}

#[tokio::test]
async fn test_binary_reply_yields_empty_object() {
    let (client, server) = serve_once(Reply::Binary).await;

    let result = client.execute(&DeviceCommand::RfidTagList).await.unwrap();
    assert_eq!(result, json!({}));
    server.await.unwrap();
}

#[tokio::test]
async fn test_close_before_reply_yields_empty_object() {
    let (client, server) = serve_once(Reply::Close).await;

    let result = client.wifi_scan().await.unwrap();
    assert_eq!(result, json!({}));
    server.await.unwrap();
}

#[tokio::test]
async fn test_unparseable_reply_is_deserialization_error() {
    let (client, server) = serve_once(Reply::Text("not json".into())).await;

    let result = client.rfid_tag_list().await;
    assert!(
        matches!(result, Err(Error::Deserialization { ref body, .. }) if body == "not json"),
        "expected Deserialization error, got: {result:?}"
    );
    server.await.unwrap();
}

#[tokio::test]
async fn test_unreachable_socket_is_connection_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let client = CommandClient::new("127.0.0.1", port, Duration::from_secs(5)).unwrap();
    let err = client.device_info().await.unwrap_err();
    assert!(
        matches!(err, Error::Connection { .. }),
        "expected Connection error, got: {err:?}"
    );
}

#[tokio::test]
async fn test_silent_socket_times_out() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    // Completes the handshake and reads, but never answers
    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
        while let Some(Ok(_)) = ws.next().await {}
    });

    let timeout = Duration::from_millis(300);
    let client = CommandClient::new("127.0.0.1", port, timeout).unwrap();
    let err = client.device_info().await.unwrap_err();
    assert!(
        matches!(err, Error::Timeout { timeout: t, .. } if t == timeout),
        "expected Timeout error, got: {err:?}"
    );
    assert!(err.is_connection());
    assert!(err.to_string().contains("300ms"), "{err}");
    server.await.unwrap();
}
