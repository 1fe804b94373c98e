#![allow(clippy::unwrap_used)]
// End-to-end tests for the `PetWalk` facade against wiremock and a loopback
// command socket.

use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use futures_util::{SinkExt, StreamExt};
use pretty_assertions::assert_eq;
use secrecy::SecretString;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::Message;
use url::Url;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use petwalk_core::{ApiField, ClientConfig, CloudConfig, CoreError, PetWalk, model::UNKNOWN_PET_ID};

// ── Helpers ─────────────────────────────────────────────────────────

fn config(api_port: u16, ws_port: u16, cloud_base: &str) -> ClientConfig {
    let mut cloud = CloudConfig::new(
        Url::parse(cloud_base).unwrap(),
        "eu-central-1_Test",
        "client-123",
        "username",
        SecretString::from("password"),
    );
    cloud.identity_url = Some(Url::parse(&format!("{cloud_base}/cognito/")).unwrap());
    cloud.timeout = Duration::from_secs(5);

    ClientConfig::new("127.0.0.1", cloud)
        .with_api_port(api_port)
        .with_ws_port(ws_port)
        .with_local_timeout(Duration::from_secs(5))
}

async fn setup() -> (MockServer, PetWalk) {
    let server = MockServer::start().await;
    let port = server.address().port();
    let client = PetWalk::new(&config(port, free_port(), &server.uri())).unwrap();
    (server, client)
}

fn free_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

async fn mount_cognito(server: &MockServer) {
    let exp = chrono::Utc::now().timestamp() + 3600;
    let access = format!(
        "{}.{}.sig",
        URL_SAFE_NO_PAD.encode(r#"{"alg":"RS256"}"#),
        URL_SAFE_NO_PAD.encode(format!(r#"{{"exp":{exp}}}"#))
    );
    Mock::given(method("POST"))
        .and(path("/cognito/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "AuthenticationResult": { "IdToken": "id", "AccessToken": access }
        })))
        .mount(server)
        .await;
}

/// Loopback command socket answering every request with `reply`.
async fn command_socket(reply: Value) -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let reply = reply.clone();
            tokio::spawn(async move {
                let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
                if let Some(Ok(Message::Text(text))) = ws.next().await {
                    let request: Value = serde_json::from_str(text.as_str()).unwrap();
                    assert_eq!(request["requests"][0]["function"], json!("DeviceInfo"));
                    ws.send(Message::text(reply.to_string())).await.unwrap();
                }
                while let Some(Ok(_)) = ws.next().await {}
            });
        }
    });
    port
}

fn device_info() -> Value {
    json!({
        "request-id": "0b482bd5-c990-4892-ad05-fbb4b5a0ef0e",
        "responses": [{
            "DeviceInfo": [{
                "clb_state_door_pos": "closed",
                "clb_state_version": "0.1.20",
                "device_name": "pw_clb_v2_12345A67B8900000",
                "pets": [
                    [
                        "d1c87845-c3f3-421e-9937-132744b6a801",
                        "Garfield",
                        "cat",
                        { "in": "default", "out": "default" },
                        1_651_098_738,
                        null
                    ],
                    [
                        "edd68702-0bce-46a2-a1dd-57222aba3eb1",
                        "Tom",
                        "cat",
                        { "in": "default", "out": "default" },
                        1_651_098_739,
                        null
                    ]
                ],
                "serial": "12345A67B8900000",
                "sw_version": "0.1.20",
                "ws_version": "2.0.0"
            }]
        }],
        "version": "2.0.0"
    })
}

fn activated(field: ApiField) -> Value {
    match field {
        ApiField::Door => json!("open"),
        ApiField::System => json!("on"),
        _ => json!(true),
    }
}

fn deactivated(field: ApiField) -> Value {
    match field {
        ApiField::Door => json!("closed"),
        ApiField::System => json!("off"),
        _ => json!(false),
    }
}

fn write_value(field: ApiField, value: bool) -> Value {
    match (field, value) {
        (ApiField::Door, true) => json!("open"),
        (ApiField::Door, false) => json!("close"),
        (ApiField::System, true) => json!("on"),
        (ApiField::System, false) => json!("off"),
        (_, v) => json!(v),
    }
}

// ── Local API ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_get_values_activated_and_deactivated() {
    let (server, client) = setup().await;

    for field in ApiField::ALL {
        for (raw, expected) in [(activated(field), true), (deactivated(field), false)] {
            server.reset().await;
            Mock::given(method("GET"))
                .and(path(format!("/{}", field.group().path())))
                .respond_with(
                    ResponseTemplate::new(200).set_body_json(json!({ field.wire_name(): raw })),
                )
                .mount(&server)
                .await;

            assert_eq!(
                client.get_field(field).await.unwrap(),
                expected,
                "{field} with {raw}"
            );
        }
    }
}

#[tokio::test]
async fn test_set_values_activate_and_deactivate() {
    let (server, client) = setup().await;

    for field in ApiField::ALL {
        for value in [true, false] {
            server.reset().await;
            Mock::given(method("PUT"))
                .and(path(format!("/{}", field.group().path())))
                .and(body_json(json!({ field.wire_name(): write_value(field, value) })))
                .respond_with(ResponseTemplate::new(202))
                .expect(1)
                .mount(&server)
                .await;

            client.set_field(field, value).await.unwrap();
            server.verify().await;
        }
    }
}

#[tokio::test]
async fn test_brightness_sensor_scenario() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/modes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "brightnessSensor": false,
            "motion_in": false,
            "motion_out": false,
            "rfid": false,
            "time": false
        })))
        .mount(&server)
        .await;

    assert!(!client.get_brightness_sensor().await.unwrap());
    assert!(!client.local().is_open(), "scope must release the handle");
}

#[tokio::test]
async fn test_door_and_system_scenario() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/states"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "door": "open", "system": "on" })),
        )
        .mount(&server)
        .await;

    assert!(client.get_door_state().await.unwrap());
    assert!(client.get_system_state().await.unwrap());
}

#[tokio::test]
async fn test_named_setters_use_domain_vocabulary() {
    let (server, client) = setup().await;

    Mock::given(method("PUT"))
        .and(path("/states"))
        .and(body_json(json!({ "door": "close" })))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/modes"))
        .and(body_json(json!({ "motion_in": true })))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(&server)
        .await;

    client.set_door_state(false).await.unwrap();
    client.set_motion_in(true).await.unwrap();
}

#[tokio::test]
async fn test_get_api_data_merges_and_normalizes() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/modes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "brightnessSensor": true,
            "motion_in": false,
            "motion_out": true,
            "rfid": false,
            "time": true
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/states"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "door": "closed", "system": "on" })),
        )
        .mount(&server)
        .await;

    let data = client.get_api_data().await.unwrap();
    assert_eq!(data.len(), 7);
    assert!(data["brightnessSensor"]);
    assert!(!data["door"]);
    assert!(data["system"]);
}

#[tokio::test]
async fn test_unmapped_value_is_invalid_response_value() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/states"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "door": "ajar" })))
        .mount(&server)
        .await;

    let result = client.get_door_state().await;
    assert!(
        matches!(result, Err(CoreError::InvalidResponseValue { ref field, .. }) if field == "door"),
        "{result:?}"
    );
}

#[tokio::test]
async fn test_missing_field_is_invalid_response() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/modes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "rfid": true })))
        .mount(&server)
        .await;

    let result = client.get_time().await;
    assert!(matches!(result, Err(CoreError::InvalidResponse { .. })), "{result:?}");
}

#[tokio::test]
async fn test_unexpected_status_codes() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({ "door": "open" })))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    assert!(matches!(
        client.get_door_state().await,
        Err(CoreError::InvalidResponseStatus { status: 400, .. })
    ));
    assert!(matches!(
        client.set_rfid(true).await,
        Err(CoreError::InvalidResponseStatus { status: 200, .. })
    ));
}

// ── Command socket ──────────────────────────────────────────────────

async fn device_info_client() -> PetWalk {
    let ws_port = command_socket(device_info()).await;
    PetWalk::new(&config(free_port(), ws_port, "http://127.0.0.1:9")).unwrap()
}

#[tokio::test]
async fn test_device_metadata() {
    let client = device_info_client().await;

    assert_eq!(client.get_device_info().await.unwrap(), device_info());
    assert_eq!(
        client.get_device_name().await.unwrap(),
        "pw_clb_v2_12345A67B8900000"
    );
    assert_eq!(client.get_serial_number().await.unwrap(), "12345A67B8900000");
    assert_eq!(client.get_sw_version().await.unwrap(), "1.20");
}

#[tokio::test]
async fn test_available_pets() {
    let client = device_info_client().await;

    let pets = client.get_available_pets(false).await.unwrap();
    assert_eq!(pets.len(), 2);
    assert_eq!(pets[0].name, "Garfield");
    assert_eq!(pets[0].species.as_deref(), Some("cat"));
    assert_eq!(pets[0].config_in.as_deref(), Some("default"));
    assert_eq!(pets[0].created.timestamp(), 1_651_098_738);
    assert_eq!(pets[1].id, "edd68702-0bce-46a2-a1dd-57222aba3eb1");
    assert_eq!(pets[1].created.timestamp(), 1_651_098_739);

    let pets = client.get_available_pets(true).await.unwrap();
    assert_eq!(pets.len(), 3);
    assert!(pets[2].unknown);
    assert_eq!(pets[2].id, UNKNOWN_PET_ID);
}

// ── Cloud ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_get_device_id() {
    let (server, client) = setup().await;
    mount_cognito(&server).await;

    Mock::given(method("GET"))
        .and(path("/update_info"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "update_states": [{ "deviceId": 1234 }] })),
        )
        .mount(&server)
        .await;

    assert_eq!(client.get_device_id().await.unwrap(), 1234);
    assert!(!client.cloud().is_open());
}

#[tokio::test]
async fn test_get_pet_status() {
    let (server, client) = setup().await;
    mount_cognito(&server).await;

    Mock::given(method("GET"))
        .and(path("/door_events"))
        .and(query_param("deviceID", "1234"))
        .and(query_param("intervalDays", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "id": 1, "event_type": "open", "event_source": "rfid",
                "date": "2023-03-01T08:00:00",
                "properties": { "direction": "OUT", "rfid_index": 0 },
                "pet": { "id": "garfield", "name": "Garfield", "species": 0 }
            },
            {
                "id": 2, "event_type": "close", "event_source": "rfid",
                "date": "2023-03-01T08:00:05", "properties": null, "pet": null
            },
            {
                "id": 3, "event_type": "open", "event_source": "rfid",
                "date": "2023-03-01T17:45:00",
                "properties": { "direction": "IN", "rfid_index": 0 },
                "pet": { "id": "garfield", "name": "Garfield", "species": 0 }
            },
            {
                "id": 4, "event_type": "open", "event_source": "motion",
                "date": "2023-03-01T12:00:00", "properties": null, "pet": null
            }
        ])))
        .mount(&server)
        .await;

    let status = client.get_pet_status(1234, false).await.unwrap();
    assert_eq!(status.len(), 1);
    assert_eq!(status["garfield"].id, 3);

    let status = client.get_pet_status(1234, true).await.unwrap();
    assert_eq!(status.len(), 2);
    assert_eq!(status[UNKNOWN_PET_ID].id, 4);
}

#[tokio::test]
async fn test_cloud_status_error() {
    let (server, client) = setup().await;
    mount_cognito(&server).await;

    Mock::given(method("GET"))
        .and(path("/notifications/settings"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    assert!(matches!(
        client.get_notification_settings().await,
        Err(CoreError::InvalidResponseStatus { status: 500, .. })
    ));
}

// ── Timeouts and cancellation ───────────────────────────────────────

async fn mount_slow_states(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/states"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "door": "open", "system": "on" }))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_stalled_door_is_connection_error() {
    let server = MockServer::start().await;
    let port = server.address().port();
    let cfg = config(port, free_port(), &server.uri()).with_local_timeout(Duration::from_millis(300));
    let client = PetWalk::new(&cfg).unwrap();
    mount_slow_states(&server).await;

    let err = client.get_door_state().await.unwrap_err();
    assert!(err.is_connection(), "expected connection error, got: {err:?}");
    assert!(!client.local().is_open());
}

#[tokio::test]
async fn test_abandoned_call_releases_local_session() {
    let (server, client) = setup().await;
    mount_slow_states(&server).await;

    let abandoned = tokio::time::timeout(Duration::from_millis(200), client.get_door_state()).await;
    assert!(abandoned.is_err(), "request should still be in flight");
    assert!(!client.local().is_open());
}

// ── Unreachable host ────────────────────────────────────────────────

#[tokio::test]
async fn test_unreachable_host_raises_connection_error_everywhere() {
    let dead = free_port();
    let client = PetWalk::new(&config(dead, dead, &format!("http://127.0.0.1:{dead}"))).unwrap();

    let results = [
        client.get_modes().await.map(drop),
        client.get_states().await.map(drop),
        client.get_api_data().await.map(drop),
        client.get_door_state().await.map(drop),
        client.set_system_state(true).await,
        client.get_device_info().await.map(drop),
        client.get_available_pets(true).await.map(drop),
        client.get_device_id().await.map(drop),
        client.get_notification_settings().await.map(drop),
        client.get_timeline(1, Some(2)).await.map(drop),
        client.get_pet_status(1, false).await.map(drop),
    ];

    for (i, result) in results.into_iter().enumerate() {
        let err = result.unwrap_err();
        assert!(err.is_connection(), "operation {i}: {err:?}");
    }
}
