//! Integration tests for tickets, the WebSocket endpoint and event fan-out.

mod helpers;

use std::time::Duration;

use axum::http::StatusCode;
use futures::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};

use helpers::TestApp;

#[tokio::test]
async fn test_ticket_requires_session() {
    let app = TestApp::new();

    let response = app.request("POST", "/api/realtime/ticket", None, None).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["success"], false);
    assert_eq!(response.body["error"], "AUTHENTICATION");

    let response = app
        .request("POST", "/api/realtime/ticket", None, Some("no-such-session"))
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_ticket_issued_for_session() {
    let app = TestApp::new();
    let token = app.login(7, "operator").await;

    let ticket = app.ticket(&token).await;
    assert_eq!(ticket.len(), 64);
    assert!(ticket.chars().all(|c| c.is_ascii_hexdigit()));
}

#[tokio::test]
async fn test_ws_without_ticket_is_unauthorized() {
    let app = TestApp::new();

    let response = app.request("GET", "/ws", None, None).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_internal_events_require_secret() {
    let app = TestApp::new();

    let response = app
        .request(
            "POST",
            "/internal/events",
            Some(json!({"type": "new-order", "data": {"id": 1}})),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(app.state.queue.stats().await.unwrap().pending, 0);
}

#[tokio::test]
async fn test_room_subscriber_receives_new_order() {
    let app = TestApp::new();
    let addr = app.spawn().await;
    let token = app.login(1, "admin").await;
    let ticket = app.ticket(&token).await;

    let (mut socket, _) = connect_async(format!("ws://{addr}/ws?ticket={ticket}"))
        .await
        .expect("Upgrade failed");
    socket
        .send(Message::text(
            json!({"type": "join-room", "data": {"roomId": "city:1"}}).to_string(),
        ))
        .await
        .unwrap();

    let event = json!({
        "type": "new-order",
        "data": {"id": 55, "order_number": "B-55", "status": "new", "city_id": 1}
    });

    // Joining is asynchronous; publish until the room has a member.
    let mut delivered = 0;
    for _ in 0..200 {
        let response = app.internal_request("/internal/events", event.clone()).await;
        assert_eq!(response.status, StatusCode::OK);
        delivered = response.body["data"]["delivered"].as_u64().unwrap();
        if delivered > 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(delivered, 1);

    let msg = tokio::time::timeout(Duration::from_secs(2), socket.next())
        .await
        .expect("No frame received")
        .unwrap()
        .unwrap();
    let frame: Value = serde_json::from_str(msg.to_text().unwrap()).unwrap();
    assert_eq!(frame["type"], "new-order");
    assert_eq!(frame["data"]["order_number"], "B-55");

    // Every publish attempt enqueued an alert.
    assert!(app.state.queue.stats().await.unwrap().pending >= 1);
}

#[tokio::test]
async fn test_oversized_frame_is_dropped_without_closing() {
    let app = TestApp::new();
    let addr = app.spawn().await;
    let token = app.login(4, "admin").await;
    let ticket = app.ticket(&token).await;

    let (mut socket, _) = connect_async(format!("ws://{addr}/ws?ticket={ticket}"))
        .await
        .expect("Upgrade failed");
    app.wait_for_connections(1).await;

    let oversized = "x".repeat(app.state.config.realtime.max_message_bytes + 10);
    socket.send(Message::text(oversized)).await.unwrap();
    socket
        .send(Message::text(
            json!({"type": "join-room", "data": {"roomId": "city:4"}}).to_string(),
        ))
        .await
        .unwrap();

    let event = json!({
        "type": "new-order",
        "data": {"id": 9, "order_number": "B-9", "status": "new", "city_id": 4}
    });
    let mut delivered = 0;
    for _ in 0..200 {
        let response = app.internal_request("/internal/events", event.clone()).await;
        assert_eq!(response.status, StatusCode::OK);
        delivered = response.body["data"]["delivered"].as_u64().unwrap();
        if delivered > 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(delivered, 1);
    assert_eq!(app.state.realtime.connections.connection_count(), 1);

    let msg = tokio::time::timeout(Duration::from_secs(2), socket.next())
        .await
        .expect("No frame received")
        .unwrap()
        .unwrap();
    let frame: Value = serde_json::from_str(msg.to_text().unwrap()).unwrap();
    assert_eq!(frame["type"], "new-order");
    assert_eq!(frame["data"]["order_number"], "B-9");
}

#[tokio::test]
async fn test_reused_ticket_is_rejected() {
    let app = TestApp::new();
    let addr = app.spawn().await;
    let token = app.login(2, "admin").await;
    let ticket = app.ticket(&token).await;
    let url = format!("ws://{addr}/ws?ticket={ticket}");

    let (_socket, _) = connect_async(url.as_str()).await.expect("First use failed");

    let err = connect_async(url.as_str()).await.unwrap_err();
    let WsError::Http(response) = err else {
        panic!("Expected HTTP rejection, got {err:?}");
    };
    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
async fn test_logout_closes_connections() {
    let app = TestApp::new();
    let addr = app.spawn().await;
    let token = app.login(3, "admin").await;

    let mut sockets = Vec::new();
    for _ in 0..2 {
        let ticket = app.ticket(&token).await;
        let (socket, _) = connect_async(format!("ws://{addr}/ws?ticket={ticket}"))
            .await
            .expect("Upgrade failed");
        sockets.push(socket);
    }
    app.wait_for_connections(2).await;

    let response = app
        .request("POST", "/api/realtime/disconnect", None, Some(&token))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["closed"], 2);

    for socket in &mut sockets {
        let next = tokio::time::timeout(Duration::from_secs(2), socket.next())
            .await
            .expect("Socket not closed");
        assert!(matches!(next, None | Some(Ok(Message::Close(_))) | Some(Err(_))));
    }
    app.wait_for_connections(0).await;
}
