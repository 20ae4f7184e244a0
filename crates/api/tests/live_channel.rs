//! Live notification channel over a real WebSocket connection.

mod common;

use std::net::SocketAddr;
use std::time::Duration;

use axum::http::StatusCode;
use common::{build_test_app, put_json_auth, TestApp};
use futures::StreamExt;
use serde_json::json;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::protocol::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

const WAIT: Duration = Duration::from_secs(5);

async fn serve(app: &TestApp) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let router = app.router.clone();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

async fn connect(addr: SocketAddr, token: &str) -> Client {
    let url = format!("ws://{addr}/api/v1/notifications/live?token={token}");
    let (client, _) = connect_async(url).await.unwrap();
    client
}

/// Poll `check` until it holds or `WAIT` elapses.
async fn wait_until(what: &str, check: impl Fn() -> bool) {
    let deadline = tokio::time::Instant::now() + WAIT;
    while !check() {
        assert!(tokio::time::Instant::now() < deadline, "timed out waiting for {what}");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

/// Next frame that is not a ping or pong.
async fn next_frame(client: &mut Client) -> Message {
    loop {
        let msg = tokio::time::timeout(WAIT, client.next())
            .await
            .expect("no frame within timeout")
            .expect("stream ended")
            .unwrap();
        if !matches!(msg, Message::Ping(_) | Message::Pong(_)) {
            return msg;
        }
    }
}

#[tokio::test]
async fn workflow_write_is_pushed_and_disconnect_releases_the_channel() {
    let app = build_test_app();
    let author = app.store.insert_user(Some("idp|author"), "Author").id;
    let reviewer = app.store.insert_user(Some("idp|reviewer"), "Reviewer").id;
    let content_id = app.store.insert_content(author, "Post").id;
    let addr = serve(&app).await;

    let mut client = connect(addr, &app.token_for(reviewer)).await;
    let registry = app.state.registry.clone();
    wait_until("subscription", || registry.subscriber_count(reviewer) == 1).await;

    let response = put_json_auth(
        &app.router,
        &format!("/api/v1/content/{content_id}/approval"),
        json!({ "status": "PENDING_REVIEW", "assignee": "idp|reviewer" }),
        &app.token_for(author),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let frame = next_frame(&mut client).await;
    let json: serde_json::Value = serde_json::from_str(frame.to_text().unwrap()).unwrap();
    assert_eq!(json["type"], "notification");
    assert_eq!(json["data"]["notification_type"], "REVIEW_ASSIGNED");
    assert_eq!(json["data"]["user_id"], reviewer);

    client.close(None).await.unwrap();
    wait_until("release", || registry.subscriber_count(reviewer) == 0).await;
    assert_eq!(registry.channel_count(), 0);
}

#[tokio::test]
async fn second_viewer_survives_first_disconnect() {
    let app = build_test_app();
    let user = app.store.insert_user(None, "Viewer").id;
    let addr = serve(&app).await;
    let token = app.token_for(user);
    let registry = app.state.registry.clone();

    let mut first = connect(addr, &token).await;
    let _second = connect(addr, &token).await;
    wait_until("two viewers", || registry.subscriber_count(user) == 2).await;

    first.close(None).await.unwrap();
    wait_until("one viewer left", || registry.subscriber_count(user) == 1).await;
    assert_eq!(registry.channel_count(), 1);
}

#[tokio::test]
async fn shutdown_sends_close_frame() {
    let app = build_test_app();
    let user = app.store.insert_user(None, "Viewer").id;
    let addr = serve(&app).await;
    let registry = app.state.registry.clone();

    let mut client = connect(addr, &app.token_for(user)).await;
    wait_until("subscription", || registry.subscriber_count(user) == 1).await;

    registry.shutdown();

    assert!(matches!(next_frame(&mut client).await, Message::Close(_)));
    wait_until("release", || registry.subscriber_count(user) == 0).await;
}
