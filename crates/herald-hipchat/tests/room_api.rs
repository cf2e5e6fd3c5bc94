//! HipChatClient against a scripted local HTTP endpoint.

use std::sync::{Arc, Mutex};

use herald_core::{ChatError, ChatService, Color};
use herald_hipchat::{HipChatClient, HipChatConfig};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// Serves one canned response per connection, in order, and records the
/// raw requests it received.
async fn scripted_server(responses: Vec<(u16, &'static str)>) -> (String, Arc<Mutex<Vec<String>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let requests = Arc::new(Mutex::new(Vec::new()));
    let seen = requests.clone();

    tokio::spawn(async move {
        for (code, body) in responses {
            let (mut socket, _) = listener.accept().await.expect("accept");
            let request = read_request(&mut socket).await;
            seen.lock().unwrap().push(request);

            let reply = format!(
                "HTTP/1.1 {} Scripted\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                code,
                body.len(),
                body
            );
            socket.write_all(reply.as_bytes()).await.expect("write");
            socket.shutdown().await.ok();
        }
    });

    (format!("http://{}", addr), requests)
}

async fn read_request(socket: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        let n = socket.read(&mut chunk).await.expect("read");
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);

        let text = String::from_utf8_lossy(&buf).to_string();
        if let Some(header_end) = text.find("\r\n\r\n") {
            let content_length = text[..header_end]
                .lines()
                .find_map(|line| {
                    let lower = line.to_ascii_lowercase();
                    lower
                        .strip_prefix("content-length:")
                        .map(|v| v.trim().parse::<usize>().unwrap_or(0))
                })
                .unwrap_or(0);
            if buf.len() >= header_end + 4 + content_length {
                return text;
            }
        }
    }
    String::from_utf8_lossy(&buf).to_string()
}

fn client_for(api_url: &str, max_retries: u32) -> HipChatClient {
    let config = HipChatConfig::new("secret-token", "builds")
        .with_api_url(api_url)
        .with_retries(max_retries, 1);
    HipChatClient::new(config).expect("client")
}

#[tokio::test]
async fn test_publish_posts_form_to_room_endpoint() {
    let (url, requests) = scripted_server(vec![(200, r#"{"status":"sent"}"#)]).await;
    let client = client_for(&url, 0);

    client
        .publish("app - #1 **FAILURE**", Color::Red)
        .await
        .expect("publish");

    let requests = requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert!(request.starts_with("POST /v1/rooms/message?format=json&auth_token=secret-token"));
    assert!(request.contains("room_id=builds"));
    assert!(request.contains("color=red"));
    assert!(request.contains("from=Build+Server"));
}

#[tokio::test]
async fn test_publish_retries_server_errors() {
    let (url, requests) = scripted_server(vec![
        (503, r#"{"error":"busy"}"#),
        (200, r#"{"status":"sent"}"#),
    ])
    .await;
    let client = client_for(&url, 2);

    client.publish("app - #2 Success", Color::Green).await.expect("publish");
    assert_eq!(requests.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn test_publish_does_not_retry_auth_errors() {
    let (url, requests) = scripted_server(vec![
        (401, r#"{"error":{"code":401,"message":"Auth token invalid"}}"#),
        (200, r#"{"status":"sent"}"#),
    ])
    .await;
    let client = client_for(&url, 3);

    let err = client
        .publish("app - #3 Success", Color::Green)
        .await
        .unwrap_err();

    match err {
        ChatError::Status { code, body } => {
            assert_eq!(code, 401);
            assert!(body.contains("Auth token invalid"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(requests.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_connection_refused_exhausts_retries() {
    // Bind then drop to get a port nobody listens on.
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let client = client_for(&format!("http://{}", addr), 1);
    let err = client.publish("x", Color::Yellow).await.unwrap_err();
    assert!(matches!(err, ChatError::RetriesExhausted { attempts: 2, .. }));
}

#[tokio::test]
async fn test_transport_errors_do_not_leak_token() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let client = client_for(&format!("http://{}", addr), 0);
    let err = client.publish("x", Color::Yellow).await.unwrap_err();
    assert!(matches!(err, ChatError::Http(_)));
    assert!(!err.to_string().contains("secret-token"), "{err}");

    let client = client_for(&format!("http://{}", addr), 1);
    let err = client.publish("x", Color::Yellow).await.unwrap_err();
    assert!(!err.to_string().contains("secret-token"), "{err}");
}

#[tokio::test]
async fn test_auth_token_is_query_encoded() {
    let (url, requests) = scripted_server(vec![(200, r#"{"status":"sent"}"#)]).await;
    let config = HipChatConfig::new("a&b#c", "builds")
        .with_api_url(&url)
        .with_retries(0, 1);
    let client = HipChatClient::new(config).expect("client");

    client.publish("x", Color::Green).await.expect("publish");

    let requests = requests.lock().unwrap();
    assert!(requests[0].starts_with("POST /v1/rooms/message?format=json&auth_token=a%26b%23c "));
}
