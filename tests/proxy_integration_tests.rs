//! Integration Tests for the proxy
//!
//! Runs the listener against an in-process origin server over loopback
//! sockets and checks what clients and the origin each observe.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use caching_proxy::{run_listener, Config, ProxyState};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};

// == Helper Functions ==

/// Requests seen by a fake origin, in arrival order.
type Seen = Arc<Mutex<Vec<String>>>;

/// Starts an origin that answers every request with `response` and closes.
async fn spawn_origin(response: Vec<u8>) -> (SocketAddr, Seen) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let seen: Seen = Arc::new(Mutex::new(Vec::new()));

    let log = Arc::clone(&seen);
    tokio::spawn(async move {
        loop {
            let (stream, _) = listener.accept().await.unwrap();
            let response = response.clone();
            let log = Arc::clone(&log);
            tokio::spawn(async move {
                let (reader, mut writer) = stream.into_split();
                let mut reader = BufReader::new(reader);
                let mut request = String::new();
                loop {
                    let mut line = String::new();
                    if reader.read_line(&mut line).await.unwrap() == 0 || line == "\r\n" {
                        break;
                    }
                    request.push_str(&line);
                }
                log.lock().unwrap().push(request);
                writer.write_all(&response).await.unwrap();
                writer.shutdown().await.unwrap();
            });
        }
    });

    (addr, seen)
}

/// Starts the proxy with the origin as its default target.
async fn spawn_proxy(origin: SocketAddr, max_object_size: usize) -> (SocketAddr, ProxyState) {
    let config = Config {
        default_target_host: origin.ip().to_string(),
        default_target_port: origin.port(),
        max_object_size,
        connect_timeout: Duration::from_secs(2),
        read_timeout: Duration::from_secs(2),
        ..Config::default()
    };
    let state = ProxyState::from_config(config);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(run_listener(listener, state.clone()));

    (addr, state)
}

async fn send(proxy: SocketAddr, request: &str) -> Vec<u8> {
    let mut stream = TcpStream::connect(proxy).await.unwrap();
    stream.write_all(request.as_bytes()).await.unwrap();
    let mut response = Vec::new();
    stream.read_to_end(&mut response).await.unwrap();
    response
}

fn ok_response(body: &str) -> Vec<u8> {
    format!(
        "HTTP/1.0 200 OK\r\nContent-Type: text/plain\r\nContent-Length: {}\r\n\r\n{}",
        body.len(),
        body
    )
    .into_bytes()
}

// == Cache Behavior ==

#[tokio::test]
async fn test_second_request_served_from_cache() {
    let response = ok_response("hello from origin");
    let (origin, seen) = spawn_origin(response.clone()).await;
    let (proxy, state) = spawn_proxy(origin, 1024).await;

    let request = format!("GET http://{}/hello.txt HTTP/1.0\r\n\r\n", origin);

    let first = send(proxy, &request).await;
    let second = send(proxy, &request).await;

    assert_eq!(first, response);
    assert_eq!(second, first, "cached bytes must match the relayed bytes");
    assert_eq!(seen.lock().unwrap().len(), 1, "origin contacted only once");

    let stats = state.cache.stats().snapshot();
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.insertions, 1);
}

#[tokio::test]
async fn test_oversized_response_relayed_but_not_cached() {
    let response = ok_response(&"x".repeat(200));
    let (origin, seen) = spawn_origin(response.clone()).await;
    let (proxy, state) = spawn_proxy(origin, response.len() - 1).await;

    let request = format!("GET http://{}/big HTTP/1.0\r\n\r\n", origin);
    assert_eq!(send(proxy, &request).await, response);
    assert_eq!(send(proxy, &request).await, response);

    assert_eq!(seen.lock().unwrap().len(), 2);
    assert_eq!(state.cache.stats().snapshot().oversized, 2);
    assert_eq!(state.cache.occupied_len().await.unwrap(), 0);
}

#[tokio::test]
async fn test_response_at_ceiling_is_cached() {
    let response = ok_response(&"y".repeat(200));
    let (origin, seen) = spawn_origin(response.clone()).await;
    let (proxy, _state) = spawn_proxy(origin, response.len()).await;

    let request = format!("GET http://{}/exact HTTP/1.0\r\n\r\n", origin);
    assert_eq!(send(proxy, &request).await, response);
    assert_eq!(send(proxy, &request).await, response);

    assert_eq!(seen.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_concurrent_clients() {
    let response = ok_response("shared");
    let (origin, _seen) = spawn_origin(response.clone()).await;
    let (proxy, state) = spawn_proxy(origin, 1024).await;

    let mut clients = Vec::new();
    for i in 0..24 {
        let request = format!("GET http://{}/obj/{} HTTP/1.0\r\n\r\n", origin, i % 3);
        clients.push(tokio::spawn(async move { send(proxy, &request).await }));
    }
    for client in clients {
        assert_eq!(client.await.unwrap(), response);
    }

    let keys: Vec<String> = state
        .cache
        .snapshot()
        .await
        .unwrap()
        .into_iter()
        .filter_map(|slot| slot.key)
        .collect();
    assert_eq!(keys.len(), 3, "one slot per distinct URI: {:?}", keys);
}

// == Outbound Request ==

#[tokio::test]
async fn test_outbound_headers_rewritten() {
    let (origin, seen) = spawn_origin(ok_response("ok")).await;
    let (proxy, _state) = spawn_proxy(origin, 1024).await;

    let request = format!(
        "GET http://{}/page?q=1 HTTP/1.1\r\n\
         Host: example.test\r\n\
         User-Agent: curl/8.0\r\n\
         Connection: keep-alive\r\n\
         Proxy-Connection: keep-alive\r\n\
         Accept: */*\r\n\
         \r\n",
        origin
    );
    send(proxy, &request).await;

    let outbound = seen.lock().unwrap()[0].clone();
    let expected = format!(
        "GET /page?q=1 HTTP/1.0\r\n\
         Host: example.test\r\n\
         Connection: close\r\n\
         Proxy-Connection: close\r\n\
         User-Agent: {}\r\n\
         Accept: */*\r\n",
        caching_proxy::proxy::USER_AGENT
    );
    assert_eq!(outbound, expected);
}

#[tokio::test]
async fn test_relative_uri_uses_default_target() {
    let (origin, seen) = spawn_origin(ok_response("default")).await;
    let (proxy, _state) = spawn_proxy(origin, 1024).await;

    let response = send(proxy, "GET /index.html HTTP/1.0\r\n\r\n").await;

    assert_eq!(response, ok_response("default"));
    let outbound = seen.lock().unwrap()[0].clone();
    assert!(outbound.starts_with("GET /index.html HTTP/1.0\r\n"));
    assert!(outbound.contains(&format!("Host: {}\r\n", origin.ip())));
}

// == Error Pages ==

#[tokio::test]
async fn test_unsupported_method() {
    let (origin, seen) = spawn_origin(ok_response("never")).await;
    let (proxy, _state) = spawn_proxy(origin, 1024).await;

    let response = send(proxy, "POST /form HTTP/1.0\r\nContent-Length: 0\r\n\r\n").await;
    let response = String::from_utf8(response).unwrap();

    assert!(response.starts_with("HTTP/1.0 501 Not implemented\r\n"));
    assert!(response.contains("Content-type: text/html\r\n"));
    assert!(seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_unreachable_origin_is_bad_gateway() {
    let closed = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let dead = closed.local_addr().unwrap();
    drop(closed);

    let (origin, _seen) = spawn_origin(ok_response("unused")).await;
    let (proxy, state) = spawn_proxy(origin, 1024).await;

    let request = format!("GET http://{}/x HTTP/1.0\r\n\r\n", dead);
    let response = String::from_utf8(send(proxy, &request).await).unwrap();

    assert!(response.starts_with("HTTP/1.0 502 Bad Gateway\r\n"));
    assert_eq!(state.cache.occupied_len().await.unwrap(), 0);
}

// == Real HTTP Client ==

#[tokio::test]
async fn test_http_client_through_proxy() {
    let (origin, seen) = spawn_origin(ok_response("via reqwest")).await;
    let (proxy, _state) = spawn_proxy(origin, 1024).await;

    let client = reqwest::Client::builder()
        .proxy(reqwest::Proxy::http(format!("http://{}", proxy)).unwrap())
        .build()
        .unwrap();

    let url = format!("http://{}/client.txt", origin);
    for _ in 0..2 {
        let response = client.get(&url).send().await.unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::OK);
        assert_eq!(response.text().await.unwrap(), "via reqwest");
    }

    assert_eq!(seen.lock().unwrap().len(), 1);
}
