//! The CDP WebSocket connection.
//!
//! One socket to the browser endpoint carries every command, both
//! browser-level and per-target (flattened sessions pass `sessionId`). A
//! spawned reader task routes responses to their callers by id; protocol
//! events (messages without an id) are not consumed at this layer.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio::sync::{Mutex, oneshot};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, trace};

use crate::error::{BrowserError, Result};

/// Bound on any single command round trip.
const CALL_TIMEOUT_MS: u64 = 30_000;

type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;
type WsSource = SplitStream<WebSocketStream<MaybeTlsStream<TcpStream>>>;

/// A live connection to a browser's DevTools endpoint.
pub struct CdpConnection {
    sink: Mutex<WsSink>,
    pending: Arc<DashMap<u64, oneshot::Sender<Value>>>,
    next_id: AtomicU64,
    reader: tokio::task::JoinHandle<()>,
}

impl CdpConnection {
    /// Connect to a `ws://` DevTools URL and start the response router.
    pub async fn connect(ws_url: &str) -> Result<Self> {
        let (stream, _response) = connect_async(ws_url).await?;
        let (sink, source) = stream.split();

        let pending: Arc<DashMap<u64, oneshot::Sender<Value>>> = Arc::new(DashMap::new());
        let reader = tokio::spawn(read_loop(source, Arc::clone(&pending)));

        debug!(ws_url, "CDP connection established");
        Ok(Self {
            sink: Mutex::new(sink),
            pending,
            next_id: AtomicU64::new(1),
            reader,
        })
    }

    /// Issue a browser-level command and return its `result` payload.
    pub async fn call(&self, method: &str, params: Value) -> Result<Value> {
        self.call_impl(None, method, params).await
    }

    /// Issue a command inside an attached target session.
    pub async fn call_in_session(
        &self,
        session_id: &str,
        method: &str,
        params: Value,
    ) -> Result<Value> {
        self.call_impl(Some(session_id), method, params).await
    }

    async fn call_impl(
        &self,
        session_id: Option<&str>,
        method: &str,
        params: Value,
    ) -> Result<Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let mut message = serde_json::json!({
            "id": id,
            "method": method,
            "params": params,
        });
        if let Some(session) = session_id {
            message["sessionId"] = Value::String(session.to_string());
        }

        let (tx, rx) = oneshot::channel();
        let _ = self.pending.insert(id, tx);

        trace!(id, method, "cdp call");
        {
            let mut sink = self.sink.lock().await;
            sink.send(Message::text(message.to_string())).await?;
        }

        let response = match tokio::time::timeout(Duration::from_millis(CALL_TIMEOUT_MS), rx).await
        {
            Ok(Ok(value)) => value,
            Ok(Err(_)) => return Err(BrowserError::ConnectionClosed(method.to_string())),
            Err(_) => {
                let _ = self.pending.remove(&id);
                return Err(BrowserError::Timeout {
                    what: format!("response to {method}"),
                    ms: CALL_TIMEOUT_MS,
                });
            }
        };

        if let Some(error) = response.get("error") {
            let message = error
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("unknown error");
            return Err(BrowserError::Protocol {
                method: method.to_string(),
                message: message.to_string(),
            });
        }
        Ok(response.get("result").cloned().unwrap_or(Value::Null))
    }
}

impl Drop for CdpConnection {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

impl std::fmt::Debug for CdpConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CdpConnection")
            .field("pending", &self.pending.len())
            .finish_non_exhaustive()
    }
}

/// Route incoming frames to the callers waiting on them.
async fn read_loop(mut source: WsSource, pending: Arc<DashMap<u64, oneshot::Sender<Value>>>) {
    while let Some(message) = source.next().await {
        match message {
            Ok(Message::Text(text)) => {
                let value: Value = match serde_json::from_str(&text) {
                    Ok(v) => v,
                    Err(e) => {
                        debug!(error = %e, "discarding unparseable CDP frame");
                        continue;
                    }
                };
                if let Some(id) = value.get("id").and_then(Value::as_u64) {
                    if let Some((_, tx)) = pending.remove(&id) {
                        let _ = tx.send(value);
                    } else {
                        trace!(id, "response for unknown call id");
                    }
                } else {
                    let method = value.get("method").and_then(Value::as_str).unwrap_or("?");
                    trace!(method, "ignoring cdp event");
                }
            }
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                debug!(error = %e, "CDP socket error, stopping reader");
                break;
            }
        }
    }
    // Dropping the senders wakes every in-flight call with a closed error.
    pending.clear();
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    async fn bind_server() -> (tokio::net::TcpListener, String) {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("ws://{}", listener.local_addr().unwrap());
        (listener, url)
    }

    async fn accept_ws(listener: &tokio::net::TcpListener) -> WebSocketStream<TcpStream> {
        let (stream, _) = listener.accept().await.unwrap();
        tokio_tungstenite::accept_async(stream).await.unwrap()
    }

    async fn next_request(ws: &mut WebSocketStream<TcpStream>) -> Value {
        loop {
            match ws.next().await.unwrap().unwrap() {
                Message::Text(text) => return serde_json::from_str(&text).unwrap(),
                _ => {}
            }
        }
    }

    async fn send_json(ws: &mut WebSocketStream<TcpStream>, value: Value) {
        ws.send(Message::text(value.to_string())).await.unwrap();
    }

    #[tokio::test]
    async fn call_returns_result_payload() {
        let (listener, url) = bind_server().await;
        let server = tokio::spawn(async move {
            let mut ws = accept_ws(&listener).await;
            let req = next_request(&mut ws).await;
            assert_eq!(req["method"], "Browser.getVersion");
            send_json(
                &mut ws,
                serde_json::json!({"id": req["id"], "result": {"product": "Chrome/140"}}),
            )
            .await;
        });

        let conn = CdpConnection::connect(&url).await.unwrap();
        let result = conn
            .call("Browser.getVersion", serde_json::json!({}))
            .await
            .unwrap();
        assert_eq!(result["product"], "Chrome/140");
        server.await.unwrap();
    }

    #[tokio::test]
    async fn call_surfaces_protocol_error() {
        let (listener, url) = bind_server().await;
        let server = tokio::spawn(async move {
            let mut ws = accept_ws(&listener).await;
            let req = next_request(&mut ws).await;
            send_json(
                &mut ws,
                serde_json::json!({
                    "id": req["id"],
                    "error": {"code": -32000, "message": "Cannot find context"}
                }),
            )
            .await;
        });

        let conn = CdpConnection::connect(&url).await.unwrap();
        let err = conn
            .call("Runtime.evaluate", serde_json::json!({"expression": "1"}))
            .await
            .unwrap_err();
        assert_matches!(err, BrowserError::Protocol { method, message } => {
            assert_eq!(method, "Runtime.evaluate");
            assert!(message.contains("Cannot find context"));
        });
        server.await.unwrap();
    }

    #[tokio::test]
    async fn events_without_id_are_skipped() {
        let (listener, url) = bind_server().await;
        let server = tokio::spawn(async move {
            let mut ws = accept_ws(&listener).await;
            let req = next_request(&mut ws).await;
            // An event lands before the response; the caller must not see it.
            send_json(
                &mut ws,
                serde_json::json!({"method": "Target.targetCreated", "params": {}}),
            )
            .await;
            send_json(
                &mut ws,
                serde_json::json!({"id": req["id"], "result": {"ok": true}}),
            )
            .await;
        });

        let conn = CdpConnection::connect(&url).await.unwrap();
        let result = conn.call("Target.getTargets", serde_json::json!({})).await.unwrap();
        assert_eq!(result["ok"], true);
        server.await.unwrap();
    }

    #[tokio::test]
    async fn session_calls_carry_session_id() {
        let (listener, url) = bind_server().await;
        let server = tokio::spawn(async move {
            let mut ws = accept_ws(&listener).await;
            let req = next_request(&mut ws).await;
            assert_eq!(req["sessionId"], "sess-7");
            send_json(
                &mut ws,
                serde_json::json!({"id": req["id"], "result": {}, "sessionId": "sess-7"}),
            )
            .await;
        });

        let conn = CdpConnection::connect(&url).await.unwrap();
        conn.call_in_session("sess-7", "Page.navigate", serde_json::json!({"url": "about:blank"}))
            .await
            .unwrap();
        server.await.unwrap();
    }

    #[tokio::test]
    async fn out_of_order_responses_route_by_id() {
        let (listener, url) = bind_server().await;
        let server = tokio::spawn(async move {
            let mut ws = accept_ws(&listener).await;
            let first = next_request(&mut ws).await;
            let second = next_request(&mut ws).await;
            // Answer in reverse arrival order.
            send_json(
                &mut ws,
                serde_json::json!({"id": second["id"], "result": {"tag": "second"}}),
            )
            .await;
            send_json(
                &mut ws,
                serde_json::json!({"id": first["id"], "result": {"tag": "first"}}),
            )
            .await;
        });

        let conn = CdpConnection::connect(&url).await.unwrap();
        let (a, b) = tokio::join!(
            conn.call("A.first", serde_json::json!({})),
            conn.call("B.second", serde_json::json!({})),
        );
        assert_eq!(a.unwrap()["tag"], "first");
        assert_eq!(b.unwrap()["tag"], "second");
        server.await.unwrap();
    }

    #[tokio::test]
    async fn closed_socket_fails_pending_call() {
        let (listener, url) = bind_server().await;
        let server = tokio::spawn(async move {
            let mut ws = accept_ws(&listener).await;
            let _req = next_request(&mut ws).await;
            ws.close(None).await.unwrap();
        });

        let conn = CdpConnection::connect(&url).await.unwrap();
        let err = conn
            .call("Page.captureScreenshot", serde_json::json!({}))
            .await
            .unwrap_err();
        assert_matches!(err, BrowserError::ConnectionClosed(method) => {
            assert_eq!(method, "Page.captureScreenshot");
        });
        server.await.unwrap();
    }
}
