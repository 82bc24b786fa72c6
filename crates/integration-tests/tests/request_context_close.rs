//! Every request closes its `RequestContext`, whatever the handler returns.
//!
//! Kept in its own test binary: it installs a thread-local subscriber and
//! reads back everything that subscriber formatted.

#![allow(clippy::unwrap_used)]

use std::io;
use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::http::{Request, StatusCode};
use catalog_cart_service::store::KeyValueStore;
use catalog_integration_tests::{cart_app, send};
use catalog_observe::RequestContext;

/// Log sink shared between the subscriber and the test.
#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl CapturedLogs {
    /// Close events of top-level request contexts for `request_id`.
    ///
    /// Child contexts log inside an `operation{..}` span and are excluded.
    fn request_closes(&self, request_id: &str) -> usize {
        let logs = String::from_utf8(self.0.lock().unwrap().clone()).unwrap();
        let marker = format!("request_id={request_id}");
        logs.lines()
            .filter(|line| line.contains("request context closed"))
            .filter(|line| line.contains(&marker))
            .filter(|line| !line.contains("operation{"))
            .count()
    }
}

fn tagged(method: &str, uri: &str, request_id: &str, body: Option<&str>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("x-request-id", request_id)
        .header("content-type", "application/json");
    builder
        .body(body.map_or_else(Body::empty, |b| Body::from(b.to_owned())))
        .unwrap()
}

#[tokio::test]
async fn context_closes_on_success_validation_failure_and_store_error() {
    let logs = CapturedLogs::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let (app, store) = cart_app();
    store
        .set(&RequestContext::detached("seed"), "broken", "not json")
        .await
        .unwrap();

    let res = send(app.clone(), tagged("GET", "/cart/c1/", "req-ok", None)).await;
    assert_eq!(res.status, StatusCode::OK);

    let res = send(
        app.clone(),
        tagged("POST", "/cart/c1/items/", "req-invalid", Some(r#"{"item":""}"#)),
    )
    .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let res = send(app, tagged("GET", "/cart/broken/", "req-corrupt", None)).await;
    assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);

    assert_eq!(logs.request_closes("req-ok"), 1);
    assert_eq!(logs.request_closes("req-invalid"), 1);
    assert_eq!(logs.request_closes("req-corrupt"), 1);
}
