//! Message heartbeat stream.
//!
//! Long-lived SSE connection the chat client uses as a refresh prompt: a
//! `hello` event on connect, a `tick` event every three seconds, and a bare
//! comment line every fifteen seconds so idle-timeout intermediaries keep
//! the connection open. Each connection owns its own timers; dropping the
//! response body cancels them.

use std::convert::Infallible;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_stream::stream;
use axum::http::header::{HeaderName, CACHE_CONTROL};
use axum::response::sse::{Event, Sse};
use axum::response::IntoResponse;
use futures::Stream;
use serde::Serialize;
use tracing::debug;

const TICK_PERIOD: Duration = Duration::from_secs(3);
const KEEPALIVE_PERIOD: Duration = Duration::from_secs(15);

/// Payload of the initial `hello` event.
#[derive(Serialize)]
struct Hello {
    ok: bool,
    ts: u64,
}

/// Payload of each periodic `tick` event.
#[derive(Serialize)]
struct Tick {
    ts: u64,
}

fn epoch_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

/// GET /messages/stream — the SSE heartbeat.
pub async fn message_stream() -> impl IntoResponse {
    debug!("establishing heartbeat stream");
    (
        [
            // Keep proxies from caching or buffering the stream
            (CACHE_CONTROL, "no-cache, no-transform"),
            (HeaderName::from_static("x-accel-buffering"), "no"),
        ],
        Sse::new(heartbeat_stream(StreamGuard::new())),
    )
}

/// The event generator behind [`message_stream`].
///
/// Emissions are best-effort: a tick whose payload fails to serialize is
/// skipped and the timer keeps running. Transport-level write failures show
/// up as the body being dropped, which cancels the whole generator and both
/// intervals with it.
fn heartbeat_stream(guard: StreamGuard) -> impl Stream<Item = Result<Event, Infallible>> {
    stream! {
        let _guard = guard;

        if let Ok(event) = Event::default()
            .event("hello")
            .json_data(Hello { ok: true, ts: epoch_millis() })
        {
            yield Ok(event);
        }

        let mut ticks = tokio::time::interval(TICK_PERIOD);
        let mut keepalive = tokio::time::interval(KEEPALIVE_PERIOD);
        // An interval's first tick completes immediately; consume both so
        // the loop waits a full period before the first emission.
        ticks.tick().await;
        keepalive.tick().await;

        loop {
            tokio::select! {
                _ = ticks.tick() => {
                    if let Ok(event) = Event::default()
                        .event("tick")
                        .json_data(Tick { ts: epoch_millis() })
                    {
                        yield Ok(event);
                    }
                }
                _ = keepalive.tick() => {
                    yield Ok(Event::default().comment(""));
                }
            }
        }
    }
}

/// Teardown marker owned by the generator.
///
/// Dropped exactly once, whether the stream ends through client disconnect
/// or server-side cancellation, and also if the body is dropped before it
/// was ever polled.
struct StreamGuard {
    closed: Option<Arc<AtomicUsize>>,
}

impl StreamGuard {
    fn new() -> Self {
        Self { closed: None }
    }

    #[cfg(test)]
    fn counted(counter: Arc<AtomicUsize>) -> Self {
        Self {
            closed: Some(counter),
        }
    }
}

impl Drop for StreamGuard {
    fn drop(&mut self) {
        debug!("heartbeat stream closed");
        if let Some(counter) = &self.closed {
            counter.fetch_add(1, Ordering::SeqCst);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::routing::get;
    use axum::Router;
    use futures::StreamExt;
    use tower::ServiceExt;

    fn app() -> Router {
        Router::new().route("/messages/stream", get(message_stream))
    }

    async fn open_stream() -> (
        StatusCode,
        axum::http::HeaderMap,
        impl Stream<Item = Result<axum::body::Bytes, axum::Error>>,
    ) {
        let response = app()
            .oneshot(
                Request::builder()
                    .uri("/messages/stream")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        (status, headers, response.into_body().into_data_stream())
    }

    #[tokio::test(start_paused = true)]
    async fn stream_headers_identify_an_event_stream() {
        let (status, headers, _body) = open_stream().await;
        assert_eq!(status, StatusCode::OK);
        assert!(headers["content-type"]
            .to_str()
            .unwrap()
            .starts_with("text/event-stream"));
        assert_eq!(headers["cache-control"], "no-cache, no-transform");
        assert_eq!(headers["x-accel-buffering"], "no");
    }

    #[tokio::test(start_paused = true)]
    async fn first_frame_is_a_hello_event() {
        let (_, _, body) = open_stream().await;
        futures::pin_mut!(body);

        let frame = body.next().await.unwrap().unwrap();
        let text = std::str::from_utf8(&frame).unwrap();
        assert!(text.starts_with("event: hello\n"), "got: {text:?}");

        let data = text
            .lines()
            .find_map(|line| line.strip_prefix("data: "))
            .expect("hello frame carries a data line");
        let payload: serde_json::Value = serde_json::from_str(data).unwrap();
        assert_eq!(payload["ok"], serde_json::json!(true));
        assert!(payload["ts"].is_u64());
        assert!(text.ends_with("\n\n"));
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_and_keepalives_follow_their_periods() {
        let (_, _, body) = open_stream().await;
        futures::pin_mut!(body);

        // hello
        body.next().await.unwrap().unwrap();

        // Through t=15s: four plain ticks, then a tick and a keepalive
        // comment in whichever order the select resolves them.
        let mut ticks = 0;
        let mut comments = 0;
        for _ in 0..7 {
            let frame = body.next().await.unwrap().unwrap();
            let text = std::str::from_utf8(&frame).unwrap().to_string();
            if text.starts_with("event: tick\n") {
                let data = text
                    .lines()
                    .find_map(|line| line.strip_prefix("data: "))
                    .expect("tick frame carries a data line");
                let payload: serde_json::Value = serde_json::from_str(data).unwrap();
                assert!(payload["ts"].is_u64());
                ticks += 1;
            } else if text.starts_with(':') {
                comments += 1;
            } else {
                panic!("unexpected frame: {text:?}");
            }
        }
        assert_eq!(ticks, 6);
        assert_eq!(comments, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_stream_tears_down_exactly_once() {
        let counter = Arc::new(AtomicUsize::new(0));
        // Box::pin rather than pin_mut!: the latter leaves the stream in a
        // hidden local, so `drop(stream)` would only drop the Pin reference.
        let mut stream = Box::pin(heartbeat_stream(StreamGuard::counted(counter.clone())));

        // hello plus one tick, then the client goes away
        stream.next().await.unwrap().unwrap();
        stream.next().await.unwrap().unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 0);

        drop(stream);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn unpolled_stream_still_tears_down() {
        let counter = Arc::new(AtomicUsize::new(0));
        let stream = heartbeat_stream(StreamGuard::counted(counter.clone()));
        drop(stream);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}
