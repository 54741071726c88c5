use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use futures::StreamExt;
use std::convert::Infallible;
use std::time::Duration;

use crate::dispatch::ChunkStream;
use crate::errors::OrchestratorError;

/// Renders a chunk stream as Server-Sent Events. A fault mid-stream becomes
/// an `error_event` and ends the stream; every stream is closed with
/// `stream_end`.
pub fn create_sse_stream(
    chunks: ChunkStream,
) -> Sse<impl Stream<Item = Result<Event, Infallible>> + Send> {
    let stream = async_stream::stream! {
        let mut chunks = chunks;
        while let Some(chunk) = chunks.next().await {
            match chunk {
                Ok(text) => yield Ok(create_content_delta_event(&text)),
                Err(e) => {
                    yield Ok(create_error_event(&e));
                    break;
                }
            }
        }
        yield Ok(create_stream_end_event());
    };

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(30))
            .text("keep-alive-text"),
    )
}

pub fn create_content_delta_event(content: &str) -> Event {
    let data = serde_json::json!({
        "content": content,
        "type": "delta"
    });

    Event::default()
        .event("content_delta")
        .data(data.to_string())
}

pub fn create_stream_end_event() -> Event {
    Event::default().event("stream_end").data("{}")
}

pub fn create_error_event(error: &OrchestratorError) -> Event {
    let data = serde_json::json!({
        "error": error.to_string(),
        "retryable": error.is_retryable(),
        "http_status": error.http_status_code()
    });

    Event::default().event("error_event").data(data.to_string())
}
