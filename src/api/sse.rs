//! Server-Sent Events for streamed chat replies

use crate::chat::ChatStreamEvent;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::{Stream, StreamExt};
use serde_json::json;
use std::convert::Infallible;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

/// Turn the reply channel into an SSE response. The stream ends when the
/// sending side is dropped.
pub fn chat_stream(
    events: mpsc::Receiver<ChatStreamEvent>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let stream = ReceiverStream::new(events).map(|event| Ok(chat_event_to_axum(event)));

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    )
}

fn chat_event_to_axum(event: ChatStreamEvent) -> Event {
    let (event_type, data) = match event {
        ChatStreamEvent::Delta { text } => (
            "delta",
            json!({
                "type": "delta",
                "text": text
            }),
        ),
        ChatStreamEvent::Done { reply } => (
            "done",
            json!({
                "type": "done",
                "reply": reply
            }),
        ),
    };

    Event::default().event(event_type).data(data.to_string())
}
