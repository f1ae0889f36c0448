//! Live stream helpers - read SSE frames off a response body
#![allow(dead_code)] // Test utilities may not all be used in every test

use axum::body::BodyDataStream;
use futures::StreamExt;
use serde_json::Value;
use tokio::time::{timeout, Duration};

const FRAME_TIMEOUT: Duration = Duration::from_secs(2);

/// One parsed server-sent event frame
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SseFrame {
    pub event: Option<String>,
    pub data: Option<String>,
    pub comment: Option<String>,
}

impl SseFrame {
    fn parse(raw: &str) -> Self {
        let mut frame = SseFrame::default();
        for line in raw.lines() {
            if let Some(rest) = line.strip_prefix(':') {
                frame.comment = Some(rest.trim().to_string());
            } else if let Some(rest) = line.strip_prefix("event:") {
                frame.event = Some(rest.trim().to_string());
            } else if let Some(rest) = line.strip_prefix("data:") {
                frame.data = Some(rest.trim().to_string());
            }
        }
        frame
    }

    pub fn json(&self) -> Value {
        let data = self.data.as_deref().expect("frame has no data");
        serde_json::from_str(data).unwrap()
    }
}

// ============================================================================
// Assertion Helpers
// ============================================================================

pub struct EventStream {
    body: BodyDataStream,
    buffer: String,
}

impl EventStream {
    pub fn new(body: BodyDataStream) -> Self {
        Self {
            body,
            buffer: String::new(),
        }
    }

    /// Next complete frame, or None if nothing arrives in time
    pub async fn next_frame_within(&mut self, wait: Duration) -> Option<SseFrame> {
        loop {
            if let Some(end) = self.buffer.find("\n\n") {
                let raw: String = self.buffer.drain(..end + 2).collect();
                return Some(SseFrame::parse(&raw));
            }

            let chunk = timeout(wait, self.body.next()).await.ok()??.ok()?;
            self.buffer.push_str(std::str::from_utf8(&chunk).unwrap());
        }
    }

    pub async fn next_frame(&mut self) -> SseFrame {
        self.next_frame_within(FRAME_TIMEOUT)
            .await
            .expect("expected a frame on the stream")
    }

    /// Asserts the stream opened with the connected sentinel
    pub async fn expect_connected(&mut self) {
        let frame = self.next_frame().await;
        assert_eq!(frame.event.as_deref(), Some("connected"));
        assert_eq!(frame.json(), serde_json::json!({}));
    }

    /// Skips heartbeats and returns the payload of the next named event
    pub async fn expect_event(&mut self, name: &str) -> Value {
        loop {
            let frame = self.next_frame().await;
            if frame.event.is_none() {
                continue;
            }
            assert_eq!(frame.event.as_deref(), Some(name), "unexpected event");
            return frame.json();
        }
    }

    /// Asserts no named event shows up for a short while
    pub async fn expect_silence(&mut self) {
        while let Some(frame) = self.next_frame_within(Duration::from_millis(100)).await {
            assert!(
                frame.event.is_none(),
                "expected silence, got {:?}",
                frame.event
            );
        }
    }
}
