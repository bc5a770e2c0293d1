// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! `text/event-stream` decoding for agent turns.
//!
//! Bytes arrive in arbitrary TCP-sized chunks.  [`SseDecoder`] keeps the
//! unterminated tail between chunks (as raw bytes, so multi-byte UTF-8
//! sequences split across chunks survive) and yields the `data` payload of
//! every complete event.  [`turn_stream`] turns those payloads into
//! [`StreamEvent`]s and stops after the first terminal item.

use std::collections::VecDeque;
use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use reqwest::header::ACCEPT;
use reqwest::Url;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::client::endpoint;
use crate::stream::{Completion, StreamEvent, StreamTransport, TurnStream};
use crate::{AgentId, ClientError, TodoItem};

/// [`StreamTransport`] over `GET /stream_response/:id`.
#[derive(Clone)]
pub struct SseTransport {
    http: reqwest::Client,
    base: Url,
    idle_timeout: Option<Duration>,
}

impl SseTransport {
    pub fn new(http: reqwest::Client, base: Url, idle_timeout: Option<Duration>) -> Self {
        Self { http, base, idle_timeout }
    }
}

#[async_trait]
impl StreamTransport for SseTransport {
    fn name(&self) -> &str {
        "sse"
    }

    async fn open(&self, response_id: &str) -> Result<TurnStream, ClientError> {
        let url = endpoint(&self.base, &["stream_response", response_id])?;
        debug!(response_id, "opening event stream");
        let resp = self
            .http
            .get(url)
            .header(ACCEPT, "text/event-stream")
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            warn!(response_id, status = status.as_u16(), "event stream refused");
            return Err(ClientError::Status { status: status.as_u16(), body });
        }
        let bytes = resp
            .bytes_stream()
            .map(|chunk| chunk.map(|b| b.to_vec()).map_err(ClientError::from));
        Ok(turn_stream(bytes, self.idle_timeout))
    }
}

/// Incremental SSE line parser.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buf: Vec<u8>,
    data: Vec<String>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk and return the payloads of all events it completed.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buf.extend_from_slice(chunk);
        let mut out = Vec::new();
        while let Some(nl_pos) = self.buf.iter().position(|&b| b == b'\n') {
            let raw: Vec<u8> = self.buf.drain(..=nl_pos).collect();
            let line = String::from_utf8_lossy(&raw[..nl_pos]);
            let line = line.trim_end_matches('\r');
            if let Some(payload) = self.take_line(line) {
                out.push(payload);
            }
        }
        out
    }

    /// Flush at end of input: an unterminated last line and any buffered
    /// `data` lines form one final event.
    pub fn finish(&mut self) -> Option<String> {
        if !self.buf.is_empty() {
            let raw = std::mem::take(&mut self.buf);
            let line = String::from_utf8_lossy(&raw).trim_end_matches('\r').to_string();
            if let Some(payload) = self.take_line(&line) {
                return Some(payload);
            }
        }
        self.dispatch()
    }

    fn take_line(&mut self, line: &str) -> Option<String> {
        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') {
            return None;
        }
        let (field, value) = match line.split_once(':') {
            Some((f, v)) => (f, v.strip_prefix(' ').unwrap_or(v)),
            None => (line, ""),
        };
        if field == "data" {
            self.data.push(value.to_string());
        }
        // `event`, `id` and `retry` carry nothing this client uses.
        None
    }

    fn dispatch(&mut self) -> Option<String> {
        if self.data.is_empty() {
            return None;
        }
        let payload = self.data.join("\n");
        self.data.clear();
        Some(payload)
    }
}

/// JSON object carried in each `data` payload.
#[derive(Debug, Default, Deserialize)]
struct WireEvent {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    complete: bool,
    #[serde(default)]
    next_agent: Option<AgentId>,
    #[serde(default)]
    next_agent_name: Option<String>,
    #[serde(default)]
    todo_items: Option<Vec<TodoItem>>,
    #[serde(default)]
    error: Option<String>,
}

/// Map one payload to zero, one or two stream items.
///
/// A payload may carry text and `complete` at once; the fragment is emitted
/// first.  Payloads that are not valid event JSON are skipped.
pub fn parse_payload(payload: &str) -> Vec<Result<StreamEvent, ClientError>> {
    let ev: WireEvent = match serde_json::from_str(payload) {
        Ok(ev) => ev,
        Err(e) => {
            warn!(error = %e, "skipping unparseable stream payload");
            return Vec::new();
        }
    };
    if let Some(msg) = ev.error {
        return vec![Err(ClientError::Stream(msg))];
    }
    let mut out = Vec::new();
    if let Some(text) = ev.text.filter(|t| !t.is_empty()) {
        out.push(Ok(StreamEvent::Fragment(text)));
    }
    if ev.complete {
        out.push(Ok(StreamEvent::Completed(Completion {
            next_agent: ev.next_agent,
            next_agent_name: ev.next_agent_name,
            todo_items: ev.todo_items,
        })));
    }
    out
}

type ByteStream = Pin<Box<dyn Stream<Item = Result<Vec<u8>, ClientError>> + Send>>;

struct State {
    bytes: ByteStream,
    decoder: SseDecoder,
    pending: VecDeque<Result<StreamEvent, ClientError>>,
    idle_timeout: Option<Duration>,
    eof: bool,
    finished: bool,
}

impl State {
    fn enqueue(&mut self, payload: &str) {
        for item in parse_payload(payload) {
            let terminal = !matches!(item, Ok(StreamEvent::Fragment(_)));
            self.pending.push_back(item);
            if terminal {
                self.finished = true;
                return;
            }
        }
    }
}

/// Build a [`TurnStream`] from raw body chunks.
///
/// The stream ends after `Completed` or the first error.  End of input
/// before completion yields [`ClientError::StreamClosed`]; a gap longer
/// than `idle_timeout` between chunks yields [`ClientError::StreamTimeout`].
pub fn turn_stream<S>(bytes: S, idle_timeout: Option<Duration>) -> TurnStream
where
    S: Stream<Item = Result<Vec<u8>, ClientError>> + Send + 'static,
{
    let state = State {
        bytes: Box::pin(bytes),
        decoder: SseDecoder::new(),
        pending: VecDeque::new(),
        idle_timeout,
        eof: false,
        finished: false,
    };

    let events = futures::stream::unfold(state, |mut st| async move {
        loop {
            if let Some(item) = st.pending.pop_front() {
                return Some((item, st));
            }
            if st.finished || st.eof {
                return None;
            }

            let next = match st.idle_timeout {
                Some(limit) => match tokio::time::timeout(limit, st.bytes.next()).await {
                    Ok(next) => next,
                    Err(_) => {
                        debug!(?limit, "event stream idle timeout");
                        st.finished = true;
                        return Some((Err(ClientError::StreamTimeout), st));
                    }
                },
                None => st.bytes.next().await,
            };

            match next {
                Some(Ok(chunk)) => {
                    for payload in st.decoder.push(&chunk) {
                        st.enqueue(&payload);
                        if st.finished {
                            break;
                        }
                    }
                }
                Some(Err(e)) => {
                    st.finished = true;
                    return Some((Err(e), st));
                }
                None => {
                    st.eof = true;
                    if let Some(payload) = st.decoder.finish() {
                        st.enqueue(&payload);
                    }
                    if !st.finished {
                        st.finished = true;
                        st.pending.push_back(Err(ClientError::StreamClosed));
                    }
                }
            }
        }
    });

    Box::pin(events)
}
