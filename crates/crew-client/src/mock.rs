// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::stream;

use crate::stream::{StreamEvent, StreamTransport, TurnStream};
use crate::ClientError;

/// One scripted stream item.  `ClientError` is not `Clone`, so failures are
/// described and materialised on each replay.
#[derive(Debug, Clone)]
pub enum ScriptItem {
    Event(StreamEvent),
    Fail(String),
    /// End of input without completion.
    Close,
}

impl From<StreamEvent> for ScriptItem {
    fn from(ev: StreamEvent) -> Self {
        ScriptItem::Event(ev)
    }
}

/// A pre-scripted stream transport.  Each call to `open` pops the next
/// script from the front of the queue, so tests can drive exact fragment
/// sequences without a backend.
#[derive(Clone, Default)]
pub struct ScriptedTransport {
    scripts: Arc<Mutex<VecDeque<Vec<ScriptItem>>>>,
    /// Response ids passed to `open`, in call order.
    pub opened: Arc<Mutex<Vec<String>>>,
}

impl ScriptedTransport {
    pub fn new(scripts: Vec<Vec<ScriptItem>>) -> Self {
        Self {
            scripts: Arc::new(Mutex::new(scripts.into())),
            opened: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn opened_ids(&self) -> Vec<String> {
        self.opened.lock().map(|v| v.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl StreamTransport for ScriptedTransport {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn open(&self, response_id: &str) -> Result<TurnStream, ClientError> {
        if let Ok(mut opened) = self.opened.lock() {
            opened.push(response_id.to_string());
        }
        let script = self
            .scripts
            .lock()
            .ok()
            .and_then(|mut q| q.pop_front())
            .ok_or(ClientError::StreamClosed)?;

        let items: Vec<Result<StreamEvent, ClientError>> = script
            .into_iter()
            .map(|item| match item {
                ScriptItem::Event(ev) => Ok(ev),
                ScriptItem::Fail(msg) => Err(ClientError::Stream(msg)),
                ScriptItem::Close => Err(ClientError::StreamClosed),
            })
            .collect();
        Ok(Box::pin(stream::iter(items)))
    }
}
