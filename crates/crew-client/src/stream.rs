// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;

use crate::{AgentId, ClientError, TodoItem};

/// Final event of a turn stream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Completion {
    /// Agent the backend handed the conversation to, if it changed.
    pub next_agent: Option<AgentId>,
    pub next_agent_name: Option<String>,
    /// Fresh to-do snapshot; replaces the local one wholesale.
    pub todo_items: Option<Vec<TodoItem>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// A chunk of response text, appended to what came before.
    Fragment(String),
    /// The turn is finished.  Nothing follows.
    Completed(Completion),
}

pub type TurnStream = Pin<Box<dyn Stream<Item = Result<StreamEvent, ClientError>> + Send>>;

/// Opens the event stream of one agent turn.
///
/// A returned stream yields zero or more fragments and then exactly one
/// terminal item: `Ok(Completed)` or an `Err`.  It ends after that.
#[async_trait]
pub trait StreamTransport: Send + Sync {
    /// Human-readable transport name for logs.
    fn name(&self) -> &str;

    async fn open(&self, response_id: &str) -> Result<TurnStream, ClientError>;
}
