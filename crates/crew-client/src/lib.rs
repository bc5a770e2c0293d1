// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! HTTP and event-stream client for the multi-agent workflow backend.
//!
//! [`WorkflowApi`] is the request/response surface; [`StreamTransport`]
//! opens the per-turn event stream.  [`WorkflowClient`] implements both over
//! `reqwest`; [`ScriptedTransport`] replays canned streams in tests.

pub mod agent;
pub mod api;
pub mod client;
pub mod envelope;
pub mod error;
pub mod mock;
pub mod sse;
pub mod stream;
pub mod types;

pub use agent::AgentId;
pub use api::WorkflowApi;
pub use client::WorkflowClient;
pub use error::ClientError;
pub use mock::{ScriptItem, ScriptedTransport};
pub use sse::SseTransport;
pub use stream::{Completion, StreamEvent, StreamTransport, TurnStream};
pub use types::*;
