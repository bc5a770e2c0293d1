// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    /// Connection refused, DNS failure, timeout or a broken body read.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-2xx response whose body was not a workflow envelope.
    #[error("backend returned {status}: {body}")]
    Status { status: u16, body: String },

    /// 2xx response whose body could not be decoded.
    #[error("malformed response: {0}")]
    Decode(String),

    /// The backend answered with `status = "error"`.
    #[error("{message}")]
    Api { message: String },

    /// The backend reported a failure inside the event stream.
    #[error("stream error: {0}")]
    Stream(String),

    #[error("event stream closed before the turn completed")]
    StreamClosed,

    #[error("no stream data received within the idle timeout")]
    StreamTimeout,

    #[error("invalid backend URL: {0}")]
    InvalidUrl(String),
}

impl ClientError {
    /// Text shown to the user in a notification.
    ///
    /// Backend-reported failures keep their message; transport failures
    /// collapse to a generic retry hint.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Api { message } => message.clone(),
            _ => "Network error, please retry".to_string(),
        }
    }
}
