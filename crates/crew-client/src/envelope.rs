// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! The `{ "status": "success" | "error", ... }` wrapper every request
//! endpoint answers with.

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::ClientError;

#[derive(Debug, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Envelope<T> {
    Success(T),
    #[serde(rename = "error")]
    Failure {
        #[serde(default)]
        message: Option<String>,
    },
}

impl<T> Envelope<T> {
    /// Convert into a `Result`, substituting `fallback` when the backend
    /// reported an error without a message.
    pub fn into_result(self, fallback: &str) -> Result<T, ClientError> {
        match self {
            Envelope::Success(v) => Ok(v),
            Envelope::Failure { message } => Err(failure(message, fallback)),
        }
    }
}

/// Build the [`ClientError::Api`] for a failure envelope.
pub fn failure(message: Option<String>, fallback: &str) -> ClientError {
    ClientError::Api {
        message: message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| fallback.to_string()),
    }
}

/// Decode an envelope body into its payload.
pub fn decode<T: DeserializeOwned>(body: &str, fallback: &str) -> Result<T, ClientError> {
    let env: Envelope<T> =
        serde_json::from_str(body).map_err(|e| ClientError::Decode(e.to_string()))?;
    env.into_result(fallback)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Acknowledged;

    #[test]
    fn success_yields_payload() {
        let ack: Acknowledged =
            decode(r#"{"status":"success","message":"ok"}"#, "fallback").unwrap();
        assert_eq!(ack.message.as_deref(), Some("ok"));
    }

    #[test]
    fn error_with_message_keeps_message() {
        let err = decode::<Acknowledged>(r#"{"status":"error","message":"no such agent"}"#, "x")
            .unwrap_err();
        assert_eq!(err.user_message(), "no such agent");
    }

    #[test]
    fn error_without_message_uses_fallback() {
        let err = decode::<Acknowledged>(r#"{"status":"error"}"#, "Failed to switch agent")
            .unwrap_err();
        assert!(matches!(err, ClientError::Api { ref message } if message == "Failed to switch agent"));
    }

    #[test]
    fn blank_error_message_uses_fallback() {
        let err = decode::<Acknowledged>(r#"{"status":"error","message":"  "}"#, "Failed")
            .unwrap_err();
        assert_eq!(err.user_message(), "Failed");
    }

    #[test]
    fn missing_status_is_decode_error() {
        let err = decode::<Acknowledged>(r#"{"message":"hi"}"#, "x").unwrap_err();
        assert!(matches!(err, ClientError::Decode(_)));
    }

    #[test]
    fn non_json_is_decode_error() {
        let err = decode::<Acknowledged>("<html>", "x").unwrap_err();
        assert!(matches!(err, ClientError::Decode(_)));
    }
}
