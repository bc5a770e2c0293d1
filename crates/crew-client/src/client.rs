// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::envelope::{self, Envelope};
use crate::sse::SseTransport;
use crate::stream::{StreamTransport, TurnStream};
use crate::types::{
    CommandOutputPayload, FileContentPayload, FilesPayload, SystemInfoPayload, TodoListPayload,
};
use crate::{
    Acknowledged, AgentId, AgentSwitched, ClientError, FileEntry, Initialized, SystemInfo,
    TodoItem, TurnStarted, WorkflowApi,
};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP implementation of [`WorkflowApi`] and [`StreamTransport`].
#[derive(Clone)]
pub struct WorkflowClient {
    http: reqwest::Client,
    base: Url,
    request_timeout: Option<Duration>,
    stream: SseTransport,
}

impl WorkflowClient {
    /// Client with the default 30 s request timeout and no stream idle limit.
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        Self::with_timeouts(base_url, Some(Duration::from_secs(30)), None)
    }

    pub fn from_config(cfg: &crew_config::ServerConfig) -> Result<Self, ClientError> {
        Self::with_timeouts(&cfg.base_url, cfg.request_timeout(), cfg.stream_idle_timeout())
    }

    pub fn with_timeouts(
        base_url: &str,
        request_timeout: Option<Duration>,
        stream_idle_timeout: Option<Duration>,
    ) -> Result<Self, ClientError> {
        let base = parse_base_url(base_url)?;
        let http = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()?;
        let stream = SseTransport::new(http.clone(), base.clone(), stream_idle_timeout);
        Ok(Self { http, base, request_timeout, stream })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
        fallback: &str,
    ) -> Result<T, ClientError> {
        let url = endpoint(&self.base, &[path])?;
        let mut req = self.http.get(url);
        if !query.is_empty() {
            req = req.query(query);
        }
        self.execute(path, req, fallback).await
    }

    async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &Value,
        fallback: &str,
    ) -> Result<T, ClientError> {
        let url = endpoint(&self.base, &[path])?;
        self.execute(path, self.http.post(url).json(body), fallback).await
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        path: &str,
        req: RequestBuilder,
        fallback: &str,
    ) -> Result<T, ClientError> {
        let req = match self.request_timeout {
            Some(limit) => req.timeout(limit),
            None => req,
        };
        debug!(endpoint = path, "sending request");
        let resp = req.send().await.map_err(|e| {
            warn!(endpoint = path, error = %e, "request failed");
            ClientError::from(e)
        })?;
        let status = resp.status();
        let body = resp.text().await?;

        if status.is_success() {
            return envelope::decode(&body, fallback);
        }

        // Error routes usually still answer with an envelope.
        if let Ok(Envelope::Failure { message }) = serde_json::from_str::<Envelope<Value>>(&body) {
            return Err(envelope::failure(message, fallback));
        }
        warn!(endpoint = path, status = status.as_u16(), "non-success response");
        Err(ClientError::Status { status: status.as_u16(), body })
    }
}

fn parse_base_url(base_url: &str) -> Result<Url, ClientError> {
    let url = Url::parse(base_url).map_err(|e| ClientError::InvalidUrl(format!("{base_url}: {e}")))?;
    if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
        return Err(ClientError::InvalidUrl(base_url.to_string()));
    }
    Ok(url)
}

/// Append path segments to `base`, percent-encoding each one.
pub(crate) fn endpoint(base: &Url, segments: &[&str]) -> Result<Url, ClientError> {
    let mut url = base.clone();
    url.set_query(None);
    url.set_fragment(None);
    url.path_segments_mut()
        .map_err(|_| ClientError::InvalidUrl(base.to_string()))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

#[async_trait]
impl WorkflowApi for WorkflowClient {
    async fn initialize(
        &self,
        auto_start: bool,
        user_request: Option<&str>,
    ) -> Result<Initialized, ClientError> {
        let mut body = json!({ "auto_start": auto_start });
        if let Some(req) = user_request {
            body["user_request"] = json!(req);
        }
        self.post("initialize_workflow", &body, "Initialization failed").await
    }

    async fn switch_agent(&self, agent: &AgentId) -> Result<AgentSwitched, ClientError> {
        let body = json!({ "agent_id": agent.as_str() });
        self.post("switch_agent", &body, "Failed to switch agent").await
    }

    async fn submit_turn(&self, user_input: &str) -> Result<TurnStarted, ClientError> {
        let body = json!({ "user_input": user_input });
        self.post("stream_agent_response", &body, "Error processing request").await
    }

    async fn complete_task(&self, task_number: usize) -> Result<Acknowledged, ClientError> {
        let body = json!({ "task_id": task_number });
        self.post("complete_task", &body, "Failed to mark task complete").await
    }

    async fn todo_list(&self) -> Result<Vec<TodoItem>, ClientError> {
        let p: TodoListPayload = self.get("get_todo_list", &[], "Failed to load to-do list").await?;
        Ok(p.todo_items)
    }

    async fn browse_files(&self, path: Option<&str>) -> Result<Vec<FileEntry>, ClientError> {
        let query: Vec<(&str, &str)> = path.map(|p| ("path", p)).into_iter().collect();
        let p: FilesPayload = self.get("browse_files", &query, "Failed to browse files").await?;
        Ok(p.files)
    }

    async fn read_file(&self, path: &str) -> Result<String, ClientError> {
        let p: FileContentPayload =
            self.get("read_file", &[("path", path)], "Failed to read file").await?;
        Ok(p.content)
    }

    async fn execute_command(&self, command: &str) -> Result<String, ClientError> {
        let body = json!({ "command": command });
        let p: CommandOutputPayload =
            self.post("execute_command", &body, "Failed to execute command").await?;
        Ok(p.output)
    }

    async fn system_info(&self) -> Result<SystemInfo, ClientError> {
        let p: SystemInfoPayload =
            self.get("get_system_info", &[], "Failed to get system info").await?;
        Ok(p.into_inner())
    }

    async fn cleanup(&self) -> Result<Acknowledged, ClientError> {
        self.post("cleanup", &json!({}), "Failed to clean up resources").await
    }
}

#[async_trait]
impl StreamTransport for WorkflowClient {
    fn name(&self) -> &str {
        self.stream.name()
    }

    async fn open(&self, response_id: &str) -> Result<TurnStream, ClientError> {
        self.stream.open(response_id).await
    }
}
