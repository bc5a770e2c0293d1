// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use async_trait::async_trait;

use crate::{
    Acknowledged, AgentId, AgentSwitched, ClientError, FileEntry, Initialized, SystemInfo,
    TodoItem, TurnStarted,
};

/// Request/response surface of the workflow backend.
///
/// Every method maps to one endpoint.  Failures reported by the backend come
/// back as [`ClientError::Api`] carrying the backend message, or the
/// operation's fallback text when the backend gave none.
#[async_trait]
pub trait WorkflowApi: Send + Sync {
    /// `POST /initialize_workflow`
    async fn initialize(
        &self,
        auto_start: bool,
        user_request: Option<&str>,
    ) -> Result<Initialized, ClientError>;

    /// `POST /switch_agent`
    async fn switch_agent(&self, agent: &AgentId) -> Result<AgentSwitched, ClientError>;

    /// `POST /stream_agent_response`; the returned id names the turn's event
    /// stream.
    async fn submit_turn(&self, user_input: &str) -> Result<TurnStarted, ClientError>;

    /// `POST /complete_task` with the 1-based task number.
    async fn complete_task(&self, task_number: usize) -> Result<Acknowledged, ClientError>;

    /// `GET /get_todo_list`
    async fn todo_list(&self) -> Result<Vec<TodoItem>, ClientError>;

    /// `GET /browse_files?path=`; `None` lists the backend's default root.
    async fn browse_files(&self, path: Option<&str>) -> Result<Vec<FileEntry>, ClientError>;

    /// `GET /read_file?path=`
    async fn read_file(&self, path: &str) -> Result<String, ClientError>;

    /// `POST /execute_command`; returns the captured output.
    async fn execute_command(&self, command: &str) -> Result<String, ClientError>;

    /// `GET /get_system_info`
    async fn system_info(&self) -> Result<SystemInfo, ClientError>;

    /// `POST /cleanup`
    async fn cleanup(&self) -> Result<Acknowledged, ClientError>;
}
