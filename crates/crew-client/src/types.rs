// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use serde::{Deserialize, Serialize};

use crate::agent::AgentId;

// ── To-do list ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TodoStatus {
    #[serde(alias = "待处理")]
    Pending,
    #[serde(alias = "已完成")]
    Completed,
}

/// One backend-owned task.  The client only ever renders snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoItem {
    /// Backend-assigned number; the position in the list is authoritative
    /// when this is absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u32>,
    pub agent: AgentId,
    pub description: String,
    pub status: TodoStatus,
}

impl TodoItem {
    pub fn is_completed(&self) -> bool {
        self.status == TodoStatus::Completed
    }
}

// ── File browser ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Directory,
    File,
    /// Anything else the backend reports (symlinks, devices, ...); treated
    /// like a file when selected.
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: FileKind,
    pub path: String,
}

impl FileEntry {
    pub fn is_dir(&self) -> bool {
        self.kind == FileKind::Directory
    }
}

// ── System info ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemInfo {
    pub system: String,
    pub release: String,
    pub hostname: String,
    pub processor: String,
    pub cpu_count: u32,
    pub memory_available: u64,
    pub memory_total: u64,
    #[serde(default)]
    pub network_interfaces: Vec<String>,
}

// ── Endpoint payloads (the part of the envelope next to `status`) ────────────

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Initialized {
    #[serde(default)]
    pub response_id: Option<String>,
    #[serde(default)]
    pub current_agent: Option<AgentId>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AgentSwitched {
    #[serde(default)]
    pub agent_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TurnStarted {
    pub response_id: String,
    #[serde(default)]
    pub agent: Option<AgentId>,
    #[serde(default)]
    pub agent_name: Option<String>,
}

/// Payload of endpoints that only report a human-readable message.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Acknowledged {
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct TodoListPayload {
    #[serde(default)]
    pub todo_items: Vec<TodoItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct FilesPayload {
    #[serde(default)]
    pub files: Vec<FileEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct FileContentPayload {
    pub content: String,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct CommandOutputPayload {
    #[serde(default)]
    pub output: String,
}

/// The backend nests host stats under `system_info`; a flat layout is
/// accepted as well.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum SystemInfoPayload {
    Nested { system_info: SystemInfo },
    Flat(SystemInfo),
}

impl SystemInfoPayload {
    pub fn into_inner(self) -> SystemInfo {
        match self {
            SystemInfoPayload::Nested { system_info } => system_info,
            SystemInfoPayload::Flat(info) => info,
        }
    }
}
