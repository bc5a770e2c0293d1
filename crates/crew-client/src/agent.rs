// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Agent identifiers and their display names.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A backend persona in the workflow.
///
/// The backend may grow agents the client does not know yet; those arrive as
/// [`AgentId::Other`] and are displayed by their raw identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AgentId {
    #[default]
    Analyst,
    Ceo,
    Writer,
    Programmer,
    Reviewer,
    WebSearcher,
    FileOrganizer,
    Other(String),
}

impl AgentId {
    /// Every agent the switcher offers, in display order.
    pub const KNOWN: [AgentId; 7] = [
        AgentId::Analyst,
        AgentId::Ceo,
        AgentId::Writer,
        AgentId::Programmer,
        AgentId::Reviewer,
        AgentId::WebSearcher,
        AgentId::FileOrganizer,
    ];

    /// Wire identifier sent to and received from the backend.
    pub fn as_str(&self) -> &str {
        match self {
            AgentId::Analyst => "analyst",
            AgentId::Ceo => "ceo",
            AgentId::Writer => "writer",
            AgentId::Programmer => "programmer",
            AgentId::Reviewer => "reviewer",
            AgentId::WebSearcher => "web_searcher",
            AgentId::FileOrganizer => "file_organizer",
            AgentId::Other(id) => id,
        }
    }

    /// Human-readable name shown in headers, the status line and the switcher.
    pub fn display_name(&self) -> &str {
        match self {
            AgentId::Analyst => "Analyst",
            AgentId::Ceo => "CEO",
            AgentId::Writer => "Writer",
            AgentId::Programmer => "Programmer",
            AgentId::Reviewer => "Reviewer",
            AgentId::WebSearcher => "Web Searcher",
            AgentId::FileOrganizer => "File Organizer",
            AgentId::Other(id) => id,
        }
    }

    /// Position in [`AgentId::KNOWN`], or `None` for unknown agents.
    pub fn switcher_index(&self) -> Option<usize> {
        AgentId::KNOWN.iter().position(|a| a == self)
    }
}

impl From<&str> for AgentId {
    fn from(s: &str) -> Self {
        match s {
            "analyst" => AgentId::Analyst,
            "ceo" => AgentId::Ceo,
            "writer" => AgentId::Writer,
            "programmer" => AgentId::Programmer,
            "reviewer" => AgentId::Reviewer,
            "web_searcher" => AgentId::WebSearcher,
            "file_organizer" => AgentId::FileOrganizer,
            other => AgentId::Other(other.to_string()),
        }
    }
}

impl From<String> for AgentId {
    fn from(s: String) -> Self {
        match AgentId::from(s.as_str()) {
            AgentId::Other(_) => AgentId::Other(s),
            known => known,
        }
    }
}

impl From<AgentId> for String {
    fn from(a: AgentId) -> Self {
        match a {
            AgentId::Other(id) => id,
            known => known.as_str().to_string(),
        }
    }
}

impl FromStr for AgentId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(AgentId::from(s))
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}
