// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Session-level state: the current agent, the turn phase and the to-do
//! snapshot.
//!
//! `SessionState` is the single source of truth for all three.  Every
//! transition goes through its methods; only the UI task holds it, so stream
//! fragments and request results are applied in the order they arrive.

use crew_client::{AgentId, TodoItem};

/// Where the conversation is within one turn.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TurnPhase {
    #[default]
    Idle,
    /// A turn was submitted; waiting for the backend to hand out a stream id.
    AwaitingResponse,
    /// Fragments for `response_id` are being appended to chat segment
    /// `segment`.
    Streaming { response_id: String, segment: usize },
}

/// Returned when a turn is started while another one is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnBusy;

#[derive(Debug, Default)]
pub struct SessionState {
    pub current_agent: AgentId,
    pub phase: TurnPhase,
    pub todos: Vec<TodoItem>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Input is accepted only between turns.
    pub fn input_enabled(&self) -> bool {
        self.phase == TurnPhase::Idle
    }

    pub fn is_busy(&self) -> bool {
        !self.input_enabled()
    }

    /// `Idle → AwaitingResponse`.
    pub fn begin_submit(&mut self) -> Result<(), TurnBusy> {
        if self.is_busy() {
            return Err(TurnBusy);
        }
        self.phase = TurnPhase::AwaitingResponse;
        Ok(())
    }

    /// Attach to a stream.  Valid from `AwaitingResponse` (after a submit) or
    /// from `Idle` (the opening stream handed out at initialization).
    pub fn start_streaming(
        &mut self,
        response_id: impl Into<String>,
        segment: usize,
    ) -> Result<(), TurnBusy> {
        if matches!(self.phase, TurnPhase::Streaming { .. }) {
            return Err(TurnBusy);
        }
        self.phase = TurnPhase::Streaming { response_id: response_id.into(), segment };
        Ok(())
    }

    /// Chat segment receiving fragments for `response_id`, if that stream is
    /// the active one.
    pub fn streaming_segment(&self, response_id: &str) -> Option<usize> {
        match &self.phase {
            TurnPhase::Streaming { response_id: id, segment } if id == response_id => Some(*segment),
            _ => None,
        }
    }

    /// Return to `Idle`.  `true` only for the call that actually ended the
    /// turn, so input is re-enabled exactly once.
    pub fn finish_turn(&mut self) -> bool {
        if self.phase == TurnPhase::Idle {
            return false;
        }
        self.phase = TurnPhase::Idle;
        true
    }

    pub fn set_current_agent(&mut self, agent: AgentId) {
        self.current_agent = agent;
    }

    /// Replace the to-do snapshot wholesale.
    pub fn replace_todos(&mut self, items: Vec<TodoItem>) {
        self.todos = items;
    }

    /// Text of the status line.
    pub fn status_label(&self) -> String {
        format!("Current agent: {}", self.current_agent.display_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crew_client::TodoStatus;

    #[test]
    fn new_session_is_idle_with_default_agent() {
        let s = SessionState::new();
        assert!(s.input_enabled());
        assert_eq!(s.current_agent, AgentId::Analyst);
        assert_eq!(s.status_label(), "Current agent: Analyst");
    }

    #[test]
    fn submit_while_busy_is_rejected() {
        let mut s = SessionState::new();
        s.begin_submit().unwrap();
        assert_eq!(s.begin_submit(), Err(TurnBusy));
        s.start_streaming("r1", 0).unwrap();
        assert_eq!(s.begin_submit(), Err(TurnBusy));
        assert!(!s.input_enabled());
    }

    #[test]
    fn streaming_segment_matches_only_active_id() {
        let mut s = SessionState::new();
        s.begin_submit().unwrap();
        s.start_streaming("r1", 3).unwrap();
        assert_eq!(s.streaming_segment("r1"), Some(3));
        assert_eq!(s.streaming_segment("old"), None);
    }

    #[test]
    fn finish_turn_reports_transition_once() {
        let mut s = SessionState::new();
        s.begin_submit().unwrap();
        s.start_streaming("r1", 0).unwrap();
        assert!(s.finish_turn());
        assert!(!s.finish_turn());
        assert!(s.input_enabled());
    }

    #[test]
    fn opening_stream_can_start_from_idle() {
        let mut s = SessionState::new();
        s.start_streaming("init", 0).unwrap();
        assert!(s.is_busy());
        assert_eq!(s.start_streaming("again", 1), Err(TurnBusy));
    }

    #[test]
    fn replace_todos_swaps_whole_snapshot() {
        let mut s = SessionState::new();
        s.replace_todos(vec![TodoItem {
            id: None,
            agent: AgentId::Writer,
            description: "draft".into(),
            status: TodoStatus::Pending,
        }]);
        assert_eq!(s.todos.len(), 1);
        s.replace_todos(Vec::new());
        assert!(s.todos.is_empty());
    }

    #[test]
    fn status_label_follows_agent_switch() {
        let mut s = SessionState::new();
        s.set_current_agent(AgentId::Ceo);
        assert_eq!(s.status_label(), "Current agent: CEO");
    }
}
