// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Controller behaviour against a fake backend and scripted streams.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use crew_client::{
    Acknowledged, AgentId, AgentSwitched, ClientError, Completion, FileEntry, FileKind,
    Initialized, ScriptItem, ScriptedTransport, StreamEvent, SystemInfo, TodoItem, TodoStatus,
    TurnStarted, WorkflowApi,
};
use crew_config::Config;
use crew_tui::keys::Action;
use crew_tui::overlay::Overlay;
use crew_tui::{AppOptions, ChatSegment, Controller, ControllerEvent, Focus};
use pretty_assertions::assert_eq;
use tokio::sync::mpsc;

// ── Fake backend ──────────────────────────────────────────────────────────────

#[derive(Default)]
struct FakeApi {
    calls: Mutex<Vec<String>>,
    init: Mutex<Initialized>,
    submit_error: Mutex<Option<String>>,
    todos: Mutex<Vec<TodoItem>>,
    files: Mutex<HashMap<Option<String>, Vec<FileEntry>>>,
}

impl FakeApi {
    fn record(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn count(&self, prefix: &str) -> usize {
        self.calls().iter().filter(|c| c.starts_with(prefix)).count()
    }
}

#[async_trait]
impl WorkflowApi for FakeApi {
    async fn initialize(&self, auto_start: bool, _req: Option<&str>) -> Result<Initialized, ClientError> {
        self.record(format!("initialize:{auto_start}"));
        Ok(self.init.lock().unwrap().clone())
    }

    async fn switch_agent(&self, agent: &AgentId) -> Result<AgentSwitched, ClientError> {
        self.record(format!("switch_agent:{}", agent.as_str()));
        Ok(AgentSwitched::default())
    }

    async fn submit_turn(&self, user_input: &str) -> Result<TurnStarted, ClientError> {
        self.record(format!("submit_turn:{user_input}"));
        if let Some(message) = self.submit_error.lock().unwrap().clone() {
            return Err(ClientError::Api { message });
        }
        let n = self.count("submit_turn");
        Ok(TurnStarted { response_id: format!("r{n}"), agent: None, agent_name: None })
    }

    async fn complete_task(&self, task_number: usize) -> Result<Acknowledged, ClientError> {
        self.record(format!("complete_task:{task_number}"));
        if let Some(item) = self.todos.lock().unwrap().get_mut(task_number - 1) {
            item.status = TodoStatus::Completed;
        }
        Ok(Acknowledged { message: Some(format!("Task {task_number} marked complete")) })
    }

    async fn todo_list(&self) -> Result<Vec<TodoItem>, ClientError> {
        self.record("todo_list");
        Ok(self.todos.lock().unwrap().clone())
    }

    async fn browse_files(&self, path: Option<&str>) -> Result<Vec<FileEntry>, ClientError> {
        self.record(format!("browse_files:{}", path.unwrap_or("")));
        let key = path.map(str::to_string);
        Ok(self.files.lock().unwrap().get(&key).cloned().unwrap_or_default())
    }

    async fn read_file(&self, path: &str) -> Result<String, ClientError> {
        self.record(format!("read_file:{path}"));
        Ok("print('hi')\n".into())
    }

    async fn execute_command(&self, command: &str) -> Result<String, ClientError> {
        self.record(format!("execute_command:{command}"));
        Ok("a.txt\nb.txt\n".into())
    }

    async fn system_info(&self) -> Result<SystemInfo, ClientError> {
        self.record("system_info");
        Err(ClientError::Decode("bad".into()))
    }

    async fn cleanup(&self) -> Result<Acknowledged, ClientError> {
        self.record("cleanup");
        Ok(Acknowledged::default())
    }
}

// ── Harness ───────────────────────────────────────────────────────────────────

struct Harness {
    api: Arc<FakeApi>,
    transport: ScriptedTransport,
    controller: Controller,
    rx: mpsc::Receiver<ControllerEvent>,
}

fn harness_with(api: FakeApi, scripts: Vec<Vec<ScriptItem>>, config: Config) -> Harness {
    let api = Arc::new(api);
    let transport = ScriptedTransport::new(scripts);
    let options = AppOptions { auto_start: true, user_request: None };
    let (controller, rx) =
        Controller::new(api.clone(), Arc::new(transport.clone()), &config, options);
    Harness { api, transport, controller, rx }
}

fn harness(scripts: Vec<Vec<ScriptItem>>) -> Harness {
    harness_with(FakeApi::default(), scripts, Config::default())
}

impl Harness {
    /// Apply the next controller event.
    async fn pump(&mut self) {
        let event = tokio::time::timeout(Duration::from_secs(2), self.rx.recv())
            .await
            .expect("timed out waiting for controller event")
            .expect("event channel closed");
        self.controller.handle_event(event);
    }

    async fn pump_until_idle(&mut self) {
        while self.controller.session().is_busy() {
            self.pump().await;
        }
    }

    fn send(&mut self, text: &str) {
        self.controller.set_input(text);
        self.controller.dispatch(Action::Submit);
    }

    fn last_note(&self) -> Option<String> {
        self.controller.notifications().latest().map(|n| n.text.clone())
    }

    fn agent_text(&self, index: usize) -> String {
        match &self.controller.segments()[index] {
            ChatSegment::Agent { text, .. } => text.clone(),
            other => panic!("segment {index} is not an agent response: {other:?}"),
        }
    }
}

fn fragment(s: &str) -> ScriptItem {
    StreamEvent::Fragment(s.into()).into()
}

fn completed(c: Completion) -> ScriptItem {
    StreamEvent::Completed(c).into()
}

fn todo(agent: AgentId, description: &str) -> TodoItem {
    TodoItem { id: None, agent, description: description.into(), status: TodoStatus::Pending }
}

// ── Turns ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn input_stays_disabled_until_stream_completes() {
    let mut h = harness(vec![vec![fragment("A"), fragment("B"), completed(Completion::default())]]);

    h.send("  hi  ");
    assert!(!h.controller.session().input_enabled());
    assert_eq!(h.controller.input().as_str(), "");
    assert_eq!(h.controller.segments()[0], ChatSegment::User("hi".into()));

    h.pump().await; // Submitted
    assert!(!h.controller.session().input_enabled());

    h.pump_until_idle().await;
    assert!(h.controller.session().input_enabled());
    assert_eq!(h.agent_text(1), "AB");
    assert!(matches!(
        &h.controller.segments()[1],
        ChatSegment::Agent { header, streaming: false, .. } if header == "Analyst"
    ));
    assert_eq!(h.api.calls(), vec!["submit_turn:hi"]);
    assert_eq!(h.transport.opened_ids(), vec!["r1"]);
}

#[tokio::test]
async fn whitespace_input_sends_nothing() {
    let mut h = harness(vec![]);
    h.send("   \t ");
    tokio::task::yield_now().await;
    assert!(h.controller.segments().is_empty());
    assert!(h.controller.session().input_enabled());
    assert!(h.rx.try_recv().is_err());
    assert!(h.api.calls().is_empty());
}

#[tokio::test]
async fn completion_hands_over_to_next_agent() {
    let completion = Completion {
        next_agent: Some(AgentId::Ceo),
        next_agent_name: Some("CEO".into()),
        todo_items: Some(vec![todo(AgentId::Ceo, "approve plan")]),
    };
    let mut h = harness(vec![vec![completed(completion)]]);
    h.send("plan it");
    h.pump_until_idle().await;

    let session = h.controller.session();
    assert_eq!(session.current_agent, AgentId::Ceo);
    assert_eq!(session.status_label(), "Current agent: CEO");
    assert_eq!(session.current_agent.switcher_index(), Some(1));
    assert_eq!(session.todos.len(), 1);
    assert_eq!(h.agent_text(1), "");
}

#[tokio::test]
async fn broken_stream_reenables_input_exactly_once() {
    let mut h = harness(vec![vec![fragment("partial"), ScriptItem::Close]]);
    h.send("go");
    h.pump_until_idle().await;

    assert!(h.controller.session().input_enabled());
    assert_eq!(h.agent_text(1), "partial\n\nConnection interrupted, please retry.");

    // A late failure for the same stream changes nothing.
    h.controller.handle_event(ControllerEvent::Stream {
        response_id: "r1".into(),
        item: Err(ClientError::StreamClosed),
    });
    assert_eq!(h.agent_text(1), "partial\n\nConnection interrupted, please retry.");
    assert!(h.controller.session().input_enabled());
}

#[tokio::test]
async fn stream_that_fails_to_open_is_interrupted() {
    // No scripts: opening the stream fails.
    let mut h = harness(vec![]);
    h.send("go");
    h.pump_until_idle().await;
    assert_eq!(h.agent_text(1), "Connection interrupted, please retry.");
}

#[tokio::test]
async fn rejected_submit_shows_server_message() {
    let api = FakeApi::default();
    *api.submit_error.lock().unwrap() = Some("Invalid input".into());
    let mut h = harness_with(api, vec![], Config::default());
    h.send("hello");
    h.pump().await;

    assert!(h.controller.session().input_enabled());
    assert_eq!(h.controller.segments()[1], ChatSegment::Error("Invalid input".into()));
}

#[tokio::test]
async fn second_send_while_streaming_is_rejected() {
    let mut h = harness(vec![vec![fragment("x")]]);
    h.send("first");
    h.pump().await; // Submitted: now streaming

    h.send("second");
    assert_eq!(h.api.count("submit_turn"), 1);
    assert_eq!(h.last_note().as_deref(), Some("An agent is still responding"));
    // The rejected text stays in the input.
    assert_eq!(h.controller.input().as_str(), "second");
}

#[tokio::test]
async fn events_for_other_streams_are_ignored() {
    let mut h = harness(vec![vec![fragment("x")]]);
    h.send("first");
    h.pump().await;

    h.controller.handle_event(ControllerEvent::Stream {
        response_id: "stale".into(),
        item: Ok(StreamEvent::Fragment("zzz".into())),
    });
    assert_eq!(h.agent_text(1), "");
}

#[tokio::test]
async fn opening_stream_from_initialization_is_consumed_as_a_turn() {
    let api = FakeApi::default();
    *api.init.lock().unwrap() = Initialized {
        response_id: Some("init-1".into()),
        current_agent: Some(AgentId::Writer),
        message: None,
    };
    let script = vec![fragment("Hello"), completed(Completion::default())];
    let mut h = harness_with(api, vec![script], Config::default());

    h.controller.initialize();
    h.pump().await;
    assert!(!h.controller.session().input_enabled());
    h.pump_until_idle().await;

    assert_eq!(h.api.calls(), vec!["initialize:true"]);
    assert_eq!(h.transport.opened_ids(), vec!["init-1"]);
    assert!(matches!(
        &h.controller.segments()[0],
        ChatSegment::Agent { agent: AgentId::Writer, header, text, .. }
            if header == "Writer" && text == "Hello"
    ));
}

// ── Toolbar ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn switching_agent_updates_label_and_notifies() {
    let mut h = harness(vec![]);
    h.controller.dispatch(Action::SwitchAgent(2));
    h.pump().await;
    assert_eq!(h.controller.session().current_agent, AgentId::Writer);
    assert_eq!(h.last_note().as_deref(), Some("Switched to Writer"));
    assert_eq!(h.api.calls(), vec!["switch_agent:writer"]);
}

#[tokio::test]
async fn completing_a_task_refetches_the_list() {
    let api = FakeApi::default();
    *api.todos.lock().unwrap() = vec![todo(AgentId::Writer, "draft"), todo(AgentId::Reviewer, "review")];
    let mut h = harness_with(api, vec![], Config::default());

    h.controller.dispatch(Action::RefreshTodos);
    h.pump().await;
    h.controller.dispatch(Action::CycleFocus);
    assert_eq!(h.controller.focus(), Focus::Todo);
    h.controller.dispatch(Action::TodoDown);
    h.controller.dispatch(Action::CompleteTodo);
    h.pump().await; // TaskCompleted
    assert_eq!(h.last_note().as_deref(), Some("Task 2 marked complete"));
    h.pump().await; // TodoList

    assert_eq!(h.api.calls(), vec!["todo_list", "complete_task:2", "todo_list"]);
    assert!(h.controller.session().todos[1].is_completed());

    // Completed items are not sent again.
    h.controller.dispatch(Action::CompleteTodo);
    tokio::task::yield_now().await;
    assert_eq!(h.api.count("complete_task"), 1);
}

fn api_with_tree() -> FakeApi {
    let api = FakeApi::default();
    {
        let mut files = api.files.lock().unwrap();
        files.insert(
            None,
            vec![
                FileEntry { name: "docs".into(), kind: FileKind::Directory, path: "/srv/docs".into() },
                FileEntry { name: "a.py".into(), kind: FileKind::File, path: "/srv/a.py".into() },
            ],
        );
        files.insert(
            Some("/srv/docs".into()),
            vec![FileEntry { name: "x.md".into(), kind: FileKind::File, path: "/srv/docs/x.md".into() }],
        );
    }
    api
}

fn browser_depth(h: &Harness) -> usize {
    match h.controller.overlay() {
        Some(Overlay::FileBrowser(b)) => b.depth(),
        _ => panic!("file browser should be open"),
    }
}

#[tokio::test]
async fn file_browser_descends_returns_and_attaches_file() {
    let mut h = harness_with(api_with_tree(), vec![], Config::default());

    h.controller.dispatch(Action::BrowseFiles);
    h.pump().await;
    h.controller.dispatch(Action::ModalSelect); // docs
    h.pump().await;
    match h.controller.overlay() {
        Some(Overlay::FileBrowser(b)) => {
            assert_eq!(b.depth(), 2);
            assert_eq!(b.title(), "Files: /srv/docs");
        }
        _ => panic!("file browser should be open"),
    }

    h.controller.dispatch(Action::ModalBack);
    h.controller.dispatch(Action::ModalDown);
    h.controller.dispatch(Action::ModalSelect); // a.py
    assert!(h.controller.overlay().is_none());
    h.pump().await;

    assert_eq!(
        h.controller.segments()[0],
        ChatSegment::File { name: "a.py".into(), language: "python", content: "print('hi')\n".into() }
    );
    assert_eq!(h.last_note().as_deref(), Some("Added file: a.py"));
    assert_eq!(h.api.calls(), vec!["browse_files:", "browse_files:/srv/docs", "read_file:/srv/a.py"]);
}

#[tokio::test]
async fn repeated_enter_while_listing_loads_requests_once() {
    let mut h = harness_with(api_with_tree(), vec![], Config::default());

    h.controller.dispatch(Action::BrowseFiles);
    h.pump().await;
    h.controller.dispatch(Action::ModalSelect); // docs
    h.controller.dispatch(Action::ModalSelect);
    h.pump().await;

    assert_eq!(browser_depth(&h), 2);
    h.controller.dispatch(Action::ModalBack);
    match h.controller.overlay() {
        Some(Overlay::FileBrowser(b)) => assert_eq!(b.title(), "Files"),
        _ => panic!("file browser should be open"),
    }
    assert_eq!(h.api.calls(), vec!["browse_files:", "browse_files:/srv/docs"]);
}

#[tokio::test]
async fn listing_for_a_closed_browser_is_not_shown_in_the_next_one() {
    let mut h = harness_with(api_with_tree(), vec![], Config::default());

    h.controller.dispatch(Action::BrowseFiles);
    h.controller.dispatch(Action::CloseModals);
    h.controller.dispatch(Action::BrowseFiles);
    h.pump().await;
    h.pump().await;

    assert_eq!(browser_depth(&h), 1);
    assert_eq!(h.api.count("browse_files"), 2);
}

#[tokio::test]
async fn terminal_command_requires_input_then_runs() {
    let mut h = harness(vec![]);
    h.controller.dispatch(Action::TerminalCommand);
    h.controller.dispatch(Action::ModalSelect);
    assert_eq!(h.last_note().as_deref(), Some("Please enter a command"));
    assert!(matches!(h.controller.overlay(), Some(Overlay::Command(_))));

    for c in "ls".chars() {
        h.controller.dispatch(Action::ModalChar(c));
    }
    h.controller.dispatch(Action::ModalSelect);
    assert!(h.controller.overlay().is_none());
    h.pump().await;

    assert_eq!(
        h.controller.segments()[0],
        ChatSegment::Terminal { command: "ls".into(), output: "a.txt\nb.txt\n".into() }
    );
}

#[tokio::test]
async fn transport_failure_notifies_generic_retry() {
    let mut h = harness(vec![]);
    h.controller.dispatch(Action::SystemInfo);
    h.pump().await;
    assert_eq!(h.last_note().as_deref(), Some("Network error, please retry"));
    assert!(h.controller.segments().is_empty());
}

#[tokio::test]
async fn escape_closes_every_modal() {
    let mut h = harness(vec![]);
    h.controller.dispatch(Action::TerminalCommand);
    h.controller.dispatch(Action::Help);
    h.controller.dispatch(Action::CloseModals);
    assert!(h.controller.overlay().is_none());
    assert!(!h.controller.help_visible());
    assert!(h.controller.modal().is_none());
}

// ── Export ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn export_writes_dated_markdown_document() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = Config::default();
    config.export.directory = Some(dir.path().join("out").display().to_string());
    let script = vec![fragment("Hello! How can I help?"), completed(Completion::default())];
    let mut h = harness_with(FakeApi::default(), vec![script], config);

    h.send("hi");
    h.pump_until_idle().await;

    let date = chrono::NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
    let path = h.controller.export_to(date).unwrap();
    assert_eq!(path, dir.path().join("out").join("conversation_2024-05-01.md"));
    assert_eq!(
        std::fs::read_to_string(&path).unwrap(),
        "# Multi-agent workflow conversation history\n\n\
         ## User\n\nhi\n\n---\n\n\
         ## Analyst\n\nHello! How can I help?\n\n---\n\n"
    );

    h.controller.dispatch(Action::Export);
    let note = h.last_note().unwrap();
    assert!(note.starts_with("Conversation history exported to "), "{note}");
}
