// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Turns key actions into backend calls and backend results into state.
//!
//! Every network call runs in a spawned task and reports back through the
//! [`ControllerEvent`] channel.  The controller itself only ever runs on the
//! UI task, which is the sole writer of [`SessionState`] and the chat log.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use crew_client::{
    Acknowledged, AgentId, AgentSwitched, ClientError, FileEntry, Initialized, StreamEvent,
    StreamTransport, SystemInfo, TodoItem, TurnStarted, WorkflowApi,
};
use crew_config::Config;
use futures::StreamExt;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::chat::markdown::{export_file_name, export_markdown, language_for};
use crate::chat::segment::{append_fragment, finalize_response, interrupt_response, ChatSegment};
use crate::input::InputBuffer;
use crate::keys::{Action, Modal};
use crate::notify::Notifications;
use crate::overlay::{command::CommandPrompt, file_browser::FileBrowser, Overlay};
use crate::state::SessionState;

/// Capacity of the controller event channel.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Which pane currently holds keyboard focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    #[default]
    Input,
    Todo,
    Chat,
}

impl Focus {
    /// Tab order: input → to-do → chat → input.
    pub fn next(self) -> Self {
        match self {
            Focus::Input => Focus::Todo,
            Focus::Todo => Focus::Chat,
            Focus::Chat => Focus::Input,
        }
    }
}

/// Options passed when constructing the TUI app.
#[derive(Debug, Clone)]
pub struct AppOptions {
    /// Ask the backend for an opening response at startup.
    pub auto_start: bool,
    /// Initial request forwarded with the initialization call.
    pub user_request: Option<String>,
}

impl AppOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            auto_start: config.server.auto_start,
            user_request: config.server.user_request.clone(),
        }
    }
}

/// Result of a spawned backend call, delivered to the UI task.
#[derive(Debug)]
pub enum ControllerEvent {
    Initialized(Result<Initialized, ClientError>),
    Submitted(Result<TurnStarted, ClientError>),
    /// One item of the event stream for `response_id`.
    Stream { response_id: String, item: Result<StreamEvent, ClientError> },
    AgentSwitched { agent: AgentId, result: Result<AgentSwitched, ClientError> },
    TaskCompleted(Result<Acknowledged, ClientError>),
    TodoList(Result<Vec<TodoItem>, ClientError>),
    Files { request: u64, path: Option<String>, result: Result<Vec<FileEntry>, ClientError> },
    FileRead { name: String, path: String, result: Result<String, ClientError> },
    CommandDone { command: String, result: Result<String, ClientError> },
    SystemInfo(Result<SystemInfo, ClientError>),
}

pub struct Controller {
    api: Arc<dyn WorkflowApi>,
    transport: Arc<dyn StreamTransport>,
    tx: mpsc::Sender<ControllerEvent>,
    options: AppOptions,
    export_dir: PathBuf,
    export_prefix: String,

    session: SessionState,
    segments: Vec<ChatSegment>,
    /// Bumped whenever `segments` changes so the view knows to re-render.
    revision: u64,
    input: InputBuffer,
    notifications: Notifications,
    overlay: Option<Overlay>,
    help_visible: bool,
    focus: Focus,
    todo_selected: usize,
    /// Id handed to the next file listing request.
    next_listing: u64,
}

impl Controller {
    pub fn new(
        api: Arc<dyn WorkflowApi>,
        transport: Arc<dyn StreamTransport>,
        config: &Config,
        options: AppOptions,
    ) -> (Self, mpsc::Receiver<ControllerEvent>) {
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let controller = Self {
            api,
            transport,
            tx,
            options,
            export_dir: config.export.resolved_directory(),
            export_prefix: config.export.file_prefix.clone(),
            session: SessionState::new(),
            segments: Vec::new(),
            revision: 0,
            input: InputBuffer::default(),
            notifications: Notifications::new(Duration::from_secs(config.tui.notification_secs)),
            overlay: None,
            help_visible: false,
            focus: Focus::Input,
            todo_selected: 0,
            next_listing: 0,
        };
        (controller, rx)
    }

    // ── Accessors ────────────────────────────────────────────────────────────

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn segments(&self) -> &[ChatSegment] {
        &self.segments
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn input(&self) -> &InputBuffer {
        &self.input
    }

    /// Replace the input text, as if typed.
    pub fn set_input(&mut self, text: &str) {
        self.input.set(text);
    }

    pub fn notifications(&self) -> &Notifications {
        &self.notifications
    }

    pub fn notifications_mut(&mut self) -> &mut Notifications {
        &mut self.notifications
    }

    pub fn overlay(&self) -> Option<&Overlay> {
        self.overlay.as_ref()
    }

    pub fn help_visible(&self) -> bool {
        self.help_visible
    }

    pub fn focus(&self) -> Focus {
        self.focus
    }

    pub fn todo_selected(&self) -> usize {
        self.todo_selected
    }

    /// The modal that receives keys first, if any.
    pub fn modal(&self) -> Option<Modal> {
        if self.help_visible {
            return Some(Modal::Help);
        }
        match self.overlay {
            Some(Overlay::FileBrowser(_)) => Some(Modal::FileBrowser),
            Some(Overlay::Command(_)) => Some(Modal::Command),
            None => None,
        }
    }

    // ── Entry points ─────────────────────────────────────────────────────────

    /// Start the workflow.  A returned opening stream is consumed like a turn.
    pub fn initialize(&mut self) {
        let api = Arc::clone(&self.api);
        let auto_start = self.options.auto_start;
        let user_request = self.options.user_request.clone();
        self.spawn(async move {
            ControllerEvent::Initialized(api.initialize(auto_start, user_request.as_deref()).await)
        });
    }

    /// Apply one key action.  Returns `false` when the app should quit.
    pub fn dispatch(&mut self, action: Action) -> bool {
        match action {
            Action::Quit => return false,
            Action::Help => self.help_visible = !self.help_visible,
            Action::CloseModals => {
                self.help_visible = false;
                self.overlay = None;
            }
            Action::CycleFocus => self.focus = self.focus.next(),

            // Scrolling is owned by the view.
            Action::ScrollUp | Action::ScrollDown | Action::ScrollPageUp | Action::ScrollPageDown => {}

            Action::InputChar(c) => self.edit_input(|b| b.insert(c)),
            Action::InputBackspace => self.edit_input(InputBuffer::backspace),
            Action::InputDelete => self.edit_input(InputBuffer::delete),
            Action::InputMoveCursorLeft => self.edit_input(InputBuffer::left),
            Action::InputMoveCursorRight => self.edit_input(InputBuffer::right),
            Action::InputMoveLineStart => self.edit_input(InputBuffer::home),
            Action::InputMoveLineEnd => self.edit_input(InputBuffer::end),
            Action::Submit => self.submit(),

            Action::TodoUp => self.todo_selected = self.todo_selected.saturating_sub(1),
            Action::TodoDown => {
                if self.todo_selected + 1 < self.session.todos.len() {
                    self.todo_selected += 1;
                }
            }
            Action::CompleteTodo => self.complete_selected_todo(),

            Action::BrowseFiles => {
                let request = self.listing_request();
                self.overlay = Some(Overlay::FileBrowser(FileBrowser::opening(request)));
                self.browse(request, None);
            }
            Action::TerminalCommand => {
                self.overlay = Some(Overlay::Command(CommandPrompt::default()));
            }
            Action::Export => self.export(),
            Action::SystemInfo => {
                let api = Arc::clone(&self.api);
                self.spawn(async move { ControllerEvent::SystemInfo(api.system_info().await) });
            }
            Action::RefreshTodos => self.refresh_todos(),
            Action::SwitchAgent(index) => {
                if let Some(agent) = AgentId::KNOWN.get(index) {
                    self.switch_agent(agent.clone());
                }
            }

            Action::ModalUp => {
                if let Some(Overlay::FileBrowser(b)) = self.overlay.as_mut() {
                    b.up();
                }
            }
            Action::ModalDown => {
                if let Some(Overlay::FileBrowser(b)) = self.overlay.as_mut() {
                    b.down();
                }
            }
            Action::ModalBack => {
                if let Some(Overlay::FileBrowser(b)) = self.overlay.as_mut() {
                    b.back();
                }
            }
            Action::ModalChar(c) => {
                if let Some(Overlay::Command(p)) = self.overlay.as_mut() {
                    p.buffer.insert(c);
                }
            }
            Action::ModalBackspace => {
                if let Some(Overlay::Command(p)) = self.overlay.as_mut() {
                    p.buffer.backspace();
                }
            }
            Action::ModalSelect => self.modal_select(),
        }
        true
    }

    /// Apply the result of a spawned backend call.
    pub fn handle_event(&mut self, event: ControllerEvent) {
        match event {
            ControllerEvent::Initialized(result) => self.on_initialized(result),
            ControllerEvent::Submitted(result) => self.on_submitted(result),
            ControllerEvent::Stream { response_id, item } => self.on_stream_item(&response_id, item),
            ControllerEvent::AgentSwitched { agent, result } => match result {
                Ok(switched) => {
                    let name = switched
                        .agent_name
                        .unwrap_or_else(|| agent.display_name().to_string());
                    self.session.set_current_agent(agent);
                    self.notifications.success(format!("Switched to {name}"));
                }
                Err(e) => self.report(&e),
            },
            ControllerEvent::TaskCompleted(result) => match result {
                Ok(ack) => {
                    self.notifications
                        .success(ack.message.unwrap_or_else(|| "Task marked complete".into()));
                    self.refresh_todos();
                }
                Err(e) => self.report(&e),
            },
            ControllerEvent::TodoList(result) => match result {
                Ok(items) => self.replace_todos(items),
                Err(e) => self.report(&e),
            },
            ControllerEvent::Files { request, path, result } => self.on_files(request, path, result),
            ControllerEvent::FileRead { name, path, result } => match result {
                Ok(content) => {
                    self.push_segment(ChatSegment::File {
                        language: language_for(&path),
                        name: name.clone(),
                        content,
                    });
                    self.notifications.success(format!("Added file: {name}"));
                }
                Err(e) => self.report(&e),
            },
            ControllerEvent::CommandDone { command, result } => match result {
                Ok(output) => self.push_segment(ChatSegment::Terminal { command, output }),
                Err(e) => self.report(&e),
            },
            ControllerEvent::SystemInfo(result) => match result {
                Ok(info) => self.push_segment(ChatSegment::SystemInfo(info)),
                Err(e) => self.report(&e),
            },
        }
    }

    // ── Turns ────────────────────────────────────────────────────────────────

    fn submit(&mut self) {
        let text = self.input.as_str().trim().to_string();
        if text.is_empty() {
            return;
        }
        if self.session.begin_submit().is_err() {
            self.notifications.info("An agent is still responding");
            return;
        }
        self.input.clear();
        self.push_segment(ChatSegment::User(text.clone()));
        debug!(chars = text.len(), "submitting turn");
        let api = Arc::clone(&self.api);
        self.spawn(async move { ControllerEvent::Submitted(api.submit_turn(&text).await) });
    }

    fn on_initialized(&mut self, result: Result<Initialized, ClientError>) {
        let init = match result {
            Ok(init) => init,
            Err(e) => {
                warn!(error = %e, "workflow initialization failed");
                self.notifications.error(e.user_message());
                return;
            }
        };
        if let Some(agent) = init.current_agent {
            self.session.set_current_agent(agent);
        }
        if let Some(message) = init.message.filter(|m| !m.trim().is_empty()) {
            self.notifications.info(message);
        }
        if let Some(response_id) = init.response_id {
            if !self.session.input_enabled() {
                debug!(%response_id, "turn already active; ignoring opening stream");
                return;
            }
            let agent = self.session.current_agent.clone();
            self.attach_stream(response_id, ChatSegment::responding(agent, None));
        }
    }

    fn on_submitted(&mut self, result: Result<TurnStarted, ClientError>) {
        match result {
            Ok(started) => {
                let agent = started.agent.unwrap_or_else(|| self.session.current_agent.clone());
                let segment = ChatSegment::responding(agent, started.agent_name.as_deref());
                self.attach_stream(started.response_id, segment);
            }
            Err(e) => {
                warn!(error = %e, "submit failed");
                self.push_segment(ChatSegment::Error(e.user_message()));
                self.session.finish_turn();
            }
        }
    }

    fn attach_stream(&mut self, response_id: String, segment: ChatSegment) {
        let index = self.segments.len();
        if self.session.start_streaming(response_id.clone(), index).is_err() {
            debug!(%response_id, "stream already active; ignoring");
            return;
        }
        self.push_segment(segment);
        self.spawn_stream(response_id);
    }

    /// Forward every item of the turn stream into the event channel.  A
    /// stream that ends without a terminal item counts as closed early.
    fn spawn_stream(&self, response_id: String) {
        let transport = Arc::clone(&self.transport);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            debug!(%response_id, transport = transport.name(), "opening stream");
            let mut stream = match transport.open(&response_id).await {
                Ok(s) => s,
                Err(e) => {
                    let _ = tx.send(ControllerEvent::Stream { response_id, item: Err(e) }).await;
                    return;
                }
            };
            while let Some(item) = stream.next().await {
                let terminal = !matches!(item, Ok(StreamEvent::Fragment(_)));
                let event = ControllerEvent::Stream { response_id: response_id.clone(), item };
                if tx.send(event).await.is_err() || terminal {
                    return;
                }
            }
            let item = Err(ClientError::StreamClosed);
            let _ = tx.send(ControllerEvent::Stream { response_id, item }).await;
        });
    }

    fn on_stream_item(&mut self, response_id: &str, item: Result<StreamEvent, ClientError>) {
        let Some(index) = self.session.streaming_segment(response_id) else {
            debug!(%response_id, "event for inactive stream ignored");
            return;
        };
        match item {
            Ok(StreamEvent::Fragment(text)) => {
                if append_fragment(&mut self.segments, index, &text) {
                    self.revision += 1;
                }
            }
            Ok(StreamEvent::Completed(completion)) => {
                finalize_response(&mut self.segments, index);
                if let Some(next) = completion.next_agent {
                    self.session.set_current_agent(next);
                }
                if let Some(items) = completion.todo_items {
                    self.replace_todos(items);
                }
                self.revision += 1;
                self.session.finish_turn();
                debug!(%response_id, "turn completed");
            }
            Err(e) => {
                warn!(%response_id, error = %e, "stream failed");
                interrupt_response(&mut self.segments, index);
                self.revision += 1;
                self.session.finish_turn();
            }
        }
    }

    // ── Toolbar ──────────────────────────────────────────────────────────────

    fn switch_agent(&mut self, agent: AgentId) {
        let api = Arc::clone(&self.api);
        self.spawn(async move {
            let result = api.switch_agent(&agent).await;
            ControllerEvent::AgentSwitched { agent, result }
        });
    }

    fn complete_selected_todo(&mut self) {
        let Some(item) = self.session.todos.get(self.todo_selected) else {
            return;
        };
        if item.is_completed() {
            return;
        }
        let task_number = self.todo_selected + 1;
        let api = Arc::clone(&self.api);
        self.spawn(async move { ControllerEvent::TaskCompleted(api.complete_task(task_number).await) });
    }

    fn refresh_todos(&mut self) {
        let api = Arc::clone(&self.api);
        self.spawn(async move { ControllerEvent::TodoList(api.todo_list().await) });
    }

    fn replace_todos(&mut self, items: Vec<TodoItem>) {
        self.session.replace_todos(items);
        let len = self.session.todos.len();
        self.todo_selected = self.todo_selected.min(len.saturating_sub(1));
    }

    fn listing_request(&mut self) -> u64 {
        self.next_listing += 1;
        self.next_listing
    }

    fn browse(&mut self, request: u64, path: Option<String>) {
        let api = Arc::clone(&self.api);
        self.spawn(async move {
            let result = api.browse_files(path.as_deref()).await;
            ControllerEvent::Files { request, path, result }
        });
    }

    fn on_files(
        &mut self,
        request: u64,
        path: Option<String>,
        result: Result<Vec<FileEntry>, ClientError>,
    ) {
        let Some(Overlay::FileBrowser(browser)) = self.overlay.as_mut() else {
            debug!("file listing arrived after the browser closed");
            return;
        };
        if !browser.accept(request) {
            debug!(request, "dropping stale file listing");
            return;
        }
        match result {
            Ok(entries) => browser.show(path, entries),
            Err(e) => {
                if browser.depth() == 0 {
                    self.overlay = None;
                }
                self.report(&e);
            }
        }
    }

    fn modal_select(&mut self) {
        match self.overlay.as_mut() {
            Some(Overlay::FileBrowser(browser)) => {
                if browser.is_loading() {
                    return;
                }
                let Some(entry) = browser.selected_entry().cloned() else {
                    return;
                };
                if entry.is_dir() {
                    self.next_listing += 1;
                    let request = self.next_listing;
                    browser.request(request);
                    self.browse(request, Some(entry.path));
                } else {
                    self.overlay = None;
                    let api = Arc::clone(&self.api);
                    self.spawn(async move {
                        let result = api.read_file(&entry.path).await;
                        ControllerEvent::FileRead { name: entry.name, path: entry.path, result }
                    });
                }
            }
            Some(Overlay::Command(prompt)) => match prompt.command() {
                None => self.notifications.info("Please enter a command"),
                Some(command) => {
                    self.overlay = None;
                    let api = Arc::clone(&self.api);
                    self.spawn(async move {
                        let result = api.execute_command(&command).await;
                        ControllerEvent::CommandDone { command, result }
                    });
                }
            },
            None => {}
        }
    }

    /// Write the conversation export and notify.
    fn export(&mut self) {
        match self.export_to(chrono::Local::now().date_naive()) {
            Ok(path) => self
                .notifications
                .success(format!("Conversation history exported to {}", path.display())),
            Err(e) => {
                warn!("export failed: {e:#}");
                self.notifications.error(format!("Export failed: {e:#}"));
            }
        }
    }

    /// Write the export document dated `date` and return its path.
    pub fn export_to(&self, date: chrono::NaiveDate) -> anyhow::Result<PathBuf> {
        std::fs::create_dir_all(&self.export_dir)
            .with_context(|| format!("creating {}", self.export_dir.display()))?;
        let path = self.export_dir.join(export_file_name(&self.export_prefix, date));
        std::fs::write(&path, export_markdown(&self.segments))
            .with_context(|| format!("writing {}", path.display()))?;
        Ok(path)
    }

    // ── Helpers ──────────────────────────────────────────────────────────────

    fn edit_input(&mut self, edit: impl FnOnce(&mut InputBuffer)) {
        if self.session.input_enabled() {
            edit(&mut self.input);
        }
    }

    fn push_segment(&mut self, segment: ChatSegment) {
        self.segments.push(segment);
        self.revision += 1;
    }

    fn report(&mut self, error: &ClientError) {
        warn!(error = %error, "backend call failed");
        self.notifications.error(error.user_message());
    }

    fn spawn<F>(&self, call: F)
    where
        F: std::future::Future<Output = ControllerEvent> + Send + 'static,
    {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let _ = tx.send(call.await).await;
        });
    }
}
