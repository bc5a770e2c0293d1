// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Backend file browser modal.
//!
//! Each directory opened pushes a listing; Backspace pops back to the parent
//! listing without another request.  At most one listing request is pending,
//! and only the result carrying its id is shown.

use crew_client::FileEntry;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing {
    /// Path that was requested; `None` is the backend's default root.
    pub path: Option<String>,
    pub entries: Vec<FileEntry>,
}

#[derive(Debug, Default)]
pub struct FileBrowser {
    stack: Vec<Listing>,
    pub selected: usize,
    /// Id of the listing request in flight.
    pending: Option<u64>,
}

impl FileBrowser {
    /// A browser waiting for its root listing, requested as `request`.
    pub fn opening(request: u64) -> Self {
        Self { stack: Vec::new(), selected: 0, pending: Some(request) }
    }

    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    /// Record `request` as the listing now awaited.
    pub fn request(&mut self, request: u64) {
        self.pending = Some(request);
    }

    /// Whether a result for `request` is the one this browser is waiting for.
    /// A match clears the pending request.
    pub fn accept(&mut self, request: u64) -> bool {
        if self.pending != Some(request) {
            return false;
        }
        self.pending = None;
        true
    }

    pub fn current(&self) -> Option<&Listing> {
        self.stack.last()
    }

    pub fn entries(&self) -> &[FileEntry] {
        self.current().map(|l| l.entries.as_slice()).unwrap_or(&[])
    }

    pub fn title(&self) -> String {
        match self.current().and_then(|l| l.path.as_deref()) {
            Some(p) => format!("Files: {p}"),
            None => "Files".to_string(),
        }
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Show a freshly fetched listing on top of the current one.
    pub fn show(&mut self, path: Option<String>, entries: Vec<FileEntry>) {
        self.stack.push(Listing { path, entries });
        self.selected = 0;
    }

    /// Return to the parent listing, or abandon a pending request.  `false`
    /// when already at the root.
    pub fn back(&mut self) -> bool {
        if self.stack.is_empty() {
            return false;
        }
        if self.pending.take().is_some() {
            return true;
        }
        if self.stack.len() <= 1 {
            return false;
        }
        self.stack.pop();
        self.selected = 0;
        true
    }

    pub fn up(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn down(&mut self) {
        let len = self.entries().len();
        if len > 0 && self.selected + 1 < len {
            self.selected += 1;
        }
    }

    pub fn selected_entry(&self) -> Option<&FileEntry> {
        self.entries().get(self.selected)
    }
}
