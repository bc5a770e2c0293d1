// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Terminal UI for the multi-agent workflow backend.

mod app;
pub mod chat;
pub mod controller;
mod highlight;
pub mod input;
pub mod keys;
mod layout;
mod markdown;
pub mod notify;
pub mod overlay;
pub mod state;
mod widgets;

pub use app::App;
pub use chat::segment::ChatSegment;
pub use controller::{AppOptions, Controller, ControllerEvent, Focus};
pub use state::{SessionState, TurnPhase};
