// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Document state, undo history and the session that ties them to the
//! compositor.

pub mod document;
pub mod history;
pub mod session;

pub use document::{DocumentStore, Reorder};
pub use history::{History, HistoryEntry};
pub use session::Session;
