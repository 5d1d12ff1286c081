// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! History system for undo/redo.
//!
//! The timeline is a bounded list of labelled project snapshots with a
//! pointer to the entry that matches the live document. Each snapshot is an
//! owned copy of the project, so later edits to the live document cannot
//! reach into recorded history.

use crate::error::{EditorError, Result};
use crate::models::Project;
use chrono::{DateTime, Utc};

/// Default number of entries kept on the timeline.
pub const DEFAULT_CAPACITY: usize = 50;

/// One recorded snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub id: String,
    pub action: String,
    pub description: String,
    pub timestamp: DateTime<Utc>,
    pub project: Project,
}

#[derive(Debug, Clone)]
pub struct History {
    entries: Vec<HistoryEntry>,
    /// `None` only while the timeline is empty.
    current: Option<usize>,
    capacity: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}

impl History {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::new(),
            current: None,
            capacity: capacity.max(1),
        }
    }

    /// Record a snapshot after a mutation.
    ///
    /// Entries after the current pointer are discarded first, so recording
    /// after an undo drops the redo branch.
    pub fn record(
        &mut self,
        action: impl Into<String>,
        description: impl Into<String>,
        project: &Project,
    ) -> &HistoryEntry {
        if let Some(current) = self.current {
            self.entries.truncate(current + 1);
        }

        self.entries.push(HistoryEntry {
            id: uuid::Uuid::new_v4().to_string(),
            action: action.into(),
            description: description.into(),
            timestamp: Utc::now(),
            project: project.clone(),
        });

        if self.entries.len() > self.capacity {
            let evicted = self.entries.len() - self.capacity;
            self.entries.drain(..evicted);
            log::debug!("History full, evicted {} oldest entries", evicted);
        }

        let last = self.entries.len() - 1;
        self.current = Some(last);
        &self.entries[last]
    }

    /// Step back one entry and return its project.
    pub fn undo(&mut self) -> Option<Project> {
        let current = self.current.filter(|&i| i > 0)?;
        self.current = Some(current - 1);
        Some(self.entries[current - 1].project.clone())
    }

    /// Step forward one entry and return its project.
    pub fn redo(&mut self) -> Option<Project> {
        let current = self.current.filter(|&i| i + 1 < self.entries.len())?;
        self.current = Some(current + 1);
        Some(self.entries[current + 1].project.clone())
    }

    /// Jump to an arbitrary entry.
    pub fn restore(&mut self, index: usize) -> Result<Project> {
        let entry = self.entries.get(index).ok_or(EditorError::IndexOutOfRange {
            index,
            len: self.entries.len(),
        })?;
        let project = entry.project.clone();
        self.current = Some(index);
        Ok(project)
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    pub fn current(&self) -> Option<&HistoryEntry> {
        self.current.map(|i| &self.entries[i])
    }

    pub fn can_undo(&self) -> bool {
        self.current.is_some_and(|i| i > 0)
    }

    pub fn can_redo(&self) -> bool {
        self.current.is_some_and(|i| i + 1 < self.entries.len())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Clear all history
    pub fn clear(&mut self) {
        self.entries.clear();
        self.current = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Canvas, Layer};

    fn project_with(count: usize) -> Project {
        let mut project = Project::new("p", Canvas::default());
        for i in 0..count {
            project.layers.push(Layer::text(format!("l{i}"), format!("{i}")));
        }
        project
    }

    #[test]
    fn test_undo_then_redo_restores_state() {
        let mut history = History::new();
        let first = project_with(1);
        let second = project_with(2);
        history.record("Add", "first", &first);
        history.record("Add", "second", &second);

        assert_eq!(history.undo(), Some(first));
        assert_eq!(history.redo(), Some(second));
        assert_eq!(history.current_index(), Some(1));
    }

    #[test]
    fn test_new_record_discards_redo_branch() {
        let mut history = History::new();
        history.record("a", "", &project_with(1));
        history.record("b", "", &project_with(2));
        history.undo();
        history.record("c", "", &project_with(3));

        assert_eq!(history.redo(), None);
        assert_eq!(history.len(), 2);
        assert_eq!(history.entries()[1].action, "c");
    }

    #[test]
    fn test_capacity_eviction() {
        let mut history = History::new();
        for i in 0..55 {
            history.record(format!("step {i}"), "", &project_with(0));
        }
        assert_eq!(history.len(), 50);
        assert_eq!(history.current_index(), Some(49));
        assert_eq!(history.current().unwrap().action, "step 54");
        assert_eq!(history.entries()[0].action, "step 5");
    }

    #[test]
    fn test_boundaries_are_noops() {
        let mut history = History::new();
        assert_eq!(history.undo(), None);
        assert_eq!(history.redo(), None);

        history.record("only", "", &project_with(0));
        assert_eq!(history.undo(), None);
        assert_eq!(history.redo(), None);
        assert_eq!(history.current_index(), Some(0));
        assert!(!history.can_undo());
        assert!(!history.can_redo());
    }

    #[test]
    fn test_restore() {
        let mut history = History::new();
        let states: Vec<Project> = (0..4).map(project_with).collect();
        for state in &states {
            history.record("step", "", state);
        }

        assert_eq!(history.restore(1).unwrap(), states[1]);
        assert_eq!(history.current_index(), Some(1));

        let err = history.restore(4).unwrap_err();
        assert!(matches!(err, EditorError::IndexOutOfRange { index: 4, len: 4 }));
        assert_eq!(history.current_index(), Some(1));
    }

    #[test]
    fn test_snapshot_is_independent_of_live_project() {
        let mut history = History::new();
        let mut live = project_with(1);
        history.record("Add", "", &live);

        live.layers[0].name = "changed".into();
        live.layers.clear();

        let stored = &history.current().unwrap().project;
        assert_eq!(stored.layers.len(), 1);
        assert_eq!(stored.layers[0].name, "Text");
    }
}
