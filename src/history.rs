use crate::action::Action;
use crate::change::Change;
use crate::graph::{span_swap, PieceGraph};

/// The two undo/redo stacks, plus tracking for which action is still open
/// for appending and which one was current at the last save.
///
/// The currently open action is always the top of the undo stack, so
/// there's no separate field owning it; `current_open` just tracks whether
/// the next edit should append to that top action or start a new one.
#[derive(Debug)]
pub(crate) struct History {
    undo: Vec<Action>,
    redo: Vec<Action>,
    current_open: bool,
    saved: Option<u64>,
    next_id: u64,
}

impl History {
    pub(crate) fn new() -> Self {
        History {
            undo: Vec::new(),
            redo: Vec::new(),
            current_open: false,
            saved: None,
            next_id: 0,
        }
    }

    /// Ensures a current action exists, draining the redo stack into the
    /// caller's hands (to free its new-side pieces against the graph) the
    /// first time a fresh action is opened. Returns the drained redo
    /// actions, empty if an action was already open.
    #[must_use]
    pub(crate) fn ensure_current(&mut self) -> Vec<Action> {
        if self.current_open {
            return Vec::new();
        }

        let drained = std::mem::take(&mut self.redo);
        let id = self.next_id;
        self.next_id += 1;
        self.undo.push(Action::new(id));
        self.current_open = true;
        drained
    }

    /// Appends `change` to the currently open action. Panics if no action
    /// is open. Callers must call [`History::ensure_current`] first.
    pub(crate) fn push_change(&mut self, change: Change) {
        self.undo
            .last_mut()
            .expect("ensure_current must be called before push_change")
            .changes
            .push(change);
    }

    /// Mutable access to the most recently pushed change of the current
    /// action, used by the edit cache to grow/shrink it in place.
    pub(crate) fn current_change_mut(&mut self) -> Option<&mut Change> {
        if !self.current_open {
            return None;
        }
        self.undo.last_mut()?.changes.last_mut()
    }

    /// Read-only counterpart of [`History::current_change_mut`], used by
    /// `cache_contains` to check eligibility without borrowing mutably.
    pub(crate) fn current_change(&self) -> Option<&Change> {
        if !self.current_open {
            return None;
        }
        self.undo.last()?.changes.last()
    }

    /// Closes the current action: the next edit opens a new one.
    pub(crate) fn close(&mut self) {
        self.current_open = false;
    }

    pub(crate) fn undo(&mut self) -> Option<&Action> {
        let action = self.undo.pop()?;
        self.current_open = false;
        self.redo.push(action);
        self.redo.last()
    }

    pub(crate) fn redo(&mut self) -> Option<&Action> {
        let action = self.redo.pop()?;
        self.current_open = false;
        self.undo.push(action);
        self.undo.last()
    }

    pub(crate) fn modified(&self) -> bool {
        self.saved != self.undo.last().map(|a| a.id)
    }

    pub(crate) fn mark_saved(&mut self) {
        self.saved = self.undo.last().map(|a| a.id);
    }

    /// Frees every action remaining on both stacks, releasing the new-side
    /// pieces of each of their changes.
    pub(crate) fn free_all(&mut self, graph: &mut PieceGraph) {
        for action in self.undo.drain(..).chain(self.redo.drain(..)) {
            action.free_new_side(graph);
        }
    }
}

/// Undoes the most recent action by swapping each of its changes' new span
/// back to the old span, in the order in which they're listed (span swaps
/// are structurally disjoint, so order never matters). Returns the
/// resulting signed change in document length.
pub(crate) fn undo_action(graph: &mut PieceGraph, action: &Action) -> i64 {
    let mut delta = 0i64;
    for change in &action.changes {
        span_swap(graph, &change.new, &change.old);
        delta += change.old.len as i64 - change.new.len as i64;
    }
    delta
}

pub(crate) fn redo_action(graph: &mut PieceGraph, action: &Action) -> i64 {
    let mut delta = 0i64;
    for change in &action.changes {
        span_swap(graph, &change.old, &change.new);
        delta += change.new.len as i64 - change.old.len as i64;
    }
    delta
}
