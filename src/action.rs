use std::time::SystemTime;

use crate::change::Change;
use crate::graph::PieceGraph;

/// A sequence of [`Change`]s with a creation timestamp: the atomic unit of
/// undo/redo. `id` is a monotonic counter rather than a pointer identity,
/// since actions move between the undo and redo stacks and no longer live
/// at a stable address once they do.
#[derive(Debug)]
pub(crate) struct Action {
    pub(crate) id: u64,
    pub(crate) changes: Vec<Change>,
    pub(crate) timestamp: SystemTime,
}

impl Action {
    pub(crate) fn new(id: u64) -> Self {
        Action {
            id,
            changes: Vec::new(),
            timestamp: SystemTime::now(),
        }
    }

    pub(crate) fn free_new_side(&self, graph: &mut PieceGraph) {
        for change in &self.changes {
            change.free_new_side(graph);
        }
    }
}
