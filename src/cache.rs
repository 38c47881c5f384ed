use crate::buffer::Buffers;
use crate::piece::{Content, PieceId};

/// The "recently modified piece" fast path. Holds at most one piece id: the
/// one eligible for in-place extension by the next edit, provided it still
/// abuts the tail of the add buffer and is still the *first* new-side piece
/// of the current action's most recent change.
///
/// The cross-subsystem checks (does it abut the buffer tail, is it still
/// the change's first new piece) live on [`crate::Editor`] itself, since
/// they need the graph, buffers, and history together.
#[derive(Debug, Default)]
pub(crate) struct EditCache {
    piece: Option<PieceId>,
}

impl EditCache {
    pub(crate) fn new() -> Self {
        EditCache { piece: None }
    }

    #[inline]
    pub(crate) fn get(&self) -> Option<PieceId> {
        self.piece
    }

    #[inline]
    pub(crate) fn set(&mut self, id: PieceId) {
        self.piece = Some(id);
    }

    #[inline]
    pub(crate) fn clear(&mut self) {
        self.piece = None;
    }

    /// Clears the cache if it currently points at `id`. Called whenever a
    /// piece is freed, so the cache never outlives the piece it names.
    pub(crate) fn invalidate_if_freed(&mut self, id: PieceId) {
        if self.piece == Some(id) {
            self.piece = None;
        }
    }
}

/// Whether `content`'s bytes sit exactly at the current end of the add
/// buffer's head block, the precondition for caching a newly introduced
/// piece for in-place extension.
pub(crate) fn abuts_tail(buffers: &Buffers, content: &Content) -> bool {
    buffers.add.is_head(content.buffer) && content.offset + content.len == buffers.add.head_len()
}
