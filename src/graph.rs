use crate::piece::{Content, Piece, PieceId};
use crate::span::Span;

/// The piece graph: a doubly linked sequence of pieces stored in an arena
/// and addressed by [`PieceId`], plus the allocation-order list used only
/// for bulk teardown.
///
/// `locate` and the splice primitives used by [`span_swap`] are the only
/// things exposed to the rest of the crate. Insert, delete, and the cache
/// are all built out of these two primitives.
#[derive(Debug)]
pub(crate) struct PieceGraph {
    slots: Vec<Option<Piece>>,
    free: Vec<u32>,
    global_head: Option<PieceId>,
}

impl PieceGraph {
    pub(crate) fn new() -> Self {
        PieceGraph {
            slots: vec![Some(Piece::sentinel()), Some(Piece::sentinel())],
            free: Vec::new(),
            global_head: None,
        }
    }

    #[inline]
    pub(crate) fn begin(&self) -> PieceId {
        PieceId::BEGIN
    }

    #[inline]
    pub(crate) fn end(&self) -> PieceId {
        PieceId::END
    }

    #[inline]
    pub(crate) fn get(&self, id: PieceId) -> &Piece {
        self.slots[id.0 as usize]
            .as_ref()
            .expect("access to a freed piece")
    }

    #[inline]
    pub(crate) fn get_mut(&mut self, id: PieceId) -> &mut Piece {
        self.slots[id.0 as usize]
            .as_mut()
            .expect("access to a freed piece")
    }

    /// Allocates a new piece holding `content`, linking it at the head of
    /// the allocation-order list. `prev`/`next` start out pointing at the
    /// sentinel `begin` piece as placeholders; callers wire up the real
    /// logical neighbors with [`PieceGraph::link`] once every piece a split
    /// needs has been allocated.
    pub(crate) fn alloc(&mut self, content: Content) -> PieceId {
        let piece = Piece {
            content,
            prev: PieceId::BEGIN,
            next: PieceId::BEGIN,
            global_prev: None,
            global_next: self.global_head,
        };

        let id = match self.free.pop() {
            Some(idx) => {
                self.slots[idx as usize] = Some(piece);
                PieceId(idx)
            }
            None => {
                let idx = self.slots.len() as u32;
                self.slots.push(Some(piece));
                PieceId(idx)
            }
        };

        if let Some(head) = self.global_head {
            self.get_mut(head).global_prev = Some(id);
        }
        self.global_head = Some(id);
        id
    }

    /// Sets `a.next = b` and `b.prev = a`. Used to wire the logical
    /// neighbors of freshly allocated pieces together and to the piece(s)
    /// they're replacing, before the pair is handed to [`span_swap`].
    #[inline]
    pub(crate) fn link(&mut self, a: PieceId, b: PieceId) {
        self.get_mut(a).next = b;
        self.get_mut(b).prev = a;
    }

    /// Releases a piece's arena slot. Only ever called on the new-side
    /// pieces of a dropped `Change`; old-side pieces stay reachable through
    /// older actions or the live graph and must never be freed here.
    pub(crate) fn free(&mut self, id: PieceId) {
        debug_assert!(id != PieceId::BEGIN && id != PieceId::END, "sentinels are never freed");
        let (prev, next) = {
            let piece = self.get(id);
            (piece.global_prev, piece.global_next)
        };

        match prev {
            Some(p) => self.get_mut(p).global_next = next,
            None => self.global_head = next,
        }
        if let Some(n) = next {
            self.get_mut(n).global_prev = prev;
        }

        self.slots[id.0 as usize] = None;
        self.free.push(id.0);
    }

    /// Walks every currently allocated non-sentinel piece, in allocation
    /// order, for teardown.
    pub(crate) fn drain_all(&mut self) -> Vec<PieceId> {
        let mut out = Vec::new();
        let mut cur = self.global_head;
        while let Some(id) = cur {
            cur = self.get(id).global_next;
            out.push(id);
        }
        out
    }

    /// Returns the piece holding byte offset `pos` and the offset within
    /// it. When `pos` falls exactly on a piece boundary the earlier piece
    /// wins, so a boundary offset comes back as that piece's length rather
    /// than zero on the following piece. Callers must ensure `pos <= size`.
    pub(crate) fn locate(&self, pos: u64) -> (PieceId, u64) {
        let mut cur = 0u64;
        let mut p = self.begin();
        loop {
            let len = self.get(p).len();
            if cur <= pos && pos <= cur + len {
                return (p, pos - cur);
            }
            cur += len;
            p = self.get(p).next;
            debug_assert_ne!(p, self.end(), "pos out of range for locate");
        }
    }
}

/// Atomically rewires the graph so `old` is replaced by `new`, handling
/// the four cases where either span may be empty.
pub(crate) fn span_swap(graph: &mut PieceGraph, old: &Span, new: &Span) {
    match (old.is_empty(), new.is_empty()) {
        (true, true) => {}
        (true, false) => {
            let (new_start, new_end) = new.bounds();
            let before = graph.get(new_start).prev;
            let after = graph.get(new_end).next;
            graph.get_mut(before).next = new_start;
            graph.get_mut(after).prev = new_end;
        }
        (false, true) => {
            let (old_start, old_end) = old.bounds();
            let before = graph.get(old_start).prev;
            let after = graph.get(old_end).next;
            graph.get_mut(before).next = after;
            graph.get_mut(after).prev = before;
        }
        (false, false) => {
            let (old_start, old_end) = old.bounds();
            let (new_start, new_end) = new.bounds();
            let before = graph.get(old_start).prev;
            let after = graph.get(old_end).next;
            graph.get_mut(before).next = new_start;
            graph.get_mut(after).prev = new_end;
        }
    }
}
