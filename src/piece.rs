use crate::buffer::BufferRef;

/// Arena index of a [`Piece`]. Sentinel pieces occupy the reserved indices
/// [`PieceId::BEGIN`]/[`PieceId::END`], allocated once and never freed.
///
/// Pieces reference each other by this index rather than by pointer, so
/// the arena can grow and move without invalidating any piece's neighbors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct PieceId(pub(crate) u32);

impl PieceId {
    pub(crate) const BEGIN: PieceId = PieceId(0);
    pub(crate) const END: PieceId = PieceId(1);
}

/// A view onto stored bytes: `(buffer, offset, length)` rather than a raw
/// pointer, so it stays valid across the backing arena growing or a buffer
/// being reallocated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Content {
    pub(crate) buffer: BufferRef,
    pub(crate) offset: u64,
    pub(crate) len: u64,
}

impl Content {
    pub(crate) const EMPTY: Content = Content {
        buffer: BufferRef::Original,
        offset: 0,
        len: 0,
    };
}

/// A piece: an immutable-by-convention view into a buffer, plus its
/// position in the document order (`prev`/`next`) and in allocation order
/// (`global_prev`/`global_next`), kept only so teardown can visit every
/// piece once without re-deriving that order from the arena.
#[derive(Debug, Clone)]
pub(crate) struct Piece {
    pub(crate) content: Content,
    pub(crate) prev: PieceId,
    pub(crate) next: PieceId,
    pub(crate) global_prev: Option<PieceId>,
    pub(crate) global_next: Option<PieceId>,
}

impl Piece {
    pub(crate) fn sentinel() -> Self {
        Piece {
            content: Content::EMPTY,
            prev: PieceId::BEGIN,
            next: PieceId::END,
            global_prev: None,
            global_next: None,
        }
    }

    #[inline]
    pub(crate) fn len(&self) -> u64 {
        self.content.len
    }
}
