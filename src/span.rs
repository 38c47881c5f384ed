use crate::graph::PieceGraph;
use crate::piece::PieceId;

/// A closed `[start, end]` range of pieces along the `next` chain, with the
/// sum of member piece lengths cached at construction time.
///
/// An empty span has no bounds and `len == 0`, represented with `Option`
/// rather than a pair of nullable piece ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Span {
    bounds: Option<(PieceId, PieceId)>,
    pub(crate) len: u64,
}

impl Span {
    pub(crate) const EMPTY: Span = Span {
        bounds: None,
        len: 0,
    };

    /// Builds a span over `[start, end]`, walking the `next` chain to sum
    /// lengths. `start` must reach `end` by following `next` in a finite
    /// number of steps.
    pub(crate) fn new(graph: &PieceGraph, start: PieceId, end: PieceId) -> Span {
        let mut len = 0u64;
        let mut p = start;
        loop {
            len += graph.get(p).len();
            if p == end {
                break;
            }
            p = graph.get(p).next;
        }
        Span {
            bounds: Some((start, end)),
            len,
        }
    }

    pub(crate) fn single(graph: &PieceGraph, piece: PieceId) -> Span {
        Span::new(graph, piece, piece)
    }

    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.bounds.is_none()
    }

    /// Panics on an empty span; callers must check [`Span::is_empty`] first.
    #[inline]
    pub(crate) fn bounds(&self) -> (PieceId, PieceId) {
        self.bounds.expect("empty span has no bounds")
    }

    #[inline]
    pub(crate) fn bounds_opt(&self) -> Option<(PieceId, PieceId)> {
        self.bounds
    }

    #[inline]
    pub(crate) fn start(&self) -> Option<PieceId> {
        self.bounds.map(|(s, _)| s)
    }
}
