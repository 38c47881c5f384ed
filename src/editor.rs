use std::ffi::OsString;
use std::fs::OpenOptions;
use std::io;
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};

use memmap2::MmapMut;

use crate::action::Action;
use crate::buffer::{BufferRef, Buffers, OriginalBuffer};
use crate::cache::{self, EditCache};
use crate::change::Change;
use crate::config::Config;
use crate::cursor::Cursor;
use crate::error::Result;
use crate::graph::{self, PieceGraph};
use crate::history::{self, History};
use crate::piece::{Content, PieceId};
use crate::span::Span;

/// The piece-table text buffer: piece graph, buffers, undo/redo history,
/// and the edit-coalescing cache.
#[derive(Debug)]
pub struct Editor {
    graph: PieceGraph,
    buffers: Buffers,
    history: History,
    cache: EditCache,
    size: u64,
    config: Config,
}

impl Editor {
    /// An empty document.
    pub fn new() -> Editor {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Editor {
        Self::from_original(OriginalBuffer::empty(), config)
    }

    /// Loads the reader's content fully into memory as the original
    /// buffer. Useful for tests and non-file sources.
    pub fn from_reader<R: io::Read>(reader: R) -> io::Result<Editor> {
        Self::from_reader_with_config(reader, Config::default())
    }

    pub fn from_reader_with_config<R: io::Read>(reader: R, config: Config) -> io::Result<Editor> {
        let original = OriginalBuffer::from_reader(reader)?;
        Ok(Self::from_original(original, config))
    }

    /// Opens `path` read-only, requires a regular file, and mmaps it whole
    /// as the original buffer.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Editor> {
        Self::load_with_config(path, Config::default())
    }

    pub fn load_with_config<P: AsRef<Path>>(path: P, config: Config) -> Result<Editor> {
        let original = OriginalBuffer::from_path(path)?;
        Ok(Self::from_original(original, config))
    }

    fn from_original(original: OriginalBuffer, config: Config) -> Editor {
        let mut graph = PieceGraph::new();
        let total_len = original.len();

        if total_len > 0 {
            let chunk_size = if original.is_file_backed() {
                config.file_backed_max_piece_size
            } else {
                total_len
            };

            let mut pos = 0u64;
            let mut prev = graph.begin();
            while pos < total_len {
                let len = chunk_size.min(total_len - pos);
                let content = Content {
                    buffer: BufferRef::Original,
                    offset: pos,
                    len,
                };
                let id = graph.alloc(content);
                graph.link(prev, id);
                prev = id;
                pos += len;
            }
            graph.link(prev, graph.end());
        }

        Editor {
            graph,
            buffers: Buffers::new(original, config.add_buffer_min_capacity),
            history: History::new(),
            cache: EditCache::new(),
            size: total_len,
            config,
        }
    }

    /// Current document size in bytes.
    #[inline]
    pub fn len(&self) -> u64 {
        self.size
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    // ---- cache -----------------------------------------------------

    fn cache_contains(&self, p: PieceId) -> bool {
        if self.cache.get() != Some(p) {
            return false;
        }
        let Some(change) = self.history.current_change() else {
            return false;
        };
        // Only the *first* new-side piece of the most recent change is
        // cache-eligible; a midway split's middle piece never matches.
        if change.new.start() != Some(p) {
            return false;
        }
        cache::abuts_tail(&self.buffers, &self.graph.get(p).content)
    }

    fn try_cache_insert(&mut self, p: PieceId, off: u64, bytes: &[u8]) -> bool {
        if bytes.is_empty() || !self.cache_contains(p) {
            return false;
        }
        let content = self.graph.get(p).content;
        let bufpos = content.offset + off;
        if !self.buffers.add.insert_at(bufpos, bytes) {
            return false;
        }

        let len = bytes.len() as u64;
        self.graph.get_mut(p).content.len += len;
        self.history
            .current_change_mut()
            .expect("cache_contains implies a current change")
            .new
            .len += len;
        self.size += len;
        true
    }

    fn try_cache_delete(&mut self, p: PieceId, off: u64, len: u64) -> bool {
        if !self.cache_contains(p) {
            return false;
        }
        let content = self.graph.get(p).content;
        if off + len > content.len {
            return false;
        }
        let bufpos = content.offset + off;
        if !self.buffers.add.delete_at(bufpos, len) {
            return false;
        }

        self.graph.get_mut(p).content.len -= len;
        self.history
            .current_change_mut()
            .expect("cache_contains implies a current change")
            .new
            .len -= len;
        self.size -= len;
        true
    }

    /// Frees the new-side pieces of a batch of dropped actions (redo
    /// actions superseded by a fresh edit).
    fn free_actions(&mut self, actions: Vec<Action>) {
        for action in actions {
            action.free_new_side(&mut self.graph);
            for change in &action.changes {
                if let Some((start, end)) = change.new.bounds_opt() {
                    self.cache.invalidate_if_freed(start);
                    self.cache.invalidate_if_freed(end);
                }
            }
        }
    }

    // ---- mutation ----------------------------------------------------

    /// Inserts `bytes` at byte offset `pos`. `pos == len()` appends.
    pub fn insert(&mut self, pos: u64, bytes: &[u8]) -> bool {
        if pos > self.size {
            return false;
        }
        if bytes.is_empty() {
            return true;
        }

        let (p, off) = self.graph.locate(pos);
        if self.try_cache_insert(p, off, bytes) {
            return true;
        }

        let drained = self.history.ensure_current();
        self.free_actions(drained);

        let (buffer, offset) = self.buffers.store(bytes);
        let content = Content {
            buffer,
            offset,
            len: bytes.len() as u64,
        };

        let p_len = self.graph.get(p).len();
        let (old_span, new_span, cache_candidate) = if off == p_len {
            // Boundary case: insert a new piece between `p` and `p.next`.
            let new_id = self.graph.alloc(content);
            let next = self.graph.get(p).next;
            self.graph.link(p, new_id);
            self.graph.link(new_id, next);
            (Span::EMPTY, Span::single(&self.graph, new_id), new_id)
        } else {
            // Midway case: split `p` into `before`/`new`/`after`.
            let p_content = self.graph.get(p).content;
            let p_prev = self.graph.get(p).prev;
            let p_next = self.graph.get(p).next;

            let before_id = self.graph.alloc(Content {
                buffer: p_content.buffer,
                offset: p_content.offset,
                len: off,
            });
            let new_id = self.graph.alloc(content);
            let after_id = self.graph.alloc(Content {
                buffer: p_content.buffer,
                offset: p_content.offset + off,
                len: p_content.len - off,
            });

            self.graph.link(p_prev, before_id);
            self.graph.link(before_id, new_id);
            self.graph.link(new_id, after_id);
            self.graph.link(after_id, p_next);

            (
                Span::single(&self.graph, p),
                Span::new(&self.graph, before_id, after_id),
                new_id,
            )
        };

        self.history.push_change(Change {
            old: old_span,
            new: new_span,
        });

        if cache::abuts_tail(&self.buffers, &content) {
            self.cache.set(cache_candidate);
        }

        graph::span_swap(&mut self.graph, &old_span, &new_span);
        self.size = self.size + new_span.len - old_span.len;
        true
    }

    /// Deletes `len` bytes starting at `pos`.
    pub fn delete(&mut self, pos: u64, len: u64) -> bool {
        if len == 0 {
            return true;
        }
        if pos + len > self.size {
            return false;
        }

        let (p0, off) = self.graph.locate(pos);
        if self.try_cache_delete(p0, off, len) {
            return true;
        }

        let drained = self.history.ensure_current();
        self.free_actions(drained);

        let p0_len = self.graph.get(p0).len();
        let midway_start = off != p0_len;

        let (start, before_id) = if !midway_start {
            (self.graph.get(p0).next, None)
        } else {
            (p0, Some(self.graph.alloc(Content::EMPTY)))
        };

        let mut cur = if midway_start { p0_len - off } else { 0 };
        let mut p = p0;
        while cur < len {
            p = self.graph.get(p).next;
            cur += self.graph.get(p).len();
        }

        let midway_end = cur != len;
        let (end, after_id) = if !midway_end {
            (p, None)
        } else {
            let over = cur - len;
            let p_content = self.graph.get(p).content;
            let after_content = Content {
                buffer: p_content.buffer,
                offset: p_content.offset + p_content.len - over,
                len: over,
            };
            (p, Some(self.graph.alloc(after_content)))
        };

        if let Some(before_id) = before_id {
            let start_content = self.graph.get(start).content;
            self.graph.get_mut(before_id).content = Content {
                buffer: start_content.buffer,
                offset: start_content.offset,
                len: off,
            };
        }

        let start_prev = self.graph.get(start).prev;
        let end_next = self.graph.get(end).next;
        match (before_id, after_id) {
            (Some(b), Some(a)) => {
                self.graph.link(start_prev, b);
                self.graph.link(b, a);
                self.graph.link(a, end_next);
            }
            (Some(b), None) => {
                self.graph.link(start_prev, b);
                self.graph.link(b, end_next);
            }
            (None, Some(a)) => {
                self.graph.link(start_prev, a);
                self.graph.link(a, end_next);
            }
            (None, None) => {}
        }

        let new_span = match (before_id, after_id) {
            (Some(b), Some(a)) => Span::new(&self.graph, b, a),
            (Some(b), None) => Span::single(&self.graph, b),
            (None, Some(a)) => Span::single(&self.graph, a),
            (None, None) => Span::EMPTY,
        };
        let old_span = Span::new(&self.graph, start, end);

        self.history.push_change(Change {
            old: old_span,
            new: new_span,
        });
        graph::span_swap(&mut self.graph, &old_span, &new_span);
        self.size = self.size + new_span.len - old_span.len;
        true
    }

    /// `delete(pos, old_len)` followed by `insert(pos, bytes)`, grouped
    /// into a single `Action` since no `snapshot()` runs between them.
    pub fn replace(&mut self, pos: u64, bytes: &[u8], old_len: u64) -> bool {
        self.delete(pos, old_len) && self.insert(pos, bytes)
    }

    // ---- history ------------------------------------------------------

    /// Closes the current action; the next edit starts a new one.
    pub fn snapshot(&mut self) {
        self.history.close();
        self.cache.clear();
    }

    pub fn undo(&mut self) -> bool {
        let Some(action) = self.history.undo() else {
            return false;
        };
        let delta = history::undo_action(&mut self.graph, action);
        self.size = (self.size as i64 + delta) as u64;
        true
    }

    pub fn redo(&mut self) -> bool {
        let Some(action) = self.history.redo() else {
            return false;
        };
        let delta = history::redo_action(&mut self.graph, action);
        self.size = (self.size as i64 + delta) as u64;
        true
    }

    pub fn modified(&self) -> bool {
        self.history.modified()
    }

    // ---- iteration ------------------------------------------------------

    /// Visits successive document content starting at `pos`, stopping when
    /// the visitor returns `false`.
    pub fn iterate<F: FnMut(u64, &[u8]) -> bool>(&self, pos: u64, mut visitor: F) {
        let (mut p, mut off) = self.graph.locate(pos);
        if p == self.graph.begin() {
            // The begin sentinel carries no content; start at the first
            // real piece instead of emitting a bogus empty chunk.
            p = self.graph.get(p).next;
            off = 0;
        }

        let mut doc_pos = pos;
        loop {
            if p == self.graph.end() {
                return;
            }
            let content = self.graph.get(p).content;
            let start = content.offset + off;
            let len = content.len - off;
            if len > 0 {
                let bytes = self.buffers.slice(content.buffer, start, len);
                if !visitor(doc_pos, bytes) {
                    return;
                }
                doc_pos += len;
            }
            p = self.graph.get(p).next;
            off = 0;
        }
    }

    /// An external cursor over piece-sized chunks, starting at `pos`.
    pub fn cursor(&self, pos: u64) -> Cursor<'_> {
        Cursor::new(self, pos)
    }

    pub(crate) fn graph(&self) -> &PieceGraph {
        &self.graph
    }

    pub(crate) fn buffers(&self) -> &Buffers {
        &self.buffers
    }

    /// Materializes the whole document. Convenience for tests/small
    /// documents; large documents should use [`Editor::iterate`].
    pub fn to_vec(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.size as usize);
        self.iterate(0, |_, bytes| {
            out.extend_from_slice(bytes);
            true
        });
        out
    }

    // ---- persistence ----------------------------------------------------

    /// Writes the current content to `.{name}.tmp` beside `path`, then
    /// renames it onto `path`. Returns `Ok(())` on success.
    pub fn save<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let path = path.as_ref();
        let tmp_path = sibling_tmp_path(path);

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(&tmp_path)?;
        file.set_len(self.size)?;

        if self.size > 0 {
            // SAFETY: `tmp_path` was just created by us and isn't touched
            // by anything else for the duration of the mapping.
            let mut mmap = unsafe { MmapMut::map_mut(&file)? };
            let mut cur = 0usize;
            self.iterate(0, |_pos, bytes| {
                mmap[cur..cur + bytes.len()].copy_from_slice(bytes);
                cur += bytes.len();
                true
            });
            mmap.flush()?;
        }
        drop(file);

        if let Err(e) = std::fs::rename(&tmp_path, path) {
            log::warn!("rename of {tmp_path:?} onto {path:?} failed: {e}");
            return Err(e.into());
        }

        self.history.mark_saved();
        self.snapshot();
        Ok(())
    }
}

impl Default for Editor {
    fn default() -> Self {
        Editor::new()
    }
}

impl Drop for Editor {
    /// Frees every action's new-side pieces; the arena, add buffers, and
    /// mmap are released by ordinary field drop right after.
    fn drop(&mut self) {
        self.history.free_all(&mut self.graph);
    }
}

fn sibling_tmp_path(path: &Path) -> PathBuf {
    let file_name = path.file_name().unwrap_or_default();
    let mut tmp_name = OsString::from(".");
    tmp_name.push(file_name);
    tmp_name.push(".tmp");
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.join(tmp_name),
        _ => PathBuf::from(tmp_name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_and_iterate() {
        let mut ed = Editor::new();
        assert!(ed.insert(0, b"hello"));
        assert!(ed.insert(5, b" world"));
        assert_eq!(ed.to_vec(), b"hello world");
        assert_eq!(ed.len(), 11);
    }

    #[test]
    fn delete_then_insert_replaces_content() {
        let mut ed = Editor::from_reader(io::Cursor::new(b"hello world")).unwrap();
        assert!(ed.delete(5, 1));
        assert!(ed.insert(5, b"_"));
        assert_eq!(ed.to_vec(), b"hello_world");
    }

    #[test]
    fn undo_redo_round_trip() {
        let mut ed = Editor::from_reader(io::Cursor::new(b"abcdef")).unwrap();
        assert!(ed.delete(1, 4));
        assert_eq!(ed.to_vec(), b"af");
        assert!(ed.undo());
        assert_eq!(ed.to_vec(), b"abcdef");
        assert!(ed.redo());
        assert_eq!(ed.to_vec(), b"af");
    }

    #[test]
    fn snapshot_boundaries_group_undo_steps() {
        let mut ed = Editor::from_reader(io::Cursor::new(b"abc")).unwrap();
        assert!(ed.insert(3, b"d"));
        ed.snapshot();
        assert!(ed.insert(4, b"e"));
        assert_eq!(ed.to_vec(), b"abcde");
        assert!(ed.undo());
        assert_eq!(ed.to_vec(), b"abcd");
        assert!(ed.undo());
        assert_eq!(ed.to_vec(), b"abc");
        assert!(!ed.undo());
    }

    #[test]
    fn midway_insert_splits_piece() {
        let mut ed = Editor::from_reader(io::Cursor::new(b"abcdef")).unwrap();
        assert!(ed.insert(3, b"XYZ"));
        assert_eq!(ed.to_vec(), b"abcXYZdef");
    }

    #[test]
    fn sequential_typing_coalesces_into_one_change() {
        let mut ed = Editor::new();
        assert!(ed.insert(0, b"a"));
        assert!(ed.insert(1, b"b"));
        assert!(ed.insert(2, b"c"));
        assert_eq!(ed.to_vec(), b"abc");
        assert!(ed.undo());
        assert_eq!(ed.to_vec(), b"");
    }

    #[test]
    fn out_of_range_delete_fails_without_mutating() {
        let mut ed = Editor::from_reader(io::Cursor::new(b"abc")).unwrap();
        assert!(!ed.delete(1, 10));
        assert_eq!(ed.to_vec(), b"abc");
    }

    #[test]
    fn modified_tracks_save_point() {
        let mut ed = Editor::new();
        assert!(!ed.modified());
        ed.insert(0, b"x");
        assert!(ed.modified());
    }
}
