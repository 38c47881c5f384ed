use super::BufferRef;

/// Append-only list of heap buffers. Only the most recently allocated
/// (head) buffer is ever the target of `insert_at`/`delete_at`; those two
/// exist purely to serve the edit-coalescing cache's tail-region memmove
/// and must never be called against an older buffer.
///
/// Pushing a new outer `Vec` element never moves the heap allocation an
/// inner `Vec<u8>` owns, so offsets handed out by `store` stay valid for
/// the buffer's lifetime, and `BufferRef::Add` indices are stable because
/// buffers are only ever appended, never reordered or removed.
#[derive(Debug)]
pub(crate) struct AddStore {
    buffers: Vec<Vec<u8>>,
    min_capacity: u64,
}

impl AddStore {
    pub(crate) fn new(min_capacity: u64) -> Self {
        AddStore {
            buffers: Vec::new(),
            min_capacity,
        }
    }

    fn head_has_room(&self, len: u64) -> bool {
        self.buffers
            .last()
            .map(|buf| (buf.capacity() - buf.len()) as u64 >= len)
            .unwrap_or(false)
    }

    /// Appends `bytes` to the head buffer if it has capacity, otherwise
    /// allocates a new buffer of `max(bytes.len(), min_capacity)` and links
    /// it as the new head. Returns a stable reference to the stored bytes.
    pub(crate) fn store(&mut self, bytes: &[u8]) -> (BufferRef, u64) {
        let len = bytes.len() as u64;
        if !self.head_has_room(len) {
            let cap = len.max(self.min_capacity);
            log::debug!("allocating add buffer of {cap} bytes");
            self.buffers.push(Vec::with_capacity(cap as usize));
        }

        let buf = self.buffers.last_mut().expect("buffer just allocated");
        let offset = buf.len() as u64;
        buf.extend_from_slice(bytes);
        (self.head_ref(), offset)
    }

    fn head_ref(&self) -> BufferRef {
        BufferRef::Add((self.buffers.len() - 1) as u32)
    }

    /// Whether `r` refers to the current head buffer, i.e. whether it is
    /// eligible for `insert_at`/`delete_at`.
    pub(crate) fn is_head(&self, r: BufferRef) -> bool {
        matches!(r, BufferRef::Add(i) if i as usize + 1 == self.buffers.len())
    }

    /// Length of the head buffer, used by the cache to check whether a
    /// piece's content abuts the buffer's current end.
    pub(crate) fn head_len(&self) -> u64 {
        self.buffers.last().map(|b| b.len() as u64).unwrap_or(0)
    }

    pub(crate) fn slice(&self, idx: u32, offset: u64, len: u64) -> &[u8] {
        let buf = &self.buffers[idx as usize];
        let start = offset as usize;
        &buf[start..start + len as usize]
    }

    /// Inserts `bytes` at `pos` in the head buffer. Only ever called by the
    /// cache fast path, on the piece that owns the buffer's tail.
    pub(crate) fn insert_at(&mut self, pos: u64, bytes: &[u8]) -> bool {
        let Some(buf) = self.buffers.last_mut() else {
            return false;
        };
        let pos = pos as usize;
        if pos > buf.len() || buf.capacity() - buf.len() < bytes.len() {
            return false;
        }

        let old_len = buf.len();
        buf.resize(old_len + bytes.len(), 0);
        buf.copy_within(pos..old_len, pos + bytes.len());
        buf[pos..pos + bytes.len()].copy_from_slice(bytes);
        true
    }

    /// Deletes `len` bytes at `pos` in the head buffer.
    pub(crate) fn delete_at(&mut self, pos: u64, len: u64) -> bool {
        let Some(buf) = self.buffers.last_mut() else {
            return false;
        };
        let pos = pos as usize;
        let len = len as usize;
        if pos + len > buf.len() {
            return false;
        }

        let old_len = buf.len();
        buf.copy_within(pos + len..old_len, pos);
        buf.truncate(old_len - len);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_reuses_head_when_it_fits() {
        let mut store = AddStore::new(16);
        let (r1, o1) = store.store(b"abc");
        let (r2, o2) = store.store(b"def");
        assert_eq!(r1, r2);
        assert_eq!(o1, 0);
        assert_eq!(o2, 3);
        assert_eq!(store.slice(1, 0, 6), b"abcdef");
    }

    #[test]
    fn store_allocates_new_buffer_on_exhaustion() {
        let mut store = AddStore::new(4);
        let (r1, _) = store.store(b"abcd");
        let (r2, _) = store.store(b"e");
        assert_ne!(r1, r2);
        assert!(store.is_head(r2));
        assert!(!store.is_head(r1));
    }

    #[test]
    fn insert_and_delete_at_tail() {
        let mut store = AddStore::new(16);
        store.store(b"ace");
        assert!(store.insert_at(1, b"bd"));
        assert_eq!(store.slice(1, 0, 5), b"abdce");
        assert!(store.delete_at(1, 2));
        assert_eq!(store.slice(1, 0, 3), b"ace");
    }
}
