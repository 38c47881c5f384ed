/// Tunables for the buffer's storage layout.
///
/// Kept on `Editor` so embedders can tune them without forking the crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Minimum size of a newly allocated append buffer. A `store()` call
    /// for a larger chunk still gets a buffer sized to fit it.
    pub add_buffer_min_capacity: u64,

    /// A file-backed original buffer larger than this is split into
    /// multiple pieces at load time rather than represented as one piece
    /// spanning the whole mapping, so `locate`'s linear walk never has to
    /// consider a single piece the size of the whole file.
    pub file_backed_max_piece_size: u64,
}

impl Config {
    pub const DEFAULT_ADD_BUFFER_MIN_CAPACITY: u64 = 1 << 20; // 1 MiB
    pub const DEFAULT_FILE_BACKED_MAX_PIECE_SIZE: u64 = 256 * 1024; // 256 KiB
}

impl Default for Config {
    fn default() -> Self {
        Config {
            add_buffer_min_capacity: Self::DEFAULT_ADD_BUFFER_MIN_CAPACITY,
            file_backed_max_piece_size: Self::DEFAULT_FILE_BACKED_MAX_PIECE_SIZE,
        }
    }
}
