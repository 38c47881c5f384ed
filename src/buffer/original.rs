use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use memmap2::Mmap;

use crate::error::{Error, Result};

/// The buffer installed as the single piece spanning the whole document at
/// load time. Read-only for the editor's lifetime.
#[derive(Debug)]
pub(crate) enum OriginalBuffer {
    Mmap { mmap: Mmap, path: PathBuf },
    Memory(Vec<u8>),
}

impl OriginalBuffer {
    pub(crate) fn empty() -> Self {
        OriginalBuffer::Memory(Vec::new())
    }

    pub(crate) fn from_reader<R: Read>(mut reader: R) -> io::Result<Self> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        Ok(OriginalBuffer::Memory(bytes))
    }

    pub(crate) fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let metadata = file.metadata()?;
        if !metadata.is_file() {
            return Err(Error::NotRegularFile { path: path.into() });
        }

        if metadata.len() == 0 {
            // mmap of a zero-length file is rejected by the OS; an empty
            // document needs no mapping at all.
            return Ok(OriginalBuffer::Memory(Vec::new()));
        }

        // SAFETY: the file is not modified/truncated by this process for
        // the lifetime of the mapping; external modification during the
        // editing session is a pre-existing hazard of mmap-backed editors.
        let mmap = unsafe { Mmap::map(&file)? };
        Ok(OriginalBuffer::Mmap {
            mmap,
            path: path.to_path_buf(),
        })
    }

    pub(crate) fn len(&self) -> u64 {
        match self {
            OriginalBuffer::Mmap { mmap, .. } => mmap.len() as u64,
            OriginalBuffer::Memory(bytes) => bytes.len() as u64,
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn is_file_backed(&self) -> bool {
        matches!(self, OriginalBuffer::Mmap { .. })
    }

    pub(crate) fn path(&self) -> Option<&Path> {
        match self {
            OriginalBuffer::Mmap { path, .. } => Some(path),
            OriginalBuffer::Memory(_) => None,
        }
    }

    pub(crate) fn slice(&self, offset: u64, len: u64) -> &[u8] {
        let start = offset as usize;
        let end = start + len as usize;
        match self {
            OriginalBuffer::Mmap { mmap, .. } => &mmap[start..end],
            OriginalBuffer::Memory(bytes) => &bytes[start..end],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    #[test]
    fn from_reader_is_in_memory() {
        let buf = OriginalBuffer::from_reader(io::Cursor::new(b"hello")).unwrap();
        assert!(!buf.is_file_backed());
        assert_eq!(buf.slice(0, 5), b"hello");
    }

    #[test]
    fn from_path_rejects_directories() {
        let dir = std::env::temp_dir();
        let err = OriginalBuffer::from_path(&dir).unwrap_err();
        assert!(matches!(err, Error::NotRegularFile { .. }));
    }

    #[test]
    fn from_path_mmaps_regular_files() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"abcdef").unwrap();
        let buf = OriginalBuffer::from_path(file.path()).unwrap();
        assert!(buf.is_file_backed());
        assert_eq!(buf.len(), 6);
        assert_eq!(buf.slice(2, 3), b"cde");
    }
}
