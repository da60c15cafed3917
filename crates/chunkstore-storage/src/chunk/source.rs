//! Random-access byte sources for a finished store.
//!
//! The decoder reads the footer once and then one compressed range per chunk
//! load. Any type that can serve `[start, end)` reads from shared references
//! can back a store: an in-memory [`Bytes`] buffer, a [`FileSource`], or a
//! caller-provided wrapper (for example, one that counts reads).

use std::fs::File;
use std::io;
use std::path::Path;

use bytes::Bytes;
use chunkstore_core::Result;

/// Read-only, random-access view of a finished store.
///
/// Implementations must be safe to call from many threads at once.
pub trait ByteSource: Send + Sync {
    /// Total length in bytes
    fn len(&self) -> u64;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read bytes `[start, end)`.
    ///
    /// A range outside the source fails with an `UnexpectedEof` I/O error.
    fn read(&self, start: u64, end: u64) -> Result<Bytes>;
}

fn out_of_range(start: u64, end: u64, len: u64) -> io::Error {
    io::Error::new(
        io::ErrorKind::UnexpectedEof,
        format!("read [{}, {}) outside source of {} bytes", start, end, len),
    )
}

impl ByteSource for Bytes {
    fn len(&self) -> u64 {
        Bytes::len(self) as u64
    }

    fn read(&self, start: u64, end: u64) -> Result<Bytes> {
        let len = Bytes::len(self) as u64;
        if start > end || end > len {
            return Err(out_of_range(start, end, len).into());
        }
        Ok(self.slice(start as usize..end as usize))
    }
}

/// A store on disk, read with positional I/O.
#[derive(Debug)]
pub struct FileSource {
    #[cfg(unix)]
    file: File,
    #[cfg(not(unix))]
    file: std::sync::Mutex<File>,
    len: u64,
}

impl FileSource {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        Self::from_file(file)
    }

    pub fn from_file(file: File) -> Result<Self> {
        let len = file.metadata()?.len();
        Ok(Self {
            #[cfg(unix)]
            file,
            #[cfg(not(unix))]
            file: std::sync::Mutex::new(file),
            len,
        })
    }

    #[cfg(unix)]
    fn read_exact_at(&self, buf: &mut [u8], offset: u64) -> io::Result<()> {
        use std::os::unix::fs::FileExt;
        self.file.read_exact_at(buf, offset)
    }

    #[cfg(not(unix))]
    fn read_exact_at(&self, buf: &mut [u8], offset: u64) -> io::Result<()> {
        use std::io::{Read, Seek, SeekFrom};
        let mut file = self
            .file
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        file.seek(SeekFrom::Start(offset))?;
        file.read_exact(buf)
    }
}

impl ByteSource for FileSource {
    fn len(&self) -> u64 {
        self.len
    }

    fn read(&self, start: u64, end: u64) -> Result<Bytes> {
        if start > end || end > self.len {
            return Err(out_of_range(start, end, self.len).into());
        }

        let mut buf = vec![0u8; (end - start) as usize];
        self.read_exact_at(&mut buf, start)?;
        Ok(Bytes::from(buf))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chunkstore_core::Error;
    use std::io::Write;

    #[test]
    fn test_bytes_source_slices() {
        let source = Bytes::from_static(b"hello chunk store");
        assert_eq!(ByteSource::len(&source), 17);
        assert_eq!(source.read(6, 11).unwrap(), Bytes::from_static(b"chunk"));
        assert!(source.read(3, 3).unwrap().is_empty());
    }

    #[test]
    fn test_bytes_source_out_of_range() {
        let source = Bytes::from_static(b"abc");
        match source.read(1, 4) {
            Err(Error::Io(e)) => assert_eq!(e.kind(), io::ErrorKind::UnexpectedEof),
            other => panic!("expected EOF, got {:?}", other),
        }
        assert!(source.read(2, 1).is_err());
    }

    #[test]
    fn test_file_source_reads_ranges() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"0123456789").unwrap();
        file.flush().unwrap();

        let source = FileSource::open(file.path()).unwrap();
        assert_eq!(source.len(), 10);
        assert_eq!(source.read(2, 5).unwrap(), Bytes::from_static(b"234"));
        assert_eq!(source.read(0, 10).unwrap().len(), 10);
        assert!(source.read(8, 11).is_err());
    }

    #[test]
    fn test_file_source_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = FileSource::open(dir.path().join("missing.store")).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
