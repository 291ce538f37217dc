//! Sink abstraction the file writer drains into, plus the filesystem-backed
//! implementation.
//!
//! The writer owns exactly one [`WritableFile`] and is its only client; the
//! trait is the boundary between the write path and whatever actually holds
//! the bytes (a file, an in-memory capture in tests, a remote wrapper).

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::checksum::{self, DataVerification};
use crate::config::DEFAULT_PAGE_SIZE;
use crate::error::{WalError, WalResult};
use crate::limiter::IoPriority;

/// Byte-addressable append sink.
///
/// `append` and `positioned_append` optionally carry a [`DataVerification`]
/// handoff checksum covering exactly the bytes of that call; sinks that can
/// verify it should fail the write with
/// [`WalError::Corruption`] on mismatch.
pub trait WritableFile: Send {
    /// Append `data` at the current end of the file.
    fn append(&mut self, data: &[u8], verification: Option<&DataVerification>) -> WalResult<()>;

    /// Write `data` at an explicit offset. Direct-I/O sinks require both
    /// `offset` and `data.len()` to honor [`required_alignment`].
    ///
    /// [`required_alignment`]: WritableFile::required_alignment
    fn positioned_append(
        &mut self,
        data: &[u8],
        offset: u64,
        verification: Option<&DataVerification>,
    ) -> WalResult<()>;

    /// Push any sink-internal buffering toward the OS.
    fn flush(&mut self) -> WalResult<()>;

    /// Data-only durability (`fdatasync`-class).
    fn sync(&mut self) -> WalResult<()>;

    /// Data and metadata durability (`fsync`-class).
    fn fsync(&mut self) -> WalResult<()>;

    /// Durability hint covering `[offset, offset + nbytes)`.
    fn range_sync(&mut self, offset: u64, nbytes: u64) -> WalResult<()>;

    /// Set the exact byte length of the file.
    fn truncate(&mut self, size: u64) -> WalResult<()>;

    /// Release the underlying handle.
    fn close(&mut self) -> WalResult<()>;

    /// Advisory notice that `len` bytes are about to land at `offset`.
    fn prepare_write(&mut self, _offset: u64, _len: usize) {}

    /// Whether writes must be aligned positioned appends.
    fn use_direct_io(&self) -> bool {
        false
    }

    /// Alignment direct-I/O writes must honor.
    fn required_alignment(&self) -> usize {
        DEFAULT_PAGE_SIZE
    }

    /// Whether `sync`/`fsync` may run concurrently with an append.
    fn is_sync_thread_safe(&self) -> bool {
        false
    }

    /// Priority write traffic to this file is issued at.
    fn io_priority(&self) -> IoPriority {
        IoPriority::default()
    }
}

/// Open-time knobs for [`FsWritableFile`].
///
/// Direct-I/O intent is declared here; actually opening the descriptor with
/// `O_DIRECT` (or platform equivalent) is the embedder's business, since the
/// flag set differs per platform and filesystem. The writer only needs the
/// alignment discipline the flag implies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FsFileOptions {
    pub use_direct_io: bool,
    pub alignment: usize,
    pub sync_thread_safe: bool,
    pub io_priority: IoPriority,
}

impl Default for FsFileOptions {
    fn default() -> Self {
        Self {
            use_direct_io: false,
            alignment: DEFAULT_PAGE_SIZE,
            sync_thread_safe: true,
            io_priority: IoPriority::default(),
        }
    }
}

/// [`WritableFile`] backed by a [`std::fs::File`].
///
/// When a handoff checksum is supplied the chunk is re-checksummed before the
/// write and the append fails with [`WalError::Corruption`] on mismatch.
#[derive(Debug)]
pub struct FsWritableFile {
    file: File,
    path: PathBuf,
    options: FsFileOptions,
}

impl FsWritableFile {
    /// Create (or truncate) a file at `path` with default options.
    pub fn create(path: &Path) -> WalResult<Self> {
        Self::create_with(path, FsFileOptions::default())
    }

    /// Create (or truncate) a file at `path`.
    pub fn create_with(path: &Path, options: FsFileOptions) -> WalResult<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        Ok(Self::from_file(file, path.to_path_buf(), options))
    }

    /// Wrap an already-open descriptor. The caller is responsible for any
    /// platform flags its `options` imply.
    pub fn from_file(file: File, path: PathBuf, options: FsFileOptions) -> Self {
        Self {
            file,
            path,
            options,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn verify_handoff(data: &[u8], verification: Option<&DataVerification>) -> WalResult<()> {
        if let Some(slot) = verification {
            let computed = checksum::value(data);
            if computed != slot.crc32c() {
                return Err(WalError::Corruption(format!(
                    "handoff checksum mismatch: slot {:08x}, computed {:08x}",
                    slot.crc32c(),
                    computed
                )));
            }
        }
        Ok(())
    }
}

impl WritableFile for FsWritableFile {
    fn append(&mut self, data: &[u8], verification: Option<&DataVerification>) -> WalResult<()> {
        Self::verify_handoff(data, verification)?;
        self.file.write_all(data)?;
        Ok(())
    }

    fn positioned_append(
        &mut self,
        data: &[u8],
        offset: u64,
        verification: Option<&DataVerification>,
    ) -> WalResult<()> {
        Self::verify_handoff(data, verification)?;
        write_all_at(&mut self.file, data, offset)?;
        Ok(())
    }

    fn flush(&mut self) -> WalResult<()> {
        self.file.flush()?;
        Ok(())
    }

    fn sync(&mut self) -> WalResult<()> {
        self.file.sync_data()?;
        Ok(())
    }

    fn fsync(&mut self) -> WalResult<()> {
        self.file.sync_all()?;
        Ok(())
    }

    fn range_sync(&mut self, _offset: u64, _nbytes: u64) -> WalResult<()> {
        // Portable fallback; the range is a hint, not a contract.
        self.file.sync_data()?;
        Ok(())
    }

    fn truncate(&mut self, size: u64) -> WalResult<()> {
        self.file.set_len(size)?;
        Ok(())
    }

    fn close(&mut self) -> WalResult<()> {
        // The descriptor is released when the sink is dropped.
        Ok(())
    }

    fn use_direct_io(&self) -> bool {
        self.options.use_direct_io
    }

    fn required_alignment(&self) -> usize {
        self.options.alignment
    }

    fn is_sync_thread_safe(&self) -> bool {
        self.options.sync_thread_safe
    }

    fn io_priority(&self) -> IoPriority {
        self.options.io_priority
    }
}

#[cfg(unix)]
fn write_all_at(file: &mut File, data: &[u8], offset: u64) -> std::io::Result<()> {
    use std::os::unix::fs::FileExt;
    file.write_all_at(data, offset)
}

#[cfg(not(unix))]
fn write_all_at(file: &mut File, data: &[u8], offset: u64) -> std::io::Result<()> {
    use std::io::{Seek, SeekFrom};
    file.seek(SeekFrom::Start(offset))?;
    file.write_all(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_then_positioned_append() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("sink.log");
        let mut sink = FsWritableFile::create(&path).expect("create");

        sink.append(b"hello world", None).expect("append");
        sink.positioned_append(b"HELLO", 0, None)
            .expect("positioned append");
        sink.sync().expect("sync");

        assert_eq!(b"HELLO world".to_vec(), std::fs::read(&path).expect("read"));
    }

    #[test]
    fn rejects_bad_handoff_checksum() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("sink.log");
        let mut sink = FsWritableFile::create(&path).expect("create");

        let bad = DataVerification::from_crc32c(0xDEAD_BEEF);
        let err = sink.append(b"payload", Some(&bad)).expect_err("must reject");
        assert!(matches!(err, WalError::Corruption(_)));

        let good = DataVerification::from_crc32c(checksum::value(b"payload"));
        sink.append(b"payload", Some(&good)).expect("append");
    }

    #[test]
    fn truncate_sets_exact_length() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("sink.log");
        let mut sink = FsWritableFile::create(&path).expect("create");

        sink.append(&[0xAA; 8192], None).expect("append");
        sink.truncate(5000).expect("truncate");
        sink.fsync().expect("fsync");

        assert_eq!(5000, std::fs::metadata(&path).expect("metadata").len());
    }
}
