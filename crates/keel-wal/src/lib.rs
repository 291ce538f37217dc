//! Write path for keel's durable log.
//!
//! This crate is the byte-producing half of the storage engine's write-ahead
//! log: a buffered, rate-limited, checksummed file writer and, layered on
//! top of it, a block-structured record emitter compatible with the log
//! reader's on-disk contract.
//!
//! ## Architecture Overview
//!
//! Two components do the work:
//!
//! - [`FileWriter`]: stages caller bytes in an aligned buffer, drains them to
//!   a [`WritableFile`] sink through an optional rate limiter, and
//!   coordinates durability (flush, trailing-window range syncs, sync/fsync,
//!   close-time truncation under direct I/O). Optionally maintains a running
//!   CRC32C of the staged bytes and hands it to the sink with every drain.
//! - [`LogWriter`]: fragments each logical record into physical records that
//!   fit fixed 32 KiB blocks, each carrying a masked CRC32C over its type,
//!   optional log-number field, and payload.
//!
//! External collaborators stay behind traits: the sink ([`WritableFile`]),
//! the rate limiter ([`RateLimiter`]), the whole-file checksum
//! ([`FileChecksumGenerator`]), and operation listeners ([`EventListener`]).
//!
//! ## Example Usage
//!
//! ```no_run
//! use keel_wal::{
//!     FileWriter, FileWriterOptions, FsWritableFile, LogWriter, LogWriterOptions, WalResult,
//! };
//!
//! fn write_log() -> WalResult<()> {
//!     let sink = FsWritableFile::create(std::path::Path::new("000042.log"))?;
//!     let file = FileWriter::new(Box::new(sink), "000042.log", FileWriterOptions::default());
//!     let mut log = LogWriter::new(file, LogWriterOptions::default());
//!
//!     log.add_record(b"first record")?;
//!     log.add_record(b"second record")?;
//!     log.sync(false)?;
//!     log.close()
//! }
//! ```
//!
//! ## Thread Safety
//!
//! One logical writer owns a `FileWriter`/`LogWriter` pair; operations take
//! `&mut self` and rely on external serialization (typically the engine's
//! write mutex). The single exception is the sink-side contract behind
//! [`FileWriter::sync_without_flush`], which is only legal when the sink
//! reports thread-safe sync.

pub mod buffer;
pub mod checksum;
pub mod config;
pub mod error;
pub mod fs;
pub mod limiter;
pub mod listener;
pub mod log;
pub mod metrics;
pub mod test_support;
pub mod writer;

pub use checksum::{Crc32cFileChecksum, DataVerification, FileChecksumGenerator};
pub use config::{FileWriterOptions, LogWriterOptions, DEFAULT_PAGE_SIZE};
pub use error::{WalError, WalResult};
pub use fs::{FsFileOptions, FsWritableFile, WritableFile};
pub use limiter::{IoPriority, RateLimiter};
pub use listener::{EventListener, FileOperationInfo, SyncKind};
pub use log::{LogWriter, RecordType, BLOCK_SIZE, HEADER_SIZE, RECYCLABLE_HEADER_SIZE};
pub use metrics::{WriterMetrics, WriterMetricsSnapshot};
pub use writer::FileWriter;
