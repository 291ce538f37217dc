//! Buffered, rate-limited, checksummed file writer.
//!
//! [`FileWriter`] stages caller bytes in an [`AlignedBuf`], drains them to a
//! [`WritableFile`] sink through an optional rate limiter, and coordinates
//! durability: flush to the OS cache, periodic range syncs away from the live
//! tail, and whole-file sync/fsync. In direct-I/O mode every sink write is an
//! aligned positioned append; the unaligned tail of the buffer is written
//! zero-padded, then re-fit to the front of the buffer and written again once
//! the page fills out.
//!
//! The writer is not internally synchronized. One logical writer owns it and
//! external locking serializes all operations; `&mut self` receivers encode
//! that contract.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, warn};

use crate::buffer::{round_down, AlignedBuf};
use crate::checksum::{self, DataVerification, FileChecksumGenerator};
use crate::config::{FileWriterOptions, DEFAULT_PAGE_SIZE};
use crate::error::{WalError, WalResult};
use crate::fs::WritableFile;
use crate::limiter::{IoPriority, RateLimiter};
use crate::listener::{EventListener, FileOperationInfo, SyncKind};
use crate::metrics::WriterMetrics;

/// Trailing window excluded from range syncs. Pages this recent may still be
/// rewritten, and some filesystems flush neighbor pages beyond the requested
/// range.
const RANGE_SYNC_RESERVE: u64 = 1024 * 1024;

/// Range-sync end offsets are rounded down to this boundary.
const RANGE_SYNC_ALIGNMENT: u64 = 4 * 1024;

/// Buffered, checksummed writer over a single [`WritableFile`].
pub struct FileWriter {
    file: Option<Box<dyn WritableFile>>,
    file_name: String,
    buf: AlignedBuf,
    max_buffer_size: usize,
    /// Bytes logically appended by callers.
    filesize: u64,
    /// Offset of the next physical write in direct-I/O mode; always a
    /// multiple of the buffer alignment.
    next_write_offset: u64,
    /// Offset up to which a range sync has been issued.
    last_sync_size: u64,
    bytes_per_sync: u64,
    /// Any byte was appended since the last successful sync.
    pending_sync: bool,
    use_direct_io: bool,
    perform_data_verification: bool,
    buffered_data_with_checksum: bool,
    /// CRC32C of exactly the bytes currently staged in `buf`; maintained only
    /// when `buffered_data_with_checksum` is set.
    buffered_data_crc32c: u32,
    rate_limiter: Option<Arc<dyn RateLimiter>>,
    checksum_generator: Option<Box<dyn FileChecksumGenerator>>,
    checksum_finalized: bool,
    listeners: Vec<Arc<dyn EventListener>>,
    metrics: Arc<WriterMetrics>,
}

impl FileWriter {
    /// Take ownership of `file` and stage writes to it per `options`.
    pub fn new(
        file: Box<dyn WritableFile>,
        file_name: impl Into<String>,
        options: FileWriterOptions,
    ) -> Self {
        let options = options.normalized();
        let use_direct_io = file.use_direct_io();
        let alignment = if use_direct_io {
            file.required_alignment()
        } else {
            1
        };
        Self {
            file: Some(file),
            file_name: file_name.into(),
            buf: AlignedBuf::with_capacity(options.initial_buffer_size, alignment),
            max_buffer_size: options.max_buffer_size,
            filesize: 0,
            next_write_offset: 0,
            last_sync_size: 0,
            bytes_per_sync: options.bytes_per_sync,
            pending_sync: false,
            use_direct_io,
            perform_data_verification: options.perform_data_verification,
            buffered_data_with_checksum: options.buffered_data_with_checksum,
            buffered_data_crc32c: 0,
            rate_limiter: None,
            checksum_generator: None,
            checksum_finalized: false,
            listeners: Vec::new(),
            metrics: Arc::new(WriterMetrics::default()),
        }
    }

    /// Share a rate limiter with other writers.
    pub fn with_rate_limiter(mut self, limiter: Arc<dyn RateLimiter>) -> Self {
        self.rate_limiter = Some(limiter);
        self
    }

    /// Maintain a whole-file checksum, finalized once on `close`.
    pub fn with_checksum_generator(mut self, generator: Box<dyn FileChecksumGenerator>) -> Self {
        self.checksum_generator = Some(generator);
        self
    }

    /// Register a listener for file-operation notifications.
    pub fn with_listener(mut self, listener: Arc<dyn EventListener>) -> Self {
        self.listeners.push(listener);
        self
    }

    /// Logically append `data` to the file.
    ///
    /// If the staged bytes plus `data` overflow the buffer, the buffer grows
    /// (doubling, up to the configured maximum) before any flush is taken. In
    /// buffered mode an append larger than the maximum buffer bypasses the
    /// buffer entirely; a sink failure on that path leaves the on-disk state
    /// partially advanced and the writer should be treated as unwritable.
    pub fn append(&mut self, data: &[u8]) -> WalResult<()> {
        self.append_with_checksum(data, 0)
    }

    /// Logically append `data`, supplying a caller-computed CRC32C of the
    /// whole slice.
    ///
    /// A nonzero `handoff_crc32c` is only consulted when data verification
    /// and buffered-data checksumming are both enabled; it lets the writer
    /// fold the caller's checksum into the running buffer checksum instead of
    /// recomputing, provided the slice is not split across flushes.
    pub fn append_with_checksum(&mut self, data: &[u8], handoff_crc32c: u32) -> WalResult<()> {
        self.ensure_open()?;
        self.pending_sync = true;

        if let Some(generator) = self.checksum_generator.as_mut() {
            generator.update(data);
        }
        self.metrics.record_append(data.len() as u64);

        if let Some(file) = self.file.as_mut() {
            file.prepare_write(self.filesize, data.len());
        }

        // Enlarge the buffer rather than flush while there is room to grow.
        if self.buf.capacity() - self.buf.len() < data.len() {
            let mut cap = self.buf.capacity();
            while cap < self.max_buffer_size {
                let desired = (cap * 2).min(self.max_buffer_size);
                if desired - self.buf.len() >= data.len()
                    || (self.use_direct_io && desired == self.max_buffer_size)
                {
                    self.buf.reallocate(desired, true);
                    self.metrics.record_buffer_grow();
                    break;
                }
                cap *= 2;
            }
        }

        // Flush only when buffered I/O.
        if !self.use_direct_io && self.buf.capacity() - self.buf.len() < data.len() {
            if !self.buf.is_empty() {
                self.flush()?;
            }
            debug_assert!(self.buf.is_empty());
        }

        let verified_handoff = self.perform_data_verification
            && self.buffered_data_with_checksum
            && handoff_crc32c != 0;
        if verified_handoff {
            // The caller's checksum covers the whole slice, so the slice must
            // survive un-split: stage it whole, or bypass the buffer whole.
            if self.use_direct_io || self.buf.capacity() - self.buf.len() >= data.len() {
                if self.buf.capacity() - self.buf.len() >= data.len() {
                    let appended = self.buf.append(data);
                    if appended != data.len() {
                        return Err(WalError::corruption("write buffer append failure"));
                    }
                    self.buffered_data_crc32c = checksum::combine(
                        self.buffered_data_crc32c,
                        handoff_crc32c,
                        appended as u64,
                    );
                } else {
                    // Direct I/O with a slice larger than the ceiling: fall
                    // back to per-chunk extension, losing the handoff.
                    self.stage_in_chunks(data)?;
                }
            } else {
                debug_assert!(self.buf.is_empty());
                self.buffered_data_crc32c = handoff_crc32c;
                let result = self.write_buffered_with_checksum(data, self.filesize);
                self.buffered_data_crc32c = 0;
                result?;
            }
        } else if self.use_direct_io || self.buf.capacity() - self.buf.len() >= data.len() {
            self.stage_in_chunks(data)?;
        } else {
            // Oversized append in buffered mode: bypass the buffer.
            debug_assert!(self.buf.is_empty());
            if self.perform_data_verification && self.buffered_data_with_checksum {
                self.buffered_data_crc32c = checksum::value(data);
                let result = self.write_buffered_with_checksum(data, self.filesize);
                self.buffered_data_crc32c = 0;
                result?;
            } else {
                self.write_buffered(data, self.filesize)?;
            }
        }

        self.filesize += data.len() as u64;
        Ok(())
    }

    /// Append `pad_bytes` zero bytes. `pad_bytes` must be smaller than the
    /// default page size; padding always goes through the buffer.
    pub fn pad(&mut self, pad_bytes: usize) -> WalResult<()> {
        self.ensure_open()?;
        assert!(pad_bytes < DEFAULT_PAGE_SIZE);

        let mut left = pad_bytes;
        while left > 0 {
            let chunk = left.min(self.buf.capacity() - self.buf.len());
            let pad_start = self.buf.len();
            self.buf.pad_with(chunk, 0);
            if self.perform_data_verification && self.buffered_data_with_checksum {
                self.buffered_data_crc32c =
                    checksum::extend(self.buffered_data_crc32c, &self.buf.filled()[pad_start..]);
            }
            left -= chunk;
            if left > 0 {
                self.flush()?;
            }
        }

        self.pending_sync = true;
        self.filesize += pad_bytes as u64;
        Ok(())
    }

    /// Drain the staging buffer to the sink and notify it.
    ///
    /// In buffered mode, once enough new bytes have reached the OS cache a
    /// range sync is issued for everything older than the trailing reserve
    /// window, keeping durability work away from pages still being written.
    pub fn flush(&mut self) -> WalResult<()> {
        self.ensure_open()?;

        if !self.buf.is_empty() {
            if self.use_direct_io {
                if self.pending_sync {
                    if self.perform_data_verification && self.buffered_data_with_checksum {
                        self.write_direct_with_checksum()?;
                    } else {
                        self.write_direct()?;
                    }
                }
            } else {
                let drained = std::mem::take(&mut self.buf);
                let base_offset = self.filesize - drained.len() as u64;
                let result = if self.perform_data_verification && self.buffered_data_with_checksum
                {
                    self.write_buffered_with_checksum(drained.filled(), base_offset)
                } else {
                    self.write_buffered(drained.filled(), base_offset)
                };
                self.buf = drained;
                result?;
                self.buf.set_size(0);
                self.buffered_data_crc32c = 0;
            }
        }

        let started = self.listener_clock();
        let result = match self.file.as_mut() {
            Some(file) => file.flush(),
            None => Err(WalError::Closed),
        };
        self.notify_flush(started, result.is_ok());
        result?;
        self.metrics.record_flush();

        if !self.use_direct_io && self.bytes_per_sync > 0 && self.filesize > RANGE_SYNC_RESERVE {
            let mut offset_sync_to = self.filesize - RANGE_SYNC_RESERVE;
            offset_sync_to -= offset_sync_to % RANGE_SYNC_ALIGNMENT;
            debug_assert!(offset_sync_to >= self.last_sync_size);
            if offset_sync_to > 0 && offset_sync_to - self.last_sync_size >= self.bytes_per_sync {
                self.range_sync(self.last_sync_size, offset_sync_to - self.last_sync_size)?;
                self.last_sync_size = offset_sync_to;
            }
        }

        Ok(())
    }

    /// Flush, then make the flushed bytes durable.
    ///
    /// `use_fsync` selects full fsync over data-only sync. On success no
    /// bytes remain pending.
    pub fn sync(&mut self, use_fsync: bool) -> WalResult<()> {
        self.flush()?;
        if !self.use_direct_io && self.pending_sync {
            self.sync_internal(use_fsync)?;
        }
        self.pending_sync = false;
        Ok(())
    }

    /// Sync without draining the buffer.
    ///
    /// Only legal when the sink reports thread-safe sync; bytes still staged
    /// in the buffer stay pending, so this never clears `pending_sync`.
    pub fn sync_without_flush(&mut self, use_fsync: bool) -> WalResult<()> {
        let Some(file) = self.file.as_ref() else {
            return Err(WalError::Closed);
        };
        if !file.is_sync_thread_safe() {
            return Err(WalError::not_supported(
                "sync_without_flush requires a sink with thread-safe sync",
            ));
        }
        self.sync_internal(use_fsync)
    }

    /// Durability hint for `[offset, offset + nbytes)`.
    pub fn range_sync(&mut self, offset: u64, nbytes: u64) -> WalResult<()> {
        let started = self.listener_clock();
        let result = match self.file.as_mut() {
            Some(file) => file.range_sync(offset, nbytes),
            None => Err(WalError::Closed),
        };
        self.metrics.record_range_sync();
        debug!(offset, nbytes, ok = result.is_ok(), "issued range sync");
        self.notify_range_sync(offset, nbytes, started, result.is_ok());
        result
    }

    /// Flush, finish direct-I/O bookkeeping, and release the sink handle.
    ///
    /// Every sub-step runs even after an earlier failure; the earliest
    /// failure is returned. Closing an already-closed writer is a no-op; any
    /// other operation on a closed writer fails with [`WalError::Closed`].
    pub fn close(&mut self) -> WalResult<()> {
        if self.file.is_none() {
            return Ok(());
        }

        let mut result = self.flush();

        let Some(mut file) = self.file.take() else {
            return result;
        };

        if self.use_direct_io {
            // Direct I/O wrote whole pages; trim the file to the logical
            // size, then make the new length durable.
            let started = self.listener_clock();
            let interim = file.truncate(self.filesize);
            self.notify_truncate(started, interim.is_ok());
            let interim = match interim {
                Ok(()) => {
                    let started = self.listener_clock();
                    let sync_result = file.fsync();
                    self.metrics.record_sync(true);
                    self.notify_sync(started, sync_result.is_ok(), SyncKind::Fsync);
                    sync_result
                }
                Err(err) => Err(err),
            };
            result = result.and(interim);
        }

        let started = self.listener_clock();
        let close_result = file.close();
        self.notify_close(started, close_result.is_ok());
        result = result.and(close_result);
        drop(file);

        if result.is_ok() {
            if let Some(generator) = self.checksum_generator.as_mut() {
                if !self.checksum_finalized {
                    generator.finalize();
                    self.checksum_finalized = true;
                }
            }
        }

        result
    }

    /// Bytes logically appended so far.
    pub fn file_size(&self) -> u64 {
        self.filesize
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn buffer_is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Whether any byte was appended since the last successful sync.
    pub fn pending_sync(&self) -> bool {
        self.pending_sync
    }

    pub fn use_direct_io(&self) -> bool {
        self.use_direct_io
    }

    /// Offset of the next physical write in direct-I/O mode.
    pub fn next_write_offset(&self) -> u64 {
        self.next_write_offset
    }

    pub fn is_closed(&self) -> bool {
        self.file.is_none()
    }

    /// Digest of the whole-file checksum generator, available after a
    /// successful `close`.
    pub fn file_checksum(&self) -> Option<String> {
        self.checksum_generator.as_ref().map(|generator| {
            debug_assert!(self.checksum_finalized);
            generator.checksum()
        })
    }

    pub fn file_checksum_func_name(&self) -> Option<&'static str> {
        self.checksum_generator
            .as_ref()
            .map(|generator| generator.name())
    }

    pub fn metrics(&self) -> Arc<WriterMetrics> {
        Arc::clone(&self.metrics)
    }

    fn ensure_open(&self) -> WalResult<()> {
        if self.file.is_none() {
            return Err(WalError::Closed);
        }
        Ok(())
    }

    fn sink_priority(&self) -> IoPriority {
        self.file
            .as_ref()
            .map(|file| file.io_priority())
            .unwrap_or_default()
    }

    /// Stage `data` through the buffer, flushing whenever it fills.
    fn stage_in_chunks(&mut self, data: &[u8]) -> WalResult<()> {
        let mut src = data;
        while !src.is_empty() {
            let appended = self.buf.append(src);
            if self.perform_data_verification && self.buffered_data_with_checksum {
                self.buffered_data_crc32c =
                    checksum::extend(self.buffered_data_crc32c, &src[..appended]);
            }
            src = &src[appended..];
            if !src.is_empty() {
                self.flush()?;
            }
        }
        Ok(())
    }

    /// Rate-limited drain of `data` to the sink, chunk by chunk.
    ///
    /// Does not touch the staging buffer or the running checksum; the drain
    /// callsite resets those after success.
    fn write_buffered(&mut self, data: &[u8], base_offset: u64) -> WalResult<()> {
        debug_assert!(!self.use_direct_io);
        let priority = self.sink_priority();

        let mut written = 0;
        while written < data.len() {
            let left = data.len() - written;
            let allowed = match &self.rate_limiter {
                Some(limiter) => limiter.request(left, 0, priority),
                None => left,
            };

            let started = self.listener_clock();
            let result = {
                let chunk = &data[written..written + allowed];
                let verification = self
                    .perform_data_verification
                    .then(|| DataVerification::from_crc32c(checksum::value(chunk)));
                match self.file.as_mut() {
                    Some(file) => file.append(chunk, verification.as_ref()),
                    None => Err(WalError::Closed),
                }
            };
            self.notify_write(base_offset + written as u64, allowed, started, result.is_ok());
            result?;
            self.metrics.record_sink_write(allowed as u64);
            written += allowed;
        }
        Ok(())
    }

    /// Emit `data` as a single sink append carrying the running buffer
    /// checksum as the handoff.
    ///
    /// The rate limiter is consumed up front in a loop until the full size is
    /// authorized; smoothing is traded away to keep the write contiguous.
    fn write_buffered_with_checksum(&mut self, data: &[u8], base_offset: u64) -> WalResult<()> {
        debug_assert!(!self.use_direct_io);
        debug_assert!(self.perform_data_verification && self.buffered_data_with_checksum);
        let priority = self.sink_priority();

        if let Some(limiter) = &self.rate_limiter {
            let mut remaining = data.len();
            while remaining > 0 {
                remaining -= limiter.request(remaining, self.buf.alignment(), priority);
            }
        }

        let verification = DataVerification::from_crc32c(self.buffered_data_crc32c);
        let started = self.listener_clock();
        let result = match self.file.as_mut() {
            Some(file) => file.append(data, Some(&verification)),
            None => Err(WalError::Closed),
        };
        self.notify_write(base_offset, data.len(), started, result.is_ok());
        result?;
        self.metrics.record_sink_write(data.len() as u64);
        Ok(())
    }

    /// Drain the buffer with aligned positioned appends.
    ///
    /// The buffer is zero-padded up to the alignment; on success the
    /// unaligned tail is re-fit to the front of the buffer and the write
    /// offset advances by the whole pages written. On failure the padding is
    /// discarded and the write offset is unchanged.
    fn write_direct(&mut self) -> WalResult<()> {
        debug_assert!(self.use_direct_io);
        let alignment = self.buf.alignment();
        debug_assert_eq!(0, self.next_write_offset % alignment as u64);

        let file_advance = round_down(self.buf.len(), alignment);
        let leftover_tail = self.buf.len() - file_advance;

        self.buf.pad_to_alignment_with(0);

        let priority = self.sink_priority();
        let total = self.buf.len();
        let mut written = 0;
        while written < total {
            let left = total - written;
            let allowed = match &self.rate_limiter {
                Some(limiter) => limiter.request(left, alignment, priority),
                None => left,
            };

            let started = self.listener_clock();
            let write_offset = self.next_write_offset + written as u64;
            let result = {
                let chunk = &self.buf.filled()[written..written + allowed];
                let verification = self
                    .perform_data_verification
                    .then(|| DataVerification::from_crc32c(checksum::value(chunk)));
                match self.file.as_mut() {
                    Some(file) => file.positioned_append(chunk, write_offset, verification.as_ref()),
                    None => Err(WalError::Closed),
                }
            };
            self.notify_write(write_offset, allowed, started, result.is_ok());
            if let Err(err) = result {
                self.buf.set_size(file_advance + leftover_tail);
                return Err(err);
            }
            self.metrics.record_sink_write(allowed as u64);
            written += allowed;
        }

        self.buf.refit_tail(file_advance, leftover_tail);
        self.next_write_offset += file_advance as u64;
        Ok(())
    }

    /// [`write_direct`](Self::write_direct), emitting the whole padded buffer
    /// as one positioned append carrying the running checksum.
    fn write_direct_with_checksum(&mut self) -> WalResult<()> {
        debug_assert!(self.use_direct_io);
        debug_assert!(self.perform_data_verification && self.buffered_data_with_checksum);
        let alignment = self.buf.alignment();
        debug_assert_eq!(0, self.next_write_offset % alignment as u64);

        let file_advance = round_down(self.buf.len(), alignment);
        let leftover_tail = self.buf.len() - file_advance;

        let pad_start = self.buf.len();
        self.buf.pad_to_alignment_with(0);
        let padding = &self.buf.filled()[pad_start..];
        let padded_crc = checksum::value(padding);
        let padded_len = padding.len() as u64;
        self.buffered_data_crc32c =
            checksum::combine(self.buffered_data_crc32c, padded_crc, padded_len);

        let priority = self.sink_priority();
        if let Some(limiter) = &self.rate_limiter {
            let mut remaining = self.buf.len();
            while remaining > 0 {
                remaining -= limiter.request(remaining, alignment, priority);
            }
        }

        let verification = DataVerification::from_crc32c(self.buffered_data_crc32c);
        let started = self.listener_clock();
        let write_offset = self.next_write_offset;
        let total = self.buf.len();
        let result = {
            let data = self.buf.filled();
            match self.file.as_mut() {
                Some(file) => file.positioned_append(data, write_offset, Some(&verification)),
                None => Err(WalError::Closed),
            }
        };
        self.notify_write(write_offset, total, started, result.is_ok());
        if let Err(err) = result {
            // The padded suffix is discarded, so the running checksum must be
            // rebuilt from what stays staged.
            self.buf.set_size(file_advance + leftover_tail);
            self.buffered_data_crc32c = checksum::value(self.buf.filled());
            return Err(err);
        }
        self.metrics.record_sink_write(total as u64);

        self.buf.refit_tail(file_advance, leftover_tail);
        self.buffered_data_crc32c = checksum::value(self.buf.filled());
        self.next_write_offset += file_advance as u64;
        Ok(())
    }

    fn sync_internal(&mut self, use_fsync: bool) -> WalResult<()> {
        let started = self.listener_clock();
        let result = match self.file.as_mut() {
            Some(file) => {
                if use_fsync {
                    file.fsync()
                } else {
                    file.sync()
                }
            }
            None => Err(WalError::Closed),
        };
        self.metrics.record_sync(use_fsync);
        let kind = if use_fsync {
            SyncKind::Fsync
        } else {
            SyncKind::Sync
        };
        self.notify_sync(started, result.is_ok(), kind);
        result
    }

    fn listener_clock(&self) -> Option<Instant> {
        (!self.listeners.is_empty()).then(Instant::now)
    }

    fn notify(
        &self,
        started: Option<Instant>,
        offset: u64,
        length: usize,
        ok: bool,
        hook: impl Fn(&dyn EventListener, &FileOperationInfo),
    ) {
        let Some(started) = started else {
            return;
        };
        let info = FileOperationInfo {
            file_name: self.file_name.clone(),
            offset,
            length,
            elapsed: started.elapsed(),
            ok,
        };
        for listener in &self.listeners {
            hook(listener.as_ref(), &info);
        }
    }

    fn notify_write(&self, offset: u64, length: usize, started: Option<Instant>, ok: bool) {
        self.notify(started, offset, length, ok, |listener, info| {
            listener.on_write_finish(info)
        });
    }

    fn notify_flush(&self, started: Option<Instant>, ok: bool) {
        self.notify(started, self.filesize, 0, ok, |listener, info| {
            listener.on_flush_finish(info)
        });
    }

    fn notify_sync(&self, started: Option<Instant>, ok: bool, kind: SyncKind) {
        self.notify(started, self.filesize, 0, ok, |listener, info| {
            listener.on_sync_finish(info, kind)
        });
    }

    fn notify_range_sync(&self, offset: u64, nbytes: u64, started: Option<Instant>, ok: bool) {
        self.notify(started, offset, nbytes as usize, ok, |listener, info| {
            listener.on_range_sync_finish(info)
        });
    }

    fn notify_truncate(&self, started: Option<Instant>, ok: bool) {
        self.notify(started, self.filesize, 0, ok, |listener, info| {
            listener.on_truncate_finish(info)
        });
    }

    fn notify_close(&self, started: Option<Instant>, ok: bool) {
        self.notify(started, self.filesize, 0, ok, |listener, info| {
            listener.on_close_finish(info)
        });
    }
}

impl Drop for FileWriter {
    fn drop(&mut self) {
        if self.file.is_some() {
            if let Err(err) = self.close() {
                warn!(file = %self.file_name, error = %err, "close failed during drop");
            }
        }
    }
}

impl std::fmt::Debug for FileWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileWriter")
            .field("file_name", &self.file_name)
            .field("filesize", &self.filesize)
            .field("buffered", &self.buf.len())
            .field("pending_sync", &self.pending_sync)
            .field("use_direct_io", &self.use_direct_io)
            .field("closed", &self.file.is_none())
            .finish()
    }
}
