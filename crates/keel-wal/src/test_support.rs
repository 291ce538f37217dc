//! Shared helpers for exercising the write path in tests.
//!
//! The in-memory sink records every sink-visible operation so tests can
//! assert on chunk boundaries, sync counts, and handoff verification, and it
//! can inject append failures to drive the error-restore paths.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::checksum::{self, DataVerification};
use crate::error::{WalError, WalResult};
use crate::fs::WritableFile;
use crate::limiter::{IoPriority, RateLimiter};
use crate::listener::{EventListener, FileOperationInfo, SyncKind};
use crate::log::{RecordType, BLOCK_SIZE, HEADER_SIZE};

/// Behavior knobs for [`MemoryFile`].
#[derive(Debug, Clone, Copy)]
pub struct MemoryFileOptions {
    pub use_direct_io: bool,
    pub alignment: usize,
    pub sync_thread_safe: bool,
}

impl Default for MemoryFileOptions {
    fn default() -> Self {
        Self {
            use_direct_io: false,
            alignment: 4096,
            sync_thread_safe: true,
        }
    }
}

#[derive(Debug, Default)]
struct MemoryFileState {
    data: Vec<u8>,
    append_sizes: Vec<usize>,
    positioned_appends: Vec<(u64, usize)>,
    flushes: u64,
    syncs: u64,
    fsyncs: u64,
    range_syncs: Vec<(u64, u64)>,
    truncated_to: Option<u64>,
    closed: bool,
    verified_appends: u64,
    fail_appends: u32,
}

impl MemoryFileState {
    fn check_injection(&mut self) -> WalResult<()> {
        if self.fail_appends > 0 {
            self.fail_appends -= 1;
            return Err(WalError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "injected append failure",
            )));
        }
        Ok(())
    }

    fn verify(&mut self, data: &[u8], verification: Option<&DataVerification>) -> WalResult<()> {
        if let Some(slot) = verification {
            let computed = checksum::value(data);
            if computed != slot.crc32c() {
                return Err(WalError::Corruption(format!(
                    "handoff checksum mismatch: slot {:08x}, computed {:08x}",
                    slot.crc32c(),
                    computed
                )));
            }
            self.verified_appends += 1;
        }
        Ok(())
    }
}

/// Inspection handle onto a [`MemoryFile`]'s recorded state.
#[derive(Clone)]
pub struct MemoryFileHandle {
    state: Arc<Mutex<MemoryFileState>>,
}

impl MemoryFileHandle {
    pub fn contents(&self) -> Vec<u8> {
        self.state.lock().data.clone()
    }

    /// Sizes of the individual (non-positioned) sink appends, in order.
    pub fn append_sizes(&self) -> Vec<usize> {
        self.state.lock().append_sizes.clone()
    }

    /// `(offset, len)` of every positioned append, in order.
    pub fn positioned_appends(&self) -> Vec<(u64, usize)> {
        self.state.lock().positioned_appends.clone()
    }

    pub fn flushes(&self) -> u64 {
        self.state.lock().flushes
    }

    pub fn syncs(&self) -> u64 {
        self.state.lock().syncs
    }

    pub fn fsyncs(&self) -> u64 {
        self.state.lock().fsyncs
    }

    /// `(offset, nbytes)` of every range sync, in order.
    pub fn range_syncs(&self) -> Vec<(u64, u64)> {
        self.state.lock().range_syncs.clone()
    }

    pub fn truncated_to(&self) -> Option<u64> {
        self.state.lock().truncated_to
    }

    pub fn closed(&self) -> bool {
        self.state.lock().closed
    }

    /// Number of appends that carried a (matching) handoff checksum.
    pub fn verified_appends(&self) -> u64 {
        self.state.lock().verified_appends
    }

    /// Make the next `count` appends fail with an injected I/O error.
    pub fn inject_append_failures(&self, count: u32) {
        self.state.lock().fail_appends = count;
    }
}

/// In-memory [`WritableFile`] capturing everything the writer hands it.
pub struct MemoryFile {
    state: Arc<Mutex<MemoryFileState>>,
    options: MemoryFileOptions,
}

impl MemoryFile {
    pub fn new() -> Self {
        Self::with_options(MemoryFileOptions::default())
    }

    pub fn with_options(options: MemoryFileOptions) -> Self {
        Self {
            state: Arc::new(Mutex::new(MemoryFileState::default())),
            options,
        }
    }

    pub fn handle(&self) -> MemoryFileHandle {
        MemoryFileHandle {
            state: Arc::clone(&self.state),
        }
    }
}

impl Default for MemoryFile {
    fn default() -> Self {
        Self::new()
    }
}

impl WritableFile for MemoryFile {
    fn append(&mut self, data: &[u8], verification: Option<&DataVerification>) -> WalResult<()> {
        let mut state = self.state.lock();
        state.check_injection()?;
        state.verify(data, verification)?;
        state.data.extend_from_slice(data);
        state.append_sizes.push(data.len());
        Ok(())
    }

    fn positioned_append(
        &mut self,
        data: &[u8],
        offset: u64,
        verification: Option<&DataVerification>,
    ) -> WalResult<()> {
        if self.options.use_direct_io {
            debug_assert_eq!(0, offset % self.options.alignment as u64);
            debug_assert_eq!(0, data.len() % self.options.alignment);
        }
        let mut state = self.state.lock();
        state.check_injection()?;
        state.verify(data, verification)?;
        let offset = offset as usize;
        let end = offset + data.len();
        if state.data.len() < end {
            state.data.resize(end, 0);
        }
        state.data[offset..end].copy_from_slice(data);
        state.positioned_appends.push((offset as u64, data.len()));
        Ok(())
    }

    fn flush(&mut self) -> WalResult<()> {
        self.state.lock().flushes += 1;
        Ok(())
    }

    fn sync(&mut self) -> WalResult<()> {
        self.state.lock().syncs += 1;
        Ok(())
    }

    fn fsync(&mut self) -> WalResult<()> {
        self.state.lock().fsyncs += 1;
        Ok(())
    }

    fn range_sync(&mut self, offset: u64, nbytes: u64) -> WalResult<()> {
        self.state.lock().range_syncs.push((offset, nbytes));
        Ok(())
    }

    fn truncate(&mut self, size: u64) -> WalResult<()> {
        let mut state = self.state.lock();
        state.truncated_to = Some(size);
        state.data.resize(size as usize, 0);
        Ok(())
    }

    fn close(&mut self) -> WalResult<()> {
        self.state.lock().closed = true;
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
}

/// Rate limiter granting at most a fixed quota per request.
pub struct FixedQuotaLimiter {
    quota: usize,
}

impl FixedQuotaLimiter {
    pub fn new(quota: usize) -> Self {
        assert!(quota > 0);
        Self { quota }
    }
}

impl RateLimiter for FixedQuotaLimiter {
    fn request(&self, bytes: usize, _alignment: usize, _priority: IoPriority) -> usize {
        bytes.min(self.quota)
    }
}

/// Listener counting every notification it receives.
#[derive(Debug, Default)]
pub struct CountingListener {
    writes: AtomicU64,
    flushes: AtomicU64,
    syncs: AtomicU64,
    range_syncs: AtomicU64,
    truncates: AtomicU64,
    closes: AtomicU64,
}

impl CountingListener {
    pub fn writes(&self) -> u64 {
        self.writes.load(Ordering::Relaxed)
    }

    pub fn flushes(&self) -> u64 {
        self.flushes.load(Ordering::Relaxed)
    }

    pub fn syncs(&self) -> u64 {
        self.syncs.load(Ordering::Relaxed)
    }

    pub fn range_syncs(&self) -> u64 {
        self.range_syncs.load(Ordering::Relaxed)
    }

    pub fn truncates(&self) -> u64 {
        self.truncates.load(Ordering::Relaxed)
    }

    pub fn closes(&self) -> u64 {
        self.closes.load(Ordering::Relaxed)
    }
}

impl EventListener for CountingListener {
    fn on_write_finish(&self, _info: &FileOperationInfo) {
        self.writes.fetch_add(1, Ordering::Relaxed);
    }

    fn on_flush_finish(&self, _info: &FileOperationInfo) {
        self.flushes.fetch_add(1, Ordering::Relaxed);
    }

    fn on_sync_finish(&self, _info: &FileOperationInfo, _kind: SyncKind) {
        self.syncs.fetch_add(1, Ordering::Relaxed);
    }

    fn on_range_sync_finish(&self, _info: &FileOperationInfo) {
        self.range_syncs.fetch_add(1, Ordering::Relaxed);
    }

    fn on_truncate_finish(&self, _info: &FileOperationInfo) {
        self.truncates.fetch_add(1, Ordering::Relaxed);
    }

    fn on_close_finish(&self, _info: &FileOperationInfo) {
        self.closes.fetch_add(1, Ordering::Relaxed);
    }
}

/// How a fragment participates in a logical record.
enum FragmentKind {
    Full,
    First,
    Middle,
    Last,
}

/// Strictly decode a writer-produced log back into its logical records.
///
/// Verifies block geometry, trailer zeroing, masked checksums, and fragment
/// ordering. With `expected_log_number` set, recyclable records whose
/// embedded log number does not match are corruption (this decoder checks
/// writer output; it never skips stale records the way a recovering reader
/// would).
pub fn decode_records(bytes: &[u8], expected_log_number: Option<u64>) -> WalResult<Vec<Vec<u8>>> {
    let mut records = Vec::new();
    let mut partial: Option<Vec<u8>> = None;
    let mut pos = 0;

    while pos < bytes.len() {
        let block_remaining = BLOCK_SIZE - pos % BLOCK_SIZE;
        if block_remaining < HEADER_SIZE {
            let trailer_end = (pos + block_remaining).min(bytes.len());
            if bytes[pos..trailer_end].iter().any(|&b| b != 0) {
                return Err(WalError::corruption("nonzero block trailer"));
            }
            pos += block_remaining;
            continue;
        }

        if pos + HEADER_SIZE > bytes.len() {
            return Err(WalError::corruption("truncated record header"));
        }

        let stored_crc = u32::from_le_bytes([bytes[pos], bytes[pos + 1], bytes[pos + 2], bytes[pos + 3]]);
        let length = u16::from_le_bytes([bytes[pos + 4], bytes[pos + 5]]) as usize;
        let type_byte = bytes[pos + 6];

        if type_byte == 0 && stored_crc == 0 && length == 0 {
            // Trailer shorter than a recyclable header but at least as long
            // as a legacy one.
            let trailer_end = (pos + block_remaining).min(bytes.len());
            if bytes[pos..trailer_end].iter().any(|&b| b != 0) {
                return Err(WalError::corruption("nonzero block trailer"));
            }
            pos += block_remaining;
            continue;
        }

        let record_type = RecordType::from_byte(type_byte)
            .ok_or_else(|| WalError::corruption(format!("unknown record type {type_byte}")))?;
        let header_size = record_type.header_size();
        if block_remaining < header_size + length || pos + header_size + length > bytes.len() {
            return Err(WalError::corruption("record overruns its block"));
        }

        let mut covered = Vec::with_capacity(1 + 4 + length);
        covered.push(type_byte);
        if record_type.is_recyclable() {
            covered.extend_from_slice(&bytes[pos + 7..pos + 11]);
            if let Some(expected) = expected_log_number {
                let embedded =
                    u32::from_le_bytes([bytes[pos + 7], bytes[pos + 8], bytes[pos + 9], bytes[pos + 10]]);
                if embedded != expected as u32 {
                    return Err(WalError::corruption(format!(
                        "log number mismatch: embedded {embedded:#x}"
                    )));
                }
            }
        }
        let payload = &bytes[pos + header_size..pos + header_size + length];
        covered.extend_from_slice(payload);

        if checksum::unmask(stored_crc) != checksum::value(&covered) {
            return Err(WalError::corruption("record checksum mismatch"));
        }

        let kind = match record_type {
            RecordType::Full | RecordType::RecyclableFull => FragmentKind::Full,
            RecordType::First | RecordType::RecyclableFirst => FragmentKind::First,
            RecordType::Middle | RecordType::RecyclableMiddle => FragmentKind::Middle,
            RecordType::Last | RecordType::RecyclableLast => FragmentKind::Last,
        };
        match kind {
            FragmentKind::Full => {
                if partial.is_some() {
                    return Err(WalError::corruption("FULL record inside a fragment chain"));
                }
                records.push(payload.to_vec());
            }
            FragmentKind::First => {
                if partial.is_some() {
                    return Err(WalError::corruption("FIRST record inside a fragment chain"));
                }
                partial = Some(payload.to_vec());
            }
            FragmentKind::Middle => match partial.as_mut() {
                Some(buf) => buf.extend_from_slice(payload),
                None => return Err(WalError::corruption("MIDDLE record without FIRST")),
            },
            FragmentKind::Last => match partial.take() {
                Some(mut buf) => {
                    buf.extend_from_slice(payload);
                    records.push(buf);
                }
                None => return Err(WalError::corruption("LAST record without FIRST")),
            },
        }

        pos += header_size + length;
    }

    if partial.is_some() {
        return Err(WalError::corruption("unterminated fragment chain"));
    }
    Ok(records)
}

/// Deterministic pseudo-random bytes for test payloads.
pub fn noisy_bytes(len: usize, seed: u32) -> Vec<u8> {
    let mut value = if seed == 0 { 1 } else { seed };
    let mut bytes = Vec::with_capacity(len);
    for _ in 0..len {
        value ^= value << 13;
        value ^= value >> 17;
        value ^= value << 5;
        bytes.push((value & 0xFF) as u8);
    }
    bytes
}
