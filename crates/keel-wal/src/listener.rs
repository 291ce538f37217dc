//! Listener notifications for file-operation lifecycle events.
//!
//! Listeners run synchronously on the writing thread, after the sink call
//! they describe completes. Operation timing is only captured when at least
//! one listener is registered.

use std::time::Duration;

/// Completed-operation details handed to listeners.
#[derive(Debug, Clone)]
pub struct FileOperationInfo {
    /// Name the writer was created with.
    pub file_name: String,
    /// Offset the operation applied at. For whole-file operations
    /// (flush, sync, close) this is the logical file size at the time.
    pub offset: u64,
    /// Number of bytes the operation covered, when meaningful.
    pub length: usize,
    /// Wall-clock duration of the sink call.
    pub elapsed: Duration,
    /// Whether the sink call succeeded.
    pub ok: bool,
}

/// Which durability primitive a sync notification refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncKind {
    /// Data-only sync (`fdatasync`-class).
    Sync,
    /// Data and metadata (`fsync`-class).
    Fsync,
}

/// Observer of writer-issued file operations.
///
/// All hooks default to no-ops; implement the ones of interest.
pub trait EventListener: Send + Sync {
    fn on_write_finish(&self, _info: &FileOperationInfo) {}
    fn on_flush_finish(&self, _info: &FileOperationInfo) {}
    fn on_sync_finish(&self, _info: &FileOperationInfo, _kind: SyncKind) {}
    fn on_range_sync_finish(&self, _info: &FileOperationInfo) {}
    fn on_truncate_finish(&self, _info: &FileOperationInfo) {}
    fn on_close_finish(&self, _info: &FileOperationInfo) {}
}
