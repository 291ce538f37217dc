use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

/// Default page size assumed for padding bounds.
pub const DEFAULT_PAGE_SIZE: usize = 4096;

/// Smallest staging buffer the writer will run with (4 KiB).
const BUFFER_SIZE_MIN_LIMIT: usize = 4 * 1024;

/// Largest staging buffer the writer will run with (128 MiB).
///
/// The buffer is a staging area, not a cache; anything bigger defeats the
/// bypass path for oversized appends.
const BUFFER_SIZE_MAX_LIMIT: usize = 128 * 1024 * 1024;

/// Default initial staging buffer size.
const DEFAULT_INITIAL_BUFFER_SIZE: usize = 64 * 1024;

/// Default ceiling the staging buffer may grow to.
const DEFAULT_MAX_BUFFER_SIZE: usize = 1024 * 1024;

/// Computes the largest power of two that is less than or equal to the input.
#[inline]
fn floor_power_of_two(value: usize) -> usize {
    if value == 0 {
        0
    } else {
        let shift = usize::BITS - 1 - value.leading_zeros();
        1_usize << shift
    }
}

/// Clamps a value to the given range and rounds to the nearest power of two.
#[inline]
fn clamp_power_of_two(value: usize, min: usize, max: usize) -> usize {
    let clamped = value.clamp(min, max);
    if clamped.is_power_of_two() {
        return clamped;
    }

    let lower = floor_power_of_two(clamped).max(min);
    let upper = (lower << 1).min(max).max(min);

    if clamped - lower <= upper.saturating_sub(clamped) {
        lower
    } else {
        upper
    }
}

/// Tuning surface for [`FileWriter`](crate::writer::FileWriter).
///
/// Buffer sizing controls when appends spill to the sink; the sync and
/// verification switches select the durability and handoff-checksum behavior
/// described on the writer itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileWriterOptions {
    /// Capacity the staging buffer starts with.
    pub initial_buffer_size: usize,

    /// Ceiling the staging buffer may grow to. Appends larger than this go
    /// through the bypass path in buffered mode.
    pub max_buffer_size: usize,

    /// Issue a range sync once this many new bytes have been flushed to the
    /// OS cache. Zero disables range syncing.
    pub bytes_per_sync: u64,

    /// Hand a CRC32C of every sink write to the sink for end-to-end
    /// verification.
    pub perform_data_verification: bool,

    /// Maintain a running CRC32C over the staged bytes so whole-buffer
    /// drains carry a single precomputed handoff checksum.
    pub buffered_data_with_checksum: bool,
}

impl Default for FileWriterOptions {
    fn default() -> Self {
        Self {
            initial_buffer_size: DEFAULT_INITIAL_BUFFER_SIZE,
            max_buffer_size: DEFAULT_MAX_BUFFER_SIZE,
            bytes_per_sync: 0,
            perform_data_verification: false,
            buffered_data_with_checksum: false,
        }
    }
}

impl FileWriterOptions {
    /// Returns a copy with buffer sizes rounded into the power-of-two window
    /// and ordered `initial <= max`.
    pub fn normalized(mut self) -> Self {
        let initial_raw = if self.initial_buffer_size == 0 {
            DEFAULT_INITIAL_BUFFER_SIZE
        } else {
            self.initial_buffer_size
        };
        self.initial_buffer_size =
            clamp_power_of_two(initial_raw, BUFFER_SIZE_MIN_LIMIT, BUFFER_SIZE_MAX_LIMIT);

        let max_raw = if self.max_buffer_size == 0 {
            DEFAULT_MAX_BUFFER_SIZE
        } else {
            self.max_buffer_size
        };
        self.max_buffer_size =
            clamp_power_of_two(max_raw, self.initial_buffer_size, BUFFER_SIZE_MAX_LIMIT);

        if self.max_buffer_size < self.initial_buffer_size {
            self.max_buffer_size = self.initial_buffer_size;
        }

        self
    }
}

impl Display for FileWriterOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "FileWriterOptions(initial_buffer_size={}, max_buffer_size={}, bytes_per_sync={}, perform_data_verification={}, buffered_data_with_checksum={})",
            self.initial_buffer_size,
            self.max_buffer_size,
            self.bytes_per_sync,
            self.perform_data_verification,
            self.buffered_data_with_checksum
        )
    }
}

/// Tuning surface for [`LogWriter`](crate::log::LogWriter).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LogWriterOptions {
    /// Generation number of this log file. Only the low 32 bits are encoded
    /// into recyclable record headers.
    pub log_number: u64,

    /// Emit recyclable record headers so the log file can be reused while
    /// stale records remain detectable on read.
    pub recycle_log_files: bool,

    /// Skip the automatic file-writer flush at the end of every
    /// `add_record`; the caller schedules flushes itself.
    pub manual_flush: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_reasonable() {
        let opts = FileWriterOptions::default();
        assert!(opts.initial_buffer_size.is_power_of_two());
        assert!(opts.max_buffer_size.is_power_of_two());
        assert!(opts.initial_buffer_size <= opts.max_buffer_size);
        assert_eq!(0, opts.bytes_per_sync);
    }

    #[test]
    fn normalized_clamps_buffer_bounds() {
        let opts = FileWriterOptions {
            initial_buffer_size: 100_000,
            max_buffer_size: 300 * 1024 * 1024,
            ..FileWriterOptions::default()
        }
        .normalized();

        assert_eq!(128 * 1024, opts.initial_buffer_size);
        assert_eq!(BUFFER_SIZE_MAX_LIMIT, opts.max_buffer_size);
    }

    #[test]
    fn normalized_orders_initial_below_max() {
        let opts = FileWriterOptions {
            initial_buffer_size: 4 * 1024 * 1024,
            max_buffer_size: 64 * 1024,
            ..FileWriterOptions::default()
        }
        .normalized();

        assert!(opts.initial_buffer_size <= opts.max_buffer_size);
    }

    #[test]
    fn serde_round_trip() {
        let opts = FileWriterOptions::default();
        let json = serde_json::to_string(&opts).expect("serialize");
        let decoded: FileWriterOptions = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(opts, decoded);

        let log_opts = LogWriterOptions {
            log_number: 42,
            recycle_log_files: true,
            manual_flush: false,
        };
        let json = serde_json::to_string(&log_opts).expect("serialize");
        let decoded: LogWriterOptions = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(log_opts, decoded);
    }
}
