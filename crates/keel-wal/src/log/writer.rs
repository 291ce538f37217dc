use tracing::warn;

use super::record::{
    RecordType, BLOCK_SIZE, BLOCK_TRAILER, HEADER_SIZE, MAX_RECORD_TYPE, RECYCLABLE_HEADER_SIZE,
};
use crate::checksum;
use crate::config::LogWriterOptions;
use crate::error::WalResult;
use crate::writer::FileWriter;

/// Emitter of the block-structured record log.
///
/// Fragments each logical record into physical records that fit the current
/// block, closing a block with a zero trailer whenever fewer than a header's
/// worth of bytes remain. With recycling enabled the headers carry the low 32
/// bits of the log number so a reader can reject records left over from an
/// earlier life of the file.
pub struct LogWriter {
    dest: FileWriter,
    block_offset: usize,
    log_number: u64,
    recycle_log_files: bool,
    manual_flush: bool,
    /// CRC32C seed of the single type byte, per record type.
    type_crc: [u32; MAX_RECORD_TYPE + 1],
}

impl LogWriter {
    /// Take ownership of `dest` and emit records through it.
    pub fn new(dest: FileWriter, options: LogWriterOptions) -> Self {
        let mut type_crc = [0_u32; MAX_RECORD_TYPE + 1];
        for (value, seed) in type_crc.iter_mut().enumerate() {
            *seed = checksum::value(&[value as u8]);
        }
        Self {
            dest,
            block_offset: 0,
            log_number: options.log_number,
            recycle_log_files: options.recycle_log_files,
            manual_flush: options.manual_flush,
            type_crc,
        }
    }

    /// Emit one logical record as one or more physical records.
    ///
    /// An empty `payload` still emits a single zero-length FULL record.
    /// Unless the writer was created with `manual_flush`, the file writer is
    /// flushed after the record is staged.
    pub fn add_record(&mut self, payload: &[u8]) -> WalResult<()> {
        let header_size = if self.recycle_log_files {
            RECYCLABLE_HEADER_SIZE
        } else {
            HEADER_SIZE
        };

        let mut src = payload;
        let mut begin = true;
        loop {
            let leftover = BLOCK_SIZE - self.block_offset;
            if leftover < header_size {
                // Close the block with a zero trailer and switch to a new one.
                if leftover > 0 {
                    self.dest.append(&BLOCK_TRAILER[..leftover])?;
                }
                self.block_offset = 0;
            }

            // Invariant: never leave fewer than header_size bytes in a block.
            debug_assert!(BLOCK_SIZE - self.block_offset >= header_size);

            let avail = BLOCK_SIZE - self.block_offset - header_size;
            let fragment_length = src.len().min(avail);

            let end = src.len() == fragment_length;
            let record_type = RecordType::for_fragment(begin, end, self.recycle_log_files);

            let (fragment, rest) = src.split_at(fragment_length);
            self.emit_physical_record(record_type, fragment)?;
            src = rest;
            begin = false;

            if src.is_empty() {
                break;
            }
        }

        if !self.manual_flush {
            self.dest.flush()?;
        }
        Ok(())
    }

    /// Drain the file writer's staging buffer to the sink.
    pub fn flush_buffer(&mut self) -> WalResult<()> {
        self.dest.flush()
    }

    /// Make everything emitted so far durable.
    pub fn sync(&mut self, use_fsync: bool) -> WalResult<()> {
        self.dest.sync(use_fsync)
    }

    /// Close the owned file writer. Terminal; see [`FileWriter::close`].
    pub fn close(&mut self) -> WalResult<()> {
        self.dest.close()
    }

    pub fn file(&self) -> &FileWriter {
        &self.dest
    }

    pub fn file_mut(&mut self) -> &mut FileWriter {
        &mut self.dest
    }

    /// Offset within the current block where the next record header lands.
    pub fn block_offset(&self) -> usize {
        self.block_offset
    }

    pub fn log_number(&self) -> u64 {
        self.log_number
    }

    pub fn buffer_is_empty(&self) -> bool {
        self.dest.buffer_is_empty()
    }

    fn emit_physical_record(&mut self, record_type: RecordType, payload: &[u8]) -> WalResult<()> {
        debug_assert!(payload.len() <= 0xFFFF);

        let header_size = record_type.header_size();
        debug_assert!(self.block_offset + header_size + payload.len() <= BLOCK_SIZE);

        let mut header = [0_u8; RECYCLABLE_HEADER_SIZE];
        header[4] = (payload.len() & 0xFF) as u8;
        header[5] = (payload.len() >> 8) as u8;
        header[6] = record_type as u8;

        let mut crc = self.type_crc[record_type as usize];
        if record_type.is_recyclable() {
            // Only the low 32 bits of the log number are encoded; collisions
            // across ~4 billion generations are beyond the CRC's own false
            // positive rate.
            header[7..11].copy_from_slice(&(self.log_number as u32).to_le_bytes());
            crc = checksum::extend(crc, &header[7..11]);
        }

        let payload_crc = checksum::value(payload);
        crc = checksum::combine(crc, payload_crc, payload.len() as u64);
        header[..4].copy_from_slice(&checksum::mask(crc).to_le_bytes());

        let mut result = self.dest.append(&header[..header_size]);
        if result.is_ok() {
            result = self.dest.append_with_checksum(payload, payload_crc);
        }
        // The block cursor advances whether or not the appends succeeded; a
        // failed record still occupies its slot in the block accounting.
        self.block_offset += header_size + payload.len();
        result
    }
}

impl Drop for LogWriter {
    fn drop(&mut self) {
        if !self.dest.is_closed() {
            if let Err(err) = self.dest.flush() {
                warn!(file = %self.dest.file_name(), error = %err, "flush failed during drop");
            }
        }
    }
}

impl std::fmt::Debug for LogWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogWriter")
            .field("dest", &self.dest)
            .field("block_offset", &self.block_offset)
            .field("log_number", &self.log_number)
            .field("recycle_log_files", &self.recycle_log_files)
            .field("manual_flush", &self.manual_flush)
            .finish()
    }
}
