//! Block-structured record log layered on the file writer.
//!
//! The log is a sequence of fixed 32 KiB blocks. Each block carries whole
//! physical records and ends with a short all-zero trailer when too little
//! room remains for another header. A logical record is one FULL physical
//! record, or a FIRST / MIDDLE* / LAST chain when it spans blocks.

mod record;
mod writer;

pub use record::{RecordType, BLOCK_SIZE, HEADER_SIZE, RECYCLABLE_HEADER_SIZE};
pub use writer::LogWriter;
