//! On-disk constants of the block format, shared with the reader's contract.

/// Fixed size of a log block.
pub const BLOCK_SIZE: usize = 32 * 1024;

/// Legacy header: checksum (4B) + length (2B) + type (1B).
pub const HEADER_SIZE: usize = 7;

/// Recyclable header: legacy header + low 32 bits of the log number (4B).
pub const RECYCLABLE_HEADER_SIZE: usize = 11;

/// All-zero literal a block trailer is drawn from; holds any trailer shorter
/// than a header.
pub(crate) const BLOCK_TRAILER: [u8; RECYCLABLE_HEADER_SIZE - 1] = [0; RECYCLABLE_HEADER_SIZE - 1];

// The trailer literal must cover every possible leftover below a header.
const _: () = assert!(HEADER_SIZE <= BLOCK_TRAILER.len() + 1);
const _: () = assert!(RECYCLABLE_HEADER_SIZE <= BLOCK_TRAILER.len() + 1);

/// Physical record types, as read back by the log reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RecordType {
    Full = 1,
    First = 2,
    Middle = 3,
    Last = 4,
    RecyclableFull = 5,
    RecyclableFirst = 6,
    RecyclableMiddle = 7,
    RecyclableLast = 8,
}

/// Largest type value; bounds the per-type checksum seed table.
pub(crate) const MAX_RECORD_TYPE: usize = RecordType::RecyclableLast as usize;

impl RecordType {
    /// Select the type for a fragment position, `begin`/`end` marking the
    /// first and last fragments of the logical record.
    pub(crate) fn for_fragment(begin: bool, end: bool, recyclable: bool) -> Self {
        match (begin, end, recyclable) {
            (true, true, false) => Self::Full,
            (true, false, false) => Self::First,
            (false, true, false) => Self::Last,
            (false, false, false) => Self::Middle,
            (true, true, true) => Self::RecyclableFull,
            (true, false, true) => Self::RecyclableFirst,
            (false, true, true) => Self::RecyclableLast,
            (false, false, true) => Self::RecyclableMiddle,
        }
    }

    /// Whether the header carries a log-number field.
    #[inline]
    pub fn is_recyclable(self) -> bool {
        self as u8 >= Self::RecyclableFull as u8
    }

    pub fn from_byte(byte: u8) -> Option<Self> {
        Some(match byte {
            1 => Self::Full,
            2 => Self::First,
            3 => Self::Middle,
            4 => Self::Last,
            5 => Self::RecyclableFull,
            6 => Self::RecyclableFirst,
            7 => Self::RecyclableMiddle,
            8 => Self::RecyclableLast,
            _ => return None,
        })
    }

    /// Header size of a record of this type.
    #[inline]
    pub fn header_size(self) -> usize {
        if self.is_recyclable() {
            RECYCLABLE_HEADER_SIZE
        } else {
            HEADER_SIZE
        }
    }
}
