//! On-disk format scenarios for the block-structured log.

use keel_wal::checksum;
use keel_wal::config::{FileWriterOptions, LogWriterOptions};
use keel_wal::log::{LogWriter, RecordType, BLOCK_SIZE, HEADER_SIZE, RECYCLABLE_HEADER_SIZE};
use keel_wal::test_support::{decode_records, noisy_bytes, MemoryFile, MemoryFileHandle};
use keel_wal::writer::FileWriter;

fn log_writer(options: LogWriterOptions) -> (LogWriter, MemoryFileHandle) {
    let file = MemoryFile::new();
    let handle = file.handle();
    let dest = FileWriter::new(Box::new(file), "scenario.log", FileWriterOptions::default());
    (LogWriter::new(dest, options), handle)
}

fn masked_record_crc(record_type: RecordType, payload: &[u8]) -> u32 {
    let mut covered = vec![record_type as u8];
    covered.extend_from_slice(payload);
    checksum::mask(checksum::value(&covered))
}

#[test]
fn two_small_records_share_a_block() {
    let (mut writer, handle) = log_writer(LogWriterOptions::default());

    writer.add_record(b"AB").expect("add record");
    writer.add_record(b"CDE").expect("add record");
    assert_eq!(7 + 2 + 7 + 3, writer.block_offset());

    let bytes = handle.contents();
    assert_eq!(19, bytes.len());

    // First physical record: FULL, length 2.
    let crc = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
    assert_eq!(masked_record_crc(RecordType::Full, b"AB"), crc);
    assert_eq!(2, u16::from_le_bytes([bytes[4], bytes[5]]));
    assert_eq!(RecordType::Full as u8, bytes[6]);
    assert_eq!(b"AB", &bytes[7..9]);

    // Second physical record: FULL, length 3.
    let crc = u32::from_le_bytes([bytes[9], bytes[10], bytes[11], bytes[12]]);
    assert_eq!(masked_record_crc(RecordType::Full, b"CDE"), crc);
    assert_eq!(3, u16::from_le_bytes([bytes[13], bytes[14]]));
    assert_eq!(RecordType::Full as u8, bytes[15]);
    assert_eq!(b"CDE", &bytes[16..19]);

    let records = decode_records(&bytes, None).expect("decode");
    assert_eq!(vec![b"AB".to_vec(), b"CDE".to_vec()], records);
}

#[test]
fn near_full_block_gets_a_one_byte_trailer() {
    let (mut writer, handle) = log_writer(LogWriterOptions::default());

    let big = vec![b'X'; 32_760];
    writer.add_record(&big).expect("add record");
    assert_eq!(32_767, writer.block_offset());

    // One byte left in the block: trailer it and start a new block.
    writer.add_record(b"Y").expect("add record");
    assert_eq!(HEADER_SIZE + 1, writer.block_offset());

    let bytes = handle.contents();
    assert_eq!(BLOCK_SIZE + HEADER_SIZE + 1, bytes.len());
    assert_eq!(0, bytes[32_767]);
    assert_eq!(1, u16::from_le_bytes([bytes[BLOCK_SIZE + 4], bytes[BLOCK_SIZE + 5]]));
    assert_eq!(RecordType::Full as u8, bytes[BLOCK_SIZE + 6]);
    assert_eq!(b'Y', bytes[BLOCK_SIZE + 7]);

    let records = decode_records(&bytes, None).expect("decode");
    assert_eq!(vec![big, b"Y".to_vec()], records);
}

#[test]
fn oversized_record_is_fragmented_across_blocks() {
    let (mut writer, handle) = log_writer(LogWriterOptions::default());

    let big = vec![b'Z'; 40_000];
    writer.add_record(&big).expect("add record");
    assert_eq!(7 + 7239, writer.block_offset());

    let bytes = handle.contents();
    assert_eq!(BLOCK_SIZE + 7 + 7239, bytes.len());

    // FIRST fragment fills the block's payload capacity exactly.
    assert_eq!(32_761, u16::from_le_bytes([bytes[4], bytes[5]]) as usize);
    assert_eq!(RecordType::First as u8, bytes[6]);

    // LAST fragment carries the remainder at the head of the next block.
    assert_eq!(7239, u16::from_le_bytes([bytes[BLOCK_SIZE + 4], bytes[BLOCK_SIZE + 5]]) as usize);
    assert_eq!(RecordType::Last as u8, bytes[BLOCK_SIZE + 6]);

    let records = decode_records(&bytes, None).expect("decode");
    assert_eq!(vec![big], records);
}

#[test]
fn exact_fit_record_consumes_the_whole_block() {
    let (mut writer, handle) = log_writer(LogWriterOptions::default());

    let exact = vec![0xA5_u8; BLOCK_SIZE - HEADER_SIZE];
    writer.add_record(&exact).expect("add record");
    assert_eq!(BLOCK_SIZE, writer.block_offset());

    // The next record starts a fresh block without any trailer bytes.
    writer.add_record(b"next").expect("add record");
    assert_eq!(HEADER_SIZE + 4, writer.block_offset());

    let bytes = handle.contents();
    assert_eq!(BLOCK_SIZE + HEADER_SIZE + 4, bytes.len());
    assert_eq!(RecordType::Full as u8, bytes[BLOCK_SIZE + 6]);

    let records = decode_records(&bytes, None).expect("decode");
    assert_eq!(vec![exact, b"next".to_vec()], records);
}

#[test]
fn recyclable_record_embeds_log_number() {
    let log_number = 0x0000_0001_0000_0042_u64;
    let (mut writer, handle) = log_writer(LogWriterOptions {
        log_number,
        recycle_log_files: true,
        manual_flush: false,
    });

    writer.add_record(b"hi").expect("add record");
    assert_eq!(RECYCLABLE_HEADER_SIZE + 2, writer.block_offset());

    let bytes = handle.contents();
    assert_eq!(RECYCLABLE_HEADER_SIZE + 2, bytes.len());
    assert_eq!(RecordType::RecyclableFull as u8, bytes[6]);
    // Low 32 bits only, little-endian.
    assert_eq!(&[0x42, 0x00, 0x00, 0x00], &bytes[7..11]);

    let mut covered = vec![RecordType::RecyclableFull as u8, 0x42, 0x00, 0x00, 0x00];
    covered.extend_from_slice(b"hi");
    let stored = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
    assert_eq!(checksum::mask(checksum::value(&covered)), stored);

    let records = decode_records(&bytes, Some(log_number)).expect("decode");
    assert_eq!(vec![b"hi".to_vec()], records);
}

#[test]
fn empty_record_advances_by_header_size() {
    let (mut writer, handle) = log_writer(LogWriterOptions::default());

    writer.add_record(b"").expect("add record");
    assert_eq!(HEADER_SIZE, writer.block_offset());

    let records = decode_records(&handle.contents(), None).expect("decode");
    assert_eq!(vec![Vec::<u8>::new()], records);
}

#[test]
fn legacy_round_trip_over_mixed_sizes() {
    let (mut writer, handle) = log_writer(LogWriterOptions::default());

    let payloads: Vec<Vec<u8>> = vec![
        Vec::new(),
        noisy_bytes(1, 1),
        noisy_bytes(7, 2),
        noisy_bytes(1000, 3),
        noisy_bytes(BLOCK_SIZE - HEADER_SIZE, 4),
        Vec::new(),
        noisy_bytes(40_000, 5),
        noisy_bytes(100_000, 6),
        noisy_bytes(3, 7),
    ];
    for payload in &payloads {
        writer.add_record(payload).expect("add record");
    }
    writer.sync(false).expect("sync");

    let bytes = handle.contents();
    assert_eq!(writer.file().file_size(), bytes.len() as u64);

    let records = decode_records(&bytes, None).expect("decode");
    assert_eq!(payloads, records);
}

#[test]
fn recyclable_round_trip_over_mixed_sizes() {
    let log_number = 9_000_000_017_u64;
    let (mut writer, handle) = log_writer(LogWriterOptions {
        log_number,
        recycle_log_files: true,
        manual_flush: false,
    });

    let payloads: Vec<Vec<u8>> = vec![
        noisy_bytes(11, 10),
        Vec::new(),
        noisy_bytes(BLOCK_SIZE - RECYCLABLE_HEADER_SIZE, 11),
        noisy_bytes(70_000, 12),
        noisy_bytes(2, 13),
    ];
    for payload in &payloads {
        writer.add_record(payload).expect("add record");
    }
    writer.close().expect("close");

    let records = decode_records(&handle.contents(), Some(log_number)).expect("decode");
    assert_eq!(payloads, records);
}

#[test]
fn fragment_lengths_sum_to_the_logical_length() {
    let (mut writer, handle) = log_writer(LogWriterOptions::default());

    let payload = noisy_bytes(90_000, 21);
    writer.add_record(&payload).expect("add record");

    // Walk the raw physical records: FIRST, MIDDLE*, LAST, lengths summing
    // to the logical length.
    let bytes = handle.contents();
    let mut pos = 0;
    let mut kinds = Vec::new();
    let mut total = 0_usize;
    while pos < bytes.len() {
        let block_remaining = BLOCK_SIZE - pos % BLOCK_SIZE;
        if block_remaining < HEADER_SIZE {
            pos += block_remaining;
            continue;
        }
        let length = u16::from_le_bytes([bytes[pos + 4], bytes[pos + 5]]) as usize;
        kinds.push(bytes[pos + 6]);
        total += length;
        pos += HEADER_SIZE + length;
    }

    assert_eq!(payload.len(), total);
    assert_eq!(RecordType::First as u8, *kinds.first().expect("fragments"));
    assert_eq!(RecordType::Last as u8, *kinds.last().expect("fragments"));
    assert!(kinds[1..kinds.len() - 1]
        .iter()
        .all(|&kind| kind == RecordType::Middle as u8));

    let records = decode_records(&bytes, None).expect("decode");
    assert_eq!(vec![payload], records);
}

#[test]
fn blocks_are_exactly_sized_with_zero_trailers() {
    let (mut writer, handle) = log_writer(LogWriterOptions::default());

    // Sizes chosen to land near block boundaries repeatedly.
    for index in 0..200_u32 {
        writer
            .add_record(&noisy_bytes(163 * (index as usize % 400) + 1, index))
            .expect("add record");
    }
    writer.flush_buffer().expect("flush");

    let bytes = handle.contents();
    let full_blocks = bytes.len() / BLOCK_SIZE;
    for block in 0..full_blocks {
        let slab = &bytes[block * BLOCK_SIZE..(block + 1) * BLOCK_SIZE];
        // Records account for the block up to a trailer shorter than a
        // header, and the trailer is all zeros.
        let mut pos = 0;
        while BLOCK_SIZE - pos >= HEADER_SIZE {
            let length = u16::from_le_bytes([slab[pos + 4], slab[pos + 5]]) as usize;
            assert_ne!(0, slab[pos + 6], "record type must be nonzero");
            pos += HEADER_SIZE + length;
        }
        assert!(pos <= BLOCK_SIZE);
        assert!(slab[pos..].iter().all(|&b| b == 0));
    }

    decode_records(&bytes, None).expect("decode");
}
