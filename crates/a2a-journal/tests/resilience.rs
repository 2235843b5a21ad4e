use a2a_canonical::{ContentId, HexDigest, SessionId, TxRef};
use a2a_journal::frame::{FRAME_KIND_RECEIPT, MAX_PAYLOAD_SIZE};
use a2a_journal::{FrameKind, JournalEntry, JournalError, JournalReader, JournalWriter, ReadMode, WriteOptions};
use a2a_ledger::AnchorReceipt;
use serde_json::json;
use std::fs;
use std::io::{Seek, Write};
use tempfile::TempDir;

fn make_receipt(index: u64) -> AnchorReceipt {
    AnchorReceipt {
        content_id: ContentId::parse("QmYwAPJzv5CZsnA625s3Xf2nemtYgPpHdWEz79ojWnPbdG").unwrap(),
        merkle_root: HexDigest::of(b"root"),
        session_id: SessionId::parse("sess-r").unwrap(),
        timestamp: 1_700_000_000,
        model: "model-b".into(),
        tx_ref: TxRef::parse(format!("{:064X}", index)).unwrap(),
        ledger_index: index,
        network: "memory".into(),
    }
}

fn write_receipts(path: &std::path::Path, count: u64) {
    let mut writer = JournalWriter::open(path, WriteOptions::default()).unwrap();
    for i in 1..=count {
        writer.append_receipt(&make_receipt(i)).unwrap();
    }
    writer.finish().unwrap();
}

#[test]
fn test_payload_size_limit() {
    let temp_dir = TempDir::new().unwrap();
    let journal_path = temp_dir.path().join("anchors.a2aj");

    let oversized = vec![b' '; MAX_PAYLOAD_SIZE as usize + 1];
    let mut writer = JournalWriter::open(&journal_path, WriteOptions::default()).unwrap();
    match writer.append_raw(FrameKind::Receipt, &oversized).unwrap_err() {
        JournalError::PayloadTooLarge { size, max } => {
            assert_eq!(size, MAX_PAYLOAD_SIZE as u64 + 1);
            assert_eq!(max, MAX_PAYLOAD_SIZE);
        }
        other => panic!("Expected PayloadTooLarge error, got {:?}", other),
    }
    writer.finish().unwrap();

    // Nothing was written for the rejected frame.
    assert_eq!(fs::metadata(&journal_path).unwrap().len(), 16);
}

#[test]
fn test_reserved_bytes_must_be_zero() {
    let temp_dir = TempDir::new().unwrap();
    let journal_path = temp_dir.path().join("anchors.a2aj");
    write_receipts(&journal_path, 1);

    let mut file = fs::OpenOptions::new()
        .read(true)
        .write(true)
        .open(&journal_path)
        .unwrap();
    file.seek(std::io::SeekFrom::Start(16 + 1)).unwrap();
    file.write_all(&[0x01]).unwrap();
    drop(file);

    let mut reader = JournalReader::open(&journal_path, ReadMode::Permissive).unwrap();
    assert!(matches!(
        reader.read_frame(),
        Err(JournalError::InvalidFrame { offset: 16, .. })
    ));
}

#[test]
fn test_header_reserved_bytes_must_be_zero() {
    let temp_dir = TempDir::new().unwrap();
    let journal_path = temp_dir.path().join("anchors.a2aj");
    write_receipts(&journal_path, 1);

    let mut file = fs::OpenOptions::new()
        .read(true)
        .write(true)
        .open(&journal_path)
        .unwrap();
    file.seek(std::io::SeekFrom::Start(8)).unwrap();
    file.write_all(&[0x01; 8]).unwrap();
    drop(file);

    assert!(JournalReader::open(&journal_path, ReadMode::Strict).is_err());
}

#[test]
fn test_partial_write_handling() {
    let temp_dir = TempDir::new().unwrap();
    let journal_path = temp_dir.path().join("anchors.a2aj");
    write_receipts(&journal_path, 2);

    let mut reader = JournalReader::open(&journal_path, ReadMode::Strict).unwrap();
    assert!(reader.read_entry().unwrap().is_some());
    let first_end = reader.position();

    // Cut inside the second frame's header.
    let file = fs::OpenOptions::new().write(true).open(&journal_path).unwrap();
    file.set_len(first_end + 5).unwrap();
    drop(file);

    let mut reader = JournalReader::open(&journal_path, ReadMode::Strict).unwrap();
    assert_eq!(reader.read_entry().unwrap(), Some(JournalEntry::Receipt(make_receipt(1))));
    assert!(matches!(
        reader.read_entry(),
        Err(JournalError::TruncatedFrame { offset }) if offset == first_end
    ));

    let mut reader = JournalReader::open(&journal_path, ReadMode::Permissive).unwrap();
    assert!(reader.read_entry().unwrap().is_some());
    assert!(reader.read_entry().unwrap().is_none());
}

#[test]
fn test_unknown_frame_kind_skipped() {
    let temp_dir = TempDir::new().unwrap();
    let journal_path = temp_dir.path().join("anchors.a2aj");
    write_receipts(&journal_path, 1);

    let mut file = fs::OpenOptions::new().append(true).open(&journal_path).unwrap();
    let mut frame_header = [0u8; 8];
    frame_header[0] = 0xFF;
    frame_header[4..8].copy_from_slice(&10u32.to_le_bytes());
    file.write_all(&frame_header).unwrap();
    file.write_all(b"unknown123").unwrap();
    drop(file);

    let mut writer = JournalWriter::open(&journal_path, WriteOptions::default()).unwrap();
    writer.append_receipt(&make_receipt(2)).unwrap();
    writer.finish().unwrap();

    let entries = JournalReader::open(&journal_path, ReadMode::Strict)
        .unwrap()
        .read_all()
        .unwrap();
    assert_eq!(
        entries,
        vec![
            JournalEntry::Receipt(make_receipt(1)),
            JournalEntry::Receipt(make_receipt(2)),
        ]
    );
}

#[test]
fn test_malformed_payload_is_an_error() {
    let temp_dir = TempDir::new().unwrap();
    let journal_path = temp_dir.path().join("anchors.a2aj");

    let mut writer = JournalWriter::open(&journal_path, WriteOptions::default()).unwrap();
    writer
        .append(FrameKind::from_byte(FRAME_KIND_RECEIPT), &json!({"unexpected": true}))
        .unwrap();
    writer.append_raw(FrameKind::Verification, &[0xff, 0xfe]).unwrap();
    writer.finish().unwrap();

    let mut reader = JournalReader::open(&journal_path, ReadMode::Permissive).unwrap();
    assert!(matches!(reader.read_entry(), Err(JournalError::Json(_))));
    assert!(matches!(reader.read_entry(), Err(JournalError::InvalidUtf8(_))));
    assert!(reader.read_entry().unwrap().is_none());
}
