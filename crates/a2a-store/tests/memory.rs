use a2a_canonical::{ContentId, SessionId};
use a2a_store::{cid_v1_raw, read_trace_file, ContentStore, MemoryStore, SessionArchive, StoreError};
use std::sync::Arc;
use tempfile::TempDir;

#[tokio::test]
async fn test_round_trip_is_byte_exact() {
    let store = MemoryStore::new();
    let samples: Vec<&[u8]> = vec![
        b"",
        b"{\n  \"a\": 1\n}",
        "héllo 世界 🚀".as_bytes(),
        &[0x00, 0xff, 0x10, 0x80],
    ];

    for bytes in samples {
        let cid = store.put(bytes).await.unwrap();
        assert_eq!(cid, cid_v1_raw(bytes));
        assert_eq!(store.get(&cid).await.unwrap(), bytes);
    }
}

#[tokio::test]
async fn test_put_is_idempotent() {
    let store = MemoryStore::new();
    let first = store.put(b"same bytes").await.unwrap();
    let other = store.put(b"other bytes").await.unwrap();
    let second = store.put(b"same bytes").await.unwrap();

    assert_eq!(first, second);
    assert_ne!(first, other);
    assert_eq!(store.len(), 2);
}

#[tokio::test]
async fn test_unknown_cid_is_not_found() {
    let store = MemoryStore::new();
    let cid = ContentId::new("bafkreiunknownunknownunknown");

    match store.get(&cid).await {
        Err(StoreError::NotFound(missing)) => assert_eq!(missing, cid),
        other => panic!("Expected NotFound, got {:?}", other),
    }
    assert!(matches!(store.pin(&cid).await, Err(StoreError::NotFound(_))));
}

#[tokio::test]
async fn test_offline_store_is_unavailable() {
    let store = MemoryStore::new();
    let cid = store.put(b"kept").await.unwrap();
    store.set_available(false);

    let err = store.put(b"new").await.unwrap_err();
    assert!(matches!(err, StoreError::Unavailable(_)));
    assert!(err.is_retryable());
    assert!(matches!(store.get(&cid).await, Err(StoreError::Unavailable(_))));

    store.set_available(true);
    assert_eq!(store.get(&cid).await.unwrap(), b"kept");
}

#[tokio::test]
async fn test_pin_and_unpin() {
    let store = MemoryStore::new();
    let cid = store.put(b"pinned").await.unwrap();
    assert!(!store.is_pinned(&cid));

    store.pin(&cid).await.unwrap();
    assert!(store.is_pinned(&cid));

    store.unpin(&cid).await.unwrap();
    assert!(!store.is_pinned(&cid));
    assert_eq!(store.get(&cid).await.unwrap(), b"pinned");
}

#[tokio::test]
async fn test_store_through_shared_handle() {
    let store = Arc::new(MemoryStore::new());
    let cid = store.put(b"shared").await.unwrap();
    let as_dyn: Arc<dyn ContentStore> = store.clone();
    assert_eq!(as_dyn.get(&cid).await.unwrap(), b"shared");
}

#[tokio::test]
async fn test_corrupt_changes_stored_bytes_only() {
    let store = MemoryStore::new();
    let cid = store.put(b"original").await.unwrap();
    assert!(store.corrupt(&cid, b"tampered".to_vec()));
    assert_eq!(store.get(&cid).await.unwrap(), b"tampered");
    assert!(!store.corrupt(&cid_v1_raw(b"absent"), Vec::new()));
}

#[tokio::test]
async fn test_reads_do_not_mutate() {
    let store = MemoryStore::new();
    let cid = store.put(b"x").await.unwrap();
    let before = store.mutation_count();
    for _ in 0..3 {
        store.get(&cid).await.unwrap();
    }
    assert_eq!(store.mutation_count(), before);
}

#[test]
fn test_archive_write_read_list() {
    let temp_dir = TempDir::new().unwrap();
    let archive = SessionArchive::open(temp_dir.path().join("traces")).unwrap();

    let b = SessionId::new("session-b");
    let a = SessionId::new("session-a");
    let path = archive.write(&b, "{\n  \"x\": \"é\"\n}".as_bytes()).unwrap();
    archive.write(&a, b"{}").unwrap();

    assert!(path.ends_with("session-b.json"));
    assert_eq!(archive.read(&b).unwrap(), "{\n  \"x\": \"é\"\n}".as_bytes());
    assert_eq!(read_trace_file(&path).unwrap(), archive.read(&b).unwrap());
    assert_eq!(archive.list().unwrap(), vec![a.clone(), b.clone()]);
    assert!(archive.contains(&a));
}

#[test]
fn test_archive_overwrites_previous_copy() {
    let temp_dir = TempDir::new().unwrap();
    let archive = SessionArchive::open(temp_dir.path()).unwrap();
    let id = SessionId::new("sess-1");

    archive.write(&id, b"first").unwrap();
    archive.write(&id, b"second").unwrap();

    assert_eq!(archive.read(&id).unwrap(), b"second");
    assert_eq!(archive.list().unwrap().len(), 1);
}

#[test]
fn test_archive_rejects_path_like_session_ids() {
    let temp_dir = TempDir::new().unwrap();
    let archive = SessionArchive::open(temp_dir.path()).unwrap();
    let id = SessionId::new("../escape");

    assert!(matches!(archive.write(&id, b"x"), Err(StoreError::InvalidId(_))));
    assert!(!archive.contains(&id));
}

#[test]
fn test_archive_missing_session_is_io_error() {
    let temp_dir = TempDir::new().unwrap();
    let archive = SessionArchive::open(temp_dir.path()).unwrap();
    assert!(matches!(
        archive.read(&SessionId::new("nobody")),
        Err(StoreError::Io(_))
    ));
}

#[test]
fn test_read_trace_file_returns_exact_bytes() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("raw.json");
    let bytes = [0x7b, 0x00, 0xff, 0xc3, 0xa9, 0x7d];
    std::fs::write(&path, bytes).unwrap();
    assert_eq!(read_trace_file(&path).unwrap(), bytes);

    let missing = read_trace_file(temp_dir.path().join("missing.json")).unwrap_err();
    match missing {
        StoreError::Io(e) => assert_eq!(e.kind(), std::io::ErrorKind::NotFound),
        other => panic!("expected io error, got {other:?}"),
    }
}
