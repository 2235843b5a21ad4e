use a2a_canonical::{
    sha256_hex, Canonicalizer, ContentId, Event, ModelInfo, Session, SessionId, Timestamp,
    TraceContent, TxRef,
};
use a2a_core::{
    AnchorError, AnchorService, AnchorStage, Committer, TraceRecord, Verifier, NOT_VALIDATED,
    NO_COMMITMENT,
};
use a2a_ledger::{encode_memo, CommitmentPayload, Ledger, Memo, MemoryLedger};
use a2a_store::{ContentStore, MemoryStore};
use std::sync::Arc;

const TS: i64 = 1_735_689_600;

fn make_content(session: &str, text: &str) -> TraceContent {
    TraceContent {
        trace_version: "a2a-0.1".into(),
        session: Session {
            id: SessionId::parse(session).unwrap(),
            created_at: Timestamp::parse("2025-01-01T00:00:00Z").unwrap(),
            actors: vec!["assistant".into(), "user".into()],
        },
        model: ModelInfo {
            name: "model-a".into(),
            provider: "acme".into(),
        },
        events: vec![
            Event::HumanMessage {
                ts: Timestamp::parse("2025-01-01T00:00:01Z").unwrap(),
                content: text.into(),
            },
            Event::AiMessage {
                ts: Timestamp::parse("2025-01-01T00:00:02Z").unwrap(),
                content: "Hello! 你好".into(),
            },
        ],
        usage: vec![],
    }
}

struct Harness {
    store: Arc<MemoryStore>,
    ledger: Arc<MemoryLedger>,
    service: AnchorService<Arc<MemoryStore>, Arc<MemoryLedger>>,
    verifier: Verifier<Arc<MemoryStore>, Arc<MemoryLedger>>,
}

fn harness() -> Harness {
    let store = Arc::new(MemoryStore::new());
    let ledger = Arc::new(MemoryLedger::with_network("testnet"));
    Harness {
        service: AnchorService::new(store.clone(), ledger.clone(), Committer::default()),
        verifier: Verifier::new(store.clone(), ledger.clone(), Committer::default()),
        store,
        ledger,
    }
}

#[tokio::test]
async fn test_end_to_end_anchor_and_verify() {
    let h = harness();
    let content = make_content("sess-1", "hi");

    let anchored = h.service.anchor_at(&content, TS).await.unwrap();
    let record = &anchored.record;
    assert_eq!(record.hashing.chunks.len(), 1);
    assert_eq!(record.hashing.root, record.hashing.chunks[0]);
    assert_eq!(record.hashing.chunk_size, 4096);

    let receipt = &anchored.receipt;
    assert_eq!(receipt.session_id.as_str(), "sess-1");
    assert_eq!(receipt.model, "model-a");
    assert_eq!(receipt.timestamp, TS);
    assert_eq!(receipt.merkle_root, record.hashing.root);
    assert_eq!(receipt.network, "testnet");
    assert_eq!(anchored.ipfs_url, format!("ipfs://{}", receipt.content_id));
    assert_eq!(anchored.event_count, 2);
    assert_eq!(anchored.provenance.content_id.as_ref(), Some(&receipt.content_id));
    assert!(h.store.is_pinned(&receipt.content_id));

    // Stored bytes are the canonical bytes the root was computed over.
    let stored = h.store.get(&receipt.content_id).await.unwrap();
    let canonical = Canonicalizer::new().serialize(&content).unwrap();
    assert_eq!(stored, canonical.as_bytes());
    assert!(canonical.len() < 4096);
    assert_eq!(record.hashing.root.as_str(), sha256_hex(&stored));

    let result = h.verifier.verify_by_transaction(&receipt.tx_ref).await;
    assert!(result.verified, "{}", result);
    assert_eq!(result.content_id.as_ref(), Some(&receipt.content_id));
    assert_eq!(result.session_id.as_ref().map(SessionId::as_str), Some("sess-1"));
    assert_eq!(result.root_match(), Some(true));
    assert!(result.error.is_none());
    assert_eq!(result.details["model"], "model-a");
    assert_eq!(result.details["timestamp"], TS);
    assert_eq!(result.details["version"], "a2a-0.1");
    assert_eq!(result.details["ledger_index"], receipt.ledger_index);
    assert_eq!(result.details["network"], "testnet");
    assert_eq!(result.details["chunks"], 1);
    assert_eq!(result.details["trace_events"], 2);
    assert!(result.to_string().starts_with("VERIFIED"));
}

#[tokio::test]
async fn test_full_document_round_trips_with_same_root() {
    let h = harness();
    let anchored = h
        .service
        .anchor_at(&make_content("sess-doc", "doc"), TS)
        .await
        .unwrap();

    let json = anchored.record.to_json_pretty().unwrap();
    assert!(json.contains("\"chunkMerkleRoot\""));
    let parsed = TraceRecord::from_json(json.as_bytes()).unwrap();
    assert_eq!(parsed, anchored.record);

    let recommitted = Committer::default().commit(&parsed.content).unwrap();
    assert_eq!(recommitted.record.hashing, anchored.record.hashing);
}

#[tokio::test]
async fn test_tampered_content_fails_verification() {
    let h = harness();
    let anchored = h
        .service
        .anchor_at(&make_content("sess-2", "original"), TS)
        .await
        .unwrap();
    let cid = anchored.receipt.content_id.clone();
    let root = anchored.receipt.merkle_root.clone();

    assert!(h.store.corrupt(&cid, b"{\"tampered\": true}".to_vec()));

    let by_content = h.verifier.verify_by_content(&cid, root.as_str()).await;
    assert!(!by_content.verified);
    assert_eq!(by_content.expected_root.as_deref(), Some(root.as_str()));
    let computed = by_content.computed_root.clone().unwrap();
    assert_ne!(computed, root);
    assert_eq!(by_content.root_match(), Some(false));

    let by_tx = h
        .verifier
        .verify_by_transaction(&anchored.receipt.tx_ref)
        .await;
    assert!(!by_tx.verified);
    assert!(by_tx.to_string().starts_with("VERIFICATION FAILED"));
}

#[tokio::test]
async fn test_wrong_expected_root_fails_verification() {
    let h = harness();
    let anchored = h
        .service
        .anchor_at(&make_content("sess-3", "x"), TS)
        .await
        .unwrap();
    let wrong = sha256_hex(b"something else");

    let result = h
        .verifier
        .verify_by_content(&anchored.receipt.content_id, &wrong)
        .await;
    assert!(!result.verified);
    assert_eq!(result.expected_root.as_deref(), Some(wrong.as_str()));
    assert_eq!(
        result.computed_root.as_ref(),
        Some(&anchored.receipt.merkle_root)
    );
    assert!(result.tx_ref.is_none());
}

#[tokio::test]
async fn test_transaction_without_commitment() {
    let h = harness();
    let tx_ref = h.ledger.record_without_memo();

    let result = h.verifier.verify_by_transaction(&tx_ref).await;
    assert!(!result.verified);
    assert_eq!(result.error.as_deref(), Some(NO_COMMITMENT));
    assert!(result.content_id.is_none());
    assert_eq!(result.tx_ref.as_ref(), Some(&tx_ref));
    assert!(result.to_record()["match"].is_null());
}

#[tokio::test]
async fn test_foreign_attachment_is_reported_not_raised() {
    let h = harness();
    let tx_ref = h.ledger.record_with_memo(Memo::text("INVOICE", b"{}"));

    let result = h.verifier.verify_by_transaction(&tx_ref).await;
    assert!(!result.verified);
    assert!(result.error.unwrap().contains("decode"));
}

#[tokio::test]
async fn test_unknown_transaction_and_missing_content_are_reported() {
    let h = harness();
    let unknown = TxRef::parse("B".repeat(64)).unwrap();
    let result = h.verifier.verify_by_transaction(&unknown).await;
    assert!(!result.verified);
    assert!(result.error.unwrap().contains("not found"));

    // Commitment pointing at content the store never saw.
    let payload = CommitmentPayload::new(
        ContentId::parse("uAVUSIneverStoredContentIdentifier").unwrap(),
        a2a_canonical::HexDigest::of(b"x"),
        SessionId::parse("sess-ghost").unwrap(),
        "model-a",
        TS,
    );
    let tx_ref = h.ledger.record_with_memo(encode_memo(&payload).unwrap());
    let result = h.verifier.verify_by_transaction(&tx_ref).await;
    assert!(!result.verified);
    assert_eq!(result.content_id.as_ref(), Some(&payload.cid));
    assert_eq!(result.session_id.as_ref(), Some(&payload.sid));
    assert!(result.computed_root.is_none());
    assert!(result.error.unwrap().contains("content fetch failed"));
}

#[tokio::test]
async fn test_store_outage_fails_at_store_stage() {
    let h = harness();
    h.store.set_available(false);

    let err = h
        .service
        .anchor_at(&make_content("sess-4", "x"), TS)
        .await
        .unwrap_err();
    assert_eq!(err.stage(), AnchorStage::Store);
    assert!(err.is_retryable());
    assert!(h.ledger.is_empty());
}

#[tokio::test]
async fn test_ledger_rejection_leaves_content_pinned() {
    let h = harness();
    h.ledger.reject_with("tecUNFUNDED_PAYMENT");

    let err = h
        .service
        .anchor_at(&make_content("sess-5", "x"), TS)
        .await
        .unwrap_err();
    assert_eq!(err.stage(), AnchorStage::Ledger);
    assert!(!err.is_retryable());
    match &err {
        AnchorError::Ledger { source, orphaned } => {
            assert_eq!(source.code(), Some("tecUNFUNDED_PAYMENT"));
            assert!(h.store.is_pinned(orphaned));
            assert!(h.store.get(orphaned).await.is_ok());
        }
        other => panic!("Expected Ledger error, got {:?}", other),
    }
    assert!(err.to_string().contains("tecUNFUNDED_PAYMENT"));
}

#[tokio::test]
async fn test_unconfirmed_anchor_is_retryable() {
    let h = harness();
    h.ledger.set_confirming(false);
    let err = h
        .service
        .anchor_at(&make_content("sess-6", "x"), TS)
        .await
        .unwrap_err();
    assert_eq!(err.stage(), AnchorStage::Ledger);
    assert!(err.is_retryable());
    assert!(err.orphaned().is_some());
}

#[tokio::test]
async fn test_verification_does_not_mutate() {
    let h = harness();
    let anchored = h
        .service
        .anchor_at(&make_content("sess-7", "x"), TS)
        .await
        .unwrap();
    let store_before = h.store.mutation_count();
    let ledger_before = h.ledger.mutation_count();

    h.verifier
        .verify_by_transaction(&anchored.receipt.tx_ref)
        .await;
    h.verifier
        .verify_by_content(
            &anchored.receipt.content_id,
            anchored.receipt.merkle_root.as_str(),
        )
        .await;

    assert_eq!(h.store.mutation_count(), store_before);
    assert_eq!(h.ledger.mutation_count(), ledger_before);
}

#[tokio::test]
async fn test_ten_thousand_byte_record_has_three_chunks() {
    let canonicalizer = Canonicalizer::new();
    let base = canonicalizer.serialize(&make_content("sess-big", "")).unwrap().len();
    let content = make_content("sess-big", &"x".repeat(10_000 - base));
    let bytes = canonicalizer.serialize(&content).unwrap();
    assert_eq!(bytes.len(), 10_000);

    let h = harness();
    let anchored = h.service.anchor_at(&content, TS).await.unwrap();
    let chunks = &anchored.record.hashing.chunks;
    assert_eq!(chunks.len(), 3);

    let raw = bytes.as_bytes();
    let a = sha256_hex(&raw[..4096]);
    let b = sha256_hex(&raw[4096..8192]);
    let c = sha256_hex(&raw[8192..]);
    assert_eq!(raw[8192..].len(), 1808);
    assert_eq!(chunks[2].as_str(), c);
    let expected = sha256_hex(format!("{}{}", sha256_hex(format!("{}{}", a, b).as_bytes()), c).as_bytes());
    assert_eq!(anchored.record.hashing.root.as_str(), expected);

    let result = h
        .verifier
        .verify_by_transaction(&anchored.receipt.tx_ref)
        .await;
    assert!(result.verified);
    assert_eq!(result.details["chunks"], 3);
}

#[tokio::test]
async fn test_verify_bytes_offline() {
    let h = harness();
    let content = make_content("sess-8", "local");
    let committed = Committer::default().commit(&content).unwrap();

    let ok = h
        .verifier
        .verify_bytes(committed.bytes.as_bytes(), committed.record.hashing.root.as_str());
    assert!(ok.verified);
    assert_eq!(ok.session_id.as_ref().map(SessionId::as_str), Some("sess-8"));
    assert_eq!(ok.details["trace_events"], 2);

    let mut edited = committed.bytes.into_vec();
    edited.push(b' ');
    let bad = h
        .verifier
        .verify_bytes(&edited, committed.record.hashing.root.as_str());
    assert!(!bad.verified);
}

#[tokio::test]
async fn test_chunk_size_mismatch_changes_root() {
    let h = harness();
    let content = make_content("sess-9", &"y".repeat(5_000));
    let anchored = h.service.anchor_at(&content, TS).await.unwrap();

    let small = Verifier::new(h.store.clone(), h.ledger.clone(), Committer::new(1024).unwrap());
    let result = small.verify_by_transaction(&anchored.receipt.tx_ref).await;
    assert!(!result.verified);
    assert_eq!(result.details["chunk_size"], 1024);
}

#[tokio::test]
async fn test_non_default_chunk_size_is_recorded_and_honoured() {
    let store = Arc::new(MemoryStore::new());
    let ledger = Arc::new(MemoryLedger::new());
    let service = AnchorService::new(store.clone(), ledger.clone(), Committer::new(1024).unwrap());
    let content = make_content("sess-10", &"z".repeat(5_000));
    let anchored = service.anchor_at(&content, TS).await.unwrap();
    let len = Canonicalizer::new().serialize(&content).unwrap().len();
    let chunks = len.div_ceil(1024);
    assert!(chunks > 4);
    assert_eq!(anchored.record.hashing.chunks.len(), chunks);

    let payload = ledger.read(&anchored.receipt.tx_ref).await.unwrap().unwrap().payload;
    assert_eq!(payload.v, "a2a-0.1/c1024");
    assert_eq!(payload.chunk_size(), Some(1024));

    // A verifier configured with the default size still recomputes with 1024.
    let verifier = Verifier::new(store, ledger, Committer::default());
    let result = verifier.verify_by_transaction(&anchored.receipt.tx_ref).await;
    assert!(result.verified, "{}", result);
    assert_eq!(result.details["chunk_size"], 1024);
    assert_eq!(result.details["chunks"], chunks);
    assert_eq!(result.details["version"], "a2a-0.1/c1024");
}

#[tokio::test]
async fn test_unvalidated_transaction_does_not_verify() {
    let h = harness();
    let content = make_content("sess-11", "pending");
    let committed = Committer::default().commit(&content).unwrap();
    let cid = h.store.put(committed.bytes.as_bytes()).await.unwrap();
    let payload = CommitmentPayload::new(
        cid.clone(),
        committed.record.hashing.root.clone(),
        SessionId::parse("sess-11").unwrap(),
        "model-a",
        TS,
    );
    let tx_ref = h.ledger.record_pending(encode_memo(&payload).unwrap());

    let result = h.verifier.verify_by_transaction(&tx_ref).await;
    assert!(!result.verified);
    assert_eq!(result.error.as_deref(), Some(NOT_VALIDATED));
    assert_eq!(result.tx_ref.as_ref(), Some(&tx_ref));
    assert_eq!(result.content_id.as_ref(), Some(&cid));
    assert!(result.computed_root.is_none());
    assert!(result.details["ledger_index"].is_null());
    assert_eq!(
        result.to_string(),
        format!("VERIFICATION FAILED - {}", NOT_VALIDATED)
    );

    // The same bytes verify once the commitment is validated.
    let validated = h.ledger.record_with_memo(encode_memo(&payload).unwrap());
    assert!(h.verifier.verify_by_transaction(&validated).await.verified);
}

#[test]
fn test_zero_chunk_size_is_invalid() {
    assert!(Committer::new(0).is_err());
}

#[tokio::test]
async fn test_shared_ledger_handle() {
    let ledger: Arc<dyn Ledger> = Arc::new(MemoryLedger::new());
    let store: Arc<dyn ContentStore> = Arc::new(MemoryStore::new());
    let service = AnchorService::new(store.clone(), ledger.clone(), Committer::default());
    let anchored = service
        .anchor_at(&make_content("sess-dyn", "x"), TS)
        .await
        .unwrap();
    let verifier = Verifier::new(store, ledger, Committer::default());
    assert!(verifier.verify_by_transaction(&anchored.receipt.tx_ref).await.verified);
}
