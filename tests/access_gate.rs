//! Access Gate semantics, driven against the in-memory store.

use std::sync::Arc;

use chrono::{Duration, Utc};
use uuid::Uuid;

use pastebox::crypto::envelope::{seal, EnvelopeKey};
use pastebox::crypto::password::hash_password;
use pastebox::error::AppError;
use pastebox::models::paste::{NewPaste, Paste, Visibility};
use pastebox::models::session::ViewerSession;
use pastebox::repositories::memory::MemoryPasteStore;
use pastebox::repositories::store::PasteStore;
use pastebox::services::access::{self, CallerContext, PastePayload, ReadOutcome};

fn base_paste(content: &str) -> Paste {
    NewPaste {
        owner_id: None,
        visibility: Visibility::Public,
        zero_knowledge: false,
        content: Some(content.to_string()),
        encrypted: None,
        password_hash: None,
        burn_after_read: false,
        expires_at: None,
    }
    .into_paste(Utc::now())
}

fn anonymous<'a>(session: &'a ViewerSession, identity: &'a str) -> CallerContext<'a> {
    CallerContext {
        user_id: None,
        client_identity: identity,
        session,
    }
}

#[tokio::test]
async fn unknown_id_is_not_found() {
    let store = MemoryPasteStore::new();
    let session = ViewerSession::new(Utc::now());
    let ctx = anonymous(&session, "10.0.0.1");

    let outcome = access::evaluate_read(&store, &ctx, Uuid::new_v4(), Utc::now())
        .await
        .unwrap();
    assert_eq!(outcome, ReadOutcome::NotFound);
}

#[tokio::test]
async fn expired_paste_is_indistinguishable_from_missing() {
    let store = MemoryPasteStore::new();
    let mut paste = base_paste("long gone");
    paste.expires_at = Some(Utc::now() - Duration::minutes(1));
    store.insert_paste(&paste).await.unwrap();

    let session = ViewerSession::new(Utc::now());
    let ctx = anonymous(&session, "10.0.0.1");

    let expired = access::evaluate_read(&store, &ctx, paste.id, Utc::now())
        .await
        .unwrap();
    let missing = access::evaluate_read(&store, &ctx, Uuid::new_v4(), Utc::now())
        .await
        .unwrap();

    assert_eq!(expired, ReadOutcome::NotFound);
    assert_eq!(expired, missing);

    // Password verification must not leak existence either.
    let err = access::verify_password(&store, paste.id, "anything", Utc::now())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound));
}

#[tokio::test]
async fn private_paste_is_owner_only() {
    let store = MemoryPasteStore::new();
    let owner = Uuid::new_v4();
    let mut paste = base_paste("owner eyes only");
    paste.owner_id = Some(owner);
    paste.visibility = Visibility::Private;
    store.insert_paste(&paste).await.unwrap();

    let session = ViewerSession::new(Utc::now());

    let stranger = anonymous(&session, "10.0.0.1");
    let outcome = access::evaluate_read(&store, &stranger, paste.id, Utc::now())
        .await
        .unwrap();
    assert_eq!(outcome, ReadOutcome::Forbidden);

    let other_user = CallerContext {
        user_id: Some(Uuid::new_v4()),
        client_identity: "10.0.0.1",
        session: &session,
    };
    let outcome = access::evaluate_read(&store, &other_user, paste.id, Utc::now())
        .await
        .unwrap();
    assert_eq!(outcome, ReadOutcome::Forbidden);

    let as_owner = CallerContext {
        user_id: Some(owner),
        client_identity: "10.0.0.1",
        session: &session,
    };
    match access::evaluate_read(&store, &as_owner, paste.id, Utc::now())
        .await
        .unwrap()
    {
        ReadOutcome::Disclosed(disclosure) => {
            assert_eq!(
                disclosure.payload,
                PastePayload::Plaintext("owner eyes only".to_string())
            );
        }
        other => panic!("expected disclosure, got {:?}", other),
    }
}

#[tokio::test]
async fn password_gate_covers_read_and_download_per_session() {
    let store = MemoryPasteStore::new();
    let mut paste = base_paste("gated");
    paste.password_hash = Some(hash_password("p@ss").unwrap());
    store.insert_paste(&paste).await.unwrap();

    let mut session = ViewerSession::new(Utc::now());

    // Unverified: both paths prompt for the password.
    {
        let ctx = anonymous(&session, "10.0.0.1");
        let read = access::evaluate_read(&store, &ctx, paste.id, Utc::now())
            .await
            .unwrap();
        assert_eq!(read, ReadOutcome::PasswordRequired);

        let download = access::evaluate_download(&store, &ctx, paste.id, Utc::now())
            .await
            .unwrap();
        assert_eq!(download, ReadOutcome::PasswordRequired);
    }

    // A wrong password is rejected and establishes nothing.
    let err = access::verify_password(&store, paste.id, "wrong", Utc::now())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidPassword));
    {
        let ctx = anonymous(&session, "10.0.0.1");
        let read = access::evaluate_read(&store, &ctx, paste.id, Utc::now())
            .await
            .unwrap();
        assert_eq!(read, ReadOutcome::PasswordRequired);
    }

    // The right password verifies; the session mark then opens both paths.
    access::verify_password(&store, paste.id, "p@ss", Utc::now())
        .await
        .unwrap();
    session.mark_verified(paste.id);

    let ctx = anonymous(&session, "10.0.0.1");
    match access::evaluate_read(&store, &ctx, paste.id, Utc::now())
        .await
        .unwrap()
    {
        ReadOutcome::Disclosed(disclosure) => {
            assert_eq!(disclosure.payload, PastePayload::Plaintext("gated".to_string()));
        }
        other => panic!("expected disclosure, got {:?}", other),
    }
    match access::evaluate_download(&store, &ctx, paste.id, Utc::now())
        .await
        .unwrap()
    {
        ReadOutcome::Disclosed(_) => {}
        other => panic!("expected disclosure, got {:?}", other),
    }
}

#[tokio::test]
async fn verifying_an_unprotected_paste_is_an_error() {
    let store = MemoryPasteStore::new();
    let paste = base_paste("open");
    store.insert_paste(&paste).await.unwrap();

    let err = access::verify_password(&store, paste.id, "p@ss", Utc::now())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotPasswordProtected));
}

#[tokio::test]
async fn zero_knowledge_read_discloses_the_envelope_only() {
    let store = MemoryPasteStore::new();
    let key = EnvelopeKey::generate();
    let envelope = seal("hidden from the server", &key).unwrap();

    let mut paste = base_paste("");
    paste.zero_knowledge = true;
    paste.visibility = Visibility::Unlisted;
    paste.content = None;
    paste.encrypted = Some(envelope.clone());
    store.insert_paste(&paste).await.unwrap();

    let session = ViewerSession::new(Utc::now());
    let ctx = anonymous(&session, "10.0.0.1");

    match access::evaluate_read(&store, &ctx, paste.id, Utc::now())
        .await
        .unwrap()
    {
        ReadOutcome::Disclosed(disclosure) => {
            assert!(disclosure.zero_knowledge);
            assert_eq!(disclosure.payload, PastePayload::Encrypted(envelope));
        }
        other => panic!("expected disclosure, got {:?}", other),
    }

    let download = access::evaluate_download(&store, &ctx, paste.id, Utc::now())
        .await
        .unwrap();
    assert_eq!(download, ReadOutcome::Forbidden);
}

#[tokio::test]
async fn burn_after_read_disclosed_exactly_once() {
    let store = MemoryPasteStore::new();
    let mut paste = base_paste("secret");
    paste.burn_after_read = true;
    store.insert_paste(&paste).await.unwrap();

    let session = ViewerSession::new(Utc::now());
    let ctx = anonymous(&session, "10.0.0.1");

    match access::evaluate_read(&store, &ctx, paste.id, Utc::now())
        .await
        .unwrap()
    {
        ReadOutcome::Disclosed(disclosure) => {
            assert_eq!(disclosure.payload, PastePayload::Plaintext("secret".to_string()));
            assert!(disclosure.burn_after_read);
        }
        other => panic!("expected disclosure, got {:?}", other),
    }

    // Immediately after the first disclosure — deletion may still be in
    // flight, but the claim already renders the paste gone.
    let second = access::evaluate_read(&store, &ctx, paste.id, Utc::now())
        .await
        .unwrap();
    assert_eq!(second, ReadOutcome::NotFound);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_burn_readers_have_a_single_winner() {
    let store = Arc::new(MemoryPasteStore::new());
    let mut paste = base_paste("once");
    paste.burn_after_read = true;
    store.insert_paste(&paste).await.unwrap();

    let mut handles = Vec::new();
    for i in 0..8 {
        let store = Arc::clone(&store);
        let paste_id = paste.id;
        handles.push(tokio::spawn(async move {
            let session = ViewerSession::new(Utc::now());
            let identity = format!("10.0.0.{}", i);
            let ctx = CallerContext {
                user_id: None,
                client_identity: &identity,
                session: &session,
            };
            access::evaluate_read(store.as_ref(), &ctx, paste_id, Utc::now())
                .await
                .unwrap()
        }));
    }

    let mut disclosed = 0;
    for handle in handles {
        match handle.await.unwrap() {
            ReadOutcome::Disclosed(_) => disclosed += 1,
            ReadOutcome::NotFound => {}
            other => panic!("unexpected outcome {:?}", other),
        }
    }
    assert_eq!(disclosed, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_reads_from_one_identity_count_once() {
    let store = Arc::new(MemoryPasteStore::new());
    let paste = base_paste("popular");
    store.insert_paste(&paste).await.unwrap();

    let mut handles = Vec::new();
    for _ in 0..8 {
        let store = Arc::clone(&store);
        let paste_id = paste.id;
        handles.push(tokio::spawn(async move {
            let session = ViewerSession::new(Utc::now());
            let ctx = CallerContext {
                user_id: None,
                client_identity: "203.0.113.9",
                session: &session,
            };
            access::evaluate_read(store.as_ref(), &ctx, paste_id, Utc::now())
                .await
                .unwrap()
        }));
    }
    for handle in handles {
        assert!(matches!(handle.await.unwrap(), ReadOutcome::Disclosed(_)));
    }

    let after = store.find_paste(paste.id).await.unwrap().unwrap();
    assert_eq!(after.view_count, 1);

    // Exactly one view record exists for the pair.
    let repeat = store.record_view(paste.id, "203.0.113.9").await.unwrap();
    assert!(!repeat.first_view);
    assert_eq!(repeat.view_count, 1);
}

#[tokio::test]
async fn distinct_identities_each_count() {
    let store = MemoryPasteStore::new();
    let paste = base_paste("shared around");
    store.insert_paste(&paste).await.unwrap();

    let session = ViewerSession::new(Utc::now());
    for (i, identity) in ["10.0.0.1", "10.0.0.2", "10.0.0.3"].iter().enumerate() {
        let ctx = anonymous(&session, identity);
        match access::evaluate_read(&store, &ctx, paste.id, Utc::now())
            .await
            .unwrap()
        {
            ReadOutcome::Disclosed(disclosure) => {
                assert_eq!(disclosure.view_count, (i + 1) as i64);
            }
            other => panic!("expected disclosure, got {:?}", other),
        }
    }

    // A repeat load from a counted identity leaves the count unchanged.
    let ctx = anonymous(&session, "10.0.0.1");
    match access::evaluate_read(&store, &ctx, paste.id, Utc::now())
        .await
        .unwrap()
    {
        ReadOutcome::Disclosed(disclosure) => assert_eq!(disclosure.view_count, 3),
        other => panic!("expected disclosure, got {:?}", other),
    }
}
