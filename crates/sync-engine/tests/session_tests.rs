//! Reconnection state machine tests with a scripted provider.

mod common;

use common::{fast_config, user, Harness, DEVICE};
use coordination::StatusMessage;
use message_cache::{message, MessageRecord};
use mock_provider::{fixtures, Script, ScriptedProvider};
use serde_json::json;
use sync_engine::{Operation, Session, SessionOutcome, SessionState};

fn send_hi() -> Operation {
    Operation::SendUser {
        number: "491701111111".to_string(),
        message: "hi".to_string(),
        attachments: vec![],
    }
}

fn completed(outcome: SessionOutcome) -> sync_engine::OperationResult {
    match outcome {
        SessionOutcome::Completed(result) => result,
        other => panic!("expected a completed operation, got {:?}", other),
    }
}

#[tokio::test]
async fn test_restart_required_reconnects_and_opens() {
    let provider = ScriptedProvider::new(vec![
        Script::new().close(515).end(),
        Script::new().open(),
    ]);
    let h = Harness::new(provider).await;
    let mut session = Session::new(h.ctx.clone());

    let result = completed(session.run(send_hi()).await.unwrap());
    assert_eq!(result.message, StatusMessage::MessageUserSent);

    assert_eq!(h.provider.connect_count(), 2);
    assert_eq!(
        session.history(),
        &[
            SessionState::Connecting,
            SessionState::ClosedRecoverable,
            SessionState::Connecting,
            SessionState::Open,
        ]
    );
    assert_eq!(session.state(), SessionState::Open);
}

#[tokio::test]
async fn test_unauthorized_wipes_auth_and_cache() {
    let provider = ScriptedProvider::new(vec![
        Script::new().close(401).end(),
        Script::new().open(),
    ]);
    let h = Harness::new(provider).await;

    message::insert_batch(
        h.db.pool(),
        &[MessageRecord::text("OLD", "491701111111", DEVICE, "stale", 1)],
    )
    .await
    .unwrap();

    let mut session = Session::new(h.ctx.clone());
    let result = completed(
        session
            .run(Operation::FetchMessages { limit: 10 })
            .await
            .unwrap(),
    );

    assert_eq!(result.message, StatusMessage::MessagesFetched);
    assert_eq!(result.data, json!([]));

    let connects = h.provider.connects();
    assert_eq!(connects.len(), 2);
    assert!(!connects[1].auth_existed);
    assert!(session.history().contains(&SessionState::ClosedAuthInvalid));
    assert_eq!(h.count().await, 0);
}

#[tokio::test]
async fn test_unauthorized_during_fetch_still_wipes() {
    // The fetch takes the db lock at ~50ms and then stalls on the pool,
    // whose connections this test holds until 400ms. The close arrives
    // while the lock is held.
    let provider = ScriptedProvider::new(vec![
        Script::new().open().delay_ms(150).close(401).end(),
        Script::new().open(),
    ]);
    let h = Harness::new(provider).await;

    message::insert_batch(
        h.db.pool(),
        &[MessageRecord::text("OLD", "491701111111", DEVICE, "stale", 1)],
    )
    .await
    .unwrap();

    let mut held = Vec::new();
    for _ in 0..4 {
        held.push(h.db.pool().acquire().await.unwrap());
    }
    let release = tokio::spawn(async move {
        tokio::time::sleep(std::time::Duration::from_millis(400)).await;
        drop(held);
    });

    let mut session = Session::new(h.ctx.clone());
    let outcome = tokio::time::timeout(
        std::time::Duration::from_secs(10),
        session.run(Operation::FetchMessages { limit: 10 }),
    )
    .await
    .expect("session stalled after an unauthorized close")
    .unwrap();
    release.await.unwrap();

    let result = completed(outcome);
    assert_eq!(result.data, json!([]));
    assert_eq!(
        session.history(),
        &[
            SessionState::Connecting,
            SessionState::Open,
            SessionState::ClosedAuthInvalid,
            SessionState::Connecting,
            SessionState::Open,
        ]
    );
    assert!(!h.ctx.db_lock.is_held());
    assert_eq!(h.count().await, 0);
}

#[tokio::test]
async fn test_pairing_publishes_formatted_code() {
    let provider = ScriptedProvider::new(vec![
        Script::new().pairing("2@qr-challenge").close(515).end(),
        Script::new().open(),
    ])
    .with_pairing_code("WXYZ9876");
    let h = Harness::new(provider).await;
    let mut session = Session::new(h.ctx.clone());

    completed(session.run(send_hi()).await.unwrap());

    assert_eq!(h.provider.pairing_requests(), vec![DEVICE.to_string()]);
    assert!(h.ctx.is_first_run());
    assert_eq!(h.ctx.detector.threshold(), 5);

    let status = h.ctx.status.read().unwrap();
    assert_eq!(status.message, StatusMessage::PairingCodeRequired);
    assert_eq!(status.data, json!("WXYZ-9876"));
    assert!(!status.success);
}

#[tokio::test]
async fn test_repeated_challenges_request_one_code() {
    let provider = ScriptedProvider::new(vec![
        Script::new().pairing("qr-1").pairing("qr-2").close(515).end(),
        Script::new().open(),
    ]);
    let h = Harness::new(provider).await;
    let mut session = Session::new(h.ctx.clone());

    completed(session.run(send_hi()).await.unwrap());
    assert_eq!(h.provider.pairing_requests().len(), 1);
}

#[tokio::test]
async fn test_automation_mode_never_requests_code() {
    let provider = ScriptedProvider::new(vec![Script::new().pairing("qr")]);
    let h = Harness::with_config(provider, fast_config().with_automation(true)).await;
    let mut session = Session::new(h.ctx.clone());

    let outcome = session.run(send_hi()).await.unwrap();
    assert_eq!(outcome, SessionOutcome::PairingRequired);
    assert!(h.provider.pairing_requests().is_empty());
    assert!(h.ctx.status.read().is_none());
}

#[tokio::test]
async fn test_other_close_is_fatal() {
    let provider = ScriptedProvider::new(vec![Script::new().close(403).end()]);
    let h = Harness::new(provider).await;
    let mut session = Session::new(h.ctx.clone());

    let outcome = session.run(send_hi()).await.unwrap();
    assert_eq!(outcome, SessionOutcome::Closed { status_code: Some(403) });
    assert_eq!(session.state(), SessionState::ClosedFatal);
    assert_eq!(h.provider.connect_count(), 1);
    assert!(h.provider.sent().is_empty());
}

#[tokio::test]
async fn test_stream_end_is_fatal() {
    let provider = ScriptedProvider::new(vec![Script::new().end()]);
    let h = Harness::new(provider).await;
    let mut session = Session::new(h.ctx.clone());

    let outcome = session.run(send_hi()).await.unwrap();
    assert_eq!(outcome, SessionOutcome::Closed { status_code: None });
}

#[tokio::test]
async fn test_fetch_waits_for_history_sync() {
    let history = (0..3)
        .map(|i| fixtures::text(&format!("H{}", i), &user("491701111111"), "old", 100 + i))
        .collect();
    let upsert = vec![fixtures::text("NEW", &user("491702222222"), "new", 500)];

    let provider = ScriptedProvider::new(vec![Script::new()
        .open()
        .history(history)
        .delay_ms(20)
        .upsert(upsert)]);
    let h = Harness::new(provider).await;
    let mut session = Session::new(h.ctx.clone());

    let result = completed(
        session
            .run(Operation::FetchMessages { limit: 10 })
            .await
            .unwrap(),
    );
    session.drain().await;

    let rows = result.data.as_array().unwrap();
    assert_eq!(rows.len(), 4);
    assert_eq!(rows[0]["id"], "NEW");
    assert_eq!(rows[0]["from"], "491702222222");
    assert!(rows[0].get("media_data").is_none());

    let stored: usize = session.reports().iter().map(|r| r.stored).sum();
    assert_eq!(stored, 4);
}

#[tokio::test]
async fn test_group_send_formats_text() {
    let provider = ScriptedProvider::new(vec![Script::new().open()]).with_groups(vec![
        wa_bridge::GroupMetadata::new("120363001@g.us", "Family Friends"),
        wa_bridge::GroupMetadata::new("120363002@g.us", "Family"),
    ]);
    let h = Harness::new(provider).await;
    let mut session = Session::new(h.ctx.clone());

    let result = completed(
        session
            .run(Operation::SendGroup {
                name: "Family".to_string(),
                message: "<strong>Hi</strong><br>there".to_string(),
                attachments: vec![],
            })
            .await
            .unwrap(),
    );

    assert_eq!(result.message, StatusMessage::MessageGroupSent);
    let sent = h.provider.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, "120363002@g.us");
    assert_eq!(sent[0].1, wa_bridge::OutgoingContent::text("*Hi*\nthere"));
    assert_eq!(result.data[0]["key"]["id"], "SENT1");
}
