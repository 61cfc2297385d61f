//! End-to-end worker runs: lock, status file, cache, scripted provider.

mod common;

use std::path::Path;
use std::sync::Arc;

use common::{fast_config, user, DEVICE};
use coordination::{DevicePaths, Request, StatusFile, StatusMessage, INVALID_INPUT_MESSAGE};
use mock_provider::{fixtures, Script, ScriptedProvider, SessionGauge};
use serde_json::json;
use sync_engine::{run_worker, PAIRING_FORBIDDEN_MESSAGE};
use wa_bridge::{GroupMetadata, OutgoingContent};

async fn run(
    dir: &Path,
    request: &Request,
    provider: &ScriptedProvider,
) -> Option<coordination::StatusRecord> {
    run_worker(request, Arc::new(provider.clone()), fast_config(), dir)
        .await
        .unwrap()
}

#[tokio::test]
async fn test_group_message_scenario() {
    let dir = tempfile::tempdir().unwrap();
    let provider = ScriptedProvider::new(vec![Script::new().open()]).with_groups(vec![
        GroupMetadata::new("120363002@g.us", "Family"),
        GroupMetadata::new("120363003@g.us", "family"),
    ]);

    let request = Request::send_group("0151 1234567", "Family", "<strong>Hi</strong><br>there");
    let record = run(dir.path(), &request, &provider).await.unwrap();

    assert!(record.success);
    assert_eq!(record.message, StatusMessage::MessageGroupSent);
    assert_eq!(
        provider.sent(),
        vec![(
            "120363002@g.us".to_string(),
            OutgoingContent::text("*Hi*\nthere")
        )]
    );

    let paths = DevicePaths::new(dir.path(), DEVICE);
    assert_eq!(StatusFile::new(paths.status_path()).read(), Some(record));
    assert!(!paths.lock_path("session").exists());
    assert!(paths.cache_path().exists());
    assert_eq!(provider.end_calls(), 1);
}

#[tokio::test]
async fn test_group_without_match_sends_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let provider = ScriptedProvider::new(vec![Script::new().open()])
        .with_groups(vec![GroupMetadata::new("120363002@g.us", "Work")]);

    let request = Request::send_group(DEVICE, "Family", "hi");
    let record = run(dir.path(), &request, &provider).await.unwrap();

    assert!(record.success);
    assert_eq!(record.message, StatusMessage::MessageGroupSent);
    assert_eq!(record.data, json!([]));
    assert!(record.public_message.is_some());
    assert!(provider.sent().is_empty());
}

#[tokio::test]
async fn test_user_message_with_attachments() {
    let dir = tempfile::tempdir().unwrap();
    let photo = dir.path().join("photo.PNG");
    let report = dir.path().join("report.pdf");
    std::fs::write(&photo, b"png").unwrap();
    std::fs::write(&report, b"%PDF").unwrap();

    let provider = ScriptedProvider::new(vec![Script::new().open()]);
    let request = Request::send_user(DEVICE, "0170 1111111", "hello").with_attachments(vec![
        photo.display().to_string(),
        report.display().to_string(),
    ]);
    let record = run(dir.path(), &request, &provider).await.unwrap();

    assert_eq!(record.message, StatusMessage::MessageUserSent);
    assert_eq!(record.data.as_array().unwrap().len(), 3);

    let sent = provider.sent();
    assert!(sent.iter().all(|(jid, _)| jid == "491701111111@s.whatsapp.net"));
    assert_eq!(
        sent.iter().map(|(_, c)| c.kind()).collect::<Vec<_>>(),
        vec!["text", "image", "document"]
    );
    match &sent[2].1 {
        OutgoingContent::Document {
            file_name,
            mimetype,
            ..
        } => {
            assert_eq!(file_name, "report.pdf");
            assert_eq!(mimetype, "application/pdf");
        }
        other => panic!("expected document, got {}", other.kind()),
    }
}

#[tokio::test]
async fn test_invalid_request_never_connects() {
    let dir = tempfile::tempdir().unwrap();
    let provider = ScriptedProvider::new(vec![Script::new().open()]);

    let mut request = Request::send_user(DEVICE, "4917", "hi");
    request.message = None;
    let record = run(dir.path(), &request, &provider).await.unwrap();

    assert_eq!(record.message, StatusMessage::Error);
    assert_eq!(record.public_message.as_deref(), Some(INVALID_INPUT_MESSAGE));
    assert_eq!(provider.connect_count(), 0);
}

#[tokio::test]
async fn test_automation_mode_reports_unpaired_device() {
    let dir = tempfile::tempdir().unwrap();
    let provider = ScriptedProvider::new(vec![Script::new().pairing("qr")]);

    let request = Request::fetch_messages(DEVICE, None).with_automation(true);
    let record = run(dir.path(), &request, &provider).await.unwrap();

    assert_eq!(record.message, StatusMessage::Error);
    assert_eq!(record.public_message.as_deref(), Some(PAIRING_FORBIDDEN_MESSAGE));
    assert!(provider.pairing_requests().is_empty());
}

#[tokio::test]
async fn test_fatal_close_leaves_loading_status() {
    let dir = tempfile::tempdir().unwrap();
    let provider = ScriptedProvider::new(vec![Script::new().close(428).end()]);

    let request = Request::fetch_messages(DEVICE, None);
    assert_eq!(run(dir.path(), &request, &provider).await, None);

    let status = StatusFile::new(DevicePaths::new(dir.path(), DEVICE).status_path());
    assert_eq!(status.read().unwrap().message, StatusMessage::LoadingState);
}

#[tokio::test]
async fn test_concurrent_workers_are_serialized() {
    let dir = tempfile::tempdir().unwrap();
    let gauge = SessionGauge::new();
    let script = || {
        Script::new()
            .open()
            .history(vec![fixtures::text("M1", &user("491701111111"), "hi", 1)])
    };
    let first = ScriptedProvider::new(vec![script()]).with_gauge(gauge.clone());
    let second = ScriptedProvider::new(vec![script()]).with_gauge(gauge.clone());

    let request = Request::fetch_messages(DEVICE, Some(10));
    let (a, b) = tokio::join!(
        run(dir.path(), &request, &first),
        run(dir.path(), &request, &second)
    );

    assert_eq!(a.unwrap().message, StatusMessage::MessagesFetched);
    assert_eq!(b.unwrap().message, StatusMessage::MessagesFetched);
    assert_eq!(gauge.peak(), 1);
    assert_eq!(gauge.active(), 0);
}

#[tokio::test]
async fn test_reads_never_go_backwards() {
    let dir = tempfile::tempdir().unwrap();
    let request = Request::fetch_messages(DEVICE, Some(100));

    let first = ScriptedProvider::new(vec![Script::new().open().history(vec![
        fixtures::text("A", &user("491701111111"), "one", 1),
        fixtures::text("B", &user("491701111111"), "two", 2),
    ])]);
    let before = run(dir.path(), &request, &first).await.unwrap();
    let before = before.data.as_array().unwrap().len();
    assert_eq!(before, 2);

    let second = ScriptedProvider::new(vec![Script::new()
        .open()
        .upsert(vec![fixtures::text("C", &user("491701111111"), "three", 3)])]);
    let after = run(dir.path(), &request, &second).await.unwrap();
    let after = after.data.as_array().unwrap().len();

    assert!(after >= before);
    assert_eq!(after, 3);
    assert!(second.connects()[0].auth_existed);
}

#[tokio::test]
async fn test_reset_wipes_device_first() {
    let dir = tempfile::tempdir().unwrap();
    let seed = ScriptedProvider::new(vec![Script::new().open().history(vec![fixtures::text(
        "OLD",
        &user("491701111111"),
        "old",
        1,
    )])]);
    run(dir.path(), &Request::fetch_messages(DEVICE, None), &seed).await;

    let fresh = ScriptedProvider::new(vec![Script::new().open()]);
    let request = Request::fetch_messages(DEVICE, None).with_reset(true);
    let record = run(dir.path(), &request, &fresh).await.unwrap();

    assert!(!fresh.connects()[0].auth_existed);
    assert_eq!(record.data, json!([]));
}
