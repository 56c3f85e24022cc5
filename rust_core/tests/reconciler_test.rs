//! Message reconciliation against a scripted chat API.

mod common;

use common::{rejected, ChatCall, FakeChat};
use sessionwatch_core::{
    ChatError, DeliveryState, Destination, MessageIdStore, MessageReconciler,
};
use std::collections::BTreeMap;
use std::path::Path;
use tempfile::tempdir;

const PRIMARY: &str = "-100111";
const SECONDARY: &str = "-100222";

fn destinations() -> Vec<Destination> {
    vec![
        Destination::new(PRIMARY).with_thread(21203),
        Destination::new(SECONDARY),
    ]
}

fn reconciler(dir: &Path, first_id: i64) -> MessageReconciler<FakeChat> {
    MessageReconciler::new(
        FakeChat::new(first_id),
        MessageIdStore::new(dir.join("message_ids.json")),
        destinations(),
    )
}

fn persisted(dir: &Path) -> BTreeMap<String, i64> {
    MessageIdStore::new(dir.join("message_ids.json")).load()
}

#[tokio::test]
async fn test_first_sync_sends_to_every_destination() {
    let dir = tempdir().unwrap();
    let mut rec = reconciler(dir.path(), 100);

    let summary = rec.sync("report v1").await;

    assert_eq!(summary.sent, 2);
    assert_eq!(summary.edited, 0);
    assert_eq!(
        rec.chat().calls(),
        vec![
            ChatCall::Send { chat_id: PRIMARY.to_string(), text: "report v1".to_string() },
            ChatCall::Send { chat_id: SECONDARY.to_string(), text: "report v1".to_string() },
        ]
    );
    assert_eq!(rec.state(PRIMARY), Some(DeliveryState::Synced(100)));
    assert_eq!(rec.state(SECONDARY), Some(DeliveryState::Synced(101)));

    let ids = persisted(dir.path());
    assert_eq!(ids.get(PRIMARY), Some(&100));
    assert_eq!(ids.get(SECONDARY), Some(&101));
}

#[tokio::test]
async fn test_identical_report_makes_no_calls() {
    let dir = tempdir().unwrap();
    let mut rec = reconciler(dir.path(), 100);

    rec.sync("same").await;
    rec.chat().take_calls();

    let summary = rec.sync("same").await;
    assert!(summary.unchanged);
    assert!(rec.chat().calls().is_empty());
}

#[tokio::test]
async fn test_changed_report_edits_tracked_messages() {
    let dir = tempdir().unwrap();
    let mut rec = reconciler(dir.path(), 100);

    rec.sync("v1").await;
    rec.chat().take_calls();

    let summary = rec.sync("v2").await;
    assert_eq!(summary.edited, 2);
    assert_eq!(
        rec.chat().calls(),
        vec![
            ChatCall::Edit { chat_id: PRIMARY.to_string(), message_id: 100, text: "v2".to_string() },
            ChatCall::Edit { chat_id: SECONDARY.to_string(), message_id: 101, text: "v2".to_string() },
        ]
    );
    assert_eq!(rec.last_report(), Some("v2"));
}

#[tokio::test]
async fn test_vanished_message_is_recreated_and_persisted() {
    let dir = tempdir().unwrap();
    let mut rec = reconciler(dir.path(), 100);

    rec.sync("v1").await;
    rec.chat().take_calls();
    rec.chat().fail_next_edit(PRIMARY, ChatError::MessageNotFound(100));

    let summary = rec.sync("v2").await;

    assert_eq!(summary.recreated, 1);
    assert_eq!(summary.edited, 1);
    assert_eq!(summary.failed, 0);
    assert_eq!(
        rec.chat().calls(),
        vec![
            ChatCall::Edit { chat_id: PRIMARY.to_string(), message_id: 100, text: "v2".to_string() },
            ChatCall::Send { chat_id: PRIMARY.to_string(), text: "v2".to_string() },
            ChatCall::Edit { chat_id: SECONDARY.to_string(), message_id: 101, text: "v2".to_string() },
        ]
    );
    assert_eq!(rec.state(PRIMARY), Some(DeliveryState::Synced(102)));
    assert_eq!(persisted(dir.path()).get(PRIMARY), Some(&102));
}

#[tokio::test]
async fn test_other_edit_failure_keeps_id_and_retries() {
    let dir = tempdir().unwrap();
    let mut rec = reconciler(dir.path(), 100);

    rec.sync("v1").await;
    rec.chat().take_calls();
    rec.chat().fail_next_edit(SECONDARY, rejected("Too Many Requests"));

    let summary = rec.sync("v2").await;
    assert_eq!(summary.failed, 1);
    assert_eq!(rec.state(SECONDARY), Some(DeliveryState::Sent(101)));
    assert_eq!(persisted(dir.path()).get(SECONDARY), Some(&101));
    rec.chat().take_calls();

    // Same report: only the unsynced destination is retried.
    let summary = rec.sync("v2").await;
    assert!(!summary.unchanged);
    assert_eq!(
        rec.chat().calls(),
        vec![ChatCall::Edit { chat_id: SECONDARY.to_string(), message_id: 101, text: "v2".to_string() }]
    );
    assert_eq!(rec.state(SECONDARY), Some(DeliveryState::Synced(101)));
}

#[tokio::test]
async fn test_failure_on_one_destination_does_not_block_other() {
    let dir = tempdir().unwrap();
    let mut rec = reconciler(dir.path(), 100);
    rec.chat().fail_next_send(PRIMARY, rejected("chat not found"));

    let summary = rec.sync("v1").await;

    assert_eq!(summary.failed, 1);
    assert_eq!(summary.sent, 1);
    assert_eq!(rec.state(PRIMARY), Some(DeliveryState::Unset));
    assert_eq!(rec.state(SECONDARY), Some(DeliveryState::Synced(100)));
    let ids = persisted(dir.path());
    assert!(!ids.contains_key(PRIMARY));
    assert_eq!(ids.get(SECONDARY), Some(&100));

    // The unset destination is retried on the next cycle.
    rec.chat().take_calls();
    rec.sync("v1").await;
    assert_eq!(
        rec.chat().calls(),
        vec![ChatCall::Send { chat_id: PRIMARY.to_string(), text: "v1".to_string() }]
    );
}

#[tokio::test]
async fn test_failed_recreate_keeps_stale_id() {
    let dir = tempdir().unwrap();
    let mut rec = reconciler(dir.path(), 100);

    rec.sync("v1").await;
    rec.chat().fail_next_edit(PRIMARY, ChatError::MessageNotFound(100));
    rec.chat().fail_next_send(PRIMARY, rejected("Bad Gateway"));

    let summary = rec.sync("v2").await;
    assert_eq!(summary.failed, 1);
    assert_eq!(rec.state(PRIMARY), Some(DeliveryState::Sent(100)));
    assert_eq!(persisted(dir.path()).get(PRIMARY), Some(&100));
}

#[tokio::test]
async fn test_restart_edits_persisted_messages() {
    let dir = tempdir().unwrap();
    {
        let mut rec = reconciler(dir.path(), 100);
        rec.sync("before restart").await;
    }

    let mut rec = reconciler(dir.path(), 500);
    assert_eq!(rec.state(PRIMARY), Some(DeliveryState::Sent(100)));
    assert_eq!(rec.state(SECONDARY), Some(DeliveryState::Sent(101)));

    let summary = rec.sync("after restart").await;
    assert_eq!(summary.sent, 0);
    assert_eq!(summary.edited, 2);
}

#[tokio::test]
async fn test_corrupt_id_file_starts_fresh() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("message_ids.json"), "{\"-100111\": ").unwrap();

    let mut rec = reconciler(dir.path(), 100);
    assert_eq!(rec.state(PRIMARY), Some(DeliveryState::Unset));

    let summary = rec.sync("v1").await;
    assert_eq!(summary.sent, 2);
    assert_eq!(persisted(dir.path()).len(), 2);
}
