//! End-to-end panel integration tests
//!
//! Drives [`QnaPlugin`] through the host-facing surface only: raw push
//! batches, timed-metadata cues, player status, and the submit calls.

use async_trait::async_trait;
use qna_common::{DeliveryStatus, QnaConfig, QnaEvent};
use qna_panel::api::{CuePointApi, SubmitRequest};
use qna_panel::gateway::{PlayerStatus, TimedMetadataCue};
use qna_panel::{QnaPlugin, Result};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;

struct MockApi {
    fail: AtomicBool,
}

impl MockApi {
    fn new(fail: bool) -> Arc<Self> {
        Arc::new(Self {
            fail: AtomicBool::new(fail),
        })
    }
}

#[async_trait]
impl CuePointApi for MockApi {
    async fn submit_cue_point(&self, request: &SubmitRequest) -> Result<String> {
        if self.fail.load(Ordering::SeqCst) {
            Err(qna_panel::Error::Submit("gateway unreachable".to_string()))
        } else {
            Ok(format!("1_{}", request.client_id))
        }
    }
}

fn plugin(api: Arc<MockApi>) -> QnaPlugin {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("qna_panel=debug")
        .with_test_writer()
        .try_init();
    QnaPlugin::new(
        QnaConfig::default(),
        api,
        "1_entry".to_string(),
        "viewer-7".to_string(),
    )
}

fn annotation(id: &str, created_at_secs: u64, text: &str, xml: &str) -> Value {
    json!({
        "objectType": "KalturaAnnotation",
        "id": id,
        "createdAt": created_at_secs,
        "text": text,
        "relatedObjects": {
            "QandA_ResponseProfile": {"objects": [{"xml": xml}]}
        }
    })
}

fn clock_cue(virtual_ms: u64) -> Vec<TimedMetadataCue> {
    serde_json::from_value(json!([
        {"value": {"key": "TEXT", "data": format!("{{\"timestamp\": {virtual_ms}}}")}}
    ]))
    .unwrap()
}

fn drain(rx: &mut broadcast::Receiver<QnaEvent>) -> Vec<QnaEvent> {
    let mut seen = Vec::new();
    while let Ok(event) = rx.try_recv() {
        seen.push(event);
    }
    seen
}

/// A pushed question thread receives its answer; the reply attaches under
/// the root and bubbles the thread's sort key to the answer's time.
#[tokio::test]
async fn test_push_scenario_threads_and_bubbles() {
    const T0_SECS: u64 = 1_700_000_000;
    let plugin = plugin(MockApi::new(false));
    plugin.register();

    plugin
        .on_push_batch(&[
            annotation(
                "a1",
                T0_SECS,
                "when is the next release?",
                "<metadata><Type>Question</Type></metadata>",
            ),
            annotation(
                "b1",
                T0_SECS + 5,
                "unrelated later question",
                "<metadata><Type>Question</Type></metadata>",
            ),
        ])
        .await;

    let threads = plugin.threads().await;
    assert_eq!(threads.len(), 2);
    assert_eq!(threads[0].id, "a1");
    assert_eq!(threads[1].id, "b1");

    // The answer arrives one second after the question
    plugin
        .on_push_batch(&[annotation(
            "a2",
            T0_SECS + 1,
            "next month",
            "<metadata><Type>Answer</Type><ThreadId>a1</ThreadId></metadata>",
        )])
        .await;

    let threads = plugin.threads().await;
    let root = &threads[0];
    assert_eq!(root.id, "a1");
    assert_eq!(root.replies.len(), 1);
    assert_eq!(root.replies[0].id, "a2");
    assert_eq!(root.replies[0].start_time_ms, (T0_SECS + 1) * 1000);

    // a1's key bubbled to T0+1000 ms, still below b1's T0+5000 ms
    assert_eq!(threads[1].id, "b1");
}

/// A locally sent question shows up immediately as Sending; the server ack
/// (same client id echoed in systemName) supersedes the placeholder.
#[tokio::test]
async fn test_send_then_ack_supersedes_placeholder() {
    let plugin = plugin(MockApi::new(false));
    plugin.register();

    let client_id = plugin.send_question("is this thing on?").await;
    let threads = plugin.threads().await;
    assert_eq!(threads.len(), 1);
    assert_eq!(threads[0].id, client_id);
    assert_eq!(threads[0].delivery_status, Some(DeliveryStatus::Sending));

    let ack = json!({
        "objectType": "KalturaAnnotation",
        "id": "1_serverid",
        "createdAt": 1_700_000_010u64,
        "text": "is this thing on?",
        "systemName": client_id,
        "relatedObjects": {
            "QandA_ResponseProfile": {
                "objects": [{"xml": "<metadata><Type>Question</Type></metadata>"}]
            }
        }
    });
    plugin.on_push_batch(&[ack]).await;

    let threads = plugin.threads().await;
    assert_eq!(threads.len(), 1);
    assert_eq!(threads[0].id, "1_serverid");
    assert_eq!(threads[0].delivery_status, None);
}

/// A failed submit flags the placeholder; resend swaps in a new id,
/// preserves the text, and succeeds once the gateway recovers.
#[tokio::test]
async fn test_send_failure_and_resend() {
    let api = MockApi::new(true);
    let plugin = plugin(api.clone());
    plugin.register();
    let mut rx = plugin.subscribe();

    let failed_id = plugin.send_question("doomed first attempt").await;
    let threads = plugin.threads().await;
    assert_eq!(threads[0].delivery_status, Some(DeliveryStatus::SendFailed));

    let saw_error_toast = drain(&mut rx).iter().any(|e| {
        matches!(
            e,
            QnaEvent::ToastRequested {
                kind: qna_common::ToastKind::Error,
                ..
            }
        )
    });
    assert!(saw_error_toast);

    api.fail.store(false, Ordering::SeqCst);
    let new_id = plugin.resend(&failed_id, None).await.unwrap();

    let threads = plugin.threads().await;
    assert_eq!(threads.len(), 1);
    assert_eq!(threads[0].id, new_id);
    assert_eq!(threads[0].content, "doomed first attempt");
    assert_eq!(threads[0].delivery_status, Some(DeliveryStatus::Sending));
}

/// An answer-on-air banner pushed before any clock tick is buffered, shows
/// once the virtual clock enters its window, and hides after a seek past
/// the window's end.
#[tokio::test]
async fn test_answer_on_air_over_virtual_clock() {
    const T0_SECS: u64 = 1_700_000_000;
    const T0_MS: u64 = T0_SECS * 1000;
    let plugin = plugin(MockApi::new(false));
    plugin.register();
    let mut rx = plugin.subscribe();

    plugin
        .on_player_status(PlayerStatus {
            position_ms: T0_MS,
            duration_ms: T0_MS + 1000,
            is_live: true,
        })
        .await;

    // Banner arrives before the first clock tick
    plugin
        .on_push_batch(&[annotation(
            "oa1",
            T0_SECS,
            "now answering your question live",
            "<metadata><Type>AnswerOnAir</Type></metadata>",
        )])
        .await;
    assert!(!drain(&mut rx)
        .iter()
        .any(|e| e.event_type() == "AnswerOnAirShown"));

    // First tick lands inside the banner's window
    plugin.on_timed_metadata(&clock_cue(T0_MS + 1000)).await;
    assert!(drain(&mut rx)
        .iter()
        .any(|e| e.event_type() == "AnswerOnAirShown"));
    assert!(plugin
        .threads()
        .await
        .iter()
        .any(|m| m.id == "oa1"));

    // Seek far past the 60 s display window
    plugin.on_timed_metadata(&clock_cue(T0_MS + 120_000)).await;
    let hidden = drain(&mut rx)
        .into_iter()
        .find_map(|e| match e {
            QnaEvent::AnswerOnAirHidden { id, .. } => Some(id),
            _ => None,
        });
    assert_eq!(hidden.as_deref(), Some("oa1"));
}

/// A deletion signal removes the message everywhere; it is never flagged
/// in place.
#[tokio::test]
async fn test_deletion_signal_removes() {
    const T0_SECS: u64 = 1_700_000_000;
    let plugin = plugin(MockApi::new(false));
    plugin.register();

    plugin
        .on_push_batch(&[annotation(
            "n1",
            T0_SECS,
            "server maintenance at noon",
            "<metadata><Type>Announcement</Type></metadata>",
        )])
        .await;
    assert_eq!(plugin.threads().await.len(), 1);

    plugin
        .on_push_batch(&[annotation(
            "n1",
            T0_SECS,
            "server maintenance at noon",
            "<metadata><Type>Announcement</Type><State>Deleted</State></metadata>",
        )])
        .await;
    assert!(plugin.threads().await.is_empty());

    // Same rule for chat threads
    plugin
        .on_push_batch(&[annotation(
            "q1",
            T0_SECS,
            "please remove this",
            "<metadata><Type>Question</Type></metadata>",
        )])
        .await;
    assert_eq!(plugin.threads().await.len(), 1);
    plugin
        .on_push_batch(&[annotation(
            "q1",
            T0_SECS,
            "please remove this",
            "<metadata><Type>Question</Type><State>Deleted</State></metadata>",
        )])
        .await;
    assert!(plugin.threads().await.is_empty());

    // A removal signal for an id never seen must not surface
    plugin
        .on_push_batch(&[annotation(
            "ghost",
            T0_SECS,
            "never existed",
            "<metadata><Type>Question</Type><State>Deleted</State></metadata>",
        )])
        .await;
    assert!(plugin.threads().await.is_empty());
}
