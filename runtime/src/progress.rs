// Copyright 2026 Orgscope Contributors
// SPDX-License-Identifier: Apache-2.0

//! Progress event types and broadcast channel for job and capture telemetry.
//!
//! The job controller and the capture path emit `ProgressEvent`s through a
//! `tokio::sync::broadcast` channel. When no subscriber exists, events are
//! silently dropped.

use serde::{Deserialize, Serialize};

/// A progress event emitted during a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressEvent {
    /// The run this event belongs to.
    pub run_id: String,
    /// Monotonically increasing sequence number within the run.
    pub seq: u64,
    /// The kind of progress event.
    pub event: ProgressEventKind,
}

/// The specific kind of progress event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ProgressEventKind {
    /// The dataset service accepted the targets.
    JobTriggered { job_id: String, targets: usize },
    /// A poll observed a status different from the previous poll.
    StatusChanged {
        job_id: String,
        status: String,
        elapsed_ms: u64,
    },
    /// The snapshot of a ready job was downloaded.
    SnapshotFetched { job_id: String, records: usize },
    /// Output written to disk.
    Saved { path: String, records: usize },
    /// A request to the dataset service failed.
    RequestFailed {
        message: String,
        status: Option<u16>,
    },
    /// The poll budget ran out.
    TimedOut { job_id: String, elapsed_ms: u64 },
    /// A page was rendered and its markup extracted.
    PageCaptured {
        url: String,
        load_time_ms: u64,
        source: String,
    },
}

/// Sender handle for emitting progress events.
pub type ProgressSender = tokio::sync::broadcast::Sender<ProgressEvent>;

/// Receiver handle for consuming progress events.
pub type ProgressReceiver = tokio::sync::broadcast::Receiver<ProgressEvent>;

/// Create a new progress broadcast channel with a bounded buffer.
pub fn channel() -> (ProgressSender, ProgressReceiver) {
    tokio::sync::broadcast::channel(256)
}

/// Emit a progress event, ignoring send errors (no receivers listening).
pub fn emit(tx: &Option<ProgressSender>, run_id: &str, seq: &mut u64, event: ProgressEventKind) {
    if let Some(ref sender) = tx {
        *seq += 1;
        let _ = sender.send(ProgressEvent {
            run_id: run_id.to_string(),
            seq: *seq,
            event,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_event_serialization() {
        let event = ProgressEvent {
            run_id: "run-1".to_string(),
            seq: 1,
            event: ProgressEventKind::StatusChanged {
                job_id: "s_abc".to_string(),
                status: "running".to_string(),
                elapsed_ms: 5_000,
            },
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("StatusChanged"));
        assert!(json.contains("s_abc"));

        let parsed: ProgressEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.run_id, "run-1");
        assert_eq!(parsed.seq, 1);
    }

    #[test]
    fn test_channel_no_receivers() {
        let (tx, rx) = channel();
        drop(rx);
        let mut seq = 0;
        emit(
            &Some(tx),
            "test",
            &mut seq,
            ProgressEventKind::TimedOut {
                job_id: "s_1".to_string(),
                elapsed_ms: 1,
            },
        );
        assert_eq!(seq, 1);
    }

    #[test]
    fn test_emit_none_sender() {
        let mut seq = 0;
        emit(
            &None,
            "test",
            &mut seq,
            ProgressEventKind::Saved {
                path: "out.json".to_string(),
                records: 0,
            },
        );
        assert_eq!(seq, 0);
    }

    #[tokio::test]
    async fn test_receiver_sees_events_in_order() {
        let (tx, mut rx) = channel();
        let tx = Some(tx);
        let mut seq = 0;
        for records in [1, 2] {
            emit(
                &tx,
                "r",
                &mut seq,
                ProgressEventKind::SnapshotFetched {
                    job_id: "s".to_string(),
                    records,
                },
            );
        }
        assert_eq!(rx.recv().await.unwrap().seq, 1);
        assert_eq!(rx.recv().await.unwrap().seq, 2);
    }
}
